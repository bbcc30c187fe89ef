use crate::rpc::RpcError;
use serde::Serialize;
use serde_json::Value;

/// One remote procedure call: a method name plus its ordered parameters.
///
/// Parameters are held as [`serde_json::Value`], so every value accepted here
/// is already JSON-representable. The struct is immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestArguments {
    method: String,
    params: Vec<Value>,
}

impl RequestArguments {
    /// Builds a request. Fails with [`RpcError::InvalidArgument`] if `method`
    /// is empty. An empty `params` list is a valid zero-arity call.
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Result<Self, RpcError> {
        let method = method.into();
        if method.is_empty() {
            return Err(RpcError::InvalidArgument(
                "method name must not be empty".to_string(),
            ));
        }
        Ok(Self { method, params })
    }

    /// Builds a request from arbitrary serializable parameters.
    ///
    /// Each parameter is converted in order; the first one that cannot be
    /// represented as JSON fails the whole construction with
    /// [`RpcError::Serialization`] naming its index.
    pub fn from_serializable<I, T>(method: impl Into<String>, params: I) -> Result<Self, RpcError>
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        let params = params
            .into_iter()
            .enumerate()
            .map(|(index, param)| param_to_json(index, &param))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(method, params)
    }

    /// Shorthand for a call that takes no parameters.
    pub fn no_params(method: impl Into<String>) -> Result<Self, RpcError> {
        Self::new(method, Vec::new())
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.method, self.params)
    }
}

fn param_to_json<T: Serialize>(index: usize, param: &T) -> Result<Value, RpcError> {
    let value = serde_json::to_value(param).map_err(|e| RpcError::Serialization {
        index,
        message: e.to_string(),
    })?;

    // serde_json writes NaN and infinities as `null`.
    if serde_value::to_value(param).is_ok_and(|raw| has_non_finite_float(&raw)) {
        return Err(RpcError::Serialization {
            index,
            message: "non-finite float has no JSON representation".to_string(),
        });
    }

    Ok(value)
}

fn has_non_finite_float(value: &serde_value::Value) -> bool {
    use serde_value::Value as Raw;

    match value {
        Raw::F32(n) => !n.is_finite(),
        Raw::F64(n) => !n.is_finite(),
        Raw::Option(Some(inner)) | Raw::Newtype(inner) => has_non_finite_float(inner),
        Raw::Seq(items) => items.iter().any(has_non_finite_float),
        Raw::Map(entries) => entries
            .iter()
            .any(|(key, value)| has_non_finite_float(key) || has_non_finite_float(value)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn rejects_empty_method() {
        let err = RequestArguments::new("", vec![]).unwrap_err();
        assert!(matches!(err, RpcError::InvalidArgument(_)));
    }

    #[test]
    fn accepts_zero_arity_calls() {
        let args = RequestArguments::no_params("eth_syncing").unwrap();
        assert_eq!(args.method(), "eth_syncing");
        assert!(args.params().is_empty());
    }

    #[test]
    fn equality_is_structural() {
        let a = RequestArguments::new("eth_getBalance", vec![json!("0x00"), json!("latest")]);
        let b = RequestArguments::new("eth_getBalance", vec![json!("0x00"), json!("latest")]);
        let c = RequestArguments::new("eth_getBalance", vec![json!("latest"), json!("0x00")]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn serialization_failure_names_the_parameter_index() {
        // Maps with non-string keys have no JSON representation.
        let mut bad = HashMap::new();
        bad.insert(vec![1u8], 1u8);

        #[derive(serde::Serialize)]
        #[serde(untagged)]
        enum Param {
            Text(&'static str),
            Map(HashMap<Vec<u8>, u8>),
        }

        let err = RequestArguments::from_serializable(
            "eth_call",
            vec![Param::Text("ok"), Param::Text("ok"), Param::Map(bad)],
        )
        .unwrap_err();

        match err {
            RpcError::Serialization { index, .. } => assert_eq!(index, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_finite_floats_are_rejected_with_their_index() {
        let err = RequestArguments::from_serializable("eth_call", vec![1.0f64, f64::NAN]).unwrap_err();
        assert!(matches!(err, RpcError::Serialization { index: 1, .. }));

        #[derive(serde::Serialize)]
        struct Fee {
            max_fee: f64,
        }

        let err = RequestArguments::from_serializable(
            "eth_estimateGas",
            vec![vec![Fee { max_fee: 2.5 }], vec![Fee { max_fee: f64::INFINITY }]],
        )
        .unwrap_err();
        assert!(matches!(err, RpcError::Serialization { index: 1, .. }));
    }

    #[test]
    fn finite_floats_are_kept() {
        let args = RequestArguments::from_serializable("eth_call", vec![1.5f64, -0.25]).unwrap();
        assert_eq!(args.params(), &[json!(1.5), json!(-0.25)]);
    }
}

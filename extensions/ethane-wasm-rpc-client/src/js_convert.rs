//! Conversions between JavaScript values and JSON at the wasm boundary.
//!
//! Values cross as JSON text (`JSON.stringify` / `JSON.parse`), so whatever
//! the host would send on the wire is exactly what reaches the envelope.

use ethane_rpc::rpc::RpcError;
use js_sys::{JSON, Object, Reflect};
use serde_json::Value;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;

/// Converts the parameter at `index` into JSON.
///
/// `undefined`, functions, symbols and BigInts have no JSON form and are
/// rejected with [`RpcError::Serialization`], as is anything `JSON.stringify`
/// throws on (cycles, nested BigInts). `NaN` and infinities, which
/// `JSON.stringify` would quietly write as `null`, are rejected too.
pub fn js_to_json(index: usize, value: &JsValue) -> Result<Value, RpcError> {
    let unsupported = if value.is_undefined() {
        Some("undefined")
    } else if value.is_function() {
        Some("a function")
    } else if value.is_symbol() {
        Some("a symbol")
    } else if value.is_bigint() {
        Some("a BigInt")
    } else {
        None
    };
    if let Some(kind) = unsupported {
        return Err(RpcError::Serialization {
            index,
            message: format!("{kind} has no JSON representation"),
        });
    }

    let reject_non_finite = Closure::<dyn FnMut(JsValue, JsValue) -> Result<JsValue, JsValue>>::new(
        |_key: JsValue, value: JsValue| match value.as_f64() {
            Some(number) if !number.is_finite() => Err(JsValue::from_str(
                "non-finite number has no JSON representation",
            )),
            _ => Ok(value),
        },
    );

    let text: String = JSON::stringify_with_replacer(value, reject_non_finite.as_ref())
        .map_err(|err| RpcError::Serialization {
            index,
            message: describe(&err),
        })?
        .into();

    serde_json::from_str(&text).map_err(|err| RpcError::Serialization {
        index,
        message: err.to_string(),
    })
}

pub fn json_to_js(value: &Value) -> Result<JsValue, RpcError> {
    JSON::parse(&value.to_string())
        .map_err(|err| RpcError::Internal(format!("JSON.parse failed: {}", describe(&err))))
}

/// Builds the rejection value for a failed call:
/// `{ kind, message, code?, data?, index? }`.
pub fn error_to_js(err: &RpcError) -> JsValue {
    let object = Object::new();
    set(&object, "kind", &JsValue::from_str(err.kind()));

    match err {
        RpcError::Remote(error) => {
            set(&object, "message", &JsValue::from_str(&error.message));
            set(&object, "code", &JsValue::from_f64(error.code as f64));
            if let Some(data) = &error.data {
                let data = json_to_js(data).unwrap_or_else(|_| JsValue::from_str(&data.to_string()));
                set(&object, "data", &data);
            }
        }
        RpcError::Serialization { index, message } => {
            set(&object, "message", &JsValue::from_str(message));
            set(&object, "index", &JsValue::from_f64(*index as f64));
        }
        other => set(&object, "message", &JsValue::from_str(&other.to_string())),
    }

    object.into()
}

fn set(object: &Object, key: &str, value: &JsValue) {
    // Only fails on frozen objects or throwing setters; `object` is fresh.
    let _ = Reflect::set(object, &JsValue::from_str(key), value);
}

fn describe(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            Reflect::get(err, &JsValue::from_str("message"))
                .ok()
                .and_then(|message| message.as_string())
        })
        .unwrap_or_else(|| format!("{err:?}"))
}

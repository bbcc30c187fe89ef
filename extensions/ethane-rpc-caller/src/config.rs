use crate::{
    ParamValidation,
    constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT},
};
use std::time::Duration;

/// Credentials sent in the `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Basic(String),
}

impl Credentials {
    pub fn to_auth_string(&self) -> String {
        match self {
            Self::Bearer(token) => format!("Bearer {token}"),
            Self::Basic(token) => format!("Basic {token}"),
        }
    }
}

/// Settings shared by every client flavor.
///
/// ```
/// use ethane_rpc_caller::{ClientConfig, Credentials, ParamValidation};
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_request_timeout(Some(Duration::from_secs(5)))
///     .with_credentials(Credentials::Bearer("secret".into()))
///     .with_param_validation(ParamValidation::Strict);
///
/// assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// `None` waits forever.
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub credentials: Option<Credentials>,
    pub param_validation: ParamValidation,
}

impl ClientConfig {
    pub fn with_request_timeout(mut self, request_timeout: Option<Duration>) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_param_validation(mut self, param_validation: ParamValidation) -> Self {
        self.param_validation = param_validation;
        self
    }

    pub fn authorization(&self) -> Option<String> {
        self.credentials.as_ref().map(Credentials::to_auth_string)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            credentials: None,
            param_validation: ParamValidation::Off,
        }
    }
}

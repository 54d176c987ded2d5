//! Per-instance client configuration.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::http::HeaderSet;

/// Option key enabling the trust-all TLS context.
pub const IGNORE_HOSTNAME_VERIFICATION: &str = "IgnoreHostnameVerification";
/// Option key holding default headers as a JSON-encoded object.
pub const DEFAULT_HEADERS: &str = "DefaultHeaders";

/// Configuration fixed when a facade instance is constructed.
///
/// Read-only for the instance's lifetime; calls only borrow it.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Accept every certificate and skip hostname checks.
    ///
    /// # Warning
    ///
    /// Insecure. Only for test rigs and self-signed development servers.
    pub ignore_hostname_verification: bool,
    /// Headers sent with every call unless the call overrides them.
    pub default_headers: HeaderSet,
    /// Total request timeout. `None` blocks indefinitely.
    pub timeout: Option<Duration>,
    /// Connect timeout. `None` blocks indefinitely.
    pub connect_timeout: Option<Duration>,
    /// User agent sent with every request.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ignore_hostname_verification: false,
            default_headers: HeaderSet::new(),
            timeout: None,
            connect_timeout: None,
            user_agent: Some(format!("script-http/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the option map a script passes to the constructor.
    ///
    /// Recognizes [`IGNORE_HOSTNAME_VERIFICATION`] (boolean) and
    /// [`DEFAULT_HEADERS`] (string holding a JSON object). `null` counts as
    /// absent; unknown keys are ignored.
    pub fn from_options(options: &Map<String, Value>) -> Result<Self> {
        let mut config = Self::default();

        for (key, value) in options {
            match key.as_str() {
                IGNORE_HOSTNAME_VERIFICATION => match value {
                    Value::Null => {}
                    Value::Bool(flag) => config.ignore_hostname_verification = *flag,
                    other => {
                        return Err(Error::invalid_option(
                            key.clone(),
                            format!("expected a boolean, got {}", type_name(other)),
                        ));
                    }
                },
                DEFAULT_HEADERS => match value {
                    Value::Null => {}
                    Value::String(json) => {
                        config.default_headers = parse_default_headers(json)?;
                    }
                    other => {
                        return Err(Error::invalid_option(
                            key.clone(),
                            format!("expected a JSON string, got {}", type_name(other)),
                        ));
                    }
                },
                _ => {
                    tracing::debug!(target: "script_http::config", "Ignoring unknown option '{}'", key);
                }
            }
        }

        Ok(config)
    }

    /// Enable or disable the trust-all TLS context.
    ///
    /// # Warning
    ///
    /// Passing `true` disables certificate and hostname verification.
    pub fn ignore_hostname_verification(mut self, ignore: bool) -> Self {
        self.ignore_hostname_verification = ignore;
        self
    }

    /// Set the default headers.
    pub fn default_headers(mut self, headers: HeaderSet) -> Self {
        self.default_headers = headers;
        self
    }

    /// Set the total request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Send no user agent.
    pub fn no_user_agent(mut self) -> Self {
        self.user_agent = None;
        self
    }
}

fn parse_default_headers(json: &str) -> Result<HeaderSet> {
    let parsed: Value = serde_json::from_str(json)
        .map_err(|e| Error::invalid_option(DEFAULT_HEADERS, format!("invalid JSON: {e}")))?;

    let Value::Object(object) = parsed else {
        return Err(Error::invalid_option(
            DEFAULT_HEADERS,
            format!("expected a JSON object, got {}", type_name(&parsed)),
        ));
    };

    HeaderSet::from_json_object(&object)
        .map_err(|e| Error::invalid_option(DEFAULT_HEADERS, e.to_string()))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

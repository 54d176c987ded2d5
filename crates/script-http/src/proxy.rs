//! Proxy settings for outgoing requests.
//!
//! Settings are a plain value handed to the client factory. The host loads
//! them once, usually from the process environment via
//! [`ProxySettings::from_env`], and the factory never reads ambient state on
//! its own.

use crate::error::{Error, Result};

/// Environment variable holding the proxy host.
pub const PROXY_HOST_ENV: &str = "SCRIPT_HTTP_PROXY_HOST";
/// Environment variable holding the proxy port.
pub const PROXY_PORT_ENV: &str = "SCRIPT_HTTP_PROXY_PORT";
/// Environment variable holding the proxy user.
pub const PROXY_USER_ENV: &str = "SCRIPT_HTTP_PROXY_USER";
/// Environment variable holding the proxy password.
pub const PROXY_PASSWORD_ENV: &str = "SCRIPT_HTTP_PROXY_PASSWORD";

/// Port used when a host is configured without one.
pub const DEFAULT_PROXY_PORT: u16 = 80;

/// Proxy host, port and optional basic credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxySettings {
    /// Proxy host. `None` disables proxying.
    pub host: Option<String>,
    /// Proxy port.
    pub port: u16,
    /// User for proxy basic authentication.
    pub user: Option<String>,
    /// Password for proxy basic authentication.
    pub password: Option<String>,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PROXY_PORT,
            user: None,
            password: None,
        }
    }
}

impl ProxySettings {
    /// Settings with proxying disabled.
    pub fn none() -> Self {
        Self::default()
    }

    /// Route requests through `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: Some(host.into()),
            port,
            user: None,
            password: None,
        }
    }

    /// Attach basic credentials for the proxy.
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Load settings from the `SCRIPT_HTTP_PROXY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup.
    ///
    /// Blank values count as unset. A port that is not a valid `u16` fails
    /// with a client configuration error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match read(PROXY_PORT_ENV) {
            Some(port) => port.parse::<u16>().map_err(|e| {
                Error::ClientConfiguration(format!("invalid proxy port '{port}': {e}"))
            })?,
            None => DEFAULT_PROXY_PORT,
        };

        let settings = Self {
            host: read(PROXY_HOST_ENV),
            port,
            user: read(PROXY_USER_ENV),
            password: read(PROXY_PASSWORD_ENV),
        };
        tracing::debug!(
            target: "script_http::proxy",
            enabled = settings.is_enabled(),
            authenticated = settings.has_credentials(),
            "Loaded proxy settings"
        );
        Ok(settings)
    }

    /// Whether a proxy host is configured.
    pub fn is_enabled(&self) -> bool {
        self.host.is_some()
    }

    /// Whether basic credentials are configured.
    pub fn has_credentials(&self) -> bool {
        self.user.is_some()
    }

    /// The proxy URL, if a host is configured.
    pub fn url(&self) -> Option<String> {
        self.host
            .as_ref()
            .map(|host| format!("http://{host}:{}", self.port))
    }

    /// Build the reqwest proxy, with credentials when a user is set.
    pub(crate) fn to_reqwest(&self) -> Result<Option<reqwest::Proxy>> {
        let Some(url) = self.url() else {
            return Ok(None);
        };

        let mut proxy = reqwest::Proxy::all(&url)
            .map_err(|e| Error::ClientConfiguration(format!("invalid proxy '{url}': {e}")))?;
        if let Some(ref user) = self.user {
            proxy = proxy.basic_auth(user, self.password.as_deref().unwrap_or(""));
        }
        Ok(Some(proxy))
    }
}

impl std::fmt::Debug for ProxySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxySettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("has_password", &self.password.is_some())
            .finish()
    }
}

//! Single-use client construction.

use tokio::runtime::Runtime;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::proxy::ProxySettings;
use crate::tls;

/// Builds one configured client per call.
///
/// Holds the proxy settings injected by the host; everything else comes
/// from the [`ClientConfig`] passed to [`build`](Self::build).
#[derive(Clone, Debug, Default)]
pub struct ClientFactory {
    proxy: ProxySettings,
}

impl ClientFactory {
    /// Create a factory routing through the given proxy settings.
    pub fn new(proxy: ProxySettings) -> Self {
        Self { proxy }
    }

    /// The proxy settings used for every client.
    pub fn proxy(&self) -> &ProxySettings {
        &self.proxy
    }

    /// Build a client for exactly one request.
    ///
    /// Proxying is disabled unless the injected settings name a host;
    /// ambient proxy variables are not consulted.
    pub fn build(&self, config: &ClientConfig) -> Result<ScopedClient> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::ClientConfiguration(format!("failed to start I/O runtime: {e}")))?;

        let mut builder = reqwest::Client::builder().pool_max_idle_per_host(0);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(ref ua) = config.user_agent {
            builder = builder.user_agent(ua);
        }

        builder = match self.proxy.to_reqwest()? {
            Some(proxy) => builder.proxy(proxy),
            None => builder.no_proxy(),
        };

        // Hostname-verification bypass (dangerous - explicit opt-in only)
        if config.ignore_hostname_verification {
            builder = builder.use_preconfigured_tls(tls::trust_all_client_config()?);
        }

        let client = {
            let _guard = runtime.enter();
            builder
                .build()
                .map_err(|e| Error::ClientConfiguration(e.to_string()))?
        };

        tracing::debug!(
            target: "script_http::client",
            proxy = self.proxy.is_enabled(),
            insecure = config.ignore_hostname_verification,
            "Built single-use client"
        );

        Ok(ScopedClient { client, runtime })
    }
}

/// A client and its private runtime, scoped to one request.
///
/// The runtime is current-thread: I/O only makes progress while a call
/// blocks on it, so no background threads outlive the call. Dropping the
/// scoped client releases the connection.
pub struct ScopedClient {
    client: reqwest::Client,
    runtime: Runtime,
}

impl ScopedClient {
    /// Execute a request, blocking until the response head arrives.
    ///
    /// The request future is created inside the runtime: reqwest arms its
    /// total-timeout timer when the future is built.
    pub fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response> {
        let response = self
            .runtime
            .block_on(async { self.client.execute(request).await })?;
        Ok(response)
    }

    /// Drive a future to completion on this client's runtime.
    pub(crate) fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

impl std::fmt::Debug for ScopedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedClient").finish_non_exhaustive()
    }
}

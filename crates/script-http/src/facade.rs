//! The script-facing HTTP client.

use std::fmt;

use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind};
use crate::http::{
    ClientFactory, HeaderSet, HttpMethod, NormalizedResponse, OutgoingRequest, RequestPayload,
    ResponseBody, compose_headers,
};
use crate::proxy::ProxySettings;

/// Prefix of every error message scripts see.
pub const ERROR_PREFIX: &str = "An error occurred.";

/// The error raised to scripts.
///
/// Every failure in the pipeline is reported through this one type, carrying
/// the originating [`ErrorKind`] and message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptError {
    kind: ErrorKind,
    message: String,
}

impl ScriptError {
    /// The kind of the originating failure.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The originating failure's message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ERROR_PREFIX} Cause: [{}: {}]", self.kind, self.message)
    }
}

impl std::error::Error for ScriptError {}

impl From<Error> for ScriptError {
    fn from(err: Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// A response as handed back to a script.
#[derive(Debug)]
pub struct ScriptResponse {
    /// Status code as a decimal string.
    pub status: String,
    /// Response headers as a JSON object string.
    pub headers: String,
    /// The body, present only if the response had an entity.
    pub body: Option<ResponseBody>,
}

impl ScriptResponse {
    /// The status code parsed back into a number.
    pub fn status_code(&self) -> Option<u16> {
        self.status.parse().ok()
    }

    /// The headers parsed back into a JSON object.
    pub fn header_map(&self) -> Map<String, Value> {
        match serde_json::from_str(&self.headers) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// The text body, if the response was buffered.
    pub fn text(&self) -> Option<&str> {
        self.body.as_ref().and_then(ResponseBody::as_text)
    }
}

impl From<NormalizedResponse> for ScriptResponse {
    fn from(response: NormalizedResponse) -> Self {
        let headers: Map<String, Value> = response
            .headers
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();

        Self {
            status: response.status.to_string(),
            headers: Value::Object(headers).to_string(),
            body: response.body,
        }
    }
}

/// HTTP client exposed to embedded scripts.
///
/// Each call runs the full pipeline on its own single-use client: compose
/// headers, build the client, build the request, execute, normalize. Calls
/// block the current thread and must not be made from inside an async
/// runtime. There is no timeout unless one is set on the [`ClientConfig`].
///
/// # Example
///
/// ```ignore
/// use script_http::{HeaderSet, ScriptHttpClient};
///
/// let client = ScriptHttpClient::from_options(&serde_json::Map::new())?;
/// let headers = HeaderSet::from([("Accept", "text/plain")]);
/// let response = client.get("https://example.com/", Some(&headers), false)?;
/// println!("{} {}", response.status, response.text().unwrap_or_default());
/// ```
#[derive(Clone, Debug)]
pub struct ScriptHttpClient {
    config: ClientConfig,
    factory: ClientFactory,
}

impl Default for ScriptHttpClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl ScriptHttpClient {
    /// Create a client from a configuration, with proxying disabled.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            factory: ClientFactory::default(),
        }
    }

    /// Create a client from the option map a script passes to the
    /// constructor.
    ///
    /// See [`ClientConfig::from_options`] for the recognized keys.
    pub fn from_options(options: &Map<String, Value>) -> Result<Self, ScriptError> {
        ClientConfig::from_options(options)
            .map(Self::new)
            .map_err(|err| report("constructor", err))
    }

    /// Route every call through the given proxy.
    pub fn with_proxy(mut self, proxy: ProxySettings) -> Self {
        self.factory = ClientFactory::new(proxy);
        self
    }

    /// The instance configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a GET request.
    pub fn get(
        &self,
        url: &str,
        headers: Option<&HeaderSet>,
        responds_as_stream: bool,
    ) -> Result<ScriptResponse, ScriptError> {
        self.dispatch(HttpMethod::Get, url, headers, None, responds_as_stream)
    }

    /// Send a DELETE request.
    pub fn delete(
        &self,
        url: &str,
        headers: Option<&HeaderSet>,
        responds_as_stream: bool,
    ) -> Result<ScriptResponse, ScriptError> {
        self.dispatch(HttpMethod::Delete, url, headers, None, responds_as_stream)
    }

    /// Send a POST request. The response body is always buffered text.
    pub fn post(
        &self,
        url: &str,
        headers: Option<&HeaderSet>,
        content_type: &str,
        body: &str,
    ) -> Result<ScriptResponse, ScriptError> {
        let payload = RequestPayload { content_type, body };
        self.dispatch(HttpMethod::Post, url, headers, Some(payload), false)
    }

    /// Send a PUT request. The response body is always buffered text.
    pub fn put(
        &self,
        url: &str,
        headers: Option<&HeaderSet>,
        content_type: &str,
        body: &str,
    ) -> Result<ScriptResponse, ScriptError> {
        let payload = RequestPayload { content_type, body };
        self.dispatch(HttpMethod::Put, url, headers, Some(payload), false)
    }

    /// Send a PATCH request. The response body is always buffered text.
    pub fn patch(
        &self,
        url: &str,
        headers: Option<&HeaderSet>,
        content_type: &str,
        body: &str,
    ) -> Result<ScriptResponse, ScriptError> {
        let payload = RequestPayload { content_type, body };
        self.dispatch(HttpMethod::Patch, url, headers, Some(payload), false)
    }

    /// Legacy name for [`post`](Self::post).
    pub fn post_param(
        &self,
        url: &str,
        headers: Option<&HeaderSet>,
        content_type: &str,
        body: &str,
    ) -> Result<ScriptResponse, ScriptError> {
        self.post(url, headers, content_type, body)
    }

    /// Legacy name for [`put`](Self::put).
    pub fn put_param(
        &self,
        url: &str,
        headers: Option<&HeaderSet>,
        content_type: &str,
        body: &str,
    ) -> Result<ScriptResponse, ScriptError> {
        self.put(url, headers, content_type, body)
    }

    fn dispatch(
        &self,
        method: HttpMethod,
        url: &str,
        headers: Option<&HeaderSet>,
        payload: Option<RequestPayload<'_>>,
        responds_as_stream: bool,
    ) -> Result<ScriptResponse, ScriptError> {
        self.execute(method, url, headers, payload, responds_as_stream)
            .map(ScriptResponse::from)
            .map_err(|err| report(&method.to_string(), err))
    }

    fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        headers: Option<&HeaderSet>,
        payload: Option<RequestPayload<'_>>,
        responds_as_stream: bool,
    ) -> crate::Result<NormalizedResponse> {
        let content_type = payload
            .filter(|_| method.has_body())
            .map(|payload| payload.content_type);
        let composed = compose_headers(Some(&self.config.default_headers), headers, content_type);
        let request = OutgoingRequest::new(method, url, composed, payload)?;

        let client = self.factory.build(&self.config)?;

        tracing::debug!(target: "script_http::facade", "{} {}", method, request.url);
        let response = client.execute(request.into_reqwest()?)?;
        let response = NormalizedResponse::read(response, client, responds_as_stream)?;

        tracing::debug!(
            target: "script_http::facade",
            status = response.status,
            streamed = responds_as_stream,
            "{} {} completed",
            method,
            url
        );
        Ok(response)
    }
}

fn report(operation: &str, err: Error) -> ScriptError {
    match err.kind() {
        ErrorKind::InvalidArgument => {
            tracing::info!(target: "script_http::facade", "{} rejected: {}", operation, err);
        }
        _ => {
            tracing::warn!(target: "script_http::facade", "{} failed: {}", operation, err);
        }
    }
    ScriptError::from(err)
}

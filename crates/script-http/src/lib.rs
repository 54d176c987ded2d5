//! HTTP client facade for embedded scripts.
//!
//! Scripts issue GET/POST/PUT/PATCH/DELETE requests through
//! [`ScriptHttpClient`] and get back a [`ScriptResponse`]: the status code as
//! a string, the headers as a JSON object string, and the body either as
//! buffered UTF-8 text or as a lazily read [`BodyStream`].
//!
//! ```ignore
//! use script_http::{HeaderSet, ProxySettings, ScriptHttpClient};
//!
//! let options = serde_json::json!({
//!     "DefaultHeaders": r#"{"Accept":"application/json"}"#,
//! });
//! let client = ScriptHttpClient::from_options(options.as_object().unwrap())?
//!     .with_proxy(ProxySettings::from_env()?);
//!
//! let response = client.post(
//!     "https://api.example.com/items",
//!     Some(&HeaderSet::from([("X-Request-Id", "42")])),
//!     "application/json",
//!     r#"{"name":"widget"}"#,
//! )?;
//! assert_eq!(response.status, "201");
//! ```
//!
//! # Streaming
//!
//! `get` and `delete` accept `responds_as_stream`. A streamed body owns the
//! connection until it is read to the end, closed, or dropped:
//!
//! ```ignore
//! use std::io::Read;
//!
//! let response = client.get("https://example.com/large.bin", None, true)?;
//! if let Some(mut stream) = response.body.and_then(|body| body.into_stream()) {
//!     let mut bytes = Vec::new();
//!     stream.read_to_end(&mut bytes)?;
//! }
//! ```
//!
//! # Insecure TLS
//!
//! The `IgnoreHostnameVerification` option installs a verifier that accepts
//! any certificate for any host. It is meant for test rigs and self-signed
//! development servers only.

mod config;
mod error;
mod facade;
pub mod http;
pub mod proxy;
pub mod tls;

pub use config::{ClientConfig, DEFAULT_HEADERS, IGNORE_HOSTNAME_VERIFICATION};
pub use error::{Error, ErrorKind, Result};
pub use facade::{ERROR_PREFIX, ScriptError, ScriptHttpClient, ScriptResponse};
pub use crate::http::{BodyStream, HeaderSet, HttpMethod, NormalizedResponse, ResponseBody};
pub use proxy::ProxySettings;

//! Error types for the script HTTP client.

use std::fmt;

/// A specialized Result type for script HTTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised anywhere in the request pipeline.
///
/// Every variant belongs to one [`ErrorKind`]; the facade reports the kind
/// name to scripts alongside the message.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A required call argument was missing or empty.
    #[error("{0} parameter is not set.")]
    InvalidArgument(&'static str),

    /// A constructor option had the wrong type or could not be parsed.
    #[error("Invalid value for option '{option}': {message}")]
    InvalidOption {
        /// The option key as supplied by the script.
        option: String,
        /// What was wrong with it.
        message: String,
    },

    /// The url argument is not an absolute `http`/`https` URL.
    #[error("url parameter is not a valid URL: {0}")]
    InvalidUrl(String),

    /// The client, its TLS context or its proxy could not be configured.
    #[error("Client configuration failed: {0}")]
    ClientConfiguration(String),

    /// The request could not be executed.
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded a configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The response body could not be read or decoded.
    #[error("Failed to read response body: {0}")]
    BodyRead(String),

    /// Part of the request could not be encoded for the wire.
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

impl Error {
    /// Create an option error.
    pub fn invalid_option(option: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            message: message.into(),
        }
    }

    /// The classification reported to scripts.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::InvalidOption { .. } | Self::InvalidUrl(_) => {
                ErrorKind::InvalidArgument
            }
            Self::ClientConfiguration(_) => ErrorKind::ClientConfiguration,
            Self::Network(_) | Self::Timeout(_) => ErrorKind::Network,
            Self::BodyRead(_) => ErrorKind::BodyRead,
            Self::Encoding(_) => ErrorKind::Encoding,
        }
    }
}

/// Coarse error classes visible to calling scripts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing/empty argument or mistyped option. Never reaches the network.
    InvalidArgument,
    /// TLS context, proxy or client construction failed.
    ClientConfiguration,
    /// I/O failure while executing the request.
    Network,
    /// Failure reading or decoding the response entity.
    BodyRead,
    /// Failure encoding the request.
    Encoding,
}

impl ErrorKind {
    /// The name scripts see for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "InvalidArgumentError",
            Self::ClientConfiguration => "ClientConfigurationError",
            Self::Network => "NetworkError",
            Self::BodyRead => "BodyReadError",
            Self::Encoding => "EncodingError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render an error followed by its chain of causes, `": "`-separated.
///
/// A cause whose text already ends the message is skipped.
pub(crate) fn describe(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let message = describe(&err);
        if err.is_timeout() {
            Self::Timeout(message)
        } else if err.is_body() || err.is_decode() {
            Self::BodyRead(message)
        } else if err.is_builder() {
            Self::ClientConfiguration(message)
        } else {
            Self::Network(message)
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::Encoding(format!("invalid header name: {err}"))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::Encoding(format!("invalid header value: {err}"))
    }
}

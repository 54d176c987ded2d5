//! Outgoing request construction and validation.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use super::headers::HeaderSet;
use crate::error::{Error, Result};

/// HTTP request methods available to scripts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    Post,
    /// HTTP PUT method.
    Put,
    /// HTTP PATCH method.
    Patch,
    /// HTTP DELETE method.
    Delete,
}

impl HttpMethod {
    /// Whether requests with this method carry a body.
    pub fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// Convert to reqwest method.
    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Patch => write!(f, "PATCH"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// Content type and text body of a POST/PUT/PATCH call.
#[derive(Clone, Copy, Debug)]
pub struct RequestPayload<'a> {
    /// Value of the `Content-Type` header.
    pub content_type: &'a str,
    /// Body text, sent UTF-8 encoded.
    pub body: &'a str,
}

/// A validated request ready to be executed.
#[derive(Clone, Debug)]
pub struct OutgoingRequest {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The parsed request URL.
    pub url: url::Url,
    /// Composed headers.
    pub headers: HeaderSet,
    /// Content type and encoded body, for body-bearing methods.
    pub body: Option<(String, Bytes)>,
}

impl OutgoingRequest {
    /// Validate the call arguments and build the request.
    ///
    /// Checks run in order: url, then content type, then body. The url must
    /// be absolute with an `http` or `https` scheme. GET and DELETE ignore
    /// any payload.
    pub fn new(
        method: HttpMethod,
        url: &str,
        headers: HeaderSet,
        payload: Option<RequestPayload<'_>>,
    ) -> Result<Self> {
        if url.is_empty() {
            return Err(Error::InvalidArgument("url"));
        }

        let body = if method.has_body() {
            let payload = payload.unwrap_or(RequestPayload {
                content_type: "",
                body: "",
            });
            if payload.content_type.is_empty() {
                return Err(Error::InvalidArgument("contentType"));
            }
            if payload.body.is_empty() {
                return Err(Error::InvalidArgument("body"));
            }
            Some((payload.content_type.to_string(), encode_body(payload.body)))
        } else {
            None
        };

        let url = url::Url::parse(url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        Ok(Self {
            method,
            url,
            headers,
            body,
        })
    }

    /// The content type set for the body, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.body.as_ref().map(|(content_type, _)| content_type.as_str())
    }

    /// Encode the headers for the wire.
    ///
    /// `Content-Type` from the payload goes first. Composed headers follow;
    /// when a payload is present a composed `Content-Type` is dropped so the
    /// explicit argument wins.
    pub fn header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.headers.len() + 1);

        if let Some(content_type) = self.content_type() {
            map.insert(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
        }

        for (name, value) in self.headers.iter() {
            let name = HeaderName::from_bytes(name.as_bytes())?;
            if self.body.is_some() && name == CONTENT_TYPE {
                tracing::debug!(
                    target: "script_http::request",
                    dropped = value,
                    "Content-Type header replaced by the contentType argument"
                );
                continue;
            }
            map.append(name, HeaderValue::from_str(value)?);
        }

        Ok(map)
    }

    /// Convert into a reqwest request.
    pub fn into_reqwest(self) -> Result<reqwest::Request> {
        let headers = self.header_map()?;

        let mut request = reqwest::Request::new(self.method.to_reqwest(), self.url);
        *request.headers_mut() = headers;
        if let Some((_, body)) = self.body {
            *request.body_mut() = Some(reqwest::Body::from(body));
        }
        Ok(request)
    }
}

/// Encode body text for the wire.
///
/// Rust strings are always valid UTF-8, so this cannot fail.
fn encode_body(text: &str) -> Bytes {
    Bytes::copy_from_slice(text.as_bytes())
}

//! Response normalization.
//!
//! Turns an executed reqwest response into a [`NormalizedResponse`]: the raw
//! status code, a flat header map and a body that is either buffered text or
//! a [`BodyStream`].

use std::collections::BTreeMap;
use std::io::{self, BufRead, Read};

use bytes::{Buf, Bytes};

use super::client::ScopedClient;
use crate::error::{Error, Result, describe};

/// A response in the shape scripts consume.
#[derive(Debug)]
pub struct NormalizedResponse {
    /// The HTTP status code, passed through unchanged.
    pub status: u16,
    /// Response headers, one value per name.
    pub headers: BTreeMap<String, String>,
    /// The body, absent when the response carried no entity.
    pub body: Option<ResponseBody>,
}

/// The body of a [`NormalizedResponse`].
#[derive(Debug)]
pub enum ResponseBody {
    /// The whole entity, decoded as UTF-8.
    Text(String),
    /// A lazy reader over the entity.
    Stream(BodyStream),
}

impl ResponseBody {
    /// The text body, if buffered.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Stream(_) => None,
        }
    }

    /// The stream body, if streamed.
    pub fn into_stream(self) -> Option<BodyStream> {
        match self {
            Self::Text(_) => None,
            Self::Stream(stream) => Some(stream),
        }
    }
}

impl NormalizedResponse {
    /// Normalize a response executed on `client`.
    ///
    /// Non-2xx statuses are not errors. In text mode the whole body is read
    /// and `client` is dropped before returning; in stream mode `client`
    /// moves into the returned [`BodyStream`].
    pub fn read(
        response: reqwest::Response,
        client: ScopedClient,
        responds_as_stream: bool,
    ) -> Result<Self> {
        let status = response.status();
        let headers = flatten_headers(response.headers());

        let body = if !has_entity(status) {
            None
        } else if responds_as_stream {
            Some(ResponseBody::Stream(BodyStream::new(response, client)))
        } else {
            let bytes = client.block_on(response.bytes())?;
            let text = String::from_utf8(bytes.to_vec())
                .map_err(|e| Error::BodyRead(format!("body is not valid UTF-8: {e}")))?;
            Some(ResponseBody::Text(text))
        };

        Ok(Self {
            status: status.as_u16(),
            headers,
            body,
        })
    }

    /// Get a header value by name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Whether a response with this status can carry an entity.
fn has_entity(status: reqwest::StatusCode) -> bool {
    !(status.is_informational()
        || status == reqwest::StatusCode::NO_CONTENT
        || status == reqwest::StatusCode::NOT_MODIFIED)
}

/// Flatten headers into one value per name.
///
/// When a name repeats, the last value received wins. Names are rendered in
/// Title-Case since the transport delivers them lowercased.
pub fn flatten_headers(headers: &http::HeaderMap) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();
    for (name, value) in headers.iter() {
        let value = match value.to_str() {
            Ok(text) => text.to_string(),
            Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
        };
        flat.insert(canonical_name(name.as_str()), value);
    }
    flat
}

/// `content-type` -> `Content-Type`.
fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// The response and the client it arrived on, kept alive together.
struct Exchange {
    response: reqwest::Response,
    client: ScopedClient,
}

/// A buffered, pull-based reader over a response body.
///
/// The stream owns the connection, the client and its runtime. They are
/// released as soon as the body is exhausted, when [`close`](Self::close) is
/// called, or when the stream is dropped. Each read blocks the calling
/// thread; no size limit is applied.
pub struct BodyStream {
    exchange: Option<Exchange>,
    chunk: Bytes,
    bytes_read: u64,
    content_length: Option<u64>,
}

impl BodyStream {
    fn new(response: reqwest::Response, client: ScopedClient) -> Self {
        let content_length = response.content_length();
        Self {
            exchange: Some(Exchange { response, client }),
            chunk: Bytes::new(),
            bytes_read: 0,
            content_length,
        }
    }

    /// Number of bytes handed to the reader so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// The advertised body length, if known.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Whether the underlying connection has been released.
    pub fn is_closed(&self) -> bool {
        self.exchange.is_none()
    }

    /// Release the connection without reading the rest of the body.
    pub fn close(&mut self) {
        self.chunk.clear();
        self.release();
    }

    /// Read the remaining body into a vector.
    pub fn read_all(mut self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn release(&mut self) {
        if self.exchange.take().is_some() {
            tracing::trace!(
                target: "script_http::response",
                bytes_read = self.bytes_read,
                "Released streamed response"
            );
        }
    }
}

impl BufRead for BodyStream {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        while self.chunk.is_empty() {
            let Some(exchange) = self.exchange.as_mut() else {
                return Ok(&[]);
            };
            let next = exchange.client.block_on(exchange.response.chunk());
            match next {
                Ok(Some(chunk)) => self.chunk = chunk,
                Ok(None) => self.release(),
                Err(e) => {
                    self.release();
                    return Err(io::Error::other(Error::BodyRead(describe(&e))));
                }
            }
        }
        Ok(&self.chunk)
    }

    fn consume(&mut self, amt: usize) {
        let amt = amt.min(self.chunk.len());
        self.chunk.advance(amt);
        self.bytes_read += amt as u64;
    }
}

impl Read for BodyStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl std::fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyStream")
            .field("bytes_read", &self.bytes_read)
            .field("content_length", &self.content_length)
            .field("closed", &self.is_closed())
            .finish()
    }
}

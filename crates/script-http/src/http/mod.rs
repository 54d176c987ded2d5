//! The request pipeline behind the facade.
//!
//! Leaf-first: [`compose_headers`] merges instance defaults with per-call
//! headers, [`ClientFactory`] builds a single-use client, [`OutgoingRequest`]
//! validates and encodes the call, and [`NormalizedResponse`] turns whatever
//! comes back into the shape scripts consume.
//!
//! # Example
//!
//! ```ignore
//! use script_http::ClientConfig;
//! use script_http::http::{ClientFactory, HeaderSet, HttpMethod, NormalizedResponse, OutgoingRequest, compose_headers};
//!
//! let config = ClientConfig::default();
//! let headers = compose_headers(Some(&config.default_headers), None, None);
//! let request = OutgoingRequest::new(HttpMethod::Get, "https://example.com/", headers, None)?;
//!
//! let client = ClientFactory::default().build(&config)?;
//! let response = client.execute(request.into_reqwest()?)?;
//! let response = NormalizedResponse::read(response, client, false)?;
//! println!("Status: {}", response.status);
//! ```

mod client;
mod headers;
mod request;
mod response;

pub use client::{ClientFactory, ScopedClient};
pub use headers::{CONTENT_TYPE, HeaderSet, compose_headers};
pub use request::{HttpMethod, OutgoingRequest, RequestPayload};
pub use response::{BodyStream, NormalizedResponse, ResponseBody, flatten_headers};

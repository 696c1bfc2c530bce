//! Small HTTP client core: request construction, payload encoding and
//! composable interception over a pluggable transport.
//!
//! # Overview
//! A `Client` resolves host, scheme, format and headers for each call,
//! encodes the payload, assembles the final URL and body, and hands the
//! result to a `Transport`. The network exchange itself is the transport's
//! job; `UreqTransport` is used when none is injected.
//!
//! # Design
//! - Request preparation (`Client::build_request`) is synchronous and pure,
//!   so the whole pipeline up to the network boundary is testable without I/O.
//! - The configuration is immutable. Interceptors never mutate a client;
//!   `add_request_pre_processor` and `add_response_post_processor` return new
//!   clients whose dispatch strategy wraps the previous one.
//! - Payloads are tagged (`Empty`, `Raw`, `Structured`) so whether a payload
//!   is encoded never depends on inspecting its runtime type.
//!
//! ```ignore
//! use postal_core::{Client, ClientOptions, CallOptions, Format};
//!
//! let client = Client::new(ClientOptions::new("api.example.com").format(Format::Json))?;
//! let response = client
//!     .post("/1/photos", [("caption", "sunset")], CallOptions::new())
//!     .await?;
//! ```

pub mod client;
pub mod encoding;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod transport;

pub use client::{Call, CallOptions, Client, ClientConfig, ClientOptions, Payload};
pub use encoding::{EncodedPayload, Format, FormData};
pub use error::{BoxError, ClientError, TransportError};
pub use http::{Headers, HttpMethod, HttpRequest, TransportResponse};
pub use interceptor::{add_request_pre_processor, add_response_post_processor, CallPatch};
pub use transport::{Transport, UreqTransport};

//! Multi-adapter HTTP request facade
//!
//! This crate puts three structurally different transports behind one
//! request method with consistent configuration merging, timeout
//! enforcement, response decoding and error normalization:
//!
//! - `fetch`: reqwest, with a per request timer racing the response
//! - `event`: reqwest driven through terminal `load`/`error`/`timeout` events
//! - `client`: a pluggable third-party client, bitreq by default
//!
//! Further transports can be registered per client with
//! [`HttpClient::use_adapter`].
//!
//! # Example
//!
//! ```no_run
//! use unifetch::{ClientOptions, HttpClient, RequestConfig};
//!
//! async fn example() -> unifetch::Response<()> {
//!     let client = HttpClient::new(
//!         ClientOptions::default()
//!             .base_url("https://api.example.com/v1")
//!             .timeout_ms(5_000),
//!     );
//!
//!     let users = client.get("/users", RequestConfig::new()).await?;
//!     println!("{:?}", users.as_json());
//!     Ok(())
//! }
//! ```

mod backends;
mod client;
mod config;
mod error;
mod response;
mod timeout;
mod transport;

pub use backends::{
    BitreqClient, ClientRequest, ClientResponse, ClientTransport, EventRequest, EventTransport,
    ExternalClient, FetchTransport, TransportEvent, CLIENT_ADAPTER, EVENT_ADAPTER, FETCH_ADAPTER,
};
pub use client::{fetch, HttpClient, HttpClientBuilder};
pub use config::{
    resolve_url, ClientConfig, ClientOptions, Headers, Method, RequestBody, RequestConfig,
    ResolvedRequest, ResponseType, DEFAULT_CONTENT_TYPE, DEFAULT_TIMEOUT_MS,
};
pub use error::{Error, ErrorCode, HttpError, Normalize, NormalizedError, CONNECTION_ABORTED};
pub use response::{Blob, DecodedBody, RawResponse, Response};
pub use tokio_util::sync::CancellationToken;
pub use transport::{adapter_fn, FnTransport, Transport};

//! Synchronous client for the UniFi Access developer user API.
//!
//! # Overview
//! Every endpoint answers with the same `{code, msg, data}` envelope, and
//! success is signalled by `code == "SUCCESS"` rather than by the HTTP status.
//! The crate builds `HttpRequest` values and decodes `HttpResponse` values
//! without touching the network; a [`Transport`] executes the round-trip.
//!
//! # Design
//! - `RequestBuilder` owns the immutable [`ClientConfig`] and produces
//!   requests carrying the bearer token.
//! - [`decode_envelope`] is the one generic routine that turns a response body
//!   into a typed payload or an [`ApiError`].
//! - [`AccessClient`] composes the two with an injected [`Transport`]. Hosts
//!   that want to own I/O can call the `build_*` / `parse_*` pairs directly.
//!
//! ```no_run
//! use unifi_access::{AccessClient, ClientConfig, UreqTransport};
//!
//! let config = ClientConfig::from_host_port("192.168.1.1", 12445, "token")?;
//! let client = AccessClient::new(config, UreqTransport::new());
//! for user in client.list_users()? {
//!     println!("{} {}", user.first_name, user.last_name);
//! }
//! # Ok::<(), unifi_access::ApiError>(())
//! ```

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::{AccessClient, RequestBuilder};
pub use config::{ClientConfig, StatusPolicy};
pub use envelope::{decode_envelope, Envelope, SUCCESS_CODE};
pub use error::{ApiError, BoxError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{
    AccessPolicy, CreateUser, NfcCard, PinCode, PolicyResource, UpdateUser, User, UserStatus,
};

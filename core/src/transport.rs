//! The I/O seam between request building and envelope decoding.
//!
//! Anything that can turn an [`HttpRequest`] into an [`HttpResponse`] is a
//! transport. [`UreqTransport`] is the blocking default; tests plug in fakes.

use crate::error::BoxError;
use crate::http::{HttpRequest, HttpResponse};

/// Execute a request, returning the response or the failure unchanged.
///
/// Implementations must hand back any HTTP status as data: classifying the
/// response is the client's job, not the transport's.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        (**self).execute(request)
    }
}

#[cfg(feature = "ureq")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use std::time::Duration;

    use super::Transport;
    use crate::error::BoxError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport backed by a shared `ureq::Agent`.
    ///
    /// Status codes are returned as data, and the whole body is read before
    /// returning so the connection goes back to the pool on every path.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            Self::build(None)
        }

        /// A transport that aborts any call running longer than `timeout`.
        pub fn with_timeout(timeout: Duration) -> Self {
            Self::build(Some(timeout))
        }

        fn build(timeout: Option<Duration>) -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(timeout)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
            let HttpRequest {
                method,
                url,
                headers,
                body,
            } = request;

            let mut response = match method {
                HttpMethod::Get => {
                    let mut builder = self.agent.get(&url);
                    for (name, value) in &headers {
                        builder = builder.header(name.as_str(), value.as_str());
                    }
                    builder.call()?
                }
                HttpMethod::Post | HttpMethod::Put => {
                    let mut builder = if method == HttpMethod::Post {
                        self.agent.post(&url)
                    } else {
                        self.agent.put(&url)
                    };
                    for (name, value) in &headers {
                        builder = builder.header(name.as_str(), value.as_str());
                    }
                    match body {
                        Some(body) => builder.send(body.as_bytes())?,
                        None => builder.send_empty()?,
                    }
                }
            };

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.body_mut().read_to_vec()?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}

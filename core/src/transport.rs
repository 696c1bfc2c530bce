//! The network boundary.
//!
//! # Design
//! The builder never performs I/O. It hands method, absolute URL, body and
//! headers to a `Transport` and awaits the settled response. Any type that
//! implements the trait can be injected through `ClientOptions::transport`;
//! `UreqTransport` is used when none is supplied.

use std::fmt;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{Headers, HttpMethod, TransportResponse};

/// Performs a single HTTP exchange.
///
/// Implementations must fail on connection-level errors and must not block
/// the calling task beyond starting the exchange. A non-2xx status is a
/// successful exchange, not an error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<TransportResponse, TransportError>;
}

/// Default transport backed by a blocking `ureq` agent.
///
/// Each exchange runs on the tokio blocking pool and resolves once the whole
/// response body has been read. Outside a tokio runtime every request fails
/// with a `TransportError`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a preconfigured agent. Status-as-error should stay disabled on
    /// it, otherwise 4xx/5xx responses surface as transport failures.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<TransportResponse, TransportError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            tracing::debug!(%method, url, error = %e, "no tokio runtime for ureq transport");
            TransportError::new(e)
        })?;
        let agent = self.agent.clone();
        let url = url.to_string();
        let body = body.to_string();
        let headers = headers.clone();

        runtime
            .spawn_blocking(move || execute(&agent, method, &url, &body, &headers))
            .await
            .map_err(TransportError::new)?
    }
}

fn execute(
    agent: &ureq::Agent,
    method: HttpMethod,
    url: &str,
    body: &str,
    headers: &Headers,
) -> Result<TransportResponse, TransportError> {
    let response = match method {
        HttpMethod::Get => {
            let mut req = agent.get(url);
            for (name, value) in headers {
                req = req.header(name.as_str(), value.as_str());
            }
            req.call()
        }
        HttpMethod::Delete => {
            let mut req = agent.delete(url);
            for (name, value) in headers {
                req = req.header(name.as_str(), value.as_str());
            }
            if body.is_empty() {
                req.call()
            } else {
                req.force_send_body().send(body.as_bytes())
            }
        }
        HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => {
            let mut req = match method {
                HttpMethod::Post => agent.post(url),
                HttpMethod::Put => agent.put(url),
                _ => agent.patch(url),
            };
            for (name, value) in headers {
                req = req.header(name.as_str(), value.as_str());
            }
            req.send(body.as_bytes())
        }
    };

    let mut response = response.map_err(|e| {
        tracing::debug!(%method, url, error = %e, "transport request failed");
        TransportError::new(e)
    })?;
    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(TransportError::new)?;

    Ok(TransportResponse { status, body })
}

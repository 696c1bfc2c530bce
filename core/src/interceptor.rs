//! Request and response interception.
//!
//! Both wrappers return a new `Client` with its own configuration copy and a
//! dispatch strategy layered over the original's. The wrapped client is left
//! untouched and wrappers may be stacked:
//!
//! - pre-processors run outermost first, before the request is built;
//! - post-processors run innermost first, after the transport settles.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::client::{Call, CallOptions, Client, Dispatch, Payload};
use crate::error::ClientError;
use crate::http::{HttpMethod, TransportResponse};

/// Replacement call arguments returned by a request pre-processor. Fields
/// left as `None` keep the caller's value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallPatch {
    pub method: Option<HttpMethod>,
    pub path: Option<String>,
    pub payload: Option<Payload>,
    pub options: Option<CallOptions>,
}

impl CallPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn options(mut self, options: CallOptions) -> Self {
        self.options = Some(options);
        self
    }
}

impl Call {
    /// Overlay the fields `patch` carries.
    pub fn apply(self, patch: CallPatch) -> Call {
        Call {
            method: patch.method.unwrap_or(self.method),
            path: patch.path.unwrap_or(self.path),
            payload: patch.payload.unwrap_or(self.payload),
            options: patch.options.unwrap_or(self.options),
        }
    }
}

type PreProcessorFn =
    dyn Fn(HttpMethod, &str, &Payload, &CallOptions) -> Result<CallPatch, ClientError> + Send + Sync;

type PostProcessorFn =
    dyn Fn(TransportResponse) -> BoxFuture<'static, Result<TransportResponse, ClientError>> + Send + Sync;

struct PreProcessed {
    inner: Arc<dyn Dispatch>,
    processor: Box<PreProcessorFn>,
}

#[async_trait]
impl Dispatch for PreProcessed {
    async fn dispatch(&self, call: Call) -> Result<TransportResponse, ClientError> {
        let patch = (self.processor)(call.method, &call.path, &call.payload, &call.options)?;
        tracing::trace!(?patch, "request pre-processor applied");
        self.inner.dispatch(call.apply(patch)).await
    }
}

struct PostProcessed {
    inner: Arc<dyn Dispatch>,
    processor: Box<PostProcessorFn>,
}

#[async_trait]
impl Dispatch for PostProcessed {
    async fn dispatch(&self, call: Call) -> Result<TransportResponse, ClientError> {
        let response = self.inner.dispatch(call).await?;
        tracing::trace!(status = response.status, "running response post-processor");
        (self.processor)(response).await
    }
}

/// Client that passes every call through `processor` before building it.
///
/// An `Err` from the processor fails the call without reaching the transport.
///
/// ```ignore
/// let authed = add_request_pre_processor(&client, |_, _, _, options| {
///     Ok(CallPatch::new().options(options.clone().header("X-Auth", "secret")))
/// });
/// ```
pub fn add_request_pre_processor<F>(client: &Client, processor: F) -> Client
where
    F: Fn(HttpMethod, &str, &Payload, &CallOptions) -> Result<CallPatch, ClientError>
        + Send
        + Sync
        + 'static,
{
    client.wrap(|inner| {
        Arc::new(PreProcessed {
            inner,
            processor: Box::new(processor),
        })
    })
}

/// Client whose successful responses are fed through `processor`. Its
/// output, or its rejection, becomes the call's result.
///
/// ```ignore
/// let strict = add_response_post_processor(&client, |response| async move {
///     if response.status >= 400 {
///         return Err(ClientError::processor(response.body));
///     }
///     Ok(response)
/// });
/// ```
pub fn add_response_post_processor<F, Fut>(client: &Client, processor: F) -> Client
where
    F: Fn(TransportResponse) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<TransportResponse, ClientError>> + Send + 'static,
{
    client.wrap(|inner| {
        Arc::new(PostProcessed {
            inner,
            processor: Box::new(move |response| processor(response).boxed()),
        })
    })
}

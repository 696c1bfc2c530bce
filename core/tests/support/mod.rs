//! Shared test transport that records every request and replays queued
//! responses.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use postal_core::{
    Client, ClientOptions, Format, Headers, HttpMethod, HttpRequest, Transport, TransportError,
    TransportResponse,
};

/// Outcome the transport replays for the next request.
pub enum Reply {
    Respond(TransportResponse),
    Fail(&'static str),
}

#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<HttpRequest>>,
    replies: Mutex<VecDeque<Reply>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        let transport = Self::default();
        transport.replies.lock().unwrap().extend(replies);
        Arc::new(transport)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(HttpRequest {
            method,
            url: url.to_string(),
            headers: headers.clone(),
            body: body.to_string(),
        });
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(TransportError::new(message)),
            None => Ok(TransportResponse::new(200, "")),
        }
    }
}

/// Client for `example.com` using `format` as default and `transport` for I/O.
pub fn client(format: Format, transport: &Arc<RecordingTransport>) -> Client {
    Client::new(
        ClientOptions::new("example.com")
            .format(format)
            .transport(Arc::clone(transport) as Arc<dyn Transport>),
    )
    .unwrap()
}

pub fn headers(pairs: &[(&str, &str)]) -> Headers {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

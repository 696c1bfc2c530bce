//! Request construction and dispatch.
//!
//! # Design
//! `Client` owns an immutable `ClientConfig` and a dispatch strategy. The
//! base strategy prepares an `HttpRequest` with `ClientConfig::build_request`
//! and hands it to the configured transport. Interceptor wrappers produce a
//! new `Client` whose strategy closes over the previous one, so the original
//! client keeps working unchanged.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::encoding::{self, EncodedPayload, Format, FormData};
use crate::error::ClientError;
use crate::http::{Headers, HttpMethod, HttpRequest, TransportResponse};
use crate::transport::{Transport, UreqTransport};

const CONTENT_TYPE: &str = "content-type";
const TEXT_PLAIN: &str = "text/plain";

/// Request payload.
///
/// `Structured` payloads are always encoded. `Raw` payloads are sent
/// verbatim unless a format is requested explicitly. `Empty` is never
/// encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Payload {
    #[default]
    Empty,
    Raw(String),
    Structured(FormData),
}

impl From<&str> for Payload {
    fn from(body: &str) -> Self {
        Payload::Raw(body.to_string())
    }
}

impl From<String> for Payload {
    fn from(body: String) -> Self {
        Payload::Raw(body)
    }
}

impl From<FormData> for Payload {
    fn from(data: FormData) -> Self {
        Payload::Structured(data)
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Payload {
    fn from(pairs: [(K, V); N]) -> Self {
        Payload::Structured(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<Vec<(String, String)>> for Payload {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Payload::Structured(pairs.into_iter().collect())
    }
}

impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(payload: Option<T>) -> Self {
        payload.map_or(Payload::Empty, Into::into)
    }
}

/// Per-call overrides. Unset fields fall back to the client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    pub https: Option<bool>,
    pub host: Option<String>,
    /// Format name. Kept as a name so an unknown format reaches the builder
    /// and is rejected there.
    pub format: Option<String>,
    /// Extra headers. Names are lower-cased when the request is built.
    pub headers: Headers,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn https(mut self, https: bool) -> Self {
        self.https = Some(https);
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Options a client is constructed from.
///
/// Everything except the transport can be deserialized, so settings may
/// come from a config file:
///
/// ```ignore
/// let options: ClientOptions = serde_json::from_str(r#"{"host":"example.com","format":"json"}"#)?;
/// let client = Client::new(options.transport(my_transport))?;
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientOptions {
    /// Defaults to `true`.
    pub https: Option<bool>,
    /// Required. A leading `http://` or `https://` selects the scheme and is
    /// removed from the stored host.
    pub host: Option<String>,
    /// Defaults to `Format::Urlencoded`.
    pub format: Option<Format>,
    /// Defaults to `UreqTransport`.
    #[serde(skip)]
    pub transport: Option<Arc<dyn Transport>>,
}

impl ClientOptions {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }

    pub fn https(mut self, https: bool) -> Self {
        self.https = Some(https);
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("https", &self.https)
            .field("host", &self.host)
            .field("format", &self.format)
            .field("transport", &self.transport.as_ref().map(|_| "<transport>"))
            .finish()
    }
}

/// Resolved, immutable client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    pub use_https: bool,
    /// Host without scheme, e.g. `api.example.com` or `localhost:3000/v1`.
    pub host: String,
    pub default_format: Format,
    pub transport: Arc<dyn Transport>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("use_https", &self.use_https)
            .field("host", &self.host)
            .field("default_format", &self.default_format)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Resolve options into a configuration.
    ///
    /// # Errors
    /// `ClientError::InvalidConfig` when no host is given or it is empty.
    pub fn from_options(options: ClientOptions) -> Result<Self, ClientError> {
        let raw_host = options
            .host
            .ok_or_else(|| ClientError::InvalidConfig("host is required".to_string()))?;

        let (use_https, host) = if let Some(rest) = raw_host.strip_prefix("http://") {
            (options.https == Some(true), rest)
        } else if let Some(rest) = raw_host.strip_prefix("https://") {
            (options.https != Some(false), rest)
        } else {
            (options.https.unwrap_or(true), raw_host.as_str())
        };
        if host.trim_matches('/').is_empty() {
            return Err(ClientError::InvalidConfig("host must not be empty".to_string()));
        }

        Ok(Self {
            use_https,
            host: host.to_string(),
            default_format: options.format.unwrap_or_default(),
            transport: options
                .transport
                .unwrap_or_else(|| Arc::new(UreqTransport::new())),
        })
    }

    /// Options that rebuild an equivalent configuration.
    pub fn to_options(&self) -> ClientOptions {
        ClientOptions {
            https: Some(self.use_https),
            host: Some(self.host.clone()),
            format: Some(self.default_format),
            transport: Some(Arc::clone(&self.transport)),
        }
    }

    /// Prepare the request a call resolves to, without sending it.
    ///
    /// # Errors
    /// `ClientError::UnsupportedFormat` when `options.format` names an
    /// unknown format.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        payload: &Payload,
        options: &CallOptions,
    ) -> Result<HttpRequest, ClientError> {
        let format = match options.format.as_deref() {
            Some(name) => name.parse::<Format>().inspect_err(|_| {
                tracing::warn!(%method, path, format = name, "rejecting call with unsupported format");
            })?,
            None if method == HttpMethod::Get => Format::Urlencoded,
            None => self.default_format,
        };
        let explicit_format = options.format.is_some();

        let encoded = match payload {
            Payload::Structured(data) => encoding::encode(format, data)?,
            Payload::Raw(body) if explicit_format => EncodedPayload {
                content_type: format.content_type().to_string(),
                body: body.clone(),
            },
            Payload::Raw(body) => EncodedPayload {
                content_type: TEXT_PLAIN.to_string(),
                body: body.clone(),
            },
            Payload::Empty => EncodedPayload {
                content_type: TEXT_PLAIN.to_string(),
                body: String::new(),
            },
        };
        tracing::trace!(content_type = %encoded.content_type, "payload prepared");

        let use_https = options.https.unwrap_or(self.use_https);
        let host = options
            .host
            .as_deref()
            .filter(|host| !host.trim_end_matches('/').is_empty())
            .unwrap_or(&self.host);
        let mut url = join_url(use_https, host, path);

        let body = if method == HttpMethod::Get {
            if !encoded.body.is_empty() {
                url.push('?');
                url.push_str(&encoded.body);
            }
            String::new()
        } else {
            encoded.body
        };

        let mut headers: Headers = options
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect();
        if method != HttpMethod::Get && headers.get(CONTENT_TYPE).map_or(true, String::is_empty) {
            headers.insert(CONTENT_TYPE.to_string(), encoded.content_type);
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }
}

/// `scheme://host/path` with exactly one slash between host and path.
fn join_url(use_https: bool, host: &str, path: &str) -> String {
    let scheme = if use_https { "https" } else { "http" };
    format!(
        "{scheme}://{}/{}",
        host.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Arguments of a single client call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: HttpMethod,
    pub path: String,
    pub payload: Payload,
    pub options: CallOptions,
}

/// The strategy a `Client` runs for every call.
#[async_trait]
pub(crate) trait Dispatch: Send + Sync {
    async fn dispatch(&self, call: Call) -> Result<TransportResponse, ClientError>;
}

/// Builds the request and sends it through the configured transport.
struct Direct {
    config: Arc<ClientConfig>,
}

#[async_trait]
impl Dispatch for Direct {
    async fn dispatch(&self, call: Call) -> Result<TransportResponse, ClientError> {
        let request =
            self.config
                .build_request(call.method, &call.path, &call.payload, &call.options)?;
        tracing::debug!(method = %request.method, url = %request.url, "dispatching request");

        let response = self
            .config
            .transport
            .request(request.method, &request.url, &request.body, &request.headers)
            .await?;
        tracing::debug!(status = response.status, url = %request.url, "request settled");
        Ok(response)
    }
}

/// HTTP client that prepares requests and hands them to a `Transport`.
///
/// Cloning is cheap and yields a client sharing the same strategy.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    dispatch: Arc<dyn Dispatch>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// # Errors
    /// `ClientError::InvalidConfig` when the options carry no usable host.
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        let config = Arc::new(ClientConfig::from_options(options)?);
        let dispatch = Arc::new(Direct {
            config: Arc::clone(&config),
        });
        Ok(Self { config, dispatch })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Options sufficient to construct an equivalent, unwrapped client.
    pub fn options(&self) -> ClientOptions {
        self.config.to_options()
    }

    /// Prepare the request a call would send, ignoring any processors.
    ///
    /// # Errors
    /// See `ClientConfig::build_request`.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        payload: &Payload,
        options: &CallOptions,
    ) -> Result<HttpRequest, ClientError> {
        self.config.build_request(method, path, payload, options)
    }

    /// Copy of this client whose strategy is `wrap(previous strategy)`.
    pub(crate) fn wrap(&self, wrap: impl FnOnce(Arc<dyn Dispatch>) -> Arc<dyn Dispatch>) -> Self {
        Self {
            config: Arc::new(ClientConfig::clone(&self.config)),
            dispatch: wrap(Arc::clone(&self.dispatch)),
        }
    }

    /// Send a request.
    ///
    /// # Errors
    /// Unsupported format, transport failure, or a processor rejection.
    pub async fn raw(
        &self,
        method: HttpMethod,
        path: impl Into<String>,
        payload: impl Into<Payload>,
        options: CallOptions,
    ) -> Result<TransportResponse, ClientError> {
        let call = Call {
            method,
            path: path.into(),
            payload: payload.into(),
            options,
        };
        self.dispatch.dispatch(call).await
    }

    pub async fn get(
        &self,
        path: impl Into<String>,
        payload: impl Into<Payload>,
        options: CallOptions,
    ) -> Result<TransportResponse, ClientError> {
        self.raw(HttpMethod::Get, path, payload, options).await
    }

    pub async fn post(
        &self,
        path: impl Into<String>,
        payload: impl Into<Payload>,
        options: CallOptions,
    ) -> Result<TransportResponse, ClientError> {
        self.raw(HttpMethod::Post, path, payload, options).await
    }

    pub async fn put(
        &self,
        path: impl Into<String>,
        payload: impl Into<Payload>,
        options: CallOptions,
    ) -> Result<TransportResponse, ClientError> {
        self.raw(HttpMethod::Put, path, payload, options).await
    }

    pub async fn patch(
        &self,
        path: impl Into<String>,
        payload: impl Into<Payload>,
        options: CallOptions,
    ) -> Result<TransportResponse, ClientError> {
        self.raw(HttpMethod::Patch, path, payload, options).await
    }

    pub async fn delete(
        &self,
        path: impl Into<String>,
        payload: impl Into<Payload>,
        options: CallOptions,
    ) -> Result<TransportResponse, ClientError> {
        self.raw(HttpMethod::Delete, path, payload, options).await
    }
}

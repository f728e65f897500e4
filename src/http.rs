use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::call::{encode_request, RpcResponse};
use crate::error::Error;
use crate::options::{CallConfig, CallOption};
use crate::response::{classify, CallOutcome};
use crate::Result;

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Sends one POST and hands back the raw body. The status is not interpreted.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse>> + Send;
}

#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client, e.g. one carrying a request timeout.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self
            .client
            .post(request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn header_map(config: &CallConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (key, value) in &config.headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| Error::InvalidArgument(format!("header name {key:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::InvalidArgument(format!("header {key:?} value: {e}")))?;
        headers.insert(name, value);
    }
    if !config.auth_token.is_empty() {
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.auth_token))
            .map_err(|e| Error::InvalidArgument(format!("auth token: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
    }
    Ok(headers)
}

/// Gateway client. Cloning is cheap and clones share the base options.
pub struct Client<T = HttpTransport> {
    inner: Arc<ClientInner<T>>,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Client {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Deref for Client<T> {
    type Target = ClientInner<T>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Client {
    pub fn new(base_options: impl IntoIterator<Item = CallOption>) -> Self {
        Self::with_transport(HttpTransport::new(), base_options)
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(transport: T, base_options: impl IntoIterator<Item = CallOption>) -> Self {
        Client {
            inner: Arc::new(ClientInner {
                transport,
                base_options: base_options.into_iter().collect(),
            }),
        }
    }
}

pub struct ClientInner<T> {
    transport: T,
    base_options: Arc<[CallOption]>,
}

impl<T: Transport> ClientInner<T> {
    pub fn base_options(&self) -> &[CallOption] {
        &self.base_options
    }

    /// Invokes the contract `method`. Phylum errors are returned as
    /// [`CallOutcome::Failure`]; everything else that goes wrong is an [`Error`].
    pub async fn call(
        &self,
        method: &str,
        options: impl IntoIterator<Item = CallOption>,
    ) -> Result<CallOutcome> {
        let options: Vec<CallOption> = options.into_iter().collect();
        let config = CallConfig::merge(&self.base_options, &options);
        let resp = self.exchange(method, &config).await?;
        let outcome = classify(resp);
        if let Err(Error::Client(ref err)) = outcome {
            tracing::warn!(id = %config.id, method, "client error: {err}");
        }
        outcome
    }

    /// Sends one `Call` envelope and validates the response shape.
    pub async fn exchange(&self, method: &str, config: &CallConfig) -> Result<RpcResponse> {
        if method.is_empty() {
            return Err(Error::InvalidArgument("method must be specified".to_string()));
        }
        if config.endpoint.is_empty() {
            return Err(Error::InvalidArgument("expected an endpoint to be set".to_string()));
        }
        let headers = header_map(config)?;
        let body = encode_request(method, config)?;
        tracing::debug!(id = %config.id, "REQUEST: {}", String::from_utf8_lossy(&body));

        let response = self
            .transport
            .send(HttpRequest {
                url: config.endpoint.clone(),
                headers,
                body,
            })
            .await?;
        tracing::debug!(
            id = %config.id,
            status = response.status,
            "RESPONSE: {}",
            String::from_utf8_lossy(&response.body)
        );

        RpcResponse::from_body(&response.body).map_err(|e| {
            tracing::error!(id = %config.id, "invalid response envelope: {e}");
            Error::from(e)
        })
    }
}

//! reqwest-backed transport

use async_trait::async_trait;
use osc_core::{
    ClientConfig, Error, Method, ResponseEnvelope, Result, Transport, TransportErrorKind, WireBody,
    WireRequest,
};

/// Sends wire requests with a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client sized to the configured pool limits
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(config.pool.max_per_route)
            .pool_idle_timeout(config.pool.idle_eviction())
            .user_agent(concat!("osc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn classify(error: &reqwest::Error) -> TransportErrorKind {
    if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if error.is_connect() {
        TransportErrorKind::Connect
    } else if error.is_body() || error.is_decode() || error.is_request() {
        TransportErrorKind::Io
    } else {
        TransportErrorKind::Other
    }
}

fn transport_error(error: reqwest::Error) -> Error {
    let kind = classify(&error);
    Error::transport(kind, error.to_string())
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: WireRequest) -> Result<ResponseEnvelope> {
        tracing::trace!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            WireBody::Empty => builder,
            WireBody::Json(bytes) => builder.body(bytes),
            WireBody::Multipart(body) => {
                let stream = body.open().await.map_err(|e| {
                    Error::InvalidRequest(format!(
                        "cannot reopen upload file {}: {e}",
                        body.path().display()
                    ))
                })?;
                builder
                    .header(reqwest::header::CONTENT_LENGTH, body.content_length().to_string())
                    .body(reqwest::Body::wrap_stream(stream))
            }
        };

        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(transport_error)?;

        Ok(ResponseEnvelope {
            status,
            headers,
            body,
        })
    }
}

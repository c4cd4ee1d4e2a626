//! The pluggable layer which actually puts bytes on the wire.

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, Method, StatusCode};
use url::Url;

/// A fully resolved HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Request {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new<B: Into<Vec<u8>>>(status: StatusCode, body: B) -> Self {
        Response {
            status,
            body: body.into(),
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Something which can send a [`Request`] and hand back the [`Response`].
///
/// Implementations don't interpret status codes. A 500 is still an `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

/// The request could not be completed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP client encountered an error.
    #[error("Unable to send the request")]
    HttpClient(#[from] reqwest::Error),
    #[error("Unable to reach the server")]
    Connection(#[from] std::io::Error),
}

/// A [`Transport`] backed by [`reqwest`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .build()?;

        Ok(ReqwestTransport::with_client(client))
    }

    pub fn with_client(client: Client) -> Self { ReqwestTransport { client } }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let Request {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await?;
        log::trace!("Headers: {:#?}", response.headers());

        let status = response.status();
        let body = response.bytes().await?;

        Ok(Response::new(status, body.to_vec()))
    }
}

//! A thin HTTP client which knows about the current session.
//!
//! Outgoing requests pick up the bearer token from [`Storage`], and a `401
//! Unauthorized` on an authenticated request tears the session down through
//! a single hook instead of being handled separately by every caller.

use crate::{
    storage::Storage,
    transport::{Request, Response, Transport, TransportError},
    SessionStore,
};
use reqwest::{
    header::{HeaderValue, AUTHORIZATION},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};
use url::Url;

type UnauthorizedHook = Arc<dyn Fn(&str) + Send + Sync>;

/// How a request should authenticate itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Auth {
    /// Use whatever token is in storage, and treat a 401 as the session
    /// being revoked.
    Stored,
    /// Use this exact token. A 401 is reported but doesn't touch the
    /// session.
    Bearer(String),
    /// Don't send any credentials.
    Anonymous,
}

#[derive(Clone)]
pub struct HttpClient {
    base_url: Url,
    transport: Arc<dyn Transport>,
    storage: Arc<dyn Storage>,
    on_unauthorized: UnauthorizedHook,
}

impl HttpClient {
    pub fn new(
        base_url: Url,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        HttpClient::with_unauthorized_hook(base_url, transport, storage, |_| {})
    }

    /// Create a client which calls `on_unauthorized` with the rejected token
    /// whenever the backend refuses a token taken from storage.
    pub fn with_unauthorized_hook<F>(
        base_url: Url,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn Storage>,
        on_unauthorized: F,
    ) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        HttpClient {
            base_url,
            transport,
            storage,
            on_unauthorized: Arc::new(on_unauthorized),
        }
    }

    pub fn base_url(&self) -> &Url { &self.base_url }

    /// Resolve a path (e.g. `/api/user`) against the base URL.
    pub fn url(&self, path: &str) -> Result<Url, EndpointError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }

        base.join(path.trim_start_matches('/'))
            .map_err(|e| EndpointError::BadUrl {
                path: path.to_string(),
                inner: e,
            })
    }

    /// Send a request and deserialize its JSON response.
    pub async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> Result<T, EndpointError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, auth).await?;

        serde_json::from_slice(&response.body).map_err(EndpointError::Parse)
    }

    /// Send a request, checking its status but ignoring the body.
    pub async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> Result<Response, EndpointError>
    where
        B: Serialize + ?Sized,
    {
        let mut request = Request::new(method, self.url(path)?);
        if let Some(body) = body {
            request.body =
                Some(serde_json::to_value(body).map_err(EndpointError::Parse)?);
        }

        let from_storage = auth == Auth::Stored;
        let sent = self.authorize(&mut request, auth);

        log::debug!("Sending a {} request to {}", request.method, request.url);
        let response = self.transport.send(request).await?;
        log::trace!("Response {}: {}", response.status, response.text());

        if response.status == StatusCode::UNAUTHORIZED {
            match sent {
                Some(token) if from_storage => {
                    log::info!("The backend rejected the stored token");
                    (self.on_unauthorized)(&token);
                },
                _ => {},
            }
            return Err(EndpointError::Unauthorized);
        }

        if !response.status.is_success() {
            return Err(EndpointError::Status {
                status: response.status,
                message: error_message(&response),
            });
        }

        Ok(response)
    }

    /// Attach a bearer header, returning the token that was actually sent.
    fn authorize(&self, request: &mut Request, auth: Auth) -> Option<String> {
        let token = match auth {
            Auth::Stored => SessionStore::new(&*self.storage).token(),
            Auth::Bearer(token) => Some(token),
            Auth::Anonymous => None,
        }?;

        let mut header =
            HeaderValue::from_str(&format!("Bearer {}", token)).ok()?;
        header.set_sensitive(true);
        request.headers.insert(AUTHORIZATION, header);

        Some(token)
    }
}

impl Debug for HttpClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

/// Pull a human-readable message out of an error response, preferring the
/// backend's `message` field.
fn error_message(response: &Response) -> String {
    #[derive(serde_derive::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    match serde_json::from_slice::<ErrorBody>(&response.body) {
        Ok(body) => body.message,
        Err(_) => response.text().trim().to_string(),
    }
}

/// Typical endpoint errors.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// The request never got a response.
    #[error("Unable to send the request")]
    Transport(#[from] TransportError),
    /// The token was missing, expired or rejected.
    #[error("The request was not authorized")]
    Unauthorized,
    #[error("The server responded with {}: {}", status, message)]
    Status { status: StatusCode, message: String },
    #[error("Unable to parse the response")]
    Parse(#[source] serde_json::Error),
    /// A form failed its required-field checks and was never sent.
    #[error("Invalid input")]
    Validation(#[from] crate::validate::ValidationError),
    #[error("\"{}\" is not a valid endpoint path", path)]
    BadUrl {
        path: String,
        #[source]
        inner: url::ParseError,
    },
}

impl EndpointError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            EndpointError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            EndpointError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{storage::MemoryStorage, transport::mock::MockTransport};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client(
        transport: &MockTransport,
        storage: &Arc<MemoryStorage>,
        hits: &Arc<AtomicUsize>,
    ) -> HttpClient {
        let hits = Arc::clone(hits);
        HttpClient::with_unauthorized_hook(
            Url::parse("http://localhost:3000").unwrap(),
            Arc::new(transport.clone()),
            Arc::clone(storage) as Arc<dyn Storage>,
            move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            },
        )
    }

    #[test]
    fn paths_are_joined_onto_the_base_url() {
        let client = HttpClient::new(
            Url::parse("https://example.com/console").unwrap(),
            Arc::new(MockTransport::default()),
            Arc::new(MemoryStorage::default()),
        );

        let got = client.url("/api/user/login").unwrap();

        assert_eq!(got.as_str(), "https://example.com/console/api/user/login");
    }

    #[tokio::test]
    async fn stored_token_is_attached_as_a_bearer_header() {
        let transport = MockTransport::default();
        let storage = Arc::new(MemoryStorage::default());
        storage.save("access_token", "secret-token");
        transport.respond(StatusCode::OK, "[]");
        let hits = Arc::new(AtomicUsize::new(0));
        let client = client(&transport, &storage, &hits);

        let roles: Vec<String> = client
            .send_json(Method::GET, "/api/roles", None::<&()>, Auth::Stored)
            .await
            .unwrap();

        assert!(roles.is_empty());
        let requests = transport.requests();
        assert_eq!(
            requests[0].headers[AUTHORIZATION],
            "Bearer secret-token"
        );
    }

    #[tokio::test]
    async fn anonymous_requests_carry_no_credentials() {
        let transport = MockTransport::default();
        let storage = Arc::new(MemoryStorage::default());
        storage.save("access_token", "secret-token");
        transport.respond(StatusCode::OK, "");
        let hits = Arc::new(AtomicUsize::new(0));
        let client = client(&transport, &storage, &hits);

        client
            .send(
                Method::DELETE,
                "/api/user/a@b.c/password",
                None::<&()>,
                Auth::Anonymous,
            )
            .await
            .unwrap();

        assert!(transport.requests()[0].headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn unauthorized_response_triggers_the_hook() {
        let transport = MockTransport::default();
        let storage = Arc::new(MemoryStorage::default());
        storage.save("access_token", "expired");
        transport.respond(StatusCode::UNAUTHORIZED, "");
        let hits = Arc::new(AtomicUsize::new(0));
        let client = client(&transport, &storage, &hits);

        let err = client
            .send(Method::GET, "/api/user", None::<&()>, Auth::Stored)
            .await
            .unwrap_err();

        assert!(matches!(err, EndpointError::Unauthorized));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unauthorized_without_a_stored_token_is_not_a_revocation() {
        let transport = MockTransport::default();
        let storage = Arc::new(MemoryStorage::default());
        transport.respond(StatusCode::UNAUTHORIZED, "");
        let hits = Arc::new(AtomicUsize::new(0));
        let client = client(&transport, &storage, &hits);

        let err = client
            .send(Method::GET, "/api/user", None::<&()>, Auth::Stored)
            .await
            .unwrap_err();

        assert!(matches!(err, EndpointError::Unauthorized));
        assert!(transport.requests()[0].headers.get(AUTHORIZATION).is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unauthorized_explicit_token_leaves_the_session_alone() {
        let transport = MockTransport::default();
        let storage = Arc::new(MemoryStorage::default());
        transport.respond(StatusCode::UNAUTHORIZED, "");
        let hits = Arc::new(AtomicUsize::new(0));
        let client = client(&transport, &storage, &hits);

        let err = client
            .send(
                Method::POST,
                "/api/user/logout",
                None::<&()>,
                Auth::Bearer(String::from("old")),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EndpointError::Unauthorized));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn error_messages_come_from_the_body() {
        let transport = MockTransport::default();
        let storage = Arc::new(MemoryStorage::default());
        transport.respond(
            StatusCode::CONFLICT,
            r#"{"message": "Invitation already sent"}"#,
        );
        let hits = Arc::new(AtomicUsize::new(0));
        let client = client(&transport, &storage, &hits);

        let err = client
            .send(Method::POST, "/api/invitation", Some(&()), Auth::Stored)
            .await
            .unwrap_err();

        match err {
            EndpointError::Status { status, message } => {
                assert_eq!(status, StatusCode::CONFLICT);
                assert_eq!(message, "Invitation already sent");
            },
            other => panic!("Unexpected error: {:?}", other),
        }
    }
}

//! Session lifecycle: logging in, MFA, logging out, and the inactivity
//! timeout.

use crate::{
    config::{Config, Paths},
    endpoints::{self, EndpointError, LoginError, LoginResponse, MfaChallenge},
    models::User,
    storage::Storage,
    timer::{Activity, InactivityTimer},
    transport::{ReqwestTransport, Transport, TransportError},
    validate::{self, PasswordReset, ValidationError},
    HttpClient, Id, Session, SessionStore,
};
use reqwest::StatusCode;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::{runtime::Handle, sync::watch};

/// Where the current session is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Anonymous,
    /// The password was accepted but a one-time code is still needed.
    /// Nothing has been persisted yet.
    MfaPending(MfaChallenge),
    Authenticated(Session),
}

impl AuthState {
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated(session) => Some(&session.user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn is_mfa_pending(&self) -> bool {
        matches!(self, AuthState::MfaPending(_))
    }
}

/// The result of a successful [`SessionService::login()`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Authenticated(User),
    /// Call [`SessionService::verify_mfa()`] to finish logging in.
    MfaRequired(MfaChallenge),
}

/// Why a session ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user asked to log out.
    Explicit,
    /// Nobody touched anything for too long.
    Inactivity,
    /// The backend stopped accepting our token.
    Unauthorized,
}

/// Owns the session: the persisted token and user, the observable
/// [`AuthState`], and the inactivity timer.
///
/// Cloning is cheap and every clone refers to the same session.
#[derive(Debug, Clone)]
pub struct SessionService {
    inner: Arc<Inner>,
}

impl SessionService {
    /// Create a service which talks to the real backend, restoring any
    /// session left in the configured storage.
    pub fn new(config: &Config) -> Result<Self, SessionError> {
        let transport = ReqwestTransport::new(&config.user_agent)
            .map_err(|e| SessionError::Network(e.into()))?;

        Ok(SessionService::with_parts(
            config,
            Arc::new(transport),
            config.storage.open(),
        ))
    }

    /// Create a service from an explicit transport and storage.
    pub fn with_parts(
        config: &Config,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let restored = SessionStore::new(&*storage).load();
        let initial = match &restored {
            Some(session) => AuthState::Authenticated(session.clone()),
            None => AuthState::Anonymous,
        };
        let (state, _) = watch::channel(initial);

        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let on_unauthorized = Weak::clone(weak);
            let http = HttpClient::with_unauthorized_hook(
                config.base_url.clone(),
                transport,
                Arc::clone(&storage),
                move |rejected| {
                    if let Some(inner) = on_unauthorized.upgrade() {
                        inner.revoke(rejected);
                    }
                },
            );

            let on_expire = Weak::clone(weak);
            let timer =
                InactivityTimer::new(config.inactivity_timeout, move || {
                    if let Some(inner) = on_expire.upgrade() {
                        inner.teardown(LogoutReason::Inactivity);
                    }
                });

            Inner {
                http,
                storage,
                paths: config.paths.clone(),
                timer,
                state,
                control: Mutex::new(Control::default()),
            }
        });

        if let Some(session) = restored {
            log::info!("Restored the session for {}", session.user.email);
            inner.timer.start();
        }

        SessionService { inner }
    }

    /// Log in with an email and password.
    ///
    /// If [`SessionService::logout()`] is called while this is waiting on
    /// the backend, the response is thrown away and
    /// [`SessionError::Interrupted`] is returned.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, SessionError> {
        validate::credentials(email, password)?;

        let generation = self.inner.generation();
        let response = endpoints::login(
            &self.inner.http,
            &self.inner.paths,
            email.trim(),
            password,
        )
        .await?;

        match response {
            LoginResponse::Session(session) => self
                .inner
                .establish(generation, session)
                .map(LoginOutcome::Authenticated),
            LoginResponse::MfaRequired(challenge) => {
                self.inner.await_mfa(generation, challenge.clone())?;
                Ok(LoginOutcome::MfaRequired(challenge))
            },
        }
    }

    /// Answer a pending MFA challenge with the user's one-time code.
    ///
    /// A rejected code leaves the challenge in place so the user can try
    /// again.
    pub async fn verify_mfa(
        &self,
        user_id: &Id,
        code: &str,
    ) -> Result<User, SessionError> {
        let challenge = match self.state() {
            AuthState::MfaPending(challenge) => challenge,
            _ => return Err(SessionError::NoMfaPending),
        };

        if challenge.user_id != *user_id {
            return Err(ValidationError::new(
                "userId",
                "does not match the pending challenge",
            )
            .into());
        }
        if code.trim().is_empty() {
            return Err(ValidationError::new("code", "is required").into());
        }

        let generation = self.inner.generation();
        let result = endpoints::verify_mfa(
            &self.inner.http,
            &self.inner.paths,
            user_id,
            code.trim(),
        )
        .await;

        match result {
            Ok(session) => self.inner.establish(generation, session),
            Err(LoginError::InvalidCredentials) => {
                log::info!("The one-time code for {} was rejected", user_id);
                Err(SessionError::MfaRejected)
            },
            Err(other) => Err(other.into()),
        }
    }

    /// Abandon a pending MFA challenge.
    pub fn cancel_mfa(&self) { self.inner.cancel_mfa(); }

    /// End the session.
    ///
    /// Local state is cleared immediately. The backend is told in the
    /// background and a failure there is only logged. Logging out when
    /// already logged out does nothing.
    pub fn logout(&self) {
        let token = match self.inner.teardown(LogoutReason::Explicit) {
            Some(token) => token,
            None => return,
        };

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(notify_backend(
                    self.inner.http.clone(),
                    self.inner.paths.clone(),
                    token,
                ));
            },
            Err(_) => {
                log::warn!("No async runtime, skipping the backend logout")
            },
        }
    }

    /// Like [`SessionService::logout()`], but waits for the backend to
    /// acknowledge (or fail) before returning. Useful for short-lived
    /// processes which would otherwise exit before the request goes out.
    pub async fn logout_and_wait(&self) {
        if let Some(token) = self.inner.teardown(LogoutReason::Explicit) {
            notify_backend(
                self.inner.http.clone(),
                self.inner.paths.clone(),
                token,
            )
            .await;
        }
    }

    /// Let the service know the user is still around.
    pub fn record_activity(&self, activity: Activity) {
        if self.is_authenticated() {
            log::trace!("Activity: {:?}", activity);
            self.inner.timer.touch();
        }
    }

    /// Start an OTP password reset by having the backend email a code.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<(), SessionError> {
        endpoints::request_password_reset(
            &self.inner.http,
            &self.inner.paths,
            email,
        )
        .await
        .map_err(SessionError::from)
    }

    /// Finish an OTP password reset.
    pub async fn reset_password(
        &self,
        reset: &PasswordReset,
    ) -> Result<(), SessionError> {
        endpoints::reset_password(&self.inner.http, &self.inner.paths, reset)
            .await
            .map_err(SessionError::from)
    }

    /// The bearer token for the current session, if there is one.
    pub fn token(&self) -> Option<String> {
        SessionStore::new(&*self.inner.storage).token()
    }

    pub fn user(&self) -> Option<User> { self.state().user().cloned() }

    pub fn state(&self) -> AuthState { self.inner.state.borrow().clone() }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Watch for changes to the [`AuthState`].
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Why the most recent session ended, if one has ended.
    pub fn last_logout_reason(&self) -> Option<LogoutReason> {
        self.inner.control().last_logout
    }

    /// The HTTP client, for use with the admin [`endpoints`].
    pub fn http(&self) -> &HttpClient { &self.inner.http }

    pub fn paths(&self) -> &Paths { &self.inner.paths }

    pub fn inactivity_timer(&self) -> &InactivityTimer { &self.inner.timer }
}

async fn notify_backend(http: HttpClient, paths: Paths, token: String) {
    if let Err(e) = endpoints::logout(&http, &paths, &token).await {
        log::warn!("The backend logout request failed: {}", e);
    }
}

struct Inner {
    http: HttpClient,
    storage: Arc<dyn Storage>,
    paths: Paths,
    timer: InactivityTimer,
    state: watch::Sender<AuthState>,
    control: Mutex<Control>,
}

#[derive(Debug, Default)]
struct Control {
    /// Bumped whenever a session is torn down or a challenge abandoned, so
    /// a request started before then can't bring the session back.
    generation: u64,
    last_logout: Option<LogoutReason>,
}

impl Inner {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn generation(&self) -> u64 { self.control().generation }

    fn establish(
        &self,
        generation: u64,
        session: Session,
    ) -> Result<User, SessionError> {
        {
            let control = self.control();
            if control.generation != generation {
                log::info!(
                    "Discarding the session for {}, logged out mid-request",
                    session.user.email
                );
                return Err(SessionError::Interrupted);
            }

            SessionStore::new(&*self.storage).save(&session);
            self.state.send_replace(AuthState::Authenticated(session.clone()));
            self.timer.start();
        }

        log::info!("Logged in as {}", session.user.email);

        Ok(session.user)
    }

    fn await_mfa(
        &self,
        generation: u64,
        challenge: MfaChallenge,
    ) -> Result<(), SessionError> {
        {
            let control = self.control();
            if control.generation != generation {
                return Err(SessionError::Interrupted);
            }

            SessionStore::new(&*self.storage).clear();
            self.state.send_replace(AuthState::MfaPending(challenge));
            self.timer.stop();
        }

        Ok(())
    }

    fn cancel_mfa(&self) {
        let mut control = self.control();
        let cancelled = self.state.send_if_modified(|state| {
            if state.is_mfa_pending() {
                *state = AuthState::Anonymous;
                true
            } else {
                false
            }
        });

        if cancelled {
            control.generation += 1;
            log::debug!("Abandoned the pending MFA challenge");
        }
    }

    /// Clear everything, returning the token the session was using.
    fn teardown(&self, reason: LogoutReason) -> Option<String> {
        let mut control = self.control();
        self.end_session(&mut control, reason)
    }

    /// The backend refused `rejected`. Only end the session if that is
    /// still the token in storage.
    fn revoke(&self, rejected: &str) {
        let mut control = self.control();
        let current = SessionStore::new(&*self.storage).token();

        if current.as_deref() == Some(rejected) {
            self.end_session(&mut control, LogoutReason::Unauthorized);
        } else {
            log::debug!("Ignoring a 401 for a token which is no longer in use");
        }
    }

    fn end_session(
        &self,
        control: &mut Control,
        reason: LogoutReason,
    ) -> Option<String> {
        self.timer.stop();
        control.generation += 1;

        let store = SessionStore::new(&*self.storage);
        let token = store.token();
        store.clear();

        let ended = self.state.send_if_modified(|state| {
            if *state == AuthState::Anonymous {
                false
            } else {
                *state = AuthState::Anonymous;
                true
            }
        });

        if ended {
            log::info!("Session ended ({:?})", reason);
            control.last_logout = Some(reason);
        }

        token
    }
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("http", &self.http)
            .field("state", &*self.state.borrow())
            .field("timer", &self.timer)
            .finish()
    }
}

/// Everything that can go wrong while managing a session, in terms a login
/// form can show to a user.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("The one-time code was rejected")]
    MfaRejected,
    #[error("There is no pending MFA challenge")]
    NoMfaPending,
    /// The token was missing, expired or revoked. The session has already
    /// been torn down.
    #[error("Your session has expired, please log in again")]
    Unauthorized,
    /// The request never completed. Trying again may help.
    #[error("Unable to reach the server, please try again")]
    Network(#[source] TransportError),
    #[error("Invalid input")]
    Validation(#[from] ValidationError),
    #[error("The server responded with {}: {}", status, message)]
    Server { status: StatusCode, message: String },
    #[error("Unable to parse the server's response")]
    Parse(#[source] serde_json::Error),
    /// The session was logged out while the request was in flight, so its
    /// result was discarded.
    #[error("The session changed before the request completed")]
    Interrupted,
    #[error("The client is misconfigured")]
    Config(#[source] EndpointError),
}

impl SessionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Network(_))
    }
}

impl From<EndpointError> for SessionError {
    fn from(err: EndpointError) -> SessionError {
        match err {
            EndpointError::Transport(e) => SessionError::Network(e),
            EndpointError::Unauthorized => SessionError::Unauthorized,
            EndpointError::Status { status, message } => {
                SessionError::Server { status, message }
            },
            EndpointError::Parse(e) => SessionError::Parse(e),
            EndpointError::Validation(e) => SessionError::Validation(e),
            other @ EndpointError::BadUrl { .. } => SessionError::Config(other),
        }
    }
}

impl From<LoginError> for SessionError {
    fn from(err: LoginError) -> SessionError {
        match err {
            LoginError::InvalidCredentials | LoginError::Malformed(_) => {
                SessionError::InvalidCredentials
            },
            LoginError::Endpoint(e) => SessionError::from(e),
        }
    }
}

//! The application-wide view of who is logged in.

use crate::{
    endpoints::MfaChallenge,
    models::User,
    service::{
        AuthState, LoginOutcome, LogoutReason, SessionError, SessionService,
    },
    timer::Activity,
    Id,
};
use tokio::sync::watch;

/// A reactive handle on the session for the UI layer.
///
/// Create one when the application starts. It picks up whatever session
/// the [`SessionService`] restored, and every change made through it goes
/// via the service so storage and the observable state never disagree.
#[derive(Debug, Clone)]
pub struct AuthContext {
    service: SessionService,
    state: watch::Receiver<AuthState>,
}

impl AuthContext {
    pub fn new(service: SessionService) -> Self {
        let state = service.subscribe();
        AuthContext { service, state }
    }

    pub fn user(&self) -> Option<User> { self.state.borrow().user().cloned() }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn mfa_pending(&self) -> bool { self.state.borrow().is_mfa_pending() }

    pub fn mfa_challenge(&self) -> Option<MfaChallenge> {
        match &*self.state.borrow() {
            AuthState::MfaPending(challenge) => Some(challenge.clone()),
            _ => None,
        }
    }

    pub fn get_token(&self) -> Option<String> { self.service.token() }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, SessionError> {
        self.service.login(email, password).await
    }

    pub async fn verify_mfa(
        &self,
        user_id: &Id,
        code: &str,
    ) -> Result<User, SessionError> {
        self.service.verify_mfa(user_id, code).await
    }

    pub fn logout(&self) { self.service.logout(); }

    /// Clear the MFA-pending flag, going back to the login form.
    pub fn cancel_mfa(&self) { self.service.cancel_mfa(); }

    pub fn record_activity(&self, activity: Activity) {
        self.service.record_activity(activity);
    }

    /// Wait for the session to change, returning the new state.
    ///
    /// When the change was a logout, [`AuthContext::last_logout_reason()`]
    /// says why, and the UI should send the user back to the login page.
    pub async fn changed(&mut self) -> AuthState {
        // the sender lives inside the service we hold, so it can't be closed
        let _ = self.state.changed().await;
        self.state.borrow_and_update().clone()
    }

    pub fn last_logout_reason(&self) -> Option<LogoutReason> {
        self.service.last_logout_reason()
    }

    pub fn service(&self) -> &SessionService { &self.service }
}

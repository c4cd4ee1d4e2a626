use crate::{
    config::Paths,
    http::{Auth, EndpointError},
    models::User,
    HttpClient, Id, Session,
};
use reqwest::{Method, StatusCode};
use serde_derive::{Deserialize, Serialize};

/// Send the user's credentials to the backend.
///
/// The backend either hands back a complete [`Session`] or asks for a
/// second factor, see [`LoginResponse`].
pub async fn login(
    client: &HttpClient,
    paths: &Paths,
    email: &str,
    password: &str,
) -> Result<LoginResponse, LoginError> {
    let data = Credentials { email, password };
    let response = client
        .send(Method::POST, &paths.login, Some(&data), Auth::Anonymous)
        .await
        .map_err(rejected_as_invalid)?;

    let doc: LoginResponseDocument =
        serde_json::from_slice(&response.body).map_err(LoginError::Malformed)?;

    interpret_response(doc)
}

/// Parse a response which should contain a complete session, as returned
/// after a successful login or MFA check.
pub(crate) fn parse_session(body: &[u8]) -> Result<Session, LoginError> {
    let doc: LoginResponseDocument =
        serde_json::from_slice(body).map_err(LoginError::Malformed)?;

    match interpret_response(doc)? {
        LoginResponse::Session(session) => Ok(session),
        LoginResponse::MfaRequired(_) => Err(LoginError::InvalidCredentials),
    }
}

/// Bad credentials come back as a 400 or 401 rather than a body.
pub(crate) fn rejected_as_invalid(err: EndpointError) -> LoginError {
    match err.status() {
        Some(status)
            if status == StatusCode::UNAUTHORIZED
                || status == StatusCode::BAD_REQUEST
                || status == StatusCode::FORBIDDEN =>
        {
            LoginError::InvalidCredentials
        },
        _ => LoginError::Endpoint(err),
    }
}

fn interpret_response(
    doc: LoginResponseDocument,
) -> Result<LoginResponse, LoginError> {
    match doc {
        LoginResponseDocument::Wrapped { data: payload }
        | LoginResponseDocument::Bare(payload) => {
            if payload.access_token.trim().is_empty() {
                log::warn!("The login response didn't contain a token");
                return Err(LoginError::InvalidCredentials);
            }

            Ok(LoginResponse::Session(Session::new(
                payload.access_token,
                payload.user,
            )))
        },
        LoginResponseDocument::Challenge(challenge) => {
            if !challenge.mfa_required && !challenge.mfa_enabled {
                log::warn!(
                    "Login was neither accepted nor challenged: {}",
                    challenge.message
                );
                return Err(LoginError::InvalidCredentials);
            }

            log::info!("User {} must complete MFA", challenge.user_id);
            Ok(LoginResponse::MfaRequired(MfaChallenge {
                user_id: challenge.user_id,
                message: challenge.message,
                mfa_enabled: challenge.mfa_enabled,
                qr_code_url: challenge.qr_code_url,
            }))
        },
    }
}

/// What the backend said about a set of credentials.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginResponse {
    /// The credentials were accepted outright.
    Session(Session),
    /// The credentials were fine, but a one-time code is needed too.
    MfaRequired(MfaChallenge),
}

/// A request for a second authentication factor.
#[derive(Debug, Clone, PartialEq)]
pub struct MfaChallenge {
    /// Who the code should be checked against.
    pub user_id: Id,
    pub message: String,
    /// Is MFA already set up? If not, `qr_code_url` is used to enrol.
    pub mfa_enabled: bool,
    pub qr_code_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LoginResponseDocument {
    /// `{ "data": { "user": ..., "access_token": ... }, "message": ... }`
    Wrapped { data: AuthPayload },
    Bare(AuthPayload),
    Challenge(RawChallenge),
}

#[derive(Debug, Clone, Deserialize)]
struct AuthPayload {
    user: User,
    #[serde(alias = "token", alias = "accessToken")]
    access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChallenge {
    #[serde(default)]
    mfa_required: bool,
    #[serde(default)]
    mfa_enabled: bool,
    user_id: Id,
    #[serde(default)]
    message: String,
    #[serde(default)]
    qr_code_url: Option<String>,
}

#[derive(Copy, Clone, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Possible errors that may be returned by [`login()`].
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Unable to send the login request")]
    Endpoint(#[from] EndpointError),
    /// The backend turned the credentials (or the one-time code) down.
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// The backend sent something that was neither a session nor an MFA
    /// challenge.
    #[error("Unable to parse the login response")]
    Malformed(#[source] serde_json::Error),
}

//! The admin console backend's endpoints.
//!
//! Each function is a thin wrapper around a single request. Session
//! bookkeeping happens in [`crate::SessionService`], not here.

mod clients;
mod invitations;
mod login;
mod logout;
mod password;
mod roles;
mod users;
mod verify_mfa;

pub use crate::http::EndpointError;
pub use clients::{
    create_client, delete_client, get_client, list_clients, update_client,
};
pub use invitations::{list_invitations, send_invitation};
pub use login::{login, LoginError, LoginResponse, MfaChallenge};
pub use logout::logout;
pub use password::{request_password_reset, reset_password};
pub use roles::list_roles;
pub use users::{delete_user, list_users, update_user};
pub use verify_mfa::verify_mfa;

use url::Url;

/// Append `segment` to a collection path, e.g. `/api/client` + `42`.
///
/// The segment is percent-encoded, so an id or email containing `/`, `?` or
/// `#` stays a single path segment.
fn member(
    collection: &str,
    segment: &str,
) -> Result<String, EndpointError> {
    let mut url = Url::parse("http://localhost/")
        .and_then(|base| base.join(collection))
        .map_err(|inner| EndpointError::BadUrl {
            path: collection.to_string(),
            inner,
        })?;

    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(segment);
    }

    Ok(url.path().to_string())
}

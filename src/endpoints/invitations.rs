use crate::{
    config::Paths,
    http::{Auth, EndpointError},
    models::{Invitation, NewInvitation},
    validate, HttpClient,
};
use reqwest::Method;

/// Invite someone to the console with the given role.
pub async fn send_invitation(
    client: &HttpClient,
    paths: &Paths,
    invitation: &NewInvitation,
) -> Result<(), EndpointError> {
    validate::invitation(invitation)?;

    log::debug!(
        "Inviting {} as {}",
        invitation.email,
        invitation.role.label()
    );
    client
        .send(
            Method::POST,
            &paths.invitations,
            Some(invitation),
            Auth::Stored,
        )
        .await?;

    Ok(())
}

pub async fn list_invitations(
    client: &HttpClient,
    paths: &Paths,
) -> Result<Vec<Invitation>, EndpointError> {
    client
        .send_json(Method::GET, &paths.invitations, None::<&()>, Auth::Stored)
        .await
}

use crate::{
    config::Paths,
    http::{Auth, EndpointError},
    HttpClient,
};
use reqwest::Method;
use serde_json::json;

/// Tell the server to invalidate a user's session, logging them out.
///
/// The token is passed explicitly because by the time this goes out the
/// local copy has usually been cleared already.
pub async fn logout(
    client: &HttpClient,
    paths: &Paths,
    token: &str,
) -> Result<(), EndpointError> {
    client
        .send(
            Method::POST,
            &paths.logout,
            Some(&json!({})),
            Auth::Bearer(token.to_string()),
        )
        .await?;

    Ok(())
}

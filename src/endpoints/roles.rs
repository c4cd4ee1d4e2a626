use crate::{
    config::Paths,
    http::{Auth, EndpointError},
    models::Role,
    HttpClient,
};
use reqwest::Method;

/// The roles an admin is allowed to hand out.
pub async fn list_roles(
    client: &HttpClient,
    paths: &Paths,
) -> Result<Vec<Role>, EndpointError> {
    client
        .send_json(Method::GET, &paths.roles, None::<&()>, Auth::Stored)
        .await
}

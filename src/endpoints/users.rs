use crate::{
    config::Paths,
    http::{Auth, EndpointError},
    models::{User, UserUpdate, UsersPage},
    HttpClient, Id,
};
use reqwest::Method;
use url::form_urlencoded;

/// Fetch a page of users. `query` is passed through as the query string,
/// e.g. the output of [`crate::filter::UserFilter::query()`] plus a `page`.
pub async fn list_users<K, V>(
    client: &HttpClient,
    paths: &Paths,
    query: &[(K, V)],
) -> Result<UsersPage, EndpointError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut path = paths.users.clone();
    if !query.is_empty() {
        let mut encoded = form_urlencoded::Serializer::new(String::new());
        for (key, value) in query {
            encoded.append_pair(key.as_ref(), value.as_ref());
        }
        path.push('?');
        path.push_str(&encoded.finish());
    }

    client
        .send_json(Method::GET, &path, None::<&()>, Auth::Stored)
        .await
}

pub async fn update_user(
    client: &HttpClient,
    paths: &Paths,
    id: &Id,
    update: &UserUpdate,
) -> Result<User, EndpointError> {
    client
        .send_json(
            Method::PUT,
            &super::member(&paths.users, id)?,
            Some(update),
            Auth::Stored,
        )
        .await
}

pub async fn delete_user(
    client: &HttpClient,
    paths: &Paths,
    id: &Id,
) -> Result<(), EndpointError> {
    log::debug!("Deleting user {}", id);
    client
        .send(
            Method::DELETE,
            &super::member(&paths.users, id)?,
            None::<&()>,
            Auth::Stored,
        )
        .await?;

    Ok(())
}

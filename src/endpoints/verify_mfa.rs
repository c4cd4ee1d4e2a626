use super::login::{parse_session, rejected_as_invalid, LoginError};
use crate::{config::Paths, http::Auth, HttpClient, Id, Session};
use reqwest::Method;
use serde_derive::Serialize;

/// Exchange a one-time code for a full session after the backend answered
/// a login with an MFA challenge.
pub async fn verify_mfa(
    client: &HttpClient,
    paths: &Paths,
    user_id: &Id,
    code: &str,
) -> Result<Session, LoginError> {
    let data = Data {
        user_id,
        token: code,
    };

    let response = client
        .send(Method::POST, &paths.verify_mfa, Some(&data), Auth::Anonymous)
        .await
        .map_err(rejected_as_invalid)?;

    parse_session(&response.body)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Data<'a> {
    user_id: &'a Id,
    token: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::testing;
    use reqwest::StatusCode;

    #[tokio::test]
    async fn code_is_sent_as_the_token_field() {
        let (client, transport) = testing::client(None);
        transport.respond(
            StatusCode::OK,
            include_str!("login_response_okay.json"),
        );

        let user_id = Id::from("64f1c2");
        let session =
            verify_mfa(&client, &Paths::default(), &user_id, "123456")
                .await
                .unwrap();

        assert_eq!(session.user.first_name, "Jane");
        assert_eq!(
            transport.requests()[0].body,
            Some(serde_json::json!({ "userId": "64f1c2", "token": "123456" }))
        );
    }

    #[tokio::test]
    async fn wrong_code_is_rejected() {
        let (client, transport) = testing::client(None);
        transport.respond(StatusCode::UNAUTHORIZED, "");

        let got =
            verify_mfa(&client, &Paths::default(), &Id::from("1"), "000000")
                .await;

        assert!(matches!(got, Err(LoginError::InvalidCredentials)));
    }
}

use crate::{
    config::Paths,
    http::{Auth, EndpointError},
    models::{Client, ClientForm, ClientUpdate, CreateClientResponse},
    validate, HttpClient, Id,
};
use reqwest::Method;

pub async fn list_clients(
    client: &HttpClient,
    paths: &Paths,
) -> Result<Vec<Client>, EndpointError> {
    client
        .send_json(Method::GET, &paths.clients, None::<&()>, Auth::Stored)
        .await
}

pub async fn get_client(
    client: &HttpClient,
    paths: &Paths,
    id: &Id,
) -> Result<Client, EndpointError> {
    client
        .send_json(
            Method::GET,
            &super::member(&paths.clients, id)?,
            None::<&()>,
            Auth::Stored,
        )
        .await
}

/// Register a new client, checking the required fields first.
pub async fn create_client(
    client: &HttpClient,
    paths: &Paths,
    form: &ClientForm,
) -> Result<CreateClientResponse, EndpointError> {
    validate::client_form(form)?;

    client
        .send_json(Method::POST, &paths.clients, Some(form), Auth::Stored)
        .await
}

pub async fn update_client(
    client: &HttpClient,
    paths: &Paths,
    id: &Id,
    update: &ClientUpdate,
) -> Result<Client, EndpointError> {
    client
        .send_json(
            Method::PUT,
            &super::member(&paths.clients, id)?,
            Some(update),
            Auth::Stored,
        )
        .await
}

pub async fn delete_client(
    client: &HttpClient,
    paths: &Paths,
    id: &Id,
) -> Result<(), EndpointError> {
    client
        .send(
            Method::DELETE,
            &super::member(&paths.clients, id)?,
            None::<&()>,
            Auth::Stored,
        )
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::testing;
    use reqwest::StatusCode;

    fn form() -> ClientForm {
        ClientForm {
            client_name: String::from("Innovate Labs"),
            hq_country: String::from("Canada"),
            client_code: String::from("IL002"),
            client_mail: String::from("info@innovatelabs.com"),
            ..ClientForm::default()
        }
    }

    #[tokio::test]
    async fn create_then_read_back_the_id() {
        let (client, transport) = testing::client(Some("token"));
        transport.respond(
            StatusCode::CREATED,
            r#"{ "_id": "3", "message": "Client created successfully" }"#,
        );

        let got = create_client(&client, &Paths::default(), &form())
            .await
            .unwrap();

        assert_eq!(got.id, Id::from("3"));
        let body = transport.requests()[0].body.clone().unwrap();
        assert_eq!(body["clientCode"], "IL002");
    }

    #[tokio::test]
    async fn missing_client_is_a_status_error() {
        let (client, transport) = testing::client(Some("token"));
        transport.respond(
            StatusCode::NOT_FOUND,
            r#"{ "message": "Client not found" }"#,
        );

        let got = get_client(&client, &Paths::default(), &Id::from("99")).await;

        match got {
            Err(EndpointError::Status { status, message }) => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "Client not found");
            },
            other => panic!("Unexpected result: {:?}", other),
        }
        assert_eq!(transport.requests()[0].url.path(), "/api/client/99");
    }

    #[tokio::test]
    async fn partial_updates() {
        let (client, transport) = testing::client(Some("token"));
        transport.respond(
            StatusCode::OK,
            r#"{
                "_id": "2",
                "clientName": "Innovate Labs",
                "clientCode": "IL002",
                "clientMail": "hello@innovatelabs.com"
            }"#,
        );
        let update = ClientUpdate {
            client_mail: Some(String::from("hello@innovatelabs.com")),
            ..ClientUpdate::default()
        };

        let id = Id::from("2");
        let got = update_client(&client, &Paths::default(), &id, &update)
            .await
            .unwrap();

        assert_eq!(got.client_mail, "hello@innovatelabs.com");
        assert_eq!(
            transport.requests()[0].body,
            Some(serde_json::json!({ "clientMail": "hello@innovatelabs.com" }))
        );
    }
}

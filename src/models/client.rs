use crate::Id;
use serde_derive::{Deserialize, Serialize};

/// A customer organisation managed through the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub client_name: String,
    #[serde(default)]
    pub hq_country: String,
    pub client_code: String,
    #[serde(default)]
    pub client_contact_no: String,
    pub client_mail: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default)]
    pub alternate_contacts: Vec<AlternateContact>,
    /// An ISO-8601 timestamp, as sent by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternateContact {
    pub name: String,
    pub contact_no: String,
    pub job_title: String,
}

/// The fields a user fills in when creating a [`Client`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientForm {
    pub client_name: String,
    pub hq_country: String,
    pub client_code: String,
    pub client_contact_no: String,
    pub client_mail: String,
    pub chat_id: String,
    pub alternate_contacts: Vec<AlternateContact>,
}

/// A partial update to a [`Client`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hq_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_contact_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_mail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_contacts: Option<Vec<AlternateContact>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateClientResponse {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_client_with_contacts() {
        let src = r#"{
            "_id": "1",
            "clientName": "Tech Solutions",
            "hqCountry": "USA",
            "clientCode": "TS001",
            "clientContactNo": "1234567890",
            "clientMail": "contact@techsolutions.com",
            "chatId": "tech-solutions-chat",
            "alternateContacts": [
                { "name": "John Doe", "contactNo": "9876543210", "jobTitle": "Project Manager" }
            ],
            "createdAt": "2023-01-01T00:00:00.000Z"
        }"#;

        let got: Client = serde_json::from_str(src).unwrap();

        assert_eq!(got.id, Some(Id::from("1")));
        assert_eq!(got.client_code, "TS001");
        assert_eq!(
            got.alternate_contacts,
            vec![AlternateContact {
                name: String::from("John Doe"),
                contact_no: String::from("9876543210"),
                job_title: String::from("Project Manager"),
            }]
        );
        assert_eq!(got.updated_at, None);
    }
}

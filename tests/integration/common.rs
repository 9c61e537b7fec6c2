use docgen::{DocumentGenerationClient, DocumentGenerationOptions};
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::MockServer;

pub const TOKEN: &str = "integration-token";

pub fn client(server: &MockServer, subscription_id: Uuid) -> DocumentGenerationClient {
    let options = DocumentGenerationOptions {
        service_uri: server.uri(),
        subscription_id: Some(subscription_id),
        access_token: Some(TOKEN.to_string()),
        timeout_secs: 5,
    };
    DocumentGenerationClient::from_options(&options).unwrap()
}

pub fn configuration_path(subscription_id: Uuid, configuration_id: Uuid) -> String {
    format!(
        "/subscriptions/{}/configurations/{}",
        subscription_id, configuration_id
    )
}

pub fn blob_entries_path(subscription_id: Uuid, configuration_id: Uuid) -> String {
    format!(
        "{}/azure-blob/entries",
        configuration_path(subscription_id, configuration_id)
    )
}

pub fn entry_summary(id: Uuid, key: &str, name: &str, children: Vec<Value>) -> Value {
    json!({
        "id": id,
        "key": key,
        "name": name,
        "templateStorageType": "AzureBlobStorage",
        "children": children,
    })
}

pub fn blob_detail(id: Uuid, key: &str, name: &str, prefix: &str) -> Value {
    json!({
        "id": id,
        "key": key,
        "name": name,
        "templateStorageConfiguration": {
            "secretKeyForStorageConnectionString": "conn",
            "containerName": "templates",
            "blobPrefix": prefix,
        }
    })
}

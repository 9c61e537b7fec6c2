use crate::common::{
    blob_detail, blob_entries_path, client, configuration_path, entry_summary, TOKEN,
};
use docgen::{DocGenError, HierarchyPath, TemplateStorage, TemplateStorageType};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Ids {
    subscription: Uuid,
    configuration: Uuid,
    root: Uuid,
    school: Uuid,
}

impl Ids {
    fn new() -> Self {
        Self {
            subscription: Uuid::new_v4(),
            configuration: Uuid::new_v4(),
            root: Uuid::new_v4(),
            school: Uuid::new_v4(),
        }
    }
}

async fn mount_existing(server: &MockServer, ids: &Ids) {
    let summary = json!({
        "id": ids.configuration,
        "subscriptionId": ids.subscription,
        "name": "Schools",
        "levelNames": ["Municipality", "School"],
        "hasLicense": true,
        "templateStorageDirectory": entry_summary(
            ids.root,
            "",
            "Root",
            vec![entry_summary(ids.school, "schoolone", "School one", vec![])],
        ),
    });
    Mock::given(method("GET"))
        .and(path(configuration_path(ids.subscription, ids.configuration)))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary))
        .mount(server)
        .await;

    let entries = blob_entries_path(ids.subscription, ids.configuration);
    Mock::given(method("GET"))
        .and(path(format!("{}/{}", entries, ids.root)))
        .respond_with(ResponseTemplate::new(200).set_body_json(blob_detail(ids.root, "", "Root", "")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/{}", entries, ids.school)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(blob_detail(ids.school, "schoolone", "School one", "one/")),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn get_configuration_loads_tree_with_storage_details() {
    let server = MockServer::start().await;
    let ids = Ids::new();
    mount_existing(&server, &ids).await;

    let configuration = client(&server, ids.subscription)
        .get_configuration(None, ids.configuration)
        .await
        .unwrap();

    assert_eq!(configuration.name(), "Schools");
    assert_eq!(configuration.level_names(), ["Municipality", "School"]);
    assert!(configuration.has_license());

    let school = configuration
        .find_directory_by_path(&HierarchyPath::parse("\\schoolone\\").unwrap())
        .unwrap()
        .unwrap();
    let record = configuration.tree().get(school).unwrap();
    assert_eq!(record.id(), Some(ids.school));
    assert_eq!(record.name(), "School one");
    assert_eq!(
        record.storage(),
        &TemplateStorage::azure_blob("conn", "templates", "one/")
    );
}

#[tokio::test]
async fn save_issues_updates_then_creates_new_children() {
    let server = MockServer::start().await;
    let ids = Ids::new();
    mount_existing(&server, &ids).await;
    let entries = blob_entries_path(ids.subscription, ids.configuration);
    let new_id = Uuid::new_v4();

    Mock::given(method("PUT"))
        .and(path(configuration_path(ids.subscription, ids.configuration)))
        .and(body_partial_json(json!({ "name": "Schools 2024" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(entries.as_str()))
        .and(query_param("hierarchyPath", "\\"))
        .respond_with(ResponseTemplate::new(200).set_body_json(blob_detail(ids.root, "", "Root", "")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(entries.as_str()))
        .and(query_param("hierarchyPath", "\\schoolone\\"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(blob_detail(ids.school, "schoolone", "School one", "one/")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(entries.as_str()))
        .and(query_param("parentHierarchyPath", "\\"))
        .and(body_partial_json(json!({
            "key": "schooltwo",
            "templateStorageConfiguration": { "containerName": "templates", "blobPrefix": "two/" }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(blob_detail(new_id, "schooltwo", "School two", "two/")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut configuration = client(&server, ids.subscription)
        .get_configuration(None, ids.configuration)
        .await
        .unwrap();
    configuration.set_name("Schools 2024");
    let root = configuration.root_template_storage_directory().unwrap();
    let two = configuration
        .tree_mut()
        .add_new_child(
            root,
            "schooltwo",
            "School two",
            TemplateStorage::azure_blob("conn", "templates", "two/"),
        )
        .unwrap();

    let stats = configuration.save().await.unwrap();
    assert_eq!((stats.created, stats.updated, stats.deleted), (1, 2, 0));
    assert_eq!(configuration.tree().get(two).unwrap().id(), Some(new_id));
}

#[tokio::test]
async fn removed_children_are_deleted_by_id() {
    let server = MockServer::start().await;
    let ids = Ids::new();
    mount_existing(&server, &ids).await;
    let entries = blob_entries_path(ids.subscription, ids.configuration);

    Mock::given(method("PUT"))
        .and(path(configuration_path(ids.subscription, ids.configuration)))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(entries.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(blob_detail(ids.root, "", "Root", "")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/{}", entries, ids.school)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut configuration = client(&server, ids.subscription)
        .get_configuration(None, ids.configuration)
        .await
        .unwrap();
    let school = configuration
        .find_directory_by_path(&HierarchyPath::parse("\\schoolone\\").unwrap())
        .unwrap()
        .unwrap();
    configuration.tree_mut().remove(school).unwrap();

    let stats = configuration.save().await.unwrap();
    assert_eq!(stats.deleted, 1);
    assert_eq!(configuration.tree().len(), 1);
}

#[tokio::test]
async fn failed_entry_write_reports_operation_and_path() {
    let server = MockServer::start().await;
    let ids = Ids::new();
    mount_existing(&server, &ids).await;
    let entries = blob_entries_path(ids.subscription, ids.configuration);

    Mock::given(method("PUT"))
        .and(path(configuration_path(ids.subscription, ids.configuration)))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(entries.as_str()))
        .and(query_param("hierarchyPath", "\\"))
        .respond_with(ResponseTemplate::new(200).set_body_json(blob_detail(ids.root, "", "Root", "")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(entries.as_str()))
        .and(query_param("hierarchyPath", "\\schoolone\\"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Container does not exist"))
        .mount(&server)
        .await;

    let mut configuration = client(&server, ids.subscription)
        .get_configuration(None, ids.configuration)
        .await
        .unwrap();

    let err = configuration.save().await.unwrap_err();
    match err {
        DocGenError::ConfigurationSync {
            operation,
            path,
            source,
        } => {
            assert_eq!(operation, "update");
            assert_eq!(path, "\\schoolone\\");
            assert_eq!(
                source.to_string(),
                "UpdateEntry: Bad Request: Container does not exist"
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn deprecated_entries_load_without_detail_and_block_save() {
    let server = MockServer::start().await;
    let subscription = Uuid::new_v4();
    let configuration_id = Uuid::new_v4();
    let root = Uuid::new_v4();
    let legacy = Uuid::new_v4();

    let summary = json!({
        "id": configuration_id,
        "subscriptionId": subscription,
        "name": "Legacy",
        "templateStorageDirectory": {
            "id": root,
            "key": "",
            "name": "Root",
            "templateStorageType": "AzureBlobStorage",
            "children": [{
                "id": legacy,
                "key": "old",
                "name": "Old",
                "templateStorageType": "ServerFolder",
                "children": []
            }]
        }
    });
    Mock::given(method("GET"))
        .and(path(configuration_path(subscription, configuration_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "{}/{}",
            blob_entries_path(subscription, configuration_id),
            root
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(blob_detail(root, "", "Root", "")))
        .expect(1)
        .mount(&server)
        .await;

    let mut configuration = client(&server, subscription)
        .get_configuration(None, configuration_id)
        .await
        .unwrap();
    let old = configuration
        .find_directory_by_path(&HierarchyPath::parse("\\old\\").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(
        configuration.tree().get(old).unwrap().storage_type(),
        TemplateStorageType::Deprecated
    );

    let err = configuration.save().await.unwrap_err();
    assert!(matches!(err, DocGenError::UnsupportedStorageType { ref path, .. } if path == "\\old\\"));
}

#[tokio::test]
async fn create_configuration_then_first_save_creates_root() {
    let server = MockServer::start().await;
    let subscription = Uuid::new_v4();
    let configuration_id = Uuid::new_v4();
    let root = Uuid::new_v4();
    let base = format!("/subscriptions/{}/configurations", subscription);

    Mock::given(method("POST"))
        .and(path(base.as_str()))
        .and(body_partial_json(json!({ "name": "Fresh", "levelNames": ["School"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": configuration_id,
            "subscriptionId": subscription,
            "name": "Fresh",
            "levelNames": ["School"],
            "hasLicense": false,
            "templateStorageDirectory": null
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(configuration_path(subscription, configuration_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": configuration_id,
            "subscriptionId": subscription,
            "name": "Fresh",
            "templateStorageDirectory": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(configuration_path(subscription, configuration_id)))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(blob_entries_path(subscription, configuration_id)))
        .and(query_param("parentHierarchyPath", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(blob_detail(root, "", "Root", "")))
        .expect(1)
        .mount(&server)
        .await;

    let request = docgen::ConfigurationRequest {
        name: "Fresh".to_string(),
        has_license: false,
        level_names: vec!["School".to_string()],
        metadata_filename_extension: None,
    };
    let mut configuration = client(&server, subscription)
        .create_configuration(None, &request)
        .await
        .unwrap();
    assert_eq!(configuration.id(), Some(configuration_id));

    configuration
        .set_root_template_storage_directory(
            "Root",
            TemplateStorage::azure_blob("conn", "templates", ""),
        )
        .unwrap();
    let stats = configuration.save().await.unwrap();
    assert_eq!(stats.created, 1);
    let root_node = configuration.root_template_storage_directory().unwrap();
    assert_eq!(configuration.tree().get(root_node).unwrap().id(), Some(root));
}

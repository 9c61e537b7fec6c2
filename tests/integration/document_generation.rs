use crate::common::{client, configuration_path, TOKEN};
use docgen::tooling::cli::{CliContext, Commands};
use docgen::{
    DocGenError, DocumentConversionRequestDetails, DocumentFormat, DocumentGenerationClient,
    DocumentGenerationOptions, DocumentGenerationRequestDetails, DocumentGenerationState,
    HierarchyPath, PollOptions,
};
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn request_body(id: Uuid, subscription: Uuid, state: &str, fail_reason: Option<&str>) -> Value {
    json!({
        "id": id,
        "subscriptionId": subscription,
        "templateId": "letter",
        "language": "en",
        "documentFormat": "Pdf",
        "hierarchyPath": "\\schoolone\\",
        "state": state,
        "failReason": fail_reason,
    })
}

fn details() -> DocumentGenerationRequestDetails {
    DocumentGenerationRequestDetails {
        hierarchy_path: HierarchyPath::parse("\\schoolone\\").unwrap(),
        template_id: "letter".to_string(),
        language: "en".to_string(),
        document_format: DocumentFormat::Pdf,
        merge_data: json!({ "name": "Ada" }),
        callback_url: None,
        debug: false,
    }
}

fn fast_poll() -> PollOptions {
    PollOptions {
        timeout: Duration::from_secs(5),
        interval: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn generate_waits_for_completion_and_downloads() {
    let server = MockServer::start().await;
    let subscription = Uuid::new_v4();
    let configuration = Uuid::new_v4();
    let request_id = Uuid::new_v4();
    let generation = format!("/subscriptions/{}/generation", subscription);

    Mock::given(method("POST"))
        .and(path(generation.as_str()))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .and(body_partial_json(json!({
            "configurationId": configuration,
            "hierarchyPath": "\\schoolone\\",
            "templateId": "letter",
            "documentFormat": "Pdf",
            "mergeData": { "name": "Ada" }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(request_body(request_id, subscription, "Requested", None)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/{}", generation, request_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(request_body(request_id, subscription, "Requested", None)),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/{}", generation, request_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(request_body(request_id, subscription, "Completed", None)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/{}/document", generation, request_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": format!("{}/download/letter.pdf", server.uri()),
            "uriExpiryTime": "2030-01-01T00:00:00Z"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/letter.pdf"))
        .and(|req: &Request| !req.headers.contains_key("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, subscription);
    let progress = client
        .request_document_generation(None, configuration, &details())
        .await
        .unwrap();
    assert_eq!(progress.id, request_id);
    assert_eq!(progress.state, DocumentGenerationState::Requested);

    let uri = client
        .wait_for_document(None, request_id, fast_poll())
        .await
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("letter.pdf");
    let written = client.write_document_to_file(&uri, &target).await.unwrap();
    assert_eq!(written, 8);
    assert_eq!(std::fs::read(&target).unwrap(), b"%PDF-1.7");
}

#[tokio::test]
async fn failed_generation_surfaces_reason() {
    let server = MockServer::start().await;
    let subscription = Uuid::new_v4();
    let request_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!(
            "/subscriptions/{}/generation/{}",
            subscription, request_id
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(request_body(
            request_id,
            subscription,
            "Failed",
            Some("Template letter not found"),
        )))
        .mount(&server)
        .await;

    let err = client(&server, subscription)
        .wait_for_document(None, request_id, fast_poll())
        .await
        .unwrap_err();
    match err {
        DocGenError::GenerationFailed { request_id: id, reason } => {
            assert_eq!(id, request_id);
            assert_eq!(reason, "Template letter not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn waiting_gives_up_after_timeout() {
    let server = MockServer::start().await;
    let subscription = Uuid::new_v4();
    let request_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!(
            "/subscriptions/{}/generation/{}",
            subscription, request_id
        )))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(request_body(request_id, subscription, "Requested", None)),
        )
        .mount(&server)
        .await;

    let poll = PollOptions {
        timeout: Duration::from_millis(50),
        interval: Duration::from_millis(10),
    };
    let err = client(&server, subscription)
        .wait_for_document(None, request_id, poll)
        .await
        .unwrap_err();
    assert!(matches!(err, DocGenError::GenerationTimedOut { .. }));
}

#[tokio::test]
async fn conversion_requests_pdf_a() {
    let server = MockServer::start().await;
    let subscription = Uuid::new_v4();
    let configuration = Uuid::new_v4();
    let request_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path(format!("/subscriptions/{}/conversion", subscription)))
        .and(body_partial_json(json!({
            "configurationId": configuration,
            "sourceDocumentUrl": "https://files.example.com/letter.docx",
            "sourceDocumentFormat": "Docx",
            "convertedDocumentFormat": "Pdf",
            "convertedDocumentPdfFormat": "PdfA3U"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(request_body(request_id, subscription, "Requested", None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let details = DocumentConversionRequestDetails::to_pdf_a(
        "https://files.example.com/letter.docx",
        DocumentFormat::Docx,
    );
    let progress = client(&server, subscription)
        .request_document_conversion(None, configuration, &details)
        .await
        .unwrap();
    assert_eq!(progress.id, request_id);
}

#[tokio::test]
async fn missing_subscription_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let options = DocumentGenerationOptions {
        service_uri: server.uri(),
        subscription_id: None,
        access_token: Some(TOKEN.to_string()),
        timeout_secs: 5,
    };
    let client = DocumentGenerationClient::from_options(&options).unwrap();
    let err = client.list_configurations(None).await.unwrap_err();
    assert!(matches!(err, DocGenError::NoSubscriptionId));
}

#[tokio::test]
async fn cli_lists_templates_and_configurations() {
    let server = MockServer::start().await;
    let subscription = Uuid::new_v4();
    let configuration = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!(
            "{}/templates",
            configuration_path(subscription, configuration)
        )))
        .and(query_param("hierarchyPath", "\\"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "templateId": "letter", "languages": ["en", "da"] },
            { "templateId": "invoice", "languages": null }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/subscriptions/{}/configurations", subscription)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": configuration, "name": "Schools" }
        ])))
        .mount(&server)
        .await;

    let context = CliContext::with_client(client(&server, subscription), None);

    let templates = context
        .execute(&Commands::Templates {
            configuration_id: configuration,
            path: HierarchyPath::root(),
            subject: None,
            format: "text".to_string(),
        })
        .await
        .unwrap();
    assert!(templates.contains("letter"));
    assert!(templates.contains("en, da"));
    assert!(templates.contains("invoice"));

    let listed = context
        .execute(&Commands::Configurations {
            format: "json".to_string(),
        })
        .await
        .unwrap();
    let parsed: Value = serde_json::from_str(&listed).unwrap();
    assert_eq!(parsed[0]["name"], "Schools");
    assert_eq!(parsed[0]["configuration_id"], configuration.to_string());
}

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use formrelay::adapters::api_handler::AppState;
use formrelay::adapters::health_handler::HealthHandler;
use formrelay::config::{HubSpotSettings, ServerSettings, Settings, SubmissionSettings};
use formrelay::domain::{
    ExternalField, FetchFormResult, FieldGroup, FieldOption, FormDefinition, FormPort,
    SubmissionData, SubmissionPayload, SubmissionResult,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

struct StubPort {
    submit: SubmissionResult,
    submitted: Mutex<Vec<SubmissionPayload>>,
}

fn external(name: &str, label: &str, field_type: &str, required: bool) -> ExternalField {
    ExternalField {
        name: name.to_string(),
        label: label.to_string(),
        field_type: field_type.to_string(),
        required,
        description: None,
        placeholder: None,
        options: None,
    }
}

fn contact_form() -> FormDefinition {
    let mut interests = external("interests", "Interests", "multiple_checkboxes", false);
    interests.options = Some(vec![
        FieldOption {
            label: "Rust".to_string(),
            value: "rust".to_string(),
        },
        FieldOption {
            label: "Forms".to_string(),
            value: "forms".to_string(),
        },
    ]);

    FormDefinition {
        id: Some("form-1".to_string()),
        name: "Contact Us".to_string(),
        field_groups: vec![
            FieldGroup {
                fields: vec![
                    external("firstname", "First name", "single_line_text", true),
                    external("email", "Email", "email", true),
                ],
            },
            FieldGroup {
                fields: vec![interests],
            },
        ],
    }
}

#[async_trait]
impl FormPort for StubPort {
    async fn fetch_form(&self, form_id: &str) -> anyhow::Result<FetchFormResult> {
        match form_id {
            "form-1" => Ok(FetchFormResult::success(contact_form())),
            "broken" => Err(anyhow::anyhow!("connection reset")),
            _ => Ok(FetchFormResult::failure("Form not found")),
        }
    }

    async fn submit_form(&self, payload: &SubmissionPayload) -> anyhow::Result<SubmissionResult> {
        self.submitted.lock().unwrap().push(payload.clone());
        Ok(self.submit.clone())
    }
}

fn settings() -> Arc<Settings> {
    Arc::new(Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
        },
        hubspot: HubSpotSettings {
            access_token: "pat-secret".to_string(),
            portal_id: "4242".to_string(),
            default_form_id: "form-1".to_string(),
            ..Default::default()
        },
        submissions: SubmissionSettings::default(),
    })
}

fn app_with(submit: SubmissionResult) -> (Router, Arc<StubPort>) {
    let port = Arc::new(StubPort {
        submit,
        submitted: Mutex::new(Vec::new()),
    });
    let settings = settings();
    let state = AppState::new(settings.clone(), port.clone()).unwrap();
    let app = formrelay::create_app(state, Arc::new(HealthHandler::new(settings)));
    (app, port)
}

fn app() -> (Router, Arc<StubPort>) {
    app_with(SubmissionResult::success(SubmissionData {
        status: "submitted".to_string(),
        ..Default::default()
    }))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::REFERER, "https://example.com/contact")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_public_config_hides_token() {
    let (app, _) = app();
    let response = app.oneshot(get("/api/config")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["default_form_id"], "form-1");
    assert_eq!(body["data"]["submission_mode"], "forms");
    assert!(!body.to_string().contains("pat-secret"));
}

#[tokio::test]
async fn test_get_form_config() {
    let (app, _) = app();
    let response = app.oneshot(get("/api/forms/form-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let fields = body["data"]["fields"].as_array().unwrap();
    assert_eq!(body["data"]["name"], "Contact Us");
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0]["type"], "text");
    assert_eq!(fields[1]["type"], "email");
    assert_eq!(fields[2]["type"], "multiselect");
    assert_eq!(fields[2]["options"][1]["value"], "forms");
}

#[tokio::test]
async fn test_get_form_failures() {
    let (app, _) = app();

    let response = app.clone().oneshot(get("/api/forms/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error"], "Form not found");

    let response = app.oneshot(get("/api/forms/broken")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error"], "connection reset");
}

#[tokio::test]
async fn test_validate_reports_field_errors() {
    let (app, _) = app();
    let response = app
        .oneshot(post_json(
            "/api/forms/form-1/validate",
            json!({ "values": { "email": "not-an-email" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["fields"]["email"], "Invalid email address");
    assert_eq!(body["fields"]["firstname"], "First name is required");
}

#[tokio::test]
async fn test_validate_accepts_valid_values() {
    let (app, _) = app();
    let response = app
        .oneshot(post_json(
            "/api/forms/form-1/validate",
            json!({ "values": { "firstname": "Ada", "email": "ada@example.com", "interests": ["rust"] } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["interests"], json!(["rust"]));
}

#[tokio::test]
async fn test_submit_relays_and_records() {
    let (app, port) = app();
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/forms/form-1/submit",
            json!({
                "values": { "firstname": "Ada", "email": "ada@example.com", "interests": ["rust", "forms"] },
                "pageUrl": "https://example.com/contact"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    {
        let submitted = port.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].form_id, "form-1");
        assert_eq!(submitted[0].page_url.as_deref(), Some("https://example.com/contact"));
        assert_eq!(submitted[0].page_name.as_deref(), Some("Contact Us"));
        assert_eq!(submitted[0].field_types["interests"], "multiple_checkboxes");
    }

    let response = app.oneshot(get("/api/submissions")).await.unwrap();
    let body = body_json(response).await;
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["payload"]["formId"], "form-1");
    assert_eq!(records[0]["result"]["success"], true);
}

#[tokio::test]
async fn test_submit_invalid_values_are_not_relayed() {
    let (app, port) = app();
    let response = app
        .oneshot(post_json(
            "/api/forms/form-1/submit",
            json!({ "values": { "firstname": "Ada", "email": "nope" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(port.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_unknown_field_is_bad_request() {
    let (app, _) = app();
    let response = app
        .oneshot(post_json(
            "/api/forms/form-1/submit",
            json!({ "values": { "favourite_color": "blue" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_failure_reported() {
    let (app, _) = app_with(SubmissionResult::failure(""));
    let response = app
        .oneshot(post_json(
            "/api/forms/form-1/submit",
            json!({ "values": { "firstname": "Ada", "email": "ada@example.com" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Failed to submit form");
}

#[tokio::test]
async fn test_default_form_page() {
    let (app, _) = app();
    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("<h1>Contact Us</h1>"));
    assert!(html.contains(r#"action="/forms/form-1""#));
    assert!(html.contains(r#"type="email" name="email""#));
    assert!(html.contains(r#"type="checkbox" name="interests" value="rust""#));
}

#[tokio::test]
async fn test_form_page_load_error() {
    let (app, _) = app();
    let response = app.oneshot(get("/forms/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains("Form not found"));
}

#[tokio::test]
async fn test_form_post_success_banner() {
    let (app, port) = app();
    let response = app
        .oneshot(post_form(
            "/forms/form-1",
            "firstname=Ada&email=ada%40example.com&interests=rust&interests=forms",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Thank you for your submission!"));

    let submitted = port.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(
        submitted[0].page_url.as_deref(),
        Some("https://example.com/contact")
    );
}

#[tokio::test]
async fn test_form_post_shows_field_errors() {
    let (app, port) = app();
    let response = app
        .oneshot(post_form("/forms/form-1", "firstname=&email=bad"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_text(response).await;
    assert!(html.contains("First name is required"));
    assert!(html.contains("Invalid email address"));
    assert!(html.contains(r#"value="bad""#));
    assert!(port.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_health_endpoints() {
    let (app, _) = app();
    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");

    let response = app.clone().oneshot(get("/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/health/live")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

//! REST API handlers
//!
//! JSON access to form configurations, validation and submission, plus the
//! recent-submission feed.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tera::Tera;
use tracing::debug;

use crate::adapters::form_handler;
use crate::adapters::submission_log::{SubmissionLog, SubmissionRecord};
use crate::config::{Settings, SubmissionMode};
use crate::domain::controller::{FormController, FormPhase};
use crate::domain::relay::PageContext;
use crate::domain::{FieldValue, FormConfig, FormPort, SubmissionResult};
use crate::error::{FormError, FormResult};

/// Shared application state for API and page handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub port: Arc<dyn FormPort>,
    pub submissions: SubmissionLog,
    pub templates: Arc<Tera>,
}

impl AppState {
    pub fn new(settings: Arc<Settings>, port: Arc<dyn FormPort>) -> anyhow::Result<Self> {
        let submissions = SubmissionLog::new(settings.submissions.history_limit);
        Ok(Self {
            settings,
            port,
            submissions,
            templates: Arc::new(form_handler::templates()?),
        })
    }

    /// Mount a controller for one request. A failed fetch leaves the
    /// controller in its error phase.
    pub async fn mount(&self, form_id: &str) -> FormController {
        let mut controller =
            FormController::new(form_id, self.port.clone(), self.submissions.observer());
        if let Err(e) = controller.mount().await {
            debug!(form_id, "Form not mounted: {}", e);
        }
        controller
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
pub struct ValidationFailure {
    pub success: bool,
    pub error: String,
    pub fields: crate::domain::validation::ValidationErrors,
}

#[derive(Serialize)]
pub struct PublicConfig {
    pub default_form_id: String,
    pub portal_id: String,
    pub submission_mode: SubmissionMode,
    pub version: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInput {
    #[serde(default)]
    pub values: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub page_name: Option<String>,
}

fn error_response(err: FormError) -> Response {
    let status = err.status_code();
    match err {
        FormError::Validation(fields) => (
            status,
            Json(ValidationFailure {
                success: false,
                error: "Validation failed".to_string(),
                fields,
            }),
        )
            .into_response(),
        FormError::SubmitFailure(message) => {
            (status, Json(SubmissionResult::failure(message))).into_response()
        }
        other => (status, Json(ApiResponse::<()>::error(other.to_string()))).into_response(),
    }
}

/// Mount the form and apply the posted values, or explain why not.
async fn prepare(state: &AppState, form_id: &str, input: FormInput) -> FormResult<FormController> {
    let mut controller = state.mount(form_id).await;
    if let FormPhase::Error { message } = controller.phase() {
        return Err(FormError::FetchFailure(message.clone()));
    }

    let page_name = input
        .page_name
        .or_else(|| controller.config().map(|c| c.name.clone()));
    controller.set_page(PageContext {
        page_url: input.page_url,
        page_name,
    });

    for (name, value) in input.values {
        controller.set_value(&name, value)?;
    }
    Ok(controller)
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn get_config(State(state): State<AppState>) -> Json<ApiResponse<PublicConfig>> {
    let hubspot = &state.settings.hubspot;
    Json(ApiResponse::success(PublicConfig {
        default_form_id: hubspot.default_form_id.clone(),
        portal_id: hubspot.portal_id.clone(),
        submission_mode: hubspot.submission_mode,
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

pub async fn get_form(State(state): State<AppState>, Path(form_id): Path<String>) -> Response {
    let controller = state.mount(&form_id).await;
    match (controller.phase(), controller.config()) {
        (FormPhase::Ready { .. }, Some(config)) => {
            (StatusCode::OK, Json(ApiResponse::<FormConfig>::success(config.clone()))).into_response()
        }
        (FormPhase::Error { message }, _) => error_response(FormError::FetchFailure(message.clone())),
        _ => error_response(FormError::NotReady),
    }
}

pub async fn validate_form(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    Json(input): Json<FormInput>,
) -> Response {
    let mut controller = match prepare(&state, &form_id, input).await {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    match controller.validate() {
        Ok(output) => (StatusCode::OK, Json(ApiResponse::success(output))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn submit_form(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    Json(input): Json<FormInput>,
) -> Response {
    let mut controller = match prepare(&state, &form_id, input).await {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    match controller.submit().await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn list_submissions(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<SubmissionRecord>>> {
    Json(ApiResponse::success(state.submissions.list()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::FieldError;

    #[test]
    fn test_form_input_accepts_scalar_and_list_values() {
        let input: FormInput = serde_json::from_value(serde_json::json!({
            "values": { "email": "ada@example.com", "colors": ["a", "b"] },
            "pageUrl": "https://example.com"
        }))
        .unwrap();
        assert_eq!(input.values["email"], FieldValue::Scalar("ada@example.com".to_string()));
        assert_eq!(
            input.values["colors"],
            FieldValue::MultiValue(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(input.page_url.as_deref(), Some("https://example.com"));
        assert!(input.page_name.is_none());
    }

    #[test]
    fn test_error_response_statuses() {
        let mut errors = crate::domain::validation::ValidationErrors::default();
        errors.insert("email", FieldError::InvalidEmail);
        assert_eq!(
            error_response(FormError::Validation(errors)).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            error_response(FormError::SubmitFailure("x".to_string())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_response(FormError::UnknownField("x".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
    }
}

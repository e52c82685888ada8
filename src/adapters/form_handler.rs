//! Server-rendered form pages
//!
//! `GET` renders a mounted form, `POST` applies the posted fields, submits,
//! and renders the outcome in place.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tera::{Context, Tera};
use tracing::error;

use crate::adapters::api_handler::AppState;
use crate::domain::controller::{FormController, FormPhase, SubmitStatus};
use crate::domain::relay::PageContext;
use crate::domain::validation::WEBSITE_FIELD;
use crate::domain::{FieldConfig, FieldType, FieldValue};

pub const FORM_TEMPLATE: &str = "form.html";

pub fn templates() -> anyhow::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_template(FORM_TEMPLATE, include_str!("../../templates/form.html"))?;
    Ok(tera)
}

// ============================================================================
// View Model
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FormView {
    pub title: String,
    pub phase: &'static str,
    pub error_message: Option<String>,
    pub banner: Option<BannerView>,
    pub action: String,
    pub submitting: bool,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Serialize)]
pub struct BannerView {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub widget: &'static str,
    pub input_type: &'static str,
    pub placeholder: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub value: String,
    pub options: Vec<OptionView>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OptionView {
    pub label: String,
    pub value: String,
    pub selected: bool,
}

impl FormView {
    pub fn from_controller(controller: &FormController) -> Self {
        let action = format!("/forms/{}", urlencoding::encode(controller.form_id()));

        let (phase, error_message, banner) = match controller.phase() {
            FormPhase::Loading => ("loading", None, None),
            FormPhase::Error { message } => ("error", Some(message.clone()), None),
            FormPhase::Ready { submit } => {
                let banner = match submit {
                    SubmitStatus::Success(message) => Some(BannerView {
                        kind: "success",
                        message: message.clone(),
                    }),
                    SubmitStatus::SubmitError(message) => Some(BannerView {
                        kind: "error",
                        message: message.clone(),
                    }),
                    SubmitStatus::Idle | SubmitStatus::Submitting => None,
                };
                ("ready", None, banner)
            }
        };

        let (title, fields) = match controller.config() {
            Some(config) => (
                config.name.clone(),
                config
                    .fields
                    .iter()
                    .map(|field| FieldView::build(field, controller))
                    .collect(),
            ),
            None => (String::new(), Vec::new()),
        };

        Self {
            title,
            phase,
            error_message,
            banner,
            action,
            submitting: controller.is_submitting(),
            fields,
        }
    }
}

impl FieldView {
    fn build(field: &FieldConfig, controller: &FormController) -> Self {
        let current = controller.values().get(&field.name);
        let value = current
            .and_then(FieldValue::as_scalar)
            .unwrap_or_default()
            .to_string();

        let options = field
            .options
            .iter()
            .flatten()
            .map(|option| {
                let selected = match current {
                    Some(FieldValue::MultiValue(items)) => items.contains(&option.value),
                    Some(FieldValue::Scalar(s)) => *s == option.value,
                    None => false,
                };
                OptionView {
                    label: option.label.clone(),
                    value: option.value.clone(),
                    selected,
                }
            })
            .collect();

        Self {
            name: field.name.clone(),
            label: field.label.clone(),
            widget: widget(field.field_type),
            input_type: input_type(field),
            placeholder: field.placeholder.clone(),
            description: field.description.clone(),
            required: field.required,
            value,
            options,
            error: controller.errors().get(&field.name).map(|e| e.to_string()),
        }
    }
}

fn widget(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Multiselect => "checkboxes",
        FieldType::Select => "select",
        FieldType::MultiLineText => "textarea",
        FieldType::Text | FieldType::Email | FieldType::Number => "input",
    }
}

fn input_type(field: &FieldConfig) -> &'static str {
    match field.field_type {
        FieldType::Email => "email",
        FieldType::Number => "number",
        _ if field.name == WEBSITE_FIELD => "url",
        _ => "text",
    }
}

/// Fold posted pairs into one value per configured field. Multiselect
/// fields with nothing checked are absent from the body and become empty
/// lists; keys that are not fields of the form are dropped.
pub fn collect_posted(
    fields: &[FieldConfig],
    pairs: Vec<(String, String)>,
) -> Vec<(String, FieldValue)> {
    let mut posted: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in pairs {
        posted.entry(name).or_default().push(value);
    }

    fields
        .iter()
        .filter_map(|field| {
            let entries = posted.remove(&field.name);
            if field.field_type.is_multi() {
                Some((
                    field.name.clone(),
                    FieldValue::MultiValue(entries.unwrap_or_default()),
                ))
            } else {
                entries
                    .and_then(|mut items| items.pop())
                    .map(|value| (field.name.clone(), FieldValue::Scalar(value)))
            }
        })
        .collect()
}

fn page_context(headers: &HeaderMap, controller: &FormController) -> PageContext {
    PageContext {
        page_url: headers
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string()),
        page_name: controller.config().map(|c| c.name.clone()),
    }
}

fn render(state: &AppState, controller: &FormController, status: StatusCode) -> Response {
    let view = FormView::from_controller(controller);
    let context = match Context::from_serialize(&view) {
        Ok(context) => context,
        Err(e) => {
            error!("Failed to build template context: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render form").into_response();
        }
    };

    match state.templates.render(FORM_TEMPLATE, &context) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(form_id = %controller.form_id(), "Failed to render form: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render form").into_response()
        }
    }
}

fn mounted_status(controller: &FormController) -> StatusCode {
    match controller.phase() {
        FormPhase::Error { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn show_default_form(State(state): State<AppState>) -> Response {
    let form_id = state.settings.hubspot.default_form_id.clone();
    let controller = state.mount(&form_id).await;
    render(&state, &controller, mounted_status(&controller))
}

pub async fn show_form(State(state): State<AppState>, Path(form_id): Path<String>) -> Response {
    let controller = state.mount(&form_id).await;
    render(&state, &controller, mounted_status(&controller))
}

pub async fn submit_form(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    headers: HeaderMap,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let mut controller = state.mount(&form_id).await;
    let posted = match controller.config() {
        Some(config) => collect_posted(&config.fields, pairs),
        None => return render(&state, &controller, mounted_status(&controller)),
    };

    let page = page_context(&headers, &controller);
    controller.set_page(page);

    for (name, value) in posted {
        if let Err(e) = controller.set_value(&name, value) {
            return render(&state, &controller, e.status_code());
        }
    }

    let status = match controller.submit().await {
        Ok(_) => StatusCode::OK,
        Err(e) => e.status_code(),
    };
    render(&state, &controller, status)
}

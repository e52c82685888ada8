//! HubSpot implementation of the forms port
//!
//! - form definitions: `GET {api}/marketing/v3/forms/{formId}`
//! - form submissions: `POST {submit}/submissions/v3/integration/secure/submit/{portalId}/{formId}`
//! - contacts: `POST {api}/crm/v3/objects/contacts`

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{HubSpotSettings, SubmissionMode};
use crate::domain::{
    FetchFormResult, FieldValue, FormDefinition, FormPort, SubmissionData, SubmissionPayload,
    SubmissionResult,
};

/// Object type id of contacts, the only object forms submit to here
const CONTACT_OBJECT_TYPE_ID: &str = "0-1";
const CORRELATION_HEADER: &str = "x-hubspot-correlation-id";

/// Transport-level failures talking to HubSpot
#[derive(Debug, Error)]
pub enum HubSpotError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response from HubSpot: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for HubSpotError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HubSpotError::Timeout
        } else if err.is_decode() {
            HubSpotError::Decode(err.to_string())
        } else if err.is_connect() {
            HubSpotError::Network(format!("Connection error: {}", err))
        } else {
            HubSpotError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    #[serde(default)]
    inline_message: Option<String>,
    #[serde(default)]
    redirect_uri: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ContactResponse {
    id: String,
}

pub struct HubSpotClient {
    client: reqwest::Client,
    access_token: SecretString,
    portal_id: String,
    api_base_url: String,
    submit_base_url: String,
    mode: SubmissionMode,
}

impl HubSpotClient {
    pub fn new(settings: &HubSpotSettings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    pub fn with_client(client: reqwest::Client, settings: &HubSpotSettings) -> Self {
        Self {
            client,
            access_token: SecretString::from(settings.access_token.clone()),
            portal_id: settings.portal_id.clone(),
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            submit_base_url: settings.submit_base_url.trim_end_matches('/').to_string(),
            mode: settings.submission_mode,
        }
    }

    fn form_url(&self, form_id: &str) -> String {
        format!(
            "{}/marketing/v3/forms/{}",
            self.api_base_url,
            urlencoding::encode(form_id)
        )
    }

    fn submit_url(&self, form_id: &str) -> String {
        format!(
            "{}/submissions/v3/integration/secure/submit/{}/{}",
            self.submit_base_url,
            urlencoding::encode(&self.portal_id),
            urlencoding::encode(form_id)
        )
    }

    fn contacts_url(&self) -> String {
        format!("{}/crm/v3/objects/contacts", self.api_base_url)
    }

    /// Wire body for the forms submission API. Empty values are left out and
    /// checkbox selections are joined with `;`.
    pub fn submission_body(payload: &SubmissionPayload) -> Value {
        let fields: Vec<Value> = payload
            .fields
            .iter()
            .filter_map(|(name, value)| {
                wire_value(value).map(|value| {
                    json!({
                        "objectTypeId": CONTACT_OBJECT_TYPE_ID,
                        "name": name,
                        "value": value,
                    })
                })
            })
            .collect();

        let mut context = Map::new();
        if let Some(page_url) = &payload.page_url {
            context.insert("pageUri".to_string(), json!(page_url));
        }
        if let Some(page_name) = &payload.page_name {
            context.insert("pageName".to_string(), json!(page_name));
        }

        json!({
            "fields": fields,
            "context": context,
        })
    }

    /// Wire body for the CRM contacts API.
    pub fn contact_body(payload: &SubmissionPayload) -> Value {
        let properties: Map<String, Value> = payload
            .fields
            .iter()
            .filter_map(|(name, value)| wire_value(value).map(|v| (name.clone(), Value::String(v))))
            .collect();
        json!({ "properties": properties })
    }

    /// Pull a readable message out of an error response.
    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();

        let mut parts: Vec<String> = parsed.message.into_iter().collect();
        parts.extend(parsed.errors.into_iter().map(|e| e.message));

        if parts.is_empty() {
            format!("HubSpot API error: {}", status)
        } else {
            parts.join(": ")
        }
    }

    fn correlation_id(headers: &HeaderMap) -> Option<String> {
        headers
            .get(CORRELATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    }

    async fn submit_to_forms_api(&self, payload: &SubmissionPayload) -> anyhow::Result<SubmissionResult> {
        let url = self.submit_url(&payload.form_id);
        debug!(%url, "Submitting form");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&Self::submission_body(payload))
            .send()
            .await
            .map_err(HubSpotError::from)?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            warn!(form_id = %payload.form_id, "HubSpot rejected submission: {}", message);
            return Ok(SubmissionResult::failure(message));
        }

        let correlation_id = Self::correlation_id(response.headers());
        let body: SubmitResponse = response.json().await.map_err(HubSpotError::from)?;

        Ok(SubmissionResult::success(SubmissionData {
            inline_message: body.inline_message,
            redirect_url: body.redirect_uri,
            status: "submitted".to_string(),
            correlation_id,
            extra: body.extra,
        }))
    }

    async fn create_contact(&self, payload: &SubmissionPayload) -> anyhow::Result<SubmissionResult> {
        let url = self.contacts_url();
        debug!(%url, form_id = %payload.form_id, "Creating contact");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&Self::contact_body(payload))
            .send()
            .await
            .map_err(HubSpotError::from)?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            warn!(form_id = %payload.form_id, "HubSpot rejected contact: {}", message);
            return Ok(SubmissionResult::failure(message));
        }

        let correlation_id = Self::correlation_id(response.headers());
        let body: ContactResponse = response.json().await.map_err(HubSpotError::from)?;

        let mut extra = Map::new();
        extra.insert("contactId".to_string(), Value::String(body.id));
        Ok(SubmissionResult::success(SubmissionData {
            inline_message: None,
            redirect_url: None,
            status: "created".to_string(),
            correlation_id,
            extra,
        }))
    }
}

fn wire_value(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Scalar(s) if s.is_empty() => None,
        FieldValue::Scalar(s) => Some(s.clone()),
        FieldValue::MultiValue(items) if items.is_empty() => None,
        FieldValue::MultiValue(items) => Some(items.join(";")),
    }
}

#[async_trait]
impl FormPort for HubSpotClient {
    async fn fetch_form(&self, form_id: &str) -> anyhow::Result<FetchFormResult> {
        let url = self.form_url(form_id);
        debug!(%url, "Fetching form definition");

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await
            .map_err(HubSpotError::from)?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            return Ok(FetchFormResult::failure(message));
        }

        let definition: FormDefinition = response
            .json()
            .await
            .map_err(|e| HubSpotError::Decode(e.to_string()))?;
        Ok(FetchFormResult::success(definition))
    }

    async fn submit_form(&self, payload: &SubmissionPayload) -> anyhow::Result<SubmissionResult> {
        match self.mode {
            SubmissionMode::Forms => self.submit_to_forms_api(payload).await,
            SubmissionMode::Contact => self.create_contact(payload).await,
        }
    }
}

//! Submission relay: form values -> submission payload -> forms service

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::form::{FormConfig, FormValues, SubmissionPayload, SubmissionResult};
use super::FormPort;
use crate::error::{message_or, reported_or, DEFAULT_SUBMIT_ERROR};

/// Where the form was filled in, forwarded with the submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub page_url: Option<String>,
    pub page_name: Option<String>,
}

/// Build the payload for one submit attempt.
///
/// Every field holding a value is copied. Multiselect values are forced into
/// list form and tagged `multiple_checkboxes`; other fields keep their
/// declared type tag.
pub fn build_payload(
    form_id: &str,
    config: &FormConfig,
    values: &FormValues,
    page: &PageContext,
) -> SubmissionPayload {
    let mut fields = BTreeMap::new();
    let mut field_types = BTreeMap::new();

    for field in &config.fields {
        let Some(value) = values.get(&field.name) else {
            continue;
        };
        let value = if field.field_type.is_multi() {
            value.clone().into_multi()
        } else {
            value.clone()
        };
        fields.insert(field.name.clone(), value);
        field_types.insert(field.name.clone(), field.field_type.submission_tag().to_string());
    }

    SubmissionPayload {
        form_id: form_id.to_string(),
        fields,
        field_types,
        page_url: page.page_url.clone(),
        page_name: page.page_name.clone(),
    }
}

/// Sends payloads to the forms service, one call per submit
#[derive(Clone)]
pub struct SubmissionRelay {
    port: Arc<dyn FormPort>,
}

impl SubmissionRelay {
    pub fn new(port: Arc<dyn FormPort>) -> Self {
        Self { port }
    }

    /// Invoke the service once. Thrown and reported failures both come back
    /// as an unsuccessful result with a readable message.
    pub async fn relay(&self, payload: &SubmissionPayload) -> SubmissionResult {
        debug!(form_id = %payload.form_id, fields = payload.fields.len(), "Relaying submission");

        match self.port.submit_form(payload).await {
            Ok(result) if result.success => result,
            Ok(result) => {
                let message = reported_or(result.error.as_deref(), DEFAULT_SUBMIT_ERROR);
                warn!(form_id = %payload.form_id, "Submission rejected: {}", message);
                SubmissionResult {
                    success: false,
                    data: result.data,
                    error: Some(message),
                }
            }
            Err(e) => {
                let message = message_or(&e, DEFAULT_SUBMIT_ERROR);
                warn!(form_id = %payload.form_id, "Submission failed: {}", message);
                SubmissionResult::failure(message)
            }
        }
    }
}

//! Form controller
//!
//! Owns the state of one mounted form: loading the definition, the current
//! values and field errors, and the submit cycle.
//!
//! ```text
//! Loading ──fetch ok──▶ Ready(Idle) ──submit──▶ Ready(Submitting) ──▶ Ready(Success | SubmitError)
//!    │                      ▲                                              │
//!    └──fetch failed──▶ Error(msg)                                         └──edit──▶ Ready(Idle)
//! ```

use std::sync::Arc;
use tracing::{info, warn};

use super::form::{FieldValue, FormConfig, FormValues, SubmissionPayload, SubmissionResult};
use super::relay::{build_payload, PageContext, SubmissionRelay};
use super::translator::translate;
use super::validation::{ValidationErrors, ValidationSchema};
use super::{FormPort, SubmissionObserver};
use crate::error::{
    message_or, reported_or, FormError, FormResult, DEFAULT_FETCH_ERROR, DEFAULT_SUBMIT_ERROR,
};

/// Banner shown after a successful submission when the service sends none
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Thank you for your submission!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStatus {
    Idle,
    Submitting,
    Success(String),
    SubmitError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPhase {
    Loading,
    Ready { submit: SubmitStatus },
    Error { message: String },
}

pub struct FormController {
    form_id: String,
    port: Arc<dyn FormPort>,
    relay: SubmissionRelay,
    observer: Arc<dyn SubmissionObserver>,
    page: PageContext,
    phase: FormPhase,
    config: Option<FormConfig>,
    schema: ValidationSchema,
    values: FormValues,
    errors: ValidationErrors,
    dirty: bool,
}

impl FormController {
    pub fn new(
        form_id: impl Into<String>,
        port: Arc<dyn FormPort>,
        observer: Arc<dyn SubmissionObserver>,
    ) -> Self {
        Self {
            form_id: form_id.into(),
            relay: SubmissionRelay::new(port.clone()),
            port,
            observer,
            page: PageContext::default(),
            phase: FormPhase::Loading,
            config: None,
            schema: ValidationSchema::default(),
            values: FormValues::default(),
            errors: ValidationErrors::default(),
            dirty: false,
        }
    }

    /// Page the form is shown on, forwarded with submissions.
    pub fn set_page(&mut self, page: PageContext) {
        self.page = page;
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    pub fn phase(&self) -> &FormPhase {
        &self.phase
    }

    pub fn config(&self) -> Option<&FormConfig> {
        self.config.as_ref()
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_submitting(&self) -> bool {
        matches!(
            self.phase,
            FormPhase::Ready {
                submit: SubmitStatus::Submitting
            }
        )
    }

    /// Fetch the form definition and enter `Ready` or `Error`.
    ///
    /// A failed fetch is terminal; nothing retries it.
    pub async fn mount(&mut self) -> FormResult<()> {
        self.phase = FormPhase::Loading;

        let message = match self.port.fetch_form(&self.form_id).await {
            Ok(result) if result.success => match result.data {
                Some(definition) => {
                    let config = translate(&definition);
                    info!(
                        form_id = %self.form_id,
                        fields = config.fields.len(),
                        "Form definition loaded"
                    );
                    self.apply_config(config);
                    return Ok(());
                }
                None => reported_or(result.error.as_deref(), DEFAULT_FETCH_ERROR),
            },
            Ok(result) => reported_or(result.error.as_deref(), DEFAULT_FETCH_ERROR),
            Err(e) => message_or(&e, DEFAULT_FETCH_ERROR),
        };

        warn!(form_id = %self.form_id, "Failed to load form: {}", message);
        self.phase = FormPhase::Error {
            message: message.clone(),
        };
        Err(FormError::FetchFailure(message))
    }

    /// Install a (new) configuration.
    ///
    /// Pristine forms start from empty values. When the user has already
    /// edited, their input is kept and re-checked against the new schema.
    pub fn apply_config(&mut self, config: FormConfig) {
        self.schema = ValidationSchema::build(&config);
        self.errors.clear();

        if self.dirty {
            self.values = self.values.rebase(&config);
            if let Err(errors) = self.schema.validate(&self.values) {
                self.errors = errors;
            }
        } else {
            self.values = FormValues::initial(&config);
        }

        self.config = Some(config);
        self.phase = FormPhase::Ready {
            submit: SubmitStatus::Idle,
        };
    }

    fn ready_config(&self) -> FormResult<&FormConfig> {
        ready(&self.phase, &self.config)
    }

    /// An edit after a finished submit returns the form to `Idle`.
    fn touch(&mut self) {
        self.dirty = true;
        if let FormPhase::Ready { submit } = &mut self.phase {
            if matches!(submit, SubmitStatus::Success(_) | SubmitStatus::SubmitError(_)) {
                *submit = SubmitStatus::Idle;
            }
        }
    }

    pub fn set_value(&mut self, name: &str, value: FieldValue) -> FormResult<()> {
        let config = ready(&self.phase, &self.config)?;
        self.values.set(config, name, value)?;
        self.errors.remove(name);
        self.touch();
        Ok(())
    }

    /// Add or remove a single option of a multiselect field.
    pub fn toggle_option(&mut self, name: &str, option: &str) -> FormResult<()> {
        let config = ready(&self.phase, &self.config)?;
        self.values.toggle_option(config, name, option)?;
        self.errors.remove(name);
        self.touch();
        Ok(())
    }

    /// Validate all values, recording per-field errors.
    pub fn validate(&mut self) -> FormResult<serde_json::Map<String, serde_json::Value>> {
        self.ready_config()?;
        match self.schema.validate(&self.values) {
            Ok(output) => {
                self.errors.clear();
                Ok(output)
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(FormError::Validation(errors))
            }
        }
    }

    /// First half of a submit: validate, build the payload, notify the host
    /// and enter `Submitting`.
    pub fn begin_submit(&mut self) -> FormResult<SubmissionPayload> {
        if self.is_submitting() {
            return Err(FormError::SubmitInProgress);
        }
        self.validate()?;

        let config = self.ready_config()?;
        let payload = build_payload(&self.form_id, config, &self.values, &self.page);

        self.observer.on_submission_data(&payload);
        self.phase = FormPhase::Ready {
            submit: SubmitStatus::Submitting,
        };
        Ok(payload)
    }

    /// Second half of a submit: record the outcome and notify the host.
    ///
    /// Only valid while a submit begun with [`Self::begin_submit`] is in flight.
    pub fn complete_submit(&mut self, result: SubmissionResult) -> FormResult<SubmissionResult> {
        if !self.is_submitting() {
            return Err(FormError::NotReady);
        }

        if result.success {
            let message = result
                .data
                .as_ref()
                .and_then(|d| d.inline_message.clone())
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string());

            if let Some(config) = &self.config {
                self.values = FormValues::initial(config);
            }
            self.errors.clear();
            self.dirty = false;
            self.phase = FormPhase::Ready {
                submit: SubmitStatus::Success(message),
            };
            info!(form_id = %self.form_id, "Form submitted");
            self.observer.on_submission_response(&result);
            Ok(result)
        } else {
            let message = reported_or(result.error.as_deref(), DEFAULT_SUBMIT_ERROR);
            self.phase = FormPhase::Ready {
                submit: SubmitStatus::SubmitError(message.clone()),
            };
            let reported = SubmissionResult {
                success: false,
                data: result.data,
                error: Some(message.clone()),
            };
            self.observer.on_submission_response(&reported);
            Err(FormError::SubmitFailure(message))
        }
    }

    /// Validate and relay the current values once.
    pub async fn submit(&mut self) -> FormResult<SubmissionResult> {
        let payload = self.begin_submit()?;
        let result = self.relay.relay(&payload).await;
        self.complete_submit(result)
    }
}

fn ready<'a>(phase: &FormPhase, config: &'a Option<FormConfig>) -> FormResult<&'a FormConfig> {
    match (phase, config) {
        (FormPhase::Ready { .. }, Some(config)) => Ok(config),
        _ => Err(FormError::NotReady),
    }
}

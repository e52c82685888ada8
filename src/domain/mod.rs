use async_trait::async_trait;

pub mod controller;
pub mod form;
pub mod relay;
pub mod translator;
pub mod validation;

pub use form::{
    ExternalField, FetchFormResult, FieldConfig, FieldGroup, FieldOption, FieldType, FieldValue,
    FormConfig, FormDefinition, FormValues, SubmissionData, SubmissionPayload, SubmissionResult,
};

/// The external forms service.
///
/// `Err` is a thrown failure (transport, decoding); an `Ok` result with
/// `success: false` is a failure the service reported itself.
#[async_trait]
pub trait FormPort: Send + Sync {
    async fn fetch_form(&self, form_id: &str) -> anyhow::Result<FetchFormResult>;
    async fn submit_form(&self, payload: &SubmissionPayload) -> anyhow::Result<SubmissionResult>;
}

/// Host callbacks fired around a submission.
pub trait SubmissionObserver: Send + Sync {
    /// Called with the payload before the network call starts.
    fn on_submission_data(&self, payload: &SubmissionPayload);

    /// Called once the network call settles, successful or not.
    fn on_submission_response(&self, result: &SubmissionResult);
}

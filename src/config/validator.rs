use thiserror::Error;

use crate::config::{HubSpotSettings, ServerSettings, Settings, SubmissionSettings};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_server(&settings.server) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_hubspot(&settings.hubspot) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_submissions(&settings.submissions) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(server: &ServerSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if server.host.is_empty() {
            errors.push(ValidationError::MissingField("server.host".to_string()));
        }

        if server.port == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_hubspot(hubspot: &HubSpotSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let required = [
            ("hubspot.access_token", &hubspot.access_token),
            ("hubspot.portal_id", &hubspot.portal_id),
            ("hubspot.default_form_id", &hubspot.default_form_id),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(ValidationError::MissingField(field.to_string()));
            }
        }

        let urls = [
            ("hubspot.api_base_url", &hubspot.api_base_url),
            ("hubspot.submit_base_url", &hubspot.submit_base_url),
        ];
        for (field, value) in urls {
            if let Err(e) = url::Url::parse(value) {
                errors.push(ValidationError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("'{}' is not a valid URL: {}", value, e),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_submissions(submissions: &SubmissionSettings) -> Result<(), Vec<ValidationError>> {
        if submissions.history_limit == 0 {
            return Err(vec![ValidationError::InvalidValue {
                field: "submissions.history_limit".to_string(),
                reason: "History limit must be greater than 0".to_string(),
            }]);
        }
        Ok(())
    }
}

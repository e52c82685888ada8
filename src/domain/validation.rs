//! Validation schema builder
//!
//! Derives one validator per configured field. Validating a full set of
//! values yields either the normalised values (numbers coerced, optional
//! empty fields dropped) or a field-name -> error map.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use super::form::{FieldConfig, FieldType, FieldValue, FormConfig, FormValues};

/// Name of the field that is additionally checked as a URL, whatever its type.
pub const WEBSITE_FIELD: &str = "website";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.[A-Za-z][A-Za-z0-9-]*[A-Za-z0-9]$",
    )
    .expect("email pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0} is required")]
    Required(String),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Must be a valid number")]
    InvalidNumber,

    #[error("Must be a valid URL")]
    InvalidUrl,

    #[error("Expected a list of values")]
    ExpectedList,

    #[error("Expected a single value")]
    ExpectedText,
}

impl Serialize for FieldError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Field-level failures keyed by field name
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, name: &str) -> Option<&FieldError> {
        self.errors.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldError)> {
        self.errors.iter()
    }

    pub fn insert(&mut self, name: impl Into<String>, error: FieldError) {
        self.errors.insert(name.into(), error);
    }

    pub fn remove(&mut self, name: &str) {
        self.errors.remove(name);
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(name, err)| format!("{}: {}", name, err))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// List of strings; `required` only demands presence, never non-emptiness
    List,
    Email,
    Number,
    /// Always at least one character when present
    MultiLine,
    Text,
}

#[derive(Debug, Clone)]
pub struct FieldValidator {
    name: String,
    label: String,
    rule: Rule,
    required: bool,
    check_url: bool,
}

impl FieldValidator {
    pub fn for_field(field: &FieldConfig) -> Self {
        let rule = match field.field_type {
            FieldType::Multiselect => Rule::List,
            FieldType::Email => Rule::Email,
            FieldType::Number => Rule::Number,
            FieldType::MultiLineText => Rule::MultiLine,
            FieldType::Text | FieldType::Select => Rule::Text,
        };
        let label = if field.label.is_empty() {
            field.name.clone()
        } else {
            field.label.clone()
        };

        Self {
            name: field.name.clone(),
            label,
            rule,
            required: field.required,
            check_url: field.name == WEBSITE_FIELD,
        }
    }

    /// Check one value; `Ok(None)` means the field is absent from the output.
    pub fn check(&self, value: Option<&FieldValue>) -> Result<Option<Value>, FieldError> {
        if self.rule == Rule::List {
            return match value {
                None if self.required => Err(FieldError::ExpectedList),
                None => Ok(None),
                Some(FieldValue::MultiValue(items)) => Ok(Some(Value::Array(
                    items.iter().cloned().map(Value::String).collect(),
                ))),
                Some(FieldValue::Scalar(_)) => Err(FieldError::ExpectedList),
            };
        }

        let text = match value {
            None if self.required => return Err(self.required_error()),
            None => return Ok(None),
            Some(FieldValue::MultiValue(_)) => return Err(FieldError::ExpectedText),
            Some(FieldValue::Scalar(s)) => s.as_str(),
        };

        if text.is_empty() {
            if self.required || self.rule == Rule::MultiLine {
                return Err(self.required_error());
            }
            return Ok(None);
        }

        if self.check_url && url::Url::parse(text).is_err() {
            return Err(FieldError::InvalidUrl);
        }

        match self.rule {
            Rule::Email if !EMAIL_RE.is_match(text) => Err(FieldError::InvalidEmail),
            Rule::Number => parse_number(text)
                .map(|n| Some(Value::Number(n)))
                .ok_or(FieldError::InvalidNumber),
            _ => Ok(Some(Value::String(text.to_string()))),
        }
    }

    fn required_error(&self) -> FieldError {
        FieldError::Required(self.label.clone())
    }
}

fn parse_number(text: &str) -> Option<Number> {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Number::from(i));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}

/// Per-field validators for one form configuration
#[derive(Debug, Clone, Default)]
pub struct ValidationSchema {
    validators: Vec<FieldValidator>,
}

impl ValidationSchema {
    pub fn build(config: &FormConfig) -> Self {
        Self {
            validators: config.fields.iter().map(FieldValidator::for_field).collect(),
        }
    }

    /// Validate every field, collecting all failures.
    pub fn validate(&self, values: &FormValues) -> Result<Map<String, Value>, ValidationErrors> {
        let mut output = Map::new();
        let mut errors = ValidationErrors::default();

        for validator in &self.validators {
            match validator.check(values.get(&validator.name)) {
                Ok(Some(value)) => {
                    output.insert(validator.name.clone(), value);
                }
                Ok(None) => {}
                Err(e) => errors.insert(validator.name.clone(), e),
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(errors)
        }
    }
}

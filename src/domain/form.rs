//! Form data model
//!
//! Two shapes live here: the external form definition as the forms service
//! returns it, and the internal field configuration the renderer, validator
//! and relay work from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::FormError;

// ============================================================================
// External Form Definition (read-only, owned by the forms service)
// ============================================================================

/// A selectable option of a dropdown or checkbox field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

/// One field as described by the external forms API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalField {
    pub name: String,
    #[serde(default)]
    pub label: String,
    /// Free-form type tag (`email`, `dropdown`, `multiple_checkboxes`, ...)
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldGroup {
    #[serde(default)]
    pub fields: Vec<ExternalField>,
}

/// Authoritative form description, fields grouped into field groups
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub field_groups: Vec<FieldGroup>,
}

/// Outcome of the fetch-form collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFormResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<FormDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchFormResult {
    pub fn success(definition: FormDefinition) -> Self {
        Self {
            success: true,
            data: Some(definition),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// ============================================================================
// Internal Field Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Email,
    Select,
    Multiselect,
    Number,
    MultiLineText,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Select => "select",
            FieldType::Multiselect => "multiselect",
            FieldType::Number => "number",
            FieldType::MultiLineText => "multi_line_text",
        }
    }

    /// Type tag recorded in a submission payload's `fieldTypes` map.
    pub fn submission_tag(&self) -> &'static str {
        match self {
            FieldType::Multiselect => "multiple_checkboxes",
            other => other.as_str(),
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, FieldType::Multiselect)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormConfig {
    pub name: String,
    pub fields: Vec<FieldConfig>,
}

impl FormConfig {
    pub fn field(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ============================================================================
// Form Values
// ============================================================================

/// Value of a single field: plain text, or the checked options of a multiselect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    MultiValue(Vec<String>),
}

impl FieldValue {
    pub fn empty_for(field_type: FieldType) -> Self {
        if field_type.is_multi() {
            FieldValue::MultiValue(Vec::new())
        } else {
            FieldValue::Scalar(String::new())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Scalar(s) => s.is_empty(),
            FieldValue::MultiValue(v) => v.is_empty(),
        }
    }

    /// Coerce into the list shape, wrapping a bare value.
    pub fn into_multi(self) -> Self {
        match self {
            FieldValue::Scalar(s) if s.is_empty() => FieldValue::MultiValue(Vec::new()),
            FieldValue::Scalar(s) => FieldValue::MultiValue(vec![s]),
            multi => multi,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            FieldValue::MultiValue(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Scalar(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Scalar(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::MultiValue(v)
    }
}

/// Current values keyed by field name.
///
/// Keys are always names of fields in the form configuration the values were
/// created for, and multiselect fields always hold a list.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct FormValues {
    values: BTreeMap<String, FieldValue>,
}

impl FormValues {
    /// Empty string per field, empty list per multiselect field.
    pub fn initial(config: &FormConfig) -> Self {
        let values = config
            .fields
            .iter()
            .map(|f| (f.name.clone(), FieldValue::empty_for(f.field_type)))
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replace a field's value. Unknown names are rejected.
    pub fn set(
        &mut self,
        config: &FormConfig,
        name: &str,
        value: FieldValue,
    ) -> Result<(), FormError> {
        let field = config
            .field(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;

        let value = if field.field_type.is_multi() {
            value.into_multi()
        } else {
            match value {
                FieldValue::MultiValue(mut items) => {
                    // A scalar field posted more than once keeps its last value
                    FieldValue::Scalar(items.pop().unwrap_or_default())
                }
                scalar => scalar,
            }
        };

        self.values.insert(field.name.clone(), value);
        Ok(())
    }

    /// Add `option` to a multiselect field if absent, remove it if present.
    pub fn toggle_option(
        &mut self,
        config: &FormConfig,
        name: &str,
        option: &str,
    ) -> Result<(), FormError> {
        let field = config
            .field(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        if !field.field_type.is_multi() {
            return Err(FormError::NotMultiselect(name.to_string()));
        }

        let entry = self
            .values
            .entry(field.name.clone())
            .or_insert_with(|| FieldValue::MultiValue(Vec::new()));
        if let FieldValue::Scalar(s) = entry {
            let bare = std::mem::take(s);
            *entry = FieldValue::Scalar(bare).into_multi();
        }
        if let FieldValue::MultiValue(items) = entry {
            if let Some(pos) = items.iter().position(|v| v == option) {
                items.remove(pos);
            } else {
                items.push(option.to_string());
            }
        }
        Ok(())
    }

    /// Carry values over to a new configuration.
    ///
    /// Fields the new configuration no longer has are dropped, new fields
    /// start empty, and values of fields that became multiselect are wrapped.
    pub fn rebase(&self, config: &FormConfig) -> Self {
        let values = config
            .fields
            .iter()
            .map(|f| {
                let value = match self.values.get(&f.name) {
                    Some(v) if f.field_type.is_multi() => v.clone().into_multi(),
                    Some(FieldValue::MultiValue(items)) => {
                        FieldValue::Scalar(items.last().cloned().unwrap_or_default())
                    }
                    Some(v) => v.clone(),
                    None => FieldValue::empty_for(f.field_type),
                };
                (f.name.clone(), value)
            })
            .collect();
        Self { values }
    }
}

// ============================================================================
// Submission
// ============================================================================

/// Data sent to the forms service to record a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub form_id: String,
    pub fields: BTreeMap<String, FieldValue>,
    pub field_types: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Any further fields the service reported
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SubmissionData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmissionResult {
    pub fn success(data: SubmissionData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FormConfig {
        FormConfig {
            name: "Contact".to_string(),
            fields: vec![
                FieldConfig {
                    name: "firstname".to_string(),
                    label: "First name".to_string(),
                    field_type: FieldType::Text,
                    placeholder: None,
                    description: None,
                    required: true,
                    options: None,
                },
                FieldConfig {
                    name: "colors".to_string(),
                    label: "Colors".to_string(),
                    field_type: FieldType::Multiselect,
                    placeholder: None,
                    description: None,
                    required: false,
                    options: Some(vec![
                        FieldOption { label: "Red".to_string(), value: "red".to_string() },
                        FieldOption { label: "Blue".to_string(), value: "blue".to_string() },
                    ]),
                },
            ],
        }
    }

    #[test]
    fn test_initial_values_match_field_shapes() {
        let values = FormValues::initial(&config());
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("firstname"), Some(&FieldValue::Scalar(String::new())));
        assert_eq!(values.get("colors"), Some(&FieldValue::MultiValue(vec![])));
    }

    #[test]
    fn test_set_rejects_unknown_field() {
        let config = config();
        let mut values = FormValues::initial(&config);
        let err = values.set(&config, "nope", "x".into()).unwrap_err();
        assert!(matches!(err, FormError::UnknownField(name) if name == "nope"));
        assert!(values.get("nope").is_none());
    }

    #[test]
    fn test_set_wraps_scalar_for_multiselect() {
        let config = config();
        let mut values = FormValues::initial(&config);
        values.set(&config, "colors", "red".into()).unwrap();
        assert_eq!(
            values.get("colors"),
            Some(&FieldValue::MultiValue(vec!["red".to_string()]))
        );
    }

    #[test]
    fn test_toggle_option_adds_and_removes() {
        let config = config();
        let mut values = FormValues::initial(&config);
        values.toggle_option(&config, "colors", "red").unwrap();
        values.toggle_option(&config, "colors", "blue").unwrap();
        values.toggle_option(&config, "colors", "red").unwrap();
        assert_eq!(
            values.get("colors"),
            Some(&FieldValue::MultiValue(vec!["blue".to_string()]))
        );

        let err = values.toggle_option(&config, "firstname", "x").unwrap_err();
        assert!(matches!(err, FormError::NotMultiselect(_)));
    }

    #[test]
    fn test_rebase_drops_removed_fields() {
        let config = config();
        let mut values = FormValues::initial(&config);
        values.set(&config, "firstname", "Ada".into()).unwrap();

        let mut next = config.clone();
        next.fields.remove(1);
        let rebased = values.rebase(&next);
        assert_eq!(rebased.len(), 1);
        assert_eq!(rebased.get("firstname"), Some(&FieldValue::Scalar("Ada".to_string())));
    }

    #[test]
    fn test_field_value_untagged_serde() {
        let scalar: FieldValue = serde_json::from_str("\"a\"").unwrap();
        let multi: FieldValue = serde_json::from_str("[\"a\"]").unwrap();
        assert_eq!(scalar, FieldValue::Scalar("a".to_string()));
        assert_eq!(multi, FieldValue::MultiValue(vec!["a".to_string()]));
    }

    #[test]
    fn test_field_type_tags() {
        assert_eq!(FieldType::Multiselect.submission_tag(), "multiple_checkboxes");
        assert_eq!(FieldType::Email.submission_tag(), "email");
        assert_eq!(
            serde_json::to_value(FieldType::MultiLineText).unwrap(),
            serde_json::json!("multi_line_text")
        );
    }
}

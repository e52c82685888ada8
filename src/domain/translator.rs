//! Schema translator: external form definition -> internal field configuration

use tracing::debug;

use super::form::{ExternalField, FieldConfig, FieldType, FormConfig, FormDefinition};

/// Flatten a form definition into a [`FormConfig`].
///
/// Groups are traversed in order, then fields within each group. Unknown
/// external types never fail; they fall through to the default mapping.
pub fn translate(definition: &FormDefinition) -> FormConfig {
    let fields: Vec<FieldConfig> = definition
        .field_groups
        .iter()
        .flat_map(|group| group.fields.iter())
        .map(translate_field)
        .collect();

    debug!(form = %definition.name, fields = fields.len(), "Translated form definition");

    FormConfig {
        name: definition.name.clone(),
        fields,
    }
}

pub fn translate_field(field: &ExternalField) -> FieldConfig {
    let field_type = map_field_type(&field.field_type, &field.name);
    let options = match field_type {
        FieldType::Select | FieldType::Multiselect => field.options.clone(),
        _ => None,
    };

    FieldConfig {
        name: field.name.clone(),
        label: field.label.clone(),
        field_type,
        placeholder: field.placeholder.clone(),
        description: field.description.clone(),
        required: field.required,
        options,
    }
}

/// Map an external type tag onto an internal [`FieldType`].
pub fn map_field_type(external_type: &str, field_name: &str) -> FieldType {
    match external_type {
        "email" => FieldType::Email,
        "dropdown" => FieldType::Select,
        "multiple_checkboxes" => FieldType::Multiselect,
        "number" => FieldType::Number,
        // Rendered and validated as plain text, not as MultiLineText.
        "multi_line_text" => FieldType::Text,
        // Fallback heuristic: a field whose name mentions "email" is treated
        // as an email field even when the service types it as plain text.
        _ if field_name.to_lowercase().contains("email") => FieldType::Email,
        _ => FieldType::Text,
    }
}

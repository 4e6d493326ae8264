// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool declarations offered to the chat model and their typed inputs.

use odoobot_core::{OdoobotError, ToolSpec};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const SEARCH_RECORDS: &str = "search_records";
pub const READ_RECORD: &str = "read_record";

/// Input of `search_records`, with the defaults the model may omit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecordsInput {
    pub model: String,
    #[serde(default)]
    pub domain: Vec<Value>,
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_order")]
    pub order: String,
}

fn default_fields() -> Vec<String> {
    vec!["name".to_string(), "id".to_string()]
}

fn default_limit() -> u32 {
    10
}

fn default_order() -> String {
    "id desc".to_string()
}

/// Input of `read_record`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadRecordInput {
    pub model: String,
    pub record_id: i64,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

impl SearchRecordsInput {
    pub fn from_value(input: &Value) -> Result<Self, OdoobotError> {
        let parsed: Self = parse_input(SEARCH_RECORDS, input)?;
        require_model(SEARCH_RECORDS, &parsed.model)?;
        Ok(parsed)
    }
}

impl ReadRecordInput {
    pub fn from_value(input: &Value) -> Result<Self, OdoobotError> {
        let parsed: Self = parse_input(READ_RECORD, input)?;
        require_model(READ_RECORD, &parsed.model)?;
        Ok(parsed)
    }

    /// Body sent to the server's `/read` route.
    pub fn payload(&self) -> Value {
        json!({
            "model": self.model,
            "ids": [self.record_id],
            "fields": self.fields,
        })
    }
}

fn parse_input<T: serde::de::DeserializeOwned>(tool: &str, input: &Value) -> Result<T, OdoobotError> {
    serde_json::from_value(input.clone())
        .map_err(|e| OdoobotError::Validation(format!("invalid input for {tool}: {e}")))
}

fn require_model(tool: &str, model: &str) -> Result<(), OdoobotError> {
    if model.trim().is_empty() {
        return Err(OdoobotError::Validation(format!(
            "invalid input for {tool}: `model` must not be empty"
        )));
    }
    Ok(())
}

/// The two record tools, as declared on the chat request.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: SEARCH_RECORDS.to_string(),
            description: "Search for records in Odoo database".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "model": {
                        "type": "string",
                        "description": "Odoo model name (e.g., 'crm.lead', 'res.partner')"
                    },
                    "domain": {
                        "type": "array",
                        "description": "Search domain (e.g., [['name', 'ilike', 'test']])",
                        "default": []
                    },
                    "fields": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Fields to retrieve",
                        "default": ["name", "id"]
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of records",
                        "default": 10
                    },
                    "order": {
                        "type": "string",
                        "description": "Sort order (e.g., 'create_date desc')",
                        "default": "id desc"
                    }
                },
                "required": ["model"]
            }),
        },
        ToolSpec {
            name: READ_RECORD.to_string(),
            description: "Read specific fields from an Odoo record".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "model": {"type": "string", "description": "Odoo model name"},
                    "record_id": {"type": "integer", "description": "Record ID"},
                    "fields": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Fields to read"
                    }
                },
                "required": ["model", "record_id", "fields"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_input_fills_defaults() {
        let input = SearchRecordsInput::from_value(&json!({"model": "crm.lead"})).unwrap();
        assert!(input.domain.is_empty());
        assert_eq!(input.fields, vec!["name", "id"]);
        assert_eq!(input.limit, 10);
        assert_eq!(input.order, "id desc");
    }

    #[test]
    fn search_input_keeps_explicit_values() {
        let input = SearchRecordsInput::from_value(&json!({
            "model": "crm.lead",
            "domain": [["stage_id.name", "=", "Won"]],
            "limit": 1,
            "order": "create_date desc"
        }))
        .unwrap();
        assert_eq!(input.domain.len(), 1);
        assert_eq!(input.limit, 1);
        assert_eq!(input.order, "create_date desc");
    }

    #[test]
    fn missing_model_is_validation_error() {
        let err = SearchRecordsInput::from_value(&json!({"limit": 3})).unwrap_err();
        assert!(matches!(err, OdoobotError::Validation(_)));
        let err = ReadRecordInput::from_value(&json!({"model": " ", "record_id": 1})).unwrap_err();
        assert!(matches!(err, OdoobotError::Validation(_)));
    }

    #[test]
    fn read_requires_record_id() {
        let err = ReadRecordInput::from_value(&json!({"model": "res.partner"})).unwrap_err();
        assert!(err.to_string().contains("record_id"), "got: {err}");
    }

    #[test]
    fn read_payload_wraps_id() {
        let input = ReadRecordInput::from_value(&json!({
            "model": "res.partner",
            "record_id": 42,
            "fields": ["email"]
        }))
        .unwrap();
        assert_eq!(
            input.payload(),
            json!({"model": "res.partner", "ids": [42], "fields": ["email"]})
        );
    }

    #[test]
    fn exactly_two_tools_declared() {
        let names: Vec<_> = tool_specs().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec![SEARCH_RECORDS, READ_RECORD]);
    }
}

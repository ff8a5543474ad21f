//! Flow results sent to the frontend

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::flow::FlowErrors;
use crate::schema::FormField;

/// Result type: form, create_entry or abort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowResultType {
    Form,
    CreateEntry,
    Abort,
}

/// Result of a flow step as seen by the frontend
#[derive(Debug, Clone, Serialize)]
pub struct FlowResult {
    /// Flow ID
    pub flow_id: String,
    /// Handler (integration domain)
    pub handler: String,
    #[serde(rename = "type")]
    pub result_type: FlowResultType,
    /// Current step ID (for form type)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    /// Data schema for the form, empty unless this is a form
    pub data_schema: Vec<FormField>,
    /// Errors from the previous submission (null if none)
    pub errors: Option<FlowErrors>,
    /// Title (for create_entry type)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Abort reason (for abort type)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Entry data (for create_entry type)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, serde_json::Value>>,
    /// Entry options (for create_entry type)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<HashMap<String, serde_json::Value>>,
    /// The created or updated config entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Version (for create_entry)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Minor version (for create_entry)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minor_version: Option<u32>,
}

impl FlowResult {
    fn empty(flow_id: &str, handler: &str, result_type: FlowResultType) -> Self {
        Self {
            flow_id: flow_id.to_string(),
            handler: handler.to_string(),
            result_type,
            step_id: None,
            data_schema: Vec::new(),
            errors: None,
            title: None,
            reason: None,
            data: None,
            options: None,
            result: None,
            version: None,
            minor_version: None,
        }
    }

    pub fn form(
        flow_id: &str,
        handler: &str,
        step_id: String,
        data_schema: Vec<FormField>,
        errors: FlowErrors,
    ) -> Self {
        Self {
            step_id: Some(step_id),
            data_schema,
            errors: (!errors.is_empty()).then_some(errors),
            ..Self::empty(flow_id, handler, FlowResultType::Form)
        }
    }

    pub fn abort(flow_id: &str, handler: &str, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::empty(flow_id, handler, FlowResultType::Abort)
        }
    }

    pub fn create_entry(
        flow_id: &str,
        handler: &str,
        title: String,
        data: HashMap<String, serde_json::Value>,
        options: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            title: Some(title),
            data: Some(data),
            options: Some(options),
            version: Some(1),
            minor_version: Some(1),
            ..Self::empty(flow_id, handler, FlowResultType::CreateEntry)
        }
    }

    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }
}

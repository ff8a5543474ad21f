//! A committed configuration

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a finished setup flow leaves behind
///
/// WAQI keeps everything the user typed in `options` (token and interval) so
/// the options flow can replace it wholesale; `data` stays empty for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// ULID assigned on creation
    pub entry_id: String,
    pub domain: String,
    pub title: String,
    #[serde(default)]
    pub data: HashMap<String, Value>,
    #[serde(default)]
    pub options: HashMap<String, Value>,
    /// Station id for WAQI; at most one entry per `(domain, unique_id)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Bumped whenever options are replaced
    pub modified_at: DateTime<Utc>,
}

impl ConfigEntry {
    pub fn new(domain: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            entry_id: ulid::Ulid::new().to_string(),
            domain: domain.into(),
            title: title.into(),
            data: HashMap::new(),
            options: HashMap::new(),
            unique_id: None,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn with_data(mut self, data: HashMap<String, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn with_options(mut self, options: HashMap<String, Value>) -> Self {
        self.options = options;
        self
    }

    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }
}

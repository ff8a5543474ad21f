//! Read-only entry queries
//!
//! Flows only need to ask two questions of the entry store, so they depend on
//! this trait rather than on [`ConfigEntries`] directly.

use std::collections::HashMap;

use crate::store::ConfigEntries;

/// Queries a flow may run against the configured entries
pub trait EntryLookup: Send + Sync {
    /// Whether an entry with this unique_id already exists for the domain
    fn is_unique_id_configured(&self, domain: &str, unique_id: &str) -> bool;

    /// Current options of an existing entry
    fn entry_options(&self, entry_id: &str) -> Option<HashMap<String, serde_json::Value>>;
}

impl EntryLookup for ConfigEntries {
    fn is_unique_id_configured(&self, domain: &str, unique_id: &str) -> bool {
        self.get_by_unique_id(domain, unique_id).is_some()
    }

    fn entry_options(&self, entry_id: &str) -> Option<HashMap<String, serde_json::Value>> {
        self.get(entry_id).map(|entry| entry.options)
    }
}

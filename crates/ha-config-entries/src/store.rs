//! Config entry store
//!
//! Entries are indexed by id and by `(domain, unique_id)`. The unique-id slot
//! is claimed through the map's entry API, so two flows finishing for the
//! same station cannot both commit.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::entry::ConfigEntry;

#[derive(Debug, Error)]
pub enum ConfigEntriesError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Entry already exists for domain {domain} with unique_id {unique_id}")]
    AlreadyExists { domain: String, unique_id: String },
}

pub type ConfigEntriesResult<T> = Result<T, ConfigEntriesError>;

#[derive(Debug, Default)]
pub struct ConfigEntries {
    /// entry_id -> ConfigEntry
    entries: DashMap<String, ConfigEntry>,

    /// (domain, unique_id) -> entry_id
    by_unique_id: DashMap<(String, String), String>,
}

impl ConfigEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.entries.get(entry_id).map(|r| r.value().clone())
    }

    pub fn get_by_unique_id(&self, domain: &str, unique_id: &str) -> Option<ConfigEntry> {
        let entry_id = self
            .by_unique_id
            .get(&(domain.to_string(), unique_id.to_string()))
            .map(|r| r.value().clone())?;
        self.get(&entry_id)
    }

    /// Commit an entry produced by a finished flow
    pub fn add(&self, entry: ConfigEntry) -> ConfigEntriesResult<ConfigEntry> {
        if let Some(unique_id) = &entry.unique_id {
            match self
                .by_unique_id
                .entry((entry.domain.clone(), unique_id.clone()))
            {
                Entry::Occupied(_) => {
                    return Err(ConfigEntriesError::AlreadyExists {
                        domain: entry.domain.clone(),
                        unique_id: unique_id.clone(),
                    })
                }
                Entry::Vacant(slot) => {
                    slot.insert(entry.entry_id.clone());
                }
            }
        }

        self.entries.insert(entry.entry_id.clone(), entry.clone());
        info!(
            "Added config entry: {} ({}) [{}]",
            entry.title, entry.domain, entry.entry_id
        );
        Ok(entry)
    }

    /// Replace an entry's options, as an options flow does on submit
    pub fn set_options(
        &self,
        entry_id: &str,
        options: HashMap<String, Value>,
    ) -> ConfigEntriesResult<ConfigEntry> {
        let mut entry = self
            .entries
            .get_mut(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        entry.options = options;
        entry.modified_at = Utc::now();
        debug!("Replaced options of config entry {}", entry_id);
        Ok(entry.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Config Entries
//!
//! The host side of a config flow: the entries that finished flows commit,
//! and the queries flows run against them while they are still open.
//!
//! # Key Types
//!
//! - [`ConfigEntry`] - One configured station (or other integration instance)
//! - [`ConfigEntries`] - Entry store keyed by entry id and `(domain, unique_id)`
//! - [`EntryLookup`] - Read-only queries used by config and options flows
//!
//! Entries live in memory. Persisting them is left to the host platform.

pub mod entry;
pub mod lookup;
pub mod store;

pub use entry::ConfigEntry;
pub use lookup::EntryLookup;
pub use store::{ConfigEntries, ConfigEntriesError, ConfigEntriesResult};

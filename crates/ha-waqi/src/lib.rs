//! World Air Quality Index (WAQI) integration
//!
//! Config flow for adding an air-quality monitoring station, either by
//! searching the WAQI station directory or by entering a station id, and an
//! options flow for changing the API token and update interval afterwards.
//!
//! The WAQI API client itself is provided by the host through
//! [`WaqiClientFactory`].

pub mod client;
pub mod config_flow;
pub mod consts;
pub mod error;
pub mod options_flow;

pub use client::{Feed, SearchResult, Station, WaqiClient, WaqiClientFactory};
pub use config_flow::{WaqiConfigFlow, WizardSession};
pub use error::{SetupFailure, WaqiError};
pub use options_flow::{OptionsSession, WaqiOptionsFlow};

//! Config flow for the WAQI integration
//!
//! ```text
//! user ──search──▶ user_search ──stations found──▶ pick_station ──▶ create entry
//!   │                   ▲ └─ error: redisplay ─┘
//!   └───feed───▶ user_feed ──feed found──▶ create entry
//!                       ▲ └─ quota/token/empty: redisplay ─┘
//!                         └─ other error: abort "unknown"
//! ```
//!
//! Both paths abort with `already_configured` when the station already has
//! a config entry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ha_data_entry_flow::{
    FieldType, FlowContext, FlowError, FlowErrors, FlowHandler, FlowStep, FormField, Schema,
    StepOutcome, UserInput, BASE,
};
use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::debug;

use crate::client::WaqiClientFactory;
use crate::consts::*;
use crate::error::SetupFailure;

/// State kept between the steps of one setup attempt
#[derive(Debug, Clone, PartialEq)]
pub struct WizardSession {
    pub api_token: String,
    /// Seconds between updates
    pub update_interval: u64,
    /// Station id -> display name, in search result order
    pub stations: IndexMap<String, String>,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            stations: IndexMap::new(),
        }
    }
}

/// Config flow handler for adding a WAQI station
pub struct WaqiConfigFlow {
    client_factory: Arc<dyn WaqiClientFactory>,
}

impl WaqiConfigFlow {
    pub fn new(client_factory: Arc<dyn WaqiClientFactory>) -> Self {
        Self { client_factory }
    }

    /// Choose between searching for a station and entering its id
    pub async fn async_step_user(
        &self,
        session: WizardSession,
        user_input: Option<UserInput>,
        ctx: &FlowContext<'_>,
    ) -> Result<StepOutcome<WizardSession>, FlowError> {
        if let Some(input) = user_input {
            match input.get_str(FLOW_TYPE) {
                Some(FLOW_SEARCH) => return self.async_step_user_search(session, None, ctx).await,
                Some(FLOW_FEED) => return self.async_step_user_feed(session, None, ctx).await,
                _ => {}
            }
        }

        Ok(StepOutcome::new(
            session,
            FlowStep::show_form(STEP_USER, flow_type_schema()),
        ))
    }

    /// Search stations by keyword
    pub async fn async_step_user_search(
        &self,
        session: WizardSession,
        user_input: Option<UserInput>,
        ctx: &FlowContext<'_>,
    ) -> Result<StepOutcome<WizardSession>, FlowError> {
        let Some(input) = user_input else {
            return Ok(StepOutcome::new(
                session,
                FlowStep::show_form(
                    STEP_USER_SEARCH,
                    search_schema(None, None, DEFAULT_UPDATE_INTERVAL),
                ),
            ));
        };

        let api_token = input.get_str(CONF_API_TOKEN).unwrap_or_default();
        let keyword = input.get_str(CONF_KEYWORD).unwrap_or_default();
        let update_interval = input.require_u64(CONF_UPDATE_INTERVAL)?;

        let client = self.client_factory.create(api_token);
        let found = match client.search(keyword).await {
            Ok(found) if found.is_empty() => Err(SetupFailure::EmptyResult),
            Ok(found) => {
                debug!("Found: {:?}", found);
                Ok(found)
            }
            Err(e) => {
                debug!("Station search for '{}' failed: {}", keyword, e);
                Err(SetupFailure::from(&e))
            }
        };

        let found = match found {
            Ok(found) => found,
            Err(failure) => {
                let errors = form_errors(failure.form_error(CONF_KEYWORD, ERROR_NO_MATCHING_STATIONS));
                debug!("Errors: {:?}", errors);
                return Ok(StepOutcome::new(
                    session,
                    FlowStep::show_form_with_errors(
                        STEP_USER_SEARCH,
                        search_schema(Some(api_token), Some(keyword), update_interval),
                        errors,
                    ),
                ));
            }
        };

        let stations = found
            .into_iter()
            .map(|result| {
                debug!("Station found: {:?}", result);
                (result.uid, result.station.name)
            })
            .collect();

        let session = WizardSession {
            api_token: api_token.to_string(),
            update_interval,
            stations,
        };

        self.async_step_pick_station(session, None, ctx).await
    }

    /// Pick one of the stations found by the search
    pub async fn async_step_pick_station(
        &self,
        session: WizardSession,
        user_input: Option<UserInput>,
        ctx: &FlowContext<'_>,
    ) -> Result<StepOutcome<WizardSession>, FlowError> {
        let Some(input) = user_input else {
            let schema = pick_station_schema(&session.stations);
            return Ok(StepOutcome::new(
                session,
                FlowStep::show_form(STEP_PICK_STATION, schema),
            ));
        };

        let unique_id = input.get_str(CONF_STATION).unwrap_or_default().to_string();

        if ctx.entries.is_unique_id_configured(DOMAIN, &unique_id) {
            return Ok(StepOutcome::new(
                session,
                FlowStep::abort(SetupFailure::DuplicateStation.abort_reason()),
            ));
        }

        let Some(title) = session.stations.get(&unique_id).cloned() else {
            // Only reachable when the input bypassed the select schema
            let schema = pick_station_schema(&session.stations);
            return Ok(StepOutcome::new(
                session,
                FlowStep::show_form_with_errors(
                    STEP_PICK_STATION,
                    schema,
                    form_errors((BASE, ERROR_UNKNOWN)),
                ),
            ));
        };

        debug!("Station data: {}", title);
        let options = entry_options(&session.api_token, session.update_interval);
        Ok(StepOutcome::new(
            session,
            FlowStep::CreateEntry {
                title,
                data: HashMap::new(),
                options,
                unique_id: Some(unique_id),
            },
        ))
    }

    /// Add a station by its id
    pub async fn async_step_user_feed(
        &self,
        session: WizardSession,
        user_input: Option<UserInput>,
        ctx: &FlowContext<'_>,
    ) -> Result<StepOutcome<WizardSession>, FlowError> {
        let Some(input) = user_input else {
            return Ok(StepOutcome::new(
                session,
                FlowStep::show_form(
                    STEP_USER_FEED,
                    feed_schema(None, None, DEFAULT_UPDATE_INTERVAL),
                ),
            ));
        };

        let api_token = input.get_str(CONF_API_TOKEN).unwrap_or_default();
        let station_id = input.get_str(CONF_STATION).unwrap_or_default();
        let update_interval = input.require_u64(CONF_UPDATE_INTERVAL)?;

        let client = self.client_factory.create(api_token);
        let failure = match client.feed(station_id).await {
            Ok(Some(feed)) => {
                debug!("Station data: {:?}", feed);

                if ctx.entries.is_unique_id_configured(DOMAIN, station_id) {
                    return Ok(StepOutcome::new(
                        session,
                        FlowStep::abort(SetupFailure::DuplicateStation.abort_reason()),
                    ));
                }

                return Ok(StepOutcome::new(
                    session,
                    FlowStep::CreateEntry {
                        title: feed.uid,
                        data: HashMap::new(),
                        options: entry_options(api_token, update_interval),
                        unique_id: Some(station_id.to_string()),
                    },
                ));
            }
            Ok(None) => SetupFailure::EmptyResult,
            Err(e) => {
                debug!("Feed for station {} failed: {}", station_id, e);
                SetupFailure::from(&e)
            }
        };

        // Unlike the search step, an unexpected failure here ends the flow
        if failure == SetupFailure::UnknownFailure {
            return Ok(StepOutcome::new(
                session,
                FlowStep::abort(failure.abort_reason()),
            ));
        }

        let errors = form_errors(failure.form_error(CONF_STATION, ERROR_NO_STATION_FEED));
        debug!("Errors: {:?}", errors);
        Ok(StepOutcome::new(
            session,
            FlowStep::show_form_with_errors(
                STEP_USER_FEED,
                feed_schema(Some(api_token), Some(station_id), update_interval),
                errors,
            ),
        ))
    }
}

#[async_trait]
impl FlowHandler for WaqiConfigFlow {
    type Session = WizardSession;

    fn handler(&self) -> &str {
        DOMAIN
    }

    fn init_step(&self) -> &'static str {
        STEP_USER
    }

    fn new_session(&self, _ctx: &FlowContext<'_>) -> Result<WizardSession, FlowError> {
        Ok(WizardSession::default())
    }

    async fn async_step(
        &self,
        session: WizardSession,
        step_id: &str,
        user_input: Option<UserInput>,
        ctx: &FlowContext<'_>,
    ) -> Result<StepOutcome<WizardSession>, FlowError> {
        match step_id {
            STEP_USER => self.async_step_user(session, user_input, ctx).await,
            STEP_USER_SEARCH => self.async_step_user_search(session, user_input, ctx).await,
            STEP_PICK_STATION => self.async_step_pick_station(session, user_input, ctx).await,
            STEP_USER_FEED => self.async_step_user_feed(session, user_input, ctx).await,
            _ => Err(FlowError::UnknownStep {
                handler: DOMAIN.to_string(),
                step_id: step_id.to_string(),
            }),
        }
    }
}

fn form_errors((field, key): (&str, &str)) -> FlowErrors {
    let mut errors = FlowErrors::new();
    errors.insert(field.to_string(), key.to_string());
    errors
}

fn entry_options(api_token: &str, update_interval: u64) -> HashMap<String, Value> {
    let mut options = HashMap::new();
    options.insert(CONF_API_TOKEN.to_string(), json!(api_token));
    options.insert(CONF_UPDATE_INTERVAL.to_string(), json!(update_interval));
    options
}

fn text_field(name: &str, default: Option<&str>) -> FormField {
    let field = FormField::required(name, FieldType::String);
    match default {
        Some(value) => field.with_default(value),
        None => field,
    }
}

/// Shared by the setup and options forms
pub(crate) fn interval_field(default: u64) -> FormField {
    FormField::optional(CONF_UPDATE_INTERVAL, FieldType::Integer)
        .with_default(default)
        .with_min(MIN_UPDATE_INTERVAL)
}

fn flow_type_schema() -> Schema {
    Schema::new(vec![FormField::required(FLOW_TYPE, FieldType::Select)
        .with_options([(FLOW_SEARCH, FLOW_SEARCH_LABEL), (FLOW_FEED, FLOW_FEED_LABEL)])
        .with_default(FLOW_SEARCH)])
}

fn search_schema(api_token: Option<&str>, keyword: Option<&str>, update_interval: u64) -> Schema {
    Schema::new(vec![
        text_field(CONF_API_TOKEN, api_token),
        text_field(CONF_KEYWORD, keyword),
        interval_field(update_interval),
    ])
}

fn feed_schema(api_token: Option<&str>, station: Option<&str>, update_interval: u64) -> Schema {
    Schema::new(vec![
        text_field(CONF_API_TOKEN, api_token),
        text_field(CONF_STATION, station),
        interval_field(update_interval),
    ])
}

fn pick_station_schema(stations: &IndexMap<String, String>) -> Schema {
    Schema::new(vec![FormField::required(CONF_STATION, FieldType::Select)
        .with_options(stations.iter().map(|(id, name)| (id.as_str(), name.as_str())))])
}

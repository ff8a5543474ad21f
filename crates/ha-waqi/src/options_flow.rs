//! Options flow for the WAQI integration

use std::collections::HashMap;

use async_trait::async_trait;
use ha_data_entry_flow::{
    FieldType, FlowContext, FlowError, FlowHandler, FlowSource, FlowStep, FormField, Schema,
    StepOutcome, UserInput,
};
use serde_json::Value;
use tracing::debug;

use crate::config_flow::interval_field;
use crate::consts::{
    CONF_API_TOKEN, CONF_UPDATE_INTERVAL, DEFAULT_UPDATE_INTERVAL, DOMAIN, STEP_INIT,
};

/// The entry being edited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsSession {
    pub entry_id: String,
    /// Interval currently stored on the entry
    pub update_interval: u64,
}

/// Options flow handler: change the API token and update interval
#[derive(Debug, Default)]
pub struct WaqiOptionsFlow;

impl WaqiOptionsFlow {
    pub fn new() -> Self {
        Self
    }

    pub async fn async_step_init(
        &self,
        session: OptionsSession,
        user_input: Option<UserInput>,
    ) -> StepOutcome<OptionsSession> {
        if let Some(input) = user_input {
            debug!("New options for entry {}", session.entry_id);
            return StepOutcome::new(
                session,
                FlowStep::CreateEntry {
                    title: String::new(),
                    data: input.into_inner(),
                    options: HashMap::new(),
                    unique_id: None,
                },
            );
        }

        let schema = options_schema(session.update_interval);
        StepOutcome::new(session, FlowStep::show_form(STEP_INIT, schema))
    }
}

#[async_trait]
impl FlowHandler for WaqiOptionsFlow {
    type Session = OptionsSession;

    fn handler(&self) -> &str {
        DOMAIN
    }

    fn init_step(&self) -> &'static str {
        STEP_INIT
    }

    fn new_session(&self, ctx: &FlowContext<'_>) -> Result<OptionsSession, FlowError> {
        let FlowSource::Options { entry_id } = ctx.source else {
            return Err(FlowError::InvalidSource(ctx.source.as_str()));
        };

        let options = ctx
            .entries
            .entry_options(entry_id)
            .ok_or_else(|| FlowError::UnknownEntry(entry_id.clone()))?;

        Ok(OptionsSession {
            entry_id: entry_id.clone(),
            update_interval: options
                .get(CONF_UPDATE_INTERVAL)
                .and_then(Value::as_u64)
                .unwrap_or(DEFAULT_UPDATE_INTERVAL),
        })
    }

    async fn async_step(
        &self,
        session: OptionsSession,
        step_id: &str,
        user_input: Option<UserInput>,
        _ctx: &FlowContext<'_>,
    ) -> Result<StepOutcome<OptionsSession>, FlowError> {
        match step_id {
            STEP_INIT => Ok(self.async_step_init(session, user_input).await),
            _ => Err(FlowError::UnknownStep {
                handler: DOMAIN.to_string(),
                step_id: step_id.to_string(),
            }),
        }
    }
}

/// The token is never prefilled
fn options_schema(update_interval: u64) -> Schema {
    Schema::new(vec![
        FormField::required(CONF_API_TOKEN, FieldType::String),
        interval_field(update_interval),
    ])
}

//! Flow handler interface
//!
//! A handler implements the steps of one kind of flow. Per-flow state lives in
//! the handler's `Session` type, which the manager passes into every step and
//! stores again from the returned [`StepOutcome`].

use async_trait::async_trait;
use ha_config_entries::EntryLookup;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::FlowError;
use crate::schema::{Schema, UserInput};

/// Key for errors that are not tied to a single field
pub const BASE: &str = "base";

/// Form errors: field name (or [`BASE`]) -> translation key
pub type FlowErrors = HashMap<String, String>;

/// What a flow was started for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowSource {
    /// A new config entry, started by the user
    User,
    /// Editing the options of an existing entry
    Options { entry_id: String },
}

impl FlowSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowSource::User => "user",
            FlowSource::Options { .. } => "options",
        }
    }
}

/// Host services available to a step
pub struct FlowContext<'a> {
    pub source: &'a FlowSource,
    pub entries: &'a dyn EntryLookup,
}

/// Result of running a step
#[derive(Debug, Clone, PartialEq)]
pub enum FlowStep {
    /// Show a form and wait for the next submission
    Form {
        step_id: String,
        data_schema: Schema,
        errors: FlowErrors,
    },
    /// Finish the flow with a config entry (or an options update)
    CreateEntry {
        title: String,
        data: HashMap<String, Value>,
        options: HashMap<String, Value>,
        unique_id: Option<String>,
    },
    /// Finish the flow without creating anything
    Abort { reason: String },
}

impl FlowStep {
    pub fn show_form(step_id: impl Into<String>, data_schema: Schema) -> Self {
        FlowStep::Form {
            step_id: step_id.into(),
            data_schema,
            errors: FlowErrors::new(),
        }
    }

    pub fn show_form_with_errors(
        step_id: impl Into<String>,
        data_schema: Schema,
        errors: FlowErrors,
    ) -> Self {
        FlowStep::Form {
            step_id: step_id.into(),
            data_schema,
            errors,
        }
    }

    pub fn abort(reason: impl Into<String>) -> Self {
        FlowStep::Abort {
            reason: reason.into(),
        }
    }
}

/// A step result together with the session to keep for the next step
#[derive(Debug)]
pub struct StepOutcome<S> {
    pub session: S,
    pub step: FlowStep,
}

impl<S> StepOutcome<S> {
    pub fn new(session: S, step: FlowStep) -> Self {
        Self { session, step }
    }
}

/// Trait for handling data entry flows
#[async_trait]
pub trait FlowHandler: Send + Sync {
    /// Per-flow state
    type Session: Send + Sync;

    /// Integration domain
    fn handler(&self) -> &str;

    /// Step run when the flow starts
    fn init_step(&self) -> &'static str;

    /// Create the session for a new flow
    fn new_session(&self, ctx: &FlowContext<'_>) -> Result<Self::Session, FlowError>;

    /// Run a step. `user_input` is `None` when the step is entered without a
    /// submission and should show its form.
    async fn async_step(
        &self,
        session: Self::Session,
        step_id: &str,
        user_input: Option<UserInput>,
        ctx: &FlowContext<'_>,
    ) -> Result<StepOutcome<Self::Session>, FlowError>;
}

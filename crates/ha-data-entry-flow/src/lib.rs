//! Data entry flows
//!
//! A flow is a sequence of forms shown to the user. Each submission is
//! validated against the form's [`Schema`] and handed to a [`FlowHandler`]
//! step, which answers with another form, a new config entry, or an abort.
//! The [`FlowManager`] keeps in-progress flows and commits finished ones to
//! the config entry store.

pub mod error;
pub mod flow;
pub mod manager;
pub mod result;
pub mod schema;

pub use error::{FlowError, FlowManagerResult, SchemaError};
pub use flow::{FlowContext, FlowErrors, FlowHandler, FlowSource, FlowStep, StepOutcome, BASE};
pub use manager::FlowManager;
pub use result::{FlowResult, FlowResultType};
pub use schema::{FieldType, FormField, Schema, UserInput};

/// Abort reason used when an entry with the same unique_id exists
pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";

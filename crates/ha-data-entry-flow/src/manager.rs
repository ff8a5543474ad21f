//! Flow Manager
//!
//! Keeps in-progress flows for one handler, validates submissions against the
//! form last shown, and commits finished flows to the config entry store.

use std::collections::HashMap;
use std::sync::Arc;

use ha_config_entries::{ConfigEntries, ConfigEntriesError, ConfigEntry};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::error::{FlowError, FlowManagerResult};
use crate::flow::{FlowContext, FlowHandler, FlowSource, FlowStep, StepOutcome};
use crate::result::FlowResult;
use crate::schema::Schema;
use crate::ABORT_ALREADY_CONFIGURED;

/// Active flow state
struct ActiveFlow<S> {
    source: FlowSource,
    session: S,
    /// Step whose form is currently shown
    current_step: String,
    /// Schema the next submission is validated against
    data_schema: Schema,
}

/// Manages active flows of a single handler
pub struct FlowManager<H: FlowHandler> {
    handler: H,
    entries: Arc<ConfigEntries>,
    /// Active flows: flow_id -> flow state
    flows: RwLock<HashMap<String, ActiveFlow<H::Session>>>,
}

impl<H: FlowHandler> FlowManager<H> {
    pub fn new(handler: H, entries: Arc<ConfigEntries>) -> Self {
        Self {
            handler,
            entries,
            flows: RwLock::new(HashMap::new()),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Start a new flow and run its initial step
    pub async fn start_flow(&self, source: FlowSource) -> FlowManagerResult<FlowResult> {
        if let FlowSource::Options { entry_id } = &source {
            if self.entries.get(entry_id).is_none() {
                return Err(FlowError::UnknownEntry(entry_id.clone()));
            }
        }

        let flow_id = Ulid::new().to_string();
        info!(
            "Starting {} flow for {} [{}]",
            source.as_str(),
            self.handler.handler(),
            flow_id
        );

        let ctx = FlowContext {
            source: &source,
            entries: self.entries.as_ref(),
        };
        let session = self.handler.new_session(&ctx)?;
        let outcome = self
            .handler
            .async_step(session, self.handler.init_step(), None, &ctx)
            .await?;

        self.handle_outcome(flow_id, source, outcome).await
    }

    /// Continue a flow with user input
    ///
    /// Input that does not match the current form's schema is rejected and
    /// the flow stays where it was.
    pub async fn progress_flow(
        &self,
        flow_id: &str,
        user_input: Option<Value>,
    ) -> FlowManagerResult<FlowResult> {
        let flow = self
            .flows
            .write()
            .await
            .remove(flow_id)
            .ok_or_else(|| FlowError::UnknownFlow(flow_id.to_string()))?;

        let input = match user_input {
            Some(raw) => match flow.data_schema.validate(&raw) {
                Ok(input) => Some(input),
                Err(e) => {
                    warn!("Rejected input for flow {} step {}: {}", flow_id, flow.current_step, e);
                    self.flows.write().await.insert(flow_id.to_string(), flow);
                    return Err(e.into());
                }
            },
            None => None,
        };

        let ActiveFlow {
            source,
            session,
            current_step,
            ..
        } = flow;

        debug!("Calling step {} on flow {}", current_step, flow_id);
        let ctx = FlowContext {
            source: &source,
            entries: self.entries.as_ref(),
        };
        let outcome = self
            .handler
            .async_step(session, &current_step, input, &ctx)
            .await?;

        self.handle_outcome(flow_id.to_string(), source, outcome)
            .await
    }

    /// Abort an in-progress flow
    pub async fn abort_flow(&self, flow_id: &str) -> FlowManagerResult<()> {
        self.flows
            .write()
            .await
            .remove(flow_id)
            .map(|_| info!("Aborted flow {}", flow_id))
            .ok_or_else(|| FlowError::UnknownFlow(flow_id.to_string()))
    }

    /// Get list of active flows
    pub async fn list_flows(&self) -> Vec<Value> {
        self.flows
            .read()
            .await
            .iter()
            .map(|(flow_id, flow)| {
                json!({
                    "flow_id": flow_id,
                    "handler": self.handler.handler(),
                    "step_id": flow.current_step,
                    "context": { "source": flow.source.as_str() },
                })
            })
            .collect()
    }

    async fn handle_outcome(
        &self,
        flow_id: String,
        source: FlowSource,
        outcome: StepOutcome<H::Session>,
    ) -> FlowManagerResult<FlowResult> {
        let handler = self.handler.handler();

        match outcome.step {
            FlowStep::Form {
                step_id,
                data_schema,
                errors,
            } => {
                debug!("Flow {} showing form {} (errors: {:?})", flow_id, step_id, errors);
                let result = FlowResult::form(
                    &flow_id,
                    handler,
                    step_id.clone(),
                    data_schema.fields().to_vec(),
                    errors,
                );
                self.flows.write().await.insert(
                    flow_id,
                    ActiveFlow {
                        source,
                        session: outcome.session,
                        current_step: step_id,
                        data_schema,
                    },
                );
                Ok(result)
            }
            FlowStep::Abort { reason } => {
                info!("Flow {} for {} aborted: {}", flow_id, handler, reason);
                Ok(FlowResult::abort(&flow_id, handler, reason))
            }
            FlowStep::CreateEntry {
                title,
                data,
                options,
                unique_id,
            } => match source {
                FlowSource::User => {
                    let mut entry = ConfigEntry::new(handler, title.clone())
                        .with_data(data.clone())
                        .with_options(options.clone());
                    if let Some(unique_id) = unique_id {
                        entry = entry.with_unique_id(unique_id);
                    }

                    match self.entries.add(entry) {
                        Ok(entry) => Ok(FlowResult::create_entry(
                            &flow_id, handler, title, data, options,
                        )
                        .with_result(serde_json::to_value(&entry)?)),
                        Err(ConfigEntriesError::AlreadyExists { unique_id, .. }) => {
                            warn!(
                                "Flow {} finished for {} but {} is already configured",
                                flow_id, handler, unique_id
                            );
                            Ok(FlowResult::abort(&flow_id, handler, ABORT_ALREADY_CONFIGURED))
                        }
                        Err(e) => Err(e.into()),
                    }
                }
                FlowSource::Options { entry_id } => {
                    let entry = self.entries.set_options(&entry_id, data.clone())?;
                    info!("Updated options of {} entry {}", handler, entry_id);
                    Ok(
                        FlowResult::create_entry(&flow_id, handler, title, data, options)
                            .with_result(serde_json::to_value(&entry)?),
                    )
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowErrors;
    use crate::result::FlowResultType;
    use crate::schema::{FieldType, FormField, UserInput};
    use crate::SchemaError;
    use async_trait::async_trait;

    /// Counts how many forms were shown in the session
    struct NameFlow;

    #[async_trait]
    impl FlowHandler for NameFlow {
        type Session = u32;

        fn handler(&self) -> &str {
            "test"
        }

        fn init_step(&self) -> &'static str {
            "user"
        }

        fn new_session(&self, _ctx: &FlowContext<'_>) -> Result<u32, FlowError> {
            Ok(0)
        }

        async fn async_step(
            &self,
            shown: u32,
            step_id: &str,
            user_input: Option<UserInput>,
            ctx: &FlowContext<'_>,
        ) -> Result<StepOutcome<u32>, FlowError> {
            if step_id != "user" {
                return Err(FlowError::UnknownStep {
                    handler: "test".to_string(),
                    step_id: step_id.to_string(),
                });
            }

            let schema = Schema::new(vec![
                FormField::required("name", FieldType::String),
                FormField::optional("unique_id", FieldType::String),
            ]);

            let Some(input) = user_input else {
                return Ok(StepOutcome::new(shown + 1, FlowStep::show_form("user", schema)));
            };

            let name = input.get_str("name").unwrap_or_default().to_string();
            if name == "abort" {
                return Ok(StepOutcome::new(shown, FlowStep::abort("not_allowed")));
            }
            if name.is_empty() {
                let mut errors = FlowErrors::new();
                errors.insert("name".to_string(), "empty".to_string());
                return Ok(StepOutcome::new(
                    shown + 1,
                    FlowStep::show_form_with_errors("user", schema, errors),
                ));
            }

            let unique_id = input.get_str("unique_id").map(str::to_string);
            if let Some(ref unique_id) = unique_id {
                if ctx.entries.is_unique_id_configured("test", unique_id) {
                    return Ok(StepOutcome::new(shown, FlowStep::abort("already_configured")));
                }
            }

            let mut options = HashMap::new();
            options.insert("forms_shown".to_string(), json!(shown));
            Ok(StepOutcome::new(
                shown,
                FlowStep::CreateEntry {
                    title: name,
                    data: HashMap::new(),
                    options,
                    unique_id,
                },
            ))
        }
    }

    /// Options flow replacing the `interval` option
    struct IntervalOptionsFlow;

    #[async_trait]
    impl FlowHandler for IntervalOptionsFlow {
        type Session = i64;

        fn handler(&self) -> &str {
            "test"
        }

        fn init_step(&self) -> &'static str {
            "init"
        }

        fn new_session(&self, ctx: &FlowContext<'_>) -> Result<i64, FlowError> {
            let FlowSource::Options { entry_id } = ctx.source else {
                return Err(FlowError::InvalidSource(ctx.source.as_str()));
            };
            Ok(ctx
                .entries
                .entry_options(entry_id)
                .and_then(|options| options.get("interval").and_then(Value::as_i64))
                .unwrap_or(10))
        }

        async fn async_step(
            &self,
            interval: i64,
            _step_id: &str,
            user_input: Option<UserInput>,
            _ctx: &FlowContext<'_>,
        ) -> Result<StepOutcome<i64>, FlowError> {
            match user_input {
                None => Ok(StepOutcome::new(
                    interval,
                    FlowStep::show_form(
                        "init",
                        Schema::new(vec![FormField::optional("interval", FieldType::Integer)
                            .with_default(interval)]),
                    ),
                )),
                Some(input) => Ok(StepOutcome::new(
                    interval,
                    FlowStep::CreateEntry {
                        title: String::new(),
                        data: input.into_inner(),
                        options: HashMap::new(),
                        unique_id: None,
                    },
                )),
            }
        }
    }

    fn create_entries() -> Arc<ConfigEntries> {
        Arc::new(ConfigEntries::new())
    }

    #[tokio::test]
    async fn test_start_flow_shows_form() {
        let entries = create_entries();
        let manager = FlowManager::new(NameFlow, entries);

        let result = manager.start_flow(FlowSource::User).await.unwrap();

        assert_eq!(result.result_type, FlowResultType::Form);
        assert_eq!(result.step_id.as_deref(), Some("user"));
        assert_eq!(result.handler, "test");
        assert_eq!(result.data_schema.len(), 2);
        assert!(result.errors.is_none());

        let flows = manager.list_flows().await;
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0]["flow_id"], result.flow_id.as_str());
        assert_eq!(flows[0]["context"]["source"], "user");
    }

    #[tokio::test]
    async fn test_create_entry_commits_to_store() {
        let entries = create_entries();
        let manager = FlowManager::new(NameFlow, entries.clone());

        let started = manager.start_flow(FlowSource::User).await.unwrap();
        let result = manager
            .progress_flow(
                &started.flow_id,
                Some(json!({"name": "Kitchen", "unique_id": "k1"})),
            )
            .await
            .unwrap();

        assert_eq!(result.result_type, FlowResultType::CreateEntry);
        assert_eq!(result.title.as_deref(), Some("Kitchen"));

        let entry = entries.get_by_unique_id("test", "k1").unwrap();
        let committed = result.result.unwrap();
        assert_eq!(committed["entry_id"], entry.entry_id.as_str());
        assert_eq!(committed["unique_id"], "k1");
        assert_eq!(entry.title, "Kitchen");
        assert_eq!(entry.options["forms_shown"], 1);
        assert!(manager.list_flows().await.is_empty());
    }

    #[tokio::test]
    async fn test_session_carried_between_steps() {
        let entries = create_entries();
        let manager = FlowManager::new(NameFlow, entries.clone());

        let started = manager.start_flow(FlowSource::User).await.unwrap();
        let retry = manager
            .progress_flow(&started.flow_id, Some(json!({"name": ""})))
            .await
            .unwrap();
        assert_eq!(retry.errors.unwrap()["name"], "empty");

        manager
            .progress_flow(&started.flow_id, Some(json!({"name": "Hall", "unique_id": "h1"})))
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        let created = entries.get_by_unique_id("test", "h1").unwrap();
        assert_eq!(created.options["forms_shown"], 2);
    }

    #[tokio::test]
    async fn test_invalid_input_keeps_flow() {
        let entries = create_entries();
        let manager = FlowManager::new(NameFlow, entries.clone());

        let started = manager.start_flow(FlowSource::User).await.unwrap();
        let err = manager
            .progress_flow(&started.flow_id, Some(json!({"unique_id": "k1"})))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FlowError::InvalidInput(SchemaError::MissingField(ref field)) if field == "name"
        ));
        assert_eq!(manager.list_flows().await.len(), 1);
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_abort_step_removes_flow() {
        let entries = create_entries();
        let manager = FlowManager::new(NameFlow, entries.clone());

        let started = manager.start_flow(FlowSource::User).await.unwrap();
        let result = manager
            .progress_flow(&started.flow_id, Some(json!({"name": "abort"})))
            .await
            .unwrap();

        assert_eq!(result.result_type, FlowResultType::Abort);
        assert_eq!(result.reason.as_deref(), Some("not_allowed"));
        assert!(manager.list_flows().await.is_empty());
        assert!(entries.is_empty());

        let err = manager
            .progress_flow(&started.flow_id, Some(json!({"name": "again"})))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::UnknownFlow(_)));
    }

    #[tokio::test]
    async fn test_unique_id_taken_while_flow_open() {
        let entries = create_entries();
        let manager = FlowManager::new(NameFlow, entries.clone());

        let first = manager.start_flow(FlowSource::User).await.unwrap();
        let second = manager.start_flow(FlowSource::User).await.unwrap();

        manager
            .progress_flow(&first.flow_id, Some(json!({"name": "A", "unique_id": "same"})))
            .await
            .unwrap();
        let result = manager
            .progress_flow(&second.flow_id, Some(json!({"name": "B", "unique_id": "same"})))
            .await
            .unwrap();

        assert_eq!(result.result_type, FlowResultType::Abort);
        assert_eq!(result.reason.as_deref(), Some(ABORT_ALREADY_CONFIGURED));
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_abort_flow() {
        let entries = create_entries();
        let manager = FlowManager::new(NameFlow, entries);

        let started = manager.start_flow(FlowSource::User).await.unwrap();
        manager.abort_flow(&started.flow_id).await.unwrap();

        assert!(manager.list_flows().await.is_empty());
        assert!(matches!(
            manager.abort_flow(&started.flow_id).await,
            Err(FlowError::UnknownFlow(_))
        ));
    }

    #[tokio::test]
    async fn test_options_flow_updates_entry() {
        let entries = create_entries();
        let mut options = HashMap::new();
        options.insert("interval".to_string(), json!(30));
        let entry = entries
            .add(ConfigEntry::new("test", "Kitchen").with_options(options))
            .unwrap();

        let manager = FlowManager::new(IntervalOptionsFlow, entries.clone());
        let started = manager
            .start_flow(FlowSource::Options {
                entry_id: entry.entry_id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(started.data_schema[0].default, Some(json!(30)));

        let result = manager
            .progress_flow(&started.flow_id, Some(json!({"interval": 60})))
            .await
            .unwrap();

        assert_eq!(result.result_type, FlowResultType::CreateEntry);
        assert_eq!(result.title.as_deref(), Some(""));
        assert_eq!(result.result.unwrap()["options"]["interval"], 60);
        let updated = entries.get(&entry.entry_id).unwrap();
        assert_eq!(updated.options["interval"], 60);
        assert_eq!(updated.title, "Kitchen");
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_options_handler_rejects_user_source() {
        let entries = create_entries();
        let manager = FlowManager::new(IntervalOptionsFlow, entries);

        let err = manager.start_flow(FlowSource::User).await.unwrap_err();
        assert!(matches!(err, FlowError::InvalidSource("user")));
        assert!(manager.list_flows().await.is_empty());
    }

    #[tokio::test]
    async fn test_options_flow_unknown_entry() {
        let entries = create_entries();
        let manager = FlowManager::new(IntervalOptionsFlow, entries);

        let err = manager
            .start_flow(FlowSource::Options {
                entry_id: "missing".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::UnknownEntry(_)));
    }
}

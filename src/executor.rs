//! Post-function execution.

use crate::api::BambooApi;
use crate::connection::ConnectionRegistry;
use crate::descriptor::{DescriptorArgs, PostFunctionArgs};
use crate::fields::FieldCatalog;
use crate::template::{Substitutor, FIELD_VALUE_UNRESOLVED};
use std::collections::BTreeMap;

/// Why an execution did nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoConnectionSelected,
    NoPlanSelected { connection: String },
    UnknownConnection { connection: String },
}

/// What an execution did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do; not an error
    Skipped(SkipReason),
    /// The build was queued with these variable values
    Queued {
        plan_key: String,
        variables: BTreeMap<String, String>,
    },
    /// The build could not be queued; the failure was logged
    Failed { plan_key: String, error: String },
}

/// Result of one post-function execution.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub outcome: Outcome,

    /// Total execution time in milliseconds
    pub total_ms: f64,
}

impl ExecutionResult {
    pub fn is_queued(&self) -> bool {
        matches!(self.outcome, Outcome::Queued { .. })
    }
}

/// Queues a plan build when a workflow transition completes.
///
/// Execution never fails: a missing selection is skipped and every remote or
/// decoding failure is logged, so the transition itself always succeeds.
pub struct PostFunction<A, R, C> {
    api: A,
    connections: R,
    catalog: C,
    unresolved: String,
}

impl<A, R, C> PostFunction<A, R, C>
where
    A: BambooApi,
    R: ConnectionRegistry,
    C: FieldCatalog,
{
    pub fn new(api: A, connections: R, catalog: C) -> Self {
        Self {
            api,
            connections,
            catalog,
            unresolved: FIELD_VALUE_UNRESOLVED.to_string(),
        }
    }

    /// Localized text substituted for unresolved fields.
    pub fn unresolved_text(mut self, text: &str) -> Self {
        self.unresolved = text.to_string();
        self
    }

    /// Run against stored descriptor args and the transitioned record.
    pub fn execute(&self, args: &DescriptorArgs, record: &C::Record) -> ExecutionResult {
        let start = std::time::Instant::now();
        let outcome = self.run(&PostFunctionArgs::from_args(args), record);
        let total_ms = start.elapsed().as_secs_f64() * 1000.0;

        tracing::info!(outcome = ?outcome, total_ms, "Post-function completed");

        ExecutionResult { outcome, total_ms }
    }

    fn run(&self, args: &PostFunctionArgs, record: &C::Record) -> Outcome {
        let Some(connection_id) = args.connection.as_deref() else {
            tracing::error!("No connection selected, not running any plan");
            return Outcome::Skipped(SkipReason::NoConnectionSelected);
        };
        let Some(plan_key) = args.plan.as_deref() else {
            tracing::error!(
                connection = connection_id,
                "No plan selected for connection, not running any plan"
            );
            return Outcome::Skipped(SkipReason::NoPlanSelected {
                connection: connection_id.to_string(),
            });
        };

        let templates = match args.bindings() {
            Ok(templates) => templates,
            Err(e) => {
                tracing::error!(plan = plan_key, error = %e, "Could not decode variable bindings");
                return Outcome::Failed {
                    plan_key: plan_key.to_string(),
                    error: e.to_string(),
                };
            }
        };

        let substitutor =
            Substitutor::new(&self.catalog, record).unresolved_text(&self.unresolved);
        let variables: BTreeMap<String, String> = templates
            .iter()
            .map(|(variable, template)| (variable.clone(), substitutor.substitute(template)))
            .collect();

        let Some(connection) = self.connections.connection(connection_id) else {
            tracing::error!(
                connection = connection_id,
                "No connection found for id, not running any plan"
            );
            return Outcome::Skipped(SkipReason::UnknownConnection {
                connection: connection_id.to_string(),
            });
        };

        match self.api.queue_build(&connection, plan_key, &variables) {
            Ok(()) => Outcome::Queued {
                plan_key: plan_key.to_string(),
                variables,
            },
            Err(e) => {
                tracing::error!(plan = plan_key, error = %e, "Error running plan");
                Outcome::Failed {
                    plan_key: plan_key.to_string(),
                    error: e.to_string(),
                }
            }
        }
    }
}

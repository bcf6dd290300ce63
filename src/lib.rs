//! # bamboo-plan-runner
//!
//! Workflow post-function that queues a Bamboo plan build, filling the
//! plan's variables from fields of the transitioned issue.
//!
//! Plans and their declared variables are discovered over the Bamboo REST
//! API. Variable bindings are stored as flat descriptor strings and expanded
//! with `$(field)` placeholders when the post-function runs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bamboo_plan_runner::{
//!     encode_args, Connection, Connections, FieldDef, Issue, MemoryCatalog, Plan,
//!     PostFunction, RestApi, VariableBinding,
//! };
//! use std::collections::BTreeMap;
//!
//! let connection = Connection::new("bamboo-main", "https://bamboo.example.com");
//! let plans = bamboo_plan_runner::list_plans(&connection)?;
//! let plan: &Plan = &plans[0];
//!
//! let mut bindings = BTreeMap::new();
//! bindings.insert(plan.variables[0].clone(), VariableBinding::field("assignee"));
//! let args = encode_args(&connection.id, plan, &bindings)?;
//!
//! let catalog = MemoryCatalog::new().with_field(FieldDef::system("assignee", "Assignee"));
//! let post_function = PostFunction::new(RestApi, Connections::new().with(connection), catalog);
//! let result = post_function.execute(&args, &Issue::new("PROJ-1").with("assignee", "alice"));
//! println!("{:?}", result.outcome);
//! # Ok::<(), bamboo_plan_runner::Error>(())
//! ```
//!
//! ## YAML Configuration
//!
//! ```yaml
//! connections:
//!   - id: bamboo-main
//!     base_url: https://bamboo.example.com
//!     auth: { type: token, token: "..." }
//! post_functions:
//!   - name: build-on-resolve
//!     connection: bamboo-main
//!     plan: PROJ-PLAN
//!     variables:
//!       RELEASE: { type: field, field: fixVersions }
//!       NOTE: { type: custom_value, value: "Triggered by $(assignee)" }
//! ```

mod api;
mod catalog;
mod client;
pub mod codec;
pub mod config;
mod connection;
pub mod descriptor;
mod error;
mod executor;
pub mod fields;
mod plan;
mod queue;
pub mod template;

pub use api::{BambooApi, RestApi};
pub use catalog::{list_plans, PlanCache};
pub use connection::{Auth, Connection, ConnectionRegistry, Connections};
pub use descriptor::{encode_args, encode_args_cached, DescriptorArgs, PostFunctionArgs, VariableBinding};
pub use error::{DecodeError, Error, Result};
pub use executor::{ExecutionResult, Outcome, PostFunction, SkipReason};
pub use fields::{resolve, FieldCatalog, FieldDef, FieldKind, FieldValue, Issue, MemoryCatalog, Resolution};
pub use plan::{Plan, PlanBuilder};
pub use queue::{queue_build, VARIABLE_PREFIX};
pub use template::{Substitutor, FIELD_VALUE_UNRESOLVED};

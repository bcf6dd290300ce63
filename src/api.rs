//! Seam between the post-function and the remote instance.

use crate::connection::Connection;
use crate::error::Result;
use crate::plan::Plan;
use std::collections::BTreeMap;

/// Remote operations the post-function depends on.
pub trait BambooApi {
    /// All plans with their declared variables.
    fn plans(&self, connection: &Connection) -> Result<Vec<Plan>>;

    /// Queue a build of `plan_key` with resolved variable values.
    fn queue_build(
        &self,
        connection: &Connection,
        plan_key: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<()>;
}

/// [`BambooApi`] over HTTP.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestApi;

impl BambooApi for RestApi {
    fn plans(&self, connection: &Connection) -> Result<Vec<Plan>> {
        crate::catalog::list_plans(connection)
    }

    fn queue_build(
        &self,
        connection: &Connection,
        plan_key: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<()> {
        crate::queue::queue_build(connection, plan_key, variables)
    }
}

//! Queueing builds for a plan.

use crate::catalog::REST_API_BASE;
use crate::client::RestClient;
use crate::connection::Connection;
use crate::error::Result;
use std::collections::BTreeMap;

/// Request parameter namespace for build variables.
pub const VARIABLE_PREFIX: &str = "bamboo.variable.";

/// Queue a build of `plan_key` with the given variable values.
///
/// An empty map queues the plan with its default variable values.
pub fn queue_build(
    connection: &Connection,
    plan_key: &str,
    variables: &BTreeMap<String, String>,
) -> Result<()> {
    let client = RestClient::new(connection)?;
    let url = connection.url(&format!("{REST_API_BASE}/queue/{plan_key}"));

    let params = variable_params(variables);
    let form: Vec<(&str, &str)> = params
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();

    client.post_form(&url, &form, &url)?;

    tracing::info!(
        connection = %connection.id,
        plan = plan_key,
        variables = variables.len(),
        "Queued build"
    );
    Ok(())
}

fn variable_params(variables: &BTreeMap<String, String>) -> Vec<(String, String)> {
    variables
        .iter()
        .map(|(name, value)| (format!("{VARIABLE_PREFIX}{name}"), value.clone()))
        .collect()
}

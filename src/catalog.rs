//! Plan discovery over the Bamboo REST API.

use crate::api::BambooApi;
use crate::client::RestClient;
use crate::connection::Connection;
use crate::error::Result;
use crate::plan::Plan;
use serde::Deserialize;
use std::collections::HashMap;

pub(crate) const REST_API_BASE: &str = "rest/api/latest";
const EXPAND: &str = "expand";
const VARIABLE_CONTEXT: &str = "variableContext";

#[derive(Debug, Deserialize)]
struct PlanListResponse {
    plans: PlanList,
}

#[derive(Debug, Deserialize)]
struct PlanList {
    plan: Vec<PlanSummary>,
}

#[derive(Debug, Deserialize)]
struct PlanSummary {
    link: Link,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanDetail {
    key: String,
    short_name: String,
    enabled: bool,
    #[serde(default)]
    description: Option<String>,
    variable_context: VariableContext,
}

#[derive(Debug, Deserialize)]
struct VariableContext {
    variable: Vec<VariableDetail>,
}

#[derive(Debug, Deserialize)]
struct VariableDetail {
    key: String,
}

/// List every plan on `connection` together with its declared variables.
///
/// Plan details are fetched one after another. Any failed request fails the
/// whole listing.
pub fn list_plans(connection: &Connection) -> Result<Vec<Plan>> {
    let client = RestClient::new(connection)?;
    let mut plans = Vec::new();

    for link in plan_links(&client)? {
        plans.push(plan_detail(&client, &link)?);
    }

    tracing::info!(connection = %connection.id, plans = plans.len(), "Fetched plans");
    Ok(plans)
}

fn plan_links(client: &RestClient<'_>) -> Result<Vec<String>> {
    let url = client.connection().url(&format!("{REST_API_BASE}/plan"));
    let response: PlanListResponse = client.get_json(&url, &[], &url)?;
    Ok(response
        .plans
        .plan
        .into_iter()
        .map(|summary| summary.link.href)
        .collect())
}

fn plan_detail(client: &RestClient<'_>, link: &str) -> Result<Plan> {
    let endpoint = format!("{link}?{EXPAND}={VARIABLE_CONTEXT}");
    let detail: PlanDetail = client.get_json(link, &[(EXPAND, VARIABLE_CONTEXT)], &endpoint)?;

    Ok(Plan::builder(&detail.key)
        .name(&detail.short_name)
        .description(detail.description.as_deref().unwrap_or_default())
        .link(link)
        .enabled(detail.enabled)
        .variables(detail.variable_context.variable.into_iter().map(|v| v.key))
        .build())
}

/// Plans fetched per connection, kept for the span of one logical request.
///
/// Lets a later step (saving a configuration, queueing a build) re-validate a
/// selection against the same data the user picked from.
#[derive(Debug, Default)]
pub struct PlanCache {
    by_connection: HashMap<String, Vec<Plan>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached plans for `connection`, fetching them on first use.
    pub fn plans<A: BambooApi + ?Sized>(
        &mut self,
        api: &A,
        connection: &Connection,
    ) -> Result<&[Plan]> {
        if !self.by_connection.contains_key(&connection.id) {
            let plans = api.plans(connection)?;
            self.by_connection.insert(connection.id.clone(), plans);
        } else {
            tracing::debug!(connection = %connection.id, "Plan cache hit");
        }
        Ok(self
            .by_connection
            .get(&connection.id)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Store plans fetched elsewhere.
    pub fn insert(&mut self, connection_id: &str, plans: Vec<Plan>) {
        self.by_connection.insert(connection_id.to_string(), plans);
    }

    /// Cached plan with `plan_key` on `connection_id`.
    pub fn find(&self, connection_id: &str, plan_key: &str) -> Option<&Plan> {
        self.by_connection
            .get(connection_id)?
            .iter()
            .find(|plan| plan.key == plan_key)
    }

    /// Drop the cached plans for one connection.
    pub fn invalidate(&mut self, connection_id: &str) {
        self.by_connection.remove(connection_id);
    }

    pub fn clear(&mut self) {
        self.by_connection.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::Cell;
    use std::collections::BTreeMap;

    struct CountingApi {
        calls: Cell<usize>,
    }

    impl BambooApi for CountingApi {
        fn plans(&self, _connection: &Connection) -> Result<Vec<Plan>> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec![Plan::builder("PROJ-PLAN").variable("V1").build()])
        }

        fn queue_build(
            &self,
            connection: &Connection,
            _plan_key: &str,
            _variables: &BTreeMap<String, String>,
        ) -> Result<()> {
            Err(Error::AuthRequired {
                connection: connection.id.clone(),
            })
        }
    }

    #[test]
    fn test_cache_fetches_once_per_connection() {
        let api = CountingApi { calls: Cell::new(0) };
        let conn = Connection::new("main", "http://bamboo");
        let mut cache = PlanCache::new();

        assert_eq!(cache.plans(&api, &conn).unwrap().len(), 1);
        assert_eq!(cache.plans(&api, &conn).unwrap().len(), 1);
        assert_eq!(api.calls.get(), 1);

        assert!(cache.find("main", "PROJ-PLAN").is_some());
        assert!(cache.find("main", "PROJ-OTHER").is_none());
        assert!(cache.find("other", "PROJ-PLAN").is_none());

        cache.invalidate("main");
        cache.plans(&api, &conn).unwrap();
        assert_eq!(api.calls.get(), 2);
    }

    #[test]
    fn test_plan_detail_shape() {
        let detail: PlanDetail = serde_json::from_str(
            r#"{"key":"PLAYG-VAR","shortName":"variable-test","enabled":true,
                "variableContext":{"size":2,"variable":[{"key":"VARIABLE_TWO"},{"key":"VARIABLE_ONE"}]}}"#,
        )
        .unwrap();
        assert_eq!(detail.key, "PLAYG-VAR");
        assert_eq!(detail.description, None);
        assert_eq!(detail.variable_context.variable.len(), 2);
    }
}

//! Build plan definition and builder.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A remotely executable build plan and the variables it declares.
///
/// Plans are identified by their key; two plans with the same key compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Plan key (e.g., "PROJ-PLAN")
    pub key: String,

    /// Short display name
    pub name: String,

    /// Free-form description, empty when the remote has none
    #[serde(default)]
    pub description: String,

    /// Canonical link to the plan resource
    pub link: String,

    /// Whether the plan can currently be built
    pub enabled: bool,

    /// Declared variable names, in the order the remote lists them
    #[serde(default)]
    pub variables: Vec<String>,
}

impl Plan {
    /// Start building a plan with the given key.
    pub fn builder(key: &str) -> PlanBuilder {
        PlanBuilder::new(key)
    }

    /// Whether the plan declares a variable with this name.
    pub fn declares(&self, variable: &str) -> bool {
        self.variables.iter().any(|v| v == variable)
    }
}

impl PartialEq for Plan {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Plan {}

impl Hash for Plan {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Builder for plans.
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    plan: Plan,
}

impl PlanBuilder {
    /// Create a new plan builder.
    pub fn new(key: &str) -> Self {
        Self {
            plan: Plan {
                key: key.to_string(),
                name: String::new(),
                description: String::new(),
                link: String::new(),
                enabled: false,
                variables: Vec::new(),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.plan.name = name.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.plan.description = description.to_string();
        self
    }

    pub fn link(mut self, link: &str) -> Self {
        self.plan.link = link.to_string();
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.plan.enabled = enabled;
        self
    }

    /// Add a declared variable.
    pub fn variable(mut self, name: &str) -> Self {
        self.plan.variables.push(name.to_string());
        self
    }

    /// Replace the declared variables.
    pub fn variables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plan.variables = names.into_iter().map(Into::into).collect();
        self
    }

    /// Build the plan.
    pub fn build(self) -> Plan {
        self.plan
    }
}

impl From<PlanBuilder> for Plan {
    fn from(builder: PlanBuilder) -> Self {
        builder.build()
    }
}

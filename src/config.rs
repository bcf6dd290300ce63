//! YAML configuration of connections and post-functions.

use crate::connection::{Connection, Connections};
use crate::descriptor::{self, DescriptorArgs, VariableBinding};
use crate::plan::Plan;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connections: Vec<Connection>,

    #[serde(default)]
    pub post_functions: Vec<PostFunctionConfig>,
}

/// A configured post-function: which plan to queue and how to fill its variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFunctionConfig {
    pub name: String,

    /// Connection id
    pub connection: String,

    /// Plan key
    pub plan: String,

    #[serde(default)]
    pub variables: BTreeMap<String, VariableBinding>,
}

impl PostFunctionConfig {
    /// Descriptor args for this post-function, validated against `plan`.
    pub fn descriptor_args(&self, plan: &Plan) -> crate::Result<DescriptorArgs> {
        descriptor::encode_args(&self.connection, plan, &self.variables)
    }
}

impl Config {
    /// Connection registry for execution.
    pub fn registry(&self) -> Connections {
        self.connections.iter().cloned().collect()
    }

    /// Post-function by name.
    pub fn post_function(&self, name: &str) -> Option<&PostFunctionConfig> {
        self.post_functions.iter().find(|pf| pf.name == name)
    }
}

/// Parse configuration from a YAML string.
///
/// # Example
///
/// ```rust
/// use bamboo_plan_runner::config::parse_yaml;
///
/// let yaml = r#"
/// connections:
///   - id: bamboo-main
///     base_url: https://bamboo.example.com
///     auth: { type: token, token: abc }
/// post_functions:
///   - name: build-on-resolve
///     connection: bamboo-main
///     plan: PROJ-PLAN
///     variables:
///       RELEASE: { type: field, field: fixVersions }
/// "#;
///
/// let config = parse_yaml(yaml).unwrap();
/// assert_eq!(config.connections.len(), 1);
/// assert_eq!(config.post_functions[0].plan, "PROJ-PLAN");
/// ```
pub fn parse_yaml(yaml: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(yaml).context("Failed to parse configuration YAML")?;

    validate(&config)?;

    Ok(config)
}

/// Load and parse configuration from a YAML file.
pub fn load_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

    parse_yaml(&content)
        .with_context(|| format!("Failed to parse configuration file: {}", path.display()))
}

fn validate(config: &Config) -> Result<()> {
    let mut ids = HashSet::new();
    for (i, conn) in config.connections.iter().enumerate() {
        if conn.id.trim().is_empty() {
            anyhow::bail!("Connection {} has empty id", i);
        }
        if !ids.insert(conn.id.as_str()) {
            anyhow::bail!("Duplicate connection id '{}'", conn.id);
        }
        if !(conn.base_url.starts_with("http://") || conn.base_url.starts_with("https://")) {
            anyhow::bail!(
                "Connection '{}' base_url must be an absolute http(s) URL",
                conn.id
            );
        }
        if conn.timeout_secs == 0 {
            anyhow::bail!("Connection '{}' timeout_secs must be positive", conn.id);
        }
    }

    for (i, pf) in config.post_functions.iter().enumerate() {
        if pf.name.is_empty() {
            anyhow::bail!("Post-function {} has empty name", i);
        }
        if !ids.contains(pf.connection.as_str()) {
            anyhow::bail!(
                "Post-function '{}' references unknown connection '{}'",
                pf.name,
                pf.connection
            );
        }
        if pf.plan.trim().is_empty() {
            anyhow::bail!("Post-function '{}' has empty plan key", pf.name);
        }
    }

    Ok(())
}

//! Connections to remote Bamboo instances.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How requests to a connection are authenticated.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Auth {
    /// No credentials sent
    #[default]
    Anonymous,
    /// HTTP Basic credentials
    Basic { username: String, password: String },
    /// Bearer token (personal access token)
    Token { token: String },
    /// Credentials still have to be set up by an operator
    Interactive,
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Anonymous => f.write_str("Anonymous"),
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Auth::Token { .. } => f.debug_struct("Token").field("token", &"***").finish(),
            Auth::Interactive => f.write_str("Interactive"),
        }
    }
}

/// An authenticated link to a remote CI instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Stable identifier referenced by post-function arguments
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Base URL of the instance, including any context path
    pub base_url: String,

    #[serde(default)]
    pub auth: Auth,

    /// Transport timeout applied to every request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Connection {
    pub fn new(id: &str, base_url: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            base_url: base_url.to_string(),
            auth: Auth::Anonymous,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Absolute URL for a path below the base URL.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Looks up connections by id at execution time.
pub trait ConnectionRegistry {
    fn connection(&self, id: &str) -> Option<Connection>;
}

/// Registry backed by a map, as loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct Connections {
    by_id: BTreeMap<String, Connection>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, connection: Connection) {
        self.by_id.insert(connection.id.clone(), connection);
    }

    pub fn with(mut self, connection: Connection) -> Self {
        self.insert(connection);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl FromIterator<Connection> for Connections {
    fn from_iter<I: IntoIterator<Item = Connection>>(iter: I) -> Self {
        let mut connections = Connections::new();
        for connection in iter {
            connections.insert(connection);
        }
        connections
    }
}

impl ConnectionRegistry for Connections {
    fn connection(&self, id: &str) -> Option<Connection> {
        self.by_id.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_context_path() {
        let conn = Connection::new("main", "https://ci.example.com/bamboo/");
        assert_eq!(
            conn.url("/rest/api/latest/plan"),
            "https://ci.example.com/bamboo/rest/api/latest/plan"
        );
    }

    #[test]
    fn test_debug_hides_secrets() {
        let auth = Auth::Basic {
            username: "jira".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{:?}", Connection::new("main", "http://x").with_auth(auth));
        assert!(rendered.contains("jira"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_registry_lookup() {
        let registry: Connections = vec![
            Connection::new("a", "http://a"),
            Connection::new("b", "http://b"),
        ]
        .into_iter()
        .collect();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.connection("b").map(|c| c.base_url), Some("http://b".to_string()));
        assert!(registry.connection("c").is_none());
    }
}

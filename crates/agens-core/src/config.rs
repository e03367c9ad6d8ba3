//! Connection and session configuration.
//!
//! Values are layered: defaults, then an optional TOML file, then
//! environment variables (`AGENS_*`, falling back to the libpq `PG*` names).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AgensError, AgensResult};

/// Configuration for connecting to an AgensGraph server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub dbname: String,
    pub application_name: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        let user = current_user();
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            dbname: user.clone(),
            user,
            password: None,
            application_name: Some("agens".to_string()),
        }
    }
}

/// Name of the user running the process.
pub fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "postgres".to_string())
}

fn env_override(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .or_else(|_| std::env::var(fallback))
        .ok()
        .filter(|v| !v.is_empty())
}

impl ConnectionConfig {
    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> AgensResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load a configuration file.
    pub fn from_file(path: &Path) -> AgensResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(mut self) -> AgensResult<Self> {
        if let Some(host) = env_override("AGENS_HOST", "PGHOST") {
            self.host = host;
        }
        if let Some(port) = env_override("AGENS_PORT", "PGPORT") {
            self.port = port
                .parse()
                .map_err(|_| AgensError::Config(format!("invalid port '{}'", port)))?;
        }
        if let Some(user) = env_override("AGENS_USER", "PGUSER") {
            self.user = user;
        }
        if let Some(password) = env_override("AGENS_PASSWORD", "PGPASSWORD") {
            self.password = Some(password);
        }
        if let Some(dbname) = env_override("AGENS_DB", "PGDATABASE") {
            self.dbname = dbname;
        }
        Ok(self)
    }

    /// Render a libpq key/value connection string.
    pub fn to_conninfo(&self) -> String {
        let mut parts = vec![
            format!("host={}", conninfo_value(&self.host)),
            format!("port={}", self.port),
            format!("user={}", conninfo_value(&self.user)),
            format!("dbname={}", conninfo_value(&self.dbname)),
        ];
        if let Some(password) = &self.password {
            parts.push(format!("password={}", conninfo_value(password)));
        }
        if let Some(app) = &self.application_name {
            parts.push(format!("application_name={}", conninfo_value(app)));
        }
        parts.join(" ")
    }
}

/// Quote a conninfo value when it is empty or contains spaces, quotes or backslashes.
fn conninfo_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

/// Parameters of a graph session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphOptions {
    /// Name of the graph; also used as `graph_path`.
    pub name: String,
    /// Owner role of a newly created graph. Defaults to the connecting user.
    pub authorization: Option<String>,
    /// Drop an existing graph of the same name before opening.
    #[serde(default)]
    pub replace: bool,
    /// Commands kept in the cursor history; `None` keeps all, `Some(0)` none.
    #[serde(default = "default_history_limit")]
    pub history_limit: Option<usize>,
}

/// History entries a cursor keeps unless configured otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

fn default_history_limit() -> Option<usize> {
    Some(DEFAULT_HISTORY_LIMIT)
}

impl GraphOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            authorization: None,
            replace: false,
            history_limit: default_history_limit(),
        }
    }

    pub fn authorization(mut self, role: impl Into<String>) -> Self {
        self.authorization = Some(role.into());
        self
    }

    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }
}

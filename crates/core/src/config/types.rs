use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("supportq.db")
}

/// Which store the queue controller talks to.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// The SQLite store served by this process.
    #[default]
    Local,
    /// A ticket service reached over HTTP.
    Remote,
}

/// Ticket store configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Insert the demo tickets into an empty local store on startup.
    #[serde(default)]
    pub seed_demo: bool,
    /// Latency and failure injection for the local store (None = off).
    #[serde(default)]
    pub simulation: Option<SimulationConfig>,
    /// Remote ticket service (required when backend = "remote").
    #[serde(default)]
    pub remote: Option<RemoteStoreConfig>,
}

/// Latency and failure injection settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SimulationConfig {
    /// Probability (0.0 - 1.0) that an assign call fails transiently.
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            failure_rate: default_failure_rate(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_failure_rate() -> f64 {
    0.1
}

fn default_min_delay_ms() -> u64 {
    300
}

fn default_max_delay_ms() -> u64 {
    800
}

/// Remote ticket service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteStoreConfig {
    /// API base URL (e.g., "http://tickets.internal:8080/api/v1")
    pub url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Agent identity used for queue actions that don't name one.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    #[serde(default = "default_agent_id")]
    pub id: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: default_agent_id(),
        }
    }
}

fn default_agent_id() -> String {
    "agent-1".to_string()
}

/// Sanitized config for API responses
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub store: SanitizedStoreConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStoreConfig {
    pub backend: String,
    pub seed_demo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationConfig>,
    /// Remote host only; any userinfo or query in the URL is dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

fn redact_url(url: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, url),
    };
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    // Userinfo can only appear in the authority, before the first '/'.
    let (authority, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    let authority = match authority.rsplit_once('@') {
        Some((_, host)) => host,
        None => authority,
    };
    let rest = format!("{}{}", authority, path);
    match scheme {
        Some(scheme) => format!("{}://{}", scheme, rest),
        None => rest,
    }
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            store: SanitizedStoreConfig {
                backend: match config.store.backend {
                    StoreBackend::Local => "local".to_string(),
                    StoreBackend::Remote => "remote".to_string(),
                },
                seed_demo: config.store.seed_demo,
                simulation: config.store.simulation.clone(),
                remote_url: config.store.remote.as_ref().map(|r| redact_url(&r.url)),
            },
            agent: config.agent.clone(),
        }
    }
}

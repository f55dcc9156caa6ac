use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Per-attempt HTTP timeout for every outbound request.
    pub request_timeout_secs: u64,
    /// Redirect cap for auto-following clients (bridges, place lookups).
    pub bridge_max_redirects: usize,
    /// Hop budget for the manual redirect follower.
    pub manual_max_hops: usize,
    pub accept_language: String,
    /// Hosts classified as short links in addition to the built-in list.
    pub extra_short_hosts: Vec<String>,
    pub browser_enabled: bool,
    pub browser_executable: Option<PathBuf>,
    pub browser_nav_timeout_ms: u64,
    pub browser_idle_timeout_ms: u64,
    /// Upper bound for one whole `expand_and_parse` call made by the server.
    pub expand_deadline_secs: u64,
}

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
    /// Workspace opened before the first request is read.
    pub workspace: Option<PathBuf>,
    /// Upper bound for `loads.wait` when the request gives none.
    pub load_timeout: Duration,
    /// Load every page from its seed data at startup.
    pub autoload_seed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            workspace: None,
            load_timeout: Duration::from_millis(5_000),
            autoload_seed: false,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_filter: env_string("ERPD_LOG").unwrap_or(defaults.log_filter),
            workspace: env_string("ERPD_WORKSPACE").map(PathBuf::from),
            load_timeout: env_duration_ms(
                "ERPD_LOAD_TIMEOUT_MS",
                defaults.load_timeout.as_millis() as u64,
            ),
            autoload_seed: env_bool("ERPD_AUTOLOAD_SEED", defaults.autoload_seed),
        }
    }
}

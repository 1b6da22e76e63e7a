use std::time::Duration;

const DEFAULT_DB: &str = "episodic.db";
const DEFAULT_BIND: &str = "0.0.0.0:8096";
const DEFAULT_APPLY_DELAY_MS: u64 = 100;

/// Startup configuration, read once from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: String,
    pub bind_addr: String,
    /// Pause between consecutive catalog writes during Apply.
    pub apply_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB.to_string(),
            bind_addr: DEFAULT_BIND.to_string(),
            apply_delay: Duration::from_millis(DEFAULT_APPLY_DELAY_MS),
        }
    }
}

impl ServerConfig {
    /// `EPISODIC_DB`, `EPISODIC_BIND`, `EPISODIC_APPLY_DELAY_MS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            db_path: non_empty("EPISODIC_DB").unwrap_or(defaults.db_path),
            bind_addr: non_empty("EPISODIC_BIND").unwrap_or(defaults.bind_addr),
            apply_delay: non_empty("EPISODIC_APPLY_DELAY_MS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.apply_delay),
        }
    }
}

use std::path::PathBuf;

const DEFAULT_STORE_PATH: &str = "./mastery-store.json";

/// Runtime settings for the report binary, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_path: PathBuf,
    pub records_path: Option<PathBuf>,
    pub sessions_path: Option<PathBuf>,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        let store_path = env_path("MASTERY_CONFIG_PATH")
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            store_path,
            records_path: env_path("MASTERY_RECORDS_PATH"),
            sessions_path: env_path("MASTERY_SESSIONS_PATH"),
            log_level,
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

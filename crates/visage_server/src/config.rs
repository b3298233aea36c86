//! Server configuration.
//!
//! Everything comes from the environment (with `.env` support in the binary)
//! so the gateway can run unconfigured in development and fully pinned in
//! deployment.

use std::path::PathBuf;
use std::time::Duration;

/// Name of the session cookie issued on login.
pub const SESSION_COOKIE: &str = "visage_session";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,
    /// Path of the SQLite gateway database.
    pub database_path: PathBuf,
    /// Directory for staged probes and materialized reference images.
    pub media_dir: PathBuf,
    /// External face comparator command.
    pub comparator_command: PathBuf,
    /// Detection backend passed to the comparator.
    pub detector_backend: String,
    /// Upper bound on a single comparator invocation.
    pub verify_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8088".to_string(),
            database_path: PathBuf::from("data/gateway.db"),
            media_dir: PathBuf::from("data/media"),
            comparator_command: PathBuf::from("deepface-verify"),
            detector_backend: "retinaface".to_string(),
            verify_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Build a config from `VISAGE_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env_or("VISAGE_BIND_ADDR", defaults.bind_addr),
            database_path: env_or("VISAGE_DATABASE_PATH", defaults.database_path),
            media_dir: env_or("VISAGE_MEDIA_DIR", defaults.media_dir),
            comparator_command: env_or("VISAGE_COMPARATOR", defaults.comparator_command),
            detector_backend: env_or("VISAGE_DETECTOR_BACKEND", defaults.detector_backend),
            verify_timeout: std::env::var("VISAGE_VERIFY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.verify_timeout),
        }
    }
}

fn env_or<T: From<String>>(key: &str, default: T) -> T {
    std::env::var(key).map(T::from).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert_eq!(config.detector_backend, "retinaface");
        assert_eq!(config.verify_timeout, Duration::from_secs(30));
        assert!(config.media_dir.ends_with("media"));
    }
}

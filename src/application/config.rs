use anyhow::{Result, bail};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

/// User id used when `ALLOW_DEFAULT_USER` is set and nobody was named.
pub const DEFAULT_USER: &str = "default_user";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub user_id: Option<String>,
    pub allow_default_user: bool,
    pub theme: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup, `std::env` in production.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("CLOUDHABIT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_local_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("cloudhabit")
            });

        let db_path = lookup("CLOUDHABIT_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("habits.db"));

        let user_id = lookup("CLOUDHABIT_USER").filter(|user| !user.trim().is_empty());

        let allow_default_user = lookup("ALLOW_DEFAULT_USER")
            .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let theme = lookup("CLOUDHABIT_THEME").unwrap_or_else(|| "dark".to_string());
        let log_level = lookup("CLOUDHABIT_LOG").unwrap_or_else(|| "warn".to_string());

        Self {
            data_dir,
            db_path,
            user_id,
            allow_default_user,
            theme,
            log_level,
        }
    }

    /// The user to act as: an explicit choice first, then the configured user,
    /// then the default user when that is allowed.
    pub fn resolve_user(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(user) = explicit.map(str::trim).filter(|user| !user.is_empty()) {
            return Ok(user.to_string());
        }
        if let Some(user) = &self.user_id {
            return Ok(user.trim().to_string());
        }
        if self.allow_default_user {
            return Ok(DEFAULT_USER.to_string());
        }
        bail!("No user given: pass --user, set CLOUDHABIT_USER, or set ALLOW_DEFAULT_USER=true")
    }

    /// Install the global subscriber. `RUST_LOG` wins over the configured level.
    pub fn init_logging(&self) -> Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_paths_follow_data_dir() {
        let config = config_from(&[("CLOUDHABIT_DIR", "/tmp/habits")]);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/habits"));
        assert_eq!(config.db_path, PathBuf::from("/tmp/habits/habits.db"));

        let config = config_from(&[
            ("CLOUDHABIT_DIR", "/tmp/habits"),
            ("CLOUDHABIT_DB", "/var/lib/other.db"),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/var/lib/other.db"));
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert!(config.data_dir.ends_with("cloudhabit"));
        assert_eq!(config.user_id, None);
        assert!(!config.allow_default_user);
        assert_eq!(config.theme, "dark");
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_resolve_user_precedence() {
        let config = config_from(&[("CLOUDHABIT_USER", "alice"), ("ALLOW_DEFAULT_USER", "true")]);
        assert_eq!(config.resolve_user(Some("bob")).unwrap(), "bob");
        assert_eq!(config.resolve_user(Some("  ")).unwrap(), "alice");
        assert_eq!(config.resolve_user(None).unwrap(), "alice");

        let config = config_from(&[("ALLOW_DEFAULT_USER", "TRUE")]);
        assert_eq!(config.resolve_user(None).unwrap(), DEFAULT_USER);
    }

    #[test]
    fn test_resolve_user_requires_someone() {
        let config = config_from(&[("ALLOW_DEFAULT_USER", "no"), ("CLOUDHABIT_USER", "")]);
        assert!(config.resolve_user(None).is_err());
    }
}

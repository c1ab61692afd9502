use crate::application::{Config, HabitTracker, Theme};
use crate::infrastructure::{DuckDbStorage, TrackerStorage};
use anyhow::{Context, Result};
use log::debug;

pub struct HabitApp {
    pub tracker: HabitTracker,
    pub config: Config,
    pub theme: Theme,
}

impl HabitApp {
    /// Open (or create) the database the config points at.
    pub fn with_config(config: Config) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory {}", parent.display())
                })?;
            }
        }

        let storage = DuckDbStorage::new(&config.db_path)?;
        debug!(
            "Opened {} storage at {}",
            storage.backend_info(),
            config.db_path.display()
        );

        let theme = Theme::by_name(&config.theme);

        Ok(Self {
            tracker: HabitTracker::new(Box::new(storage)),
            config,
            theme,
        })
    }

    pub fn user(&self, explicit: Option<&str>) -> Result<String> {
        self.config.resolve_user(explicit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar;

    #[test]
    fn test_app_creates_nested_data_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let root = temp_dir.path().join("nested").join("dir");
        let config = Config::from_lookup(|key| match key {
            "CLOUDHABIT_DIR" => Some(root.display().to_string()),
            "CLOUDHABIT_THEME" => Some("light".to_string()),
            _ => None,
        });

        let app = HabitApp::with_config(config).unwrap();
        assert!(root.join("habits.db").exists());
        assert_eq!(app.theme.name, "Light");

        let habit = app.tracker.create_habit("alice", "Walk").unwrap();
        let outcome = app
            .tracker
            .toggle_completion("alice", &habit.id, calendar::today())
            .unwrap();
        assert!(outcome.is_completed());
    }
}

/// Test utilities for DuckDB-based tests
///
/// Each `TestStorage` owns a fresh file-backed DuckDB database inside a
/// temporary directory, so tests never share state and nothing is left behind.
///
/// ## Usage Examples
///
/// ```rust,ignore
/// use crate::infrastructure::test_utils::test_harness::TestStorage;
///
/// #[test]
/// fn my_test() {
///     let test_storage = TestStorage::new();
///     let habit = test_storage.create_habit("alice", "Read").unwrap();
///     test_storage.complete(&habit, &[some_date]).unwrap();
/// }
/// ```
#[cfg(test)]
pub mod test_harness {
    use crate::application::HabitTracker;
    use crate::entities::{Completion, Habit};
    use crate::infrastructure::DuckDbStorage;
    use anyhow::Result;
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use tempfile::TempDir;

    pub struct TestStorage {
        pub tracker: HabitTracker,
        temp_dir: TempDir, // Keep temp dir alive
    }

    impl TestStorage {
        /// Create a tracker backed by a fresh DuckDB database
        pub fn new() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp directory");
            let db_path = temp_dir.path().join("test.db");

            let storage =
                DuckDbStorage::new(&db_path).expect("Failed to initialize test DuckDB storage");

            Self {
                tracker: HabitTracker::new(Box::new(storage)),
                temp_dir,
            }
        }

        pub fn tracker(&self) -> &HabitTracker {
            &self.tracker
        }

        /// Get database path (useful for debugging)
        pub fn db_path(&self) -> PathBuf {
            self.temp_dir.path().join("test.db")
        }

        pub fn create_habit(&self, user_id: &str, name: &str) -> Result<Habit> {
            self.tracker.create_habit(user_id, name)
        }

        /// Mark `habit` done on each of `dates`, bypassing the toggle logic
        pub fn complete(&self, habit: &Habit, dates: &[NaiveDate]) -> Result<()> {
            for &date in dates {
                self.tracker
                    .storage()
                    .insert_completion(&Completion::new(&habit.user_id, &habit.id, date))?;
            }
            Ok(())
        }
    }

    /// Run a test with fresh test storage
    pub fn with_test_storage<F, R>(test_fn: F) -> R
    where
        F: FnOnce(&TestStorage) -> R,
    {
        let test_storage = TestStorage::new();
        test_fn(&test_storage)
    }
}

#[cfg(test)]
mod tests {
    use super::test_harness::*;
    use crate::infrastructure::{DuckDbStorage, HabitStorage};
    use chrono::NaiveDate;

    #[test]
    fn test_harness_basic_functionality() {
        let test_storage = TestStorage::new();
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        assert!(test_storage.tracker().habits("alice").unwrap().is_empty());

        let habit = test_storage.create_habit("alice", "Stretch").unwrap();
        test_storage.complete(&habit, &[date]).unwrap();

        let map = test_storage
            .tracker()
            .completions_batch("alice", &[habit.id.clone()], &[date])
            .unwrap();
        assert_eq!(map.get(&(habit.id, date)), Some(&true));
    }

    #[test]
    fn test_harness_persists_to_disk() {
        with_test_storage(|test_storage| {
            test_storage.create_habit("alice", "Read").unwrap();
            assert!(test_storage.db_path().exists());
        });
    }

    #[test]
    fn test_harness_isolation() {
        let test_storage1 = TestStorage::new();
        let test_storage2 = TestStorage::new();

        test_storage1.create_habit("alice", "Read").unwrap();

        assert!(test_storage2.tracker().habits("alice").unwrap().is_empty());
    }

    #[test]
    fn test_reopening_keeps_data() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("habits.db");

        {
            let storage = DuckDbStorage::new(&db_path).unwrap();
            let habit = crate::entities::Habit::new(
                "alice",
                1,
                "Read",
                "#3b82f6",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            );
            storage.insert_habit(&habit).unwrap();
        }

        let storage = DuckDbStorage::new(&db_path).unwrap();
        assert_eq!(storage.count_habits("alice").unwrap(), 1);
    }
}

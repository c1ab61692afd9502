use crate::entities::{Completion, Habit};
use anyhow::Result;
use chrono::NaiveDate;

/// Trait for reading and writing habits
pub trait HabitStorage {
    /// All habits owned by a user, oldest first
    fn list_habits(&self, user_id: &str) -> Result<Vec<Habit>>;

    /// A single habit, only if it belongs to the user
    fn find_habit(&self, user_id: &str, habit_id: &str) -> Result<Option<Habit>>;

    fn count_habits(&self, user_id: &str) -> Result<u64>;

    /// Highest numeric `{user}_N` suffix in use, 0 when there is none
    fn max_habit_sequence(&self, user_id: &str) -> Result<u32>;

    fn insert_habit(&self, habit: &Habit) -> Result<()>;

    /// Delete a habit together with its completions. Returns false when nothing matched.
    fn delete_habit(&self, user_id: &str, habit_id: &str) -> Result<bool>;
}

/// Trait for completion rows
pub trait CompletionStorage {
    /// Every completion of the user for any of `habit_ids` on any of `dates`, in one query
    fn find_completions(
        &self,
        user_id: &str,
        habit_ids: &[String],
        dates: &[NaiveDate],
    ) -> Result<Vec<Completion>>;

    /// Insert unless an identical row exists. Returns whether a row was written.
    fn insert_completion(&self, completion: &Completion) -> Result<bool>;

    /// Returns whether a row was removed
    fn delete_completion(&self, completion: &Completion) -> Result<bool>;
}

/// Combined storage interface used by the tracker
pub trait TrackerStorage: HabitStorage + CompletionStorage {
    /// Initialize the storage backend (create tables, indexes, etc.)
    fn initialize(&self) -> Result<()>;

    /// Get storage backend information
    fn backend_info(&self) -> &str;

    /// Perform maintenance operations (vacuum, optimize, etc.)
    fn maintenance(&self) -> Result<()>;
}

use crate::calendar::{self, WEEK_DAY_NAMES};
use crate::entities::{
    ChartPoint, Completion, CompletionMap, DaySummary, Habit, HabitStats, HabitWithCompletions,
    MonthOverview, Period, Report, StreakSummary, ToggleOutcome, WeekOverview, habit_color,
};
use crate::infrastructure::TrackerStorage;
use crate::stats::{completion_percentage, percentage};
use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, SubsecRound};
use log::{debug, info, warn};
use std::collections::HashSet;

/// Attempts before a contended toggle gives up.
const TOGGLE_ATTEMPTS: usize = 3;

/// Habit and completion operations for any user, over an explicit storage handle.
pub struct HabitTracker {
    storage: Box<dyn TrackerStorage>,
}

impl HabitTracker {
    pub fn new(storage: Box<dyn TrackerStorage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &dyn TrackerStorage {
        self.storage.as_ref()
    }

    pub fn habits(&self, user_id: &str) -> Result<Vec<Habit>> {
        self.storage.list_habits(user_id)
    }

    pub fn create_habit(&self, user_id: &str, name: &str) -> Result<Habit> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Habit name must not be empty");
        }

        let sequence = self.storage.max_habit_sequence(user_id)? + 1;
        let count = self.storage.count_habits(user_id)? as usize;
        let habit = Habit::new(
            user_id,
            sequence,
            name,
            habit_color(count),
            // Stored with microsecond precision
            Local::now().naive_local().trunc_subsecs(6),
        );

        self.storage.insert_habit(&habit)?;
        info!("Created habit {} for user {}", habit.id, user_id);

        Ok(habit)
    }

    /// Returns false when the user has no such habit.
    pub fn delete_habit(&self, user_id: &str, habit_id: &str) -> Result<bool> {
        let deleted = self.storage.delete_habit(user_id, habit_id)?;
        if deleted {
            info!("Deleted habit {} for user {}", habit_id, user_id);
        }
        Ok(deleted)
    }

    /// Flip the completion of `habit_id` on `date`.
    ///
    /// A conflicting insert means another toggle created the row first; the
    /// state is re-read and the toggle retried.
    pub fn toggle_completion(
        &self,
        user_id: &str,
        habit_id: &str,
        date: NaiveDate,
    ) -> Result<ToggleOutcome> {
        if self.storage.find_habit(user_id, habit_id)?.is_none() {
            bail!("Habit with id {} not found", habit_id);
        }

        let completion = Completion::new(user_id, habit_id, date);
        for attempt in 1..=TOGGLE_ATTEMPTS {
            if self.storage.delete_completion(&completion)? {
                debug!("Cleared {} on {}", habit_id, date);
                return Ok(ToggleOutcome::Cleared);
            }
            if self.storage.insert_completion(&completion)? {
                debug!("Completed {} on {}", habit_id, date);
                return Ok(ToggleOutcome::Completed);
            }
            warn!(
                "Toggle of {} on {} lost a race (attempt {}/{})",
                habit_id, date, attempt, TOGGLE_ATTEMPTS
            );
        }

        bail!(
            "Could not toggle {} on {} after {} attempts",
            habit_id,
            date,
            TOGGLE_ATTEMPTS
        )
    }

    /// One lookup for every `(habit, date)` pair; pairs without a row map to false.
    pub fn completions_batch(
        &self,
        user_id: &str,
        habit_ids: &[String],
        dates: &[NaiveDate],
    ) -> Result<CompletionMap> {
        if habit_ids.is_empty() || dates.is_empty() {
            return Ok(CompletionMap::new());
        }

        let found: HashSet<(String, NaiveDate)> = self
            .storage
            .find_completions(user_id, habit_ids, dates)
            .context("Failed to load completions")?
            .into_iter()
            .map(|c| (c.habit_id, c.date))
            .collect();

        let mut map = CompletionMap::with_capacity(habit_ids.len() * dates.len());
        for habit_id in habit_ids {
            for &date in dates {
                let key = (habit_id.clone(), date);
                let done = found.contains(&key);
                map.insert(key, done);
            }
        }

        Ok(map)
    }

    pub fn enrich(
        &self,
        user_id: &str,
        habits: Vec<Habit>,
        dates: &[NaiveDate],
    ) -> Result<Vec<HabitWithCompletions>> {
        let habit_ids: Vec<String> = habits.iter().map(|h| h.id.clone()).collect();
        let map = self.completions_batch(user_id, &habit_ids, dates)?;

        Ok(habits
            .into_iter()
            .map(|habit| {
                let completions = dates
                    .iter()
                    .map(|&date| (date, is_done(&map, &habit.id, date)))
                    .collect();
                HabitWithCompletions { habit, completions }
            })
            .collect())
    }

    pub fn streaks(
        &self,
        user_id: &str,
        habit_id: &str,
        dates: &[NaiveDate],
    ) -> Result<StreakSummary> {
        let map = self.completions_batch(user_id, &[habit_id.to_string()], dates)?;
        Ok(StreakSummary::compute(dates, |date| {
            is_done(&map, habit_id, date)
        }))
    }

    pub fn completion_rate(
        &self,
        user_id: &str,
        habit_id: &str,
        dates: &[NaiveDate],
    ) -> Result<u32> {
        let map = self.completions_batch(user_id, &[habit_id.to_string()], dates)?;
        Ok(completion_percentage(dates, |date| {
            is_done(&map, habit_id, date)
        }))
    }

    /// The week containing `today`, every habit enriched with its completions.
    pub fn week_overview(&self, user_id: &str, today: NaiveDate) -> Result<WeekOverview> {
        let dates = calendar::week_dates(today);
        let habits = self.enrich(user_id, self.habits(user_id)?, &dates)?;

        Ok(WeekOverview {
            dates,
            day_names: WEEK_DAY_NAMES,
            habits,
        })
    }

    /// Per-day completion counts across all of the user's habits.
    pub fn month_overview(&self, user_id: &str, year: i32, month: u32) -> Result<MonthOverview> {
        let calendar = calendar::calendar_grid(year, month)?;
        let dates = calendar.dates();
        let habits = self.habits(user_id)?;
        let habit_ids: Vec<String> = habits.iter().map(|h| h.id.clone()).collect();
        let map = self.completions_batch(user_id, &habit_ids, &dates)?;

        let days = dates
            .iter()
            .map(|&date| {
                let completed = habit_ids
                    .iter()
                    .filter(|id| is_done(&map, id, date))
                    .count();
                let summary = DaySummary {
                    completed,
                    total: habits.len(),
                    percentage: percentage(completed, habits.len()),
                };
                (date, summary)
            })
            .collect();

        Ok(MonthOverview {
            calendar,
            habits,
            days,
        })
    }

    pub fn report(&self, user_id: &str, period: Period, today: NaiveDate) -> Result<Report> {
        let dates = calendar::period_dates_from(period, today);
        let habits = self.habits(user_id)?;
        let habit_ids: Vec<String> = habits.iter().map(|h| h.id.clone()).collect();
        let map = self.completions_batch(user_id, &habit_ids, &dates)?;

        let chart = dates
            .iter()
            .map(|&date| {
                let flags: Vec<(String, bool)> = habit_ids
                    .iter()
                    .map(|id| (id.clone(), is_done(&map, id, date)))
                    .collect();
                ChartPoint {
                    date,
                    label: calendar::format_date_for_display(date),
                    total_completed: flags.iter().filter(|(_, done)| *done).count(),
                    habits: flags,
                }
            })
            .collect();

        let habits = habits
            .into_iter()
            .map(|habit| {
                let done = |date| is_done(&map, &habit.id, date);
                let streaks = StreakSummary::compute(&dates, done);
                let completion_rate = completion_percentage(&dates, done);
                HabitStats {
                    habit,
                    completion_rate,
                    current_streak: streaks.current,
                    max_streak: streaks.max,
                }
            })
            .collect();

        Ok(Report {
            period,
            dates,
            habits,
            chart,
        })
    }
}

fn is_done(map: &CompletionMap, habit_id: &str, date: NaiveDate) -> bool {
    map.get(&(habit_id.to_string(), date)).copied().unwrap_or(false)
}

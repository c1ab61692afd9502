//! Streak and completion-rate arithmetic over an ordered list of dates.

use crate::entities::StreakSummary;
use chrono::NaiveDate;
use std::collections::BTreeSet;

impl StreakSummary {
    /// Scans `dates` from the most recent backwards. Repeated dates count once.
    ///
    /// `current` is the completed run starting at the most recent date, `max`
    /// the longest completed run in the scan. Runs are consecutive within
    /// `dates`, not within the calendar: pass a contiguous range for
    /// calendar-accurate streaks.
    pub fn compute<F>(dates: &[NaiveDate], is_completed: F) -> Self
    where
        F: Fn(NaiveDate) -> bool,
    {
        let mut sorted = dates.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();

        let current = sorted
            .iter()
            .take_while(|&&date| is_completed(date))
            .count() as u32;

        let mut max = 0;
        let mut run = 0;
        for &date in &sorted {
            if is_completed(date) {
                run += 1;
                max = max.max(run);
            } else {
                run = 0;
            }
        }

        Self { current, max }
    }
}

/// `part / total` as a whole percentage, halves rounded up (1 of 8 is 13, not 12).
/// Zero when `total` is zero.
///
/// Only a complete set reports 100: anything short of it is capped at 99.
pub fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let part = part.min(total) as u64;
    let total = total as u64;
    let rounded = ((part * 200 + total) / (total * 2)) as u32;
    if part < total { rounded.min(99) } else { rounded }
}

/// Share of distinct `dates` that are completed. Repeated dates count once,
/// as in [`StreakSummary::compute`].
pub fn completion_percentage<F>(dates: &[NaiveDate], is_completed: F) -> u32
where
    F: Fn(NaiveDate) -> bool,
{
    let distinct: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    let completed = distinct.iter().filter(|&&date| is_completed(date)).count();
    percentage(completed, distinct.len())
}

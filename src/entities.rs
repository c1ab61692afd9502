use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// ============================================================================
// Habit
// ============================================================================

/// Palette handed out round-robin as a user creates habits.
pub const HABIT_COLORS: [&str; 8] = [
    "#3b82f6", // blue
    "#10b981", // green
    "#8b5cf6", // purple
    "#f59e0b", // orange
    "#ef4444", // red
    "#06b6d4", // cyan
    "#ec4899", // pink
    "#f97316", // orange-red
];

pub fn habit_color(index: usize) -> &'static str {
    HABIT_COLORS[index % HABIT_COLORS.len()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub color: String,
    pub created_at: NaiveDateTime,
}

impl Habit {
    pub fn new(
        user_id: impl Into<String>,
        sequence: u32,
        name: impl Into<String>,
        color: impl Into<String>,
        created_at: NaiveDateTime,
    ) -> Self {
        let user_id = user_id.into();
        Self {
            id: Self::make_id(&user_id, sequence),
            user_id,
            name: name.into(),
            color: color.into(),
            created_at,
        }
    }

    /// Ids follow `{user}_{sequence}`.
    pub fn make_id(user_id: &str, sequence: u32) -> String {
        format!("{}_{}", user_id, sequence)
    }

    /// Numeric suffix of `habit_id` when it carries the `{user}_` prefix.
    pub fn sequence_of(user_id: &str, habit_id: &str) -> Option<u32> {
        habit_id
            .strip_prefix(user_id)
            .and_then(|rest| rest.strip_prefix('_'))
            .and_then(|suffix| suffix.parse().ok())
    }
}

impl fmt::Display for Habit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

// ============================================================================
// Completion
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Completion {
    pub user_id: String,
    pub habit_id: String,
    pub date: NaiveDate,
}

impl Completion {
    pub fn new(user_id: impl Into<String>, habit_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            habit_id: habit_id.into(),
            date,
        }
    }
}

/// `(habit_id, date) -> completed` for every requested pair.
pub type CompletionMap = HashMap<(String, NaiveDate), bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Completed,
    Cleared,
}

impl ToggleOutcome {
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

// ============================================================================
// Read models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitWithCompletions {
    pub habit: Habit,
    pub completions: BTreeMap<NaiveDate, bool>,
}

impl HabitWithCompletions {
    pub fn is_completed(&self, date: NaiveDate) -> bool {
        self.completions.get(&date).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
    pub current: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitStats {
    pub habit: Habit,
    pub completion_rate: u32,
    pub current_streak: u32,
    pub max_streak: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub label: String,
    pub total_completed: usize,
    /// `(habit_id, completed)` in habit order.
    pub habits: Vec<(String, bool)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekOverview {
    pub dates: Vec<NaiveDate>,
    pub day_names: [&'static str; 7],
    pub habits: Vec<HabitWithCompletions>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthOverview {
    pub calendar: CalendarMonth,
    pub habits: Vec<Habit>,
    pub days: BTreeMap<NaiveDate, DaySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub period: Period,
    pub dates: Vec<NaiveDate>,
    pub habits: Vec<HabitStats>,
    pub chart: Vec<ChartPoint>,
}

// ============================================================================
// Periods, ranges and calendar grids
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[default]
    #[serde(rename = "7days")]
    SevenDays,
    #[serde(rename = "30days")]
    ThirtyDays,
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "month")]
    Month,
}

impl Period {
    /// Unknown names fall back to the trailing seven days.
    pub fn parse(name: &str) -> Self {
        match name {
            "7days" => Self::SevenDays,
            "30days" => Self::ThirtyDays,
            "week" => Self::Week,
            "month" => Self::Month,
            _ => Self::SevenDays,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SevenDays => "7days",
            Self::ThirtyDays => "30days",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `len` days ending at (and including) `end`.
    pub fn trailing(end: NaiveDate, len: i64) -> Self {
        Self {
            start: end - chrono::Duration::days(len - 1),
            end,
        }
    }

    pub fn week(start_of_week: NaiveDate) -> Self {
        Self {
            start: start_of_week,
            end: start_of_week + chrono::Duration::days(6),
        }
    }

    /// Returns `None` for an invalid year/month.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }?;

        Some(Self {
            start,
            end: next.pred_opt()?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let start = self.start;
        let end = self.end;
        (0..=(end - start).num_days()).map(move |i| start + chrono::Duration::days(i))
    }
}

/// A month laid out Monday-first, one row per week; `0` marks days outside the month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub name: &'static str,
    pub weeks: Vec<[u32; 7]>,
}

impl CalendarMonth {
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.weeks
            .iter()
            .flatten()
            .filter(|&&day| day != 0)
            .filter_map(|&day| NaiveDate::from_ymd_opt(self.year, self.month, day))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_habit_ids_follow_user_sequence() {
        assert_eq!(Habit::make_id("42", 3), "42_3");
        assert_eq!(Habit::sequence_of("42", "42_3"), Some(3));
        assert_eq!(Habit::sequence_of("42", "42_x"), None);
        assert_eq!(Habit::sequence_of("42", "421_3"), None);
        assert_eq!(Habit::sequence_of("4", "42_3"), None);
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(habit_color(0), "#3b82f6");
        assert_eq!(habit_color(7), "#f97316");
        assert_eq!(habit_color(8), "#3b82f6");
        assert_eq!(habit_color(10), habit_color(2));
    }

    #[test]
    fn test_period_parse_falls_back_to_seven_days() {
        assert_eq!(Period::parse("30days"), Period::ThirtyDays);
        assert_eq!(Period::parse("month"), Period::Month);
        assert_eq!(Period::parse("fortnight"), Period::SevenDays);
        assert_eq!(Period::parse(""), Period::SevenDays);
        assert_eq!(Period::Week.to_string(), "week");
    }

    #[test]
    fn test_month_range_handles_december_and_invalid_input() {
        let december = DateRange::month(2023, 12).unwrap();
        assert_eq!(december.start, date(2023, 12, 1));
        assert_eq!(december.end, date(2023, 12, 31));
        assert_eq!(december.days().count(), 31);

        assert!(DateRange::month(2024, 13).is_none());
        assert!(DateRange::month(2024, 0).is_none());
    }

    #[test]
    fn test_trailing_range_includes_end() {
        let range = DateRange::trailing(date(2024, 3, 1), 7);
        assert_eq!(range.start, date(2024, 2, 24));
        assert!(range.contains(date(2024, 3, 1)));
        assert!(!range.contains(date(2024, 3, 2)));
    }

    #[test]
    fn test_period_serializes_as_canonical_name() {
        let json = serde_json::to_string(&Period::ThirtyDays).unwrap();
        assert_eq!(json, "\"30days\"");
    }
}

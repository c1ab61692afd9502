use super::theme::Theme;
use crate::calendar::{self, WEEK_DAY_NAMES};
use crate::entities::{Habit, MonthOverview, Report, ToggleOutcome};
use chrono::NaiveDate;
use std::fmt::Write;

/// Plain-terminal rendering for the non-interactive commands.
pub struct TextRenderer {
    theme: Theme,
}

impl TextRenderer {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn render_habits(&self, habits: &[Habit]) -> String {
        if habits.is_empty() {
            return self.theme.colors.dimmed.colorize("No habits yet.\n");
        }

        let mut out = String::new();
        for habit in habits {
            let marker = self.theme.habit_color(&habit.color).colorize("●");
            let _ = writeln!(
                out,
                "{} {:<12} {}",
                marker,
                habit.id,
                self.theme.colors.primary.colorize(&habit.name)
            );
        }
        out
    }

    pub fn render_toggle(&self, habit: &Habit, date: NaiveDate, outcome: ToggleOutcome) -> String {
        let colors = &self.theme.colors;
        let state = match outcome {
            ToggleOutcome::Completed => colors.done.colorize_bold("done"),
            ToggleOutcome::Cleared => colors.missed.colorize("not done"),
        };
        format!(
            "{} on {}: {}",
            habit.name,
            calendar::format_date(date),
            state
        )
    }

    /// Month grid, each day tagged with how many habits were completed.
    pub fn render_month(&self, overview: &MonthOverview, today: NaiveDate) -> String {
        let colors = &self.theme.colors;
        let calendar = &overview.calendar;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "{}",
            colors
                .header
                .colorize_bold(&format!("{} {}", calendar.name, calendar.year))
        );
        let header: Vec<String> = WEEK_DAY_NAMES.iter().map(|d| format!("{:<6}", d)).collect();
        let _ = writeln!(out, "{}", colors.header.colorize(header.join(" ").trim_end()));

        for week in &calendar.weeks {
            let cells: Vec<String> = week
                .iter()
                .map(|&day| {
                    let date = NaiveDate::from_ymd_opt(calendar.year, calendar.month, day);
                    match date.and_then(|date| overview.days.get(&date).map(|s| (date, s))) {
                        None => " ".repeat(6),
                        Some((date, summary)) => {
                            let text = format!("{:>2}{:<4}", day, day_marker(summary.percentage));
                            if date == today {
                                colors.today.colorize(&text)
                            } else if summary.total > 0 && summary.completed == summary.total {
                                colors.done.colorize(&text)
                            } else if summary.completed == 0 {
                                colors.dimmed.colorize(&text)
                            } else {
                                colors.primary.colorize(&text)
                            }
                        }
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", cells.join(" "));
        }

        if overview.habits.is_empty() {
            let _ = writeln!(out, "{}", colors.dimmed.colorize("No habits yet."));
        } else {
            let _ = writeln!(
                out,
                "{}",
                colors
                    .help_text
                    .colorize("● all done  ◐ half or more  ○ some  · none")
            );
        }
        out
    }

    pub fn render_report(&self, report: &Report) -> String {
        let colors = &self.theme.colors;
        let mut out = String::new();

        let range = match (report.dates.first(), report.dates.last()) {
            (Some(first), Some(last)) => format!(
                "{} - {}",
                calendar::format_date_for_display(*first),
                calendar::format_date_for_display(*last)
            ),
            _ => String::new(),
        };
        let _ = writeln!(
            out,
            "{}",
            colors
                .header
                .colorize_bold(&format!("Report ({}) {}", report.period, range))
        );

        if report.habits.is_empty() {
            let _ = writeln!(out, "{}", colors.dimmed.colorize("No habits yet."));
            return out;
        }

        let _ = writeln!(
            out,
            "{}",
            colors.header.colorize(&format!(
                "{:<20} {:>6} {:>8} {:>8}",
                "Habit", "Rate", "Current", "Best"
            ))
        );
        for stats in &report.habits {
            let name = self
                .theme
                .habit_color(&stats.habit.color)
                .colorize(&format!("{:<20}", truncate(&stats.habit.name, 20)));
            let _ = writeln!(
                out,
                "{} {:>5}% {:>8} {:>8}",
                name, stats.completion_rate, stats.current_streak, stats.max_streak
            );
        }

        let _ = writeln!(out);
        let habit_count = report.habits.len();
        for point in &report.chart {
            let bar = colors.accent.colorize(&"█".repeat(point.total_completed));
            let rest = colors.dimmed.colorize(&"░".repeat(habit_count - point.total_completed.min(habit_count)));
            let _ = writeln!(
                out,
                "{:>6} {}{} {}/{}",
                point.label, bar, rest, point.total_completed, habit_count
            );
        }
        out
    }
}

fn day_marker(percentage: u32) -> &'static str {
    match percentage {
        100 => " ●",
        50..=99 => " ◐",
        1..=49 => " ○",
        _ => " ·",
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_utils::test_harness::TestStorage;
    use crate::entities::Period;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn renderer() -> TextRenderer {
        TextRenderer::new(Theme::minimal())
    }

    #[test]
    fn test_render_habits_lists_ids_and_names() {
        let harness = TestStorage::new();
        harness.create_habit("alice", "Meditate").unwrap();
        harness.create_habit("alice", "Read").unwrap();

        let out = renderer().render_habits(&harness.tracker().habits("alice").unwrap());
        assert!(out.contains("alice_1"));
        assert!(out.contains("Meditate"));
        assert!(out.contains("alice_2"));
        assert_eq!(out.lines().count(), 2);

        assert!(renderer().render_habits(&[]).contains("No habits yet."));
    }

    #[test]
    fn test_render_month_marks_days() {
        let harness = TestStorage::new();
        let habit = harness.create_habit("alice", "Run").unwrap();
        harness.complete(&habit, &[date(2024, 2, 10)]).unwrap();

        let overview = harness.tracker().month_overview("alice", 2024, 2).unwrap();
        let out = renderer().render_month(&overview, date(2024, 3, 1));

        assert!(out.contains("February 2024"));
        assert!(out.contains("10 ●"));
        assert!(out.contains("29 ·"));
    }

    #[test]
    fn test_render_report_includes_stats_and_chart() {
        let harness = TestStorage::new();
        let habit = harness.create_habit("alice", "Run").unwrap();
        harness.complete(&habit, &[date(2024, 1, 6), date(2024, 1, 7)]).unwrap();

        let report = harness
            .tracker()
            .report("alice", Period::SevenDays, date(2024, 1, 7))
            .unwrap();
        let out = renderer().render_report(&report);

        assert!(out.contains("Report (7days)"));
        assert!(out.contains("29%"));
        assert!(out.contains(" 7 Jan"));
        assert!(out.contains("1/1"));
        assert!(out.contains("0/1"));
    }

    #[test]
    fn test_render_toggle() {
        let harness = TestStorage::new();
        let habit = harness.create_habit("alice", "Run").unwrap();
        let out = renderer().render_toggle(&habit, date(2024, 1, 7), ToggleOutcome::Completed);
        assert!(out.contains("Run on 2024-01-07"));
        assert!(out.contains("done"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Read", 20), "Read");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}

use super::theme::Theme;
use crate::application::HabitTracker;
use crate::calendar::{self, WEEK_DAY_NAMES};
use crate::entities::{HabitWithCompletions, WeekOverview};
use crate::stats::completion_percentage;
use anyhow::{Context, Result, bail};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::tty::IsTty;
use log::debug;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use std::io::{Stdout, stdout};

/// What the caller must do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeekAction {
    None,
    /// The focused week changed, completions must be reloaded
    Reload,
    Toggle { habit: usize, date: NaiveDate },
    Quit,
}

/// Cursor state of the week grid, kept apart from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekGrid {
    pub week_start: NaiveDate,
    pub selected_habit: usize,
    pub selected_day: usize,
    pub show_help: bool,
}

impl WeekGrid {
    pub fn new(focus: NaiveDate) -> Self {
        Self {
            week_start: calendar::week_start(focus),
            selected_habit: 0,
            selected_day: focus.weekday().num_days_from_monday() as usize,
            show_help: false,
        }
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.week_start + Duration::days(self.selected_day as i64)
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        calendar::week_dates(self.week_start)
    }

    /// Keep the habit cursor inside a list that may have shrunk.
    pub fn clamp(&mut self, habit_count: usize) {
        self.selected_habit = self.selected_habit.min(habit_count.saturating_sub(1));
    }

    fn move_week(&mut self, weeks: i64) -> WeekAction {
        self.week_start = self.week_start + Duration::weeks(weeks);
        WeekAction::Reload
    }

    fn focus(&mut self, date: NaiveDate) -> WeekAction {
        let week_start = calendar::week_start(date);
        self.selected_day = date.weekday().num_days_from_monday() as usize;
        if week_start == self.week_start {
            WeekAction::None
        } else {
            self.week_start = week_start;
            WeekAction::Reload
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, habit_count: usize, today: NaiveDate) -> WeekAction {
        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => WeekAction::Quit,
            (KeyCode::Char('c'), KeyModifiers::CONTROL)
            | (KeyCode::Char('d'), KeyModifiers::CONTROL) => WeekAction::Quit,

            (KeyCode::Left, _) | (KeyCode::Char('h'), _) => {
                let date = self.selected_date() - Duration::days(1);
                self.focus(date)
            }
            (KeyCode::Right, _) | (KeyCode::Char('l'), _) => {
                let date = self.selected_date() + Duration::days(1);
                self.focus(date)
            }
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => {
                self.selected_habit = self.selected_habit.saturating_sub(1);
                WeekAction::None
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => {
                if self.selected_habit + 1 < habit_count {
                    self.selected_habit += 1;
                }
                WeekAction::None
            }

            (KeyCode::Char('n'), _) | (KeyCode::PageDown, _) => self.move_week(1),
            (KeyCode::Char('p'), _) | (KeyCode::PageUp, _) => self.move_week(-1),
            (KeyCode::Char('t'), _) => self.focus(today),

            (KeyCode::Char(' '), _) | (KeyCode::Enter, _) if habit_count > 0 => {
                WeekAction::Toggle {
                    habit: self.selected_habit,
                    date: self.selected_date(),
                }
            }

            (KeyCode::Char('?'), _) => {
                self.show_help = !self.show_help;
                WeekAction::None
            }

            _ => WeekAction::None,
        }
    }
}

pub struct WeekView<'a> {
    tracker: &'a HabitTracker,
    user_id: String,
    theme: Theme,
    grid: WeekGrid,
    overview: WeekOverview,
    /// Last error or confirmation, shown under the grid
    status: Option<String>,
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl<'a> WeekView<'a> {
    pub fn new(
        tracker: &'a HabitTracker,
        user_id: &str,
        focus: NaiveDate,
        theme: Theme,
    ) -> Result<Self> {
        if !IsTty::is_tty(&stdout()) {
            bail!("Not running in a TTY, cannot initialize terminal interface");
        }

        let grid = WeekGrid::new(focus);
        let overview = tracker.week_overview(user_id, grid.week_start)?;

        enable_raw_mode().context("Failed to enable raw mode")?;

        if let Err(e) = stdout().execute(EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e).context("Failed to enter alternate screen");
        }

        let terminal = match Terminal::new(CrosstermBackend::new(stdout())) {
            Ok(terminal) => terminal,
            Err(e) => {
                let _ = disable_raw_mode();
                let _ = stdout().execute(LeaveAlternateScreen);
                return Err(e).context("Failed to create terminal");
            }
        };

        Ok(Self {
            tracker,
            user_id: user_id.to_string(),
            theme,
            grid,
            overview,
            status: None,
            terminal,
        })
    }

    fn reload(&mut self) -> Result<()> {
        self.overview = self
            .tracker
            .week_overview(&self.user_id, self.grid.week_start)?;
        self.grid.clamp(self.overview.habits.len());
        Ok(())
    }

    fn toggle(&mut self, habit: usize, date: NaiveDate) -> Result<()> {
        let Some(entry) = self.overview.habits.get(habit) else {
            return Ok(());
        };
        let habit_id = entry.habit.id.clone();
        let name = entry.habit.name.clone();

        match self.tracker.toggle_completion(&self.user_id, &habit_id, date) {
            Ok(outcome) => {
                debug!("Toggled {} on {}: {:?}", habit_id, date, outcome);
                let verb = if outcome.is_completed() { "done" } else { "cleared" };
                self.status = Some(format!("{} {} for {}", name, verb, date.format("%a %d %b")));
            }
            Err(e) => self.status = Some(format!("Error: {:#}", e)),
        }

        self.reload()
    }

    fn calculate_centered_area(available: Rect, needed_width: u16, needed_height: u16) -> Rect {
        let width = available.width.min(needed_width);
        let height = available.height.min(needed_height);

        Rect {
            x: available.x + (available.width - width) / 2,
            y: available.y + (available.height - height) / 2,
            width,
            height,
        }
    }

    fn create_table(
        overview: &WeekOverview,
        grid: &WeekGrid,
        today: NaiveDate,
        theme: &Theme,
    ) -> Table<'static> {
        let colors = &theme.colors;

        let mut header_cells = vec![Cell::from("Habit").style(colors.header.to_ratatui())];
        for (date, name) in overview.dates.iter().zip(WEEK_DAY_NAMES) {
            let style = if *date == today {
                colors.today.to_ratatui_with_modifier(Modifier::BOLD)
            } else if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                colors.weekend.to_ratatui()
            } else {
                colors.header.to_ratatui()
            };
            header_cells.push(Cell::from(format!("{} {:>2}", name, date.day())).style(style));
        }
        header_cells.push(Cell::from("Week").style(colors.header.to_ratatui()));
        let header = Row::new(header_cells).height(1);

        let rows: Vec<Row> = overview
            .habits
            .iter()
            .enumerate()
            .map(|(row, entry)| Self::create_habit_row(entry, row, &overview.dates, grid, theme))
            .collect();

        let mut widths = vec![Constraint::Min(16)];
        widths.extend(std::iter::repeat_n(Constraint::Length(6), 7));
        widths.push(Constraint::Length(5));

        Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(colors.border.to_ratatui())
                    .title(format!(
                        " {} - {} ",
                        calendar::format_date_for_display(grid.week_start),
                        calendar::format_date_for_display(grid.week_start + Duration::days(6)),
                    ))
                    .title_style(colors.header.to_ratatui())
                    .title_alignment(Alignment::Center),
            )
            .column_spacing(1)
    }

    fn create_habit_row(
        entry: &HabitWithCompletions,
        row: usize,
        dates: &[NaiveDate],
        grid: &WeekGrid,
        theme: &Theme,
    ) -> Row<'static> {
        let colors = &theme.colors;
        let habit_style = theme.habit_color(&entry.habit.color);

        let mut cells = vec![Cell::from(entry.habit.name.clone()).style(habit_style.to_ratatui())];
        for (column, &date) in dates.iter().enumerate() {
            let done = entry.is_completed(date);
            let selected = row == grid.selected_habit && column == grid.selected_day;
            let symbol = if done { "  ✓" } else { "  ·" };
            let style = if selected {
                colors.selected.to_ratatui_with_modifier(Modifier::BOLD)
            } else if done {
                habit_style.to_ratatui()
            } else {
                colors.missed.to_ratatui()
            };
            cells.push(Cell::from(symbol).style(style));
        }

        let rate = completion_percentage(dates, |date| entry.is_completed(date));
        cells.push(Cell::from(format!("{:>3}%", rate)).style(colors.dimmed.to_ratatui()));

        Row::new(cells)
    }

    fn create_footer(
        grid: &WeekGrid,
        status: Option<&str>,
        empty: bool,
        theme: &Theme,
    ) -> Paragraph<'static> {
        let colors = &theme.colors;
        let mut lines = Vec::new();

        if empty {
            lines.push(Line::from(Span::styled(
                "No habits yet. Add one with `cloudhabit add <name>`.",
                colors.dimmed.to_ratatui(),
            )));
        }

        lines.push(Line::from(Span::styled(
            grid.selected_date().format("%A, %B %d, %Y").to_string(),
            colors.primary.to_ratatui(),
        )));

        if let Some(status) = status {
            let style = if status.starts_with("Error") {
                colors.error_text.to_ratatui()
            } else {
                colors.accent.to_ratatui()
            };
            lines.push(Line::from(Span::styled(status.to_string(), style)));
        }

        if grid.show_help {
            lines.push(Line::from(Span::styled(
                "↑↓/jk=Habit • ←→/hl=Day • n/p=Week • t=Today • Space/Enter=Toggle • ?=Help • q=Quit",
                colors.help_text.to_ratatui(),
            )));
        } else {
            lines.push(Line::from(Span::styled("?=Help", colors.dimmed.to_ratatui())));
        }

        Paragraph::new(lines).alignment(Alignment::Center)
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            let today = calendar::today();
            let overview = &self.overview;
            let grid = &self.grid;
            let theme = &self.theme;
            let status = self.status.as_deref();

            self.terminal.draw(|frame| {
                const WIDTH: u16 = 80;
                const FOOTER_HEIGHT: u16 = 5;

                let table_height = overview.habits.len() as u16 + 4;
                let area = Self::calculate_centered_area(
                    frame.area(),
                    WIDTH,
                    table_height + FOOTER_HEIGHT,
                );

                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(table_height), Constraint::Length(FOOTER_HEIGHT)])
                    .split(area);

                frame.render_widget(Self::create_table(overview, grid, today, theme), chunks[0]);
                frame.render_widget(
                    Self::create_footer(grid, status, overview.habits.is_empty(), theme),
                    chunks[1],
                );
            })?;

            if !poll(std::time::Duration::from_millis(100))? {
                continue;
            }

            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match self.grid.handle_key(key, self.overview.habits.len(), today) {
                WeekAction::None => {}
                WeekAction::Reload => self.reload()?,
                WeekAction::Toggle { habit, date } => self.toggle(habit, date)?,
                WeekAction::Quit => break,
            }
        }

        self.cleanup()
    }

    fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode()?;
        self.terminal.backend_mut().execute(LeaveAlternateScreen)?;
        Ok(())
    }
}

impl Drop for WeekView<'_> {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

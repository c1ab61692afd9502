use crate::application::{Config, HabitApp, TextRenderer, WeekView};
use crate::calendar;
use crate::entities::Period;
use anyhow::{Context, Result, bail};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cloudhabit")]
#[command(about = "Track daily habits, streaks and completion rates")]
#[command(version)]
pub struct Cli {
    /// User to act as (defaults to $CLOUDHABIT_USER)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Database file (defaults to $CLOUDHABIT_DB or the data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a habit
    Add {
        /// Habit name, words are joined with spaces
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Delete a habit and all of its completions
    Remove { habit_id: String },
    /// List habits
    List,
    /// Mark a habit done, or undo it if it already is
    Toggle {
        habit_id: String,
        /// Specific date (YYYY-MM-DD format, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Show a month calendar with daily completion
    Calendar {
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long)]
        month: Option<u32>,
    },
    /// Completion rates and streaks over a period
    Report {
        /// 7days, 30days, week or month
        #[arg(short, long, default_value = "7days")]
        period: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the week view TUI
    Week {
        /// Specific date to focus on (YYYY-MM-DD format, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },
}

impl Cli {
    pub fn run() -> Result<()> {
        Self::parse().execute(Config::from_env())
    }

    pub fn execute(self, mut config: Config) -> Result<()> {
        if let Some(db) = self.db {
            config.db_path = db;
        }
        config.init_logging()?;

        let app = HabitApp::with_config(config)?;
        let user = app.user(self.user.as_deref())?;
        let renderer = TextRenderer::new(app.theme.clone());
        let today = calendar::today();

        match self.command {
            Some(Commands::Add { name }) => {
                let habit = app.tracker.create_habit(&user, &name.join(" "))?;
                println!("Added {}", habit);
            }
            Some(Commands::Remove { habit_id }) => {
                if !app.tracker.delete_habit(&user, &habit_id)? {
                    bail!("Habit with id {} not found", habit_id);
                }
                println!("Removed {}", habit_id);
            }
            Some(Commands::List) => {
                print!("{}", renderer.render_habits(&app.tracker.habits(&user)?));
            }
            Some(Commands::Toggle { habit_id, date }) => {
                let date = parse_optional_date(date.as_deref())?.unwrap_or(today);
                let outcome = app.tracker.toggle_completion(&user, &habit_id, date)?;
                let habit = app
                    .tracker
                    .storage()
                    .find_habit(&user, &habit_id)?
                    .with_context(|| format!("Habit with id {} not found", habit_id))?;
                println!("{}", renderer.render_toggle(&habit, date, outcome));
            }
            Some(Commands::Calendar { year, month }) => {
                let year = year.unwrap_or(today.year());
                let month = month.unwrap_or(today.month());
                let overview = app.tracker.month_overview(&user, year, month)?;
                print!("{}", renderer.render_month(&overview, today));
            }
            Some(Commands::Report { period, json }) => {
                let report = app.tracker.report(&user, Period::parse(&period), today)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", renderer.render_report(&report));
                }
            }
            Some(Commands::Week { date }) => {
                let focus = parse_optional_date(date.as_deref())?.unwrap_or(today);
                WeekView::new(&app.tracker, &user, focus, app.theme.clone())?.run()?;
            }
            None => {
                WeekView::new(&app.tracker, &user, today, app.theme.clone())?.run()?;
            }
        }

        Ok(())
    }
}

fn parse_optional_date(value: Option<&str>) -> Result<Option<chrono::NaiveDate>> {
    value.map(calendar::parse_date).transpose()
}

//! `xptrack` command-line entry point.
//!
//! # Responsibility
//! - Load config, start optional file logging and open the tracker store.
//! - Map one subcommand to one `TrackerService` call and print the result.
//!
//! # Invariants
//! - Any error ends the process with exit code 1 after one `error:` line.

mod cli;

use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use cli::{Cli, Commands, LogCommands, TaskCommands};
use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};
use xptrack_core::db::{open_db, DbError};
use xptrack_core::{
    default_log_level, init_logging, open_sqlite_service, ConfigError, LoggingError,
    SqliteTrackerService, TaskPatch, TrackerConfig, TrackerError, XpChange,
};

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("event=cli_exit module=cli status=error error={err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Logging(LoggingError),
    Db(DbError),
    Tracker(TrackerError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Tracker(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Tracker(err) => Some(err),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<TrackerError> for CliError {
    fn from(value: TrackerError) -> Self {
        Self::Tracker(value)
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = TrackerConfig::load(&cli.config)?;

    if let Some(dir) = cli.log_dir.as_ref().or(config.logging.dir.as_ref()) {
        let level = cli
            .log_level
            .as_deref()
            .or(config.logging.level.as_deref())
            .unwrap_or_else(|| default_log_level());
        init_logging(level, dir)?;
    }

    let conn = open_db(&cli.db)?;
    let mut service = open_sqlite_service(&conn, config.leveling)?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Status => print_status(&service),
        Commands::Task(args) => match args.command {
            TaskCommands::Add { title, xp } => {
                let task = service.add_task(title, xp)?;
                println!("added {} `{}` ({} xp)", task.id, task.title, task.xp_value);
            }
            TaskCommands::List => print_tasks(&service),
            TaskCommands::Edit { id, title, xp } => {
                let task = service.update_task(
                    id,
                    TaskPatch {
                        title,
                        xp_value: xp,
                    },
                )?;
                println!("updated {} `{}` ({} xp)", task.id, task.title, task.xp_value);
            }
            TaskCommands::Rm { id } => {
                let task = service.remove_task(id)?;
                println!("removed {} `{}`", task.id, task.title);
            }
            TaskCommands::Move { id, position } => {
                service.reorder_task(id, position)?;
                print_tasks(&service);
            }
        },
        Commands::Report(args) => {
            let change = service.report_task(args.task_id, args.date.unwrap_or(today))?;
            print_change(&change);
        }
        Commands::Log(args) => match args.command {
            LogCommands::Add { label, xp, date } => {
                let change = service.add_entry(label, xp, date.unwrap_or(today))?;
                print_change(&change);
            }
            LogCommands::Rm { id } => {
                let change = service.delete_entry(id)?;
                println!(
                    "deleted {} `{}`, reversed {} xp",
                    change.record.id, change.record.label, change.record.xp_awarded
                );
                print_level_change(&change);
            }
        },
        Commands::Day(args) => print_day(&service, args.date.unwrap_or(today)),
        Commands::Month(args) => {
            let (year, month) = args.month.unwrap_or((today.year(), today.month()));
            let days = service.month(year, month)?;
            if days.is_empty() {
                println!("no activity in {year:04}-{month:02}");
            }
            for day in days {
                println!(
                    "{}  {:>3} entries  {:>6} xp",
                    day.date,
                    day.entries.len(),
                    day.total_xp
                );
            }
        }
    }
    Ok(())
}

fn print_status(service: &SqliteTrackerService<'_>) {
    let progress = service.progress();
    println!("level {}", progress.level);
    println!(
        "xp    {}/{} ({:.0}%, {} to next level)",
        progress.xp,
        progress.threshold,
        progress.percent(),
        progress.remaining
    );
    println!("total {} xp logged", service.total_xp(None));
}

fn print_tasks(service: &SqliteTrackerService<'_>) {
    if service.tasks().is_empty() {
        println!("no tasks");
        return;
    }
    for task in service.tasks() {
        println!(
            "{:>3}  {}  {:>5} xp  {}",
            task.position, task.id, task.xp_value, task.title
        );
    }
}

fn print_day(service: &SqliteTrackerService<'_>, date: NaiveDate) {
    let entries = service.entries_on(date);
    if entries.is_empty() {
        println!("no entries on {date}");
        return;
    }
    for entry in entries {
        println!("{}  {:>5} xp  {}", entry.id, entry.xp_awarded, entry.label);
    }
}

fn print_change(change: &XpChange) {
    println!(
        "{} {:+} xp `{}` on {}",
        change.record.id, change.record.xp_awarded, change.record.label, change.record.occurred_on
    );
    print_level_change(change);
}

fn print_level_change(change: &XpChange) {
    let gained = change.levels_gained();
    if gained > 0 {
        println!("level up! now level {}", change.after.level);
    } else if gained < 0 {
        println!("dropped to level {}", change.after.level);
    }
    println!("level {} with {} xp", change.after.level, change.after.xp);
}

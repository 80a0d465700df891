//! Command-line surface.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "xptrack")]
#[command(version)]
#[command(about = "Track reusable tasks, earn XP and level up")]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "XPTRACK_DB",
        default_value = "xptrack.sqlite3",
        help = "Path to the SQLite tracker database."
    )]
    pub db: PathBuf,

    #[arg(
        short = 'c',
        long,
        env = "XPTRACK_CONFIG",
        default_value = "xptrack.toml",
        help = "Path to the TOML config file. Missing file means defaults."
    )]
    pub config: PathBuf,

    #[arg(long, env = "XPTRACK_LOG_DIR", help = "Absolute directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[arg(long, env = "XPTRACK_LOG_LEVEL", help = "trace|debug|info|warn|error")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Show level and progress toward the next level.")]
    Status,
    #[command(about = "Manage reusable task definitions.")]
    Task(TaskArgs),
    #[command(about = "Report one completion of a task.")]
    Report(ReportArgs),
    #[command(about = "Add or remove ledger entries directly.")]
    Log(LogArgs),
    #[command(about = "List ledger entries of one day.")]
    Day(DayArgs),
    #[command(about = "Show the active days of one month.")]
    Month(MonthArgs),
}

#[derive(Debug, Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommands,
}

#[derive(Debug, Subcommand)]
pub enum TaskCommands {
    #[command(about = "Add a task at the end of the list.")]
    Add {
        title: String,
        #[arg(allow_negative_numbers = true)]
        xp: i64,
    },
    #[command(about = "List tasks in order.")]
    List,
    #[command(about = "Edit title and/or XP of a task.")]
    Edit {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        xp: Option<i64>,
    },
    #[command(about = "Delete a task. Its history is kept.")]
    Rm { id: Uuid },
    #[command(about = "Move a task to a zero-based position.")]
    Move { id: Uuid, position: usize },
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    pub task_id: Uuid,
    #[arg(long, help = "Completion date (YYYY-MM-DD), defaults to today.")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    #[command(subcommand)]
    pub command: LogCommands,
}

#[derive(Debug, Subcommand)]
pub enum LogCommands {
    #[command(about = "Add a free-form entry.")]
    Add {
        label: String,
        #[arg(allow_negative_numbers = true)]
        xp: i64,
        #[arg(long, help = "Entry date (YYYY-MM-DD), defaults to today.")]
        date: Option<NaiveDate>,
    },
    #[command(about = "Delete an entry and reverse its XP.")]
    Rm { id: Uuid },
}

#[derive(Debug, Args)]
pub struct DayArgs {
    #[arg(help = "Date (YYYY-MM-DD), defaults to today.")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct MonthArgs {
    #[arg(value_parser = parse_month, help = "Month (YYYY-MM), defaults to the current month.")]
    pub month: Option<(i32, u32)>,
}

fn parse_month(value: &str) -> Result<(i32, u32), String> {
    let (year, month) = value
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM, got `{value}`"))?;
    let year = year
        .parse::<i32>()
        .map_err(|_| format!("invalid year in `{value}`"))?;
    let month = month
        .parse::<u32>()
        .map_err(|_| format!("invalid month in `{value}`"))?;
    Ok((year, month))
}

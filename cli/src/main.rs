mod list;
mod tui;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use focus_core::input::normalize_submission;
use focus_core::repository::file::default_dir;
use focus_core::{
    AddOutcome, CountdownClock, FileStorage, Priority, TaskId, TaskListStore, CAPACITY_MESSAGE,
};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE_NAME: &str = "focus.log";

#[derive(Parser)]
#[command(name = "focus")]
#[command(about = "Eight tasks and a countdown to midnight", long_about = None)]
struct Cli {
    /// Directory for saved tasks and the TUI log (default: ~/.focus)
    #[arg(long, env = "FOCUS_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "FOCUS_LOG", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Add a task (usage: add Write the report --priority high)
    Add {
        /// low, medium, high or urgent; prefixes work
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// List tasks in display order
    List,
    /// Toggle a task between open and done
    Done { id: TaskId },
    /// Delete a task
    Rm { id: TaskId },
    /// Change a task's priority
    Priority { id: TaskId, level: Priority },
    /// Swap the positions of two tasks
    Swap { source: TaskId, target: TaskId },
    /// Replace a task's text
    Edit {
        id: TaskId,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Print the time left until midnight
    Countdown,
    /// Open the Terminal User Interface
    Tui,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_dir()?,
    };
    let command = cli.command.unwrap_or(Commands::Tui);

    // ratatui owns the terminal in TUI mode, so logs go to a file there.
    let _guard = match command {
        Commands::Tui => Some(init_file_logging(&cli.log_level, &data_dir)?),
        _ => {
            init_stderr_logging(&cli.log_level);
            None
        }
    };

    let storage = FileStorage::new(Some(data_dir))?;
    let mut store = TaskListStore::open(storage);

    match command {
        Commands::Add { priority, text } => {
            let Some(text) = normalize_submission(&text.join(" ")) else {
                println!("Error: Task text is required.");
                return Ok(());
            };
            match store.add(&text) {
                AddOutcome::Added(id) => {
                    if let Some(priority) = priority {
                        store.set_priority(id, priority);
                    }
                    let task = store.get(id).context("added task vanished")?;
                    println!("Task added: {} (ID: {})", task.text, task.id);
                    println!("  Priority: {}", task.priority);
                }
                AddOutcome::CapacityReached => println!("{}", CAPACITY_MESSAGE),
                AddOutcome::EmptyText => println!("Error: Task text is required."),
            }
        }
        Commands::List => {
            list::show_tasks(store.tasks());
        }
        Commands::Done { id } => {
            if store.toggle_completed(id) {
                let done = store.get(id).is_some_and(|t| t.completed);
                println!("Task {} marked {}", id, if done { "done" } else { "open" });
            } else {
                print_missing(id);
            }
        }
        Commands::Rm { id } => {
            if store.remove(id) {
                println!("Task {} deleted", id);
            } else {
                print_missing(id);
            }
        }
        Commands::Priority { id, level } => {
            if store.set_priority(id, level) {
                println!("Task {} priority: {}", id, level);
            } else {
                print_missing(id);
            }
        }
        Commands::Swap { source, target } => {
            if source == target {
                println!("Nothing to swap.");
            } else if store.reorder(source, target) {
                list::show_tasks(store.tasks());
            } else {
                println!("Both tasks must exist to swap them.");
            }
        }
        Commands::Edit { id, text } => {
            if store.set_text(id, text.join(" ")) {
                println!("Task {} updated", id);
            } else {
                print_missing(id);
            }
        }
        Commands::Countdown => {
            let countdown = CountdownClock::new().tick();
            println!("{}  {}", countdown, countdown.date_label);
        }
        Commands::Tui => {
            tui::run(store)?;
        }
    }
    Ok(())
}

fn print_missing(id: TaskId) {
    println!("No task with ID {}", id);
}

fn env_filter(level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
}

fn init_stderr_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(env_filter(level))
        .init();
}

/// The returned guard flushes buffered lines on drop; hold it until exit.
fn init_file_logging(level: &str, dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter(level))
        .with_ansi(false)
        .init();

    Ok(guard)
}

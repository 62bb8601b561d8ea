//! habitual CLI - track habits and their streaks.

use chrono::Local;
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use habitual::{Habit, Periodicity, Store, vacuum};
use log::info;
use std::fs;
use std::path::PathBuf;

mod cli;

use cli::{Cli, Command};

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("habitual")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("habitual.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn get_store_dir(cli: &Cli) -> PathBuf {
    cli.dir
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn format_periodicity(periodicity: Periodicity) -> ColoredString {
    match periodicity {
        Periodicity::Daily => "daily".green(),
        Periodicity::Weekly => "weekly".yellow(),
        Periodicity::Monthly => "monthly".blue(),
    }
}

fn print_habit_line(store: &Store, habit: &Habit) -> Result<()> {
    let streak = store.streak(&habit.id)?;
    println!(
        "{} {} {} {}",
        habit.id.cyan(),
        format_periodicity(habit.periodicity),
        habit.name,
        format!("(current {}, max {})", streak.current, streak.max).dimmed()
    );
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let store_dir = get_store_dir(&cli);

    match cli.command {
        Command::Init => {
            Store::init(&store_dir).context("Failed to initialize habit store")?;
            println!("{} Initialized habit store in {}", "✓".green(), store_dir.display());
        }

        Command::Create { name, periodicity } => {
            let mut store = Store::open(&store_dir).context("Failed to open store")?;
            let habit = store
                .create_habit(&name, periodicity)
                .context("Failed to create habit")?;

            println!(
                "{} Created: {} {} ({})",
                "✓".green(),
                habit.id.cyan(),
                habit.name,
                format_periodicity(habit.periodicity)
            );
        }

        Command::Edit { id, name, periodicity } => {
            let mut store = Store::open(&store_dir).context("Failed to open store")?;
            let periodicity = match periodicity {
                Some(periodicity) => periodicity,
                None => store.require(&id).context("Failed to edit habit")?.periodicity,
            };
            let habit = store
                .edit_habit(&id, &name, periodicity)
                .context("Failed to edit habit")?;

            println!(
                "{} Updated: {} {} ({}), progress reset",
                "✓".green(),
                habit.id.cyan(),
                habit.name,
                format_periodicity(habit.periodicity)
            );
        }

        Command::Delete { id } => {
            let mut store = Store::open(&store_dir).context("Failed to open store")?;
            if store.delete_habit(&id).context("Failed to delete habit")? {
                println!("{} Deleted: {}", "✓".green(), id.cyan());
            } else {
                println!("{}", format!("No habit with id {}", id).dimmed());
            }
        }

        Command::Complete { id, date } => {
            let mut store = Store::open(&store_dir).context("Failed to open store")?;
            let day = date.unwrap_or_else(|| Local::now().date_naive());
            let midnight = day.and_hms_opt(0, 0, 0).unwrap_or_default();

            store.complete(&id, midnight).context("Failed to complete task")?;
            let streak = store.streak(&id).context("Failed to compute streak")?;

            println!(
                "{} Completed {} for {} (current streak {})",
                "✓".green(),
                id.cyan(),
                day,
                streak.current
            );
        }

        Command::List { periodicity } => {
            let store = Store::open(&store_dir).context("Failed to open store")?;
            let habits = store.list(periodicity).context("Failed to list habits")?;

            if habits.is_empty() {
                println!("{}", "No habits found".dimmed());
            } else {
                for habit in &habits {
                    print_habit_line(&store, habit)?;
                }
            }
        }

        Command::Show { id } => {
            let store = Store::open(&store_dir).context("Failed to open store")?;
            let habit = store.require(&id).context("Failed to get habit")?;

            print_habit_line(&store, &habit)?;
            println!(
                "  Created: {}",
                habit.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            );

            let tasks = store.tasks(&id).context("Failed to load tasks")?;
            if tasks.is_empty() {
                println!("  {}", "No tasks recorded".dimmed());
            }
            for task in tasks {
                let status = if task.completed {
                    "completed".green()
                } else {
                    "pending".yellow()
                };
                let completed_at = task
                    .completed_at
                    .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "n/a".to_string());
                println!(
                    "  {} {} {}",
                    task.date.format("%Y-%m-%d"),
                    status,
                    format!("at {}", completed_at).dimmed()
                );
            }
        }

        Command::Longest => {
            let store = Store::open(&store_dir).context("Failed to open store")?;
            let longest = store.longest_streak().context("Failed to compute streaks")?;

            match longest.name {
                Some(name) => println!(
                    "{} Longest current streak: {} period(s) ({})",
                    "→".blue(),
                    longest.current,
                    name
                ),
                None => println!("{}", "No habits found".dimmed()),
            }
        }

        Command::Vacuum => {
            let result = vacuum(&store_dir).context("Failed to vacuum store")?;
            println!(
                "{} Vacuumed: {} habit(s), {} task(s), {} -> {} bytes",
                "✓".green(),
                result.habit_count,
                result.task_count,
                result.size_before,
                result.size_after
            );
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    info!("Command: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

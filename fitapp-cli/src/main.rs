use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::debug;

use fitapp::catalog::{MemoryCatalog, WorkoutTemplate, find_template, load_templates};
use fitapp::clock::SystemClock;
use fitapp::db::{self, SqliteStorage};
use fitapp::logging::{init_logger, parse_level};
use fitapp::session::{CompletionSummary, HistoryRecord, Session, SessionManager, SetField};
use fitapp::store;
use fitapp::timer::format_elapsed;

mod tui;

pub type Manager = SessionManager<SqliteStorage, SystemClock>;

#[derive(Parser, Debug)]
#[command(version, about = "FitApp - Workout Session CLI", long_about = None)]
struct Args {
    /// SQLite database path. Falls back to DATABASE_URL, then fitapp.db
    #[arg(long, global = true)]
    db: Option<String>,
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a workout from a saved template or a template JSON file
    Start {
        workout_id: Option<String>,
        #[arg(short, long, conflicts_with = "workout_id")]
        file: Option<PathBuf>,
    },
    /// Show the active workout
    Status,
    /// Jump to an exercise (1-based)
    Select {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        exercise: u64,
    },
    /// Enter weight and/or reps for a set; an empty value clears it
    Set {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        exercise: u64,
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        set: u64,
        #[arg(short, long, allow_hyphen_values = true)]
        weight: Option<String>,
        #[arg(short, long, allow_hyphen_values = true)]
        reps: Option<String>,
    },
    /// Mark a set done, or undo it
    Toggle {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        exercise: u64,
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        set: u64,
    },
    /// Append a set to an exercise
    AddSet {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        exercise: u64,
    },
    /// Move a set to another position within its exercise
    MoveSet {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        exercise: u64,
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        from: u64,
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        to: u64,
    },
    /// Finish the workout and save it to history
    Finish,
    /// Throw the workout away
    Discard,
    /// List finished workouts, newest first
    History {
        #[arg(short, long)]
        verbose: bool,
    },
    /// List saved workout templates
    Templates,
    /// Interactive active-workout view with live timers
    Run,
}

fn index(position: u64) -> usize {
    (position - 1) as usize
}

fn format_weight(weight: Option<f64>) -> String {
    weight.map(|w| format!("{}kg", w)).unwrap_or_else(|| "—".to_string())
}

fn print_session(session: &Session, elapsed: Duration) {
    println!("Workout {} · {}", session.workout_id, format_elapsed(elapsed));
    if session.exercises.is_empty() {
        println!("  (no exercises)");
    }
    for (idx, entry) in session.exercises.iter().enumerate() {
        let marker = if idx == session.current_exercise_index {
            ">"
        } else {
            " "
        };
        let done = if entry.is_completed() { " ✓" } else { "" };
        println!(
            "{} {}. {} ({}){} - {}",
            marker,
            idx + 1,
            entry.exercise.name,
            entry.exercise.muscle_group,
            done,
            entry.set_progress()
        );
        for (set_idx, set) in entry.sets.iter().enumerate() {
            let reps = set
                .actual_reps
                .map(|r| r.to_string())
                .unwrap_or_else(|| format!("({})", set.rep_placeholder()));
            println!(
                "      {}. {} x {} [{}]",
                set_idx + 1,
                format_weight(set.actual_weight),
                reps,
                if set.completed { "x" } else { " " }
            );
        }
    }
}

fn print_summary(record: &HistoryRecord) {
    let summary = CompletionSummary::from(record);
    println!("Workout complete!");
    println!("  Duration:       {}", summary.duration);
    println!("  Volume:         {} kg", summary.total_volume);
    println!("  Total reps:     {}", summary.total_reps);
    println!("  Exercises:      {}", summary.exercise_count);
    println!("  Sets completed: {}", summary.completed_sets);
    if !summary.muscle_groups.is_empty() {
        println!("  Muscles:        {}", summary.muscle_groups.join(", "));
    }
}

fn load_template(storage: &SqliteStorage, workout_id: Option<String>, file: Option<PathBuf>) -> Result<WorkoutTemplate> {
    if let Some(path) = file {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read template file {}", path.display()))?;
        return serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse template file {}", path.display()));
    }
    let workout_id = workout_id.ok_or_else(|| anyhow!("Give a workout id or --file"))?;
    find_template(storage, &workout_id)?
        .ok_or_else(|| anyhow!("No saved workout with id {}", workout_id))
}

fn print_active(manager: &Manager) -> Result<()> {
    print_session(manager.session()?, manager.elapsed_time()?);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let level = parse_level(&args.log_level)
        .ok_or_else(|| anyhow!("Unknown log level: {}", args.log_level))?;
    init_logger(level);

    if let Some(path) = &args.db {
        db::set_db_path(path)?;
    }
    debug!("Using database {}", db::db_path());
    let storage = SqliteStorage::open_default()?;
    let mut manager = SessionManager::open(storage, SystemClock)?;

    match args.command {
        Commands::Start { workout_id, file } => {
            let template = load_template(manager.storage(), workout_id, file)?;
            if let Some(previous) = manager.active() {
                println!(
                    "Replacing unfinished workout {} (its progress is not saved)",
                    previous.workout_id
                );
            }
            let catalog = MemoryCatalog::load(manager.storage())?;
            manager.start_with_catalog(&template, &catalog)?;
            print_active(&manager)
        }
        Commands::Status => match manager.active() {
            Some(_) => print_active(&manager),
            None => {
                println!("No active workout. Start one with `fitapp start <workout-id>`.");
                Ok(())
            }
        },
        Commands::Select { exercise } => {
            manager.select_exercise(index(exercise))?;
            print_active(&manager)
        }
        Commands::Set {
            exercise,
            set,
            weight,
            reps,
        } => {
            if weight.is_none() && reps.is_none() {
                return Err(anyhow!("Nothing to set: pass --weight and/or --reps"));
            }
            if let Some(raw) = weight {
                manager.update_set_field(index(exercise), index(set), SetField::Weight, &raw)?;
            }
            if let Some(raw) = reps {
                manager.update_set_field(index(exercise), index(set), SetField::Reps, &raw)?;
            }
            print_active(&manager)
        }
        Commands::Toggle { exercise, set } => {
            manager.toggle_set_completion(index(exercise), index(set))?;
            print_active(&manager)
        }
        Commands::AddSet { exercise } => {
            manager.add_set(index(exercise))?;
            print_active(&manager)
        }
        Commands::MoveSet { exercise, from, to } => {
            manager.move_set(index(exercise), index(from), index(to))?;
            print_active(&manager)
        }
        Commands::Finish => {
            let record = manager.finish()?;
            print_summary(&record);
            Ok(())
        }
        Commands::Discard => {
            manager.discard()?;
            println!("Workout discarded");
            Ok(())
        }
        Commands::History { verbose } => {
            let records = store::history(manager.storage())?;
            if records.is_empty() {
                println!("No finished workouts yet");
            }
            for record in records {
                let summary = CompletionSummary::from(&record);
                println!(
                    "{}  {}  {}  {} kg  {} reps",
                    record.ended_at.format("%Y-%m-%d %H:%M"),
                    record.workout_id,
                    summary.duration,
                    summary.total_volume,
                    summary.total_reps
                );
                if verbose {
                    for entry in &record.exercises {
                        for set in entry.sets.iter().filter(|s| s.completed) {
                            println!(
                                "\t{}: {} x {}",
                                entry.exercise.name,
                                format_weight(set.actual_weight),
                                set.actual_reps
                                    .map(|r| r.to_string())
                                    .unwrap_or_else(|| "—".to_string())
                            );
                        }
                    }
                }
            }
            Ok(())
        }
        Commands::Templates => {
            let templates = load_templates(manager.storage())?;
            if templates.is_empty() {
                println!("No saved workouts");
            }
            for template in templates {
                println!(
                    "{}, {} ({} exercises)",
                    template.id,
                    template.name,
                    template.exercises.len()
                );
            }
            Ok(())
        }
        Commands::Run => {
            if manager.active().is_none() {
                println!("No active workout. Start one with `fitapp start <workout-id>`.");
                return Ok(());
            }
            let terminal = ratatui::init();
            let result = tui::run_active_workout(terminal, &mut manager).await;
            ratatui::restore();

            match result? {
                tui::Outcome::Finished(record) => print_summary(&record),
                tui::Outcome::Discarded => println!("Workout discarded"),
                tui::Outcome::Left => println!("Workout still in progress; resume with `fitapp run`"),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn set_accepts_empty_and_negative_raw_values() {
        let args = Args::try_parse_from(["fitapp", "set", "1", "2", "--weight", "", "--reps", "-3"])
            .unwrap();
        match args.command {
            Commands::Set {
                exercise,
                set,
                weight,
                reps,
            } => {
                assert_eq!((index(exercise), index(set)), (0, 1));
                assert_eq!(weight.as_deref(), Some(""));
                assert_eq!(reps.as_deref(), Some("-3"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn positions_are_one_based() {
        assert!(Args::try_parse_from(["fitapp", "select", "0"]).is_err());
        assert!(Args::try_parse_from(["fitapp", "start", "wo_1", "--file", "x.json"]).is_err());
        let args = Args::try_parse_from(["fitapp", "--db", "/tmp/f.db", "status"]).unwrap();
        assert_eq!(args.db.as_deref(), Some("/tmp/f.db"));
        assert_eq!(args.log_level, "warn");
    }
}

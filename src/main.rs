use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use courseplan_lib::config::{self, ImportConfig};
use courseplan_lib::db::{
    self, repository, DatabaseError, EventStore, MemoryEventStore, SqliteEventStore,
};
use courseplan_lib::models::{CalendarEvent, SourceDocument};
use courseplan_lib::pipeline::inference::InferenceError;
use courseplan_lib::{build_importer, ImportError, ImportReport};

#[derive(Parser)]
#[command(name = "courseplan", version, about = "Import course deadlines into your calendar")]
struct Cli {
    /// SQLite database (defaults to ~/Courseplan/events.db)
    #[arg(long, env = "COURSEPLAN_DB", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract deadlines from a syllabus or assignment sheet
    Import {
        /// PDF, DOCX or TXT file
        file: PathBuf,
        #[arg(long)]
        owner: String,
        /// Override the configured model
        #[arg(long)]
        model: Option<String>,
        /// Declared media type (guessed from the extension otherwise)
        #[arg(long)]
        mime: Option<String>,
        /// Print the events without saving them
        #[arg(long)]
        dry_run: bool,
    },
    /// Inspect or remove imported events
    Events {
        #[command(subcommand)]
        command: EventsCommand,
    },
}

#[derive(Subcommand)]
enum EventsCommand {
    /// List events by date
    List {
        #[arg(long)]
        owner: String,
        /// Only this day (YYYY-MM-DD), ordered by time
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete all events for one course
    ClearCourse {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        course: String,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] InferenceError),

    #[error("{0}")]
    Database(#[from] DatabaseError),

    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}", .0.user_message())]
    Import(#[from] ImportError),
}

fn main() -> ExitCode {
    courseplan_lib::init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let db_path = cli.db.unwrap_or_else(config::default_database_path);

    match cli.command {
        Command::Import {
            file,
            owner,
            model,
            mime,
            dry_run,
        } => import(&file, &owner, model, mime, dry_run, db_path),
        Command::Events { command } => {
            let store = SqliteEventStore::new(db::open_database(&db_path)?);
            match command {
                EventsCommand::List { owner, date } => {
                    let events = store.with_connection(|conn| match date {
                        Some(day) => repository::get_events_on_date(conn, &owner, day),
                        None => repository::get_events_for_owner(conn, &owner),
                    })?;
                    if events.is_empty() {
                        println!("No events.");
                    }
                    for event in &events {
                        print_event(event);
                    }
                    Ok(())
                }
                EventsCommand::ClearCourse { owner, course } => {
                    let removed = store.with_connection(|conn| {
                        repository::delete_events_by_course(conn, &owner, &course)
                    })?;
                    println!("Removed {removed} event(s) for {course}.");
                    Ok(())
                }
            }
        }
    }
}

fn import(
    file: &Path,
    owner: &str,
    model: Option<String>,
    mime: Option<String>,
    dry_run: bool,
    db_path: PathBuf,
) -> Result<(), CliError> {
    let mut import_config = ImportConfig::from_env()?;
    if let Some(model) = model {
        import_config.model = model;
    }

    let bytes = std::fs::read(file).map_err(|source| CliError::Read {
        path: file.to_path_buf(),
        source,
    })?;
    let mime = mime.unwrap_or_else(|| {
        mime_guess::from_path(file)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    });
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    let document = SourceDocument::from_mime(name, &mime, bytes);

    let store: Arc<dyn EventStore + Send + Sync> = if dry_run {
        Arc::new(MemoryEventStore::new())
    } else {
        Arc::new(SqliteEventStore::new(db::open_database(&db_path)?))
    };
    let importer = build_importer(&import_config, store);

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(document.name().to_string());

    let result = importer.process_document(&document, owner, &mut |p| {
        pb.set_position(u64::from(p));
    });

    match result {
        Ok(report) => {
            pb.finish_and_clear();
            print_report(&report, dry_run);
            Ok(())
        }
        Err(e) => {
            pb.abandon_with_message(format!("failed ({})", e.kind().as_str()));
            Err(e.into())
        }
    }
}

fn print_report(report: &ImportReport, dry_run: bool) {
    let verb = if dry_run { "Found" } else { "Imported" };
    println!(
        "{verb} {} event(s) for {} from {} chunk(s).",
        report.created_count(),
        report.course,
        report.chunks_sent
    );
    for event in &report.events {
        print_event(event);
    }
    if !report.skipped.is_empty() {
        println!("Skipped {} line(s):", report.skipped_count());
        for skipped in &report.skipped {
            println!("  {:<40}  ({})", skipped.line, skipped.reason);
        }
    }
}

fn print_event(event: &CalendarEvent) {
    println!(
        "{} {}  {:<40}  [{}]",
        event.date,
        event.time_label(),
        event.title,
        event.course
    );
}

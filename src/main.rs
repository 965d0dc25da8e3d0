use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;

use herdbook::api::headers::MemoryTokenStore;
use herdbook::api::keyring;
use herdbook::api::notify::{Level, Notifier};
use herdbook::config::{ApiConfig, ConfigError};
use herdbook::core::normalize::{self, LenientEnum};
use herdbook::core::note::{NoteDraft, NoteStatus};
use herdbook::core::priority::Priority;
use herdbook::{ApiClient, ApiError, ListQuery};

#[derive(Parser)]
#[command(name = "herdbook", version, about = "Herd management API client")]
struct Cli {
    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Notes attached to an animal
    #[command(subcommand)]
    Notes(NotesCommand),
    /// Scheduled tasks
    #[command(subcommand)]
    Tasks(TasksCommand),
    /// Animal activity history
    #[command(subcommand)]
    Activities(ActivitiesCommand),
    /// Bearer token stored in the system keyring
    #[command(subcommand)]
    Token(TokenCommand),
}

#[derive(Subcommand)]
enum NotesCommand {
    List {
        animal_id: String,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        per_page: Option<u32>,
        /// Comma-separated field names
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    Show {
        id: String,
    },
    Add {
        animal_id: String,
        #[arg(long)]
        content: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,
        #[arg(long, value_parser = parse_enum::<Priority>, default_value = "medium")]
        priority: Priority,
        #[arg(long, value_parser = parse_enum::<NoteStatus>, default_value = "pending")]
        status: NoteStatus,
        /// Due date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        calendar: bool,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum TasksCommand {
    List {
        #[arg(long)]
        animal: Option<String>,
    },
    Show {
        id: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum ActivitiesCommand {
    List { animal_id: String },
    Show { id: String },
    Delete { id: String },
}

#[derive(Subcommand)]
enum TokenCommand {
    Set { token: String },
    Clear,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Already shown to the user by the notifier.
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Other(String),
}

fn parse_enum<E: LenientEnum>(raw: &str) -> Result<E, String> {
    E::parse(raw).ok_or_else(|| format!("expected one of: {}", E::allowed()))
}

/// Prints user-facing notifications to stderr, keeping stdout for JSON.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: Level, message: &str) {
        match level {
            Level::Success => eprintln!("ok: {}", message),
            Level::Error => eprintln!("error: {}", message),
        }
    }
}

fn init_logging(debug: bool) {
    // Journal logging (`journalctl --user -t herdbook -f`).
    // herdbook targets at info/debug, everything else at warn.
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("herdbook") {
                let max = if herdbook::debug_logging() { log::LevelFilter::Debug } else { log::LevelFilter::Info };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    herdbook::set_debug_logging(debug);

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(j) => j.with_syslog_identifier("herdbook".to_string()),
        Err(e) => {
            eprintln!("herdbook: journal logging unavailable: {}", e);
            return;
        }
    };
    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so herdbook debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Other(format!("Failed to format output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ApiConfig::load()?;
    init_logging(cli.debug || config.debug_logging);

    if let Command::Token(cmd) = &cli.command {
        return match cmd {
            TokenCommand::Set { token } => keyring::store_token(&config.api_url, token)
                .await
                .map_err(CliError::Other),
            TokenCommand::Clear => keyring::delete_token(&config.api_url)
                .await
                .map_err(CliError::Other),
        };
    }

    let token = match keyring::load_token(&config.api_url).await {
        Ok(token) => token,
        Err(e) => {
            log::warn!("No token loaded from keyring: {}", e);
            None
        }
    };
    let client = ApiClient::new(
        config,
        Arc::new(MemoryTokenStore::new(token)),
        Arc::new(ConsoleNotifier),
    )
    .map_err(|e| CliError::Other(e.to_string()))?;

    match cli.command {
        Command::Notes(cmd) => match cmd {
            NotesCommand::List {
                animal_id,
                page,
                per_page,
                fields,
            } => {
                let query = ListQuery {
                    page,
                    per_page,
                    fields,
                    ..ListQuery::default()
                };
                print_json(&client.fetch_notes(&animal_id, &query).await?)
            }
            NotesCommand::Show { id } => print_json(&client.fetch_note(&id).await?),
            NotesCommand::Add {
                animal_id,
                content,
                category,
                keywords,
                priority,
                status,
                due,
                calendar,
            } => {
                let draft = NoteDraft {
                    content,
                    category,
                    keywords,
                    add_to_calendar: calendar,
                    priority,
                    status,
                    due_date: due.as_deref().map(normalize::normalize_date).unwrap_or_else(normalize::today),
                };
                print_json(&client.create_note(&animal_id, &draft).await?)
            }
            NotesCommand::Delete { id } => Ok(client.delete_note(&id).await?),
        },
        Command::Tasks(cmd) => match cmd {
            TasksCommand::List { animal } => print_json(&client.fetch_tasks(animal.as_deref()).await?),
            TasksCommand::Show { id } => print_json(&client.fetch_task(&id).await?),
            TasksCommand::Delete { id } => Ok(client.delete_task(&id).await?),
        },
        Command::Activities(cmd) => match cmd {
            ActivitiesCommand::List { animal_id } => {
                print_json(&client.fetch_activities(&animal_id).await?)
            }
            ActivitiesCommand::Show { id } => print_json(&client.fetch_activity(&id).await?),
            ActivitiesCommand::Delete { id } => Ok(client.delete_activity(&id).await?),
        },
        Command::Token(_) => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        // The notifier already reported it.
        Err(CliError::Api(_)) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("herdbook: {}", e);
            ExitCode::FAILURE
        }
    }
}

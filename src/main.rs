mod app;
mod export;
mod gateway;
mod models;
mod resolver;
mod store;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use app::{App, CaptureSource, EditPatch};
use gateway::GeminiClient;
use models::{JobRecord, JobStatus};
use store::{RecordStore, SqliteStore};

#[derive(Parser)]
#[command(name = "jobtrail")]
#[command(about = "Personal job-application tracker - capture postings, follow them through the pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a job posting
    Capture {
        #[command(subcommand)]
        source: CaptureCommands,
    },

    /// List captured records
    List {
        /// Filter by title or company substring
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by status (captured, applied, interview, rejected)
        #[arg(long)]
        status: Option<JobStatus>,
    },

    /// Show record details
    Show {
        /// Record ID
        id: String,
    },

    /// Edit fields of a record
    Edit {
        /// Record ID
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        salary: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// New status (captured, applied, interview, rejected)
        #[arg(long)]
        status: Option<JobStatus>,
    },

    /// Delete a record permanently
    Delete {
        /// Record ID
        id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Export all records to CSV
    Export {
        /// Output file (default: job_applications_<date>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CaptureCommands {
    /// Capture from a posting URL
    Url {
        url: String,

        /// Network-augmented extraction; may fail, where the default
        /// URL-only inference never does
        #[arg(long)]
        advanced: bool,
    },

    /// Capture from pasted text
    Text {
        /// Posting text (or use --file)
        text: Option<String>,

        /// Read the posting text from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Source URL, stored on the record and used as a company hint
        #[arg(long)]
        url: Option<String>,
    },

    /// Capture from a screenshot
    Image {
        /// Path to the screenshot file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let blob = SqliteStore::open()?;
    let store = RecordStore::load(Box::new(blob))?;
    let mut app = App::new(store);

    match cli.command {
        Commands::Capture { source } => {
            let gateway = GeminiClient::new()?;
            let source = match source {
                CaptureCommands::Url { url, advanced } => {
                    if advanced {
                        CaptureSource::UrlAdvanced { url }
                    } else {
                        CaptureSource::UrlBasic { url }
                    }
                }
                CaptureCommands::Text { text, file, url } => {
                    let text = match (text, file) {
                        (_, Some(path)) => std::fs::read_to_string(&path).with_context(|| {
                            format!("Failed to read text file: {}", path.display())
                        })?,
                        (Some(text), None) => text,
                        (None, None) => bail!("Provide the posting text or --file"),
                    };
                    CaptureSource::Text { text, url }
                }
                CaptureCommands::Image { path } => CaptureSource::Image {
                    base64: read_image_base64(&path)?,
                },
            };

            let record = app.capture(&gateway, source).context(
                "Capture failed. Retry, or use another capture method (pasted text always works)",
            )?;
            println!("Captured: {} @ {}", record.title, record.company);
            println!("ID: {}", record.id);
        }

        Commands::List { search, status } => {
            let matched: Vec<&JobRecord> = match &search {
                Some(query) => app.store().search(query),
                None => app.store().records().iter().collect(),
            };
            let matched: Vec<&JobRecord> = matched
                .into_iter()
                .filter(|r| status.is_none_or(|s| r.status == s))
                .collect();

            if matched.is_empty() {
                println!("No records found.");
            } else {
                println!(
                    "{:<26} {:<10} {:<28} {:<20} {:<10}",
                    "ID", "STATUS", "TITLE", "COMPANY", "CAPTURED"
                );
                println!("{}", "-".repeat(96));
                for record in matched {
                    let day = record
                        .date_captured
                        .get(..10)
                        .unwrap_or(&record.date_captured);
                    println!(
                        "{:<26} {:<10} {:<28} {:<20} {:<10}",
                        record.id,
                        record.status,
                        truncate(&record.title, 26),
                        truncate(&record.company, 18),
                        day
                    );
                }
            }
        }

        Commands::Show { id } => match app.store().find(&id) {
            Some(record) => {
                println!("Record {}", record.id);
                println!("Title: {}", record.title);
                println!("Company: {}", record.company);
                if !record.location.is_empty() {
                    println!("Location: {}", record.location);
                }
                if !record.salary.is_empty() {
                    println!("Salary: {}", record.salary);
                }
                if !record.url.is_empty() {
                    println!("URL: {}", record.url);
                }
                println!("Status: {}", record.status);
                println!("Captured: {}", record.date_captured);
                if !record.requirements.is_empty() {
                    println!("Requirements:");
                    for item in &record.requirements {
                        println!("  - {}", item);
                    }
                }
                if !record.description.is_empty() {
                    println!("\n--- Description ---\n{}", record.description);
                }
            }
            None => {
                println!("Record '{}' not found.", id);
            }
        },

        Commands::Edit {
            id,
            title,
            company,
            location,
            salary,
            url,
            description,
            status,
        } => {
            let patch = EditPatch {
                title,
                company,
                location,
                salary,
                url,
                description,
                status,
            };
            if patch.is_empty() {
                println!("Nothing to change. Pass at least one field flag (see --help).");
            } else {
                match app.edit(&id, patch)? {
                    Some(record) => {
                        println!("Updated: {} @ {} [{}]", record.title, record.company, record.status);
                    }
                    None => {
                        println!("Record '{}' not found.", id);
                    }
                }
            }
        }

        Commands::Delete { id, yes } => {
            if app.store().find(&id).is_none() {
                println!("Record '{}' not found.", id);
            } else if yes || confirm(&format!("Permanently delete record {}?", id))? {
                app.delete(&id)?;
                println!("Deleted record {}.", id);
            } else {
                println!("Aborted.");
            }
        }

        Commands::Export { output } => {
            let path = output.unwrap_or_else(|| PathBuf::from(export::default_filename()));
            let records = app.store().records();
            export::export_to_file(records, &path)?;
            println!("Exported {} record(s) to {}", records.len(), path.display());
        }
    }

    Ok(())
}

fn read_image_base64(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image file: {}", path.display()))?;
    Ok(STANDARD.encode(bytes))
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

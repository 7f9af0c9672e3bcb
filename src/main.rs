use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use daybrief::brief::{
    export, AggregationRunner, CategoryLists, CategoryResult, ExportOutcome, Outcome, Progress,
    RunState, SelfSelectedCategory, ShareTarget, SummaryFetcher,
};
use daybrief::config::Config;
use daybrief::share::{CommandClipboard, CommandShare};
use daybrief::storage::{
    list_briefs, save_brief, save_categories, Database, DatabaseError, KeyValueStore,
};
use daybrief::util::strip_control_chars;

/// Get the config directory path (~/.config/daybrief/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("daybrief"))
}

fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "daybrief", about = "Daily news brief from your chosen categories")]
struct Args {
    /// Database file (defaults to ~/.config/daybrief/daybrief.db)
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print today's brief
    Run {
        /// Save the brief after it loads
        #[arg(long)]
        save: bool,

        /// Share the brief, or copy it to the clipboard when no share command is configured
        #[arg(long)]
        share: bool,
    },

    /// List saved briefs
    Briefs,

    /// Replace the stored category lists
    Categories {
        /// Reliable categories, comma separated
        #[arg(long, value_delimiter = ',')]
        reliable: Vec<String>,

        /// Self-selected categories, comma separated
        #[arg(long = "self", value_delimiter = ',')]
        self_selected: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    ensure_config_dir(&config_dir)?;

    let config = match Config::load(&config_dir.join("config.toml")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {}, using defaults", e);
            Config::default()
        }
    }
    .with_env_overrides();

    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| config_dir.join("daybrief.db"));
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of daybrief appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };
    let store: Arc<dyn KeyValueStore> = Arc::new(db);

    match args.command.unwrap_or(Command::Run {
        save: false,
        share: false,
    }) {
        Command::Run { save, share } => run_brief(&config, store, save, share).await,
        Command::Briefs => print_saved_briefs(store.as_ref()).await,
        Command::Categories {
            reliable,
            self_selected,
        } => {
            let lists = CategoryLists {
                reliable: clean_list(reliable),
                self_selected: clean_list(self_selected)
                    .into_iter()
                    .map(SelfSelectedCategory::titled)
                    .collect(),
            };
            save_categories(store.as_ref(), &lists)
                .await
                .context("Failed to save categories")?;
            println!(
                "Saved {} reliable and {} self-selected categories.",
                lists.reliable.len(),
                lists.self_selected.len()
            );
            Ok(())
        }
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

async fn run_brief(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    save: bool,
    share: bool,
) -> Result<()> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("daybrief/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    let fetcher = SummaryFetcher::new(client, &config.endpoint)
        .context("Invalid summary endpoint")?
        .with_timeout(config.request_timeout());

    let (progress_tx, mut progress_rx) = mpsc::channel::<Progress>(32);
    let indicator = tokio::spawn(async move {
        let mut stderr = std::io::stderr();
        while let Some(progress) = progress_rx.recv().await {
            match progress {
                Progress::Started => {
                    let _ = write!(stderr, "Loading brief");
                }
                Progress::Advanced { .. } => {
                    let _ = write!(stderr, ".");
                }
                Progress::Finished => {
                    let _ = writeln!(stderr);
                }
            }
            let _ = stderr.flush();
        }
    });

    let mut runner = AggregationRunner::new(store.clone(), fetcher).with_progress(progress_tx);
    runner.on_activate().await;
    let state = runner.state();
    let results = runner.results().to_vec();
    // Dropping the runner closes the progress channel
    drop(runner);
    let _ = indicator.await;

    println!("{}", Local::now().format("%A, %B %-d, %Y"));
    println!("Your Daily Brief");
    println!();

    if state == RunState::Settled(Outcome::Aborted) {
        eprintln!("Error fetching summaries. Check the endpoint and try again.");
    }
    print!("{}", format_results(&results));

    if save {
        match save_brief(store.as_ref(), &results).await {
            Ok(_) => println!("Brief saved."),
            Err(e) => eprintln!("Failed to save brief: {}", e),
        }
    }

    if share {
        let target = CommandShare::new(config.share_command.clone());
        let clipboard = CommandClipboard::detect();
        let outcome = export(
            &results,
            target.as_ref().map(|t| t as &dyn ShareTarget),
            &clipboard,
            config.share_url.as_deref(),
        )
        .await;
        match outcome {
            Ok(ExportOutcome::CopiedToClipboard) => println!("Brief copied to clipboard."),
            Ok(ExportOutcome::Shared) => println!("Brief shared."),
            Ok(ExportOutcome::ShareFailed) => eprintln!("Sharing failed."),
            Err(e) => eprintln!("{}", e),
        }
    }

    Ok(())
}

/// Plain-text rendering of a brief: category, summary, then each item's
/// title (with link) and content, indented.
fn format_results(results: &[CategoryResult]) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    for result in results {
        let _ = writeln!(out, "{}", strip_control_chars(&result.category));
        let _ = writeln!(out, "{}", strip_control_chars(&result.summary));
        for item in &result.items {
            match &item.link {
                Some(link) => {
                    let _ = writeln!(
                        out,
                        "  - {} ({})",
                        strip_control_chars(&item.title),
                        strip_control_chars(link)
                    );
                }
                None => {
                    let _ = writeln!(out, "  - {}", strip_control_chars(&item.title));
                }
            }
            let content = strip_control_chars(&item.content);
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                let _ = writeln!(out, "    {}", line.trim_end());
            }
        }
        out.push('\n');
    }
    out
}

async fn print_saved_briefs(store: &dyn KeyValueStore) -> Result<()> {
    let briefs = list_briefs(store)
        .await
        .context("Failed to load saved briefs")?;
    if briefs.is_empty() {
        println!("No saved briefs.");
        return Ok(());
    }
    for brief in &briefs {
        println!("{}  {} categories", brief.date, brief.data.len());
    }
    Ok(())
}

use anyhow::Context;
use clap::Parser;
use config::{load_env_file, PathManager, Settings};
use llm::OpenAIProvider;
use recap_core::{Bot, LlmSummarizer, SelectionDialogue, SqliteStore, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;

mod console;
mod logging;

use console::Console;

#[derive(Parser, Debug)]
#[command(author, version, about = "Group chat digest bot on a local console", long_about = None)]
struct Args {
    /// Chat model used for summaries
    #[arg(long, env = "RECAP_MODEL")]
    model: Option<String>,

    /// Custom base URL for OpenAI API (e.g., for proxy or compatible services)
    #[arg(long, env = "OPENAI_BASE_URL")]
    openai_url: Option<String>,

    /// SQLite database file
    #[arg(long, env = "RECAP_DB_PATH")]
    db: Option<PathBuf>,

    /// Data directory for the database, settings and logs
    #[arg(long, env = "RECAP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Upper bound on a single summary, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Language the summaries are written in
    #[arg(long)]
    language: Option<String>,

    /// Write logs to the data directory instead of stderr
    #[arg(long)]
    log_file: bool,

    #[arg(long, short)]
    tracing: bool,

    /// Persist the effective settings to settings.toml
    #[arg(long)]
    save_settings: bool,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if let Some(url) = &self.openai_url {
            settings.openai_base_url = Some(url.clone());
        }
        if let Some(db) = &self.db {
            settings.database_path = Some(db.clone());
        }
        if let Some(secs) = self.timeout_secs {
            settings.summary_timeout_secs = secs;
        }
        if let Some(language) = &self.language {
            settings.summary_language = language.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env_file();
    let args = Args::parse();

    if let Some(dir) = &args.data_dir {
        PathManager::set_data_dir(dir.clone());
    }
    let _log_guard = logging::init_logging(args.log_file, args.tracing);

    let mut settings = Settings::load();
    settings.apply_env();
    args.apply(&mut settings);
    if args.save_settings {
        if let Err(e) = settings.save() {
            tracing::warn!("Failed to save settings: {}", e);
        }
    }

    let api_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;
    let provider = match &settings.openai_base_url {
        Some(url) => OpenAIProvider::new(url, &api_key)?,
        None => OpenAIProvider::default(&api_key)?,
    };
    let summarizer = LlmSummarizer::new(provider.create_chat_model(&settings.model))
        .with_language(settings.summary_language.clone())
        .with_max_tokens(settings.max_summary_tokens)
        .with_temperature(settings.temperature);

    let db_path = settings
        .resolved_database_path()
        .context("Could not determine database path; pass --db")?;
    let store = Arc::new(
        SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?,
    );
    tracing::info!(
        model = %settings.model,
        db = %db_path.display(),
        "Starting recap console"
    );

    let dialogue = SelectionDialogue::new(store.clone(), Arc::new(SystemClock), Arc::new(summarizer))
        .with_summary_timeout(settings.summary_timeout())
        .with_progress(console::progress_hook())
        .with_recent_limit(settings.recent_limit);
    let bot = Arc::new(Bot::new(store, dialogue));

    Console::new(bot).run().await
}

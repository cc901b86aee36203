use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rw_core::{Error, HttpFetcher, PageFetcher, Result, Source};
use rw_inference::{create_model, ModelKind, SummaryFetcher};
use rw_monitors::logging::init_logging;
use rw_monitors::manager::retention_window;
use rw_monitors::{all_monitors, handle_command, InsightsHandler, MonitorArgs, MonitorManager};
use rw_storage::{create_stores, StorageKind};
use tracing::info;

mod bot;
mod config;
mod telegram;

use config::Settings;
use telegram::TelegramTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_value = false;

        for c in s.trim().chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
                continue;
            }
            if c.is_whitespace() {
                continue;
            }
            let num = current_number
                .parse::<u64>()
                .map_err(|_| format!("Expected a number before '{}' in {:?}", c, s))?;
            let unit = match c {
                's' => 1,
                'm' => 60,
                'h' => 3600,
                'd' => 86400,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total_seconds += num * unit;
            current_number.clear();
            has_value = true;
        }

        // Bare numbers are seconds.
        if !current_number.is_empty() {
            total_seconds += current_number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            has_value = true;
        }

        if !has_value {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Watches research sites and posts new articles to Telegram", long_about = None)]
struct Cli {
    /// Directory holding seen sets and the article registry
    #[arg(long, global = true, default_value = "./data")]
    data_dir: PathBuf,
    /// Storage backend: memory, json
    #[arg(long, global = true, default_value = "json")]
    storage: StorageKind,
    /// Summarization model: openai, dummy
    #[arg(long, global = true, default_value = "openai")]
    model: ModelKind,
    /// Base URL of an OpenAI-compatible API
    #[arg(long, global = true)]
    model_url: Option<String>,
    #[arg(long, global = true)]
    model_name: Option<String>,
    #[arg(long, global = true)]
    max_tokens: Option<u32>,
    /// Timeout for every outbound HTTP request (e.g. 30s, 1m)
    #[arg(long, global = true, default_value = "30s")]
    http_timeout: HumanDuration,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the bot: scheduled checks plus the Telegram update loop
    Run(RunArgs),
    /// Inspect monitors without notifying
    Monitors(MonitorArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Time between checks (e.g. 10m, 1h, 1h15m30s)
    #[arg(long, default_value = "10m")]
    interval: HumanDuration,
    /// Delay before the first check
    #[arg(long, default_value = "5s")]
    first_delay: HumanDuration,
    /// Days an alert's "Load Insights" button stays usable
    #[arg(long, default_value_t = 30)]
    retention_days: i64,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            interval: HumanDuration(Duration::from_secs(600)),
            first_delay: HumanDuration(Duration::from_secs(5)),
            retention_days: rw_monitors::manager::DEFAULT_RETENTION_DAYS,
        }
    }
}

async fn run_bot(cli: &Cli, args: RunArgs, settings: &Settings) -> Result<()> {
    if args.interval.0.is_zero() {
        return Err(Error::Config("--interval must be greater than zero".to_string()));
    }
    let retention = retention_window(args.retention_days)?;
    let token = settings.require_token()?;
    let admin_id = settings.require_admin_id()?;

    let timeout = cli.http_timeout.0;
    let pages: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(timeout)?);

    let model = create_model(&rw_inference::Config {
        kind: cli.model,
        api_key: settings.openai_api_key.clone(),
        base_url: cli.model_url.clone(),
        model_name: cli.model_name.clone(),
        max_tokens: cli.max_tokens,
        timeout,
    })?;
    info!("🧠 Summaries by {}", model.name());

    let stores = create_stores(cli.storage, &cli.data_dir, &Source::ALL);
    let telegram = Arc::new(TelegramTransport::new(token, timeout)?);

    let mut manager = MonitorManager::new(stores.registry.clone(), pages.clone(), telegram.clone(), admin_id)
        .with_retention(retention);
    for monitor in all_monitors() {
        let seen = stores.seen_for(monitor.source())?;
        manager.add_monitor(monitor, seen);
    }

    let summaries = Arc::new(SummaryFetcher::new(pages, model));
    let insights = Arc::new(InsightsHandler::new(stores.registry.clone(), summaries, telegram.clone()));
    let bot = bot::Bot::new(telegram, insights, admin_id);

    bot::run(bot, Arc::new(manager), args.first_delay.0, args.interval.0).await
}

async fn run(mut cli: Cli) -> Result<()> {
    let settings = Settings::from_env();
    let command = cli.command.take().unwrap_or_else(|| Commands::Run(RunArgs::default()));
    match command {
        Commands::Run(args) => run_bot(&cli, args, &settings).await,
        Commands::Monitors(args) => {
            let pages = HttpFetcher::new(cli.http_timeout.0)?;
            let stores = create_stores(cli.storage, &cli.data_dir, &Source::ALL);
            handle_command(args, &pages, &stores).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let logger = init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger.error(&format!("❌ {}", e));
            ExitCode::FAILURE
        }
    }
}

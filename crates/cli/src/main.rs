use std::path::PathBuf;
use std::sync::Arc;

use bugboard_client::config::normalize_url;
use bugboard_client::{BugBoardApi, ClientConfig, SessionStore};
use bugboard_events::EventBus;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::{Command, Context};

#[derive(Parser)]
#[command(name = "bugboard")]
#[command(about = "Report, discuss and moderate bugs on a BugBoard server", long_about = None)]
struct Cli {
    /// Backend base URL (overrides BUGBOARD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session file (overrides BUGBOARD_SESSION_FILE)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bugboard_client=info,bugboard_cli=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url.as_deref() {
        config.api_url = normalize_url(url)?;
    }
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }
    tracing::debug!(api_url = %config.api_url, session_file = %config.session_file.display(), "Configuration loaded");

    let session = Arc::new(SessionStore::load(&config.session_file)?);
    let api = Arc::new(BugBoardApi::new(&config, session)?);
    let bus = Arc::new(EventBus::default());
    let mut notices = bus.subscribe();

    let ctx = Context {
        api,
        bus,
        json: cli.json,
    };
    let result = commands::run(&ctx, cli.command).await;
    output::print_notices(&mut notices);
    result
}

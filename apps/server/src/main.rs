//! WebScout server — research orchestration over HTTP.
//!
//! Wires the Tavily client, error ledger, result store, and research agent
//! together and serves the JSON API.

mod server;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;

use webscout_agent::ResearchAgent;
use webscout_ledger::ErrorLedger;
use webscout_search::TavilyClient;
use webscout_shared::{init_config, load_config, load_config_from, validate_api_key};

/// Error-statistics file name under the storage root.
const ERROR_STATS_FILE: &str = "error_statistics.json";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// WebScout — query-to-knowledge-graph research service.
#[derive(Parser)]
#[command(
    name = "webscout",
    version,
    about = "Fan a query out to web search and serve analyzed, cached research responses.",
    long_about = None,
)]
struct Cli {
    /// Path to the config file (defaults to ~/.webscout/webscout.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured bind port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write a default config file and exit.
    #[arg(long)]
    init_config: bool,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "webscout=info",
        1 => "webscout=debug",
        _ => "webscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(&cli);

    if cli.init_config {
        let path = init_config()?;
        println!("Config initialized at: {}", path.display());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let api_key = validate_api_key(&config)?;
    let provider = Arc::new(TavilyClient::new(api_key, config.tavily.endpoint.clone())?);

    let store = webscout_storage::open_store(&config.storage).await?;
    let ledger = Arc::new(ErrorLedger::open(
        PathBuf::from(&config.storage.path).join(ERROR_STATS_FILE),
    ));
    let agent = Arc::new(ResearchAgent::new(
        provider,
        ledger.clone(),
        &config.research,
    ));

    info!(
        backend = %config.storage.backend,
        max_urls = config.research.max_urls,
        "webscout initialized"
    );

    server::run(config, agent, ledger, store).await
}

//! cycle-arb: USD → USDT → ARS → USD arbitrage calculator.
//!
//! Entry point. Loads configuration, initialises structured logging, wires
//! the CriptoYa and DolarAPI clients into a cycle runner, then either serves
//! the dashboard API or prints a single calculation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tracing::info;

use cycle_arb::config::AppConfig;
use cycle_arb::dashboard::{self, DashboardState};
use cycle_arb::engine::{CycleCalculator, CycleRequest, CycleRunner, VenueLegRequest};
use cycle_arb::sources::criptoya::CriptoYaClient;
use cycle_arb::sources::dolarapi::DolarApiClient;
use cycle_arb::sources::http_client;
use cycle_arb::types::{LegConfig, Side};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard API (default)
    Serve,
    /// Run one calculation and print the report
    Once(OnceArgs),
}

#[derive(clap::Args)]
struct OnceArgs {
    /// USD entering the cycle
    #[arg(long)]
    start: Option<f64>,
    /// Side taken on the USDT/ARS leg
    #[arg(long, value_enum)]
    side: Option<SideArg>,
    /// Manual USD/USDT price instead of the best ask
    #[arg(long)]
    usd_usdt: Option<f64>,
    /// Manual USDT/ARS price instead of the best venue quote
    #[arg(long)]
    usdt_ars: Option<f64>,
    /// Manual ARS/USD rate instead of the official one
    #[arg(long)]
    ars_usd: Option<f64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Buy,
    Sell,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Buy => Side::Buy,
            SideArg::Sell => Side::Sell,
        }
    }
}

impl OnceArgs {
    fn request(&self) -> CycleRequest {
        let leg = |manual: Option<f64>| manual.map_or_else(LegConfig::auto, LegConfig::manual);
        let mut usdt_ars = leg(self.usdt_ars);
        usdt_ars.side = self.side.map(Side::from);

        CycleRequest {
            start_amount: self.start,
            usd_usdt: VenueLegRequest::new(leg(self.usd_usdt)),
            usdt_ars: VenueLegRequest::new(usdt_ars),
            ars_usd: leg(self.ars_usd),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging();

    let cfg = AppConfig::load_or_default(&cli.config)?;
    let runner = build_runner(&cfg)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!(
                port = cfg.dashboard.port,
                timezone = %cfg.report.timezone,
                usdt_usd_venues = runner.defaults().usdt_usd.len(),
                usdt_ars_venues = runner.defaults().usdt_ars.len(),
                "cycle-arb starting up"
            );
            let state = Arc::new(DashboardState::new(runner));
            dashboard::serve(state, cfg.dashboard.port, shutdown_signal()).await?;
            info!("cycle-arb shut down cleanly.");
        }
        Commands::Once(args) => {
            let run = runner.run(&args.request()).await?;
            println!("{}", run.result);
            println!();
            println!("{}", run.result.disclaimer);
        }
    }

    Ok(())
}

/// Wire the HTTP sources and calculator from configuration.
fn build_runner(cfg: &AppConfig) -> Result<CycleRunner> {
    let http = http_client(cfg.sources.timeout_secs, &cfg.sources.user_agent)?;
    let quotes = CriptoYaClient::new(
        http.clone(),
        cfg.sources.criptoya_base_url.clone(),
        cfg.sources.volume,
    );
    let rates = DolarApiClient::new(http, cfg.sources.dolarapi_base_url.clone());
    let timezone = cfg.timezone().context("Invalid [report] section")?;

    Ok(CycleRunner::new(
        Arc::new(quotes),
        Arc::new(rates),
        CycleCalculator::new(timezone),
    )
    .with_defaults(cfg.run_defaults()))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received.");
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cycle_arb=info"));

    let json_logging = std::env::var("CYCLE_ARB_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

use clap::Parser;
use kraken_dca::config::Settings;
use kraken_dca::logging::setup_logging;
use kraken_dca::orders::read_orders_from_file;
use kraken_dca::{
    run_orders, FailurePolicy, KrakenClient, OrderBuilder, OrderExecutor, PriceSource, RunReport,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Place recurring dollar-cost-averaging orders on Kraken
#[derive(Debug, Parser)]
#[command(name = "kraken-dca", version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Orders file
    #[arg(short, long)]
    orders: Option<PathBuf>,

    /// Key file with API key and secret on separate lines
    #[arg(long)]
    key_file: Option<PathBuf>,

    /// File the run log is appended to
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Only log to stdout
    #[arg(long, conflicts_with = "log_file")]
    no_log_file: bool,

    /// Endpoint used to look up the current price
    #[arg(long, value_enum)]
    price_source: Option<PriceSource>,

    /// Whether to keep placing orders after one fails
    #[arg(long, value_enum)]
    failure_policy: Option<FailurePolicy>,

    /// Let Kraken validate the orders without placing them
    #[arg(long)]
    validate_only: bool,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;

        if let Some(orders) = &self.orders {
            settings.orders_file = orders.clone();
        }
        if let Some(key_file) = &self.key_file {
            settings.key_file = key_file.clone();
        }
        if let Some(log_file) = &self.log_file {
            settings.log_file = log_file.clone();
        }
        if let Some(price_source) = self.price_source {
            settings.price_source = price_source;
        }
        if let Some(failure_policy) = self.failure_policy {
            settings.failure_policy = failure_policy;
        }
        settings.validate_only |= self.validate_only;

        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let log_file = (!cli.no_log_file).then_some(settings.log_file.as_path());
    let _log_guard = match setup_logging(log_file) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&settings).await {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: &Settings) -> anyhow::Result<RunReport> {
    tracing::info!("🚀 Kraken DCA starting");
    tracing::info!("  Orders file: {}", settings.orders_file.display());
    tracing::info!("  Price source: {}", settings.price_source);
    tracing::info!("  Failure policy: {:?}", settings.failure_policy);
    if settings.validate_only {
        tracing::info!("  Validate only: orders are checked by Kraken but not placed");
    }

    let orders = read_orders_from_file(&settings.orders_file)?;
    let credentials = settings.credentials()?;

    let client = KrakenClient::new(
        &settings.api_url,
        settings.request_timeout(),
        settings.requests_per_minute,
    )?
    .with_credentials(credentials);

    let builder = OrderBuilder::new().validate_only(settings.validate_only);
    let executor = OrderExecutor::new(client, settings.price_source, builder);

    let report = run_orders(&executor, &orders, settings.failure_policy).await;

    if report.is_success() {
        tracing::info!("✅ Placed {} order(s)", report.placed.len());
    } else {
        tracing::error!(
            "❌ {} order(s) failed, {} placed, {} skipped",
            report.failures.len(),
            report.placed.len(),
            report.skipped
        );
    }

    Ok(report)
}

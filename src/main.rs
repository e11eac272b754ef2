use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use rust_decimal::Decimal;

use whale_tracker::config::{AppConfig, DisplayMode};
use whale_tracker::ingestion::normalizer::epoch_seconds_lenient;
use whale_tracker::ingestion::{PipelineConfig, Source, SourceRouter};
use whale_tracker::services::{run_poll_loop, Notifier};
use whale_tracker::ui::{FeedPresenter, TerminalPresenter};

/// Track Polymarket whale trades in real time.
#[derive(Parser, Debug)]
#[command(name = "whale-tracker", version, about)]
struct Cli {
    /// Look back from this timestamp (epoch seconds or milliseconds).
    /// Defaults to LOOKBACK_SECS before now.
    #[arg(long)]
    since: Option<i64>,

    /// Only show trades whose market question or id contains this text.
    #[arg(long, default_value = "all")]
    market: String,

    /// Display mode: table or feed.
    #[arg(long)]
    display: Option<DisplayMode>,

    /// Minimum USD notional to display (overrides WHALE_THRESHOLD_USD).
    #[arg(long)]
    whale_threshold: Option<Decimal>,

    /// Minimum USD notional to alert on (overrides ALERT_THRESHOLD_USD).
    #[arg(long)]
    alert_threshold: Option<Decimal>,

    /// Seconds between poll cycles (overrides POLL_INTERVAL_SECS).
    #[arg(long)]
    interval: Option<u64>,

    /// Maximum rows in the table (overrides MAX_ROWS).
    #[arg(long)]
    max_rows: Option<usize>,
}

impl Cli {
    fn apply(self, config: &mut AppConfig) {
        if let Some(v) = self.whale_threshold {
            config.display.whale_threshold = v;
        }
        if let Some(v) = self.alert_threshold {
            config.display.alert_threshold = v;
        }
        if let Some(v) = self.interval {
            config.display.poll_interval = Duration::from_secs(v);
        }
        if let Some(v) = self.max_rows {
            config.display.max_rows = v;
        }
        if let Some(v) = self.display {
            config.display_mode = v;
        }
        config.since = self.since;
        config.market_filter = match self.market.trim() {
            "" => None,
            m if m.eq_ignore_ascii_case("all") => None,
            m => Some(m.to_string()),
        };
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    cli.apply(&mut config);
    init_tracing(&config)?;
    config.validate()?;

    if let Some(addr) = config.metrics_addr {
        whale_tracker::metrics::init_metrics(addr)?;
    }

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    let primary = Source::from_config(config.primary_source, &config, http.clone());
    let fallback = config
        .fallback_source
        .map(|kind| Source::from_config(kind, &config, http.clone()));
    let router = SourceRouter::new(primary, fallback);

    let notifier = match config.telegram() {
        Some((token, chat_id)) => Some(Notifier::new(http.clone(), token.into(), chat_id.into())),
        None => {
            tracing::info!("Telegram credentials not set, alerts will only be logged");
            None
        }
    };

    let now = Utc::now().timestamp();
    let pipeline_config = PipelineConfig {
        display: config.display.clone(),
        fetch_limit: config.fetch_limit,
        since_floor: config
            .since
            .map(epoch_seconds_lenient)
            .unwrap_or(now - config.display.lookback_secs),
        market_filter: config.market_filter.clone(),
    };

    tracing::info!(
        primary = %config.primary_source,
        fallback = ?config.fallback_source,
        market = ?pipeline_config.market_filter,
        "Starting whale tracker"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    match config.display_mode {
        DisplayMode::Table => {
            let mut presenter = TerminalPresenter::enter()?;
            run_poll_loop(&router, &pipeline_config, notifier.as_ref(), &mut presenter, shutdown).await;
            presenter.restore()?;
        }
        DisplayMode::Feed => {
            let mut presenter = FeedPresenter::new(io::stdout());
            run_poll_loop(&router, &pipeline_config, notifier.as_ref(), &mut presenter, shutdown).await;
        }
    }

    println!("Tracking stopped.");
    Ok(())
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("whale_tracker=info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.display_mode {
        // The table owns the terminal, so logs go to a file.
        DisplayMode::Table => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)?;
            let writer = Mutex::new(file);
            if config.log_json {
                registry.with(fmt::layer().json().with_writer(writer)).init();
            } else {
                registry
                    .with(fmt::layer().with_ansi(false).with_writer(writer))
                    .init();
            }
        }
        DisplayMode::Feed => {
            if config.log_json {
                registry.with(fmt::layer().json().with_writer(io::stderr)).init();
            } else {
                registry.with(fmt::layer().with_writer(io::stderr)).init();
            }
        }
    }

    Ok(())
}

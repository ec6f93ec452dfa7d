use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geumeun_core::assembler::RecommendationAssembler;
use geumeun_core::domain::market::MarketDataSnapshot;
use geumeun_core::domain::recommendation::RecommendationsResponse;
use geumeun_core::ingest::history::{SimulatedSeriesProvider, StaticSeriesProvider};
use geumeun_core::ingest::metals_dev::MetalsDevClient;
use geumeun_core::ingest::provider::{HistoricalSeriesProvider, MarketQuoteSource};
use geumeun_core::market::quotes::QuoteBook;
use geumeun_core::time::kst;

mod snapshot;

#[derive(Debug, Parser)]
#[command(name = "geumeun_worker")]
struct Args {
    /// Gold spot price (USD/oz). Without explicit prices, live quotes are fetched.
    #[arg(long, requires = "silver_price")]
    gold_price: Option<f64>,

    /// Silver spot price (USD/oz).
    #[arg(long, requires = "gold_price")]
    silver_price: Option<f64>,

    /// Gold day-over-day change in percent.
    #[arg(long, requires = "gold_price", allow_hyphen_values = true)]
    gold_change_percent: Option<f64>,

    /// Silver day-over-day change in percent.
    #[arg(long, requires = "silver_price", allow_hyphen_values = true)]
    silver_change_percent: Option<f64>,

    /// JSON file `{"gold": [{"date", "price"}], "silver": [...]}`. Simulated history otherwise.
    #[arg(long)]
    history: Option<PathBuf>,

    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = geumeun_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let now = chrono::Utc::now();

    let snapshot = match (args.gold_price, args.silver_price) {
        (Some(gold), Some(silver)) => snapshot::manual_snapshot(
            snapshot::ManualPrices {
                gold,
                silver,
                gold_change_percent: args.gold_change_percent.unwrap_or(0.0),
                silver_change_percent: args.silver_change_percent.unwrap_or(0.0),
            },
            now,
        )?,
        _ => live_snapshot(&settings, now).await.map_err(|err| {
            sentry_anyhow::capture_anyhow(&err);
            err
        })?,
    };

    let history: Box<dyn HistoricalSeriesProvider> = match &args.history {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read history file {}", path.display()))?;
            Box::new(StaticSeriesProvider::from_json_str(&json)?)
        }
        None => Box::new(SimulatedSeriesProvider::anchored(
            &snapshot,
            kst::kst_date(now),
        )),
    };

    let bundle = RecommendationAssembler::default()
        .assemble(&snapshot, history.as_ref(), now)
        .await;
    let response = RecommendationsResponse::from(bundle);

    tracing::info!(
        provider = history.provider_name(),
        gold_action = ?response.recommendations.gold.action,
        silver_action = ?response.recommendations.silver.action,
        "evaluation cycle complete"
    );

    let out = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{out}");

    Ok(())
}

async fn live_snapshot(
    settings: &geumeun_core::config::Settings,
    now: chrono::DateTime<chrono::Utc>,
) -> anyhow::Result<MarketDataSnapshot> {
    let client = MetalsDevClient::from_settings(settings)?;
    let spot = client
        .fetch_latest_prices()
        .await
        .with_context(|| format!("{} quote fetch failed", client.provider_name()))?;
    Ok(QuoteBook::new().apply(spot, now))
}

fn init_sentry(settings: &geumeun_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

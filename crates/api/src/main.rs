use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geumeun_core::domain::recommendation::RecommendationsResponse;
use geumeun_core::ingest::fx::ExchangeRateClient;
use geumeun_core::ingest::metals_dev::MetalsDevClient;
use geumeun_core::ingest::types::FxRate;
use geumeun_core::market::fx::FxService;
use geumeun_core::market::recommendations::{HistorySource, RecommendationService};
use geumeun_core::market::service::{MarketDataService, QuoteView};

const RECOMMENDATIONS_CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=60";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = geumeun_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let market = match MetalsDevClient::from_settings(&settings) {
        Ok(client) => {
            let market = Arc::new(MarketDataService::new(Arc::new(client)));
            Some(market)
        }
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "metals client unavailable; starting API in degraded mode");
            None
        }
    };

    let recommendations = market.as_ref().map(|market| {
        Arc::new(RecommendationService::new(
            market.clone(),
            HistorySource::Simulated,
        ))
    });

    let fx = Arc::new(FxService::new(Arc::new(ExchangeRateClient::from_settings(
        &settings,
    )?)));

    let state = AppState {
        market,
        recommendations,
        fx,
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/metals", get(get_metals))
        .route("/api/fx", get(get_fx))
        .route("/api/recommendations", get(get_recommendations))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    market: Option<Arc<MarketDataService>>,
    recommendations: Option<Arc<RecommendationService>>,
    fx: Arc<FxService>,
}

async fn get_metals(State(state): State<AppState>) -> Result<Json<QuoteView>, StatusCode> {
    let Some(market) = &state.market else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let view = market.current(Utc::now()).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, "no market data available");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(view))
}

async fn get_fx(State(state): State<AppState>) -> Json<FxRate> {
    Json(state.fx.usd_krw(Utc::now()).await)
}

async fn get_recommendations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, StatusCode> {
    let Some(service) = &state.recommendations else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let response: RecommendationsResponse =
        service.recommendations(Utc::now()).await.map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "recommendations unavailable");
            StatusCode::SERVICE_UNAVAILABLE
        })?;

    Ok((
        [(header::CACHE_CONTROL, RECOMMENDATIONS_CACHE_CONTROL)],
        Json(response),
    ))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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

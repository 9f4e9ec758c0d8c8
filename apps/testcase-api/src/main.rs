//! Test Case API Server
//!
//! Turns feature descriptions, UI screenshots, API documents and live
//! websites into structured test scenarios and test cases using an
//! OpenAI-compatible chat completions endpoint.
//!
//! ## Endpoints
//!
//! - `GET /health`
//! - `POST /analyze`
//! - `POST /generate`
//! - `POST /analyze_website`
//! - `POST /generate_api_tests`
//!
//! When `STATIC_DIR` is set the built front end is served from `/` as well.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use clap::Parser;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::services::ServeDir;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod config;
mod error;
mod state;
#[cfg(test)]
mod tests;

use config::AppConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::parse();

    let default_filter = if config.verbose {
        "testcase_api=debug,analysis_engine=debug,tower_http=debug"
    } else {
        "testcase_api=info,analysis_engine=info,tower_http=debug"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let problems = config.validate();
    if !problems.is_empty() {
        if config.is_production() {
            bail!("Invalid configuration: {}", problems.join("; "));
        }
        for problem in &problems {
            warn!("Configuration problem: {}", problem);
        }
    }

    let state = Arc::new(AppState::new(&config)?);

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit.into())
            .burst_size(config.rate_limit * 2)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow!("Failed to create rate limiter config"))?,
    );

    let mut app = api::router(state)
        .layer(GovernorLayer {
            config: governor_conf,
        })
        .layer(config.cors_layer());

    if let Some(dir) = &config.static_dir {
        info!("Serving front end from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Starting test case API ({}) on http://{}", config.environment, addr);
    info!("Rate limit: {} requests/second per IP", config.rate_limit);
    info!(
        "Models: text={} vision={} website={} api={}",
        config.model_text, config.model_vision, config.model_website, config.model_api
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use matchday::config::Config;
use matchday::fixtures::ApiFootball;
use matchday::poller::FixturePoller;
use matchday::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let source = ApiFootball::new(&config.api_key, config.query(), config.request_timeout())?
        .with_endpoint(&config.api_url, &config.api_host);
    info!(
        "Tracking team {} in league {} (season {})",
        config.team_id, config.league_id, config.season
    );

    let poller = FixturePoller::new(
        Arc::new(source),
        config.interval_policy()?,
        config.request_timeout(),
    );
    let task = poller.start();

    let app = server::router(AppState {
        poller: poller.clone(),
    });
    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Views API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run the views API until Ctrl-C, then stop the poller
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    task.stop().await;
    Ok(())
}

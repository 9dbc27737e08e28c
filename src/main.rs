use anyhow::Context;
use httpwire::app::DemoHandler;
use httpwire::config::Config;
use httpwire::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load().context("failed to load configuration")?;
    let handler = DemoHandler::from_config(&cfg)?;

    let server = server::serve(&cfg, handler).await?;
    tracing::info!(addr = %server.local_addr(), "Server started");

    shutdown_signal().await?;
    tracing::info!("Shutdown signal received");

    server.close().await?;
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res?,
        _ = terminate.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use otc_probot::ai;
use otc_probot::config::{Config, EnvConfig};
use otc_probot::data::catalog::initial_markets;
use otc_probot::execution::dashboard::{run_auto_analysis, run_simulation, Dashboard};
use otc_probot::execution::simulator::MarketSimulator;
use otc_probot::monitoring::logger::{summary_line, TickLogger};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("🚀 OTC ProBot starting...");

    // Load configuration
    let env_config = EnvConfig::load()?;
    tracing::info!("Loading configuration from {}", env_config.config_path);
    let config = Config::load_or_default(&env_config.config_path)?;

    tracing::info!("Tick interval: {}ms", config.simulation.tick_interval_ms);
    tracing::info!("Analysis backend: {:?}", config.analysis.backend);
    tracing::info!("Gemini API key present: {}", env_config.gemini_api_key.is_some());

    let backend = ai::build_backend(&config.analysis, &env_config)
        .context("Failed to build analysis backend")?;

    let dashboard = Arc::new(Dashboard::new(
        initial_markets(),
        MarketSimulator::new(config.simulation.clone()),
        backend,
    ));

    for market in dashboard.markets().await {
        tracing::info!("{}", summary_line(&market));
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let simulation = tokio::spawn(run_simulation(
        Arc::clone(&dashboard),
        Duration::from_millis(config.simulation.tick_interval_ms),
        TickLogger::new(&config.monitoring),
        shutdown_rx.clone(),
    ));

    let auto_analysis = config.monitoring.auto_analyze_secs.map(|secs| {
        tracing::info!("Auto analysis every {}s", secs);
        tokio::spawn(run_auto_analysis(
            Arc::clone(&dashboard),
            Duration::from_secs(secs),
            shutdown_rx.clone(),
        ))
    });

    tracing::info!("✅ Simulation running, press Ctrl-C to stop");

    // Keep running
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    shutdown_tx.send(true).ok();
    simulation.await?;
    if let Some(handle) = auto_analysis {
        handle.await?;
    }

    Ok(())
}

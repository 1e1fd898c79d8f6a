//! Ledger service entry-point: wires stores, the accrual client and the
//! reconciliation loop, then runs until Ctrl-C or SIGTERM.

use std::sync::Arc;

use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use gophermart::domain::{AccrualReconciliationPorts, AccrualReconciliationWorker};
use gophermart::outbound::accrual::AccrualHttpSource;
use gophermart::settings::GophermartSettings;
use gophermart::state::LedgerRepositories;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = GophermartSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load settings: {err}"))?;

    let repositories = LedgerRepositories::from_settings(&settings)
        .await
        .wrap_err("failed to connect to PostgreSQL")?;

    let accrual_base = settings
        .accrual_system_address()
        .wrap_err("invalid accrual system address")?;
    let source = AccrualHttpSource::new(accrual_base.clone(), settings.accrual_timeout())
        .wrap_err("failed to build accrual HTTP client")?;
    info!(accrual = %accrual_base, "accrual client configured");

    let worker = AccrualReconciliationWorker::new(
        AccrualReconciliationPorts::new(repositories.orders.clone(), Arc::new(source)),
        Arc::new(DefaultClock),
        settings.reconciliation_config(),
    );
    let task = worker.spawn(CancellationToken::new());

    wait_for_shutdown_signal().await?;
    info!("shutdown requested");
    task.shutdown()
        .await
        .wrap_err("reconciliation task panicked")?;
    info!("ledger service stopped");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate =
        signal(SignalKind::terminate()).wrap_err("failed to install SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.wrap_err("failed to listen for Ctrl-C"),
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .wrap_err("failed to listen for Ctrl-C")
}

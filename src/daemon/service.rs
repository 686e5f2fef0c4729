use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::updater::{DomainResult, UpdateOutcome, Updater};

/// Run `update` right away and then on every tick until a shutdown signal.
pub async fn run(mut updater: Updater, interval: Duration) -> Result<()> {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown().await {
            error!("Error waiting for shutdown signal: {}", e);
        }
        let _ = shutdown_tx.send(true);
    });

    info!(
        "Daemon started. Monitoring {} zones with {} second interval",
        updater.zones().len(),
        interval.as_secs()
    );

    // Initial check
    tick(&mut updater).await;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                tick(&mut updater).await;
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("Shutdown signal received, stopping daemon");
                    break;
                }
            }
        }
    }

    Ok(())
}

async fn tick(updater: &mut Updater) {
    match updater.update().await {
        Ok(outcome) => report(&outcome),
        Err(e) => error!("Update run aborted: {}", e),
    }
}

pub fn report(outcome: &UpdateOutcome) {
    match outcome {
        UpdateOutcome::Unchanged { .. } => {}
        UpdateOutcome::Applied { ip, domains } => {
            info!("All {} domains now point at {}", domains, ip);
        }
        UpdateOutcome::Failed { ip, failures } => {
            for failure in failures {
                match &failure.result {
                    DomainResult::SoftFailure { message } => warn!(
                        "{} ({}) not updated to {}: {}",
                        failure.domain, failure.zone, ip, message
                    ),
                    DomainResult::HardFailure { cause } => error!(
                        "{} ({}) not updated to {}: {}",
                        failure.domain, failure.zone, ip, cause
                    ),
                    DomainResult::Ok => {}
                }
            }
        }
    }
}

async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}

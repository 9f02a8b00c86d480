//! XMRig Bridge - host binary
//!
//! Drives the bridge controller from a desktop shell: stages the engine
//! configuration, starts the engine, reports statistics periodically and shuts
//! down cleanly on Ctrl-C or when the engine exits.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use xmrig_bridge::{
    capability,
    config::{Config, WorkerType},
    controller::SessionExit,
    utils::{format_duration, format_hash_rate, logging::init_logging},
    worker::{ExternalWorker, MiningWorker, SimulationWorker, WorkerExit},
    BridgeController, StopOutcome, APP_DESCRIPTION, APP_NAME, APP_VERSION,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().await.context("Failed to load configuration")?;

    // Handle special commands
    if config.info {
        print_info();
        return Ok(());
    }

    if config.print_config {
        print_configuration(&config)?;
        return Ok(());
    }

    let _log_guard = init_logging(
        config.log_level.as_directive(),
        config.log_format,
        config.log_dir.as_deref(),
    )?;

    info!("Starting {} v{}", APP_NAME, APP_VERSION);
    info!(
        "Configuration: worker={}, engine={}, {}",
        config.worker,
        config.engine_path.display(),
        capability::cpu_info()
    );

    let controller = BridgeController::new(create_worker(&config), config.controller_settings()?);
    controller.set_threads(
        config
            .threads
            .unwrap_or_else(|| capability::host().recommended_threads()),
    );

    let payload = config
        .engine_payload()
        .await
        .context("Failed to build engine configuration")?;
    controller.init(&payload).await?;
    controller.start().await.context("Failed to start engine")?;

    supervise(&controller, config.stats_interval_duration()?).await;

    match controller.stop().await {
        StopOutcome::GraceElapsed => warn!("Engine did not stop within the grace period"),
        outcome => info!("Engine stopped ({:?})", outcome),
    }
    report_exit(controller.last_exit());
    controller.cleanup().await;

    Ok(())
}

/// Build the worker selected by the configuration
fn create_worker(config: &Config) -> Arc<dyn MiningWorker> {
    match config.worker {
        WorkerType::External => Arc::new(ExternalWorker::new(config.engine_path.clone())),
        WorkerType::Simulation => Arc::new(SimulationWorker::new(config.simulated_hash_rate)),
    }
}

/// Report statistics until Ctrl-C or until the engine exits on its own
async fn supervise(controller: &BridgeController, stats_interval: Duration) {
    let mut ticker = interval(stats_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !controller.is_running() {
                    info!("Engine is no longer running");
                    break;
                }
                report_stats(controller);
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Interrupt received, stopping engine");
                break;
            }
        }
    }
}

fn report_stats(controller: &BridgeController) {
    let stats = controller.get_stats();
    let difficulty = controller.stats_cache().difficulty();
    let uptime = controller
        .uptime()
        .map(format_duration)
        .unwrap_or_else(|| "-".to_string());

    info!(
        "speed 10s/60s/15m {} {} {} | shares {}/{} ({:.1}%) | diff {} | threads {} | up {}",
        format_hash_rate(stats.hashrate_10s),
        format_hash_rate(stats.hashrate_60s),
        format_hash_rate(stats.hashrate_15m),
        stats.accepted_shares,
        stats.rejected_shares,
        stats.success_rate(),
        difficulty,
        stats.threads,
        uptime
    );
}

fn report_exit(exit: Option<SessionExit>) {
    match exit {
        Some(SessionExit {
            session_id,
            exit: WorkerExit::Failed(message),
        }) => warn!("Session {} failed: {}", session_id, message),
        Some(SessionExit { session_id, exit }) => info!("Session {} ended: {:?}", session_id, exit),
        None => {}
    }
}

/// Print program and host information
fn print_info() {
    println!("{} v{}", APP_NAME, APP_VERSION);
    println!("{}", APP_DESCRIPTION);
    println!("{}", capability::version_label());
    println!("{}", capability::cpu_info());
    println!(
        "Crypto extensions: {}",
        if capability::has_crypto_extensions() { "yes" } else { "no" }
    );
    println!(
        "Recommended threads: {}",
        capability::host().recommended_threads()
    );
}

/// Print current configuration
fn print_configuration(config: &Config) -> Result<()> {
    let config_yaml = serde_yaml::to_string(config)?;
    println!("{}", config_yaml);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_worker_selection() {
        let config = Config::try_parse_from(["xmrig-bridge", "--worker", "simulation"]).unwrap();
        assert_eq!(create_worker(&config).worker_type(), "simulation");

        let config = Config::try_parse_from(["xmrig-bridge", "--engine-path", "/opt/xmrig"]).unwrap();
        assert_eq!(create_worker(&config).worker_type(), "external");
    }

    #[test]
    fn test_config_printing() {
        let config = Config::try_parse_from(["xmrig-bridge", "--worker", "simulation"]).unwrap();
        assert!(print_configuration(&config).is_ok());
    }

    #[test]
    fn test_info_functions() {
        print_info();
        report_exit(None);
        report_exit(Some(SessionExit {
            session_id: uuid::Uuid::new_v4(),
            exit: WorkerExit::Failed("engine crashed".to_string()),
        }));
    }

    #[tokio::test]
    async fn test_supervise_returns_when_worker_exits() {
        let dir = tempfile::tempdir().unwrap();
        let worker = Arc::new(
            SimulationWorker::new(500.0).with_run_time(Duration::from_millis(150)),
        );
        let controller = BridgeController::new(
            worker,
            xmrig_bridge::ControllerSettings {
                staging_dir: dir.path().to_path_buf(),
                ..Default::default()
            },
        );
        controller.init("{}").await.unwrap();
        controller.start().await.unwrap();
        controller.stats_cache().set_difficulty(75_000);
        report_stats(&controller);

        tokio::time::timeout(
            Duration::from_secs(5),
            supervise(&controller, Duration::from_millis(50)),
        )
        .await
        .unwrap();
        assert!(!controller.is_running());
        assert_matches::assert_matches!(
            controller.last_exit(),
            Some(SessionExit { exit: WorkerExit::Completed, .. })
        );
    }
}

//! Simulation worker for testing and development
//!
//! Loads the staged configuration like the engine would, then reports a
//! configurable hash rate and a steady trickle of accepted shares without
//! computing anything.

use super::{compute_hash_rate, MiningWorker, WorkerSession};
use crate::{Error, Result};
use async_trait::async_trait;
use rand::Rng;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, info};

const TICK: Duration = Duration::from_millis(100);

/// Simulation worker that mimics engine behavior without actual computation
#[derive(Debug, Clone)]
pub struct SimulationWorker {
    hash_rate: f64,
    share_interval: Duration,
    run_time: Option<Duration>,
}

impl SimulationWorker {
    /// Create a new simulation worker with specified hash rate
    pub fn new(hash_rate: f64) -> Self {
        info!("Creating simulation worker with hash rate: {:.2} H/s", hash_rate);

        Self {
            hash_rate: hash_rate.max(1.0),
            share_interval: Duration::from_secs(5),
            run_time: None,
        }
    }

    /// Report an accepted share this often
    pub fn with_share_interval(mut self, share_interval: Duration) -> Self {
        self.share_interval = share_interval.max(TICK);
        self
    }

    /// Exit on its own after `run_time` instead of running until stopped
    pub fn with_run_time(mut self, run_time: Duration) -> Self {
        self.run_time = Some(run_time);
        self
    }

    /// Configured hash rate
    pub fn hash_rate(&self) -> f64 {
        self.hash_rate
    }

    async fn load_config(&self, session: &WorkerSession) -> Result<serde_json::Value> {
        let content = tokio::fs::read_to_string(&session.config_path).await?;
        serde_json::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("engine could not load config: {}", e)))
    }
}

#[async_trait]
impl MiningWorker for SimulationWorker {
    fn worker_type(&self) -> &'static str {
        "simulation"
    }

    async fn run(&self, session: WorkerSession) -> Result<()> {
        let config = self.load_config(&session).await?;
        debug!("Simulation loaded config with {} top-level keys", config.as_object().map_or(0, |o| o.len()));

        info!(
            "Starting simulation at {:.2} H/s with {} threads",
            self.hash_rate, session.threads
        );

        let start_time = Instant::now();
        let mut last_tick = start_time;
        let mut last_share = start_time;
        let mut total_hashes = 0u64;
        let mut ticker = interval(TICK);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Instant::now();
                    let jitter = rand::rng().random_range(0.9..1.1);
                    let hashes = (self.hash_rate * jitter * now.duration_since(last_tick).as_secs_f64()) as u64;
                    last_tick = now;

                    total_hashes += hashes;
                    session.stats.record_hashes(hashes);

                    let average = compute_hash_rate(total_hashes, start_time.elapsed());
                    session.stats.set_hashrate(self.hash_rate * jitter, average, average);

                    if now.duration_since(last_share) >= self.share_interval {
                        session.stats.record_accepted();
                        last_share = now;
                    }

                    if self.run_time.is_some_and(|limit| start_time.elapsed() >= limit) {
                        info!("Simulation finished after {} hashes", total_hashes);
                        return Ok(());
                    }
                }
                _ = session.cancellation.cancelled() => {
                    info!("Simulation cancelled after {} hashes", total_hashes);
                    return Err(Error::cancelled("simulation"));
                }
            }
        }
    }
}

//! Mining worker implementations
//!
//! A worker is whatever actually runs the engine for one session: the engine
//! executable ([`ExternalWorker`]) or an in-process stand-in
//! ([`SimulationWorker`]). The controller owns the session and supervises the
//! worker through a task handle and a cancellation token.

use crate::stats::StatsCache;
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub mod external;
pub mod simulation;

pub use external::ExternalWorker;
pub use simulation::SimulationWorker;

/// Everything a worker gets for one run
#[derive(Debug, Clone)]
pub struct WorkerSession {
    /// Session identifier, used in logs
    pub id: Uuid,
    /// Staged configuration the engine must load
    pub config_path: PathBuf,
    /// Desired thread count at start time
    pub threads: u32,
    /// Cache the worker reports into
    pub stats: Arc<StatsCache>,
    /// Cancelled when the controller wants the worker to stop
    pub cancellation: CancellationToken,
}

/// How a worker session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// The worker returned on its own
    Completed,
    /// The worker honored a stop request
    Cancelled,
    /// The worker failed
    Failed(String),
}

impl WorkerExit {
    /// Classify the result of [`MiningWorker::run`]
    pub fn from_result(result: &Result<()>) -> Self {
        match result {
            Ok(()) => WorkerExit::Completed,
            Err(Error::Cancelled { .. }) => WorkerExit::Cancelled,
            Err(e) => WorkerExit::Failed(e.to_string()),
        }
    }
}

/// Mining worker trait
///
/// Workers run until the engine exits on its own or the session's
/// cancellation token fires. Cancellation is cooperative: a worker should
/// notice it promptly and return [`Error::Cancelled`].
#[async_trait]
pub trait MiningWorker: Send + Sync {
    /// Get the worker type name for logging
    fn worker_type(&self) -> &'static str;

    /// Checks that must pass before a session is started
    ///
    /// Failures are reported to the caller of `start` as spawn failures.
    fn prepare(&self, _config_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Run one session to completion
    async fn run(&self, session: WorkerSession) -> Result<()>;
}

/// Utility function to compute hash rate over a time period
pub fn compute_hash_rate(hashes: u64, elapsed: Duration) -> f64 {
    if elapsed.as_secs_f64() > 0.0 {
        hashes as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    }
}

//! Worker lifecycle controller
//!
//! [`BridgeController`] owns everything one bridge instance needs: the staged
//! configuration, the supervised worker task, the run flags and the stats
//! cache. Lifecycle transitions (`init`, `start`, `stop`, `cleanup`) are
//! serialized by one coarse async mutex; `is_running`, the stats and the thread
//! count are atomics readable from any thread at any time.
//!
//! ```text
//! Idle ──start──▶ Starting ──spawned──▶ Running ──stop──▶ StopRequested ──▶ Idle
//!                     │                    │
//!                     └──prepare failed────┴──worker exits──────────────────▶ Idle
//! ```
//!
//! `stop` is bounded: the worker is cancelled, given the grace period to
//! finish, and the controller reports idle afterwards whether or not it did.
//! The returned [`StopOutcome`] says which one happened.

use crate::staging::StagedConfig;
use crate::stats::{StatsCache, StatsSnapshot};
use crate::utils::logging::session_span;
use crate::worker::{MiningWorker, WorkerExit, WorkerSession};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex as SyncMutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Default wait after a stop request
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Controller tunables
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Where staged configuration files are created
    pub staging_dir: PathBuf,
    /// Bounded wait for the worker after a stop request
    pub grace_period: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            staging_dir: std::env::temp_dir(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    /// No worker
    Idle = 0,
    /// A worker is being launched
    Starting = 1,
    /// A worker is active
    Running = 2,
    /// The active worker was asked to stop
    StopRequested = 3,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => LifecycleState::Starting,
            2 => LifecycleState::Running,
            3 => LifecycleState::StopRequested,
            _ => LifecycleState::Idle,
        }
    }
}

/// Result of a stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing was running
    NotRunning,
    /// The worker finished within the grace period
    Terminated,
    /// The grace period ran out; the worker may still be winding down
    GraceElapsed,
}

/// Exit of the most recent session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionExit {
    /// Session that ended
    pub session_id: Uuid,
    /// How it ended
    pub exit: WorkerExit,
}

/// Identity of the active session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    /// Session identifier
    pub id: Uuid,
    /// Start time
    pub started_at: DateTime<Utc>,
    generation: u64,
}

struct ActiveSession {
    generation: u64,
    cancellation: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Lifecycle {
    staged: Option<StagedConfig>,
    session: Option<ActiveSession>,
}

/// State shared with the worker task
struct Shared {
    // 0 while idle, otherwise the generation of the running session
    active_generation: AtomicU64,
    latest_generation: AtomicU64,
    phase: AtomicU8,
    should_stop: AtomicBool,
    stats: Arc<StatsCache>,
    session: SyncMutex<Option<SessionInfo>>,
    last_exit: SyncMutex<Option<SessionExit>>,
}

impl Shared {
    fn set_phase(&self, state: LifecycleState) {
        self.phase.store(state as u8, Ordering::Release);
    }

    /// Mark `generation` idle unless a newer session has taken over
    fn release(&self, generation: u64) -> bool {
        let released = self
            .active_generation
            .compare_exchange(generation, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if released {
            self.set_phase(LifecycleState::Idle);
            let mut session = self.session.lock();
            if session.as_ref().is_some_and(|s| s.generation == generation) {
                *session = None;
            }
        }
        released
    }

    /// Called by the worker task when the worker returns
    fn finish(&self, generation: u64, session_id: Uuid, exit: WorkerExit) {
        if self.latest_generation.load(Ordering::Acquire) == generation {
            *self.last_exit.lock() = Some(SessionExit { session_id, exit });
        }
        if !self.release(generation) {
            debug!("Session {} finished after the controller released it", session_id);
        }
    }
}

/// Start/stop/stats control surface over one mining worker
pub struct BridgeController {
    settings: ControllerSettings,
    worker: Arc<dyn MiningWorker>,
    lifecycle: Mutex<Lifecycle>,
    shared: Arc<Shared>,
}

impl BridgeController {
    /// Create an idle controller driving `worker`
    pub fn new(worker: Arc<dyn MiningWorker>, settings: ControllerSettings) -> Self {
        info!(
            "Creating bridge controller (worker: {}, staging: {}, grace: {:?})",
            worker.worker_type(),
            settings.staging_dir.display(),
            settings.grace_period
        );

        Self {
            settings,
            worker,
            lifecycle: Mutex::new(Lifecycle::default()),
            shared: Arc::new(Shared {
                active_generation: AtomicU64::new(0),
                latest_generation: AtomicU64::new(0),
                phase: AtomicU8::new(LifecycleState::Idle as u8),
                should_stop: AtomicBool::new(false),
                stats: Arc::new(StatsCache::new()),
                session: SyncMutex::new(None),
                last_exit: SyncMutex::new(None),
            }),
        }
    }

    /// Stage a configuration payload for the next `start`
    ///
    /// Replaces (and deletes) any previously staged artifact. Fails with
    /// [`Error::AlreadyRunning`] while a worker is active.
    pub async fn init(&self, payload: &str) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;

        if self.is_running() {
            return Err(Error::AlreadyRunning);
        }

        let staged = StagedConfig::stage(payload, &self.settings.staging_dir)?;
        info!(
            "Configuration staged at {} ({} bytes, {})",
            staged.path().display(),
            staged.payload_len(),
            staged.staged_at().format("%H:%M:%S%.3f")
        );

        if let Some(previous) = lifecycle.staged.replace(staged) {
            if let Err(e) = previous.remove() {
                warn!("Failed to remove previous staged configuration: {}", e);
            }
        }

        self.shared.should_stop.store(false, Ordering::Release);
        Ok(())
    }

    /// Start a worker on the staged configuration
    ///
    /// Succeeds without doing anything when a worker is already running.
    pub async fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;

        if self.is_running() {
            debug!("Start requested while running, ignoring");
            return Ok(());
        }

        let config_path = lifecycle
            .staged
            .as_ref()
            .map(StagedConfig::path_buf)
            .ok_or(Error::NotConfigured)?;

        self.shared.set_phase(LifecycleState::Starting);
        if let Err(e) = self.worker.prepare(&config_path) {
            self.shared.set_phase(LifecycleState::Idle);
            warn!("Worker preflight failed: {}", e);
            return Err(match e {
                Error::SpawnFailed { .. } => e,
                other => Error::spawn_failed(other.to_string()),
            });
        }

        let generation = self.shared.latest_generation.fetch_add(1, Ordering::AcqRel) + 1;
        let id = Uuid::new_v4();
        let cancellation = CancellationToken::new();
        let session = WorkerSession {
            id,
            config_path,
            threads: self.shared.stats.threads(),
            stats: Arc::clone(&self.shared.stats),
            cancellation: cancellation.clone(),
        };

        *self.shared.session.lock() = Some(SessionInfo {
            id,
            started_at: Utc::now(),
            generation,
        });
        self.shared.should_stop.store(false, Ordering::Release);
        self.shared.active_generation.store(generation, Ordering::Release);
        self.shared.set_phase(LifecycleState::Running);

        let worker = Arc::clone(&self.worker);
        let shared = Arc::clone(&self.shared);
        let span = session_span(worker.worker_type(), &id.to_string());
        let handle = tokio::spawn(
            async move {
                let result = worker.run(session).await;
                let exit = WorkerExit::from_result(&result);
                match &exit {
                    WorkerExit::Completed => info!("Worker completed"),
                    WorkerExit::Cancelled => info!("Worker stopped"),
                    WorkerExit::Failed(message) => warn!("Worker failed: {}", message),
                }
                shared.finish(generation, id, exit);
            }
            .instrument(span),
        );

        lifecycle.session = Some(ActiveSession {
            generation,
            cancellation,
            handle,
        });

        info!("Worker session {} started", id);
        Ok(())
    }

    /// Ask the worker to stop and report idle after at most the grace period
    pub async fn stop(&self) -> StopOutcome {
        let mut lifecycle = self.lifecycle.lock().await;
        self.stop_locked(&mut lifecycle).await
    }

    async fn stop_locked(&self, lifecycle: &mut Lifecycle) -> StopOutcome {
        let Some(mut session) = lifecycle.session.take() else {
            return StopOutcome::NotRunning;
        };

        if self.shared.active_generation.load(Ordering::Acquire) != session.generation {
            // The worker already exited on its own
            return StopOutcome::NotRunning;
        }

        self.shared.should_stop.store(true, Ordering::Release);
        self.shared.set_phase(LifecycleState::StopRequested);
        session.cancellation.cancel();

        let outcome = match timeout(self.settings.grace_period, &mut session.handle).await {
            Ok(Ok(())) => StopOutcome::Terminated,
            Ok(Err(e)) => {
                warn!("Worker task ended abnormally: {}", e);
                StopOutcome::Terminated
            }
            Err(_) => {
                warn!(
                    "Worker still running {:?} after stop request, reporting idle",
                    self.settings.grace_period
                );
                StopOutcome::GraceElapsed
            }
        };

        self.shared.release(session.generation);
        // Nothing newer can have started while the lifecycle lock is held
        if self.shared.active_generation.load(Ordering::Acquire) == 0 {
            self.shared.set_phase(LifecycleState::Idle);
        }
        info!("Stop completed: {:?}", outcome);
        outcome
    }

    /// Stop, delete the staged configuration and reset every cached value
    pub async fn cleanup(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        self.stop_locked(&mut lifecycle).await;

        if let Some(staged) = lifecycle.staged.take() {
            if let Err(e) = staged.remove() {
                warn!("Failed to remove staged configuration: {}", e);
            }
        }

        self.shared.stats.reset();
        self.shared.should_stop.store(false, Ordering::Release);
        debug!("Bridge state reset");
    }

    /// Whether a worker is active (lock-free)
    pub fn is_running(&self) -> bool {
        self.shared.active_generation.load(Ordering::Acquire) != 0
    }

    /// Whether the last session was asked to stop
    pub fn stop_requested(&self) -> bool {
        self.shared.should_stop.load(Ordering::Acquire)
    }

    /// Current lifecycle phase
    ///
    /// Idle whenever no session is active, except while `start` is
    /// launching one.
    pub fn state(&self) -> LifecycleState {
        let phase = LifecycleState::from_u8(self.shared.phase.load(Ordering::Acquire));
        match (self.is_running(), phase) {
            (false, LifecycleState::Starting) => LifecycleState::Starting,
            (false, _) => LifecycleState::Idle,
            // A finished session released after the new one was marked active
            (true, LifecycleState::Idle) => LifecycleState::Running,
            (true, phase) => phase,
        }
    }

    /// Cached statistics; all zero while idle
    pub fn get_stats(&self) -> StatsSnapshot {
        if self.is_running() {
            self.shared.stats.snapshot(true)
        } else {
            StatsSnapshot::default()
        }
    }

    /// Last cached 10-second hash rate
    ///
    /// Unlike [`BridgeController::get_stats`] this is not zeroed while idle:
    /// the rate of a stopped session, or one pushed through `update_stats`,
    /// stays readable until `cleanup`.
    pub fn get_hashrate(&self) -> f64 {
        self.shared.stats.hashrate_10s()
    }

    /// Push fresher statistics from an outside observer; last write wins
    pub fn update_stats(
        &self,
        hashrate_10s: f64,
        hashrate_60s: f64,
        hashrate_15m: f64,
        accepted: u64,
        rejected: u64,
        threads: u32,
    ) {
        self.shared
            .stats
            .update(hashrate_10s, hashrate_60s, hashrate_15m, accepted, rejected, threads);
    }

    /// Set the desired thread count
    ///
    /// Only the cached value changes; a running worker keeps the settings it
    /// was started with. Stage a new configuration and restart to apply.
    pub fn set_threads(&self, threads: u32) {
        debug!("Desired thread count set to {}", threads);
        self.shared.stats.set_threads(threads);
    }

    /// Stats cache shared with the worker
    pub fn stats_cache(&self) -> Arc<StatsCache> {
        Arc::clone(&self.shared.stats)
    }

    /// Staged configuration location, if any
    pub async fn staged_config_path(&self) -> Option<PathBuf> {
        self.lifecycle
            .lock()
            .await
            .staged
            .as_ref()
            .map(StagedConfig::path_buf)
    }

    /// Active session, if any
    pub fn session(&self) -> Option<SessionInfo> {
        *self.shared.session.lock()
    }

    /// Identifier of the active session
    pub fn session_id(&self) -> Option<Uuid> {
        self.session().map(|s| s.id)
    }

    /// Time since the active session started
    pub fn uptime(&self) -> Option<Duration> {
        self.session()
            .and_then(|s| (Utc::now() - s.started_at).to_std().ok())
    }

    /// How the most recent session ended
    pub fn last_exit(&self) -> Option<SessionExit> {
        self.shared.last_exit.lock().clone()
    }
}

impl Drop for BridgeController {
    fn drop(&mut self) {
        if let Some(session) = &self.lifecycle.get_mut().session {
            session.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::SimulationWorker;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::path::Path;
    use tempfile::TempDir;

    /// Ignores cancellation and returns after `linger`
    struct StubbornWorker {
        linger: Duration,
    }

    #[async_trait]
    impl MiningWorker for StubbornWorker {
        fn worker_type(&self) -> &'static str {
            "stubborn"
        }

        async fn run(&self, _session: WorkerSession) -> Result<()> {
            tokio::time::sleep(self.linger).await;
            Ok(())
        }
    }

    /// First run ignores cancellation for 150ms, later runs for much longer
    struct SlowThenStuckWorker {
        calls: AtomicU64,
    }

    #[async_trait]
    impl MiningWorker for SlowThenStuckWorker {
        fn worker_type(&self) -> &'static str {
            "slow"
        }

        async fn run(&self, _session: WorkerSession) -> Result<()> {
            let linger = match self.calls.fetch_add(1, Ordering::SeqCst) {
                0 => Duration::from_millis(150),
                _ => Duration::from_secs(30),
            };
            tokio::time::sleep(linger).await;
            Ok(())
        }
    }

    /// Fails as soon as it runs
    struct FailingWorker;

    #[async_trait]
    impl MiningWorker for FailingWorker {
        fn worker_type(&self) -> &'static str {
            "failing"
        }

        async fn run(&self, _session: WorkerSession) -> Result<()> {
            Err(Error::external_process("engine crashed"))
        }
    }

    /// Fails its preflight check
    struct UnlaunchableWorker;

    #[async_trait]
    impl MiningWorker for UnlaunchableWorker {
        fn worker_type(&self) -> &'static str {
            "unlaunchable"
        }

        fn prepare(&self, _config_path: &Path) -> Result<()> {
            Err(Error::config("no engine binary"))
        }

        async fn run(&self, _session: WorkerSession) -> Result<()> {
            unreachable!("prepare always fails")
        }
    }

    fn controller(worker: Arc<dyn MiningWorker>, grace: Duration) -> (BridgeController, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let settings = ControllerSettings {
            staging_dir: dir.path().to_path_buf(),
            grace_period: grace,
        };
        (BridgeController::new(worker, settings), dir)
    }

    fn simulation() -> Arc<dyn MiningWorker> {
        Arc::new(SimulationWorker::new(1000.0))
    }

    #[tokio::test]
    async fn test_initial_state() {
        let (controller, _dir) = controller(simulation(), DEFAULT_GRACE_PERIOD);
        assert!(!controller.is_running());
        assert_eq!(controller.state(), LifecycleState::Idle);
        assert_eq!(controller.get_stats(), StatsSnapshot::default());
        assert!(controller.session().is_none());
        assert!(controller.last_exit().is_none());
    }

    #[tokio::test]
    async fn test_start_stop_cycle() {
        let (controller, _dir) = controller(simulation(), DEFAULT_GRACE_PERIOD);
        controller.init(r#"{"cpu":true}"#).await.unwrap();
        controller.start().await.unwrap();

        assert!(controller.is_running());
        assert_eq!(controller.state(), LifecycleState::Running);
        assert!(controller.get_stats().is_mining);
        assert!(controller.session().is_some());

        assert_eq!(controller.stop().await, StopOutcome::Terminated);
        assert!(!controller.is_running());
        assert_eq!(controller.state(), LifecycleState::Idle);
        assert!(controller.stop_requested());
        assert_matches!(
            controller.last_exit(),
            Some(SessionExit { exit: WorkerExit::Cancelled, .. })
        );
    }

    #[tokio::test]
    async fn test_init_while_running_rejected() {
        let (controller, _dir) = controller(simulation(), DEFAULT_GRACE_PERIOD);
        controller.init("{}").await.unwrap();
        controller.start().await.unwrap();

        assert_matches!(controller.init("{}").await, Err(Error::AlreadyRunning));
        controller.cleanup().await;
    }

    #[tokio::test]
    async fn test_reinit_replaces_staged_file() {
        let (controller, _dir) = controller(simulation(), DEFAULT_GRACE_PERIOD);
        controller.init(r#"{"a":1}"#).await.unwrap();
        let first = controller.staged_config_path().await.unwrap();

        controller.init(r#"{"b":2}"#).await.unwrap();
        let second = controller.staged_config_path().await.unwrap();

        assert_ne!(first, second);
        assert!(!first.exists());
        assert_eq!(std::fs::read_to_string(&second).unwrap(), r#"{"b":2}"#);
    }

    #[tokio::test]
    async fn test_failed_init_keeps_previous_config() {
        let (controller, _dir) = controller(simulation(), DEFAULT_GRACE_PERIOD);
        controller.init("{}").await.unwrap();
        let staged = controller.staged_config_path().await.unwrap();

        assert_matches!(controller.init("").await, Err(Error::InvalidConfig { .. }));
        assert_eq!(controller.staged_config_path().await, Some(staged));
    }

    #[tokio::test]
    async fn test_preflight_failure_is_spawn_failure() {
        let (controller, _dir) = controller(Arc::new(UnlaunchableWorker), DEFAULT_GRACE_PERIOD);
        controller.init("{}").await.unwrap();

        assert_matches!(controller.start().await, Err(Error::SpawnFailed { .. }));
        assert!(!controller.is_running());
        assert_eq!(controller.state(), LifecycleState::Idle);
    }

    #[tokio::test]
    async fn test_worker_failure_clears_running_flag() {
        let (controller, _dir) = controller(Arc::new(FailingWorker), DEFAULT_GRACE_PERIOD);
        controller.init("{}").await.unwrap();
        controller.start().await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            while controller.is_running() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        assert_matches!(
            controller.last_exit(),
            Some(SessionExit { exit: WorkerExit::Failed(_), .. })
        );
        assert_eq!(controller.stop().await, StopOutcome::NotRunning);
    }

    #[tokio::test]
    async fn test_stubborn_worker_reports_grace_elapsed() {
        let worker = Arc::new(StubbornWorker {
            linger: Duration::from_millis(400),
        });
        let (controller, _dir) = controller(worker, Duration::from_millis(50));
        controller.init("{}").await.unwrap();
        controller.start().await.unwrap();

        assert_eq!(controller.stop().await, StopOutcome::GraceElapsed);
        assert!(!controller.is_running());
        assert_eq!(controller.state(), LifecycleState::Idle);
        assert!(controller.stop_requested());
    }

    #[tokio::test]
    async fn test_late_worker_does_not_clear_new_session() {
        let worker = Arc::new(SlowThenStuckWorker {
            calls: AtomicU64::new(0),
        });
        let (controller, _dir) = controller(worker, Duration::from_millis(20));
        controller.init("{}").await.unwrap();

        controller.start().await.unwrap();
        let first = controller.session().unwrap();
        assert_eq!(controller.stop().await, StopOutcome::GraceElapsed);

        controller.start().await.unwrap();
        let second = controller.session().unwrap();
        assert_ne!(first.id, second.id);

        // First worker finishes here, second one is still lingering
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(controller.is_running());
        assert_eq!(controller.state(), LifecycleState::Running);
        assert_eq!(controller.session_id(), Some(second.id));
        assert!(controller.last_exit().is_none());

        controller.cleanup().await;
    }

    #[tokio::test]
    async fn test_threads_snapshot_while_running() {
        let (controller, _dir) = controller(simulation(), DEFAULT_GRACE_PERIOD);
        controller.set_threads(4);
        controller.init("{}").await.unwrap();
        assert_eq!(controller.get_stats().threads, 0);

        controller.start().await.unwrap();
        assert_eq!(controller.get_stats().threads, 4);

        controller.cleanup().await;
        assert_eq!(controller.get_stats(), StatsSnapshot::default());
    }

    #[tokio::test]
    async fn test_update_stats_visible_while_running() {
        let (controller, _dir) = controller(
            Arc::new(StubbornWorker {
                linger: Duration::from_secs(30),
            }),
            Duration::from_millis(20),
        );
        controller.init("{}").await.unwrap();
        controller.start().await.unwrap();

        controller.update_stats(120.5, 110.0, 100.0, 9, 1, 3);
        let snapshot = controller.get_stats();
        assert_eq!(snapshot.hashrate_10s, 120.5);
        assert_eq!(snapshot.accepted_shares, 9);
        assert_eq!(snapshot.threads, 3);
        assert_eq!(controller.get_hashrate(), 120.5);

        assert_eq!(controller.stop().await, StopOutcome::GraceElapsed);
        assert_eq!(controller.get_stats(), StatsSnapshot::default());
        assert_eq!(controller.get_hashrate(), 120.5);

        controller.cleanup().await;
        assert_eq!(controller.get_hashrate(), 0.0);
    }

    #[tokio::test]
    async fn test_hashrate_pushed_while_idle() {
        let (controller, _dir) = controller(simulation(), DEFAULT_GRACE_PERIOD);
        controller.update_stats(123.0, 100.0, 90.0, 1, 0, 2);

        assert!(!controller.is_running());
        assert_eq!(controller.get_hashrate(), 123.0);
        assert_eq!(controller.get_stats().hashrate_10s, 0.0);
    }

    #[tokio::test]
    async fn test_state_is_idle_once_released() {
        let (controller, _dir) = controller(simulation(), DEFAULT_GRACE_PERIOD);
        controller.init("{}").await.unwrap();
        controller.start().await.unwrap();

        // A stale phase must not outlive the session
        controller.shared.set_phase(LifecycleState::StopRequested);
        assert_eq!(controller.state(), LifecycleState::StopRequested);
        assert!(controller.shared.release(controller.session().unwrap().generation));
        controller.shared.set_phase(LifecycleState::StopRequested);
        assert_eq!(controller.state(), LifecycleState::Idle);

        assert_eq!(controller.stop().await, StopOutcome::NotRunning);
        assert_eq!(controller.state(), LifecycleState::Idle);
    }

    #[tokio::test]
    async fn test_uptime_tracks_session() {
        let (controller, _dir) = controller(simulation(), DEFAULT_GRACE_PERIOD);
        assert!(controller.uptime().is_none());

        controller.init("{}").await.unwrap();
        controller.start().await.unwrap();
        assert!(controller.uptime().is_some());

        controller.stop().await;
        assert!(controller.uptime().is_none());
    }
}

//! Foreign interfaces
//!
//! Hosts that cannot hold a [`BridgeController`] themselves (Swift through the
//! C ABI, Kotlin through JNI) share one process-wide [`Bridge`]: a small
//! multi-thread tokio runtime plus a controller driving the engine executable.
//! It is built on first use; entry points block on the async controller
//! methods from whatever thread the host calls them on.

pub mod c_api;
#[cfg(target_os = "android")]
pub mod jni;

use crate::controller::{BridgeController, ControllerSettings};
use crate::error::status;
use crate::worker::ExternalWorker;
use crate::{Error, Result};
use once_cell::sync::OnceCell;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::warn;

/// Environment variable overriding the default engine executable
pub const ENGINE_PATH_ENV: &str = "XMRIG_BRIDGE_ENGINE";

/// Environment variable with the log filter used by `xmrig_init_logging`
pub const LOG_FILTER_ENV: &str = "XMRIG_BRIDGE_LOG";

const DEFAULT_ENGINE: &str = "xmrig";
const RUNTIME_THREADS: usize = 2;

static BRIDGE: OnceCell<Bridge> = OnceCell::new();

/// Runtime and controller behind the foreign interfaces
pub struct Bridge {
    runtime: Runtime,
    engine: Arc<ExternalWorker>,
    controller: BridgeController,
}

impl Bridge {
    fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(RUNTIME_THREADS)
            .thread_name("xmrig-bridge")
            .enable_all()
            .build()
            .map_err(|e| Error::runtime(format!("failed to build tokio runtime: {}", e)))?;

        let engine_path = std::env::var_os(ENGINE_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE));
        let engine = Arc::new(ExternalWorker::new(engine_path));
        let controller = BridgeController::new(engine.clone(), ControllerSettings::default());

        Ok(Self {
            runtime,
            engine,
            controller,
        })
    }

    /// The shared controller
    pub fn controller(&self) -> &BridgeController {
        &self.controller
    }

    /// The engine worker, for changing the executable path
    pub fn engine(&self) -> &ExternalWorker {
        &self.engine
    }

    /// Run `future` to completion on the bridge runtime
    ///
    /// Must not be called from a thread owned by the runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// Process-wide bridge, built on first use
pub fn bridge() -> Result<&'static Bridge> {
    BRIDGE.get_or_try_init(Bridge::new)
}

/// Status code for an operation result, logging failures
pub(crate) fn status_of(operation: &str, result: Result<()>) -> i32 {
    match result {
        Ok(()) => status::OK,
        Err(e) => {
            warn!("{} failed [{}]: {}", operation, e.category(), e);
            e.status_code()
        }
    }
}

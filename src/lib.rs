//! XMRig Bridge
//!
//! Control surface for driving an external XMRig mining engine from a host
//! application:
//! - Stage an engine configuration and start/stop the engine as a supervised worker
//! - Lock-free status and statistics queries from any thread
//! - Statistics pushed by the host or scraped from the engine's output
//! - CPU capability probing for thread-count recommendations
//! - C ABI for Swift/Objective-C hosts and JNI bindings for Android
//!
//! The Rust API is [`BridgeController`]; the foreign interfaces in [`ffi`] wrap
//! one process-wide controller instance.

pub mod capability;
pub mod config;
pub mod controller;
pub mod error;
pub mod ffi;
pub mod log_parser;
pub mod staging;
pub mod stats;
pub mod utils;
pub mod worker;

pub use config::{Config, MiningConfig, WorkerType};
pub use controller::{BridgeController, ControllerSettings, LifecycleState, StopOutcome};
pub use error::{Error, Result};
pub use stats::{StatsCache, StatsSnapshot};

/// Application information
pub const APP_NAME: &str = "xmrig-bridge";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Commonly used items
pub mod prelude {
    pub use crate::capability::CpuCapabilities;
    pub use crate::controller::{BridgeController, ControllerSettings, StopOutcome};
    pub use crate::error::{Error, Result};
    pub use crate::stats::StatsSnapshot;
    pub use crate::worker::{ExternalWorker, MiningWorker, SimulationWorker};
}

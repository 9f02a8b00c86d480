//! C ABI
//!
//! Declared in `include/xmrig_bridge.h`. Functions returning `int` report
//! one of the [`crate::error::status`] codes; everything else cannot fail from
//! the caller's point of view and degrades to zero/false values when the
//! bridge runtime is unavailable.

use super::{bridge, status_of, LOG_FILTER_ENV};
use crate::capability;
use crate::stats::StatsSnapshot;
use crate::utils::logging::{init_logging, LogFormat};
use crate::{Error, Result};
use once_cell::sync::{Lazy, OnceCell};
use std::ffi::{c_char, c_int, CStr, CString};
use std::path::Path;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;

static VERSION: Lazy<CString> = Lazy::new(|| to_c_string(capability::version()));
static CPU_INFO: Lazy<CString> = Lazy::new(|| to_c_string(&capability::cpu_info()));
static LOG_GUARD: OnceCell<Option<WorkerGuard>> = OnceCell::new();

/// Mining statistics as laid out for C callers
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct XMRigStats {
    pub hashrate_10s: f64,
    pub hashrate_60s: f64,
    pub hashrate_15m: f64,
    pub total_hashes: u64,
    pub accepted_shares: u64,
    pub rejected_shares: u64,
    pub is_mining: bool,
    pub threads: c_int,
}

impl From<StatsSnapshot> for XMRigStats {
    fn from(snapshot: StatsSnapshot) -> Self {
        Self {
            hashrate_10s: snapshot.hashrate_10s,
            hashrate_60s: snapshot.hashrate_60s,
            hashrate_15m: snapshot.hashrate_15m,
            total_hashes: snapshot.total_hashes,
            accepted_shares: snapshot.accepted_shares,
            rejected_shares: snapshot.rejected_shares,
            is_mining: snapshot.is_mining,
            threads: c_int::try_from(snapshot.threads).unwrap_or(c_int::MAX),
        }
    }
}

/// Stage a JSON engine configuration for the next `xmrig_start`
///
/// # Safety
///
/// `config_json` must be null or point to a NUL-terminated string that stays
/// valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn xmrig_init(config_json: *const c_char) -> c_int {
    let result = str_arg(config_json, "config_json").and_then(|payload| {
        let bridge = bridge()?;
        bridge.block_on(bridge.controller().init(payload))
    });
    status_of("xmrig_init", result)
}

/// Start the engine on the staged configuration
#[no_mangle]
pub extern "C" fn xmrig_start() -> c_int {
    let result = bridge().and_then(|bridge| bridge.block_on(bridge.controller().start()));
    status_of("xmrig_start", result)
}

/// Stop the engine; returns after at most the grace period
#[no_mangle]
pub extern "C" fn xmrig_stop() {
    match bridge() {
        Ok(bridge) => {
            let outcome = bridge.block_on(bridge.controller().stop());
            debug!("xmrig_stop: {:?}", outcome);
        }
        Err(e) => warn!("xmrig_stop: {}", e),
    }
}

/// Whether the engine is running
#[no_mangle]
pub extern "C" fn xmrig_is_running() -> bool {
    bridge().is_ok_and(|bridge| bridge.controller().is_running())
}

/// Copy the cached statistics into `stats`
///
/// # Safety
///
/// `stats` must be null or point to writable memory for one `XMRigStats`.
#[no_mangle]
pub unsafe extern "C" fn xmrig_get_stats(stats: *mut XMRigStats) {
    if stats.is_null() {
        return;
    }
    let snapshot = bridge()
        .map(|bridge| bridge.controller().get_stats())
        .unwrap_or_default();
    // SAFETY: non-null and writable per the function contract.
    unsafe { stats.write(XMRigStats::from(snapshot)) };
}

/// 10-second hash rate in H/s
#[no_mangle]
pub extern "C" fn xmrig_get_hashrate() -> f64 {
    bridge().map_or(0.0, |bridge| bridge.controller().get_hashrate())
}

/// Desired thread count for the next start; negative values count as 0 (auto)
#[no_mangle]
pub extern "C" fn xmrig_set_threads(threads: c_int) {
    if let Ok(bridge) = bridge() {
        bridge.controller().set_threads(u32::try_from(threads).unwrap_or(0));
    }
}

/// Stop the engine, delete the staged configuration and reset statistics
#[no_mangle]
pub extern "C" fn xmrig_cleanup() {
    match bridge() {
        Ok(bridge) => bridge.block_on(bridge.controller().cleanup()),
        Err(e) => warn!("xmrig_cleanup: {}", e),
    }
}

/// Engine version; the string is static
#[no_mangle]
pub extern "C" fn xmrig_version() -> *const c_char {
    VERSION.as_ptr()
}

/// Overwrite the cached statistics with values observed by the host
#[no_mangle]
pub extern "C" fn xmrig_update_stats(
    hashrate_10s: f64,
    hashrate_60s: f64,
    hashrate_15m: f64,
    accepted: u64,
    rejected: u64,
    threads: c_int,
) {
    if let Ok(bridge) = bridge() {
        bridge.controller().update_stats(
            hashrate_10s,
            hashrate_60s,
            hashrate_15m,
            accepted,
            rejected,
            u32::try_from(threads).unwrap_or(0),
        );
    }
}

/// Engine executable used by the next start
///
/// # Safety
///
/// `path` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn xmrig_set_engine_path(path: *const c_char) -> c_int {
    let result = str_arg(path, "path").and_then(|path| {
        if path.trim().is_empty() {
            return Err(Error::invalid_config("engine path is empty"));
        }
        bridge()?.engine().set_engine_path(path);
        Ok(())
    });
    status_of("xmrig_set_engine_path", result)
}

/// Logical processor count
#[no_mangle]
pub extern "C" fn xmrig_cpu_cores() -> c_int {
    c_int::try_from(capability::cpu_core_count()).unwrap_or(c_int::MAX)
}

/// Core count and architecture label; the string is static
#[no_mangle]
pub extern "C" fn xmrig_cpu_info() -> *const c_char {
    CPU_INFO.as_ptr()
}

/// Whether the CPU exposes AES/SHA instructions
#[no_mangle]
pub extern "C" fn xmrig_has_crypto_extensions() -> bool {
    capability::has_crypto_extensions()
}

/// Install logging; `log_dir` may be null for console output only
///
/// The filter comes from `XMRIG_BRIDGE_LOG` (default `info`). Calling it again
/// after a successful call does nothing.
///
/// # Safety
///
/// `log_dir` must be null or point to a NUL-terminated string that stays
/// valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn xmrig_init_logging(log_dir: *const c_char) -> c_int {
    let result = optional_str_arg(log_dir, "log_dir").and_then(|log_dir| {
        LOG_GUARD
            .get_or_try_init(|| {
                let filter = std::env::var(LOG_FILTER_ENV).unwrap_or_else(|_| "info".to_string());
                init_logging(&filter, LogFormat::Compact, log_dir.map(Path::new))
            })
            .map(|_| ())
    });
    status_of("xmrig_init_logging", result)
}

/// Borrow a required string argument
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string valid for `'a`.
unsafe fn str_arg<'a>(ptr: *const c_char, name: &str) -> Result<&'a str> {
    // SAFETY: forwarded from the caller.
    unsafe { optional_str_arg(ptr, name) }?
        .ok_or_else(|| Error::invalid_config(format!("{} is null", name)))
}

/// Borrow an optional string argument
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string valid for `'a`.
unsafe fn optional_str_arg<'a>(ptr: *const c_char, name: &str) -> Result<Option<&'a str>> {
    if ptr.is_null() {
        return Ok(None);
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    let value = unsafe { CStr::from_ptr(ptr) };
    value
        .to_str()
        .map(Some)
        .map_err(|e| Error::invalid_config(format!("{} is not valid UTF-8: {}", name, e)))
}

fn to_c_string(value: &str) -> CString {
    CString::new(value.replace('\0', "")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::status;
    use std::ptr;

    #[test]
    fn test_version_is_static_c_string() {
        let version = unsafe { CStr::from_ptr(xmrig_version()) };
        assert_eq!(version.to_str().unwrap(), "6.25.0");
        assert_eq!(xmrig_version(), xmrig_version());
    }

    #[test]
    fn test_cpu_queries() {
        assert!(xmrig_cpu_cores() >= 1);
        let info = unsafe { CStr::from_ptr(xmrig_cpu_info()) };
        assert!(info.to_str().unwrap().starts_with("Cores: "));
    }

    #[test]
    fn test_null_arguments_rejected() {
        assert_eq!(unsafe { xmrig_init(ptr::null()) }, status::INVALID_CONFIG);
        assert_eq!(unsafe { xmrig_set_engine_path(ptr::null()) }, status::INVALID_CONFIG);
        // Null output pointer is ignored
        unsafe { xmrig_get_stats(ptr::null_mut()) };
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let bytes = [0xffu8, 0xfe, 0x00];
        let result = unsafe { str_arg(bytes.as_ptr().cast(), "config_json") };
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_stats_conversion() {
        let snapshot = StatsSnapshot {
            hashrate_10s: 812.5,
            accepted_shares: 3,
            is_mining: true,
            threads: 6,
            ..StatsSnapshot::default()
        };
        let stats = XMRigStats::from(snapshot);
        assert_eq!(stats.hashrate_10s, 812.5);
        assert_eq!(stats.accepted_shares, 3);
        assert!(stats.is_mining);
        assert_eq!(stats.threads, 6);
        assert_eq!(XMRigStats::from(StatsSnapshot::default()), XMRigStats::default());
    }

    #[test]
    fn test_status_helper() {
        assert_eq!(status_of("op", Ok(())), status::OK);
        assert_eq!(status_of("op", Err(Error::NotConfigured)), status::NOT_CONFIGURED);
    }
}

//! JNI bindings for Android
//!
//! Native methods of `org.xmrigbridge.NativeBridge`:
//!
//! ```kotlin
//! object NativeBridge {
//!     init { System.loadLibrary("xmrig_bridge") }
//!     @JvmStatic external fun nativeInit(configJson: String): Int
//!     @JvmStatic external fun nativeStart(): Int
//!     @JvmStatic external fun nativeStop()
//!     @JvmStatic external fun nativeIsRunning(): Boolean
//!     @JvmStatic external fun nativeGetStats(): DoubleArray
//!     @JvmStatic external fun nativeGetHashrate(): Double
//!     @JvmStatic external fun nativeSetThreads(threads: Int)
//!     @JvmStatic external fun nativeCleanup()
//!     @JvmStatic external fun nativeUpdateStats(h10s: Double, h60s: Double, h15m: Double, accepted: Long, rejected: Long, threads: Int)
//!     @JvmStatic external fun nativeSetEnginePath(path: String): Int
//!     @JvmStatic external fun getVersion(): String
//!     @JvmStatic external fun getCpuCores(): Int
//!     @JvmStatic external fun getCpuInfo(): String
//!     @JvmStatic external fun hasCryptoExtensions(): Boolean
//! }
//! ```
//!
//! `nativeGetStats` returns eight values in `XMRigStats` field order, with
//! `is_mining` as 0.0/1.0. The engine path is usually
//! `nativeLibraryDir + "/libxmrig.so"`.

use super::{bridge, status_of};
use crate::capability;
use crate::stats::StatsSnapshot;
use crate::Error;
use jni::objects::{JClass, JString};
use jni::sys::{jboolean, jdouble, jdoubleArray, jint, jlong, jstring, JNI_FALSE, JNI_TRUE};
use jni::JNIEnv;
use std::ptr;
use tracing::{debug, warn};

const STATS_SLOTS: usize = 8;

fn to_jboolean(value: bool) -> jboolean {
    if value {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

fn read_string(env: &mut JNIEnv, value: &JString, name: &str) -> crate::Result<String> {
    if value.is_null() {
        return Err(Error::invalid_config(format!("{} is null", name)));
    }
    env.get_string(value)
        .map(Into::into)
        .map_err(|e| Error::invalid_config(format!("{} could not be read: {}", name, e)))
}

fn new_string(env: &mut JNIEnv, value: &str) -> jstring {
    match env.new_string(value) {
        Ok(string) => string.into_raw(),
        Err(e) => {
            warn!("Failed to allocate Java string: {}", e);
            ptr::null_mut()
        }
    }
}

fn stats_slots(snapshot: &StatsSnapshot) -> [jdouble; STATS_SLOTS] {
    [
        snapshot.hashrate_10s,
        snapshot.hashrate_60s,
        snapshot.hashrate_15m,
        snapshot.total_hashes as jdouble,
        snapshot.accepted_shares as jdouble,
        snapshot.rejected_shares as jdouble,
        if snapshot.is_mining { 1.0 } else { 0.0 },
        snapshot.threads as jdouble,
    ]
}

#[no_mangle]
pub extern "system" fn Java_org_xmrigbridge_NativeBridge_nativeInit(
    mut env: JNIEnv,
    _class: JClass,
    config_json: JString,
) -> jint {
    let result = read_string(&mut env, &config_json, "configJson").and_then(|payload| {
        let bridge = bridge()?;
        bridge.block_on(bridge.controller().init(&payload))
    });
    status_of("nativeInit", result)
}

#[no_mangle]
pub extern "system" fn Java_org_xmrigbridge_NativeBridge_nativeStart(
    _env: JNIEnv,
    _class: JClass,
) -> jint {
    let result = bridge().and_then(|bridge| bridge.block_on(bridge.controller().start()));
    status_of("nativeStart", result)
}

#[no_mangle]
pub extern "system" fn Java_org_xmrigbridge_NativeBridge_nativeStop(_env: JNIEnv, _class: JClass) {
    match bridge() {
        Ok(bridge) => {
            let outcome = bridge.block_on(bridge.controller().stop());
            debug!("nativeStop: {:?}", outcome);
        }
        Err(e) => warn!("nativeStop: {}", e),
    }
}

#[no_mangle]
pub extern "system" fn Java_org_xmrigbridge_NativeBridge_nativeIsRunning(
    _env: JNIEnv,
    _class: JClass,
) -> jboolean {
    to_jboolean(bridge().is_ok_and(|bridge| bridge.controller().is_running()))
}

#[no_mangle]
pub extern "system" fn Java_org_xmrigbridge_NativeBridge_nativeGetStats(
    mut env: JNIEnv,
    _class: JClass,
) -> jdoubleArray {
    let snapshot = bridge()
        .map(|bridge| bridge.controller().get_stats())
        .unwrap_or_default();
    let slots = stats_slots(&snapshot);

    let array = match env.new_double_array(STATS_SLOTS as i32) {
        Ok(array) => array,
        Err(e) => {
            warn!("Failed to allocate stats array: {}", e);
            return ptr::null_mut();
        }
    };
    if let Err(e) = env.set_double_array_region(&array, 0, &slots) {
        warn!("Failed to fill stats array: {}", e);
        return ptr::null_mut();
    }
    array.into_raw()
}

#[no_mangle]
pub extern "system" fn Java_org_xmrigbridge_NativeBridge_nativeGetHashrate(
    _env: JNIEnv,
    _class: JClass,
) -> jdouble {
    bridge().map_or(0.0, |bridge| bridge.controller().get_hashrate())
}

#[no_mangle]
pub extern "system" fn Java_org_xmrigbridge_NativeBridge_nativeSetThreads(
    _env: JNIEnv,
    _class: JClass,
    threads: jint,
) {
    if let Ok(bridge) = bridge() {
        bridge.controller().set_threads(u32::try_from(threads).unwrap_or(0));
    }
}

#[no_mangle]
pub extern "system" fn Java_org_xmrigbridge_NativeBridge_nativeCleanup(_env: JNIEnv, _class: JClass) {
    match bridge() {
        Ok(bridge) => bridge.block_on(bridge.controller().cleanup()),
        Err(e) => warn!("nativeCleanup: {}", e),
    }
}

#[no_mangle]
pub extern "system" fn Java_org_xmrigbridge_NativeBridge_nativeUpdateStats(
    _env: JNIEnv,
    _class: JClass,
    hashrate_10s: jdouble,
    hashrate_60s: jdouble,
    hashrate_15m: jdouble,
    accepted: jlong,
    rejected: jlong,
    threads: jint,
) {
    if let Ok(bridge) = bridge() {
        bridge.controller().update_stats(
            hashrate_10s,
            hashrate_60s,
            hashrate_15m,
            u64::try_from(accepted).unwrap_or(0),
            u64::try_from(rejected).unwrap_or(0),
            u32::try_from(threads).unwrap_or(0),
        );
    }
}

#[no_mangle]
pub extern "system" fn Java_org_xmrigbridge_NativeBridge_nativeSetEnginePath(
    mut env: JNIEnv,
    _class: JClass,
    path: JString,
) -> jint {
    let result = read_string(&mut env, &path, "path").and_then(|path| {
        if path.trim().is_empty() {
            return Err(Error::invalid_config("engine path is empty"));
        }
        bridge()?.engine().set_engine_path(path);
        Ok(())
    });
    status_of("nativeSetEnginePath", result)
}

#[no_mangle]
pub extern "system" fn Java_org_xmrigbridge_NativeBridge_getVersion(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    new_string(&mut env, &capability::version_label())
}

#[no_mangle]
pub extern "system" fn Java_org_xmrigbridge_NativeBridge_getCpuCores(
    _env: JNIEnv,
    _class: JClass,
) -> jint {
    jint::try_from(capability::cpu_core_count()).unwrap_or(jint::MAX)
}

#[no_mangle]
pub extern "system" fn Java_org_xmrigbridge_NativeBridge_getCpuInfo(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    new_string(&mut env, &capability::cpu_info())
}

#[no_mangle]
pub extern "system" fn Java_org_xmrigbridge_NativeBridge_hasCryptoExtensions(
    _env: JNIEnv,
    _class: JClass,
) -> jboolean {
    to_jboolean(capability::has_crypto_extensions())
}

//! Version and host capability queries
//!
//! Capabilities are probed at runtime and returned as a [`CpuCapabilities`]
//! descriptor, so formatting and derived flags can be tested with hand-built
//! descriptors on any build target.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;

/// Engine build this bridge is packaged with
pub const ENGINE_VERSION: &str = "6.25.0";

/// Bridge crate version
pub const BRIDGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Features that count as crypto extensions
const CRYPTO_FEATURES: &[&str] = &["aes", "sha2", "sha", "pmull", "pclmulqdq"];

static HOST: Lazy<CpuCapabilities> = Lazy::new(CpuCapabilities::probe);

/// Engine version string
pub fn version() -> &'static str {
    ENGINE_VERSION
}

/// Human readable build label
pub fn version_label() -> String {
    format!("XMRig {} (xmrig-bridge {})", ENGINE_VERSION, BRIDGE_VERSION)
}

/// Capabilities of the current host, probed once
pub fn host() -> &'static CpuCapabilities {
    &HOST
}

/// Logical processor count of the current host
pub fn cpu_core_count() -> usize {
    host().logical_cores
}

/// Core count and architecture label of the current host
pub fn cpu_info() -> String {
    host().describe()
}

/// Whether the current host exposes AES/SHA style instructions
pub fn has_crypto_extensions() -> bool {
    host().has_crypto_extensions()
}

/// Coarse CPU architecture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CpuArch {
    /// 64-bit ARM
    Arm64,
    /// 32-bit ARM
    Arm32,
    /// 64-bit x86
    X86_64,
    /// 32-bit x86
    X86,
    /// Anything else, with the target name
    Other(String),
}

impl CpuArch {
    /// Map a `std::env::consts::ARCH` style name
    pub fn from_target(arch: &str) -> Self {
        match arch {
            "aarch64" => CpuArch::Arm64,
            "arm" => CpuArch::Arm32,
            "x86_64" => CpuArch::X86_64,
            "x86" => CpuArch::X86,
            other => CpuArch::Other(other.to_string()),
        }
    }

    /// Architecture of the running binary
    pub fn current() -> Self {
        Self::from_target(std::env::consts::ARCH)
    }
}

impl fmt::Display for CpuArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuArch::Arm64 => write!(f, "ARM64 (AArch64)"),
            CpuArch::Arm32 => write!(f, "ARM32"),
            CpuArch::X86_64 => write!(f, "x86_64"),
            CpuArch::X86 => write!(f, "x86"),
            CpuArch::Other(name) => write!(f, "Unknown ({})", name),
        }
    }
}

/// Structured description of the host CPU
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuCapabilities {
    /// Logical processors
    pub logical_cores: usize,
    /// Physical cores
    pub physical_cores: usize,
    /// Architecture
    pub arch: CpuArch,
    /// Detected instruction set extensions
    pub features: Vec<&'static str>,
}

impl CpuCapabilities {
    /// Query the running host
    pub fn probe() -> Self {
        Self {
            logical_cores: num_cpus::get(),
            physical_cores: num_cpus::get_physical(),
            arch: CpuArch::current(),
            features: detect_features(),
        }
    }

    /// Whether any crypto extension was detected
    pub fn has_crypto_extensions(&self) -> bool {
        self.features.iter().any(|f| CRYPTO_FEATURES.contains(f))
    }

    /// `"Cores: N, Arch: <label>"`
    pub fn describe(&self) -> String {
        format!("Cores: {}, Arch: {}", self.logical_cores, self.arch)
    }

    /// Default engine thread count: leave one core for the host app
    pub fn recommended_threads(&self) -> u32 {
        self.logical_cores.saturating_sub(1).max(1) as u32
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn detect_features() -> Vec<&'static str> {
    let mut features = Vec::new();
    if is_x86_feature_detected!("sse2") {
        features.push("sse2");
    }
    if is_x86_feature_detected!("avx2") {
        features.push("avx2");
    }
    if is_x86_feature_detected!("aes") {
        features.push("aes");
    }
    if is_x86_feature_detected!("pclmulqdq") {
        features.push("pclmulqdq");
    }
    if is_x86_feature_detected!("sha") {
        features.push("sha");
    }
    features
}

#[cfg(target_arch = "aarch64")]
fn detect_features() -> Vec<&'static str> {
    let mut features = Vec::new();
    if std::arch::is_aarch64_feature_detected!("neon") {
        features.push("neon");
    }
    if std::arch::is_aarch64_feature_detected!("aes") {
        features.push("aes");
    }
    if std::arch::is_aarch64_feature_detected!("pmull") {
        features.push("pmull");
    }
    if std::arch::is_aarch64_feature_detected!("sha2") {
        features.push("sha2");
    }
    features
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
fn detect_features() -> Vec<&'static str> {
    Vec::new()
}

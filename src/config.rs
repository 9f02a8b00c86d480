//! Configuration management
//!
//! Two layers live here: [`MiningConfig`], the typed engine settings rendered
//! into the JSON payload that gets staged, and [`Config`], the host binary's
//! own settings taken from the command line, environment and an optional
//! YAML/JSON file.

use crate::capability;
use crate::controller::ControllerSettings;
use crate::utils::logging::LogFormat;
use crate::{Error, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Engine settings staged for the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Pool address, `host:port`
    pub pool_url: String,
    /// Payout wallet address
    pub wallet_address: String,
    /// Worker name sent as the pool password
    pub worker_name: String,
    /// Desired mining threads
    pub threads: u32,
    /// CPU usage hint in percent
    pub max_cpu_usage: u8,
    /// Connect to the pool over TLS
    pub use_tls: bool,
    /// Reconnect attempts before switching pools
    pub retries: u32,
    /// Seconds between reconnect attempts
    pub retry_pause: u32,
    /// Seconds between hash rate reports in the engine output
    pub print_time: u32,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            pool_url: "pool.supportxmr.com:3333".to_string(),
            wallet_address: String::new(),
            worker_name: "android".to_string(),
            threads: capability::host().recommended_threads(),
            max_cpu_usage: 75,
            use_tls: true,
            retries: 5,
            retry_pause: 5,
            print_time: 60,
        }
    }
}

impl MiningConfig {
    /// Check the settings the engine cannot run without
    pub fn validate(&self) -> Result<()> {
        if self.wallet_address.trim().is_empty() {
            return Err(Error::invalid_config("wallet address is not set"));
        }
        if self.pool_url.trim().is_empty() {
            return Err(Error::invalid_config("pool address is not set"));
        }
        if self.threads == 0 {
            return Err(Error::invalid_config("thread count must be greater than 0"));
        }
        if !(10..=100).contains(&self.max_cpu_usage) {
            return Err(Error::invalid_config("max CPU usage must be between 10 and 100"));
        }
        Ok(())
    }

    /// Render the engine's JSON configuration
    pub fn to_engine_json(&self) -> Result<String> {
        let document = json!({
            "autosave": false,
            "cpu": {
                "enabled": true,
                "max-threads-hint": self.max_cpu_usage,
                "priority": 1,
                "asm": true,
                "argon2-impl": "auto",
            },
            "pools": [{
                "url": self.pool_url,
                "user": self.wallet_address,
                "pass": self.worker_name,
                "keepalive": true,
                "tls": self.use_tls,
            }],
            "donate-level": 0,
            "log-file": null,
            "print-time": self.print_time,
            "health-print-time": self.print_time,
            "retries": self.retries,
            "retry-pause": self.retry_pause,
            "api": null,
            "http": null,
        });
        Ok(serde_json::to_string_pretty(&document)?)
    }
}

/// Worker types the host binary can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkerType {
    /// Run the engine executable
    External,
    /// In-process stand-in engine
    Simulation,
}

impl fmt::Display for WorkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerType::External => write!(f, "external"),
            WorkerType::Simulation => write!(f, "simulation"),
        }
    }
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// `EnvFilter` directive for this level
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Host binary configuration
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(
    name = "xmrig-bridge",
    version = env!("CARGO_PKG_VERSION"),
    about = "Drive an XMRig engine through the bridge controller",
    long_about = "Stages an engine configuration, starts the engine as a supervised worker, reports cached statistics and stops it cleanly on Ctrl-C"
)]
pub struct Config {
    /// Print program info and exit
    #[arg(long)]
    #[serde(skip)]
    pub info: bool,

    /// Print the parsed configuration and exit
    #[arg(long)]
    #[serde(skip)]
    pub print_config: bool,

    /// Configuration file path (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Engine JSON configuration to stage as-is (overrides the pool options)
    #[arg(long, value_name = "FILE")]
    pub engine_config: Option<PathBuf>,

    /// Pool address
    #[arg(short = 'o', long, env = "XMRIG_BRIDGE_POOL")]
    pub pool: Option<String>,

    /// Wallet address
    #[arg(short = 'u', long, env = "XMRIG_BRIDGE_WALLET")]
    pub wallet: Option<String>,

    /// Worker name
    #[arg(short = 'p', long, default_value = "desktop")]
    #[serde(default = "default_worker_name")]
    pub worker_name: String,

    /// Mining threads (default: cores - 1)
    #[arg(short = 't', long)]
    pub threads: Option<u32>,

    /// CPU usage hint in percent
    #[arg(long, default_value = "75")]
    #[serde(default = "default_max_cpu_usage")]
    pub max_cpu_usage: u8,

    /// Disable TLS to the pool
    #[arg(long)]
    #[serde(default)]
    pub no_tls: bool,

    /// Worker type
    #[arg(short = 'w', long, default_value = "external")]
    #[serde(default = "default_worker")]
    pub worker: WorkerType,

    /// Engine executable
    #[arg(long, env = "XMRIG_BRIDGE_ENGINE", default_value = "xmrig")]
    #[serde(default = "default_engine_path")]
    pub engine_path: PathBuf,

    /// Hash rate reported by the simulation worker (H/s)
    #[arg(long, default_value = "1000")]
    #[serde(default = "default_simulated_hash_rate")]
    pub simulated_hash_rate: f64,

    /// Wait after a stop request before reporting idle (e.g. "500ms")
    #[arg(long, default_value = "500ms")]
    #[serde(default = "default_grace_period")]
    pub grace_period: String,

    /// Interval between statistics reports (e.g. "10s")
    #[arg(long, default_value = "10s")]
    #[serde(default = "default_stats_interval")]
    pub stats_interval: String,

    /// Directory for staged configuration files (default: system temp dir)
    #[arg(long, value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Log level
    #[arg(short = 'l', long, default_value = "info")]
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, default_value = "compact")]
    #[serde(default)]
    pub log_format: LogFormat,

    /// Also write a daily rolling log file into this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Parse the command line and merge the config file if one is given
    pub async fn load() -> Result<Self> {
        let mut config = Self::parse();

        if let Some(config_file) = config.config_file.clone() {
            let file_config = Self::load_from_file(&config_file).await?;
            config = config.merge_with_file(file_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;

        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content).map_err(Error::from)
        } else {
            serde_yaml::from_str(&content).map_err(Error::from)
        }
    }

    /// Fill options left unset on the command line from the file
    fn merge_with_file(mut self, file_config: Self) -> Self {
        if self.engine_config.is_none() {
            self.engine_config = file_config.engine_config;
        }
        if self.pool.is_none() {
            self.pool = file_config.pool;
        }
        if self.wallet.is_none() {
            self.wallet = file_config.wallet;
        }
        if self.threads.is_none() {
            self.threads = file_config.threads;
        }
        if self.staging_dir.is_none() {
            self.staging_dir = file_config.staging_dir;
        }
        if self.log_dir.is_none() {
            self.log_dir = file_config.log_dir;
        }

        // Defaulted options: a value still equal to its default was not given
        prefer_file(&mut self.worker_name, file_config.worker_name, default_worker_name());
        prefer_file(&mut self.max_cpu_usage, file_config.max_cpu_usage, default_max_cpu_usage());
        prefer_file(&mut self.no_tls, file_config.no_tls, false);
        prefer_file(&mut self.worker, file_config.worker, default_worker());
        prefer_file(&mut self.engine_path, file_config.engine_path, default_engine_path());
        prefer_file(
            &mut self.simulated_hash_rate,
            file_config.simulated_hash_rate,
            default_simulated_hash_rate(),
        );
        prefer_file(&mut self.grace_period, file_config.grace_period, default_grace_period());
        prefer_file(&mut self.stats_interval, file_config.stats_interval, default_stats_interval());
        prefer_file(&mut self.log_level, file_config.log_level, default_log_level());
        prefer_file(&mut self.log_format, file_config.log_format, LogFormat::default());

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.grace_period_duration()?;
        self.stats_interval_duration()?;

        if self.threads == Some(0) {
            return Err(Error::config("Thread count must be greater than 0"));
        }

        if !self.simulated_hash_rate.is_finite() || self.simulated_hash_rate < 0.0 {
            return Err(Error::config("Simulated hash rate must be a positive number"));
        }

        if self.engine_config.is_none() && !self.info && !self.print_config {
            if self.worker == WorkerType::External && self.wallet.is_none() {
                return Err(Error::config(
                    "Either --engine-config or --wallet is required to run the engine",
                ));
            }
        }

        Ok(())
    }

    /// Parsed grace period
    pub fn grace_period_duration(&self) -> Result<Duration> {
        humantime::parse_duration(&self.grace_period)
            .map_err(|e| Error::config(format!("Invalid grace period '{}': {}", self.grace_period, e)))
    }

    /// Parsed statistics interval
    pub fn stats_interval_duration(&self) -> Result<Duration> {
        let interval = humantime::parse_duration(&self.stats_interval).map_err(|e| {
            Error::config(format!("Invalid stats interval '{}': {}", self.stats_interval, e))
        })?;
        if interval.is_zero() {
            return Err(Error::config("Stats interval must be greater than zero"));
        }
        Ok(interval)
    }

    /// Engine settings built from the pool options
    pub fn mining_config(&self) -> MiningConfig {
        let defaults = MiningConfig::default();
        MiningConfig {
            pool_url: self.pool.clone().unwrap_or(defaults.pool_url),
            wallet_address: self.wallet.clone().unwrap_or_default(),
            worker_name: self.worker_name.clone(),
            threads: self.threads.unwrap_or(defaults.threads),
            max_cpu_usage: self.max_cpu_usage,
            use_tls: !self.no_tls,
            ..defaults
        }
    }

    /// Payload to stage: the engine config file verbatim, or rendered pool options
    pub async fn engine_payload(&self) -> Result<String> {
        match &self.engine_config {
            Some(path) => Ok(tokio::fs::read_to_string(path).await?),
            None => {
                let mining = self.mining_config();
                if self.worker == WorkerType::External {
                    mining.validate()?;
                }
                mining.to_engine_json()
            }
        }
    }

    /// Controller settings derived from this configuration
    pub fn controller_settings(&self) -> Result<ControllerSettings> {
        Ok(ControllerSettings {
            staging_dir: self.staging_dir.clone().unwrap_or_else(std::env::temp_dir),
            grace_period: self.grace_period_duration()?,
        })
    }
}

/// Take the file's value when the command line left `current` at its default
fn prefer_file<T: PartialEq>(current: &mut T, from_file: T, default: T) {
    if *current == default {
        *current = from_file;
    }
}

// Default value functions for serde
fn default_worker_name() -> String { "desktop".to_string() }
fn default_max_cpu_usage() -> u8 { 75 }
fn default_worker() -> WorkerType { WorkerType::External }
fn default_engine_path() -> PathBuf { PathBuf::from("xmrig") }
fn default_simulated_hash_rate() -> f64 { 1000.0 }
fn default_grace_period() -> String { "500ms".to_string() }
fn default_stats_interval() -> String { "10s".to_string() }
fn default_log_level() -> LogLevel { LogLevel::Info }

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn wallet_config() -> MiningConfig {
        MiningConfig {
            wallet_address: "44AFFq5kSiGBoZ4NMDwYtN18obc8AemS33DBLWs3H7otXft3XjrpDtQGv7SqSsaBYBb98uNbr2VBBEt7f2wfn3RVGQBEP3A".to_string(),
            ..MiningConfig::default()
        }
    }

    #[test]
    fn test_mining_config_defaults() {
        let config = MiningConfig::default();
        assert_eq!(config.pool_url, "pool.supportxmr.com:3333");
        assert_eq!(config.max_cpu_usage, 75);
        assert!(config.use_tls);
        assert!(config.threads >= 1);
    }

    #[test]
    fn test_mining_config_validation() {
        assert!(wallet_config().validate().is_ok());
        assert_matches!(MiningConfig::default().validate(), Err(Error::InvalidConfig { .. }));

        let mut config = wallet_config();
        config.pool_url = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = wallet_config();
        config.threads = 0;
        assert!(config.validate().is_err());

        let mut config = wallet_config();
        config.max_cpu_usage = 5;
        assert!(config.validate().is_err());
        config.max_cpu_usage = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_engine_json() {
        let json = wallet_config().to_engine_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["donate-level"], 0);
        assert_eq!(value["autosave"], false);
        assert_eq!(value["cpu"]["max-threads-hint"], 75);
        assert_eq!(value["pools"][0]["url"], "pool.supportxmr.com:3333");
        assert_eq!(value["pools"][0]["pass"], "android");
        assert_eq!(value["pools"][0]["tls"], true);
        assert!(value["http"].is_null());
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::try_parse_from(["xmrig-bridge"]).unwrap();

        assert_eq!(config.worker, WorkerType::External);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.grace_period_duration().unwrap(), Duration::from_millis(500));
        assert_eq!(config.stats_interval_duration().unwrap(), Duration::from_secs(10));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_simulation_needs_no_wallet() {
        let config = Config::try_parse_from(["xmrig-bridge", "--worker", "simulation"]).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_durations() {
        let config = Config::try_parse_from([
            "xmrig-bridge",
            "--worker",
            "simulation",
            "--grace-period",
            "soon",
        ])
        .unwrap();
        assert_matches!(config.validate(), Err(Error::Config { .. }));

        let config = Config::try_parse_from([
            "xmrig-bridge",
            "--worker",
            "simulation",
            "--stats-interval",
            "0s",
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mining_config_from_cli() {
        let config = Config::try_parse_from([
            "xmrig-bridge",
            "-o",
            "pool.example:443",
            "-u",
            "wallet",
            "-t",
            "3",
            "--no-tls",
        ])
        .unwrap();

        let mining = config.mining_config();
        assert_eq!(mining.pool_url, "pool.example:443");
        assert_eq!(mining.wallet_address, "wallet");
        assert_eq!(mining.worker_name, "desktop");
        assert_eq!(mining.threads, 3);
        assert!(!mining.use_tls);
    }

    #[tokio::test]
    async fn test_config_from_yaml() {
        let yaml_content = r#"
pool: "pool.example:3333"
wallet: "wallet-from-file"
threads: 4
worker: simulation
engine_path: /opt/xmrig
grace_period: 2s
stats_interval: 5s
log_level: debug
log_format: json
no_tls: true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();

        let file_config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(file_config.worker, WorkerType::Simulation);

        let cli =
            Config::try_parse_from(["xmrig-bridge", "-t", "2", "--stats-interval", "30s"]).unwrap();
        let merged = cli.merge_with_file(file_config);

        assert_eq!(merged.pool.as_deref(), Some("pool.example:3333"));
        assert_eq!(merged.wallet.as_deref(), Some("wallet-from-file"));
        assert_eq!(merged.threads, Some(2));
        assert_eq!(merged.worker, WorkerType::Simulation);
        assert_eq!(merged.engine_path, PathBuf::from("/opt/xmrig"));
        assert_eq!(merged.grace_period_duration().unwrap(), Duration::from_secs(2));
        assert_eq!(merged.stats_interval_duration().unwrap(), Duration::from_secs(30));
        assert_eq!(merged.log_level, LogLevel::Debug);
        assert_eq!(merged.log_format, LogFormat::Json);
        assert!(merged.no_tls);
        assert_eq!(merged.worker_name, "desktop");
        assert!(merged.validate().is_ok());
    }

    #[tokio::test]
    async fn test_engine_payload_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, r#"{{"cpu":true}}"#).unwrap();

        let path = temp_file.path().to_string_lossy().to_string();
        let config = Config::try_parse_from(["xmrig-bridge", "--engine-config", &path]).unwrap();
        assert_eq!(config.engine_payload().await.unwrap(), r#"{"cpu":true}"#);
    }

    #[test]
    fn test_worker_type_display() {
        assert_eq!(WorkerType::External.to_string(), "external");
        assert_eq!(WorkerType::Simulation.to_string(), "simulation");
    }
}

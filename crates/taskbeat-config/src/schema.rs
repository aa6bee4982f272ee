//! Configuration schema definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub beat: BeatConfig,

    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Jobs declared in the configuration file.
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

/// Dispatch path configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Run every `apply_async` inline instead of submitting it.
    #[serde(default)]
    pub always_eager: bool,
}

/// Clock service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatConfig {
    /// Location of the persisted schedule.
    #[serde(default = "default_schedule_filename")]
    pub schedule_filename: String,

    /// Tick interval override in milliseconds.
    #[serde(default)]
    pub interval_ms: Option<u64>,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            schedule_filename: default_schedule_filename(),
            interval_ms: None,
        }
    }
}

impl BeatConfig {
    /// Schedule location with `~` expanded.
    pub fn schedule_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.schedule_filename).to_string())
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval_ms.map(Duration::from_millis)
    }
}

fn default_schedule_filename() -> String {
    "~/.taskbeat/schedule.json".to_string()
}

/// Local worker pool and result queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Jobs executing in parallel.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Outstanding results before the queue drains.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Per-handle wait when collecting a ready result.
    #[serde(default)]
    pub process_timeout_ms: Option<u64>,

    /// Logged for every collected result. Supports `{name}`, `{id}` and
    /// `{return_value}`.
    #[serde(default)]
    pub done_msg: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            limit: default_limit(),
            process_timeout_ms: None,
            done_msg: None,
        }
    }
}

impl PoolConfig {
    pub fn process_timeout(&self) -> Option<Duration> {
        self.process_timeout_ms.map(Duration::from_millis)
    }
}

fn default_concurrency() -> usize {
    4
}

fn default_limit() -> usize {
    16
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file; console only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LogConfig {
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file
            .as_deref()
            .map(|f| PathBuf::from(shellexpand::tilde(f).to_string()))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Host process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_pid_file")]
    pub pid_file: String,

    /// Fork into the background.
    #[serde(default)]
    pub detach: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            pid_file: default_pid_file(),
            detach: false,
        }
    }
}

impl DaemonConfig {
    pub fn pid_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.pid_file).to_string())
    }
}

fn default_pid_file() -> String {
    "~/.taskbeat/beat.pid".to_string()
}

/// A shell command job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,

    pub command: String,

    /// Recurrence in seconds; the job is only run on demand when unset.
    #[serde(default)]
    pub run_every_secs: Option<u64>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub routing_key: Option<String>,

    #[serde(default)]
    pub exchange: Option<String>,

    #[serde(default)]
    pub priority: Option<u8>,

    #[serde(default)]
    pub serializer: Option<String>,
}

impl JobConfig {
    pub fn run_every(&self) -> Option<Duration> {
        self.run_every_secs.map(Duration::from_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

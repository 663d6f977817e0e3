//! Logging configuration
//!
//! Every section deserializes with defaults, so a node's TOML may carry a
//! partial `[log]` table and leave the rest alone.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is unset
    pub level: String,
    pub console: ConsoleConfig,
    /// JSONL file output; off when absent
    pub file: Option<FileConfig>,
    pub jsonl: JsonlConfig,
    pub filters: FilterConfig,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: ConsoleConfig::jsonl(),
            file: None,
            jsonl: JsonlConfig::default(),
            filters: FilterConfig::default(),
        }
    }
}

impl LogConfig {
    /// Verbose, human-readable console output
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            console: ConsoleConfig::pretty(),
            ..Default::default()
        }
    }

    /// JSONL files under `log_dir`, rotated daily, no console
    pub fn production(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            console: ConsoleConfig::off(),
            file: Some(FileConfig::new(log_dir).with_max_files(30)),
            ..Default::default()
        }
    }

    /// Warnings only, so test output stays readable
    pub fn testing() -> Self {
        Self {
            level: "warn".to_string(),
            ..Default::default()
        }
    }

    /// Set the level of one target, e.g. `axon_routing` at `trace`
    pub fn with_target(mut self, target: impl Into<String>, level: impl Into<String>) -> Self {
        self.filters.targets.insert(target.into(), level.into());
        self
    }

    /// Silence a crate entirely
    pub fn silence(mut self, krate: impl Into<String>) -> Self {
        self.filters.silenced.push(krate.into());
        self
    }

    /// `EnvFilter` directives: per-target levels, then silenced crates
    pub fn directives(&self) -> Vec<String> {
        let targets = self
            .filters
            .targets
            .iter()
            .map(|(target, level)| format!("{target}={level}"));
        let silenced = self
            .filters
            .silenced
            .iter()
            .map(|krate| format!("{}=off", krate.replace('-', "_")));
        targets.chain(silenced).collect()
    }
}

/// Console output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Human-readable lines instead of JSONL
    pub pretty: bool,
    pub ansi: bool,
}

impl ConsoleConfig {
    pub fn jsonl() -> Self {
        Self {
            enabled: true,
            pretty: false,
            ansi: false,
        }
    }

    pub fn pretty() -> Self {
        Self {
            enabled: true,
            pretty: true,
            ansi: true,
        }
    }

    pub fn off() -> Self {
        Self {
            enabled: false,
            ..Self::jsonl()
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::jsonl()
    }
}

/// File output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub directory: PathBuf,
    /// File name prefix; `Never` rotation writes `<prefix>.log`
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub rotation: RotationStrategy,
    /// Rotated files to keep
    #[serde(default)]
    pub max_files: Option<usize>,
}

fn default_prefix() -> String {
    "axon".to_string()
}

impl FileConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            prefix: default_prefix(),
            rotation: RotationStrategy::Daily,
            max_files: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_rotation(mut self, rotation: RotationStrategy) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = Some(max_files);
        self
    }
}

/// When log files roll over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    /// One file, truncated at startup
    Never,
}

/// Shape of JSONL records
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonlConfig {
    /// Event fields at the top level instead of under `fields`
    pub flatten_events: bool,
    pub include_spans: bool,
    pub include_current_span: bool,
    pub include_thread_info: bool,
    /// Source file and line
    pub include_location: bool,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            flatten_events: true,
            include_spans: true,
            include_current_span: true,
            // Pool threads are interchangeable; the node context says more
            include_thread_info: false,
            include_location: true,
        }
    }
}

/// Per-target levels and silenced crates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Crates to silence, e.g. `axon-dendrite`
    pub silenced: Vec<String>,
    /// Levels by target, e.g. `axon_routing = "trace"`
    pub targets: BTreeMap<String, String>,
}

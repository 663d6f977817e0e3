//! Structured JSONL logging for the axon mesh
//!
//! Several nodes often share one process in tests and simulations, and
//! every node hands its messages to shared worker threads. This crate sets
//! up a `tracing` subscriber whose output can still be split per node.
//!
//! # Features
//!
//! - **JSONL Output**: Structured JSON lines format for log aggregation (default)
//! - **Node Context Injection**: spans carry the iden of the node they ran for
//! - **File Rotation**: Daily/hourly log rotation via tracing-appender
//!
//! # Quick Start
//!
//! ```ignore
//! use axon_logging::{AxonSubscriberBuilder, LogConfig};
//!
//! // Simple setup with defaults (JSONL to console)
//! AxonSubscriberBuilder::new().init();
//!
//! // Development mode with pretty human-readable output
//! AxonSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init();
//! ```
//!
//! # Node Context
//!
//! ```ignore
//! use axon_logging::NodeContextGuard;
//!
//! let _guard = NodeContextGuard::new(&iden);
//! tracing::debug!("Handling message");
//! ```

pub mod config;
pub mod context;
pub mod layers;

pub use config::{ConsoleConfig, FileConfig, FilterConfig, JsonlConfig, LogConfig, RotationStrategy};
pub use context::{NodeContextData, NodeContextGuard};
pub use layers::{NodeContextExtension, NodeContextLayer};

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Log file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log appender error: {0}")]
    Appender(String),

    #[error("Subscriber already set: {0}")]
    Init(String),
}

/// Builder for configuring and initializing the axon logging subscriber
///
/// By default, console output uses JSONL format. Use
/// `LogConfig::development()` for human-readable output during development.
pub struct AxonSubscriberBuilder {
    config: LogConfig,
}

impl AxonSubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    /// Enable or disable console output
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.config.level));
        for directive in self.config.directives() {
            match directive.parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(e) => eprintln!("Warning: ignoring log directive {directive}: {e}"),
            }
        }
        filter
    }

    /// Initialize the subscriber globally
    ///
    /// Returns the guard of the file writer, if any, which must be kept
    /// alive for the duration of the program. Failures are reported on
    /// stderr and leave logging uninitialized.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: Failed to initialize logging: {}", e);
                None
            }
        }
    }

    /// Try to initialize the subscriber globally
    ///
    /// Returns an error if the log file cannot be opened or a global
    /// subscriber has already been set.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LogError> {
        let file = match &self.config.file {
            Some(file_config) => Some(file_writer(file_config)?),
            None => None,
        };

        let registry = Registry::default()
            .with(self.env_filter())
            .with(NodeContextLayer::new());

        let console = &self.config.console;
        let jsonl = &self.config.jsonl;

        // Separate arms for pretty vs JSONL console to satisfy the type system
        let guard = match (console.enabled, console.pretty, file) {
            // Pretty console + File
            (true, true, Some((writer, guard))) => {
                let console_layer = tracing_subscriber::fmt::layer()
                    .with_ansi(console.ansi)
                    .with_target(true);
                registry
                    .with(console_layer)
                    .with(layers::jsonl_layer(writer, jsonl))
                    .try_init()
                    .map_err(|e| LogError::Init(e.to_string()))?;
                Some(guard)
            }

            // JSONL console + File
            (true, false, Some((writer, guard))) => {
                registry
                    .with(layers::jsonl_layer(std::io::stdout, jsonl))
                    .with(layers::jsonl_layer(writer, jsonl))
                    .try_init()
                    .map_err(|e| LogError::Init(e.to_string()))?;
                Some(guard)
            }

            // Pretty console only
            (true, true, None) => {
                let console_layer = tracing_subscriber::fmt::layer()
                    .with_ansi(console.ansi)
                    .with_target(true);
                registry
                    .with(console_layer)
                    .try_init()
                    .map_err(|e| LogError::Init(e.to_string()))?;
                None
            }

            // JSONL console only (DEFAULT)
            (true, false, None) => {
                registry
                    .with(layers::jsonl_layer(std::io::stdout, jsonl))
                    .try_init()
                    .map_err(|e| LogError::Init(e.to_string()))?;
                None
            }

            // File only (no console)
            (false, _, Some((writer, guard))) => {
                registry
                    .with(layers::jsonl_layer(writer, jsonl))
                    .try_init()
                    .map_err(|e| LogError::Init(e.to_string()))?;
                Some(guard)
            }

            // Nothing enabled - just base registry
            (false, _, None) => {
                registry
                    .try_init()
                    .map_err(|e| LogError::Init(e.to_string()))?;
                None
            }
        };

        Ok(guard)
    }
}

impl Default for AxonSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Open the file writer for `file_config`
///
/// `Never` truncates a single file; rotating strategies append.
fn file_writer(file_config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LogError> {
    fs::create_dir_all(&file_config.directory)?;

    let rotation = match file_config.rotation {
        RotationStrategy::Never => {
            let path = file_config
                .directory
                .join(format!("{}.log", file_config.prefix));
            return Ok(tracing_appender::non_blocking(File::create(path)?));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&file_config.prefix);
    if let Some(max_files) = file_config.max_files {
        builder = builder.max_log_files(max_files);
    }
    let appender = builder
        .build(&file_config.directory)
        .map_err(|e| LogError::Appender(e.to_string()))?;

    Ok(tracing_appender::non_blocking(appender))
}

/// Initialize logging with default settings (JSONL to console)
pub fn init_default() {
    AxonSubscriberBuilder::new().init();
}

/// Initialize logging for development (verbose, pretty console output)
pub fn init_development() {
    AxonSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init();
}

/// Initialize logging for testing (minimal output)
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_testing() {
    let _ = AxonSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}

//! Configuration for the introduction service.
//!
//! # Example
//!
//! ```
//! use vouch_core::config::{TrustConfig, TrustConfigBuilder};
//! use std::time::Duration;
//!
//! let defaults = TrustConfig::default();
//! assert_eq!(defaults.jobs.max_attempts, 10);
//!
//! let config = TrustConfigBuilder::new()
//!     .with_in_memory_storage()
//!     .with_max_concurrent_tasks(2)
//!     .with_job_lifespan(Duration::from_secs(3600))
//!     .build();
//! assert!(config.validate().is_ok());
//! ```
//!
//! Durations are written as whole milliseconds in config files:
//!
//! ```json
//! { "jobs": { "max_attempts": 10, "lifespan": 86400000 } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use vouch_identity::DEFAULT_UNTRUSTED_WINDOW;

/// Default number of mutations running at once.
const DEFAULT_MAX_CONCURRENT_TASKS: usize = 4;

/// Default attempts before a receive batch is abandoned.
const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default receive batch lifespan (one day).
const DEFAULT_JOB_LIFESPAN: Duration = Duration::from_secs(24 * 60 * 60);

/// Service configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Where introductions are kept.
    pub storage: StorageConfig,

    /// Worker pool configuration.
    pub workers: WorkerConfig,

    /// Identity verification settings.
    pub verification: VerificationConfig,

    /// Receive job settings.
    pub jobs: JobConfig,
}

impl TrustConfig {
    /// Defaults for every section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a [`TrustConfigBuilder`].
    pub fn builder() -> TrustConfigBuilder {
        TrustConfigBuilder::new()
    }

    /// Defaults with a temporary database.
    pub fn in_memory() -> Self {
        TrustConfigBuilder::new().with_in_memory_storage().build()
    }

    /// Check every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.storage.in_memory && self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid(
                "storage.data_dir",
                "an on-disk store needs a directory",
            ));
        }

        if self.workers.max_concurrent_tasks == 0 {
            return Err(ConfigError::invalid(
                "workers.max_concurrent_tasks",
                "at least one worker is required",
            ));
        }

        if self.jobs.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "jobs.max_attempts",
                "a batch needs at least one attempt",
            ));
        }

        if self.jobs.lifespan.is_zero() {
            return Err(ConfigError::invalid("jobs.lifespan", "must be positive"));
        }

        Ok(())
    }
}

/// Introduction database location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the introduction database.
    ///
    /// Defaults to `vouch` under the platform data directory.
    pub data_dir: PathBuf,

    /// Use a temporary database that is dropped with the service.
    pub in_memory: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            in_memory: false,
        }
    }
}

/// Worker pool configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Mutations allowed to run at once. Mutations for the same introducee
    /// are additionally serialized.
    pub max_concurrent_tasks: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
        }
    }
}

/// Identity verification settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// How long a newly changed identity stays untrusted.
    #[serde(with = "millis")]
    pub untrusted_window: Duration,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            untrusted_window: DEFAULT_UNTRUSTED_WINDOW,
        }
    }
}

/// Receive job settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Attempts before a receive batch is abandoned.
    pub max_attempts: u32,

    /// Age after which a receive batch is abandoned.
    #[serde(with = "millis")]
    pub lifespan: Duration,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lifespan: DEFAULT_JOB_LIFESPAN,
        }
    }
}

/// Builder for [`TrustConfig`].
#[derive(Clone, Debug, Default)]
pub struct TrustConfigBuilder {
    config: TrustConfig,
}

impl TrustConfigBuilder {
    /// Builder over the defaults.
    pub fn new() -> Self {
        Self {
            config: TrustConfig::default(),
        }
    }

    /// Finish without validating.
    pub fn build(self) -> TrustConfig {
        self.config
    }

    /// Finish and run [`TrustConfig::validate`].
    ///
    /// # Errors
    ///
    /// Returns the validation error.
    pub fn build_validated(self) -> Result<TrustConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }

    // ===== Storage Configuration =====

    /// Keep the database under `dir`.
    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.config.storage.data_dir = dir;
        self
    }

    /// Use a temporary database.
    pub fn with_in_memory_storage(mut self) -> Self {
        self.config.storage.in_memory = true;
        self
    }

    /// Use the on-disk database under the data directory.
    pub fn with_disk_storage(mut self) -> Self {
        self.config.storage.in_memory = false;
        self
    }

    // ===== Worker Configuration =====

    /// Set how many mutations may run at once.
    pub fn with_max_concurrent_tasks(mut self, max: usize) -> Self {
        self.config.workers.max_concurrent_tasks = max;
        self
    }

    // ===== Verification Configuration =====

    /// Set the untrusted window for changed identities.
    pub fn with_untrusted_window(mut self, window: Duration) -> Self {
        self.config.verification.untrusted_window = window;
        self
    }

    // ===== Job Configuration =====

    /// Set the attempts before a receive batch is abandoned.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.config.jobs.max_attempts = attempts;
        self
    }

    /// Set the receive batch lifespan.
    pub fn with_job_lifespan(mut self, lifespan: Duration) -> Self {
        self.config.jobs.lifespan = lifespan;
        self
    }
}

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A field holds a value the service cannot run with.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// Dotted path of the field, e.g. `jobs.lifespan`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &str, reason: &str) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// `vouch` under the platform data directory, falling back to `~/.vouch`.
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("vouch"))
        .or_else(|| dirs::home_dir().map(|home| home.join(".vouch")))
        .unwrap_or_else(|| PathBuf::from(".vouch"))
}

/// Durations as whole milliseconds.
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

//! Election configuration
//!
//! Tunables for the acquisition loop and the environment identity sources,
//! persisted as JSON in a data directory. A missing config file means
//! defaults, which match the reference behavior: fixed one-second pacing,
//! unbounded retries.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::election::retry::{FixedInterval, DEFAULT_RETRY_INTERVAL};

/// Name of the file persisting [`ElectionConfig`] inside a data directory
pub const ELECTION_CONFIG_NAME: &str = "election.json";

/// Environment variable consulted first for the partition
pub const DEFAULT_PARTITION_ENV: &str = "HOLDFAST_PARTITION";

/// Partition file consulted when the environment variable is unset
pub const DEFAULT_PARTITION_FILE: &str = "/var/run/holdfast/partition";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
	/// Delay between contested attempts, in milliseconds
	pub retry_interval_ms: u64,

	/// Attempt ceiling; `None` retries forever (the reference behavior)
	#[serde(default)]
	pub max_attempts: Option<u64>,

	/// Environment variable the partition is read from
	pub partition_env: String,

	/// File the partition is read from when the variable is unset
	pub partition_file: PathBuf,

	/// Kind tag stamped on the owner reference
	pub owner_kind: String,
}

impl Default for ElectionConfig {
	fn default() -> Self {
		Self {
			retry_interval_ms: DEFAULT_RETRY_INTERVAL.as_millis() as u64,
			max_attempts: None,
			partition_env: DEFAULT_PARTITION_ENV.to_string(),
			partition_file: PathBuf::from(DEFAULT_PARTITION_FILE),
			owner_kind: "process".to_string(),
		}
	}
}

impl ElectionConfig {
	pub fn retry_interval(&self) -> Duration {
		Duration::from_millis(self.retry_interval_ms)
	}

	/// The retry policy these settings describe
	pub fn fixed_policy(&self) -> FixedInterval {
		match self.max_attempts {
			Some(max) => FixedInterval::with_max_attempts(self.retry_interval(), max),
			None => FixedInterval::new(self.retry_interval()),
		}
	}

	/// Load from `dir`, falling back to defaults when no config file exists
	pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
		let path = dir.join(ELECTION_CONFIG_NAME);
		if !path.exists() {
			return Ok(Self::default());
		}

		info!("loading election config from {:?}", path);
		Ok(serde_json::from_slice(&fs::read(path)?)?)
	}

	pub fn save_to(&self, dir: &Path) -> Result<(), ConfigError> {
		fs::create_dir_all(dir)?;
		fs::write(
			dir.join(ELECTION_CONFIG_NAME),
			serde_json::to_vec_pretty(self)?,
		)?;
		Ok(())
	}
}

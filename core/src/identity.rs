//! Candidate identity resolution
//!
//! Where a candidate learns which partition it competes in and which entity
//! embodies this running incarnation. Orchestrated deployments export the
//! partition through an environment variable or a mounted file; a process
//! that finds neither is running outside any managed environment, which is a
//! distinguished non-fatal outcome ("election disabled") rather than an
//! error.

use std::env;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::ElectionConfig;
use crate::store::OwnerRef;

/// Instance token minted once per process start
///
/// Substitutes for a store-issued durable identifier: every incarnation of a
/// candidate gets a fresh token, so self-recognition compares incarnations,
/// never names.
static PROCESS_TOKEN: Lazy<Uuid> = Lazy::new(Uuid::new_v4);

pub fn process_token() -> Uuid {
	*PROCESS_TOKEN
}

#[derive(Debug, Error)]
pub enum IdentityError {
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),

	/// Identity data that cannot be interpreted. Fatal: the engine never
	/// guesses around a malformed identity.
	#[error("unresolvable identity: {0}")]
	Unresolvable(String),
}

/// Supplies the partition and owner entity for this candidate
#[async_trait]
pub trait IdentityResolver: Send + Sync {
	/// The partition this candidate competes in, or `None` when the
	/// environment provides no partition (election disabled).
	fn resolve_partition(&self) -> Result<Option<String>, IdentityError>;

	/// The owner entity representing this running incarnation
	async fn resolve_owner(&self, partition: &str) -> Result<OwnerRef, IdentityError>;
}

/// Production resolver reading the deployment environment
///
/// Partition comes from the configured environment variable first, then from
/// the partition file. The owner reference is built from the hostname and the
/// process-wide instance token.
pub struct EnvIdentity {
	partition_env: String,
	partition_file: PathBuf,
	owner_kind: String,
}

impl EnvIdentity {
	pub fn new() -> Self {
		Self::from_config(&ElectionConfig::default())
	}

	pub fn from_config(config: &ElectionConfig) -> Self {
		Self {
			partition_env: config.partition_env.clone(),
			partition_file: config.partition_file.clone(),
			owner_kind: config.owner_kind.clone(),
		}
	}
}

impl Default for EnvIdentity {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl IdentityResolver for EnvIdentity {
	fn resolve_partition(&self) -> Result<Option<String>, IdentityError> {
		if let Ok(value) = env::var(&self.partition_env) {
			let value = value.trim();
			if !value.is_empty() {
				debug!(partition = %value, "resolved partition from environment");
				return Ok(Some(value.to_string()));
			}
		}

		match fs::read_to_string(&self.partition_file) {
			Ok(raw) => {
				let value = raw.trim();
				if value.is_empty() {
					return Ok(None);
				}
				debug!(partition = %value, file = ?self.partition_file, "resolved partition from file");
				Ok(Some(value.to_string()))
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(IdentityError::Io(e)),
		}
	}

	async fn resolve_owner(&self, _partition: &str) -> Result<OwnerRef, IdentityError> {
		let host = hostname::get()?;
		let name = host
			.into_string()
			.map_err(|_| IdentityError::Unresolvable("hostname is not valid UTF-8".to_string()))?;

		Ok(OwnerRef::new(&self.owner_kind, name, process_token()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	fn identity() -> EnvIdentity {
		EnvIdentity::new()
	}

	#[test]
	fn process_token_is_stable_within_the_process() {
		assert_eq!(process_token(), process_token());
	}

	#[test]
	fn partition_from_env_var_wins() {
		let mut id = identity();
		id.partition_env = "HOLDFAST_TEST_PARTITION_ENV_WINS".to_string();
		env::set_var(&id.partition_env, "blue ");

		assert_eq!(id.resolve_partition().unwrap(), Some("blue".to_string()));
		env::remove_var(&id.partition_env);
	}

	#[test]
	fn partition_from_file_when_env_is_unset() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "green").unwrap();

		let mut id = identity();
		id.partition_env = "HOLDFAST_TEST_PARTITION_FROM_FILE".to_string();
		id.partition_file = file.path().to_path_buf();

		assert_eq!(id.resolve_partition().unwrap(), Some("green".to_string()));
	}

	#[test]
	fn missing_sources_disable_the_election() {
		let dir = tempfile::tempdir().unwrap();

		let mut id = identity();
		id.partition_env = "HOLDFAST_TEST_PARTITION_MISSING".to_string();
		id.partition_file = dir.path().join("partition");

		assert_eq!(id.resolve_partition().unwrap(), None);
	}

	#[test]
	fn blank_partition_file_disables_the_election() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "   ").unwrap();

		let mut id = identity();
		id.partition_env = "HOLDFAST_TEST_PARTITION_BLANK".to_string();
		id.partition_file = file.path().to_path_buf();

		assert_eq!(id.resolve_partition().unwrap(), None);
	}

	#[tokio::test]
	async fn owner_carries_the_process_token() {
		let owner = identity().resolve_owner("blue").await.unwrap();
		assert_eq!(owner.kind, "process");
		assert_eq!(owner.instance_id, process_token());
		assert!(!owner.name.is_empty());
	}
}

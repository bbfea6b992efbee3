//! Record store boundary
//!
//! The election algorithm owns no locking of its own. Correctness rests on
//! the store's atomic create-if-absent with a uniqueness constraint on the
//! record key, so this module only defines the record model and the client
//! trait the engine drives. Production deployments implement [`RecordStore`]
//! against their orchestrator's API; tests and single-node embedders use
//! [`MemoryStore`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;

pub use memory::MemoryStore;

/// Schema tag stamped on every lock record
pub const LOCK_SCHEMA: &str = "holdfast.io/lock-v1";

/// Outcomes a record store client can surface
///
/// `NotFound` and `Conflict` are routine and drive the acquisition loop.
/// `Backend` covers everything else (unreachable, unauthorized, malformed
/// request) and is fatal on first occurrence: the engine cannot distinguish
/// "no leader" from "cannot tell", and looping under that ambiguity could
/// leave two processes believing themselves leader.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("record not found")]
	NotFound,

	#[error("record already exists")]
	Conflict,

	#[error("store backend failure: {0}")]
	Backend(#[from] anyhow::Error),
}

/// Identity of the entity whose destruction releases the lock
///
/// Compared by `instance_id`, never by name alone: a supervisor may recycle a
/// candidate's name while the store still holds the previous incarnation's
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
	/// Kind tag of the owner entity (e.g. "process")
	pub kind: String,

	/// Human-readable owner name, typically the hostname
	pub name: String,

	/// Durable, collision-resistant identifier of this incarnation
	pub instance_id: Uuid,
}

impl OwnerRef {
	pub fn new(kind: impl Into<String>, name: impl Into<String>, instance_id: Uuid) -> Self {
		Self {
			kind: kind.into(),
			name: name.into(),
			instance_id,
		}
	}

	/// Whether `other` refers to the same incarnation of the same entity
	pub fn same_instance(&self, other: &OwnerRef) -> bool {
		self.instance_id == other.instance_id
	}
}

/// The uniquely-keyed record whose existence denotes "a leader exists"
///
/// Created by exactly one candidate's successful create, deleted by the
/// store's garbage collector once the owner entity is gone, and never updated
/// in between. Carries no payload, timestamp, or version counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
	/// Record schema tag, always [`LOCK_SCHEMA`]
	pub schema: String,

	/// Election name, unique within the partition
	pub name: String,

	/// Scope within which `name` is enforced unique
	pub partition: String,

	/// Entity bound to this record's lifetime
	pub owner: OwnerRef,
}

impl LockRecord {
	pub fn new(name: impl Into<String>, partition: impl Into<String>, owner: OwnerRef) -> Self {
		Self {
			schema: LOCK_SCHEMA.to_string(),
			name: name.into(),
			partition: partition.into(),
			owner,
		}
	}
}

/// Client for a strongly-consistent, uniqueness-enforcing record store
#[async_trait]
pub trait RecordStore: Send + Sync {
	/// Point read of the record under `(name, partition)`
	async fn get(&self, name: &str, partition: &str) -> Result<LockRecord, StoreError>;

	/// Atomic create-if-absent
	///
	/// Must be backed by the equivalent of a serializable check-and-set:
	/// among concurrent creates of the same key exactly one succeeds and the
	/// rest observe [`StoreError::Conflict`].
	async fn create(&self, record: &LockRecord) -> Result<(), StoreError>;
}

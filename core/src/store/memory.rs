//! In-process record store
//!
//! Backs tests and single-node embedding. Create-if-absent is serializable by
//! construction: every operation runs under the same mutex. The store's
//! garbage collector is modeled by [`MemoryStore::remove`]: code simulating
//! an owner entity's death deletes its record directly rather than waiting on
//! collection timing.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{LockRecord, RecordStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
	records: Mutex<HashMap<(String, String), LockRecord>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Delete the record under `(name, partition)`, as the garbage collector
	/// would after the owner entity is destroyed. Returns whether a record
	/// was present.
	pub fn remove(&self, name: &str, partition: &str) -> bool {
		self.records
			.lock()
			.remove(&(name.to_string(), partition.to_string()))
			.is_some()
	}

	pub fn contains(&self, name: &str, partition: &str) -> bool {
		self.records
			.lock()
			.contains_key(&(name.to_string(), partition.to_string()))
	}
}

#[async_trait]
impl RecordStore for MemoryStore {
	async fn get(&self, name: &str, partition: &str) -> Result<LockRecord, StoreError> {
		self.records
			.lock()
			.get(&(name.to_string(), partition.to_string()))
			.cloned()
			.ok_or(StoreError::NotFound)
	}

	async fn create(&self, record: &LockRecord) -> Result<(), StoreError> {
		let mut records = self.records.lock();
		let key = (record.name.clone(), record.partition.clone());
		if records.contains_key(&key) {
			return Err(StoreError::Conflict);
		}
		records.insert(key, record.clone());
		Ok(())
	}
}

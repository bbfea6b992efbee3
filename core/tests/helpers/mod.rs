//! Shared fakes for election integration tests

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use uuid::Uuid;

use holdfast_core::{
	FakeSleeper, IdentityError, IdentityResolver, LockRecord, MemoryStore, OwnerRef, RecordStore,
	Sleeper, StoreError,
};

/// Identity resolver with a fixed partition and owner
pub struct FixedIdentity {
	partition: Option<String>,
	owner: OwnerRef,
}

impl FixedIdentity {
	pub fn new(partition: &str) -> Self {
		Self::with_owner(
			partition,
			OwnerRef::new("process", "candidate", Uuid::new_v4()),
		)
	}

	pub fn with_owner(partition: &str, owner: OwnerRef) -> Self {
		Self {
			partition: Some(partition.to_string()),
			owner,
		}
	}

	/// Resolver for an environment with no partition at all
	pub fn disabled() -> Self {
		Self {
			partition: None,
			owner: OwnerRef::new("process", "candidate", Uuid::new_v4()),
		}
	}

	pub fn owner(&self) -> OwnerRef {
		self.owner.clone()
	}
}

#[async_trait]
impl IdentityResolver for FixedIdentity {
	fn resolve_partition(&self) -> Result<Option<String>, IdentityError> {
		Ok(self.partition.clone())
	}

	async fn resolve_owner(&self, _partition: &str) -> Result<OwnerRef, IdentityError> {
		Ok(self.owner.clone())
	}
}

/// Wraps a store and counts the calls that reach it
pub struct CountingStore {
	inner: Arc<dyn RecordStore>,
	gets: AtomicU64,
	creates: AtomicU64,
}

impl CountingStore {
	pub fn new(inner: Arc<dyn RecordStore>) -> Self {
		Self {
			inner,
			gets: AtomicU64::new(0),
			creates: AtomicU64::new(0),
		}
	}

	pub fn gets(&self) -> u64 {
		self.gets.load(Ordering::SeqCst)
	}

	pub fn creates(&self) -> u64 {
		self.creates.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl RecordStore for CountingStore {
	async fn get(&self, name: &str, partition: &str) -> Result<LockRecord, StoreError> {
		self.gets.fetch_add(1, Ordering::SeqCst);
		self.inner.get(name, partition).await
	}

	async fn create(&self, record: &LockRecord) -> Result<(), StoreError> {
		self.creates.fetch_add(1, Ordering::SeqCst);
		self.inner.create(record).await
	}
}

/// Store that answers the configured operation with a backend fault
pub struct FailingStore {
	inner: MemoryStore,
	fail_get: bool,
	fail_create: bool,
}

impl FailingStore {
	pub fn failing_get() -> Self {
		Self {
			inner: MemoryStore::new(),
			fail_get: true,
			fail_create: false,
		}
	}

	pub fn failing_create() -> Self {
		Self {
			inner: MemoryStore::new(),
			fail_get: false,
			fail_create: true,
		}
	}
}

#[async_trait]
impl RecordStore for FailingStore {
	async fn get(&self, name: &str, partition: &str) -> Result<LockRecord, StoreError> {
		if self.fail_get {
			return Err(StoreError::Backend(anyhow!("backend unreachable")));
		}
		self.inner.get(name, partition).await
	}

	async fn create(&self, record: &LockRecord) -> Result<(), StoreError> {
		if self.fail_create {
			return Err(StoreError::Backend(anyhow!("backend unreachable")));
		}
		self.inner.create(record).await
	}
}

/// Sleeper that deletes a record while the engine waits out its first delay
///
/// Stands in for the garbage collector destroying the current leader's record
/// while a contender is backing off.
pub struct RemoveOnSleep {
	store: Arc<MemoryStore>,
	name: String,
	partition: String,
	inner: FakeSleeper,
}

impl RemoveOnSleep {
	pub fn new(store: Arc<MemoryStore>, name: &str, partition: &str) -> Self {
		Self {
			store,
			name: name.to_string(),
			partition: partition.to_string(),
			inner: FakeSleeper::new(),
		}
	}

	pub fn sleep_count(&self) -> usize {
		self.inner.sleep_count()
	}
}

#[async_trait]
impl Sleeper for RemoveOnSleep {
	async fn sleep(&self, duration: Duration) {
		self.inner.sleep(duration).await;
		self.store.remove(&self.name, &self.partition);
	}
}

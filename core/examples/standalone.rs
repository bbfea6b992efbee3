//! Several in-process candidates racing for one lock.
//!
//! One candidate wins immediately; the others keep conflicting until the
//! "garbage collector" (a direct remove here) frees the winner's record, at
//! which point a successor takes over.
//!
//! Run with: `cargo run --example standalone`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use holdfast_core::{
	ElectionConfig, Elector, IdentityError, IdentityResolver, MemoryStore, OwnerRef,
};

/// One simulated replica per task; each gets its own incarnation token
struct ReplicaIdentity {
	owner: OwnerRef,
}

impl ReplicaIdentity {
	fn new(index: usize) -> Self {
		Self {
			owner: OwnerRef::new("process", format!("replica-{index}"), Uuid::new_v4()),
		}
	}
}

#[async_trait]
impl IdentityResolver for ReplicaIdentity {
	fn resolve_partition(&self) -> Result<Option<String>, IdentityError> {
		Ok(Some("demo".to_string()))
	}

	async fn resolve_owner(&self, _partition: &str) -> Result<OwnerRef, IdentityError> {
		Ok(self.owner.clone())
	}
}

#[tokio::main]
async fn main() {
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with(fmt::layer())
		.init();

	let store = Arc::new(MemoryStore::new());

	let mut config = ElectionConfig::default();
	config.retry_interval_ms = 200;

	for index in 0..3 {
		let store = store.clone();
		let config = config.clone();
		tokio::spawn(async move {
			let elector = Elector::new(store, Arc::new(ReplicaIdentity::new(index)))
				.with_config(config);
			if elector.become_leader("app-lock").await.is_ok() {
				info!(replica = index, "proceeding with leader duties");
			}
		});
	}

	// Let the first winner establish itself, then simulate its death: the
	// collector deletes the record and a successor wins the next race.
	tokio::time::sleep(Duration::from_millis(500)).await;
	info!("simulating leader death; removing its lock record");
	store.remove("app-lock", "demo");

	tokio::time::sleep(Duration::from_millis(500)).await;
}

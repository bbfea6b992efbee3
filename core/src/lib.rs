//! Leader-for-life election for fleets of identical processes.
//!
//! Candidates compete by creating a uniquely-keyed lock record in a shared,
//! strongly-consistent store. The store's uniqueness constraint guarantees
//! exactly one create succeeds, and that candidate is the leader for the rest
//! of its life: there is no renewal, no heartbeat, and no step-down. Release
//! is implicit: the record is bound to the owning process's entity, the
//! store's garbage collector deletes it when that entity dies, and the
//! surviving candidates race again.
//!
//! Everything environment-specific sits behind two traits: [`RecordStore`]
//! (the shared backend) and [`IdentityResolver`] (which partition this
//! candidate competes in, and which entity embodies this incarnation).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use holdfast_core::{Elector, EnvIdentity, MemoryStore};
//!
//! # async fn run() -> Result<(), holdfast_core::ElectionError> {
//! let elector = Elector::new(Arc::new(MemoryStore::new()), Arc::new(EnvIdentity::new()));
//!
//! // Blocks until this process holds the lock, then carries no further
//! // obligations.
//! elector.become_leader("app-lock").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod election;
pub mod identity;
pub mod store;

pub use config::{ConfigError, ElectionConfig, ELECTION_CONFIG_NAME};
pub use election::{
	ElectionError, ElectionStatus, Elector, FakeSleeper, FixedInterval, Sleeper, StoreOp,
	TokioSleeper, DEFAULT_RETRY_INTERVAL,
};
pub use identity::{process_token, EnvIdentity, IdentityError, IdentityResolver};
pub use store::{LockRecord, MemoryStore, OwnerRef, RecordStore, StoreError, LOCK_SCHEMA};

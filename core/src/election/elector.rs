//! Lock acquisition engine
//!
//! Drives "inspect, recognize self, create, classify" to a terminal outcome.
//! A conflict on create is routine (another candidate won the race) and
//! sends the loop back to a fresh read after a delay, so a record that
//! disappeared in the meantime is re-evaluated instead of retried against
//! stale assumptions. Any other store failure is fatal on first occurrence
//! and never retried.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::ElectionConfig;
use crate::identity::{IdentityError, IdentityResolver};
use crate::store::{LockRecord, RecordStore, StoreError};

use super::retry::{Sleeper, TokioSleeper};

/// Store operation the engine was executing when a fatal fault surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
	Read,
	Create,
}

impl fmt::Display for StoreOp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StoreOp::Read => write!(f, "read"),
			StoreOp::Create => write!(f, "create"),
		}
	}
}

/// Terminal outcome of a fallible election entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionStatus {
	/// This process holds the lock record and proceeds as leader
	Leader,
	/// The environment provides no partition; the election never ran
	Disabled,
}

/// Terminal failures of an acquisition call
///
/// None of these is retried internally. The caller decides what a fatal
/// election failure means, typically by aborting startup.
#[derive(Debug, Error)]
pub enum ElectionError {
	#[error("no partition found for the current environment")]
	NoPartition,

	#[error("identity resolution failed: {0}")]
	Identity(#[from] IdentityError),

	/// The store failed in a way that is neither NotFound nor Conflict
	#[error("record store failure during {op}: {source}")]
	Store { op: StoreOp, source: StoreError },

	/// A bounded retry policy spent its budget while the lock stayed
	/// contested
	#[error("gave up after {attempts} contested attempts")]
	RetriesExhausted { attempts: u64 },

	#[error("election aborted by shutdown signal")]
	Aborted,
}

/// Competes for leadership of named elections
///
/// One elector serves any number of elections. Each call resolves the
/// candidate's identity afresh, then blocks until the lock record is held,
/// the environment turns out to have no partition, or a fatal condition
/// surfaces. Leadership, once returned, carries no further obligations:
/// there is no renewal, and release happens implicitly when this process
/// dies and the store collects its record.
pub struct Elector {
	store: Arc<dyn RecordStore>,
	identity: Arc<dyn IdentityResolver>,
	config: ElectionConfig,
	sleeper: Arc<dyn Sleeper>,
}

impl Elector {
	pub fn new(store: Arc<dyn RecordStore>, identity: Arc<dyn IdentityResolver>) -> Self {
		Self {
			store,
			identity,
			config: ElectionConfig::default(),
			sleeper: Arc::new(TokioSleeper),
		}
	}

	pub fn with_config(mut self, config: ElectionConfig) -> Self {
		self.config = config;
		self
	}

	pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
		self.sleeper = sleeper;
		self
	}

	/// Block until this process is the leader for `name`
	///
	/// A missing partition is an error here; use [`Elector::try_become_leader`]
	/// where leadership is optional.
	pub async fn become_leader(&self, name: &str) -> Result<(), ElectionError> {
		self.run(name, self.config.fixed_policy(), None).await
	}

	/// Like [`Elector::become_leader`], but a missing partition yields
	/// [`ElectionStatus::Disabled`] instead of an error
	///
	/// For processes that may run outside any managed environment, e.g. a
	/// service started directly on a developer machine.
	pub async fn try_become_leader(&self, name: &str) -> Result<ElectionStatus, ElectionError> {
		match self.run(name, self.config.fixed_policy(), None).await {
			Ok(()) => Ok(ElectionStatus::Leader),
			Err(ElectionError::NoPartition) => {
				warn!("leader election disabled; no partition detected");
				Ok(ElectionStatus::Disabled)
			}
			Err(e) => Err(e),
		}
	}

	/// Like [`Elector::become_leader`], but a raised shutdown flag ends the
	/// wait with [`ElectionError::Aborted`]
	///
	/// The flag is observed at every attempt boundary and while waiting out a
	/// backoff delay.
	pub async fn become_leader_with_shutdown(
		&self,
		name: &str,
		shutdown: watch::Receiver<bool>,
	) -> Result<(), ElectionError> {
		self.run(name, self.config.fixed_policy(), Some(shutdown)).await
	}

	/// Like [`Elector::become_leader`], under a caller-supplied retry policy
	pub async fn become_leader_with_policy(
		&self,
		name: &str,
		policy: impl Backoff + Send,
	) -> Result<(), ElectionError> {
		self.run(name, policy, None).await
	}

	async fn run(
		&self,
		name: &str,
		mut policy: impl Backoff + Send,
		mut shutdown: Option<watch::Receiver<bool>>,
	) -> Result<(), ElectionError> {
		info!(election = %name, "trying to become the leader");

		let partition = self
			.identity
			.resolve_partition()?
			.ok_or(ElectionError::NoPartition)?;
		let owner = self.identity.resolve_owner(&partition).await?;
		let record = LockRecord::new(name, &partition, owner.clone());
		let mut attempts: u64 = 0;

		loop {
			if is_shutdown(&shutdown) {
				return Err(ElectionError::Aborted);
			}
			attempts += 1;

			// Inspect: who holds the lock right now, if anyone?
			match self.store.get(name, &partition).await {
				Ok(existing) if existing.owner.same_instance(&owner) => {
					info!(
						election = %name,
						partition = %partition,
						"found existing lock with my identity, continuing as the leader"
					);
					return Ok(());
				}
				Ok(existing) => {
					info!(
						election = %name,
						partition = %partition,
						holder = %existing.owner.name,
						"found existing lock from another candidate"
					);
				}
				Err(StoreError::NotFound) => {
					debug!(election = %name, partition = %partition, "no pre-existing lock was found");
				}
				Err(source) => {
					error!(
						election = %name,
						partition = %partition,
						error = %source,
						"failed to read the lock record"
					);
					return Err(ElectionError::Store {
						op: StoreOp::Read,
						source,
					});
				}
			}

			// Create: among concurrent candidates exactly one of these wins.
			match self.store.create(&record).await {
				Ok(()) => {
					info!(
						election = %name,
						partition = %partition,
						attempt = attempts,
						"became the leader"
					);
					return Ok(());
				}
				Err(StoreError::Conflict) => {
					let Some(delay) = policy.next_backoff() else {
						return Err(ElectionError::RetriesExhausted { attempts });
					};
					info!(
						election = %name,
						partition = %partition,
						attempt = attempts,
						"not the leader; waiting"
					);
					self.wait(delay, &mut shutdown).await?;
				}
				Err(source) => {
					error!(
						election = %name,
						partition = %partition,
						error = %source,
						"failed to create the lock record"
					);
					return Err(ElectionError::Store {
						op: StoreOp::Create,
						source,
					});
				}
			}
		}
	}

	async fn wait(
		&self,
		delay: Duration,
		shutdown: &mut Option<watch::Receiver<bool>>,
	) -> Result<(), ElectionError> {
		let Some(rx) = shutdown else {
			self.sleeper.sleep(delay).await;
			return Ok(());
		};

		tokio::select! {
			_ = self.sleeper.sleep(delay) => Ok(()),
			changed = rx.changed() => {
				// A closed sender counts as shutdown too
				if changed.is_err() || *rx.borrow() {
					Err(ElectionError::Aborted)
				} else {
					Ok(())
				}
			}
		}
	}
}

fn is_shutdown(shutdown: &Option<watch::Receiver<bool>>) -> bool {
	shutdown.as_ref().is_some_and(|rx| *rx.borrow())
}

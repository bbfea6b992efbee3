//! Attempt pacing
//!
//! Pacing has two halves: a policy deciding how long to wait after each
//! contested attempt, and a sleeper that actually waits. The policy contract
//! is [`backoff::backoff::Backoff`], so anything from that ecosystem (e.g.
//! `backoff::ExponentialBackoff`) plugs into the engine; [`FixedInterval`] is
//! the reference policy. The sleeper is a trait so tests control pacing
//! without real delays.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoff::backoff::Backoff;
use parking_lot::Mutex;

/// Reference delay between contested attempts
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Waits out the delay a retry policy asked for
#[async_trait]
pub trait Sleeper: Send + Sync {
	async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
	async fn sleep(&self, duration: Duration) {
		tokio::time::sleep(duration).await;
	}
}

/// Test sleeper that never waits
///
/// Records every requested duration and returns immediately, so tests assert
/// on pacing deterministically instead of sleeping real time.
#[derive(Debug, Clone, Default)]
pub struct FakeSleeper {
	slept: Arc<Mutex<Vec<Duration>>>,
}

impl FakeSleeper {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of sleeps requested so far
	pub fn sleep_count(&self) -> usize {
		self.slept.lock().len()
	}

	/// Every requested duration, in order
	pub fn slept(&self) -> Vec<Duration> {
		self.slept.lock().clone()
	}
}

#[async_trait]
impl Sleeper for FakeSleeper {
	async fn sleep(&self, duration: Duration) {
		self.slept.lock().push(duration);
	}
}

/// Fixed-interval retry policy
///
/// Every contested attempt waits the same interval. Unbounded unless an
/// attempt ceiling is configured; `None` from [`Backoff::next_backoff`] means
/// the budget is spent.
#[derive(Debug, Clone)]
pub struct FixedInterval {
	interval: Duration,
	max_attempts: Option<u64>,
	taken: u64,
}

impl FixedInterval {
	pub fn new(interval: Duration) -> Self {
		Self {
			interval,
			max_attempts: None,
			taken: 0,
		}
	}

	pub fn with_max_attempts(interval: Duration, max_attempts: u64) -> Self {
		Self {
			interval,
			max_attempts: Some(max_attempts),
			taken: 0,
		}
	}
}

impl Default for FixedInterval {
	fn default() -> Self {
		Self::new(DEFAULT_RETRY_INTERVAL)
	}
}

impl Backoff for FixedInterval {
	fn next_backoff(&mut self) -> Option<Duration> {
		match self.max_attempts {
			Some(max) if self.taken >= max => None,
			_ => {
				self.taken += 1;
				Some(self.interval)
			}
		}
	}

	fn reset(&mut self) {
		self.taken = 0;
	}
}

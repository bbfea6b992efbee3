//! Leadership acquisition
//!
//! The election core: the acquisition engine that turns store responses into
//! a terminal leader-or-fatal outcome, and the pacing seam that spaces out
//! contested attempts.

pub mod elector;
pub mod retry;

pub use elector::{ElectionError, ElectionStatus, Elector, StoreOp};
pub use retry::{FakeSleeper, FixedInterval, Sleeper, TokioSleeper, DEFAULT_RETRY_INTERVAL};

//! Aid Dispatch Core: the atomic job-claim, heartbeat, progress-update, and
//! completion protocol.

mod core;
mod error;

pub use core::AidDispatchCore;
pub use error::DispatchError;

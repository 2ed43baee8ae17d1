//! Background singletons: the Timeout Monitor and the Video Healer.

mod healer;
mod timeout_monitor;

pub use healer::VideoHealer;
pub use timeout_monitor::TimeoutMonitor;

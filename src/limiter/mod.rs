//! Weighted sliding-window admission control
//!
//! One `RateLimiter` is built at process start and shared by handle with
//! every request. Records are reclaimed lazily on each `admit` call; there
//! is no background sweeper.

pub mod clock;
pub mod sliding_window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use sliding_window::{RateLimiter, RateRecord};

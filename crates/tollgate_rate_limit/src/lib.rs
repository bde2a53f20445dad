//! Rate limiting for the Tollgate admission control library.
//!
//! Fixed-window counting per key, chosen for O(1) memory and time: each
//! (key, window) pair is one [`WindowCounter`], each traffic class one
//! [`RateLimiter`] with its own policy and lock, and the process owns a
//! single [`LimiterRegistry`] of named classes. The [`Janitor`] sweeps
//! idle counters on an interval so key cardinality cannot grow memory
//! without bound.
//!
//! All state lives in process; there is no store dependency and no
//! cross-process coordination.

mod counter;
mod janitor;
mod limiter;
mod policy;
mod registry;

pub use counter::WindowCounter;
pub use janitor::{DEFAULT_RETENTION_SECS, DEFAULT_SWEEP_INTERVAL_SECS, Janitor};
pub use limiter::RateLimiter;
pub use policy::RatePolicy;
pub use registry::{CLASS_AUTH, CLASS_CHAT, CLASS_GENERAL, LimiterRegistry};

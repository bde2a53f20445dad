//! Header names for surfacing admission outcomes to HTTP clients.
//!
//! The HTTP layer is out of scope; these constants keep the header
//! names consistent wherever decisions are rendered.

/// Remaining requests in the current rate-limit window.
pub const RATE_LIMIT_REMAINING: &str = "X-RateLimit-Remaining";

/// Unix timestamp at which the current rate-limit window resets.
pub const RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";

/// Seconds the client should wait before retrying a rate-limited call.
pub const RETRY_AFTER: &str = "Retry-After";

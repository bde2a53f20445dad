//! In-memory store implementations for the Tollgate library.
//!
//! Persistent storage backends are external collaborators; this crate
//! provides the reference implementations of the `tollgate_interface`
//! traits used by tests, demos, and the `tollgated` binary. Both stores
//! keep their data in a `HashMap` behind a tokio `RwLock` and lose
//! everything on drop.

mod notification;
mod tenant;

pub use notification::MemoryNotificationStore;
pub use tenant::MemoryTenantStore;

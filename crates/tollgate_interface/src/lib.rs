//! Trait definitions for the Tollgate admission control library.
//!
//! Persistent storage is an external collaborator: this crate defines
//! the contracts the quota ledger, subscription gate, and notifier
//! consume, plus the persisted record shapes. `tollgate_storage`
//! provides the in-memory reference implementation.

mod notification_store;
mod record;
mod tenant_store;

pub use notification_store::{NotificationKind, NotificationRecord, NotificationStore};
pub use record::TenantRecord;
pub use tenant_store::TenantStore;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, tollgate_error::StoreError>;

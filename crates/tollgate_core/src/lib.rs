//! Core data types for the Tollgate admission control library.
//!
//! This crate provides the foundation data types used across the
//! tollgate workspace: validated tenant identity, admission decisions
//! and their client-facing reason codes, usage accounting, and the
//! per-model pricing table behind estimated cost tracking.

mod decision;
pub mod headers;
mod pricing;
mod state;
mod status;
mod tenant;
mod usage;

pub use decision::{Decision, ReasonCode};
pub use pricing::{GEMINI_FLASH, GEMINI_PRO, ModelRate, PricingTable};
pub use state::AdmissionState;
pub use status::SubscriptionStatus;
pub use tenant::{MAX_TENANT_ID_LEN, TenantId};
pub use usage::{TokenUsage, UsageDelta, UsageSnapshot, estimate_tokens};

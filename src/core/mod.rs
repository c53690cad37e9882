//! Core business logic - framework-agnostic account, approval and allocation operations.
//!
//! Nothing in here knows about HTTP. Every role-scoped operation takes the narrow context for
//! its role from [`context`], so the web layer has to pass the role gate before calling in.

pub mod allocation;
pub mod approval;
pub mod context;
pub mod credentials;
pub mod hostel;
pub mod sessions;
pub mod warden;

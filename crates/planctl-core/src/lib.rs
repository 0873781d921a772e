//! Orchestration logic for the plan console: the lifecycle transition
//! table, the confirmation guard, the list refresh coordinator, the form
//! wizard, the plan menu projection and the write-access model.
//!
//! Everything here is driven by explicit state and explicit context
//! objects; the only I/O is through the `planctl-client` REST wrappers.

pub mod access;
pub mod guard;
pub mod lifecycle;
pub mod list;
pub mod menu;
pub mod wizard;

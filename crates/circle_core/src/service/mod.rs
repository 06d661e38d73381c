//! Core use-case services.
//!
//! # Responsibility
//! - Couple the category and contact stores through one coordinator.
//! - Expose the process-facing facade that persists after each mutation.

pub mod app_state;
pub mod association;

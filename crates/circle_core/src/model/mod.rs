//! Domain model for the category/contact association core.
//!
//! # Responsibility
//! - Define category tree nodes, contact records and the tags linking them.
//! - Define the persisted snapshot document shape.
//!
//! # Invariants
//! - Every category and contact is identified by a stable UUID.
//! - Contacts reference categories by `(dimension, id)`; they never own them.

pub mod category;
pub mod contact;
pub mod snapshot;
pub mod validation;

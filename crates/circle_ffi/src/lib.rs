//! Flutter-facing bindings for the Circle core.

pub mod api;

//! Bindings for the assistants v2 endpoints the session relies on.

pub mod assistants;
pub use assistants::*;

pub mod files;
pub mod messages;
pub mod runs;
pub mod threads;
pub mod vector_stores;

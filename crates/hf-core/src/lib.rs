//! hf-core: stable foundation for hvacflow.
//!
//! Contains:
//! - ids (compact slot ids, model ids, persistent object handles)
//! - error (shared error types)

pub mod error;
pub mod ids;

// Re-exports: nice ergonomics for downstream crates
pub use error::{HfError, HfResult};
pub use ids::*;

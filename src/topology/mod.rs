//! Network topology module.
//!
//! This module contains the parsed topology document types and the
//! structural validation that runs before any subnet allocation begins.

pub mod types;
pub mod validate;

// Re-export key types and functions for easier access
pub use types::{AllocatedLink, LinkSpec, TopologyDocument, DEFAULT_SUBNET_POOL};
pub use validate::{validate, StructuralError};

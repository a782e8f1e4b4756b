//! Subnet allocation module.
//!
//! Home of the address-space registry that carves non-overlapping link
//! subnets out of the configured pool.

pub mod registry;

// Re-export key types for easier access
pub use registry::{AddressSpaceRegistry, SubnetError};

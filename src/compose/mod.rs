//! Manifest assembly.
//!
//! Turns validated topology, allocated links, device identities, and the
//! negotiated management network into the final artifacts: one config
//! bundle per device and one docker-compose manifest wiring services to
//! networks.

pub mod assembler;
pub mod device_files;
pub mod types;

// Re-export key types and functions for easier access
pub use assembler::{assemble, net_name, write_compose, COMPOSE_FILE, COMPOSE_VERSION};
pub use device_files::{DeviceBundle, DEVICES_DIR};
pub use types::{BindMount, ComposeFile, Ipam, IpamConfig, Network, Service};

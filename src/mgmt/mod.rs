//! Management-network negotiation.
//!
//! Every lab shares exactly one macvlan management network for out-of-band
//! access, independent of the per-link data networks. This module
//! discovers existing candidates, provisions a new network when needed,
//! gates non-isolated modes behind an explicit warning, and persists the
//! resolved name back into the topology file.

pub mod interfaces;
pub mod negotiator;

// Re-export key types and functions for easier access
pub use interfaces::{physical_interfaces_in, SYS_CLASS_NET};
pub use negotiator::{
    ensure_mgmt_network, persist_mgmt_network, MgmtError, MgmtOptions, MgmtResolution,
    MGMT_GATEWAY, MGMT_NAME, MGMT_SUBNET,
};

//! Topology document types.
//!
//! This file contains the parsed form of the topology YAML file: the
//! declared point-to-point connections, the subnet pool links are carved
//! from, and the management network name once it has been negotiated.

use indexmap::IndexMap;
use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};

use crate::topology::validate::StructuralError;

/// Pool links are carved from when the topology does not name one.
pub const DEFAULT_SUBNET_POOL: &str = "172.16.0.0/16";

/// Parsed topology document.
///
/// Deserialized from YAML only after [`crate::topology::validate`] has
/// accepted the raw document, so missing or mistyped fields surface as
/// structural errors rather than serde errors.
#[derive(Debug, Serialize, Deserialize)]
pub struct TopologyDocument {
    /// Declared links, in file order. Order matters: subnets and ordinal
    /// network names follow it.
    pub connections: Vec<LinkSpec>,
    /// CIDR block to carve link subnets from (default `172.16.0.0/16`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_pool: Option<String>,
    /// Name of the shared management network, written back by the
    /// negotiator once resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub management_network: Option<String>,
}

impl TopologyDocument {
    /// Parse the declared subnet pool, falling back to the default.
    ///
    /// A malformed pool string is a structural problem with the topology
    /// file, reported before any allocation starts.
    pub fn subnet_pool(&self) -> Result<Ipv4Network, StructuralError> {
        let value = self.subnet_pool.as_deref().unwrap_or(DEFAULT_SUBNET_POOL);
        value
            .parse::<Ipv4Network>()
            .map_err(|err| StructuralError::InvalidSubnetPool {
                value: value.to_string(),
                reason: err.to_string(),
            })
    }

    /// Derive the device set from the declared links.
    ///
    /// Devices appear in order of first appearance across `device1`/`device2`
    /// of each link; each device maps to its declared logical interfaces in
    /// first-appearance order with duplicates collapsed.
    pub fn device_interfaces(&self) -> IndexMap<String, Vec<String>> {
        let mut devices: IndexMap<String, Vec<String>> = IndexMap::new();
        for link in &self.connections {
            for (device, interface) in link.endpoints() {
                let interfaces = devices.entry(device.to_string()).or_default();
                if !interfaces.iter().any(|known| known == interface) {
                    interfaces.push(interface.to_string());
                }
            }
        }
        devices
    }
}

/// One declared connection between two device interfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub device1: String,
    pub intf1: String,
    pub device2: String,
    pub intf2: String,
}

impl LinkSpec {
    /// Both endpoints as (device, interface) pairs, `device1` first.
    pub fn endpoints(&self) -> [(&str, &str); 2] {
        [
            (&self.device1, &self.intf1),
            (&self.device2, &self.intf2),
        ]
    }

    /// Whether the named device sits on either end of this link.
    pub fn involves(&self, device: &str) -> bool {
        self.device1 == device || self.device2 == device
    }
}

/// A link with its allocated subnet.
///
/// Created during the allocation pass and immutable afterwards; the ordinal
/// network name (`link01`, `link02`, ...) is attached at assembly time from
/// the link's position in declaration order.
#[derive(Debug, Clone)]
pub struct AllocatedLink {
    pub spec: LinkSpec,
    pub subnet: Ipv4Network,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(device1: &str, intf1: &str, device2: &str, intf2: &str) -> LinkSpec {
        LinkSpec {
            device1: device1.to_string(),
            intf1: intf1.to_string(),
            device2: device2.to_string(),
            intf2: intf2.to_string(),
        }
    }

    #[test]
    fn test_default_subnet_pool() {
        let doc = TopologyDocument {
            connections: vec![],
            subnet_pool: None,
            management_network: None,
        };
        assert_eq!(doc.subnet_pool().unwrap(), "172.16.0.0/16".parse().unwrap());
    }

    #[test]
    fn test_explicit_subnet_pool() {
        let doc = TopologyDocument {
            connections: vec![],
            subnet_pool: Some("10.50.0.0/20".to_string()),
            management_network: None,
        };
        assert_eq!(doc.subnet_pool().unwrap(), "10.50.0.0/20".parse().unwrap());
    }

    #[test]
    fn test_malformed_subnet_pool() {
        let doc = TopologyDocument {
            connections: vec![],
            subnet_pool: Some("not-a-cidr".to_string()),
            management_network: None,
        };
        assert!(doc.subnet_pool().is_err());
    }

    #[test]
    fn test_device_interfaces_first_appearance_order() {
        let doc = TopologyDocument {
            connections: vec![
                link("leaf1", "Ethernet1", "spine1", "Ethernet1"),
                link("leaf2", "Ethernet1", "spine1", "Ethernet2"),
                link("leaf1", "Ethernet2", "leaf2", "Ethernet2"),
            ],
            subnet_pool: None,
            management_network: None,
        };

        let devices = doc.device_interfaces();
        let names: Vec<&String> = devices.keys().collect();
        assert_eq!(names, ["leaf1", "spine1", "leaf2"]);
        assert_eq!(devices["leaf1"], ["Ethernet1", "Ethernet2"]);
        assert_eq!(devices["spine1"], ["Ethernet1", "Ethernet2"]);
        assert_eq!(devices["leaf2"], ["Ethernet1", "Ethernet2"]);
    }

    #[test]
    fn test_device_interfaces_collapse_duplicates() {
        let doc = TopologyDocument {
            connections: vec![
                link("leaf1", "Ethernet1", "spine1", "Ethernet1"),
                link("leaf1", "Ethernet1", "spine2", "Ethernet1"),
            ],
            subnet_pool: None,
            management_network: None,
        };

        let devices = doc.device_interfaces();
        assert_eq!(devices["leaf1"], ["Ethernet1"]);
    }

    #[test]
    fn test_involves() {
        let spec = link("leaf1", "Ethernet1", "spine1", "Ethernet1");
        assert!(spec.involves("leaf1"));
        assert!(spec.involves("spine1"));
        assert!(!spec.involves("leaf2"));
    }
}

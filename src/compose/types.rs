//! Serde types for the docker-compose manifest.
//!
//! Field and key order is meaningful to humans reading the emitted file,
//! so maps are `IndexMap` and struct fields are declared in emission
//! order.

use indexmap::IndexMap;
use serde::Serialize;

/// Top-level compose manifest.
#[derive(Debug, Serialize)]
pub struct ComposeFile {
    pub version: String,
    pub services: IndexMap<String, Service>,
    pub networks: IndexMap<String, Network>,
}

/// One compose network: either an external reference (the management
/// network) or a bridge network carrying one allocated link subnet.
#[derive(Debug, Serialize)]
pub struct Network {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipam: Option<Ipam>,
}

impl Network {
    pub fn external() -> Self {
        Network {
            external: Some(true),
            driver: None,
            ipam: None,
        }
    }

    pub fn bridge(subnet: String) -> Self {
        Network {
            external: None,
            driver: Some("bridge".to_string()),
            ipam: Some(Ipam {
                config: vec![IpamConfig { subnet }],
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Ipam {
    pub config: Vec<IpamConfig>,
}

#[derive(Debug, Serialize)]
pub struct IpamConfig {
    pub subnet: String,
}

/// One compose service, i.e. one lab device.
#[derive(Debug, Serialize)]
pub struct Service {
    pub image: String,
    pub privileged: bool,
    pub hostname: String,
    pub volumes: Vec<BindMount>,
    pub environment: IndexMap<String, String>,
    pub command: String,
    pub networks: Vec<String>,
}

/// Read-only bind mount into the device container.
#[derive(Debug, Serialize)]
pub struct BindMount {
    #[serde(rename = "type")]
    pub mount_type: String,
    pub source: String,
    pub target: String,
    pub read_only: bool,
}

impl BindMount {
    pub fn read_only(source: String, target: &str) -> Self {
        BindMount {
            mount_type: "bind".to_string(),
            source,
            target: target.to_string(),
            read_only: true,
        }
    }
}

//! Compose manifest assembly.
//!
//! Combines the derived device set, the allocated links, and the
//! negotiated management network into a [`ComposeFile`]. Network ordering
//! is part of the contract: every service attaches to the management
//! network first, then to its incident link networks in declaration
//! order, so repeated runs over the same topology produce the same
//! manifest.

use std::path::Path;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use indexmap::IndexMap;
use log::info;

use crate::compose::device_files::DeviceBundle;
use crate::compose::types::{BindMount, ComposeFile, Network, Service};
use crate::topology::AllocatedLink;

/// Name of the emitted manifest, relative to the output root.
pub const COMPOSE_FILE: &str = "docker-compose.yml";

/// Compose schema version the manifest declares.
pub const COMPOSE_VERSION: &str = "3.7";

/// Entropy helper scripts mounted into every device, expected next to the
/// manifest.
const ENTROPY_SCRIPTS: [&str; 2] = ["setup_entropy.sh", "enable_entropy.sh"];

const CEOS_COMMAND: &str = "/sbin/init systemd.setenv=INTFTYPE=eth systemd.setenv=ETBA=1 \
systemd.setenv=CEOS=1 systemd.setenv=EOS_PLATFORM=ceoslab \
systemd.setenv=container=docker systemd.setenv=MAPETH0=1 \
systemd.setenv=MGMT_INTF=eth0";

/// Ordinal network name for the link at `index` in declaration order.
///
/// Names follow declaration order, so editing the topology file renumbers
/// the networks of later links. Kept that way on purpose: the names are
/// compose-internal labels, not stable identifiers.
pub fn net_name(index: usize) -> String {
    format!("link{:02}", index + 1)
}

fn ceos_environment() -> IndexMap<String, String> {
    let mut environment = IndexMap::new();
    for (key, value) in [
        ("CEOS", "1"),
        ("EOS_PLATFORM", "ceoslab"),
        ("container", "docker"),
        ("ETBA", "1"),
        ("INTFTYPE", "eth"),
        ("SKIP_ZEROTOUCH_BARRIER_IN_SYSDBINIT", "1"),
    ] {
        environment.insert(key.to_string(), value.to_string());
    }
    environment
}

/// Build the compose manifest.
///
/// `devices` comes from [`crate::topology::TopologyDocument::device_interfaces`]
/// and fixes service order; `bundles` maps each device to its config-bundle
/// paths (planned or written).
pub fn assemble(
    devices: &IndexMap<String, Vec<String>>,
    links: &[AllocatedLink],
    mgmt_network: &str,
    bundles: &IndexMap<String, DeviceBundle>,
    image: &str,
    output_root: &Path,
) -> ComposeFile {
    let mut networks = IndexMap::new();
    networks.insert(mgmt_network.to_string(), Network::external());
    for (index, link) in links.iter().enumerate() {
        networks.insert(net_name(index), Network::bridge(link.subnet.to_string()));
    }

    let mut services = IndexMap::new();
    for device in devices.keys() {
        let mut service_networks = vec![mgmt_network.to_string()];
        for (index, link) in links.iter().enumerate() {
            if link.spec.involves(device) {
                service_networks.push(net_name(index));
            }
        }

        let bundle = &bundles[device];
        let mut volumes = vec![
            BindMount::read_only(
                bundle.ceos_config.to_string_lossy().into_owned(),
                "/mnt/flash/ceos-config",
            ),
            BindMount::read_only(
                bundle.eos_mapping.to_string_lossy().into_owned(),
                "/mnt/flash/EosIntfMapping.json",
            ),
        ];
        for script in ENTROPY_SCRIPTS {
            volumes.push(BindMount::read_only(
                output_root.join(script).to_string_lossy().into_owned(),
                &format!("/mnt/flash/{}", script),
            ));
        }

        services.insert(
            device.clone(),
            Service {
                image: image.to_string(),
                privileged: true,
                hostname: device.clone(),
                volumes,
                environment: ceos_environment(),
                command: CEOS_COMMAND.to_string(),
                networks: service_networks,
            },
        );
    }

    ComposeFile {
        version: COMPOSE_VERSION.to_string(),
        services,
        networks,
    }
}

/// Serialize the manifest to `docker-compose.yml` under the output root.
pub fn write_compose(compose: &ComposeFile, output_root: &Path) -> Result<()> {
    let path = output_root.join(COMPOSE_FILE);
    let yaml = serde_yaml::to_string(compose)?;
    std::fs::write(&path, yaml)
        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote compose manifest to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{LinkSpec, TopologyDocument};

    fn link(device1: &str, intf1: &str, device2: &str, intf2: &str) -> LinkSpec {
        LinkSpec {
            device1: device1.to_string(),
            intf1: intf1.to_string(),
            device2: device2.to_string(),
            intf2: intf2.to_string(),
        }
    }

    /// Three links across three devices: leaf1-spine1, leaf2-spine1,
    /// leaf1-leaf2.
    fn triangle() -> (IndexMap<String, Vec<String>>, Vec<AllocatedLink>) {
        let document = TopologyDocument {
            connections: vec![
                link("leaf1", "Ethernet1", "spine1", "Ethernet1"),
                link("leaf2", "Ethernet1", "spine1", "Ethernet2"),
                link("leaf1", "Ethernet2", "leaf2", "Ethernet2"),
            ],
            subnet_pool: None,
            management_network: None,
        };
        let links = document
            .connections
            .iter()
            .enumerate()
            .map(|(i, spec)| AllocatedLink {
                spec: spec.clone(),
                subnet: format!("172.16.{}.0/24", i).parse().unwrap(),
            })
            .collect();
        (document.device_interfaces(), links)
    }

    fn bundles_for(devices: &IndexMap<String, Vec<String>>) -> IndexMap<String, DeviceBundle> {
        devices
            .keys()
            .map(|device| {
                (
                    device.clone(),
                    DeviceBundle::planned(Path::new("/lab"), device),
                )
            })
            .collect()
    }

    #[test]
    fn test_net_name_is_one_indexed_and_padded() {
        assert_eq!(net_name(0), "link01");
        assert_eq!(net_name(8), "link09");
        assert_eq!(net_name(11), "link12");
    }

    #[test]
    fn test_three_link_round_trip() {
        let (devices, links) = triangle();
        let bundles = bundles_for(&devices);

        let compose = assemble(&devices, &links, "a-135", &bundles, "ceos:4.32", Path::new("/lab"));

        // One external management network plus one bridge network per link.
        let network_names: Vec<&String> = compose.networks.keys().collect();
        assert_eq!(network_names, ["a-135", "link01", "link02", "link03"]);
        assert_eq!(compose.networks["a-135"].external, Some(true));
        assert_eq!(
            compose.networks["link02"].ipam.as_ref().unwrap().config[0].subnet,
            "172.16.1.0/24"
        );

        // Each service lists management first, then its incident links in
        // declaration order.
        assert_eq!(compose.services["leaf1"].networks, ["a-135", "link01", "link03"]);
        assert_eq!(compose.services["spine1"].networks, ["a-135", "link01", "link02"]);
        assert_eq!(compose.services["leaf2"].networks, ["a-135", "link02", "link03"]);
    }

    #[test]
    fn test_service_shape() {
        let (devices, links) = triangle();
        let bundles = bundles_for(&devices);

        let compose = assemble(&devices, &links, "a-135", &bundles, "ceos:4.32", Path::new("/lab"));
        let service = &compose.services["leaf1"];

        assert_eq!(service.image, "ceos:4.32");
        assert!(service.privileged);
        assert_eq!(service.hostname, "leaf1");
        assert_eq!(service.environment["CEOS"], "1");
        assert_eq!(service.environment["EOS_PLATFORM"], "ceoslab");
        assert!(service.command.starts_with("/sbin/init"));

        let sources: Vec<&str> = service.volumes.iter().map(|v| v.source.as_str()).collect();
        assert_eq!(
            sources,
            [
                "/lab/devices/leaf1/ceos-config",
                "/lab/devices/leaf1/EosIntfMapping.json",
                "/lab/setup_entropy.sh",
                "/lab/enable_entropy.sh",
            ]
        );
        assert!(service.volumes.iter().all(|v| v.read_only));
    }

    #[test]
    fn test_assembly_is_reproducible() {
        let (devices, links) = triangle();
        let bundles = bundles_for(&devices);

        let first = assemble(&devices, &links, "a-135", &bundles, "ceos:4.32", Path::new("/lab"));
        let second = assemble(&devices, &links, "a-135", &bundles, "ceos:4.32", Path::new("/lab"));
        assert_eq!(
            serde_yaml::to_string(&first).unwrap(),
            serde_yaml::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_write_compose_emits_yaml() {
        let root = tempfile::tempdir().unwrap();
        let (devices, links) = triangle();
        let bundles = bundles_for(&devices);
        let compose = assemble(&devices, &links, "a-135", &bundles, "ceos:4.32", root.path());

        write_compose(&compose, root.path()).unwrap();

        let yaml = std::fs::read_to_string(root.path().join(COMPOSE_FILE)).unwrap();
        assert!(yaml.contains("version: '3.7'"));
        assert!(yaml.contains("link01"));
        assert!(yaml.contains("external: true"));
    }
}

//! End-to-end lab generation pipeline.
//!
//! Strictly sequential: validate the topology, seed the address registry
//! from the runtime, allocate a subnet per link, derive device identities,
//! negotiate the management network, select the cEOS image, then assemble
//! and write the artifacts. Any failure before assembly leaves no output
//! files behind; dry-run never writes at all.

use std::path::PathBuf;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use indexmap::IndexMap;
use ipnetwork::Ipv4Network;
use log::info;

use crate::compose::{assemble, write_compose, COMPOSE_FILE, DeviceBundle};
use crate::docker::{ContainerRuntime, RuntimeError};
use crate::identity::{derive_identity, DeviceIdentity};
use crate::mgmt::{ensure_mgmt_network, persist_mgmt_network, MgmtOptions};
use crate::prompt::Prompter;
use crate::subnet::AddressSpaceRegistry;
use crate::topology::{validate, AllocatedLink, TopologyDocument};

/// Only images whose repository starts with this are offered.
pub const IMAGE_PREFIX: &str = "ceos";

/// Prefix length of the subnet carved out for each link.
pub const LINK_PREFIX_LEN: u8 = 24;

/// Pipeline inputs taken from the command line.
#[derive(Debug)]
pub struct GenerateOptions {
    pub topology: PathBuf,
    /// Plan and report only; no file writes, no runtime mutations.
    pub dry_run: bool,
    /// Explicit parent interface for management-network creation.
    pub parent: Option<String>,
    /// Directory the manifest and device bundles land in.
    pub output_root: PathBuf,
}

/// One link as planned by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLink {
    pub net_name: String,
    pub device1: String,
    pub device2: String,
    pub subnet: Ipv4Network,
}

/// What a run decided, whether or not it wrote anything. Dry runs return
/// the same plan a live run would have.
#[derive(Debug)]
pub struct LabSummary {
    pub devices: Vec<String>,
    pub links: Vec<PlannedLink>,
    pub mgmt_network: String,
    pub image: String,
    pub files_written: bool,
}

/// Run the whole pipeline.
pub fn generate_lab(
    options: &GenerateOptions,
    runtime: &dyn ContainerRuntime,
    prompter: &dyn Prompter,
) -> Result<LabSummary> {
    // Parse and validate before touching anything else.
    let raw = std::fs::read_to_string(&options.topology).wrap_err_with(|| {
        format!("Topology file '{}' does not exist or is unreadable", options.topology.display())
    })?;
    let value: serde_yaml::Value = serde_yaml::from_str(&raw)
        .wrap_err_with(|| format!("Topology file '{}' is not valid YAML", options.topology.display()))?;
    validate(&value).wrap_err("Invalid topology file")?;
    let mut document: TopologyDocument =
        serde_yaml::from_value(value).wrap_err("Invalid topology file")?;
    let pool = document.subnet_pool()?;
    info!(
        "Topology '{}': {} links, pool {}",
        options.topology.display(),
        document.connections.len(),
        pool
    );

    // Runtime state is captured once; networks created mid-run by others
    // are not seen.
    let discovered = runtime
        .network_subnets()
        .wrap_err("Failed to list existing runtime networks")?;
    let mut registry = AddressSpaceRegistry::from_discovered(discovered);

    let mut links = Vec::with_capacity(document.connections.len());
    for spec in &document.connections {
        let subnet = registry.next_subnet(pool, LINK_PREFIX_LEN)?;
        links.push(AllocatedLink {
            spec: spec.clone(),
            subnet,
        });
    }

    let devices = document.device_interfaces();
    let identities: IndexMap<String, DeviceIdentity> = devices
        .iter()
        .map(|(name, interfaces)| (name.clone(), derive_identity(name, interfaces)))
        .collect();

    let mgmt_options = MgmtOptions {
        dry_run: options.dry_run,
        parent: options.parent.clone(),
        ..MgmtOptions::default()
    };
    let resolution = ensure_mgmt_network(runtime, prompter, &mgmt_options)?;
    persist_mgmt_network(&options.topology, &mut document, &resolution.name, options.dry_run)?;

    let image = select_image(runtime, prompter, options.dry_run)?;

    let bundles: IndexMap<String, DeviceBundle> = devices
        .keys()
        .map(|device| {
            (
                device.clone(),
                DeviceBundle::planned(&options.output_root, device),
            )
        })
        .collect();

    if options.dry_run {
        println!("Dry-run: would generate device configs.");
        println!("Dry-run: would generate {}.", COMPOSE_FILE);
    } else {
        for (device, bundle) in &bundles {
            bundle.write(&identities[device])?;
        }
        let compose = assemble(
            &devices,
            &links,
            &resolution.name,
            &bundles,
            &image,
            &options.output_root,
        );
        write_compose(&compose, &options.output_root)?;
    }

    let summary = LabSummary {
        devices: devices.keys().cloned().collect(),
        links: links
            .iter()
            .enumerate()
            .map(|(index, link)| PlannedLink {
                net_name: crate::compose::net_name(index),
                device1: link.spec.device1.clone(),
                device2: link.spec.device2.clone(),
                subnet: link.subnet,
            })
            .collect(),
        mgmt_network: resolution.name,
        image,
        files_written: !options.dry_run,
    };
    print_summary(&summary);
    Ok(summary)
}

fn select_image(
    runtime: &dyn ContainerRuntime,
    prompter: &dyn Prompter,
    dry_run: bool,
) -> Result<String> {
    let images = runtime
        .images(IMAGE_PREFIX)
        .wrap_err("Failed to list container images")?;
    if images.is_empty() {
        return Err(RuntimeError::NoImages {
            prefix: IMAGE_PREFIX.to_string(),
        }
        .into());
    }

    println!("\nAvailable {} images:", IMAGE_PREFIX);
    for (idx, image) in images.iter().enumerate() {
        println!("  {}. {}", idx + 1, image);
    }

    let index = if dry_run {
        println!("Dry-run: would select {}", images[0]);
        0
    } else {
        prompter.pick_image(&images)
    };
    Ok(images[index].clone())
}

fn print_summary(summary: &LabSummary) {
    println!("\nPlanned networks:");
    for link in &summary.links {
        println!(
            "  {}: {} <-> {} on {}",
            link.net_name, link.device1, link.device2, link.subnet
        );
    }
    println!("Management network: {}", summary.mgmt_network);
    println!("Devices: {}", summary.devices.join(", "));

    if summary.files_written {
        println!("\n{} generated successfully.", COMPOSE_FILE);
        println!("To start your lab:   docker-compose up -d");
        println!("To tear it down:     docker-compose down");
    } else {
        println!("\nDry-run completed successfully.");
    }
}

//! Negotiation state machine for the management network.
//!
//! Discover existing macvlan networks, let the decision provider select
//! one or trigger creation, gate non-isolated modes behind a warning, and
//! persist the agreed name into the topology document. Declining the
//! safety gate loops back to discovery rather than aborting the run.

use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use serde_yaml::Value;

use crate::docker::{ContainerRuntime, MacvlanMode, MacvlanSpec};
use crate::mgmt::interfaces::{physical_interfaces_in, SYS_CLASS_NET};
use crate::prompt::{NetworkChoice, Prompter};
use crate::topology::TopologyDocument;

/// Name given to a freshly created management network.
pub const MGMT_NAME: &str = "a-135";

/// Fixed subnet of a freshly created management network, outside the
/// default link pool.
pub const MGMT_SUBNET: &str = "192.168.150.0/24";

/// Gateway paired with [`MGMT_SUBNET`].
pub const MGMT_GATEWAY: &str = "192.168.150.1";

/// Errors the negotiator can surface on its own.
#[derive(Debug, thiserror::Error)]
pub enum MgmtError {
    #[error("No usable physical interfaces found. Specify one with --parent")]
    NoParentInterface,
}

/// Negotiation knobs taken from the command line.
#[derive(Debug)]
pub struct MgmtOptions {
    /// Skip network creation and topology rewrite, reporting instead.
    pub dry_run: bool,
    /// Explicit parent interface for creation; first viable host interface
    /// otherwise.
    pub parent: Option<String>,
    /// Where to look for host interfaces when no parent is given. Tests
    /// substitute a scratch directory.
    pub sys_net_dir: PathBuf,
}

impl Default for MgmtOptions {
    fn default() -> Self {
        MgmtOptions {
            dry_run: false,
            parent: None,
            sys_net_dir: PathBuf::from(SYS_CLASS_NET),
        }
    }
}

/// Outcome of a successful negotiation.
#[derive(Debug, Clone)]
pub struct MgmtResolution {
    pub name: String,
    pub mode: MacvlanMode,
    pub created: bool,
}

/// Drive the negotiation to its single terminal success path.
pub fn ensure_mgmt_network(
    runtime: &dyn ContainerRuntime,
    prompter: &dyn Prompter,
    options: &MgmtOptions,
) -> Result<MgmtResolution> {
    loop {
        let existing = runtime
            .macvlan_networks()
            .wrap_err("Failed to list existing macvlan networks")?;

        let resolution = if existing.is_empty() {
            create_network(runtime, prompter, options)?
        } else {
            println!("\nExisting macvlan networks:");
            for (idx, network) in existing.iter().enumerate() {
                println!(
                    "  {}. {} -> {} [mode: {}]",
                    idx + 1,
                    network.name,
                    network.parent,
                    network.mode
                );
            }
            match prompter.pick_network(&existing) {
                NetworkChoice::CreateNew => create_network(runtime, prompter, options)?,
                NetworkChoice::Existing(idx) => {
                    let chosen = &existing[idx];
                    MgmtResolution {
                        name: chosen.name.clone(),
                        mode: chosen.mode,
                        created: false,
                    }
                }
            }
        };

        if !resolution.mode.is_isolated() {
            println!(
                "WARNING: mode '{}' is not isolated. LLDP/broadcast frames may reach your mgmt network.",
                resolution.mode
            );
            if !prompter.confirm("Continue anyway?") {
                continue;
            }
        }

        info!(
            "Management network resolved: {} (mode {}, created: {})",
            resolution.name, resolution.mode, resolution.created
        );
        return Ok(resolution);
    }
}

fn create_network(
    runtime: &dyn ContainerRuntime,
    prompter: &dyn Prompter,
    options: &MgmtOptions,
) -> Result<MgmtResolution> {
    let parent = match &options.parent {
        Some(parent) => parent.clone(),
        None => physical_interfaces_in(&options.sys_net_dir)
            .wrap_err("Failed to list host network interfaces")?
            .into_iter()
            .next()
            .ok_or(MgmtError::NoParentInterface)?,
    };

    println!("\nCreating a new macvlan network:");
    println!("   Name: {}", MGMT_NAME);
    println!("   Subnet: {}", MGMT_SUBNET);
    println!("   Gateway: {}", MGMT_GATEWAY);
    println!("   Parent interface: {}", parent);
    let mode = prompter.pick_mode();

    if options.dry_run {
        println!(
            "Dry-run: would create macvlan network '{}' on '{}' with {}, gateway {}, mode {}",
            MGMT_NAME, parent, MGMT_SUBNET, MGMT_GATEWAY, mode
        );
    } else {
        let spec = MacvlanSpec {
            name: MGMT_NAME.to_string(),
            subnet: MGMT_SUBNET.parse().expect("constant subnet parses"),
            gateway: MGMT_GATEWAY.parse().expect("constant gateway parses"),
            parent: parent.clone(),
            mode,
        };
        runtime
            .create_macvlan(&spec)
            .wrap_err("Failed to create macvlan network")?;
        println!(
            "Created macvlan network '{}' on '{}' in mode '{}'",
            MGMT_NAME, parent, mode
        );
    }

    Ok(MgmtResolution {
        name: MGMT_NAME.to_string(),
        mode,
        created: true,
    })
}

/// Persist the resolved network name into the topology document and file.
///
/// The file is rewritten through its raw YAML value so unrelated keys
/// survive untouched. Returns whether the name actually changed. Dry-run
/// updates the in-memory document only.
pub fn persist_mgmt_network(
    topology_path: &Path,
    document: &mut TopologyDocument,
    name: &str,
    dry_run: bool,
) -> Result<bool> {
    if document.management_network.as_deref() == Some(name) {
        return Ok(false);
    }
    document.management_network = Some(name.to_string());

    if dry_run {
        println!(
            "Dry-run: would update {} with management_network: {}",
            topology_path.display(),
            name
        );
        return Ok(true);
    }

    let raw = std::fs::read_to_string(topology_path)
        .wrap_err_with(|| format!("Failed to read topology file {}", topology_path.display()))?;
    let mut value: Value = serde_yaml::from_str(&raw)
        .wrap_err_with(|| format!("Failed to parse topology file {}", topology_path.display()))?;
    if let Value::Mapping(mapping) = &mut value {
        mapping.insert(
            Value::String("management_network".to_string()),
            Value::String(name.to_string()),
        );
    }
    let rewritten = serde_yaml::to_string(&value)?;
    std::fs::write(topology_path, rewritten)
        .wrap_err_with(|| format!("Failed to rewrite topology file {}", topology_path.display()))?;
    info!("Persisted management network '{}' into {}", name, topology_path.display());
    Ok(true)
}

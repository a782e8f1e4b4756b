//! Docker/podman CLI adapter.
//!
//! Implements [`ContainerRuntime`] by shelling out to the `docker` binary
//! (podman installs a compatible shim under the same name but takes a
//! different argument spelling for macvlan creation, so the adapter sniffs
//! the version string once at construction).

use std::collections::HashMap;
use std::process::Command;

use ipnetwork::IpNetwork;
use log::debug;
use serde::Deserialize;

use crate::docker::runtime::{
    ContainerRuntime, MacvlanMode, MacvlanNetwork, MacvlanSpec, RuntimeError,
};

/// Shape of `docker network inspect` output, reduced to the fields the
/// compiler reads.
#[derive(Debug, Deserialize)]
struct NetworkInspect {
    #[serde(rename = "IPAM", default)]
    ipam: Option<Ipam>,
    #[serde(rename = "Options", default)]
    options: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Ipam {
    #[serde(rename = "Config", default)]
    config: Option<Vec<IpamConfig>>,
}

#[derive(Debug, Deserialize)]
struct IpamConfig {
    #[serde(rename = "Subnet", default)]
    subnet: Option<String>,
}

/// CLI-backed container runtime.
pub struct DockerCli {
    podman: bool,
}

impl DockerCli {
    /// Probe the installed runtime once; queries share the docker CLI
    /// surface, only macvlan creation differs.
    pub fn detect() -> Self {
        let podman = Command::new("docker")
            .arg("--version")
            .output()
            .map(|output| {
                String::from_utf8_lossy(&output.stdout)
                    .to_lowercase()
                    .contains("podman")
            })
            .unwrap_or(false);
        debug!("Container runtime detected: {}", if podman { "podman" } else { "docker" });
        DockerCli { podman }
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<String, RuntimeError> {
        let command = format!("{} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|err| RuntimeError::CommandFailed {
                command: command.clone(),
                detail: err.to_string(),
            })?;
        if !output.status.success() {
            return Err(RuntimeError::CommandFailed {
                command,
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn inspect_network(&self, id: &str) -> Result<NetworkInspect, RuntimeError> {
        let command = format!("docker network inspect {}", id);
        let output = self.run("docker", &["network", "inspect", id])?;
        let mut parsed: Vec<NetworkInspect> =
            serde_json::from_str(&output).map_err(|err| RuntimeError::UnparseableOutput {
                command: command.clone(),
                detail: err.to_string(),
            })?;
        if parsed.is_empty() {
            return Err(RuntimeError::UnparseableOutput {
                command,
                detail: "empty inspect result".to_string(),
            });
        }
        Ok(parsed.remove(0))
    }
}

impl ContainerRuntime for DockerCli {
    fn network_subnets(&self) -> Result<Vec<IpNetwork>, RuntimeError> {
        let ids = self.run("docker", &["network", "ls", "-q"])?;
        let mut subnets = Vec::new();
        for id in ids.lines().filter(|line| !line.is_empty()) {
            let inspect = self.inspect_network(id)?;
            let configs = inspect.ipam.and_then(|ipam| ipam.config).unwrap_or_default();
            for config in configs {
                let Some(subnet) = config.subnet else { continue };
                let parsed =
                    subnet
                        .parse::<IpNetwork>()
                        .map_err(|err| RuntimeError::UnparseableOutput {
                            command: format!("docker network inspect {}", id),
                            detail: format!("subnet '{}': {}", subnet, err),
                        })?;
                subnets.push(parsed);
            }
        }
        debug!("Runtime reports {} claimed subnets", subnets.len());
        Ok(subnets)
    }

    fn macvlan_networks(&self) -> Result<Vec<MacvlanNetwork>, RuntimeError> {
        let names = self.run(
            "docker",
            &["network", "ls", "--filter", "driver=macvlan", "--format", "{{.Name}}"],
        )?;
        let mut networks = Vec::new();
        for name in names.lines().filter(|line| !line.is_empty()) {
            let inspect = self.inspect_network(name)?;
            let parent = inspect
                .options
                .get("parent")
                .cloned()
                .unwrap_or_else(|| "unknown".to_string());
            // Runtimes that omit or mangle the mode option get the macvlan
            // default.
            let mode = inspect
                .options
                .get("macvlan_mode")
                .and_then(|mode| mode.parse::<MacvlanMode>().ok())
                .unwrap_or(MacvlanMode::Bridge);
            networks.push(MacvlanNetwork {
                name: name.to_string(),
                parent,
                mode,
            });
        }
        Ok(networks)
    }

    fn images(&self, prefix: &str) -> Result<Vec<String>, RuntimeError> {
        let output = self.run("docker", &["images", "--format", "{{.Repository}}:{{.Tag}}"])?;
        Ok(output
            .lines()
            .filter(|line| line.starts_with(prefix))
            .map(str::to_string)
            .collect())
    }

    fn create_macvlan(&self, spec: &MacvlanSpec) -> Result<(), RuntimeError> {
        let subnet = spec.subnet.to_string();
        let gateway = spec.gateway.to_string();
        let mode = spec.mode.to_string();
        if self.podman {
            self.run(
                "podman",
                &[
                    "network",
                    "create",
                    "--driver",
                    "macvlan",
                    "--subnet",
                    &subnet,
                    "--gateway",
                    &gateway,
                    "--interface",
                    &spec.parent,
                    "--mode",
                    &mode,
                    &spec.name,
                ],
            )?;
        } else {
            let parent_opt = format!("parent={}", spec.parent);
            let mode_opt = format!("macvlan_mode={}", mode);
            self.run(
                "docker",
                &[
                    "network",
                    "create",
                    "-d",
                    "macvlan",
                    "--subnet",
                    &subnet,
                    "--gateway",
                    &gateway,
                    "-o",
                    &parent_opt,
                    "-o",
                    &mode_opt,
                    &spec.name,
                ],
            )?;
        }
        Ok(())
    }
}

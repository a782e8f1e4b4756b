//! Runtime query shapes and the trait the compiler depends on.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnetwork::{IpNetwork, Ipv4Network};

/// Errors surfaced by the container-runtime boundary.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Runtime command '{command}' failed: {detail}")]
    CommandFailed { command: String, detail: String },

    #[error("Could not parse output of '{command}': {detail}")]
    UnparseableOutput { command: String, detail: String },

    #[error("No {prefix} images found. Import one and try again")]
    NoImages { prefix: String },
}

/// Forwarding mode of a macvlan network.
///
/// Only `private` isolates endpoints from broadcast and discovery traffic
/// on the parent interface; the negotiator warns before accepting any
/// other mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacvlanMode {
    Bridge,
    Private,
    Vepa,
    Passthru,
}

impl MacvlanMode {
    pub fn is_isolated(self) -> bool {
        self == MacvlanMode::Private
    }
}

impl fmt::Display for MacvlanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MacvlanMode::Bridge => "bridge",
            MacvlanMode::Private => "private",
            MacvlanMode::Vepa => "vepa",
            MacvlanMode::Passthru => "passthru",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for MacvlanMode {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bridge" => Ok(MacvlanMode::Bridge),
            "private" => Ok(MacvlanMode::Private),
            "vepa" => Ok(MacvlanMode::Vepa),
            "passthru" => Ok(MacvlanMode::Passthru),
            _ => Err(()),
        }
    }
}

/// An existing macvlan network as reported by the runtime.
#[derive(Debug, Clone)]
pub struct MacvlanNetwork {
    pub name: String,
    pub parent: String,
    pub mode: MacvlanMode,
}

/// Parameters for a macvlan network the negotiator wants created.
#[derive(Debug, Clone)]
pub struct MacvlanSpec {
    pub name: String,
    pub subnet: Ipv4Network,
    pub gateway: Ipv4Addr,
    pub parent: String,
    pub mode: MacvlanMode,
}

/// Queries and mutations the compiler needs from the container runtime.
///
/// The compiler depends only on the shape of these responses, not on the
/// transport used to obtain them. [`crate::docker::DockerCli`] shells out
/// to docker/podman; tests use an in-memory fake.
pub trait ContainerRuntime {
    /// Subnets claimed by every existing runtime network.
    fn network_subnets(&self) -> Result<Vec<IpNetwork>, RuntimeError>;

    /// Existing macvlan networks with their parent interface and mode.
    fn macvlan_networks(&self) -> Result<Vec<MacvlanNetwork>, RuntimeError>;

    /// Locally available images whose repository name starts with `prefix`.
    fn images(&self, prefix: &str) -> Result<Vec<String>, RuntimeError>;

    /// Create a macvlan network. The only mutating call in the interface.
    fn create_macvlan(&self, spec: &MacvlanSpec) -> Result<(), RuntimeError>;
}

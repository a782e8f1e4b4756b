//! Container-runtime boundary.
//!
//! The rest of the compiler treats the container runtime as an external
//! oracle: it asks which subnets are already claimed, which macvlan
//! networks and images exist, and (once per run at most) asks for a macvlan
//! network to be created. Everything goes through the [`ContainerRuntime`]
//! trait so tests can substitute an in-memory fake.

pub mod cli;
pub mod runtime;

// Re-export key types for easier access
pub use cli::DockerCli;
pub use runtime::{ContainerRuntime, MacvlanMode, MacvlanNetwork, MacvlanSpec, RuntimeError};

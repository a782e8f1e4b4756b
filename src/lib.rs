//! # Labgen - Topology compiler for containerized cEOS network labs
//!
//! This library turns a declarative topology description into a runnable
//! multi-container virtual lab: per-device configuration bundles, a
//! collision-free addressing plan for every point-to-point link, and a
//! docker-compose manifest wiring it all together.
//!
//! ## Overview
//!
//! Labgen compiles a small YAML topology file (a list of device/interface
//! connections) into everything a container runtime needs to bring the lab
//! up. Each declared link gets its own bridge network carved from a subnet
//! pool, each device gets deterministic identity artifacts (serial number,
//! system MAC, interface mapping), and all devices share one macvlan
//! management network for out-of-band access.
//!
//! ## Key Features
//!
//! - **Collision-free addressing**: link subnets never overlap each other or
//!   subnets already claimed by the host's container runtime
//! - **Deterministic identities**: serial numbers and locally-administered
//!   MAC addresses derived from device names, stable across runs
//! - **Management-network negotiation**: reuse an existing macvlan network
//!   or provision one, with a safety gate for non-isolated modes
//! - **Dry-run mode**: report every allocation decision without touching the
//!   filesystem or the container runtime
//! - **Non-interactive mode**: first-viable defaults at every decision point
//!   for unattended runs
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `topology`: topology document types and structural validation
//! - `subnet`: address-space registry handing out non-overlapping blocks
//! - `identity`: per-device serial/MAC/interface-mapping derivation
//! - `mgmt`: management-network negotiation state machine
//! - `docker`: container-runtime boundary (trait plus CLI adapter)
//! - `compose`: manifest assembly and per-device config bundles
//! - `prompt`: injectable decision providers (interactive or automatic)
//! - `generator`: high-level pipeline tying the stages together
//!
//! ## Topology Format
//!
//! ```yaml
//! subnet_pool: "172.16.0.0/16"   # optional, this is the default
//! management_network: a-135      # written back once negotiated
//! connections:
//!   - device1: leaf1
//!     intf1: Ethernet1
//!     device2: spine1
//!     intf2: Ethernet1
//!   - device1: leaf2
//!     intf1: Ethernet1
//!     device2: spine1
//!     intf2: Ethernet2
//! ```
//!
//! ## Error Handling
//!
//! Leaf modules expose `thiserror` enums; the pipeline and binary use
//! `color_eyre` to attach context and render diagnostics. Any structural
//! problem, pool exhaustion, or missing external resource aborts the run
//! before output files are written.

pub mod compose;
pub mod docker;
pub mod generator;
pub mod identity;
pub mod mgmt;
pub mod prompt;
pub mod subnet;
pub mod topology;

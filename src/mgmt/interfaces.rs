//! Host physical-interface discovery.
//!
//! A macvlan network needs a physical parent interface. When the operator
//! does not name one, the first viable entry of `/sys/class/net` is used:
//! loopback and the runtime's own virtual bridges are never viable.

use std::io;
use std::path::Path;

/// Where the kernel lists network interfaces.
pub const SYS_CLASS_NET: &str = "/sys/class/net";

/// List candidate parent interfaces under a sysfs-style directory
/// (normally [`SYS_CLASS_NET`]; tests point it elsewhere). Entries are
/// sorted so "first viable" is deterministic.
pub fn physical_interfaces_in(dir: &Path) -> io::Result<Vec<String>> {
    let mut interfaces = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if is_viable(&name) {
            interfaces.push(name);
        }
    }
    interfaces.sort();
    Ok(interfaces)
}

fn is_viable(name: &str) -> bool {
    name != "lo" && !name.starts_with("docker") && !name.starts_with("br-")
}

//! Per-device identity derivation.
//!
//! Every device in the topology gets a deterministic identity derived
//! purely from its name and declared interfaces: a serial number, a
//! locally-administered system MAC address, and the logical-to-physical
//! interface mapping the container image reads at boot. The same inputs
//! produce the same identity on every run.

use indexmap::IndexMap;
use serde::Serialize;

/// Physical slot of the management interface inside the container.
pub const MANAGEMENT_SLOT: &str = "eth0";

/// Logical name the management slot is mapped to.
pub const MANAGEMENT_INTF: &str = "Management1";

/// Identity artifacts for one device.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub serial_number: String,
    pub mac_address: String,
    pub interface_mapping: InterfaceMapping,
}

/// Logical-to-physical interface mapping, serialized to
/// `EosIntfMapping.json` in the device's config bundle.
///
/// The management interface always occupies slot 0; declared data
/// interfaces take slots 1.. in first-appearance order. `IndexMap`
/// preserves that order through serialization.
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceMapping {
    #[serde(rename = "ManagementIntf")]
    pub management: IndexMap<String, String>,
    #[serde(rename = "EthernetIntf")]
    pub ethernet: IndexMap<String, String>,
}

/// Derive the identity artifacts for a device.
///
/// Pure and deterministic: serial number and MAC depend only on the name,
/// the interface mapping only on the declared-interface order. Reordering
/// the declared interfaces reorders the slot assignment accordingly.
pub fn derive_identity(name: &str, declared_interfaces: &[String]) -> DeviceIdentity {
    DeviceIdentity {
        serial_number: serial_from_name(name),
        mac_address: mac_from_name(name),
        interface_mapping: map_interfaces(declared_interfaces),
    }
}

/// Serial number for a device: uppercased name plus a fixed suffix.
pub fn serial_from_name(name: &str) -> String {
    format!("{}-SN", name.to_uppercase())
}

/// Locally-administered unicast MAC address for a device.
///
/// The first five bytes of `md5(name)` fill the trailing octets; the
/// leading `02` octet sets the locally-administered bit and clears the
/// multicast bit. Collisions across distinct names require a 40-bit digest
/// collision, negligible at lab scale.
pub fn mac_from_name(name: &str) -> String {
    let digest = md5::compute(name.as_bytes());
    format!(
        "02:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        digest[0], digest[1], digest[2], digest[3], digest[4]
    )
}

fn map_interfaces(declared: &[String]) -> InterfaceMapping {
    let mut management = IndexMap::new();
    management.insert(MANAGEMENT_SLOT.to_string(), MANAGEMENT_INTF.to_string());

    let mut ethernet = IndexMap::new();
    for (slot, interface) in declared.iter().enumerate() {
        ethernet.insert(format!("eth{}", slot + 1), interface.clone());
    }

    InterfaceMapping {
        management,
        ethernet,
    }
}

//! Per-device configuration bundles.
//!
//! Each device gets a directory under `devices/` holding a `ceos-config`
//! key=value file (serial number, system MAC, TFA version) and an
//! `EosIntfMapping.json` interface map. Both are bind-mounted read-only
//! into the container.

use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::debug;

use crate::identity::DeviceIdentity;

/// Directory the device bundles live under, relative to the output root.
pub const DEVICES_DIR: &str = "devices";

/// Paths of one device's bundle, used as bind-mount sources.
#[derive(Debug, Clone)]
pub struct DeviceBundle {
    pub ceos_config: PathBuf,
    pub eos_mapping: PathBuf,
}

impl DeviceBundle {
    /// Paths the bundle will occupy, without touching the filesystem.
    /// Dry runs plan against these; live runs write to them.
    pub fn planned(output_root: &Path, device: &str) -> Self {
        let device_dir = output_root.join(DEVICES_DIR).join(device);
        DeviceBundle {
            ceos_config: device_dir.join("ceos-config"),
            eos_mapping: device_dir.join("EosIntfMapping.json"),
        }
    }

    /// Write the bundle for one device.
    pub fn write(&self, identity: &DeviceIdentity) -> Result<()> {
        let device_dir = self
            .ceos_config
            .parent()
            .expect("bundle paths always sit inside a device directory");
        std::fs::create_dir_all(device_dir)
            .wrap_err_with(|| format!("Failed to create {}", device_dir.display()))?;

        let ceos_config = format!(
            "SERIALNUMBER={}\nSYSTEMMACADDR={}\nTFA_VERSION=2\n",
            identity.serial_number, identity.mac_address
        );
        std::fs::write(&self.ceos_config, ceos_config)
            .wrap_err_with(|| format!("Failed to write {}", self.ceos_config.display()))?;

        let mapping = serde_json::to_string_pretty(&identity.interface_mapping)?;
        std::fs::write(&self.eos_mapping, mapping)
            .wrap_err_with(|| format!("Failed to write {}", self.eos_mapping.display()))?;

        debug!("Wrote device bundle under {}", device_dir.display());
        Ok(())
    }
}

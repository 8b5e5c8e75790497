//! Raw memory dump to a file.
//!
//! Writes the dump bytes as-is plus a JSON sidecar with everything needed
//! to decode them later without the device.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use super::{describe, write_json};
use crate::g2::clock::ClockCalibration;
use crate::g2::config::DeviceFamily;
use crate::traits::DiveComputer;

/// Sidecar written next to a dump file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpMetadata {
    pub family: DeviceFamily,
    pub model: u32,
    pub serial: u32,
    /// Device clock at download time, in half-second ticks.
    pub devtime: u32,
    /// Host clock at download time.
    pub systime: DateTime<Utc>,
    pub length: usize,
    pub sha256: String,
}

impl DumpMetadata {
    /// Load a sidecar from disk
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read dump metadata: {}", e))?;

        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse dump metadata: {}", e))
    }

    pub fn clock(&self) -> ClockCalibration {
        ClockCalibration::new(self.devtime, self.systime)
    }
}

/// Sidecar path for a dump file: the dump path with `.json` appended.
pub fn metadata_path(dump: &Path) -> PathBuf {
    let mut name = dump.as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

/// SHA256 of a byte slice as lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Dump the device memory to `output` and write its sidecar.
pub fn dump_device(device: &mut dyn DiveComputer, output: &Path) -> Result<DumpMetadata, String> {
    let mut buffer = Vec::new();
    device.dump(&mut buffer).map_err(|e| describe(&e))?;

    let info = device
        .devinfo()
        .ok_or_else(|| "Device did not report its identity".to_string())?;
    let clock = device
        .clock()
        .ok_or_else(|| "Device did not report its clock".to_string())?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create output directory: {}", e))?;
    }
    fs::write(output, &buffer).map_err(|e| format!("Failed to write dump: {}", e))?;

    let metadata = DumpMetadata {
        family: device.family(),
        model: info.model,
        serial: info.serial,
        devtime: clock.devtime,
        systime: clock.systime,
        length: buffer.len(),
        sha256: sha256_hex(&buffer),
    };
    write_json(&metadata, Some(&metadata_path(output)), true)?;

    info!("Wrote {} bytes to {}", buffer.len(), output.display());
    Ok(metadata)
}

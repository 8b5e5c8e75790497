//! Operations behind the `g2tool` subcommands.
//!
//! Most commands work on a [`DiveComputer`](crate::traits::DiveComputer) or a
//! dump file and return plain data; printing is left to the binary.

pub mod download;
pub mod dump;
pub mod extract;
pub mod settings;

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::g2::clock::ClockCalibration;
use crate::g2::error::G2Error;
use crate::g2::extract::DiveRecord;
use crate::g2::fingerprint::Fingerprint;

pub use download::download_dives;
pub use dump::{dump_device, metadata_path, DumpMetadata};
pub use extract::extract_file;
pub use settings::{update_settings, SettingsUpdate};

/// One dive in the JSON output of `download` and `extract`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiveSummary {
    /// 1 for the newest dive.
    pub number: usize,
    /// Start of the record within the dump.
    pub offset: usize,
    pub size: usize,
    /// Fingerprint bytes as hex, usable with `--fingerprint`.
    pub fingerprint: String,
    /// RFC 3339 start time, when a clock calibration is known.
    pub datetime: Option<String>,
    #[serde(skip)]
    timestamp: Fingerprint,
}

impl DiveSummary {
    pub fn new(number: usize, dive: &DiveRecord<'_>) -> Self {
        Self {
            number,
            offset: dive.offset(),
            size: dive.len(),
            fingerprint: dive.fingerprint().to_string(),
            datetime: None,
            timestamp: dive.fingerprint(),
        }
    }

    /// Fill in the start time from the device clock.
    pub fn with_clock(mut self, clock: &ClockCalibration) -> Self {
        self.datetime = Some(clock.dive_datetime(self.timestamp).to_rfc3339());
        self
    }
}

/// Format a driver error with its support code.
pub fn describe(error: &G2Error) -> String {
    format!("[{}] {}", error.error_code(), error)
}

/// Serialize `value` to `output`, or stdout when no path is given.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>, pretty: bool) -> Result<(), String> {
    let contents = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| format!("Failed to serialize output: {}", e))?;

    match output {
        Some(path) => {
            // Ensure parent directory exists
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create output directory: {}", e))?;
            }
            fs::write(path, contents).map_err(|e| format!("Failed to write output: {}", e))
        }
        None => {
            println!("{}", contents);
            Ok(())
        }
    }
}

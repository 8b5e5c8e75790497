//! Dive fingerprints and incremental download policy.
//!
//! A G2 fingerprint is the four-byte little-endian device timestamp stored
//! right after each dive's length field. Handing the newest known
//! fingerprint back to the device makes it send only newer dives.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::FINGERPRINT_SIZE;
use super::error::{G2Error, G2Result};
use super::extract::DiveRecord;

/// Device-time timestamp identifying one dive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub u32);

impl Fingerprint {
    /// Parse raw fingerprint bytes.
    ///
    /// Empty input means "no fingerprint" and yields the zero cursor; four
    /// bytes are read little-endian; any other size is rejected.
    pub fn from_bytes(data: &[u8]) -> G2Result<Self> {
        match data.len() {
            0 => Ok(Fingerprint(0)),
            FINGERPRINT_SIZE => {
                let mut raw = [0u8; FINGERPRINT_SIZE];
                raw.copy_from_slice(data);
                Ok(Fingerprint(u32::from_le_bytes(raw)))
            }
            n => Err(G2Error::invalid_argument(format!(
                "fingerprint must be 0 or {} bytes, got {}",
                FINGERPRINT_SIZE, n
            ))),
        }
    }

    /// Parse a fingerprint from its hex form, as printed by [`fmt::Display`].
    pub fn from_hex(text: &str) -> G2Result<Self> {
        let bytes = hex::decode(text.trim())
            .map_err(|e| G2Error::invalid_argument(format!("invalid fingerprint hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(self) -> [u8; FINGERPRINT_SIZE] {
        self.0.to_le_bytes()
    }

    /// Device timestamp in half-second ticks.
    pub fn timestamp(self) -> u32 {
        self.0
    }

    /// True for the "download everything" cursor.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check if a dive with this fingerprint was recorded after `other`.
    pub fn is_newer_than(self, other: Fingerprint) -> bool {
        self.0 > other.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.to_bytes()))
    }
}

/// Stops a dive scan at the first dive that is not newer than a known one.
///
/// The G2 already limits the dump to newer dives when given a fingerprint;
/// this covers dumps taken without one (offline files, full resyncs).
#[derive(Debug, Clone, Copy)]
pub struct IncrementalSync {
    last_known: Fingerprint,
    newest: Option<Fingerprint>,
}

impl IncrementalSync {
    pub fn new(last_known: Fingerprint) -> Self {
        Self {
            last_known,
            newest: None,
        }
    }

    /// Decide whether `dive` should be imported.
    ///
    /// Returns `false` once the scan reaches already-imported dives. The
    /// first accepted dive is remembered as the new cursor.
    pub fn accept(&mut self, dive: &DiveRecord<'_>) -> bool {
        let fingerprint = dive.fingerprint();
        if !self.last_known.is_empty() && !fingerprint.is_newer_than(self.last_known) {
            return false;
        }

        if self.newest.is_none() {
            self.newest = Some(fingerprint);
        }

        true
    }

    /// Fingerprint to store after the download, if any dive was new.
    pub fn newest(&self) -> Option<Fingerprint> {
        self.newest
    }
}

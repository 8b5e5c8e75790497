use std::fs;
use std::path::{Path, PathBuf};

use crate::g2::config::{DeviceFamily, FINGERPRINT_SIZE};
use crate::g2::fingerprint::Fingerprint;

/// Per-device store of the newest downloaded dive.
///
/// One raw file per device, `<dir>/<family>-<SERIAL>.bin`, holding the four
/// fingerprint bytes exactly as the device reports them.
#[derive(Debug, Clone)]
pub struct FingerprintCache {
    cache_dir: PathBuf,
    family: DeviceFamily,
}

impl FingerprintCache {
    pub fn new(cache_dir: &Path, family: DeviceFamily) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            family,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// File holding the fingerprint of the device with `serial`.
    pub fn path_for(&self, serial: u32) -> PathBuf {
        self.cache_dir
            .join(format!("{}-{:08X}.bin", self.family.name(), serial))
    }

    /// Load the stored fingerprint for a device
    pub fn load(&self, serial: u32) -> Result<Option<Fingerprint>, String> {
        let path = self.path_for(serial);
        if !path.exists() {
            return Ok(None);
        }

        let contents =
            fs::read(&path).map_err(|e| format!("Failed to read fingerprint file: {}", e))?;

        if contents.len() != FINGERPRINT_SIZE {
            return Err(format!(
                "Fingerprint file {} has {} bytes, expected {}",
                path.display(),
                contents.len(),
                FINGERPRINT_SIZE
            ));
        }

        Fingerprint::from_bytes(&contents)
            .map(Some)
            .map_err(|e| format!("Failed to parse fingerprint file: {}", e))
    }

    /// Save the fingerprint for a device, replacing any previous one
    pub fn save(&self, serial: u32, fingerprint: &Fingerprint) -> Result<(), String> {
        // Ensure the cache directory exists
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| format!("Failed to create cache directory: {}", e))?;

        fs::write(self.path_for(serial), fingerprint.to_bytes())
            .map_err(|e| format!("Failed to write fingerprint file: {}", e))?;

        tracing::debug!("Stored fingerprint {} for serial {:08X}", fingerprint, serial);
        Ok(())
    }

    /// Forget the fingerprint for a device, so its next download is a full
    /// one. Returns whether an entry existed.
    pub fn remove(&self, serial: u32) -> Result<bool, String> {
        let path = self.path_for(serial);
        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path)
            .map_err(|e| format!("Failed to remove fingerprint file: {}", e))?;
        tracing::debug!("Removed fingerprint file {}", path.display());
        Ok(true)
    }
}

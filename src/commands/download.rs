//! Incremental dive download.

use tracing::{info, warn};

use super::{describe, DiveSummary};
use crate::cache::FingerprintCache;
use crate::g2::fingerprint::Fingerprint;
use crate::traits::DiveComputer;

/// Download every dive newer than the cursor, newest first.
///
/// An explicit `fingerprint` sets the cursor before the download and takes
/// precedence over any cached one. On success the newest dive's fingerprint
/// is stored in `cache` either way, so the next run only fetches what was
/// added since.
pub fn download_dives(
    device: &mut dyn DiveComputer,
    fingerprint: Option<Fingerprint>,
    cache: Option<&FingerprintCache>,
) -> Result<Vec<DiveSummary>, String> {
    if let Some(fingerprint) = fingerprint {
        device
            .set_fingerprint(&fingerprint.to_bytes())
            .map_err(|e| describe(&e))?;
    }

    let mut summaries = Vec::new();
    let mut newest = None;
    device
        .foreach(&mut |dive| {
            if newest.is_none() {
                newest = Some(dive.fingerprint());
            }
            let number = summaries.len() + 1;
            summaries.push(DiveSummary::new(number, &dive));
            true
        })
        .map_err(|e| describe(&e))?;

    if let Some(clock) = device.clock() {
        summaries = summaries
            .into_iter()
            .map(|summary| summary.with_clock(&clock))
            .collect();
    }

    info!("Downloaded {} dives", summaries.len());

    if let (Some(cache), Some(newest), Some(info)) = (cache, newest, device.devinfo()) {
        if let Err(e) = cache.save(info.serial, &newest) {
            warn!("Failed to store fingerprint: {}", e);
        }
    }

    Ok(summaries)
}

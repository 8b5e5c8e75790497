//! Offline extraction of a dump file.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use super::dump::{sha256_hex, DumpMetadata};
use super::{describe, DiveSummary};
use crate::g2::extract::extract_dives;
use crate::g2::fingerprint::{Fingerprint, IncrementalSync};

/// List the dives in a dump previously written by `dump`.
///
/// With `metadata`, dive start times are computed from the recorded clock
/// pair. With `since`, the scan stops at the first dive that is not newer.
pub fn extract_file(
    dump: &Path,
    metadata: Option<&Path>,
    since: Option<Fingerprint>,
) -> Result<Vec<DiveSummary>, String> {
    let data = fs::read(dump).map_err(|e| format!("Failed to read dump: {}", e))?;

    let metadata = metadata.map(DumpMetadata::load).transpose()?;
    if let Some(metadata) = &metadata {
        if metadata.length != data.len() || metadata.sha256 != sha256_hex(&data) {
            warn!(
                "Dump {} does not match its metadata (sha256 {})",
                dump.display(),
                metadata.sha256
            );
        }
    }
    let clock = metadata.as_ref().map(DumpMetadata::clock);

    let mut sync = IncrementalSync::new(since.unwrap_or_default());
    let mut summaries = Vec::new();
    extract_dives(&data, |dive| {
        if !sync.accept(&dive) {
            return false;
        }

        let number = summaries.len() + 1;
        let summary = DiveSummary::new(number, &dive);
        summaries.push(match &clock {
            Some(clock) => summary.with_clock(clock),
            None => summary,
        });
        true
    })
    .map_err(|e| describe(&e))?;

    info!("Found {} dives in {}", summaries.len(), dump.display());
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::dump::dump_device;
    use crate::g2::device::G2Device;
    use crate::g2::event::NullSink;
    use crate::test_helpers::fake_device::FakeG2;
    use crate::test_helpers::fixtures::DumpBuilder;
    use crate::test_helpers::temp::TestContext;

    #[test]
    fn test_extract_without_metadata() {
        let ctx = TestContext::new();
        let dump = DumpBuilder::new().dive(1, &[0; 5]).dive(2, &[0; 6]).build();
        let path = ctx.create_file_bytes("g2.bin", &dump);

        let dives = extract_file(&path, None, None).unwrap();

        assert_eq!(dives.len(), 2);
        assert_eq!(dives[0].fingerprint, "02000000");
        assert_eq!(dives[0].offset, 17);
        assert_eq!(dives[1].number, 2);
        assert!(dives.iter().all(|d| d.datetime.is_none()));
    }

    #[test]
    fn test_extract_matches_download() {
        let ctx = TestContext::new();
        let fake = FakeG2::new().dive(999_000, &[7; 12]).dive(999_990, &[8; 3]);
        let mut device = G2Device::new(fake, NullSink);

        let output = ctx.path("g2.bin");
        let metadata = dump_device(&mut device, &output).unwrap();

        let dives = extract_file(&output, Some(&ctx.path("g2.bin.json")), None).unwrap();
        assert_eq!(dives.len(), 2);

        // 10 ticks before the device clock was read.
        let expected = (metadata.systime - chrono::Duration::seconds(5)).to_rfc3339();
        assert_eq!(dives[0].datetime.as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn test_extract_since_fingerprint() {
        let ctx = TestContext::new();
        let dump = DumpBuilder::new()
            .dive(10, &[])
            .dive(20, &[])
            .dive(30, &[])
            .build();
        let path = ctx.create_file_bytes("g2.bin", &dump);

        let dives = extract_file(&path, None, Some(Fingerprint(10))).unwrap();
        let stamps: Vec<&str> = dives.iter().map(|d| d.fingerprint.as_str()).collect();
        assert_eq!(stamps, vec!["1E000000", "14000000"]);
    }

    #[test]
    fn test_extract_corrupt_dump() {
        let ctx = TestContext::new();
        let mut dump = DumpBuilder::new().dive(1, &[0; 4]).build();
        dump[4..8].copy_from_slice(&1000u32.to_le_bytes());
        let path = ctx.create_file_bytes("bad.bin", &dump);

        let err = extract_file(&path, None, None).unwrap_err();
        assert!(err.starts_with("[G2-030]"));
    }

    #[test]
    fn test_extract_missing_file() {
        let ctx = TestContext::new();
        let err = extract_file(&ctx.path("nope.bin"), None, None).unwrap_err();
        assert!(err.starts_with("Failed to read dump"));
    }
}

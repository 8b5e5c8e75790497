//! Dive record extraction from a G2 memory dump.
//!
//! The dump has no index. Each dive starts with a four-byte marker followed
//! by its total length and its fingerprint, so record boundaries can only
//! be found by scanning for markers. The scan runs backwards from the end
//! of the dump: the newest dive is reported first and every record must end
//! at or before the start of the record reported before it.

use super::config::{
    DIVE_FINGERPRINT_OFFSET, DIVE_HEADER_SIZE, DIVE_LENGTH_OFFSET, DIVE_MARKER, FINGERPRINT_SIZE,
};
use super::error::{G2Error, G2Result};
use super::fingerprint::Fingerprint;

/// One dive inside a dump buffer.
///
/// Borrowed view; nothing is copied out of the dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiveRecord<'a> {
    offset: usize,
    data: &'a [u8],
    fingerprint: &'a [u8],
}

impl<'a> DiveRecord<'a> {
    /// Start of the record (its marker) within the dump.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The full record, marker included.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Exclusive end offset within the dump.
    pub fn end(&self) -> usize {
        self.offset + self.data.len()
    }

    /// Raw fingerprint bytes.
    pub fn fingerprint_bytes(&self) -> &'a [u8] {
        self.fingerprint
    }

    /// Fingerprint as a device timestamp.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut raw = [0u8; FINGERPRINT_SIZE];
        raw.copy_from_slice(self.fingerprint);
        Fingerprint(u32::from_le_bytes(raw))
    }
}

/// Iterator over the dives of a dump, newest first.
///
/// Yields an error at most once; nothing follows it.
#[derive(Debug, Clone)]
pub struct DiveIter<'a> {
    data: &'a [u8],
    previous: usize,
    current: usize,
    done: bool,
}

impl<'a> DiveIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        let size = data.len();
        Self {
            data,
            previous: size,
            current: if size >= DIVE_MARKER.len() {
                size - DIVE_MARKER.len()
            } else {
                0
            },
            done: false,
        }
    }

    fn fail(
        &mut self,
        offset: usize,
        length: usize,
        limit: usize,
    ) -> Option<G2Result<DiveRecord<'a>>> {
        self.done = true;
        tracing::error!(
            "Dive at offset {} with length {} overruns limit {}",
            offset,
            length,
            limit
        );
        Some(Err(G2Error::DataFormat {
            offset,
            length,
            limit,
        }))
    }
}

impl<'a> Iterator for DiveIter<'a> {
    type Item = G2Result<DiveRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while self.current > 0 {
            self.current -= 1;
            let current = self.current;

            if !self.data[current..].starts_with(&DIVE_MARKER) {
                continue;
            }

            // Length and fingerprint must be readable at all.
            if current + DIVE_HEADER_SIZE > self.data.len() {
                return self.fail(current, DIVE_HEADER_SIZE, self.data.len());
            }

            let mut raw = [0u8; 4];
            raw.copy_from_slice(
                &self.data[current + DIVE_LENGTH_OFFSET..current + DIVE_FINGERPRINT_OFFSET],
            );
            let len = u32::from_le_bytes(raw) as usize;

            // Check for a buffer overflow.
            match current.checked_add(len) {
                Some(end) if end <= self.previous => {}
                _ => return self.fail(current, len, self.previous),
            }

            let record = DiveRecord {
                offset: current,
                data: &self.data[current..current + len],
                fingerprint: &self.data
                    [current + DIVE_FINGERPRINT_OFFSET..current + DIVE_HEADER_SIZE],
            };

            // Prepare for the next dive.
            self.previous = current;
            self.current = current.saturating_sub(DIVE_MARKER.len());

            return Some(Ok(record));
        }

        self.done = true;
        None
    }
}

/// Iterate over the dives in `data`, newest first.
pub fn dives(data: &[u8]) -> DiveIter<'_> {
    DiveIter::new(data)
}

/// Invoke `callback` for every dive in `data`, newest first.
///
/// The callback returns `false` to stop early; that is not an error.
/// The buffer is only read, so the same dump can be scanned repeatedly.
pub fn extract_dives<'a, F>(data: &'a [u8], mut callback: F) -> G2Result<()>
where
    F: FnMut(DiveRecord<'a>) -> bool,
{
    for dive in dives(data) {
        if !callback(dive?) {
            return Ok(());
        }
    }

    Ok(())
}

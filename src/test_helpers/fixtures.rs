use crate::g2::config::{DIVE_HEADER_SIZE, DIVE_MARKER};

/// Builder for G2 memory dumps.
///
/// Dives are laid out in the order they are added, oldest first, the way
/// the device returns them.
pub struct DumpBuilder {
    data: Vec<u8>,
}

impl DumpBuilder {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Append a well-formed dive with the given timestamp and payload.
    pub fn dive(mut self, timestamp: u32, payload: &[u8]) -> Self {
        self.data.extend_from_slice(&dive_record(timestamp, payload));
        self
    }

    /// Append arbitrary bytes.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

impl Default for DumpBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a single dive record: marker, total length, timestamp, payload.
pub fn dive_record(timestamp: u32, payload: &[u8]) -> Vec<u8> {
    let len = (DIVE_HEADER_SIZE + payload.len()) as u32;

    let mut record = Vec::with_capacity(len as usize);
    record.extend_from_slice(&DIVE_MARKER);
    record.extend_from_slice(&len.to_le_bytes());
    record.extend_from_slice(&timestamp.to_le_bytes());
    record.extend_from_slice(payload);
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dive_record_layout() {
        let record = dive_record(0x0A0B0C0D, &[0xEE, 0xFF]);
        assert_eq!(
            record,
            vec![
                0xA5, 0xA5, 0x5A, 0x5A, 0x0E, 0x00, 0x00, 0x00, 0x0D, 0x0C, 0x0B, 0x0A, 0xEE, 0xFF
            ]
        );
    }

    #[test]
    fn test_builder_concatenates() {
        let dump = DumpBuilder::new().raw(&[1]).dive(2, &[]).build();
        assert_eq!(dump.len(), 1 + DIVE_HEADER_SIZE);
        assert_eq!(dump[0], 1);
    }
}

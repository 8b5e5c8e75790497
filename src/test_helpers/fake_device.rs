use std::collections::VecDeque;

use crate::g2::config::{G2Opcode, PACKET_SIZE};
use crate::g2::error::{G2Error, G2Result};
use crate::g2::transport::HidTransport;

use super::fixtures::dive_record;

/// Scripted stand-in for a G2 on the other end of the HID link.
///
/// Answers the probe and download commands from an in-memory dive log and
/// records every command it receives. Fault knobs let tests break the
/// exchange at specific points.
pub struct FakeG2 {
    pub model: u8,
    pub serial: u32,
    pub devtime: u32,
    dives: Vec<(u32, Vec<u8>)>,
    /// Commands received, without the length prefix.
    pub commands: Vec<Vec<u8>>,
    /// Replace the bulk handshake answer.
    pub total_override: Option<u32>,
    /// Replace the length answer.
    pub length_override: Option<u32>,
    /// Payload bytes per report (1..=63).
    pub chunk: usize,
    /// Insert an empty report before every data report.
    pub empty_reports: bool,
    /// Return a short report once this many reports have been read.
    pub short_read_after: Option<usize>,
    /// Fail the write of the command with this opcode.
    pub fail_write_on: Option<u8>,
    outgoing: VecDeque<Vec<u8>>,
    reports_read: usize,
}

impl FakeG2 {
    pub fn new() -> Self {
        Self {
            model: 0x32,
            serial: 12_345_678,
            devtime: 1_000_000,
            dives: Vec::new(),
            commands: Vec::new(),
            total_override: None,
            length_override: None,
            chunk: PACKET_SIZE - 1,
            empty_reports: false,
            short_read_after: None,
            fail_write_on: None,
            outgoing: VecDeque::new(),
            reports_read: 0,
        }
    }

    /// Add a dive to the device log, oldest first.
    pub fn dive(mut self, timestamp: u32, payload: &[u8]) -> Self {
        self.dives.push((timestamp, payload.to_vec()));
        self
    }

    /// The bytes the device returns for a given fingerprint cursor.
    pub fn memory_after(&self, timestamp: u32) -> Vec<u8> {
        self.dives
            .iter()
            .filter(|(ts, _)| *ts > timestamp)
            .flat_map(|(ts, payload)| dive_record(*ts, payload))
            .collect()
    }

    /// Opcodes received so far, in order.
    pub fn opcodes(&self) -> Vec<u8> {
        self.commands.iter().filter_map(|c| c.first().copied()).collect()
    }

    fn cursor(command: &[u8]) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&command[1..5]);
        u32::from_le_bytes(raw)
    }

    /// Queue `message` as one or more reports of at most `chunk` bytes.
    fn queue(&mut self, message: &[u8]) {
        for report in message.chunks(self.chunk.max(1)) {
            self.outgoing.push_back(report.to_vec());
        }
    }

    fn answer(&mut self, command: &[u8]) {
        let opcode = command.first().copied().unwrap_or_default();
        if opcode == G2Opcode::Model as u8 {
            self.queue(&[self.model]);
        } else if opcode == G2Opcode::Serial as u8 {
            self.queue(&self.serial.to_le_bytes());
        } else if opcode == G2Opcode::DeviceTime as u8 {
            self.queue(&self.devtime.to_le_bytes());
        } else if opcode == G2Opcode::DataLength as u8 {
            let length = self
                .length_override
                .unwrap_or(self.memory_after(Self::cursor(command)).len() as u32);
            self.queue(&length.to_le_bytes());
        } else if opcode == G2Opcode::Data as u8 {
            let memory = self.memory_after(Self::cursor(command));
            let total = self.total_override.unwrap_or(memory.len() as u32 + 4);
            self.queue(&total.to_le_bytes());
            self.queue(&memory);
        }
    }
}

impl Default for FakeG2 {
    fn default() -> Self {
        Self::new()
    }
}

impl HidTransport for FakeG2 {
    fn read(&mut self, buffer: &mut [u8]) -> G2Result<usize> {
        if self.outgoing.is_empty() {
            return Err(G2Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "device has nothing to send",
            )));
        }

        if self.short_read_after == Some(self.reports_read) {
            return Ok(PACKET_SIZE / 2);
        }
        self.reports_read += 1;

        buffer[..PACKET_SIZE].fill(0);
        if self.empty_reports && self.reports_read % 2 == 1 {
            return Ok(PACKET_SIZE);
        }

        if let Some(report) = self.outgoing.pop_front() {
            buffer[0] = report.len() as u8;
            buffer[1..1 + report.len()].copy_from_slice(&report);
        }

        Ok(PACKET_SIZE)
    }

    fn write(&mut self, data: &[u8]) -> G2Result<usize> {
        let len = data[0] as usize;
        let command = data[1..1 + len].to_vec();

        if command.first().copied() == self.fail_write_on {
            return Err(G2Error::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device unplugged",
            )));
        }

        self.answer(&command);
        self.commands.push(command);
        Ok(data.len())
    }
}

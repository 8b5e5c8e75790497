//! Length-prefixed packet framing for the G2 HID protocol.
//!
//! Every report is `PACKET_SIZE` bytes. The first byte holds the number of
//! meaningful payload bytes that follow; the rest of the report is padding.
//! Commands always fit in a single report, answers may span several.

use tracing::{error, trace, warn};

use super::config::{MAX_COMMAND_SIZE, PACKET_SIZE};
use super::error::{G2Error, G2Result};
use super::transport::HidTransport;

/// Build the outgoing report for `command`.
///
/// Structure: `[len] + command`. Padding up to the report size is left to
/// the transport.
pub fn build_command_packet(command: &[u8]) -> G2Result<Vec<u8>> {
    if command.len() > MAX_COMMAND_SIZE {
        error!("Command too big ({} bytes)", command.len());
        return Err(G2Error::invalid_argument(format!(
            "command of {} bytes exceeds the {} byte limit",
            command.len(),
            MAX_COMMAND_SIZE
        )));
    }

    let mut packet = Vec::with_capacity(command.len() + 1);
    packet.push(command.len() as u8);
    packet.extend_from_slice(command);

    Ok(packet)
}

/// Send one framed command.
pub fn send<T: HidTransport + ?Sized>(transport: &mut T, command: &[u8]) -> G2Result<()> {
    let packet = build_command_packet(command)?;
    trace!("snd {}", hex::encode(command));

    let written = transport.write(&packet).map_err(|e| {
        error!("Failed to send the command: {}", e);
        e
    })?;

    if written != packet.len() {
        error!(
            "Incomplete write interrupt transfer (got {}, expected {})",
            written,
            packet.len()
        );
        return Err(G2Error::IncompleteTransfer {
            expected: packet.len(),
            actual: written,
        });
    }

    Ok(())
}

/// Fill `answer` from consecutive reports.
///
/// Reads until every byte of `answer` has been written. A report declaring
/// more payload than still fits is truncated to the remaining space; empty
/// reports are skipped.
pub fn receive<T: HidTransport + ?Sized>(transport: &mut T, answer: &mut [u8]) -> G2Result<()> {
    let mut filled = 0;

    while filled < answer.len() {
        let mut packet = [0u8; PACKET_SIZE];

        let transferred = transport.read(&mut packet).map_err(|e| {
            error!("Read interrupt transfer failed: {}", e);
            e
        })?;

        if transferred != PACKET_SIZE {
            error!(
                "Incomplete read interrupt transfer (got {}, expected {})",
                transferred, PACKET_SIZE
            );
            return Err(G2Error::IncompleteTransfer {
                expected: PACKET_SIZE,
                actual: transferred,
            });
        }

        let mut len = packet[0] as usize;
        if len >= PACKET_SIZE {
            error!(
                "Read interrupt transfer returns impossible packet size ({})",
                len
            );
            return Err(G2Error::protocol(format!(
                "impossible packet size {}",
                len
            )));
        }

        trace!("rcv {}", hex::encode(&packet[1..1 + len]));

        let remaining = answer.len() - filled;
        if len > remaining {
            warn!(
                "Receive buffer too small, truncating {} bytes to {}",
                len, remaining
            );
            len = remaining;
        }

        answer[filled..filled + len].copy_from_slice(&packet[1..1 + len]);
        filled += len;
    }

    Ok(())
}

/// Send `command` and fill `answer` with the response.
pub fn transfer<T: HidTransport + ?Sized>(
    transport: &mut T,
    command: &[u8],
    answer: &mut [u8],
) -> G2Result<()> {
    send(transport, command)?;

    receive(transport, answer).map_err(|e| {
        error!("Failed to receive the answer.");
        e
    })
}

//! Download session for a single G2.
//!
//! A session owns the HID transport and the event sink. Each dump runs the
//! fixed command sequence: model, serial and clock probes, length
//! negotiation against the fingerprint cursor, then one bulk transfer.

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use super::clock::ClockCalibration;
use super::config::{
    data_command, progress_maximum, DeviceFamily, G2Opcode, LENGTH_ANSWER_BYTES, PROBE_BYTES,
};
use super::error::{G2Error, G2Result};
use super::event::{ClockEvent, DeviceInfo, EventSink, NullSink, Progress};
use super::extract::{extract_dives, DiveRecord};
use super::fingerprint::Fingerprint;
use super::packet;
use super::transport::HidTransport;
use crate::cache::FingerprintCache;

/// An open connection to a G2 dive computer.
pub struct G2Device<T, E = NullSink> {
    transport: T,
    events: E,
    fingerprint: Fingerprint,
    /// Set once the caller picks the cursor; the cache is then not consulted.
    explicit_fingerprint: bool,
    devtime: u32,
    systime: Option<DateTime<Utc>>,
    info: Option<DeviceInfo>,
    cache: Option<FingerprintCache>,
}

#[cfg(feature = "hidapi")]
impl<E: EventSink> G2Device<super::transport::HidApiTransport, E> {
    /// Open the first attached G2 over the native HID backend.
    pub fn open(events: E) -> G2Result<Self> {
        let transport =
            super::transport::HidApiTransport::open(super::config::is_compatible_device)?;
        Ok(Self::new(transport, events))
    }
}

impl<T: HidTransport, E: EventSink> G2Device<T, E> {
    /// Start a session on an already opened transport.
    pub fn new(transport: T, events: E) -> Self {
        Self {
            transport,
            events,
            fingerprint: Fingerprint::default(),
            explicit_fingerprint: false,
            devtime: 0,
            systime: None,
            info: None,
            cache: None,
        }
    }

    /// Look up the fingerprint cursor in `cache` once the serial is known.
    ///
    /// A stored fingerprint replaces the cursor; a device without one gets
    /// a full download. Skipped when `set_fingerprint` picked the cursor.
    pub fn with_fingerprint_cache(mut self, cache: FingerprintCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn family(&self) -> DeviceFamily {
        DeviceFamily::ScubaproG2
    }

    /// Set the cursor for the next dump.
    ///
    /// Empty input resets it; exactly four bytes are taken as a
    /// little-endian timestamp. Any other size leaves the cursor untouched.
    /// An accepted cursor takes precedence over the fingerprint cache.
    pub fn set_fingerprint(&mut self, data: &[u8]) -> G2Result<()> {
        self.fingerprint = Fingerprint::from_bytes(data)?;
        self.explicit_fingerprint = true;
        Ok(())
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Model code read during the last dump.
    pub fn model(&self) -> Option<u32> {
        self.info.map(|info| info.model)
    }

    /// Serial number read during the last dump.
    pub fn serial(&self) -> Option<u32> {
        self.info.map(|info| info.serial)
    }

    pub fn devinfo(&self) -> Option<DeviceInfo> {
        self.info
    }

    /// Clock pair captured during the last dump.
    pub fn clock(&self) -> Option<ClockCalibration> {
        self.systime
            .map(|systime| ClockCalibration::new(self.devtime, systime))
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    /// Read every dive newer than the cursor into `buffer`.
    ///
    /// The buffer is cleared first and ends up holding exactly the bytes
    /// the device sent. Any failure aborts the dump.
    pub fn dump(&mut self, buffer: &mut Vec<u8>) -> G2Result<()> {
        buffer.clear();

        // Enable progress notifications.
        let mut progress = Progress::default();
        self.events.progress(progress);

        let [model] = self.request::<1>(&[G2Opcode::Model as u8]).map_err(|e| {
            error!("Failed to read the model number.");
            e
        })?;

        let serial = self
            .request::<4>(&[G2Opcode::Serial as u8])
            .map_err(|e| {
                error!("Failed to read the serial number.");
                e
            })
            .map(u32::from_le_bytes)?;

        let devtime = self
            .request::<4>(&[G2Opcode::DeviceTime as u8])
            .map_err(|e| {
                error!("Failed to read the device time.");
                e
            })
            .map(u32::from_le_bytes)?;
        let systime = Utc::now();
        self.devtime = devtime;
        self.systime = Some(systime);

        progress.current += PROBE_BYTES;
        self.events.progress(progress);

        self.events.clock(ClockEvent { systime, devtime });

        let info = DeviceInfo {
            model: model as u32,
            firmware: 0,
            serial,
        };
        self.info = Some(info);
        self.events.devinfo(info);

        self.apply_cached_fingerprint(serial);

        let length = self
            .request::<4>(&data_command(
                G2Opcode::DataLength,
                self.fingerprint.timestamp(),
            ))
            .map_err(|e| {
                error!("Failed to receive the answer.");
                e
            })
            .map(u32::from_le_bytes)?;

        progress.current += LENGTH_ANSWER_BYTES;
        progress.maximum = progress_maximum(length);
        self.events.progress(progress);

        if length == 0 {
            debug!("No dives newer than fingerprint {}", self.fingerprint);
            return Ok(());
        }

        let size = length as usize;
        buffer.try_reserve_exact(size).map_err(|_| {
            error!("Insufficient buffer space available.");
            G2Error::OutOfMemory { requested: size }
        })?;
        buffer.resize(size, 0);

        let total = self
            .request::<4>(&data_command(G2Opcode::Data, self.fingerprint.timestamp()))
            .map_err(|e| {
                error!("Failed to receive the answer.");
                e
            })
            .map(u32::from_le_bytes)?;

        progress.current += LENGTH_ANSWER_BYTES;
        self.events.progress(progress);

        let expected = length as u64 + 4;
        if total as u64 != expected {
            error!("Received an unexpected size.");
            return Err(G2Error::SizeMismatch {
                expected,
                actual: total,
            });
        }

        debug!("Downloading {} bytes", length);
        packet::receive(&mut self.transport, buffer).map_err(|e| {
            error!("Failed to receive the answer.");
            e
        })?;

        progress.current = progress.current.saturating_add(length);
        self.events.progress(progress);

        Ok(())
    }

    /// Dump the device and hand each dive to `callback`, newest first.
    ///
    /// Returning `false` from the callback stops early without error.
    pub fn foreach<F>(&mut self, callback: F) -> G2Result<()>
    where
        F: for<'a> FnMut(DiveRecord<'a>) -> bool,
    {
        let mut buffer = Vec::new();
        self.dump(&mut buffer)?;

        extract_dives(&buffer, callback)
    }

    /// End the session and release the transport.
    pub fn close(self) -> G2Result<()> {
        debug!("Closing G2 session");
        drop(self);
        Ok(())
    }

    /// Take the transport and sink back out of the session.
    pub fn into_parts(self) -> (T, E) {
        (self.transport, self.events)
    }

    fn request<const N: usize>(&mut self, command: &[u8]) -> G2Result<[u8; N]> {
        let mut answer = [0u8; N];
        packet::transfer(&mut self.transport, command, &mut answer)?;
        Ok(answer)
    }

    fn apply_cached_fingerprint(&mut self, serial: u32) {
        let Some(cache) = &self.cache else {
            return;
        };
        if self.explicit_fingerprint {
            debug!("Keeping fingerprint {} set by the caller", self.fingerprint);
            return;
        }

        match cache.load(serial) {
            Ok(Some(fingerprint)) => {
                debug!("Using cached fingerprint {} for {:08X}", fingerprint, serial);
                self.fingerprint = fingerprint;
            }
            Ok(None) => {
                debug!("No cached fingerprint for {:08X}", serial);
                self.fingerprint = Fingerprint::default();
            }
            Err(e) => warn!("Ignoring fingerprint cache: {}", e),
        }
    }
}

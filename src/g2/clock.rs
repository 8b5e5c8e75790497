//! Device clock calibration.
//!
//! The G2 counts time in half-second ticks from an arbitrary epoch. Reading
//! the device clock and the host clock at the same moment gives an anchor
//! that turns any dive timestamp into wall-clock time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::event::ClockEvent;
use super::fingerprint::Fingerprint;

/// Device ticks per second.
pub const TICKS_PER_SECOND: i64 = 2;

/// Host/device clock pair captured during a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockCalibration {
    pub devtime: u32,
    pub systime: DateTime<Utc>,
}

impl ClockCalibration {
    pub fn new(devtime: u32, systime: DateTime<Utc>) -> Self {
        Self { devtime, systime }
    }

    /// Wall-clock time of a device timestamp.
    ///
    /// Timestamps later than the calibration point map into the future
    /// rather than wrapping.
    pub fn datetime(&self, timestamp: u32) -> DateTime<Utc> {
        let ticks = self.devtime as i64 - timestamp as i64;
        self.systime - Duration::milliseconds(ticks * 1000 / TICKS_PER_SECOND)
    }

    /// Wall-clock time of a dive fingerprint.
    pub fn dive_datetime(&self, fingerprint: Fingerprint) -> DateTime<Utc> {
        self.datetime(fingerprint.timestamp())
    }
}

impl From<ClockEvent> for ClockCalibration {
    fn from(event: ClockEvent) -> Self {
        Self::new(event.devtime, event.systime)
    }
}

//! Device event notifications emitted during a dump.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transfer progress in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u32,
    pub maximum: u32,
}

/// Identity reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub model: u32,
    pub firmware: u32,
    pub serial: u32,
}

/// Host/device clock pair captured at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockEvent {
    pub systime: DateTime<Utc>,
    pub devtime: u32,
}

/// Every notification a dump can emit, for sinks that want a single stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum DeviceEvent {
    Progress(Progress),
    Clock(ClockEvent),
    DevInfo(DeviceInfo),
}

impl DeviceEvent {
    /// Get a percentage for progress events, `None` for the rest.
    pub fn percent(&self) -> Option<f32> {
        match self {
            DeviceEvent::Progress(progress) => {
                if progress.maximum == 0 {
                    Some(0.0)
                } else {
                    Some(progress.current as f32 / progress.maximum as f32 * 100.0)
                }
            }
            _ => None,
        }
    }

    /// Get a human-readable message for this event.
    pub fn message(&self) -> String {
        match self {
            DeviceEvent::Progress(progress) => match self.percent() {
                Some(percent) if progress.maximum > 0 => {
                    format!("Downloading... {:.0}%", percent)
                }
                _ => "Connecting to device...".into(),
            },
            DeviceEvent::Clock(clock) => format!(
                "Device clock: devtime={} systime={}",
                clock.devtime,
                clock.systime.to_rfc3339()
            ),
            DeviceEvent::DevInfo(info) => format!(
                "Device: model={} firmware={} serial={:08X}",
                info.model, info.firmware, info.serial
            ),
        }
    }
}

/// Receiver for dump notifications.
///
/// All methods default to doing nothing. Sinks only observe: nothing they
/// do changes how a dump proceeds.
pub trait EventSink {
    fn progress(&mut self, _progress: Progress) {}

    fn clock(&mut self, _clock: ClockEvent) {}

    fn devinfo(&mut self, _info: DeviceInfo) {}
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {}

impl<F> EventSink for F
where
    F: FnMut(DeviceEvent),
{
    fn progress(&mut self, progress: Progress) {
        self(DeviceEvent::Progress(progress))
    }

    fn clock(&mut self, clock: ClockEvent) {
        self(DeviceEvent::Clock(clock))
    }

    fn devinfo(&mut self, info: DeviceInfo) {
        self(DeviceEvent::DevInfo(info))
    }
}

/// Sink that records every event, used by tests and the command-line tool.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<DeviceEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All progress notifications in emission order.
    pub fn progress_events(&self) -> Vec<Progress> {
        self.events
            .iter()
            .filter_map(|event| match event {
                DeviceEvent::Progress(progress) => Some(*progress),
                _ => None,
            })
            .collect()
    }

    /// The last device identity seen, if any.
    pub fn last_devinfo(&self) -> Option<DeviceInfo> {
        self.events.iter().rev().find_map(|event| match event {
            DeviceEvent::DevInfo(info) => Some(*info),
            _ => None,
        })
    }

    /// The last clock calibration seen, if any.
    pub fn last_clock(&self) -> Option<ClockEvent> {
        self.events.iter().rev().find_map(|event| match event {
            DeviceEvent::Clock(clock) => Some(*clock),
            _ => None,
        })
    }
}

impl EventSink for EventLog {
    fn progress(&mut self, progress: Progress) {
        self.events.push(DeviceEvent::Progress(progress));
    }

    fn clock(&mut self, clock: ClockEvent) {
        self.events.push(DeviceEvent::Clock(clock));
    }

    fn devinfo(&mut self, info: DeviceInfo) {
        self.events.push(DeviceEvent::DevInfo(info));
    }
}

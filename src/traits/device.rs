use crate::g2::clock::ClockCalibration;
use crate::g2::config::DeviceFamily;
use crate::g2::device::G2Device;
use crate::g2::error::G2Result;
use crate::g2::event::{DeviceInfo, EventSink};
use crate::g2::extract::DiveRecord;
use crate::g2::transport::HidTransport;

/// Operations every supported dive computer offers.
/// Lets the command-line tool drive a device without naming its family.
pub trait DiveComputer {
    fn family(&self) -> DeviceFamily;

    /// Set the cursor for the next download
    fn set_fingerprint(&mut self, data: &[u8]) -> G2Result<()>;

    /// Read the raw memory newer than the cursor
    fn dump(&mut self, buffer: &mut Vec<u8>) -> G2Result<()>;

    /// Download and hand each dive to `callback`, newest first
    fn foreach(&mut self, callback: &mut dyn FnMut(DiveRecord<'_>) -> bool) -> G2Result<()>;

    /// Identity seen during the last download
    fn devinfo(&self) -> Option<DeviceInfo>;

    /// Clock pair captured during the last download
    fn clock(&self) -> Option<ClockCalibration>;

    fn close(self: Box<Self>) -> G2Result<()>;
}

impl<T: HidTransport, E: EventSink> DiveComputer for G2Device<T, E> {
    fn family(&self) -> DeviceFamily {
        G2Device::family(self)
    }

    fn set_fingerprint(&mut self, data: &[u8]) -> G2Result<()> {
        G2Device::set_fingerprint(self, data)
    }

    fn dump(&mut self, buffer: &mut Vec<u8>) -> G2Result<()> {
        G2Device::dump(self, buffer)
    }

    fn foreach(&mut self, callback: &mut dyn FnMut(DiveRecord<'_>) -> bool) -> G2Result<()> {
        G2Device::foreach(self, |dive| callback(dive))
    }

    fn devinfo(&self) -> Option<DeviceInfo> {
        G2Device::devinfo(self)
    }

    fn clock(&self) -> Option<ClockCalibration> {
        G2Device::clock(self)
    }

    fn close(self: Box<Self>) -> G2Result<()> {
        G2Device::close(*self)
    }
}

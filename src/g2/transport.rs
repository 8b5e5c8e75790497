//! USB HID transport layer for G2 communication.
//!
//! Provides a trait-based abstraction over fixed-size report transfers,
//! enabling both real hardware and mock testing.

#[cfg(test)]
use mockall::automock;

use super::error::G2Result;

/// Trait for packet transport operations.
///
/// Every call moves one whole report. Implementations block until the
/// transfer completes or the underlying device reports a failure.
#[cfg_attr(test, automock)]
pub trait HidTransport: Send {
    /// Read one report into `buffer`.
    ///
    /// # Returns
    /// Number of bytes transferred
    fn read(&mut self, buffer: &mut [u8]) -> G2Result<usize>;

    /// Write one report; the backend pads it to the report size.
    ///
    /// # Returns
    /// Number of bytes of `data` transferred
    fn write(&mut self, data: &[u8]) -> G2Result<usize>;
}

impl<T: HidTransport + ?Sized> HidTransport for Box<T> {
    fn read(&mut self, buffer: &mut [u8]) -> G2Result<usize> {
        (**self).read(buffer)
    }

    fn write(&mut self, data: &[u8]) -> G2Result<usize> {
        (**self).write(data)
    }
}

#[cfg(feature = "hidapi")]
pub use self::native::HidApiTransport;

#[cfg(feature = "hidapi")]
mod native {
    use hidapi::{HidApi, HidDevice};
    use tracing::debug;

    use super::super::config::PACKET_SIZE;
    use super::super::error::{G2Error, G2Result};
    use super::HidTransport;

    /// HID transport backed by the platform HID library.
    pub struct HidApiTransport {
        device: HidDevice,
    }

    impl HidApiTransport {
        /// Open the first attached device whose VID/PID pass `matches`.
        pub fn open(matches: impl Fn(u16, u16) -> bool) -> G2Result<Self> {
            let api = HidApi::new()?;

            let info = api
                .device_list()
                .find(|info| matches(info.vendor_id(), info.product_id()))
                .ok_or(G2Error::NoDeviceFound)?;

            let device = info.open_device(&api)?;
            debug!(
                "Opened HID device {:04X}:{:04X}",
                info.vendor_id(),
                info.product_id()
            );

            Ok(Self { device })
        }
    }

    impl HidTransport for HidApiTransport {
        fn read(&mut self, buffer: &mut [u8]) -> G2Result<usize> {
            Ok(self.device.read(buffer)?)
        }

        fn write(&mut self, data: &[u8]) -> G2Result<usize> {
            // Report ID 0 prefix, then the report padded to its fixed size.
            let mut report = [0u8; PACKET_SIZE + 1];
            let len = data.len().min(PACKET_SIZE);
            report[1..1 + len].copy_from_slice(&data[..len]);

            let written = self.device.write(&report)?;
            Ok(written.saturating_sub(1).min(len))
        }
    }
}

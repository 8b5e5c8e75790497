//! Download driver for the Scubapro G2 dive computer family.
//!
//! The G2 speaks a small command/response protocol over fixed 64-byte HID
//! reports and hands back its whole dive log as one opaque memory dump.
//!
//! # Protocol Overview
//!
//! A download consists of:
//! 1. **Probe** - Read the model (0x10), serial (0x14) and clock (0x1A)
//! 2. **Length** - Ask how many bytes are newer than the fingerprint (0xC6)
//! 3. **Handshake** - Start the transfer and confirm its size (0xC4)
//! 4. **Bulk Read** - Receive the dump in as many reports as it takes
//! 5. **Extraction** - Scan the dump backwards for dive markers
//!
//! # Example
//!
//! ```ignore
//! use scubapro_g2::g2::{DeviceEvent, G2Device};
//!
//! let mut device = G2Device::open(|event: DeviceEvent| println!("{}", event.message()))?;
//! device.set_fingerprint(&last_fingerprint)?;
//! device.foreach(|dive| {
//!     println!("dive at {} ({} bytes)", dive.offset(), dive.len());
//!     true
//! })?;
//! device.close()?;
//! ```

pub mod clock;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod extract;
pub mod fingerprint;
pub mod packet;
pub mod transport;

// Session
pub use device::G2Device;

// Errors
pub use error::{ErrorKind, G2Error, G2Result};

// Events
pub use event::{ClockEvent, DeviceEvent, DeviceInfo, EventLog, EventSink, NullSink, Progress};

// Dump decoding
pub use clock::ClockCalibration;
pub use extract::{dives, extract_dives, DiveIter, DiveRecord};
pub use fingerprint::{Fingerprint, IncrementalSync};

// Transport
pub use transport::HidTransport;

#[cfg(feature = "hidapi")]
pub use transport::HidApiTransport;

//! Host-side Picture Transfer Protocol (ISO 15740) over USB, with
//! first-class Sony, Canon, and Nikon vendor extensions.
//!
//! The crate is layered the way the protocol is: little-endian primitive
//! codecs ([`read`]/[`write`]/[`value`]), declarative composite codecs
//! ([`codec`]), container framing ([`container`]), per-camera-class
//! definition registries with vendor overrides ([`registry`],
//! [`vendor`]), the request–data–response transaction engine
//! ([`engine`]), the interrupt event pump ([`event`]), and the typed
//! [`Camera`] façade on top. USB plumbing hides behind the
//! [`Transport`](transport::Transport) trait; [`usb`] ships the rusb
//! implementation.
//!
//! ```no_run
//! use ptpcam::usb::UsbTransport;
//! use ptpcam::Camera;
//!
//! let device = ptpcam::usb::enumerate().unwrap().into_iter().next().unwrap();
//! let transport = UsbTransport::open(&device).unwrap();
//! let mut camera = Camera::generic(transport);
//! camera.connect().unwrap();
//!
//! let info = camera.device_info().unwrap();
//! println!("{} {}", info.Manufacturer, info.Model);
//!
//! camera.on("ObjectAdded", |event| {
//!     println!("new object {:#010x}", event.params[0]);
//! }).unwrap();
//!
//! camera.disconnect().unwrap();
//! ```

#[macro_use]
extern crate log;

pub mod camera;
pub mod codec;
pub mod codes;
pub mod container;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod event;
pub mod read;
pub mod registry;
pub mod transport;
pub mod usb;
pub mod value;
pub mod vendor;
pub mod write;

pub use self::camera::{Camera, DataArg, ObjectTree, Outcome};
pub use self::codes::{
    EventCode, OperationCode, PropertyCode, ResponseCode, StandardEventCode,
    StandardOperationCode, StandardPropertyCode, StandardResponseCode,
};
pub use self::dataset::{DeviceInfo, FormData, ObjectInfo, PropDesc, StorageInfo};
pub use self::engine::{CallOptions, CancelToken, Completed, TransactionEngine};
pub use self::error::{Error, ProtocolError, TransportError, ValidationError};
pub use self::event::{CameraEvent, HandlerId};
pub use self::read::PtpRead;
pub use self::registry::{Registry, RegistryBuilder};
pub use self::transport::Transport;
pub use self::value::{Record, Value};
pub use self::vendor::{canon::CanonVendor, nikon::NikonVendor, sony::SonyVendor, Vendor};

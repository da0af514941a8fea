//! rusb-backed [`Transport`]. Finds the still-image interface, claims it,
//! and maps rusb error conditions onto the transport error model the
//! engine recovers from.

use crate::codes::{ClassRequestCode, USB_CLASS_IMAGE, USB_SUBCLASS_STILL_IMAGE};
use crate::error::TransportError;
use crate::transport::{ClassRequest, DeviceStatus, EndpointKind, Transport};
use crate::write::PtpWrite;
use rusb::{constants, UsbContext};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Control transfer direction/type/recipient bitmasks: class requests go
/// to the interface.
const REQUEST_TYPE_OUT: u8 = constants::LIBUSB_REQUEST_TYPE_CLASS | constants::LIBUSB_RECIPIENT_INTERFACE;
const REQUEST_TYPE_IN: u8 = constants::LIBUSB_ENDPOINT_IN
    | constants::LIBUSB_REQUEST_TYPE_CLASS
    | constants::LIBUSB_RECIPIENT_INTERFACE;

/// Phase 1 cancellation code carried in the Cancel_Request payload.
const CANCELLATION_CODE: u16 = 0x4001;

const STATUS_BUF_LEN: usize = 64;

pub struct UsbTransport<T: UsbContext> {
    handle: Arc<RwLock<rusb::DeviceHandle<T>>>,
    iface: u8,
    ep_in: u8,
    ep_out: u8,
    ep_int: Option<u8>,
    max_packet: usize,
}

impl<T: UsbContext> UsbTransport<T> {
    /// Claim the still-image interface of `device`. Fails with
    /// `Disconnected` when the device carries no such interface or the
    /// bulk pipes are missing; an absent interrupt endpoint is tolerated
    /// (some vendors poll instead).
    pub fn open(device: &rusb::Device<T>) -> Result<UsbTransport<T>, TransportError> {
        let config_desc = device.active_config_descriptor().map_err(map_usb)?;

        let interface_desc = config_desc
            .interfaces()
            .flat_map(|i| i.descriptors())
            .find(|x| {
                x.class_code() == USB_CLASS_IMAGE && x.sub_class_code() == USB_SUBCLASS_STILL_IMAGE
            })
            .ok_or(TransportError::Disconnected)?;

        debug!("claiming still-image interface {}", interface_desc.interface_number());

        let mut handle = device.open().map_err(map_usb)?;
        handle
            .claim_interface(interface_desc.interface_number())
            .map_err(map_usb)?;

        let find_endpoint = |direction, transfer_type| {
            interface_desc
                .endpoint_descriptors()
                .find(|ep| ep.direction() == direction && ep.transfer_type() == transfer_type)
        };

        let bulk_in = find_endpoint(rusb::Direction::In, rusb::TransferType::Bulk)
            .ok_or(TransportError::Disconnected)?;
        let max_packet = bulk_in.max_packet_size() as usize;
        let ep_in = bulk_in.address();
        let ep_out = find_endpoint(rusb::Direction::Out, rusb::TransferType::Bulk)
            .map(|ep| ep.address())
            .ok_or(TransportError::Disconnected)?;
        let ep_int = find_endpoint(rusb::Direction::In, rusb::TransferType::Interrupt)
            .map(|ep| ep.address());
        if ep_int.is_none() {
            warn!("no interrupt endpoint; interrupt events unavailable");
        }

        Ok(UsbTransport {
            handle: Arc::new(RwLock::new(handle)),
            iface: interface_desc.interface_number(),
            ep_in,
            ep_out,
            ep_int,
            max_packet,
        })
    }

    fn endpoint_address(&self, endpoint: EndpointKind) -> Result<u8, TransportError> {
        match endpoint {
            EndpointKind::BulkIn => Ok(self.ep_in),
            EndpointKind::BulkOut => Ok(self.ep_out),
            EndpointKind::Interrupt => self.ep_int.ok_or(TransportError::Disconnected),
        }
    }
}

impl<T: UsbContext> Transport for UsbTransport<T> {
    fn send(&self, bytes: &[u8], timeout: Duration) -> Result<(), TransportError> {
        let handle = self.handle.read().unwrap();
        let mut written = 0;
        while written < bytes.len() {
            written += handle
                .write_bulk(self.ep_out, &bytes[written..], timeout)
                .map_err(map_usb)?;
        }
        Ok(())
    }

    fn receive(&self, max_len: usize, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; max_len];
        let n = self
            .handle
            .read()
            .unwrap()
            .read_bulk(self.ep_in, &mut buf, timeout)
            .map_err(map_usb)?;
        buf.truncate(n);
        Ok(buf)
    }

    fn receive_interrupt(&self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let ep = self.endpoint_address(EndpointKind::Interrupt)?;
        let mut buf = vec![0u8; self.max_packet.max(64)];
        let n = self
            .handle
            .read()
            .unwrap()
            .read_interrupt(ep, &mut buf, timeout)
            .map_err(map_usb)?;
        buf.truncate(n);
        Ok(buf)
    }

    fn clear_halt(&self, endpoint: EndpointKind) -> Result<(), TransportError> {
        let ep = self.endpoint_address(endpoint)?;
        self.handle.write().unwrap().clear_halt(ep).map_err(map_usb)
    }

    fn class_request(
        &self,
        request: ClassRequest,
        timeout: Duration,
    ) -> Result<Option<DeviceStatus>, TransportError> {
        let handle = self.handle.read().unwrap();
        let index = u16::from(self.iface);
        match request {
            ClassRequest::CancelTransaction { transaction_id } => {
                let mut payload = vec![];
                payload.write_ptp_u16(CANCELLATION_CODE).ok();
                payload.write_ptp_u32(transaction_id).ok();
                handle
                    .write_control(
                        REQUEST_TYPE_OUT,
                        ClassRequestCode::CancelRequest,
                        0,
                        index,
                        &payload,
                        timeout,
                    )
                    .map_err(map_usb)?;
                Ok(None)
            }
            ClassRequest::DeviceReset => {
                handle
                    .write_control(
                        REQUEST_TYPE_OUT,
                        ClassRequestCode::DeviceResetRequest,
                        0,
                        index,
                        &[],
                        timeout,
                    )
                    .map_err(map_usb)?;
                Ok(None)
            }
            ClassRequest::GetDeviceStatus => {
                let mut buf = [0u8; STATUS_BUF_LEN];
                let n = handle
                    .read_control(
                        REQUEST_TYPE_IN,
                        ClassRequestCode::GetDeviceStatus,
                        0,
                        index,
                        &mut buf,
                        timeout,
                    )
                    .map_err(map_usb)?;
                DeviceStatus::parse(&buf[..n]).map(Some)
            }
            ClassRequest::GetExtendedEventData => {
                let mut buf = [0u8; STATUS_BUF_LEN];
                let n = handle
                    .read_control(
                        REQUEST_TYPE_IN,
                        ClassRequestCode::GetExtendedEventData,
                        0,
                        index,
                        &mut buf,
                        timeout,
                    )
                    .map_err(map_usb)?;
                DeviceStatus::parse(&buf[..n]).map(Some)
            }
        }
    }

    fn disconnect(&self) -> Result<(), TransportError> {
        self.handle
            .write()
            .unwrap()
            .release_interface(self.iface)
            .map_err(map_usb)
    }

    fn max_packet_size(&self) -> usize {
        self.max_packet
    }

    fn has_interrupt_endpoint(&self) -> bool {
        self.ep_int.is_some()
    }
}

fn map_usb(e: rusb::Error) -> TransportError {
    match e {
        rusb::Error::Pipe => TransportError::Stall,
        rusb::Error::Timeout => TransportError::Timeout,
        rusb::Error::NoDevice => TransportError::Disconnected,
        rusb::Error::Interrupted => TransportError::Cancelled,
        other => TransportError::Usb(other.to_string()),
    }
}

/// Enumerate still-image devices on the default libusb context.
pub fn enumerate() -> Result<Vec<rusb::Device<rusb::Context>>, TransportError> {
    let context = rusb::Context::new().map_err(map_usb)?;
    let mut found = vec![];
    for device in context.devices().map_err(map_usb)?.iter() {
        let Ok(config) = device.active_config_descriptor() else {
            continue;
        };
        let is_still_image = config.interfaces().flat_map(|i| i.descriptors()).any(|d| {
            d.class_code() == USB_CLASS_IMAGE && d.sub_class_code() == USB_SUBCLASS_STILL_IMAGE
        });
        if is_still_image {
            found.push(device);
        }
    }
    Ok(found)
}

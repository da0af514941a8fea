//! The boundary the protocol core consumes. The shipped rusb
//! implementation lives in [`crate::usb`]; tests drive the engine with a
//! scripted mock behind the same trait.

use crate::error::TransportError;
use crate::read::PtpRead;
use std::io::Cursor;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    BulkIn,
    BulkOut,
    Interrupt,
}

/// Class control requests from PIMA 15740 Annex D, issued over EP0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassRequest {
    /// Abort the transaction with the given id (request 0x64).
    CancelTransaction { transaction_id: u32 },
    /// Read the device status block (request 0x67).
    GetDeviceStatus,
    /// Class-level reset to an idle, session-closed state (request 0x66).
    DeviceReset,
    /// Fetch event data too large for the interrupt pipe (request 0x65).
    GetExtendedEventData,
}

/// Parsed Get_Device_Status block: a response-space code plus parameters
/// (stalled endpoint addresses during recovery).
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStatus {
    pub code: u16,
    pub params: Vec<u32>,
}

impl DeviceStatus {
    /// Wire form: wLength u16, code u16, then (wLength - 4) / 4 dword
    /// parameters.
    pub fn parse(bytes: &[u8]) -> Result<DeviceStatus, TransportError> {
        let mut cur = Cursor::new(bytes);
        let total = cur
            .read_ptp_u16()
            .map_err(|_| TransportError::Usb("short device status block".into()))?;
        let code = cur
            .read_ptp_u16()
            .map_err(|_| TransportError::Usb("short device status block".into()))?;
        let mut params = vec![];
        let mut remaining = usize::from(total).saturating_sub(4).min(bytes.len().saturating_sub(4));
        while remaining >= 4 {
            match cur.read_ptp_u32() {
                Ok(p) => params.push(p),
                Err(_) => break,
            }
            remaining -= 4;
        }
        Ok(DeviceStatus { code, params })
    }
}

/// One claimed still-image USB interface: two bulk pipes, an optional
/// interrupt pipe, and the class control channel.
///
/// Connection setup is the implementor's constructor; `disconnect`
/// releases whatever it claimed. Implementations map their native stall
/// and timeout conditions onto [`TransportError::Stall`] and
/// [`TransportError::Timeout`]; the engine owns the retry policy.
pub trait Transport: Send + Sync {
    /// One bulk-OUT transfer.
    fn send(&self, bytes: &[u8], timeout: Duration) -> Result<(), TransportError>;

    /// One bulk-IN transfer of at most `max_len` bytes. Short reads are
    /// normal and significant: they terminate a data phase.
    fn receive(&self, max_len: usize, timeout: Duration) -> Result<Vec<u8>, TransportError>;

    /// One interrupt-IN transfer. Blocks until an event container
    /// arrives, the timeout lapses, or `clear_halt(Interrupt)` breaks
    /// the read.
    fn receive_interrupt(&self, timeout: Duration) -> Result<Vec<u8>, TransportError>;

    fn clear_halt(&self, endpoint: EndpointKind) -> Result<(), TransportError>;

    /// Issue a class control request; status-returning requests yield
    /// `Some`.
    fn class_request(
        &self,
        request: ClassRequest,
        timeout: Duration,
    ) -> Result<Option<DeviceStatus>, TransportError>;

    fn disconnect(&self) -> Result<(), TransportError>;

    /// Max packet size of the bulk-IN endpoint, for short-packet
    /// detection.
    fn max_packet_size(&self) -> usize {
        512
    }

    fn is_little_endian(&self) -> bool {
        true
    }

    fn has_interrupt_endpoint(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_status_ok_no_params() {
        let status = DeviceStatus::parse(&[0x04, 0x00, 0x01, 0x20]).unwrap();
        assert_eq!(status.code, 0x2001);
        assert!(status.params.is_empty());
    }

    #[test]
    fn device_status_with_stalled_endpoints() {
        let status = DeviceStatus::parse(&[
            0x0C, 0x00, 0x19, 0x20, 0x81, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
        ])
        .unwrap();
        assert_eq!(status.code, 0x2019);
        assert_eq!(status.params, vec![0x81, 0x02]);
    }

    #[test]
    fn device_status_truncated_params_tolerated() {
        // declares 8 bytes, delivers 6
        let status = DeviceStatus::parse(&[0x08, 0x00, 0x01, 0x20, 0xAA, 0xBB]).unwrap();
        assert_eq!(status.code, 0x2001);
        assert!(status.params.is_empty());
    }
}

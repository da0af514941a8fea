//! Container framing shared by the bulk and interrupt pipes. All four
//! container types carry the same 12-byte header; DATA and RESPONSE
//! arrive on the same bulk-IN endpoint and are told apart only by the
//! type field at offset 4.

use crate::error::{Error, ProtocolError};
use crate::read::PtpRead;
use crate::write::PtpWrite;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::io::Cursor;

pub const CONTAINER_HEADER_SIZE: usize = 12;

/// PTP hard limit on COMMAND/RESPONSE/EVENT parameter slots.
pub const MAX_PARAMS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum ContainerKind {
    Command = 1,
    Data = 2,
    Response = 3,
    Event = 4,
}

impl ContainerKind {
    pub fn name(self) -> &'static str {
        match self {
            ContainerKind::Command => "COMMAND",
            ContainerKind::Data => "DATA",
            ContainerKind::Response => "RESPONSE",
            ContainerKind::Event => "EVENT",
        }
    }
}

/// The fixed header, parsed ahead of the payload so the engine can keep
/// reading chunks until `length` bytes have arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerHeader {
    /// Total container length including this header.
    pub length: u32,
    pub kind: ContainerKind,
    /// Operation, response, or event code depending on `kind`.
    pub code: u16,
    pub transaction_id: u32,
}

impl ContainerHeader {
    pub fn parse(bytes: &[u8]) -> Result<ContainerHeader, Error> {
        if bytes.len() < CONTAINER_HEADER_SIZE {
            return Err(ProtocolError::ShortRead {
                wanted: CONTAINER_HEADER_SIZE,
                got: bytes.len(),
            }
            .into());
        }
        let mut cur = Cursor::new(bytes);
        let length = cur.read_ptp_u32()?;
        let kind_raw = cur.read_ptp_u16()?;
        let kind = ContainerKind::try_from(kind_raw)
            .map_err(|_| ProtocolError::UnknownContainerKind(kind_raw))?;
        let code = cur.read_ptp_u16()?;
        let transaction_id = cur.read_ptp_u32()?;
        if length < CONTAINER_HEADER_SIZE as u32 {
            return Err(ProtocolError::FrameTooShort(length).into());
        }
        Ok(ContainerHeader {
            length,
            kind,
            code,
            transaction_id,
        })
    }

    pub fn payload_len(&self) -> usize {
        self.length as usize - CONTAINER_HEADER_SIZE
    }

    // does this container belong to the given transaction?
    pub fn belongs_to(&self, tid: u32) -> bool {
        self.transaction_id == tid
    }
}

/// A complete container.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub kind: ContainerKind,
    pub code: u16,
    pub transaction_id: u32,
    pub payload: Vec<u8>,
}

impl Container {
    pub fn new(kind: ContainerKind, code: u16, transaction_id: u32) -> Container {
        Container {
            kind,
            code,
            transaction_id,
            payload: vec![],
        }
    }

    /// A COMMAND/RESPONSE/EVENT container with u32 parameter slots.
    pub fn with_params(
        kind: ContainerKind,
        code: u16,
        transaction_id: u32,
        params: &[u32],
    ) -> Container {
        let mut payload = Vec::with_capacity(params.len() * 4);
        for p in params {
            payload.write_ptp_u32(*p).ok();
        }
        Container {
            kind,
            code,
            transaction_id,
            payload,
        }
    }

    pub fn with_payload(
        kind: ContainerKind,
        code: u16,
        transaction_id: u32,
        payload: Vec<u8>,
    ) -> Container {
        Container {
            kind,
            code,
            transaction_id,
            payload,
        }
    }

    pub fn length(&self) -> u32 {
        (self.payload.len() + CONTAINER_HEADER_SIZE) as u32
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.payload.len() + CONTAINER_HEADER_SIZE);
        buf.write_ptp_u32(self.length()).ok();
        buf.write_ptp_u16(u16::from(self.kind)).ok();
        buf.write_ptp_u16(self.code).ok();
        buf.write_ptp_u32(self.transaction_id).ok();
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Parse a container fully delivered in one transport frame. Trailing
    /// bytes past `length` are device padding and ignored.
    pub fn parse(bytes: &[u8]) -> Result<Container, Error> {
        let header = ContainerHeader::parse(bytes)?;
        let declared = header.length as usize;
        if bytes.len() < declared {
            return Err(ProtocolError::LengthMismatch {
                declared: header.length,
                received: bytes.len(),
            }
            .into());
        }
        Ok(Container {
            kind: header.kind,
            code: header.code,
            transaction_id: header.transaction_id,
            payload: bytes[CONTAINER_HEADER_SIZE..declared].to_vec(),
        })
    }

    /// Payload viewed as up to five u32 parameter slots. Devices padding
    /// the payload to a non-multiple of four lose the remainder.
    pub fn params(&self) -> Vec<u32> {
        self.payload
            .chunks_exact(4)
            .take(MAX_PARAMS)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    pub fn belongs_to(&self, tid: u32) -> bool {
        self.transaction_id == tid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_session_command_bytes() {
        let c = Container::with_params(ContainerKind::Command, 0x1002, 0, &[1]);
        assert_eq!(
            c.encode(),
            vec![
                0x10, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02, 0x10, 0x00, 0x00, 0x00, 0x00, 0x01,
                0x00, 0x00, 0x00
            ]
        );
    }

    #[test]
    fn empty_response_parses() {
        let bytes = [0x0C, 0x00, 0x00, 0x00, 0x03, 0x00, 0x01, 0x20, 0x00, 0x00, 0x00, 0x00];
        let c = Container::parse(&bytes).unwrap();
        assert_eq!(c.kind, ContainerKind::Response);
        assert_eq!(c.code, 0x2001);
        assert_eq!(c.transaction_id, 0);
        assert!(c.payload.is_empty());
        assert!(c.params().is_empty());
    }

    #[test]
    fn round_trip_equals_original() {
        let c = Container::with_params(ContainerKind::Event, 0x4003, 5, &[1, 2]);
        let bytes = c.encode();
        assert_eq!(bytes.len() as u32, c.length());
        assert_eq!(Container::parse(&bytes).unwrap(), c);
    }

    #[test]
    fn trailing_padding_ignored() {
        let mut bytes = Container::with_params(ContainerKind::Response, 0x2001, 7, &[]).encode();
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        let c = Container::parse(&bytes).unwrap();
        assert_eq!(c.transaction_id, 7);
        assert!(c.payload.is_empty());
    }

    #[test]
    fn invalid_kind_rejected() {
        let bytes = [0x0C, 0x00, 0x00, 0x00, 0x09, 0x00, 0x01, 0x20, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            Container::parse(&bytes),
            Err(Error::Protocol(ProtocolError::UnknownContainerKind(9)))
        ));
    }

    #[test]
    fn declared_length_below_header_rejected() {
        let bytes = [0x08, 0x00, 0x00, 0x00, 0x03, 0x00, 0x01, 0x20, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            Container::parse(&bytes),
            Err(Error::Protocol(ProtocolError::FrameTooShort(8)))
        ));
    }

    #[test]
    fn truncated_frame_rejected() {
        let bytes = [0x20, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x10, 0x01, 0x00, 0x00, 0x00];
        assert!(matches!(
            Container::parse(&bytes),
            Err(Error::Protocol(ProtocolError::LengthMismatch { .. }))
        ));
    }

    #[test]
    fn event_payload_parses_all_slots() {
        // length 20, EVENT ObjectAdded, txn 5, params [1, 2]
        let bytes = [
            0x14, 0x00, 0x00, 0x00, 0x04, 0x00, 0x03, 0x40, 0x05, 0x00, 0x00, 0x00, 0x01, 0x00,
            0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
        ];
        let c = Container::parse(&bytes).unwrap();
        assert_eq!(c.kind, ContainerKind::Event);
        assert_eq!(c.code, 0x4003);
        assert_eq!(c.transaction_id, 5);
        assert_eq!(c.params(), vec![1, 2]);
    }

    #[test]
    fn header_of_partial_frame() {
        // only the first chunk of a large DATA container
        let mut bytes = vec![0x00, 0x00, 0x10, 0x00, 0x02, 0x00, 0x09, 0x10, 0x03, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(&[0u8; 100]);
        let h = ContainerHeader::parse(&bytes).unwrap();
        assert_eq!(h.length, 0x0010_0000);
        assert_eq!(h.kind, ContainerKind::Data);
        assert_eq!(h.payload_len(), 0x0010_0000 - 12);
        assert!(h.belongs_to(3));
    }
}

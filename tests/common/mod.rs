#![allow(dead_code)]
//! Scripted transport for driving whole transactions without hardware:
//! canned bulk-IN frames (or faults) consumed in order, outbound frames
//! recorded for byte-level assertions, a separate interrupt queue for the
//! event pump, and a device-status queue for recovery sequences.

use ptpcam::container::{Container, ContainerKind};
use ptpcam::transport::{ClassRequest, DeviceStatus, EndpointKind, Transport};
use ptpcam::TransportError;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct MockTransport {
    pub outbound: Mutex<Vec<Vec<u8>>>,
    pub bulk_in: Mutex<VecDeque<Result<Vec<u8>, TransportError>>>,
    pub interrupt: Mutex<VecDeque<Vec<u8>>>,
    pub statuses: Mutex<VecDeque<DeviceStatus>>,
    pub class_requests: Mutex<Vec<ClassRequest>>,
    pub cleared: Mutex<Vec<EndpointKind>>,
}

impl MockTransport {
    pub fn new() -> MockTransport {
        MockTransport::default()
    }

    pub fn queue_frame(&self, bytes: Vec<u8>) {
        self.bulk_in.lock().unwrap().push_back(Ok(bytes));
    }

    pub fn queue_fault(&self, fault: TransportError) {
        self.bulk_in.lock().unwrap().push_back(Err(fault));
    }

    pub fn queue_response(&self, code: u16, tid: u32, params: &[u32]) {
        self.queue_frame(Container::with_params(ContainerKind::Response, code, tid, params).encode());
    }

    pub fn queue_data(&self, code: u16, tid: u32, payload: Vec<u8>) {
        self.queue_frame(Container::with_payload(ContainerKind::Data, code, tid, payload).encode());
    }

    pub fn queue_ok(&self, tid: u32) {
        self.queue_response(0x2001, tid, &[]);
    }

    pub fn queue_interrupt(&self, bytes: Vec<u8>) {
        self.interrupt.lock().unwrap().push_back(bytes);
    }

    pub fn queue_status(&self, code: u16) {
        self.statuses
            .lock()
            .unwrap()
            .push_back(DeviceStatus { code, params: vec![] });
    }

    /// Outbound frames sent so far.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.outbound.lock().unwrap().clone()
    }

    /// Parsed command codes of every outbound COMMAND frame, in order.
    pub fn sent_command_codes(&self) -> Vec<u16> {
        self.sent()
            .iter()
            .filter_map(|bytes| Container::parse(bytes).ok())
            .filter(|c| c.kind == ContainerKind::Command)
            .map(|c| c.code)
            .collect()
    }
}

impl Transport for MockTransport {
    fn send(&self, bytes: &[u8], _timeout: Duration) -> Result<(), TransportError> {
        self.outbound.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }

    fn receive(&self, _max_len: usize, _timeout: Duration) -> Result<Vec<u8>, TransportError> {
        self.bulk_in
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(TransportError::Timeout))
    }

    fn receive_interrupt(&self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        if let Some(frame) = self.interrupt.lock().unwrap().pop_front() {
            return Ok(frame);
        }
        // keep the pump thread from spinning hot against an empty queue
        std::thread::sleep(timeout.min(Duration::from_millis(10)));
        Err(TransportError::Timeout)
    }

    fn clear_halt(&self, endpoint: EndpointKind) -> Result<(), TransportError> {
        self.cleared.lock().unwrap().push(endpoint);
        Ok(())
    }

    fn class_request(
        &self,
        request: ClassRequest,
        _timeout: Duration,
    ) -> Result<Option<DeviceStatus>, TransportError> {
        self.class_requests.lock().unwrap().push(request);
        match request {
            ClassRequest::GetDeviceStatus | ClassRequest::GetExtendedEventData => Ok(Some(
                self.statuses
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or(DeviceStatus {
                        code: 0x2001,
                        params: vec![],
                    }),
            )),
            _ => Ok(None),
        }
    }

    fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// A complete, well-formed DeviceInfo payload for data-phase scripts.
pub fn device_info_payload() -> Vec<u8> {
    use ptpcam::write::PtpWrite;
    let mut buf = vec![];
    buf.write_ptp_u16(100).unwrap();
    buf.write_ptp_u32(0x0000_0011).unwrap();
    buf.write_ptp_u16(200).unwrap();
    buf.write_ptp_str("Sony PTP Extensions").unwrap();
    buf.write_ptp_u16(0).unwrap();
    buf.write_ptp_vec(&[0x1001u16, 0x1002, 0x1003, 0x1016], |w, v| w.write_ptp_u16(*v))
        .unwrap();
    buf.write_ptp_vec(&[0x4003u16, 0x400D], |w, v| w.write_ptp_u16(*v))
        .unwrap();
    buf.write_ptp_vec(&[0x500Fu16, 0x5007], |w, v| w.write_ptp_u16(*v))
        .unwrap();
    buf.write_ptp_vec(&[0x3801u16], |w, v| w.write_ptp_u16(*v)).unwrap();
    buf.write_ptp_vec(&[0x3801u16, 0x3808], |w, v| w.write_ptp_u16(*v))
        .unwrap();
    buf.write_ptp_str("Example Works").unwrap();
    buf.write_ptp_str("EX-1").unwrap();
    buf.write_ptp_str("1.0").unwrap();
    buf.write_ptp_str("12345678").unwrap();
    buf
}

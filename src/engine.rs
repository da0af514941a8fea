//! The transaction engine: one operation call in, the correct sequence of
//! COMMAND / DATA / RESPONSE frames out, with stall recovery, chunked
//! data phases, timeouts, and transaction-id bookkeeping.
//!
//! The engine owns both bulk endpoints exclusively. All calls on one
//! session go through `&mut self`, which is what serializes transactions:
//! operation A's RESPONSE is read before operation B's COMMAND is sent.

use crate::codes::{StandardOperationCode, StandardResponseCode};
use crate::container::{Container, ContainerHeader, ContainerKind, CONTAINER_HEADER_SIZE, MAX_PARAMS};
use crate::error::{Error, ProtocolError, TransportError, ValidationError};
use crate::transport::{ClassRequest, EndpointKind, Transport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Bulk data phases move in 64 KiB slices; a single transfer is never
/// trusted to carry a whole data phase.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Outgoing payloads above this size are written chunk-by-chunk.
const LARGE_WRITE_THRESHOLD: usize = 1024 * 1024;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const STATUS_POLLS: u32 = 10;
const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Caller-side cancellation. Checked between transport steps; a set token
/// issues `Cancel_Request` for the in-flight transaction and aborts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Per-call knobs. `timeout` applies to each transport phase, so a
/// chunked download may take longer overall; `GetObject` callers
/// typically raise it well past the 5 s default.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub timeout: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl CallOptions {
    pub fn timeout(timeout: Duration) -> CallOptions {
        CallOptions {
            timeout: Some(timeout),
            cancel: None,
        }
    }
}

/// A transaction that reached its RESPONSE with code OK.
#[derive(Debug, Clone, PartialEq)]
pub struct Completed {
    pub response_code: u16,
    pub response_params: Vec<u32>,
    /// Raw data phase payload for device-to-host operations.
    pub data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionHealth {
    Healthy,
    /// A transport error occurred; the next call probes device status
    /// before touching the bulk pipes.
    Suspect,
    /// The probe failed too. Calls fail fast until disconnect.
    Failed,
}

pub struct TransactionEngine<T: Transport> {
    transport: Arc<T>,
    next_transaction_id: u32,
    session_open: bool,
    health: SessionHealth,
    default_timeout: Duration,
}

impl<T: Transport> TransactionEngine<T> {
    pub fn new(transport: Arc<T>) -> TransactionEngine<T> {
        TransactionEngine {
            transport,
            next_transaction_id: 1,
            session_open: false,
            health: SessionHealth::Healthy,
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn session_open(&self) -> bool {
        self.session_open
    }

    pub fn next_transaction_id(&self) -> u32 {
        self.next_transaction_id
    }

    /// Run one transaction. `data_out` is the host-to-device payload for
    /// operations with an outgoing data phase; `expect_data` signals a
    /// device-to-host data phase.
    pub fn execute(
        &mut self,
        code: u16,
        params: &[u32],
        data_out: Option<&[u8]>,
        expect_data: bool,
        opts: &CallOptions,
    ) -> Result<Completed, Error> {
        if params.len() > MAX_PARAMS {
            return Err(ValidationError::TooManyParameters {
                max: MAX_PARAMS,
                got: params.len(),
            }
            .into());
        }
        match self.health {
            SessionHealth::Failed => return Err(TransportError::SessionFailed.into()),
            SessionHealth::Suspect => self.probe()?,
            SessionHealth::Healthy => {}
        }

        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let tid = self.assign_transaction_id(code);
        let cancel = opts.cancel.as_ref();

        let result = self.run_transaction(code, tid, params, data_out, expect_data, timeout, cancel);

        match &result {
            Ok(_) => {
                if code == StandardOperationCode::OpenSession {
                    self.session_open = true;
                    self.next_transaction_id = 1;
                } else if code == StandardOperationCode::CloseSession {
                    self.session_open = false;
                }
            }
            Err(Error::Transport(_)) => {
                if self.health == SessionHealth::Healthy {
                    self.health = SessionHealth::Suspect;
                }
            }
            Err(_) => {}
        }
        result
    }

    /// Transaction id 0 is reserved for OpenSession and for operations
    /// issued outside any session (GetDeviceInfo). The counter wraps from
    /// 2^32-1 back to 1, never revisiting 0.
    fn assign_transaction_id(&mut self, code: u16) -> u32 {
        if code == StandardOperationCode::OpenSession || !self.session_open {
            return 0;
        }
        let tid = self.next_transaction_id;
        self.next_transaction_id = if tid == u32::MAX { 1 } else { tid + 1 };
        tid
    }

    #[allow(clippy::too_many_arguments)]
    fn run_transaction(
        &mut self,
        code: u16,
        tid: u32,
        params: &[u32],
        data_out: Option<&[u8]>,
        expect_data: bool,
        timeout: Duration,
        cancel: Option<&CancelToken>,
    ) -> Result<Completed, Error> {
        trace!(
            "txn {}: command 0x{:04x} ({}) params {:?}",
            tid,
            code,
            crate::codes::StandardOperationCode::name(code).unwrap_or("vendor"),
            params
        );

        self.check_cancel(cancel, tid)?;
        let command = Container::with_params(ContainerKind::Command, code, tid, params);
        self.write_phase(&command.encode(), timeout, tid, cancel)?;

        if let Some(payload) = data_out {
            self.check_cancel(cancel, tid)?;
            trace!("txn {}: data out, {} bytes", tid, payload.len());
            let data = Container::with_payload(ContainerKind::Data, code, tid, payload.to_vec());
            self.write_phase(&data.encode(), timeout, tid, cancel)?;
        }

        let mut data_in: Option<Vec<u8>> = None;
        loop {
            self.check_cancel(cancel, tid)?;
            let (header, payload) = self.read_container(timeout, tid, cancel)?;
            if !header.belongs_to(tid) {
                return Err(ProtocolError::TransactionMismatch {
                    expected: tid,
                    got: header.transaction_id,
                }
                .into());
            }
            match header.kind {
                ContainerKind::Data => {
                    if !expect_data {
                        return Err(ProtocolError::UnexpectedContainer {
                            got: "DATA",
                            phase: "response",
                        }
                        .into());
                    }
                    trace!("txn {}: data in, {} bytes", tid, payload.len());
                    data_in = Some(payload);
                }
                ContainerKind::Response => {
                    let response =
                        Container::with_payload(ContainerKind::Response, header.code, tid, payload);
                    let response_params = response.params();
                    trace!(
                        "txn {}: response 0x{:04x} params {:?}",
                        tid,
                        header.code,
                        response_params
                    );
                    if header.code != StandardResponseCode::Ok {
                        return Err(Error::Device {
                            code: header.code,
                            params: response_params,
                        });
                    }
                    return Ok(Completed {
                        response_code: header.code,
                        response_params,
                        data: data_in,
                    });
                }
                ContainerKind::Command | ContainerKind::Event => {
                    return Err(ProtocolError::UnexpectedContainer {
                        got: header.kind.name(),
                        phase: "response",
                    }
                    .into());
                }
            }
        }
    }

    /// One outgoing container, chunked above the large-write threshold.
    fn write_phase(
        &mut self,
        bytes: &[u8],
        timeout: Duration,
        tid: u32,
        cancel: Option<&CancelToken>,
    ) -> Result<(), Error> {
        if bytes.len() <= LARGE_WRITE_THRESHOLD {
            return self.bulk_out(bytes, timeout, tid);
        }
        for chunk in bytes.chunks(CHUNK_SIZE) {
            self.check_cancel(cancel, tid)?;
            self.bulk_out(chunk, timeout, tid)?;
        }
        Ok(())
    }

    /// One full container off the bulk-IN pipe. The first chunk yields the
    /// header; reads continue until `length` bytes arrived or the device
    /// terminates with a short packet, which must coincide with `length`.
    fn read_container(
        &mut self,
        timeout: Duration,
        tid: u32,
        cancel: Option<&CancelToken>,
    ) -> Result<(ContainerHeader, Vec<u8>), Error> {
        let first = self.bulk_in(CHUNK_SIZE, timeout, tid)?;
        let header = ContainerHeader::parse(&first)?;
        let total = header.length as usize;
        let mut received = first.len();
        let mut ended = first.len() < CHUNK_SIZE;

        let mut payload = first;
        while received < total && !ended {
            self.check_cancel(cancel, tid)?;
            let chunk = self.bulk_in(CHUNK_SIZE, timeout, tid)?;
            ended = chunk.len() < CHUNK_SIZE;
            received += chunk.len();
            payload.extend_from_slice(&chunk);
            if chunk.is_empty() {
                break;
            }
        }
        if received < total {
            return Err(ProtocolError::LengthMismatch {
                declared: header.length,
                received,
            }
            .into());
        }
        // devices may pad past the declared length
        payload.truncate(total);
        payload.drain(..CONTAINER_HEADER_SIZE);
        Ok((header, payload))
    }

    /// One bulk-OUT transfer with the single-retry stall dance.
    fn bulk_out(&mut self, bytes: &[u8], timeout: Duration, tid: u32) -> Result<(), Error> {
        for attempt in 0..2 {
            match self.transport.send(bytes, timeout) {
                Ok(()) => return Ok(()),
                Err(TransportError::Stall) if attempt == 0 => {
                    warn!("txn {}: bulk-out stall, recovering", tid);
                    self.recover_stall()?;
                }
                Err(TransportError::Timeout) => {
                    self.cancel_on_wire(tid);
                    return Err(TransportError::Timeout.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(TransportError::Stall.into())
    }

    /// One bulk-IN transfer with the single-retry stall dance.
    fn bulk_in(&mut self, max_len: usize, timeout: Duration, tid: u32) -> Result<Vec<u8>, Error> {
        for attempt in 0..2 {
            match self.transport.receive(max_len, timeout) {
                Ok(bytes) => return Ok(bytes),
                Err(TransportError::Stall) if attempt == 0 => {
                    warn!("txn {}: bulk-in stall, recovering", tid);
                    self.recover_stall()?;
                }
                Err(TransportError::Timeout) => {
                    self.cancel_on_wire(tid);
                    return Err(TransportError::Timeout.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(TransportError::Stall.into())
    }

    /// PIMA 15740 §D.7.2.1: read device status, clear both bulk halts,
    /// then poll status until the device reports OK again.
    fn recover_stall(&mut self) -> Result<(), Error> {
        let timeout = self.default_timeout;
        let status = self
            .transport
            .class_request(ClassRequest::GetDeviceStatus, timeout)?;
        let mut last_code = status.as_ref().map_or(0, |s| s.code);
        if let Some(s) = &status {
            debug!(
                "stall recovery: device status 0x{:04x}, stalled endpoints {:?}",
                s.code, s.params
            );
        }
        self.transport.clear_halt(EndpointKind::BulkIn)?;
        self.transport.clear_halt(EndpointKind::BulkOut)?;
        if last_code == StandardResponseCode::Ok {
            return Ok(());
        }
        for _ in 0..STATUS_POLLS {
            thread::sleep(STATUS_POLL_INTERVAL);
            if let Some(s) = self
                .transport
                .class_request(ClassRequest::GetDeviceStatus, timeout)?
            {
                last_code = s.code;
                if s.code == StandardResponseCode::Ok {
                    return Ok(());
                }
            }
        }
        Err(TransportError::StallRecoveryFailed {
            status: last_code,
            polls: STATUS_POLLS,
        }
        .into())
    }

    /// Status probe for a suspect session: one chance before fail-fast.
    fn probe(&mut self) -> Result<(), Error> {
        match self
            .transport
            .class_request(ClassRequest::GetDeviceStatus, self.default_timeout)
        {
            Ok(Some(s)) if s.code == StandardResponseCode::Ok => {
                debug!("suspect session probe succeeded");
                self.health = SessionHealth::Healthy;
                Ok(())
            }
            other => {
                warn!("suspect session probe failed: {:?}", other.err());
                self.health = SessionHealth::Failed;
                Err(TransportError::SessionFailed.into())
            }
        }
    }

    fn check_cancel(&mut self, cancel: Option<&CancelToken>, tid: u32) -> Result<(), Error> {
        if cancel.is_some_and(|c| c.is_cancelled()) {
            debug!("txn {}: cancelled by caller", tid);
            self.cancel_on_wire(tid);
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Best-effort Cancel_Request; the transaction is already lost.
    fn cancel_on_wire(&mut self, tid: u32) {
        if let Err(e) = self.transport.class_request(
            ClassRequest::CancelTransaction { transaction_id: tid },
            self.default_timeout,
        ) {
            warn!("txn {}: cancel request failed: {}", tid, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::DeviceStatus;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Scripted {
        sent: Mutex<Vec<Vec<u8>>>,
        reads: Mutex<VecDeque<Result<Vec<u8>, TransportError>>>,
        statuses: Mutex<VecDeque<DeviceStatus>>,
        cleared: Mutex<Vec<EndpointKind>>,
        cancelled: Mutex<Vec<u32>>,
    }

    impl Scripted {
        fn push_read(&self, r: Result<Vec<u8>, TransportError>) {
            self.reads.lock().unwrap().push_back(r);
        }

        fn push_response(&self, code: u16, tid: u32, params: &[u32]) {
            self.push_read(Ok(
                Container::with_params(ContainerKind::Response, code, tid, params).encode()
            ));
        }

        fn push_status(&self, code: u16) {
            self.statuses
                .lock()
                .unwrap()
                .push_back(DeviceStatus { code, params: vec![] });
        }
    }

    impl Transport for Scripted {
        fn send(&self, bytes: &[u8], _timeout: Duration) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(bytes.to_vec());
            Ok(())
        }

        fn receive(&self, _max_len: usize, _timeout: Duration) -> Result<Vec<u8>, TransportError> {
            self.reads
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(TransportError::Timeout))
        }

        fn receive_interrupt(&self, _timeout: Duration) -> Result<Vec<u8>, TransportError> {
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
            match request {
                ClassRequest::CancelTransaction { transaction_id } => {
                    self.cancelled.lock().unwrap().push(transaction_id);
                    Ok(None)
                }
                ClassRequest::GetDeviceStatus => Ok(Some(
                    self.statuses
                        .lock()
                        .unwrap()
                        .pop_front()
                        .unwrap_or(DeviceStatus { code: 0x2001, params: vec![] }),
                )),
                _ => Ok(None),
            }
        }

        fn disconnect(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn engine(t: &Arc<Scripted>) -> TransactionEngine<Scripted> {
        TransactionEngine::new(t.clone())
    }

    fn open_session(e: &mut TransactionEngine<Scripted>, t: &Arc<Scripted>) {
        t.push_response(0x2001, 0, &[]);
        e.execute(0x1002, &[1], None, false, &CallOptions::default())
            .unwrap();
    }

    #[test]
    fn open_session_uses_transaction_zero() {
        let t = Arc::new(Scripted::default());
        let mut e = engine(&t);
        open_session(&mut e, &t);

        let sent = t.sent.lock().unwrap();
        assert_eq!(
            sent[0],
            vec![0x10, 0, 0, 0, 0x01, 0, 0x02, 0x10, 0, 0, 0, 0, 0x01, 0, 0, 0]
        );
        assert!(e.session_open());
        assert_eq!(e.next_transaction_id(), 1);
    }

    #[test]
    fn transaction_ids_strictly_increase() {
        let t = Arc::new(Scripted::default());
        let mut e = engine(&t);
        open_session(&mut e, &t);

        for expected_tid in 1..=3u32 {
            t.push_response(0x2001, expected_tid, &[]);
            e.execute(0x1004, &[], None, false, &CallOptions::default())
                .unwrap();
            let sent = t.sent.lock().unwrap();
            let header = ContainerHeader::parse(sent.last().unwrap()).unwrap();
            assert_eq!(header.transaction_id, expected_tid);
        }
    }

    #[test]
    fn transaction_id_wraps_to_one_not_zero() {
        let t = Arc::new(Scripted::default());
        let mut e = engine(&t);
        open_session(&mut e, &t);
        e.next_transaction_id = u32::MAX;

        t.push_response(0x2001, u32::MAX, &[]);
        e.execute(0x1004, &[], None, false, &CallOptions::default())
            .unwrap();
        assert_eq!(e.next_transaction_id(), 1);

        t.push_response(0x2001, 1, &[]);
        e.execute(0x1004, &[], None, false, &CallOptions::default())
            .unwrap();
        let sent = t.sent.lock().unwrap();
        let header = ContainerHeader::parse(sent.last().unwrap()).unwrap();
        assert_eq!(header.transaction_id, 1);
    }

    #[test]
    fn data_in_phase_collected_before_response() {
        let t = Arc::new(Scripted::default());
        let mut e = engine(&t);
        open_session(&mut e, &t);

        let data =
            Container::with_payload(ContainerKind::Data, 0x1001, 1, vec![0xAA, 0xBB, 0xCC]);
        t.push_read(Ok(data.encode()));
        t.push_response(0x2001, 1, &[]);
        let done = e
            .execute(0x1001, &[], None, true, &CallOptions::default())
            .unwrap();
        assert_eq!(done.data.unwrap(), vec![0xAA, 0xBB, 0xCC]);
        assert_eq!(done.response_code, 0x2001);
    }

    #[test]
    fn unexpected_data_container_is_protocol_error() {
        let t = Arc::new(Scripted::default());
        let mut e = engine(&t);
        open_session(&mut e, &t);

        let data = Container::with_payload(ContainerKind::Data, 0x1003, 1, vec![0x00]);
        t.push_read(Ok(data.encode()));
        let err = e
            .execute(0x1003, &[], None, false, &CallOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::UnexpectedContainer { .. })
        ));
    }

    #[test]
    fn mismatched_transaction_rejected() {
        let t = Arc::new(Scripted::default());
        let mut e = engine(&t);
        open_session(&mut e, &t);

        t.push_response(0x2001, 42, &[]);
        let err = e
            .execute(0x1004, &[], None, false, &CallOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::TransactionMismatch { expected: 1, got: 42 })
        ));
    }

    #[test]
    fn non_ok_response_is_device_error() {
        let t = Arc::new(Scripted::default());
        let mut e = engine(&t);
        open_session(&mut e, &t);

        t.push_response(0x2019, 1, &[7]);
        let err = e
            .execute(0x100E, &[0, 0], None, false, &CallOptions::default())
            .unwrap_err();
        match err {
            Error::Device { code, params } => {
                assert_eq!(code, 0x2019);
                assert_eq!(params, vec![7]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn single_stall_recovers_and_retries() {
        let t = Arc::new(Scripted::default());
        let mut e = engine(&t);
        open_session(&mut e, &t);

        t.push_read(Err(TransportError::Stall));
        t.push_status(0x2001);
        t.push_response(0x2001, 1, &[]);
        let done = e.execute(0x1004, &[], None, false, &CallOptions::default());
        assert!(done.is_ok());
        let cleared = t.cleared.lock().unwrap();
        assert_eq!(cleared.as_slice(), &[EndpointKind::BulkIn, EndpointKind::BulkOut]);
    }

    #[test]
    fn second_stall_fails_transaction() {
        let t = Arc::new(Scripted::default());
        let mut e = engine(&t);
        open_session(&mut e, &t);

        t.push_read(Err(TransportError::Stall));
        t.push_status(0x2001);
        t.push_read(Err(TransportError::Stall));
        let err = e
            .execute(0x1004, &[], None, false, &CallOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Stall)));
    }

    #[test]
    fn timeout_issues_cancel_request_and_marks_suspect() {
        let t = Arc::new(Scripted::default());
        let mut e = engine(&t);
        open_session(&mut e, &t);

        // no scripted read: receive times out
        let err = e
            .execute(0x1004, &[], None, false, &CallOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Timeout)));
        assert_eq!(t.cancelled.lock().unwrap().as_slice(), &[1]);

        // next call probes status (scripted OK) and proceeds
        t.push_status(0x2001);
        t.push_response(0x2001, 2, &[]);
        assert!(e
            .execute(0x1004, &[], None, false, &CallOptions::default())
            .is_ok());
    }

    #[test]
    fn failed_probe_fails_fast_afterwards() {
        let t = Arc::new(Scripted::default());
        let mut e = engine(&t);
        open_session(&mut e, &t);

        let _ = e
            .execute(0x1004, &[], None, false, &CallOptions::default())
            .unwrap_err();
        // probe sees a busy device: session goes failed
        t.push_status(0x2019);
        let err = e
            .execute(0x1004, &[], None, false, &CallOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::SessionFailed)));
        // and stays failed without touching the wire
        let sends_before = t.sent.lock().unwrap().len();
        let err = e
            .execute(0x1004, &[], None, false, &CallOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::SessionFailed)));
        assert_eq!(t.sent.lock().unwrap().len(), sends_before);
    }

    #[test]
    fn cancel_token_aborts_before_command() {
        let t = Arc::new(Scripted::default());
        let mut e = engine(&t);
        open_session(&mut e, &t);

        let token = CancelToken::new();
        token.cancel();
        let opts = CallOptions {
            timeout: None,
            cancel: Some(token),
        };
        let err = e.execute(0x1004, &[], None, false, &opts).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(t.cancelled.lock().unwrap().as_slice(), &[1]);
    }

    #[test]
    fn chunked_data_phase_reassembled() {
        let t = Arc::new(Scripted::default());
        let mut e = engine(&t);
        open_session(&mut e, &t);

        // a data container larger than one chunk, delivered in three reads
        let payload: Vec<u8> = (0..(CHUNK_SIZE * 2)).map(|i| (i % 251) as u8).collect();
        let full = Container::with_payload(ContainerKind::Data, 0x1009, 1, payload.clone()).encode();
        t.push_read(Ok(full[..CHUNK_SIZE].to_vec()));
        t.push_read(Ok(full[CHUNK_SIZE..CHUNK_SIZE * 2].to_vec()));
        t.push_read(Ok(full[CHUNK_SIZE * 2..].to_vec()));
        t.push_response(0x2001, 1, &[]);

        let done = e
            .execute(0x1009, &[1], None, true, &CallOptions::default())
            .unwrap();
        assert_eq!(done.data.unwrap(), payload);
    }

    #[test]
    fn short_packet_before_declared_length_is_length_mismatch() {
        let t = Arc::new(Scripted::default());
        let mut e = engine(&t);
        open_session(&mut e, &t);

        let mut truncated =
            Container::with_payload(ContainerKind::Data, 0x1009, 1, vec![0u8; 64]).encode();
        truncated[0] = 0xFF; // declare 255 bytes, deliver 76
        t.push_read(Ok(truncated));
        let err = e
            .execute(0x1009, &[1], None, true, &CallOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::LengthMismatch { declared: 255, received: 76 })
        ));
    }

    #[test]
    fn six_parameters_rejected_locally() {
        let t = Arc::new(Scripted::default());
        let mut e = engine(&t);
        let err = e
            .execute(0x1004, &[0; 6], None, false, &CallOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::TooManyParameters { max: 5, got: 6 })
        ));
        assert!(t.sent.lock().unwrap().is_empty());
    }
}

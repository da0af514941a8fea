//! Whole-transaction scenarios against the scripted transport, asserting
//! the exact bytes the engine puts on the wire.

mod common;

use common::{device_info_payload, MockTransport};
use ptpcam::container::{Container, ContainerKind};
use ptpcam::transport::{ClassRequest, EndpointKind};
use ptpcam::{Camera, Error, TransportError, ValidationError, Value};
use std::sync::mpsc;
use std::time::Duration;

fn connected_camera() -> Camera<MockTransport> {
    let mut cam = Camera::generic(MockTransport::new());
    cam.transport().queue_ok(0);
    cam.connect().unwrap();
    cam
}

#[test]
fn open_session_happy_path() {
    let mut cam = Camera::generic(MockTransport::new());
    let t = cam.transport().clone();
    t.queue_ok(0);
    cam.connect().unwrap();
    assert!(cam.is_connected());

    let sent = t.sent();
    assert_eq!(
        sent[0],
        vec![0x10, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02, 0x10, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00],
    );

    // the first operation after OpenSession runs as transaction 1
    t.queue_ok(1);
    cam.capture().unwrap();
    let command = Container::parse(t.sent().last().unwrap()).unwrap();
    assert_eq!(command.kind, ContainerKind::Command);
    assert_eq!(command.transaction_id, 1);

    t.queue_ok(2);
    cam.disconnect().unwrap();
    assert!(!cam.is_connected());
}

#[test]
fn get_device_info_data_in_phase() {
    let cam = connected_camera();
    let t = cam.transport().clone();

    t.queue_data(0x1001, 1, device_info_payload());
    t.queue_ok(1);
    let info = cam.device_info().unwrap();

    let command = t.sent()[1].clone();
    assert_eq!(
        command,
        vec![0x0C, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x10, 0x01, 0x00, 0x00, 0x00],
    );
    assert_eq!(info.StandardVersion, 100);
    assert_eq!(info.VendorExtensionID, 0x11);
    assert_eq!(info.VendorExtensionDesc, "Sony PTP Extensions");
    assert_eq!(info.Manufacturer, "Example Works");
    assert_eq!(info.Model, "EX-1");
    assert!(info.supports_operation(0x1016));
}

#[test]
fn set_device_prop_value_data_out_phase() {
    let cam = connected_camera();
    let t = cam.transport().clone();

    // burn transaction 1 so the write runs as transaction 2
    t.queue_data(0x1001, 1, device_info_payload());
    t.queue_ok(1);
    cam.device_info().unwrap();

    t.queue_ok(2);
    cam.set("ExposureIndex", &Value::UINT16(400)).unwrap();

    let sent = t.sent();
    assert_eq!(
        sent[sent.len() - 2],
        vec![0x10, 0x00, 0x00, 0x00, 0x01, 0x00, 0x16, 0x10, 0x02, 0x00, 0x00, 0x00, 0x0F, 0x50, 0x00, 0x00],
    );
    assert_eq!(
        sent[sent.len() - 1],
        vec![0x0E, 0x00, 0x00, 0x00, 0x02, 0x00, 0x16, 0x10, 0x02, 0x00, 0x00, 0x00, 0x90, 0x01],
    );

    // and the value reads back
    t.queue_data(0x1015, 3, vec![0x90, 0x01]);
    t.queue_ok(3);
    assert_eq!(cam.get("ExposureIndex").unwrap(), Value::UINT16(400));
}

#[test]
fn bulk_in_stall_recovers_once() {
    let cam = connected_camera();
    let t = cam.transport().clone();

    t.queue_fault(TransportError::Stall);
    t.queue_status(0x2001);
    t.queue_ok(1);
    cam.capture().unwrap();

    assert!(t
        .class_requests
        .lock()
        .unwrap()
        .contains(&ClassRequest::GetDeviceStatus));
    let cleared = t.cleared.lock().unwrap();
    assert!(cleared.contains(&EndpointKind::BulkIn));
    assert!(cleared.contains(&EndpointKind::BulkOut));
}

#[test]
fn event_delivered_to_registered_handler() {
    let mut cam = Camera::generic(MockTransport::new());
    let t = cam.transport().clone();

    let (tx, rx) = mpsc::channel();
    cam.on("ObjectAdded", move |event| {
        tx.send((event.transaction_id, event.params.clone())).ok();
    })
    .unwrap();

    t.queue_interrupt(vec![
        0x14, 0x00, 0x00, 0x00, 0x04, 0x00, 0x03, 0x40, 0x05, 0x00, 0x00, 0x00, 0x01, 0x00,
        0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
    ]);
    t.queue_ok(0);
    cam.connect().unwrap();

    let (tid, params) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(tid, 5);
    assert_eq!(params, vec![0x01, 0x02]);

    t.queue_ok(1);
    cam.disconnect().unwrap();
}

#[test]
fn device_error_carries_code_and_params() {
    let cam = connected_camera();
    let t = cam.transport().clone();

    t.queue_response(0x2019, 1, &[0x7]);
    match cam.capture() {
        Err(Error::Device { code, params }) => {
            assert_eq!(code, 0x2019);
            assert_eq!(params, vec![0x7]);
            assert!(cam.registry().recoverable(code));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn partial_object_round_trip() {
    let cam = connected_camera();
    let t = cam.transport().clone();

    t.queue_data(0x101B, 1, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    t.queue_response(0x2001, 1, &[4]);
    let bytes = cam.partial_object(7, 0x1000, 4, None).unwrap();
    assert_eq!(bytes, vec![0xDE, 0xAD, 0xBE, 0xEF]);

    let command = Container::parse(&t.sent()[1]).unwrap();
    assert_eq!(command.code, 0x101B);
    assert_eq!(command.params(), vec![7, 0x1000, 4]);
}

#[test]
fn get_descriptor_decodes_form() {
    use ptpcam::write::PtpWrite;
    let cam = connected_camera();
    let t = cam.transport().clone();

    let mut desc = vec![];
    desc.write_ptp_u16(0x500F).unwrap();
    desc.write_ptp_u16(0x0004).unwrap();
    desc.write_ptp_u8(0x01).unwrap();
    desc.write_ptp_u16(100).unwrap();
    desc.write_ptp_u16(400).unwrap();
    desc.write_ptp_u8(0x02).unwrap();
    desc.write_ptp_u16(2).unwrap();
    desc.write_ptp_u16(100).unwrap();
    desc.write_ptp_u16(400).unwrap();

    t.queue_data(0x1014, 1, desc);
    t.queue_ok(1);
    let desc = cam.get_descriptor("ExposureIndex").unwrap();
    assert_eq!(desc.property_code, 0x500F);
    assert_eq!(desc.current, Value::UINT16(400));
    assert!(desc.writable());
}

#[test]
fn object_listing_walks_hierarchy() {
    use ptpcam::write::PtpWrite;
    let cam = connected_camera();
    let t = cam.transport().clone();

    fn object_info_payload(format: u16, name: &str) -> Vec<u8> {
        let mut buf = vec![];
        buf.write_ptp_u32(0x10001).unwrap();
        buf.write_ptp_u16(format).unwrap();
        buf.write_ptp_u16(0).unwrap();
        buf.write_ptp_u32(100).unwrap();
        buf.write_ptp_u16(0).unwrap();
        for _ in 0..7 {
            buf.write_ptp_u32(0).unwrap();
        }
        buf.write_ptp_u16(0).unwrap();
        buf.write_ptp_u32(0).unwrap();
        buf.write_ptp_u32(1).unwrap();
        buf.write_ptp_str(name).unwrap();
        buf.write_ptp_str("").unwrap();
        buf.write_ptp_str("").unwrap();
        buf.write_ptp_str("").unwrap();
        buf
    }

    // root: one folder (handle 10); folder: one image (handle 11)
    let mut roots = vec![];
    roots.write_ptp_vec(&[10u32], |w, v| w.write_ptp_u32(*v)).unwrap();
    t.queue_data(0x1007, 1, roots);
    t.queue_ok(1);
    t.queue_data(0x1008, 2, object_info_payload(0x3001, "DCIM"));
    t.queue_ok(2);
    let mut children = vec![];
    children.write_ptp_vec(&[11u32], |w, v| w.write_ptp_u32(*v)).unwrap();
    t.queue_data(0x1007, 3, children);
    t.queue_ok(3);
    t.queue_data(0x1008, 4, object_info_payload(0x3801, "IMG_0001.JPG"));
    t.queue_ok(4);

    let tree = cam.object_tree(0x10001).unwrap();
    assert_eq!(tree.len(), 1);
    let paths: Vec<String> = tree[0].walk().into_iter().map(|(p, _)| p).collect();
    assert_eq!(paths, vec!["DCIM", "DCIM/IMG_0001.JPG"]);
}

#[test]
fn validation_errors_never_reach_the_wire() {
    let cam = connected_camera();
    let t = cam.transport().clone();
    let sends_before = t.sent().len();

    assert!(matches!(
        cam.send("GetPartialObject", &[Value::UINT32(1)]),
        Err(Error::Validation(ValidationError::MissingParameter(_)))
    ));
    assert!(matches!(
        cam.set("ExposureIndex", &Value::NAME("NotAnIso".into())),
        Err(Error::Validation(_))
    ));
    assert_eq!(t.sent().len(), sends_before);
}

//! Vendor strategy flows: handshakes, property overrides, and event
//! stream handling, driven against the scripted transport.

mod common;

use common::MockTransport;
use ptpcam::container::Container;
use ptpcam::engine::{CallOptions, TransactionEngine};
use ptpcam::vendor::canon::{CanonVendor, PropertyRead};
use ptpcam::vendor::nikon::NikonVendor;
use ptpcam::vendor::sony::SonyVendor;
use ptpcam::write::PtpWrite;
use ptpcam::{Error, Value, Vendor};
use std::sync::Arc;

fn open_engine(t: &Arc<MockTransport>) -> TransactionEngine<MockTransport> {
    let mut engine = TransactionEngine::new(t.clone());
    t.queue_ok(0);
    engine
        .execute(0x1002, &[1], None, false, &CallOptions::default())
        .unwrap();
    engine
}

mod sony {
    use super::*;

    #[test]
    fn connect_hook_runs_sdio_phases_in_order() {
        let t = Arc::new(MockTransport::new());
        let mut engine = open_engine(&t);
        for tid in 1..=4 {
            t.queue_ok(tid);
        }

        let vendor = SonyVendor::new();
        Vendor::<MockTransport>::connect_hook(&vendor, &mut engine).unwrap();

        assert_eq!(
            t.sent_command_codes(),
            vec![0x1002, 0x9201, 0x9201, 0x9202, 0x9201]
        );
        // phases 1, 2, 3 in the SDIOConnect frames
        let phases: Vec<u32> = t
            .sent()
            .iter()
            .filter_map(|b| Container::parse(b).ok())
            .filter(|c| c.code == 0x9201)
            .map(|c| c.params()[0])
            .collect();
        assert_eq!(phases, vec![1, 2, 3]);
    }

    #[test]
    fn get_reads_from_all_prop_snapshot() {
        let t = Arc::new(MockTransport::new());
        let mut engine = open_engine(&t);
        let vendor = SonyVendor::new();
        let registry = Vendor::<MockTransport>::registry(&vendor);
        let prop = registry.property("SonyIso").unwrap();

        let mut snapshot = vec![];
        snapshot.write_ptp_u64(1).unwrap();
        snapshot.write_ptp_u16(0xD21E).unwrap();
        snapshot.write_ptp_u16(0x0006).unwrap();
        snapshot.write_ptp_u8(1).unwrap();
        snapshot.write_ptp_u8(1).unwrap();
        snapshot.write_ptp_u32(100).unwrap();
        snapshot.write_ptp_u32(400).unwrap();
        snapshot.write_ptp_u8(0).unwrap();
        t.queue_data(0x9209, 1, snapshot);
        t.queue_ok(1);

        let value = vendor.get_override(&mut engine, prop).unwrap().unwrap();
        assert_eq!(value, Value::UINT32(400));
    }

    #[test]
    fn snapshot_miss_is_prop_not_supported() {
        let t = Arc::new(MockTransport::new());
        let mut engine = open_engine(&t);
        let vendor = SonyVendor::new();
        let registry = Vendor::<MockTransport>::registry(&vendor);
        let prop = registry.property("SonyIso").unwrap();

        let mut snapshot = vec![];
        snapshot.write_ptp_u64(0).unwrap();
        t.queue_data(0x9209, 1, snapshot);
        t.queue_ok(1);

        match vendor.get_override(&mut engine, prop).unwrap() {
            Err(Error::Device { code, .. }) => assert_eq!(code, 0x200A),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn settings_and_controls_use_different_operations() {
        let t = Arc::new(MockTransport::new());
        let mut engine = open_engine(&t);
        let vendor = SonyVendor::new();
        let registry = Vendor::<MockTransport>::registry(&vendor);

        t.queue_ok(1);
        let iso = registry.property("SonyIso").unwrap();
        vendor
            .set_override(&mut engine, iso, &Value::UINT32(800))
            .unwrap()
            .unwrap();

        t.queue_ok(2);
        let capture = registry.property("SonyCapture").unwrap();
        vendor
            .set_override(&mut engine, capture, &Value::UINT16(2))
            .unwrap()
            .unwrap();

        assert_eq!(t.sent_command_codes(), vec![0x1002, 0x9207, 0x9205]);
        // the data phases carry the encoded values
        let frames = t.sent();
        let iso_data = Container::parse(&frames[2]).unwrap();
        assert_eq!(iso_data.payload, vec![0x20, 0x03, 0x00, 0x00]);
        let capture_data = Container::parse(&frames[4]).unwrap();
        assert_eq!(capture_data.payload, vec![0x02, 0x00]);
    }

    #[test]
    fn standard_properties_take_the_standard_path() {
        let t = Arc::new(MockTransport::new());
        let mut engine = TransactionEngine::new(t.clone());
        let vendor = SonyVendor::new();
        let registry = Vendor::<MockTransport>::registry(&vendor);
        let prop = registry.property("ExposureIndex").unwrap();
        assert!(vendor.get_override(&mut engine, prop).is_none());
    }
}

mod canon {
    use super::*;

    fn prop_record(code: u32, value: u32) -> Vec<u8> {
        let mut buf = vec![];
        buf.write_ptp_u32(16).unwrap();
        buf.write_ptp_u32(0xC189).unwrap();
        buf.write_ptp_u32(code).unwrap();
        buf.write_ptp_u32(value).unwrap();
        buf
    }

    #[test]
    fn connect_hook_enters_remote_mode_and_primes_cache() {
        let t = Arc::new(MockTransport::new());
        let mut engine = open_engine(&t);
        for tid in 1..=2 {
            t.queue_ok(tid);
        }
        t.queue_data(0x9116, 3, prop_record(0xD103, 0x58));
        t.queue_ok(3);

        let vendor = CanonVendor::new();
        Vendor::<MockTransport>::connect_hook(&vendor, &mut engine).unwrap();

        assert_eq!(t.sent_command_codes(), vec![0x1002, 0x9114, 0x9115, 0x9116]);
        // the stream record landed in the cache, decoded through the
        // property's enum codec
        assert_eq!(vendor.cached(0xD103), Some(Value::NAME("ISO400".into())));
    }

    #[test]
    fn cache_only_get_serves_from_cache_without_wire_traffic() {
        let t = Arc::new(MockTransport::new());
        let mut engine = open_engine(&t);
        for tid in 1..=2 {
            t.queue_ok(tid);
        }
        t.queue_data(0x9116, 3, prop_record(0xD103, 0x58));
        t.queue_ok(3);
        let vendor = CanonVendor::new();
        Vendor::<MockTransport>::connect_hook(&vendor, &mut engine).unwrap();
        let sends = t.sent().len();

        let registry = Vendor::<MockTransport>::registry(&vendor);
        let prop = registry.property("CanonIso").unwrap();
        let value = vendor.get_override(&mut engine, prop).unwrap().unwrap();
        assert_eq!(value, Value::NAME("ISO400".into()));
        assert_eq!(t.sent().len(), sends);
    }

    #[test]
    fn request_and_wait_requests_then_drains() {
        let t = Arc::new(MockTransport::new());
        let mut engine = open_engine(&t);
        let vendor = CanonVendor::with_read_strategy(PropertyRead::RequestAndWait);
        let registry = Vendor::<MockTransport>::registry(&vendor);
        let prop = registry.property("CanonAperture").unwrap();

        t.queue_ok(1); // CanonRequestDevicePropValue
        t.queue_data(0x9116, 2, prop_record(0xD101, 0x20));
        t.queue_ok(2);

        let value = vendor.get_override(&mut engine, prop).unwrap().unwrap();
        assert_eq!(value, Value::UINT32(0x20));
        assert_eq!(t.sent_command_codes(), vec![0x1002, 0x9127, 0x9116]);
    }

    #[test]
    fn set_wraps_size_code_and_value_in_data_phase() {
        let t = Arc::new(MockTransport::new());
        let mut engine = open_engine(&t);
        let vendor = CanonVendor::new();
        let registry = Vendor::<MockTransport>::registry(&vendor);
        let prop = registry.property("CanonIso").unwrap();

        t.queue_ok(1);
        vendor
            .set_override(&mut engine, prop, &Value::NAME("ISO800".into()))
            .unwrap()
            .unwrap();

        let frames = t.sent();
        let data = Container::parse(frames.last().unwrap()).unwrap();
        assert_eq!(
            data.payload,
            vec![0x0C, 0x00, 0x00, 0x00, 0x03, 0xD1, 0x00, 0x00, 0x60, 0x00, 0x00, 0x00]
        );
        // the write is reflected locally without waiting for the stream
        assert_eq!(vendor.cached(0xD103), Some(Value::NAME("ISO800".into())));
    }

    #[test]
    fn poller_emits_camera_events() {
        let t = Arc::new(MockTransport::new());
        let engine = Arc::new(std::sync::Mutex::new(open_engine(&t)));
        let vendor = CanonVendor::new();

        // object added: handle 9, storage 0x10001
        let mut stream = vec![];
        stream.write_ptp_u32(16).unwrap();
        stream.write_ptp_u32(0xC181).unwrap();
        stream.write_ptp_u32(9).unwrap();
        stream.write_ptp_u32(0x10001).unwrap();
        t.queue_data(0x9116, 1, stream);
        t.queue_ok(1);

        let mut poll = vendor.poller(engine).unwrap();
        let events = poll();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].code, 0xC181);
        assert_eq!(events[0].name, Some("CanonObjectAddedEx"));
        assert_eq!(events[0].params, vec![9, 0x10001]);
    }
}

mod nikon {
    use super::*;

    #[test]
    fn connect_hook_reads_vendor_prop_codes() {
        let t = Arc::new(MockTransport::new());
        let mut engine = open_engine(&t);

        let mut codes = vec![];
        codes
            .write_ptp_vec(&[0xD1A2u16, 0xD1A3], |w, v| w.write_ptp_u16(*v))
            .unwrap();
        t.queue_data(0x90CA, 1, codes);
        t.queue_ok(1);

        let vendor = NikonVendor::new();
        Vendor::<MockTransport>::connect_hook(&vendor, &mut engine).unwrap();
        assert_eq!(t.sent_command_codes(), vec![0x1002, 0x90CA]);
    }

    #[test]
    fn wait_ready_retries_through_device_busy() {
        let t = Arc::new(MockTransport::new());
        let mut engine = open_engine(&t);
        let vendor = NikonVendor::new();

        t.queue_response(0x2019, 1, &[]);
        t.queue_ok(2);
        vendor.wait_ready(&mut engine).unwrap();
        assert_eq!(t.sent_command_codes(), vec![0x1002, 0x90C8, 0x90C8]);
    }

    #[test]
    fn check_event_decodes_through_registry() {
        let t = Arc::new(MockTransport::new());
        let mut engine = open_engine(&t);
        let vendor = NikonVendor::new();
        let registry = Vendor::<MockTransport>::registry(&vendor);

        let mut list = vec![];
        list.write_ptp_u16(1).unwrap();
        list.write_ptp_u16(0xC101).unwrap();
        list.write_ptp_u32(0xFFFF0001).unwrap();
        t.queue_data(0x90C2, 1, list);
        t.queue_ok(1);

        let def = registry.operation("NikonCheckEvent").unwrap();
        let done = engine
            .execute(def.code, &[], None, true, &CallOptions::default())
            .unwrap();
        let codec = registry.codec(def.data_codec.unwrap()).unwrap();
        let (value, _) = codec
            .decode(registry.as_ref(), &done.data.unwrap())
            .unwrap();
        match value {
            Value::RECORDS(records) => {
                assert_eq!(records[0].get("EventCode"), Some(&Value::UINT16(0xC101)));
                assert_eq!(records[0].get("Parameter"), Some(&Value::UINT32(0xFFFF0001)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

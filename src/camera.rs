//! The camera façade: registry + transaction engine + event pump wired
//! behind a typed API. One `Camera` owns one still-image interface; the
//! engine mutex is the per-session queue that keeps transactions whole
//! on the wire while the pump runs beside it.

use crate::dataset::{DeviceInfo, ObjectInfo, PropDesc, StorageInfo};
use crate::engine::{CallOptions, TransactionEngine};
use crate::error::{Error, ProtocolError, ValidationError};
use crate::event::{CameraEvent, EventPump, HandlerId, HandlerRegistry};
use crate::registry::{DataDirection, OperationDef, ParameterDef, Registry};
use crate::transport::Transport;
use crate::value::Value;
use crate::vendor::{EventSource, GenericVendor, Vendor};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Object downloads run long; callers may still override per call.
const OBJECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parent handle meaning "the store root" in GetObjectHandles.
const PARENT_ROOT: u32 = 0xFFFF_FFFF;

/// Data phase argument for [`Camera::send_with`]: caller-supplied bytes,
/// or a value encoded through the operation's data codec.
#[derive(Debug)]
pub enum DataArg<'a> {
    Bytes(&'a [u8]),
    Encoded(&'a Value),
}

/// A completed operation as the façade reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub response_code: u16,
    pub response_name: Option<&'static str>,
    /// Raw data phase bytes, when the operation has one.
    pub data: Option<Vec<u8>>,
    /// The data phase through the operation's data codec, when declared.
    pub decoded: Option<Value>,
    pub response_params: Vec<u32>,
}

pub struct Camera<T: Transport + 'static> {
    transport: Arc<T>,
    vendor: Arc<dyn Vendor<T>>,
    registry: Arc<Registry>,
    engine: Arc<Mutex<TransactionEngine<T>>>,
    handlers: Arc<Mutex<HandlerRegistry>>,
    pump: Option<EventPump>,
    connected: bool,
}

impl<T: Transport + 'static> Camera<T> {
    pub fn new(transport: T, vendor: Arc<dyn Vendor<T>>) -> Camera<T> {
        let transport = Arc::new(transport);
        let registry = vendor.registry();
        let engine = Arc::new(Mutex::new(TransactionEngine::new(transport.clone())));
        Camera {
            transport,
            vendor,
            registry,
            engine,
            handlers: Arc::new(Mutex::new(HandlerRegistry::new())),
            pump: None,
            connected: false,
        }
    }

    /// A camera with no vendor extension: the plain PTP registry.
    pub fn generic(transport: T) -> Camera<T> {
        Camera::new(transport, Arc::new(GenericVendor::new()))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn vendor_name(&self) -> &'static str {
        self.vendor.name()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Open the session, run the vendor handshake, start the event pump.
    pub fn connect(&mut self) -> Result<(), Error> {
        if self.connected {
            return Ok(());
        }
        {
            let mut engine = self.engine.lock().unwrap();
            let session_id = self.vendor.session_id();
            info!("{}: opening session {}", self.vendor.name(), session_id);
            self.send_locked(
                &mut engine,
                "OpenSession",
                &[Value::UINT32(session_id)],
                None,
                &CallOptions::default(),
            )?;
            self.vendor.connect_hook(&mut engine)?;
        }

        match self.vendor.event_source() {
            EventSource::Interrupt => {
                if self.transport.has_interrupt_endpoint() {
                    self.pump = Some(EventPump::spawn_interrupt(
                        self.transport.clone(),
                        self.registry.clone(),
                        self.handlers.clone(),
                        self.vendor.event_decoder(),
                    ));
                } else {
                    warn!("{}: no interrupt endpoint, events disabled", self.vendor.name());
                }
            }
            EventSource::Poll { interval } => {
                match self.vendor.poller(self.engine.clone()) {
                    Some(poll) => {
                        self.pump = Some(EventPump::spawn_polling(
                            interval,
                            poll,
                            self.handlers.clone(),
                        ));
                    }
                    None => warn!("{}: polling source without a poller", self.vendor.name()),
                }
            }
        }
        self.connected = true;
        Ok(())
    }

    /// Stop the pump, run the vendor teardown, close the session, release
    /// the transport. Handler registrations do not survive the session.
    pub fn disconnect(&mut self) -> Result<(), Error> {
        if !self.connected {
            return Ok(());
        }
        if let Some(mut pump) = self.pump.take() {
            pump.stop(self.transport.as_ref());
        }
        {
            let mut engine = self.engine.lock().unwrap();
            self.vendor.disconnect_hook(&mut engine)?;
            self.send_locked(&mut engine, "CloseSession", &[], None, &CallOptions::default())?;
        }
        self.transport.disconnect()?;
        self.handlers.lock().unwrap().clear();
        self.connected = false;
        info!("{}: disconnected", self.vendor.name());
        Ok(())
    }

    /// Run a registry operation by name. Parameters are validated against
    /// the declaration: count, requiredness, and per-parameter codecs
    /// (symbolic enum members included).
    pub fn send(&self, op: &str, args: &[Value]) -> Result<Outcome, Error> {
        self.send_with(op, args, None, CallOptions::default())
    }

    pub fn send_with(
        &self,
        op: &str,
        args: &[Value],
        data: Option<DataArg<'_>>,
        opts: CallOptions,
    ) -> Result<Outcome, Error> {
        let mut engine = self.engine.lock().unwrap();
        self.send_locked(&mut engine, op, args, data, &opts)
    }

    fn send_locked(
        &self,
        engine: &mut TransactionEngine<T>,
        op: &str,
        args: &[Value],
        data: Option<DataArg<'_>>,
        opts: &CallOptions,
    ) -> Result<Outcome, Error> {
        let registry = self.registry.as_ref();
        let def = registry
            .operation(op)
            .ok_or_else(|| ValidationError::UnknownOperation(op.to_owned()))?;
        let params = pack_params(registry, def, args)?;

        let payload = match (def.direction, data) {
            (DataDirection::None, None) | (DataDirection::Out, None) => None,
            (DataDirection::None, Some(_)) | (DataDirection::Out, Some(_)) => {
                return Err(ValidationError::UnexpectedDataPhase(def.name).into())
            }
            (DataDirection::In, None) => {
                return Err(ValidationError::MissingDataPhase(def.name).into())
            }
            (DataDirection::In, Some(DataArg::Bytes(bytes))) => Some(bytes.to_vec()),
            (DataDirection::In, Some(DataArg::Encoded(value))) => {
                let handle = def.data_codec.ok_or(ValidationError::TypeMismatch {
                    codec: "data",
                    got: "typed value on an operation without a data codec",
                })?;
                let codec = registry
                    .codec(handle)
                    .ok_or_else(|| ValidationError::UnknownCodec(handle.to_owned()))?;
                Some(codec.encode(registry, value)?)
            }
        };

        let done = engine.execute(
            def.code,
            &params,
            payload.as_deref(),
            def.direction == DataDirection::Out,
            opts,
        )?;

        let decoded = match (def.direction, def.data_codec, &done.data) {
            (DataDirection::Out, Some(handle), Some(bytes)) => {
                let codec = registry
                    .codec(handle)
                    .ok_or_else(|| ValidationError::UnknownCodec(handle.to_owned()))?;
                Some(codec.decode(registry, bytes)?.0)
            }
            _ => None,
        };

        Ok(Outcome {
            response_code: done.response_code,
            response_name: registry
                .response_by_code(done.response_code)
                .map(|r| r.name),
            data: done.data,
            decoded,
            response_params: done.response_params,
        })
    }

    /// Read a property through its codec, honoring the vendor's read
    /// path when it has one.
    pub fn get(&self, prop: &str) -> Result<Value, Error> {
        let def = self
            .registry
            .property(prop)
            .ok_or_else(|| ValidationError::UnknownProperty(prop.to_owned()))?;
        let mut engine = self.engine.lock().unwrap();
        if let Some(result) = self.vendor.get_override(&mut engine, def) {
            return result;
        }
        let out = self.send_locked(
            &mut engine,
            "GetDevicePropValue",
            &[Value::UINT16(def.code)],
            None,
            &CallOptions::default(),
        )?;
        let bytes = out
            .data
            .ok_or(ProtocolError::ShortRead { wanted: 1, got: 0 })?;
        let codec = self
            .registry
            .codec(def.codec)
            .ok_or_else(|| ValidationError::UnknownCodec(def.codec.to_owned()))?;
        Ok(codec.decode(self.registry.as_ref(), &bytes)?.0)
    }

    /// Write a property through its codec. Read-only properties fail
    /// locally.
    pub fn set(&self, prop: &str, value: &Value) -> Result<(), Error> {
        let def = self
            .registry
            .property(prop)
            .ok_or_else(|| ValidationError::UnknownProperty(prop.to_owned()))?;
        if !def.access.writable() {
            return Err(ValidationError::NotWritable(def.name).into());
        }
        let mut engine = self.engine.lock().unwrap();
        if let Some(result) = self.vendor.set_override(&mut engine, def, value) {
            return result;
        }
        let codec = self
            .registry
            .codec(def.codec)
            .ok_or_else(|| ValidationError::UnknownCodec(def.codec.to_owned()))?;
        let bytes = codec.encode(self.registry.as_ref(), value)?;
        self.send_locked(
            &mut engine,
            "SetDevicePropValue",
            &[Value::UINT16(def.code)],
            Some(DataArg::Bytes(&bytes)),
            &CallOptions::default(),
        )?;
        Ok(())
    }

    /// The full descriptor: current, default, and the range/enum form.
    pub fn get_descriptor(&self, prop: &str) -> Result<PropDesc, Error> {
        let def = self
            .registry
            .property(prop)
            .ok_or_else(|| ValidationError::UnknownProperty(prop.to_owned()))?;
        let out = self.send("GetDevicePropDesc", &[Value::UINT16(def.code)])?;
        let bytes = out
            .data
            .ok_or(ProtocolError::ShortRead { wanted: 1, got: 0 })?;
        PropDesc::decode(&bytes)
    }

    /// Register a handler for an event by symbolic name (`"*"` for all).
    /// Handlers run on the pump thread and must not block or reenter
    /// `send`.
    pub fn on(
        &self,
        event: &str,
        handler: impl Fn(&CameraEvent) + Send + Sync + 'static,
    ) -> Result<HandlerId, Error> {
        if event != "*" && self.registry.event(event).is_none() {
            return Err(ValidationError::UnknownEvent(event.to_owned()).into());
        }
        Ok(self.handlers.lock().unwrap().add(event, Box::new(handler)))
    }

    pub fn off(&self, id: HandlerId) -> bool {
        self.handlers.lock().unwrap().remove(id)
    }

    // --- convenience surface ---

    pub fn device_info(&self) -> Result<DeviceInfo, Error> {
        let out = self.send("GetDeviceInfo", &[])?;
        let value = out
            .decoded
            .ok_or(ProtocolError::ShortRead { wanted: 1, got: 0 })?;
        DeviceInfo::from_record(
            value
                .as_record()
                .ok_or(ProtocolError::MalformedDataset("DeviceInfo"))?,
        )
    }

    pub fn storage_ids(&self) -> Result<Vec<u32>, Error> {
        let out = self.send("GetStorageIDs", &[])?;
        match out.decoded {
            Some(Value::AUINT32(ids)) => Ok(ids),
            _ => Err(ProtocolError::MalformedDataset("StorageIDs").into()),
        }
    }

    pub fn storage_info(&self, storage_id: u32) -> Result<StorageInfo, Error> {
        let out = self.send("GetStorageInfo", &[Value::UINT32(storage_id)])?;
        let value = out
            .decoded
            .ok_or(ProtocolError::ShortRead { wanted: 1, got: 0 })?;
        StorageInfo::from_record(
            value
                .as_record()
                .ok_or(ProtocolError::MalformedDataset("StorageInfo"))?,
        )
    }

    pub fn num_objects(
        &self,
        storage_id: u32,
        format: Option<u16>,
        parent: Option<u32>,
    ) -> Result<u32, Error> {
        let out = self.send(
            "GetNumObjects",
            &[
                Value::UINT32(storage_id),
                Value::UINT16(format.unwrap_or(0)),
                Value::UINT32(parent.unwrap_or(0)),
            ],
        )?;
        out.response_params
            .first()
            .copied()
            .ok_or_else(|| ProtocolError::ShortRead { wanted: 4, got: 0 }.into())
    }

    pub fn object_handles(
        &self,
        storage_id: u32,
        format: Option<u16>,
        parent: Option<u32>,
    ) -> Result<Vec<u32>, Error> {
        let out = self.send(
            "GetObjectHandles",
            &[
                Value::UINT32(storage_id),
                Value::UINT16(format.unwrap_or(0)),
                Value::UINT32(parent.unwrap_or(0)),
            ],
        )?;
        match out.decoded {
            Some(Value::AUINT32(handles)) => Ok(handles),
            _ => Err(ProtocolError::MalformedDataset("ObjectHandles").into()),
        }
    }

    /// Handles directly below the store root.
    pub fn object_handles_root(
        &self,
        storage_id: u32,
        format: Option<u16>,
    ) -> Result<Vec<u32>, Error> {
        self.object_handles(storage_id, format, Some(PARENT_ROOT))
    }

    /// Every handle in the store regardless of hierarchy.
    pub fn object_handles_all(
        &self,
        storage_id: u32,
        format: Option<u16>,
    ) -> Result<Vec<u32>, Error> {
        self.object_handles(storage_id, format, None)
    }

    pub fn object_info(&self, handle: u32) -> Result<ObjectInfo, Error> {
        let out = self.send("GetObjectInfo", &[Value::UINT32(handle)])?;
        let value = out
            .decoded
            .ok_or(ProtocolError::ShortRead { wanted: 1, got: 0 })?;
        ObjectInfo::from_record(
            value
                .as_record()
                .ok_or(ProtocolError::MalformedDataset("ObjectInfo"))?,
        )
    }

    pub fn object(&self, handle: u32, timeout: Option<Duration>) -> Result<Vec<u8>, Error> {
        let opts = CallOptions::timeout(timeout.unwrap_or(OBJECT_TIMEOUT));
        let out = self.send_with("GetObject", &[Value::UINT32(handle)], None, opts)?;
        Ok(out.data.unwrap_or_default())
    }

    /// Byte range of one object. PTP carries the offset in a 32-bit
    /// parameter slot, so larger offsets never reach the wire.
    pub fn partial_object(
        &self,
        handle: u32,
        offset: u64,
        max_bytes: u32,
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>, Error> {
        if offset >= u64::from(u32::MAX) {
            return Err(ValidationError::OffsetOutOfRange(offset).into());
        }
        let opts = CallOptions::timeout(timeout.unwrap_or(OBJECT_TIMEOUT));
        let out = self.send_with(
            "GetPartialObject",
            &[
                Value::UINT32(handle),
                Value::UINT32(offset as u32),
                Value::UINT32(max_bytes),
            ],
            None,
            opts,
        )?;
        Ok(out.data.unwrap_or_default())
    }

    pub fn thumb(&self, handle: u32) -> Result<Vec<u8>, Error> {
        let out = self.send("GetThumb", &[Value::UINT32(handle)])?;
        Ok(out.data.unwrap_or_default())
    }

    pub fn delete_object(&self, handle: u32) -> Result<(), Error> {
        self.send("DeleteObject", &[Value::UINT32(handle)])?;
        Ok(())
    }

    pub fn capture(&self) -> Result<(), Error> {
        self.send("InitiateCapture", &[])?;
        Ok(())
    }

    pub fn power_down(&self) -> Result<(), Error> {
        self.send("PowerDown", &[])?;
        Ok(())
    }

    /// The store's object hierarchy, associations expanded.
    pub fn object_tree(&self, storage_id: u32) -> Result<Vec<ObjectTree>, Error> {
        self.tree_below(storage_id, PARENT_ROOT)
    }

    fn tree_below(&self, storage_id: u32, parent: u32) -> Result<Vec<ObjectTree>, Error> {
        let handles = self.object_handles(storage_id, None, Some(parent))?;
        let mut nodes = Vec::with_capacity(handles.len());
        for handle in handles {
            let info = self.object_info(handle)?;
            let children = if info.is_association() {
                Some(self.tree_below(storage_id, handle)?)
            } else {
                None
            };
            nodes.push(ObjectTree {
                handle,
                info,
                children,
            });
        }
        Ok(nodes)
    }
}

impl<T: Transport + 'static> Drop for Camera<T> {
    fn drop(&mut self) {
        if let Some(mut pump) = self.pump.take() {
            pump.stop(self.transport.as_ref());
        }
    }
}

/// Serialize call arguments into COMMAND parameter slots against the
/// operation's declaration.
fn pack_params(
    registry: &Registry,
    def: &OperationDef,
    args: &[Value],
) -> Result<Vec<u32>, Error> {
    if args.len() > def.params.len() {
        return Err(ValidationError::TooManyParameters {
            max: def.params.len(),
            got: args.len(),
        }
        .into());
    }
    let mut slots = Vec::with_capacity(def.params.len());
    for (i, pdef) in def.params.iter().enumerate() {
        match args.get(i) {
            Some(value) => slots.push(encode_slot(registry, pdef, value)?),
            None if pdef.required => {
                return Err(ValidationError::MissingParameter(pdef.name).into())
            }
            None => slots.push(pdef.default.unwrap_or(0)),
        }
    }
    Ok(slots)
}

/// One parameter through its codec, zero-extended into the u32 slot.
fn encode_slot(registry: &Registry, pdef: &ParameterDef, value: &Value) -> Result<u32, Error> {
    let codec = registry
        .codec(pdef.codec)
        .ok_or_else(|| ValidationError::UnknownCodec(pdef.codec.to_owned()))?;
    let bytes = codec.encode(registry, value)?;
    if bytes.len() > 4 {
        return Err(ValidationError::TypeMismatch {
            codec: pdef.codec,
            got: "value wider than a parameter slot",
        }
        .into());
    }
    let mut slot = [0u8; 4];
    slot[..bytes.len()].copy_from_slice(&bytes);
    Ok(u32::from_le_bytes(slot))
}

/// One node of a store hierarchy listing.
#[derive(Debug, Clone)]
pub struct ObjectTree {
    pub handle: u32,
    pub info: ObjectInfo,
    pub children: Option<Vec<ObjectTree>>,
}

impl ObjectTree {
    /// Flatten to `(path, node)` pairs, breadth-first.
    pub fn walk(&self) -> Vec<(String, ObjectTree)> {
        let mut input = vec![("".to_owned(), self.clone())];
        let mut output = vec![];

        while !input.is_empty() {
            for (prefix, item) in input.split_off(0) {
                let path = prefix.clone()
                    + (if prefix.is_empty() { "" } else { "/" })
                    + &item.info.Filename;

                output.push((path.clone(), item.clone()));

                if let Some(children) = item.children {
                    input.extend(children.into_iter().map(|x| (path.clone(), x)));
                }
            }
        }

        output
    }
}

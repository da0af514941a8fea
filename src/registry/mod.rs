//! Definition registries. A registry is an immutable bundle of operation,
//! property, event, response, and codec definitions for one camera class.
//! Vendor registries chain to the generic registry through `parent`;
//! lookups consult the child first, by symbolic name and by numeric code,
//! so vendor entries shadow generic ones.

mod standard;

pub use standard::standard;

use crate::codec::{Codec, CodecHandle, CodecResolver};
use crate::container::MAX_PARAMS;
use crate::error::{Error, ValidationError};
use std::collections::HashMap;
use std::sync::Arc;

/// Direction of the optional data phase. `In` means the host transmits a
/// DATA container after the COMMAND; `Out` means the device does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirection {
    None,
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Get,
    Set,
    GetSet,
}

impl Access {
    pub fn writable(self) -> bool {
        !matches!(self, Access::Get)
    }
}

/// One operation/event parameter or response parameter.
#[derive(Debug, Clone)]
pub struct ParameterDef {
    pub name: &'static str,
    pub codec: CodecHandle,
    pub required: bool,
    /// Slot value substituted when an optional parameter is omitted.
    pub default: Option<u32>,
}

impl ParameterDef {
    pub fn required(name: &'static str, codec: CodecHandle) -> ParameterDef {
        ParameterDef {
            name,
            codec,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &'static str, codec: CodecHandle) -> ParameterDef {
        ParameterDef {
            name,
            codec,
            required: false,
            default: Some(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OperationDef {
    pub code: u16,
    pub name: &'static str,
    pub description: &'static str,
    pub direction: DataDirection,
    pub params: Vec<ParameterDef>,
    pub response_params: Vec<ParameterDef>,
    /// Codec for the data phase payload, when it has a declared shape.
    pub data_codec: Option<CodecHandle>,
}

#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub code: u16,
    pub name: &'static str,
    pub description: &'static str,
    pub datatype: u16,
    pub codec: CodecHandle,
    pub access: Access,
}

#[derive(Debug, Clone)]
pub struct EventDef {
    pub code: u16,
    pub name: &'static str,
    pub params: Vec<ParameterDef>,
}

#[derive(Debug, Clone)]
pub struct ResponseDef {
    pub code: u16,
    pub name: &'static str,
    pub description: &'static str,
    /// Whether retrying the operation can reasonably succeed.
    pub recoverable: bool,
}

/// Registry-wide wire configuration. USB transports are little-endian by
/// mandate; the flag exists so a PTP/IP registry can differ.
#[derive(Debug, Clone, Copy)]
pub struct RegistryConfig {
    pub little_endian: bool,
    pub strict_strings: bool,
}

impl Default for RegistryConfig {
    fn default() -> RegistryConfig {
        RegistryConfig {
            little_endian: true,
            strict_strings: false,
        }
    }
}

pub struct Registry {
    name: &'static str,
    config: RegistryConfig,
    parent: Option<Arc<Registry>>,
    operations: HashMap<&'static str, Arc<OperationDef>>,
    operations_by_code: HashMap<u16, Arc<OperationDef>>,
    properties: HashMap<&'static str, Arc<PropertyDef>>,
    properties_by_code: HashMap<u16, Arc<PropertyDef>>,
    events: HashMap<&'static str, Arc<EventDef>>,
    events_by_code: HashMap<u16, Arc<EventDef>>,
    responses: HashMap<&'static str, Arc<ResponseDef>>,
    responses_by_code: HashMap<u16, Arc<ResponseDef>>,
    codecs: HashMap<&'static str, Arc<Codec>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("operations", &self.operations.len())
            .field("properties", &self.properties.len())
            .field("events", &self.events.len())
            .field("parent", &self.parent.as_ref().map(|p| p.name))
            .finish()
    }
}

impl Registry {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config(&self) -> RegistryConfig {
        self.config
    }

    pub fn operation(&self, name: &str) -> Option<&OperationDef> {
        match self.operations.get(name) {
            Some(def) => Some(def),
            None => self.parent.as_ref().and_then(|p| p.operation(name)),
        }
    }

    pub fn operation_by_code(&self, code: u16) -> Option<&OperationDef> {
        match self.operations_by_code.get(&code) {
            Some(def) => Some(def),
            None => self.parent.as_ref().and_then(|p| p.operation_by_code(code)),
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        match self.properties.get(name) {
            Some(def) => Some(def),
            None => self.parent.as_ref().and_then(|p| p.property(name)),
        }
    }

    pub fn property_by_code(&self, code: u16) -> Option<&PropertyDef> {
        match self.properties_by_code.get(&code) {
            Some(def) => Some(def),
            None => self.parent.as_ref().and_then(|p| p.property_by_code(code)),
        }
    }

    pub fn event(&self, name: &str) -> Option<&EventDef> {
        match self.events.get(name) {
            Some(def) => Some(def),
            None => self.parent.as_ref().and_then(|p| p.event(name)),
        }
    }

    pub fn event_by_code(&self, code: u16) -> Option<&EventDef> {
        match self.events_by_code.get(&code) {
            Some(def) => Some(def),
            None => self.parent.as_ref().and_then(|p| p.event_by_code(code)),
        }
    }

    pub fn response(&self, name: &str) -> Option<&ResponseDef> {
        match self.responses.get(name) {
            Some(def) => Some(def),
            None => self.parent.as_ref().and_then(|p| p.response(name)),
        }
    }

    pub fn response_by_code(&self, code: u16) -> Option<&ResponseDef> {
        match self.responses_by_code.get(&code) {
            Some(def) => Some(def),
            None => self.parent.as_ref().and_then(|p| p.response_by_code(code)),
        }
    }

    pub fn codec(&self, handle: &str) -> Option<&Codec> {
        match self.codecs.get(handle) {
            Some(codec) => Some(codec),
            None => self.parent.as_ref().and_then(|p| p.codec(handle)),
        }
    }

    /// Whether a non-OK response is worth retrying, per its definition.
    pub fn recoverable(&self, code: u16) -> bool {
        self.response_by_code(code).map_or(false, |r| r.recoverable)
    }
}

impl CodecResolver for Registry {
    fn resolve(&self, handle: &str) -> Option<&Codec> {
        self.codec(handle)
    }

    fn strict_strings(&self) -> bool {
        self.config.strict_strings
    }
}

/// Accumulates definitions, then validates the bundle as a whole:
/// every referenced codec handle must resolve and no operation or event
/// may declare more than five parameter slots.
pub struct RegistryBuilder {
    name: &'static str,
    config: RegistryConfig,
    parent: Option<Arc<Registry>>,
    operations: Vec<OperationDef>,
    properties: Vec<PropertyDef>,
    events: Vec<EventDef>,
    responses: Vec<ResponseDef>,
    codecs: Vec<(&'static str, Codec)>,
}

impl RegistryBuilder {
    pub fn new(name: &'static str) -> RegistryBuilder {
        RegistryBuilder {
            name,
            config: RegistryConfig::default(),
            parent: None,
            operations: vec![],
            properties: vec![],
            events: vec![],
            responses: vec![],
            codecs: vec![],
        }
    }

    /// A vendor registry: every generic symbol stays reachable, vendor
    /// additions shadow by name and by code.
    pub fn extending(name: &'static str, parent: Arc<Registry>) -> RegistryBuilder {
        let mut builder = RegistryBuilder::new(name);
        builder.config = parent.config;
        builder.parent = Some(parent);
        builder
    }

    pub fn config(mut self, config: RegistryConfig) -> RegistryBuilder {
        self.config = config;
        self
    }

    pub fn codec(mut self, handle: &'static str, codec: Codec) -> RegistryBuilder {
        self.codecs.push((handle, codec));
        self
    }

    pub fn operation(mut self, def: OperationDef) -> RegistryBuilder {
        self.operations.push(def);
        self
    }

    pub fn property(mut self, def: PropertyDef) -> RegistryBuilder {
        self.properties.push(def);
        self
    }

    pub fn event(mut self, def: EventDef) -> RegistryBuilder {
        self.events.push(def);
        self
    }

    pub fn response(mut self, def: ResponseDef) -> RegistryBuilder {
        self.responses.push(def);
        self
    }

    pub fn build(self) -> Result<Arc<Registry>, Error> {
        let mut registry = Registry {
            name: self.name,
            config: self.config,
            parent: self.parent,
            operations: HashMap::new(),
            operations_by_code: HashMap::new(),
            properties: HashMap::new(),
            properties_by_code: HashMap::new(),
            events: HashMap::new(),
            events_by_code: HashMap::new(),
            responses: HashMap::new(),
            responses_by_code: HashMap::new(),
            codecs: HashMap::new(),
        };

        for (handle, codec) in self.codecs {
            registry.codecs.insert(handle, Arc::new(codec));
        }

        // Codecs may reference each other and definitions reference
        // codecs, so handle checks run after the pool is populated.
        let handles: Vec<&'static str> = registry.codecs.keys().copied().collect();
        for handle in handles {
            let codec = registry.codecs[handle].clone();
            check_codec_refs(&registry, &codec)?;
        }

        for def in self.operations {
            if def.params.len() > MAX_PARAMS {
                return Err(ValidationError::TooManyParameters {
                    max: MAX_PARAMS,
                    got: def.params.len(),
                }
                .into());
            }
            if def.response_params.len() > MAX_PARAMS {
                return Err(ValidationError::TooManyParameters {
                    max: MAX_PARAMS,
                    got: def.response_params.len(),
                }
                .into());
            }
            for p in def.params.iter().chain(def.response_params.iter()) {
                check_handle(&registry, p.codec)?;
            }
            if let Some(handle) = def.data_codec {
                check_handle(&registry, handle)?;
            }
            let def = Arc::new(def);
            registry.operations.insert(def.name, def.clone());
            registry.operations_by_code.insert(def.code, def);
        }

        for def in self.properties {
            check_handle(&registry, def.codec)?;
            let def = Arc::new(def);
            registry.properties.insert(def.name, def.clone());
            registry.properties_by_code.insert(def.code, def);
        }

        for def in self.events {
            if def.params.len() > MAX_PARAMS {
                return Err(ValidationError::TooManyParameters {
                    max: MAX_PARAMS,
                    got: def.params.len(),
                }
                .into());
            }
            for p in &def.params {
                check_handle(&registry, p.codec)?;
            }
            let def = Arc::new(def);
            registry.events.insert(def.name, def.clone());
            registry.events_by_code.insert(def.code, def);
        }

        for def in self.responses {
            let def = Arc::new(def);
            registry.responses.insert(def.name, def.clone());
            registry.responses_by_code.insert(def.code, def);
        }

        Ok(Arc::new(registry))
    }
}

fn check_handle(registry: &Registry, handle: &str) -> Result<(), Error> {
    if registry.codec(handle).is_none() {
        return Err(ValidationError::UnknownCodec(handle.to_owned()).into());
    }
    Ok(())
}

fn check_codec_refs(registry: &Registry, codec: &Codec) -> Result<(), Error> {
    match codec {
        Codec::Primitive(_) | Codec::Custom(_) => Ok(()),
        Codec::Array(inner) => check_handle(registry, inner),
        Codec::Enum(e) => check_handle(registry, e.base),
        Codec::Dataset(fields) => {
            for f in fields {
                check_handle(registry, f.codec)?;
            }
            Ok(())
        }
    }
}

//! Typed views over decoded datasets, plus the property descriptor
//! decoder, whose payload shape depends on its own datatype field and so
//! cannot be a declarative dataset codec. Field names follow the PIMA
//! 15740 dataset tables.

use crate::error::{Error, ProtocolError};
use crate::read::PtpRead;
use crate::value::{Record, Value};
use std::io::Cursor;

fn u16_field(rec: &Record, name: &'static str) -> Result<u16, Error> {
    match rec.get(name) {
        Some(Value::UINT16(v)) => Ok(*v),
        _ => Err(ProtocolError::MalformedDataset(name).into()),
    }
}

fn u32_field(rec: &Record, name: &'static str) -> Result<u32, Error> {
    match rec.get(name) {
        Some(Value::UINT32(v)) => Ok(*v),
        _ => Err(ProtocolError::MalformedDataset(name).into()),
    }
}

fn u64_field(rec: &Record, name: &'static str) -> Result<u64, Error> {
    match rec.get(name) {
        Some(Value::UINT64(v)) => Ok(*v),
        _ => Err(ProtocolError::MalformedDataset(name).into()),
    }
}

fn str_field(rec: &Record, name: &'static str) -> Result<String, Error> {
    match rec.get(name) {
        Some(Value::STR(v)) => Ok(v.clone()),
        _ => Err(ProtocolError::MalformedDataset(name).into()),
    }
}

fn u16_vec_field(rec: &Record, name: &'static str) -> Result<Vec<u16>, Error> {
    match rec.get(name) {
        Some(Value::AUINT16(v)) => Ok(v.clone()),
        _ => Err(ProtocolError::MalformedDataset(name).into()),
    }
}

#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub StandardVersion: u16,
    pub VendorExtensionID: u32,
    pub VendorExtensionVersion: u16,
    pub VendorExtensionDesc: String,
    pub FunctionalMode: u16,
    pub OperationsSupported: Vec<u16>,
    pub EventsSupported: Vec<u16>,
    pub DevicePropertiesSupported: Vec<u16>,
    pub CaptureFormats: Vec<u16>,
    pub ImageFormats: Vec<u16>,
    pub Manufacturer: String,
    pub Model: String,
    pub DeviceVersion: String,
    pub SerialNumber: String,
}

impl DeviceInfo {
    pub fn from_record(rec: &Record) -> Result<DeviceInfo, Error> {
        Ok(DeviceInfo {
            StandardVersion: u16_field(rec, "StandardVersion")?,
            VendorExtensionID: u32_field(rec, "VendorExtensionID")?,
            VendorExtensionVersion: u16_field(rec, "VendorExtensionVersion")?,
            VendorExtensionDesc: str_field(rec, "VendorExtensionDesc")?,
            FunctionalMode: u16_field(rec, "FunctionalMode")?,
            OperationsSupported: u16_vec_field(rec, "OperationsSupported")?,
            EventsSupported: u16_vec_field(rec, "EventsSupported")?,
            DevicePropertiesSupported: u16_vec_field(rec, "DevicePropertiesSupported")?,
            CaptureFormats: u16_vec_field(rec, "CaptureFormats")?,
            ImageFormats: u16_vec_field(rec, "ImageFormats")?,
            Manufacturer: str_field(rec, "Manufacturer")?,
            Model: str_field(rec, "Model")?,
            DeviceVersion: str_field(rec, "DeviceVersion")?,
            // absent on cameras that withhold it until a session opens
            SerialNumber: str_field(rec, "SerialNumber").unwrap_or_default(),
        })
    }

    pub fn supports_operation(&self, code: u16) -> bool {
        self.OperationsSupported.contains(&code)
    }

    pub fn supports_property(&self, code: u16) -> bool {
        self.DevicePropertiesSupported.contains(&code)
    }
}

#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq)]
pub struct StorageInfo {
    pub StorageType: u16,
    pub FilesystemType: u16,
    pub AccessCapability: u16,
    pub MaxCapacity: u64,
    pub FreeSpaceInBytes: u64,
    pub FreeSpaceInImages: u32,
    pub StorageDescription: String,
    pub VolumeLabel: String,
}

impl StorageInfo {
    pub fn from_record(rec: &Record) -> Result<StorageInfo, Error> {
        Ok(StorageInfo {
            StorageType: u16_field(rec, "StorageType")?,
            FilesystemType: u16_field(rec, "FilesystemType")?,
            AccessCapability: u16_field(rec, "AccessCapability")?,
            MaxCapacity: u64_field(rec, "MaxCapacity")?,
            FreeSpaceInBytes: u64_field(rec, "FreeSpaceInBytes")?,
            FreeSpaceInImages: u32_field(rec, "FreeSpaceInImages")?,
            StorageDescription: str_field(rec, "StorageDescription")?,
            VolumeLabel: str_field(rec, "VolumeLabel")?,
        })
    }
}

#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub StorageID: u32,
    pub ObjectFormat: u16,
    pub ProtectionStatus: u16,
    pub ObjectCompressedSize: u32,
    pub ThumbFormat: u16,
    pub ThumbCompressedSize: u32,
    pub ThumbPixWidth: u32,
    pub ThumbPixHeight: u32,
    pub ImagePixWidth: u32,
    pub ImagePixHeight: u32,
    pub ImageBitDepth: u32,
    pub ParentObject: u32,
    pub AssociationType: u16,
    pub AssociationDesc: u32,
    pub SequenceNumber: u32,
    pub Filename: String,
    pub CaptureDate: String,
    pub ModificationDate: String,
    pub Keywords: String,
}

/// ObjectFormatCode for associations (folders).
pub const OBJECT_FORMAT_ASSOCIATION: u16 = 0x3001;

impl ObjectInfo {
    pub fn from_record(rec: &Record) -> Result<ObjectInfo, Error> {
        Ok(ObjectInfo {
            StorageID: u32_field(rec, "StorageID")?,
            ObjectFormat: u16_field(rec, "ObjectFormat")?,
            ProtectionStatus: u16_field(rec, "ProtectionStatus")?,
            ObjectCompressedSize: u32_field(rec, "ObjectCompressedSize")?,
            ThumbFormat: u16_field(rec, "ThumbFormat")?,
            ThumbCompressedSize: u32_field(rec, "ThumbCompressedSize")?,
            ThumbPixWidth: u32_field(rec, "ThumbPixWidth")?,
            ThumbPixHeight: u32_field(rec, "ThumbPixHeight")?,
            ImagePixWidth: u32_field(rec, "ImagePixWidth")?,
            ImagePixHeight: u32_field(rec, "ImagePixHeight")?,
            ImageBitDepth: u32_field(rec, "ImageBitDepth")?,
            ParentObject: u32_field(rec, "ParentObject")?,
            AssociationType: u16_field(rec, "AssociationType")?,
            AssociationDesc: u32_field(rec, "AssociationDesc")?,
            SequenceNumber: u32_field(rec, "SequenceNumber")?,
            Filename: str_field(rec, "Filename")?,
            CaptureDate: str_field(rec, "CaptureDate")?,
            ModificationDate: str_field(rec, "ModificationDate")?,
            Keywords: str_field(rec, "Keywords")?,
        })
    }

    /// The inverse view, for SendObjectInfo's outgoing data phase.
    pub fn to_record(&self) -> Record {
        let mut rec = Record::new();
        rec.push("StorageID", Value::UINT32(self.StorageID));
        rec.push("ObjectFormat", Value::UINT16(self.ObjectFormat));
        rec.push("ProtectionStatus", Value::UINT16(self.ProtectionStatus));
        rec.push("ObjectCompressedSize", Value::UINT32(self.ObjectCompressedSize));
        rec.push("ThumbFormat", Value::UINT16(self.ThumbFormat));
        rec.push("ThumbCompressedSize", Value::UINT32(self.ThumbCompressedSize));
        rec.push("ThumbPixWidth", Value::UINT32(self.ThumbPixWidth));
        rec.push("ThumbPixHeight", Value::UINT32(self.ThumbPixHeight));
        rec.push("ImagePixWidth", Value::UINT32(self.ImagePixWidth));
        rec.push("ImagePixHeight", Value::UINT32(self.ImagePixHeight));
        rec.push("ImageBitDepth", Value::UINT32(self.ImageBitDepth));
        rec.push("ParentObject", Value::UINT32(self.ParentObject));
        rec.push("AssociationType", Value::UINT16(self.AssociationType));
        rec.push("AssociationDesc", Value::UINT32(self.AssociationDesc));
        rec.push("SequenceNumber", Value::UINT32(self.SequenceNumber));
        rec.push("Filename", Value::STR(self.Filename.clone()));
        rec.push("CaptureDate", Value::STR(self.CaptureDate.clone()));
        rec.push("ModificationDate", Value::STR(self.ModificationDate.clone()));
        rec.push("Keywords", Value::STR(self.Keywords.clone()));
        rec
    }

    pub fn is_association(&self) -> bool {
        self.ObjectFormat == OBJECT_FORMAT_ASSOCIATION
    }
}

/// Constraint form at the tail of a property descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum FormData {
    None,
    Range {
        min_value: Value,
        max_value: Value,
        step: Value,
    },
    Enumeration {
        values: Vec<Value>,
    },
}

/// A decoded GetDevicePropDesc payload. The default/current/form values
/// are typed by the descriptor's own datatype field, so this decodes
/// dynamically rather than through a dataset codec.
#[derive(Debug, Clone, PartialEq)]
pub struct PropDesc {
    pub property_code: u16,
    pub data_type: u16,
    /// 0x00 read-only, 0x01 read-write.
    pub get_set: u8,
    pub factory_default: Value,
    pub current: Value,
    pub form: FormData,
}

pub const GET_SET_READ_ONLY: u8 = 0x00;
pub const GET_SET_READ_WRITE: u8 = 0x01;

impl PropDesc {
    pub fn decode(buf: &[u8]) -> Result<PropDesc, Error> {
        let mut cur = Cursor::new(buf);
        PropDesc::read(&mut cur)
    }

    pub fn read<T: PtpRead>(cur: &mut T) -> Result<PropDesc, Error> {
        let property_code = cur.read_ptp_u16()?;
        let data_type = cur.read_ptp_u16()?;
        let get_set = cur.read_ptp_u8()?;
        Ok(PropDesc {
            property_code,
            data_type,
            get_set,
            factory_default: Value::read_type(data_type, cur)?,
            current: Value::read_type(data_type, cur)?,
            form: FormData::read(data_type, cur)?,
        })
    }

    pub fn writable(&self) -> bool {
        self.get_set == GET_SET_READ_WRITE
    }
}

impl FormData {
    pub fn read<T: PtpRead>(data_type: u16, cur: &mut T) -> Result<FormData, Error> {
        Ok(match cur.read_ptp_u8()? {
            0x01 => FormData::Range {
                min_value: Value::read_type(data_type, cur)?,
                max_value: Value::read_type(data_type, cur)?,
                step: Value::read_type(data_type, cur)?,
            },
            0x02 => FormData::Enumeration {
                values: {
                    // enumeration forms carry a u16 count, not u32
                    let len = cur.read_ptp_u16()? as usize;
                    let mut values = Vec::with_capacity(len);
                    for _ in 0..len {
                        values.push(Value::read_type(data_type, cur)?);
                    }
                    values
                },
            },
            _ => FormData::None,
        })
    }
}

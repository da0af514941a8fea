//! The generic (vendor-free) PTP registry: standard operations,
//! responses, events, a useful slice of the standard property space, and
//! the base codec pool every vendor registry builds on.

use super::{
    Access, DataDirection, EventDef, OperationDef, ParameterDef, PropertyDef, Registry,
    RegistryBuilder, ResponseDef,
};
use crate::codec::{Codec, EnumCodec, EnumEntry, FieldDef, PrimitiveKind};
use crate::codes::{
    DataTypeCode, StandardEventCode, StandardOperationCode, StandardPropertyCode,
    StandardResponseCode,
};
use lazy_static::lazy_static;
use std::sync::Arc;

lazy_static! {
    static ref STANDARD: Arc<Registry> = build().expect("standard registry tables are well-formed");
}

/// The shared generic registry. Built once per process.
pub fn standard() -> Arc<Registry> {
    STANDARD.clone()
}

fn req(name: &'static str, codec: &'static str) -> ParameterDef {
    ParameterDef::required(name, codec)
}

fn opt(name: &'static str, codec: &'static str) -> ParameterDef {
    ParameterDef::optional(name, codec)
}

fn operation(
    code: u16,
    name: &'static str,
    description: &'static str,
    direction: DataDirection,
    params: Vec<ParameterDef>,
) -> OperationDef {
    OperationDef {
        code,
        name,
        description,
        direction,
        params,
        response_params: vec![],
        data_codec: None,
    }
}

fn enum_entry(value: u64, name: &'static str) -> EnumEntry {
    EnumEntry {
        value,
        name,
        description: "",
    }
}

fn build() -> Result<Arc<Registry>, crate::error::Error> {
    let mut builder = RegistryBuilder::new("ptp")
        .codec("int8", Codec::Primitive(PrimitiveKind::I8))
        .codec("uint8", Codec::Primitive(PrimitiveKind::U8))
        .codec("int16", Codec::Primitive(PrimitiveKind::I16))
        .codec("uint16", Codec::Primitive(PrimitiveKind::U16))
        .codec("int32", Codec::Primitive(PrimitiveKind::I32))
        .codec("uint32", Codec::Primitive(PrimitiveKind::U32))
        .codec("int64", Codec::Primitive(PrimitiveKind::I64))
        .codec("uint64", Codec::Primitive(PrimitiveKind::U64))
        .codec("int128", Codec::Primitive(PrimitiveKind::I128))
        .codec("uint128", Codec::Primitive(PrimitiveKind::U128))
        .codec("string", Codec::Primitive(PrimitiveKind::Str))
        .codec("aint8", Codec::Array("int8"))
        .codec("auint8", Codec::Array("uint8"))
        .codec("aint16", Codec::Array("int16"))
        .codec("auint16", Codec::Array("uint16"))
        .codec("aint32", Codec::Array("int32"))
        .codec("auint32", Codec::Array("uint32"))
        .codec("aint64", Codec::Array("int64"))
        .codec("auint64", Codec::Array("uint64"))
        .codec("aint128", Codec::Array("int128"))
        .codec("auint128", Codec::Array("uint128"));

    builder = builder
        .codec(
            "WhiteBalanceValues",
            Codec::Enum(EnumCodec {
                name: "WhiteBalanceValues",
                base: "uint16",
                table: vec![
                    enum_entry(0x0001, "Manual"),
                    enum_entry(0x0002, "Automatic"),
                    enum_entry(0x0003, "OnePushAutomatic"),
                    enum_entry(0x0004, "Daylight"),
                    enum_entry(0x0005, "Fluorescent"),
                    enum_entry(0x0006, "Tungsten"),
                    enum_entry(0x0007, "Flash"),
                ],
            }),
        )
        .codec(
            "FocusModeValues",
            Codec::Enum(EnumCodec {
                name: "FocusModeValues",
                base: "uint16",
                table: vec![
                    enum_entry(0x0001, "Manual"),
                    enum_entry(0x0002, "Automatic"),
                    enum_entry(0x0003, "AutomaticMacro"),
                ],
            }),
        )
        .codec(
            "ExposureProgramModeValues",
            Codec::Enum(EnumCodec {
                name: "ExposureProgramModeValues",
                base: "uint16",
                table: vec![
                    enum_entry(0x0001, "Manual"),
                    enum_entry(0x0002, "Automatic"),
                    enum_entry(0x0003, "AperturePriority"),
                    enum_entry(0x0004, "ShutterPriority"),
                    enum_entry(0x0005, "Creative"),
                    enum_entry(0x0006, "Action"),
                    enum_entry(0x0007, "Portrait"),
                ],
            }),
        )
        .codec(
            "FlashModeValues",
            Codec::Enum(EnumCodec {
                name: "FlashModeValues",
                base: "uint16",
                table: vec![
                    enum_entry(0x0001, "AutoFlash"),
                    enum_entry(0x0002, "FlashOff"),
                    enum_entry(0x0003, "FillFlash"),
                    enum_entry(0x0004, "RedEyeAuto"),
                    enum_entry(0x0005, "RedEyeFill"),
                    enum_entry(0x0006, "ExternalSync"),
                ],
            }),
        )
        .codec(
            "StillCaptureModeValues",
            Codec::Enum(EnumCodec {
                name: "StillCaptureModeValues",
                base: "uint16",
                table: vec![
                    enum_entry(0x0001, "Normal"),
                    enum_entry(0x0002, "Burst"),
                    enum_entry(0x0003, "Timelapse"),
                ],
            }),
        )
        .codec(
            "EffectModeValues",
            Codec::Enum(EnumCodec {
                name: "EffectModeValues",
                base: "uint16",
                table: vec![
                    enum_entry(0x0001, "Standard"),
                    enum_entry(0x0002, "BlackAndWhite"),
                    enum_entry(0x0003, "Sepia"),
                ],
            }),
        );

    builder = builder
        .codec(
            "DeviceInfo",
            Codec::Dataset(vec![
                FieldDef::required("StandardVersion", "uint16"),
                FieldDef::required("VendorExtensionID", "uint32"),
                FieldDef::required("VendorExtensionVersion", "uint16"),
                FieldDef::required("VendorExtensionDesc", "string"),
                FieldDef::required("FunctionalMode", "uint16"),
                FieldDef::required("OperationsSupported", "auint16"),
                FieldDef::required("EventsSupported", "auint16"),
                FieldDef::required("DevicePropertiesSupported", "auint16"),
                FieldDef::required("CaptureFormats", "auint16"),
                FieldDef::required("ImageFormats", "auint16"),
                FieldDef::required("Manufacturer", "string"),
                FieldDef::required("Model", "string"),
                FieldDef::required("DeviceVersion", "string"),
                FieldDef::optional("SerialNumber", "string"),
            ]),
        )
        .codec(
            "StorageInfo",
            Codec::Dataset(vec![
                FieldDef::required("StorageType", "uint16"),
                FieldDef::required("FilesystemType", "uint16"),
                FieldDef::required("AccessCapability", "uint16"),
                FieldDef::required("MaxCapacity", "uint64"),
                FieldDef::required("FreeSpaceInBytes", "uint64"),
                FieldDef::required("FreeSpaceInImages", "uint32"),
                FieldDef::required("StorageDescription", "string"),
                FieldDef::required("VolumeLabel", "string"),
            ]),
        )
        .codec(
            "ObjectInfo",
            Codec::Dataset(vec![
                FieldDef::required("StorageID", "uint32"),
                FieldDef::required("ObjectFormat", "uint16"),
                FieldDef::required("ProtectionStatus", "uint16"),
                FieldDef::required("ObjectCompressedSize", "uint32"),
                FieldDef::required("ThumbFormat", "uint16"),
                FieldDef::required("ThumbCompressedSize", "uint32"),
                FieldDef::required("ThumbPixWidth", "uint32"),
                FieldDef::required("ThumbPixHeight", "uint32"),
                FieldDef::required("ImagePixWidth", "uint32"),
                FieldDef::required("ImagePixHeight", "uint32"),
                FieldDef::required("ImageBitDepth", "uint32"),
                FieldDef::required("ParentObject", "uint32"),
                FieldDef::required("AssociationType", "uint16"),
                FieldDef::required("AssociationDesc", "uint32"),
                FieldDef::required("SequenceNumber", "uint32"),
                FieldDef::required("Filename", "string"),
                FieldDef::required("CaptureDate", "string"),
                FieldDef::required("ModificationDate", "string"),
                FieldDef::required("Keywords", "string"),
            ]),
        );

    let mut ops = vec![
        OperationDef {
            data_codec: Some("DeviceInfo"),
            ..operation(
                StandardOperationCode::GetDeviceInfo,
                "GetDeviceInfo",
                "Read the DeviceInfo dataset; legal outside a session",
                DataDirection::Out,
                vec![],
            )
        },
        operation(
            StandardOperationCode::OpenSession,
            "OpenSession",
            "Open a session; the one operation issued with transaction id 0",
            DataDirection::None,
            vec![req("SessionID", "uint32")],
        ),
        operation(
            StandardOperationCode::CloseSession,
            "CloseSession",
            "Close the current session",
            DataDirection::None,
            vec![],
        ),
        OperationDef {
            data_codec: Some("auint32"),
            ..operation(
                StandardOperationCode::GetStorageIDs,
                "GetStorageIDs",
                "List physical/logical store ids",
                DataDirection::Out,
                vec![],
            )
        },
        OperationDef {
            data_codec: Some("StorageInfo"),
            ..operation(
                StandardOperationCode::GetStorageInfo,
                "GetStorageInfo",
                "Read the StorageInfo dataset for one store",
                DataDirection::Out,
                vec![req("StorageID", "uint32")],
            )
        },
        OperationDef {
            response_params: vec![req("NumObjects", "uint32")],
            ..operation(
                StandardOperationCode::GetNumObjects,
                "GetNumObjects",
                "Count objects below a store or association",
                DataDirection::None,
                vec![
                    req("StorageID", "uint32"),
                    opt("ObjectFormatCode", "uint16"),
                    opt("ParentObject", "uint32"),
                ],
            )
        },
        OperationDef {
            data_codec: Some("auint32"),
            ..operation(
                StandardOperationCode::GetObjectHandles,
                "GetObjectHandles",
                "List object handles below a store or association",
                DataDirection::Out,
                vec![
                    req("StorageID", "uint32"),
                    opt("ObjectFormatCode", "uint16"),
                    opt("ParentObject", "uint32"),
                ],
            )
        },
        OperationDef {
            data_codec: Some("ObjectInfo"),
            ..operation(
                StandardOperationCode::GetObjectInfo,
                "GetObjectInfo",
                "Read the ObjectInfo dataset for one object",
                DataDirection::Out,
                vec![req("ObjectHandle", "uint32")],
            )
        },
        operation(
            StandardOperationCode::GetObject,
            "GetObject",
            "Download one object's bytes",
            DataDirection::Out,
            vec![req("ObjectHandle", "uint32")],
        ),
        operation(
            StandardOperationCode::GetThumb,
            "GetThumb",
            "Download one object's thumbnail bytes",
            DataDirection::Out,
            vec![req("ObjectHandle", "uint32")],
        ),
        operation(
            StandardOperationCode::DeleteObject,
            "DeleteObject",
            "Delete one object, or all of a format with handle 0xFFFFFFFF",
            DataDirection::None,
            vec![req("ObjectHandle", "uint32"), opt("ObjectFormatCode", "uint16")],
        ),
        OperationDef {
            data_codec: Some("ObjectInfo"),
            response_params: vec![
                req("StorageID", "uint32"),
                req("ParentObject", "uint32"),
                req("ObjectHandle", "uint32"),
            ],
            ..operation(
                StandardOperationCode::SendObjectInfo,
                "SendObjectInfo",
                "Announce an upcoming SendObject",
                DataDirection::In,
                vec![opt("StorageID", "uint32"), opt("ParentObject", "uint32")],
            )
        },
        operation(
            StandardOperationCode::SendObject,
            "SendObject",
            "Upload the object announced by SendObjectInfo",
            DataDirection::In,
            vec![],
        ),
        operation(
            StandardOperationCode::InitiateCapture,
            "InitiateCapture",
            "Capture to the given store",
            DataDirection::None,
            vec![opt("StorageID", "uint32"), opt("ObjectFormatCode", "uint16")],
        ),
        operation(
            StandardOperationCode::FormatStore,
            "FormatStore",
            "Format a store",
            DataDirection::None,
            vec![req("StorageID", "uint32"), opt("FilesystemFormat", "uint16")],
        ),
        operation(
            StandardOperationCode::ResetDevice,
            "ResetDevice",
            "Return the device to a default state",
            DataDirection::None,
            vec![],
        ),
        operation(
            StandardOperationCode::SelfTest,
            "SelfTest",
            "Run a device self test",
            DataDirection::None,
            vec![opt("SelfTestType", "uint16")],
        ),
        operation(
            StandardOperationCode::SetObjectProtection,
            "SetObjectProtection",
            "Mark an object read-only or read-write",
            DataDirection::None,
            vec![req("ObjectHandle", "uint32"), req("ProtectionStatus", "uint16")],
        ),
        operation(
            StandardOperationCode::PowerDown,
            "PowerDown",
            "Power the device down",
            DataDirection::None,
            vec![],
        ),
        operation(
            StandardOperationCode::GetDevicePropDesc,
            "GetDevicePropDesc",
            "Read a property descriptor; payload shape depends on the datatype field",
            DataDirection::Out,
            vec![req("PropertyCode", "uint16")],
        ),
        operation(
            StandardOperationCode::GetDevicePropValue,
            "GetDevicePropValue",
            "Read a property value; decoded by the property codec",
            DataDirection::Out,
            vec![req("PropertyCode", "uint16")],
        ),
        operation(
            StandardOperationCode::SetDevicePropValue,
            "SetDevicePropValue",
            "Write a property value; encoded by the property codec",
            DataDirection::In,
            vec![req("PropertyCode", "uint16")],
        ),
        operation(
            StandardOperationCode::ResetDevicePropValue,
            "ResetDevicePropValue",
            "Restore a property to its factory default",
            DataDirection::None,
            vec![req("PropertyCode", "uint16")],
        ),
        operation(
            StandardOperationCode::TerminateOpenCapture,
            "TerminateOpenCapture",
            "Stop an open-ended capture",
            DataDirection::None,
            vec![req("TransactionID", "uint32")],
        ),
        operation(
            StandardOperationCode::MoveObject,
            "MoveObject",
            "Move an object to another store/parent",
            DataDirection::None,
            vec![
                req("ObjectHandle", "uint32"),
                req("StorageID", "uint32"),
                opt("ParentObject", "uint32"),
            ],
        ),
        OperationDef {
            response_params: vec![req("ObjectHandle", "uint32")],
            ..operation(
                StandardOperationCode::CopyObject,
                "CopyObject",
                "Copy an object to another store/parent",
                DataDirection::None,
                vec![
                    req("ObjectHandle", "uint32"),
                    req("StorageID", "uint32"),
                    opt("ParentObject", "uint32"),
                ],
            )
        },
        OperationDef {
            response_params: vec![req("ActualBytes", "uint32")],
            ..operation(
                StandardOperationCode::GetPartialObject,
                "GetPartialObject",
                "Download a byte range of one object",
                DataDirection::Out,
                vec![
                    req("ObjectHandle", "uint32"),
                    req("Offset", "uint32"),
                    req("MaxBytes", "uint32"),
                ],
            )
        },
        operation(
            StandardOperationCode::InitiateOpenCapture,
            "InitiateOpenCapture",
            "Begin an open-ended capture terminated by TerminateOpenCapture",
            DataDirection::None,
            vec![opt("StorageID", "uint32"), opt("ObjectFormatCode", "uint16")],
        ),
    ];
    for op in ops.drain(..) {
        builder = builder.operation(op);
    }

    let responses: &[(u16, &'static str, &'static str, bool)] = &[
        (StandardResponseCode::Undefined, "Undefined", "", false),
        (StandardResponseCode::Ok, "Ok", "operation completed", false),
        (StandardResponseCode::GeneralError, "GeneralError", "unspecified failure", false),
        (StandardResponseCode::SessionNotOpen, "SessionNotOpen", "", false),
        (StandardResponseCode::InvalidTransactionId, "InvalidTransactionId", "", false),
        (StandardResponseCode::OperationNotSupported, "OperationNotSupported", "", false),
        (StandardResponseCode::ParameterNotSupported, "ParameterNotSupported", "", false),
        (StandardResponseCode::IncompleteTransfer, "IncompleteTransfer", "", true),
        (StandardResponseCode::InvalidStorageId, "InvalidStorageId", "", false),
        (StandardResponseCode::InvalidObjectHandle, "InvalidObjectHandle", "", false),
        (StandardResponseCode::DevicePropNotSupported, "DevicePropNotSupported", "", false),
        (StandardResponseCode::InvalidObjectFormatCode, "InvalidObjectFormatCode", "", false),
        (StandardResponseCode::StoreFull, "StoreFull", "", false),
        (StandardResponseCode::ObjectWriteProtected, "ObjectWriteProtected", "", false),
        (StandardResponseCode::StoreReadOnly, "StoreReadOnly", "", false),
        (StandardResponseCode::AccessDenied, "AccessDenied", "", false),
        (StandardResponseCode::NoThumbnailPresent, "NoThumbnailPresent", "", false),
        (StandardResponseCode::SelfTestFailed, "SelfTestFailed", "", false),
        (StandardResponseCode::PartialDeletion, "PartialDeletion", "", false),
        (StandardResponseCode::StoreNotAvailable, "StoreNotAvailable", "", true),
        (
            StandardResponseCode::SpecificationByFormatUnsupported,
            "SpecificationByFormatUnsupported",
            "",
            false,
        ),
        (StandardResponseCode::NoValidObjectInfo, "NoValidObjectInfo", "", false),
        (StandardResponseCode::InvalidCodeFormat, "InvalidCodeFormat", "", false),
        (StandardResponseCode::UnknownVendorCode, "UnknownVendorCode", "", false),
        (
            StandardResponseCode::CaptureAlreadyTerminated,
            "CaptureAlreadyTerminated",
            "",
            false,
        ),
        (StandardResponseCode::DeviceBusy, "DeviceBusy", "retry when idle", true),
        (StandardResponseCode::InvalidParentObject, "InvalidParentObject", "", false),
        (
            StandardResponseCode::InvalidDevicePropFormat,
            "InvalidDevicePropFormat",
            "",
            false,
        ),
        (
            StandardResponseCode::InvalidDevicePropValue,
            "InvalidDevicePropValue",
            "",
            false,
        ),
        (StandardResponseCode::InvalidParameter, "InvalidParameter", "", false),
        (StandardResponseCode::SessionAlreadyOpen, "SessionAlreadyOpen", "", false),
        (StandardResponseCode::TransactionCancelled, "TransactionCancelled", "", false),
        (
            StandardResponseCode::SpecificationOfDestinationUnsupported,
            "SpecificationOfDestinationUnsupported",
            "",
            false,
        ),
    ];
    for &(code, name, description, recoverable) in responses {
        builder = builder.response(ResponseDef {
            code,
            name,
            description,
            recoverable,
        });
    }

    let events: &[(u16, &'static str, &[&'static str])] = &[
        (StandardEventCode::CancelTransaction, "CancelTransaction", &["TransactionID"]),
        (StandardEventCode::ObjectRemoved, "ObjectRemoved", &["ObjectHandle"]),
        (StandardEventCode::ObjectAdded, "ObjectAdded", &["ObjectHandle"]),
        (StandardEventCode::StoreAdded, "StoreAdded", &["StorageID"]),
        (StandardEventCode::StoreRemoved, "StoreRemoved", &["StorageID"]),
        (StandardEventCode::DevicePropChanged, "DevicePropChanged", &["PropertyCode"]),
        (StandardEventCode::ObjectInfoChanged, "ObjectInfoChanged", &["ObjectHandle"]),
        (StandardEventCode::DeviceInfoChanged, "DeviceInfoChanged", &[]),
        (
            StandardEventCode::RequestObjectTransfer,
            "RequestObjectTransfer",
            &["ObjectHandle"],
        ),
        (StandardEventCode::StoreFull, "StoreFull", &["StorageID"]),
        (StandardEventCode::DeviceReset, "DeviceReset", &[]),
        (StandardEventCode::StorageInfoChanged, "StorageInfoChanged", &["StorageID"]),
        (StandardEventCode::CaptureComplete, "CaptureComplete", &["TransactionID"]),
        (StandardEventCode::UnreportedStatus, "UnreportedStatus", &[]),
    ];
    for &(code, name, params) in events {
        builder = builder.event(EventDef {
            code,
            name,
            params: params.iter().map(|&p| req(p, "uint32")).collect(),
        });
    }

    let properties: &[(u16, &'static str, &'static str, u16, &'static str, Access)] = &[
        (
            StandardPropertyCode::BatteryLevel,
            "BatteryLevel",
            "remaining charge as the device reports it",
            DataTypeCode::Uint8,
            "uint8",
            Access::Get,
        ),
        (
            StandardPropertyCode::ImageSize,
            "ImageSize",
            "capture resolution as `WxH`",
            DataTypeCode::Str,
            "string",
            Access::GetSet,
        ),
        (
            StandardPropertyCode::CompressionSetting,
            "CompressionSetting",
            "",
            DataTypeCode::Uint8,
            "uint8",
            Access::GetSet,
        ),
        (
            StandardPropertyCode::WhiteBalance,
            "WhiteBalance",
            "",
            DataTypeCode::Uint16,
            "WhiteBalanceValues",
            Access::GetSet,
        ),
        (
            StandardPropertyCode::FNumber,
            "FNumber",
            "aperture in hundredths of an f-stop",
            DataTypeCode::Uint16,
            "uint16",
            Access::GetSet,
        ),
        (
            StandardPropertyCode::FocalLength,
            "FocalLength",
            "focal length in 0.01 mm",
            DataTypeCode::Uint32,
            "uint32",
            Access::Get,
        ),
        (
            StandardPropertyCode::FocusMode,
            "FocusMode",
            "",
            DataTypeCode::Uint16,
            "FocusModeValues",
            Access::GetSet,
        ),
        (
            StandardPropertyCode::FlashMode,
            "FlashMode",
            "",
            DataTypeCode::Uint16,
            "FlashModeValues",
            Access::GetSet,
        ),
        (
            StandardPropertyCode::ExposureTime,
            "ExposureTime",
            "shutter time in 0.1 ms",
            DataTypeCode::Uint32,
            "uint32",
            Access::GetSet,
        ),
        (
            StandardPropertyCode::ExposureProgramMode,
            "ExposureProgramMode",
            "",
            DataTypeCode::Uint16,
            "ExposureProgramModeValues",
            Access::GetSet,
        ),
        (
            StandardPropertyCode::ExposureIndex,
            "ExposureIndex",
            "ISO sensitivity",
            DataTypeCode::Uint16,
            "uint16",
            Access::GetSet,
        ),
        (
            StandardPropertyCode::ExposureBiasCompensation,
            "ExposureBiasCompensation",
            "exposure compensation in thousandths of a stop",
            DataTypeCode::Int16,
            "int16",
            Access::GetSet,
        ),
        (
            StandardPropertyCode::DateTime,
            "DateTime",
            "ISO 8601 basic format",
            DataTypeCode::Str,
            "string",
            Access::GetSet,
        ),
        (
            StandardPropertyCode::CaptureDelay,
            "CaptureDelay",
            "self-timer in milliseconds",
            DataTypeCode::Uint32,
            "uint32",
            Access::GetSet,
        ),
        (
            StandardPropertyCode::StillCaptureMode,
            "StillCaptureMode",
            "",
            DataTypeCode::Uint16,
            "StillCaptureModeValues",
            Access::GetSet,
        ),
        (
            StandardPropertyCode::EffectMode,
            "EffectMode",
            "",
            DataTypeCode::Uint16,
            "EffectModeValues",
            Access::GetSet,
        ),
        (
            StandardPropertyCode::BurstNumber,
            "BurstNumber",
            "",
            DataTypeCode::Uint16,
            "uint16",
            Access::GetSet,
        ),
        (
            StandardPropertyCode::CopyrightInfo,
            "CopyrightInfo",
            "",
            DataTypeCode::Str,
            "string",
            Access::GetSet,
        ),
    ];
    for &(code, name, description, datatype, codec, access) in properties {
        builder = builder.property(PropertyDef {
            code,
            name,
            description,
            datatype,
            codec,
            access,
        });
    }

    builder.build()
}

//! Standard PTP code spaces (ISO 15740). Vendor code tables live with
//! their vendor registries.
//!
//! The code space is partitioned: operations 0x1xxx (vendor 0x9xxx),
//! responses 0x2xxx, events 0x4xxx (vendor 0xCxxx), properties 0x5xxx
//! (vendor 0xDxxx).

pub type OperationCode = u16;

#[allow(non_upper_case_globals)]
#[allow(non_snake_case)]
pub mod StandardOperationCode {
    use super::OperationCode;

    pub const Undefined: OperationCode = 0x1000;
    pub const GetDeviceInfo: OperationCode = 0x1001;
    pub const OpenSession: OperationCode = 0x1002;
    pub const CloseSession: OperationCode = 0x1003;
    pub const GetStorageIDs: OperationCode = 0x1004;
    pub const GetStorageInfo: OperationCode = 0x1005;
    pub const GetNumObjects: OperationCode = 0x1006;
    pub const GetObjectHandles: OperationCode = 0x1007;
    pub const GetObjectInfo: OperationCode = 0x1008;
    pub const GetObject: OperationCode = 0x1009;
    pub const GetThumb: OperationCode = 0x100A;
    pub const DeleteObject: OperationCode = 0x100B;
    pub const SendObjectInfo: OperationCode = 0x100C;
    pub const SendObject: OperationCode = 0x100D;
    pub const InitiateCapture: OperationCode = 0x100E;
    pub const FormatStore: OperationCode = 0x100F;
    pub const ResetDevice: OperationCode = 0x1010;
    pub const SelfTest: OperationCode = 0x1011;
    pub const SetObjectProtection: OperationCode = 0x1012;
    pub const PowerDown: OperationCode = 0x1013;
    pub const GetDevicePropDesc: OperationCode = 0x1014;
    pub const GetDevicePropValue: OperationCode = 0x1015;
    pub const SetDevicePropValue: OperationCode = 0x1016;
    pub const ResetDevicePropValue: OperationCode = 0x1017;
    pub const TerminateOpenCapture: OperationCode = 0x1018;
    pub const MoveObject: OperationCode = 0x1019;
    pub const CopyObject: OperationCode = 0x101A;
    pub const GetPartialObject: OperationCode = 0x101B;
    pub const InitiateOpenCapture: OperationCode = 0x101C;

    pub fn name(v: OperationCode) -> Option<&'static str> {
        match v {
            Undefined => Some("Undefined"),
            GetDeviceInfo => Some("GetDeviceInfo"),
            OpenSession => Some("OpenSession"),
            CloseSession => Some("CloseSession"),
            GetStorageIDs => Some("GetStorageIDs"),
            GetStorageInfo => Some("GetStorageInfo"),
            GetNumObjects => Some("GetNumObjects"),
            GetObjectHandles => Some("GetObjectHandles"),
            GetObjectInfo => Some("GetObjectInfo"),
            GetObject => Some("GetObject"),
            GetThumb => Some("GetThumb"),
            DeleteObject => Some("DeleteObject"),
            SendObjectInfo => Some("SendObjectInfo"),
            SendObject => Some("SendObject"),
            InitiateCapture => Some("InitiateCapture"),
            FormatStore => Some("FormatStore"),
            ResetDevice => Some("ResetDevice"),
            SelfTest => Some("SelfTest"),
            SetObjectProtection => Some("SetObjectProtection"),
            PowerDown => Some("PowerDown"),
            GetDevicePropDesc => Some("GetDevicePropDesc"),
            GetDevicePropValue => Some("GetDevicePropValue"),
            SetDevicePropValue => Some("SetDevicePropValue"),
            ResetDevicePropValue => Some("ResetDevicePropValue"),
            TerminateOpenCapture => Some("TerminateOpenCapture"),
            MoveObject => Some("MoveObject"),
            CopyObject => Some("CopyObject"),
            GetPartialObject => Some("GetPartialObject"),
            InitiateOpenCapture => Some("InitiateOpenCapture"),
            _ => None,
        }
    }
}

pub type ResponseCode = u16;

#[allow(non_upper_case_globals)]
#[allow(non_snake_case)]
pub mod StandardResponseCode {
    use super::ResponseCode;

    pub const Undefined: ResponseCode = 0x2000;
    pub const Ok: ResponseCode = 0x2001;
    pub const GeneralError: ResponseCode = 0x2002;
    pub const SessionNotOpen: ResponseCode = 0x2003;
    pub const InvalidTransactionId: ResponseCode = 0x2004;
    pub const OperationNotSupported: ResponseCode = 0x2005;
    pub const ParameterNotSupported: ResponseCode = 0x2006;
    pub const IncompleteTransfer: ResponseCode = 0x2007;
    pub const InvalidStorageId: ResponseCode = 0x2008;
    pub const InvalidObjectHandle: ResponseCode = 0x2009;
    pub const DevicePropNotSupported: ResponseCode = 0x200A;
    pub const InvalidObjectFormatCode: ResponseCode = 0x200B;
    pub const StoreFull: ResponseCode = 0x200C;
    pub const ObjectWriteProtected: ResponseCode = 0x200D;
    pub const StoreReadOnly: ResponseCode = 0x200E;
    pub const AccessDenied: ResponseCode = 0x200F;
    pub const NoThumbnailPresent: ResponseCode = 0x2010;
    pub const SelfTestFailed: ResponseCode = 0x2011;
    pub const PartialDeletion: ResponseCode = 0x2012;
    pub const StoreNotAvailable: ResponseCode = 0x2013;
    pub const SpecificationByFormatUnsupported: ResponseCode = 0x2014;
    pub const NoValidObjectInfo: ResponseCode = 0x2015;
    pub const InvalidCodeFormat: ResponseCode = 0x2016;
    pub const UnknownVendorCode: ResponseCode = 0x2017;
    pub const CaptureAlreadyTerminated: ResponseCode = 0x2018;
    pub const DeviceBusy: ResponseCode = 0x2019;
    pub const InvalidParentObject: ResponseCode = 0x201A;
    pub const InvalidDevicePropFormat: ResponseCode = 0x201B;
    pub const InvalidDevicePropValue: ResponseCode = 0x201C;
    pub const InvalidParameter: ResponseCode = 0x201D;
    pub const SessionAlreadyOpen: ResponseCode = 0x201E;
    pub const TransactionCancelled: ResponseCode = 0x201F;
    pub const SpecificationOfDestinationUnsupported: ResponseCode = 0x2020;

    pub fn name(v: ResponseCode) -> Option<&'static str> {
        match v {
            Undefined => Some("Undefined"),
            Ok => Some("Ok"),
            GeneralError => Some("GeneralError"),
            SessionNotOpen => Some("SessionNotOpen"),
            InvalidTransactionId => Some("InvalidTransactionId"),
            OperationNotSupported => Some("OperationNotSupported"),
            ParameterNotSupported => Some("ParameterNotSupported"),
            IncompleteTransfer => Some("IncompleteTransfer"),
            InvalidStorageId => Some("InvalidStorageId"),
            InvalidObjectHandle => Some("InvalidObjectHandle"),
            DevicePropNotSupported => Some("DevicePropNotSupported"),
            InvalidObjectFormatCode => Some("InvalidObjectFormatCode"),
            StoreFull => Some("StoreFull"),
            ObjectWriteProtected => Some("ObjectWriteProtected"),
            StoreReadOnly => Some("StoreReadOnly"),
            AccessDenied => Some("AccessDenied"),
            NoThumbnailPresent => Some("NoThumbnailPresent"),
            SelfTestFailed => Some("SelfTestFailed"),
            PartialDeletion => Some("PartialDeletion"),
            StoreNotAvailable => Some("StoreNotAvailable"),
            SpecificationByFormatUnsupported => Some("SpecificationByFormatUnsupported"),
            NoValidObjectInfo => Some("NoValidObjectInfo"),
            InvalidCodeFormat => Some("InvalidCodeFormat"),
            UnknownVendorCode => Some("UnknownVendorCode"),
            CaptureAlreadyTerminated => Some("CaptureAlreadyTerminated"),
            DeviceBusy => Some("DeviceBusy"),
            InvalidParentObject => Some("InvalidParentObject"),
            InvalidDevicePropFormat => Some("InvalidDevicePropFormat"),
            InvalidDevicePropValue => Some("InvalidDevicePropValue"),
            InvalidParameter => Some("InvalidParameter"),
            SessionAlreadyOpen => Some("SessionAlreadyOpen"),
            TransactionCancelled => Some("TransactionCancelled"),
            SpecificationOfDestinationUnsupported => Some("SpecificationOfDestinationUnsupported"),
            _ => None,
        }
    }
}

pub type EventCode = u16;

#[allow(non_upper_case_globals)]
#[allow(non_snake_case)]
pub mod StandardEventCode {
    use super::EventCode;

    pub const Undefined: EventCode = 0x4000;
    pub const CancelTransaction: EventCode = 0x4001;
    pub const ObjectRemoved: EventCode = 0x4002;
    pub const ObjectAdded: EventCode = 0x4003;
    pub const StoreAdded: EventCode = 0x4004;
    pub const StoreRemoved: EventCode = 0x4005;
    pub const DevicePropChanged: EventCode = 0x4006;
    pub const ObjectInfoChanged: EventCode = 0x4007;
    pub const DeviceInfoChanged: EventCode = 0x4008;
    pub const RequestObjectTransfer: EventCode = 0x4009;
    pub const StoreFull: EventCode = 0x400A;
    pub const DeviceReset: EventCode = 0x400B;
    pub const StorageInfoChanged: EventCode = 0x400C;
    pub const CaptureComplete: EventCode = 0x400D;
    pub const UnreportedStatus: EventCode = 0x400E;

    pub fn name(v: EventCode) -> Option<&'static str> {
        match v {
            Undefined => Some("Undefined"),
            CancelTransaction => Some("CancelTransaction"),
            ObjectRemoved => Some("ObjectRemoved"),
            ObjectAdded => Some("ObjectAdded"),
            StoreAdded => Some("StoreAdded"),
            StoreRemoved => Some("StoreRemoved"),
            DevicePropChanged => Some("DevicePropChanged"),
            ObjectInfoChanged => Some("ObjectInfoChanged"),
            DeviceInfoChanged => Some("DeviceInfoChanged"),
            RequestObjectTransfer => Some("RequestObjectTransfer"),
            StoreFull => Some("StoreFull"),
            DeviceReset => Some("DeviceReset"),
            StorageInfoChanged => Some("StorageInfoChanged"),
            CaptureComplete => Some("CaptureComplete"),
            UnreportedStatus => Some("UnreportedStatus"),
            _ => None,
        }
    }
}

pub type PropertyCode = u16;

#[allow(non_upper_case_globals)]
#[allow(non_snake_case)]
pub mod StandardPropertyCode {
    use super::PropertyCode;

    pub const Undefined: PropertyCode = 0x5000;
    pub const BatteryLevel: PropertyCode = 0x5001;
    pub const FunctionalMode: PropertyCode = 0x5002;
    pub const ImageSize: PropertyCode = 0x5003;
    pub const CompressionSetting: PropertyCode = 0x5004;
    pub const WhiteBalance: PropertyCode = 0x5005;
    pub const RGBGain: PropertyCode = 0x5006;
    pub const FNumber: PropertyCode = 0x5007;
    pub const FocalLength: PropertyCode = 0x5008;
    pub const FocusDistance: PropertyCode = 0x5009;
    pub const FocusMode: PropertyCode = 0x500A;
    pub const ExposureMeteringMode: PropertyCode = 0x500B;
    pub const FlashMode: PropertyCode = 0x500C;
    pub const ExposureTime: PropertyCode = 0x500D;
    pub const ExposureProgramMode: PropertyCode = 0x500E;
    pub const ExposureIndex: PropertyCode = 0x500F;
    pub const ExposureBiasCompensation: PropertyCode = 0x5010;
    pub const DateTime: PropertyCode = 0x5011;
    pub const CaptureDelay: PropertyCode = 0x5012;
    pub const StillCaptureMode: PropertyCode = 0x5013;
    pub const Contrast: PropertyCode = 0x5014;
    pub const Sharpness: PropertyCode = 0x5015;
    pub const DigitalZoom: PropertyCode = 0x5016;
    pub const EffectMode: PropertyCode = 0x5017;
    pub const BurstNumber: PropertyCode = 0x5018;
    pub const BurstInterval: PropertyCode = 0x5019;
    pub const TimelapseNumber: PropertyCode = 0x501A;
    pub const TimelapseInterval: PropertyCode = 0x501B;
    pub const FocusMeteringMode: PropertyCode = 0x501C;
    pub const UploadURL: PropertyCode = 0x501D;
    pub const Artist: PropertyCode = 0x501E;
    pub const CopyrightInfo: PropertyCode = 0x501F;

    pub fn name(v: PropertyCode) -> Option<&'static str> {
        match v {
            Undefined => Some("Undefined"),
            BatteryLevel => Some("BatteryLevel"),
            FunctionalMode => Some("FunctionalMode"),
            ImageSize => Some("ImageSize"),
            CompressionSetting => Some("CompressionSetting"),
            WhiteBalance => Some("WhiteBalance"),
            RGBGain => Some("RGBGain"),
            FNumber => Some("FNumber"),
            FocalLength => Some("FocalLength"),
            FocusDistance => Some("FocusDistance"),
            FocusMode => Some("FocusMode"),
            ExposureMeteringMode => Some("ExposureMeteringMode"),
            FlashMode => Some("FlashMode"),
            ExposureTime => Some("ExposureTime"),
            ExposureProgramMode => Some("ExposureProgramMode"),
            ExposureIndex => Some("ExposureIndex"),
            ExposureBiasCompensation => Some("ExposureBiasCompensation"),
            DateTime => Some("DateTime"),
            CaptureDelay => Some("CaptureDelay"),
            StillCaptureMode => Some("StillCaptureMode"),
            Contrast => Some("Contrast"),
            Sharpness => Some("Sharpness"),
            DigitalZoom => Some("DigitalZoom"),
            EffectMode => Some("EffectMode"),
            BurstNumber => Some("BurstNumber"),
            BurstInterval => Some("BurstInterval"),
            TimelapseNumber => Some("TimelapseNumber"),
            TimelapseInterval => Some("TimelapseInterval"),
            FocusMeteringMode => Some("FocusMeteringMode"),
            UploadURL => Some("UploadURL"),
            Artist => Some("Artist"),
            CopyrightInfo => Some("CopyrightInfo"),
            _ => None,
        }
    }
}

/// PTP datatype tags carried in property descriptors and dataset
/// definitions. Array variants set bit 14 (0x40xx); 0xFFFF is the
/// length-prefixed UTF-16 string.
#[allow(non_upper_case_globals)]
#[allow(non_snake_case)]
pub mod DataTypeCode {
    pub const Undefined: u16 = 0x0000;
    pub const Int8: u16 = 0x0001;
    pub const Uint8: u16 = 0x0002;
    pub const Int16: u16 = 0x0003;
    pub const Uint16: u16 = 0x0004;
    pub const Int32: u16 = 0x0005;
    pub const Uint32: u16 = 0x0006;
    pub const Int64: u16 = 0x0007;
    pub const Uint64: u16 = 0x0008;
    pub const Int128: u16 = 0x0009;
    pub const Uint128: u16 = 0x000A;
    pub const AInt8: u16 = 0x4001;
    pub const AUint8: u16 = 0x4002;
    pub const AInt16: u16 = 0x4003;
    pub const AUint16: u16 = 0x4004;
    pub const AInt32: u16 = 0x4005;
    pub const AUint32: u16 = 0x4006;
    pub const AInt64: u16 = 0x4007;
    pub const AUint64: u16 = 0x4008;
    pub const AInt128: u16 = 0x4009;
    pub const AUint128: u16 = 0x400A;
    pub const Str: u16 = 0xFFFF;
}

/// PTP-over-USB class requests (PIMA 15740 Annex D).
#[allow(non_upper_case_globals)]
#[allow(non_snake_case)]
pub mod ClassRequestCode {
    pub const CancelRequest: u8 = 0x64;
    pub const GetExtendedEventData: u8 = 0x65;
    pub const DeviceResetRequest: u8 = 0x66;
    pub const GetDeviceStatus: u8 = 0x67;
}

/// Still-image interface descriptor values required by §D.2 of the class
/// specification.
pub const USB_CLASS_IMAGE: u8 = 0x06;
pub const USB_SUBCLASS_STILL_IMAGE: u8 = 0x01;
pub const USB_PROTOCOL_PTP: u8 = 0x01;

use crate::codes::DataTypeCode;
use crate::error::{Error, ValidationError};
use crate::read::PtpRead;
use crate::write::PtpWrite;

/// A runtime PTP value: every primitive datatype, the array variants, the
/// UTF-16 string, plus the two shapes the registry layer introduces, a
/// symbolic enum member (`NAME`) and a decoded dataset (`RECORD`).
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    UNDEF,
    INT8(i8),
    UINT8(u8),
    INT16(i16),
    UINT16(u16),
    INT32(i32),
    UINT32(u32),
    INT64(i64),
    UINT64(u64),
    INT128(i128),
    UINT128(u128),
    AINT8(Vec<i8>),
    AUINT8(Vec<u8>),
    AINT16(Vec<i16>),
    AUINT16(Vec<u16>),
    AINT32(Vec<i32>),
    AUINT32(Vec<u32>),
    AINT64(Vec<i64>),
    AUINT64(Vec<u64>),
    AINT128(Vec<i128>),
    AUINT128(Vec<u128>),
    STR(String),
    /// Symbolic member of an enum codec; maps through the codec's table.
    NAME(String),
    /// Decoded dataset.
    RECORD(Record),
    /// Decoded vendor stream of datasets (e.g. an event batch).
    RECORDS(Vec<Record>),
}

/// Ordered named fields produced by a dataset codec.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Record {
    pub fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Record {
        Record { fields: vec![] }
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

impl Value {
    /// Serialize without a codec. `NAME` needs an enum table and
    /// `RECORD`/`RECORDS` need field order, so those go through
    /// [`Codec::encode`](crate::codec::Codec::encode) instead.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        use self::Value::*;
        let mut out = vec![];
        match self {
            UNDEF => {}
            INT8(v) => out.write_ptp_i8(*v)?,
            UINT8(v) => out.write_ptp_u8(*v)?,
            INT16(v) => out.write_ptp_i16(*v)?,
            UINT16(v) => out.write_ptp_u16(*v)?,
            INT32(v) => out.write_ptp_i32(*v)?,
            UINT32(v) => out.write_ptp_u32(*v)?,
            INT64(v) => out.write_ptp_i64(*v)?,
            UINT64(v) => out.write_ptp_u64(*v)?,
            INT128(v) => out.write_ptp_i128(*v)?,
            UINT128(v) => out.write_ptp_u128(*v)?,
            AINT8(v) => out.write_ptp_vec(v, |w, x| w.write_ptp_i8(*x))?,
            AUINT8(v) => out.write_ptp_vec(v, |w, x| w.write_ptp_u8(*x))?,
            AINT16(v) => out.write_ptp_vec(v, |w, x| w.write_ptp_i16(*x))?,
            AUINT16(v) => out.write_ptp_vec(v, |w, x| w.write_ptp_u16(*x))?,
            AINT32(v) => out.write_ptp_vec(v, |w, x| w.write_ptp_i32(*x))?,
            AUINT32(v) => out.write_ptp_vec(v, |w, x| w.write_ptp_u32(*x))?,
            AINT64(v) => out.write_ptp_vec(v, |w, x| w.write_ptp_i64(*x))?,
            AUINT64(v) => out.write_ptp_vec(v, |w, x| w.write_ptp_u64(*x))?,
            AINT128(v) => out.write_ptp_vec(v, |w, x| w.write_ptp_i128(*x))?,
            AUINT128(v) => out.write_ptp_vec(v, |w, x| w.write_ptp_u128(*x))?,
            STR(v) => out.write_ptp_str(v)?,
            NAME(_) | RECORD(_) | RECORDS(_) => {
                return Err(ValidationError::TypeMismatch {
                    codec: "value",
                    got: self.kind_name(),
                }
                .into())
            }
        }
        Ok(out)
    }

    /// Read one value of the given datatype tag.
    pub fn read_type<T: PtpRead>(kind: u16, reader: &mut T) -> Result<Value, Error> {
        use self::Value::*;
        Ok(match kind {
            DataTypeCode::Int8 => INT8(reader.read_ptp_i8()?),
            DataTypeCode::Uint8 => UINT8(reader.read_ptp_u8()?),
            DataTypeCode::Int16 => INT16(reader.read_ptp_i16()?),
            DataTypeCode::Uint16 => UINT16(reader.read_ptp_u16()?),
            DataTypeCode::Int32 => INT32(reader.read_ptp_i32()?),
            DataTypeCode::Uint32 => UINT32(reader.read_ptp_u32()?),
            DataTypeCode::Int64 => INT64(reader.read_ptp_i64()?),
            DataTypeCode::Uint64 => UINT64(reader.read_ptp_u64()?),
            DataTypeCode::Int128 => INT128(reader.read_ptp_i128()?),
            DataTypeCode::Uint128 => UINT128(reader.read_ptp_u128()?),
            DataTypeCode::AInt8 => AINT8(reader.read_ptp_i8_vec()?),
            DataTypeCode::AUint8 => AUINT8(reader.read_ptp_u8_vec()?),
            DataTypeCode::AInt16 => AINT16(reader.read_ptp_i16_vec()?),
            DataTypeCode::AUint16 => AUINT16(reader.read_ptp_u16_vec()?),
            DataTypeCode::AInt32 => AINT32(reader.read_ptp_i32_vec()?),
            DataTypeCode::AUint32 => AUINT32(reader.read_ptp_u32_vec()?),
            DataTypeCode::AInt64 => AINT64(reader.read_ptp_i64_vec()?),
            DataTypeCode::AUint64 => AUINT64(reader.read_ptp_u64_vec()?),
            DataTypeCode::AInt128 => AINT128(reader.read_ptp_i128_vec()?),
            DataTypeCode::AUint128 => AUINT128(reader.read_ptp_u128_vec()?),
            DataTypeCode::Str => STR(reader.read_ptp_str()?),
            _ => UNDEF,
        })
    }

    /// The datatype tag for this value, `Undefined` for registry-layer
    /// shapes.
    pub fn datatype(&self) -> u16 {
        use self::Value::*;
        match self {
            INT8(_) => DataTypeCode::Int8,
            UINT8(_) => DataTypeCode::Uint8,
            INT16(_) => DataTypeCode::Int16,
            UINT16(_) => DataTypeCode::Uint16,
            INT32(_) => DataTypeCode::Int32,
            UINT32(_) => DataTypeCode::Uint32,
            INT64(_) => DataTypeCode::Int64,
            UINT64(_) => DataTypeCode::Uint64,
            INT128(_) => DataTypeCode::Int128,
            UINT128(_) => DataTypeCode::Uint128,
            AINT8(_) => DataTypeCode::AInt8,
            AUINT8(_) => DataTypeCode::AUint8,
            AINT16(_) => DataTypeCode::AInt16,
            AUINT16(_) => DataTypeCode::AUint16,
            AINT32(_) => DataTypeCode::AInt32,
            AUINT32(_) => DataTypeCode::AUint32,
            AINT64(_) => DataTypeCode::AInt64,
            AUINT64(_) => DataTypeCode::AUint64,
            AINT128(_) => DataTypeCode::AInt128,
            AUINT128(_) => DataTypeCode::AUint128,
            STR(_) => DataTypeCode::Str,
            UNDEF | NAME(_) | RECORD(_) | RECORDS(_) => DataTypeCode::Undefined,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        use self::Value::*;
        match self {
            UNDEF => "UNDEF",
            INT8(_) => "INT8",
            UINT8(_) => "UINT8",
            INT16(_) => "INT16",
            UINT16(_) => "UINT16",
            INT32(_) => "INT32",
            UINT32(_) => "UINT32",
            INT64(_) => "INT64",
            UINT64(_) => "UINT64",
            INT128(_) => "INT128",
            UINT128(_) => "UINT128",
            AINT8(_) => "AINT8",
            AUINT8(_) => "AUINT8",
            AINT16(_) => "AINT16",
            AUINT16(_) => "AUINT16",
            AINT32(_) => "AINT32",
            AUINT32(_) => "AUINT32",
            AINT64(_) => "AINT64",
            AUINT64(_) => "AUINT64",
            AINT128(_) => "AINT128",
            AUINT128(_) => "AUINT128",
            STR(_) => "STR",
            NAME(_) => "NAME",
            RECORD(_) => "RECORD",
            RECORDS(_) => "RECORDS",
        }
    }

    /// Numeric view widened to u64, used for enum tables and parameter
    /// slots. Signed values must be non-negative.
    pub fn as_u64(&self) -> Option<u64> {
        use self::Value::*;
        match self {
            UINT8(v) => Some(u64::from(*v)),
            UINT16(v) => Some(u64::from(*v)),
            UINT32(v) => Some(u64::from(*v)),
            UINT64(v) => Some(*v),
            INT8(v) if *v >= 0 => Some(*v as u64),
            INT16(v) if *v >= 0 => Some(*v as u64),
            INT32(v) if *v >= 0 => Some(*v as u64),
            INT64(v) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    /// One 32-bit COMMAND/RESPONSE parameter slot, zero-extended.
    pub fn to_u32_slot(&self) -> Option<u32> {
        self.as_u64().and_then(|v| u32::try_from(v).ok())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::STR(s) | Value::NAME(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::RECORD(r) => Some(r),
            _ => None,
        }
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Value::INT8(value)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::UINT8(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::INT16(value)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::UINT16(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::INT32(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UINT32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::INT64(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UINT64(value)
    }
}

/// Bare strings convert to symbolic enum members, the common case at the
/// call site; PTP string payloads are spelled `Value::STR`.
impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::NAME(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::NAME(value)
    }
}

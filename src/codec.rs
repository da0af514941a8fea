//! Composable encoders/decoders. Every codec is plain data, a tagged
//! variant referencing other codecs by symbolic handle, so vendor tables
//! stay declarative and the concrete wiring happens at registry build
//! time. `decode(encode(v))` returns `v` for every value in a codec's
//! domain; the one asymmetry is enum decoding of an unknown numeric,
//! which yields the raw base value instead of a name.

use crate::error::{Error, ProtocolError, ValidationError};
use crate::read::PtpRead;
use crate::value::{Record, Value};
use std::io::Cursor;

/// Symbolic reference to a registered codec, e.g. `"uint16"`.
pub type CodecHandle = &'static str;

/// Resolves codec handles. Implemented by the registry; tests use a bare
/// map.
pub trait CodecResolver {
    fn resolve(&self, handle: &str) -> Option<&Codec>;

    /// Reject PTP strings without a trailing NUL code unit.
    fn strict_strings(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    I128,
    U128,
    Str,
}

impl PrimitiveKind {
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            PrimitiveKind::I8 | PrimitiveKind::U8 => Some(1),
            PrimitiveKind::I16 | PrimitiveKind::U16 => Some(2),
            PrimitiveKind::I32 | PrimitiveKind::U32 => Some(4),
            PrimitiveKind::I64 | PrimitiveKind::U64 => Some(8),
            PrimitiveKind::I128 | PrimitiveKind::U128 => Some(16),
            PrimitiveKind::Str => None,
        }
    }
}

/// One row of an enum table. Aliases may share a numeric value; the first
/// declared row wins on decode.
#[derive(Debug, Clone)]
pub struct EnumEntry {
    pub value: u64,
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone)]
pub struct EnumCodec {
    pub name: &'static str,
    pub base: CodecHandle,
    pub table: Vec<EnumEntry>,
}

/// One dataset field. Optional fields may be absent when the payload ends
/// early; they must form the tail of the declaration.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub codec: CodecHandle,
    pub optional: bool,
}

impl FieldDef {
    pub fn required(name: &'static str, codec: CodecHandle) -> FieldDef {
        FieldDef {
            name,
            codec,
            optional: false,
        }
    }

    pub fn optional(name: &'static str, codec: CodecHandle) -> FieldDef {
        FieldDef {
            name,
            codec,
            optional: true,
        }
    }
}

/// Opaque codec pair for vendor formats not reducible to the declarative
/// variants (event stream parsers, OSD image wrappers).
#[derive(Clone)]
pub struct CustomCodec {
    pub name: &'static str,
    pub encode: fn(&Value) -> Result<Vec<u8>, Error>,
    pub decode: fn(&[u8]) -> Result<(Value, usize), Error>,
}

impl std::fmt::Debug for CustomCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomCodec").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone)]
pub enum Codec {
    Primitive(PrimitiveKind),
    /// u32 element count, then that many values of the inner codec.
    Array(CodecHandle),
    Enum(EnumCodec),
    /// Ordered named fields, each with its own codec.
    Dataset(Vec<FieldDef>),
    Custom(CustomCodec),
}

fn resolve<'a, R: CodecResolver + ?Sized>(reg: &'a R, handle: &str) -> Result<&'a Codec, Error> {
    reg.resolve(handle)
        .ok_or_else(|| ValidationError::UnknownCodec(handle.to_owned()).into())
}

/// Build a numeric value of the given primitive width, range-checked.
fn value_of(kind: PrimitiveKind, n: u64) -> Option<Value> {
    match kind {
        PrimitiveKind::U8 => u8::try_from(n).ok().map(Value::UINT8),
        PrimitiveKind::U16 => u16::try_from(n).ok().map(Value::UINT16),
        PrimitiveKind::U32 => u32::try_from(n).ok().map(Value::UINT32),
        PrimitiveKind::U64 => Some(Value::UINT64(n)),
        PrimitiveKind::I8 => i8::try_from(n).ok().map(Value::INT8),
        PrimitiveKind::I16 => i16::try_from(n).ok().map(Value::INT16),
        PrimitiveKind::I32 => i32::try_from(n).ok().map(Value::INT32),
        PrimitiveKind::I64 => i64::try_from(n).ok().map(Value::INT64),
        _ => None,
    }
}

impl Codec {
    /// Encoded size when every instance is the same width; `None` for
    /// strings, arrays, datasets with variable fields, and custom codecs.
    pub fn fixed_size<R: CodecResolver + ?Sized>(&self, reg: &R) -> Option<usize> {
        match self {
            Codec::Primitive(kind) => kind.fixed_size(),
            Codec::Array(_) => None,
            Codec::Enum(e) => reg.resolve(e.base).and_then(|c| c.fixed_size(reg)),
            Codec::Dataset(fields) => {
                let mut total = 0;
                for f in fields {
                    if f.optional {
                        return None;
                    }
                    total += reg.resolve(f.codec).and_then(|c| c.fixed_size(reg))?;
                }
                Some(total)
            }
            Codec::Custom(_) => None,
        }
    }

    pub fn encode<R: CodecResolver + ?Sized>(&self, reg: &R, v: &Value) -> Result<Vec<u8>, Error> {
        match self {
            Codec::Primitive(kind) => encode_primitive(*kind, v),
            Codec::Array(inner) => {
                let inner = resolve(reg, inner)?;
                let kind = match inner {
                    Codec::Primitive(kind) => *kind,
                    _ => {
                        return Err(ValidationError::TypeMismatch {
                            codec: "array",
                            got: "non-primitive element codec",
                        }
                        .into())
                    }
                };
                let ok = matches!(
                    (kind, v),
                    (PrimitiveKind::I8, Value::AINT8(_))
                        | (PrimitiveKind::U8, Value::AUINT8(_))
                        | (PrimitiveKind::I16, Value::AINT16(_))
                        | (PrimitiveKind::U16, Value::AUINT16(_))
                        | (PrimitiveKind::I32, Value::AINT32(_))
                        | (PrimitiveKind::U32, Value::AUINT32(_))
                        | (PrimitiveKind::I64, Value::AINT64(_))
                        | (PrimitiveKind::U64, Value::AUINT64(_))
                        | (PrimitiveKind::I128, Value::AINT128(_))
                        | (PrimitiveKind::U128, Value::AUINT128(_))
                );
                if !ok {
                    return Err(ValidationError::TypeMismatch {
                        codec: "array",
                        got: v.kind_name(),
                    }
                    .into());
                }
                v.encode()
            }
            Codec::Enum(e) => {
                let base = resolve(reg, e.base)?;
                let kind = match base {
                    Codec::Primitive(kind) => *kind,
                    _ => {
                        return Err(ValidationError::TypeMismatch {
                            codec: e.name,
                            got: "non-primitive base codec",
                        }
                        .into())
                    }
                };
                match v {
                    Value::NAME(name) => {
                        let entry = e
                            .table
                            .iter()
                            .find(|entry| entry.name == name)
                            .ok_or_else(|| ValidationError::UnknownEnumName {
                                codec: e.name,
                                name: name.clone(),
                            })?;
                        let raw = value_of(kind, entry.value).ok_or(
                            ValidationError::TypeMismatch {
                                codec: e.name,
                                got: "table value outside base width",
                            },
                        )?;
                        raw.encode()
                    }
                    // Raw numerics pass through the base codec untouched
                    other => encode_primitive(kind, other),
                }
            }
            Codec::Dataset(fields) => {
                let record = v.as_record().ok_or(ValidationError::TypeMismatch {
                    codec: "dataset",
                    got: v.kind_name(),
                })?;
                let mut out = vec![];
                for f in fields {
                    match record.get(f.name) {
                        Some(fv) => {
                            let codec = resolve(reg, f.codec)?;
                            out.extend_from_slice(&codec.encode(reg, fv)?);
                        }
                        None if f.optional => break,
                        None => return Err(ValidationError::MissingField(f.name).into()),
                    }
                }
                Ok(out)
            }
            Codec::Custom(c) => (c.encode)(v),
        }
    }

    /// Decode one value, returning it with the number of bytes consumed.
    pub fn decode<R: CodecResolver + ?Sized>(
        &self,
        reg: &R,
        bytes: &[u8],
    ) -> Result<(Value, usize), Error> {
        match self {
            Codec::Primitive(kind) => {
                let mut cur = Cursor::new(bytes);
                let v = decode_primitive(*kind, reg.strict_strings(), &mut cur)?;
                Ok((v, cur.position() as usize))
            }
            Codec::Array(inner) => {
                let inner = resolve(reg, inner)?;
                let mut cur = Cursor::new(bytes);
                let count = cur.read_ptp_u32()?;
                let consumed_header = cur.position() as usize;
                if let Some(size) = inner.fixed_size(reg) {
                    let need = count as usize * size;
                    if bytes.len() - consumed_header < need {
                        return Err(ProtocolError::MalformedArray {
                            count,
                            remaining: bytes.len() - consumed_header,
                        }
                        .into());
                    }
                }
                // Fold primitive element runs back into the array value
                match inner {
                    Codec::Primitive(kind) if *kind != PrimitiveKind::Str => {
                        let mut cur = Cursor::new(bytes);
                        let v = decode_primitive_array(*kind, &mut cur)?;
                        Ok((v, cur.position() as usize))
                    }
                    _ => {
                        let mut consumed = consumed_header;
                        let mut items = vec![];
                        for _ in 0..count {
                            let (v, n) = inner.decode(reg, &bytes[consumed..])?;
                            items.push(v);
                            consumed += n;
                        }
                        // Non-primitive element types surface as a record list
                        let records = items
                            .into_iter()
                            .map(|v| match v {
                                Value::RECORD(r) => r,
                                other => {
                                    let mut r = Record::new();
                                    r.push("value", other);
                                    r
                                }
                            })
                            .collect();
                        Ok((Value::RECORDS(records), consumed))
                    }
                }
            }
            Codec::Enum(e) => {
                let base = resolve(reg, e.base)?;
                let (raw, consumed) = base.decode(reg, bytes)?;
                match raw.as_u64() {
                    Some(n) => match e.table.iter().find(|entry| entry.value == n) {
                        Some(entry) => Ok((Value::NAME(entry.name.to_owned()), consumed)),
                        // Unknown numerics keep their bits
                        None => Ok((raw, consumed)),
                    },
                    None => Ok((raw, consumed)),
                }
            }
            Codec::Dataset(fields) => {
                let mut record = Record::new();
                let mut consumed = 0;
                for f in fields {
                    if consumed == bytes.len() {
                        if f.optional {
                            continue;
                        }
                        return Err(ProtocolError::MalformedDataset(f.name).into());
                    }
                    let codec = resolve(reg, f.codec)?;
                    let (v, n) = codec
                        .decode(reg, &bytes[consumed..])
                        .map_err(|e| match e {
                            Error::Protocol(_) => ProtocolError::MalformedDataset(f.name).into(),
                            other => other,
                        })?;
                    record.push(f.name, v);
                    consumed += n;
                }
                Ok((Value::RECORD(record), consumed))
            }
            Codec::Custom(c) => (c.decode)(bytes),
        }
    }
}

fn encode_primitive(kind: PrimitiveKind, v: &Value) -> Result<Vec<u8>, Error> {
    let ok = matches!(
        (kind, v),
        (PrimitiveKind::I8, Value::INT8(_))
            | (PrimitiveKind::U8, Value::UINT8(_))
            | (PrimitiveKind::I16, Value::INT16(_))
            | (PrimitiveKind::U16, Value::UINT16(_))
            | (PrimitiveKind::I32, Value::INT32(_))
            | (PrimitiveKind::U32, Value::UINT32(_))
            | (PrimitiveKind::I64, Value::INT64(_))
            | (PrimitiveKind::U64, Value::UINT64(_))
            | (PrimitiveKind::I128, Value::INT128(_))
            | (PrimitiveKind::U128, Value::UINT128(_))
            | (PrimitiveKind::Str, Value::STR(_))
    );
    if !ok {
        return Err(ValidationError::TypeMismatch {
            codec: "primitive",
            got: v.kind_name(),
        }
        .into());
    }
    v.encode()
}

fn decode_primitive<T: PtpRead>(
    kind: PrimitiveKind,
    strict_strings: bool,
    cur: &mut T,
) -> Result<Value, Error> {
    Ok(match kind {
        PrimitiveKind::I8 => Value::INT8(cur.read_ptp_i8()?),
        PrimitiveKind::U8 => Value::UINT8(cur.read_ptp_u8()?),
        PrimitiveKind::I16 => Value::INT16(cur.read_ptp_i16()?),
        PrimitiveKind::U16 => Value::UINT16(cur.read_ptp_u16()?),
        PrimitiveKind::I32 => Value::INT32(cur.read_ptp_i32()?),
        PrimitiveKind::U32 => Value::UINT32(cur.read_ptp_u32()?),
        PrimitiveKind::I64 => Value::INT64(cur.read_ptp_i64()?),
        PrimitiveKind::U64 => Value::UINT64(cur.read_ptp_u64()?),
        PrimitiveKind::I128 => Value::INT128(cur.read_ptp_i128()?),
        PrimitiveKind::U128 => Value::UINT128(cur.read_ptp_u128()?),
        PrimitiveKind::Str => Value::STR(cur.read_ptp_str_policy(strict_strings)?),
    })
}

fn decode_primitive_array<T: PtpRead>(kind: PrimitiveKind, cur: &mut T) -> Result<Value, Error> {
    Ok(match kind {
        PrimitiveKind::I8 => Value::AINT8(cur.read_ptp_i8_vec()?),
        PrimitiveKind::U8 => Value::AUINT8(cur.read_ptp_u8_vec()?),
        PrimitiveKind::I16 => Value::AINT16(cur.read_ptp_i16_vec()?),
        PrimitiveKind::U16 => Value::AUINT16(cur.read_ptp_u16_vec()?),
        PrimitiveKind::I32 => Value::AINT32(cur.read_ptp_i32_vec()?),
        PrimitiveKind::U32 => Value::AUINT32(cur.read_ptp_u32_vec()?),
        PrimitiveKind::I64 => Value::AINT64(cur.read_ptp_i64_vec()?),
        PrimitiveKind::U64 => Value::AUINT64(cur.read_ptp_u64_vec()?),
        PrimitiveKind::I128 => Value::AINT128(cur.read_ptp_i128_vec()?),
        PrimitiveKind::U128 => Value::AUINT128(cur.read_ptp_u128_vec()?),
        PrimitiveKind::Str => unreachable!("string arrays decode element-wise"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapResolver {
        map: HashMap<&'static str, Codec>,
        strict: bool,
    }

    impl MapResolver {
        fn base() -> MapResolver {
            let mut map = HashMap::new();
            map.insert("uint8", Codec::Primitive(PrimitiveKind::U8));
            map.insert("uint16", Codec::Primitive(PrimitiveKind::U16));
            map.insert("uint32", Codec::Primitive(PrimitiveKind::U32));
            map.insert("string", Codec::Primitive(PrimitiveKind::Str));
            map.insert("auint16", Codec::Array("uint16"));
            map.insert("auint32", Codec::Array("uint32"));
            MapResolver { map, strict: false }
        }
    }

    impl CodecResolver for MapResolver {
        fn resolve(&self, handle: &str) -> Option<&Codec> {
            self.map.get(handle)
        }

        fn strict_strings(&self) -> bool {
            self.strict
        }
    }

    fn iso_enum() -> Codec {
        Codec::Enum(EnumCodec {
            name: "IsoValues",
            base: "uint16",
            table: vec![
                EnumEntry {
                    value: 100,
                    name: "ISO100",
                    description: "base sensitivity",
                },
                EnumEntry {
                    value: 400,
                    name: "ISO400",
                    description: "",
                },
                EnumEntry {
                    value: 400,
                    name: "ISO400H",
                    description: "alias for display",
                },
            ],
        })
    }

    #[test]
    fn primitive_round_trip_reports_consumed() {
        let reg = MapResolver::base();
        let codec = Codec::Primitive(PrimitiveKind::U32);
        let bytes = codec.encode(&reg, &Value::UINT32(0xDEAD_BEEF)).unwrap();
        let (v, n) = codec.decode(&reg, &bytes).unwrap();
        assert_eq!(v, Value::UINT32(0xDEAD_BEEF));
        assert_eq!(n, bytes.len());
    }

    #[test]
    fn primitive_rejects_wrong_variant() {
        let reg = MapResolver::base();
        let codec = Codec::Primitive(PrimitiveKind::U16);
        assert!(matches!(
            codec.encode(&reg, &Value::UINT32(1)),
            Err(Error::Validation(ValidationError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn enum_encode_decode_by_name() {
        let reg = MapResolver::base();
        let codec = iso_enum();
        let bytes = codec.encode(&reg, &Value::NAME("ISO400".into())).unwrap();
        assert_eq!(bytes, vec![0x90, 0x01]);
        let (v, n) = codec.decode(&reg, &bytes).unwrap();
        assert_eq!(v, Value::NAME("ISO400".into()));
        assert_eq!(n, 2);
    }

    #[test]
    fn enum_alias_first_declared_wins() {
        let reg = MapResolver::base();
        let codec = iso_enum();
        let via_alias = codec.encode(&reg, &Value::NAME("ISO400H".into())).unwrap();
        let (v, _) = codec.decode(&reg, &via_alias).unwrap();
        assert_eq!(v, Value::NAME("ISO400".into()));
    }

    #[test]
    fn enum_unknown_numeric_stays_raw() {
        let reg = MapResolver::base();
        let codec = iso_enum();
        let (v, _) = codec.decode(&reg, &[0x39, 0x30]).unwrap();
        assert_eq!(v, Value::UINT16(12345));
    }

    #[test]
    fn enum_unknown_name_fails_encode() {
        let reg = MapResolver::base();
        let codec = iso_enum();
        assert!(matches!(
            codec.encode(&reg, &Value::NAME("ISO51200".into())),
            Err(Error::Validation(ValidationError::UnknownEnumName { .. }))
        ));
    }

    #[test]
    fn array_count_overruns_payload() {
        let reg = MapResolver::base();
        let codec = Codec::Array("uint32");
        // claims 4 elements, carries 1
        let bytes = [0x04, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];
        assert!(matches!(
            codec.decode(&reg, &bytes),
            Err(Error::Protocol(ProtocolError::MalformedArray { .. }))
        ));
    }

    #[test]
    fn dataset_round_trip() {
        let reg = MapResolver::base();
        let codec = Codec::Dataset(vec![
            FieldDef::required("Version", "uint16"),
            FieldDef::required("Model", "string"),
            FieldDef::required("Formats", "auint16"),
        ]);
        let mut rec = Record::new();
        rec.push("Version", Value::UINT16(100));
        rec.push("Model", Value::STR("X100".into()));
        rec.push("Formats", Value::AUINT16(vec![0x3801, 0x3808]));
        let v = Value::RECORD(rec);
        let bytes = codec.encode(&reg, &v).unwrap();
        let (back, n) = codec.decode(&reg, &bytes).unwrap();
        assert_eq!(back, v);
        assert_eq!(n, bytes.len());
    }

    #[test]
    fn dataset_optional_tail_absent() {
        let reg = MapResolver::base();
        let codec = Codec::Dataset(vec![
            FieldDef::required("Code", "uint16"),
            FieldDef::optional("Extra", "uint32"),
        ]);
        let (v, n) = codec.decode(&reg, &[0x01, 0x20]).unwrap();
        assert_eq!(n, 2);
        let rec = v.as_record().unwrap();
        assert_eq!(rec.get("Code"), Some(&Value::UINT16(0x2001)));
        assert!(rec.get("Extra").is_none());
    }

    #[test]
    fn dataset_required_field_truncated() {
        let reg = MapResolver::base();
        let codec = Codec::Dataset(vec![
            FieldDef::required("Code", "uint16"),
            FieldDef::required("Extra", "uint32"),
        ]);
        assert!(matches!(
            codec.decode(&reg, &[0x01, 0x20]),
            Err(Error::Protocol(ProtocolError::MalformedDataset("Extra")))
        ));
    }

    #[test]
    fn strict_strings_flow_through_resolver() {
        let mut reg = MapResolver::base();
        reg.strict = true;
        let codec = Codec::Primitive(PrimitiveKind::Str);
        // 2 units, no trailing NUL
        let bytes = [0x02, b'H', 0x00, b'i', 0x00];
        assert!(codec.decode(&reg, &bytes).is_err());
    }

    #[test]
    fn custom_codec_dispatches() {
        fn enc(v: &Value) -> Result<Vec<u8>, Error> {
            match v {
                Value::AUINT8(b) => Ok(b.clone()),
                _ => Err(ValidationError::TypeMismatch {
                    codec: "blob",
                    got: v.kind_name(),
                }
                .into()),
            }
        }
        fn dec(bytes: &[u8]) -> Result<(Value, usize), Error> {
            Ok((Value::AUINT8(bytes.to_vec()), bytes.len()))
        }
        let reg = MapResolver::base();
        let codec = Codec::Custom(CustomCodec {
            name: "blob",
            encode: enc,
            decode: dec,
        });
        let bytes = codec.encode(&reg, &Value::AUINT8(vec![1, 2, 3])).unwrap();
        let (v, n) = codec.decode(&reg, &bytes).unwrap();
        assert_eq!(v, Value::AUINT8(vec![1, 2, 3]));
        assert_eq!(n, 3);
    }
}

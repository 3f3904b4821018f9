//! Hand-rolled length-prefixed binary encoding for `Value`. Every encoded
//! value starts with a one-byte type tag, followed by a fixed-width payload
//! for scalars or a `u32` length prefix plus bytes for variable-width
//! payloads. `Payload::Pointer` has no encoding and always fails.

use crate::error::{Error, Result};
use crate::types::{ComplexLogicalType, LogicalType};
use crate::value::{Payload, Value};
use bytes::{Buf, BufMut};

fn tag_of(ty: LogicalType) -> u8 {
    ty as u8
}

fn unknown_tag(tag: u8) -> Error {
    tracing::warn!(tag, "encountered unknown value type tag during deserialize");
    Error::UnknownTypeTag(tag)
}

fn type_from_tag(tag: u8) -> Result<LogicalType> {
    use LogicalType::*;
    const TABLE: &[LogicalType] = &[
        Na,
        Boolean,
        Tinyint,
        Smallint,
        Integer,
        Bigint,
        Hugeint,
        Utinyint,
        Usmallint,
        Uinteger,
        Ubigint,
        Uhugeint,
        Float,
        Double,
        Decimal,
        StringLiteral,
        Blob,
        TimestampSec,
        TimestampMs,
        TimestampUs,
        TimestampNs,
        Pointer,
        List,
        Array,
        Map,
        Struct,
        Union,
        Enum,
        Variant,
        Json,
    ];
    TABLE.get(tag as usize).copied().ok_or_else(|| unknown_tag(tag))
}

/// Appends `value`'s encoding to `buf`. Returns `Error::Unserializable` for
/// POINTER values.
pub fn serialize(value: &Value, buf: &mut impl BufMut) -> Result<()> {
    if value.type_().type_() == LogicalType::Pointer {
        return Err(Error::Unserializable);
    }
    buf.put_u8(tag_of(value.type_().type_()));
    buf.put_u8(value.is_null() as u8);
    if value.is_null() {
        return Ok(());
    }
    match value.payload() {
        Payload::Null | Payload::Pointer(_) => unreachable!("null/pointer handled above"),
        Payload::Bool(b) => buf.put_u8(*b as u8),
        Payload::Int8(v) => buf.put_i8(*v),
        Payload::Int16(v) => buf.put_i16_le(*v),
        Payload::Int32(v) => buf.put_i32_le(*v),
        Payload::Int64(v) => buf.put_i64_le(*v),
        Payload::Int128(v) => buf.put_i128_le(*v),
        Payload::UInt8(v) => buf.put_u8(*v),
        Payload::UInt16(v) => buf.put_u16_le(*v),
        Payload::UInt32(v) => buf.put_u32_le(*v),
        Payload::UInt64(v) => buf.put_u64_le(*v),
        Payload::UInt128(v) => buf.put_u128_le(*v),
        Payload::Float(v) => buf.put_f32_le(*v),
        Payload::Double(v) => buf.put_f64_le(*v),
        Payload::String(s) => {
            buf.put_u32_le(s.len() as u32);
            buf.put_slice(s.as_bytes());
        }
        Payload::Blob(b) => {
            buf.put_u32_le(b.len() as u32);
            buf.put_slice(b);
        }
        Payload::Children(children) => {
            buf.put_u32_le(children.len() as u32);
            for child in children.iter() {
                serialize(child, buf)?;
            }
        }
    }
    Ok(())
}

/// Reads one value from the front of `buf`, advancing it past the encoding.
pub fn deserialize(buf: &mut impl Buf) -> Result<Value> {
    require(buf, 2)?;
    let tag = buf.get_u8();
    let ty = type_from_tag(tag)?;
    let is_null = buf.get_u8() != 0;
    let logical = ComplexLogicalType::new(ty);
    if is_null {
        return Ok(Value::default_for(&logical).with_null_for_ser());
    }
    use LogicalType::*;
    let payload = match ty {
        Na | Pointer => return Err(Error::Unserializable),
        Boolean => {
            require(buf, 1)?;
            Payload::Bool(buf.get_u8() != 0)
        }
        Tinyint => {
            require(buf, 1)?;
            Payload::Int8(buf.get_i8())
        }
        Smallint => {
            require(buf, 2)?;
            Payload::Int16(buf.get_i16_le())
        }
        Integer => {
            require(buf, 4)?;
            Payload::Int32(buf.get_i32_le())
        }
        Bigint | TimestampSec | TimestampMs | TimestampUs | TimestampNs => {
            require(buf, 8)?;
            Payload::Int64(buf.get_i64_le())
        }
        Hugeint => {
            require(buf, 16)?;
            Payload::Int128(buf.get_i128_le())
        }
        Utinyint => {
            require(buf, 1)?;
            Payload::UInt8(buf.get_u8())
        }
        Usmallint => {
            require(buf, 2)?;
            Payload::UInt16(buf.get_u16_le())
        }
        Uinteger => {
            require(buf, 4)?;
            Payload::UInt32(buf.get_u32_le())
        }
        Ubigint => {
            require(buf, 8)?;
            Payload::UInt64(buf.get_u64_le())
        }
        Uhugeint => {
            require(buf, 16)?;
            Payload::UInt128(buf.get_u128_le())
        }
        Float => {
            require(buf, 4)?;
            Payload::Float(buf.get_f32_le())
        }
        Double | Decimal => {
            require(buf, 8)?;
            Payload::Double(buf.get_f64_le())
        }
        StringLiteral | Blob | Enum | Json => {
            require(buf, 4)?;
            let len = buf.get_u32_le() as usize;
            require(buf, len)?;
            let mut bytes = vec![0u8; len];
            buf.copy_to_slice(&mut bytes);
            if ty == Blob {
                Payload::Blob(Box::new(bytes))
            } else {
                Payload::String(Box::new(
                    String::from_utf8(bytes).map_err(|_| Error::Truncated {
                        expected: len,
                        found: 0,
                    })?,
                ))
            }
        }
        List | Array | Map | Struct | Union | Variant => {
            require(buf, 4)?;
            let count = buf.get_u32_le() as usize;
            let mut children = Vec::with_capacity(count);
            for _ in 0..count {
                children.push(deserialize(buf)?);
            }
            Payload::Children(Box::new(children))
        }
    };
    Ok(Value::from_raw_parts(logical, payload))
}

fn require(buf: &impl Buf, n: usize) -> Result<()> {
    if buf.remaining() < n {
        Err(Error::Truncated {
            expected: n,
            found: buf.remaining(),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use bytes::BytesMut;

    fn roundtrip(v: Value) -> Value {
        let mut buf = BytesMut::new();
        serialize(&v, &mut buf).unwrap();
        let mut frozen = buf.freeze();
        deserialize(&mut frozen).unwrap()
    }

    #[test]
    fn roundtrips_integers_and_floats() {
        assert_eq!(roundtrip(Value::from_i64(-42)).as_i64(), Some(-42));
        assert_eq!(roundtrip(Value::from_f64(3.5)).as_f64(), Some(3.5));
    }

    #[test]
    fn roundtrips_string() {
        let v = roundtrip(Value::from_string("hello"));
        assert_eq!(v.as_str(), Some("hello"));
    }

    #[test]
    fn roundtrips_null() {
        let v = roundtrip(Value::null());
        assert!(v.is_null());
    }

    #[test]
    fn pointer_is_unserializable() {
        let mut buf = BytesMut::new();
        let v = Value::from_children(ComplexLogicalType::new(LogicalType::Pointer), vec![]);
        assert!(matches!(serialize(&v, &mut buf), Err(Error::Unserializable)));
    }

    #[test]
    fn truncated_payload_errors() {
        let mut buf = BytesMut::new();
        buf.put_u8(tag_of(LogicalType::Integer));
        buf.put_u8(0);
        buf.put_u8(1);
        let mut frozen = buf.freeze();
        assert!(matches!(deserialize(&mut frozen), Err(Error::Truncated { .. })));
    }
}

use crate::error::{Error, Result};
use crate::types::{ComplexLogicalType, LogicalType, PhysicalType};
use std::cmp::Ordering;
use std::fmt;

/// Payload is the physical storage behind a `Value`: always matches the
/// logical type's physical projection.
#[derive(Debug, Clone)]
pub enum Payload {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    UInt128(u128),
    Float(f32),
    Double(f64),
    String(Box<String>),
    Blob(Box<Vec<u8>>),
    /// Backs list/array/map/struct/union/variant: an owned, ordered sequence
    /// of child values rather than a recursive pointer graph.
    Children(Box<Vec<Value>>),
    /// Opaque, unserializable.
    Pointer(usize),
}

/// Value is the tagged (type, payload) pair that every operator consumes
/// It is the substrate of arithmetic, comparison, cast, and
/// serialization.
#[derive(Debug, Clone)]
pub struct Value {
    ty: ComplexLogicalType,
    payload: Payload,
}

impl Value {
    pub fn type_(&self) -> &ComplexLogicalType {
        &self.ty
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn is_null(&self) -> bool {
        matches!(self.payload, Payload::Null)
    }

    /// Builds the zero/default value for `ty` — used both as the row-group
    /// backfill value on schema evolution and as the null-operand
    /// substitute in binary arithmetic (null semantics, below).
    pub fn default_for(ty: &ComplexLogicalType) -> Value {
        use LogicalType::*;
        let payload = match ty.type_() {
            Na | Pointer => Payload::Null,
            Boolean => Payload::Bool(false),
            Tinyint => Payload::Int8(0),
            Smallint => Payload::Int16(0),
            Integer => Payload::Int32(0),
            Bigint | TimestampSec | TimestampMs | TimestampUs | TimestampNs => Payload::Int64(0),
            Hugeint => Payload::Int128(0),
            Utinyint => Payload::UInt8(0),
            Usmallint => Payload::UInt16(0),
            Uinteger => Payload::UInt32(0),
            Ubigint => Payload::UInt64(0),
            Uhugeint => Payload::UInt128(0),
            Float => Payload::Float(0.0),
            Double | Decimal => Payload::Double(0.0),
            StringLiteral | Blob | Enum | Json => Payload::String(Box::new(String::new())),
            List | Array | Map | Struct | Union | Variant => Payload::Children(Box::new(Vec::new())),
        };
        Value {
            ty: ty.clone(),
            payload,
        }
    }

    pub fn null() -> Value {
        Value {
            ty: ComplexLogicalType::new(LogicalType::Na),
            payload: Payload::Null,
        }
    }

    pub fn from_bool(v: bool) -> Value {
        Value {
            ty: ComplexLogicalType::new(LogicalType::Boolean),
            payload: Payload::Bool(v),
        }
    }
    pub fn from_i32(v: i32) -> Value {
        Value {
            ty: ComplexLogicalType::new(LogicalType::Integer),
            payload: Payload::Int32(v),
        }
    }
    pub fn from_i64(v: i64) -> Value {
        Value {
            ty: ComplexLogicalType::new(LogicalType::Bigint),
            payload: Payload::Int64(v),
        }
    }
    pub fn from_u64(v: u64) -> Value {
        Value {
            ty: ComplexLogicalType::new(LogicalType::Ubigint),
            payload: Payload::UInt64(v),
        }
    }
    pub fn from_f32(v: f32) -> Value {
        Value {
            ty: ComplexLogicalType::new(LogicalType::Float),
            payload: Payload::Float(v),
        }
    }
    pub fn from_f64(v: f64) -> Value {
        Value {
            ty: ComplexLogicalType::new(LogicalType::Double),
            payload: Payload::Double(v),
        }
    }
    pub fn from_string(v: impl Into<String>) -> Value {
        Value {
            ty: ComplexLogicalType::new(LogicalType::StringLiteral),
            payload: Payload::String(Box::new(v.into())),
        }
    }
    pub fn from_blob(v: Vec<u8>) -> Value {
        Value {
            ty: ComplexLogicalType::new(LogicalType::Blob),
            payload: Payload::Blob(Box::new(v)),
        }
    }
    pub fn from_children(ty: ComplexLogicalType, children: Vec<Value>) -> Value {
        Value {
            ty,
            payload: Payload::Children(Box::new(children)),
        }
    }

    pub fn children(&self) -> &[Value] {
        match &self.payload {
            Payload::Children(c) => c,
            _ => &[],
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match &self.payload {
            Payload::Null => None,
            Payload::Bool(b) => Some(*b as i64 as f64),
            Payload::Int8(v) => Some(*v as f64),
            Payload::Int16(v) => Some(*v as f64),
            Payload::Int32(v) => Some(*v as f64),
            Payload::Int64(v) => Some(*v as f64),
            Payload::Int128(v) => Some(*v as f64),
            Payload::UInt8(v) => Some(*v as f64),
            Payload::UInt16(v) => Some(*v as f64),
            Payload::UInt32(v) => Some(*v as f64),
            Payload::UInt64(v) => Some(*v as f64),
            Payload::UInt128(v) => Some(*v as f64),
            Payload::Float(v) => Some(*v as f64),
            Payload::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match &self.payload {
            Payload::Bool(b) => Some(*b as i64),
            Payload::Int8(v) => Some(*v as i64),
            Payload::Int16(v) => Some(*v as i64),
            Payload::Int32(v) => Some(*v as i64),
            Payload::Int64(v) => Some(*v),
            Payload::UInt8(v) => Some(*v as i64),
            Payload::UInt16(v) => Some(*v as i64),
            Payload::UInt32(v) => Some(*v as i64),
            Payload::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            Payload::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.payload {
            Payload::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Renders a value for the GROUP BY key/COUNT(DISTINCT) hashing path
    /// (grounded on `columnar_group.cpp`'s `value_to_string`).
    pub fn to_group_key(&self) -> String {
        if self.is_null() {
            return "\u{0}NULL\u{0}".to_string();
        }
        match &self.payload {
            Payload::String(s) => s.as_ref().clone(),
            Payload::Bool(b) => b.to_string(),
            Payload::Int8(v) => v.to_string(),
            Payload::Int16(v) => v.to_string(),
            Payload::Int32(v) => v.to_string(),
            Payload::Int64(v) => v.to_string(),
            Payload::Int128(v) => v.to_string(),
            Payload::UInt8(v) => v.to_string(),
            Payload::UInt16(v) => v.to_string(),
            Payload::UInt32(v) => v.to_string(),
            Payload::UInt64(v) => v.to_string(),
            Payload::UInt128(v) => v.to_string(),
            Payload::Float(v) => v.to_string(),
            Payload::Double(v) => v.to_string(),
            Payload::Blob(b) => format!("{:?}", b),
            Payload::Children(_) => format!("type_{:?}", self.ty.type_()),
            Payload::Null | Payload::Pointer(_) => format!("type_{:?}", self.ty.type_()),
        }
    }

    /// cast_as converts a value into `target`; numeric↔numeric widens or
    /// narrows, duration↔duration converts units (modeled here as the
    /// integral timestamp types), struct↔struct is field-wise, everything
    /// else fails.
    pub fn cast_as(&self, target: &ComplexLogicalType) -> Result<Value> {
        if self.is_null() {
            return Ok(Value::default_for(target).with_null());
        }
        if self.ty.type_() == target.type_() {
            return Ok(self.clone());
        }
        use LogicalType::*;
        match (self.ty.type_(), target.type_()) {
            (a, b) if a.is_numeric() && b.is_numeric() => {
                let as_f = self.as_f64().expect("numeric payload has f64 projection");
                Ok(Value::from_numeric(target, as_f))
            }
            (TimestampSec | TimestampMs | TimestampUs | TimestampNs, b)
                if matches!(b, TimestampSec | TimestampMs | TimestampUs | TimestampNs) =>
            {
                let v = self.as_i64().unwrap_or(0);
                let scaled = rescale_timestamp(v, self.ty.type_(), b);
                Ok(Value {
                    ty: target.clone(),
                    payload: Payload::Int64(scaled),
                })
            }
            (Struct, Struct) => {
                let fields = self.children().to_vec();
                Ok(Value::from_children(target.clone(), fields))
            }
            (StringLiteral, StringLiteral) => Ok(self.clone()),
            (a, b) => Err(Error::InvalidCast { from: a, to: b }),
        }
    }

    fn with_null(mut self) -> Value {
        self.payload = Payload::Null;
        self
    }

    /// Used by `ser::deserialize` to rebuild a typed-but-null value.
    pub(crate) fn with_null_for_ser(self) -> Value {
        self.with_null()
    }

    /// Used by `ser::deserialize` to assemble a value from an already-typed
    /// payload read off the wire.
    pub(crate) fn from_raw_parts(ty: ComplexLogicalType, payload: Payload) -> Value {
        Value { ty, payload }
    }

    fn from_numeric(target: &ComplexLogicalType, v: f64) -> Value {
        use LogicalType::*;
        let payload = match target.type_() {
            Boolean => Payload::Bool(v != 0.0),
            Tinyint => Payload::Int8(v as i8),
            Smallint => Payload::Int16(v as i16),
            Integer => Payload::Int32(v as i32),
            Bigint => Payload::Int64(v as i64),
            Hugeint => Payload::Int128(v as i128),
            Utinyint => Payload::UInt8(v as u8),
            Usmallint => Payload::UInt16(v as u16),
            Uinteger => Payload::UInt32(v as u32),
            Ubigint => Payload::UInt64(v as u64),
            Uhugeint => Payload::UInt128(v as u128),
            Float => Payload::Float(v as f32),
            Double | Decimal => Payload::Double(v),
            _ => Payload::Double(v),
        };
        Value {
            ty: target.clone(),
            payload,
        }
    }

    /// compare orders two values with cross-type numeric promotion and
    /// float epsilon tolerance.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        if self.is_null() || other.is_null() {
            return Ok(match (self.is_null(), other.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => unreachable!(),
            });
        }
        match (&self.payload, &other.payload) {
            (Payload::String(a), Payload::String(b)) => Ok(a.cmp(b)),
            (Payload::Bool(a), Payload::Bool(b)) => Ok(a.cmp(b)),
            (Payload::Blob(a), Payload::Blob(b)) => Ok(a.cmp(b)),
            (a, b) if is_numeric_payload(a) && is_numeric_payload(b) => {
                let (x, y) = (self.as_f64().unwrap(), other.as_f64().unwrap());
                let wider_is_float = matches!(
                    (&self.payload, &other.payload),
                    (Payload::Float(_), _)
                        | (_, Payload::Float(_))
                        | (Payload::Double(_), _)
                        | (_, Payload::Double(_))
                );
                if wider_is_float && float_eq(x, y) {
                    Ok(Ordering::Equal)
                } else {
                    x.partial_cmp(&y).ok_or(Error::Unorderable(self.ty.type_()))
                }
            }
            _ => Err(Error::Unorderable(self.ty.type_())),
        }
    }

    fn numeric_op(
        &self,
        other: &Value,
        op: impl Fn(f64, f64) -> f64,
        name: &'static str,
    ) -> Result<Value> {
        let (a, b) = resolve_binary_operands(self, other, name)?;
        if a.is_null() && b.is_null() {
            return Ok(a);
        }
        let left = a.as_f64().ok_or_else(|| type_mismatch(&a, &b))?;
        let right = b.as_f64().ok_or_else(|| type_mismatch(&a, &b))?;
        let wider = wider_numeric_type(&a, &b);
        Ok(Value::from_numeric(&wider, op(left, right)))
    }

    pub fn sum(&self, other: &Value) -> Result<Value> {
        if let (Payload::String(a), Payload::String(b)) = (&self.payload, &other.payload) {
            return Ok(Value::from_string(format!("{}{}", a, b)));
        }
        self.numeric_op(other, |a, b| a + b, "sum")
    }

    pub fn sub(&self, other: &Value) -> Result<Value> {
        self.numeric_op(other, |a, b| a - b, "sub")
    }

    pub fn mul(&self, other: &Value) -> Result<Value> {
        self.numeric_op(other, |a, b| a * b, "mul")
    }

    pub fn div(&self, other: &Value) -> Result<Value> {
        let (a, b) = resolve_binary_operands(self, other, "div")?;
        if a.is_null() && b.is_null() {
            return Ok(a);
        }
        if b.ty.type_().is_integral() {
            let denom = b.as_i64().unwrap_or(0);
            if denom == 0 {
                return Err(Error::DivisionByZero);
            }
        }
        self.numeric_op(other, |x, y| x / y, "div")
    }

    pub fn modulo(&self, other: &Value) -> Result<Value> {
        let (a, b) = resolve_binary_operands(self, other, "mod")?;
        if a.is_null() && b.is_null() {
            return Ok(a);
        }
        if b.ty.type_().is_integral() {
            let denom = b.as_i64().unwrap_or(0);
            if denom == 0 {
                return Err(Error::DivisionByZero);
            }
        }
        self.numeric_op(other, |x, y| x % y, "mod")
    }

    pub fn pow(&self, other: &Value) -> Result<Value> {
        self.numeric_op(other, |a, b| a.powf(b), "pow")
    }

    pub fn sqrt(&self) -> Result<Value> {
        self.unary_op(|x| x.sqrt(), "sqrt")
    }

    pub fn cbrt(&self) -> Result<Value> {
        self.unary_op(|x| x.cbrt(), "cbrt")
    }

    pub fn factorial(&self) -> Result<Value> {
        self.unary_op(
            |x| {
                let n = x.round() as u64;
                (1..=n).fold(1.0_f64, |acc, v| acc * v as f64)
            },
            "factorial",
        )
    }

    pub fn abs(&self) -> Result<Value> {
        self.unary_op(|x| x.abs(), "abs")
    }

    fn unary_op(&self, op: impl Fn(f64) -> f64, name: &'static str) -> Result<Value> {
        if !self.ty.type_().is_numeric() {
            return Err(Error::TypeMismatch {
                left: self.ty.type_(),
                right: self.ty.type_(),
            });
        }
        let _ = name;
        if self.is_null() {
            return Ok(self.clone());
        }
        let v = self.as_f64().unwrap();
        Ok(Value::from_numeric(&self.ty, op(v)))
    }

    fn bitwise_op(&self, other: &Value, op: impl Fn(i64, i64) -> i64) -> Result<Value> {
        let (a, b) = resolve_binary_operands(self, other, "bitwise")?;
        if !a.ty.type_().is_integral() || !b.ty.type_().is_integral() {
            return Err(Error::TypeMismatch {
                left: a.ty.type_(),
                right: b.ty.type_(),
            });
        }
        if a.is_null() && b.is_null() {
            return Ok(a);
        }
        let left = a.as_i64().unwrap_or(0);
        let right = b.as_i64().unwrap_or(0);
        let wider = wider_numeric_type(&a, &b);
        Ok(Value::from_numeric(&wider, op(left, right) as f64))
    }

    pub fn and(&self, other: &Value) -> Result<Value> {
        self.bitwise_op(other, |a, b| a & b)
    }
    pub fn or(&self, other: &Value) -> Result<Value> {
        self.bitwise_op(other, |a, b| a | b)
    }
    pub fn xor(&self, other: &Value) -> Result<Value> {
        self.bitwise_op(other, |a, b| a ^ b)
    }
    pub fn shl(&self, other: &Value) -> Result<Value> {
        self.bitwise_op(other, |a, b| a << b)
    }
    pub fn shr(&self, other: &Value) -> Result<Value> {
        self.bitwise_op(other, |a, b| a >> b)
    }
    pub fn not(&self) -> Result<Value> {
        if !self.ty.type_().is_integral() {
            return Err(Error::TypeMismatch {
                left: self.ty.type_(),
                right: self.ty.type_(),
            });
        }
        if self.is_null() {
            return Ok(self.clone());
        }
        Ok(Value::from_numeric(&self.ty, !self.as_i64().unwrap_or(0) as f64))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ok(Ordering::Equal)
    }
}

fn is_numeric_payload(p: &Payload) -> bool {
    matches!(
        p,
        Payload::Int8(_)
            | Payload::Int16(_)
            | Payload::Int32(_)
            | Payload::Int64(_)
            | Payload::Int128(_)
            | Payload::UInt8(_)
            | Payload::UInt16(_)
            | Payload::UInt32(_)
            | Payload::UInt64(_)
            | Payload::UInt128(_)
            | Payload::Float(_)
            | Payload::Double(_)
            | Payload::Bool(_)
    )
}

fn float_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < f64::EPSILON
}

/// Null semantics: if one operand is null, substitute the
/// other's type zero; if both are null, the result is the null input.
fn resolve_binary_operands(a: &Value, b: &Value, op: &'static str) -> Result<(Value, Value)> {
    match (a.is_null(), b.is_null()) {
        (false, false) => {
            if !a.ty.type_().is_numeric() && !matches!(a.payload, Payload::String(_)) {
                return Err(type_mismatch(a, b));
            }
            if !b.ty.type_().is_numeric() && !matches!(b.payload, Payload::String(_)) {
                return Err(type_mismatch(a, b));
            }
            let _ = op;
            Ok((a.clone(), b.clone()))
        }
        (true, true) => Ok((a.clone(), b.clone())),
        (true, false) => Ok((Value::default_for(b.type_()), b.clone())),
        (false, true) => Ok((a.clone(), Value::default_for(a.type_()))),
    }
}

fn type_mismatch(a: &Value, b: &Value) -> Error {
    Error::TypeMismatch {
        left: a.ty.type_(),
        right: b.ty.type_(),
    }
}

fn wider_numeric_type(a: &Value, b: &Value) -> ComplexLogicalType {
    use LogicalType::*;
    let rank = |t: LogicalType| -> u8 {
        match t {
            Na => 0,
            Boolean => 1,
            Tinyint | Utinyint => 2,
            Smallint | Usmallint => 3,
            Integer | Uinteger => 4,
            Bigint | Ubigint => 5,
            Hugeint | Uhugeint => 6,
            Float => 7,
            Double | Decimal => 8,
            _ => 9,
        }
    };
    if rank(a.ty.type_()) >= rank(b.ty.type_()) {
        a.ty.clone()
    } else {
        b.ty.clone()
    }
}

fn rescale_timestamp(v: i64, from: LogicalType, to: LogicalType) -> i64 {
    use LogicalType::*;
    let unit_ns = |t: LogicalType| -> i64 {
        match t {
            TimestampSec => 1_000_000_000,
            TimestampMs => 1_000_000,
            TimestampUs => 1_000,
            TimestampNs => 1,
            _ => 1,
        }
    };
    let ns = v.saturating_mul(unit_ns(from));
    ns / unit_ns(to)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_group_key())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sum_is_commutative_over_numerics() {
        let a = Value::from_i64(3);
        let b = Value::from_f64(4.5);
        assert_eq!(a.sum(&b).unwrap().as_f64(), b.sum(&a).unwrap().as_f64());
    }

    #[test]
    fn sub_self_is_zero() {
        let a = Value::from_i64(7);
        let r = a.sub(&a).unwrap();
        assert_eq!(r.as_f64(), Some(0.0));
    }

    #[test]
    fn mul_by_one_is_identity() {
        let a = Value::from_f64(12.5);
        let one = Value::from_i64(1);
        assert_eq!(a.mul(&one).unwrap().as_f64(), Some(12.5));
    }

    #[test]
    fn null_operand_becomes_zero() {
        let a = Value::null();
        let b = Value::from_i64(5);
        let r = a.sum(&b).unwrap();
        assert_eq!(r.as_f64(), Some(5.0));
    }

    #[test]
    fn both_null_stays_null() {
        let a = Value::null();
        let b = Value::null();
        assert!(a.sum(&b).unwrap().is_null());
    }

    #[test]
    fn integer_division_by_zero_errors() {
        let a = Value::from_i64(1);
        let z = Value::from_i64(0);
        assert!(matches!(a.div(&z), Err(Error::DivisionByZero)));
    }

    #[test]
    fn float_division_by_zero_is_not_an_error() {
        let a = Value::from_f64(1.0);
        let z = Value::from_f64(0.0);
        assert!(a.div(&z).unwrap().as_f64().unwrap().is_infinite());
    }

    #[test]
    fn type_mismatch_on_non_numeric_arithmetic() {
        let a = Value::from_bool(true);
        let b = Value::from_bool(false);
        assert!(matches!(a.sum(&b), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn cross_type_numeric_equality() {
        let a = Value::from_i32(20);
        let b = Value::from_f64(20.0);
        assert_eq!(a.compare(&b).unwrap(), Ordering::Equal);
    }

    #[test]
    fn cast_numeric_widening() {
        let a = Value::from_i32(7);
        let target = ComplexLogicalType::new(LogicalType::Bigint);
        let r = a.cast_as(&target).unwrap();
        assert_eq!(r.as_i64(), Some(7));
    }

    #[test]
    fn cast_struct_to_unrelated_fails() {
        let a = Value::from_bool(true);
        let target = ComplexLogicalType::create_struct(vec![]);
        assert!(a.cast_as(&target).is_err());
    }
}

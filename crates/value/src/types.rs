use crate::error::{Error, Result};
use std::fmt;

/// LogicalType is the enumerated tag over every scalar and composite shape
/// a column or value can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogicalType {
    Na = 0,
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
}

/// PhysicalType is the storage projection used to pick a column's backing
/// buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    Float,
    Double,
    String,
    Struct,
    List,
    Array,
    Bit,
    Invalid,
}

impl LogicalType {
    /// Family used by dynamic-schema conflict detection.
    pub fn family(self) -> TypeFamily {
        use LogicalType::*;
        match self {
            Na => TypeFamily::None,
            Boolean => TypeFamily::Bool,
            Tinyint | Smallint | Integer | Bigint | Hugeint | Utinyint | Usmallint | Uinteger
            | Ubigint | Uhugeint => TypeFamily::Int,
            Float | Double | Decimal => TypeFamily::Float,
            StringLiteral | Blob | Json => TypeFamily::String,
            _ => TypeFamily::String,
        }
    }

    pub fn to_physical_type(self) -> PhysicalType {
        use LogicalType::*;
        match self {
            Na => PhysicalType::Invalid,
            Boolean => PhysicalType::Bool,
            Tinyint => PhysicalType::Int8,
            Smallint => PhysicalType::Int16,
            Integer => PhysicalType::Int32,
            Bigint => PhysicalType::Int64,
            Hugeint => PhysicalType::Int128,
            Utinyint => PhysicalType::UInt8,
            Usmallint => PhysicalType::UInt16,
            Uinteger => PhysicalType::UInt32,
            Ubigint => PhysicalType::UInt64,
            Uhugeint => PhysicalType::UInt128,
            Float => PhysicalType::Float,
            Double | Decimal => PhysicalType::Double,
            StringLiteral | Blob | Enum | Json => PhysicalType::String,
            TimestampSec | TimestampMs | TimestampUs | TimestampNs | Pointer => {
                PhysicalType::Int64
            }
            List => PhysicalType::List,
            Array => PhysicalType::Array,
            Map | Struct | Union | Variant => PhysicalType::Struct,
        }
    }

    /// Byte width of one flat element. Structs/lists/arrays/maps return 0:
    /// their payload lives in child columns, not this column's own buffer.
    pub fn size(self) -> usize {
        use PhysicalType::*;
        match self.to_physical_type() {
            Bool | Int8 | UInt8 => 1,
            Int16 | UInt16 => 2,
            Int32 | UInt32 | Float => 4,
            Int64 | UInt64 | Double => 8,
            Int128 | UInt128 => 16,
            String | Struct | List | Array | Bit | Invalid => 0,
        }
    }

    pub fn align(self) -> usize {
        match self.size() {
            0 => 1,
            n => n,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self.family(), TypeFamily::Int | TypeFamily::Float)
    }

    pub fn is_integral(self) -> bool {
        self.family() == TypeFamily::Int
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// TypeFamily groups logical types for schema-evolution conflict detection:
/// int subtypes collapse to one family, NA is neutral on merge, and crossing
/// families (bool vs int, int vs float) is a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    None,
    Bool,
    Int,
    Float,
    String,
}

impl TypeFamily {
    /// Merges an existing family with a newly observed one. `None` is
    /// neutral in either position; any other mismatch is a conflict.
    pub fn merge(self, other: TypeFamily) -> std::result::Result<TypeFamily, (TypeFamily, TypeFamily)> {
        match (self, other) {
            (TypeFamily::None, x) => Ok(x),
            (x, TypeFamily::None) => Ok(x),
            (a, b) if a == b => Ok(a),
            (a, b) => Err((a, b)),
        }
    }
}

/// TypeExtension carries the per-kind payload for composite logical types.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExtension {
    Array {
        inner: Box<ComplexLogicalType>,
        size: usize,
    },
    List {
        inner: Box<ComplexLogicalType>,
        field_id: u64,
        required: bool,
    },
    Map {
        key: Box<ComplexLogicalType>,
        value: Box<ComplexLogicalType>,
        key_id: u64,
        value_id: u64,
        required: bool,
    },
    Struct {
        fields: Vec<(String, ComplexLogicalType)>,
        descriptions: Vec<Option<String>>,
    },
    Decimal {
        width: u8,
        scale: u8,
    },
    Enum {
        entries: Vec<String>,
    },
    Union {
        variants: Vec<ComplexLogicalType>,
    },
    /// Fixed four-field layout: keys / children / values / data.
    Variant,
    User {
        catalog: String,
        modifiers: Vec<String>,
    },
    Function {
        ret: Box<ComplexLogicalType>,
        args: Vec<ComplexLogicalType>,
    },
    Generic,
}

/// ComplexLogicalType = (tag, optional alias, optional extension).
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexLogicalType {
    ty: LogicalType,
    alias: Option<String>,
    extension: Option<Box<TypeExtension>>,
}

impl ComplexLogicalType {
    pub fn new(ty: LogicalType) -> Self {
        ComplexLogicalType {
            ty,
            alias: None,
            extension: None,
        }
    }

    pub fn type_(&self) -> LogicalType {
        self.ty
    }

    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or("")
    }

    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = Some(alias.into());
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.set_alias(alias);
        self
    }

    pub fn extension(&self) -> Option<&TypeExtension> {
        self.extension.as_deref()
    }

    pub fn to_physical_type(&self) -> PhysicalType {
        self.ty.to_physical_type()
    }

    pub fn size(&self) -> usize {
        self.ty.size()
    }

    pub fn align(&self) -> usize {
        self.ty.align()
    }

    pub fn create_decimal(width: u8, scale: u8) -> Result<Self> {
        if width < scale {
            return Err(Error::InvalidDecimal { width, scale });
        }
        Ok(ComplexLogicalType {
            ty: LogicalType::Decimal,
            alias: None,
            extension: Some(Box::new(TypeExtension::Decimal { width, scale })),
        })
    }

    pub fn create_enum(entries: Vec<String>) -> Self {
        ComplexLogicalType {
            ty: LogicalType::Enum,
            alias: None,
            extension: Some(Box::new(TypeExtension::Enum { entries })),
        }
    }

    pub fn create_list(inner: ComplexLogicalType, field_id: u64, required: bool) -> Self {
        ComplexLogicalType {
            ty: LogicalType::List,
            alias: None,
            extension: Some(Box::new(TypeExtension::List {
                inner: Box::new(inner),
                field_id,
                required,
            })),
        }
    }

    pub fn create_array(inner: ComplexLogicalType, size: usize) -> Self {
        ComplexLogicalType {
            ty: LogicalType::Array,
            alias: None,
            extension: Some(Box::new(TypeExtension::Array {
                inner: Box::new(inner),
                size,
            })),
        }
    }

    pub fn create_map(
        key: ComplexLogicalType,
        value: ComplexLogicalType,
        key_id: u64,
        value_id: u64,
        required: bool,
    ) -> Self {
        ComplexLogicalType {
            ty: LogicalType::Map,
            alias: None,
            extension: Some(Box::new(TypeExtension::Map {
                key: Box::new(key),
                value: Box::new(value),
                key_id,
                value_id,
                required,
            })),
        }
    }

    pub fn create_struct(fields: Vec<(String, ComplexLogicalType)>) -> Self {
        let descriptions = vec![None; fields.len()];
        ComplexLogicalType {
            ty: LogicalType::Struct,
            alias: None,
            extension: Some(Box::new(TypeExtension::Struct {
                fields,
                descriptions,
            })),
        }
    }

    /// A UNION type prepends a hidden tag field ahead of the named variants.
    pub fn create_union(variants: Vec<ComplexLogicalType>) -> Self {
        ComplexLogicalType {
            ty: LogicalType::Union,
            alias: None,
            extension: Some(Box::new(TypeExtension::Union { variants })),
        }
    }

    /// VARIANT has a fixed four-field layout: keys / children / values / data.
    pub fn create_variant() -> Self {
        ComplexLogicalType {
            ty: LogicalType::Variant,
            alias: None,
            extension: Some(Box::new(TypeExtension::Variant)),
        }
    }
}

impl From<LogicalType> for ComplexLogicalType {
    fn from(ty: LogicalType) -> Self {
        ComplexLogicalType::new(ty)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn family_merge_neutral_on_null() {
        assert_eq!(TypeFamily::None.merge(TypeFamily::Int), Ok(TypeFamily::Int));
        assert_eq!(TypeFamily::Int.merge(TypeFamily::None), Ok(TypeFamily::Int));
    }

    #[test]
    fn family_merge_conflict() {
        assert!(TypeFamily::Bool.merge(TypeFamily::Int).is_err());
        assert!(TypeFamily::Int.merge(TypeFamily::Float).is_err());
    }

    #[test]
    fn int_subtypes_collapse_to_one_family() {
        assert_eq!(LogicalType::Tinyint.family(), TypeFamily::Int);
        assert_eq!(LogicalType::Ubigint.family(), TypeFamily::Int);
    }

    #[test]
    fn decimal_rejects_scale_over_width() {
        assert!(ComplexLogicalType::create_decimal(2, 5).is_err());
        assert!(ComplexLogicalType::create_decimal(5, 2).is_ok());
    }
}

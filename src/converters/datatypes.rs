//! XSD built-in data types
//!
//! The native scalar types a field may be declared with. Qualified names
//! of these types are never polymorphic, so the context service skips
//! them during `xsi:type` lookups.

use crate::namespaces::{QName, XSD_NAMESPACE};
use std::collections::HashMap;
use std::fmt;

/// XSD built-in type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// xs:anyType
    AnyType,
    /// xs:anySimpleType
    AnySimpleType,
    /// xs:anyAtomicType
    AnyAtomicType,
    /// xs:string
    String,
    /// xs:normalizedString
    NormalizedString,
    /// xs:token
    Token,
    /// xs:language
    Language,
    /// xs:Name
    Name,
    /// xs:NCName
    NCName,
    /// xs:ID
    Id,
    /// xs:IDREF
    IdRef,
    /// xs:IDREFS
    IdRefs,
    /// xs:ENTITY
    Entity,
    /// xs:ENTITIES
    Entities,
    /// xs:NMTOKEN
    NmToken,
    /// xs:NMTOKENS
    NmTokens,
    /// xs:anyURI
    AnyUri,
    /// xs:NOTATION
    Notation,
    /// xs:QName
    QName,
    /// xs:boolean
    Boolean,
    /// xs:decimal
    Decimal,
    /// xs:integer
    Integer,
    /// xs:long
    Long,
    /// xs:int
    Int,
    /// xs:short
    Short,
    /// xs:byte
    Byte,
    /// xs:nonNegativeInteger
    NonNegativeInteger,
    /// xs:positiveInteger
    PositiveInteger,
    /// xs:nonPositiveInteger
    NonPositiveInteger,
    /// xs:negativeInteger
    NegativeInteger,
    /// xs:unsignedLong
    UnsignedLong,
    /// xs:unsignedInt
    UnsignedInt,
    /// xs:unsignedShort
    UnsignedShort,
    /// xs:unsignedByte
    UnsignedByte,
    /// xs:float
    Float,
    /// xs:double
    Double,
    /// xs:duration
    Duration,
    /// xs:dateTime
    DateTime,
    /// xs:date
    Date,
    /// xs:time
    Time,
    /// xs:gYearMonth
    GYearMonth,
    /// xs:gYear
    GYear,
    /// xs:gMonthDay
    GMonthDay,
    /// xs:gDay
    GDay,
    /// xs:gMonth
    GMonth,
    /// xs:hexBinary
    HexBinary,
    /// xs:base64Binary
    Base64Binary,
}

const ALL_TYPES: &[DataType] = &[
    DataType::AnyType,
    DataType::AnySimpleType,
    DataType::AnyAtomicType,
    DataType::String,
    DataType::NormalizedString,
    DataType::Token,
    DataType::Language,
    DataType::Name,
    DataType::NCName,
    DataType::Id,
    DataType::IdRef,
    DataType::IdRefs,
    DataType::Entity,
    DataType::Entities,
    DataType::NmToken,
    DataType::NmTokens,
    DataType::AnyUri,
    DataType::Notation,
    DataType::QName,
    DataType::Boolean,
    DataType::Decimal,
    DataType::Integer,
    DataType::Long,
    DataType::Int,
    DataType::Short,
    DataType::Byte,
    DataType::NonNegativeInteger,
    DataType::PositiveInteger,
    DataType::NonPositiveInteger,
    DataType::NegativeInteger,
    DataType::UnsignedLong,
    DataType::UnsignedInt,
    DataType::UnsignedShort,
    DataType::UnsignedByte,
    DataType::Float,
    DataType::Double,
    DataType::Duration,
    DataType::DateTime,
    DataType::Date,
    DataType::Time,
    DataType::GYearMonth,
    DataType::GYear,
    DataType::GMonthDay,
    DataType::GDay,
    DataType::GMonth,
    DataType::HexBinary,
    DataType::Base64Binary,
];

lazy_static::lazy_static! {
    static ref TYPES_BY_CODE: HashMap<&'static str, DataType> =
        ALL_TYPES.iter().map(|dt| (dt.code(), *dt)).collect();
}

impl DataType {
    /// The XSD local name of the type
    pub fn code(&self) -> &'static str {
        match self {
            Self::AnyType => "anyType",
            Self::AnySimpleType => "anySimpleType",
            Self::AnyAtomicType => "anyAtomicType",
            Self::String => "string",
            Self::NormalizedString => "normalizedString",
            Self::Token => "token",
            Self::Language => "language",
            Self::Name => "Name",
            Self::NCName => "NCName",
            Self::Id => "ID",
            Self::IdRef => "IDREF",
            Self::IdRefs => "IDREFS",
            Self::Entity => "ENTITY",
            Self::Entities => "ENTITIES",
            Self::NmToken => "NMTOKEN",
            Self::NmTokens => "NMTOKENS",
            Self::AnyUri => "anyURI",
            Self::Notation => "NOTATION",
            Self::QName => "QName",
            Self::Boolean => "boolean",
            Self::Decimal => "decimal",
            Self::Integer => "integer",
            Self::Long => "long",
            Self::Int => "int",
            Self::Short => "short",
            Self::Byte => "byte",
            Self::NonNegativeInteger => "nonNegativeInteger",
            Self::PositiveInteger => "positiveInteger",
            Self::NonPositiveInteger => "nonPositiveInteger",
            Self::NegativeInteger => "negativeInteger",
            Self::UnsignedLong => "unsignedLong",
            Self::UnsignedInt => "unsignedInt",
            Self::UnsignedShort => "unsignedShort",
            Self::UnsignedByte => "unsignedByte",
            Self::Float => "float",
            Self::Double => "double",
            Self::Duration => "duration",
            Self::DateTime => "dateTime",
            Self::Date => "date",
            Self::Time => "time",
            Self::GYearMonth => "gYearMonth",
            Self::GYear => "gYear",
            Self::GMonthDay => "gMonthDay",
            Self::GDay => "gDay",
            Self::GMonth => "gMonth",
            Self::HexBinary => "hexBinary",
            Self::Base64Binary => "base64Binary",
        }
    }

    /// Look up a type by its XSD local name
    pub fn from_code(code: &str) -> Option<Self> {
        TYPES_BY_CODE.get(code).copied()
    }

    /// Look up a type by qualified name; only the XSD namespace matches
    pub fn from_qname(qname: &QName) -> Option<Self> {
        if qname.namespace() == Some(XSD_NAMESPACE) {
            Self::from_code(&qname.local_name)
        } else {
            None
        }
    }

    /// The qualified name of the type
    pub fn qname(&self) -> QName {
        QName::namespaced(XSD_NAMESPACE, self.code())
    }

    /// Inclusive integer bounds for the integer family
    pub fn integer_bounds(&self) -> Option<(i64, i64)> {
        match self {
            Self::Integer | Self::Long => Some((i64::MIN, i64::MAX)),
            Self::Int => Some((i32::MIN as i64, i32::MAX as i64)),
            Self::Short => Some((i16::MIN as i64, i16::MAX as i64)),
            Self::Byte => Some((i8::MIN as i64, i8::MAX as i64)),
            Self::NonNegativeInteger | Self::UnsignedLong => Some((0, i64::MAX)),
            Self::PositiveInteger => Some((1, i64::MAX)),
            Self::NonPositiveInteger => Some((i64::MIN, 0)),
            Self::NegativeInteger => Some((i64::MIN, -1)),
            Self::UnsignedInt => Some((0, u32::MAX as i64)),
            Self::UnsignedShort => Some((0, u16::MAX as i64)),
            Self::UnsignedByte => Some((0, u8::MAX as i64)),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xs:{}", self.code())
    }
}

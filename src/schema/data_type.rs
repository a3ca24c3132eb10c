//! Column data types and requirement flags.

use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Closed set of column data types.
///
/// The discriminants are the numeric codes used in the schema exchange
/// format and by external connectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    String = 0,
    Binary = 1,
    Byte = 2,
    Boolean = 3,
    Currency = 4,
    Date = 5,
    DateTime = 6,
    Decimal = 7,
    Double = 8,
    Guid = 9,
    Int16 = 10,
    Int32 = 11,
    Int64 = 12,
    Time = 17,
    OptionSet = 90,
    Reference = 91,
    Array = 92,
    Unknown = 99,
}

impl DataType {
    /// Numeric code of this type
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Type for a numeric code; unrecognised codes map to `Unknown`
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => DataType::String,
            1 => DataType::Binary,
            2 => DataType::Byte,
            3 => DataType::Boolean,
            4 => DataType::Currency,
            5 => DataType::Date,
            6 => DataType::DateTime,
            7 => DataType::Decimal,
            8 => DataType::Double,
            9 => DataType::Guid,
            10 => DataType::Int16,
            11 => DataType::Int32,
            12 => DataType::Int64,
            17 => DataType::Time,
            90 => DataType::OptionSet,
            91 => DataType::Reference,
            92 => DataType::Array,
            _ => DataType::Unknown,
        }
    }

    /// Whether this type is one of the integer types
    #[must_use]
    pub fn is_integer(self) -> bool {
        matches!(self, DataType::Byte | DataType::Int16 | DataType::Int32 | DataType::Int64)
    }

    /// Whether a column of this type can hold a primary key
    #[must_use]
    pub fn is_key_type(self) -> bool {
        matches!(
            self,
            DataType::Int32 | DataType::Int64 | DataType::Guid | DataType::String
        )
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Whether a value of type `actual` may be stored in a column of type `declared`.
///
/// Int64 accepts Int32 and Int16, Int32 accepts Int16. Every other pair must
/// match exactly, so the relation is not symmetric.
#[must_use]
pub fn is_equal_types(declared: DataType, actual: DataType) -> bool {
    if declared == actual {
        return true;
    }
    match declared {
        DataType::Int64 => matches!(actual, DataType::Int32 | DataType::Int16),
        DataType::Int32 => actual == DataType::Int16,
        _ => false,
    }
}

/// Column requirement flags.
///
/// A bitset; `SYSTEM_REQUIRED`, `REQUIRED_FOREIGN_KEY` and `PRIMARY_KEY`
/// are composites of the single flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Requirement(u32);

impl Requirement {
    pub const NONE: Requirement = Requirement(0);
    pub const RECOMMENDED: Requirement = Requirement(1);
    pub const REQUIRED: Requirement = Requirement(2);
    pub const UNIQUE_KEY: Requirement = Requirement(4);
    pub const READ_ONLY: Requirement = Requirement(8);
    pub const NOT_NULL: Requirement = Requirement(16);
    pub const FOREIGN_KEY: Requirement = Requirement(32);
    pub const SYSTEM_REQUIRED: Requirement = Requirement(19);
    pub const REQUIRED_FOREIGN_KEY: Requirement = Requirement(51);
    pub const PRIMARY_KEY: Requirement = Requirement(63);

    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn from_bits(bits: u32) -> Self {
        Requirement(bits)
    }

    /// Whether every flag of `other` is set in `self`
    #[must_use]
    pub fn contains(self, other: Requirement) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub fn is_required(self) -> bool {
        self.contains(Requirement::REQUIRED)
    }

    #[must_use]
    pub fn is_primary_key(self) -> bool {
        self.contains(Requirement::PRIMARY_KEY)
    }
}

impl BitOr for Requirement {
    type Output = Requirement;

    fn bitor(self, rhs: Requirement) -> Requirement {
        Requirement(self.0 | rhs.0)
    }
}

impl BitOrAssign for Requirement {
    fn bitor_assign(&mut self, rhs: Requirement) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Requirement {
    type Output = Requirement;

    fn bitand(self, rhs: Requirement) -> Requirement {
        Requirement(self.0 & rhs.0)
    }
}

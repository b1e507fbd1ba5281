//! Canonical SQL type system.
//!
//! Every dialect renders these canonical types into its own spelling and
//! normalizes its catalog type names back into them, so desired and
//! introspected columns always compare in one vocabulary.

use serde::{Deserialize, Serialize};

/// SQL data types supported by the schema engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// Small integer (16-bit).
    SmallInt,
    /// Integer (32-bit).
    Integer,
    /// Big integer (64-bit).
    BigInt,
    /// Floating point (single precision).
    Real,
    /// Floating point (double precision).
    Double,
    /// Exact numeric with optional precision and scale.
    Decimal {
        /// Total number of digits.
        precision: Option<u8>,
        /// Digits after the decimal point.
        scale: Option<u8>,
    },
    /// Fixed-length character string.
    Char(Option<u32>),
    /// Variable-length character string with optional max length.
    Varchar(Option<u32>),
    /// Unbounded text.
    Text,
    /// Boolean.
    Boolean,
    /// Date only.
    Date,
    /// Time only.
    Time,
    /// Date and time.
    Timestamp,
    /// Binary large object.
    Blob,
    /// JSON document.
    Json,
    /// UUID.
    Uuid,
    /// Enumeration over a fixed value set.
    Enum(Vec<String>),
}

impl SqlType {
    /// Returns `true` for the integer family.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::SmallInt | Self::Integer | Self::BigInt)
    }

    /// Returns `true` for character types (char, varchar, text).
    #[must_use]
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Char(_) | Self::Varchar(_) | Self::Text)
    }

    /// Returns the declared length for length-carrying types.
    #[must_use]
    pub fn length(&self) -> Option<u32> {
        match self {
            Self::Char(len) | Self::Varchar(len) => *len,
            _ => None,
        }
    }

    /// Returns a copy with the length replaced, for length-carrying types.
    /// Other types are returned unchanged.
    #[must_use]
    pub fn with_length(&self, len: u32) -> Self {
        match self {
            Self::Char(_) => Self::Char(Some(len)),
            Self::Varchar(_) => Self::Varchar(Some(len)),
            other => other.clone(),
        }
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Boolean(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// Raw SQL expression (e.g., `CURRENT_TIMESTAMP`).
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of the default value.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Boolean(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Expression(expr) => expr.clone(),
        }
    }
}

/// Foreign key referential action (ON DELETE, ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReferentialAction {
    /// No action.
    #[default]
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ReferentialAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// How every line of every input is interpreted for comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Lines are signed 32-bit integers.
    Integer,
    /// Lines are strings, compared by UTF-16 code unit.
    String,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("integer"),
            Self::String => f.write_str("string"),
        }
    }
}

impl FromStr for ValueKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "integer" | "int" | "i" => Ok(Self::Integer),
            "string" | "str" | "s" => Ok(Self::String),
            other => Err(TypeError::UnknownKind(other.to_string())),
        }
    }
}

/// Direction of the merged output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => f.write_str("ascending"),
            Self::Descending => f.write_str("descending"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascending" | "asc" | "a" => Ok(Self::Ascending),
            "descending" | "desc" | "d" => Ok(Self::Descending),
            other => Err(TypeError::UnknownOrder(other.to_string())),
        }
    }
}

/// A parsed line, ready for comparison.
///
/// Keys of different variants never meet within one run; integers are
/// simply placed before strings to keep the ordering total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey<'a> {
    Int(i32),
    Str(&'a str),
}

impl Ord for SortKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            // Code unit order: supplementary characters sort below U+E000..=U+FFFF.
            (Self::Str(a), Self::Str(b)) => a.encode_utf16().cmp(b.encode_utf16()),
            (Self::Int(_), Self::Str(_)) => Ordering::Less,
            (Self::Str(_), Self::Int(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for SortKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Run-wide comparison mode. Fixed before any source is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeMode {
    pub kind: ValueKind,
    #[serde(default)]
    pub order: SortOrder,
}

impl MergeMode {
    pub const fn new(kind: ValueKind, order: SortOrder) -> Self {
        Self { kind, order }
    }

    /// Parse a trimmed line into a comparable key.
    ///
    /// Integers must fit in an `i32`. In string mode every line is valid.
    pub fn key<'a>(&self, line: &'a str) -> Result<SortKey<'a>, TypeError> {
        match self.kind {
            ValueKind::Integer => line
                .parse::<i32>()
                .map(SortKey::Int)
                .map_err(|_| TypeError::NotAnInteger(line.to_string())),
            ValueKind::String => Ok(SortKey::Str(line)),
        }
    }

    /// Compare two keys in output order.
    ///
    /// `Less` means `a` must be written before `b`.
    pub fn compare(&self, a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
        match self.order {
            SortOrder::Ascending => a.cmp(b),
            SortOrder::Descending => b.cmp(a),
        }
    }

    /// Returns `true` if `front` may not precede `back` in a sorted source.
    pub fn is_out_of_order(&self, front: &SortKey<'_>, back: &SortKey<'_>) -> bool {
        self.compare(front, back) == Ordering::Greater
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.order)
    }
}

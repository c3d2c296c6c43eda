//! This module defines the canonical, type-safe representation of the column types
//! recognised by cellcast, together with the storage slots each of them occupies.
//!
//! The registry is a `const` table: it is built at compile time and never mutated.
//! The canonical keys are a persisted wire contract. Renaming one breaks every
//! stored source that uses it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CellcastError;

//==================================================================================
// 1. Storage Slots
//==================================================================================

/// One nullable field of a `GenericCell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Text,
    SignedInt16,
    MagnitudeUInt64,
    Float64A,
    Float64B,
    DateTime64,
    Bool,
}

impl Slot {
    pub const ALL: [Slot; 7] = [
        Slot::Text,
        Slot::SignedInt16,
        Slot::MagnitudeUInt64,
        Slot::Float64A,
        Slot::Float64B,
        Slot::DateTime64,
        Slot::Bool,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// The field name used by the persistence layer.
    pub fn column_name(self) -> &'static str {
        match self {
            Slot::Text => "text",
            Slot::SignedInt16 => "signed_int16",
            Slot::MagnitudeUInt64 => "magnitude_uint64",
            Slot::Float64A => "float64_a",
            Slot::Float64B => "float64_b",
            Slot::DateTime64 => "datetime64",
            Slot::Bool => "bool",
        }
    }
}

/// A set of slots, packed into one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SlotSet(u8);

impl SlotSet {
    pub const EMPTY: SlotSet = SlotSet(0);

    pub const fn of(slots: &[Slot]) -> SlotSet {
        let mut bits = 0u8;
        let mut i = 0;
        while i < slots.len() {
            bits |= slots[i].bit();
            i += 1;
        }
        SlotSet(bits)
    }

    pub fn insert(&mut self, slot: Slot) {
        self.0 |= slot.bit();
    }

    pub fn contains(&self, slot: Slot) -> bool {
        self.0 & slot.bit() != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Slot> + '_ {
        Slot::ALL.into_iter().filter(move |slot| self.contains(*slot))
    }

    /// Slots present in `self` but not in `other`.
    pub fn difference(&self, other: SlotSet) -> SlotSet {
        SlotSet(self.0 & !other.0)
    }
}

impl fmt::Display for SlotSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Slot::column_name).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

//==================================================================================
// 2. Dtype
//==================================================================================

/// The closed set of column types. Matched exhaustively by the codec and the
/// sort key resolver, so a new variant cannot silently reach storage.
///
/// Deserialization goes through `FromStr`, so legacy keys are accepted and an
/// unknown key is reported as `UnsupportedDtypeAtDecode`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String")]
pub enum Dtype {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "category")]
    Category,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "uint8")]
    UInt8,
    #[serde(rename = "uint16")]
    UInt16,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "uint64")]
    UInt64,
    #[serde(rename = "int8")]
    Int8,
    #[serde(rename = "int16")]
    Int16,
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "float32")]
    Float32,
    #[serde(rename = "float64")]
    Float64,
    #[serde(rename = "complex128")]
    Complex128,
    #[serde(rename = "datetime")]
    DateTime,
    #[serde(rename = "duration")]
    Duration,
}

/// One row of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtypeInfo {
    pub dtype: Dtype,
    pub key: &'static str,
    pub label: &'static str,
    pub significant: SlotSet,
}

const TEXT_SLOTS: SlotSet = SlotSet::of(&[Slot::Text]);
const BOOL_SLOTS: SlotSet = SlotSet::of(&[Slot::Bool]);
const UINT_SLOTS: SlotSet = SlotSet::of(&[Slot::MagnitudeUInt64]);
const INT_SLOTS: SlotSet = SlotSet::of(&[Slot::MagnitudeUInt64, Slot::SignedInt16]);
const FLOAT_SLOTS: SlotSet = SlotSet::of(&[Slot::Float64A]);
const COMPLEX_SLOTS: SlotSet = SlotSet::of(&[Slot::Float64A, Slot::Float64B]);
const DATETIME_SLOTS: SlotSet = SlotSet::of(&[Slot::DateTime64]);
const DURATION_SLOTS: SlotSet = SlotSet::of(&[Slot::MagnitudeUInt64]);

const fn entry(dtype: Dtype, key: &'static str, label: &'static str, significant: SlotSet) -> DtypeInfo {
    DtypeInfo {
        dtype,
        key,
        label,
        significant,
    }
}

/// The process-wide dtype registry, in declaration order.
pub const REGISTRY: [DtypeInfo; 16] = [
    entry(Dtype::Text, "text", "Text", TEXT_SLOTS),
    entry(Dtype::Category, "category", "Category", TEXT_SLOTS),
    entry(Dtype::Bool, "bool", "Boolean", BOOL_SLOTS),
    entry(Dtype::UInt8, "uint8", "Unsigned 8 bit Integer", UINT_SLOTS),
    entry(Dtype::UInt16, "uint16", "Unsigned 16 bit Integer", UINT_SLOTS),
    entry(Dtype::UInt32, "uint32", "Unsigned 32 bit Integer", UINT_SLOTS),
    entry(Dtype::UInt64, "uint64", "Unsigned 64 bit Integer", UINT_SLOTS),
    entry(Dtype::Int8, "int8", "Signed 8 bit Integer", INT_SLOTS),
    entry(Dtype::Int16, "int16", "Signed 16 bit Integer", INT_SLOTS),
    entry(Dtype::Int32, "int32", "Signed 32 bit Integer", INT_SLOTS),
    entry(Dtype::Int64, "int64", "Signed 64 bit Integer", INT_SLOTS),
    entry(Dtype::Float32, "float32", "32 bit Floating Number", FLOAT_SLOTS),
    entry(Dtype::Float64, "float64", "64 bit Floating Number", FLOAT_SLOTS),
    entry(Dtype::Complex128, "complex128", "Complex Number", COMPLEX_SLOTS),
    entry(Dtype::DateTime, "datetime", "Date and Time", DATETIME_SLOTS),
    entry(Dtype::Duration, "duration", "Time Delta", DURATION_SLOTS),
];

impl Dtype {
    /// Unsigned integer dtypes, narrowest first.
    pub const UNSIGNED: [Dtype; 4] = [Dtype::UInt8, Dtype::UInt16, Dtype::UInt32, Dtype::UInt64];
    /// Signed integer dtypes, narrowest first.
    pub const SIGNED: [Dtype; 4] = [Dtype::Int8, Dtype::Int16, Dtype::Int32, Dtype::Int64];

    pub fn info(&self) -> &'static DtypeInfo {
        // REGISTRY is in declaration order, so the discriminant is the index.
        &REGISTRY[*self as usize]
    }

    /// The canonical, persisted key.
    pub fn key(&self) -> &'static str {
        self.info().key
    }

    /// The human readable label shown to users.
    pub fn label(&self) -> &'static str {
        self.info().label
    }

    /// The slots that must be non-null for a cell of this dtype.
    pub fn significant_slots(&self) -> SlotSet {
        self.info().significant
    }

    pub fn is_unsigned_int(&self) -> bool {
        matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
    }

    pub fn is_signed_int(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Inclusive value range of an integer dtype, widened to `i128`.
    pub fn int_range(&self) -> Option<(i128, i128)> {
        match self {
            Self::UInt8 => Some((0, u8::MAX as i128)),
            Self::UInt16 => Some((0, u16::MAX as i128)),
            Self::UInt32 => Some((0, u32::MAX as i128)),
            Self::UInt64 => Some((0, u64::MAX as i128)),
            Self::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            _ => None,
        }
    }
}

/// Provides the canonical string representation for a `Dtype`.
impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Dtype {
    type Err = CellcastError;

    /// Parses a canonical key, or one of the legacy keys written by older
    /// versions of the store (`object`, `datetime64[ns]`, `timedelta64[ns]`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "object" => "text",
            "datetime64[ns]" => "datetime",
            "timedelta64[ns]" => "duration",
            other => other,
        };
        REGISTRY
            .iter()
            .find(|info| info.key == key)
            .map(|info| info.dtype)
            .ok_or_else(|| CellcastError::UnsupportedDtypeAtDecode(s.to_string()))
    }
}

impl TryFrom<String> for Dtype {
    type Error = CellcastError;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        key.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_in_declaration_order() {
        for (idx, info) in REGISTRY.iter().enumerate() {
            assert_eq!(info.dtype as usize, idx, "registry row {} is out of order", info.key);
        }
    }

    #[test]
    fn test_keys_roundtrip_through_from_str_and_serde() {
        for info in REGISTRY.iter() {
            assert_eq!(info.key.parse::<Dtype>().unwrap(), info.dtype);
            let json = serde_json::to_string(&info.dtype).unwrap();
            assert_eq!(json, format!("\"{}\"", info.key));
            assert_eq!(serde_json::from_str::<Dtype>(&json).unwrap(), info.dtype);
        }
    }

    #[test]
    fn test_legacy_keys_are_accepted() {
        assert_eq!("object".parse::<Dtype>().unwrap(), Dtype::Text);
        assert_eq!("datetime64[ns]".parse::<Dtype>().unwrap(), Dtype::DateTime);
        assert_eq!(
            serde_json::from_str::<Dtype>("\"timedelta64[ns]\"").unwrap(),
            Dtype::Duration
        );
    }

    #[test]
    fn test_unknown_key_is_unsupported() {
        let err = "decimal128".parse::<Dtype>().unwrap_err();
        assert!(matches!(err, CellcastError::UnsupportedDtypeAtDecode(k) if k == "decimal128"));

        let err = serde_json::from_str::<Dtype>("\"decimal128\"").unwrap_err();
        assert!(err.to_string().contains("Unsupported dtype at decode"), "{}", err);
    }

    #[test]
    fn test_significant_slots() {
        assert_eq!(Dtype::Text.significant_slots(), SlotSet::of(&[Slot::Text]));
        assert_eq!(
            Dtype::Int16.significant_slots(),
            SlotSet::of(&[Slot::SignedInt16, Slot::MagnitudeUInt64])
        );
        assert_eq!(Dtype::Complex128.significant_slots().len(), 2);
        assert_eq!(
            Dtype::Duration.significant_slots(),
            Dtype::UInt64.significant_slots()
        );
        assert_eq!(Dtype::Float32.label(), "32 bit Floating Number");
    }
}

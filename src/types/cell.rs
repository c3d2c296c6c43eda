//! Storage-facing records: the column descriptor and the generic cell.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dtype::{Dtype, Slot, SlotSet};

/// Metadata for one column of an ingested source.
///
/// `(source_id, index)` is unique, and `name` is unique within a source.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub source_id: String,
    /// 0-based position of the column in the source table.
    pub index: u32,
    pub name: String,
    pub dtype: Dtype,
    /// A non-fatal force-cast failure for this column, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The dtype-agnostic storage form of one `(row, column)` value.
///
/// Which slots are populated is decided entirely by the owning column's dtype;
/// see `Dtype::significant_slots`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct GenericCell {
    /// Index of the owning column within its source.
    pub column: u32,
    /// Dense per column: rows `0..N-1`.
    pub row: u64,
    #[serde(default)]
    pub text: Option<String>,
    /// `+1` or `-1`.
    #[serde(default)]
    pub signed_int16: Option<i16>,
    #[serde(default)]
    pub magnitude_uint64: Option<u64>,
    #[serde(default, with = "float_slot")]
    pub float64_a: Option<f64>,
    /// Imaginary part for complex cells.
    #[serde(default, with = "float_slot")]
    pub float64_b: Option<f64>,
    #[serde(default)]
    pub datetime64: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bool: Option<bool>,
}

/// JSON has no NaN or infinity, so non-finite floats travel as strings
/// (`"NaN"`, `"inf"`, `"-inf"`) and `null` keeps meaning "slot unused".
mod float_slot {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) if v.is_finite() => serializer.serialize_f64(*v),
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Repr::Number(v)) => Ok(Some(v)),
            Some(Repr::Text(s)) => s.parse::<f64>().map(Some).map_err(de::Error::custom),
        }
    }
}

impl GenericCell {
    /// An empty cell, every slot null.
    pub fn new(column: u32, row: u64) -> Self {
        Self {
            column,
            row,
            ..Default::default()
        }
    }

    pub fn is_populated(&self, slot: Slot) -> bool {
        match slot {
            Slot::Text => self.text.is_some(),
            Slot::SignedInt16 => self.signed_int16.is_some(),
            Slot::MagnitudeUInt64 => self.magnitude_uint64.is_some(),
            Slot::Float64A => self.float64_a.is_some(),
            Slot::Float64B => self.float64_b.is_some(),
            Slot::DateTime64 => self.datetime64.is_some(),
            Slot::Bool => self.bool.is_some(),
        }
    }

    /// The set of non-null slots.
    pub fn populated_slots(&self) -> SlotSet {
        let mut set = SlotSet::EMPTY;
        for slot in Slot::ALL {
            if self.is_populated(slot) {
                set.insert(slot);
            }
        }
        set
    }
}

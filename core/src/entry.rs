//! Weighted entries and their canonical ordering.

use std::cmp::Ordering;

#[cfg(feature = "bincode")]
use bincode::{Decode, Encode};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::encoding::{
    decode_uvarint, decode_varray, encode_uvarint, encode_varray, expect_end,
};
use crate::error::EncodingError;

/// One branch of a threshold: an opaque wire string and the weight it
/// contributes when it verifies.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WeightedEntry {
    /// Voting weight.
    pub weight: u64,

    /// Fulfillment or condition string.
    pub value: String,
}

impl WeightedEntry {
    pub fn new(weight: u64, value: impl Into<String>) -> Self {
        Self {
            weight,
            value: value.into(),
        }
    }

    /// Encodes as the 2-item varray `[uvarint(weight), value]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode_varray([encode_uvarint(self.weight).as_slice(), self.value.as_bytes()])
    }

    /// Decodes the 2-item varray produced by [`WeightedEntry::to_bytes`].
    pub fn from_bytes(buf: &[u8]) -> Result<Self, EncodingError> {
        let fields = decode_varray(buf)?;
        let [weight, value] = fields.as_slice() else {
            return Err(EncodingError::EntryShape(fields.len()));
        };

        let (weight_value, consumed) = decode_uvarint(weight)?;
        expect_end(&weight[consumed..])?;

        let value = std::str::from_utf8(value).map_err(|_| EncodingError::InvalidUtf8)?;
        Ok(Self::new(weight_value, value))
    }
}

/// Canonical order on entry values: shorter first, then byte-wise.
pub fn canonical_cmp(a: &str, b: &str) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

/// Canonical order on entries: [`canonical_cmp`] on the value, then weight.
///
/// Equal values with different weights must still order deterministically,
/// otherwise two equal multisets could serialize differently.
pub fn entry_cmp(a: &WeightedEntry, b: &WeightedEntry) -> Ordering {
    canonical_cmp(&a.value, &b.value).then_with(|| a.weight.cmp(&b.weight))
}

/// Stable sort by [`entry_cmp`].
///
/// Duplicates are kept in their prior relative order.
pub fn sort_entries(mut entries: Vec<WeightedEntry>) -> Vec<WeightedEntry> {
    entries.sort_by(entry_cmp);
    entries
}

/// Encodes a list of entries as a varray, in the order given.
pub fn encode_entries(entries: &[WeightedEntry]) -> Vec<u8> {
    encode_varray(entries.iter().map(WeightedEntry::to_bytes))
}

/// Decodes a varray of entries.
pub fn decode_entries(buf: &[u8]) -> Result<Vec<WeightedEntry>, EncodingError> {
    decode_varray(buf)?
        .into_iter()
        .map(WeightedEntry::from_bytes)
        .collect()
}

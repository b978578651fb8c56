//! Crypto-Conditions: canonical encoding, parsing and verification of
//! preimage, Ed25519 and weighted threshold conditions.
//!
//! A party publishes a [`Condition`] string up front; a later
//! [`Fulfillment`] string proves it. Both are deterministic, so two
//! independent implementations agree byte-for-byte on every string.

/// Condition types, fulfillment dispatch and verification
pub mod condition;
/// Verifier tunables and their JSON loader
pub mod config;
/// uvarint, varbyte, varray and base64url wire codecs
pub mod encoding;
/// Weighted threshold entries and their canonical order
pub mod entry;
/// Crate and codec error types
pub mod error;

pub use condition::{
    fulfillment_to_condition, validate_fulfillment, Condition, ConditionType, Ed25519Sha256,
    Fulfillment, PreimageSha256, ThresholdSha256, Verifier,
};
pub use config::{VerifierConfig, MAX_DEPTH};
pub use entry::WeightedEntry;
pub use error::{EncodingError, Error};

pub type Result<T> = std::result::Result<T, Error>;

//! Condition types, fulfillment dispatch and depth-bounded verification.
//!
//! A [`Condition`] is the public commitment `cc:1:<type>:<fingerprint>:<maxlen>`.
//! A [`Fulfillment`] is the proof that, once verified, derives exactly that
//! string. [`fulfillment_to_condition`] is the single entry point that routes
//! a fulfillment string to its type and is also the recursion point used by
//! threshold fulfillments for their branches.
//!
//! # Example
//!
//! ```
//! use cryptocond_core::condition::{fulfillment_to_condition, hashlock};
//!
//! let fulfillment = hashlock::make_fulfillment(b"foo");
//! assert_eq!(fulfillment, "cf:1:1:Zm9v");
//!
//! let condition = fulfillment_to_condition(&fulfillment).unwrap();
//! assert_eq!(condition, "cc:1:1:LCa0a2j_xo_5m0U8HTBBNBNCLXBkg7-g-YpeiGJm564=:11");
//! ```

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "bincode")]
use bincode::{Decode, Encode};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{trace, warn};

pub mod ed25519;
pub mod hashlock;
pub mod threshold;

pub use ed25519::Ed25519Sha256;
pub use hashlock::PreimageSha256;
pub use threshold::ThresholdSha256;

use crate::config::VerifierConfig;
use crate::encoding::{
    decode_b64, encode_b64_padded, fulfillment_type_id, parse_length, split_wire, CONDITION_TAG,
    VERSION,
};
use crate::error::{EncodingError, Error};
use crate::Result;

/// Length of every fingerprint: a SHA-256 digest.
pub const FINGERPRINT_LEN: usize = 32;

/// The closed registry of condition types in format version 1.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "kebab-case"))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionType {
    /// SHA-256 hash-lock.
    PreimageSha256,
    /// Reserved; no implementation exists.
    RsaSha256,
    /// Weighted M-of-N over nested conditions.
    ThresholdSha256,
    /// Ed25519 signature over a fixed and a dynamic message.
    Ed25519Sha256,
}

impl ConditionType {
    /// Numeric type id as it appears on the wire.
    pub const fn id(self) -> u8 {
        match self {
            Self::PreimageSha256 => 1,
            Self::RsaSha256 => 3,
            Self::ThresholdSha256 => 4,
            Self::Ed25519Sha256 => 8,
        }
    }

    /// Looks up a wire type id.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedType`] for any id outside the registry.
    pub fn from_id(id: &str) -> Result<Self> {
        match id {
            "1" => Ok(Self::PreimageSha256),
            "3" => Ok(Self::RsaSha256),
            "4" => Ok(Self::ThresholdSha256),
            "8" => Ok(Self::Ed25519Sha256),
            other => Err(Error::UnsupportedType(other.to_string())),
        }
    }

    /// Fails unless the wire type id `found` names `self`.
    pub(crate) fn expect(self, found: &str) -> Result<()> {
        if found == self.to_string() {
            Ok(())
        } else {
            Err(EncodingError::WrongType {
                expected: self.id(),
                found: found.to_string(),
            }
            .into())
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// The canonical `(type, fingerprint, max fulfillment length)` triple.
///
/// Renders as `cc:1:<type>:<base64url(fingerprint)>:<maxlen>` and never
/// carries secret material, so it is what gets stored or sent ahead of time.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(into = "String", try_from = "String"))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Condition {
    pub condition_type: ConditionType,
    pub fingerprint: [u8; FINGERPRINT_LEN],
    pub max_fulfillment_length: u64,
}

impl Condition {
    pub fn new(
        condition_type: ConditionType,
        fingerprint: [u8; FINGERPRINT_LEN],
        max_fulfillment_length: u64,
    ) -> Self {
        Self {
            condition_type,
            fingerprint,
            max_fulfillment_length,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            CONDITION_TAG,
            VERSION,
            self.condition_type,
            encode_b64_padded(&self.fingerprint),
            self.max_fulfillment_length
        )
    }
}

impl FromStr for Condition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = split_wire(s, CONDITION_TAG, 5)?;
        let condition_type = ConditionType::from_id(parts[2])?;

        let fingerprint = decode_b64(parts[3])?;
        let fingerprint: [u8; FINGERPRINT_LEN] =
            fingerprint
                .as_slice()
                .try_into()
                .map_err(|_| EncodingError::FieldLength {
                    field: "fingerprint",
                    expected: FINGERPRINT_LEN,
                    found: fingerprint.len(),
                })?;

        let max_fulfillment_length = parse_length(parts[4])?;
        Ok(Self::new(condition_type, fingerprint, max_fulfillment_length))
    }
}

impl From<Condition> for String {
    fn from(value: Condition) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Condition {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// A verified proof of one of the implemented condition types.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(tag = "type", content = "data", rename_all = "kebab-case"))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fulfillment {
    Preimage(PreimageSha256),
    Ed25519(Ed25519Sha256),
    Threshold(ThresholdSha256),
}

impl Fulfillment {
    pub fn condition_type(&self) -> ConditionType {
        match self {
            Self::Preimage(_) => ConditionType::PreimageSha256,
            Self::Ed25519(_) => ConditionType::Ed25519Sha256,
            Self::Threshold(_) => ConditionType::ThresholdSha256,
        }
    }

    /// Derives the condition this fulfillment satisfies.
    pub fn condition(&self) -> Condition {
        match self {
            Self::Preimage(f) => f.condition(),
            Self::Ed25519(f) => f.condition(),
            Self::Threshold(f) => f.condition(),
        }
    }

    /// Canonical wire string.
    pub fn serialize(&self) -> String {
        match self {
            Self::Preimage(f) => f.serialize(),
            Self::Ed25519(f) => f.serialize(),
            Self::Threshold(f) => f.serialize(),
        }
    }
}

impl fmt::Display for Fulfillment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromStr for Fulfillment {
    type Err = Error;

    /// Parses and fully verifies with the default [`VerifierConfig`].
    fn from_str(s: &str) -> Result<Self> {
        Verifier::default().parse(s)
    }
}

impl From<PreimageSha256> for Fulfillment {
    fn from(value: PreimageSha256) -> Self {
        Self::Preimage(value)
    }
}

impl From<Ed25519Sha256> for Fulfillment {
    fn from(value: Ed25519Sha256) -> Self {
        Self::Ed25519(value)
    }
}

impl From<ThresholdSha256> for Fulfillment {
    fn from(value: ThresholdSha256) -> Self {
        Self::Threshold(value)
    }
}

/// Parses and verifies fulfillment strings under a recursion budget.
///
/// Stateless apart from its configuration; share it freely across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verifier {
    config: VerifierConfig,
}

impl Verifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Parses `wire` into a fulfillment, verifying signatures and threshold
    /// weights along the way.
    pub fn parse(&self, wire: &str) -> Result<Fulfillment> {
        self.parse_at(wire, 0)
    }

    /// Verifies `wire` and returns the condition string it satisfies.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedEncoding`] for structural problems.
    /// - [`Error::UnsupportedType`] for unknown or unimplemented type ids.
    /// - [`Error::SignatureInvalid`] for a bad Ed25519 signature.
    /// - [`Error::InsufficientWeight`] when a threshold is not met.
    pub fn fulfillment_to_condition(&self, wire: &str) -> Result<String> {
        self.condition_at(wire, 0)
    }

    /// Verifies `fulfillment` and checks it derives exactly `condition`.
    ///
    /// The final comparison runs in constant time.
    pub fn validate(&self, fulfillment: &str, condition: &str) -> Result<()> {
        let derived = self.fulfillment_to_condition(fulfillment)?;
        derived
            .as_bytes()
            .ct_eq(condition.as_bytes())
            .unwrap_u8()
            .eq(&1)
            .then_some(())
            .ok_or(Error::ConditionMismatch)
    }

    pub(crate) fn condition_at(&self, wire: &str, depth: usize) -> Result<String> {
        self.parse_at(wire, depth)
            .map(|fulfillment| fulfillment.condition().to_string())
    }

    pub(crate) fn parse_at(&self, wire: &str, depth: usize) -> Result<Fulfillment> {
        if depth > self.config.max_depth {
            warn!(depth, max_depth = self.config.max_depth, "fulfillment nested too deep");
            return Err(Error::DepthExceeded {
                max: self.config.max_depth,
            });
        }

        let type_id = fulfillment_type_id(wire)?;
        trace!(depth, type_id, "dispatching fulfillment");

        match ConditionType::from_id(type_id)? {
            ConditionType::PreimageSha256 => PreimageSha256::parse(wire).map(Fulfillment::from),
            ConditionType::Ed25519Sha256 => Ed25519Sha256::parse(wire).map(Fulfillment::from),
            ConditionType::ThresholdSha256 => {
                ThresholdSha256::parse_nested(wire, self, depth).map(Fulfillment::from)
            }
            ConditionType::RsaSha256 => Err(Error::UnsupportedType(format!(
                "{} (rsa-sha256 is reserved)",
                type_id
            ))),
        }
    }
}

/// Verifies a fulfillment string and returns its condition string, using
/// the default configuration.
pub fn fulfillment_to_condition(wire: &str) -> Result<String> {
    Verifier::default().fulfillment_to_condition(wire)
}

/// Verifies `fulfillment` against a stored `condition` string, using the
/// default configuration.
pub fn validate_fulfillment(fulfillment: &str, condition: &str) -> Result<()> {
    Verifier::default().validate(fulfillment, condition)
}

#[cfg(feature = "bincode")]
use bincode::{Decode, Encode};
#[cfg(feature = "json")]
use hex::serde as hex_serde;
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{Condition, ConditionType};
use crate::encoding::{decode_b64, encode_b64_as, is_padded, split_wire, FULFILLMENT_TAG, VERSION};
use crate::Result;

/// A hash-lock fulfilled by revealing a SHA-256 preimage.
///
/// The preimage has no internal structure, so the condition's maximum
/// fulfillment length is simply the length of the fulfillment string as it
/// was written. A parsed fulfillment keeps its payload's padding style, so
/// `cf:1:1:Zm8=` derives a length of 11 and `cf:1:1:Zm8` one of 10.
///
/// # Example
///
/// ```
/// use cryptocond_core::condition::PreimageSha256;
///
/// let fulfillment = PreimageSha256::new(b"foo".to_vec());
/// assert_eq!(fulfillment.serialize(), "cf:1:1:Zm9v");
/// assert_eq!(
///     fulfillment.condition().to_string(),
///     "cc:1:1:LCa0a2j_xo_5m0U8HTBBNBNCLXBkg7-g-YpeiGJm564=:11"
/// );
/// ```
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreimageSha256 {
    /// Secret preimage bytes.
    #[cfg_attr(feature = "json", serde(with = "hex_serde"))]
    pub preimage: Vec<u8>,

    /// Payload is written with `=` padding.
    #[cfg_attr(feature = "json", serde(default))]
    pub padded: bool,
}

impl PreimageSha256 {
    pub fn new(preimage: Vec<u8>) -> Self {
        Self {
            preimage,
            padded: false,
        }
    }

    /// Parses `cf:1:1:<base64url(preimage)>`.
    pub fn parse(wire: &str) -> Result<Self> {
        let parts = split_wire(wire, FULFILLMENT_TAG, 4)?;
        ConditionType::PreimageSha256.expect(parts[2])?;
        Ok(Self {
            preimage: decode_b64(parts[3])?,
            padded: is_padded(parts[3]),
        })
    }

    pub fn serialize(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            FULFILLMENT_TAG,
            VERSION,
            ConditionType::PreimageSha256,
            encode_b64_as(&self.preimage, self.padded)
        )
    }

    /// `SHA-256(preimage)`.
    pub fn fingerprint(&self) -> [u8; 32] {
        Sha256::digest(&self.preimage).into()
    }

    /// The maximum fulfillment length is the length of [`Self::serialize`],
    /// which for a parsed value is the length of the input string.
    pub fn condition(&self) -> Condition {
        Condition::new(
            ConditionType::PreimageSha256,
            self.fingerprint(),
            self.serialize().len() as u64,
        )
    }
}

/// Builds the fulfillment string for `preimage`.
pub fn make_fulfillment(preimage: &[u8]) -> String {
    PreimageSha256::new(preimage.to_vec()).serialize()
}

/// Parses a preimage fulfillment and returns its condition string.
pub fn fulfillment_to_condition(wire: &str) -> Result<String> {
    Ok(PreimageSha256::parse(wire)?.condition().to_string())
}

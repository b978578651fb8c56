#[cfg(feature = "bincode")]
use bincode::{Decode, Encode};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
#[cfg(feature = "json")]
use hex::serde as hex_serde;
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{Condition, ConditionType};
use crate::encoding::{
    decode_b64, decode_varbyte, encode_b64, expect_end, parse_length, put_varbyte, split_wire,
    FULFILLMENT_TAG, VERSION,
};
use crate::error::{EncodingError, Error};
use crate::Result;

/// Ed25519 signature over `fixed_message ++ dynamic_message`.
///
/// The fingerprint commits to the public key, the message id and the fixed
/// message only. Fulfillments carrying different dynamic messages (nonces,
/// timestamps) therefore satisfy the same condition as long as the signer
/// and the fixed part agree.
///
/// The maximum fulfillment length cannot be recovered from the fixed
/// commitments, so it is declared by the signer and carried as the fifth
/// wire segment: `cf:1:8:<payload>:<max_fulfillment_length>`.
///
/// # Example
///
/// ```
/// use cryptocond_core::condition::{fulfillment_to_condition, Ed25519Sha256};
/// use ed25519_dalek::SigningKey;
///
/// let signing_key = SigningKey::from_bytes(&[7u8; 32]);
/// let fulfillment = Ed25519Sha256::sign(&signing_key, b"escrow-1", b"release", b"nonce-1", 256);
///
/// let condition = fulfillment_to_condition(&fulfillment.serialize()).unwrap();
/// assert_eq!(condition, fulfillment.condition().to_string());
/// ```
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ed25519Sha256 {
    /// Public key bytes
    #[cfg_attr(feature = "json", serde(with = "hex_serde"))]
    pub public_key: [u8; 32],

    #[cfg_attr(feature = "json", serde(with = "hex_serde"))]
    pub message_id: Vec<u8>,

    /// Signed and committed to by the fingerprint.
    #[cfg_attr(feature = "json", serde(with = "hex_serde"))]
    pub fixed_message: Vec<u8>,

    /// Signed but not committed to by the fingerprint.
    #[cfg_attr(feature = "json", serde(with = "hex_serde"))]
    pub dynamic_message: Vec<u8>,

    /// Signature bytes
    #[cfg_attr(feature = "json", serde(with = "hex_serde"))]
    pub signature: [u8; 64],

    /// Upper bound on the wire length of any fulfillment for this condition.
    pub max_fulfillment_length: u64,
}

impl Ed25519Sha256 {
    /// Signs `fixed_message ++ dynamic_message` with `signing_key`.
    pub fn sign(
        signing_key: &SigningKey,
        message_id: &[u8],
        fixed_message: &[u8],
        dynamic_message: &[u8],
        max_fulfillment_length: u64,
    ) -> Self {
        let signature = signing_key.sign(&[fixed_message, dynamic_message].concat());

        Self {
            public_key: signing_key.verifying_key().to_bytes(),
            message_id: message_id.to_vec(),
            fixed_message: fixed_message.to_vec(),
            dynamic_message: dynamic_message.to_vec(),
            signature: signature.to_bytes(),
            max_fulfillment_length,
        }
    }

    /// Verify that `signature` is a valid Ed25519 signature of
    /// `fixed_message ++ dynamic_message` under `public_key`.
    pub fn verify(&self) -> Result<()> {
        let pk = VerifyingKey::from_bytes(&self.public_key).map_err(|_| Error::SignatureInvalid)?;
        let sig = Signature::from_bytes(&self.signature);
        pk.verify_strict(&self.signed_message(), &sig)
            .map_err(|_| Error::SignatureInvalid)
    }

    /// Parses and verifies `cf:1:8:<payload>:<max_fulfillment_length>`.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedEncoding`] if the string or payload is malformed,
    ///   or the string is longer than its declared maximum.
    /// - [`Error::SignatureInvalid`] if the signature does not verify.
    pub fn parse(wire: &str) -> Result<Self> {
        let parts = split_wire(wire, FULFILLMENT_TAG, 5)?;
        ConditionType::Ed25519Sha256.expect(parts[2])?;

        let max_fulfillment_length = parse_length(parts[4])?;
        if wire.len() as u64 > max_fulfillment_length {
            return Err(EncodingError::ExceedsDeclaredLength {
                len: wire.len(),
                max: max_fulfillment_length,
            }
            .into());
        }

        let payload = decode_b64(parts[3])?;
        let (public_key, rest) = decode_varbyte(&payload)?;
        let (message_id, rest) = decode_varbyte(rest)?;
        let (fixed_message, rest) = decode_varbyte(rest)?;
        let (dynamic_message, rest) = decode_varbyte(rest)?;
        let (signature, rest) = decode_varbyte(rest)?;
        expect_end(rest)?;

        let fulfillment = Self {
            public_key: fixed_field("public key", public_key)?,
            message_id: message_id.to_vec(),
            fixed_message: fixed_message.to_vec(),
            dynamic_message: dynamic_message.to_vec(),
            signature: fixed_field("signature", signature)?,
            max_fulfillment_length,
        };

        fulfillment.verify()?;
        Ok(fulfillment)
    }

    pub fn serialize(&self) -> String {
        let mut payload = Vec::new();
        put_varbyte(&self.public_key, &mut payload);
        put_varbyte(&self.message_id, &mut payload);
        put_varbyte(&self.fixed_message, &mut payload);
        put_varbyte(&self.dynamic_message, &mut payload);
        put_varbyte(&self.signature, &mut payload);

        format!(
            "{}:{}:{}:{}:{}",
            FULFILLMENT_TAG,
            VERSION,
            ConditionType::Ed25519Sha256,
            encode_b64(&payload),
            self.max_fulfillment_length
        )
    }

    /// `SHA-256(varbyte(public_key) ++ varbyte(message_id) ++ varbyte(fixed_message))`.
    pub fn fingerprint(&self) -> [u8; 32] {
        fingerprint(&self.public_key, &self.message_id, &self.fixed_message)
    }

    pub fn condition(&self) -> Condition {
        Self::condition_for(
            &self.public_key,
            &self.message_id,
            &self.fixed_message,
            self.max_fulfillment_length,
        )
    }

    /// Builds the condition a signer will later fulfill, without a signature.
    pub fn condition_for(
        public_key: &[u8; 32],
        message_id: &[u8],
        fixed_message: &[u8],
        max_fulfillment_length: u64,
    ) -> Condition {
        Condition::new(
            ConditionType::Ed25519Sha256,
            fingerprint(public_key, message_id, fixed_message),
            max_fulfillment_length,
        )
    }

    fn signed_message(&self) -> Vec<u8> {
        [self.fixed_message.as_slice(), self.dynamic_message.as_slice()].concat()
    }
}

/// Builds a signed fulfillment string from raw key material.
///
/// `keypair` is the 64-byte `secret ++ public` signing keypair.
///
/// # Errors
///
/// [`Error::InvalidKey`] if `keypair` is not a valid keypair or does not
/// belong to `public_key`.
pub fn make_fulfillment(
    public_key: &[u8; 32],
    keypair: &[u8; 64],
    message_id: &[u8],
    fixed_message: &[u8],
    dynamic_message: &[u8],
    max_fulfillment_length: u64,
) -> Result<String> {
    let signing_key =
        SigningKey::from_keypair_bytes(keypair).map_err(|e| Error::InvalidKey(e.to_string()))?;
    if signing_key.verifying_key().as_bytes() != public_key {
        return Err(Error::InvalidKey(
            "public key does not belong to keypair".to_string(),
        ));
    }

    Ok(Ed25519Sha256::sign(
        &signing_key,
        message_id,
        fixed_message,
        dynamic_message,
        max_fulfillment_length,
    )
    .serialize())
}

fn fingerprint(public_key: &[u8; 32], message_id: &[u8], fixed_message: &[u8]) -> [u8; 32] {
    let mut preimage = Vec::new();
    put_varbyte(public_key, &mut preimage);
    put_varbyte(message_id, &mut preimage);
    put_varbyte(fixed_message, &mut preimage);
    Sha256::digest(&preimage).into()
}

fn fixed_field<const N: usize>(field: &'static str, bytes: &[u8]) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        Error::from(EncodingError::FieldLength {
            field,
            expected: N,
            found: bytes.len(),
        })
    })
}

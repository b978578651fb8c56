//! Canonical binary primitives and wire-string helpers.
//!
//! Every condition type is built from three shapes:
//!
//! - **uvarint**: LEB128 base-128 unsigned integer, 1-10 bytes.
//! - **varbyte**: `uvarint(len) ++ payload`.
//! - **varray**: concatenated varbytes with no outer length prefix; the list
//!   ends where the buffer ends.
//!
//! ```
//! use cryptocond_core::encoding::{decode_varray, encode_varray};
//!
//! let items: [&[u8]; 3] = [&[1, 1, 1, 1, 1], &[2, 2, 2], &[3, 3, 3, 3]];
//! let bytes = encode_varray(items);
//! assert_eq!(bytes, [5, 1, 1, 1, 1, 1, 3, 2, 2, 2, 4, 3, 3, 3, 3]);
//! assert_eq!(decode_varray(&bytes).unwrap(), items);
//! ```
//!
//! Decoding is strict: truncated input, overlong varints and dangling records
//! are rejected so that each value has exactly one accepted encoding.

use base64::alphabet;
use base64::engine::general_purpose::{
    GeneralPurpose, GeneralPurposeConfig, URL_SAFE, URL_SAFE_NO_PAD,
};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::EncodingError;

/// Maximum number of bytes a `u64` uvarint can occupy.
pub const MAX_UVARINT_LEN: usize = 10;

/// Leading segment of every fulfillment string.
pub const FULFILLMENT_TAG: &str = "cf";

/// Leading segment of every condition string.
pub const CONDITION_TAG: &str = "cc";

/// The only supported protocol version.
pub const VERSION: &str = "1";

/// URL-safe decoder that accepts padded and unpadded input alike.
const B64_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes `n` as a uvarint.
pub fn encode_uvarint(n: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_UVARINT_LEN);
    put_uvarint(n, &mut buf);
    buf
}

/// Appends the uvarint encoding of `n` to `buf`.
pub fn put_uvarint(mut n: u64, buf: &mut Vec<u8>) {
    while n >= 0x80 {
        #[allow(clippy::cast_possible_truncation)] // masked by the continuation bit
        buf.push((n as u8) | 0x80);
        n >>= 7;
    }
    #[allow(clippy::cast_possible_truncation)] // n < 0x80
    buf.push(n as u8);
}

/// Decodes a uvarint from the front of `buf`.
///
/// Returns `(value, bytes_consumed)`.
///
/// # Errors
///
/// - [`EncodingError::Truncated`] if `buf` is empty or ends mid-varint.
/// - [`EncodingError::Overflow`] if the value does not fit in 64 bits.
/// - [`EncodingError::NonMinimal`] if the encoding has a redundant final
///   zero group.
pub fn decode_uvarint(buf: &[u8]) -> Result<(u64, usize), EncodingError> {
    let mut value = 0u64;

    for (i, &byte) in buf.iter().enumerate() {
        // the tenth byte may only carry bit 63
        if i == MAX_UVARINT_LEN - 1 && byte > 1 {
            return Err(EncodingError::Overflow);
        }

        value |= u64::from(byte & 0x7F) << (7 * i);

        if byte & 0x80 == 0 {
            if byte == 0 && i > 0 {
                return Err(EncodingError::NonMinimal);
            }
            return Ok((value, i + 1));
        }
    }

    Err(EncodingError::Truncated)
}

/// Prefixes `payload` with its uvarint length.
pub fn encode_varbyte(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_UVARINT_LEN + payload.len());
    put_varbyte(payload, &mut buf);
    buf
}

/// Appends `varbyte(payload)` to `buf`.
pub fn put_varbyte(payload: &[u8], buf: &mut Vec<u8>) {
    put_uvarint(payload.len() as u64, buf);
    buf.extend_from_slice(payload);
}

/// Reads one varbyte from the front of `buf`.
///
/// Returns `(payload, remainder)`.
///
/// # Errors
///
/// Propagates uvarint errors, and returns
/// [`EncodingError::LengthExceedsBuffer`] if fewer bytes remain than the
/// prefix declares.
pub fn decode_varbyte(buf: &[u8]) -> Result<(&[u8], &[u8]), EncodingError> {
    let (declared, consumed) = decode_uvarint(buf)?;
    let rest = &buf[consumed..];

    let len = usize::try_from(declared)
        .ok()
        .filter(|len| *len <= rest.len())
        .ok_or(EncodingError::LengthExceedsBuffer {
            declared,
            available: rest.len(),
        })?;

    Ok(rest.split_at(len))
}

/// Concatenates the varbyte encoding of each item.
pub fn encode_varray<I, T>(items: I) -> Vec<u8>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut buf = Vec::new();
    for item in items {
        put_varbyte(item.as_ref(), &mut buf);
    }
    buf
}

/// Splits `buf` into its varbyte payloads, consuming it entirely.
///
/// # Errors
///
/// Fails on the first record that is truncated or malformed.
pub fn decode_varray(mut buf: &[u8]) -> Result<Vec<&[u8]>, EncodingError> {
    let mut items = Vec::new();
    while !buf.is_empty() {
        let (item, rest) = decode_varbyte(buf)?;
        items.push(item);
        buf = rest;
    }
    Ok(items)
}

/// Fails with [`EncodingError::TrailingBytes`] unless `rest` is empty.
pub fn expect_end(rest: &[u8]) -> Result<(), EncodingError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(EncodingError::TrailingBytes(rest.len()))
    }
}

/// URL-safe base64 without padding, used for fulfillment payloads.
pub fn encode_b64(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// URL-safe base64 with padding, used for condition fingerprints.
pub fn encode_b64_padded(bytes: &[u8]) -> String {
    URL_SAFE.encode(bytes)
}

/// URL-safe base64 in the padding style a payload was read in.
pub fn encode_b64_as(bytes: &[u8], padded: bool) -> String {
    if padded {
        encode_b64_padded(bytes)
    } else {
        encode_b64(bytes)
    }
}

/// Whether a base64 payload carries `=` padding.
pub fn is_padded(s: &str) -> bool {
    s.ends_with('=')
}

/// Decodes URL-safe base64, with or without padding.
pub fn decode_b64(s: &str) -> Result<Vec<u8>, EncodingError> {
    Ok(B64_LENIENT.decode(s)?)
}

/// Splits a wire string into exactly `expected` colon-delimited segments and
/// checks its tag and version.
pub fn split_wire<'a>(
    wire: &'a str,
    tag: &'static str,
    expected: usize,
) -> Result<Vec<&'a str>, EncodingError> {
    let parts: Vec<&str> = wire.split(':').collect();
    if parts.len() != expected {
        return Err(EncodingError::SegmentCount {
            expected,
            found: parts.len(),
        });
    }
    check_header(parts[0], parts[1], tag)?;
    Ok(parts)
}

/// Reads only the tag, version and type id of a fulfillment string.
///
/// The payload is not looked at.
pub fn fulfillment_type_id(wire: &str) -> Result<&str, EncodingError> {
    let mut parts = wire.splitn(4, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(tag), Some(version), Some(type_id)) => {
            check_header(tag, version, FULFILLMENT_TAG)?;
            Ok(type_id)
        }
        _ => Err(EncodingError::SegmentCount {
            expected: 3,
            found: wire.split(':').count(),
        }),
    }
}

/// Parses a canonical decimal `u64`: digits only, no sign, no leading zeros.
pub fn parse_length(s: &str) -> Result<u64, EncodingError> {
    let canonical = !s.is_empty()
        && s.bytes().all(|b| b.is_ascii_digit())
        && (s == "0" || !s.starts_with('0'));
    if !canonical {
        return Err(EncodingError::BadLength(s.to_string()));
    }
    s.parse().map_err(|_| EncodingError::BadLength(s.to_string()))
}

fn check_header(tag: &str, version: &str, expected: &'static str) -> Result<(), EncodingError> {
    if tag != expected {
        return Err(EncodingError::BadTag {
            expected,
            found: tag.to_string(),
        });
    }
    if version != VERSION {
        return Err(EncodingError::BadVersion(version.to_string()));
    }
    Ok(())
}

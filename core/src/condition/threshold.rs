use std::cmp::Ordering;

#[cfg(feature = "bincode")]
use bincode::{Decode, Encode};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{Condition, ConditionType, Fulfillment, Verifier};
use crate::encoding::{
    decode_b64, decode_uvarint, decode_varbyte, encode_b64_as, encode_uvarint, encode_varray,
    expect_end, is_padded, put_uvarint, put_varbyte, split_wire, FULFILLMENT_TAG, VERSION,
};
use crate::entry::{decode_entries, encode_entries, entry_cmp, sort_entries, WeightedEntry};
use crate::error::{EncodingError, Error};
use crate::Result;

/// Leading uvarint of every threshold fingerprint preimage.
///
/// Fixed by the format; changing it changes every threshold condition.
const FINGERPRINT_PREFIX: u64 = 8;

/// Weighted M-of-N threshold over nested fulfillments.
///
/// Sub-fulfillments and sub-conditions are positionally aligned: the i-th
/// sub-fulfillment contributes its weight iff it verifies, derives exactly
/// the i-th sub-condition string, and carries the same weight. Branches that
/// fail for any reason contribute nothing and are not reported individually.
///
/// Sub-entries may be of any type, including further thresholds; they are
/// verified through [`Verifier`] one level deeper, so nesting is bounded by
/// [`VerifierConfig::max_depth`](crate::config::VerifierConfig).
///
/// # Example
///
/// ```
/// use cryptocond_core::condition::{Fulfillment, PreimageSha256, ThresholdSha256};
///
/// let alice = Fulfillment::from(PreimageSha256::new(b"alice".to_vec()));
/// let bob = Fulfillment::from(PreimageSha256::new(b"bob".to_vec()));
///
/// let mut threshold = ThresholdSha256::new(2);
/// threshold.add_subfulfillment(1, &alice);
/// threshold.add_subfulfillment(1, &bob);
///
/// let wire = threshold.serialize();
/// let parsed = ThresholdSha256::parse(&wire).unwrap();
/// assert_eq!(parsed.condition(), threshold.condition());
/// ```
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdSha256 {
    threshold: u64,
    subfulfillments: Vec<WeightedEntry>,
    subconditions: Vec<WeightedEntry>,
    #[cfg_attr(feature = "json", serde(default))]
    padded: bool,
}

impl ThresholdSha256 {
    /// Empty threshold requiring `threshold` weight.
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            subfulfillments: Vec::new(),
            subconditions: Vec::new(),
            padded: false,
        }
    }

    /// Builds from raw, index-aligned entry lists.
    ///
    /// # Errors
    ///
    /// [`EncodingError::EntryCountMismatch`] if the lists differ in length.
    pub fn from_parts(
        threshold: u64,
        subfulfillments: Vec<WeightedEntry>,
        subconditions: Vec<WeightedEntry>,
    ) -> Result<Self> {
        if subfulfillments.len() != subconditions.len() {
            return Err(EncodingError::EntryCountMismatch {
                fulfillments: subfulfillments.len(),
                conditions: subconditions.len(),
            }
            .into());
        }

        Ok(Self {
            threshold,
            subfulfillments,
            subconditions,
            padded: false,
        })
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn subfulfillments(&self) -> &[WeightedEntry] {
        &self.subfulfillments
    }

    pub fn subconditions(&self) -> &[WeightedEntry] {
        &self.subconditions
    }

    /// Adds a fulfilled branch together with the condition it derives.
    pub fn add_subfulfillment(&mut self, weight: u64, fulfillment: &Fulfillment) {
        self.subfulfillments
            .push(WeightedEntry::new(weight, fulfillment.serialize()));
        self.subconditions
            .push(WeightedEntry::new(weight, fulfillment.condition().to_string()));
    }

    /// Adds a branch that is committed to but not fulfilled.
    ///
    /// Its sub-fulfillment is the empty string, which never verifies, so the
    /// branch shapes the fingerprint without contributing weight.
    pub fn add_subcondition(&mut self, weight: u64, condition: &Condition) {
        self.subfulfillments.push(WeightedEntry::new(weight, ""));
        self.subconditions
            .push(WeightedEntry::new(weight, condition.to_string()));
    }

    /// Parses and verifies with the default [`Verifier`].
    pub fn parse(wire: &str) -> Result<Self> {
        Self::parse_nested(wire, &Verifier::default(), 0)
    }

    /// Parses `wire` found at nesting `depth`, verifying every branch through
    /// `verifier` at `depth + 1`.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedEncoding`] for structural problems, mismatched
    ///   list lengths or non-canonical entry order.
    /// - [`Error::InsufficientWeight`] if the verified weight is below the
    ///   threshold.
    pub(crate) fn parse_nested(wire: &str, verifier: &Verifier, depth: usize) -> Result<Self> {
        let parts = split_wire(wire, FULFILLMENT_TAG, 4)?;
        ConditionType::ThresholdSha256.expect(parts[2])?;

        let payload = decode_b64(parts[3])?;
        let (threshold, consumed) = decode_uvarint(&payload)?;
        let (subfulfillments, rest) = decode_varbyte(&payload[consumed..])?;
        let (subconditions, rest) = decode_varbyte(rest)?;
        expect_end(rest)?;

        let mut fulfillment = Self::from_parts(
            threshold,
            decode_entries(subfulfillments)?,
            decode_entries(subconditions)?,
        )?;
        fulfillment.padded = is_padded(parts[3]);

        if !fulfillment.is_canonical() {
            return Err(EncodingError::NonCanonicalOrder.into());
        }

        fulfillment.verify(verifier, depth)?;
        Ok(fulfillment)
    }

    /// Canonical wire string; entries are reordered on every call. A parsed
    /// value keeps the padding style of its input payload.
    pub fn serialize(&self) -> String {
        let pairs = self.canonical_pairs();

        let mut payload = encode_uvarint(self.threshold);
        put_varbyte(
            &encode_varray(pairs.iter().map(|(_, f)| f.to_bytes())),
            &mut payload,
        );
        put_varbyte(
            &encode_varray(pairs.iter().map(|(c, _)| c.to_bytes())),
            &mut payload,
        );

        format!(
            "{}:{}:{}:{}",
            FULFILLMENT_TAG,
            VERSION,
            ConditionType::ThresholdSha256,
            encode_b64_as(&payload, self.padded)
        )
    }

    /// `SHA-256(uvarint(8) ++ uvarint(threshold) ++ varbyte(varray(sorted sub-conditions)))`.
    pub fn fingerprint(&self) -> [u8; 32] {
        fingerprint(self.threshold, &self.subconditions)
    }

    /// The condition's maximum fulfillment length is the length of this
    /// fulfillment's wire string, so it depends on which branches are
    /// filled in. A nested threshold's sub-condition string carries that
    /// length, and an enclosing fingerprint therefore commits to the exact
    /// inner quorum.
    pub fn condition(&self) -> Condition {
        Self::condition_for(
            self.threshold,
            &self.subconditions,
            self.serialize().len() as u64,
        )
    }

    /// Builds the condition for a policy from public data alone.
    ///
    /// `subconditions` may be in any order.
    pub fn condition_for(
        threshold: u64,
        subconditions: &[WeightedEntry],
        max_fulfillment_length: u64,
    ) -> Condition {
        Condition::new(
            ConditionType::ThresholdSha256,
            fingerprint(threshold, subconditions),
            max_fulfillment_length,
        )
    }

    /// A threshold of zero is always satisfied, regardless of branches.
    fn verify(&self, verifier: &Verifier, depth: usize) -> Result<()> {
        if self.threshold == 0 {
            return Ok(());
        }

        let valid = self.valid_weight(verifier, depth);
        debug!(
            depth,
            threshold = self.threshold,
            valid_weight = valid,
            branches = self.subfulfillments.len(),
            "threshold evaluated"
        );

        (valid >= self.threshold)
            .then_some(())
            .ok_or(Error::InsufficientWeight {
                required: self.threshold,
                valid,
            })
    }

    /// Sums weights of branches that verify and derive their aligned
    /// sub-condition under the same weight.
    fn valid_weight(&self, verifier: &Verifier, depth: usize) -> u64 {
        self.subfulfillments
            .iter()
            .zip(&self.subconditions)
            .filter(|(f, c)| f.weight == c.weight)
            .filter(|(f, c)| {
                verifier
                    .condition_at(&f.value, depth + 1)
                    .is_ok_and(|derived| derived == c.value)
            })
            .fold(0u64, |acc, (f, _)| acc.saturating_add(f.weight))
    }

    /// `(sub-condition, sub-fulfillment)` pairs in canonical order.
    fn canonical_pairs(&self) -> Vec<(&WeightedEntry, &WeightedEntry)> {
        let mut pairs: Vec<_> = self.subconditions.iter().zip(&self.subfulfillments).collect();
        pairs.sort_by(pair_cmp);
        pairs
    }

    fn is_canonical(&self) -> bool {
        let pairs: Vec<_> = self.subconditions.iter().zip(&self.subfulfillments).collect();
        pairs
            .windows(2)
            .all(|w| pair_cmp(&w[0], &w[1]) != Ordering::Greater)
    }
}

fn fingerprint(threshold: u64, subconditions: &[WeightedEntry]) -> [u8; 32] {
    let subconditions = sort_entries(subconditions.to_vec());

    let mut preimage = encode_uvarint(FINGERPRINT_PREFIX);
    put_uvarint(threshold, &mut preimage);
    put_varbyte(&encode_entries(&subconditions), &mut preimage);
    Sha256::digest(&preimage).into()
}

/// Pairs order by sub-condition first so the sub-condition list comes out
/// exactly as [`sort_entries`] would order it, with the sub-fulfillment as
/// tie-breaker.
fn pair_cmp(
    a: &(&WeightedEntry, &WeightedEntry),
    b: &(&WeightedEntry, &WeightedEntry),
) -> Ordering {
    entry_cmp(a.0, b.0).then_with(|| entry_cmp(a.1, b.1))
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::SigningKey;

    use super::*;
    use crate::condition::{validate_fulfillment, Ed25519Sha256, PreimageSha256};
    use crate::config::{VerifierConfig, MAX_DEPTH};
    use crate::encoding::{encode_b64, encode_b64_padded};

    fn preimage(secret: &[u8]) -> Fulfillment {
        PreimageSha256::new(secret.to_vec()).into()
    }

    fn ed25519(seed: u8, dynamic_message: &[u8]) -> Ed25519Sha256 {
        let sk = SigningKey::from_bytes(&[seed; 32]);
        Ed25519Sha256::sign(&sk, b"escrow", b"release", dynamic_message, 256)
    }

    /// An Ed25519 branch whose signature no longer verifies, paired with
    /// the condition of its untampered form.
    fn forged_signature_entry(weight: u64) -> (WeightedEntry, WeightedEntry) {
        let valid = ed25519(3, b"dyn");
        let mut forged = valid.clone();
        forged.signature[10] ^= 0xFF;
        (
            WeightedEntry::new(weight, forged.serialize()),
            WeightedEntry::new(weight, valid.condition().to_string()),
        )
    }

    fn aligned(
        entries: Vec<(WeightedEntry, WeightedEntry)>,
    ) -> (Vec<WeightedEntry>, Vec<WeightedEntry>) {
        entries.into_iter().unzip()
    }

    fn nested(levels: usize) -> ThresholdSha256 {
        let mut inner = ThresholdSha256::new(1);
        inner.add_subfulfillment(1, &preimage(b"leaf"));
        for _ in 1..levels {
            let mut outer = ThresholdSha256::new(1);
            outer.add_subfulfillment(1, &inner.into());
            inner = outer;
        }
        inner
    }

    #[test]
    fn weight_equal_to_threshold_passes() {
        let mut threshold = ThresholdSha256::new(2);
        threshold.add_subfulfillment(1, &preimage(b"a"));
        threshold.add_subfulfillment(1, &ed25519(1, b"dyn").into());
        let (forged_f, forged_c) = forged_signature_entry(5);

        let (mut fulfillments, mut conditions) = (
            threshold.subfulfillments().to_vec(),
            threshold.subconditions().to_vec(),
        );
        fulfillments.push(forged_f);
        conditions.push(forged_c);
        let threshold = ThresholdSha256::from_parts(2, fulfillments, conditions).unwrap();

        let parsed = ThresholdSha256::parse(&threshold.serialize()).unwrap();
        assert_eq!(parsed.condition(), threshold.condition());
    }

    #[test]
    fn weight_one_below_threshold_fails() {
        let valid = preimage(b"a");
        let (forged_f, forged_c) = forged_signature_entry(5);
        let (fulfillments, conditions) = aligned(vec![
            (
                WeightedEntry::new(1, valid.serialize()),
                WeightedEntry::new(1, valid.condition().to_string()),
            ),
            (
                WeightedEntry::new(1, "cf:1:1:!!"),
                WeightedEntry::new(1, preimage(b"b").condition().to_string()),
            ),
            (forged_f, forged_c),
        ]);
        let threshold = ThresholdSha256::from_parts(2, fulfillments, conditions).unwrap();

        assert_eq!(
            ThresholdSha256::parse(&threshold.serialize()),
            Err(Error::InsufficientWeight {
                required: 2,
                valid: 1
            })
        );
    }

    #[test]
    fn zero_threshold_without_branches() {
        let threshold = ThresholdSha256::new(0);
        let wire = threshold.serialize();
        let parsed = ThresholdSha256::parse(&wire).unwrap();
        assert_eq!(parsed, threshold);
        assert_eq!(parsed.condition().max_fulfillment_length, wire.len() as u64);
    }

    #[test]
    fn zero_threshold_with_failing_branches() {
        let mut threshold = ThresholdSha256::new(0);
        threshold.add_subcondition(4, &preimage(b"x").condition());
        assert!(ThresholdSha256::parse(&threshold.serialize()).is_ok());
    }

    #[test]
    fn nonzero_threshold_without_branches_fails() {
        let threshold = ThresholdSha256::new(1);
        assert_eq!(
            ThresholdSha256::parse(&threshold.serialize()),
            Err(Error::InsufficientWeight {
                required: 1,
                valid: 0
            })
        );
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let branches = [
            (3, preimage(b"a much longer preimage")),
            (1, preimage(b"b")),
            (2, ed25519(1, b"dyn").into()),
            (1, preimage(b"a")),
        ];

        let mut forward = ThresholdSha256::new(3);
        for (weight, f) in branches.iter() {
            forward.add_subfulfillment(*weight, f);
        }
        let mut backward = ThresholdSha256::new(3);
        for (weight, f) in branches.iter().rev() {
            backward.add_subfulfillment(*weight, f);
        }

        assert_eq!(forward.serialize(), backward.serialize());
        assert_eq!(forward.serialize(), forward.serialize());
        assert_eq!(forward.condition(), backward.condition());
        assert!(ThresholdSha256::parse(&forward.serialize()).is_ok());
    }

    #[test]
    fn alignment_survives_sorting() {
        // fulfillment strings order by length, condition strings of equal
        // length by fingerprint, so each list sorted alone would drift apart
        let mut threshold = ThresholdSha256::new(5);
        for secret in [&b"ab"[..], b"abc", b"abcd", b"abcde", b"abcdef"] {
            threshold.add_subfulfillment(1, &preimage(secret));
        }

        let parsed = ThresholdSha256::parse(&threshold.serialize()).unwrap();
        for (f, c) in parsed.subfulfillments().iter().zip(parsed.subconditions()) {
            assert_eq!(
                c.value,
                crate::condition::fulfillment_to_condition(&f.value).unwrap()
            );
        }
    }

    #[test]
    fn duplicate_branches_both_count() {
        let leaf = preimage(b"same");
        let mut threshold = ThresholdSha256::new(2);
        threshold.add_subfulfillment(1, &leaf);
        threshold.add_subfulfillment(1, &leaf);
        assert!(ThresholdSha256::parse(&threshold.serialize()).is_ok());
    }

    #[test]
    fn inflated_fulfillment_weight_is_ignored() {
        let leaf = preimage(b"a");
        let threshold = ThresholdSha256::from_parts(
            5,
            vec![WeightedEntry::new(5, leaf.serialize())],
            vec![WeightedEntry::new(1, leaf.condition().to_string())],
        )
        .unwrap();

        assert_eq!(
            ThresholdSha256::parse(&threshold.serialize()),
            Err(Error::InsufficientWeight {
                required: 5,
                valid: 0
            })
        );
    }

    #[test]
    fn mismatched_condition_contributes_nothing() {
        let threshold = ThresholdSha256::from_parts(
            1,
            vec![WeightedEntry::new(1, preimage(b"a").serialize())],
            vec![WeightedEntry::new(1, preimage(b"b").condition().to_string())],
        )
        .unwrap();

        assert!(matches!(
            ThresholdSha256::parse(&threshold.serialize()),
            Err(Error::InsufficientWeight { valid: 0, .. })
        ));
    }

    #[test]
    fn unfulfilled_branch_shapes_fingerprint_only() {
        let a = preimage(b"a");
        let b = preimage(b"b");

        let mut both = ThresholdSha256::new(1);
        both.add_subfulfillment(1, &a);
        both.add_subfulfillment(1, &b);

        let mut one = ThresholdSha256::new(1);
        one.add_subfulfillment(1, &a);
        one.add_subcondition(1, &b.condition());

        assert_eq!(one.fingerprint(), both.fingerprint());
        assert!(ThresholdSha256::parse(&one.serialize()).is_ok());

        let mut none = ThresholdSha256::new(1);
        none.add_subcondition(1, &a.condition());
        none.add_subcondition(1, &b.condition());
        assert_eq!(none.fingerprint(), both.fingerprint());
        assert!(ThresholdSha256::parse(&none.serialize()).is_err());
    }

    #[test]
    fn heterogeneous_nested_thresholds() {
        let mut inner = ThresholdSha256::new(2);
        inner.add_subfulfillment(1, &preimage(b"a"));
        inner.add_subfulfillment(1, &ed25519(1, b"dyn").into());

        let mut outer = ThresholdSha256::new(3);
        outer.add_subfulfillment(2, &inner.clone().into());
        outer.add_subfulfillment(1, &ed25519(2, b"other").into());

        let wire = outer.serialize();
        assert!(ThresholdSha256::parse(&wire).is_ok());
        assert_eq!(
            crate::condition::fulfillment_to_condition(&wire).unwrap(),
            outer.condition().to_string()
        );

        // a broken leaf inside the inner threshold sinks the inner branch
        let mut broken_inner = ThresholdSha256::new(2);
        broken_inner.add_subfulfillment(1, &preimage(b"a"));
        let (forged_f, forged_c) = forged_signature_entry(1);
        let (mut fs, mut cs) = (
            broken_inner.subfulfillments().to_vec(),
            broken_inner.subconditions().to_vec(),
        );
        fs.push(forged_f);
        cs.push(forged_c);
        let broken_inner = ThresholdSha256::from_parts(2, fs, cs).unwrap();

        let mut outer = ThresholdSha256::new(3);
        outer.add_subfulfillment(2, &broken_inner.into());
        outer.add_subfulfillment(1, &ed25519(2, b"other").into());
        assert_eq!(
            ThresholdSha256::parse(&outer.serialize()),
            Err(Error::InsufficientWeight {
                required: 3,
                valid: 1
            })
        );
    }

    #[test]
    fn fingerprint_layout() {
        let leaf = preimage(b"a");
        let mut threshold = ThresholdSha256::new(1);
        threshold.add_subfulfillment(1, &leaf);

        let mut digest_input = vec![8, 1];
        put_varbyte(
            &encode_entries(&[WeightedEntry::new(1, leaf.condition().to_string())]),
            &mut digest_input,
        );
        let expected: [u8; 32] = Sha256::digest(&digest_input).into();

        assert_eq!(threshold.fingerprint(), expected);
        assert!(threshold.condition().to_string().starts_with("cc:1:4:"));
    }

    #[test]
    fn condition_from_public_data() {
        let a = preimage(b"a");
        let b = ed25519(1, b"dyn");

        let mut threshold = ThresholdSha256::new(1);
        threshold.add_subfulfillment(2, &a);
        threshold.add_subcondition(1, &b.condition());
        let wire = threshold.serialize();

        // committed before anyone signs, in a different order
        let committed = ThresholdSha256::condition_for(
            1,
            &[
                WeightedEntry::new(1, b.condition().to_string()),
                WeightedEntry::new(2, a.condition().to_string()),
            ],
            wire.len() as u64,
        );
        assert_eq!(committed, threshold.condition());
        assert!(validate_fulfillment(&wire, &committed.to_string()).is_ok());
    }

    #[test]
    fn padded_input_keeps_its_length() {
        let mut checked = 0;
        for secret in [&b"a"[..], b"ab", b"abc"] {
            let mut threshold = ThresholdSha256::new(1);
            threshold.add_subfulfillment(1, &preimage(secret));
            let wire = threshold.serialize();

            let (_, payload) = wire.rsplit_once(':').unwrap();
            let padded = format!("cf:1:4:{}", encode_b64_padded(&decode_b64(payload).unwrap()));
            if padded == wire {
                continue;
            }

            let parsed = ThresholdSha256::parse(&padded).unwrap();
            assert_eq!(parsed.serialize(), padded);
            assert_eq!(parsed.fingerprint(), threshold.fingerprint());
            assert_eq!(
                parsed.condition().max_fulfillment_length,
                padded.len() as u64
            );
            checked += 1;
        }
        assert!(checked > 0);
    }

    #[test]
    fn depth_bound_is_enforced() {
        let verifier = Verifier::new(VerifierConfig::with_max_depth(3));

        // leaf at depth 3
        let wire = nested(3).serialize();
        assert!(verifier.fulfillment_to_condition(&wire).is_ok());

        // leaf at depth 4
        let wire = nested(4).serialize();
        assert_eq!(
            verifier.fulfillment_to_condition(&wire),
            Err(Error::InsufficientWeight {
                required: 1,
                valid: 0
            })
        );
        assert_eq!(
            verifier.parse_at(&wire, 4),
            Err(Error::DepthExceeded { max: 3 })
        );
    }

    #[test]
    fn default_depth_bound() {
        assert!(ThresholdSha256::parse(&nested(MAX_DEPTH).serialize()).is_ok());
        assert!(matches!(
            ThresholdSha256::parse(&nested(MAX_DEPTH + 1).serialize()),
            Err(Error::InsufficientWeight { .. })
        ));
    }

    #[test]
    fn non_canonical_order_is_rejected() {
        let mut threshold = ThresholdSha256::new(1);
        threshold.add_subfulfillment(1, &preimage(b"a much longer preimage"));
        threshold.add_subfulfillment(1, &preimage(b"b"));

        // hand-encode in the given order, bypassing serialize()
        let encode = |fs: &[WeightedEntry], cs: &[WeightedEntry]| {
            let mut payload = encode_uvarint(1);
            put_varbyte(&encode_entries(fs), &mut payload);
            put_varbyte(&encode_entries(cs), &mut payload);
            format!("cf:1:4:{}", encode_b64(&payload))
        };

        let canonical = ThresholdSha256::parse(&threshold.serialize()).unwrap();
        let mut fulfillments = canonical.subfulfillments().to_vec();
        let mut conditions = canonical.subconditions().to_vec();
        assert_eq!(encode(&fulfillments, &conditions), threshold.serialize());

        fulfillments.reverse();
        conditions.reverse();
        assert_eq!(
            ThresholdSha256::parse(&encode(&fulfillments, &conditions)),
            Err(Error::MalformedEncoding(EncodingError::NonCanonicalOrder))
        );
    }

    #[test]
    fn malformed_payloads() {
        let encode = |payload: &[u8]| format!("cf:1:4:{}", encode_b64(payload));

        // counts differ
        let leaf = preimage(b"a");
        let mut payload = encode_uvarint(1);
        put_varbyte(
            &encode_entries(&[WeightedEntry::new(1, leaf.serialize())]),
            &mut payload,
        );
        put_varbyte(&[], &mut payload);
        assert!(matches!(
            ThresholdSha256::parse(&encode(&payload)),
            Err(Error::MalformedEncoding(EncodingError::EntryCountMismatch {
                fulfillments: 1,
                conditions: 0
            }))
        ));

        // trailing garbage
        let mut payload = encode_uvarint(0);
        put_varbyte(&[], &mut payload);
        put_varbyte(&[], &mut payload);
        payload.push(7);
        assert!(matches!(
            ThresholdSha256::parse(&encode(&payload)),
            Err(Error::MalformedEncoding(EncodingError::TrailingBytes(1)))
        ));

        // missing sub-condition list
        let mut payload = encode_uvarint(0);
        put_varbyte(&[], &mut payload);
        assert!(matches!(
            ThresholdSha256::parse(&encode(&payload)),
            Err(Error::MalformedEncoding(EncodingError::Truncated))
        ));

        // wrong segment count and type
        assert!(ThresholdSha256::parse("cf:1:4:AA:1").is_err());
        assert!(matches!(
            ThresholdSha256::parse("cf:1:1:AAAA"),
            Err(Error::MalformedEncoding(EncodingError::WrongType { expected: 4, .. }))
        ));
    }

    #[test]
    fn from_parts_checks_alignment() {
        assert!(matches!(
            ThresholdSha256::from_parts(1, vec![WeightedEntry::new(1, "x")], vec![]),
            Err(Error::MalformedEncoding(EncodingError::EntryCountMismatch { .. }))
        ));
    }

    #[test]
    fn weight_sum_saturates() {
        let leaf = preimage(b"a");
        let mut threshold = ThresholdSha256::new(u64::MAX);
        threshold.add_subfulfillment(u64::MAX, &leaf);
        threshold.add_subfulfillment(u64::MAX, &leaf);
        assert!(ThresholdSha256::parse(&threshold.serialize()).is_ok());
    }
}

use thiserror::Error as ThisError;

/// Crypto-condition errors.
///
/// Every parse and verify entry point returns one of these. Failures of
/// individual threshold branches never surface here; they only show up as
/// a lower aggregate weight in [`Error::InsufficientWeight`].
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum Error {
    /// Wire string or binary payload is not well-formed.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(#[from] EncodingError),

    /// Type id is not in the registry (or is reserved but unimplemented).
    #[error("unsupported condition type: {0}")]
    UnsupportedType(String),

    /// Ed25519 signature did not verify.
    #[error("signature verification failed")]
    SignatureInvalid,

    /// Valid sub-fulfillment weight is below the threshold.
    #[error("needed weight {required}, but only {valid} verified")]
    InsufficientWeight {
        /// Threshold declared by the fulfillment.
        required: u64,
        /// Sum of weights of verified sub-fulfillments.
        valid: u64,
    },

    /// Nested thresholds exceed the configured recursion depth.
    #[error("nesting exceeds maximum depth of {max}")]
    DepthExceeded {
        /// Configured maximum depth.
        max: usize,
    },

    /// Fulfillment is valid but does not match the stored condition.
    #[error("fulfillment does not match condition")]
    ConditionMismatch,

    /// Signing keypair bytes are not a valid keypair for the public key.
    #[error("invalid key material: {0}")]
    InvalidKey(String),
}

/// Low-level codec and wire-format errors.
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum EncodingError {
    /// Input ended before a complete uvarint was read.
    #[error("truncated uvarint")]
    Truncated,

    /// uvarint does not fit in 64 bits.
    #[error("uvarint overflows u64")]
    Overflow,

    /// uvarint has redundant trailing zero groups.
    #[error("non-minimal uvarint encoding")]
    NonMinimal,

    /// varbyte declares more bytes than are available.
    #[error("varbyte declares {declared} bytes, only {available} available")]
    LengthExceedsBuffer {
        /// Length prefix value.
        declared: u64,
        /// Bytes remaining after the prefix.
        available: usize,
    },

    /// Unconsumed bytes after a complete structure.
    #[error("{0} trailing bytes")]
    TrailingBytes(usize),

    /// Payload is not valid base64url.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Wrong number of colon-delimited segments.
    #[error("expected {expected} segments, found {found}")]
    SegmentCount {
        /// Segments required by the type.
        expected: usize,
        /// Segments present.
        found: usize,
    },

    /// First segment is not the expected `cf`/`cc` tag.
    #[error("expected tag {expected:?}, found {found:?}")]
    BadTag {
        /// Required tag.
        expected: &'static str,
        /// Tag present.
        found: String,
    },

    /// Protocol version is not `1`.
    #[error("unsupported protocol version {0:?}")]
    BadVersion(String),

    /// Type id segment names a different condition type.
    #[error("expected type {expected}, found {found:?}")]
    WrongType {
        /// Type id the parser handles.
        expected: u8,
        /// Type id present.
        found: String,
    },

    /// Decimal length segment is not a valid `u64`.
    #[error("invalid length segment {0:?}")]
    BadLength(String),

    /// Fixed-size field has the wrong length.
    #[error("{field} must be {expected} bytes, found {found}")]
    FieldLength {
        /// Field name.
        field: &'static str,
        /// Required length.
        expected: usize,
        /// Actual length.
        found: usize,
    },

    /// Weighted entry is not a `[weight, value]` pair.
    #[error("weighted entry has {0} fields, expected 2")]
    EntryShape(usize),

    /// Weighted entry value is not UTF-8.
    #[error("weighted entry value is not valid UTF-8")]
    InvalidUtf8,

    /// Threshold entries are not in canonical order.
    #[error("weighted entries are not in canonical order")]
    NonCanonicalOrder,

    /// Sub-fulfillment and sub-condition lists differ in length.
    #[error("{fulfillments} sub-fulfillments but {conditions} sub-conditions")]
    EntryCountMismatch {
        /// Number of sub-fulfillments.
        fulfillments: usize,
        /// Number of sub-conditions.
        conditions: usize,
    },

    /// Wire string is longer than its own declared maximum.
    #[error("fulfillment is {len} bytes, declared maximum is {max}")]
    ExceedsDeclaredLength {
        /// Actual wire length.
        len: usize,
        /// Declared maximum.
        max: u64,
    },
}

impl From<base64::DecodeError> for Error {
    fn from(value: base64::DecodeError) -> Self {
        Self::MalformedEncoding(EncodingError::Base64(value))
    }
}

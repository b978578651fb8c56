//! Verifier configuration.

#[cfg(feature = "json")]
use std::fs::File;
#[cfg(feature = "json")]
use std::path::Path;

#[cfg(feature = "json")]
use anyhow::Context;
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

/// Default maximum nesting depth of threshold fulfillments.
///
/// Depth 0 is the top-level fulfillment; a sub-fulfillment at depth
/// `MAX_DEPTH + 1` is rejected before it is parsed.
pub const MAX_DEPTH: usize = 16;

/// Tunables for [`Verifier`](crate::condition::Verifier).
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Maximum nesting depth accepted during verification.
    pub max_depth: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
        }
    }
}

impl VerifierConfig {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

/// Reads a JSON-encoded [`VerifierConfig`] from `path`.
///
/// Missing fields fall back to their defaults.
///
/// # Errors
///
/// Returns an `anyhow::Error` if the file cannot be read or parsed.
///
/// # Examples
///
/// ```ignore
/// # use cryptocond_core::config::load_config;
/// let config = load_config("./verifier.json").unwrap();
/// ```
#[cfg(feature = "json")]
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<VerifierConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("loading verifier config: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("parsing JSON from {:?}", path))
}

/// Writes `config` as pretty-printed JSON to `path`.
///
/// # Errors
///
/// Returns an `anyhow::Error` if the file cannot be created or written.
#[cfg(feature = "json")]
pub fn save_config<P: AsRef<Path>>(path: P, config: &VerifierConfig) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating file {:?}", path))?;
    serde_json::to_writer_pretty(file, config)
        .with_context(|| format!("serializing to JSON to {:?}", path))
}

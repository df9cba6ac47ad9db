//! Content digests over ordered value sequences.

use crate::value::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Fingerprint of an ordered sequence of values.
///
/// Only ever compared for equality; it is never persisted.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Returns the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({self})")
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // first 8 bytes are plenty for logs
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Incremental content hasher.
///
/// Each value contributes its text form, length-prefixed so that the
/// sequences `["ab", "c"]` and `["a", "bc"]` hash differently. `Null` gets its
/// own marker and does not collide with the empty string.
#[derive(Clone, Default)]
pub struct ContentHasher {
    inner: Sha256,
}

impl ContentHasher {
    /// Creates a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one value.
    pub fn update(&mut self, value: &Value) {
        if value.is_null() {
            self.inner.update([0u8]);
            return;
        }
        let text = value.to_text();
        self.inner.update([1u8]);
        self.inner.update((text.len() as u64).to_le_bytes());
        self.inner.update(text.as_bytes());
    }

    /// Consumes the hasher and returns the digest.
    #[must_use]
    pub fn finish(self) -> ContentHash {
        ContentHash(self.inner.finalize().into())
    }
}

/// Hashes a sequence of values in order.
pub fn content_hash<'a, I>(values: I) -> ContentHash
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut hasher = ContentHasher::new();
    for value in values {
        hasher.update(value);
    }
    hasher.finish()
}

//! # Content Addressing
//!
//! Derives the media identity from uploaded bytes.
//!
//! The digest is SHA-256 over the full payload, hex-encoded. It is the
//! Media storage key, the blob file name and the only dedup key, so it
//! must stay stable across releases.

use crate::MediaHash;
use sha2::{Digest, Sha256};

/// Compute the media hash of `bytes`. Deterministic; empty input is valid.
pub fn digest(bytes: &[u8]) -> MediaHash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    MediaHash::from_digest(&hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::HASH_HEX_LENGTH;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(digest(b"hello"), digest(b"hello"));
    }

    #[test]
    fn digest_matches_known_sha256() {
        assert_eq!(
            digest(b"hello").as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn empty_input_has_a_digest() {
        let hash = digest(b"");
        assert_eq!(hash.as_str().len(), HASH_HEX_LENGTH);
        assert_eq!(
            hash.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn different_content_different_digest() {
        assert_ne!(digest(b"hello"), digest(b"hello!"));
    }

    #[test]
    fn different_bytes_differ() {
        assert_ne!(digest(b"payload"), digest(b"payloae"));
    }

    #[test]
    fn digest_parses_back() {
        let hash = digest(b"roundtrip");
        assert_eq!(MediaHash::parse(hash.as_str()).expect("parse"), hash);
    }
}

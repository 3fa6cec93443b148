//! # Store Primitives
//!
//! Hardcoded constants for the Herus store.
//!
//! These values are compiled into the binary. The ones that shape graph
//! behaviour (vote seed, upload cap) are only defaults: `GraphConfig`
//! carries the values actually in effect.

use std::time::Duration;

/// Upvotes given to every freshly created relation, association and
/// elaboration. All other counters start at zero.
///
/// This looks like placeholder behaviour carried over from the first
/// version of the site rather than a product decision. It is kept as-is
/// and surfaced as `GraphConfig::seed_upvotes`.
pub const VOTE_SEED_UPVOTES: u64 = 3;

/// Magic bytes prefixed to every encoded record ("HRUS").
pub const MAGIC_BYTES: &[u8; 4] = b"HRUS";

/// Current record format version.
///
/// Increment this when making breaking changes to the record layout.
pub const FORMAT_VERSION: u8 = 1;

/// Length of the record header (magic + version).
pub const HEADER_LEN: usize = 5;

/// Largest encoded record accepted by the decoder (16 MiB).
///
/// Checked before any payload parsing so a damaged value cannot trigger
/// an oversized allocation.
pub const MAX_RECORD_SIZE: usize = 16 * 1024 * 1024;

/// Default cap on uploaded content (8 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 8 << 20;

/// Maximum length for media titles, in bytes.
pub const MAX_TITLE_LENGTH: usize = 512;

/// Maximum length for a normalized topic name, in bytes.
pub const MAX_TOPIC_NAME_LENGTH: usize = 256;

/// Length of a hex-encoded SHA-256 media hash.
pub const HASH_HEX_LENGTH: usize = 64;

/// How long `Engine::open` waits for another process to release the
/// database file before giving up.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between attempts while waiting for the database file lock.
pub const OPEN_RETRY_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_seed_is_three() {
        assert_eq!(VOTE_SEED_UPVOTES, 3);
    }

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"HRUS");
        assert_eq!(HEADER_LEN, MAGIC_BYTES.len() + 1);
    }

    #[test]
    fn upload_cap_is_eight_mebibytes() {
        assert_eq!(DEFAULT_MAX_UPLOAD_BYTES, 8 * 1024 * 1024);
    }
}

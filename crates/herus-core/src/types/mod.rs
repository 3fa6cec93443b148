//! # Core Type Definitions
//!
//! This module contains the value types shared by every part of the store:
//! - Graph identifiers (`TopicName`, `MediaHash`)
//! - Vote counters (`VoteTally`)
//! - Persisted records and their edge lists (see `records`)
//! - Error types (`HerusError`)
//!
//! ## Identity
//!
//! Topics are keyed by their normalized name, media by the hex SHA-256 of
//! their bytes. Both identifiers can only be built through constructors
//! that enforce their shape, so a key read back from the engine is always
//! a key some writer produced.

mod records;

pub use records::{Edge, EdgeList, Media, MediaAssociation, MediaElaboration, Topic, TopicRelation};

use crate::primitives::HASH_HEX_LENGTH;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// TOPIC NAME
// =============================================================================

/// Normalized topic name: lower-case, every whitespace character replaced
/// by an underscore.
///
/// This is the storage key of a topic. Two raw names that normalize to the
/// same string address the same topic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicName(String);

impl TopicName {
    /// Normalize a raw, user-supplied topic name.
    ///
    /// Total over all strings and idempotent:
    /// `normalize(normalize(x).as_str()) == normalize(x)`.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let name = raw
            .to_lowercase()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        Self(name)
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the raw input normalized to nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Heading shown for a topic page: underscores become spaces and each
    /// word starts with a capital letter.
    #[must_use]
    pub fn display_title(&self) -> String {
        self.0
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// MEDIA HASH
// =============================================================================

/// Hex-encoded SHA-256 digest of an uploaded payload.
///
/// Serves as the Media storage key, the blob file name and the dedup key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaHash(String);

impl MediaHash {
    /// Build a hash from raw digest bytes.
    #[must_use]
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// Parse a caller-supplied hash string.
    ///
    /// Accepts upper- or lower-case hex and surrounding whitespace; the
    /// stored form is always lower-case.
    pub fn parse(raw: &str) -> Result<Self, HerusError> {
        let candidate = raw.trim().to_ascii_lowercase();
        if candidate.len() != HASH_HEX_LENGTH
            || !candidate.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(HerusError::InvalidInput(format!(
                "media hash must be {} hex characters, got {:?}",
                HASH_HEX_LENGTH, raw
            )));
        }
        Ok(Self(candidate))
    }

    /// Get the hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MediaHash {
    type Error = HerusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MediaHash> for String {
    fn from(hash: MediaHash) -> Self {
        hash.0
    }
}

// =============================================================================
// VOTES
// =============================================================================

/// Vote counters carried by every edge in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteTally {
    pub upvotes: u64,
    pub downvotes: u64,
    pub leftvotes: u64,
    pub rightvotes: u64,
    pub centervotes: u64,
}

impl VoteTally {
    /// Starting tally for a new edge: `upvotes` up, zero everywhere else.
    #[must_use]
    pub const fn seeded(upvotes: u64) -> Self {
        Self {
            upvotes,
            downvotes: 0,
            leftvotes: 0,
            rightvotes: 0,
            centervotes: 0,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Herus store.
///
/// Every graph mutation reports its specific kind; the facade passes
/// manager errors through untouched. Nothing in the store panics on bad
/// input or damaged records.
#[derive(Debug, Error)]
pub enum HerusError {
    /// The source topic of a connection does not exist.
    #[error("source topic does not exist: {0}")]
    MissingSource(TopicName),

    /// The destination topic of a connection does not exist.
    #[error("destination topic does not exist: {0}")]
    MissingDestination(TopicName),

    /// The topic an association targets does not exist.
    #[error("topic does not exist: {0}")]
    MissingTopic(TopicName),

    /// The media an elaboration hangs under does not exist.
    #[error("parent media does not exist: {0}")]
    MissingParentMedia(MediaHash),

    /// An association or elaboration references unknown media.
    #[error("media does not exist: {0}")]
    MissingMedia(MediaHash),

    /// The source topic already relates to the destination.
    #[error("relation already exists: {from} -> {to}")]
    DuplicateRelation { from: TopicName, to: TopicName },

    /// The topic already lists this media.
    #[error("media {media} has already been added to topic {topic}")]
    DuplicateAssociation { topic: TopicName, media: MediaHash },

    /// The child media already elaborates the parent.
    #[error("media {child} has already been added to parent media {parent}")]
    DuplicateElaboration { parent: MediaHash, child: MediaHash },

    /// A stored value could not be decoded (or a record could not be encoded).
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    /// The storage engine failed (open, transaction, table access, commit).
    #[error("engine failure: {0}")]
    Engine(String),

    /// The blob collaborator failed to read or write content.
    #[error("blob store failure: {0}")]
    Blob(String),

    /// The caller supplied unusable input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// File or socket I/O outside the engine failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl HerusError {
    /// Stable, machine-readable code for this error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingSource(_) => "missing_source",
            Self::MissingDestination(_) => "missing_destination",
            Self::MissingTopic(_) => "missing_topic",
            Self::MissingParentMedia(_) => "missing_parent_media",
            Self::MissingMedia(_) => "missing_media",
            Self::DuplicateRelation { .. } => "duplicate_relation",
            Self::DuplicateAssociation { .. } => "duplicate_association",
            Self::DuplicateElaboration { .. } => "duplicate_elaboration",
            Self::CorruptRecord(_) => "corrupt_record",
            Self::Engine(_) => "engine_failure",
            Self::Blob(_) => "blob_failure",
            Self::InvalidInput(_) => "invalid_input",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
        }
    }

    /// True for the "referenced thing does not exist" family.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            Self::MissingSource(_)
                | Self::MissingDestination(_)
                | Self::MissingTopic(_)
                | Self::MissingParentMedia(_)
                | Self::MissingMedia(_)
        )
    }

    /// True for the "edge already exists" family.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRelation { .. }
                | Self::DuplicateAssociation { .. }
                | Self::DuplicateElaboration { .. }
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Persisted records: `Topic`, `Media` and the edges they own.
//!
//! Edge sequences are `EdgeList`s. An `EdgeList` keeps insertion order and
//! refuses a second edge to the same target, so the dedup invariant lives
//! in one place instead of being re-scanned at every call site. Decoding
//! a stored list that violates it fails rather than silently repairing it.

use super::{HerusError, MediaHash, TopicName, VoteTally};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// EDGE LIST
// =============================================================================

/// An edge that points at exactly one target.
pub trait Edge {
    /// What the edge points at. Two edges with equal targets are duplicates.
    type Target: PartialEq;

    fn target(&self) -> &Self::Target;
}

/// Ordered edge sequence with at most one edge per target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeList<E> {
    edges: Vec<E>,
}

impl<E> Default for EdgeList<E> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

impl<E: Edge> EdgeList<E> {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from stored edges, rejecting duplicate targets.
    pub fn from_edges(edges: Vec<E>) -> Result<Self, HerusError> {
        let mut list = Self::new();
        for (index, edge) in edges.into_iter().enumerate() {
            if !list.try_push(edge) {
                return Err(HerusError::CorruptRecord(format!(
                    "edge #{} repeats an earlier target",
                    index
                )));
            }
        }
        Ok(list)
    }

    /// Whether some edge already points at `target`.
    pub fn contains(&self, target: &E::Target) -> bool {
        self.edges.iter().any(|edge| edge.target() == target)
    }

    /// Append `edge` unless its target is already present.
    ///
    /// Returns `false` (and drops the edge) on a duplicate target.
    #[must_use]
    pub fn try_push(&mut self, edge: E) -> bool {
        if self.contains(edge.target()) {
            return false;
        }
        self.edges.push(edge);
        true
    }
}

impl<E> EdgeList<E> {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.edges.iter()
    }

    pub fn as_slice(&self) -> &[E] {
        &self.edges
    }
}

impl<'a, E> IntoIterator for &'a EdgeList<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

impl<E: Serialize> Serialize for EdgeList<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.edges.serialize(serializer)
    }
}

impl<'de, E: Edge + Deserialize<'de>> Deserialize<'de> for EdgeList<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let edges = Vec::<E>::deserialize(deserializer)?;
        Self::from_edges(edges).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// EDGES
// =============================================================================

/// Topic → topic edge, held by the source topic only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRelation {
    pub destination: TopicName,
    pub submitted_at: DateTime<Utc>,
    pub submitter: Option<String>,
    pub votes: VoteTally,
}

impl TopicRelation {
    #[must_use]
    pub fn new(destination: TopicName, submitter: Option<String>, votes: VoteTally) -> Self {
        Self {
            destination,
            submitted_at: Utc::now(),
            submitter,
            votes,
        }
    }
}

impl Edge for TopicRelation {
    type Target = TopicName;

    fn target(&self) -> &TopicName {
        &self.destination
    }
}

/// Topic → media edge: media attached directly under a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAssociation {
    pub media: MediaHash,
    pub title: String,
    pub submitted_at: DateTime<Utc>,
    pub submitter: Option<String>,
    pub votes: VoteTally,
}

impl MediaAssociation {
    #[must_use]
    pub fn new(
        media: MediaHash,
        title: impl Into<String>,
        submitter: Option<String>,
        votes: VoteTally,
    ) -> Self {
        Self {
            media,
            title: title.into(),
            submitted_at: Utc::now(),
            submitter,
            votes,
        }
    }
}

impl Edge for MediaAssociation {
    type Target = MediaHash;

    fn target(&self) -> &MediaHash {
        &self.media
    }
}

/// Media → media edge: `media` elaborates on the media holding this edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaElaboration {
    pub media: MediaHash,
    pub title: String,
    pub submitted_at: DateTime<Utc>,
    pub submitter: Option<String>,
    pub votes: VoteTally,
}

impl MediaElaboration {
    #[must_use]
    pub fn new(
        media: MediaHash,
        title: impl Into<String>,
        submitter: Option<String>,
        votes: VoteTally,
    ) -> Self {
        Self {
            media,
            title: title.into(),
            submitted_at: Utc::now(),
            submitter,
            votes,
        }
    }
}

impl Edge for MediaElaboration {
    type Target = MediaHash;

    fn target(&self) -> &MediaHash {
        &self.media
    }
}

// =============================================================================
// TOPIC
// =============================================================================

/// Everything stored under one topic key.
///
/// Topics only ever grow: the sole mutations are appending a relation or
/// an association.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    relations: EdgeList<TopicRelation>,
    media: EdgeList<MediaAssociation>,
}

impl Topic {
    /// Create a topic with no edges.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Outbound links to other topics, oldest first.
    pub fn relations(&self) -> &EdgeList<TopicRelation> {
        &self.relations
    }

    /// Media attached directly under this topic, oldest first.
    pub fn media(&self) -> &EdgeList<MediaAssociation> {
        &self.media
    }

    /// Append a relation. `false` if one to the same destination exists.
    #[must_use]
    pub fn add_relation(&mut self, relation: TopicRelation) -> bool {
        self.relations.try_push(relation)
    }

    /// Append an association. `false` if the media is already listed.
    #[must_use]
    pub fn add_media(&mut self, association: MediaAssociation) -> bool {
        self.media.try_push(association)
    }
}

// =============================================================================
// MEDIA
// =============================================================================

/// Everything stored under one media hash.
///
/// The title is set by the first successful upload of the bytes and never
/// changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    title: String,
    elaborations: EdgeList<MediaElaboration>,
}

impl Media {
    /// Create a media record with no elaborations.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            elaborations: EdgeList::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Media elaborating on this one, oldest first.
    pub fn elaborations(&self) -> &EdgeList<MediaElaboration> {
        &self.elaborations
    }

    /// Append an elaboration. `false` if that media already elaborates.
    #[must_use]
    pub fn add_elaboration(&mut self, elaboration: MediaElaboration) -> bool {
        self.elaborations.try_push(elaboration)
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! # Topic Graph Manager
//!
//! Owns the `Topics` bucket: reads and writes `Topic` records and appends
//! topic → topic relations and topic → media associations.
//!
//! Every operation takes a transaction handle. The existence checks and
//! the append happen inside that one transaction, so there is no window
//! between "the relation is not there yet" and "write the new list" in
//! which a concurrent writer could slip in.

use crate::config::{GraphConfig, MissingTopicPolicy};
use crate::formats::{decode_record, encode_record};
use crate::storage::{Bucket, KvRead, WriteTx};
use crate::{HerusError, MediaAssociation, MediaHash, Topic, TopicName, TopicRelation};
use tracing::{debug, info};

/// Normalize a raw topic name (lower-case, whitespace → underscore).
pub fn normalize_topic_name(raw: &str) -> TopicName {
    TopicName::normalize(raw)
}

/// Topic-side graph operations under a fixed `GraphConfig`.
#[derive(Debug, Clone, Copy)]
pub struct TopicGraph {
    config: GraphConfig,
}

impl TopicGraph {
    #[must_use]
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Load a topic. `Ok(None)` when the key is absent; an error only when
    /// the stored bytes do not decode.
    pub fn get(tx: &impl KvRead, name: &TopicName) -> Result<Option<Topic>, HerusError> {
        match tx.get(Bucket::Topics, name.as_str())? {
            Some(bytes) => decode_record(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Overwrite the record stored under `name`.
    pub fn put(tx: &mut WriteTx, name: &TopicName, topic: &Topic) -> Result<(), HerusError> {
        let bytes = encode_record(topic)?;
        tx.put(Bucket::Topics, name.as_str(), &bytes)
    }

    /// Whether a topic is stored under `name`.
    pub fn exists(tx: &impl KvRead, name: &TopicName) -> Result<bool, HerusError> {
        tx.contains(Bucket::Topics, name.as_str())
    }

    /// Append a relation `source → destination`.
    ///
    /// Both topics must already exist; each side is checked on its own so
    /// the error names the missing one. The destination's record is never
    /// touched.
    pub fn add_relation(
        &self,
        tx: &mut WriteTx,
        source: &TopicName,
        destination: &TopicName,
        submitter: Option<&str>,
    ) -> Result<TopicRelation, HerusError> {
        let mut topic =
            Self::get(&*tx, source)?.ok_or_else(|| HerusError::MissingSource(source.clone()))?;
        if !Self::exists(&*tx, destination)? {
            return Err(HerusError::MissingDestination(destination.clone()));
        }

        let relation = TopicRelation::new(
            destination.clone(),
            submitter.map(str::to_owned),
            self.config.initial_votes(),
        );
        if !topic.add_relation(relation.clone()) {
            return Err(HerusError::DuplicateRelation {
                from: source.clone(),
                to: destination.clone(),
            });
        }

        Self::put(tx, source, &topic)?;
        info!(from = %source, to = %destination, "added topic relation");
        Ok(relation)
    }

    /// Attach media `media` under topic `name`.
    ///
    /// The media record must exist. An absent topic is created or rejected
    /// according to `GraphConfig::missing_topic`.
    pub fn add_media_association(
        &self,
        tx: &mut WriteTx,
        name: &TopicName,
        media: &MediaHash,
        title: &str,
        submitter: Option<&str>,
    ) -> Result<MediaAssociation, HerusError> {
        let mut topic = match Self::get(&*tx, name)? {
            Some(topic) => topic,
            None => match self.config.missing_topic {
                MissingTopicPolicy::Create => {
                    debug!(topic = %name, "creating topic for first association");
                    Topic::new()
                }
                MissingTopicPolicy::Reject => return Err(HerusError::MissingTopic(name.clone())),
            },
        };
        if !tx.contains(Bucket::Media, media.as_str())? {
            return Err(HerusError::MissingMedia(media.clone()));
        }

        let association = MediaAssociation::new(
            media.clone(),
            title,
            submitter.map(str::to_owned),
            self.config.initial_votes(),
        );
        if !topic.add_media(association.clone()) {
            return Err(HerusError::DuplicateAssociation {
                topic: name.clone(),
                media: media.clone(),
            });
        }

        Self::put(tx, name, &topic)?;
        info!(topic = %name, media = %media, "added media association");
        Ok(association)
    }
}

// =============================================================================
// TESTS
// =============================================================================

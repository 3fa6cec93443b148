//! # Media Graph Manager
//!
//! Owns the `Media` bucket: reads and writes `Media` records, decides
//! whether an upload introduces new content, and appends media → media
//! elaborations.
//!
//! The blob area is a peer store. This module only reports whether the
//! content is new (`EnsuredMedia::created`); the facade writes the bytes
//! after the transaction commits.

use crate::config::GraphConfig;
use crate::formats::{decode_record, encode_record};
use crate::storage::{Bucket, KvRead, WriteTx};
use crate::{HerusError, Media, MediaElaboration, MediaHash};
use tracing::{debug, info};

/// Outcome of `MediaGraph::ensure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredMedia {
    /// True when this call created the record.
    pub created: bool,
    /// The stored title. For existing media this is the first uploader's
    /// title, not the one passed to `ensure`.
    pub title: String,
}

/// Media-side graph operations under a fixed `GraphConfig`.
#[derive(Debug, Clone, Copy)]
pub struct MediaGraph {
    config: GraphConfig,
}

impl MediaGraph {
    #[must_use]
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Load a media record. `Ok(None)` when the hash is unknown.
    pub fn get(tx: &impl KvRead, hash: &MediaHash) -> Result<Option<Media>, HerusError> {
        match tx.get(Bucket::Media, hash.as_str())? {
            Some(bytes) => decode_record(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Overwrite the record stored under `hash`.
    pub fn put(tx: &mut WriteTx, hash: &MediaHash, media: &Media) -> Result<(), HerusError> {
        let bytes = encode_record(media)?;
        tx.put(Bucket::Media, hash.as_str(), &bytes)
    }

    /// Create the record for `hash` unless it exists (first writer wins).
    pub fn ensure(
        tx: &mut WriteTx,
        hash: &MediaHash,
        title: &str,
    ) -> Result<EnsuredMedia, HerusError> {
        if let Some(existing) = Self::get(&*tx, hash)? {
            debug!(hash = %hash, "media already known");
            return Ok(EnsuredMedia {
                created: false,
                title: existing.title().to_string(),
            });
        }

        Self::put(tx, hash, &Media::new(title))?;
        info!(hash = %hash, title, "created media record");
        Ok(EnsuredMedia {
            created: true,
            title: title.to_string(),
        })
    }

    /// Record that `child` elaborates on `parent`.
    ///
    /// `parent` must exist (`MissingParentMedia`), as must `child`
    /// (`MissingMedia`); a second elaboration of the same pair fails with
    /// `DuplicateElaboration`.
    pub fn add_elaboration(
        &self,
        tx: &mut WriteTx,
        parent: &MediaHash,
        child: &MediaHash,
        title: &str,
        submitter: Option<&str>,
    ) -> Result<MediaElaboration, HerusError> {
        let mut media =
            Self::get(&*tx, parent)?.ok_or_else(|| HerusError::MissingParentMedia(parent.clone()))?;
        if !tx.contains(Bucket::Media, child.as_str())? {
            return Err(HerusError::MissingMedia(child.clone()));
        }

        let elaboration = MediaElaboration::new(
            child.clone(),
            title,
            submitter.map(str::to_owned),
            self.config.initial_votes(),
        );
        if !media.add_elaboration(elaboration.clone()) {
            return Err(HerusError::DuplicateElaboration {
                parent: parent.clone(),
                child: child.clone(),
            });
        }

        Self::put(tx, parent, &media)?;
        info!(parent = %parent, child = %child, "added elaboration");
        Ok(elaboration)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content;
    use crate::primitives::DEFAULT_OPEN_TIMEOUT;
    use crate::storage::Engine;
    use tempfile::{TempDir, tempdir};

    fn open_engine() -> (TempDir, Engine) {
        let temp = tempdir().expect("temp dir");
        let engine =
            Engine::open(temp.path().join("test.redb"), DEFAULT_OPEN_TIMEOUT).expect("open db");
        (temp, engine)
    }

    #[test]
    fn ensure_creates_once() {
        let (_temp, engine) = open_engine();
        let hash = content::digest(b"hello");

        let first = engine
            .update(|tx| MediaGraph::ensure(tx, &hash, "Intro"))
            .expect("first");
        assert!(first.created);
        assert_eq!(first.title, "Intro");

        let second = engine
            .update(|tx| MediaGraph::ensure(tx, &hash, "Another title"))
            .expect("second");
        assert!(!second.created);
        assert_eq!(second.title, "Intro", "first writer's title wins");

        assert_eq!(engine.stats().expect("stats").media, 1);
    }

    #[test]
    fn get_unknown_hash_is_none() {
        let (_temp, engine) = open_engine();
        let hash = content::digest(b"missing");
        let media = engine.read(|tx| MediaGraph::get(tx, &hash)).expect("read");
        assert!(media.is_none());
    }

    #[test]
    fn elaboration_appends_to_parent() {
        let (_temp, engine) = open_engine();
        let graph = MediaGraph::new(GraphConfig::default());
        let parent = content::digest(b"parent");
        let child = content::digest(b"child");

        let elaboration = engine
            .update(|tx| {
                MediaGraph::ensure(tx, &parent, "Parent")?;
                MediaGraph::ensure(tx, &child, "Child")?;
                graph.add_elaboration(tx, &parent, &child, "Child", Some("grace"))
            })
            .expect("elaborate");
        assert_eq!(elaboration.votes.upvotes, 3);

        let stored = engine
            .read(|tx| MediaGraph::get(tx, &parent))
            .expect("read")
            .expect("exists");
        assert_eq!(stored.elaborations().len(), 1);
        assert_eq!(stored.elaborations().as_slice()[0].media, child);
    }

    #[test]
    fn elaboration_requires_parent() {
        let (_temp, engine) = open_engine();
        let graph = MediaGraph::new(GraphConfig::default());
        let parent = content::digest(b"absent parent");
        let child = content::digest(b"child");

        let result = engine.update(|tx| {
            MediaGraph::ensure(tx, &child, "Child")?;
            graph.add_elaboration(tx, &parent, &child, "Child", None)
        });
        assert!(matches!(result, Err(HerusError::MissingParentMedia(h)) if h == parent));

        // The whole transaction rolled back, including the child record.
        assert_eq!(engine.stats().expect("stats").media, 0);
    }

    #[test]
    fn elaboration_requires_child() {
        let (_temp, engine) = open_engine();
        let graph = MediaGraph::new(GraphConfig::default());
        let parent = content::digest(b"parent");
        let child = content::digest(b"never stored");

        let result = engine.update(|tx| {
            MediaGraph::ensure(tx, &parent, "Parent")?;
            graph.add_elaboration(tx, &parent, &child, "Child", None)
        });
        assert!(matches!(result, Err(HerusError::MissingMedia(_))));
    }

    #[test]
    fn elaboration_twice_is_duplicate() {
        let (_temp, engine) = open_engine();
        let graph = MediaGraph::new(GraphConfig::default());
        let parent = content::digest(b"parent");
        let child = content::digest(b"child");

        engine
            .update(|tx| {
                MediaGraph::ensure(tx, &parent, "Parent")?;
                MediaGraph::ensure(tx, &child, "Child")?;
                graph.add_elaboration(tx, &parent, &child, "Child", None)
            })
            .expect("first");

        let second = engine.update(|tx| graph.add_elaboration(tx, &parent, &child, "Child", None));
        assert!(matches!(second, Err(HerusError::DuplicateElaboration { .. })));
    }
}

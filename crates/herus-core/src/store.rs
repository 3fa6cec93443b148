//! # Knowledge Graph Store
//!
//! The facade handlers talk to. It owns the engine handle and the blob
//! area and runs every request as exactly one engine transaction:
//!
//! ```text
//! upload:  digest ─► [ ensure media ─► associate | elaborate ] ─► commit ─► write blob (if new)
//! connect: normalize ─► [ add relation ] ─► commit
//! ```
//!
//! Manager errors pass through unchanged. A failure anywhere inside the
//! brackets aborts the transaction, so an upload that cannot attach its
//! media leaves no media record behind.
//!
//! The blob is written after commit. A crash between the two leaves a
//! media record whose blob is missing; `read_blob` then returns `None`
//! until the same bytes are uploaded again, which fills the gap.

use crate::blob::{BlobStore, FsBlobStore};
use crate::config::GraphConfig;
use crate::content;
use crate::media::MediaGraph;
use crate::primitives::{MAX_TITLE_LENGTH, MAX_TOPIC_NAME_LENGTH};
use crate::storage::{Engine, EngineStats};
use crate::topic::TopicGraph;
use crate::{
    HerusError, MediaAssociation, MediaElaboration, MediaHash, TopicName, TopicRelation,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{error, info, warn};

// =============================================================================
// REQUESTS AND VIEWS
// =============================================================================

/// Where an upload gets attached. Exactly one destination per upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadParent {
    /// Associate the media under this topic.
    Topic(TopicName),
    /// Record the media as an elaboration of this media.
    Media(MediaHash),
}

impl UploadParent {
    /// Build the destination from the two optional form fields.
    ///
    /// Blank values count as absent. Supplying both or neither is
    /// `InvalidInput`, as is a malformed hash or a topic name that
    /// normalizes to nothing.
    pub fn from_options(
        parent_media: Option<&str>,
        parent_topic: Option<&str>,
    ) -> Result<Self, HerusError> {
        let parent_media = parent_media.filter(|s| !s.trim().is_empty());
        let parent_topic = parent_topic.filter(|s| !s.trim().is_empty());

        match (parent_media, parent_topic) {
            (Some(_), Some(_)) => Err(HerusError::InvalidInput(
                "only one of parent media and parent topic may be given".to_string(),
            )),
            (None, None) => Err(HerusError::InvalidInput(
                "one of parent media or parent topic is required".to_string(),
            )),
            (Some(hash), None) => MediaHash::parse(hash).map(Self::Media),
            (None, Some(raw)) => validated_topic_name(raw).map(Self::Topic),
        }
    }
}

/// One upload: the bytes, a title and where to attach them.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub content: Vec<u8>,
    pub title: String,
    pub parent: UploadParent,
    pub submitter: Option<String>,
}

impl UploadRequest {
    pub fn new(content: impl Into<Vec<u8>>, title: impl Into<String>, parent: UploadParent) -> Self {
        Self {
            content: content.into(),
            title: title.into(),
            parent,
            submitter: None,
        }
    }

    #[must_use]
    pub fn with_submitter(mut self, submitter: impl Into<String>) -> Self {
        self.submitter = Some(submitter.into());
        self
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub hash: MediaHash,
    /// The stored title, which is the first uploader's for known content.
    pub title: String,
    /// Whether this upload introduced the content.
    pub created: bool,
}

/// Read-only projection of a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicView {
    pub name: TopicName,
    pub title: String,
    pub relations: Vec<TopicRelation>,
    pub media: Vec<MediaAssociation>,
}

/// Read-only projection of a media record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaView {
    pub hash: MediaHash,
    pub title: String,
    pub elaborations: Vec<MediaElaboration>,
}

// =============================================================================
// STORE
// =============================================================================

/// The knowledge-graph store. Construct once per process and share it
/// (`Arc<KnowledgeStore>`); every method takes `&self`.
pub struct KnowledgeStore {
    engine: Engine,
    blobs: Box<dyn BlobStore>,
    config: GraphConfig,
    topics: TopicGraph,
    media: MediaGraph,
    /// Held from transaction start to blob write so a later upload of the
    /// same bytes sees the blob its creator wrote.
    uploads: Mutex<()>,
}

impl std::fmt::Debug for KnowledgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeStore")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl KnowledgeStore {
    /// Open the database at `db_path` and use `media_dir` as the blob area.
    pub fn open(
        db_path: impl AsRef<Path>,
        media_dir: impl AsRef<Path>,
        config: GraphConfig,
        open_timeout: Duration,
    ) -> Result<Self, HerusError> {
        let engine = Engine::open(db_path, open_timeout)?;
        let blobs = FsBlobStore::new(media_dir)?;
        Ok(Self::new(engine, Box::new(blobs), config))
    }

    /// Assemble a store from an open engine and any blob area.
    pub fn new(engine: Engine, blobs: Box<dyn BlobStore>, config: GraphConfig) -> Self {
        Self {
            engine,
            blobs,
            config,
            topics: TopicGraph::new(config),
            media: MediaGraph::new(config),
            uploads: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Store uploaded bytes and attach them to a topic or to other media.
    ///
    /// Identical bytes map to one media record and one blob no matter how
    /// often they are uploaded; each upload may still add a new edge.
    pub fn upload_media(&self, request: &UploadRequest) -> Result<UploadReceipt, HerusError> {
        let title = validated_title(&request.title)?;
        if request.content.len() > self.config.max_upload_bytes {
            return Err(HerusError::InvalidInput(format!(
                "upload of {} bytes exceeds the {} byte limit",
                request.content.len(),
                self.config.max_upload_bytes
            )));
        }

        let hash = content::digest(&request.content);
        let submitter = request.submitter.as_deref();

        let _guard = self
            .uploads
            .lock()
            .map_err(|_| HerusError::Engine("upload lock poisoned".to_string()))?;
        let ensured = self.engine.update(|tx| {
            let ensured = MediaGraph::ensure(tx, &hash, title)?;
            match &request.parent {
                UploadParent::Topic(name) => {
                    self.topics
                        .add_media_association(tx, name, &hash, &ensured.title, submitter)?;
                }
                UploadParent::Media(parent) => {
                    self.media
                        .add_elaboration(tx, parent, &hash, &ensured.title, submitter)?;
                }
            }
            Ok(ensured)
        })?;

        let restore = !ensured.created && !self.blobs.contains(&hash)?;
        if restore {
            warn!(hash = %hash, "known media has no blob, restoring it");
        }
        if ensured.created || restore {
            self.blobs
                .write_blob(&hash, &request.content)
                .inspect_err(|err| {
                    error!(hash = %hash, error = %err, "media committed but blob write failed");
                })?;
        }

        info!(hash = %hash, created = ensured.created, "upload committed");
        Ok(UploadReceipt {
            hash,
            title: ensured.title,
            created: ensured.created,
        })
    }

    /// Link topic `source_raw` to topic `dest_raw`. Both must exist.
    pub fn connect_topics(
        &self,
        source_raw: &str,
        dest_raw: &str,
        submitter: Option<&str>,
    ) -> Result<TopicRelation, HerusError> {
        let source = validated_topic_name(source_raw)?;
        let destination = validated_topic_name(dest_raw)?;
        self.engine
            .update(|tx| self.topics.add_relation(tx, &source, &destination, submitter))
    }

    /// Relations and media of a topic; `None` if it does not exist.
    pub fn topic_view(&self, raw: &str) -> Result<Option<TopicView>, HerusError> {
        let name = validated_topic_name(raw)?;
        let topic = self.engine.read(|tx| TopicGraph::get(tx, &name))?;
        Ok(topic.map(|topic| TopicView {
            title: name.display_title(),
            relations: topic.relations().iter().cloned().collect(),
            media: topic.media().iter().cloned().collect(),
            name,
        }))
    }

    /// Title and elaborations of a media record; `None` if unknown.
    pub fn media_view(&self, hash: &MediaHash) -> Result<Option<MediaView>, HerusError> {
        let media = self.engine.read(|tx| MediaGraph::get(tx, hash))?;
        Ok(media.map(|media| MediaView {
            hash: hash.clone(),
            title: media.title().to_string(),
            elaborations: media.elaborations().iter().cloned().collect(),
        }))
    }

    /// Raw bytes of uploaded media.
    pub fn read_blob(&self, hash: &MediaHash) -> Result<Option<Vec<u8>>, HerusError> {
        self.blobs.read_blob(hash)
    }

    /// Record counts.
    pub fn stats(&self) -> Result<EngineStats, HerusError> {
        self.engine.stats()
    }
}

fn validated_title(raw: &str) -> Result<&str, HerusError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(HerusError::InvalidInput("title must not be empty".to_string()));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(HerusError::InvalidInput(format!(
            "title exceeds {} bytes",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(title)
}

/// Normalize exactly as `normalize_topic_name` does; surrounding
/// whitespace becomes underscores like any other whitespace. Only names
/// with no visible characters are refused.
fn validated_topic_name(raw: &str) -> Result<TopicName, HerusError> {
    if raw.trim().is_empty() {
        return Err(HerusError::InvalidInput(
            "topic name must not be empty".to_string(),
        ));
    }
    let name = TopicName::normalize(raw);
    if name.as_str().len() > MAX_TOPIC_NAME_LENGTH {
        return Err(HerusError::InvalidInput(format!(
            "topic name exceeds {} bytes",
            MAX_TOPIC_NAME_LENGTH
        )));
    }
    Ok(name)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::primitives::DEFAULT_OPEN_TIMEOUT;
    use tempfile::{TempDir, tempdir};

    fn open_store(config: GraphConfig) -> (TempDir, KnowledgeStore) {
        let temp = tempdir().expect("temp dir");
        let engine =
            Engine::open(temp.path().join("test.redb"), DEFAULT_OPEN_TIMEOUT).expect("open db");
        let store = KnowledgeStore::new(engine, Box::new(MemoryBlobStore::new()), config);
        (temp, store)
    }

    fn to_topic(raw: &str) -> UploadParent {
        UploadParent::from_options(None, Some(raw)).expect("topic parent")
    }

    #[test]
    fn from_options_requires_exactly_one() {
        let hash = content::digest(b"x");
        assert!(matches!(
            UploadParent::from_options(Some(hash.as_str()), Some("science")),
            Err(HerusError::InvalidInput(_))
        ));
        assert!(matches!(
            UploadParent::from_options(None, None),
            Err(HerusError::InvalidInput(_))
        ));
        assert!(matches!(
            UploadParent::from_options(Some("  "), Some("")),
            Err(HerusError::InvalidInput(_))
        ));
        assert_eq!(
            UploadParent::from_options(Some(hash.as_str()), Some("")).expect("media"),
            UploadParent::Media(hash)
        );
        assert_eq!(
            UploadParent::from_options(None, Some("Quantum Physics")).expect("topic"),
            UploadParent::Topic(TopicName::normalize("quantum_physics"))
        );
    }

    #[test]
    fn from_options_rejects_bad_hash() {
        assert!(matches!(
            UploadParent::from_options(Some("not-a-hash"), None),
            Err(HerusError::InvalidInput(_))
        ));
    }

    #[test]
    fn upload_creates_topic_media_and_association() {
        let (_temp, store) = open_store(GraphConfig::default());
        let receipt = store
            .upload_media(&UploadRequest::new("hello", "Intro", to_topic("Science")))
            .expect("upload");
        assert!(receipt.created);
        assert_eq!(receipt.hash, content::digest(b"hello"));
        assert_eq!(receipt.title, "Intro");

        let view = store.topic_view("science").expect("view").expect("exists");
        assert_eq!(view.title, "Science");
        assert_eq!(view.media.len(), 1);
        assert_eq!(view.media[0].media, receipt.hash);
        assert_eq!(view.media[0].votes.upvotes, 3);

        let blob = store.read_blob(&receipt.hash).expect("blob");
        assert_eq!(blob.as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn reupload_keeps_first_title() {
        let (_temp, store) = open_store(GraphConfig::default());
        store
            .upload_media(&UploadRequest::new("same", "First", to_topic("a")))
            .expect("first");
        let second = store
            .upload_media(&UploadRequest::new("same", "Second", to_topic("b")))
            .expect("second");
        assert!(!second.created);
        assert_eq!(second.title, "First");

        let view = store.topic_view("b").expect("view").expect("exists");
        assert_eq!(view.media[0].title, "First");
        assert_eq!(store.stats().expect("stats").media, 1);
    }

    #[test]
    fn upload_validates_title_and_size() {
        let config = GraphConfig {
            max_upload_bytes: 4,
            ..GraphConfig::default()
        };
        let (_temp, store) = open_store(config);

        let blank = store.upload_media(&UploadRequest::new("ok", "   ", to_topic("t")));
        assert!(matches!(blank, Err(HerusError::InvalidInput(_))));

        let long_title = "x".repeat(MAX_TITLE_LENGTH + 1);
        let long = store.upload_media(&UploadRequest::new("ok", long_title, to_topic("t")));
        assert!(matches!(long, Err(HerusError::InvalidInput(_))));

        let big = store.upload_media(&UploadRequest::new("too big", "Title", to_topic("t")));
        assert!(matches!(big, Err(HerusError::InvalidInput(_))));

        assert_eq!(store.stats().expect("stats"), EngineStats::default());
    }

    #[test]
    fn elaboration_upload_links_media() {
        let (_temp, store) = open_store(GraphConfig::default());
        let parent = store
            .upload_media(&UploadRequest::new("parent", "Parent", to_topic("t")))
            .expect("parent");
        let child = store
            .upload_media(
                &UploadRequest::new("child", "Child", UploadParent::Media(parent.hash.clone()))
                    .with_submitter("ada"),
            )
            .expect("child");

        let view = store.media_view(&parent.hash).expect("view").expect("exists");
        assert_eq!(view.title, "Parent");
        assert_eq!(view.elaborations.len(), 1);
        assert_eq!(view.elaborations[0].media, child.hash);
        assert_eq!(view.elaborations[0].submitter.as_deref(), Some("ada"));
    }

    #[test]
    fn connect_rejects_blank_names() {
        let (_temp, store) = open_store(GraphConfig::default());
        assert!(matches!(
            store.connect_topics("  ", "math", None),
            Err(HerusError::InvalidInput(_))
        ));
    }

    #[test]
    fn facade_keys_topics_like_normalize_topic_name() {
        let (_temp, store) = open_store(GraphConfig::default());
        assert_eq!(
            to_topic(" science"),
            UploadParent::Topic(crate::normalize_topic_name(" science"))
        );
        store
            .upload_media(&UploadRequest::new("a", "A", to_topic(" science")))
            .expect("upload");
        store
            .upload_media(&UploadRequest::new("b", "B", to_topic("math")))
            .expect("upload");

        assert!(store.topic_view("science").expect("view").is_none());
        let relation = store
            .connect_topics(" science", "math", None)
            .expect("connect");
        assert_eq!(relation.destination.as_str(), "math");

        let view = store.topic_view("_science").expect("view").expect("exists");
        assert_eq!(view.name.as_str(), "_science");
        assert_eq!(view.relations.len(), 1);
        assert!(matches!(
            store.connect_topics("_science", "math", None),
            Err(HerusError::DuplicateRelation { .. })
        ));
    }

    #[test]
    fn views_of_unknown_keys_are_none() {
        let (_temp, store) = open_store(GraphConfig::default());
        assert!(store.topic_view("nothing").expect("view").is_none());
        let hash = content::digest(b"nothing");
        assert!(store.media_view(&hash).expect("view").is_none());
        assert!(store.read_blob(&hash).expect("blob").is_none());
    }
}

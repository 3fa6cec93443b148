//! # herus-core
//!
//! The transactional knowledge-graph store behind Herus.
//!
//! Users submit topics (wiki-like pages), attach uploaded media to topics
//! or to other media, and link topics to one another. This crate holds
//! that graph:
//! - `Topic` records keyed by normalized name, with outbound relations and
//!   attached media
//! - `Media` records keyed by the SHA-256 of their bytes, with
//!   elaborations pointing at other media
//! - a content-addressed blob area for the raw bytes
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: no async, no network dependencies
//! - Every invariant-checking mutation runs inside one redb write
//!   transaction, so existence checks and appends cannot race
//! - Edge lists refuse duplicate targets on insert
//! - The store never panics on damaged records; it reports `CorruptRecord`

// =============================================================================
// MODULES
// =============================================================================

pub mod blob;
pub mod config;
pub mod content;
pub mod formats;
pub mod media;
pub mod primitives;
pub mod storage;
pub mod store;
pub mod topic;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Edge, EdgeList, HerusError, Media, MediaAssociation, MediaElaboration, MediaHash, Topic,
    TopicName, TopicRelation, VoteTally,
};

// =============================================================================
// RE-EXPORTS: Store
// =============================================================================

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use config::{GraphConfig, MissingTopicPolicy};
pub use media::{EnsuredMedia, MediaGraph};
pub use storage::{Engine, EngineStats};
pub use store::{
    KnowledgeStore, MediaView, TopicView, UploadParent, UploadReceipt, UploadRequest,
};
pub use topic::{TopicGraph, normalize_topic_name};

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

pub use formats::{RecordHeader, decode_record, encode_record};

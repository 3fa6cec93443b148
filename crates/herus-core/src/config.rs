//! Graph policy knobs.
//!
//! Everything here has a default matching the site's historical behaviour,
//! and the app layer can override it from `herus.toml`.

use crate::primitives::{DEFAULT_MAX_UPLOAD_BYTES, VOTE_SEED_UPVOTES};
use crate::types::VoteTally;
use serde::{Deserialize, Serialize};

/// What an upload does when its parent topic does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingTopicPolicy {
    /// Create the topic in the same transaction. Uploads are the only way
    /// a topic comes into existence, so this is the default.
    #[default]
    Create,
    /// Fail the upload with `MissingTopic`; nothing is written.
    Reject,
}

/// Policy applied by the graph managers and the store facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Upvotes every new edge starts with.
    #[serde(default = "default_seed_upvotes")]
    pub seed_upvotes: u64,

    /// Behaviour for associations against an absent topic.
    #[serde(default)]
    pub missing_topic: MissingTopicPolicy,

    /// Largest accepted upload, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_seed_upvotes() -> u64 {
    VOTE_SEED_UPVOTES
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            seed_upvotes: VOTE_SEED_UPVOTES,
            missing_topic: MissingTopicPolicy::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl GraphConfig {
    /// Tally a freshly created edge starts with.
    #[must_use]
    pub fn initial_votes(&self) -> VoteTally {
        VoteTally::seeded(self.seed_upvotes)
    }

    /// Same config with a different missing-topic policy.
    #[must_use]
    pub fn with_missing_topic(mut self, policy: MissingTopicPolicy) -> Self {
        self.missing_topic = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_history() {
        let config = GraphConfig::default();
        assert_eq!(config.seed_upvotes, 3);
        assert_eq!(config.missing_topic, MissingTopicPolicy::Create);
        assert_eq!(config.max_upload_bytes, 8 << 20);
        assert_eq!(config.initial_votes().upvotes, 3);
    }

    #[test]
    fn with_missing_topic_overrides_only_policy() {
        let config = GraphConfig::default().with_missing_topic(MissingTopicPolicy::Reject);
        assert_eq!(config.missing_topic, MissingTopicPolicy::Reject);
        assert_eq!(config.seed_upvotes, VOTE_SEED_UPVOTES);
    }
}

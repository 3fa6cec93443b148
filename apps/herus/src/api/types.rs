//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Every mutating response carries `success`, and on failure `error` (a
//! human message) and `kind` (the stable `HerusError::kind()` code).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use herus_core::{
    HerusError, MediaAssociation, MediaElaboration, MediaView, TopicRelation, TopicView,
    UploadParent, UploadReceipt, UploadRequest, VoteTally,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Record counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub topics: u64,
    pub media: u64,
}

// =============================================================================
// EDGES
// =============================================================================

/// A topic → topic relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationJson {
    pub destination: String,
    pub submitted_at: String,
    pub submitter: Option<String>,
    pub votes: VoteTally,
}

impl From<&TopicRelation> for RelationJson {
    fn from(relation: &TopicRelation) -> Self {
        Self {
            destination: relation.destination.to_string(),
            submitted_at: relation.submitted_at.to_rfc3339(),
            submitter: relation.submitter.clone(),
            votes: relation.votes,
        }
    }
}

/// A topic → media association or media → media elaboration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaLinkJson {
    pub hash: String,
    pub title: String,
    pub submitted_at: String,
    pub submitter: Option<String>,
    pub votes: VoteTally,
}

impl From<&MediaAssociation> for MediaLinkJson {
    fn from(link: &MediaAssociation) -> Self {
        Self {
            hash: link.media.to_string(),
            title: link.title.clone(),
            submitted_at: link.submitted_at.to_rfc3339(),
            submitter: link.submitter.clone(),
            votes: link.votes,
        }
    }
}

impl From<&MediaElaboration> for MediaLinkJson {
    fn from(link: &MediaElaboration) -> Self {
        Self {
            hash: link.media.to_string(),
            title: link.title.clone(),
            submitted_at: link.submitted_at.to_rfc3339(),
            submitter: link.submitter.clone(),
            votes: link.votes,
        }
    }
}

// =============================================================================
// UPLOAD REQUEST/RESPONSE
// =============================================================================

/// Media upload. Exactly one of `parent_media` / `parent_topic`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequestJson {
    /// Base64 (standard alphabet) file content.
    pub content: String,
    pub title: String,
    #[serde(default)]
    pub parent_media: Option<String>,
    #[serde(default)]
    pub parent_topic: Option<String>,
    #[serde(default)]
    pub submitter: Option<String>,
}

impl UploadRequestJson {
    /// Decode the payload and resolve the destination.
    pub fn to_upload(&self) -> Result<UploadRequest, HerusError> {
        let parent =
            UploadParent::from_options(self.parent_media.as_deref(), self.parent_topic.as_deref())?;
        let content = BASE64
            .decode(self.content.as_bytes())
            .map_err(|e| HerusError::InvalidInput(format!("content is not valid base64: {}", e)))?;

        let mut request = UploadRequest::new(content, self.title.clone(), parent);
        if let Some(submitter) = self.submitter.as_deref().filter(|s| !s.is_empty()) {
            request = request.with_submitter(submitter);
        }
        Ok(request)
    }
}

/// Upload outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub hash: Option<String>,
    pub title: Option<String>,
    pub created: Option<bool>,
    pub error: Option<String>,
    pub kind: Option<String>,
}

impl UploadResponse {
    pub fn success(receipt: &UploadReceipt) -> Self {
        Self {
            success: true,
            hash: Some(receipt.hash.to_string()),
            title: Some(receipt.title.clone()),
            created: Some(receipt.created),
            error: None,
            kind: None,
        }
    }

    pub fn error(err: &HerusError) -> Self {
        Self {
            success: false,
            hash: None,
            title: None,
            created: None,
            error: Some(err.to_string()),
            kind: Some(err.kind().to_string()),
        }
    }
}

// =============================================================================
// CONNECT REQUEST/RESPONSE
// =============================================================================

/// Topic connection request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub submitter: Option<String>,
}

/// Connection outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub success: bool,
    pub relation: Option<RelationJson>,
    pub error: Option<String>,
    pub kind: Option<String>,
}

impl ConnectResponse {
    pub fn success(relation: &TopicRelation) -> Self {
        Self {
            success: true,
            relation: Some(relation.into()),
            error: None,
            kind: None,
        }
    }

    pub fn error(err: &HerusError) -> Self {
        Self {
            success: false,
            relation: None,
            error: Some(err.to_string()),
            kind: Some(err.kind().to_string()),
        }
    }
}

// =============================================================================
// VIEW RESPONSES
// =============================================================================

/// Topic page data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicResponse {
    pub found: bool,
    pub name: String,
    pub title: Option<String>,
    pub relations: Vec<RelationJson>,
    pub media: Vec<MediaLinkJson>,
    pub error: Option<String>,
    pub kind: Option<String>,
}

impl TopicResponse {
    pub fn found(view: &TopicView) -> Self {
        Self {
            found: true,
            name: view.name.to_string(),
            title: Some(view.title.clone()),
            relations: view.relations.iter().map(RelationJson::from).collect(),
            media: view.media.iter().map(MediaLinkJson::from).collect(),
            error: None,
            kind: None,
        }
    }

    pub fn not_found(name: &str) -> Self {
        Self {
            found: false,
            name: name.to_string(),
            title: None,
            relations: Vec::new(),
            media: Vec::new(),
            error: Some(format!("topic does not exist: {}", name)),
            kind: None,
        }
    }

    pub fn error(name: &str, err: &HerusError) -> Self {
        Self {
            error: Some(err.to_string()),
            kind: Some(err.kind().to_string()),
            ..Self::not_found(name)
        }
    }
}

/// Media page data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaResponse {
    pub found: bool,
    pub hash: String,
    pub title: Option<String>,
    pub elaborations: Vec<MediaLinkJson>,
    pub error: Option<String>,
    pub kind: Option<String>,
}

impl MediaResponse {
    pub fn found(view: &MediaView) -> Self {
        Self {
            found: true,
            hash: view.hash.to_string(),
            title: Some(view.title.clone()),
            elaborations: view.elaborations.iter().map(MediaLinkJson::from).collect(),
            error: None,
            kind: None,
        }
    }

    pub fn not_found(hash: &str) -> Self {
        Self {
            found: false,
            hash: hash.to_string(),
            title: None,
            elaborations: Vec::new(),
            error: Some(format!("media does not exist: {}", hash)),
            kind: None,
        }
    }

    pub fn error(hash: &str, err: &HerusError) -> Self {
        Self {
            error: Some(err.to_string()),
            kind: Some(err.kind().to_string()),
            ..Self::not_found(hash)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use herus_core::{TopicName, content};

    fn upload_json(parent_media: Option<&str>, parent_topic: Option<&str>) -> UploadRequestJson {
        UploadRequestJson {
            content: BASE64.encode(b"hello"),
            title: "Intro".to_string(),
            parent_media: parent_media.map(str::to_owned),
            parent_topic: parent_topic.map(str::to_owned),
            submitter: Some(String::new()),
        }
    }

    #[test]
    fn upload_json_decodes_content() {
        let request = upload_json(None, Some("Science")).to_upload().expect("valid");
        assert_eq!(request.content, b"hello");
        assert_eq!(
            request.parent,
            UploadParent::Topic(TopicName::normalize("science"))
        );
        assert!(request.submitter.is_none(), "empty submitter is dropped");
    }

    #[test]
    fn upload_json_rejects_bad_base64() {
        let mut json = upload_json(None, Some("science"));
        json.content = "%%%".to_string();
        assert!(matches!(json.to_upload(), Err(HerusError::InvalidInput(_))));
    }

    #[test]
    fn upload_json_rejects_two_parents() {
        let hash = content::digest(b"x");
        let json = upload_json(Some(hash.as_str()), Some("science"));
        assert!(matches!(json.to_upload(), Err(HerusError::InvalidInput(_))));
    }

    #[test]
    fn error_responses_carry_kind() {
        let err = HerusError::MissingDestination(TopicName::normalize("math"));
        let response = ConnectResponse::error(&err);
        assert!(!response.success);
        assert_eq!(response.kind.as_deref(), Some("missing_destination"));
    }
}

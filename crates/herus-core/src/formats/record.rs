//! # Record Codec
//!
//! Binary encoding for `Topic` and `Media` values stored in the engine.
//!
//! Format: Header (5 bytes) + postcard-serialized record.
//! - 4 bytes: Magic ("HRUS")
//! - 1 byte: Version
//!
//! Decoding validates size and header before touching the payload, and
//! requires the payload to be consumed exactly. Any failure is reported
//! as `HerusError::CorruptRecord`; the decoder never panics.

use crate::HerusError;
use crate::primitives::{FORMAT_VERSION, HEADER_LEN, MAGIC_BYTES, MAX_RECORD_SIZE};
use serde::Serialize;
use serde::de::DeserializeOwned;

// =============================================================================
// HEADER
// =============================================================================

/// The header preceding every stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl RecordHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn current() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read and validate a header from the front of `bytes`.
    pub fn read(bytes: &[u8]) -> Result<Self, HerusError> {
        let Some(head) = bytes.get(..HEADER_LEN) else {
            return Err(HerusError::CorruptRecord(format!(
                "record is {} bytes, shorter than its {}-byte header",
                bytes.len(),
                HEADER_LEN
            )));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&head[0..4]);
        let header = Self {
            magic,
            version: head[4],
        };

        if &header.magic != MAGIC_BYTES {
            return Err(HerusError::CorruptRecord("invalid magic bytes".to_string()));
        }
        if header.version != FORMAT_VERSION {
            return Err(HerusError::CorruptRecord(format!(
                "unsupported record version {} (expected {})",
                header.version, FORMAT_VERSION
            )));
        }
        Ok(header)
    }
}

// =============================================================================
// ENCODE / DECODE
// =============================================================================

/// Serialize a record to bytes (header + payload).
pub fn encode_record<T: Serialize>(record: &T) -> Result<Vec<u8>, HerusError> {
    let payload = postcard::to_stdvec(record)
        .map_err(|e| HerusError::CorruptRecord(format!("failed to encode record: {}", e)))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&RecordHeader::current().to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Deserialize a record previously produced by `encode_record`.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, HerusError> {
    if bytes.len() > MAX_RECORD_SIZE {
        return Err(HerusError::CorruptRecord(format!(
            "record size {} bytes exceeds maximum {} bytes",
            bytes.len(),
            MAX_RECORD_SIZE
        )));
    }

    RecordHeader::read(bytes)?;

    let (record, rest) = postcard::take_from_bytes::<T>(&bytes[HEADER_LEN..])
        .map_err(|e| HerusError::CorruptRecord(format!("failed to decode record: {}", e)))?;
    if !rest.is_empty() {
        return Err(HerusError::CorruptRecord(format!(
            "{} trailing bytes after record",
            rest.len()
        )));
    }
    Ok(record)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Media, MediaElaboration, MediaHash, Topic, TopicName, TopicRelation, VoteTally};

    fn sample_topic() -> Topic {
        let mut topic = Topic::new();
        let mut votes = VoteTally::seeded(3);
        votes.leftvotes = 7;
        votes.centervotes = 2;
        let relation = TopicRelation::new(TopicName::normalize("Math"), Some("ada".into()), votes);
        assert!(topic.add_relation(relation));
        topic
    }

    #[test]
    fn topic_roundtrip_is_exact() {
        let topic = sample_topic();
        let bytes = encode_record(&topic).expect("encode");
        let restored: Topic = decode_record(&bytes).expect("decode");

        // Timestamps, submitters and every counter survive.
        assert_eq!(restored, topic);
    }

    #[test]
    fn media_roundtrip_is_exact() {
        let mut media = Media::new("Intro");
        let child = MediaHash::parse(&"c".repeat(64)).expect("hash");
        assert!(media.add_elaboration(MediaElaboration::new(
            child,
            "Follow-up",
            None,
            VoteTally::seeded(3)
        )));

        let bytes = encode_record(&media).expect("encode");
        let restored: Media = decode_record(&bytes).expect("decode");
        assert_eq!(restored, media);
    }

    #[test]
    fn encoding_is_deterministic() {
        let topic = sample_topic();
        let first = encode_record(&topic).expect("encode");
        let second = encode_record(&topic).expect("encode");
        assert_eq!(first, second);
    }

    #[test]
    fn short_input_is_corrupt() {
        let result = decode_record::<Topic>(b"HR");
        assert!(matches!(result, Err(HerusError::CorruptRecord(_))));
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = encode_record(&sample_topic()).expect("encode");
        bytes[0..4].copy_from_slice(b"XXXX");
        assert!(matches!(
            decode_record::<Topic>(&bytes),
            Err(HerusError::CorruptRecord(_))
        ));
    }

    #[test]
    fn future_version_rejected() {
        let mut bytes = encode_record(&sample_topic()).expect("encode");
        bytes[4] = FORMAT_VERSION + 1;
        assert!(decode_record::<Topic>(&bytes).is_err());
    }

    #[test]
    fn truncated_payload_is_corrupt() {
        let bytes = encode_record(&sample_topic()).expect("encode");
        let truncated = &bytes[..bytes.len() - 3];
        assert!(matches!(
            decode_record::<Topic>(truncated),
            Err(HerusError::CorruptRecord(_))
        ));
    }

    #[test]
    fn trailing_garbage_is_corrupt() {
        let mut bytes = encode_record(&Media::new("t")).expect("encode");
        bytes.extend_from_slice(&[0xde, 0xad]);
        assert!(matches!(
            decode_record::<Media>(&bytes),
            Err(HerusError::CorruptRecord(_))
        ));
    }

    #[test]
    fn garbage_payload_never_panics() {
        let mut bytes = RecordHeader::current().to_bytes().to_vec();
        bytes.extend_from_slice(&[0xff; 32]);
        assert!(decode_record::<Topic>(&bytes).is_err());
        assert!(decode_record::<Media>(&bytes).is_err());
    }
}

//! # Formats
//!
//! Byte layouts for values stored in the engine.

pub mod record;

pub use record::{RecordHeader, decode_record, encode_record};

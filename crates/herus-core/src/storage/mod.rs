//! # Storage
//!
//! The embedded key-value engine (redb) and the transaction handles the
//! graph managers operate on.

pub mod engine;

pub use engine::{Bucket, Engine, EngineStats, KvRead, ReadTx, WriteTx};

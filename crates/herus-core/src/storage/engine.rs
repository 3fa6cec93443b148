//! # redb-backed Engine
//!
//! A thin wrapper over a redb `Database` exposing exactly what the graph
//! managers need:
//! - two named buckets (`Topics`, `Media`) of string key → encoded record
//! - closure-scoped read-only and read-write transactions
//! - owned copies of values, never guards into engine pages
//!
//! redb provides the guarantees the store leans on: ACID commits, a single
//! writer at a time (`begin_write` blocks while another write transaction
//! is live) and snapshot readers that never block or are blocked by it.

use crate::HerusError;
use crate::primitives::OPEN_RETRY_INTERVAL;
use redb::{
    Database, DatabaseError, ReadableDatabase, ReadableTable, ReadableTableMetadata,
    TableDefinition,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Topics bucket: normalized topic name -> encoded `Topic`.
const TOPICS: TableDefinition<&str, &[u8]> = TableDefinition::new("Topics");

/// Media bucket: hex media hash -> encoded `Media`.
const MEDIA: TableDefinition<&str, &[u8]> = TableDefinition::new("Media");

// =============================================================================
// ERROR CONVERSIONS
// =============================================================================

macro_rules! engine_failure_from {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for HerusError {
                fn from(err: $err) -> Self {
                    HerusError::Engine(err.to_string())
                }
            }
        )*
    };
}

engine_failure_from!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

// =============================================================================
// BUCKETS
// =============================================================================

/// A named partition of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Topics,
    Media,
}

impl Bucket {
    fn definition(self) -> TableDefinition<'static, &'static str, &'static [u8]> {
        match self {
            Self::Topics => TOPICS,
            Self::Media => MEDIA,
        }
    }
}

// =============================================================================
// TRANSACTION HANDLES
// =============================================================================

/// Read access shared by both transaction kinds.
pub trait KvRead {
    /// Copy out the value stored under `key`, if any.
    fn get(&self, bucket: Bucket, key: &str) -> Result<Option<Vec<u8>>, HerusError>;

    /// Whether `key` is present in `bucket`.
    fn contains(&self, bucket: Bucket, key: &str) -> Result<bool, HerusError> {
        Ok(self.get(bucket, key)?.is_some())
    }
}

/// A read-only snapshot transaction.
pub struct ReadTx {
    txn: redb::ReadTransaction,
}

impl KvRead for ReadTx {
    fn get(&self, bucket: Bucket, key: &str) -> Result<Option<Vec<u8>>, HerusError> {
        let table = self.txn.open_table(bucket.definition())?;
        let value = table.get(key)?.map(|guard| guard.value().to_vec());
        Ok(value)
    }
}

/// The process-wide single read-write transaction.
pub struct WriteTx {
    txn: redb::WriteTransaction,
}

impl WriteTx {
    /// Store `value` under `key`, replacing any previous value.
    pub fn put(&mut self, bucket: Bucket, key: &str, value: &[u8]) -> Result<(), HerusError> {
        let mut table = self.txn.open_table(bucket.definition())?;
        table.insert(key, value)?;
        Ok(())
    }
}

impl KvRead for WriteTx {
    fn get(&self, bucket: Bucket, key: &str) -> Result<Option<Vec<u8>>, HerusError> {
        let table = self.txn.open_table(bucket.definition())?;
        let value = table.get(key)?.map(|guard| guard.value().to_vec());
        Ok(value)
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Record counts per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineStats {
    pub topics: u64,
    pub media: u64,
}

/// The embedded database handle. Open once per process and share it.
pub struct Engine {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Open or create the database at `path` and make sure both buckets
    /// exist.
    ///
    /// If another process holds the file, retries until `timeout` has
    /// elapsed and then fails with `HerusError::Engine`.
    pub fn open(path: impl AsRef<Path>, timeout: Duration) -> Result<Self, HerusError> {
        let path = path.as_ref().to_path_buf();
        // A timeout too large to represent means "wait indefinitely".
        let deadline = Instant::now().checked_add(timeout);

        let db = loop {
            match Database::create(&path) {
                Ok(db) => break db,
                Err(DatabaseError::DatabaseAlreadyOpen)
                    if deadline.is_none_or(|deadline| Instant::now() < deadline) =>
                {
                    debug!(path = %path.display(), "database locked, retrying");
                    std::thread::sleep(OPEN_RETRY_INTERVAL);
                }
                Err(DatabaseError::DatabaseAlreadyOpen) => {
                    return Err(HerusError::Engine(format!(
                        "timed out after {:?} waiting for {}",
                        timeout,
                        path.display()
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        };

        // Initialize tables if they don't exist
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(TOPICS)?;
            write_txn.open_table(MEDIA)?;
        }
        write_txn.commit()?;

        info!(path = %path.display(), "opened knowledge graph database");
        Ok(Self { db, path })
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against one consistent read-only snapshot.
    pub fn read<T>(
        &self,
        f: impl FnOnce(&ReadTx) -> Result<T, HerusError>,
    ) -> Result<T, HerusError> {
        let tx = ReadTx {
            txn: self.db.begin_read()?,
        };
        f(&tx)
    }

    /// Run `f` inside one read-write transaction.
    ///
    /// Commits if `f` returns `Ok`; otherwise aborts, so none of the
    /// writes `f` made become visible, and returns `f`'s error unchanged.
    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut WriteTx) -> Result<T, HerusError>,
    ) -> Result<T, HerusError> {
        let mut tx = WriteTx {
            txn: self.db.begin_write()?,
        };

        match f(&mut tx) {
            Ok(value) => {
                tx.txn.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = tx.txn.abort() {
                    warn!(error = %abort_err, "failed to abort write transaction");
                }
                debug!(kind = err.kind(), error = %err, "write transaction rolled back");
                Err(err)
            }
        }
    }

    /// Count the records in each bucket.
    pub fn stats(&self) -> Result<EngineStats, HerusError> {
        let txn = self.db.begin_read()?;
        let topics = txn.open_table(TOPICS)?.len()?;
        let media = txn.open_table(MEDIA)?.len()?;
        Ok(EngineStats { topics, media })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::DEFAULT_OPEN_TIMEOUT;
    use tempfile::tempdir;

    #[test]
    fn open_accepts_unbounded_timeout() {
        let temp = tempdir().expect("temp dir");
        let engine = Engine::open(temp.path().join("test.redb"), Duration::MAX).expect("open db");
        assert_eq!(engine.stats().expect("stats"), EngineStats::default());
    }

    #[test]
    fn open_creates_empty_buckets() {
        let temp = tempdir().expect("temp dir");
        let engine = Engine::open(temp.path().join("test.redb"), DEFAULT_OPEN_TIMEOUT)
            .expect("open db");

        assert_eq!(engine.stats().expect("stats"), EngineStats::default());
        let found = engine
            .read(|tx| tx.get(Bucket::Topics, "anything"))
            .expect("read");
        assert!(found.is_none());
    }

    #[test]
    fn committed_write_is_visible() {
        let temp = tempdir().expect("temp dir");
        let engine = Engine::open(temp.path().join("test.redb"), DEFAULT_OPEN_TIMEOUT)
            .expect("open db");

        engine
            .update(|tx| tx.put(Bucket::Media, "k", b"v"))
            .expect("update");

        let value = engine.read(|tx| tx.get(Bucket::Media, "k")).expect("read");
        assert_eq!(value.as_deref(), Some(&b"v"[..]));
        assert_eq!(engine.stats().expect("stats").media, 1);
    }

    #[test]
    fn failed_closure_rolls_back_every_write() {
        let temp = tempdir().expect("temp dir");
        let engine = Engine::open(temp.path().join("test.redb"), DEFAULT_OPEN_TIMEOUT)
            .expect("open db");

        let result: Result<(), HerusError> = engine.update(|tx| {
            tx.put(Bucket::Topics, "a", b"1")?;
            tx.put(Bucket::Media, "b", b"2")?;
            Err(HerusError::InvalidInput("boom".into()))
        });

        assert!(matches!(result, Err(HerusError::InvalidInput(_))));
        assert_eq!(engine.stats().expect("stats"), EngineStats::default());
    }

    #[test]
    fn write_tx_reads_its_own_writes() {
        let temp = tempdir().expect("temp dir");
        let engine = Engine::open(temp.path().join("test.redb"), DEFAULT_OPEN_TIMEOUT)
            .expect("open db");

        let seen = engine
            .update(|tx| {
                tx.put(Bucket::Topics, "x", b"payload")?;
                tx.contains(Bucket::Topics, "x")
            })
            .expect("update");
        assert!(seen);
    }

    #[test]
    fn data_persists_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        {
            let engine = Engine::open(&db_path, DEFAULT_OPEN_TIMEOUT).expect("open db");
            engine
                .update(|tx| tx.put(Bucket::Topics, "science", b"record"))
                .expect("update");
        }

        let engine = Engine::open(&db_path, DEFAULT_OPEN_TIMEOUT).expect("reopen db");
        let value = engine
            .read(|tx| tx.get(Bucket::Topics, "science"))
            .expect("read");
        assert_eq!(value.as_deref(), Some(&b"record"[..]));
    }

    #[test]
    fn second_open_times_out_while_held() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        let _held = Engine::open(&db_path, DEFAULT_OPEN_TIMEOUT).expect("open db");
        let started = Instant::now();
        let second = Engine::open(&db_path, Duration::from_millis(200));

        assert!(matches!(second, Err(HerusError::Engine(_))));
        assert!(started.elapsed() >= Duration::from_millis(200));
    }
}

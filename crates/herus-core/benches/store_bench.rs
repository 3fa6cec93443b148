//! # Store Benchmarks
//!
//! Throughput of the upload and connect paths and of the read views,
//! against a real redb file and an in-memory blob area.
//!
//! Run with: `cargo bench -p herus-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use herus_core::{
    Engine, GraphConfig, KnowledgeStore, MemoryBlobStore, UploadParent, UploadRequest, content,
    primitives::DEFAULT_OPEN_TIMEOUT,
};
use std::hint::black_box;
use tempfile::{TempDir, tempdir};

fn open_store() -> (TempDir, KnowledgeStore) {
    let temp = tempdir().expect("temp dir");
    let engine =
        Engine::open(temp.path().join("bench.redb"), DEFAULT_OPEN_TIMEOUT).expect("open db");
    let store = KnowledgeStore::new(
        engine,
        Box::new(MemoryBlobStore::new()),
        GraphConfig::default(),
    );
    (temp, store)
}

fn topic(raw: &str) -> UploadParent {
    UploadParent::from_options(None, Some(raw)).expect("topic")
}

/// A store whose topic `hub` holds `size` associations.
fn populated_store(size: usize) -> (TempDir, KnowledgeStore) {
    let (temp, store) = open_store();
    for i in 0..size {
        store
            .upload_media(&UploadRequest::new(
                format!("payload {}", i),
                format!("Item {}", i),
                topic("hub"),
            ))
            .expect("upload");
    }
    (temp, store)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest");

    for size in [1024usize, 64 * 1024, 1024 * 1024].iter() {
        let bytes = vec![0xA5u8; *size];
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| black_box(content::digest(bytes)));
        });
    }

    group.finish();
}

fn bench_upload(c: &mut Criterion) {
    let mut group = c.benchmark_group("upload");

    // Each association rewrites the whole topic record, so cost grows with
    // the number of media already under the topic.
    for size in [10usize, 100, 500].iter() {
        let (_temp, store) = populated_store(*size);
        let mut counter = 0u64;

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                counter += 1;
                let request =
                    UploadRequest::new(format!("fresh {}", counter), "Fresh", topic("hub"));
                black_box(store.upload_media(&request).expect("upload"))
            });
        });
    }

    group.finish();
}

fn bench_connect(c: &mut Criterion) {
    c.bench_function("connect", |b| {
        let (_temp, store) = open_store();
        store
            .upload_media(&UploadRequest::new("source", "Source", topic("source")))
            .expect("seed source");
        let mut counter = 0u64;

        b.iter(|| {
            counter += 1;
            let dest = format!("dest {}", counter);
            store
                .upload_media(&UploadRequest::new(dest.clone(), "Dest", topic(&dest)))
                .expect("seed dest");
            black_box(store.connect_topics("source", &dest, None).expect("connect"))
        });
    });
}

fn bench_topic_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("topic_view");

    for size in [10usize, 100, 500].iter() {
        let (_temp, store) = populated_store(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(store.topic_view("hub").expect("view")));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_digest,
    bench_upload,
    bench_connect,
    bench_topic_view
);
criterion_main!(benches);

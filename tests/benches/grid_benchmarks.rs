//! # Elastic Grid Benchmarks
//!
//! Hot paths of one relay hop:
//!
//! | Path | Work per hop |
//! |------|--------------|
//! | eg-01 layout + coordinates | once per broadcast / per candidate |
//! | eg-02 coordinate query | once per relay step |
//! | eg-03 decode + author / router recovery | once per received frame |
//! | shared-crypto sign | once per routed destination |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use eg_01_elastic_grid::{define_coordinates, define_layout, Elastic3D};
use eg_02_peer_directory::{PeerDirectory, PeerEntry, PeerList};
use eg_03_messages::Message;
use shared_crypto::{keccak256, NodeKey};
use std::time::Duration;

// ============================================================================
// eg-01: Layout and coordinates
// ============================================================================

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("eg-01-elastic-grid");

    for peers in [50usize, 1_000, 65_536] {
        group.bench_with_input(BenchmarkId::new("define_layout", peers), &peers, |b, &p| {
            b.iter(|| black_box(define_layout(black_box(p), 16)))
        });
    }

    let layout = define_layout(10_000, 16);
    let address = NodeKey::generate().address();
    group.bench_function("define_coordinates", |b| {
        b.iter(|| black_box(define_coordinates(&layout, black_box(&address))))
    });

    group.finish();
}

// ============================================================================
// eg-02: Candidate lookup
// ============================================================================

fn bench_directory(c: &mut Criterion) {
    let mut group = c.benchmark_group("eg-02-peer-directory");

    for size in [100usize, 1_000, 10_000] {
        let peers = PeerList::with_peers((0..size).map(|i| {
            PeerEntry::new(NodeKey::generate().address(), "10.0.0.1", 1_000 + i as u16)
        }));
        let layout = define_layout(size, 16);
        let row = Elastic3D::new(0, 1, 1);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("query_by_coordinate", size), &peers, |b, p| {
            b.iter(|| black_box(p.query_by_coordinate(&row, &layout)))
        });
    }

    group.finish();
}

// ============================================================================
// eg-03: Message handling
// ============================================================================

fn bench_messages(c: &mut Criterion) {
    let mut group = c.benchmark_group("eg-03-messages");
    group.measurement_time(Duration::from_secs(10));

    let author = NodeKey::generate();
    let router = NodeKey::generate();
    let layout = define_layout(1_000, 16);

    group.bench_function("build_signed", |b| {
        b.iter(|| {
            Message::builder()
                .action("ping")
                .body("payload", vec![0u8; 256])
                .build(&author)
                .map(black_box)
        })
    });

    let message = Message::builder()
        .action("ping")
        .body("payload", vec![0u8; 256])
        .build(&author)
        .unwrap();
    let hop = message
        .route_to(2, Elastic3D::new(0, 1, 1), layout, &router)
        .unwrap();
    let frame = hop.encode().unwrap();

    group.throughput(Throughput::Bytes(frame.len() as u64));
    group.bench_function("decode_verify_hop", |b| {
        b.iter(|| {
            let decoded = Message::decode(black_box(&frame)).unwrap();
            black_box(decoded.verify_router() && decoded.verify_self())
        })
    });

    group.finish();
}

// ============================================================================
// shared-crypto: Router attestation
// ============================================================================

fn bench_signing(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared-crypto");

    let key = NodeKey::generate();
    let hash = keccak256(b"elastic grid benchmark body");
    let signature = key.sign(&hash).unwrap();

    group.bench_function("sign", |b| b.iter(|| black_box(key.sign(black_box(&hash)))));
    group.bench_function("recover", |b| {
        b.iter(|| black_box(signature.recover(black_box(&hash))))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_grid,
    bench_directory,
    bench_messages,
    bench_signing
);
criterion_main!(benches);

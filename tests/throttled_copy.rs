// tests/throttled_copy.rs

mod common;
use crate::common::{file_hash, init_tracing};

use std::sync::Arc;
use std::time::Instant;

use mirrorwatch::errors::MirrorError;
use mirrorwatch::fs::RealFileSystem;
use mirrorwatch::transfer::{CHUNK_SIZE, ThrottledCopier};

fn pseudo_random(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

#[test]
fn copies_are_byte_identical_across_sizes() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let copier = ThrottledCopier::new(Arc::new(RealFileSystem), 0);

    for len in [0, 1, CHUNK_SIZE - 1, CHUNK_SIZE, CHUNK_SIZE + 1, 3 * CHUNK_SIZE + 17] {
        let src = dir.path().join(format!("in-{len}"));
        let dst = dir.path().join("out").join(format!("copy-{len}"));
        std::fs::write(&src, pseudo_random(len)).unwrap();

        let copied = copier.copy(&src, &dst).unwrap();

        assert_eq!(copied, len as u64);
        assert_eq!(file_hash(&src), file_hash(&dst), "mismatch for {len} bytes");
    }
}

#[test]
fn throttled_copy_is_identical_and_paced() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let cap = 128 * 1024;
    let copier = ThrottledCopier::new(Arc::new(RealFileSystem), cap);

    // Burst covers the first chunk; the remaining two seconds' worth must wait.
    let len = 3 * cap as usize;
    let src = dir.path().join("big.bin");
    let dst = dir.path().join("big.copy");
    std::fs::write(&src, pseudo_random(len)).unwrap();

    let started = Instant::now();
    copier.copy(&src, &dst).unwrap();
    let elapsed = started.elapsed();

    assert_eq!(file_hash(&src), file_hash(&dst));
    assert!(
        elapsed.as_secs_f64() >= 1.5,
        "copy of {len} bytes at {cap} B/s took only {elapsed:?}"
    );
}

#[test]
fn missing_source_is_a_copy_failure() {
    let dir = tempfile::tempdir().unwrap();
    let copier = ThrottledCopier::new(Arc::new(RealFileSystem), 0);

    let err = copier
        .copy(&dir.path().join("nope"), &dir.path().join("out"))
        .unwrap_err();

    match err {
        MirrorError::CopyFailure { io, .. } => {
            assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected CopyFailure, got {other:?}"),
    }
}

// src/transfer/mod.rs

//! Byte transfer from source to mirror under a bandwidth cap.

pub mod copier;
pub mod limiter;

pub use copier::{ThrottledCopier, CHUNK_SIZE};
pub use limiter::BandwidthLimiter;

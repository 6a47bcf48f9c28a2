// src/transfer/copier.rs

use std::io::{self, ErrorKind, Read, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{MirrorError, Result};
use crate::fs::FileSystem;
use crate::transfer::limiter::BandwidthLimiter;

/// Bytes moved per read/write.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Copies files end to end under a sustained throughput cap.
///
/// One limiter is shared by every copy made through the same copier, so the
/// cap holds across consecutive files, not just within one.
///
/// There is no write-to-temp-then-rename: a failure or a kill mid-copy
/// leaves a truncated destination behind.
#[derive(Debug)]
pub struct ThrottledCopier {
    fs: Arc<dyn FileSystem>,
    limiter: BandwidthLimiter,
    chunk_size: usize,
}

impl ThrottledCopier {
    /// `max_bytes_per_second == 0` copies at full speed.
    pub fn new(fs: Arc<dyn FileSystem>, max_bytes_per_second: u64) -> Self {
        let chunk_size = match max_bytes_per_second {
            0 => CHUNK_SIZE,
            cap => CHUNK_SIZE.min(usize::try_from(cap).unwrap_or(CHUNK_SIZE)),
        };
        Self {
            fs,
            limiter: BandwidthLimiter::new(max_bytes_per_second, chunk_size),
            chunk_size,
        }
    }

    /// Copy `source` over `destination`, creating the destination's parent
    /// directories first. Returns the number of bytes written.
    pub fn copy(&self, source: &Path, destination: &Path) -> Result<u64> {
        let failure = |io: io::Error| MirrorError::CopyFailure {
            source_path: source.to_path_buf(),
            destination: destination.to_path_buf(),
            io,
        };

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() && !self.fs.is_dir(parent) {
                self.fs.create_dir_all(parent).map_err(into_io).map_err(failure)?;
            }
        }

        let mut reader = self.fs.open_read(source).map_err(into_io).map_err(failure)?;
        let mut writer = self.fs.open_write(destination).map_err(into_io).map_err(failure)?;

        let copied = self.pump(&mut reader, &mut writer).map_err(failure)?;
        debug!(?source, ?destination, bytes = copied, "copy finished");
        Ok(copied)
    }

    fn pump(&self, reader: &mut dyn Read, writer: &mut dyn Write) -> io::Result<u64> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut total = 0u64;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.limiter.wait_for_capacity(n);
            writer.write_all(&buf[..n])?;
            total += n as u64;
        }
        writer.flush()?;
        Ok(total)
    }
}

/// Recover the underlying `io::Error` from a filesystem error when there is
/// one, so callers can still match on its kind.
fn into_io(err: anyhow::Error) -> io::Error {
    match err.downcast::<io::Error>() {
        Ok(io) => io,
        Err(other) => io::Error::other(other),
    }
}

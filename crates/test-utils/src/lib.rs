pub mod builders;
pub mod harness;

use std::path::Path;
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install a test-captured tracing subscriber once per test binary.
///
/// Output goes through `with_test_writer()`, so it only shows up for failing
/// tests or with `-- --nocapture`. Level comes from `RUST_LOG`, default
/// `info` (e.g. `RUST_LOG=mirrorwatch=debug cargo test`).
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Fail the test if `fut` has not finished within five seconds.
pub async fn with_timeout<F, T>(fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), fut)
        .await
        .expect("test timed out after 5 seconds")
}

/// blake3 hash of a file's contents, for byte-identity checks.
pub fn file_hash(path: impl AsRef<Path>) -> blake3::Hash {
    let path = path.as_ref();
    let bytes = std::fs::read(path).unwrap_or_else(|e| panic!("reading {path:?}: {e}"));
    blake3::hash(&bytes)
}

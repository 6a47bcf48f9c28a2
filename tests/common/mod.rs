#![allow(dead_code, unused_imports)]

pub use mirrorwatch_test_utils::{builders, file_hash, harness, init_tracing, with_timeout};

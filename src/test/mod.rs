//! Shared helpers for unit tests.

pub mod fixtures;

use std::{
    fs,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Creates an empty, unique directory under the system temp directory.
pub fn scratch_dir(name: &str) -> PathBuf {
    let unique = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "tlbscope-{name}-{}-{unique}",
        std::process::id()
    ));

    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

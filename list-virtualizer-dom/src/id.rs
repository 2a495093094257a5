use alloc::format;
use alloc::string::String;
use core::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a process-unique id such as `vl-3`.
pub fn generate_id(prefix: &str) -> String {
    let n = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{n}")
}

/// Derives a scoped id from a parent id: `scoped_id("vl-3", "list") == "vl-3-list"`.
pub fn scoped_id(parent: &str, suffix: &str) -> String {
    format!("{parent}-{suffix}")
}

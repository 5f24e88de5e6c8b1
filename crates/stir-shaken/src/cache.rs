//! Filesystem-backed URL content cache, grounded on
//! `examples/original_source/secsipid/secsipid.go`'s
//! `SJWTGetURLCacheFilePath`/`SJWTGetURLCachedContent`/`SJWTSetURLCachedContent`.
//!
//! Best-effort by design: write failures are silently ignored (spec.md §7
//! propagation policy, exception (a)), and read failures fall through to a
//! network fetch rather than propagating an error.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::clock::Clock;

/// Derives the on-disk cache path for a URL: `://` and `/` both become `_`,
/// prefixed with the configured cache directory.
pub fn cache_path(dir: &str, url: &str) -> PathBuf {
	let file_name = url.replace("://", "_").replace('/', "_");
	if dir.is_empty() {
		PathBuf::from(file_name)
	} else {
		Path::new(dir).join(file_name)
	}
}

/// Returns cached bytes for `url` if a cache directory is configured, a file
/// exists, and it is within `ttl_secs` of the clock's current time. A stale
/// file is removed and `None` is returned, matching the original's "miss"
/// behavior of deleting rather than serving expired data.
pub fn get(dir: &str, url: &str, ttl_secs: i64, clock: &dyn Clock) -> Option<Vec<u8>> {
	if dir.is_empty() {
		return None;
	}
	let path = cache_path(dir, url);
	let metadata = std::fs::metadata(&path).ok()?;
	let modified = metadata.modified().ok()?;
	let now = clock.now();
	let age_secs = now
		.duration_since(modified)
		.map(|d| d.as_secs() as i64)
		.unwrap_or(0);
	if age_secs > ttl_secs {
		let _ = std::fs::remove_file(&path);
		return None;
	}
	std::fs::read(&path).ok()
}

/// Writes `data` to the cache file for `url`, ignoring any error (disk full,
/// permissions, missing directory).
pub fn set(dir: &str, url: &str, data: &[u8]) {
	if dir.is_empty() {
		return;
	}
	let path = cache_path(dir, url);
	match std::fs::write(&path, data) {
		Ok(()) => set_mode_0640(&path),
		Err(e) => tracing::debug!(url, error = %e, "x5u cache write failed, continuing uncached"),
	}
}

#[cfg(unix)]
fn set_mode_0640(path: &Path) {
	use std::os::unix::fs::PermissionsExt;
	if let Ok(metadata) = std::fs::metadata(path) {
		let mut perms = metadata.permissions();
		perms.set_mode(0o640);
		let _ = std::fs::set_permissions(path, perms);
	}
}

#[cfg(not(unix))]
fn set_mode_0640(_path: &Path) {}

//! Utility functions for run estimates, log formatting, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Worst-case duration estimates shown before a run starts
//! - String truncation for logging response bodies
//! - File system validation for the data directory

use crate::config::PacingConfig;
use crate::error::Result;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Article blocks on a full listing page.
pub const ARTICLES_PER_LISTING: u32 = 36;

/// Which phases a run will execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phases {
    pub listing: bool,
    pub enrichment: bool,
}

/// Worst-case duration of a run over `pages` listing pages.
///
/// Every listing page costs one maximal listing pause; every article of a
/// full page costs one maximal article pause. Request time is not included.
///
/// # Arguments
///
/// * `pages` - Number of listing pages in the range
/// * `phases` - Phases the run will execute
/// * `pacing` - Configured delay bounds
///
/// # Returns
///
/// The estimated duration, rounded down to whole seconds.
pub fn estimate_duration(pages: u32, phases: Phases, pacing: &PacingConfig) -> Duration {
    let mut secs = 0.0;
    if phases.listing {
        secs += f64::from(pages) * pacing.listing.max().as_secs_f64();
    }
    if phases.enrichment {
        secs += f64::from(pages * ARTICLES_PER_LISTING) * pacing.article.max().as_secs_f64();
    }
    Duration::from_secs(secs as u64)
}

/// Render a duration as `1h 02m 05s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary)
/// with an ellipsis and byte count indicator appended.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of bytes to keep
///
/// # Returns
///
/// The original string if it fits, otherwise a truncated version with
/// `"…(+N bytes)"` appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a small check file.
///
/// # Arguments
///
/// * `path` - The directory path to validate
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).await?;
    let check_path = path.join("..__write_check__");
    fs::write(&check_path, b"").await?;
    if let Err(e) = fs::remove_file(&check_path).await {
        warn!(error = %e, file = %check_path.display(), "Could not remove the write check file");
    }
    info!("Data directory is writable");
    Ok(())
}

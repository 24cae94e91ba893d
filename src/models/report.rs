use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::models::Snapshot;

/// A rendered snapshot persisted on disk. Never rewritten once created.
#[derive(Debug, Clone)]
pub struct Report {
    pub path: PathBuf,
    pub generated_at: DateTime<Local>,
    pub snapshot: Snapshot,
}

impl Report {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ctime-style label used in the report banner and the mail subject
    pub fn label(&self) -> String {
        ctime(&self.generated_at)
    }
}

/// Formats like C `ctime`: `Mon Oct 19 18:49:02 2026`
pub fn ctime(at: &DateTime<Local>) -> String {
    at.format("%a %b %e %H:%M:%S %Y").to_string()
}

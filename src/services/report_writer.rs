use chrono::Local;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::models::report::ctime;
use crate::models::{ProcessRecord, Report, Snapshot};

pub const BANNER_WIDTH: usize = 80;

const PID_COL: usize = 8;
const NAME_COL: usize = 25;
const USER_COL: usize = 20;
const PERCENT_COL: usize = 12;
const VMS_COL: usize = 12;

/// Widest name/owner that still leaves one space before the next column.
pub const NAME_MAX: usize = NAME_COL - 1;
pub const OWNER_MAX: usize = USER_COL - 1;

const FILE_PREFIX: &str = "ProcessLog_";
const FILE_EXT: &str = "log";
const MAX_SUFFIX: u32 = 1000;

/// Renders snapshots into fixed-layout text reports inside one directory.
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, snapshot: Snapshot) -> io::Result<Report> {
        fs::create_dir_all(&self.dir)?;

        let generated_at = Local::now();
        let stem = format!("{}{}", FILE_PREFIX, generated_at.format("%Y-%m-%d_%H-%M-%S"));
        let body = render(&snapshot, &ctime(&generated_at));

        let (path, mut file) = create_unique(&self.dir, &stem)?;
        file.write_all(body.as_bytes())?;
        file.sync_all()?;

        Ok(Report {
            path,
            generated_at,
            snapshot,
        })
    }
}

/// Creates `<stem>.log`, or `<stem>_N.log` when earlier reports from the same second exist.
fn create_unique(dir: &Path, stem: &str) -> io::Result<(PathBuf, fs::File)> {
    for n in 0..MAX_SUFFIX {
        let name = if n == 0 {
            format!("{}.{}", stem, FILE_EXT)
        } else {
            format!("{}_{}.{}", stem, n, FILE_EXT)
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free report name for {} in {}", stem, dir.display()),
    ))
}

pub fn render(snapshot: &Snapshot, generated_label: &str) -> String {
    let mut out = String::new();
    let banner = "=".repeat(BANNER_WIDTH);

    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out, "SYSTEM PROCESS REPORT - {}", generated_label);
    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "{:<PID_COL$}{:<NAME_COL$}{:<USER_COL$}{:<PERCENT_COL$}{:<VMS_COL$}",
        "PID", "Name", "User", "Memory %", "VMS (MB)"
    );
    let _ = writeln!(out, "{}", "-".repeat(BANNER_WIDTH));

    for record in &snapshot.records {
        out.push_str(&render_row(record));
        out.push('\n');
    }

    out
}

fn render_row(record: &ProcessRecord) -> String {
    format!(
        "{:<PID_COL$}{}{}{:<PERCENT_COL$.2}{:<VMS_COL$.2}",
        record.pid,
        pad(&truncate(&record.name, NAME_MAX), NAME_COL),
        pad(&truncate(&record.owner, OWNER_MAX), USER_COL),
        record.memory_percent,
        record.virtual_memory_mb,
    )
}

/// Cuts `s` to at most `max_width` display columns. Control characters become `?`.
pub fn truncate(s: &str, max_width: usize) -> String {
    let s: String = s
        .chars()
        .map(|ch| if ch.is_control() { '?' } else { ch })
        .collect();
    if s.width() <= max_width {
        return s;
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result
}

/// Left-aligns by display width; `format!` padding counts chars, not columns.
fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{}{}", s, " ".repeat(fill))
}

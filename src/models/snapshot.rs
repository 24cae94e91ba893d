use chrono::{DateTime, Local};
use clap::ValueEnum;
use std::cmp::Ordering;

use crate::models::ProcessRecord;

/// Row ordering applied to a captured snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortMode {
    /// Highest memory percentage first, ties broken by ascending PID
    #[default]
    Memory,
    /// Enumeration order (ascending PID)
    Natural,
}

/// Point-in-time capture of the process table.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub captured_at: DateTime<Local>,
    pub records: Vec<ProcessRecord>,
}

impl Snapshot {
    pub fn new(captured_at: DateTime<Local>, mut records: Vec<ProcessRecord>, sort: SortMode) -> Self {
        match sort {
            SortMode::Memory => records.sort_by(by_memory_desc),
            SortMode::Natural => records.sort_by_key(|r| r.pid),
        }
        Self { captured_at, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn by_memory_desc(a: &ProcessRecord, b: &ProcessRecord) -> Ordering {
    b.memory_percent
        .total_cmp(&a.memory_percent)
        .then_with(|| a.pid.cmp(&b.pid))
}

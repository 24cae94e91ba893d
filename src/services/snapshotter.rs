use chrono::Local;
use std::sync::Mutex;
use sysinfo::{
    Pid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System, UpdateKind, Users,
};

use crate::models::{ProcessRecord, RecordUnavailable, Snapshot, SortMode};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Source of per-process metadata for one enumeration pass.
pub trait ProcessTable: Send + Sync {
    /// One entry per live process, or the reason its metadata was unavailable
    fn entries(&self) -> Vec<Result<ProcessRecord, RecordUnavailable>>;
}

/// Host process table backed by sysinfo.
pub struct SysinfoTable {
    system: Mutex<System>,
    users: Mutex<Users>,
}

impl SysinfoTable {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            users: Mutex::new(Users::new_with_refreshed_list()),
        }
    }
}

impl Default for SysinfoTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SysinfoTable {
    fn entries(&self) -> Vec<Result<ProcessRecord, RecordUnavailable>> {
        let Ok(mut sys) = self.system.lock() else {
            log::error!("Process table lock poisoned, returning empty enumeration");
            return Vec::new();
        };
        let Ok(mut users) = self.users.lock() else {
            log::error!("User table lock poisoned, returning empty enumeration");
            return Vec::new();
        };

        sys.refresh_memory();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_memory()
                .with_user(UpdateKind::OnlyIfNotSet),
        );
        users.refresh();

        let total_memory = sys.total_memory();

        let mut pids: Vec<&Pid> = sys.processes().keys().collect();
        pids.sort();

        pids.into_iter()
            .filter_map(|pid| sys.process(*pid).map(|p| (pid.as_u32(), p)))
            // Linux lists threads as tasks of their parent process
            .filter(|(_, process)| process.thread_kind().is_none())
            .map(|(pid, process)| to_record(pid, process, &users, total_memory))
            .collect()
    }
}

fn to_record(
    pid: u32,
    process: &Process,
    users: &Users,
    total_memory: u64,
) -> Result<ProcessRecord, RecordUnavailable> {
    match process.status() {
        ProcessStatus::Zombie => return Err(RecordUnavailable::Zombie(pid)),
        ProcessStatus::Dead => return Err(RecordUnavailable::Vanished(pid)),
        _ => {}
    }

    let uid = process.user_id().ok_or(RecordUnavailable::AccessDenied(pid))?;
    let owner = match users.get_user_by_id(uid) {
        Some(user) => user.name().to_string(),
        None => uid_label(uid),
    };

    let memory_percent = if total_memory > 0 {
        (process.memory() as f32 / total_memory as f32) * 100.0
    } else {
        0.0
    };

    Ok(ProcessRecord {
        pid,
        name: process.name().to_string_lossy().into_owned(),
        owner,
        memory_percent,
        virtual_memory_mb: process.virtual_memory() as f64 / BYTES_PER_MB,
    })
}

#[cfg(unix)]
fn uid_label(uid: &sysinfo::Uid) -> String {
    (**uid).to_string()
}

#[cfg(not(unix))]
fn uid_label(_uid: &sysinfo::Uid) -> String {
    "unknown".to_string()
}

/// Captures sorted snapshots from a [`ProcessTable`].
pub struct Snapshotter {
    table: Box<dyn ProcessTable>,
    sort: SortMode,
}

impl Snapshotter {
    pub fn new(table: Box<dyn ProcessTable>, sort: SortMode) -> Self {
        Self { table, sort }
    }

    pub fn capture(&self) -> Snapshot {
        let captured_at = Local::now();
        let mut dropped = 0usize;

        let records: Vec<ProcessRecord> = self
            .table
            .entries()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(record) => Some(record),
                Err(reason) => {
                    log::debug!("Skipping PID {}: {}", reason.pid(), reason);
                    dropped += 1;
                    None
                }
            })
            .collect();

        log::debug!("Captured {} processes ({} unavailable)", records.len(), dropped);

        Snapshot::new(captured_at, records, self.sort)
    }
}

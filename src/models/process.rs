use thiserror::Error;

/// One live process as captured at snapshot time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    /// Process ID
    pub pid: u32,
    /// Executable name, untruncated
    pub name: String,
    /// Owning user name (numeric uid when the name cannot be resolved)
    pub owner: String,
    /// Resident memory as a percentage of total system memory (0-100)
    pub memory_percent: f32,
    /// Virtual memory size in MiB
    pub virtual_memory_mb: f64,
}

/// Why a process could not be turned into a [`ProcessRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecordUnavailable {
    #[error("process {0} exited during enumeration")]
    Vanished(u32),

    #[error("access to process {0} denied")]
    AccessDenied(u32),

    #[error("process {0} is a zombie")]
    Zombie(u32),
}

impl RecordUnavailable {
    pub fn pid(&self) -> u32 {
        match *self {
            Self::Vanished(pid) | Self::AccessDenied(pid) | Self::Zombie(pid) => pid,
        }
    }
}

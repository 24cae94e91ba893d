pub mod outcome;
pub mod process;
pub mod report;
pub mod snapshot;

pub use outcome::{CycleOutcome, DeliveryOutcome};
pub use process::{ProcessRecord, RecordUnavailable};
pub use report::Report;
pub use snapshot::{Snapshot, SortMode};

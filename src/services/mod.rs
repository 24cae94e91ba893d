pub mod connectivity;
pub mod dispatcher;
pub mod report_writer;
pub mod snapshotter;

pub use connectivity::{ConnectivityProbe, HttpProbe};
pub use dispatcher::{Dispatcher, SmtpRelay};
pub use report_writer::ReportWriter;
pub use snapshotter::{Snapshotter, SysinfoTable};

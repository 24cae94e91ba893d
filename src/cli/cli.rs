use clap::Parser;
use std::path::PathBuf;

use crate::models::SortMode;

/// proc-mailer - mails a snapshot of the host's process table on a fixed interval
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Minutes between reports (must be > 0)
    #[arg(allow_negative_numbers = true)]
    pub interval: i64,

    /// Directory the reports are written to
    #[arg(short = 'd', long, env = "REPORT_DIR", default_value = "LogFile")]
    pub report_dir: PathBuf,

    /// Row ordering of each report
    #[arg(short, long, env = "SORT_MODE", value_enum, default_value_t = SortMode::Memory)]
    pub sort: SortMode,

    /// Wait for the first tick instead of reporting at startup
    #[arg(long)]
    pub no_immediate: bool,

    /// URL probed before each delivery attempt
    #[arg(long, env = "PROBE_URL", default_value = "http://www.youtube.com")]
    pub probe_url: String,

    /// SMTP relay host (STARTTLS)
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    /// SMTP relay port
    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,
}

use lettre::message::Mailbox;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::cli::CommandArgs;
use crate::models::SortMode;

pub const SENDER_VAR: &str = "SENDER_EMAIL";
pub const RECIPIENT_VAR: &str = "RECEIVER_EMAIL";
pub const PASSWORD_VAR: &str = "EMAIL_APP_PASSWORD";

/// Longest accepted interval (one leap year); keeps tick deadlines representable.
pub const MAX_INTERVAL_MINUTES: i64 = 366 * 24 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("interval must be > 0 minutes, got {0}")]
    InvalidInterval(i64),

    #[error("interval must be at most {max} minutes, got {0}", max = MAX_INTERVAL_MINUTES)]
    IntervalTooLarge(i64),

    #[error("missing environment variable {0}, check your .env file")]
    MissingVar(&'static str),

    #[error("{var} is not a valid mailbox: {reason}")]
    InvalidMailbox { var: &'static str, reason: String },
}

impl ConfigError {
    /// Errors caused by the command line rather than the environment
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::InvalidInterval(_) | Self::IntervalTooLarge(_))
    }
}

/// Relay endpoint and identities used for every delivery.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub sender: Mailbox,
    pub recipient: Mailbox,
    pub password: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

/// Immutable process-wide configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub interval: Duration,
    pub immediate_run: bool,
    pub sort: SortMode,
    pub report_dir: PathBuf,
    pub probe_url: String,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_args(args: &CommandArgs) -> Result<Self, ConfigError> {
        Self::from_args_with(args, |key| std::env::var(key).ok())
    }

    /// Builds the config reading secrets through `lookup` instead of the process environment.
    pub fn from_args_with<F>(args: &CommandArgs, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval = interval_from_minutes(args.interval)?;

        let sender = mailbox(SENDER_VAR, require(&lookup, SENDER_VAR)?)?;
        let recipient = mailbox(RECIPIENT_VAR, require(&lookup, RECIPIENT_VAR)?)?;
        let password = require(&lookup, PASSWORD_VAR)?;

        Ok(Self {
            interval,
            immediate_run: !args.no_immediate,
            sort: args.sort,
            report_dir: args.report_dir.clone(),
            probe_url: args.probe_url.clone(),
            mail: MailConfig {
                sender,
                recipient,
                password,
                smtp_host: args.smtp_host.clone(),
                smtp_port: args.smtp_port,
            },
        })
    }
}

pub fn interval_from_minutes(minutes: i64) -> Result<Duration, ConfigError> {
    if minutes <= 0 {
        return Err(ConfigError::InvalidInterval(minutes));
    }
    if minutes > MAX_INTERVAL_MINUTES {
        return Err(ConfigError::IntervalTooLarge(minutes));
    }
    u64::try_from(minutes)
        .ok()
        .and_then(|m| m.checked_mul(60))
        .map(Duration::from_secs)
        .ok_or(ConfigError::IntervalTooLarge(minutes))
}

fn require<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(var))
}

fn mailbox(var: &'static str, value: String) -> Result<Mailbox, ConfigError> {
    value.parse().map_err(|e: lettre::address::AddressError| ConfigError::InvalidMailbox {
        var,
        reason: e.to_string(),
    })
}

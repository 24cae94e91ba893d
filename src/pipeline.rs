use anyhow::Context;

use crate::config::AppConfig;
use crate::models::{CycleOutcome, DeliveryOutcome};
use crate::services::connectivity::DEFAULT_PROBE_TIMEOUT;
use crate::services::{
    ConnectivityProbe, Dispatcher, HttpProbe, ReportWriter, SmtpRelay, Snapshotter, SysinfoTable,
};

/// One sampling -> formatting -> connectivity -> delivery pass.
pub struct Pipeline {
    snapshotter: Snapshotter,
    writer: ReportWriter,
    probe: Box<dyn ConnectivityProbe>,
    dispatcher: Dispatcher,
}

impl Pipeline {
    pub fn new(
        snapshotter: Snapshotter,
        writer: ReportWriter,
        probe: Box<dyn ConnectivityProbe>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            snapshotter,
            writer,
            probe,
            dispatcher,
        }
    }

    /// Wires the host-backed stages from startup configuration.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let relay = SmtpRelay::new(&config.mail)?;

        Ok(Self::new(
            Snapshotter::new(Box::new(SysinfoTable::new()), config.sort),
            ReportWriter::new(config.report_dir.clone()),
            Box::new(HttpProbe::new(config.probe_url.clone(), DEFAULT_PROBE_TIMEOUT)),
            Dispatcher::new(config.mail.clone(), Box::new(relay)),
        ))
    }

    /// Runs a full cycle. Errors mean the report could not be produced.
    pub fn run_cycle(&self) -> anyhow::Result<CycleOutcome> {
        let snapshot = self.snapshotter.capture();
        if snapshot.is_empty() {
            log::warn!("No processes visible at {}, writing an empty report", snapshot.captured_at);
        }

        let report = self
            .writer
            .write(snapshot)
            .with_context(|| format!("Failed to write report into {}", self.writer.dir().display()))?;
        log::info!(
            "📝 Log generated: {} ({} processes)",
            report.path().display(),
            report.snapshot.len()
        );

        if !self.probe.is_reachable() {
            log::warn!("⏭️  Skipped email - no internet connection");
            return Ok(CycleOutcome::Completed(DeliveryOutcome::SkippedOffline));
        }

        let outcome = self.dispatcher.deliver(report.path(), &report.label());
        Ok(CycleOutcome::Completed(outcome))
    }
}

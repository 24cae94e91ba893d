use std::fmt;

/// Result of the delivery stage of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    SkippedOffline,
    AuthFailure,
    TransportFailure,
    UnexpectedFailure,
}

impl DeliveryOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::AuthFailure | Self::TransportFailure | Self::UnexpectedFailure
        )
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Delivered => "delivered",
            Self::SkippedOffline => "skipped (offline)",
            Self::AuthFailure => "authentication failure",
            Self::TransportFailure => "transport failure",
            Self::UnexpectedFailure => "unexpected failure",
        };
        f.write_str(s)
    }
}

/// Terminal state of one scheduled cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Report written; delivery stage finished with the given outcome
    Completed(DeliveryOutcome),
    /// Sampling, formatting or the cycle itself faulted
    Failed(String),
}

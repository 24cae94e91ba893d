use std::time::Duration;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Decides whether a delivery attempt is worth making right now.
pub trait ConnectivityProbe: Send + Sync {
    fn is_reachable(&self) -> bool;
}

/// Plain HTTP GET against a well-known host with a short timeout.
pub struct HttpProbe {
    agent: ureq::Agent,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        // Any 3xx already proves reachability; following it would add DNS + TLS
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .redirects(0)
            .build();
        Self {
            agent,
            url: url.into(),
        }
    }
}

impl ConnectivityProbe for HttpProbe {
    fn is_reachable(&self) -> bool {
        match self.agent.get(&self.url).call() {
            Ok(_) => true,
            // The host answered, so the network is up
            Err(ureq::Error::Status(code, _)) => {
                log::debug!("Probe {} answered with HTTP {}", self.url, code);
                true
            }
            Err(ureq::Error::Transport(e)) => {
                log::debug!("Probe {} failed: {}", self.url, e);
                false
            }
        }
    }
}

//! Restart notification to the trading-engine API.
//!
//! The engine keeps a live bridge connection to the terminal; after a
//! restart it must reinitialize that connection, so the orchestrator POSTs a
//! small JSON notification. Best-effort by policy — the caller downgrades
//! failures to warnings.

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;

use crate::application::ports::RestartNotifier;

/// Production `RestartNotifier` POSTing to the trading-engine API.
pub struct HttpNotifier {
    base_url: String,
    timeout: Duration,
}

impl HttpNotifier {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(10),
        }
    }

    /// Notifier for the engine API on the given host.
    #[must_use]
    pub fn for_host(host: &str, api_port: u16) -> Self {
        Self::new(format!("http://{host}:{api_port}"))
    }
}

impl RestartNotifier for HttpNotifier {
    fn notify_restart(&self, service: &str) -> Result<()> {
        let url = format!("{}/api/mt5-restart-notification", self.base_url);
        let body = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "message": format!("{service} container restarted"),
        });

        match ureq::post(&url)
            .timeout(self.timeout)
            .set("Content-Type", "application/json")
            .send_string(&body.to_string())
        {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, _)) => {
                anyhow::bail!("trading engine rejected the notification: HTTP {code}")
            }
            Err(e) => anyhow::bail!("trading engine unreachable: {e}"),
        }
    }
}

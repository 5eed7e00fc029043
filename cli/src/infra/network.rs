//! Network infrastructure — implements `NetworkProbe` using `spawn_blocking`.

use anyhow::Result;

use crate::application::ports::NetworkProbe;

/// Production implementation that performs real TCP connect checks.
pub struct TokioNetworkProbe;

impl NetworkProbe for TokioNetworkProbe {
    async fn check_tcp(&self, host: &str, port: u16) -> Result<bool> {
        let addr = format!("{host}:{port}");
        let result = tokio::task::spawn_blocking(move || {
            use std::net::ToSocketAddrs;
            use std::time::Duration;

            // Resolution failure means the service is not reachable — a
            // failed probe attempt, not a run-level error.
            let Ok(mut addrs) = addr.to_socket_addrs() else {
                return false;
            };
            addrs.any(|addr| {
                std::net::TcpStream::connect_timeout(&addr, Duration::from_secs(3)).is_ok()
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking panicked: {e}"))?;
        Ok(result)
    }
}

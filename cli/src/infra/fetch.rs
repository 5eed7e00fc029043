//! HTTP asset fetching via `ureq`.

use std::io::Read;
use std::time::Duration;

use crate::application::ports::AssetFetcher;
use crate::domain::error::FetchError;

/// Hard cap on fetched asset size — manifests and image configs are tiny,
/// so anything larger is a misdirected URL.
const MAX_ASSET_BYTES: u64 = 4 * 1024 * 1024;

/// Production `AssetFetcher` backed by `ureq`.
pub struct UreqFetcher {
    timeout: Duration,
}

impl UreqFetcher {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for UreqFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl AssetFetcher for UreqFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = match ureq::get(url).timeout(self.timeout).call() {
            Ok(r) => r,
            Err(ureq::Error::Status(code, _)) => {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: code,
                });
            }
            Err(e) => {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let mut body = Vec::new();
        response
            .into_reader()
            .take(MAX_ASSET_BYTES)
            .read_to_end(&mut body)
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(body)
    }
}

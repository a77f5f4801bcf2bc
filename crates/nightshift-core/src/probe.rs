//! Connectivity probe.
//!
//! The bedtime check short-circuits when the device is offline -- there
//! is no benefit to alerting a disconnected user. The probe is a
//! connectivity oracle, not an API contract: any HTTP response at all
//! (including non-2xx) proves reachability, and every failure mode maps
//! to "unreachable" rather than an error.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use url::Url;

use crate::error::{CoreError, ValidationError};
use crate::storage::Config;

/// Default probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// HEAD-request probe against a fixed external URL.
pub struct HttpProbe {
    client: reqwest::Client,
    url: Url,
}

impl HttpProbe {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, CoreError> {
        let url = Url::parse(url).map_err(|e| {
            CoreError::Validation(ValidationError::InvalidValue {
                field: "probe.url".into(),
                message: e.to_string(),
            })
        })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Custom(format!("failed to build probe client: {e}")))?;
        Ok(Self { client, url })
    }

    pub fn from_config(config: &Config) -> Result<Self, CoreError> {
        Self::new(
            &config.probe.url,
            Duration::from_secs(config.probe.timeout_secs),
        )
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn is_reachable(&self) -> bool {
        match self.client.head(self.url.clone()).send().await {
            Ok(response) => {
                debug!("probe: {} -> {}", self.url, response.status());
                true
            }
            Err(e) => {
                debug!("probe: {} unreachable: {e}", self.url);
                false
            }
        }
    }
}

/// Probe with a fixed answer, for tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub bool);

#[async_trait]
impl ConnectivityProbe for StaticProbe {
    async fn is_reachable(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_url() {
        assert!(HttpProbe::new("not a url", DEFAULT_PROBE_TIMEOUT).is_err());
    }

    #[tokio::test]
    async fn head_response_counts_as_reachable() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("HEAD", "/generate_204")
            .with_status(204)
            .create_async()
            .await;

        let probe = HttpProbe::new(
            &format!("{}/generate_204", server.url()),
            DEFAULT_PROBE_TIMEOUT,
        )
        .unwrap();
        assert!(probe.is_reachable().await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_still_counts_as_reachable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/generate_204")
            .with_status(500)
            .create_async()
            .await;

        let probe = HttpProbe::new(
            &format!("{}/generate_204", server.url()),
            DEFAULT_PROBE_TIMEOUT,
        )
        .unwrap();
        assert!(probe.is_reachable().await);
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        // Nothing listens on this port.
        let probe = HttpProbe::new("http://127.0.0.1:1/", Duration::from_millis(200)).unwrap();
        assert!(!probe.is_reachable().await);
    }
}

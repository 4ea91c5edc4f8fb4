//! Client configuration.

use std::time::Duration;

use nexus_core::HostUrl;

use crate::credentials::Credentials;

/// Applied to connecting and to each read when no timeout is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for a [`NexusRepository`](crate::NexusRepository).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: HostUrl,
    pub credentials: Option<Credentials>,
    /// Per-request timeout. Searches are bounded end to end; transfers are
    /// bounded per read so large files are not cut off.
    pub timeout: Duration,
    /// Verify the server's TLS certificate.
    pub verify_tls: bool,
}

impl ClientConfig {
    pub fn new(host: HostUrl) -> Self {
        Self {
            host,
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
            verify_tls: true,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }
}

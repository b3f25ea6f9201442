//! HyperCore Client
//!
//! Combines the endpoint configuration and the HTTP layer. Operations live in
//! the sibling modules as free functions taking a client and a [`Session`].

use super::error::Result;
use super::http::HyperCoreHttp;
use super::session::{self, Credentials, Session};
use std::time::Duration;
use url::Url;

/// Default interval between task status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Shortest accepted interval between task status polls
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Explicit per-client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Cluster node address: a bare host/IP, or a full base URL
    pub endpoint: String,
    /// Skip TLS certificate validation (lab use only)
    pub insecure: bool,
    /// Interval between task status polls
    pub poll_interval: Duration,
}

impl ClientConfig {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            insecure: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Set the poll interval, raised to [`MIN_POLL_INTERVAL`] if shorter
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Cluster base URL; bare hosts are reached over HTTPS
    pub fn base_url(&self) -> Result<Url> {
        let endpoint = self.endpoint.trim();
        let mut raw = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("https://{}", endpoint)
        };
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }
}

/// Main HyperCore client
#[derive(Clone)]
pub struct HyperCoreClient {
    pub config: ClientConfig,
    pub http: HyperCoreHttp,
}

impl HyperCoreClient {
    /// Create a new client for the configured endpoint
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = HyperCoreHttp::new(&config.base_url()?, config.insecure)?;
        Ok(Self { config, http })
    }

    /// Open a session
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        session::login(&self.http, credentials).await
    }

    /// Close a session; `false` when the cluster did not accept the logout
    pub async fn logout(&self, session: &Session) -> Result<bool> {
        session::logout(&self.http, session).await
    }
}

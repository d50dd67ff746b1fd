//! Clients for the cluster API and the per-node stats API
//!
//! The assembler only sees the [`ClusterClient`] and [`NodeStatsClient`]
//! traits; a [`SourceFactory`] builds them per request from the endpoint
//! named in the resolved connection parameters.

mod cadvisor;
mod cluster;
mod http;

pub(crate) use async_trait::async_trait;
pub use cadvisor::CadvisorClient;
pub use cluster::{container_state, node_ready, node_snapshot, pod_snapshot, KubeApiClient};

use crate::error::SourceError;
use crate::models::{ContainerInfo, MachineInfo, NodeSnapshot, PodSnapshot, StatsSample};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Host and port of an upstream API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: String,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Base URL for requests against this endpoint
    pub fn base_url(&self) -> Result<Url, SourceError> {
        let port: u16 = self
            .port
            .parse()
            .map_err(|_| SourceError::InvalidEndpoint {
                endpoint: self.to_string(),
                reason: format!("invalid port '{}'", self.port),
            })?;

        let raw = format!("http://{}:{}/", self.host, port);
        let url = Url::parse(&raw).map_err(|e| SourceError::InvalidEndpoint {
            endpoint: self.to_string(),
            reason: e.to_string(),
        })?;

        // A host containing a path or userinfo would silently change the request target
        if url.path() != "/" || !url.username().is_empty() {
            return Err(SourceError::InvalidEndpoint {
                endpoint: self.to_string(),
                reason: "host must not contain a path".to_string(),
            });
        }

        Ok(url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Read access to the cluster API
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>, SourceError>;

    async fn get_node(&self, name: &str) -> Result<NodeSnapshot, SourceError>;

    /// All pods across namespaces
    async fn list_pods(&self) -> Result<Vec<PodSnapshot>, SourceError>;

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodSnapshot, SourceError>;
}

/// Read access to one node's stats API
#[async_trait]
pub trait NodeStatsClient: Send + Sync {
    async fn machine_info(&self) -> Result<MachineInfo, SourceError>;

    /// Recent machine-wide samples, oldest first
    async fn machine_stats(&self) -> Result<Vec<StatsSample>, SourceError>;

    /// Inspect one container, asking for at most `num_stats` samples
    async fn container_info(&self, id: &str, num_stats: u32)
        -> Result<ContainerInfo, SourceError>;
}

/// Builds upstream clients for an endpoint
pub trait SourceFactory: Send + Sync {
    fn cluster(&self, endpoint: &Endpoint) -> Result<Box<dyn ClusterClient>, SourceError>;

    fn node_stats(&self, endpoint: &Endpoint) -> Result<Box<dyn NodeStatsClient>, SourceError>;
}

/// Outbound HTTP settings
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub request_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 16,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

/// HTTP-backed [`SourceFactory`]
///
/// Stats clients share one reqwest connection pool; cluster clients are
/// built per API server.
#[derive(Debug, Clone)]
pub struct HttpSources {
    http: reqwest::Client,
    cluster_timeout: Duration,
}

impl HttpSources {
    pub fn new(settings: &HttpSettings) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .pool_max_idle_per_host(settings.pool_max_idle_per_host)
            .pool_idle_timeout(settings.pool_idle_timeout)
            .build()?;

        Ok(Self {
            http,
            cluster_timeout: settings.request_timeout,
        })
    }
}

impl SourceFactory for HttpSources {
    fn cluster(&self, endpoint: &Endpoint) -> Result<Box<dyn ClusterClient>, SourceError> {
        Ok(Box::new(KubeApiClient::connect(
            &endpoint.base_url()?,
            self.cluster_timeout,
        )?))
    }

    fn node_stats(&self, endpoint: &Endpoint) -> Result<Box<dyn NodeStatsClient>, SourceError> {
        Ok(Box::new(CadvisorClient::new(
            self.http.clone(),
            endpoint.base_url()?,
        )))
    }
}

//! Per-request metric assembly
//!
//! A collection call resolves the target, queries the upstream APIs and
//! turns the answers into [`MetricTuple`]s. Tuples are only released
//! once every required call has succeeded; any failure replaces the
//! whole result with a single monitor-status gauge set to 0.

mod cluster;
mod container;
mod node;


pub use cluster::cluster_summary;
pub use container::{
    base_labels, container_metrics, memory_limit_value, merge_container, MAX_MEMORY_SIZE,
};
pub use node::node_metrics;

use crate::error::{ExporterError, UpstreamCall};
use crate::metrics::descriptors::{
    CLUSTER_MONITOR_STATUS, CONTAINER_MONITOR_STATUS, NODE_MONITOR_STATUS,
};
use crate::metrics::{LabelSet, MetricDesc, MetricTuple};
use crate::models::{params, ConnectionParams};
use crate::resolver::ConfigResolver;
use crate::sources::{ClusterClient, Endpoint, NodeStatsClient, SourceFactory};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// The three scrape shapes served by the exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Cluster,
    Node,
    Container,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::Cluster,
        CollectionKind::Node,
        CollectionKind::Container,
    ];

    /// Map a request path to its collection kind
    pub fn from_path(path: &str) -> Result<Self, ExporterError> {
        match path {
            "/k8s" => Ok(CollectionKind::Cluster),
            "/k8sn" => Ok(CollectionKind::Node),
            "/k8sc" => Ok(CollectionKind::Container),
            other => Err(ExporterError::MalformedInput(format!(
                "unknown collection path '{other}'"
            ))),
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            CollectionKind::Cluster => "/k8s",
            CollectionKind::Node => "/k8sn",
            CollectionKind::Container => "/k8sc",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Cluster => "cluster",
            CollectionKind::Node => "node",
            CollectionKind::Container => "container",
        }
    }

    /// The monitor-status gauge that closes every scrape of this kind
    pub fn health_desc(self) -> &'static MetricDesc {
        match self {
            CollectionKind::Cluster => &CLUSTER_MONITOR_STATUS,
            CollectionKind::Node => &NODE_MONITOR_STATUS,
            CollectionKind::Container => &CONTAINER_MONITOR_STATUS,
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one collection call
#[derive(Debug)]
pub struct Scrape {
    pub kind: CollectionKind,
    pub target: String,
    /// Everything to emit, health gauge last
    pub tuples: Vec<MetricTuple>,
    /// Why the scrape reported unhealthy
    pub error: Option<ExporterError>,
}

impl Scrape {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Builds the metric tuples for a target
pub struct MetricAssembler {
    resolver: Arc<dyn ConfigResolver>,
    sources: Arc<dyn SourceFactory>,
    clock: fn() -> DateTime<Utc>,
}

impl MetricAssembler {
    pub fn new(resolver: Arc<dyn ConfigResolver>, sources: Arc<dyn SourceFactory>) -> Self {
        Self {
            resolver,
            sources,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock used for last-seen timestamps
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn sources(&self) -> &Arc<dyn SourceFactory> {
        &self.sources
    }

    /// Run one collection call
    pub async fn collect(&self, kind: CollectionKind, target: &str) -> Scrape {
        let result = match kind {
            CollectionKind::Cluster => self.collect_cluster(target).await,
            CollectionKind::Node => self.collect_node(target).await,
            CollectionKind::Container => self.collect_container(target).await,
        };

        let health = kind.health_desc();
        match result {
            Ok(mut tuples) => {
                debug!(kind = %kind, target, tuples = tuples.len(), "Collection succeeded");
                tuples.push(MetricTuple::new(health, &LabelSet::new(), 1.0));
                Scrape {
                    kind,
                    target: target.to_string(),
                    tuples,
                    error: None,
                }
            }
            Err(error) => {
                warn!(
                    kind = %kind,
                    target,
                    call = error.call().map_or("resolve target", |c| c.as_str()),
                    error = %error,
                    "Collection failed"
                );
                Scrape {
                    kind,
                    target: target.to_string(),
                    tuples: vec![MetricTuple::new(health, &LabelSet::new(), 0.0)],
                    error: Some(error),
                }
            }
        }
    }

    async fn resolve(&self, target: &str) -> Result<ConnectionParams, ExporterError> {
        let conn = self.resolver.resolve(target).await?;
        debug!(address = conn.address(), target, "Target resolved");
        Ok(conn)
    }

    fn cluster_client(
        &self,
        conn: &ConnectionParams,
    ) -> Result<Box<dyn ClusterClient>, ExporterError> {
        let endpoint = Endpoint::new(
            conn.require(params::MASTER_IP)?,
            conn.require(params::API_PORT)?,
        );
        self.sources
            .cluster(&endpoint)
            .map_err(ExporterError::upstream(UpstreamCall::ClusterClient))
    }

    fn stats_client(
        &self,
        conn: &ConnectionParams,
    ) -> Result<Box<dyn NodeStatsClient>, ExporterError> {
        let endpoint = Endpoint::new(
            conn.require(params::NODE_IP)?,
            conn.require(params::CADVISOR_PORT)?,
        );
        self.sources
            .node_stats(&endpoint)
            .map_err(ExporterError::upstream(UpstreamCall::StatsClient))
    }
}

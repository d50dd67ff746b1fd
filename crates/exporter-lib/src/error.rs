//! Error taxonomy for the collection pipeline

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure resolving a target id into connection parameters
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("target '{0}' not found in record store")]
    UnknownTarget(String),

    #[error("target '{target}' has no '{field}' parameter")]
    MissingField { target: String, field: &'static str },

    #[error("record store {} unreadable: {source}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("record store is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Failure talking to one of the external data sources
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("cluster API request failed: {0}")]
    Cluster(#[source] kube::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<kube::Error> for SourceError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(response) => SourceError::Status {
                status: response.code,
                body: response.message,
            },
            kube::Error::SerdeError(e) => SourceError::Decode(e.to_string()),
            other => SourceError::Cluster(other),
        }
    }
}

/// The external call that failed, carried for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamCall {
    ClusterClient,
    ListNodes,
    GetNode,
    ListPods,
    GetPod,
    StatsClient,
    MachineInfo,
    MachineStats,
    ContainerInfo,
}

impl UpstreamCall {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamCall::ClusterClient => "create cluster client",
            UpstreamCall::ListNodes => "list nodes",
            UpstreamCall::GetNode => "get node",
            UpstreamCall::ListPods => "list pods",
            UpstreamCall::GetPod => "get pod",
            UpstreamCall::StatsClient => "create stats client",
            UpstreamCall::MachineInfo => "get machine info",
            UpstreamCall::MachineStats => "get machine stats",
            UpstreamCall::ContainerInfo => "get container info",
        }
    }
}

impl fmt::Display for UpstreamCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by a collection call or the inbound HTTP surface
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ResolveError),

    #[error("{call} failed: {source}")]
    UpstreamUnavailable {
        call: UpstreamCall,
        #[source]
        source: SourceError,
    },

    #[error("upstream data missing: {0}")]
    UpstreamDataMissing(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl ExporterError {
    /// Adapter for `map_err` at each external call site
    pub fn upstream(call: UpstreamCall) -> impl FnOnce(SourceError) -> Self {
        move |source| ExporterError::UpstreamUnavailable { call, source }
    }

    /// The failing external call, if this is an upstream failure
    pub fn call(&self) -> Option<UpstreamCall> {
        match self {
            ExporterError::UpstreamUnavailable { call, .. } => Some(*call),
            _ => None,
        }
    }
}

/// Failure rendering tuples into the exposition registry
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("metric {name} declared with labels {declared:?} but emitted with {emitted:?}")]
    LabelMismatch {
        name: String,
        declared: Vec<String>,
        emitted: Vec<String>,
    },

    #[error("metric {name} has non-finite value {value}")]
    NonFinite { name: String, value: f64 },

    #[error("counter {name} has negative value {value}")]
    NegativeCounter { name: String, value: f64 },

    #[error("registry error: {0}")]
    Registry(#[from] prometheus::Error),
}

//! Kubernetes API client
//!
//! Objects are fetched through `kube::Api` and immediately reduced to the
//! snapshots the assembler needs.

use super::{async_trait, ClusterClient};
use crate::derive::quantity_value;
use crate::error::SourceError;
use crate::models::{ContainerState, ContainerStatusSnapshot, NodeSnapshot, PodSnapshot};
use k8s_openapi::api::core::v1::{self as core, Node, NodeCondition, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::{Api, ListParams};
use kube::{Client, Config};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Cluster API client for one API server
#[derive(Clone)]
pub struct KubeApiClient {
    client: Client,
}

fn parse_cluster_url<T>(base: &Url) -> Result<T, SourceError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    base.as_str().parse().map_err(|e| SourceError::InvalidEndpoint {
        endpoint: base.to_string(),
        reason: format!("{e}"),
    })
}

impl KubeApiClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client for an unauthenticated API server at `base`
    pub fn connect(base: &Url, timeout: Duration) -> Result<Self, SourceError> {
        let mut config = Config::new(parse_cluster_url(base)?);
        config.connect_timeout = Some(timeout);
        config.read_timeout = Some(timeout);

        Ok(Self::new(Client::try_from(config)?))
    }

    fn nodes(&self) -> Api<Node> {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl ClusterClient for KubeApiClient {
    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>, SourceError> {
        let nodes = self.nodes().list(&ListParams::default()).await?;
        nodes.items.iter().map(node_snapshot).collect()
    }

    async fn get_node(&self, name: &str) -> Result<NodeSnapshot, SourceError> {
        let node = self.nodes().get(name).await?;
        node_snapshot(&node)
    }

    async fn list_pods(&self) -> Result<Vec<PodSnapshot>, SourceError> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let pods = pods.list(&ListParams::default()).await?;
        Ok(pods.items.iter().map(pod_snapshot).collect())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodSnapshot, SourceError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod = pods.get(name).await?;
        Ok(pod_snapshot(&pod))
    }
}

/// A node is ready when its `Ready` condition reports `True`
pub fn node_ready(conditions: &[NodeCondition]) -> bool {
    conditions
        .iter()
        .find(|c| c.type_ == "Ready")
        .map_or(false, |c| c.status == "True")
}

fn capacity_value(
    capacity: Option<&BTreeMap<String, Quantity>>,
    resource: &str,
) -> Result<u64, SourceError> {
    match capacity.and_then(|c| c.get(resource)) {
        Some(quantity) => quantity_value(&quantity.0)
            .map_err(|e| SourceError::Decode(format!("{resource} capacity: {e}"))),
        None => Ok(0),
    }
}

pub fn node_snapshot(node: &Node) -> Result<NodeSnapshot, SourceError> {
    let metadata = &node.metadata;
    let status = node.status.as_ref();
    let capacity = status.and_then(|s| s.capacity.as_ref());

    let internal_ip = status
        .and_then(|s| s.addresses.as_ref())
        .and_then(|addresses| addresses.iter().find(|a| a.type_ == "InternalIP"))
        .map(|a| a.address.clone());

    let ready = status
        .and_then(|s| s.conditions.as_deref())
        .map_or(false, node_ready);

    Ok(NodeSnapshot {
        name: metadata.name.clone().unwrap_or_default(),
        internal_ip,
        labels: metadata.labels.clone().unwrap_or_default(),
        cpu_cores: capacity_value(capacity, "cpu")?,
        memory_bytes: capacity_value(capacity, "memory")?,
        ready,
        created_at: metadata.creation_timestamp.as_ref().map(|t| t.0),
    })
}

pub fn container_state(state: Option<&core::ContainerState>) -> ContainerState {
    match state {
        Some(s) if s.waiting.is_some() => ContainerState::Waiting,
        Some(s) if s.running.is_some() => ContainerState::Running,
        Some(s) if s.terminated.is_some() => ContainerState::Terminated,
        _ => ContainerState::Unknown,
    }
}

pub fn pod_snapshot(pod: &Pod) -> PodSnapshot {
    let metadata = &pod.metadata;
    let spec = pod.spec.as_ref();
    let status = pod.status.as_ref();

    let container_statuses = status
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| {
            statuses
                .iter()
                .map(|s| ContainerStatusSnapshot {
                    name: s.name.clone(),
                    container_id: s.container_id.clone(),
                    state: container_state(s.state.as_ref()),
                    restart_count: s.restart_count,
                })
                .collect()
        })
        .unwrap_or_default();

    PodSnapshot {
        name: metadata.name.clone().unwrap_or_default(),
        namespace: metadata.namespace.clone().unwrap_or_default(),
        node_name: spec.and_then(|s| s.node_name.clone()),
        host_ip: status.and_then(|s| s.host_ip.clone()),
        container_count: spec.map_or(0, |s| s.containers.len()),
        container_statuses,
    }
}

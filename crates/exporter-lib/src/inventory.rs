//! Cluster inventory document
//!
//! Lists every node with the pods scheduled on it and their containers,
//! for callers that want to discover targets to register.

use crate::error::SourceError;
use crate::models::{NodeSnapshot, PodSnapshot};
use crate::sources::{Endpoint, SourceFactory};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub nodes: Vec<InventoryNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryNode {
    pub ip: String,
    pub name: String,
    pub pods: Vec<InventoryPod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryPod {
    pub name: String,
    pub namespace: String,
    pub containers: Vec<InventoryContainer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryContainer {
    /// Runtime id without the `<runtime>://` prefix
    pub id: String,
    pub name: String,
    /// State code as in `k8s_container_state`, rendered as a string
    pub status: String,
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("cannot reach cluster API: {0}")]
    Connect(SourceError),

    #[error("cannot list nodes: {0}")]
    ListNodes(SourceError),
}

impl InventoryError {
    /// HTTP status the inventory endpoint answers with
    pub fn status_code(&self) -> u16 {
        match self {
            InventoryError::Connect(_) => 500,
            InventoryError::ListNodes(_) => 404,
        }
    }
}

/// Strip the `<runtime>://` prefix from a container id
pub fn short_container_id(raw: &str) -> &str {
    raw.split_once("://").map_or(raw, |(_, id)| id)
}

/// Build the document from node and pod listings.
///
/// Pods are attached to the node whose internal IP matches the pod's
/// host IP. Nodes without an internal IP are skipped; containers without
/// a runtime id are not yet created and are left out.
pub fn build_inventory(nodes: &[NodeSnapshot], pods: &[PodSnapshot]) -> Inventory {
    let nodes = nodes
        .iter()
        .filter_map(|node| {
            let Some(ip) = node.internal_ip.clone() else {
                debug!(node = %node.name, "Node has no internal IP, skipping");
                return None;
            };
            let pods = pods
                .iter()
                .filter(|pod| pod.host_ip.as_deref() == Some(ip.as_str()))
                .map(|pod| InventoryPod {
                    name: pod.name.clone(),
                    namespace: pod.namespace.clone(),
                    containers: pod
                        .container_statuses
                        .iter()
                        .filter_map(|status| {
                            let id = status.container_id.as_deref()?;
                            Some(InventoryContainer {
                                id: short_container_id(id).to_string(),
                                name: status.name.clone(),
                                status: status.state.code().to_string(),
                            })
                        })
                        .collect(),
                })
                .collect();

            Some(InventoryNode {
                ip,
                name: node.name.clone(),
                pods,
            })
        })
        .collect();

    Inventory { nodes }
}

/// Query the cluster at `endpoint` and build its inventory.
///
/// A failed pod listing degrades to nodes without pods.
pub async fn cluster_inventory(
    sources: &dyn SourceFactory,
    endpoint: &Endpoint,
) -> Result<Inventory, InventoryError> {
    let cluster = sources.cluster(endpoint).map_err(InventoryError::Connect)?;
    let nodes = cluster.list_nodes().await.map_err(InventoryError::ListNodes)?;

    let pods = match cluster.list_pods().await {
        Ok(pods) => pods,
        Err(e) => {
            warn!(endpoint = %endpoint, error = %e, "Pod listing failed, reporting nodes only");
            Vec::new()
        }
    };

    Ok(build_inventory(&nodes, &pods))
}

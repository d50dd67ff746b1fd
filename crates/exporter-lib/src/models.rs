//! Request-scoped data models shared by the sources and the assembler
//!
//! Everything here is rebuilt on every scrape and dropped when the
//! collection call returns.

use crate::derive::DerivedLabels;
use crate::error::ResolveError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Connection parameters resolved from a target id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    target: String,
    address: String,
    fields: HashMap<String, String>,
}

impl ConnectionParams {
    pub fn new(
        target: impl Into<String>,
        address: impl Into<String>,
        fields: HashMap<String, String>,
    ) -> Self {
        Self {
            target: target.into(),
            address: address.into(),
            fields,
        }
    }

    /// The target id these parameters were resolved from
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Address recorded alongside the parameters
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Look up a field the current collection kind cannot do without.
    /// Empty values count as missing.
    pub fn require(&self, field: &'static str) -> Result<&str, ResolveError> {
        match self.get(field) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ResolveError::MissingField {
                target: self.target.clone(),
                field,
            }),
        }
    }
}

/// Parameter names understood by the collection kinds
pub mod params {
    pub const MASTER_IP: &str = "master_ip";
    pub const API_PORT: &str = "api_port";
    pub const NODE_IP: &str = "node_ip";
    pub const NODE_NAME: &str = "node_name";
    pub const CADVISOR_PORT: &str = "cadvisor_port";
    pub const CONTAINER_ID: &str = "container_id";
    pub const POD_NAME: &str = "pod_name";
    pub const POD_NAMESPACE: &str = "pod_namespace";
}

/// A node as reported by the cluster API
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSnapshot {
    pub name: String,
    pub internal_ip: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub cpu_cores: u64,
    pub memory_bytes: u64,
    pub ready: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Lifecycle state of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Waiting,
    Running,
    Terminated,
    Unknown,
}

impl ContainerState {
    /// Numeric code used by both the state gauge and the inventory document
    pub fn code(self) -> u8 {
        match self {
            ContainerState::Waiting => 0,
            ContainerState::Running => 1,
            ContainerState::Terminated => 2,
            ContainerState::Unknown => 3,
        }
    }
}

/// One entry of a pod's container status list
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerStatusSnapshot {
    pub name: String,
    pub container_id: Option<String>,
    pub state: ContainerState,
    pub restart_count: i32,
}

/// A pod as reported by the cluster API
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PodSnapshot {
    pub name: String,
    pub namespace: String,
    pub node_name: Option<String>,
    pub host_ip: Option<String>,
    /// Containers declared in the pod spec
    pub container_count: usize,
    pub container_statuses: Vec<ContainerStatusSnapshot>,
}

impl PodSnapshot {
    pub fn container_status(&self, name: &str) -> Option<&ContainerStatusSnapshot> {
        self.container_statuses.iter().find(|s| s.name == name)
    }
}

/// Per-filesystem usage within a stats sample
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FsSample {
    pub device: String,
    pub capacity: Option<u64>,
    pub usage: Option<u64>,
    pub available: Option<u64>,
}

/// One timestamped resource-usage sample from the stats API
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSample {
    pub timestamp: DateTime<Utc>,
    /// Cumulative CPU time across all cores, nanoseconds
    pub cpu_total_ns: u64,
    /// Cumulative CPU time per logical CPU, nanoseconds
    pub cpu_per_cpu_ns: Vec<u64>,
    pub memory_usage_bytes: u64,
    pub filesystems: Vec<FsSample>,
}

/// Machine-wide facts reported by the stats API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MachineInfo {
    pub num_cores: u32,
    pub memory_capacity: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuSpec {
    /// Relative shares
    pub shares: u64,
    pub quota: u64,
    pub period: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySpec {
    pub limit: u64,
    pub swap_limit: u64,
}

/// Resource spec of a container; absent sections were not reported
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerSpec {
    pub creation_time: Option<DateTime<Utc>>,
    pub cpu: Option<CpuSpec>,
    pub memory: Option<MemorySpec>,
}

/// Container inspection result from the stats API
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerInfo {
    /// Name the stats API knows the container by
    pub id: String,
    pub aliases: Vec<String>,
    pub spec: ContainerSpec,
    /// Oldest first
    pub stats: Vec<StatsSample>,
}

impl ContainerInfo {
    /// First alias, which carries the runtime's display name
    pub fn display_name(&self) -> Option<&str> {
        self.aliases.first().map(String::as_str)
    }

    pub fn latest_stats(&self) -> Option<&StatsSample> {
        self.stats.last()
    }
}

/// A container after merging stats-API and cluster-API data
#[derive(Debug, Clone)]
pub struct ContainerRecord {
    pub info: ContainerInfo,
    pub labels: DerivedLabels,
    /// `None` when no status entry matched the derived container name
    pub status: Option<ContainerStatusSnapshot>,
}

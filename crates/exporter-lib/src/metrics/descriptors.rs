//! Descriptor tables for the three collection kinds

use super::MetricDesc;

pub mod labels {
    pub const NODE_IP: &str = "ip";
    pub const NODE_LABEL: &str = "nodelabel";
    pub const DEVICE: &str = "device";
    pub const CPU: &str = "cpu";
    pub const CONTAINER_ID: &str = "id";
    pub const CONTAINER_NAME: &str = "name";
    pub const CONTAINER_NODE_IP: &str = "nodeIP";
}

const DEVICE_LABELS: &[&str] = &[labels::DEVICE];
const CPU_LABELS: &[&str] = &[labels::CPU];

// Cluster summary

pub static CLUSTER_NODES_TOTAL: MetricDesc =
    MetricDesc::gauge("k8s_cluster_nodes_total", "k8s cluster nodes in total");
pub static CLUSTER_CONTAINERS_TOTAL: MetricDesc =
    MetricDesc::gauge("k8s_cluster_containers_total", "k8s cluster containers in total");
pub static CLUSTER_CPUCORES_TOTAL: MetricDesc =
    MetricDesc::gauge("k8s_cluster_cpucores_total", "k8s cluster cpucores in total");
pub static CLUSTER_MEMORY_TOTAL: MetricDesc =
    MetricDesc::gauge("k8s_cluster_memory_total", "k8s cluster memory in total");
pub static CLUSTER_MONITOR_STATUS: MetricDesc =
    MetricDesc::gauge("k8s_cluster_monitorstatus", "k8s cluster node monitor status");

// Node

pub static NODE_STATUS: MetricDesc = MetricDesc::gauge("k8s_node_status", "k8s node status");
pub static NODE_CONTAINER_TOTAL: MetricDesc =
    MetricDesc::gauge("k8s_node_container_total", "k8s node containers in total");
pub static NODE_UPTIME: MetricDesc = MetricDesc::gauge("k8s_node_uptime", "k8s node up time");
pub static NODE_CPUCORES_TOTAL: MetricDesc =
    MetricDesc::gauge("k8s_node_cpucores_total", "k8s node cpu cores in total");
pub static NODE_CPU_USAGE: MetricDesc =
    MetricDesc::gauge("k8s_node_cpu_usage", "node cpu usage in percent");
pub static NODE_MEMORY_USED: MetricDesc =
    MetricDesc::gauge("k8s_node_memory_used", "node memory used in bytes");
pub static NODE_MEMORY_TOTAL: MetricDesc =
    MetricDesc::gauge("k8s_node_memory_total", "node memory total in bytes");
// Name kept as deployed dashboards query it.
pub static NODE_MEMORY_AVAILABLE: MetricDesc =
    MetricDesc::gauge("k8s_node_memory_avlil", "node memory available in bytes");
pub static NODE_FILESYSTEM_TOTAL: MetricDesc =
    MetricDesc::gauge("k8s_node_filesystem_total", "k8s node filesystem in total")
        .with_extra_labels(DEVICE_LABELS);
pub static NODE_FILESYSTEM_USED: MetricDesc =
    MetricDesc::gauge("k8s_node_filesystem_used", "k8s node filesystem in used")
        .with_extra_labels(DEVICE_LABELS);
pub static NODE_FILESYSTEM_AVAIL: MetricDesc =
    MetricDesc::gauge("k8s_node_filesystem_avail", "k8s node filesystem in avail")
        .with_extra_labels(DEVICE_LABELS);
pub static NODE_MONITOR_STATUS: MetricDesc =
    MetricDesc::gauge("k8s_node_monitorstatus", "k8s node monitor status");

// Container

pub static CONTAINER_MACHINE_CORES: MetricDesc = MetricDesc::gauge(
    "k8s_container_machine_cores",
    "Number of CPU cores on this node",
);
pub static CONTAINER_MACHINE_MEMORY: MetricDesc = MetricDesc::gauge(
    "k8s_container_machine_memory",
    "Amount of memory installed on the node",
);
pub static CONTAINER_START_TIME: MetricDesc = MetricDesc::gauge(
    "k8s_container_start_time_seconds",
    "start time of the container since unix epoch in seconds",
);
pub static CONTAINER_SPEC_CPU_PERIOD: MetricDesc =
    MetricDesc::gauge("k8s_container_spec_cpu_period", "cpu period of the container");
pub static CONTAINER_SPEC_CPU_QUOTA: MetricDesc =
    MetricDesc::gauge("k8s_container_spec_cpu_quota", "cpu quota of the container");
pub static CONTAINER_SPEC_CPU_SHARES: MetricDesc =
    MetricDesc::gauge("k8s_container_spec_cpu_shares", "cpu share of the container");
pub static CONTAINER_SPEC_MEMORY_LIMIT: MetricDesc = MetricDesc::gauge(
    "k8s_container_spec_memory_limit_bytes",
    "memory limit for the container",
);
pub static CONTAINER_SPEC_MEMORY_SWAP_LIMIT: MetricDesc = MetricDesc::gauge(
    "k8s_container_spec_memory_swap_limit_bytes",
    "memory swap limit for the container",
);
// Help text lists the state codes actually emitted.
pub static CONTAINER_STATE: MetricDesc = MetricDesc::gauge(
    "k8s_container_state",
    "container state, 0:waiting, 1:running, 2:terminated, 3:unknown",
);
pub static CONTAINER_RESTART: MetricDesc =
    MetricDesc::gauge("k8s_container_restart", "container restart times");
pub static CONTAINER_LAST_SEEN: MetricDesc = MetricDesc::gauge(
    "k8s_container_last_seen",
    "Last time a container was seen by the exporter",
);
pub static CONTAINER_CPU_USAGE_SECONDS: MetricDesc = MetricDesc::counter(
    "k8s_container_cpu_usage_seconds_total",
    "Cumulative cpu time consumed per cpu in seconds",
)
.with_extra_labels(CPU_LABELS);
pub static CONTAINER_MEMORY_USAGE: MetricDesc = MetricDesc::gauge(
    "k8s_container_memory_usage_bytes",
    "Current memory usage in bytes",
);
pub static CONTAINER_FS_LIMIT: MetricDesc = MetricDesc::gauge(
    "k8s_container_fs_limit_bytes",
    "Number of bytes that can be consumed by the container on this filesystem",
)
.with_extra_labels(DEVICE_LABELS);
pub static CONTAINER_FS_USAGE: MetricDesc = MetricDesc::gauge(
    "k8s_container_fs_usage_bytes",
    "Number of bytes that are consumed by the container on this filesystem",
)
.with_extra_labels(DEVICE_LABELS);
pub static CONTAINER_MONITOR_STATUS: MetricDesc =
    MetricDesc::gauge("k8s_container_monitorstatus", "k8s container monitor status");

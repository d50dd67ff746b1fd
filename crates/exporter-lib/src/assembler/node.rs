use super::MetricAssembler;
use crate::derive::window_cpu_usage_percent;
use crate::error::{ExporterError, UpstreamCall};
use crate::metrics::descriptors::{
    labels, NODE_CONTAINER_TOTAL, NODE_CPUCORES_TOTAL, NODE_CPU_USAGE, NODE_FILESYSTEM_AVAIL,
    NODE_FILESYSTEM_TOTAL, NODE_FILESYSTEM_USED, NODE_MEMORY_AVAILABLE, NODE_MEMORY_TOTAL,
    NODE_MEMORY_USED, NODE_STATUS, NODE_UPTIME,
};
use crate::metrics::{LabelSet, MetricTuple};
use crate::models::{params, NodeSnapshot, PodSnapshot, StatsSample};
use tracing::debug;

/// Node label whose value becomes the `nodelabel` metric label
const NODE_ROLE_LABEL: &str = "node";

impl MetricAssembler {
    pub(super) async fn collect_node(
        &self,
        target: &str,
    ) -> Result<Vec<MetricTuple>, ExporterError> {
        let conn = self.resolve(target).await?;
        let node_ip = conn.require(params::NODE_IP)?;
        let node_name = conn.require(params::NODE_NAME)?;

        let cluster = self.cluster_client(&conn)?;
        let node = cluster
            .get_node(node_name)
            .await
            .map_err(ExporterError::upstream(UpstreamCall::GetNode))?;
        let pods = cluster
            .list_pods()
            .await
            .map_err(ExporterError::upstream(UpstreamCall::ListPods))?;

        let stats = self.stats_client(&conn)?;
        let window = stats
            .machine_stats()
            .await
            .map_err(ExporterError::upstream(UpstreamCall::MachineStats))?;

        Ok(node_metrics(node_ip, &node, &pods, &window))
    }
}

/// Metrics for one node from its snapshot, the cluster's pods and the
/// node's stats window (oldest first)
pub fn node_metrics(
    node_ip: &str,
    node: &NodeSnapshot,
    pods: &[PodSnapshot],
    window: &[StatsSample],
) -> Vec<MetricTuple> {
    let base = LabelSet::new().with(labels::NODE_IP, node_ip).with(
        labels::NODE_LABEL,
        node.labels
            .get(NODE_ROLE_LABEL)
            .map(String::as_str)
            .unwrap_or_default(),
    );

    let containers: usize = pods
        .iter()
        .filter(|p| p.node_name.as_deref() == Some(node.name.as_str()))
        .map(|p| p.container_count)
        .sum();

    let mut tuples = vec![
        MetricTuple::new(&NODE_STATUS, &base, if node.ready { 1.0 } else { 0.0 }),
        MetricTuple::new(&NODE_CONTAINER_TOTAL, &base, containers as f64),
    ];

    if let Some(created) = node.created_at {
        tuples.push(MetricTuple::new(&NODE_UPTIME, &base, created.timestamp() as f64));
    }

    tuples.push(MetricTuple::new(
        &NODE_CPUCORES_TOTAL,
        &base,
        node.cpu_cores as f64,
    ));

    match window_cpu_usage_percent(window, node.cpu_cores) {
        Ok(usage) => tuples.push(MetricTuple::new(&NODE_CPU_USAGE, &base, usage)),
        Err(skip) => debug!(node = %node.name, reason = %skip, "Skipping node cpu usage"),
    }

    let latest = window.last();
    if let Some(sample) = latest {
        tuples.push(MetricTuple::new(
            &NODE_MEMORY_USED,
            &base,
            sample.memory_usage_bytes as f64,
        ));
    }
    tuples.push(MetricTuple::new(
        &NODE_MEMORY_TOTAL,
        &base,
        node.memory_bytes as f64,
    ));

    let Some(sample) = latest else {
        debug!(node = %node.name, "No machine stats sample");
        return tuples;
    };

    tuples.push(MetricTuple::new(
        &NODE_MEMORY_AVAILABLE,
        &base,
        node.memory_bytes.saturating_sub(sample.memory_usage_bytes) as f64,
    ));

    for fs in &sample.filesystems {
        let device = [fs.device.clone()];
        for (desc, value) in [
            (&NODE_FILESYSTEM_TOTAL, fs.capacity),
            (&NODE_FILESYSTEM_USED, fs.usage),
            (&NODE_FILESYSTEM_AVAIL, fs.available),
        ] {
            if let Some(value) = value {
                tuples.push(MetricTuple::with_extra(desc, &base, &device, value as f64));
            }
        }
    }

    tuples
}

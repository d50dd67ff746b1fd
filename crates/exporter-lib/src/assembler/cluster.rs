use super::MetricAssembler;
use crate::error::{ExporterError, UpstreamCall};
use crate::metrics::descriptors::{
    CLUSTER_CONTAINERS_TOTAL, CLUSTER_CPUCORES_TOTAL, CLUSTER_MEMORY_TOTAL, CLUSTER_NODES_TOTAL,
};
use crate::metrics::{LabelSet, MetricTuple};
use crate::models::{NodeSnapshot, PodSnapshot};

impl MetricAssembler {
    pub(super) async fn collect_cluster(
        &self,
        target: &str,
    ) -> Result<Vec<MetricTuple>, ExporterError> {
        let conn = self.resolve(target).await?;
        let cluster = self.cluster_client(&conn)?;

        let nodes = cluster
            .list_nodes()
            .await
            .map_err(ExporterError::upstream(UpstreamCall::ListNodes))?;
        let pods = cluster
            .list_pods()
            .await
            .map_err(ExporterError::upstream(UpstreamCall::ListPods))?;

        Ok(cluster_summary(&nodes, &pods))
    }
}

/// Cluster-wide totals over every node and pod
pub fn cluster_summary(nodes: &[NodeSnapshot], pods: &[PodSnapshot]) -> Vec<MetricTuple> {
    let labels = LabelSet::new();
    let containers: usize = pods.iter().map(|p| p.container_count).sum();
    let cores: u64 = nodes.iter().map(|n| n.cpu_cores).sum();
    let memory: u64 = nodes.iter().map(|n| n.memory_bytes).sum();

    vec![
        MetricTuple::new(&CLUSTER_NODES_TOTAL, &labels, nodes.len() as f64),
        MetricTuple::new(&CLUSTER_CONTAINERS_TOTAL, &labels, containers as f64),
        MetricTuple::new(&CLUSTER_CPUCORES_TOTAL, &labels, cores as f64),
        MetricTuple::new(&CLUSTER_MEMORY_TOTAL, &labels, memory as f64),
    ]
}

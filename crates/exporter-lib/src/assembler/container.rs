use super::MetricAssembler;
use crate::derive::derive_labels;
use crate::error::{ExporterError, UpstreamCall};
use crate::metrics::descriptors::{
    labels, CONTAINER_CPU_USAGE_SECONDS, CONTAINER_FS_LIMIT, CONTAINER_FS_USAGE,
    CONTAINER_LAST_SEEN, CONTAINER_MACHINE_CORES, CONTAINER_MACHINE_MEMORY,
    CONTAINER_MEMORY_USAGE, CONTAINER_RESTART, CONTAINER_SPEC_CPU_PERIOD,
    CONTAINER_SPEC_CPU_QUOTA, CONTAINER_SPEC_CPU_SHARES, CONTAINER_SPEC_MEMORY_LIMIT,
    CONTAINER_SPEC_MEMORY_SWAP_LIMIT, CONTAINER_START_TIME, CONTAINER_STATE,
};
use crate::metrics::{LabelSet, MetricDesc, MetricTuple};
use crate::models::{
    params, ContainerInfo, ContainerRecord, FsSample, MachineInfo, PodSnapshot, StatsSample,
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Memory limits above this are the runtime's "unlimited" sentinel
pub const MAX_MEMORY_SIZE: u64 = 1 << 62;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Memory limit as exported; the unlimited sentinel becomes 0
pub fn memory_limit_value(limit: u64) -> f64 {
    if limit > MAX_MEMORY_SIZE {
        0.0
    } else {
        limit as f64
    }
}

/// One value of a stats-derived metric with its extra label values
struct StatsValue {
    extra: Vec<String>,
    value: f64,
}

impl StatsValue {
    fn plain(value: f64) -> Self {
        Self {
            extra: Vec::new(),
            value,
        }
    }
}

/// A metric computed from the latest stats sample
struct StatsMetric {
    desc: &'static MetricDesc,
    values: fn(&StatsSample, DateTime<Utc>) -> Vec<StatsValue>,
}

static STATS_METRICS: [StatsMetric; 5] = [
    StatsMetric {
        desc: &CONTAINER_LAST_SEEN,
        values: |_, now| vec![StatsValue::plain(now.timestamp() as f64)],
    },
    StatsMetric {
        desc: &CONTAINER_CPU_USAGE_SECONDS,
        values: |sample, _| {
            sample
                .cpu_per_cpu_ns
                .iter()
                .enumerate()
                .map(|(i, ns)| StatsValue {
                    extra: vec![format!("cpu{i:02}")],
                    value: *ns as f64 / NANOS_PER_SECOND,
                })
                .collect()
        },
    },
    StatsMetric {
        desc: &CONTAINER_MEMORY_USAGE,
        values: |sample, _| vec![StatsValue::plain(sample.memory_usage_bytes as f64)],
    },
    StatsMetric {
        desc: &CONTAINER_FS_LIMIT,
        values: |sample, _| fs_values(sample, |fs| fs.capacity),
    },
    StatsMetric {
        desc: &CONTAINER_FS_USAGE,
        values: |sample, _| fs_values(sample, |fs| fs.usage),
    },
];

fn fs_values(sample: &StatsSample, field: fn(&FsSample) -> Option<u64>) -> Vec<StatsValue> {
    sample
        .filesystems
        .iter()
        .filter_map(|fs| {
            field(fs).map(|value| StatsValue {
                extra: vec![fs.device.clone()],
                value: value as f64,
            })
        })
        .collect()
}

impl MetricAssembler {
    pub(super) async fn collect_container(
        &self,
        target: &str,
    ) -> Result<Vec<MetricTuple>, ExporterError> {
        let conn = self.resolve(target).await?;
        let node_ip = conn.require(params::NODE_IP)?;
        let container_id = conn.require(params::CONTAINER_ID)?;
        let pod_name = conn.require(params::POD_NAME)?;
        let pod_namespace = conn.require(params::POD_NAMESPACE)?;

        let stats = self.stats_client(&conn)?;
        let info = stats
            .container_info(container_id, 1)
            .await
            .map_err(ExporterError::upstream(UpstreamCall::ContainerInfo))?;
        let machine = stats
            .machine_info()
            .await
            .map_err(ExporterError::upstream(UpstreamCall::MachineInfo))?;

        let cluster = self.cluster_client(&conn)?;
        let pod = cluster
            .get_pod(pod_namespace, pod_name)
            .await
            .map_err(ExporterError::upstream(UpstreamCall::GetPod))?;

        let record = merge_container(info, &pod);
        Ok(container_metrics(node_ip, &machine, &record, (self.clock)()))
    }
}

/// Attach derived labels and the matching pod status to a container
pub fn merge_container(info: ContainerInfo, pod: &PodSnapshot) -> ContainerRecord {
    let labels = derive_labels(info.display_name().unwrap_or(&info.id));
    let status = labels
        .container_name()
        .and_then(|name| pod.container_status(name))
        .cloned();

    if status.is_none() {
        debug!(container = %info.id, pod = %pod.name, "No matching container status");
    }

    ContainerRecord {
        info,
        labels,
        status,
    }
}

/// Labels shared by every per-container metric
pub fn base_labels(record: &ContainerRecord, node_ip: &str) -> LabelSet {
    let mut base = LabelSet::new().with(labels::CONTAINER_ID, record.info.id.as_str());
    if let Some(name) = record.info.display_name() {
        base.push(labels::CONTAINER_NAME, name);
    }
    base.push(labels::CONTAINER_NODE_IP, node_ip);
    base.extend_derived(&record.labels);
    base
}

/// Metrics for one container; `now` stamps the last-seen gauge
pub fn container_metrics(
    node_ip: &str,
    machine: &MachineInfo,
    record: &ContainerRecord,
    now: DateTime<Utc>,
) -> Vec<MetricTuple> {
    let machine_labels = LabelSet::new().with(labels::CONTAINER_NODE_IP, node_ip);
    let mut tuples = vec![
        MetricTuple::new(
            &CONTAINER_MACHINE_CORES,
            &machine_labels,
            machine.num_cores as f64,
        ),
        MetricTuple::new(
            &CONTAINER_MACHINE_MEMORY,
            &machine_labels,
            machine.memory_capacity as f64,
        ),
    ];

    let base = base_labels(record, node_ip);
    let spec = &record.info.spec;

    if let Some(created) = spec.creation_time {
        tuples.push(MetricTuple::new(
            &CONTAINER_START_TIME,
            &base,
            created.timestamp() as f64,
        ));
    }

    if let Some(cpu) = spec.cpu {
        tuples.push(MetricTuple::new(&CONTAINER_SPEC_CPU_PERIOD, &base, cpu.period as f64));
        if cpu.quota != 0 {
            tuples.push(MetricTuple::new(&CONTAINER_SPEC_CPU_QUOTA, &base, cpu.quota as f64));
        }
        tuples.push(MetricTuple::new(&CONTAINER_SPEC_CPU_SHARES, &base, cpu.shares as f64));
    }

    if let Some(memory) = spec.memory {
        tuples.push(MetricTuple::new(
            &CONTAINER_SPEC_MEMORY_LIMIT,
            &base,
            memory_limit_value(memory.limit),
        ));
        tuples.push(MetricTuple::new(
            &CONTAINER_SPEC_MEMORY_SWAP_LIMIT,
            &base,
            memory_limit_value(memory.swap_limit),
        ));
    }

    if let Some(status) = &record.status {
        tuples.push(MetricTuple::new(
            &CONTAINER_STATE,
            &base,
            f64::from(status.state.code()),
        ));
        tuples.push(MetricTuple::new(
            &CONTAINER_RESTART,
            &base,
            f64::from(status.restart_count),
        ));
    }

    match record.info.latest_stats() {
        Some(sample) => {
            for metric in &STATS_METRICS {
                for value in (metric.values)(sample, now) {
                    tuples.push(MetricTuple::with_extra(
                        metric.desc,
                        &base,
                        &value.extra,
                        value.value,
                    ));
                }
            }
        }
        None => debug!(container = %record.info.id, "No stats sample for container"),
    }

    tuples
}

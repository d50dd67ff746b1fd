//! cAdvisor stats API client
//!
//! Wire types mirror the subset of the v1.3 and v2.0 JSON the exporter
//! reads; everything else in the documents is ignored.

use super::http::{get_json, post_json};
use super::{async_trait, NodeStatsClient};
use crate::error::SourceError;
use crate::models::{
    ContainerInfo, ContainerSpec, CpuSpec, FsSample, MachineInfo, MemorySpec, StatsSample,
};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

#[derive(Debug, Deserialize)]
struct MachineInfoWire {
    #[serde(default)]
    num_cores: u32,
    #[serde(default)]
    memory_capacity: u64,
}

#[derive(Debug, Serialize)]
struct ContainerInfoRequest {
    num_stats: u32,
}

#[derive(Debug, Deserialize)]
struct ContainerInfoWire {
    #[serde(default)]
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    spec: ContainerSpecWire,
    #[serde(default)]
    stats: Vec<StatsWire>,
}

#[derive(Debug, Default, Deserialize)]
struct ContainerSpecWire {
    creation_time: Option<DateTime<Utc>>,
    #[serde(default)]
    has_cpu: bool,
    #[serde(default)]
    cpu: CpuSpecWire,
    #[serde(default)]
    has_memory: bool,
    #[serde(default)]
    memory: MemorySpecWire,
}

#[derive(Debug, Default, Deserialize)]
struct CpuSpecWire {
    #[serde(default)]
    limit: u64,
    #[serde(default)]
    quota: u64,
    #[serde(default)]
    period: u64,
}

#[derive(Debug, Default, Deserialize)]
struct MemorySpecWire {
    #[serde(default)]
    limit: u64,
    #[serde(default)]
    swap_limit: u64,
}

/// A stats sample; shared by container stats and machine stats
#[derive(Debug, Deserialize)]
struct StatsWire {
    timestamp: DateTime<Utc>,
    cpu: Option<CpuStatsWire>,
    memory: Option<MemoryStatsWire>,
    #[serde(default)]
    filesystem: Option<Vec<FsStatsWire>>,
}

#[derive(Debug, Default, Deserialize)]
struct CpuStatsWire {
    #[serde(default)]
    usage: CpuUsageWire,
}

#[derive(Debug, Default, Deserialize)]
struct CpuUsageWire {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    per_cpu_usage: Option<Vec<u64>>,
}

#[derive(Debug, Default, Deserialize)]
struct MemoryStatsWire {
    #[serde(default)]
    usage: u64,
}

#[derive(Debug, Deserialize)]
struct FsStatsWire {
    #[serde(default)]
    device: String,
    capacity: Option<u64>,
    usage: Option<u64>,
    available: Option<u64>,
}

impl From<StatsWire> for StatsSample {
    fn from(wire: StatsWire) -> Self {
        let cpu = wire.cpu.unwrap_or_default();
        StatsSample {
            timestamp: wire.timestamp,
            cpu_total_ns: cpu.usage.total,
            cpu_per_cpu_ns: cpu.usage.per_cpu_usage.unwrap_or_default(),
            memory_usage_bytes: wire.memory.map_or(0, |m| m.usage),
            filesystems: wire
                .filesystem
                .unwrap_or_default()
                .into_iter()
                .map(|fs| FsSample {
                    device: fs.device,
                    capacity: fs.capacity,
                    usage: fs.usage,
                    available: fs.available,
                })
                .collect(),
        }
    }
}

impl From<ContainerInfoWire> for ContainerInfo {
    fn from(wire: ContainerInfoWire) -> Self {
        let spec = wire.spec;
        let mut stats: Vec<StatsSample> = wire.stats.into_iter().map(StatsSample::from).collect();
        stats.sort_by_key(|s| s.timestamp);

        ContainerInfo {
            id: wire.name,
            aliases: wire.aliases,
            spec: ContainerSpec {
                creation_time: spec.creation_time,
                cpu: spec.has_cpu.then_some(CpuSpec {
                    shares: spec.cpu.limit,
                    quota: spec.cpu.quota,
                    period: spec.cpu.period,
                }),
                memory: spec.has_memory.then_some(MemorySpec {
                    limit: spec.memory.limit,
                    swap_limit: spec.memory.swap_limit,
                }),
            },
            stats,
        }
    }
}

/// Stats API client for one node
#[derive(Debug, Clone)]
pub struct CadvisorClient {
    http: Client,
    base: Url,
}

impl CadvisorClient {
    pub fn new(http: Client, base: Url) -> Self {
        Self { http, base }
    }
}

#[async_trait]
impl NodeStatsClient for CadvisorClient {
    async fn machine_info(&self) -> Result<MachineInfo, SourceError> {
        let wire: MachineInfoWire = get_json(&self.http, &self.base, "api/v1.3/machine").await?;
        Ok(MachineInfo {
            num_cores: wire.num_cores,
            memory_capacity: wire.memory_capacity,
        })
    }

    async fn machine_stats(&self) -> Result<Vec<StatsSample>, SourceError> {
        let wire: Vec<StatsWire> =
            get_json(&self.http, &self.base, "api/v2.0/machinestats").await?;
        let mut window: Vec<StatsSample> = wire.into_iter().map(StatsSample::from).collect();
        window.sort_by_key(|s| s.timestamp);
        Ok(window)
    }

    async fn container_info(
        &self,
        id: &str,
        num_stats: u32,
    ) -> Result<ContainerInfo, SourceError> {
        let request = ContainerInfoRequest { num_stats };
        let path = format!("api/v1.3/docker/{id}");
        let mut found: HashMap<String, ContainerInfoWire> =
            post_json(&self.http, &self.base, &path, &request).await?;

        if found.len() != 1 {
            return Err(SourceError::Decode(format!(
                "expected exactly one container for '{id}', got {}",
                found.len()
            )));
        }

        let result = found
            .drain()
            .next()
            .map(|(_, wire)| ContainerInfo::from(wire))
            .ok_or_else(|| SourceError::Decode(format!("no container for '{id}'")));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn container_json() -> serde_json::Value {
        json!({
            "name": "/docker/abc123",
            "aliases": ["k8s_nginx.1_web-pod_default_uid_0", "abc123"],
            "spec": {
                "creation_time": "2024-01-01T00:05:00Z",
                "has_cpu": true,
                "cpu": {"limit": 1024, "quota": 50000, "period": 100000},
                "has_memory": true,
                "memory": {"limit": 536870912u64, "swap_limit": 18446744073709551615u64}
            },
            "stats": [{
                "timestamp": "2024-01-01T01:00:00.123456789Z",
                "cpu": {
                    "usage": {
                        "total": 3000000000u64,
                        "per_cpu_usage": [1000000000u64, 2000000000u64]
                    }
                },
                "memory": {"usage": 104857600u64},
                "filesystem": [{
                    "device": "/dev/sda1",
                    "capacity": 1000,
                    "usage": 250,
                    "available": 750
                }]
            }]
        })
    }

    fn client(server: &mockito::Server) -> CadvisorClient {
        let base = Url::parse(&format!("{}/", server.url())).unwrap();
        CadvisorClient::new(Client::new(), base)
    }

    #[test]
    fn test_container_info_conversion() {
        let wire: ContainerInfoWire = serde_json::from_value(container_json()).unwrap();
        let info = ContainerInfo::from(wire);

        assert_eq!(info.id, "/docker/abc123");
        assert_eq!(info.display_name(), Some("k8s_nginx.1_web-pod_default_uid_0"));
        let cpu = info.spec.cpu.unwrap();
        assert_eq!((cpu.shares, cpu.quota, cpu.period), (1024, 50000, 100000));
        assert_eq!(info.spec.memory.unwrap().swap_limit, u64::MAX);

        let sample = info.latest_stats().unwrap();
        assert_eq!(sample.cpu_per_cpu_ns, vec![1_000_000_000, 2_000_000_000]);
        assert_eq!(sample.memory_usage_bytes, 104_857_600);
        assert_eq!(sample.filesystems[0].capacity, Some(1000));
    }

    #[test]
    fn test_spec_sections_absent_when_not_reported() {
        let wire: ContainerInfoWire =
            serde_json::from_value(json!({"name": "/docker/x", "spec": {"has_cpu": false}}))
                .unwrap();
        let info = ContainerInfo::from(wire);

        assert!(info.spec.cpu.is_none());
        assert!(info.spec.memory.is_none());
        assert!(info.spec.creation_time.is_none());
        assert!(info.latest_stats().is_none());
    }

    #[tokio::test]
    async fn test_container_info_posts_sample_count() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1.3/docker/abc123")
            .match_body(Matcher::PartialJsonString(r#"{"num_stats": 1}"#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"/docker/abc123": container_json()}).to_string())
            .create_async()
            .await;

        let info = client(&server).container_info("abc123", 1).await.unwrap();

        mock.assert_async().await;
        assert_eq!(info.id, "/docker/abc123");
    }

    #[tokio::test]
    async fn test_container_info_rejects_ambiguous_reply() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "/docker/abc1": container_json(),
            "/docker/abc2": container_json()
        });
        let _mock = server
            .mock("POST", "/api/v1.3/docker/abc")
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let result = client(&server).container_info("abc", 1).await;
        assert!(matches!(result, Err(SourceError::Decode(_))));
    }

    #[tokio::test]
    async fn test_machine_stats_window_is_ordered() {
        let mut server = mockito::Server::new_async().await;
        let body = json!([
            {
                "timestamp": "2024-01-01T00:00:10Z",
                "cpu": {"usage": {"total": 20}},
                "filesystem": [{"device": "/dev/sda1", "capacity": 100}]
            },
            {
                "timestamp": "2024-01-01T00:00:00Z",
                "cpu": {"usage": {"total": 10}},
                "memory": {"usage": 5}
            }
        ]);
        let _mock = server
            .mock("GET", "/api/v2.0/machinestats")
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let window = client(&server).machine_stats().await.unwrap();

        assert_eq!(window.len(), 2);
        assert_eq!(window[0].cpu_total_ns, 10);
        assert_eq!(window[1].cpu_total_ns, 20);
        assert_eq!(window[1].filesystems[0].usage, None);
    }

    #[tokio::test]
    async fn test_machine_info_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1.3/machine")
            .with_status(500)
            .create_async()
            .await;

        let result = client(&server).machine_info().await;
        assert!(matches!(result, Err(SourceError::Status { status: 500, .. })));
    }
}

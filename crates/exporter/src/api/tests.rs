use super::*;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use exporter_lib::health::components;
use exporter_lib::sources::{ClusterClient, NodeStatsClient, SourceFactory};
use exporter_lib::{
    ContainerState, ContainerStatusSnapshot, NodeSnapshot, PodSnapshot, SourceError,
    StaticResolver,
};
use tower::ServiceExt;

#[derive(Clone, Default)]
struct FakeCluster {
    nodes: Vec<NodeSnapshot>,
    pods: Vec<PodSnapshot>,
    fail_nodes: bool,
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>, SourceError> {
        if self.fail_nodes {
            return Err(SourceError::Status {
                status: 403,
                body: "forbidden".to_string(),
            });
        }
        Ok(self.nodes.clone())
    }

    async fn get_node(&self, name: &str) -> Result<NodeSnapshot, SourceError> {
        self.nodes
            .iter()
            .find(|n| n.name == name)
            .cloned()
            .ok_or_else(|| SourceError::Decode(format!("no node {name}")))
    }

    async fn list_pods(&self) -> Result<Vec<PodSnapshot>, SourceError> {
        Ok(self.pods.clone())
    }

    async fn get_pod(&self, _namespace: &str, name: &str) -> Result<PodSnapshot, SourceError> {
        self.pods
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| SourceError::Decode(format!("no pod {name}")))
    }
}

#[derive(Clone, Default)]
struct FakeSources {
    cluster: FakeCluster,
    refuse_connect: bool,
}

impl SourceFactory for FakeSources {
    fn cluster(&self, endpoint: &Endpoint) -> Result<Box<dyn ClusterClient>, SourceError> {
        if self.refuse_connect {
            return Err(SourceError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "refused".to_string(),
            });
        }
        Ok(Box::new(self.cluster.clone()))
    }

    fn node_stats(&self, endpoint: &Endpoint) -> Result<Box<dyn NodeStatsClient>, SourceError> {
        Err(SourceError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: "no stats API in this fixture".to_string(),
        })
    }
}

fn fixture() -> FakeSources {
    let node = NodeSnapshot {
        name: "node-1".to_string(),
        internal_ip: Some("10.0.0.11".to_string()),
        cpu_cores: 4,
        memory_bytes: 1 << 30,
        ready: true,
        ..Default::default()
    };
    let pod = PodSnapshot {
        name: "web-pod".to_string(),
        namespace: "default".to_string(),
        node_name: Some("node-1".to_string()),
        host_ip: Some("10.0.0.11".to_string()),
        container_count: 1,
        container_statuses: vec![ContainerStatusSnapshot {
            name: "nginx".to_string(),
            container_id: Some("docker://abc123".to_string()),
            state: ContainerState::Running,
            restart_count: 0,
        }],
    };

    FakeSources {
        cluster: FakeCluster {
            nodes: vec![node],
            pods: vec![pod],
            fail_nodes: false,
        },
        refuse_connect: false,
    }
}

async fn setup_app(sources: FakeSources) -> (Router, Arc<AppState>) {
    let resolver = StaticResolver::new()
        .with_target(
            "cluster-1",
            "10.0.0.1",
            &[("master_ip", "10.0.0.1"), ("api_port", "8080")],
        )
        .with_target(
            "node-1",
            "10.0.0.11",
            &[
                ("master_ip", "10.0.0.1"),
                ("api_port", "8080"),
                ("node_ip", "10.0.0.11"),
                ("node_name", "node-1"),
                ("cadvisor_port", "4194"),
            ],
        );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::RESOLVER).await;
    health_registry.register(components::SCRAPER).await;

    let state = Arc::new(AppState::new(
        MetricAssembler::new(Arc::new(resolver), Arc::new(sources)),
        health_registry,
        ExporterMetrics::new(),
        StructuredLogger::new("test"),
    ));
    (create_router(state.clone()), state)
}

async fn get_request(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

const RESOURCES_URI: &str = "/api/v1/resources?master_ip=10.0.0.1&api_port=8080";

fn sample_lines(body: &str) -> Vec<&str> {
    body.lines().filter(|l| !l.starts_with('#')).collect()
}

#[tokio::test]
async fn test_scrape_requires_target() {
    for uri in ["/k8s", "/k8sn?target=", "/k8sc?other=1"] {
        let (app, _state) = setup_app(fixture()).await;
        let (status, body) = get_request(app, uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, "'target' parameter must be specified");
    }
}

#[tokio::test]
async fn test_cluster_scrape() {
    let (app, _state) = setup_app(fixture()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/k8s?target=cluster-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    assert!(text.contains("k8s_cluster_nodes_total 1\n"));
    assert!(text.contains("k8s_cluster_containers_total 1\n"));
    assert!(text.contains("k8s_cluster_cpucores_total 4\n"));
    assert!(text.contains("k8s_cluster_monitorstatus 1\n"));
    // self metrics are served on /metrics only
    assert!(!text.contains("container_exporter_"));
}

#[tokio::test]
async fn test_failed_scrape_reports_only_health() {
    let (app, state) = setup_app(fixture()).await;
    // node-1 needs the stats API, which this fixture refuses
    let (status, body) = get_request(app, "/k8sn?target=node-1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(sample_lines(&body), vec!["k8s_node_monitorstatus 0"]);

    let health = state.health_registry.health().await;
    assert_eq!(health.status, ComponentStatus::Degraded);
}

#[tokio::test]
async fn test_unknown_target_reports_unhealthy_scrape() {
    let (app, _state) = setup_app(fixture()).await;
    let (status, body) = get_request(app, "/k8sc?target=missing").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(sample_lines(&body), vec!["k8s_container_monitorstatus 0"]);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (app, _state) = setup_app(fixture()).await;
    let (status, _body) = get_request(app, "/k8sx?target=cluster-1").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resources_lists_nodes_and_pods() {
    let (app, _state) = setup_app(fixture()).await;
    let (status, body) = get_request(app, RESOURCES_URI).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let node = &json["nodes"][0];
    assert_eq!(node["ip"], "10.0.0.11");
    assert_eq!(node["pods"][0]["name"], "web-pod");
    assert_eq!(node["pods"][0]["containers"][0]["id"], "abc123");
    assert_eq!(node["pods"][0]["containers"][0]["status"], "1");
}

#[tokio::test]
async fn test_resources_error_statuses() {
    let (app, _state) = setup_app(fixture()).await;
    let (status, _) = get_request(app, "/api/v1/resources?master_ip=10.0.0.1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut sources = fixture();
    sources.cluster.fail_nodes = true;
    let (app, _state) = setup_app(sources).await;
    let (status, _) = get_request(app, RESOURCES_URI).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut sources = fixture();
    sources.refuse_connect = true;
    let (app, _state) = setup_app(sources).await;
    let (status, _) = get_request(app, RESOURCES_URI).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_healthz_includes_component_details() {
    let (app, _state) = setup_app(fixture()).await;
    let (status, body) = get_request(app, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    let health: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["resolver"].is_object());
    assert!(health["components"]["scraper"].is_object());
}

#[tokio::test]
async fn test_readyz_follows_startup_check() {
    let (app, state) = setup_app(fixture()).await;
    let (status, _) = get_request(app.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    state.health_registry.set_ready(true).await;
    let (status, body) = get_request(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    let readiness: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_metrics_endpoint_counts_scrapes() {
    let (app, _state) = setup_app(fixture()).await;
    let (status, _) = get_request(app.clone(), "/k8s?target=cluster-1").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_request(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("container_exporter_scrapes_total"));
    assert!(body.contains("container_exporter_scrape_duration_seconds_bucket"));
}

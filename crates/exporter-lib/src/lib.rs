//! Kubernetes and cAdvisor metrics exporter library
//!
//! This crate provides:
//! - Target resolution from the target catalog
//! - Kubernetes API and cAdvisor clients
//! - Label and rate derivation
//! - Metric assembly for the cluster, node and container collection kinds
//! - Prometheus exposition, cluster inventory, health and self-observability

pub mod assembler;
pub mod derive;
pub mod error;
pub mod health;
pub mod inventory;
pub mod metrics;
pub mod models;
pub mod observability;
pub mod resolver;
pub mod sink;
pub mod sources;

pub use assembler::{CollectionKind, MetricAssembler, Scrape};
pub use error::{ExporterError, ResolveError, SinkError, SourceError, UpstreamCall};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use inventory::{cluster_inventory, Inventory, InventoryError};
pub use metrics::{LabelSet, MetricDesc, MetricTuple, ValueKind};
pub use models::*;
pub use observability::{ExporterMetrics, StructuredLogger};
pub use resolver::{CatalogResolver, ConfigResolver, StaticResolver};
pub use sink::{render, PrometheusSink};
pub use sources::{Endpoint, HttpSettings, HttpSources, SourceFactory};

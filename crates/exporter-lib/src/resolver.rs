//! Target id → connection parameter lookup
//!
//! The catalog is read on every resolution so that each scrape sees the
//! current record and nothing is cached between requests.

use crate::error::ResolveError;
use crate::models::ConnectionParams;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Resolves an opaque target id into connection parameters
#[async_trait]
pub trait ConfigResolver: Send + Sync {
    async fn resolve(&self, target: &str) -> Result<ConnectionParams, ResolveError>;

    /// Verify the backing store can be read
    async fn check(&self) -> Result<(), ResolveError>;
}

/// One record of the target catalog
#[derive(Debug, Deserialize)]
struct CatalogRecord {
    #[serde(default)]
    ip: String,
    #[serde(default)]
    monitor_info: HashMap<String, serde_json::Value>,
}

impl CatalogRecord {
    fn into_params(self, target: &str) -> ConnectionParams {
        let fields = self
            .monitor_info
            .into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((key, value))
            })
            .collect();

        ConnectionParams::new(target, self.ip, fields)
    }
}

/// Resolver backed by a JSON catalog file
///
/// ```json
/// {"<target-id>": {"ip": "10.0.0.11", "monitor_info": {"master_ip": "10.0.0.1", "api_port": "8080"}}}
/// ```
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    path: PathBuf,
}

impl CatalogResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, CatalogRecord>, ResolveError> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|source| ResolveError::Store {
                path: self.path.clone(),
                source,
            })?;

        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl ConfigResolver for CatalogResolver {
    async fn resolve(&self, target: &str) -> Result<ConnectionParams, ResolveError> {
        let mut catalog = self.load().await?;
        let record = catalog
            .remove(target)
            .ok_or_else(|| ResolveError::UnknownTarget(target.to_string()))?;

        Ok(record.into_params(target))
    }

    async fn check(&self) -> Result<(), ResolveError> {
        let catalog = self.load().await?;
        debug!(path = %self.path.display(), targets = catalog.len(), "Target catalog readable");
        Ok(())
    }
}

/// Resolver over a fixed in-memory set of targets
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    targets: HashMap<String, ConnectionParams>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target whose parameters are the given key/value pairs
    pub fn with_target(mut self, target: &str, address: &str, fields: &[(&str, &str)]) -> Self {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.targets.insert(
            target.to_string(),
            ConnectionParams::new(target, address, fields),
        );
        self
    }
}

#[async_trait]
impl ConfigResolver for StaticResolver {
    async fn resolve(&self, target: &str) -> Result<ConnectionParams, ResolveError> {
        self.targets
            .get(target)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownTarget(target.to_string()))
    }

    async fn check(&self) -> Result<(), ResolveError> {
        Ok(())
    }
}

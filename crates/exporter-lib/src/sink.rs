//! Prometheus exposition of a scrape's tuples
//!
//! Each request gets its own registry so nothing emitted for one target
//! leaks into the next response.

use crate::error::SinkError;
use crate::metrics::{MetricTuple, ValueKind};
use prometheus::proto::MetricFamily;
use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;

enum Family {
    Gauge(GaugeVec),
    Counter(CounterVec),
}

struct Registered {
    labels: Vec<String>,
    family: Family,
}

/// Request-scoped metric registry
pub struct PrometheusSink {
    registry: Registry,
    families: HashMap<&'static str, Registered>,
}

impl Default for PrometheusSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PrometheusSink {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            families: HashMap::new(),
        }
    }

    fn family(&mut self, tuple: &MetricTuple) -> Result<&Registered, SinkError> {
        let name = tuple.name();
        let label_names = tuple.label_names();

        if !self.families.contains_key(name) {
            let opts = Opts::new(name, tuple.help());
            let family = match tuple.kind() {
                ValueKind::Gauge => {
                    let vec = GaugeVec::new(opts, &label_names)?;
                    self.registry.register(Box::new(vec.clone()))?;
                    Family::Gauge(vec)
                }
                ValueKind::Counter => {
                    let vec = CounterVec::new(opts, &label_names)?;
                    self.registry.register(Box::new(vec.clone()))?;
                    Family::Counter(vec)
                }
            };
            let labels = label_names.iter().map(|s| s.to_string()).collect();
            self.families.insert(name, Registered { labels, family });
        }

        let registered = &self.families[name];
        if registered.labels != label_names {
            return Err(SinkError::LabelMismatch {
                name: name.to_string(),
                declared: registered.labels.clone(),
                emitted: label_names.iter().map(|s| s.to_string()).collect(),
            });
        }
        Ok(registered)
    }

    /// Record one tuple
    pub fn emit(&mut self, tuple: &MetricTuple) -> Result<(), SinkError> {
        let value = tuple.value();
        if !value.is_finite() {
            return Err(SinkError::NonFinite {
                name: tuple.name().to_string(),
                value,
            });
        }
        if tuple.kind() == ValueKind::Counter && value < 0.0 {
            return Err(SinkError::NegativeCounter {
                name: tuple.name().to_string(),
                value,
            });
        }

        let label_values = tuple.label_values();
        match &self.family(tuple)?.family {
            Family::Gauge(vec) => vec.get_metric_with_label_values(&label_values)?.set(value),
            Family::Counter(vec) => vec
                .get_metric_with_label_values(&label_values)?
                .inc_by(value),
        }
        Ok(())
    }

    pub fn emit_all<'a>(
        &mut self,
        tuples: impl IntoIterator<Item = &'a MetricTuple>,
    ) -> Result<(), SinkError> {
        for tuple in tuples {
            self.emit(tuple)?;
        }
        Ok(())
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Text exposition of everything emitted so far
    pub fn encode(&self) -> Result<Vec<u8>, SinkError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

/// Render a full scrape in the text exposition format
pub fn render(tuples: &[MetricTuple]) -> Result<Vec<u8>, SinkError> {
    let mut sink = PrometheusSink::new();
    sink.emit_all(tuples)?;
    sink.encode()
}

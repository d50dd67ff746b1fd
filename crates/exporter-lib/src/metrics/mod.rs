//! Metric descriptors and the tuples emitted per scrape
//!
//! Descriptors are process-wide statics (see [`descriptors`]). A scrape
//! only builds [`MetricTuple`] values that point at a descriptor and carry
//! their own label pairs, so label names and values always line up.

pub mod descriptors;

use crate::derive::DerivedLabels;

/// Exposition type of a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Gauge,
    Counter,
}

/// Immutable description of one metric family
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: ValueKind,
    /// Labels appended after the per-request base labels
    pub extra_labels: &'static [&'static str],
}

impl MetricDesc {
    pub const fn gauge(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            kind: ValueKind::Gauge,
            extra_labels: &[],
        }
    }

    pub const fn counter(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            kind: ValueKind::Counter,
            extra_labels: &[],
        }
    }

    pub const fn with_extra_labels(self, extra_labels: &'static [&'static str]) -> Self {
        Self {
            name: self.name,
            help: self.help,
            kind: self.kind,
            extra_labels,
        }
    }
}

/// Ordered label pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet(Vec<(String, String)>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Append derived labels in their own order
    pub fn extend_derived(&mut self, derived: &DerivedLabels) {
        for (name, value) in derived.iter() {
            self.push(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(label, _)| label == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn values(&self) -> Vec<&str> {
        self.0.iter().map(|(_, value)| value.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One emitted sample: descriptor, labels and value
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTuple {
    desc: &'static MetricDesc,
    labels: LabelSet,
    value: f64,
}

impl MetricTuple {
    /// Sample of a descriptor without extra labels
    pub fn new(desc: &'static MetricDesc, base: &LabelSet, value: f64) -> Self {
        Self::with_extra(desc, base, &[], value)
    }

    /// Sample of a descriptor, pairing `extra_values` with its extra labels
    pub fn with_extra(
        desc: &'static MetricDesc,
        base: &LabelSet,
        extra_values: &[String],
        value: f64,
    ) -> Self {
        debug_assert_eq!(
            desc.extra_labels.len(),
            extra_values.len(),
            "extra label arity for {}",
            desc.name
        );

        let mut labels = base.clone();
        for (name, value) in desc.extra_labels.iter().zip(extra_values) {
            labels.push(*name, value.as_str());
        }

        Self {
            desc,
            labels,
            value,
        }
    }

    pub fn desc(&self) -> &'static MetricDesc {
        self.desc
    }

    pub fn name(&self) -> &'static str {
        self.desc.name
    }

    pub fn help(&self) -> &'static str {
        self.desc.help
    }

    pub fn kind(&self) -> ValueKind {
        self.desc.kind
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn label_names(&self) -> Vec<&str> {
        self.labels.names()
    }

    pub fn label_values(&self) -> Vec<&str> {
        self.labels.values()
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static WITH_DEVICE: MetricDesc =
        MetricDesc::gauge("test_fs_bytes", "test").with_extra_labels(&["device"]);
    static PLAIN: MetricDesc = MetricDesc::counter("test_total", "test");

    #[test]
    fn test_tuple_appends_extra_labels_after_base() {
        let base = LabelSet::new().with("ip", "10.0.0.1").with("nodelabel", "a");
        let tuple = MetricTuple::with_extra(&WITH_DEVICE, &base, &["/dev/sda1".to_string()], 5.0);

        assert_eq!(tuple.label_names(), vec!["ip", "nodelabel", "device"]);
        assert_eq!(tuple.label_values(), vec!["10.0.0.1", "a", "/dev/sda1"]);
        assert_eq!(tuple.kind(), ValueKind::Gauge);
    }

    #[test]
    fn test_tuple_without_labels() {
        let tuple = MetricTuple::new(&PLAIN, &LabelSet::new(), 1.0);

        assert!(tuple.label_names().is_empty());
        assert!(tuple.label_values().is_empty());
        assert_eq!(tuple.kind(), ValueKind::Counter);
        assert_eq!(tuple.name(), "test_total");
    }

    #[test]
    fn test_label_set_extends_with_derived_labels() {
        let mut labels = LabelSet::new().with("id", "abc");
        labels.extend_derived(&crate::derive::derive_labels("k8s_app_pod_ns_uid_0"));

        assert_eq!(labels.len(), 4);
        assert_eq!(labels.get("kubernetes_namespace"), Some("ns"));
    }
}

//! Kubernetes labels from docker container names
//!
//! The kubelet names docker containers
//! `k8s_<container>[.<hash>]_<pod>_<namespace>_<uid>_<attempt>`; the
//! capture groups of [`CONTAINER_NAME_PATTERN`] become label names.

use regex::Regex;
use std::sync::OnceLock;

pub const CONTAINER_NAME_LABEL: &str = "kubernetes_container_name";
pub const POD_NAME_LABEL: &str = "kubernetes_pod_name";
pub const NAMESPACE_LABEL: &str = "kubernetes_namespace";

pub const CONTAINER_NAME_PATTERN: &str = r"^k8s_(?P<kubernetes_container_name>[^_\.]+)[^_]*_(?P<kubernetes_pod_name>[^_]+)_(?P<kubernetes_namespace>[^_]+)";

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(CONTAINER_NAME_PATTERN).expect("container name pattern must compile")
    })
}

/// Labels derived from a container name, in capture-group order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedLabels(Vec<(String, String)>);

impl DerivedLabels {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(label, _)| label == name)
            .map(|(_, value)| value.as_str())
    }

    /// Logical container name inside the pod
    pub fn container_name(&self) -> Option<&str> {
        self.get(CONTAINER_NAME_LABEL)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Derive labels from a container display name.
///
/// Returns an empty set when the name does not follow the kubelet
/// convention; capture groups that did not participate are left out.
pub fn derive_labels(name: &str) -> DerivedLabels {
    let re = pattern();
    let Some(captures) = re.captures(name) else {
        return DerivedLabels::default();
    };

    let labels = re
        .capture_names()
        .flatten()
        .filter_map(|group| {
            captures
                .name(group)
                .map(|m| (group.to_string(), m.as_str().to_string()))
        })
        .collect();

    DerivedLabels(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_labels_from_kubelet_name() {
        let labels = derive_labels("k8s_nginx.1_web-pod_default_abcdef");

        assert_eq!(labels.container_name(), Some("nginx"));
        assert_eq!(labels.get(POD_NAME_LABEL), Some("web-pod"));
        assert_eq!(labels.get(NAMESPACE_LABEL), Some("default"));
        assert_eq!(labels.len(), 3);
    }

    #[test]
    fn test_derive_labels_without_hash_suffix() {
        let labels =
            derive_labels("k8s_POD_coredns-5d78c9869d-abcde_kube-system_0f1e2d3c_0");

        assert_eq!(labels.container_name(), Some("POD"));
        assert_eq!(labels.get(POD_NAME_LABEL), Some("coredns-5d78c9869d-abcde"));
        assert_eq!(labels.get(NAMESPACE_LABEL), Some("kube-system"));
    }

    #[test]
    fn test_derive_labels_keeps_capture_order() {
        let labels = derive_labels("k8s_app_pod_ns_uid_0");
        let names: Vec<&str> = labels.iter().map(|(k, _)| k).collect();

        assert_eq!(names, vec![CONTAINER_NAME_LABEL, POD_NAME_LABEL, NAMESPACE_LABEL]);
    }

    #[test]
    fn test_derive_labels_non_matching_names() {
        for name in [
            "",
            "nginx",
            "/docker/0123456789abcdef",
            "k8s_only-two_segments",
            "prefix_k8s_nginx_pod_ns",
        ] {
            assert!(derive_labels(name).is_empty(), "expected no labels for {name:?}");
        }
    }

    #[test]
    fn test_derive_labels_is_deterministic() {
        let name = "k8s_redis.7c1a_cache-0_data_1234_2";
        assert_eq!(derive_labels(name), derive_labels(name));
    }
}

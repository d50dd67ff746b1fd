//! Pure derivations used by the assembler
//!
//! - container name → Kubernetes labels
//! - counter samples → per-second rates
//! - resource quantity strings → numbers

mod labels;
mod quantity;
mod rate;

pub use labels::{
    derive_labels, DerivedLabels, CONTAINER_NAME_LABEL, CONTAINER_NAME_PATTERN, NAMESPACE_LABEL,
    POD_NAME_LABEL,
};
pub use quantity::{parse_quantity, quantity_value, QuantityError};
pub use rate::{cpu_usage_percent, latest_pair, per_second, window_cpu_usage_percent, RateSkip};

//! Per-second rates from consecutive counter samples
//!
//! Every degenerate input maps to a [`RateSkip`] so callers omit the
//! metric instead of emitting NaN or infinity.

use crate::models::StatsSample;
use chrono::{DateTime, Utc};
use thiserror::Error;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Why a rate could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RateSkip {
    #[error("need at least two samples, have {0}")]
    InsufficientSamples(usize),

    #[error("samples do not advance in time")]
    NonPositiveInterval,

    #[error("counter decreased between samples")]
    CounterReset,

    #[error("capacity is zero")]
    NoCapacity,
}

/// The two freshest samples of an oldest-first window
pub fn latest_pair(window: &[StatsSample]) -> Result<(&StatsSample, &StatsSample), RateSkip> {
    match window {
        [.., older, newer] => Ok((older, newer)),
        _ => Err(RateSkip::InsufficientSamples(window.len())),
    }
}

/// Increase of a cumulative counter per second of wall time
pub fn per_second(
    older: (DateTime<Utc>, u64),
    newer: (DateTime<Utc>, u64),
) -> Result<f64, RateSkip> {
    let interval = (newer.0 - older.0)
        .to_std()
        .map_err(|_| RateSkip::NonPositiveInterval)?
        .as_secs_f64();
    if interval <= 0.0 {
        return Err(RateSkip::NonPositiveInterval);
    }

    let delta = newer.1.checked_sub(older.1).ok_or(RateSkip::CounterReset)?;
    Ok(delta as f64 / interval)
}

/// CPU usage between two samples as a percentage of `cores` cores
pub fn cpu_usage_percent(
    older: &StatsSample,
    newer: &StatsSample,
    cores: u64,
) -> Result<f64, RateSkip> {
    if cores == 0 {
        return Err(RateSkip::NoCapacity);
    }

    let busy_ns_per_sec = per_second(
        (older.timestamp, older.cpu_total_ns),
        (newer.timestamp, newer.cpu_total_ns),
    )?;

    Ok(busy_ns_per_sec / NANOS_PER_SECOND * 100.0 / cores as f64)
}

/// CPU usage over the two freshest samples of a stats window
pub fn window_cpu_usage_percent(window: &[StatsSample], cores: u64) -> Result<f64, RateSkip> {
    let (older, newer) = latest_pair(window)?;
    cpu_usage_percent(older, newer, cores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample(offset_ms: i64, cpu_total_ns: u64) -> StatsSample {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        StatsSample {
            timestamp: base + Duration::milliseconds(offset_ms),
            cpu_total_ns,
            cpu_per_cpu_ns: Vec::new(),
            memory_usage_bytes: 0,
            filesystems: Vec::new(),
        }
    }

    #[test]
    fn test_window_needs_two_samples() {
        assert_eq!(
            window_cpu_usage_percent(&[], 4),
            Err(RateSkip::InsufficientSamples(0))
        );
        assert_eq!(
            window_cpu_usage_percent(&[sample(0, 10)], 4),
            Err(RateSkip::InsufficientSamples(1))
        );
    }

    #[test]
    fn test_identical_timestamps_are_skipped() {
        let window = [sample(0, 100), sample(0, 200)];
        assert_eq!(
            window_cpu_usage_percent(&window, 4),
            Err(RateSkip::NonPositiveInterval)
        );
    }

    #[test]
    fn test_reversed_timestamps_are_skipped() {
        let window = [sample(1000, 100), sample(0, 200)];
        assert_eq!(
            window_cpu_usage_percent(&window, 4),
            Err(RateSkip::NonPositiveInterval)
        );
    }

    #[test]
    fn test_counter_reset_is_skipped() {
        let window = [sample(0, 5_000), sample(1000, 1_000)];
        assert_eq!(
            window_cpu_usage_percent(&window, 4),
            Err(RateSkip::CounterReset)
        );
    }

    #[test]
    fn test_zero_cores_is_skipped() {
        let window = [sample(0, 0), sample(1000, 1_000_000_000)];
        assert_eq!(window_cpu_usage_percent(&window, 0), Err(RateSkip::NoCapacity));
    }

    #[test]
    fn test_cpu_usage_percent_of_capacity() {
        // 2 busy cores over one second on a 4 core node
        let window = [sample(0, 0), sample(1000, 2_000_000_000)];
        let usage = window_cpu_usage_percent(&window, 4).unwrap();
        assert!((usage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_cpu_usage_keeps_fractional_percent() {
        // 0.03 busy cores over one second on a single core node
        let window = [sample(0, 1_000), sample(1000, 30_001_000)];
        let usage = window_cpu_usage_percent(&window, 1).unwrap();
        assert!((usage - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_only_freshest_pair_is_used() {
        let window = [
            sample(0, 0),
            sample(1000, 4_000_000_000),
            sample(2000, 4_500_000_000),
        ];
        let usage = window_cpu_usage_percent(&window, 1).unwrap();
        assert!((usage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_per_second_rate() {
        let older = sample(0, 0);
        let newer = sample(2000, 0);
        let rate = per_second((older.timestamp, 100), (newer.timestamp, 300)).unwrap();
        assert!((rate - 100.0).abs() < 1e-9);
    }
}

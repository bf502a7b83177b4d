//! Percentile rankings against a reference population
//!
//! Each of four conversation-level statistics is placed on a fixed,
//! hand-calibrated reference curve ("where does this value fall among
//! typical conversations"). The curves are heuristics, so every ranking is
//! flagged as an estimate.

use serde::Serialize;

use crate::types::QuantitativeAnalysis;

const MINUTE_MS: f64 = 60_000.0;
const HOUR_MS: f64 = 60.0 * MINUTE_MS;
const DAY_MS: f64 = 24.0 * HOUR_MS;

/// Percentile used for response time when there is no response data.
pub const NEUTRAL_PERCENTILE: u8 = 50;

/// Reference CDF for total message count: (messages, percentile).
const MESSAGE_VOLUME_CURVE: &[(f64, f64)] = &[
    (0.0, 0.0),
    (50.0, 8.0),
    (200.0, 20.0),
    (500.0, 35.0),
    (1_000.0, 48.0),
    (2_500.0, 60.0),
    (5_000.0, 70.0),
    (10_000.0, 80.0),
    (25_000.0, 90.0),
    (50_000.0, 95.0),
    (100_000.0, 99.0),
];

/// Reference CDF for average median response time: (ms, share of
/// conversations that are at least this fast). Inverted when ranking.
const RESPONSE_TIME_CURVE: &[(f64, f64)] = &[
    (0.0, 0.0),
    (30_000.0, 10.0),
    (MINUTE_MS, 20.0),
    (5.0 * MINUTE_MS, 40.0),
    (15.0 * MINUTE_MS, 55.0),
    (HOUR_MS, 70.0),
    (3.0 * HOUR_MS, 82.0),
    (12.0 * HOUR_MS, 92.0),
    (DAY_MS, 96.0),
    (3.0 * DAY_MS, 99.0),
];

/// Reference CDF for the longest silence: (ms, percentile).
const GHOST_CURVE: &[(f64, f64)] = &[
    (0.0, 0.0),
    (HOUR_MS, 5.0),
    (6.0 * HOUR_MS, 15.0),
    (DAY_MS, 35.0),
    (3.0 * DAY_MS, 55.0),
    (7.0 * DAY_MS, 75.0),
    (14.0 * DAY_MS, 85.0),
    (30.0 * DAY_MS, 93.0),
    (90.0 * DAY_MS, 98.0),
    (365.0 * DAY_MS, 100.0),
];

/// Reference CDF for initiation imbalance in [0, 1]: (imbalance, percentile).
const ASYMMETRY_CURVE: &[(f64, f64)] = &[
    (0.0, 5.0),
    (0.1, 25.0),
    (0.2, 40.0),
    (0.3, 52.0),
    (0.4, 62.0),
    (0.5, 70.0),
    (0.6, 77.0),
    (0.8, 88.0),
    (1.0, 97.0),
];

/// Ranked statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMetric {
    MessageVolume,
    ResponseTime,
    GhostFrequency,
    Asymmetry,
}

impl RankingMetric {
    /// All metrics in output order.
    pub const ALL: [RankingMetric; 4] = [
        RankingMetric::MessageVolume,
        RankingMetric::ResponseTime,
        RankingMetric::GhostFrequency,
        RankingMetric::Asymmetry,
    ];

    /// Stable identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            RankingMetric::MessageVolume => "message_volume",
            RankingMetric::ResponseTime => "response_time",
            RankingMetric::GhostFrequency => "ghost_frequency",
            RankingMetric::Asymmetry => "asymmetry",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            RankingMetric::MessageVolume => "Message volume",
            RankingMetric::ResponseTime => "Response speed",
            RankingMetric::GhostFrequency => "Ghosting",
            RankingMetric::Asymmetry => "Initiation imbalance",
        }
    }

    /// Display emoji.
    pub fn emoji(&self) -> &'static str {
        match self {
            RankingMetric::MessageVolume => "💬",
            RankingMetric::ResponseTime => "⚡",
            RankingMetric::GhostFrequency => "👻",
            RankingMetric::Asymmetry => "⚖️",
        }
    }
}

/// One ranked statistic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub metric: RankingMetric,
    pub label: &'static str,
    /// Raw value the percentile was computed from
    pub value: f64,
    /// 0-100
    pub percentile: u8,
    pub emoji: &'static str,
    /// Always true: the reference curves are heuristic
    pub is_estimated: bool,
}

/// The four rankings, in [`RankingMetric::ALL`] order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingPercentiles {
    pub rankings: Vec<Ranking>,
}

/// Rank a conversation against the reference curves.
///
/// Pure and total: absent timing data yields raw value 0, and a response
/// time of 0 maps to [`NEUTRAL_PERCENTILE`].
pub fn compute_ranking_percentiles(quant: &QuantitativeAnalysis) -> RankingPercentiles {
    let rankings = RankingMetric::ALL
        .iter()
        .map(|metric| {
            let value = raw_value(*metric, quant);
            Ranking {
                metric: *metric,
                label: metric.label(),
                value,
                percentile: percentile_for(*metric, value),
                emoji: metric.emoji(),
                is_estimated: true,
            }
        })
        .collect();

    RankingPercentiles { rankings }
}

/// Raw scalar for a metric.
pub fn raw_value(metric: RankingMetric, quant: &QuantitativeAnalysis) -> f64 {
    match metric {
        RankingMetric::MessageVolume => quant.total_messages() as f64,
        RankingMetric::ResponseTime => {
            let medians: Vec<f64> = quant
                .timing
                .as_ref()
                .map(|t| t.per_person.values().map(|p| p.median_response_time_ms).collect())
                .unwrap_or_default();
            mean(&medians)
        }
        RankingMetric::GhostFrequency => quant
            .timing
            .as_ref()
            .and_then(|t| t.longest_silence.as_ref())
            .map(|s| s.duration_ms.max(0) as f64)
            .unwrap_or(0.0),
        RankingMetric::Asymmetry => {
            let counts: Vec<u64> = quant
                .timing
                .as_ref()
                .map(|t| t.conversation_initiations.values().copied().collect())
                .unwrap_or_default();
            initiation_imbalance(&counts)
        }
    }
}

/// Map a raw value to its percentile.
pub fn percentile_for(metric: RankingMetric, value: f64) -> u8 {
    let percentile = match metric {
        RankingMetric::MessageVolume => interpolate(MESSAGE_VOLUME_CURVE, value),
        RankingMetric::ResponseTime => {
            if value <= 0.0 {
                return NEUTRAL_PERCENTILE;
            }
            100.0 - interpolate(RESPONSE_TIME_CURVE, value)
        }
        RankingMetric::GhostFrequency => interpolate(GHOST_CURVE, value),
        RankingMetric::Asymmetry => interpolate(ASYMMETRY_CURVE, value),
    };
    percentile.round().clamp(0.0, 100.0) as u8
}

/// (max - min) / total initiations; 0 without initiations or with one
/// participant. For two people this is |a - b| / (a + b).
fn initiation_imbalance(counts: &[u64]) -> f64 {
    let total: u64 = counts.iter().sum();
    if counts.len() < 2 || total == 0 {
        return 0.0;
    }
    let max = counts.iter().copied().max().unwrap_or(0);
    let min = counts.iter().copied().min().unwrap_or(0);
    (max - min) as f64 / total as f64
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Piecewise-linear lookup, clamped to the curve's end points.
///
/// Curves have strictly increasing x and non-decreasing y, so the result is
/// monotonic in `value`.
fn interpolate(curve: &[(f64, f64)], value: f64) -> f64 {
    let (first, last) = match (curve.first(), curve.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return 0.0,
    };
    if value.is_nan() || value <= first.0 {
        return first.1;
    }
    if value >= last.0 {
        return last.1;
    }
    for pair in curve.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        if value <= x1 {
            return y0 + (value - x0) / (x1 - x0) * (y1 - y0);
        }
    }
    last.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LongestSilence, PersonMetrics, PersonTiming, TimingMetrics};
    use std::collections::BTreeMap;

    fn quant(
        messages: [u64; 2],
        response_ms: [f64; 2],
        silence_ms: i64,
        inits: [u64; 2],
    ) -> QuantitativeAnalysis {
        let names = ["Alice", "Bob"];
        let mut per_person = BTreeMap::new();
        let mut timing = TimingMetrics::default();
        for i in 0..2 {
            per_person.insert(
                names[i].to_string(),
                PersonMetrics {
                    total_messages: messages[i],
                    ..Default::default()
                },
            );
            timing.per_person.insert(
                names[i].to_string(),
                PersonTiming {
                    median_response_time_ms: response_ms[i],
                    response_count: 1,
                },
            );
            timing
                .conversation_initiations
                .insert(names[i].to_string(), inits[i]);
        }
        timing.longest_silence = Some(LongestSilence {
            duration_ms: silence_ms,
            last_sender: "Alice".to_string(),
            start_timestamp: 0,
        });
        QuantitativeAnalysis {
            version: Some(2),
            per_person,
            timing: Some(timing),
            patterns: None,
            engagement: None,
        }
    }

    fn percentile(q: &QuantitativeAnalysis, metric: RankingMetric) -> u8 {
        compute_ranking_percentiles(q)
            .rankings
            .iter()
            .find(|r| r.metric == metric)
            .map(|r| r.percentile)
            .unwrap()
    }

    fn volume(messages: [u64; 2]) -> u8 {
        let q = quant(messages, [0.0, 0.0], 0, [1, 1]);
        percentile(&q, RankingMetric::MessageVolume)
    }

    fn response(median_ms: f64) -> u8 {
        let q = quant([10, 10], [median_ms, median_ms], 0, [1, 1]);
        percentile(&q, RankingMetric::ResponseTime)
    }

    fn ghost(silence_ms: i64) -> u8 {
        let q = quant([1, 1], [0.0, 0.0], silence_ms, [1, 1]);
        percentile(&q, RankingMetric::GhostFrequency)
    }

    fn asymmetry(inits: [u64; 2]) -> u8 {
        let q = quant([1, 1], [0.0, 0.0], 0, inits);
        percentile(&q, RankingMetric::Asymmetry)
    }

    #[test]
    fn test_structure_and_order() {
        let q = quant([10, 10], [1000.0, 1000.0], 1000, [1, 1]);
        let result = compute_ranking_percentiles(&q);
        let ids: Vec<&str> = result.rankings.iter().map(|r| r.metric.as_str()).collect();
        assert_eq!(
            ids,
            vec!["message_volume", "response_time", "ghost_frequency", "asymmetry"]
        );
        assert!(result.rankings.iter().all(|r| r.percentile <= 100 && r.is_estimated));
    }

    #[test]
    fn test_message_volume_monotonic() {
        assert!(volume([500, 500]) <= volume([5000, 5000]));
        assert!(volume([50, 50]) < 50);
        assert!(volume([5000, 5000]) > 70);
    }

    #[test]
    fn test_curves_are_monotonic() {
        for metric in [
            RankingMetric::MessageVolume,
            RankingMetric::GhostFrequency,
            RankingMetric::Asymmetry,
        ] {
            let mut last = 0u8;
            for step in 0..2000 {
                let value = match metric {
                    RankingMetric::MessageVolume => step as f64 * 60.0,
                    RankingMetric::GhostFrequency => step as f64 * HOUR_MS,
                    _ => step as f64 / 2000.0,
                };
                let p = percentile_for(metric, value);
                assert!(p >= last, "{} not monotonic at {}", metric.as_str(), value);
                last = p;
            }
        }
    }

    #[test]
    fn test_response_time_never_improves_when_slower() {
        let mut last = 100u8;
        // One-minute steps out to five days, past the end of the curve
        for step in 1..=7200 {
            let value = step as f64 * MINUTE_MS;
            let p = percentile_for(RankingMetric::ResponseTime, value);
            assert!(p <= last, "response_time increased at {} ms", value);
            last = p;
        }
        assert!(percentile_for(RankingMetric::ResponseTime, 1.0) >= 99);
        assert_eq!(percentile_for(RankingMetric::ResponseTime, 5.0 * DAY_MS), 1);
    }

    #[test]
    fn test_response_time_zero_is_neutral() {
        assert_eq!(response(0.0), 50);

        let no_timing = QuantitativeAnalysis::default();
        assert_eq!(percentile(&no_timing, RankingMetric::ResponseTime), 50);
    }

    #[test]
    fn test_response_time_inverted() {
        let fast = response(20_000.0);
        let slow = response(DAY_MS);
        assert!(fast > slow);
        assert!(fast > 50);
    }

    #[test]
    fn test_ghost_scaling() {
        assert!(ghost(HOUR_MS as i64) < 50);
        assert!(ghost(7 * DAY_MS as i64) > 70);
    }

    #[test]
    fn test_asymmetry() {
        assert!(asymmetry([50, 50]) < 50);
        assert!(asymmetry([90, 10]) > 70);
        assert_eq!(initiation_imbalance(&[0, 0]), 0.0);
        assert_eq!(initiation_imbalance(&[9, 1]), 0.8);
    }

    #[test]
    fn test_deterministic() {
        let q = quant([1234, 567], [42_000.0, 97_000.0], 5 * HOUR_MS as i64, [7, 3]);
        let first = compute_ranking_percentiles(&q);
        let second = compute_ranking_percentiles(&q);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_interpolate_clamps() {
        assert_eq!(interpolate(GHOST_CURVE, -5.0), 0.0);
        assert_eq!(interpolate(GHOST_CURVE, 10_000.0 * DAY_MS), 100.0);
        assert_eq!(interpolate(ASYMMETRY_CURVE, 0.05), 15.0);
        assert_eq!(interpolate(&[], 3.0), 0.0);
    }
}

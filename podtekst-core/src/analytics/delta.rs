//! Longitudinal comparison between two analyses of the same conversation
//!
//! The caller is responsible for pairing snapshots (normally by matching
//! fingerprints); this module only diffs the numbers.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::types::{ParsedConversation, QuantitativeAnalysis, DAY_MS};

/// Deltas smaller than this are reported as neutral.
pub const NEUTRAL_BAND: f64 = 0.001;

/// Direction of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

impl Direction {
    /// Classify a delta using the neutral band.
    pub fn of(delta: f64) -> Self {
        if delta.abs() < NEUTRAL_BAND {
            Direction::Neutral
        } else if delta > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Up => "↑",
            Direction::Down => "↓",
            Direction::Neutral => "→",
        }
    }
}

/// Which direction of change counts as an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    MoreIsBetter,
    LessIsBetter,
    /// Neither direction is better; never an improvement
    Neutral,
}

/// One before/after comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaMetric {
    pub label: String,
    pub previous: f64,
    pub current: f64,
    /// Exactly `current - previous`
    pub delta: f64,
    /// 0 when `previous` is 0
    pub delta_percent: f64,
    pub unit: String,
    pub direction: Direction,
    pub is_improvement: bool,
}

/// Full comparison result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaMetrics {
    pub previous_analysis_id: String,
    pub previous_created_at: i64,
    pub days_since_last_analysis: i64,
    /// Whether the set of participants differs between the two exports
    pub participants_changed: bool,
    pub metrics: Vec<DeltaMetric>,
}

/// The newer snapshot.
#[derive(Debug, Clone, Copy)]
pub struct DeltaInput<'a> {
    pub quantitative: &'a QuantitativeAnalysis,
    pub conversation: &'a ParsedConversation,
    pub created_at: i64,
}

/// The older snapshot, with its stored id.
#[derive(Debug, Clone, Copy)]
pub struct PreviousInput<'a> {
    pub id: &'a str,
    pub quantitative: &'a QuantitativeAnalysis,
    pub conversation: &'a ParsedConversation,
    pub created_at: i64,
}

/// Build a single delta metric.
pub fn build_delta_metric(
    label: &str,
    previous: f64,
    current: f64,
    unit: &str,
    polarity: Polarity,
) -> DeltaMetric {
    let delta = current - previous;
    let direction = Direction::of(delta);
    let delta_percent = if previous == 0.0 {
        0.0
    } else {
        delta / previous * 100.0
    };
    let is_improvement = matches!(
        (direction, polarity),
        (Direction::Up, Polarity::MoreIsBetter) | (Direction::Down, Polarity::LessIsBetter)
    );

    DeltaMetric {
        label: label.to_string(),
        previous,
        current,
        delta,
        delta_percent,
        unit: unit.to_string(),
        direction,
        is_improvement,
    }
}

/// Compare two snapshots.
pub fn compute_delta(current: DeltaInput<'_>, previous: PreviousInput<'_>) -> DeltaMetrics {
    let (cur, prev) = (current.quantitative, previous.quantitative);

    let metrics = vec![
        build_delta_metric(
            "Messages",
            prev.total_messages() as f64,
            cur.total_messages() as f64,
            "messages",
            Polarity::MoreIsBetter,
        ),
        build_delta_metric(
            "Words",
            prev.total_words() as f64,
            cur.total_words() as f64,
            "words",
            Polarity::MoreIsBetter,
        ),
        build_delta_metric(
            "Sessions",
            prev.total_sessions() as f64,
            cur.total_sessions() as f64,
            "sessions",
            Polarity::MoreIsBetter,
        ),
        build_delta_metric(
            "Avg response time",
            mean_response_time(prev),
            mean_response_time(cur),
            "ms",
            Polarity::LessIsBetter,
        ),
        build_delta_metric(
            "Avg message length",
            mean_message_length(prev),
            mean_message_length(cur),
            "words",
            Polarity::Neutral,
        ),
        build_delta_metric(
            "Volume trend",
            prev.volume_trend(),
            cur.volume_trend(),
            "%",
            Polarity::MoreIsBetter,
        ),
    ];

    let days = (current.created_at - previous.created_at) as f64 / DAY_MS as f64;

    DeltaMetrics {
        previous_analysis_id: previous.id.to_string(),
        previous_created_at: previous.created_at,
        days_since_last_analysis: days.round() as i64,
        participants_changed: participant_set(current.conversation)
            != participant_set(previous.conversation),
        metrics,
    }
}

/// Unweighted mean of per-person median response times, 0 when empty.
fn mean_response_time(quant: &QuantitativeAnalysis) -> f64 {
    match quant.timing.as_ref() {
        Some(timing) => mean(timing.per_person.values().map(|t| t.median_response_time_ms)),
        None => 0.0,
    }
}

/// Unweighted mean of per-person average message length, 0 when empty.
fn mean_message_length(quant: &QuantitativeAnalysis) -> f64 {
    mean(quant.per_person.values().map(|p| p.average_message_length))
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn participant_set(conversation: &ParsedConversation) -> BTreeSet<String> {
    conversation
        .participants
        .iter()
        .map(|p| p.name.trim().to_lowercase())
        .collect()
}

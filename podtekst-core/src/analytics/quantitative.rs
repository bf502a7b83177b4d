//! Quantitative aggregator
//!
//! Scans a [`ParsedConversation`] once, in timestamp order, and produces the
//! [`QuantitativeAnalysis`] snapshot that the ranking, delta and badge
//! engines consume.

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::collections::{BTreeMap, HashSet};

use crate::config::AnalysisConfig;
use crate::types::{
    EngagementMetrics, LongestSilence, Message, MessageType, ParsedConversation, PatternMetrics,
    PersonMetrics, PersonTiming, QuantitativeAnalysis, StoredAnalysis, TimingMetrics,
    QUANTITATIVE_VERSION,
};

/// Compute the quantitative snapshot for a conversation.
///
/// Every declared participant gets an entry in each per-person map, even
/// with zero messages. Messages from undeclared senders and system notices
/// are skipped.
pub fn compute_quantitative(
    conversation: &ParsedConversation,
    config: &AnalysisConfig,
) -> QuantitativeAnalysis {
    let names: HashSet<&str> = conversation
        .participants
        .iter()
        .map(|p| p.name.as_str())
        .collect();

    let mut per_person: BTreeMap<String, PersonMetrics> = BTreeMap::new();
    let mut response_samples: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    let mut late_night: BTreeMap<String, u64> = BTreeMap::new();
    let mut initiations: BTreeMap<String, u64> = BTreeMap::new();
    for participant in &conversation.participants {
        per_person.insert(participant.name.clone(), PersonMetrics::default());
        response_samples.insert(participant.name.clone(), Vec::new());
        late_night.insert(participant.name.clone(), 0);
        initiations.insert(participant.name.clone(), 0);
    }

    let mut messages: Vec<&Message> = conversation
        .messages
        .iter()
        .filter(|m| m.message_type != MessageType::System)
        .collect();
    messages.sort_by_key(|m| (m.timestamp, m.index));

    let session_gap_ms = config.session_gap_ms();
    let mut monthly: BTreeMap<i32, u64> = BTreeMap::new();
    let mut longest_silence: Option<LongestSilence> = None;
    let mut previous: Option<&Message> = None;
    let mut sessions = 0u64;
    let mut counted = 0u64;
    let mut skipped = 0usize;

    for message in messages {
        let sender = message.sender.as_str();
        if !names.contains(sender) {
            skipped += 1;
            continue;
        }
        counted += 1;

        for reaction in &message.reactions {
            if let Some(actor) = per_person.get_mut(&reaction.actor) {
                actor.reactions_given += 1;
            }
        }

        if let Some(metrics) = per_person.get_mut(sender) {
            record_message(metrics, message);
        }

        let starts_session = match previous {
            None => true,
            Some(prev) => {
                let gap = message.timestamp - prev.timestamp;
                let is_longer = longest_silence
                    .as_ref()
                    .map_or(gap > 0, |silence| gap > silence.duration_ms);
                if is_longer {
                    longest_silence = Some(LongestSilence {
                        duration_ms: gap,
                        last_sender: prev.sender.clone(),
                        start_timestamp: prev.timestamp,
                    });
                }

                if gap >= session_gap_ms {
                    true
                } else {
                    if prev.sender != message.sender {
                        if let Some(samples) = response_samples.get_mut(sender) {
                            samples.push(gap);
                        }
                    }
                    false
                }
            }
        };

        if starts_session {
            sessions += 1;
            if let Some(count) = initiations.get_mut(sender) {
                *count += 1;
            }
        }

        if let Some(dt) = DateTime::<Utc>::from_timestamp_millis(message.timestamp) {
            if config.is_late_night(dt.hour()) {
                if let Some(count) = late_night.get_mut(sender) {
                    *count += 1;
                }
            }
            *monthly.entry(month_index(&dt)).or_insert(0) += 1;
        }

        previous = Some(message);
    }

    if skipped > 0 {
        tracing::warn!(skipped, "Skipped messages from undeclared senders");
    }

    for metrics in per_person.values_mut() {
        if metrics.total_messages > 0 {
            metrics.average_message_length =
                metrics.total_words as f64 / metrics.total_messages as f64;
        }
    }

    let timing_per_person = response_samples
        .into_iter()
        .map(|(name, mut samples)| {
            let timing = PersonTiming {
                median_response_time_ms: median(&mut samples),
                response_count: samples.len() as u64,
            };
            (name, timing)
        })
        .collect();

    let (volume_trend, monthly_volume) = volume_trend(&monthly);

    tracing::debug!(
        participants = per_person.len(),
        messages = counted,
        sessions,
        "Computed quantitative analysis"
    );

    QuantitativeAnalysis {
        version: Some(QUANTITATIVE_VERSION),
        per_person,
        timing: Some(TimingMetrics {
            per_person: timing_per_person,
            longest_silence,
            late_night_messages: late_night,
            conversation_initiations: initiations,
        }),
        patterns: Some(PatternMetrics {
            volume_trend,
            monthly_volume,
        }),
        engagement: Some(EngagementMetrics {
            total_sessions: sessions,
            avg_messages_per_session: if sessions == 0 {
                0.0
            } else {
                counted as f64 / sessions as f64
            },
        }),
    }
}

/// Recompute `quant` if it predates the current schema, otherwise clone it.
pub fn ensure_current(
    quant: &QuantitativeAnalysis,
    conversation: &ParsedConversation,
    config: &AnalysisConfig,
) -> QuantitativeAnalysis {
    if quant.is_outdated() {
        tracing::info!(
            version = ?quant.version,
            target = QUANTITATIVE_VERSION,
            "Recomputing outdated quantitative snapshot"
        );
        compute_quantitative(conversation, config)
    } else {
        quant.clone()
    }
}

/// Bring a stored record's snapshot up to date in place.
///
/// Returns `true` when the snapshot was recomputed and the record should be
/// saved back.
pub fn refresh_stored(analysis: &mut StoredAnalysis, config: &AnalysisConfig) -> bool {
    if !analysis.quantitative.is_outdated() {
        return false;
    }
    tracing::info!(id = %analysis.id, "Refreshing stored analysis");
    analysis.quantitative = compute_quantitative(&analysis.conversation, config);
    true
}

fn record_message(metrics: &mut PersonMetrics, message: &Message) {
    metrics.total_messages += 1;
    metrics.reactions_received += message.reactions.len() as u64;

    if message.is_unsent || message.message_type == MessageType::Unsent {
        metrics.unsent_count += 1;
        return;
    }

    let content = message.content.as_str();
    let words = content.split_whitespace().count() as u64;
    metrics.total_words += words;
    metrics.longest_message_words = metrics.longest_message_words.max(words);
    metrics.total_characters += content.chars().count() as u64;
    metrics.emoji_count += count_emoji(content);

    if content.contains('?') {
        metrics.questions_asked += 1;
    }
    if message.has_media
        || matches!(
            message.message_type,
            MessageType::Media | MessageType::Sticker
        )
    {
        metrics.media_count += 1;
    }
    if message.has_link
        || message.message_type == MessageType::Link
        || content.contains("http://")
        || content.contains("https://")
    {
        metrics.link_count += 1;
    }
}

/// Pictographic scalar values counted as emoji.
pub fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F300..=0x1FAFF | 0x2600..=0x27BF | 0x1F1E6..=0x1F1FF | 0x1F000..=0x1F2FF
    )
}

/// Count emoji as the reader sees them.
///
/// Skin-tone modifiers and variation selectors add nothing. A zero-width
/// joiner glues the next pictograph onto the previous one. Regional
/// indicators count once per pair, since a pair renders as one flag.
pub fn count_emoji(text: &str) -> u64 {
    let mut count = 0;
    let mut joined = false;
    let mut open_flag = false;

    for c in text.chars() {
        match c as u32 {
            0x200D => {
                joined = true;
                continue;
            }
            0xFE0E | 0xFE0F | 0x1F3FB..=0x1F3FF => continue,
            0x1F1E6..=0x1F1FF => {
                if !open_flag {
                    count += 1;
                }
                open_flag = !open_flag;
                joined = false;
                continue;
            }
            _ if is_emoji(c) && !joined => count += 1,
            _ => {}
        }
        joined = false;
        open_flag = false;
    }
    count
}

/// Median of the samples (sorts in place), 0 when empty.
fn median(samples: &mut [i64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.sort_unstable();
    let mid = samples.len() / 2;
    if samples.len() % 2 == 0 {
        (samples[mid - 1] as f64 + samples[mid] as f64) / 2.0
    } else {
        samples[mid] as f64
    }
}

/// Months since year 0, in UTC.
fn month_index(dt: &DateTime<Utc>) -> i32 {
    dt.year() * 12 + dt.month0() as i32
}

fn month_key(index: i32) -> String {
    format!("{:04}-{:02}", index.div_euclid(12), index.rem_euclid(12) + 1)
}

/// Least-squares slope of monthly counts, as percent of the mean per month.
///
/// Months without messages inside the covered span count as zero.
fn volume_trend(monthly: &BTreeMap<i32, u64>) -> (f64, BTreeMap<String, u64>) {
    let (first, last) = match (monthly.keys().next(), monthly.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return (0.0, BTreeMap::new()),
    };

    let counts: Vec<u64> = (first..=last)
        .map(|m| monthly.get(&m).copied().unwrap_or(0))
        .collect();
    let keyed = (first..=last)
        .zip(counts.iter())
        .map(|(m, count)| (month_key(m), *count))
        .collect();

    if counts.len() < 2 {
        return (0.0, keyed);
    }

    let n = counts.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = counts.iter().sum::<u64>() as f64 / n;
    let (mut num, mut den) = (0.0, 0.0);
    for (x, y) in counts.iter().enumerate() {
        let dx = x as f64 - mean_x;
        num += dx * (*y as f64 - mean_y);
        den += dx * dx;
    }

    if den == 0.0 || mean_y == 0.0 {
        return (0.0, keyed);
    }
    ((num / den) / mean_y * 100.0, keyed)
}

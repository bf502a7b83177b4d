//! Winner selection shared by badges and awards.
//!
//! A rule reads one per-person [`Signal`], picks the highest or lowest
//! participant, and keeps the winner only when it clears a [`Threshold`].
//! Ties go to the participant that comes first in the conversation's
//! participant order.

use crate::format::format_duration_ms;
use crate::types::QuantitativeAnalysis;

/// Per-person value a rule is based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Messages,
    Emoji,
    LateNight,
    AverageLength,
    ResponseTime,
    Initiations,
    Questions,
    ReactionsGiven,
    Media,
    Links,
}

impl Signal {
    /// Read the signal for `name`; absent entries read as 0.
    pub fn value(&self, quant: &QuantitativeAnalysis, name: &str) -> f64 {
        let person = || quant.person(name);
        match self {
            Signal::Messages => person().total_messages as f64,
            Signal::Emoji => person().emoji_count as f64,
            Signal::LateNight => quant.late_night_messages(name) as f64,
            Signal::AverageLength => person().average_message_length,
            Signal::ResponseTime => quant.median_response_ms(name),
            Signal::Initiations => quant.initiations(name) as f64,
            Signal::Questions => person().questions_asked as f64,
            Signal::ReactionsGiven => person().reactions_given as f64,
            Signal::Media => person().media_count as f64,
            Signal::Links => person().link_count as f64,
        }
    }

    /// Human-readable evidence line for a value.
    pub fn describe(&self, value: f64) -> String {
        match self {
            Signal::Messages => format!("{} messages", value as u64),
            Signal::Emoji => format!("{} emoji", value as u64),
            Signal::LateNight => format!("{} late-night messages", value as u64),
            Signal::AverageLength => format!("{:.1} words per message", value),
            Signal::ResponseTime => format!("median reply in {}", format_duration_ms(value)),
            Signal::Initiations => format!("started {} conversations", value as u64),
            Signal::Questions => format!("{} questions asked", value as u64),
            Signal::ReactionsGiven => format!("{} reactions given", value as u64),
            Signal::Media => format!("{} photos and videos", value as u64),
            Signal::Links => format!("{} links shared", value as u64),
        }
    }
}

/// Which end of the ranking wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    Highest,
    /// Lowest among participants with a non-zero value
    Lowest,
}

/// Minimum signal strength for the winner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// value > x
    Above(f64),
    /// value < x
    Below(f64),
}

impl Threshold {
    pub fn passes(&self, value: f64) -> bool {
        match *self {
            Threshold::Above(x) => value > x,
            Threshold::Below(x) => value < x,
        }
    }
}

/// Pick a single winner, or `None` when nobody qualifies.
pub fn select_winner(
    quant: &QuantitativeAnalysis,
    participants: &[&str],
    signal: Signal,
    pick: Pick,
    threshold: Threshold,
) -> Option<(String, f64)> {
    let mut best: Option<(&str, f64)> = None;

    for &name in participants {
        let value = signal.value(quant, name);
        if pick == Pick::Lowest && value <= 0.0 {
            continue;
        }
        let better = match best {
            None => true,
            // Strict comparison keeps the earliest participant on ties
            Some((_, current)) => match pick {
                Pick::Highest => value > current,
                Pick::Lowest => value < current,
            },
        };
        if better {
            best = Some((name, value));
        }
    }

    best.filter(|(_, value)| threshold.passes(*value))
        .map(|(name, value)| (name.to_string(), value))
}

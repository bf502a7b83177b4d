//! Achievement badges
//!
//! Assigns fun per-person badges from threshold-gated metrics. Each badge
//! has at most one holder; a badge whose best candidate is below its
//! threshold is left out.

use serde::Serialize;

use super::selection::{select_winner, Pick, Signal, Threshold};
use crate::types::{ParsedConversation, QuantitativeAnalysis};

/// Badge archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeKind {
    /// Sent the most messages
    Chatterbox,
    /// Most messages late at night
    NightOwl,
    /// Most emoji
    EmojiMonarch,
    /// Longest messages on average
    Novelist,
    /// Fastest median reply
    SpeedDemon,
    /// Starts most conversations
    ConversationStarter,
    /// Asks the most questions
    CuriousMind,
    /// Reacts the most
    ReactionMachine,
    /// Shares the most media
    Paparazzi,
    /// Shares the most links
    LinkDropper,
}

impl BadgeKind {
    /// All badges, in output order.
    pub const ALL: [BadgeKind; 10] = [
        BadgeKind::Chatterbox,
        BadgeKind::NightOwl,
        BadgeKind::EmojiMonarch,
        BadgeKind::Novelist,
        BadgeKind::SpeedDemon,
        BadgeKind::ConversationStarter,
        BadgeKind::CuriousMind,
        BadgeKind::ReactionMachine,
        BadgeKind::Paparazzi,
        BadgeKind::LinkDropper,
    ];

    /// Get the display name for this badge.
    pub fn name(&self) -> &'static str {
        match self {
            BadgeKind::Chatterbox => "Chatterbox",
            BadgeKind::NightOwl => "Night Owl",
            BadgeKind::EmojiMonarch => "Emoji Monarch",
            BadgeKind::Novelist => "Novelist",
            BadgeKind::SpeedDemon => "Speed Demon",
            BadgeKind::ConversationStarter => "Conversation Starter",
            BadgeKind::CuriousMind => "Curious Mind",
            BadgeKind::ReactionMachine => "Reaction Machine",
            BadgeKind::Paparazzi => "Paparazzi",
            BadgeKind::LinkDropper => "Link Dropper",
        }
    }

    /// Get the description for this badge.
    pub fn description(&self) -> &'static str {
        match self {
            BadgeKind::Chatterbox => "Never runs out of things to say",
            BadgeKind::NightOwl => "Does their best talking after 10pm",
            BadgeKind::EmojiMonarch => "Speaks fluent emoji",
            BadgeKind::Novelist => "Every message is a chapter",
            BadgeKind::SpeedDemon => "Replies before you put the phone down",
            BadgeKind::ConversationStarter => "Always the one to break the silence",
            BadgeKind::CuriousMind => "Has a question for everything",
            BadgeKind::ReactionMachine => "Reacts to everything",
            BadgeKind::Paparazzi => "A picture is worth a thousand words",
            BadgeKind::LinkDropper => "Have you seen this?",
        }
    }

    /// Get an emoji for this badge.
    pub fn emoji(&self) -> &'static str {
        match self {
            BadgeKind::Chatterbox => "💬",
            BadgeKind::NightOwl => "🦉",
            BadgeKind::EmojiMonarch => "👑",
            BadgeKind::Novelist => "📜",
            BadgeKind::SpeedDemon => "⚡",
            BadgeKind::ConversationStarter => "🚀",
            BadgeKind::CuriousMind => "❓",
            BadgeKind::ReactionMachine => "❤️",
            BadgeKind::Paparazzi => "📸",
            BadgeKind::LinkDropper => "🔗",
        }
    }

    /// Signal, winner selection and threshold for this badge.
    pub fn rule(&self) -> (Signal, Pick, Threshold) {
        match self {
            BadgeKind::Chatterbox => (Signal::Messages, Pick::Highest, Threshold::Above(50.0)),
            BadgeKind::NightOwl => (Signal::LateNight, Pick::Highest, Threshold::Above(10.0)),
            BadgeKind::EmojiMonarch => (Signal::Emoji, Pick::Highest, Threshold::Above(20.0)),
            BadgeKind::Novelist => (Signal::AverageLength, Pick::Highest, Threshold::Above(15.0)),
            BadgeKind::SpeedDemon => {
                (Signal::ResponseTime, Pick::Lowest, Threshold::Below(60_000.0))
            }
            BadgeKind::ConversationStarter => {
                (Signal::Initiations, Pick::Highest, Threshold::Above(5.0))
            }
            BadgeKind::CuriousMind => (Signal::Questions, Pick::Highest, Threshold::Above(10.0)),
            BadgeKind::ReactionMachine => {
                (Signal::ReactionsGiven, Pick::Highest, Threshold::Above(20.0))
            }
            BadgeKind::Paparazzi => (Signal::Media, Pick::Highest, Threshold::Above(10.0)),
            BadgeKind::LinkDropper => (Signal::Links, Pick::Highest, Threshold::Above(5.0)),
        }
    }
}

/// A badge awarded to one participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    #[serde(rename = "id")]
    pub kind: BadgeKind,
    pub name: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    pub holder: String,
    /// The winning value, e.g. "42 emoji"
    pub evidence: String,
}

/// Derive badges for a conversation.
///
/// Ties go to the participant listed first in the conversation.
pub fn derive_badges(
    quant: &QuantitativeAnalysis,
    conversation: &ParsedConversation,
) -> Vec<Badge> {
    let participants = conversation.participant_names();

    BadgeKind::ALL
        .iter()
        .filter_map(|kind| {
            let (signal, pick, threshold) = kind.rule();
            let (holder, value) = select_winner(quant, &participants, signal, pick, threshold)?;
            Some(Badge {
                kind: *kind,
                name: kind.name(),
                emoji: kind.emoji(),
                description: kind.description(),
                holder,
                evidence: signal.describe(value),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ConversationMetadata, Participant, PersonMetrics, PersonTiming, Platform, TimingMetrics,
    };

    fn conversation(names: &[&str]) -> ParsedConversation {
        ParsedConversation {
            platform: Platform::WhatsApp,
            title: "t".to_string(),
            participants: names
                .iter()
                .map(|n| Participant {
                    name: n.to_string(),
                    platform_id: None,
                })
                .collect(),
            messages: vec![],
            metadata: ConversationMetadata::default(),
        }
    }

    fn with_emoji(alice: u64, bob: u64) -> QuantitativeAnalysis {
        let mut quant = QuantitativeAnalysis::default();
        for (name, emoji) in [("Alice", alice), ("Bob", bob)] {
            quant.per_person.insert(
                name.to_string(),
                PersonMetrics {
                    total_messages: 10,
                    emoji_count: emoji,
                    ..Default::default()
                },
            );
        }
        quant
    }

    fn holder(badges: &[Badge], kind: BadgeKind) -> Option<&str> {
        badges.iter().find(|b| b.kind == kind).map(|b| b.holder.as_str())
    }

    #[test]
    fn test_emoji_monarch_threshold() {
        let conv = conversation(&["Alice", "Bob"]);

        let badges = derive_badges(&with_emoji(15, 3), &conv);
        assert_eq!(holder(&badges, BadgeKind::EmojiMonarch), None);

        let badges = derive_badges(&with_emoji(21, 3), &conv);
        assert_eq!(holder(&badges, BadgeKind::EmojiMonarch), Some("Alice"));
        let badge = badges.iter().find(|b| b.kind == BadgeKind::EmojiMonarch).unwrap();
        assert_eq!(badge.evidence, "21 emoji");
    }

    #[test]
    fn test_emoji_monarch_requires_maximum() {
        let conv = conversation(&["Alice", "Bob"]);
        let badges = derive_badges(&with_emoji(21, 40), &conv);
        assert_eq!(holder(&badges, BadgeKind::EmojiMonarch), Some("Bob"));
    }

    #[test]
    fn test_single_winner_on_tie() {
        let badges = derive_badges(&with_emoji(30, 30), &conversation(&["Bob", "Alice"]));
        let monarchs: Vec<_> = badges
            .iter()
            .filter(|b| b.kind == BadgeKind::EmojiMonarch)
            .collect();
        assert_eq!(monarchs.len(), 1);
        assert_eq!(monarchs[0].holder, "Bob");
    }

    #[test]
    fn test_weak_signals_produce_no_badges() {
        let badges = derive_badges(&with_emoji(0, 0), &conversation(&["Alice", "Bob"]));
        assert!(badges.is_empty());
    }

    #[test]
    fn test_speed_demon_picks_fastest_with_data() {
        let mut quant = with_emoji(0, 0);
        let mut timing = TimingMetrics::default();
        timing.per_person.insert(
            "Alice".to_string(),
            PersonTiming {
                median_response_time_ms: 45_000.0,
                response_count: 4,
            },
        );
        timing.per_person.insert(
            "Bob".to_string(),
            PersonTiming {
                median_response_time_ms: 0.0,
                response_count: 0,
            },
        );
        quant.timing = Some(timing);

        let badges = derive_badges(&quant, &conversation(&["Alice", "Bob"]));
        assert_eq!(holder(&badges, BadgeKind::SpeedDemon), Some("Alice"));
    }

    #[test]
    fn test_night_owl_threshold() {
        let mut quant = with_emoji(0, 0);
        let mut timing = TimingMetrics::default();
        timing.late_night_messages.insert("Alice".to_string(), 10);
        timing.late_night_messages.insert("Bob".to_string(), 11);
        quant.timing = Some(timing);

        let badges = derive_badges(&quant, &conversation(&["Alice", "Bob"]));
        assert_eq!(holder(&badges, BadgeKind::NightOwl), Some("Bob"));
    }

    #[test]
    fn test_badge_display() {
        assert_eq!(BadgeKind::EmojiMonarch.name(), "Emoji Monarch");
        assert_eq!(BadgeKind::NightOwl.emoji(), "🦉");
        assert_eq!(
            serde_json::to_value(BadgeKind::EmojiMonarch).unwrap(),
            serde_json::json!("emoji-monarch")
        );
    }
}

//! Group chat awards
//!
//! "Awards ceremony" for conversations with three or more participants.
//! Smaller conversations get no awards.

use serde::Serialize;

use super::selection::{select_winner, Pick, Signal, Threshold};
use crate::types::{ParsedConversation, QuantitativeAnalysis, DAY_MS};

/// Award categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AwardKind {
    MostActive,
    SlowestResponder,
    FastestFingers,
    EmojiMonarch,
    BiggestSimp,
    NightOwl,
    Novelist,
    HypeStarter,
    /// Last to speak before the longest silence
    GhostSupreme,
}

impl AwardKind {
    /// All awards, in ceremony order.
    pub const ALL: [AwardKind; 9] = [
        AwardKind::MostActive,
        AwardKind::SlowestResponder,
        AwardKind::FastestFingers,
        AwardKind::EmojiMonarch,
        AwardKind::BiggestSimp,
        AwardKind::NightOwl,
        AwardKind::Novelist,
        AwardKind::HypeStarter,
        AwardKind::GhostSupreme,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            AwardKind::MostActive => "Most Active",
            AwardKind::SlowestResponder => "Slowest Responder",
            AwardKind::FastestFingers => "Fastest Fingers",
            AwardKind::EmojiMonarch => "Emoji Monarch",
            AwardKind::BiggestSimp => "Biggest Simp",
            AwardKind::NightOwl => "Night Owl",
            AwardKind::Novelist => "The Novelist",
            AwardKind::HypeStarter => "Hype Starter",
            AwardKind::GhostSupreme => "Ghost Supreme",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AwardKind::MostActive => "Carries this group chat on their back",
            AwardKind::SlowestResponder => "Will get back to you. Eventually.",
            AwardKind::FastestFingers => "Types faster than they think",
            AwardKind::EmojiMonarch => "Rules the chat with pictograms",
            AwardKind::BiggestSimp => "Reacts to everything everyone says",
            AwardKind::NightOwl => "Sleep is optional",
            AwardKind::Novelist => "Writes essays, not messages",
            AwardKind::HypeStarter => "Brings the chat back to life",
            AwardKind::GhostSupreme => "Said something, then the whole chat went quiet",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AwardKind::MostActive => "🏆",
            AwardKind::SlowestResponder => "🐢",
            AwardKind::FastestFingers => "⚡",
            AwardKind::EmojiMonarch => "👑",
            AwardKind::BiggestSimp => "🥺",
            AwardKind::NightOwl => "🦉",
            AwardKind::Novelist => "📜",
            AwardKind::HypeStarter => "📣",
            AwardKind::GhostSupreme => "👻",
        }
    }

    /// Per-person rule; `None` for awards with bespoke selection.
    fn rule(&self) -> Option<(Signal, Pick, Threshold)> {
        match self {
            AwardKind::MostActive => Some((Signal::Messages, Pick::Highest, Threshold::Above(0.0))),
            AwardKind::SlowestResponder => {
                Some((Signal::ResponseTime, Pick::Highest, Threshold::Above(0.0)))
            }
            AwardKind::FastestFingers => {
                Some((Signal::ResponseTime, Pick::Lowest, Threshold::Above(0.0)))
            }
            AwardKind::EmojiMonarch => Some((Signal::Emoji, Pick::Highest, Threshold::Above(20.0))),
            AwardKind::BiggestSimp => {
                Some((Signal::ReactionsGiven, Pick::Highest, Threshold::Above(5.0)))
            }
            AwardKind::NightOwl => Some((Signal::LateNight, Pick::Highest, Threshold::Above(10.0))),
            AwardKind::Novelist => {
                Some((Signal::AverageLength, Pick::Highest, Threshold::Above(15.0)))
            }
            AwardKind::HypeStarter => {
                Some((Signal::Initiations, Pick::Highest, Threshold::Above(5.0)))
            }
            AwardKind::GhostSupreme => None,
        }
    }
}

/// An award given to one participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Award {
    #[serde(rename = "id")]
    pub kind: AwardKind,
    pub title: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    pub winner: String,
    /// Raw winning value
    pub value: f64,
    /// The winning value, e.g. "median reply in 3h 10m"
    pub evidence: String,
}

/// Build the awards for a group conversation.
///
/// Returns an empty list for conversations with fewer than three
/// participants.
pub fn build_awards(quant: &QuantitativeAnalysis, conversation: &ParsedConversation) -> Vec<Award> {
    if !conversation.is_group() {
        return Vec::new();
    }
    let participants = conversation.participant_names();

    AwardKind::ALL
        .iter()
        .filter_map(|kind| {
            let (winner, value, evidence) = match kind.rule() {
                Some((signal, pick, threshold)) => {
                    let (winner, value) =
                        select_winner(quant, &participants, signal, pick, threshold)?;
                    (winner, value, signal.describe(value))
                }
                None => ghost_supreme(quant, conversation)?,
            };
            Some(Award {
                kind: *kind,
                title: kind.title(),
                emoji: kind.emoji(),
                description: kind.description(),
                winner,
                value,
                evidence,
            })
        })
        .collect()
}

/// Sender of the message before the longest silence, if it lasted a day.
fn ghost_supreme(
    quant: &QuantitativeAnalysis,
    conversation: &ParsedConversation,
) -> Option<(String, f64, String)> {
    let silence = quant.timing.as_ref()?.longest_silence.as_ref()?;
    if silence.duration_ms < DAY_MS || !conversation.has_participant(&silence.last_sender) {
        return None;
    }
    let days = silence.duration_ms as f64 / DAY_MS as f64;
    Some((
        silence.last_sender.clone(),
        silence.duration_ms as f64,
        format!("{:.1} days of silence after their message", days),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ConversationMetadata, LongestSilence, Participant, PersonMetrics, PersonTiming, Platform,
        TimingMetrics,
    };

    fn conversation(names: &[&str]) -> ParsedConversation {
        ParsedConversation {
            platform: Platform::Discord,
            title: "group".to_string(),
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

    fn group_quant() -> QuantitativeAnalysis {
        let mut quant = QuantitativeAnalysis::default();
        let mut timing = TimingMetrics::default();
        let rows = [
            ("Alice", 120, 25, 2, 90_000.0),
            ("Bob", 80, 5, 9, 600_000.0),
            ("Carol", 40, 1, 0, 30_000.0),
        ];
        for (name, messages, emoji, reactions, response) in rows {
            quant.per_person.insert(
                name.to_string(),
                PersonMetrics {
                    total_messages: messages,
                    emoji_count: emoji,
                    reactions_given: reactions,
                    ..Default::default()
                },
            );
            timing.per_person.insert(
                name.to_string(),
                PersonTiming {
                    median_response_time_ms: response,
                    response_count: 10,
                },
            );
        }
        timing.longest_silence = Some(LongestSilence {
            duration_ms: 2 * DAY_MS,
            last_sender: "Carol".to_string(),
            start_timestamp: 0,
        });
        quant.timing = Some(timing);
        quant
    }

    fn winner(awards: &[Award], kind: AwardKind) -> Option<&str> {
        awards.iter().find(|a| a.kind == kind).map(|a| a.winner.as_str())
    }

    #[test]
    fn test_two_person_conversation_has_no_awards() {
        assert!(build_awards(&group_quant(), &conversation(&["Alice", "Bob"])).is_empty());
        let empty = QuantitativeAnalysis::default();
        assert!(build_awards(&empty, &conversation(&["Alice"])).is_empty());
    }

    #[test]
    fn test_exporter_group_flag_does_not_grant_awards() {
        let mut pair = conversation(&["Alice", "Bob"]);
        pair.metadata.is_group = true;
        assert!(build_awards(&group_quant(), &pair).is_empty());
    }

    #[test]
    fn test_group_awards() {
        let awards = build_awards(&group_quant(), &conversation(&["Alice", "Bob", "Carol"]));

        assert_eq!(winner(&awards, AwardKind::MostActive), Some("Alice"));
        assert_eq!(winner(&awards, AwardKind::SlowestResponder), Some("Bob"));
        assert_eq!(winner(&awards, AwardKind::FastestFingers), Some("Carol"));
        assert_eq!(winner(&awards, AwardKind::EmojiMonarch), Some("Alice"));
        assert_eq!(winner(&awards, AwardKind::BiggestSimp), Some("Bob"));
        assert_eq!(winner(&awards, AwardKind::GhostSupreme), Some("Carol"));
        // No late-night data, no initiations, no long messages
        assert_eq!(winner(&awards, AwardKind::NightOwl), None);
        assert_eq!(winner(&awards, AwardKind::HypeStarter), None);
        assert_eq!(winner(&awards, AwardKind::Novelist), None);
    }

    #[test]
    fn test_biggest_simp_threshold() {
        let mut quant = group_quant();
        if let Some(bob) = quant.per_person.get_mut("Bob") {
            bob.reactions_given = 5;
        }
        let awards = build_awards(&quant, &conversation(&["Alice", "Bob", "Carol"]));
        assert_eq!(winner(&awards, AwardKind::BiggestSimp), None);
    }

    #[test]
    fn test_ghost_supreme_requires_full_day() {
        let mut quant = group_quant();
        if let Some(timing) = quant.timing.as_mut() {
            timing.longest_silence = Some(LongestSilence {
                duration_ms: DAY_MS - 1,
                last_sender: "Carol".to_string(),
                start_timestamp: 0,
            });
        }
        let awards = build_awards(&quant, &conversation(&["Alice", "Bob", "Carol"]));
        assert_eq!(winner(&awards, AwardKind::GhostSupreme), None);
    }

    #[test]
    fn test_tie_breaks_by_participant_order() {
        let mut quant = group_quant();
        for metrics in quant.per_person.values_mut() {
            metrics.total_messages = 50;
        }
        let awards = build_awards(&quant, &conversation(&["Carol", "Bob", "Alice"]));
        let most_active: Vec<_> = awards
            .iter()
            .filter(|a| a.kind == AwardKind::MostActive)
            .collect();
        assert_eq!(most_active.len(), 1);
        assert_eq!(most_active[0].winner, "Carol");
    }
}

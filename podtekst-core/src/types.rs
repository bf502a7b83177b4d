//! Core domain types for PodTeksT
//!
//! These types describe the three entities the analytics core works with:
//!
//! | Term | Definition |
//! |------|------------|
//! | **ParsedConversation** | Normalized chat export (participants + timestamped messages) |
//! | **QuantitativeAnalysis** | Aggregate snapshot per upload, versioned via `_version` |
//! | **StoredAnalysis** | Persisted conversation + snapshot + optional AI results |
//!
//! The JSON form of every type uses camelCase keys so snapshots written by
//! the web frontend can be loaded as-is.
//!
//! ### Absent sections
//!
//! `timing`, `patterns` and `engagement` are optional on
//! [`QuantitativeAnalysis`]. Older snapshots may lack them. Every consumer
//! treats an absent section (or a participant missing from one of its maps)
//! as zero.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::{Error, Result};

/// Current `QuantitativeAnalysis` schema version.
///
/// Version 1 bucketed monthly volume by local time, which shifted messages
/// sent around midnight on the first of a month into the wrong bucket.
/// Snapshots without a version, or with an older one, must be recomputed.
pub const QUANTITATIVE_VERSION: u32 = 2;

/// One day in milliseconds.
pub const DAY_MS: i64 = 86_400_000;

/// Participants needed for a conversation to count as a group chat.
pub const MIN_GROUP_PARTICIPANTS: usize = 3;

// ============================================
// Platform
// ============================================

/// Chat platform the export came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Messenger,
    WhatsApp,
    Telegram,
    Instagram,
    Discord,
}

impl Platform {
    /// Returns the display name for this platform
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Messenger => "Messenger",
            Platform::WhatsApp => "WhatsApp",
            Platform::Telegram => "Telegram",
            Platform::Instagram => "Instagram",
            Platform::Discord => "Discord",
        }
    }

    /// Returns the identifier used in fingerprints and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Messenger => "messenger",
            Platform::WhatsApp => "whatsapp",
            Platform::Telegram => "telegram",
            Platform::Instagram => "instagram",
            Platform::Discord => "discord",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "messenger" => Ok(Platform::Messenger),
            "whatsapp" => Ok(Platform::WhatsApp),
            "telegram" => Ok(Platform::Telegram),
            "instagram" => Ok(Platform::Instagram),
            "discord" => Ok(Platform::Discord),
            _ => Err(format!("unknown platform: {}", s)),
        }
    }
}

// ============================================
// Parsed conversation (input)
// ============================================

/// A participant of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Display name, used as the key in every per-person map
    pub name: String,
    /// Platform-specific identifier, when the export carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<String>,
}

/// Kind of message in the export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Media,
    Sticker,
    Link,
    Call,
    /// Platform notices ("X added Y"); ignored by the aggregator
    System,
    Unsent,
}

/// A reaction left on a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    /// Name of the participant who reacted
    pub actor: String,
}

/// A single message of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Position in the original export
    pub index: u64,
    pub sender: String,
    #[serde(default)]
    pub content: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(default, rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub has_media: bool,
    #[serde(default)]
    pub has_link: bool,
    #[serde(default)]
    pub is_unsent: bool,
}

/// First and last message timestamps (ms)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: i64,
    pub end: i64,
}

/// Conversation-level metadata from the export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMetadata {
    pub total_messages: u64,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub is_group: bool,
}

/// A normalized chat export.
///
/// Produced by upstream platform parsers and treated as read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConversation {
    pub platform: Platform,
    #[serde(default)]
    pub title: String,
    pub participants: Vec<Participant>,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub metadata: ConversationMetadata,
}

impl ParsedConversation {
    /// Check the structural preconditions the analytics rely on.
    ///
    /// Participant names must be non-empty and unique, since they key every
    /// per-person map.
    pub fn validate(&self) -> Result<()> {
        if self.participants.is_empty() {
            return Err(Error::InvalidConversation(
                "conversation has no participants".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for participant in &self.participants {
            if participant.name.trim().is_empty() {
                return Err(Error::InvalidConversation(
                    "participant with empty name".to_string(),
                ));
            }
            if !seen.insert(participant.name.as_str()) {
                return Err(Error::InvalidConversation(format!(
                    "duplicate participant: {}",
                    participant.name
                )));
            }
        }
        Ok(())
    }

    /// Participant names in canonical (export) order.
    pub fn participant_names(&self) -> Vec<&str> {
        self.participants.iter().map(|p| p.name.as_str()).collect()
    }

    /// Whether `name` is a declared participant.
    pub fn has_participant(&self, name: &str) -> bool {
        self.participants.iter().any(|p| p.name == name)
    }

    /// Group chats have three or more participants.
    ///
    /// Decided from the participant list, not from `metadata.is_group`,
    /// which exporters set inconsistently.
    pub fn is_group(&self) -> bool {
        self.participants.len() >= MIN_GROUP_PARTICIPANTS
    }

    /// Earliest message timestamp, if there are any messages.
    pub fn first_timestamp(&self) -> Option<i64> {
        self.messages.iter().map(|m| m.timestamp).min()
    }
}

// ============================================
// Quantitative analysis (snapshot)
// ============================================

/// Per-participant counts and sums
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonMetrics {
    pub total_messages: u64,
    pub total_words: u64,
    pub total_characters: u64,
    pub emoji_count: u64,
    pub reactions_given: u64,
    pub reactions_received: u64,
    pub questions_asked: u64,
    pub media_count: u64,
    pub link_count: u64,
    pub unsent_count: u64,
    /// Words per message
    pub average_message_length: f64,
    pub longest_message_words: u64,
}

/// Per-participant response latency
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonTiming {
    /// Median time to reply to the other side, 0 when never replied
    pub median_response_time_ms: f64,
    /// Number of reply samples the median was taken over
    pub response_count: u64,
}

/// The longest gap between two consecutive messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongestSilence {
    pub duration_ms: i64,
    /// Sender of the message before the silence
    pub last_sender: String,
    /// Timestamp of the message before the silence
    #[serde(default)]
    pub start_timestamp: i64,
}

/// Timing and engagement-by-time aggregates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimingMetrics {
    pub per_person: BTreeMap<String, PersonTiming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longest_silence: Option<LongestSilence>,
    pub late_night_messages: BTreeMap<String, u64>,
    pub conversation_initiations: BTreeMap<String, u64>,
}

/// Volume patterns over time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatternMetrics {
    /// Percent change in monthly volume per month (least-squares slope)
    pub volume_trend: f64,
    /// Message count per UTC month, keyed "YYYY-MM"
    pub monthly_volume: BTreeMap<String, u64>,
}

/// Session-level engagement
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngagementMetrics {
    pub total_sessions: u64,
    pub avg_messages_per_session: f64,
}

/// Aggregate snapshot of a conversation.
///
/// Maps are ordered so that serialization and floating-point reductions
/// over participants are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantitativeAnalysis {
    /// Schema marker; `None` means a pre-migration snapshot
    #[serde(rename = "_version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default)]
    pub per_person: BTreeMap<String, PersonMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<PatternMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<EngagementMetrics>,
}

impl QuantitativeAnalysis {
    /// Whether this snapshot predates the current schema and must be recomputed.
    pub fn is_outdated(&self) -> bool {
        self.version.map_or(true, |v| v < QUANTITATIVE_VERSION)
    }

    /// Metrics for `name`, zero when the participant has no entry.
    pub fn person(&self, name: &str) -> PersonMetrics {
        match self.per_person.get(name) {
            Some(metrics) => *metrics,
            None => {
                tracing::debug!(participant = name, "no per-person entry, using zeros");
                PersonMetrics::default()
            }
        }
    }

    /// Median response time for `name`, 0 when unknown.
    pub fn median_response_ms(&self, name: &str) -> f64 {
        self.timing
            .as_ref()
            .and_then(|t| t.per_person.get(name))
            .map(|t| t.median_response_time_ms)
            .unwrap_or(0.0)
    }

    /// Late-night message count for `name`, 0 when unknown.
    pub fn late_night_messages(&self, name: &str) -> u64 {
        self.timing
            .as_ref()
            .and_then(|t| t.late_night_messages.get(name).copied())
            .unwrap_or(0)
    }

    /// Conversation initiations for `name`, 0 when unknown.
    pub fn initiations(&self, name: &str) -> u64 {
        self.timing
            .as_ref()
            .and_then(|t| t.conversation_initiations.get(name).copied())
            .unwrap_or(0)
    }

    /// Sum of messages across all participants.
    pub fn total_messages(&self) -> u64 {
        self.per_person.values().map(|p| p.total_messages).sum()
    }

    /// Sum of words across all participants.
    pub fn total_words(&self) -> u64 {
        self.per_person.values().map(|p| p.total_words).sum()
    }

    /// Session count, 0 when engagement is absent.
    pub fn total_sessions(&self) -> u64 {
        self.engagement.map(|e| e.total_sessions).unwrap_or(0)
    }

    /// Volume trend, 0 when patterns are absent.
    pub fn volume_trend(&self) -> f64 {
        self.patterns.as_ref().map(|p| p.volume_trend).unwrap_or(0.0)
    }
}

// ============================================
// Stored analysis
// ============================================

/// A persisted analysis record.
///
/// Replaced as a whole when the aggregator is re-run; never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAnalysis {
    /// Opaque identifier (UUID v4)
    pub id: String,
    pub fingerprint: String,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
    pub conversation: ParsedConversation,
    pub quantitative: QuantitativeAnalysis,
    /// AI-generated results, opaque to the core
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualitative: Option<serde_json::Value>,
}

impl StoredAnalysis {
    /// Create a record with a fresh id.
    pub fn new(
        fingerprint: String,
        created_at: i64,
        conversation: ParsedConversation,
        quantitative: QuantitativeAnalysis,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            fingerprint,
            created_at,
            conversation,
            quantitative,
            qualitative: None,
        }
    }
}

/// Lightweight row for history listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub id: String,
    pub fingerprint: String,
    pub created_at: i64,
    pub title: String,
    pub platform: Platform,
    pub participant_count: usize,
    pub total_messages: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(name: &str) -> Participant {
        Participant {
            name: name.to_string(),
            platform_id: None,
        }
    }

    fn conversation(names: &[&str]) -> ParsedConversation {
        ParsedConversation {
            platform: Platform::WhatsApp,
            title: "test".to_string(),
            participants: names.iter().map(|n| participant(n)).collect(),
            messages: vec![],
            metadata: ConversationMetadata::default(),
        }
    }

    #[test]
    fn test_platform_round_trip_str() {
        for platform in [
            Platform::Messenger,
            Platform::WhatsApp,
            Platform::Telegram,
            Platform::Instagram,
            Platform::Discord,
        ] {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
        assert!("signal".parse::<Platform>().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicates_and_empty() {
        assert!(conversation(&["Alice", "Bob"]).validate().is_ok());
        assert!(conversation(&[]).validate().is_err());
        assert!(conversation(&["Alice", "Alice"]).validate().is_err());
        assert!(conversation(&["Alice", "  "]).validate().is_err());
    }

    #[test]
    fn test_missing_person_defaults_to_zero() {
        let quant = QuantitativeAnalysis::default();
        assert_eq!(quant.person("Nobody"), PersonMetrics::default());
        assert_eq!(quant.median_response_ms("Nobody"), 0.0);
        assert_eq!(quant.initiations("Nobody"), 0);
        assert_eq!(quant.total_sessions(), 0);
    }

    #[test]
    fn test_version_marker() {
        let json = r#"{"perPerson": {}}"#;
        let quant: QuantitativeAnalysis = serde_json::from_str(json).unwrap();
        assert!(quant.version.is_none());
        assert!(quant.is_outdated());

        let json = r#"{"_version": 2, "perPerson": {}}"#;
        let quant: QuantitativeAnalysis = serde_json::from_str(json).unwrap();
        assert!(!quant.is_outdated());
        assert!(serde_json::to_string(&quant).unwrap().contains("\"_version\":2"));
    }

    #[test]
    fn test_parse_conversation_json() {
        let json = r#"{
            "platform": "messenger",
            "title": "Alice & Bob",
            "participants": [{"name": "Alice"}, {"name": "Bob", "platformId": "100"}],
            "messages": [
                {"index": 0, "sender": "Alice", "content": "hi", "timestamp": 1000,
                 "reactions": [{"emoji": "❤", "actor": "Bob"}]},
                {"index": 1, "sender": "Bob", "content": "", "timestamp": 2000,
                 "type": "media", "hasMedia": true}
            ],
            "metadata": {"totalMessages": 2, "dateRange": {"start": 1000, "end": 2000}}
        }"#;
        let conv: ParsedConversation = serde_json::from_str(json).unwrap();
        assert_eq!(conv.participant_names(), vec!["Alice", "Bob"]);
        assert_eq!(conv.messages[1].message_type, MessageType::Media);
        assert_eq!(conv.messages[0].reactions[0].actor, "Bob");
        assert_eq!(conv.first_timestamp(), Some(1000));
        assert!(!conv.is_group());
    }
}

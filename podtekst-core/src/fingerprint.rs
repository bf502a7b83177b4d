//! Conversation fingerprints
//!
//! A fingerprint identifies a conversation by its participant set, platform
//! and start day, independent of message content. Re-exporting the same chat
//! later yields the same fingerprint, which is how a new upload is matched
//! with its previous analysis.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{ParsedConversation, DAY_MS};

/// Hash function used for fingerprints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintAlgorithm {
    /// SHA-256, 64 hex chars
    #[default]
    Sha256,
    /// 32-bit rolling hash, 8 hex chars. Degraded mode for environments
    /// without a digest primitive; higher collision risk.
    Simple,
}

/// Canonical form that gets hashed. Field order is fixed by the struct.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FingerprintInput<'a> {
    participants: Vec<String>,
    platform: &'a str,
    start_day: i64,
}

/// Compute a SHA-256 fingerprint.
///
/// Names are trimmed and lowercased, then sorted, so participant order does
/// not matter. The timestamp is floored to its UTC day to absorb export skew.
pub fn compute_fingerprint(
    participants: &[impl AsRef<str>],
    platform: &str,
    first_message_timestamp_ms: i64,
) -> String {
    compute_fingerprint_with(
        FingerprintAlgorithm::Sha256,
        participants,
        platform,
        first_message_timestamp_ms,
    )
}

/// Compute a fingerprint with an explicit algorithm.
pub fn compute_fingerprint_with(
    algorithm: FingerprintAlgorithm,
    participants: &[impl AsRef<str>],
    platform: &str,
    first_message_timestamp_ms: i64,
) -> String {
    let canonical = canonical_input(participants, platform, first_message_timestamp_ms);
    match algorithm {
        FingerprintAlgorithm::Sha256 => hex::encode(Sha256::digest(canonical.as_bytes())),
        FingerprintAlgorithm::Simple => simple_hash(&canonical),
    }
}

/// Fingerprint a parsed conversation (empty conversations use day 0).
pub fn fingerprint_conversation(
    conversation: &ParsedConversation,
    algorithm: FingerprintAlgorithm,
) -> String {
    let names = conversation.participant_names();
    compute_fingerprint_with(
        algorithm,
        &names[..],
        conversation.platform.as_str(),
        conversation.first_timestamp().unwrap_or(0),
    )
}

/// Floor a timestamp to the start of its UTC day.
pub fn start_of_utc_day(timestamp_ms: i64) -> i64 {
    timestamp_ms.div_euclid(DAY_MS) * DAY_MS
}

fn canonical_input(
    participants: &[impl AsRef<str>],
    platform: &str,
    first_message_timestamp_ms: i64,
) -> String {
    let mut names: Vec<String> = participants
        .iter()
        .map(|p| p.as_ref().trim().to_lowercase())
        .collect();
    names.sort();
    names.dedup();

    let input = FingerprintInput {
        participants: names,
        platform,
        start_day: start_of_utc_day(first_message_timestamp_ms),
    };

    // A struct of strings and integers always serializes.
    serde_json::to_string(&input).unwrap_or_default()
}

/// 32-bit multiply-add string hash (`h = h * 31 + c`), as hex.
fn simple_hash(input: &str) -> String {
    let mut hash: u32 = 0;
    for unit in input.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(unit as u32);
    }
    format!("{:08x}", hash)
}

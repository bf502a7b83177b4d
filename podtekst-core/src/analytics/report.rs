//! Combined analysis report
//!
//! Bundles everything the presentation layers read for one stored
//! analysis: the snapshot, rankings, badges, awards and, when a previous
//! analysis of the same conversation exists, the delta against it.

use serde::Serialize;

use super::awards::{build_awards, Award};
use super::badges::{derive_badges, Badge};
use super::delta::{compute_delta, DeltaInput, DeltaMetrics, PreviousInput};
use super::ranking::{compute_ranking_percentiles, RankingPercentiles};
use crate::types::{Platform, QuantitativeAnalysis, StoredAnalysis};

/// Read-only report for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub analysis_id: String,
    pub title: String,
    pub platform: Platform,
    pub participants: Vec<String>,
    pub fingerprint: String,
    pub created_at: i64,
    pub quantitative: QuantitativeAnalysis,
    pub rankings: RankingPercentiles,
    pub badges: Vec<Badge>,
    pub awards: Vec<Award>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<DeltaMetrics>,
}

/// Build the report for `current`, diffing against `previous` if given.
///
/// Both snapshots must be current (see
/// [`refresh_stored`](super::quantitative::refresh_stored)). An outdated
/// `previous` lacks the fields the delta reads, so no delta is produced.
pub fn build_report(current: &StoredAnalysis, previous: Option<&StoredAnalysis>) -> AnalysisReport {
    let quant = &current.quantitative;
    let conversation = &current.conversation;

    let previous = previous.filter(|prev| {
        if prev.quantitative.is_outdated() {
            tracing::warn!(
                current = %current.id,
                previous = %prev.id,
                version = ?prev.quantitative.version,
                "Skipping delta against outdated snapshot"
            );
        }
        !prev.quantitative.is_outdated()
    });

    let delta = previous.map(|prev| {
        if prev.fingerprint != current.fingerprint {
            tracing::warn!(
                current = %current.id,
                previous = %prev.id,
                "Comparing analyses with different fingerprints"
            );
        }
        compute_delta(
            DeltaInput {
                quantitative: quant,
                conversation,
                created_at: current.created_at,
            },
            PreviousInput {
                id: &prev.id,
                quantitative: &prev.quantitative,
                conversation: &prev.conversation,
                created_at: prev.created_at,
            },
        )
    });

    AnalysisReport {
        analysis_id: current.id.clone(),
        title: conversation.title.clone(),
        platform: conversation.platform,
        participants: conversation.participants.iter().map(|p| p.name.clone()).collect(),
        fingerprint: current.fingerprint.clone(),
        created_at: current.created_at,
        quantitative: quant.clone(),
        rankings: compute_ranking_percentiles(quant),
        badges: derive_badges(quant, conversation),
        awards: build_awards(quant, conversation),
        delta,
    }
}

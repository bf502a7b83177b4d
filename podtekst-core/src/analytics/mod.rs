//! Analytics module for PodTeksT
//!
//! Pure functions over conversation aggregates:
//! - Quantitative aggregation (per-person, timing, patterns, engagement)
//! - Percentile rankings against reference curves
//! - Delta comparison between two analyses
//! - Badges and group-chat awards
//!
//! ## Data flow
//!
//! ```text
//! ParsedConversation ──► compute_quantitative ──► QuantitativeAnalysis
//!                                                      │
//!          ┌──────────────────┬────────────────────────┼──────────────────┐
//!          ▼                  ▼                        ▼                  ▼
//!  compute_ranking_     compute_delta           derive_badges        build_awards
//!    percentiles      (vs. previous snapshot)
//! ```
//!
//! None of these functions perform I/O or hold state, so they can be
//! called concurrently and cached by input.

pub mod awards;
pub mod badges;
pub mod delta;
pub mod quantitative;
pub mod ranking;
pub mod report;
pub mod selection;

pub use awards::{build_awards, Award, AwardKind};
pub use badges::{derive_badges, Badge, BadgeKind};
pub use delta::{
    build_delta_metric, compute_delta, DeltaInput, DeltaMetric, DeltaMetrics, Direction, Polarity,
    PreviousInput,
};
pub use quantitative::{compute_quantitative, ensure_current, refresh_stored};
pub use ranking::{compute_ranking_percentiles, Ranking, RankingMetric, RankingPercentiles};
pub use report::{build_report, AnalysisReport};

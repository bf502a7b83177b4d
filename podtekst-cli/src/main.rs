//! podtekst - conversation analytics CLI
//!
//! Runs the quantitative pipeline on an exported conversation and prints
//! rankings, badges, awards and the change since the last upload.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/podtekst/analyses.db
//! - Config: $XDG_CONFIG_HOME/podtekst/config.toml

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use podtekst_core::analytics::{
    build_report, compute_quantitative, refresh_stored, AnalysisReport, DeltaMetric,
};
use podtekst_core::fingerprint::fingerprint_conversation;
use podtekst_core::format::{format_date_ms, format_delta_percent, format_duration_ms};
use podtekst_core::{Config, Database, ParsedConversation, StoredAnalysis};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "podtekst")]
#[command(about = "What your chats say about you, in numbers")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a parsed conversation export (JSON)
    Analyze {
        /// Path to the conversation JSON
        file: PathBuf,

        /// Export format (md = markdown, json = JSON)
        #[arg(long)]
        export: Option<String>,

        /// Do not save the analysis
        #[arg(long)]
        no_store: bool,
    },

    /// Print the fingerprint of a conversation export
    Fingerprint {
        /// Path to the conversation JSON
        file: PathBuf,
    },

    /// List stored analyses, newest first
    History {
        /// Maximum number of analyses to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the report for a stored analysis (partial id match supported)
    Show {
        id: String,

        /// Export format (md = markdown, json = JSON)
        #[arg(long)]
        export: Option<String>,
    },

    /// Delete a stored analysis
    Delete { id: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = podtekst_core::logging::init(&config.logging).ok();

    match args.command {
        Command::Analyze {
            file,
            export,
            no_store,
        } => cmd_analyze(&config, &file, export.as_deref(), no_store),
        Command::Fingerprint { file } => cmd_fingerprint(&config, &file),
        Command::History { limit } => cmd_history(limit),
        Command::Show { id, export } => cmd_show(&config, &id, export.as_deref()),
        Command::Delete { id } => cmd_delete(&id),
    }
}

fn open_database() -> Result<Database> {
    let db_path = Config::database_path();
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;
    Ok(db)
}

fn read_conversation(path: &Path) -> Result<ParsedConversation> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let conversation: ParsedConversation = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a parsed conversation", path.display()))?;
    conversation
        .validate()
        .context("conversation failed validation")?;
    Ok(conversation)
}

fn cmd_analyze(config: &Config, file: &Path, export: Option<&str>, no_store: bool) -> Result<()> {
    let conversation = read_conversation(file)?;
    let quantitative = compute_quantitative(&conversation, &config.analysis);
    let fingerprint = fingerprint_conversation(&conversation, config.fingerprint.algorithm);

    let analysis = StoredAnalysis::new(
        fingerprint,
        Utc::now().timestamp_millis(),
        conversation,
        quantitative,
    );
    tracing::info!(
        id = %analysis.id,
        fingerprint = %analysis.fingerprint,
        messages = analysis.quantitative.total_messages(),
        "Analyzed conversation"
    );

    let report = if no_store {
        build_report(&analysis, None)
    } else {
        let db = open_database()?;
        let mut previous = db
            .find_previous(&analysis.fingerprint, analysis.created_at, &analysis.id)
            .context("failed to look up previous analysis")?;
        if let Some(previous) = previous.as_mut() {
            refresh_and_save(&db, previous, config)?;
        }
        db.save_analysis(&analysis)
            .context("failed to save analysis")?;
        build_report(&analysis, previous.as_ref())
    };

    print_report(&report, export)
}

fn cmd_fingerprint(config: &Config, file: &Path) -> Result<()> {
    let conversation = read_conversation(file)?;
    println!(
        "{}",
        fingerprint_conversation(&conversation, config.fingerprint.algorithm)
    );
    Ok(())
}

fn cmd_history(limit: Option<usize>) -> Result<()> {
    let db = open_database()?;
    let analyses = db.list_analyses(limit)?;

    if analyses.is_empty() {
        println!("No analyses stored yet. Run `podtekst analyze <file>` first.");
        return Ok(());
    }

    println!(
        "{:<10} {:<10} {:<10} {:>6} {:>9}  TITLE",
        "ID", "DATE", "PLATFORM", "PEOPLE", "MESSAGES"
    );
    for summary in analyses {
        println!(
            "{:<10} {:<10} {:<10} {:>6} {:>9}  {}",
            short_id(&summary.id),
            format_date_ms(summary.created_at),
            summary.platform.display_name(),
            summary.participant_count,
            summary.total_messages,
            summary.title
        );
    }
    Ok(())
}

fn cmd_show(config: &Config, id: &str, export: Option<&str>) -> Result<()> {
    let db = open_database()?;
    let mut analysis = resolve_analysis(&db, id)?;
    refresh_and_save(&db, &mut analysis, config)?;

    let mut previous = db.find_previous(&analysis.fingerprint, analysis.created_at, &analysis.id)?;
    if let Some(previous) = previous.as_mut() {
        refresh_and_save(&db, previous, config)?;
    }
    let report = build_report(&analysis, previous.as_ref());
    print_report(&report, export)
}

/// Recompute an outdated stored snapshot and persist the result.
fn refresh_and_save(db: &Database, analysis: &mut StoredAnalysis, config: &Config) -> Result<()> {
    if refresh_stored(analysis, &config.analysis) {
        db.save_analysis(analysis)
            .context("failed to save recomputed analysis")?;
    }
    Ok(())
}

fn cmd_delete(id: &str) -> Result<()> {
    let db = open_database()?;
    let analysis = resolve_analysis(&db, id)?;
    if db.delete_analysis(&analysis.id)? {
        println!("Deleted {}", analysis.id);
    }
    Ok(())
}

/// Exact id first, then a unique prefix.
fn resolve_analysis(db: &Database, id: &str) -> Result<StoredAnalysis> {
    if let Some(analysis) = db.get_analysis(id)? {
        return Ok(analysis);
    }

    let matches: Vec<_> = db
        .list_analyses(None)?
        .into_iter()
        .filter(|s| s.id.starts_with(id))
        .collect();

    match matches.as_slice() {
        [] => anyhow::bail!("No analysis found matching '{}'", id),
        [only] => Ok(db.require_analysis(&only.id)?),
        _ => anyhow::bail!(
            "'{}' matches {} analyses; use a longer id",
            id,
            matches.len()
        ),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn print_report(report: &AnalysisReport, export: Option<&str>) -> Result<()> {
    match export {
        Some("json") => print_json(report),
        Some("md") => {
            print_markdown(report);
            Ok(())
        }
        Some(other) => anyhow::bail!("Unknown export format: {}. Use 'md' or 'json'", other),
        None => {
            print_terminal(report);
            Ok(())
        }
    }
}

/// Render a delta metric value in its unit.
fn metric_value(metric: &DeltaMetric, value: f64) -> String {
    match metric.unit.as_str() {
        "ms" => format_duration_ms(value),
        "%" => format!("{:+.1}%", value),
        "words" if metric.label.contains("length") => format!("{:.1} words", value),
        unit => format!("{:.0} {}", value, unit),
    }
}

fn print_terminal(report: &AnalysisReport) {
    let title = format!("📱 {} ({})", report.title, report.platform.display_name());

    // Header
    println!();
    println!("╭{}╮", "─".repeat(60));
    println!("│{:^60}│", title);
    println!("╰{}╯", "─".repeat(60));
    println!();
    println!(
        "   Analysis {}  ·  {}  ·  {} people",
        short_id(&report.analysis_id),
        format_date_ms(report.created_at),
        report.participants.len()
    );
    println!();

    let quant = &report.quantitative;
    if quant.total_messages() == 0 {
        println!("  No messages to analyze.");
        println!();
        return;
    }

    // The Numbers
    println!("📊 THE NUMBERS");
    println!(
        "   {:<16} {:>8} {:>8} {:>6} {:>10}",
        "", "MESSAGES", "WORDS", "EMOJI", "REPLY"
    );
    for name in &report.participants {
        let person = quant.person(name);
        println!(
            "   {:<16} {:>8} {:>8} {:>6} {:>10}",
            name,
            person.total_messages,
            person.total_words,
            person.emoji_count,
            format_duration_ms(quant.median_response_ms(name))
        );
    }
    println!();

    // Rankings
    println!("🏅 RANKINGS");
    for ranking in &report.rankings.rankings {
        println!(
            "   {} {:<22} top {:>3}%",
            ranking.emoji,
            ranking.label,
            100 - ranking.percentile.min(99)
        );
    }
    println!();

    // Badges
    if !report.badges.is_empty() {
        println!("🎖️  BADGES");
        for badge in &report.badges {
            println!(
                "   {} {:<22} {:<16} {}",
                badge.emoji, badge.name, badge.holder, badge.evidence
            );
        }
        println!();
    }

    // Awards
    if !report.awards.is_empty() {
        println!("🏆 AWARDS");
        for award in &report.awards {
            println!(
                "   {} {:<20} {:<16} \"{}\"",
                award.emoji, award.title, award.winner, award.description
            );
        }
        println!();
    }

    // Delta
    if let Some(delta) = &report.delta {
        println!(
            "📈 SINCE LAST TIME ({} days ago)",
            delta.days_since_last_analysis
        );
        for metric in &delta.metrics {
            println!(
                "   {} {:<20} {:>14} → {:<14} {}",
                metric.direction.arrow(),
                metric.label,
                metric_value(metric, metric.previous),
                metric_value(metric, metric.current),
                format_delta_percent(metric.delta_percent)
            );
        }
        if delta.participants_changed {
            println!("   (participants changed since the previous export)");
        }
        println!();
    }
}

fn print_markdown(report: &AnalysisReport) {
    println!("# {}", report.title);
    println!();
    println!(
        "*{} · {} · {} participants*",
        report.platform.display_name(),
        format_date_ms(report.created_at),
        report.participants.len()
    );
    println!();

    let quant = &report.quantitative;

    // Numbers
    println!("## The Numbers");
    println!();
    println!("| Person | Messages | Words | Emoji | Median reply |");
    println!("|--------|----------|-------|-------|--------------|");
    for name in &report.participants {
        let person = quant.person(name);
        println!(
            "| {} | {} | {} | {} | {} |",
            name,
            person.total_messages,
            person.total_words,
            person.emoji_count,
            format_duration_ms(quant.median_response_ms(name))
        );
    }
    println!();

    // Rankings
    println!("## Rankings");
    println!();
    println!("| Metric | Value | Percentile |");
    println!("|--------|-------|------------|");
    for ranking in &report.rankings.rankings {
        println!(
            "| {} {} | {:.2} | {} (estimated) |",
            ranking.emoji, ranking.label, ranking.value, ranking.percentile
        );
    }
    println!();

    if !report.badges.is_empty() {
        println!("## Badges");
        println!();
        for badge in &report.badges {
            println!(
                "- {} **{}** - {} ({})",
                badge.emoji, badge.name, badge.holder, badge.evidence
            );
        }
        println!();
    }

    if !report.awards.is_empty() {
        println!("## Awards");
        println!();
        for award in &report.awards {
            println!(
                "- {} **{}** - {} - *\"{}\"*",
                award.emoji, award.title, award.winner, award.description
            );
        }
        println!();
    }

    if let Some(delta) = &report.delta {
        println!("## Since Last Analysis");
        println!();
        println!(
            "*{} days since {}*",
            delta.days_since_last_analysis,
            format_date_ms(delta.previous_created_at)
        );
        println!();
        println!("| Metric | Before | Now | Change |");
        println!("|--------|--------|-----|--------|");
        for metric in &delta.metrics {
            println!(
                "| {} | {} | {} | {} |",
                metric.label,
                metric_value(metric, metric.previous),
                metric_value(metric, metric.current),
                format_delta_percent(metric.delta_percent)
            );
        }
        println!();
    }

    println!("---");
    println!("*Generated by podtekst*");
}

fn print_json(report: &AnalysisReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

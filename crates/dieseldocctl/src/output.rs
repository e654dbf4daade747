//! Terminal rendering - clean, ASCII-only output.

use dieseldoc_core::analytics::BatchMetrics;
use dieseldoc_core::{CommentStatus, ProcessedReport, Provenance, VehicleFacts};
use owo_colors::OwoColorize;
use serde::Serialize;

/// JSON view of one processed report for `--json` output.
#[derive(Debug, Serialize)]
pub struct ProcessedJson {
    pub id: String,
    pub facts: VehicleFacts,
    pub comment_status: CommentStatus,
    pub community_score: Option<f64>,
    pub web_score: Option<f64>,
    pub consensus: dieseldoc_core::ConsensusResult,
    pub has_significant_content: bool,
}

impl From<&ProcessedReport> for ProcessedJson {
    fn from(p: &ProcessedReport) -> Self {
        Self {
            id: p.report.id.clone(),
            facts: p.facts.clone(),
            comment_status: p.comment_status,
            community_score: p.community.as_ref().map(|c| c.bundle.score),
            web_score: p.web.as_ref().map(|b| b.score),
            consensus: p.consensus.clone(),
            has_significant_content: p.has_significant_content,
        }
    }
}

fn provenance_tag(provenance: Provenance) -> String {
    match provenance {
        Provenance::Assistant => "[ASSISTANT]".bright_cyan().to_string(),
        Provenance::Community => "[COMMUNITY]".bright_green().to_string(),
        Provenance::Web => "[WEB]".yellow().to_string(),
        Provenance::None => "[NO CONSENSUS]".bright_red().to_string(),
    }
}

/// Render one processed report.
pub fn display_processed(p: &ProcessedReport) {
    println!();
    println!(
        "{} {}  {}",
        "Report".bold(),
        p.report.id.bold(),
        provenance_tag(p.consensus.provenance)
    );
    display_facts(&p.facts);
    println!("  comments: {:?}", p.comment_status);

    if p.consensus.provenance == Provenance::None {
        println!("  {}", "No consensus could be reached for this report.".bright_red());
        return;
    }

    println!();
    println!("  {}", p.consensus.diagnosis);
    if !p.consensus.solution_steps.is_empty() {
        println!();
        for step in &p.consensus.solution_steps {
            println!("  {}", step);
        }
    }
    if !p.consensus.parts_needed.is_empty() {
        println!();
        println!("  Parts: {}", p.consensus.parts_needed.join(", "));
    }
}

/// Render extracted facts, one line per field.
pub fn display_facts(facts: &VehicleFacts) {
    let field = |name: &str, value: &Option<String>| match value {
        Some(v) => println!("  {}: {}", name, v.bright_green()),
        None => println!("  {}: {}", name, "-".dimmed()),
    };
    field("type", &facts.vehicle_type);
    field("brand", &facts.brand);
    field("model", &facts.model);
    field("year", &facts.year);
    field("problem", &facts.problem);
}

/// Render the batch coverage summary.
pub fn display_metrics(metrics: &BatchMetrics) {
    println!();
    println!("{} ({} reports)", "Batch coverage".bold(), metrics.total_reports);
    let row = |name: &str, pct: f64| println!("  {:<24} {:>6.2}%", name, pct);
    row("vehicle type", metrics.with_vehicle_type_percent);
    row("brand", metrics.with_brand_percent);
    row("model", metrics.with_model_percent);
    row("year", metrics.with_year_percent);
    row("problem", metrics.with_problem_percent);
    row("image", metrics.with_image_percent);
    row("image description", metrics.with_image_description_percent);
    row("community evidence", metrics.with_community_evidence_percent);
    row("assistant consensus", metrics.with_assistant_consensus_percent);
    row("web solutions", metrics.with_web_solutions_percent);
    row("significant content", metrics.with_significant_content_percent);

    if !metrics.top_commenters.is_empty() {
        println!();
        println!("{}", "Top commenters".bold());
        for c in &metrics.top_commenters {
            println!(
                "  {:<20} {:>4} comments, avg karma {:.1}",
                c.author, c.comment_count, c.avg_karma
            );
        }
    }
}

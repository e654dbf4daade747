//! Batch coverage metrics over processed reports.
//!
//! In-memory summaries only: extraction coverage percentages and the most
//! active commenters. Useful for judging lexicon quality across a batch.

use crate::engine::ProcessedReport;
use crate::evidence::Provenance;
use serde::Serialize;
use std::collections::HashMap;

/// One commenter's aggregate activity across the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommenterStats {
    pub author: String,
    pub comment_count: usize,
    pub avg_karma: f64,
}

/// Coverage summary for one batch of processed reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchMetrics {
    pub total_reports: usize,
    pub with_vehicle_type_percent: f64,
    pub with_brand_percent: f64,
    pub with_model_percent: f64,
    pub with_year_percent: f64,
    pub with_problem_percent: f64,
    pub with_image_percent: f64,
    pub with_image_description_percent: f64,
    /// Reports whose community fetch actually yielded comments.
    pub with_community_evidence_percent: f64,
    pub with_assistant_consensus_percent: f64,
    /// Reports with a web diagnosis and a positive web score.
    pub with_web_solutions_percent: f64,
    pub with_significant_content_percent: f64,
    /// Ten most active commenters, by comment count.
    pub top_commenters: Vec<CommenterStats>,
}

/// Summarize a batch. An empty batch yields all-zero metrics.
pub fn summarize(batch: &[ProcessedReport]) -> BatchMetrics {
    let total = batch.len();
    let percent = |count: usize| -> f64 {
        if total == 0 {
            return 0.0;
        }
        let raw = count as f64 / total as f64 * 100.0;
        (raw * 100.0).round() / 100.0
    };
    let count = |pred: &dyn Fn(&ProcessedReport) -> bool| batch.iter().filter(|p| pred(p)).count();

    BatchMetrics {
        total_reports: total,
        with_vehicle_type_percent: percent(count(&|p| p.facts.vehicle_type.is_some())),
        with_brand_percent: percent(count(&|p| p.facts.brand.is_some())),
        with_model_percent: percent(count(&|p| p.facts.model.is_some())),
        with_year_percent: percent(count(&|p| p.facts.year.is_some())),
        with_problem_percent: percent(count(&|p| p.facts.problem.is_some())),
        with_image_percent: percent(count(&|p| p.report.has_image())),
        with_image_description_percent: percent(count(&|p| p.image_description.is_some())),
        with_community_evidence_percent: percent(count(&|p| p.community.is_some())),
        with_assistant_consensus_percent: percent(count(&|p| {
            p.consensus.provenance == Provenance::Assistant
        })),
        with_web_solutions_percent: percent(count(&|p| {
            p.web
                .as_ref()
                .map(|b| b.has_diagnosis() && b.score > 0.0)
                .unwrap_or(false)
        })),
        with_significant_content_percent: percent(count(&|p| p.has_significant_content)),
        top_commenters: top_commenters(batch, 10),
    }
}

/// Tally valid comments per author and return the `limit` most active.
/// Ties break alphabetically so the ordering is stable.
fn top_commenters(batch: &[ProcessedReport], limit: usize) -> Vec<CommenterStats> {
    let mut tallies: HashMap<&str, (usize, i64)> = HashMap::new();
    for processed in batch {
        for comment in processed.comments.iter().filter(|c| c.is_valid()) {
            let author = comment.author.trim();
            if author.is_empty() || author == "[deleted]" {
                continue;
            }
            let entry = tallies.entry(author).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += comment.karma;
        }
    }

    let mut stats: Vec<CommenterStats> = tallies
        .into_iter()
        .map(|(author, (count, total_karma))| CommenterStats {
            author: author.to_string(),
            comment_count: count,
            avg_karma: total_karma as f64 / count as f64,
        })
        .collect();
    stats.sort_by(|a, b| {
        b.comment_count
            .cmp(&a.comment_count)
            .then_with(|| a.author.cmp(&b.author))
    });
    stats.truncate(limit);
    stats
}

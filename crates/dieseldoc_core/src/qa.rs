//! Q&A training-pair generation from processed reports.
//!
//! A processed report with a real consensus can be rephrased as one
//! question/answer pair for downstream fine-tuning. Reports with an image
//! are excluded: the answer would depend on content the pair cannot carry.

use crate::engine::ProcessedReport;
use crate::evidence::Provenance;
use serde::{Deserialize, Serialize};

/// Fixed system prompt attached to every generated pair.
pub const QA_SYSTEM_PROMPT: &str = "Vous êtes un spécialiste de la mécanique diesel, capable de diagnostiquer des problèmes, de proposer des étapes de réparation séquentielles, d'identifier les pièces nécessaires, et de donner des rappels importants. Répondez de manière claire, concise et professionnelle.";

/// One question/answer training example derived from a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub report_id: String,
    pub system_prompt: String,
    pub question: String,
    pub answer: String,
}

/// Derive a training pair from a processed report, or `None` when the
/// report does not qualify: it must have an extracted problem, a consensus
/// from some channel, and no attached image.
pub fn generate_qa_pair(processed: &ProcessedReport) -> Option<QaPair> {
    if processed.report.has_image() {
        return None;
    }
    let problem = processed.facts.problem.as_deref()?;
    if processed.consensus.provenance == Provenance::None
        || processed.consensus.diagnosis.trim().is_empty()
    {
        return None;
    }

    let question = format!(
        "Mon {} {} {} a un problème de {}. Quelle est la cause probable et comment le réparer ?",
        processed.facts.year.as_deref().unwrap_or(""),
        processed.facts.brand.as_deref().unwrap_or(""),
        processed.facts.model.as_deref().unwrap_or(""),
        problem
    )
    .trim()
    .to_string();

    let mut answer_parts = vec![format!(
        "Pour votre véhicule, le problème de '{}' est un souci courant. Le consensus indique que {}.",
        problem, processed.consensus.diagnosis
    )];
    if !processed.consensus.solution_steps.is_empty() {
        answer_parts.push("\nÉtapes de solution suggérées :".to_string());
        answer_parts.extend(processed.consensus.solution_steps.iter().cloned());
    }
    if !processed.consensus.parts_needed.is_empty() {
        answer_parts.push(format!(
            "\nPièces potentiellement nécessaires : {}.",
            processed.consensus.parts_needed.join(", ")
        ));
    }

    Some(QaPair {
        report_id: processed.report.id.clone(),
        system_prompt: QA_SYSTEM_PROMPT.to_string(),
        question,
        answer: answer_parts.join("\n").trim().to_string(),
    })
}

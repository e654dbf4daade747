//! Evidence bundles, provenance and the arbitrated consensus result.
//!
//! Each evidence channel (community discussion, web research, the external
//! assistant) produces at most one `EvidenceBundle` per report. Bundles are
//! independent: a channel never reads or mutates another channel's bundle.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Which channel produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Community discussion comments.
    Community,
    /// External web search.
    Web,
    /// Generative assistant, authoritative when invoked.
    Assistant,
    /// No channel produced a usable diagnosis.
    None,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Community => "community",
            Self::Web => "web",
            Self::Assistant => "assistant",
            Self::None => "none",
        };
        f.write_str(label)
    }
}

/// Outcome of the community evidence fetch for one report.
///
/// Replaces the textual sentinel markers of earlier renditions with a typed
/// status; only `Fetched` qualifies the community channel for arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    /// Comments were fetched successfully (the list may still be empty).
    Fetched,
    /// The report is younger than the readiness window; fetch deferred.
    Pending,
    /// The creation timestamp could not be parsed. Terminal.
    DateUnparseable,
    /// No usable thread reference: missing, or no thread id could be
    /// extracted from it. Terminal.
    ThreadIdUnresolvable,
    /// The comment source raised during fetch. Terminal for this pass.
    FetchError,
}

impl CommentStatus {
    /// Whether community evidence with this status may win arbitration.
    pub fn qualifies(self) -> bool {
        matches!(self, Self::Fetched)
    }
}

/// One channel's answer: diagnosis, ordered repair steps, parts, and a
/// non-negative relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub diagnosis: String,
    /// Numbered instruction strings, contiguous from "1." with no duplicate
    /// underlying content.
    pub solution_steps: Vec<String>,
    pub parts_needed: Vec<String>,
    pub score: f64,
    pub provenance: Provenance,
}

impl EvidenceBundle {
    pub fn new(provenance: Provenance) -> Self {
        Self {
            diagnosis: String::new(),
            solution_steps: Vec::new(),
            parts_needed: Vec::new(),
            score: 0.0,
            provenance,
        }
    }

    /// Whether the bundle carries a usable diagnosis.
    pub fn has_diagnosis(&self) -> bool {
        !self.diagnosis.trim().is_empty()
    }
}

/// The terminal, arbitrated answer for one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub diagnosis: String,
    pub solution_steps: Vec<String>,
    pub parts_needed: Vec<String>,
    pub provenance: Provenance,
}

impl ConsensusResult {
    /// The all-channels-empty fallback: empty fields, provenance `None`.
    pub fn empty() -> Self {
        Self {
            diagnosis: String::new(),
            solution_steps: Vec::new(),
            parts_needed: Vec::new(),
            provenance: Provenance::None,
        }
    }

    pub fn from_bundle(bundle: &EvidenceBundle) -> Self {
        Self {
            diagnosis: bundle.diagnosis.clone(),
            solution_steps: bundle.solution_steps.clone(),
            parts_needed: bundle.parts_needed.clone(),
            provenance: bundle.provenance,
        }
    }
}

/// Strip a leading "N. " step number, if present.
fn step_content(step: &str) -> String {
    let re = Regex::new(r"^\d+\.\s*").unwrap();
    re.replace(step.trim(), "").trim().to_string()
}

/// Deduplicate steps by underlying content (number stripped, case and
/// surrounding whitespace ignored), preserving first-seen order, then
/// renumber contiguously from 1.
pub fn dedupe_and_renumber(steps: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for step in steps {
        let content = step_content(step);
        if content.is_empty() {
            continue;
        }
        let key = content.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(content);
    }
    out.iter()
        .enumerate()
        .map(|(i, content)| format!("{}. {}", i + 1, content))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_status_qualification() {
        assert!(CommentStatus::Fetched.qualifies());
        assert!(!CommentStatus::Pending.qualifies());
        assert!(!CommentStatus::DateUnparseable.qualifies());
        assert!(!CommentStatus::ThreadIdUnresolvable.qualifies());
        assert!(!CommentStatus::FetchError.qualifies());
    }

    #[test]
    fn test_dedupe_and_renumber_contiguous() {
        let steps = vec![
            "3. Replace the fuel filter".to_string(),
            "1. Read the error codes".to_string(),
            "7. replace the FUEL filter  ".to_string(),
            "Clear the codes".to_string(),
        ];
        let out = dedupe_and_renumber(&steps);
        assert_eq!(
            out,
            vec![
                "1. Replace the fuel filter".to_string(),
                "2. Read the error codes".to_string(),
                "3. Clear the codes".to_string(),
            ]
        );
    }

    #[test]
    fn test_dedupe_drops_empty_steps() {
        let steps = vec!["1. ".to_string(), "  ".to_string(), "2. Inspect".to_string()];
        assert_eq!(dedupe_and_renumber(&steps), vec!["1. Inspect".to_string()]);
    }

    #[test]
    fn test_empty_consensus() {
        let result = ConsensusResult::empty();
        assert_eq!(result.provenance, Provenance::None);
        assert!(result.diagnosis.is_empty());
        assert!(result.solution_steps.is_empty());
        assert!(result.parts_needed.is_empty());
    }

    #[test]
    fn test_provenance_serde_tags() {
        let json = serde_json::to_string(&Provenance::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let back: Provenance = serde_json::from_str("\"community\"").unwrap();
        assert_eq!(back, Provenance::Community);
    }
}

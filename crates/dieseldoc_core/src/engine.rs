//! Single-report processing pipeline.
//!
//! One report per invocation, synchronous, start to finish: extract facts,
//! optionally describe the attached image, gate and fetch community
//! evidence, run web research, fall back to the assistant when community
//! evidence is insufficient, then arbitrate. The evidence channels are
//! independent: a failure in one degrades that channel to "no evidence"
//! and never aborts the others, so the pipeline always yields a result.

use crate::arbitrator::arbitrate;
use crate::capabilities::{Assistant, Comment, CommentSource, ImageAnalyst, WebSearch};
use crate::comment_eval::{evaluate_comments, CommunityEvidence};
use crate::evidence::{CommentStatus, ConsensusResult, EvidenceBundle, Provenance};
use crate::extractor::extract_vehicle_facts;
use crate::lexicon::Lexicon;
use crate::readiness::{evaluate, GateDecision};
use crate::report::{Report, VehicleFacts};
use chrono::NaiveDateTime;
use std::time::Duration;
use tracing::{debug, warn};

/// Everything one processing pass derives from a report. Terminal: a new
/// pass recomputes from scratch, never patches.
#[derive(Debug, Clone)]
pub struct ProcessedReport {
    pub report: Report,
    pub facts: VehicleFacts,
    /// Image description, used only to enrich the assistant prompt.
    pub image_description: Option<String>,
    /// Outcome of the community fetch attempt.
    pub comment_status: CommentStatus,
    /// Raw fetched comments (empty unless `comment_status` is `Fetched`).
    pub comments: Vec<Comment>,
    pub community: Option<CommunityEvidence>,
    pub web: Option<EvidenceBundle>,
    pub assistant: Option<EvidenceBundle>,
    pub consensus: ConsensusResult,
    /// Whether the pass produced anything worth keeping downstream.
    pub has_significant_content: bool,
}

/// The pipeline with its injected lexicon and capabilities.
pub struct Engine<'a> {
    lexicon: &'a Lexicon,
    comments: &'a dyn CommentSource,
    search: &'a dyn WebSearch,
    assistant: &'a dyn Assistant,
    images: &'a dyn ImageAnalyst,
    /// Pause after a comment fetch, courtesy toward the remote rate limit.
    fetch_pause: Duration,
}

impl<'a> Engine<'a> {
    pub fn new(
        lexicon: &'a Lexicon,
        comments: &'a dyn CommentSource,
        search: &'a dyn WebSearch,
        assistant: &'a dyn Assistant,
        images: &'a dyn ImageAnalyst,
    ) -> Self {
        Self {
            lexicon,
            comments,
            search,
            assistant,
            images,
            fetch_pause: Duration::from_secs(1),
        }
    }

    /// Override the post-fetch pause (tests use zero).
    pub fn with_fetch_pause(mut self, pause: Duration) -> Self {
        self.fetch_pause = pause;
        self
    }

    /// Process one report start to finish. `now` is injected so the
    /// readiness decision is deterministic.
    pub fn process(&self, report: &Report, now: NaiveDateTime) -> ProcessedReport {
        let facts = extract_vehicle_facts(&report.title, report.body.as_deref(), self.lexicon);
        debug!(report_id = %report.id, ?facts, "extracted vehicle facts");

        let image_description = self.describe_image(report, &facts);

        let (comment_status, comments) = self.fetch_community(report, now);
        let community = if comment_status == CommentStatus::Fetched {
            evaluate_comments(&comments, &facts, self.lexicon)
        } else {
            None
        };

        let web = facts
            .problem
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|problem| {
                crate::web_research::collect_web_evidence(problem, &facts, self.search, self.lexicon)
            });

        let assistant = self.assistant_fallback(
            report,
            &facts,
            comment_status,
            community.is_some(),
            image_description.as_deref(),
        );

        let consensus = arbitrate(
            assistant.as_ref(),
            community.as_ref().map(|c| &c.bundle),
            comment_status,
            web.as_ref(),
        );

        let has_significant_content = facts.problem.is_some()
            || community.is_some()
            || assistant.is_some()
            || web
                .as_ref()
                .map(|b| b.has_diagnosis() && b.score > 0.0)
                .unwrap_or(false)
            || report.has_image();

        ProcessedReport {
            report: report.clone(),
            facts,
            image_description,
            comment_status,
            comments,
            community,
            web,
            assistant,
            consensus,
            has_significant_content,
        }
    }

    /// Describe the attached image when one exists and a problem was
    /// extracted. The description only ever enriches the assistant prompt.
    fn describe_image(&self, report: &Report, facts: &VehicleFacts) -> Option<String> {
        if !report.has_image() {
            return None;
        }
        let Some(problem) = facts.problem.as_deref() else {
            debug!(report_id = %report.id, "image present but no problem extracted, skipping analysis");
            return None;
        };
        let image_url = report.image_url.as_deref()?;
        let context = format!(
            "Problème : {}. Véhicule : {}. Post : {}",
            problem,
            facts.vehicle_label(),
            report.combined_text()
        );
        match self.images.describe(image_url, &context) {
            Ok(description) => Some(description),
            Err(e) => {
                warn!(report_id = %report.id, "image analysis failed: {}", e);
                None
            }
        }
    }

    /// Run the readiness gate and, when eligible, the comment fetch.
    fn fetch_community(&self, report: &Report, now: NaiveDateTime) -> (CommentStatus, Vec<Comment>) {
        let thread_id = match evaluate(report, now) {
            GateDecision::Fetch { thread_id } => thread_id,
            GateDecision::Defer(status) => {
                debug!(report_id = %report.id, ?status, "community fetch deferred");
                return (status, Vec::new());
            }
        };

        match self.comments.fetch_comments(&thread_id) {
            Ok(comments) => {
                std::thread::sleep(self.fetch_pause);
                (CommentStatus::Fetched, comments)
            }
            Err(e) => {
                warn!(report_id = %report.id, "comment fetch failed: {}", e);
                (CommentStatus::FetchError, Vec::new())
            }
        }
    }

    /// Invoke the assistant when community evidence is insufficient. Its
    /// answer is authoritative in arbitration.
    fn assistant_fallback(
        &self,
        report: &Report,
        facts: &VehicleFacts,
        comment_status: CommentStatus,
        has_community_evidence: bool,
        image_description: Option<&str>,
    ) -> Option<EvidenceBundle> {
        if comment_status == CommentStatus::Fetched && has_community_evidence {
            return None;
        }
        let problem = facts.problem.as_deref()?;

        let mut enriched = match &report.body {
            Some(body) => format!("{} {}", report.title, body),
            None => report.title.clone(),
        };
        if let Some(description) = image_description {
            if !description.trim().is_empty() {
                enriched.push_str("\n\nDescription de l'image : ");
                enriched.push_str(description);
            }
        }

        match self.assistant.infer(problem, facts, &enriched) {
            Ok(reply) => Some(EvidenceBundle {
                diagnosis: reply.diagnosis,
                solution_steps: crate::evidence::dedupe_and_renumber(&reply.solution_steps),
                parts_needed: reply.parts_needed,
                score: 0.0,
                provenance: Provenance::Assistant,
            }),
            Err(e) => {
                warn!(report_id = %report.id, "assistant fallback failed: {}", e);
                None
            }
        }
    }
}

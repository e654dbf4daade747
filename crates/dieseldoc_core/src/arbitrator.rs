//! Consensus Arbitrator - one authoritative answer per report.
//!
//! A pure function over the per-channel bundles. Strict priority, first
//! satisfied wins: assistant (authoritative when invoked), then community
//! evidence whose fetch status qualifies, then web evidence with a
//! diagnosis and a positive score, then the empty result. No I/O, no side
//! effects; identical inputs always produce identical output.

use crate::evidence::{CommentStatus, ConsensusResult, EvidenceBundle};

/// Pick the winning answer from the available evidence channels.
///
/// `community_status` is the readiness/fetch outcome for the community
/// channel; only `Fetched` lets a community bundle win.
pub fn arbitrate(
    assistant: Option<&EvidenceBundle>,
    community: Option<&EvidenceBundle>,
    community_status: CommentStatus,
    web: Option<&EvidenceBundle>,
) -> ConsensusResult {
    if let Some(bundle) = assistant {
        return ConsensusResult::from_bundle(bundle);
    }

    if let Some(bundle) = community {
        if community_status.qualifies() {
            return ConsensusResult::from_bundle(bundle);
        }
    }

    if let Some(bundle) = web {
        if bundle.has_diagnosis() && bundle.score > 0.0 {
            return ConsensusResult::from_bundle(bundle);
        }
    }

    ConsensusResult::empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::Provenance;

    fn bundle(provenance: Provenance, diagnosis: &str, score: f64) -> EvidenceBundle {
        EvidenceBundle {
            diagnosis: diagnosis.to_string(),
            solution_steps: vec![format!("1. step from {}", provenance)],
            parts_needed: vec![],
            score,
            provenance,
        }
    }

    #[test]
    fn test_assistant_wins_over_everything() {
        let assistant = bundle(Provenance::Assistant, "assistant says", 0.0);
        let community = bundle(Provenance::Community, "community says", 5.0);
        let web = bundle(Provenance::Web, "web says", 2.0);

        let result = arbitrate(
            Some(&assistant),
            Some(&community),
            CommentStatus::Fetched,
            Some(&web),
        );
        assert_eq!(result.provenance, Provenance::Assistant);
        assert_eq!(result.diagnosis, "assistant says");
    }

    #[test]
    fn test_community_wins_when_no_assistant() {
        let community = bundle(Provenance::Community, "community says", 5.0);
        let web = bundle(Provenance::Web, "web says", 2.0);

        let result = arbitrate(None, Some(&community), CommentStatus::Fetched, Some(&web));
        assert_eq!(result.provenance, Provenance::Community);
    }

    #[test]
    fn test_disqualified_community_falls_through_to_web() {
        let community = bundle(Provenance::Community, "community says", 5.0);
        let web = bundle(Provenance::Web, "web says", 2.0);

        for status in [
            CommentStatus::Pending,
            CommentStatus::DateUnparseable,
            CommentStatus::ThreadIdUnresolvable,
            CommentStatus::FetchError,
        ] {
            let result = arbitrate(None, Some(&community), status, Some(&web));
            assert_eq!(result.provenance, Provenance::Web, "status {:?}", status);
        }
    }

    #[test]
    fn test_web_requires_diagnosis_and_positive_score() {
        let no_diagnosis = bundle(Provenance::Web, "", 2.0);
        let result = arbitrate(None, None, CommentStatus::Pending, Some(&no_diagnosis));
        assert_eq!(result.provenance, Provenance::None);

        let zero_score = bundle(Provenance::Web, "web says", 0.0);
        let result = arbitrate(None, None, CommentStatus::Pending, Some(&zero_score));
        assert_eq!(result.provenance, Provenance::None);

        let qualified = bundle(Provenance::Web, "web says", 0.2);
        let result = arbitrate(None, None, CommentStatus::Pending, Some(&qualified));
        assert_eq!(result.provenance, Provenance::Web);
    }

    #[test]
    fn test_all_channels_absent_yields_empty_none() {
        let result = arbitrate(None, None, CommentStatus::Pending, None);
        assert_eq!(result, ConsensusResult::empty());
    }

    #[test]
    fn test_idempotent_for_identical_inputs() {
        let community = bundle(Provenance::Community, "community says", 1.0);
        let first = arbitrate(None, Some(&community), CommentStatus::Fetched, None);
        let second = arbitrate(None, Some(&community), CommentStatus::Fetched, None);
        assert_eq!(first, second);
    }
}

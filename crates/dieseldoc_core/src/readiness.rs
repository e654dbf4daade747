//! Evidence Readiness Gate - time-based admission for community fetch.
//!
//! Community responses accrue over roughly two weeks; fetching earlier
//! yields misleadingly sparse consensus, so the gate defers instead of
//! producing a false negative. Only an `Eligible` decision proceeds to the
//! comment source; every other outcome short-circuits to "no community
//! evidence" for this pass, tagged with the status the arbitrator uses to
//! disqualify the channel.

use crate::evidence::CommentStatus;
use crate::report::Report;
use chrono::NaiveDateTime;
use regex::Regex;

/// Minimum report age, in days, before community evidence is fetched.
pub const MIN_DAYS_FOR_COMMENTS: i64 = 14;

/// Timestamp format of ingested reports, e.g. "June 03, 2025 at 08:15PM".
pub const POST_DATE_FORMAT: &str = "%B %d, %Y at %I:%M%p";

/// Outcome of the gate for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Proceed to comment fetch with this thread id.
    Fetch { thread_id: String },
    /// Skip community evidence for this pass, tagged with why.
    Defer(CommentStatus),
}

/// Decide whether community evidence may be fetched for this report.
pub fn evaluate(report: &Report, now: NaiveDateTime) -> GateDecision {
    let thread_url = match report.thread_url.as_deref() {
        Some(url) if url.contains("reddit.com/r/") => url,
        _ => return GateDecision::Defer(CommentStatus::ThreadIdUnresolvable),
    };

    let posted_at = match NaiveDateTime::parse_from_str(&report.created_at, POST_DATE_FORMAT) {
        Ok(dt) => dt,
        Err(_) => return GateDecision::Defer(CommentStatus::DateUnparseable),
    };

    let elapsed_days = (now - posted_at).num_days();
    if elapsed_days < MIN_DAYS_FOR_COMMENTS {
        return GateDecision::Defer(CommentStatus::Pending);
    }

    match extract_thread_id(thread_url) {
        Some(thread_id) => GateDecision::Fetch { thread_id },
        None => GateDecision::Defer(CommentStatus::ThreadIdUnresolvable),
    }
}

/// Pull the thread identifier out of a discussion URL.
pub fn extract_thread_id(url: &str) -> Option<String> {
    let re = Regex::new(r"reddit\.com/r/[^/]+/comments/([^/]+)/").unwrap();
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

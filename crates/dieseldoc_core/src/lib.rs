//! DieselDoc Core - diagnostic consensus engine for vehicle malfunction reports.
//!
//! Extracts vehicle facts from free-text reports, gathers evidence from
//! community comments, web search, and a generative assistant, and
//! arbitrates one authoritative consensus per report. Synchronous,
//! one report at a time; every evidence channel degrades independently.

pub mod analytics;
pub mod arbitrator;
pub mod capabilities;
pub mod comment_eval;
pub mod engine;
pub mod evidence;
pub mod extractor;
pub mod lexicon;
pub mod qa;
pub mod readiness;
pub mod report;
pub mod web_research;

pub use engine::{Engine, ProcessedReport};
pub use evidence::{CommentStatus, ConsensusResult, EvidenceBundle, Provenance};
pub use lexicon::Lexicon;
pub use report::{Report, VehicleFacts};

//! Command implementations.

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use dieseldoc_core::capabilities::{
    Assistant, CapabilityEndpoint, CapabilityError, CommentSource, FakeAssistant,
    FakeCommentSource, FakeImageAnalyst, FakeWebSearch, HttpAssistant, HttpCommentSource,
    HttpImageAnalyst, HttpWebSearch, ImageAnalyst, WebSearch,
};
use dieseldoc_core::{analytics, extractor, qa};
use dieseldoc_core::{Engine, Lexicon, ProcessedReport, Report};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::output;

/// Reference clock accepted on the command line, e.g. "2025-06-20 20:15".
pub const AS_OF_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Ingestion payload: a report whose id may be missing.
#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    id: Option<String>,
    created_at: String,
    #[serde(default)]
    author: Option<String>,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    thread_url: Option<String>,
    #[serde(default)]
    subreddit: Option<String>,
}

impl RawReport {
    fn into_report(self) -> Report {
        let mut report = Report::new(self.id, &self.created_at, &self.title);
        report.author = self.author;
        report.body = self.body;
        report.image_url = self.image_url;
        report.thread_url = self.thread_url;
        report.subreddit = self.subreddit;
        report
    }
}

/// Load one report or an array of reports from a JSON file.
pub fn load_reports(path: &Path) -> Result<Vec<Report>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report file {}", path.display()))?;

    let raws: Vec<RawReport> = if data.trim_start().starts_with('[') {
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse report array from {}", path.display()))?
    } else {
        vec![serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse report from {}", path.display()))?]
    };

    Ok(raws.into_iter().map(RawReport::into_report).collect())
}

/// The full capability set behind one engine run.
pub struct Capabilities {
    pub comments: Box<dyn CommentSource>,
    pub search: Box<dyn WebSearch>,
    pub assistant: Box<dyn Assistant>,
    pub images: Box<dyn ImageAnalyst>,
}

impl Capabilities {
    /// HTTP-backed capabilities against one endpoint.
    pub fn http(endpoint: &str, api_key: Option<String>, timeout_secs: u64) -> Result<Self> {
        let config = CapabilityEndpoint {
            endpoint: endpoint.to_string(),
            api_key,
            timeout_secs,
        };
        Ok(Self {
            comments: Box::new(HttpCommentSource::new(config.clone())?),
            search: Box::new(HttpWebSearch::new(config.clone())?),
            assistant: Box::new(HttpAssistant::new(config.clone())?),
            images: Box::new(HttpImageAnalyst::new(config)?),
        })
    }

    /// Offline capabilities: every external channel degrades, extraction
    /// and arbitration still run.
    pub fn offline() -> Self {
        Self {
            comments: Box::new(FakeCommentSource::always_error(CapabilityError::Http(
                "offline mode".to_string(),
            ))),
            search: Box::new(FakeWebSearch::empty()),
            assistant: Box::new(FakeAssistant::always_error(CapabilityError::EmptyResponse)),
            images: Box::new(FakeImageAnalyst::always_error(
                CapabilityError::EmptyResponse,
            )),
        }
    }
}

/// Parse the reference clock, defaulting to the current UTC time.
pub fn resolve_as_of(as_of: Option<&str>) -> Result<NaiveDateTime> {
    match as_of {
        Some(text) => NaiveDateTime::parse_from_str(text, AS_OF_FORMAT)
            .with_context(|| format!("Invalid --as-of value '{}', expected {}", text, AS_OF_FORMAT)),
        None => Ok(Utc::now().naive_utc()),
    }
}

fn run_engine(
    reports: &[Report],
    lexicon: &Lexicon,
    caps: &Capabilities,
    now: NaiveDateTime,
) -> Vec<ProcessedReport> {
    let engine = Engine::new(
        lexicon,
        caps.comments.as_ref(),
        caps.search.as_ref(),
        caps.assistant.as_ref(),
        caps.images.as_ref(),
    );
    reports
        .iter()
        .map(|report| {
            info!(report_id = %report.id, "processing report");
            engine.process(report, now)
        })
        .collect()
}

/// `process`: run the pipeline and render each consensus.
pub fn process(
    input: &Path,
    lexicon_path: Option<&Path>,
    caps: &Capabilities,
    as_of: Option<&str>,
    json: bool,
) -> Result<()> {
    let reports = load_reports(input)?;
    let lexicon = Lexicon::load_or_default(lexicon_path)?;
    let now = resolve_as_of(as_of)?;

    let processed = run_engine(&reports, &lexicon, caps, now);
    if json {
        for p in &processed {
            println!("{}", serde_json::to_string(&output::ProcessedJson::from(p))?);
        }
    } else {
        for p in &processed {
            output::display_processed(p);
        }
    }
    Ok(())
}

/// `extract`: fact extraction only, no evidence channels.
pub fn extract(title: &str, body: Option<&str>, lexicon_path: Option<&Path>) -> Result<()> {
    let lexicon = Lexicon::load_or_default(lexicon_path)?;
    let facts = extractor::extract_vehicle_facts(title, body, &lexicon);
    output::display_facts(&facts);
    Ok(())
}

/// `qa`: emit one JSONL line per qualifying report.
pub fn qa_pairs(
    input: &Path,
    lexicon_path: Option<&Path>,
    caps: &Capabilities,
    as_of: Option<&str>,
) -> Result<()> {
    let reports = load_reports(input)?;
    let lexicon = Lexicon::load_or_default(lexicon_path)?;
    let now = resolve_as_of(as_of)?;

    let processed = run_engine(&reports, &lexicon, caps, now);
    let mut emitted = 0usize;
    for p in &processed {
        if let Some(pair) = qa::generate_qa_pair(p) {
            println!("{}", serde_json::to_string(&pair)?);
            emitted += 1;
        }
    }
    info!(emitted, total = processed.len(), "generated Q&A pairs");
    Ok(())
}

/// `metrics`: batch coverage summary.
pub fn metrics(
    input: &Path,
    lexicon_path: Option<&Path>,
    caps: &Capabilities,
    as_of: Option<&str>,
    json: bool,
) -> Result<()> {
    let reports = load_reports(input)?;
    let lexicon = Lexicon::load_or_default(lexicon_path)?;
    let now = resolve_as_of(as_of)?;

    let processed = run_engine(&reports, &lexicon, caps, now);
    let summary = analytics::summarize(&processed);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        output::display_metrics(&summary);
    }
    Ok(())
}

/// `lexicon-init`: write the built-in lexicon as an editable TOML file.
pub fn lexicon_init(path: &Path) -> Result<()> {
    let lexicon = Lexicon::default();
    lexicon.save(path)?;
    println!("Wrote default lexicon to {}", path.display());
    Ok(())
}

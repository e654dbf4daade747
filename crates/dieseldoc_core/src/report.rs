//! Malfunction reports and the facts extracted from them.
//!
//! A `Report` is one ingested account of a vehicle problem (title, body,
//! ingestion metadata). It is immutable once built; everything derived from
//! it (`VehicleFacts`, evidence bundles, the consensus) is recomputed fresh
//! on every processing pass.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One malfunction account, as delivered by the ingestion layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Unique identifier. Generated when the ingestion payload has none.
    pub id: String,
    /// Raw creation timestamp, e.g. "June 03, 2025 at 08:15PM".
    /// Parsed by the readiness gate, never mutated here.
    pub created_at: String,
    /// Author of the report, when known.
    #[serde(default)]
    pub author: Option<String>,
    /// Free-text title.
    pub title: String,
    /// Free-text body. Missing bodies are treated as empty everywhere.
    #[serde(default)]
    pub body: Option<String>,
    /// Attached image reference, if any.
    #[serde(default)]
    pub image_url: Option<String>,
    /// External discussion thread reference, if any.
    #[serde(default)]
    pub thread_url: Option<String>,
    /// Community the report came from, when known.
    #[serde(default)]
    pub subreddit: Option<String>,
}

impl Report {
    /// Build a report, generating an id when the payload carried none.
    pub fn new(id: Option<String>, created_at: &str, title: &str) -> Self {
        let id = match id {
            Some(id) if !id.trim().is_empty() => id,
            _ => format!("post_{}", Uuid::new_v4()),
        };
        Self {
            id,
            created_at: created_at.to_string(),
            author: None,
            title: title.to_string(),
            body: None,
            image_url: None,
            thread_url: None,
            subreddit: None,
        }
    }

    /// Title and body concatenated and lower-cased, the form every
    /// extraction rule matches against.
    pub fn combined_text(&self) -> String {
        match &self.body {
            Some(body) => format!("{} {}", self.title, body).to_lowercase(),
            None => self.title.to_lowercase(),
        }
    }

    /// Whether the report carries a usable image reference.
    pub fn has_image(&self) -> bool {
        self.image_url
            .as_deref()
            .map(|url| url.trim() != "#REF!" && url.to_lowercase().contains("http"))
            .unwrap_or(false)
    }
}

/// Structured vehicle identity and problem description extracted from a
/// report. Every field is independently nullable; first match wins and no
/// field is ever merged or partially updated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleFacts {
    pub vehicle_type: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub problem: Option<String>,
}

impl VehicleFacts {
    /// Whether extraction found nothing at all.
    pub fn is_empty(&self) -> bool {
        self.vehicle_type.is_none()
            && self.brand.is_none()
            && self.model.is_none()
            && self.year.is_none()
            && self.problem.is_none()
    }

    /// Short "brand model year" label for templated sentences, with
    /// placeholders for missing fields the way the diagnosis text expects.
    pub fn vehicle_label(&self) -> String {
        let brand = self.brand.as_deref().unwrap_or("un véhicule");
        let model = self.model.as_deref().unwrap_or("");
        let year = self.year.as_deref().unwrap_or("");
        format!("{} {} {}", brand, model, year)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generated_when_missing() {
        let report = Report::new(None, "June 03, 2025 at 08:15PM", "title");
        assert!(report.id.starts_with("post_"));

        let report = Report::new(Some("  ".to_string()), "June 03, 2025 at 08:15PM", "title");
        assert!(report.id.starts_with("post_"));

        let report = Report::new(Some("abc123".to_string()), "June 03, 2025 at 08:15PM", "title");
        assert_eq!(report.id, "abc123");
    }

    #[test]
    fn test_combined_text_lowercases_and_handles_missing_body() {
        let mut report = Report::new(None, "", "My F150 SMOKES");
        assert_eq!(report.combined_text(), "my f150 smokes");

        report.body = Some("Blue Smoke at startup".to_string());
        assert_eq!(report.combined_text(), "my f150 smokes blue smoke at startup");
    }

    #[test]
    fn test_has_image_rejects_placeholder() {
        let mut report = Report::new(None, "", "title");
        assert!(!report.has_image());

        report.image_url = Some("#REF!".to_string());
        assert!(!report.has_image());

        report.image_url = Some("https://i.imgur.com/x.jpg".to_string());
        assert!(report.has_image());
    }

    #[test]
    fn test_vehicle_label_placeholders() {
        let facts = VehicleFacts::default();
        assert_eq!(facts.vehicle_label(), "un véhicule");

        let facts = VehicleFacts {
            brand: Some("ford".to_string()),
            model: Some("f150".to_string()),
            year: Some("2015".to_string()),
            ..Default::default()
        };
        assert_eq!(facts.vehicle_label(), "ford f150 2015");
    }
}

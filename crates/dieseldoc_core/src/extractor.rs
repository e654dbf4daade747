//! Entity Extractor - layered fact extraction from report text.
//!
//! Turns a raw title/body pair into a `VehicleFacts` tuple by matching the
//! injected lexicon against the lower-cased combined text. Every field is
//! filled at most once, first match wins, and a no-match leaves the field
//! unset - absence is a valid terminal state, never an error.

use crate::lexicon::Lexicon;
use crate::report::VehicleFacts;
use regex::Regex;

/// Four-digit years accepted as model years: 1950-1999, 2000-2029, 2030.
const YEAR_PATTERN: &str = r"\b(19[5-9]\d|20[0-2]\d|2030)\b";

/// Extract vehicle identity and problem description from report text.
pub fn extract_vehicle_facts(title: &str, body: Option<&str>, lexicon: &Lexicon) -> VehicleFacts {
    let combined = match body {
        Some(body) => format!("{} {}", title, body).to_lowercase(),
        None => title.to_lowercase(),
    };

    let mut facts = VehicleFacts {
        year: extract_year(&combined),
        ..Default::default()
    };

    let (brand, model) = extract_brand_and_model(&combined, lexicon);
    facts.brand = brand;
    facts.model = model;

    facts.vehicle_type = extract_vehicle_type(&combined, lexicon);
    if facts.vehicle_type.is_none() && (facts.brand.is_some() || facts.model.is_some()) {
        facts.vehicle_type = infer_vehicle_type(&facts, lexicon);
    }

    facts.problem =
        extract_problem(&combined, lexicon).or_else(|| extract_problem_fallback(&combined));

    facts
}

/// First 4-digit substring within the accepted ranges.
fn extract_year(text: &str) -> Option<String> {
    let re = Regex::new(YEAR_PATTERN).unwrap();
    re.find(text).map(|m| m.as_str().to_string())
}

/// Walk the ordered brand table; a brand matches on its own name or any of
/// its model keywords. The model is the first model keyword (other than the
/// brand name itself) found in the text. Stops at the first matching brand.
fn extract_brand_and_model(text: &str, lexicon: &Lexicon) -> (Option<String>, Option<String>) {
    for entry in &lexicon.brands {
        let brand_hit =
            text.contains(entry.name.as_str()) || entry.models.iter().any(|m| text.contains(m.as_str()));
        if !brand_hit {
            continue;
        }
        let model = entry
            .models
            .iter()
            .find(|m| text.contains(m.as_str()) && **m != entry.name)
            .cloned();
        return (Some(entry.name.clone()), model);
    }
    (None, None)
}

/// First vehicle-type keyword found in the text.
fn extract_vehicle_type(text: &str, lexicon: &Lexicon) -> Option<String> {
    lexicon
        .vehicle_types
        .iter()
        .find(|vt| text.contains(vt.as_str()))
        .cloned()
}

/// Classify as truck or car from the allow-lists when no explicit type
/// keyword appeared but a brand or model did.
fn infer_vehicle_type(facts: &VehicleFacts, lexicon: &Lexicon) -> Option<String> {
    let brand = facts.brand.as_deref();
    let model = facts.model.as_deref();

    let brand_in = |list: &[String]| brand.map(|b| list.iter().any(|x| x == b)).unwrap_or(false);
    let model_in = |list: &[String]| {
        model
            .map(|m| list.iter().any(|x| m.contains(x.as_str())))
            .unwrap_or(false)
    };

    if brand_in(&lexicon.truck_brands) || model_in(&lexicon.truck_models) {
        Some("truck".to_string())
    } else if brand_in(&lexicon.car_brands) || model_in(&lexicon.car_models) {
        Some("car".to_string())
    } else {
        None
    }
}

/// First problem keyword found, widened to up to 5 surrounding words on each
/// side. When widening fails the bare keyword is kept.
fn extract_problem(text: &str, lexicon: &Lexicon) -> Option<String> {
    for keyword in &lexicon.problems {
        if !text.contains(keyword.as_str()) {
            continue;
        }
        let window = format!(
            r"(\S+\s+){{0,5}}{}(\s+\S+){{0,5}}",
            regex::escape(keyword)
        );
        let widened = Regex::new(&window)
            .ok()
            .and_then(|re| re.find(text).map(|m| m.as_str().trim().to_string()));
        return Some(widened.unwrap_or_else(|| keyword.clone()));
    }
    None
}

/// Generic question/trouble-report patterns tried, in order, when no problem
/// keyword matched.
fn extract_problem_fallback(text: &str) -> Option<String> {
    let patterns = [
        r"(what|how|why|is|can|does).{5,50}\?",
        r"(issue|problem|trouble).{5,50}",
        r"(need|looking).{5,50}(help|advice)",
        r"(not).{1,10}(working|running|starting)",
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).unwrap();
        if let Some(m) = re.find(text) {
            return Some(m.as_str().trim().to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> Lexicon {
        Lexicon::default()
    }

    #[test]
    fn test_year_within_bounds() {
        assert_eq!(extract_year("my 2015 truck"), Some("2015".to_string()));
        assert_eq!(extract_year("a 1950 classic"), Some("1950".to_string()));
        assert_eq!(extract_year("year 2030 model"), Some("2030".to_string()));
        // Out of range on both sides.
        assert_eq!(extract_year("built in 1949"), None);
        assert_eq!(extract_year("hypothetical 2031"), None);
    }

    #[test]
    fn test_year_first_occurrence_wins() {
        assert_eq!(
            extract_year("bought in 2008, rebuilt in 2015"),
            Some("2008".to_string())
        );
    }

    #[test]
    fn test_brand_matches_via_model_keyword() {
        // "f150" appears, "ford" does not: brand still resolves to ford.
        let (brand, model) = extract_brand_and_model("my f150 smokes", &lexicon());
        assert_eq!(brand, Some("ford".to_string()));
        assert_eq!(model, Some("f150".to_string()));
    }

    #[test]
    fn test_brand_first_dictionary_entry_wins() {
        // Both detroit and ford terms present; detroit precedes ford in the table.
        let (brand, _) = extract_brand_and_model("detroit swap into my f250", &lexicon());
        assert_eq!(brand, Some("detroit".to_string()));
    }

    #[test]
    fn test_model_excludes_brand_name_itself() {
        // "detroit" is listed among its own models and must not become the model.
        let (brand, model) = extract_brand_and_model("old detroit engine", &lexicon());
        assert_eq!(brand, Some("detroit".to_string()));
        assert_eq!(model, None);
    }

    #[test]
    fn test_vehicle_type_inference_truck_and_car() {
        let facts = extract_vehicle_facts("2015 f150 blue smoke", None, &lexicon());
        assert_eq!(facts.vehicle_type, Some("truck".to_string()));

        let facts = extract_vehicle_facts("my jetta tdi stalls", None, &lexicon());
        assert_eq!(facts.vehicle_type, Some("car".to_string()));
    }

    #[test]
    fn test_explicit_type_beats_inference() {
        let facts = extract_vehicle_facts("my jetta van stalls", None, &lexicon());
        // "van" is an explicit type keyword and wins over car inference.
        assert_eq!(facts.vehicle_type, Some("van".to_string()));
    }

    #[test]
    fn test_problem_widened_with_context() {
        let facts = extract_vehicle_facts(
            "My 2015 Ford F150 has blue smoke at startup",
            Some(""),
            &lexicon(),
        );
        let problem = facts.problem.unwrap();
        assert!(problem.contains("blue smoke"));
        assert!(problem.contains("startup"));
    }

    #[test]
    fn test_problem_fallback_question_pattern() {
        let facts = extract_vehicle_facts(
            "why does my engine sound weird?",
            None,
            &lexicon(),
        );
        let problem = facts.problem.unwrap();
        assert!(problem.ends_with('?'));
        assert!(problem.starts_with("why"));
    }

    #[test]
    fn test_problem_fallback_not_working_pattern() {
        let facts =
            extract_vehicle_facts("heater is not working anymore", None, &lexicon());
        assert!(facts.problem.unwrap().starts_with("not"));
    }

    #[test]
    fn test_no_match_leaves_all_fields_unset() {
        let facts = extract_vehicle_facts("hello there", None, &lexicon());
        assert!(facts.is_empty());
    }

    #[test]
    fn test_full_extraction_blue_smoke_f150() {
        let facts = extract_vehicle_facts(
            "My 2015 Ford F150 has blue smoke at startup",
            Some(""),
            &lexicon(),
        );
        assert_eq!(facts.year, Some("2015".to_string()));
        assert_eq!(facts.brand, Some("ford".to_string()));
        assert_eq!(facts.model, Some("f150".to_string()));
        assert_eq!(facts.vehicle_type, Some("truck".to_string()));
        assert!(facts.problem.unwrap().contains("blue smoke"));
    }
}

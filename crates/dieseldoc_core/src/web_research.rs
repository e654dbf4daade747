//! Web Evidence Collector - external search mined into a diagnosis.
//!
//! Issues four fixed query templates to the search capability and mines the
//! returned snippets for actionable repair hints. Scoring is additive and
//! deliberately uncapped: +0.5 for every trusted-domain name appearing in a
//! result URL, +0.2 for every snippet carrying an action verb. Downstream
//! arbitration only ever tests score > 0, never magnitude.

use crate::capabilities::{SearchHit, WebSearch};
use crate::evidence::{dedupe_and_renumber, EvidenceBundle, Provenance};
use crate::lexicon::Lexicon;
use crate::report::VehicleFacts;
use tracing::warn;

/// Score increment per trusted-domain mention in a result URL.
const DOMAIN_TRUST_INCREMENT: f64 = 0.5;
/// Score increment per snippet containing an action verb.
const ACTION_KEYWORD_INCREMENT: f64 = 0.2;
/// Snippet excerpt length used in the fallback diagnosis.
const EXCERPT_CHARS: usize = 100;

/// The four fixed query templates, with problem/brand/model substituted.
pub fn build_queries(problem: &str, facts: &VehicleFacts) -> Vec<String> {
    let brand = facts.brand.as_deref().unwrap_or("");
    let model = facts.model.as_deref().unwrap_or("");
    vec![
        format!("solution {} {} {} diesel", problem, brand, model),
        format!("{} {} {} réparation vidéo", brand, model, problem),
        format!("{} {} {} forum discussion", problem, brand, model),
        format!("diagnostic {} {} {} pdf", problem, brand, model),
    ]
}

/// Run the web research channel for one report.
///
/// Search failures degrade to zero results; the channel never fails the
/// caller.
pub fn collect_web_evidence(
    problem: &str,
    facts: &VehicleFacts,
    search: &dyn WebSearch,
    lexicon: &Lexicon,
) -> EvidenceBundle {
    let queries = build_queries(problem, facts);

    let per_query = match search.search(&queries) {
        Ok(results) => results,
        Err(e) => {
            warn!("Web search failed, degrading channel to no evidence: {}", e);
            Vec::new()
        }
    };
    let hits: Vec<&SearchHit> = per_query.iter().flatten().collect();

    let mut score = 0.0;
    let mut steps: Vec<String> = Vec::new();
    let mut parts: Vec<String> = Vec::new();
    let add = |list: &mut Vec<String>, item: &str| {
        if !list.iter().any(|x| x == item) {
            list.push(item.to_string());
        }
    };

    for hit in &hits {
        let url = hit.url.to_lowercase();
        let snippet = hit.snippet.to_lowercase();

        // Additive per matching domain, not capped at one per result.
        for domain in &lexicon.trusted_domains {
            if url.contains(domain.as_str()) {
                score += DOMAIN_TRUST_INCREMENT;
            }
        }

        if lexicon
            .action_keywords
            .iter()
            .any(|kw| snippet.contains(kw.as_str()))
        {
            score += ACTION_KEYWORD_INCREMENT;

            if snippet.contains("capteur") {
                add(&mut steps, "Vérifier/tester le capteur [spécifique si mentionné].");
            }
            if snippet.contains("injecteur") {
                add(&mut steps, "Tester et potentiellement remplacer les injecteurs.");
            }
            if snippet.contains("egr") {
                add(&mut steps, "Nettoyer ou remplacer la vanne EGR.");
            }
            if snippet.contains("dpf") || snippet.contains("fap") {
                add(
                    &mut steps,
                    "Diagnostiquer le FAP et effectuer une régénération si nécessaire.",
                );
            }
            if snippet.contains("turbo") {
                add(&mut steps, "Inspecter le turbo pour un jeu excessif ou des fuites.");
            }

            if snippet.contains("capteur") && snippet.contains("remplacement") {
                add(&mut parts, "Capteur [spécifique]");
            }
            if snippet.contains("injecteur") && snippet.contains("remplacement") {
                add(&mut parts, "Injecteur(s)");
            }
            if snippet.contains("vanne egr") {
                add(&mut parts, "Vanne EGR");
            }
            if snippet.contains("filtre") {
                add(&mut parts, "Filtre [carburant/air/huile]");
            }
        }
    }

    let diagnosis = build_diagnosis(problem, &steps, &hits);

    EvidenceBundle {
        diagnosis,
        solution_steps: dedupe_and_renumber(&steps),
        parts_needed: parts,
        score,
        provenance: Provenance::Web,
    }
}

/// Summarize the findings: name up to the first two derived steps, else
/// quote a truncated excerpt of the first snippet, else stay empty.
fn build_diagnosis(problem: &str, steps: &[String], hits: &[&SearchHit]) -> String {
    if !steps.is_empty() {
        let highlights = steps
            .iter()
            .take(2)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        return format!(
            "La recherche web suggère un diagnostic et des solutions potentielles pour le problème de '{}'. Les étapes clés incluent : {}.",
            problem, highlights
        );
    }
    if let Some(first) = hits.first() {
        let excerpt: String = first.snippet.chars().take(EXCERPT_CHARS).collect();
        return format!(
            "La recherche web a trouvé des discussions autour de '{}' sur des véhicules similaires, avec des mentions de : {}...",
            problem, excerpt
        );
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{CapabilityError, FakeWebSearch};
    use crate::lexicon::Lexicon;

    fn facts() -> VehicleFacts {
        VehicleFacts {
            brand: Some("ford".to_string()),
            model: Some("f150".to_string()),
            ..Default::default()
        }
    }

    fn hit(url: &str, snippet: &str) -> SearchHit {
        SearchHit {
            url: url.to_string(),
            snippet: snippet.to_string(),
        }
    }

    #[test]
    fn test_query_templates_substitute_fields() {
        let queries = build_queries("fumée bleue", &facts());
        assert_eq!(queries.len(), 4);
        assert_eq!(queries[0], "solution fumée bleue ford f150 diesel");
        assert_eq!(queries[1], "ford f150 fumée bleue réparation vidéo");
        assert_eq!(queries[3], "diagnostic fumée bleue ford f150 pdf");
    }

    #[test]
    fn test_trusted_domain_plus_action_keyword_scoring() {
        // Trusted domain (+0.5) and "vérifier le capteur" snippet (+0.2).
        let search = FakeWebSearch::with_results(vec![vec![hit(
            "https://www.youtube.com/watch?v=x",
            "vérifier le capteur de pression",
        )]]);
        let bundle = collect_web_evidence("fumée bleue", &facts(), &search, &Lexicon::default());
        assert!((bundle.score - 0.7).abs() < 1e-9);
        assert_eq!(bundle.solution_steps.len(), 1);
        assert!(bundle.solution_steps[0].contains("capteur"));
        assert!(bundle.solution_steps[0].starts_with("1. "));
        assert_eq!(bundle.provenance, Provenance::Web);
    }

    #[test]
    fn test_domain_scoring_is_additive_and_uncapped() {
        // "reddit.com" appears in two result URLs; each adds 0.5.
        let search = FakeWebSearch::with_results(vec![vec![
            hit("https://www.reddit.com/r/Diesel/1", "rien"),
            hit("https://www.reddit.com/r/Diesel/2", "rien"),
        ]]);
        let bundle = collect_web_evidence("bruit", &facts(), &search, &Lexicon::default());
        assert!((bundle.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_action_snippet_without_trusted_domain() {
        let search = FakeWebSearch::with_results(vec![vec![hit(
            "https://obscure-blog.example/post",
            "il faut remplacer les injecteur rapidement, remplacement conseillé",
        )]]);
        let bundle = collect_web_evidence("misfire", &facts(), &search, &Lexicon::default());
        assert!((bundle.score - 0.2).abs() < 1e-9);
        assert!(bundle
            .solution_steps
            .iter()
            .any(|s| s.contains("injecteurs")));
        assert!(bundle.parts_needed.contains(&"Injecteur(s)".to_string()));
    }

    #[test]
    fn test_diagnosis_names_first_two_steps() {
        let search = FakeWebSearch::with_results(vec![vec![hit(
            "https://www.ford.com/support",
            "vérifier le capteur, nettoyer la vanne egr et inspecter le turbo",
        )]]);
        let bundle = collect_web_evidence("power loss", &facts(), &search, &Lexicon::default());
        assert!(bundle.diagnosis.contains("Les étapes clés incluent"));
        assert!(bundle.diagnosis.contains("capteur"));
        assert!(bundle.diagnosis.contains("vanne EGR"));
        // Third derived step is not part of the summary.
        assert!(!bundle.diagnosis.contains("turbo"));
        assert_eq!(bundle.solution_steps.len(), 3);
    }

    #[test]
    fn test_snippet_excerpt_fallback_diagnosis() {
        let long_snippet = "a".repeat(150);
        let search = FakeWebSearch::with_results(vec![vec![hit(
            "https://obscure-blog.example/post",
            &long_snippet,
        )]]);
        let bundle = collect_web_evidence("stall", &facts(), &search, &Lexicon::default());
        assert!(bundle.diagnosis.contains(&"a".repeat(100)));
        assert!(!bundle.diagnosis.contains(&"a".repeat(101)));
        assert!(bundle.diagnosis.ends_with("..."));
        assert_eq!(bundle.score, 0.0);
        assert!(bundle.solution_steps.is_empty());
    }

    #[test]
    fn test_search_failure_degrades_to_empty_bundle() {
        let search = FakeWebSearch::always_error(CapabilityError::Http("dns".to_string()));
        let bundle = collect_web_evidence("stall", &facts(), &search, &Lexicon::default());
        assert!(bundle.diagnosis.is_empty());
        assert!(bundle.solution_steps.is_empty());
        assert!(bundle.parts_needed.is_empty());
        assert_eq!(bundle.score, 0.0);
    }

    #[test]
    fn test_no_results_yields_empty_diagnosis() {
        let search = FakeWebSearch::empty();
        let bundle = collect_web_evidence("stall", &facts(), &search, &Lexicon::default());
        assert!(bundle.diagnosis.is_empty());
        assert_eq!(bundle.score, 0.0);
    }
}

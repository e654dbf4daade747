//! Comment Evidence Evaluator - community discussion into a diagnosis.
//!
//! Filters deleted/empty comments, scores the remainder against the
//! lexicon's relevance and credibility keyword sets, then derives a
//! templated diagnosis sentence and an ordered repair plan from fixed
//! trigger-phrase rules. Zero valid comments means no bundle - that is
//! "no evidence", not an error.

use crate::capabilities::Comment;
use crate::evidence::{dedupe_and_renumber, EvidenceBundle, Provenance};
use crate::lexicon::Lexicon;
use crate::report::VehicleFacts;

/// Aggregate keyword scores over the valid comments of one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentScore {
    pub relevance_total: u32,
    pub credibility_total: u32,
    pub comments_analyzed: usize,
}

impl CommentScore {
    pub fn combined(&self) -> u32 {
        self.relevance_total + self.credibility_total
    }
}

/// The community channel's full output: the bundle plus its raw scores.
#[derive(Debug, Clone)]
pub struct CommunityEvidence {
    pub bundle: EvidenceBundle,
    pub score: CommentScore,
}

/// Evaluate community comments into an evidence bundle.
///
/// Returns `None` when no valid comment remains after filtering.
pub fn evaluate_comments(
    comments: &[Comment],
    facts: &VehicleFacts,
    lexicon: &Lexicon,
) -> Option<CommunityEvidence> {
    let valid: Vec<&Comment> = comments.iter().filter(|c| c.is_valid()).collect();
    if valid.is_empty() {
        return None;
    }

    let score = score_comments(&valid, lexicon);
    let diagnosis = build_diagnosis(&valid, facts);
    let (solution_steps, parts_needed) = build_solution_plan(&valid, facts);

    let bundle = EvidenceBundle {
        diagnosis,
        solution_steps,
        parts_needed,
        score: score.combined() as f64,
        provenance: Provenance::Community,
    };

    Some(CommunityEvidence { bundle, score })
}

/// Count relevance and credibility keyword hits, one per keyword per
/// comment, case-insensitive substring matching.
fn score_comments(valid: &[&Comment], lexicon: &Lexicon) -> CommentScore {
    let mut relevance_total = 0;
    let mut credibility_total = 0;

    for comment in valid {
        let body = comment.body.to_lowercase();
        relevance_total += lexicon
            .relevance_keywords
            .iter()
            .filter(|kw| body.contains(kw.as_str()))
            .count() as u32;
        credibility_total += lexicon
            .credibility_indicators
            .iter()
            .filter(|kw| body.contains(kw.as_str()))
            .count() as u32;
    }

    CommentScore {
        relevance_total,
        credibility_total,
        comments_analyzed: valid.len(),
    }
}

/// Build the templated diagnosis sentence from per-comment trigger phrases.
fn build_diagnosis(valid: &[&Comment], facts: &VehicleFacts) -> String {
    let problem = facts.problem.as_deref().unwrap_or("un problème non spécifié");
    let mut text = format!(
        "Concernant le problème '{}' sur le véhicule {} : ",
        problem,
        facts.vehicle_label()
    );

    let mut solutions: Vec<&str> = Vec::new();
    let propose = |solutions: &mut Vec<&str>, s: &'static str| {
        if !solutions.contains(&s) {
            solutions.push(s);
        }
    };

    for comment in valid {
        let body = comment.body.to_lowercase();

        if body.contains("capteur de pression de carburant") {
            propose(
                &mut solutions,
                "vérification/remplacement du capteur de pression de carburant",
            );
        }
        if body.contains("egr") && body.contains("nettoyage") {
            propose(&mut solutions, "nettoyage de la vanne EGR");
        }
        if body.contains("fumée bleue") && (body.contains("turbo") || body.contains("segment")) {
            propose(
                &mut solutions,
                "inspection du turbo ou des segments de piston pour consommation d'huile",
            );
        }
        if body.contains("bougies de préchauffage") && body.contains("démarrage à froid") {
            propose(&mut solutions, "remplacement des bougies de préchauffage");
        }
        if body.contains("fuites de carburant")
            && (body.contains("filtre") || body.contains("injecteurs"))
        {
            propose(
                &mut solutions,
                "vérification des fuites au niveau du filtre à carburant ou des injecteurs",
            );
        }
        if body.contains("diesel") && body.contains("additif") {
            propose(
                &mut solutions,
                "utilisation d'un additif diesel pour nettoyer le système de carburant",
            );
        }
        if body.contains("dpf") && body.contains("regen") {
            propose(&mut solutions, "effectuer une régénération forcée du FAP");
        }
        if body.contains("check engine") && body.contains("code") {
            propose(
                &mut solutions,
                "diagnostiquer avec un scanner OBD-II pour lire les codes d'erreur",
            );
        }
    }

    if solutions.is_empty() {
        text.push_str("les commentaires pertinents n'ont pas fourni de solutions claires.");
    } else {
        text.push_str("l'analyse des commentaires suggère les solutions suivantes : ");
        text.push_str(&solutions.join(", "));
        text.push('.');
    }
    text
}

/// Derive the ordered repair steps and parts from the concatenated comment
/// text and the extracted problem.
fn build_solution_plan(valid: &[&Comment], facts: &VehicleFacts) -> (Vec<String>, Vec<String>) {
    let problem = facts
        .problem
        .as_deref()
        .unwrap_or("")
        .to_lowercase();
    let all_comments = valid
        .iter()
        .map(|c| c.body.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut steps: Vec<String> = Vec::new();
    let mut parts: Vec<String> = Vec::new();
    let add_part = |parts: &mut Vec<String>, p: &str| {
        if !parts.iter().any(|x| x == p) {
            parts.push(p.to_string());
        }
    };

    // Initial diagnostics before touching anything.
    if problem.contains("code erreur")
        || problem.contains("check engine")
        || all_comments.contains("diagnostiquer")
        || all_comments.contains("scan")
    {
        steps.push(
            "**Diagnostiquer** le problème en lisant les codes d'erreur via un scanner OBD-II."
                .to_string(),
        );
    }
    if all_comments.contains("inspection visuelle")
        || all_comments.contains("vérifier les connexions")
        || all_comments.contains("visuel")
    {
        steps.push(
            "Effectuer une **inspection visuelle** détaillée des composants suspects et des raccordements."
                .to_string(),
        );
    }

    // One step per implicated component family; each also names the part.
    if all_comments.contains("capteur de pression de carburant")
        || all_comments.contains("capteur carburant")
    {
        add_part(&mut parts, "Capteur de pression de carburant");
        steps.push(
            "**Vérifier le capteur de pression de carburant** (valeurs, câblage) et le remplacer si défectueux."
                .to_string(),
        );
    }
    if all_comments.contains("egr") {
        add_part(&mut parts, "Vanne EGR");
        steps.push(
            "**Nettoyer ou remplacer la vanne EGR** et s'assurer du bon fonctionnement des conduits."
                .to_string(),
        );
    }
    if all_comments.contains("turbo")
        || problem.contains("fumée bleue")
        || all_comments.contains("consommation d'huile")
    {
        add_part(&mut parts, "Turbo");
        steps.push(
            "**Inspecter le turbo** (jeu, fuites d'huile) et envisager un remplacement ou une réparation."
                .to_string(),
        );
    }
    if all_comments.contains("bougies de préchauffage") || problem.contains("démarrage à froid") {
        add_part(&mut parts, "Bougies de préchauffage");
        steps.push(
            "**Tester les bougies de préchauffage** et les remplacer si elles sont usées."
                .to_string(),
        );
    }
    if all_comments.contains("injecteur") || problem.contains("fuite carburant") {
        add_part(&mut parts, "Injecteur(s) de carburant");
        steps.push(
            "**Tester les injecteurs** (débit, pulvérisation) et les remplacer si nécessaire."
                .to_string(),
        );
    }
    if all_comments.contains("dpf") || all_comments.contains("filtre à particules") {
        add_part(&mut parts, "Filtre à particules (FAP)");
        steps.push(
            "**Vérifier l'état du FAP** et, si obstrué, procéder à une régénération forcée ou un nettoyage."
                .to_string(),
        );
    }
    if all_comments.contains("filtre à carburant") {
        add_part(&mut parts, "Filtre à carburant");
        steps.push("**Remplacer le filtre à carburant**.".to_string());
    }
    if all_comments.contains("pompe")
        && (all_comments.contains("carburant") || all_comments.contains("haute pression"))
    {
        add_part(&mut parts, "Pompe à carburant");
        steps.push("**Contrôler la pompe à carburant** et sa pression de sortie.".to_string());
    }

    // Fixed closing reminders, always appended.
    steps.push(
        "**Rappel :** Avant de commander, **vérifiez la disponibilité des pièces** et leur compatibilité exacte avec votre modèle (année, motorisation)."
            .to_string(),
    );
    steps.push(
        "**Rappel :** Pour le remplacement des pièces, référez-vous à la **procédure étape par étape** du manuel de réparation ou d'une source fiable."
            .to_string(),
    );
    steps.push(
        "**Rappel :** Après toute intervention, effectuez un **double-check** de toutes les connexions et du serrage des composants."
            .to_string(),
    );
    steps.push(
        "**Finalisation :** Effacer les codes d'erreur et réaliser un essai routier pour confirmer la résolution du problème."
            .to_string(),
    );

    (dedupe_and_renumber(&steps), parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;

    fn comment(body: &str) -> Comment {
        Comment {
            body: body.to_string(),
            author: "someone".to_string(),
            karma: 50,
        }
    }

    fn facts() -> VehicleFacts {
        VehicleFacts {
            vehicle_type: Some("truck".to_string()),
            brand: Some("ford".to_string()),
            model: Some("f150".to_string()),
            year: Some("2015".to_string()),
            problem: Some("fumée bleue au démarrage".to_string()),
        }
    }

    #[test]
    fn test_empty_comment_list_yields_no_bundle() {
        assert!(evaluate_comments(&[], &facts(), &Lexicon::default()).is_none());
    }

    #[test]
    fn test_only_deleted_comments_yield_no_bundle() {
        let comments = vec![comment("[deleted]"), comment("  ")];
        assert!(evaluate_comments(&comments, &facts(), &Lexicon::default()).is_none());
    }

    #[test]
    fn test_scoring_counts_keywords_per_comment() {
        let comments = vec![
            comment("le turbo fait un bruit, je suis mécanicien"),
            comment("problème de moteur, essayez un additif"),
        ];
        let evidence = evaluate_comments(&comments, &facts(), &Lexicon::default()).unwrap();
        // Comment 1: turbo + bruit relevance, "je suis mécanicien" credibility.
        // Comment 2: problème + moteur relevance, "essayez" credibility.
        assert_eq!(evidence.score.relevance_total, 4);
        assert_eq!(evidence.score.credibility_total, 2);
        assert_eq!(evidence.score.comments_analyzed, 2);
        assert_eq!(evidence.score.combined(), 6);
        assert_eq!(evidence.bundle.score, 6.0);
    }

    #[test]
    fn test_diagnosis_names_problem_and_vehicle() {
        let comments = vec![comment("rien d'utile ici")];
        let evidence = evaluate_comments(&comments, &facts(), &Lexicon::default()).unwrap();
        assert!(evidence
            .bundle
            .diagnosis
            .starts_with("Concernant le problème 'fumée bleue au démarrage' sur le véhicule ford f150 2015 :"));
        assert!(evidence
            .bundle
            .diagnosis
            .ends_with("les commentaires pertinents n'ont pas fourni de solutions claires."));
    }

    #[test]
    fn test_trigger_phrases_feed_diagnosis() {
        let comments = vec![
            comment("la fumée bleue vient souvent du turbo"),
            comment("fais un nettoyage de l'egr aussi"),
            // Duplicate trigger, must not duplicate the suggestion.
            comment("oui, fumée bleue = turbo fatigué"),
        ];
        let evidence = evaluate_comments(&comments, &facts(), &Lexicon::default()).unwrap();
        let diagnosis = &evidence.bundle.diagnosis;
        assert!(diagnosis.contains("l'analyse des commentaires suggère les solutions suivantes"));
        assert_eq!(
            diagnosis
                .matches("inspection du turbo ou des segments de piston")
                .count(),
            1
        );
        assert!(diagnosis.contains("nettoyage de la vanne EGR"));
    }

    #[test]
    fn test_trigger_co_occurrence_is_per_comment() {
        // "egr" and "nettoyage" in different comments must not trigger.
        let comments = vec![comment("c'est l'egr"), comment("un bon nettoyage aide")];
        let evidence = evaluate_comments(&comments, &facts(), &Lexicon::default()).unwrap();
        assert!(!evidence.bundle.diagnosis.contains("nettoyage de la vanne EGR"));
    }

    #[test]
    fn test_solution_plan_components_and_parts() {
        let comments = vec![comment(
            "scan obd d'abord, puis regarde le turbo et les injecteur, et le filtre à carburant",
        )];
        let evidence = evaluate_comments(&comments, &facts(), &Lexicon::default()).unwrap();
        let steps = &evidence.bundle.solution_steps;

        // Contiguous numbering from 1.
        for (i, step) in steps.iter().enumerate() {
            assert!(step.starts_with(&format!("{}. ", i + 1)), "bad step: {}", step);
        }
        assert!(steps[0].contains("Diagnostiquer"));
        assert!(steps.iter().any(|s| s.contains("Inspecter le turbo")));
        assert!(steps.iter().any(|s| s.contains("Tester les injecteurs")));
        assert!(steps.iter().any(|s| s.contains("Remplacer le filtre à carburant")));
        // The four closing reminders are always present.
        assert!(steps.iter().filter(|s| s.contains("**Rappel :**")).count() == 3);
        assert!(steps.last().unwrap().contains("essai routier"));

        let parts = &evidence.bundle.parts_needed;
        assert!(parts.contains(&"Turbo".to_string()));
        assert!(parts.contains(&"Injecteur(s) de carburant".to_string()));
        assert!(parts.contains(&"Filtre à carburant".to_string()));
    }

    #[test]
    fn test_problem_text_alone_can_implicate_components() {
        // "fumée bleue" sits in the problem, not in any comment.
        let comments = vec![comment("bon courage")];
        let evidence = evaluate_comments(&comments, &facts(), &Lexicon::default()).unwrap();
        assert!(evidence
            .bundle
            .solution_steps
            .iter()
            .any(|s| s.contains("Inspecter le turbo")));
        assert!(evidence.bundle.parts_needed.contains(&"Turbo".to_string()));
    }

    #[test]
    fn test_steps_have_no_duplicate_content() {
        let comments = vec![comment("turbo turbo turbo"), comment("le turbo encore")];
        let evidence = evaluate_comments(&comments, &facts(), &Lexicon::default()).unwrap();
        let steps = &evidence.bundle.solution_steps;
        let turbo_steps = steps.iter().filter(|s| s.contains("Inspecter le turbo")).count();
        assert_eq!(turbo_steps, 1);
    }
}

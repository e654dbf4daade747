//! Extraction and scoring dictionaries.
//!
//! All keyword tables the engine matches against live here as immutable,
//! explicitly injected configuration. Lookup order is significant: brand,
//! vehicle-type and problem tables are ordered sequences with first-match
//! semantics, never unordered maps, so tie-breaks stay deterministic.
//!
//! A lexicon can be loaded from a TOML file; the compiled-in defaults are
//! the production tables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One brand with its associated model keywords, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandEntry {
    pub name: String,
    pub models: Vec<String>,
}

impl BrandEntry {
    fn new(name: &str, models: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Every dictionary the engine consumes, bundled for injection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    /// Ordered brand table; iteration order is the match priority.
    pub brands: Vec<BrandEntry>,
    /// Ordered vehicle-type keywords.
    pub vehicle_types: Vec<String>,
    /// Ordered problem keywords.
    pub problems: Vec<String>,
    /// Brands classified as trucks when no explicit type keyword matched.
    pub truck_brands: Vec<String>,
    /// Model substrings classified as trucks.
    pub truck_models: Vec<String>,
    /// Brands classified as cars.
    pub car_brands: Vec<String>,
    /// Model substrings classified as cars.
    pub car_models: Vec<String>,
    /// Comment relevance keywords (counted per occurrence per comment).
    pub relevance_keywords: Vec<String>,
    /// Comment credibility indicators.
    pub credibility_indicators: Vec<String>,
    /// Domains whose presence in a result URL boosts the web score.
    pub trusted_domains: Vec<String>,
    /// Action verbs that mark a web snippet as actionable.
    pub action_keywords: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            brands: vec![
                BrandEntry::new("detroit", &["6.2", "detroit"]),
                BrandEntry::new(
                    "ford",
                    &["powerstroke", "f150", "f250", "f350", "f450", "f550", "f650", "f750", "ranger"],
                ),
                BrandEntry::new("chevrolet", &["chevy", "silverado", "duramax", "k30"]),
                BrandEntry::new("gmc", &["sierra", "duramax"]),
                BrandEntry::new("dodge", &["ram", "cummins"]),
                BrandEntry::new("ram", &["1500", "2500", "3500", "cummins"]),
                BrandEntry::new(
                    "volkswagen",
                    &["vw", "tdi", "jetta", "golf", "passat", "touareg"],
                ),
                BrandEntry::new("audi", &["a3", "a4", "a6", "a8", "q5", "q7", "tdi"]),
                BrandEntry::new("bmw", &["x5", "x3", "335d", "328d", "530d", "730d"]),
                BrandEntry::new("mercedes", &["mercedes-benz", "sprinter", "gl", "glk", "ml"]),
                BrandEntry::new("toyota", &["hilux", "land cruiser", "tundra"]),
                BrandEntry::new("nissan", &["titan", "patrol", "navara"]),
                BrandEntry::new("paccar", &["mx", "mx-13"]),
                BrandEntry::new("cummins", &["isb", "isx", "n14", "m11", "b-series"]),
                BrandEntry::new("duramax", &["lb7", "lly", "lbz", "lmm", "lml", "l5p"]),
                BrandEntry::new("international", &["dt466", "maxxforce", "navistar"]),
                BrandEntry::new("caterpillar", &["cat", "c7", "c9", "c13", "c15", "3406"]),
            ],
            vehicle_types: to_strings(&[
                "truck", "pickup", "semi", "tractor", "trailer", "sedan", "suv", "van", "car",
            ]),
            problems: to_strings(&[
                "leak", "smoke", "noise", "vibration", "misfire", "stall", "not start",
                "hard start", "fuel", "mpg", "economy", "exhaust", "dpf", "def", "regen",
                "check engine", "codes", "power loss", "turbo", "injector", "transmission",
                "overheating", "cooling", "brakes", "electrical", "charging", "alternator",
                "battery", "starter", "glow plug", "head gasket", "black smoke", "white smoke",
                "blue smoke", "gray smoke", "lift pump", "high pressure pump", "rail pressure",
                "blow-by", "blowby", "egr", "oil pressure", "water pump", "aftertreatment",
            ]),
            truck_brands: to_strings(&[
                "ford", "chevrolet", "gmc", "dodge", "ram", "toyota", "nissan",
            ]),
            truck_models: to_strings(&[
                "f150", "f250", "f350", "silverado", "sierra", "1500", "2500", "3500",
                "tundra", "titan",
            ]),
            car_brands: to_strings(&["volkswagen", "audi", "bmw", "mercedes"]),
            car_models: to_strings(&["jetta", "golf", "passat", "a3", "a4", "335d", "328d"]),
            relevance_keywords: to_strings(&[
                "problème", "solution", "réparation", "expérience", "diagnostic", "symptôme",
                "panne", "mécanique", "code erreur", "fuite", "fumée", "bruit",
                "perte de puissance", "moteur", "turbo", "injecteur",
            ]),
            credibility_indicators: to_strings(&[
                "je suis mécanicien", "j'ai eu le même problème", "selon le manuel",
                "chez le concessionnaire", "voici ma solution", "années d'expérience",
                "mon expérience", "conseil", "fait ça", "essayez", "vérifiez", "spécialiste",
                "garage", "outil", "diagnostiquer",
            ]),
            trusted_domains: to_strings(&[
                "youtube.com", "reddit.com", "forums.dieselplace.com", "f150forum.com",
                "dieseltechmagazine.com", "gmc.com", "ford.com", "chevrolet.com", "vw.com",
                "audi.com", "bmw.com", "mercedes-benz.com", "toyota.com", "nissan.com",
                "autozone.com", "oreillyauto.com", "napaonline.com", "rockauto.com",
            ]),
            action_keywords: to_strings(&["vérifier", "tester", "remplacer", "nettoyer"]),
        }
    }
}

impl Lexicon {
    /// Load a lexicon from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon file: {}", path.display()))?;
        let lexicon: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse lexicon file: {}", path.display()))?;
        Ok(lexicon)
    }

    /// Load from a TOML file when present, else fall back to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Write the lexicon as TOML, e.g. to seed an editable file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize lexicon")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write lexicon file: {}", path.display()))?;
        Ok(())
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

//! Fiscal-year classification and keyword-table tagging.
//!
//! All tables are static and ordered; tag order in the output follows table
//! order, not the position of the keyword in the text.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use proposalkit_shared::FiscalYear;

/// Theme assigned when no theme keyword matches.
pub const DEFAULT_THEME: &str = "General";

/// Region assigned when no region keyword matches.
pub const DEFAULT_REGION: &str = "Global";

/// Maximum number of themes kept per proposal.
pub const MAX_THEMES: usize = 3;

/// Only the start of a document is searched for mentioned years.
const YEAR_SCAN_CHARS: usize = 1000;

/// Substrings identifying each fiscal year in a path.
pub const FISCAL_YEAR_PATTERNS: &[(FiscalYear, &[&str])] = &[
    (FiscalYear::Fy2026, &["FY2026", "FY 2026"]),
    (FiscalYear::Fy2025, &["FY2025", "FY 2025"]),
    (FiscalYear::Fy2024, &["FY2024", "FY 2024"]),
    (FiscalYear::Fy2023, &["FY2023", "FY 2023"]),
];

/// Theme tag and the lowercase keywords that select it.
pub const THEME_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Climate",
        &["climate", "environmental", "sustainability", "renewable energy", "conservation"],
    ),
    ("Security", &["security", "terrorism", "extremism", "transnational crime"]),
    (
        "Health",
        &["health", "pandemic", "medical", "healthcare", "fentanyl", "opioid"],
    ),
    ("Economy", &["economic", "entrepreneurship", "business", "trade", "market"]),
    (
        "Human Rights",
        &["human rights", "civil rights", "gender", "violence", "trafficking"],
    ),
    ("Education", &["education", "university", "youth", "student"]),
    (
        "Democracy",
        &["democracy", "governance", "transparency", "accountability", "civic"],
    ),
    ("Technology", &["technology", "digital", "cybersecurity", "innovation"]),
    ("Migration", &["migration", "refugee", "displaced"]),
    ("Maritime", &["maritime", "ocean", "fisheries", "blue economy"]),
    ("Energy", &["energy", "oil", "gas", "renewable"]),
    ("Arts & Culture", &["arts", "culture", "heritage", "creative"]),
];

/// Region tag and the lowercase keywords that select it.
pub const REGION_KEYWORDS: &[(&str, &[&str])] = &[
    ("Indo-Pacific", &["indo-pacific", "pacific", "quad"]),
    ("Europe", &["europe", "european", "transatlantic", "eurasia"]),
    ("Africa", &["africa", "african"]),
    ("Americas", &["latin america", "mexico", "argentina", "brazil"]),
    ("Middle East", &["middle east", "arab"]),
    ("Asia", &["asia", "asian", "vietnam", "china"]),
    ("Central Asia", &["central asia", "turkmenistan"]),
];

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(20\d{2})\b").expect("year regex"));

/// Fiscal year of the first table entry with a pattern contained in `text`.
pub fn classify_fiscal_year(text: &str) -> Option<FiscalYear> {
    FISCAL_YEAR_PATTERNS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| text.contains(p)))
        .map(|(fy, _)| *fy)
}

/// Up to [`MAX_THEMES`] theme tags, or [`DEFAULT_THEME`].
pub fn tag_themes(text: &str) -> Vec<String> {
    let mut themes = match_table(THEME_KEYWORDS, text);
    themes.truncate(MAX_THEMES);
    or_default(themes, DEFAULT_THEME)
}

/// Every matching region tag, or [`DEFAULT_REGION`].
pub fn tag_regions(text: &str) -> Vec<String> {
    or_default(match_table(REGION_KEYWORDS, text), DEFAULT_REGION)
}

/// Sorted, unique `20xx` years in the first [`YEAR_SCAN_CHARS`] characters.
pub fn years_mentioned(text: &str) -> Vec<String> {
    let head: String = text.chars().take(YEAR_SCAN_CHARS).collect();
    YEAR_RE
        .captures_iter(&head)
        .map(|caps| caps[1].to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn match_table(table: &[(&str, &[&str])], text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    table
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(tag, _)| (*tag).to_string())
        .collect()
}

fn or_default(tags: Vec<String>, default: &str) -> Vec<String> {
    if tags.is_empty() {
        vec![default.to_string()]
    } else {
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fiscal_year_from_path_variants() {
        assert_eq!(
            classify_fiscal_year("Ressource/Proposals Sent FY2025-20251122/x.docx"),
            Some(FiscalYear::Fy2025)
        );
        assert_eq!(
            classify_fiscal_year("Ressource/FY 2024 Proposals/x.docx"),
            Some(FiscalYear::Fy2024)
        );
        assert_eq!(classify_fiscal_year("Ressource/FY2026/x.docx"), Some(FiscalYear::Fy2026));
        assert_eq!(classify_fiscal_year("Ressource/FY2023/x.docx"), Some(FiscalYear::Fy2023));
        assert_eq!(classify_fiscal_year("Ressource/Drafts/x.docx"), None);
    }

    #[test]
    fn every_theme_keyword_selects_its_tag() {
        for (tag, keywords) in THEME_KEYWORDS {
            for keyword in *keywords {
                let text = format!("A program about {}", keyword.to_uppercase());
                let themes = match_table(THEME_KEYWORDS, &text);
                assert!(themes.iter().any(|t| t == tag), "{keyword} should select {tag}");
            }
        }
    }

    #[test]
    fn every_region_keyword_selects_its_tag() {
        for (tag, keywords) in REGION_KEYWORDS {
            for keyword in *keywords {
                let regions = tag_regions(keyword);
                assert!(regions.iter().any(|r| r == tag), "{keyword} should select {tag}");
            }
        }
    }

    #[test]
    fn themes_follow_table_order_and_truncate() {
        let text = "energy, arts, climate, security, health and trade";
        assert_eq!(tag_themes(text), vec!["Climate", "Security", "Health"]);
    }

    #[test]
    fn regions_are_not_truncated() {
        let text = "Pacific, Europe, Africa, Mexico, Middle East, China, Turkmenistan";
        assert_eq!(tag_regions(text).len(), REGION_KEYWORDS.len());
    }

    #[test]
    fn defaults_when_nothing_matches() {
        let text = "Quarterly report on nothing in particular";
        assert_eq!(tag_themes(text), vec![DEFAULT_THEME]);
        assert_eq!(tag_regions(text), vec![DEFAULT_REGION]);
    }

    #[test]
    fn climate_and_energy_from_renewable_text() {
        let text = "Climate initiative for 2024 renewable energy projects";
        assert_eq!(tag_themes(text), vec!["Climate", "Energy"]);
        assert_eq!(tag_regions(text), vec![DEFAULT_REGION]);
    }

    #[test]
    fn years_are_unique_sorted_and_bounded() {
        let text = "Programs in 2025 and 2024, again 2025; not 1999 or 20255";
        assert_eq!(years_mentioned(text), vec!["2024", "2025"]);

        let late = format!("{} 2030", "x".repeat(YEAR_SCAN_CHARS));
        assert!(years_mentioned(&late).is_empty());
    }
}

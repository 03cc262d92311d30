//! Duplicate detection and resolution over database resources.
//!
//! Detection ([`detect`]) only reads the resource set and produces reports.
//! Resolution ([`resolve`]) keeps one canonical record per exact-title group.

pub mod detect;
pub mod resolve;

use std::collections::HashMap;

use proposalkit_shared::DatabaseResource;

pub use detect::{DetectOptions, DuplicateReport, detect_duplicates};
pub use resolve::{CleanOutcome, Resolution, clean_duplicates, resolve_group};

/// Normalize a title for exact-duplicate comparison.
///
/// Lowercases, turns underscores and hyphens into spaces, collapses
/// whitespace runs and trims. Applying it twice changes nothing.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-insensitive edit-distance similarity in `[0, 1]`; 1.0 means identical.
///
/// Symmetric in its arguments.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Indices of resources sharing a key, groups in order of first appearance.
pub(crate) fn group_indices<F>(resources: &[DatabaseResource], key: F) -> Vec<(String, Vec<usize>)>
where
    F: Fn(&DatabaseResource) -> String,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();

    for (idx, resource) in resources.iter().enumerate() {
        let k = key(resource);
        match positions.get(&k) {
            Some(&pos) => groups[pos].1.push(idx),
            None => {
                positions.insert(k.clone(), groups.len());
                groups.push((k, vec![idx]));
            }
        }
    }

    groups
}

#[cfg(test)]
pub(crate) mod testutil {
    use proposalkit_shared::{
        DatabaseResource, FiscalYear, RESOURCE_TYPE, ResourceMetadata, Status, priority_of,
    };

    /// Minimal resource with the fields duplicate handling looks at.
    pub fn resource(id: &str, title: &str, fy: Option<FiscalYear>, filename: &str) -> DatabaseResource {
        let status = Status::from_fiscal_year(fy);
        DatabaseResource {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            resource_type: RESOURCE_TYPE.into(),
            fiscal_year: fy,
            status,
            priority: priority_of(fy),
            themes: vec!["General".into()],
            regions: vec!["Global".into()],
            file_path: format!("Ressource/{filename}.docx"),
            filename: filename.into(),
            created_date: "2025-11-22T10:00:00".into(),
            is_active: status.is_active(),
            metadata: ResourceMetadata {
                years_mentioned: vec![],
                document_type: "docx".into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_separators() {
        assert_eq!(normalize_title("  Fentanyl_and--Public  Health "), "fentanyl and public health");
        assert_eq!(normalize_title("Ocean - Economy"), "ocean economy");
    }

    #[test]
    fn normalize_is_idempotent() {
        let titles = [
            "Climate_Resilience - Pacific",
            "  Women  in   STEM ",
            "A__B--C",
            "already normalized",
            "",
            "Tab\tSeparated_Title",
        ];
        for title in titles {
            let once = normalize_title(title);
            assert_eq!(normalize_title(&once), once, "not idempotent for {title:?}");
        }
    }

    #[test]
    fn similarity_is_symmetric() {
        let pairs = [
            ("Maritime Security", "Maritime Securty"),
            ("Climate", "Climate Change in Asia"),
            ("", "abc"),
            ("Health Equity FY2025", "health equity fy2024"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn similarity_bounds() {
        assert_eq!(similarity("Same Title", "same title"), 1.0);
        let s = similarity("abc", "xyz");
        assert!((0.0..=1.0).contains(&s));
        assert_eq!(s, 0.0);
    }

    #[test]
    fn group_indices_keeps_first_appearance_order() {
        use crate::testutil::resource;
        let resources = vec![
            resource("1", "B", None, "b"),
            resource("2", "A", None, "a"),
            resource("3", "b", None, "b2"),
        ];
        let groups = group_indices(&resources, |r| normalize_title(&r.title));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], ("b".to_string(), vec![0, 2]));
        assert_eq!(groups[1], ("a".to_string(), vec![1]));
    }
}

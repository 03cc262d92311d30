//! Exact-title duplicate resolution: keep the newest fiscal year of each group.

use serde::Serialize;
use tracing::{debug, info, instrument};

use proposalkit_shared::{DatabaseResource, ProposalKitError, Result, priority_of};

use crate::{group_indices, normalize_title};

/// Outcome of resolving one exact-title group.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub kept: DatabaseResource,
    pub removed: Vec<DatabaseResource>,
}

/// Which record survived for a group that had duplicates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedGroup {
    pub normalized_title: String,
    pub kept_id: String,
    pub removed_ids: Vec<String>,
}

/// Result of cleaning a full resource set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanOutcome {
    /// One resource per normalized title, in order of first appearance.
    pub kept: Vec<DatabaseResource>,
    pub removed: Vec<DatabaseResource>,
    /// Only groups with more than one member are listed.
    pub groups: Vec<ResolvedGroup>,
}

fn rank(resource: &DatabaseResource) -> (u8, u8) {
    (priority_of(resource.fiscal_year), resource.priority)
}

/// Choose the canonical member of one exact-title group.
///
/// Members are ranked by fiscal year (newest first) and then by stored
/// priority. Ties keep the member that appeared first.
pub fn resolve_group(mut members: Vec<DatabaseResource>) -> Result<Resolution> {
    if members.is_empty() {
        return Err(ProposalKitError::validation("cannot resolve an empty duplicate group"));
    }

    // sort_by is stable
    members.sort_by(|a, b| rank(b).cmp(&rank(a)));
    let kept = members.remove(0);

    Ok(Resolution { kept, removed: members })
}

/// Collapse every exact-title group to its canonical member.
#[instrument(skip_all, fields(resources = resources.len()))]
pub fn clean_duplicates(resources: Vec<DatabaseResource>) -> Result<CleanOutcome> {
    let groups = group_indices(&resources, |r| normalize_title(&r.title));
    let mut slots: Vec<Option<DatabaseResource>> = resources.into_iter().map(Some).collect();
    let mut outcome = CleanOutcome::default();

    for (normalized_title, indices) in groups {
        let members: Vec<DatabaseResource> =
            indices.iter().filter_map(|&i| slots[i].take()).collect();
        let resolution = resolve_group(members)?;

        if !resolution.removed.is_empty() {
            debug!(
                title = %normalized_title,
                kept = %resolution.kept.id,
                removed = resolution.removed.len(),
                "resolved duplicate group"
            );
            outcome.groups.push(ResolvedGroup {
                normalized_title,
                kept_id: resolution.kept.id.clone(),
                removed_ids: resolution.removed.iter().map(|r| r.id.clone()).collect(),
            });
        }

        outcome.kept.push(resolution.kept);
        outcome.removed.extend(resolution.removed);
    }

    info!(
        kept = outcome.kept.len(),
        removed = outcome.removed.len(),
        "duplicates cleaned"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use proposalkit_shared::FiscalYear::*;

    use super::*;
    use crate::testutil::resource;

    #[test]
    fn newest_fiscal_year_wins() {
        let members = vec![
            resource("IVLP-FY2024-003", "Ocean Economy", Some(Fy2024), "a"),
            resource("IVLP-FY2026-001", "ocean economy", Some(Fy2026), "b"),
            resource("IVLP-FY2025-007", "Ocean_Economy", Some(Fy2025), "c"),
            resource("IVLP-FY2023-010", "Ocean-Economy", Some(Fy2023), "d"),
        ];
        let resolution = resolve_group(members).unwrap();

        assert_eq!(resolution.kept.id, "IVLP-FY2026-001");
        let removed: Vec<_> = resolution.removed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(removed, vec!["IVLP-FY2025-007", "IVLP-FY2024-003", "IVLP-FY2023-010"]);
    }

    #[test]
    fn unknown_year_ranks_below_every_known_year() {
        let members = vec![
            resource("IVLP-UNKNOWN-001", "Trade", None, "a"),
            resource("IVLP-FY2023-001", "Trade", Some(Fy2023), "b"),
        ];
        assert_eq!(resolve_group(members).unwrap().kept.id, "IVLP-FY2023-001");
    }

    #[test]
    fn ties_keep_first_member() {
        let members = vec![
            resource("first", "Trade", Some(Fy2025), "a"),
            resource("second", "Trade", Some(Fy2025), "b"),
        ];
        let resolution = resolve_group(members).unwrap();
        assert_eq!(resolution.kept.id, "first");
        assert_eq!(resolution.removed[0].id, "second");
    }

    #[test]
    fn stored_priority_does_not_change_outcome() {
        // Priority is derived from fiscal year, so the secondary key never decides.
        let members = vec![
            resource("a", "Trade", Some(Fy2024), "a"),
            resource("b", "Trade", Some(Fy2025), "b"),
            resource("c", "Trade", Some(Fy2024), "c"),
        ];
        let with_priority = resolve_group(members.clone()).unwrap();

        let by_year_only = {
            let mut m = members;
            m.sort_by(|x, y| priority_of(y.fiscal_year).cmp(&priority_of(x.fiscal_year)));
            m
        };
        assert_eq!(with_priority.kept, by_year_only[0]);
        assert_eq!(with_priority.removed, by_year_only[1..].to_vec());
    }

    #[test]
    fn single_member_group_keeps_it() {
        let resolution = resolve_group(vec![resource("only", "Solo", None, "a")]).unwrap();
        assert_eq!(resolution.kept.id, "only");
        assert!(resolution.removed.is_empty());
    }

    #[test]
    fn empty_group_is_rejected() {
        assert!(resolve_group(Vec::new()).is_err());
    }

    #[test]
    fn clean_keeps_one_per_title_in_first_appearance_order() {
        let resources = vec![
            resource("IVLP-FY2025-001", "Maritime Security", Some(Fy2025), "m1"),
            resource("IVLP-FY2024-001", "Water Policy", Some(Fy2024), "w"),
            resource("IVLP-FY2026-001", "maritime-security", Some(Fy2026), "m2"),
            resource("IVLP-FY2023-001", "Maritime  Security", Some(Fy2023), "m3"),
        ];
        let outcome = clean_duplicates(resources).unwrap();

        let kept: Vec<_> = outcome.kept.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(kept, vec!["IVLP-FY2026-001", "IVLP-FY2024-001"]);
        assert_eq!(outcome.removed.len(), 2);
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].kept_id, "IVLP-FY2026-001");
        assert_eq!(
            outcome.groups[0].removed_ids,
            vec!["IVLP-FY2025-001", "IVLP-FY2023-001"]
        );
    }

    #[test]
    fn clean_output_has_unique_normalized_titles() {
        let resources = vec![
            resource("1", "A_B", None, "1"),
            resource("2", "a b", Some(Fy2024), "2"),
            resource("3", "C", None, "3"),
            resource("4", "c", None, "4"),
            resource("5", "D", Some(Fy2025), "5"),
        ];
        let total = resources.len();
        let outcome = clean_duplicates(resources).unwrap();

        let mut titles: Vec<_> = outcome.kept.iter().map(|r| normalize_title(&r.title)).collect();
        titles.sort();
        titles.dedup();
        assert_eq!(titles.len(), outcome.kept.len());
        assert_eq!(outcome.kept.len() + outcome.removed.len(), total);
    }

    #[test]
    fn clean_without_duplicates_is_identity() {
        let resources = vec![
            resource("1", "Alpha", None, "1"),
            resource("2", "Beta", Some(Fy2026), "2"),
        ];
        let outcome = clean_duplicates(resources.clone()).unwrap();
        assert_eq!(outcome.kept, resources);
        assert!(outcome.removed.is_empty());
        assert!(outcome.groups.is_empty());
    }
}

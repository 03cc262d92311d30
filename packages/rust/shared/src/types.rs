//! Core domain types for ProposalKit inventories.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Resource type written into every database resource.
pub const RESOURCE_TYPE: &str = "IVLP Proposal";

/// Summary key used for resources without a fiscal year.
pub const UNKNOWN_KEY: &str = "unknown";

// ---------------------------------------------------------------------------
// FiscalYear
// ---------------------------------------------------------------------------

/// Program submission cycle. Variants are ordered oldest to newest.
///
/// An unknown fiscal year is modelled as `Option<FiscalYear>::None` and is
/// serialized as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FiscalYear {
    #[serde(rename = "FY2023")]
    Fy2023,
    #[serde(rename = "FY2024")]
    Fy2024,
    #[serde(rename = "FY2025")]
    Fy2025,
    #[serde(rename = "FY2026")]
    Fy2026,
}

impl FiscalYear {
    /// All known fiscal years, newest first.
    pub const ALL: [FiscalYear; 4] = [Self::Fy2026, Self::Fy2025, Self::Fy2024, Self::Fy2023];

    /// The tag string, e.g. `FY2025`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fy2023 => "FY2023",
            Self::Fy2024 => "FY2024",
            Self::Fy2025 => "FY2025",
            Self::Fy2026 => "FY2026",
        }
    }

    /// Rank used for sorting; higher is more recent.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Fy2026 => 4,
            Self::Fy2025 => 3,
            Self::Fy2024 => 2,
            Self::Fy2023 => 1,
        }
    }
}

impl std::fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FiscalYear {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|fy| fy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown fiscal year '{s}'"))
    }
}

/// Priority of an optional fiscal year; unknown ranks lowest.
pub fn priority_of(fiscal_year: Option<FiscalYear>) -> u8 {
    fiscal_year.map(|fy| fy.priority()).unwrap_or(0)
}

/// Key used in summaries and reports for an optional fiscal year.
pub fn fiscal_year_key(fiscal_year: Option<FiscalYear>) -> String {
    fiscal_year
        .map(|fy| fy.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_KEY.to_string())
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Currency of a proposal, derived purely from its fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Upcoming,
    Current,
    Archived,
    Unknown,
}

impl Status {
    /// Derive the status for a fiscal year.
    pub fn from_fiscal_year(fiscal_year: Option<FiscalYear>) -> Self {
        match fiscal_year {
            Some(FiscalYear::Fy2026) => Self::Upcoming,
            Some(FiscalYear::Fy2025) => Self::Current,
            Some(FiscalYear::Fy2024 | FiscalYear::Fy2023) => Self::Archived,
            None => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Current => "current",
            Self::Archived => "archived",
            Self::Unknown => "unknown",
        }
    }

    /// Only current and upcoming proposals are shown as active.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Current | Self::Upcoming)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

/// One host institution found inside a proposal document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization name (never empty once emitted by the segmenter).
    pub name: String,
    /// First URL-like token of the boundary paragraph.
    pub url: String,
    /// Free text accumulated after the URL, space-joined.
    pub description: String,
    /// Text following the `Meeting Focus:` marker.
    pub meeting_focus: String,
}

/// An [`Organization`] tagged with the proposal it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    #[serde(flatten)]
    pub organization: Organization,
    /// File name of the source proposal.
    pub source_proposal: String,
    /// Fiscal year of the containing directory.
    pub fiscal_year: Option<FiscalYear>,
}

// ---------------------------------------------------------------------------
// ProposalRecord
// ---------------------------------------------------------------------------

/// One inventory entry per source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRecord {
    /// File stem of the source document.
    pub filename: String,
    pub fiscal_year: Option<FiscalYear>,
    /// Display title derived from the filename.
    pub title: String,
    /// At most three theme tags; never empty.
    pub themes: Vec<String>,
    /// Region tags; never empty.
    pub regions: Vec<String>,
    /// Sorted four-digit years found near the start of the text.
    #[serde(default)]
    pub years_mentioned: Vec<String>,
    pub file_path: String,
    pub text_preview: String,
}

// ---------------------------------------------------------------------------
// DatabaseResource
// ---------------------------------------------------------------------------

/// Secondary attributes kept alongside a database resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    #[serde(default)]
    pub years_mentioned: Vec<String>,
    /// `docx` or `pdf`, from the file extension.
    pub document_type: String,
}

/// A [`ProposalRecord`] enriched for loading into a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseResource {
    /// `IVLP-{fiscal year}-{NNN}`, assigned once at formatting time.
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub fiscal_year: Option<FiscalYear>,
    pub status: Status,
    pub priority: u8,
    pub themes: Vec<String>,
    pub regions: Vec<String>,
    pub file_path: String,
    pub filename: String,
    pub created_date: String,
    pub is_active: bool,
    pub metadata: ResourceMetadata,
}

// ---------------------------------------------------------------------------
// Summary and stage file
// ---------------------------------------------------------------------------

/// Aggregate counts over a resource collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub total_resources: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_fiscal_year: BTreeMap<String, usize>,
    pub by_theme: BTreeMap<String, usize>,
    pub by_region: BTreeMap<String, usize>,
    pub active_count: usize,
    /// Every resource that is not active, unknown status included.
    pub archived_count: usize,
}

impl ResourceSummary {
    /// Compute the summary for a set of resources.
    pub fn compute(resources: &[DatabaseResource]) -> Self {
        let mut summary = Self {
            total_resources: resources.len(),
            ..Self::default()
        };

        for resource in resources {
            *summary
                .by_status
                .entry(resource.status.as_str().to_string())
                .or_default() += 1;
            *summary
                .by_fiscal_year
                .entry(fiscal_year_key(resource.fiscal_year))
                .or_default() += 1;
            for theme in &resource.themes {
                *summary.by_theme.entry(theme.clone()).or_default() += 1;
            }
            for region in &resource.regions {
                *summary.by_region.entry(region.clone()).or_default() += 1;
            }

            if resource.is_active {
                summary.active_count += 1;
            } else {
                summary.archived_count += 1;
            }
        }

        summary
    }

    /// Count for a status, zero when absent.
    pub fn status_count(&self, status: Status) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

/// The JSON document exchanged between the prepare, clean and import stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceFile {
    pub summary: ResourceSummary,
    pub resources: Vec<DatabaseResource>,
    /// RFC 3339 timestamp of the run that wrote this file.
    pub last_updated: String,
    /// Where the resources came from: the scanned root for a full run, or
    /// the inventory file when formatting a saved inventory.
    pub data_source: String,
    #[serde(default)]
    pub cleaned: bool,
    #[serde(default)]
    pub removed_duplicates: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(id: &str, fy: Option<FiscalYear>, themes: &[&str]) -> DatabaseResource {
        let status = Status::from_fiscal_year(fy);
        DatabaseResource {
            id: id.into(),
            title: "Title".into(),
            description: String::new(),
            resource_type: RESOURCE_TYPE.into(),
            fiscal_year: fy,
            status,
            priority: priority_of(fy),
            themes: themes.iter().map(|t| t.to_string()).collect(),
            regions: vec!["Global".into()],
            file_path: String::new(),
            filename: String::new(),
            created_date: "2025-11-22T00:00:00Z".into(),
            is_active: status.is_active(),
            metadata: ResourceMetadata {
                years_mentioned: vec![],
                document_type: "docx".into(),
            },
        }
    }

    #[test]
    fn fiscal_year_serializes_as_tag() {
        let json = serde_json::to_string(&FiscalYear::Fy2025).unwrap();
        assert_eq!(json, "\"FY2025\"");

        let none: Option<FiscalYear> = serde_json::from_str("null").unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn fiscal_year_ordering_is_chronological() {
        assert!(FiscalYear::Fy2026 > FiscalYear::Fy2023);
        assert!(Some(FiscalYear::Fy2023) > None);
    }

    #[test]
    fn fiscal_year_parses_case_insensitively() {
        assert_eq!("fy2024".parse::<FiscalYear>(), Ok(FiscalYear::Fy2024));
        assert!("FY1999".parse::<FiscalYear>().is_err());
    }

    #[test]
    fn status_is_pure_function_of_fiscal_year() {
        assert_eq!(Status::from_fiscal_year(Some(FiscalYear::Fy2026)), Status::Upcoming);
        assert_eq!(Status::from_fiscal_year(Some(FiscalYear::Fy2025)), Status::Current);
        assert_eq!(Status::from_fiscal_year(Some(FiscalYear::Fy2024)), Status::Archived);
        assert_eq!(Status::from_fiscal_year(Some(FiscalYear::Fy2023)), Status::Archived);
        assert_eq!(Status::from_fiscal_year(None), Status::Unknown);
        assert!(Status::Upcoming.is_active());
        assert!(!Status::Unknown.is_active());
    }

    #[test]
    fn unknown_fiscal_year_ranks_lowest() {
        assert_eq!(priority_of(None), 0);
        assert_eq!(priority_of(Some(FiscalYear::Fy2023)), 1);
        assert_eq!(priority_of(Some(FiscalYear::Fy2026)), 4);
    }

    #[test]
    fn summary_counts_every_dimension() {
        let resources = vec![
            resource("a", Some(FiscalYear::Fy2026), &["Climate", "Energy"]),
            resource("b", Some(FiscalYear::Fy2024), &["Climate"]),
            resource("c", None, &["General"]),
        ];
        let summary = ResourceSummary::compute(&resources);

        assert_eq!(summary.total_resources, 3);
        assert_eq!(summary.by_theme["Climate"], 2);
        assert_eq!(summary.by_region["Global"], 3);
        assert_eq!(summary.by_fiscal_year["unknown"], 1);
        assert_eq!(summary.status_count(Status::Upcoming), 1);
        assert_eq!(summary.active_count, 1);
        assert_eq!(summary.archived_count, 2);
    }

    #[test]
    fn resource_type_field_is_renamed() {
        let json = serde_json::to_value(resource("x", None, &["General"])).unwrap();
        assert_eq!(json["type"], RESOURCE_TYPE);
        assert_eq!(json["status"], "unknown");
        assert!(json["fiscal_year"].is_null());
    }

    #[test]
    fn organization_record_is_flat() {
        let record = OrganizationRecord {
            organization: Organization {
                name: "Widgets Inc".into(),
                url: "http://b.example".into(),
                ..Organization::default()
            },
            source_proposal: "Trade.docx".into(),
            fiscal_year: Some(FiscalYear::Fy2025),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "Widgets Inc");
        assert_eq!(json["fiscal_year"], "FY2025");
    }

    #[test]
    fn resource_file_defaults_clean_flags() {
        let json = r#"{
            "summary": {"total_resources": 0, "by_status": {}, "by_fiscal_year": {},
                        "by_theme": {}, "by_region": {}, "active_count": 0, "archived_count": 0},
            "resources": [],
            "last_updated": "2025-11-22T00:00:00",
            "data_source": "Ressource"
        }"#;
        let file: ResourceFile = serde_json::from_str(json).unwrap();
        assert!(!file.cleaned);
        assert_eq!(file.removed_duplicates, 0);
    }
}

//! Mapping from formatted resources to catalog rows.

use serde::{Deserialize, Serialize};

use proposalkit_shared::{DatabaseResource, fiscal_year_key};

/// Catalog category derived from a resource's themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Governmental,
    Academic,
    Nonprofit,
    Cultural,
}

impl Category {
    /// First matching rule wins; anything else is governmental.
    pub fn from_themes(themes: &[String]) -> Self {
        let has = |tag: &str| themes.iter().any(|t| t == tag);
        if has("Education") || has("Technology") {
            Self::Academic
        } else if has("Arts & Culture") {
            Self::Cultural
        } else if has("Human Rights") || has("Democracy") {
            Self::Nonprofit
        } else {
            Self::Governmental
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Governmental => "governmental",
            Self::Academic => "academic",
            Self::Nonprofit => "nonprofit",
            Self::Cultural => "cultural",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "governmental" => Ok(Self::Governmental),
            "academic" => Ok(Self::Academic),
            "nonprofit" => Ok(Self::Nonprofit),
            "cultural" => Ok(Self::Cultural),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

/// Source fields preserved alongside the catalog row as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    pub resource_id: String,
    pub fiscal_year: Option<String>,
    pub status: String,
    pub priority: u8,
    pub themes: Vec<String>,
    pub regions: Vec<String>,
    pub file_path: String,
    pub years_mentioned: Vec<String>,
    pub document_type: String,
}

/// A row of the `resources` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    pub id: String,
    pub category: Category,
    pub name: String,
    pub description: String,
    pub meeting_focus: String,
    pub accessibility: String,
    pub fiscal_year: Option<String>,
    pub status: String,
    pub priority: u8,
    pub is_active: bool,
    pub file_path: String,
    pub metadata: CatalogMetadata,
}

impl From<&DatabaseResource> for CatalogRow {
    fn from(r: &DatabaseResource) -> Self {
        let themes = r.themes.join(", ");
        let regions = r.regions.join(", ");
        let description = format!(
            "{}\n\nFiscal Year: {}\nStatus: {}\nThemes: {}\nRegions: {}",
            r.description,
            fiscal_year_key(r.fiscal_year),
            r.status.as_str().to_uppercase(),
            themes,
            regions,
        );
        let fiscal_year = r.fiscal_year.map(|fy| fy.as_str().to_string());

        Self {
            id: r.id.clone(),
            category: Category::from_themes(&r.themes),
            name: r.title.clone(),
            description,
            meeting_focus: format!("{themes} - {regions}"),
            accessibility: format!(
                "Document Type: {} - Priority: {}",
                r.metadata.document_type.to_uppercase(),
                r.priority
            ),
            fiscal_year: fiscal_year.clone(),
            status: r.status.as_str().to_string(),
            priority: r.priority,
            is_active: r.is_active,
            file_path: r.file_path.clone(),
            metadata: CatalogMetadata {
                resource_id: r.id.clone(),
                fiscal_year,
                status: r.status.as_str().to_string(),
                priority: r.priority,
                themes: r.themes.clone(),
                regions: r.regions.clone(),
                file_path: r.file_path.clone(),
                years_mentioned: r.metadata.years_mentioned.clone(),
                document_type: r.metadata.document_type.clone(),
            },
        }
    }
}

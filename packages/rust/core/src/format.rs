//! Database formatter and the JSON/CSV sinks for resource files.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use proposalkit_shared::{
    DatabaseResource, FiscalYear, ProposalKitError, ProposalRecord, RESOURCE_TYPE, ResourceFile,
    ResourceMetadata, ResourceSummary, Result, Status, priority_of,
};

/// Label used in resource ids when the fiscal year is unknown.
pub const UNKNOWN_ID_LABEL: &str = "UNKNOWN";

/// Header of the flat CSV export.
pub const CSV_COLUMNS: [&str; 9] = [
    "id",
    "title",
    "fiscal_year",
    "status",
    "priority",
    "themes",
    "regions",
    "is_active",
    "file_path",
];

/// `IVLP-{FY}-{NNN}` with a 1-based, zero-padded sequence number.
pub fn resource_id(fiscal_year: Option<FiscalYear>, sequence: usize) -> String {
    let label = fiscal_year.map(|fy| fy.as_str()).unwrap_or(UNKNOWN_ID_LABEL);
    format!("IVLP-{label}-{sequence:03}")
}

/// `docx` for Word documents, `pdf` for anything else.
fn document_type(file_path: &str) -> &'static str {
    if file_path.to_lowercase().ends_with(".docx") {
        "docx"
    } else {
        "pdf"
    }
}

/// Enrich inventory records into database resources.
///
/// Sequence numbers run over the whole input in order, so ids are unique
/// within one formatting pass.
pub fn format_resources(proposals: &[ProposalRecord], now: DateTime<Utc>) -> Vec<DatabaseResource> {
    let created_date = now.to_rfc3339();

    proposals
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let status = Status::from_fiscal_year(p.fiscal_year);
            DatabaseResource {
                id: resource_id(p.fiscal_year, idx + 1),
                title: p.title.clone(),
                description: p.text_preview.clone(),
                resource_type: RESOURCE_TYPE.to_string(),
                fiscal_year: p.fiscal_year,
                status,
                priority: priority_of(p.fiscal_year),
                themes: p.themes.clone(),
                regions: p.regions.clone(),
                file_path: p.file_path.clone(),
                filename: p.filename.clone(),
                created_date: created_date.clone(),
                is_active: status.is_active(),
                metadata: ResourceMetadata {
                    years_mentioned: p.years_mentioned.clone(),
                    document_type: document_type(&p.file_path).to_string(),
                },
            }
        })
        .collect()
}

/// Wrap resources into a stage file with a freshly computed summary.
pub fn summarize(
    resources: Vec<DatabaseResource>,
    data_source: &str,
    now: DateTime<Utc>,
) -> ResourceFile {
    ResourceFile {
        summary: ResourceSummary::compute(&resources),
        resources,
        last_updated: now.to_rfc3339(),
        data_source: data_source.to_string(),
        cleaned: false,
        removed_duplicates: 0,
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Write any serializable value as pretty JSON.
pub(crate) fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ProposalKitError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).map_err(|e| ProposalKitError::io(path, e))?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

/// Read a stage input; missing or malformed files are input errors.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ProposalKitError::input(path, format!("cannot read stage input: {e}"))
    })?;
    serde_json::from_str(&content)
        .map_err(|e| ProposalKitError::input(path, format!("malformed stage input: {e}")))
}

pub fn write_resource_file(path: &Path, file: &ResourceFile) -> Result<()> {
    write_json(path, file)
}

pub fn read_resource_file(path: &Path) -> Result<ResourceFile> {
    read_json(path)
}

/// Write the flat CSV projection of `resources`.
///
/// List fields are joined with `", "`. The CSV is an export format only and
/// is never read back.
pub fn write_resources_csv(path: &Path, resources: &[DatabaseResource]) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| ProposalKitError::io(path, e))?;
    let mut writer = csv::Writer::from_writer(file);
    let csv_err = |e: csv::Error| ProposalKitError::Serialization(format!("CSV write failed: {e}"));

    writer.write_record(CSV_COLUMNS).map_err(csv_err)?;
    for r in resources {
        writer
            .write_record([
                r.id.clone(),
                r.title.clone(),
                r.fiscal_year.map(|fy| fy.to_string()).unwrap_or_default(),
                r.status.to_string(),
                r.priority.to_string(),
                r.themes.join(", "),
                r.regions.join(", "),
                r.is_active.to_string(),
                r.file_path.clone(),
            ])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|e| ProposalKitError::io(path, e))?;

    debug!(path = %path.display(), rows = resources.len(), "wrote CSV file");
    Ok(())
}

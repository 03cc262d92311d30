//! Batch stages. Each stage reads the previous stage's file and writes its own.
//!
//! ```text
//! root ─ inventory ─> proposals_inventory.json ─ prepare ─> database_resources.{json,csv}
//!      └ organizations ─> organizations.json            ├ duplicates ─> duplicates_report.json
//!                                                       └ clean ─> database_resources_cleaned.json ─ import ─> catalog
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use proposalkit_dedup::resolve::ResolvedGroup;
use proposalkit_dedup::{DetectOptions, DuplicateReport, clean_duplicates, detect_duplicates};
use proposalkit_extract::{
    DocxReader, ParagraphSource, Segmenter, SegmenterOptions, build_proposal, discover_documents,
    extract_organizations,
};
use proposalkit_shared::{
    AppConfig, CatalogConfig, DatabaseResource, OrganizationRecord, ProposalRecord, ResourceFile,
    ResourceSummary, Result, ScanConfig,
};
use proposalkit_storage::{CatalogRow, ImportCounts, Storage};

use crate::format::{
    format_resources, read_json, read_resource_file, summarize, write_json, write_resource_file,
    write_resources_csv,
};

pub const INVENTORY_FILE: &str = "proposals_inventory.json";
pub const ORGANIZATIONS_FILE: &str = "organizations.json";
pub const RESOURCES_FILE: &str = "database_resources.json";
pub const RESOURCES_CSV_FILE: &str = "database_resources.csv";
pub const DUPLICATES_FILE: &str = "duplicates_report.json";
pub const CLEANED_FILE: &str = "database_resources_cleaned.json";

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for long-running stages.
pub trait ProgressReporter: Send + Sync {
    /// Called when a stage starts.
    fn phase(&self, name: &str);
    /// Called after each document has been read (successfully or not).
    fn document_read(&self, path: &Path, current: usize, total: usize);
    /// Called when the command has finished.
    fn done(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_read(&self, _path: &Path, _current: usize, _total: usize) {}
    fn done(&self) {}
}

// ---------------------------------------------------------------------------
// Document scanning
// ---------------------------------------------------------------------------

/// Read every document under `root`, handing the paragraphs to `visit`.
///
/// Unreadable documents are logged and returned as skipped.
fn scan_documents<F>(
    root: &Path,
    scan: &ScanConfig,
    reader: &dyn ParagraphSource,
    progress: &dyn ProgressReporter,
    mut visit: F,
) -> Result<(usize, Vec<PathBuf>)>
where
    F: FnMut(&Path, &[String]),
{
    let documents = discover_documents(root, scan)?;
    let total = documents.len();
    let mut skipped = Vec::new();

    for (i, path) in documents.iter().enumerate() {
        match reader.paragraphs(path) {
            Ok(paragraphs) => visit(path, &paragraphs),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read document, skipping");
                skipped.push(path.clone());
            }
        }
        progress.document_read(path, i + 1, total);
    }

    Ok((total, skipped))
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Accumulated result of an inventory scan.
#[derive(Debug, Clone)]
pub struct InventoryResult {
    /// Sorted by fiscal year then title, unknown fiscal year first.
    pub proposals: Vec<ProposalRecord>,
    pub documents: usize,
    pub skipped: Vec<PathBuf>,
}

fn sort_inventory(proposals: &mut [ProposalRecord]) {
    let year = |p: &ProposalRecord| p.fiscal_year.map(|fy| fy.as_str()).unwrap_or("");
    proposals.sort_by(|a, b| year(a).cmp(year(b)).then_with(|| a.title.cmp(&b.title)));
}

/// Build proposal records for every readable document under `root`.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn collect_inventory(
    root: &Path,
    config: &AppConfig,
    reader: &dyn ParagraphSource,
    progress: &dyn ProgressReporter,
) -> Result<InventoryResult> {
    progress.phase("Reading proposals");
    let mut proposals = Vec::new();

    let (documents, skipped) = scan_documents(root, &config.scan, reader, progress, |path, paragraphs| {
        if let Some(record) = build_proposal(path, paragraphs) {
            proposals.push(record);
        }
    })?;

    sort_inventory(&mut proposals);
    info!(
        documents,
        proposals = proposals.len(),
        skipped = skipped.len(),
        "inventory collected"
    );

    Ok(InventoryResult {
        proposals,
        documents,
        skipped,
    })
}

/// Inventory stage: scan `root` and write the proposal list to `out`.
pub fn run_inventory(
    root: &Path,
    out: &Path,
    config: &AppConfig,
    progress: &dyn ProgressReporter,
) -> Result<InventoryResult> {
    let result = collect_inventory(root, config, &DocxReader, progress)?;
    write_json(out, &result.proposals)?;
    Ok(result)
}

pub fn read_inventory(path: &Path) -> Result<Vec<ProposalRecord>> {
    read_json(path)
}

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

/// Extraction-rate statistics for the organizations stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrganizationStats {
    pub total_files: usize,
    pub total_organizations: usize,
    pub with_url: usize,
    /// Description longer than 50 characters.
    pub with_description: usize,
    /// Meeting focus longer than 20 characters.
    pub with_meeting_focus: usize,
}

impl OrganizationStats {
    pub fn compute(records: &[OrganizationRecord], total_files: usize) -> Self {
        let count = |f: fn(&OrganizationRecord) -> bool| records.iter().filter(|r| f(r)).count();
        Self {
            total_files,
            total_organizations: records.len(),
            with_url: count(|r| !r.organization.url.is_empty()),
            with_description: count(|r| r.organization.description.chars().count() > 50),
            with_meeting_focus: count(|r| r.organization.meeting_focus.chars().count() > 20),
        }
    }

    /// Share of organizations, in percent; 0 when there are none.
    pub fn percent(&self, count: usize) -> f64 {
        if self.total_organizations == 0 {
            0.0
        } else {
            count as f64 / self.total_organizations as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrganizationsResult {
    pub organizations: Vec<OrganizationRecord>,
    pub stats: OrganizationStats,
    pub skipped: Vec<PathBuf>,
}

/// Segment every readable document under `root` into organizations.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn collect_organizations(
    root: &Path,
    config: &AppConfig,
    reader: &dyn ParagraphSource,
    progress: &dyn ProgressReporter,
) -> Result<OrganizationsResult> {
    progress.phase("Extracting organizations");
    let segmenter = Segmenter::new(SegmenterOptions::from(&config.segmenter));
    let mut organizations = Vec::new();

    let (documents, skipped) = scan_documents(root, &config.scan, reader, progress, |path, paragraphs| {
        let found = extract_organizations(path, paragraphs, &segmenter);
        debug!(path = %path.display(), count = found.len(), "organizations found");
        organizations.extend(found);
    })?;

    let stats = OrganizationStats::compute(&organizations, documents);
    info!(
        files = stats.total_files,
        organizations = stats.total_organizations,
        with_url = stats.with_url,
        "organizations extracted"
    );

    Ok(OrganizationsResult {
        organizations,
        stats,
        skipped,
    })
}

/// Organizations stage: scan `root` and write the organization list to `out`.
pub fn run_organizations(
    root: &Path,
    out: &Path,
    config: &AppConfig,
    progress: &dyn ProgressReporter,
) -> Result<OrganizationsResult> {
    let result = collect_organizations(root, config, &DocxReader, progress)?;
    write_json(out, &result.organizations)?;
    Ok(result)
}

// ---------------------------------------------------------------------------
// Prepare
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PrepareResult {
    pub file: ResourceFile,
    pub json_path: PathBuf,
    pub csv_path: PathBuf,
}

/// Prepare stage: format the inventory into database resources (JSON + CSV).
#[instrument(skip_all, fields(input = %input.display()))]
pub fn run_prepare(
    input: &Path,
    out_dir: &Path,
    data_source: &str,
    now: DateTime<Utc>,
) -> Result<PrepareResult> {
    let proposals = read_inventory(input)?;
    let file = summarize(format_resources(&proposals, now), data_source, now);

    let json_path = out_dir.join(RESOURCES_FILE);
    let csv_path = out_dir.join(RESOURCES_CSV_FILE);
    write_resource_file(&json_path, &file)?;
    write_resources_csv(&csv_path, &file.resources)?;

    info!(
        resources = file.summary.total_resources,
        active = file.summary.active_count,
        "database resources prepared"
    );

    Ok(PrepareResult {
        file,
        json_path,
        csv_path,
    })
}

// ---------------------------------------------------------------------------
// Duplicates
// ---------------------------------------------------------------------------

/// Duplicates stage: analyze a resources file and write the report.
#[instrument(skip_all, fields(input = %input.display()))]
pub fn run_duplicates(input: &Path, out: &Path, options: &DetectOptions) -> Result<DuplicateReport> {
    let file = read_resource_file(input)?;
    let report = detect_duplicates(&file.resources, options);
    write_json(out, &report)?;
    Ok(report)
}

// ---------------------------------------------------------------------------
// Clean
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CleanResult {
    pub file: ResourceFile,
    pub groups: Vec<ResolvedGroup>,
}

/// Clean stage: keep one resource per exact title and write the cleaned file.
#[instrument(skip_all, fields(input = %input.display()))]
pub fn run_clean(input: &Path, out: &Path, now: DateTime<Utc>) -> Result<CleanResult> {
    let source = read_resource_file(input)?;
    let outcome = clean_duplicates(source.resources)?;

    let file = ResourceFile {
        summary: ResourceSummary::compute(&outcome.kept),
        resources: outcome.kept,
        last_updated: now.to_rfc3339(),
        data_source: source.data_source,
        cleaned: true,
        removed_duplicates: outcome.removed.len(),
    };
    write_resource_file(out, &file)?;

    Ok(CleanResult {
        file,
        groups: outcome.groups,
    })
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ImportResult {
    pub run_id: String,
    pub counts: ImportCounts,
    /// Ids of resources in batches that failed to write.
    pub failed_ids: Vec<String>,
    /// Inactive resources left out because of `active_only`.
    pub skipped_inactive: usize,
}

/// Import stage: upsert a resources file into the catalog in batches.
///
/// A failing batch is logged and counted; the remaining batches still run.
#[instrument(skip_all, fields(input = %input.display(), db = %db_path.display()))]
pub async fn run_import(
    input: &Path,
    db_path: &Path,
    catalog: &CatalogConfig,
    progress: &dyn ProgressReporter,
) -> Result<ImportResult> {
    let file = read_resource_file(input)?;
    let selected: Vec<&DatabaseResource> = file
        .resources
        .iter()
        .filter(|r| !catalog.active_only || r.is_active)
        .collect();
    let skipped_inactive = file.resources.len() - selected.len();

    progress.phase("Importing into catalog");
    let storage = Storage::open(db_path).await?;
    let run_id = storage
        .start_import_run(&input.display().to_string(), catalog.active_only)
        .await?;

    let batch_size = catalog.batch_size.max(1);
    let batches = selected.len().div_ceil(batch_size);
    let mut counts = ImportCounts {
        total: selected.len(),
        ..ImportCounts::default()
    };
    let mut failed_ids = Vec::new();

    for (i, batch) in selected.chunks(batch_size).enumerate() {
        let rows: Vec<CatalogRow> = batch.iter().map(|r| CatalogRow::from(*r)).collect();
        match storage.upsert_resources(&rows, Some(&run_id)).await {
            Ok(written) => {
                debug!(batch = i + 1, batches, written, "batch imported");
                counts.imported += written;
            }
            Err(e) => {
                warn!(batch = i + 1, batches, error = %e, "batch failed");
                counts.failed += batch.len();
                failed_ids.extend(batch.iter().map(|r| r.id.clone()));
            }
        }
    }

    storage.finish_import_run(&run_id, counts).await?;
    info!(
        imported = counts.imported,
        failed = counts.failed,
        skipped_inactive,
        "import finished"
    );

    Ok(ImportResult {
        run_id,
        counts,
        failed_ids,
        skipped_inactive,
    })
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub inventory: InventoryResult,
    pub prepared: PrepareResult,
    pub duplicates: DuplicateReport,
    pub cleaned: CleanResult,
}

/// Run inventory, prepare, duplicates and clean in order, writing every stage
/// file into `out_dir`.
#[instrument(skip_all, fields(root = %root.display(), out_dir = %out_dir.display()))]
pub fn run_pipeline(
    root: &Path,
    out_dir: &Path,
    config: &AppConfig,
    progress: &dyn ProgressReporter,
    now: DateTime<Utc>,
) -> Result<PipelineResult> {
    let inventory_path = out_dir.join(INVENTORY_FILE);
    let inventory = run_inventory(root, &inventory_path, config, progress)?;

    progress.phase("Formatting resources");
    let prepared = run_prepare(&inventory_path, out_dir, &root.display().to_string(), now)?;

    progress.phase("Detecting duplicates");
    let duplicates = run_duplicates(
        &prepared.json_path,
        &out_dir.join(DUPLICATES_FILE),
        &DetectOptions::from(&config.dedup),
    )?;

    progress.phase("Removing duplicates");
    let cleaned = run_clean(&prepared.json_path, &out_dir.join(CLEANED_FILE), now)?;

    Ok(PipelineResult {
        inventory,
        prepared,
        duplicates,
        cleaned,
    })
}

//! Document reading, classification and organization segmentation.
//!
//! Turns one proposal document into a [`ProposalRecord`] and the
//! [`OrganizationRecord`]s listed inside it. Nothing here keeps state across
//! documents; callers accumulate results themselves.

pub mod classify;
pub mod reader;
pub mod segmenter;
pub mod text;
pub mod walk;

use std::path::Path;

use tracing::{debug, instrument};

use proposalkit_shared::{OrganizationRecord, ProposalRecord};

pub use classify::{classify_fiscal_year, tag_regions, tag_themes, years_mentioned};
pub use reader::{DocxReader, ParagraphSource};
pub use segmenter::{Segmenter, SegmenterOptions, segment_organizations};
pub use walk::discover_documents;

/// Build the inventory record for one document.
///
/// Returns `None` when the document has no text; such files are not inventoried.
#[instrument(skip(paragraphs), fields(path = %path.display()))]
pub fn build_proposal(path: &Path, paragraphs: &[String]) -> Option<ProposalRecord> {
    if paragraphs.is_empty() {
        debug!("no paragraphs, skipping record");
        return None;
    }

    let text = paragraphs.join("\n");
    let file_path = path.to_string_lossy().to_string();
    let filename = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let record = ProposalRecord {
        title: text::title_from_stem(&filename),
        fiscal_year: classify_fiscal_year(&file_path),
        themes: tag_themes(&text),
        regions: tag_regions(&text),
        years_mentioned: years_mentioned(&text),
        text_preview: text::preview(&text),
        filename,
        file_path,
    };

    debug!(
        fiscal_year = ?record.fiscal_year,
        themes = ?record.themes,
        regions = ?record.regions,
        "proposal record built"
    );

    Some(record)
}

/// Segment one document and tag each organization with its source.
///
/// The fiscal year comes from the containing directory, not the file name.
pub fn extract_organizations(
    path: &Path,
    paragraphs: &[String],
    segmenter: &Segmenter,
) -> Vec<OrganizationRecord> {
    let source_proposal = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let fiscal_year = path
        .parent()
        .and_then(|dir| classify_fiscal_year(&dir.to_string_lossy()));

    segmenter
        .segment(paragraphs)
        .into_iter()
        .map(|organization| OrganizationRecord {
            organization,
            source_proposal: source_proposal.clone(),
            fiscal_year,
        })
        .collect()
}

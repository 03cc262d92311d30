//! Paragraph extraction from word-processing documents.
//!
//! A `.docx` file is a zip container; the body lives in `word/document.xml`
//! as a sequence of `<w:p>` paragraphs whose text is split across `<w:t>` runs.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, instrument};

use proposalkit_shared::{ProposalKitError, Result};

/// Zip entry holding the main document body.
const DOCUMENT_PART: &str = "word/document.xml";

/// Source of ordered, non-empty paragraph strings for one document.
pub trait ParagraphSource {
    /// Read every non-empty paragraph of the document at `path`, in order.
    fn paragraphs(&self, path: &Path) -> Result<Vec<String>>;
}

/// Reads Office Open XML (`.docx`) documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxReader;

impl ParagraphSource for DocxReader {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn paragraphs(&self, path: &Path) -> Result<Vec<String>> {
        let file = File::open(path).map_err(|e| ProposalKitError::document(path, e.to_string()))?;

        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| ProposalKitError::document(path, format!("not a document container: {e}")))?;

        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| ProposalKitError::document(path, format!("missing {DOCUMENT_PART}: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| ProposalKitError::document(path, format!("unreadable {DOCUMENT_PART}: {e}")))?;

        let paragraphs = paragraphs_from_xml(&xml);
        debug!(count = paragraphs.len(), "paragraphs extracted");
        Ok(paragraphs)
    }
}

// ---------------------------------------------------------------------------
// XML scanning
// ---------------------------------------------------------------------------

/// Matches a self-closing paragraph, or a paragraph with its body in group 1.
static PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:p(?:\s[^>]*)?/>|<w:p(?:\s[^>]*)?>(.*?)</w:p>").expect("paragraph regex")
});

/// Matches text runs (group 1), tabs (group 2) and line breaks (group 3).
static RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>([^<]*)</w:t>|(<w:tab\s*/>)|(<w:(?:br|cr)(?:\s[^>]*)?/>)")
        .expect("run regex")
});

/// Matches the five predefined XML entities and numeric references.
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);").expect("entity regex")
});

/// Split a `document.xml` body into its non-empty paragraph texts.
pub fn paragraphs_from_xml(xml: &str) -> Vec<String> {
    PARAGRAPH_RE
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|body| paragraph_text(body.as_str()))
        .filter(|text| !text.trim().is_empty())
        .collect()
}

/// Concatenate the runs of one paragraph body.
fn paragraph_text(body: &str) -> String {
    let mut text = String::new();
    for caps in RUN_RE.captures_iter(body) {
        if let Some(run) = caps.get(1) {
            text.push_str(&decode_entities(run.as_str()));
        } else if caps.get(2).is_some() {
            text.push('\t');
        } else if caps.get(3).is_some() {
            text.push('\n');
        }
    }
    text
}

/// Decode XML entity references; unknown code points are dropped.
fn decode_entities(raw: &str) -> String {
    ENTITY_RE
        .replace_all(raw, |caps: &Captures| match &caps[1] {
            "amp" => "&".to_string(),
            "lt" => "<".to_string(),
            "gt" => ">".to_string(),
            "quot" => "\"".to_string(),
            "apos" => "'".to_string(),
            numeric => {
                let code = match numeric.strip_prefix("#x") {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => numeric[1..].parse::<u32>().ok(),
                };
                code.and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_default()
            }
        })
        .into_owned()
}

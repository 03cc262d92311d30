//! Read-only duplicate analysis producing the four duplicate reports.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, instrument};

use proposalkit_shared::{DatabaseResource, DedupConfig, FiscalYear, fiscal_year_key};

use crate::{group_indices, normalize_title, similarity};

/// More similar pairs than this trigger a review recommendation.
const SIMILAR_REVIEW_THRESHOLD: usize = 5;

static COPY_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d+\)\s*").expect("copy suffix regex"));
static TRAILING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\d+\s*$").expect("trailing number regex"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectOptions {
    /// Pairs strictly above this similarity (and below 1.0) are reported.
    pub similarity_threshold: f64,
    /// Leading words of the normalized title forming the topic key.
    pub topic_words: usize,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self::from(&DedupConfig::default())
    }
}

impl From<&DedupConfig> for DetectOptions {
    fn from(config: &DedupConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            topic_words: config.topic_words,
        }
    }
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Identifying fields of a resource as listed in reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceRef {
    pub id: String,
    pub title: String,
    pub fiscal_year: Option<FiscalYear>,
    pub filename: String,
}

impl From<&DatabaseResource> for ResourceRef {
    fn from(r: &DatabaseResource) -> Self {
        Self {
            id: r.id.clone(),
            title: r.title.clone(),
            fiscal_year: r.fiscal_year,
            filename: r.filename.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExactTitleGroup {
    pub normalized_title: String,
    pub members: Vec<ResourceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarPair {
    pub similarity: f64,
    pub first: ResourceRef,
    pub second: ResourceRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicCluster {
    pub topic: String,
    /// Distinct fiscal-year keys present in the cluster, sorted.
    pub fiscal_years: Vec<String>,
    pub members: Vec<ResourceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilenameGroup {
    pub base_name: String,
    pub filenames: Vec<String>,
    pub members: Vec<ResourceRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationLevel {
    ActionRequired,
    Review,
    Normal,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub level: RecommendationLevel,
    pub message: String,
}

/// Counts, detail lists and recommendations for one resource set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateReport {
    pub total_resources: usize,
    pub exact_duplicates: usize,
    pub similar_titles: usize,
    pub multi_year_topics: usize,
    pub duplicate_filenames: usize,
    pub exact_duplicate_groups: Vec<ExactTitleGroup>,
    pub similar_pairs: Vec<SimilarPair>,
    pub multi_year_topic_clusters: Vec<TopicCluster>,
    pub duplicate_filename_groups: Vec<FilenameGroup>,
    pub recommendations: Vec<Recommendation>,
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Run every duplicate check over `resources` without modifying them.
#[instrument(skip_all, fields(resources = resources.len()))]
pub fn detect_duplicates(resources: &[DatabaseResource], options: &DetectOptions) -> DuplicateReport {
    let exact = exact_title_groups(resources);
    let similar = similar_title_pairs(resources, options.similarity_threshold);
    let topics = multi_year_topics(resources, options.topic_words);
    let filenames = duplicate_filename_groups(resources);

    let mut report = DuplicateReport {
        total_resources: resources.len(),
        exact_duplicates: exact.len(),
        similar_titles: similar.len(),
        multi_year_topics: topics.len(),
        duplicate_filenames: filenames.len(),
        exact_duplicate_groups: exact,
        similar_pairs: similar,
        multi_year_topic_clusters: topics,
        duplicate_filename_groups: filenames,
        recommendations: Vec::new(),
    };
    report.recommendations = recommendations(&report);

    info!(
        exact = report.exact_duplicates,
        similar = report.similar_titles,
        multi_year = report.multi_year_topics,
        filenames = report.duplicate_filenames,
        "duplicate analysis complete"
    );

    report
}

/// Groups of two or more resources whose normalized titles are equal.
pub fn exact_title_groups(resources: &[DatabaseResource]) -> Vec<ExactTitleGroup> {
    group_indices(resources, |r| normalize_title(&r.title))
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(normalized_title, members)| ExactTitleGroup {
            normalized_title,
            members: refs(resources, &members),
        })
        .collect()
}

/// Unordered pairs with `threshold < similarity < 1.0`, most similar first.
///
/// Identical titles are left to [`exact_title_groups`].
pub fn similar_title_pairs(resources: &[DatabaseResource], threshold: f64) -> Vec<SimilarPair> {
    let mut pairs = Vec::new();

    for (i, a) in resources.iter().enumerate() {
        for b in &resources[i + 1..] {
            let score = similarity(&a.title, &b.title);
            if score > threshold && score < 1.0 {
                pairs.push(SimilarPair {
                    similarity: score,
                    first: a.into(),
                    second: b.into(),
                });
            }
        }
    }

    pairs.sort_by(|x, y| y.similarity.total_cmp(&x.similarity));
    debug!(count = pairs.len(), threshold, "similar title pairs");
    pairs
}

/// Topic key: the first `words` words of the normalized title.
pub fn topic_key(title: &str, words: usize) -> String {
    normalize_title(title)
        .split(' ')
        .take(words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Topic clusters spanning more than one fiscal year.
///
/// A missing fiscal year counts as its own distinct value.
pub fn multi_year_topics(resources: &[DatabaseResource], words: usize) -> Vec<TopicCluster> {
    group_indices(resources, |r| topic_key(&r.title, words))
        .into_iter()
        .filter_map(|(topic, members)| {
            let years: BTreeSet<String> = members
                .iter()
                .map(|&i| fiscal_year_key(resources[i].fiscal_year))
                .collect();
            (members.len() > 1 && years.len() > 1).then(|| TopicCluster {
                topic,
                fiscal_years: years.into_iter().collect(),
                members: refs(resources, &members),
            })
        })
        .collect()
}

/// Filename with copy markers removed: `"Plan (2)"` and `"Plan 2"` both become `"plan"`.
pub fn base_filename(filename: &str) -> String {
    let lower = filename.to_lowercase();
    let stripped = COPY_SUFFIX_RE.replace_all(&lower, "");
    TRAILING_NUMBER_RE.replace(&stripped, "").trim().to_string()
}

/// Groups of two or more resources sharing a base filename.
pub fn duplicate_filename_groups(resources: &[DatabaseResource]) -> Vec<FilenameGroup> {
    group_indices(resources, |r| base_filename(&r.filename))
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(base_name, members)| FilenameGroup {
            base_name,
            filenames: members.iter().map(|&i| resources[i].filename.clone()).collect(),
            members: refs(resources, &members),
        })
        .collect()
}

fn refs(resources: &[DatabaseResource], indices: &[usize]) -> Vec<ResourceRef> {
    indices.iter().map(|&i| (&resources[i]).into()).collect()
}

fn recommendations(report: &DuplicateReport) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if report.exact_duplicates > 0 {
        out.push(Recommendation {
            level: RecommendationLevel::ActionRequired,
            message: format!(
                "{} exact-title groups found; run `clean` to keep the most recent fiscal year of each",
                report.exact_duplicates
            ),
        });
    }
    if report.similar_titles > SIMILAR_REVIEW_THRESHOLD {
        out.push(Recommendation {
            level: RecommendationLevel::Review,
            message: format!(
                "{} similar title pairs found; review them manually for near-duplicates",
                report.similar_titles
            ),
        });
    }
    if report.multi_year_topics > 0 {
        out.push(Recommendation {
            level: RecommendationLevel::Normal,
            message: format!(
                "{} topics recur across fiscal years; recurring programs are expected",
                report.multi_year_topics
            ),
        });
    }
    if report.duplicate_filenames > 0 {
        out.push(Recommendation {
            level: RecommendationLevel::Info,
            message: format!(
                "{} filename groups look like copies of the same document",
                report.duplicate_filenames
            ),
        });
    }

    out
}

//! Organization segmentation over a paragraph stream.
//!
//! Proposal documents list host organizations as loose blocks: a short name
//! line, a line carrying the organization URL, free description text and an
//! optional `Meeting Focus:` line. The segmenter walks the paragraphs once,
//! with one paragraph of lookahead, and cuts them into [`Organization`]s.
//!
//! Every paragraph is classified in this fixed precedence order:
//!
//! 1. [`Kind::Boundary`]: short paragraph containing a URL.
//! 2. [`Kind::LeadingName`] / [`Kind::Name`]: short, few words, and either
//!    directly followed by a boundary or filling the open record's empty name.
//! 3. [`Kind::MeetingFocus`]: contains the `Meeting Focus:` marker.
//! 4. [`Kind::Body`]: anything else.
//!
//! Transition table (`draft` is the open record):
//!
//! | state          | kind          | next state     | effect                                   |
//! |----------------|---------------|----------------|------------------------------------------|
//! | any            | Boundary      | `Describing`   | emit named draft, open new (pending name)|
//! | any            | LeadingName   | unchanged      | hold as pending name                     |
//! | `Describing`   | Name          | `Describing`   | set name                                 |
//! | `Focused`      | Name          | `Focused`      | set name                                 |
//! | `Idle`         | MeetingFocus  | `Idle`         | none                                     |
//! | open           | MeetingFocus  | `Focused`      | set meeting focus                        |
//! | `Describing`   | Body          | `Describing`   | append unless a section marker           |
//! | other          | Body          | unchanged      | none                                     |
//!
//! At the end of the stream a named draft is emitted; unnamed drafts are dropped.

use std::sync::LazyLock;

use regex::Regex;

use proposalkit_shared::{Organization, SegmenterConfig};

use crate::text::clean_text;

/// First URL-shaped token of a paragraph.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").expect("url regex"));

/// The meeting-focus marker with any trailing whitespace.
static MEETING_FOCUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)meeting focus:\s*").expect("meeting focus regex"));

/// Section headers that never belong to a description.
const SECTION_PREFIXES: [&str; 2] = ["Why ", "Project "];

/// Separator lines drawn with underscores.
const SEPARATOR_PREFIX: &str = "_____";

/// Length and word-count thresholds used to tell names from prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmenterOptions {
    /// Names and URL lines are strictly shorter than this (in characters).
    pub max_paragraph_chars: usize,
    /// Names have strictly fewer whitespace-separated tokens than this.
    pub max_name_words: usize,
}

impl Default for SegmenterOptions {
    fn default() -> Self {
        Self::from(&SegmenterConfig::default())
    }
}

impl From<&SegmenterConfig> for SegmenterOptions {
    fn from(config: &SegmenterConfig) -> Self {
        Self {
            max_paragraph_chars: config.max_paragraph_chars,
            max_name_words: config.max_name_words,
        }
    }
}

/// Segmenter state: whether a record is open and whether it still collects description.
#[derive(Debug)]
enum State {
    Idle,
    Describing(Organization),
    Focused(Organization),
}

impl State {
    fn draft(&self) -> Option<&Organization> {
        match self {
            Self::Idle => None,
            Self::Describing(draft) | Self::Focused(draft) => Some(draft),
        }
    }

    fn into_draft(self) -> Option<Organization> {
        match self {
            Self::Idle => None,
            Self::Describing(draft) | Self::Focused(draft) => Some(draft),
        }
    }
}

/// Classification of one paragraph.
#[derive(Debug, PartialEq, Eq)]
enum Kind<'a> {
    Boundary { url: &'a str },
    LeadingName,
    Name,
    MeetingFocus,
    Body,
}

/// Splits paragraph streams into organizations.
#[derive(Debug, Clone, Copy, Default)]
pub struct Segmenter {
    options: SegmenterOptions,
}

impl Segmenter {
    pub fn new(options: SegmenterOptions) -> Self {
        Self { options }
    }

    /// Segment one document's paragraphs into organizations, in document order.
    pub fn segment(&self, paragraphs: &[String]) -> Vec<Organization> {
        let cleaned: Vec<String> = paragraphs
            .iter()
            .map(|p| clean_text(p))
            .filter(|p| !p.is_empty())
            .collect();

        let mut organizations = Vec::new();
        let mut pending_name: Option<String> = None;
        let mut state = State::Idle;

        let mut stream = cleaned.iter().peekable();
        while let Some(text) = stream.next() {
            let next = stream.peek().map(|s| s.as_str());
            let kind = self.classify(text, next, &state);
            state = transition(state, kind, text, &mut pending_name, &mut organizations);
        }

        if let Some(draft) = state.into_draft() {
            emit_if_named(draft, &mut organizations);
        }

        organizations
    }

    fn classify<'a>(&self, text: &'a str, next: Option<&str>, state: &State) -> Kind<'a> {
        if let Some(url) = self.boundary_url(text) {
            return Kind::Boundary { url };
        }

        // Some(true) when a record is open and still unnamed.
        let open_unnamed = state.draft().map(|d| d.name.is_empty());

        if self.is_name_like(text) {
            let before_boundary = next.is_some_and(|n| self.boundary_url(n).is_some());
            if before_boundary
                && open_unnamed != Some(true)
                && !MEETING_FOCUS_RE.is_match(text)
                && !is_section_marker(text)
            {
                return Kind::LeadingName;
            }
            if open_unnamed == Some(true) {
                return Kind::Name;
            }
        }

        if MEETING_FOCUS_RE.is_match(text) {
            return Kind::MeetingFocus;
        }

        Kind::Body
    }

    fn is_short(&self, text: &str) -> bool {
        text.chars().count() < self.options.max_paragraph_chars
    }

    fn is_name_like(&self, text: &str) -> bool {
        self.is_short(text) && text.split_whitespace().count() < self.options.max_name_words
    }

    fn boundary_url<'a>(&self, text: &'a str) -> Option<&'a str> {
        if !self.is_short(text) {
            return None;
        }
        URL_RE.find(text).map(|m| m.as_str())
    }
}

/// Segment with the default thresholds.
pub fn segment_organizations(paragraphs: &[String]) -> Vec<Organization> {
    Segmenter::default().segment(paragraphs)
}

fn transition(
    state: State,
    kind: Kind<'_>,
    text: &str,
    pending_name: &mut Option<String>,
    out: &mut Vec<Organization>,
) -> State {
    match (state, kind) {
        (state, Kind::Boundary { url }) => {
            if let Some(draft) = state.into_draft() {
                emit_if_named(draft, out);
            }
            State::Describing(Organization {
                name: pending_name.take().unwrap_or_default(),
                url: url.to_string(),
                ..Organization::default()
            })
        }
        (state, Kind::LeadingName) => {
            *pending_name = Some(text.to_string());
            state
        }
        (State::Describing(mut draft), Kind::Name) => {
            draft.name = text.to_string();
            State::Describing(draft)
        }
        (State::Focused(mut draft), Kind::Name) => {
            draft.name = text.to_string();
            State::Focused(draft)
        }
        (State::Idle, Kind::Name | Kind::MeetingFocus) => State::Idle,
        (State::Describing(mut draft) | State::Focused(mut draft), Kind::MeetingFocus) => {
            draft.meeting_focus = clean_text(&MEETING_FOCUS_RE.replace_all(text, ""));
            State::Focused(draft)
        }
        (State::Describing(mut draft), Kind::Body) => {
            if !is_section_marker(text) {
                if !draft.description.is_empty() {
                    draft.description.push(' ');
                }
                draft.description.push_str(text);
            }
            State::Describing(draft)
        }
        (state, Kind::Body) => state,
    }
}

fn is_section_marker(text: &str) -> bool {
    SECTION_PREFIXES.iter().any(|p| text.starts_with(p)) || text.starts_with(SEPARATOR_PREFIX)
}

fn emit_if_named(draft: Organization, out: &mut Vec<Organization>) {
    if !draft.name.is_empty() {
        out.push(draft);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paras(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn names_before_and_after_urls() {
        let input = paras(&[
            "Org A",
            "http://a.example",
            "Meeting Focus: trade",
            "Widgets Inc",
            "http://b.example",
            "desc line",
        ]);
        let orgs = segment_organizations(&input);

        assert_eq!(orgs.len(), 2);
        assert_eq!(orgs[0].name, "Org A");
        assert_eq!(orgs[0].url, "http://a.example");
        assert_eq!(orgs[0].meeting_focus, "trade");
        assert_eq!(orgs[0].description, "");
        assert_eq!(orgs[1].name, "Widgets Inc");
        assert_eq!(orgs[1].url, "http://b.example");
        assert_eq!(orgs[1].description, "desc line");
        assert_eq!(orgs[1].meeting_focus, "");
    }

    #[test]
    fn name_following_url_is_taken() {
        let input = paras(&[
            "https://harbor.example.org",
            "San Diego Harbor Police",
            "The department patrols the bay and port facilities around the clock.",
            "It also coordinates with federal partners.",
        ]);
        let orgs = segment_organizations(&input);

        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].name, "San Diego Harbor Police");
        assert_eq!(
            orgs[0].description,
            "The department patrols the bay and port facilities around the clock. It also coordinates with federal partners."
        );
    }

    #[test]
    fn unnamed_records_are_dropped() {
        let input = paras(&["https://one.example", "https://two.example", "https://three.example"]);
        assert!(segment_organizations(&input).is_empty());
    }

    #[test]
    fn url_only_fragment_without_name_is_dropped() {
        let long = "word ".repeat(20);
        let input = paras(&["https://only.example", &long]);
        assert!(segment_organizations(&input).is_empty());
    }

    #[test]
    fn section_markers_are_not_description() {
        let input = paras(&[
            "https://clinic.example",
            "Community Clinic",
            "Why this organization matters to the program",
            "Project objectives include outreach",
            "____________________",
            "Provides care to underserved families.",
        ]);
        let orgs = segment_organizations(&input);

        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].description, "Provides care to underserved families.");
    }

    #[test]
    fn meeting_focus_stops_description() {
        let input = paras(&[
            "https://port.example",
            "Port Authority",
            "Manages cargo terminals.",
            "meeting focus:   logistics and supply chains",
            "Trailing remarks that belong to nobody in particular at all.",
        ]);
        let orgs = segment_organizations(&input);

        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].description, "Manages cargo terminals.");
        assert_eq!(orgs[0].meeting_focus, "logistics and supply chains");
    }

    #[test]
    fn long_paragraph_with_url_is_description() {
        let long = format!("See https://ref.example for details. {}", "More prose here. ".repeat(15));
        assert!(long.chars().count() >= 200);
        let input = paras(&["https://org.example", "Research Institute", &long]);
        let orgs = segment_organizations(&input);

        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].url, "https://org.example");
        assert!(orgs[0].description.starts_with("See https://ref.example"));
    }

    #[test]
    fn url_token_is_first_match_only() {
        let input = paras(&["Org", "Website: https://x.example/path?q=1 or http://y.example"]);
        let orgs = segment_organizations(&input);
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].url, "https://x.example/path?q=1");
    }

    #[test]
    fn trailing_name_wins_over_lookahead_for_unnamed_record() {
        let input = paras(&["https://first.example", "Org B", "https://second.example"]);
        let orgs = segment_organizations(&input);

        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].name, "Org B");
        assert_eq!(orgs[0].url, "https://first.example");
    }

    #[test]
    fn unnamed_record_takes_marker_line_as_name() {
        let input = paras(&["https://a.example", "Meeting Focus: trade"]);
        let orgs = segment_organizations(&input);

        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].name, "Meeting Focus: trade");
        assert_eq!(orgs[0].meeting_focus, "");
    }

    #[test]
    fn separator_between_blocks_is_not_a_name() {
        let input = paras(&[
            "https://a.example",
            "Org A",
            "Runs coastal programs.",
            "____________________",
            "https://b.example",
            "Org B",
            "Runs port programs.",
        ]);
        let orgs = segment_organizations(&input);

        assert_eq!(orgs.len(), 2);
        assert_eq!(orgs[0].name, "Org A");
        assert_eq!(orgs[0].description, "Runs coastal programs.");
        assert_eq!(orgs[1].name, "Org B");
        assert_eq!(orgs[1].url, "https://b.example");
        assert_eq!(orgs[1].description, "Runs port programs.");
    }

    #[test]
    fn section_header_before_first_url_is_not_a_name() {
        let input = paras(&["Why these organizations", "https://a.example", "Org A", "desc"]);
        let orgs = segment_organizations(&input);

        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].name, "Org A");
        assert_eq!(orgs[0].description, "desc");
    }

    #[test]
    fn marker_before_url_is_meeting_focus_not_name() {
        let input = paras(&[
            "Org A",
            "https://a.example",
            "Meeting Focus: ports",
            "https://b.example",
            "Org B",
        ]);
        let orgs = segment_organizations(&input);

        assert_eq!(orgs.len(), 2);
        assert_eq!(orgs[0].meeting_focus, "ports");
        assert_eq!(orgs[1].name, "Org B");
    }

    #[test]
    fn prose_before_first_url_is_ignored() {
        let input = paras(&[
            "Fentanyl and Protecting Public Health",
            "This project brings participants together with many partner organizations across the region to study policy.",
            "Harbor Clinic",
            "https://clinic.example",
        ]);
        let orgs = segment_organizations(&input);

        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].name, "Harbor Clinic");
        assert!(orgs[0].description.is_empty());
    }

    #[test]
    fn typographic_quotes_are_normalized() {
        let input = paras(&["https://a.example", "Women\u{2019}s Center", "  ", "Serves \u{201C}all\u{201D}."]);
        let orgs = segment_organizations(&input);

        assert_eq!(orgs[0].name, "Women's Center");
        assert_eq!(orgs[0].description, "Serves \"all\".");
    }

    #[test]
    fn custom_thresholds_change_name_detection() {
        let segmenter = Segmenter::new(SegmenterOptions {
            max_paragraph_chars: 200,
            max_name_words: 3,
        });
        let input = paras(&["https://a.example", "Three Word Name", "Ok Name"]);
        let orgs = segmenter.segment(&input);

        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].name, "Ok Name");
        assert_eq!(orgs[0].description, "Three Word Name");
    }
}

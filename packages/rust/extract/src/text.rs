//! Small text helpers shared by the segmenter and the record builder.

/// Maximum characters kept in a proposal preview before the ellipsis.
pub const PREVIEW_CHARS: usize = 300;

/// Number of leading lines that make up a preview.
const PREVIEW_LINES: usize = 3;

/// Replace typographic punctuation with ASCII and trim surrounding whitespace.
pub fn clean_text(text: &str) -> String {
    text.replace(['\u{2019}', '\u{2018}'], "'")
        .replace(['\u{2013}', '\u{2014}'], "-")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{00A0}', " ")
        .trim()
        .to_string()
}

/// First three lines of `text` joined by a space, cut at [`PREVIEW_CHARS`].
pub fn preview(text: &str) -> String {
    let head = text
        .split('\n')
        .take(PREVIEW_LINES)
        .collect::<Vec<_>>()
        .join(" ");

    if head.chars().count() > PREVIEW_CHARS {
        let cut: String = head.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        head
    }
}

/// Display title derived from a file stem.
pub fn title_from_stem(stem: &str) -> String {
    stem.replace('_', " ").replace('-', " - ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_normalizes_punctuation() {
        let input = "  \u{201C}Women\u{2019}s Health\u{201D} \u{2013} 2025 ";
        assert_eq!(clean_text(input), "\"Women's Health\" - 2025");
    }

    #[test]
    fn preview_joins_first_three_lines() {
        let text = "Line one\nLine two\nLine three\nLine four";
        assert_eq!(preview(text), "Line one Line two Line three");
    }

    #[test]
    fn preview_truncates_long_text() {
        let text = "x".repeat(400);
        let result = preview(&text);
        assert_eq!(result.chars().count(), PREVIEW_CHARS + 3);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn preview_keeps_exact_limit() {
        let text = "y".repeat(PREVIEW_CHARS);
        assert_eq!(preview(&text), text);
    }

    #[test]
    fn title_from_stem_spaces_separators() {
        assert_eq!(
            title_from_stem("Fentanyl_and_Public-Health"),
            "Fentanyl and Public - Health"
        );
    }
}

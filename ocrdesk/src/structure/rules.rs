//! Per-line classification rules.
//!
//! Each predicate looks at one line (plus the little block context the table
//! rule needs). [`RULES`] fixes the evaluation order: the first rule that
//! matches decides the kind; lines no rule claims are paragraphs.
//!
//! Thresholds:
//! - heading: a `#`..`######` marker, or at most 60 characters and 8 words,
//!   no trailing sentence punctuation, no column gaps, ALL CAPS or Title Case
//! - list item: bullet (`- * + • ◦ ▪ ‣`) or `1.` / `1)` / `(1)` / `a.` / `a)`
//!   marker followed by whitespace
//! - table row: at least 2 cells split by tabs or runs of 2+ spaces, inside a
//!   run of 2+ adjacent lines with the same cell count
//! - code: indented by 4+ columns, or ending in `{`, `}` or `;`

use std::sync::LazyLock;

use regex::Regex;

use super::BlockKind;

pub const HEADING_MAX_CHARS: usize = 60;
pub const HEADING_MAX_WORDS: usize = 8;
pub const CODE_INDENT_COLUMNS: usize = 4;
pub const TABLE_MIN_CELLS: usize = 2;
pub const TABLE_MIN_ROWS: usize = 2;

static MARKDOWN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(\S.*)$").expect("valid heading regex"));

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+•◦▪‣]|\(?(?:\d{1,3}|[a-z])[.)])\s+\S").expect("valid list regex")
});

static COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t+| {2,}").expect("valid column gap regex"));

/// Words that may stay lowercase inside a Title Case heading.
const MINOR_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "in", "of", "on", "or", "the", "to", "with",
];

/// What a rule gets to look at for one line.
#[derive(Debug, Clone, Copy)]
pub struct LineContext<'a> {
    pub line: &'a str,
    /// The line sits in a run of table-shaped lines.
    pub in_table_run: bool,
}

pub type Rule = (BlockKind, fn(&LineContext<'_>) -> bool);

pub const RULES: &[Rule] = &[
    (BlockKind::Heading, heading_rule),
    (BlockKind::ListItem, list_rule),
    (BlockKind::TableRow, table_rule),
    (BlockKind::Code, code_rule),
];

fn heading_rule(ctx: &LineContext<'_>) -> bool {
    is_heading(ctx.line)
}

fn list_rule(ctx: &LineContext<'_>) -> bool {
    is_list_item(ctx.line)
}

fn table_rule(ctx: &LineContext<'_>) -> bool {
    ctx.in_table_run
}

fn code_rule(ctx: &LineContext<'_>) -> bool {
    is_code(ctx.line)
}

/// Classify one line with the ordered rules, falling back to paragraph.
pub fn classify(ctx: &LineContext<'_>) -> BlockKind {
    RULES
        .iter()
        .find(|(_, matches)| matches(ctx))
        .map(|(kind, _)| *kind)
        .unwrap_or(BlockKind::Paragraph)
}

pub fn indent_columns(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// `Some((level, title))` for `## Title` style headings.
pub fn markdown_heading(line: &str) -> Option<(u8, &str)> {
    let caps = MARKDOWN_HEADING.captures(line.trim())?;
    let level = caps.get(1)?.as_str().len() as u8;
    Some((level, caps.get(2)?.as_str().trim_end()))
}

pub fn has_column_gap(text: &str) -> bool {
    COLUMN_GAP.is_match(text.trim())
}

pub fn split_cells(line: &str) -> Vec<&str> {
    COLUMN_GAP
        .split(line.trim())
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .collect()
}

pub fn is_heading(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    if markdown_heading(trimmed).is_some() {
        return true;
    }
    if indent_columns(line) >= CODE_INDENT_COLUMNS
        || trimmed.chars().count() > HEADING_MAX_CHARS
        || has_column_gap(trimmed)
        || starts_with_bullet(trimmed)
    {
        return false;
    }
    if trimmed.ends_with(['.', ',', ';', ':', '!', '?']) {
        return false;
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if words.len() > HEADING_MAX_WORDS || !trimmed.chars().any(char::is_alphabetic) {
        return false;
    }

    is_all_caps(trimmed) || is_title_case(&words)
}

pub fn is_list_item(line: &str) -> bool {
    LIST_MARKER.is_match(line)
}

pub fn is_code(line: &str) -> bool {
    if indent_columns(line) >= CODE_INDENT_COLUMNS && !line.trim().is_empty() {
        return true;
    }
    line.trim_end().ends_with(['{', '}', ';'])
}

/// Lines that may take part in a table run.
pub fn table_cell_count(line: &str) -> Option<usize> {
    if line.trim().is_empty() || indent_columns(line) >= CODE_INDENT_COLUMNS {
        return None;
    }
    let cells = split_cells(line).len();
    (cells >= TABLE_MIN_CELLS).then_some(cells)
}

fn starts_with_bullet(trimmed: &str) -> bool {
    trimmed.starts_with(['-', '*', '+', '•', '◦', '▪', '‣'])
}

fn is_all_caps(text: &str) -> bool {
    let mut letters = text.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(|c| !c.is_lowercase())
}

fn is_title_case(words: &[&str]) -> bool {
    words.iter().enumerate().all(|(i, word)| {
        let Some(first) = word.chars().find(|c| c.is_alphanumeric()) else {
            return true;
        };
        if !first.is_alphabetic() || first.is_uppercase() {
            return true;
        }
        i > 0 && MINOR_WORDS.contains(&word.to_lowercase().as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(line: &str) -> LineContext<'_> {
        LineContext {
            line,
            in_table_run: false,
        }
    }

    #[test]
    fn test_heading_all_caps() {
        assert!(is_heading("SUMMARY"));
        assert!(is_heading("1. INTRODUCTION"));
        assert!(!is_heading("SUMMARY."));
    }

    #[test]
    fn test_heading_title_case() {
        assert!(is_heading("Quarterly Results for the North Region"));
        assert!(!is_heading("The results were good overall"));
    }

    #[test]
    fn test_heading_markdown_marker() {
        assert!(is_heading("## Installation"));
        assert_eq!(markdown_heading("### Usage notes"), Some((3, "Usage notes")));
        assert!(markdown_heading("#include <stdio.h>").is_none());
    }

    #[test]
    fn test_heading_rejects_long_lines() {
        let long = "WORD ".repeat(9);
        assert!(!is_heading(long.trim()));
        let wide = "A".repeat(HEADING_MAX_CHARS + 1);
        assert!(!is_heading(&wide));
    }

    #[test]
    fn test_heading_rejects_table_header_and_bullets() {
        assert!(!is_heading("NAME    AGE    CITY"));
        assert!(!is_heading("- ITEM"));
        assert!(!is_heading("    INDENTED"));
    }

    #[test]
    fn test_list_markers() {
        for line in ["- milk", "* eggs", "• bread", "1. first", "12) twelfth", "(3) third", "a. alpha", "  - nested"] {
            assert!(is_list_item(line), "{line} should be a list item");
        }
        for line in ["-dash without space", "1.5 million people", "Plain sentence"] {
            assert!(!is_list_item(line), "{line} should not be a list item");
        }
    }

    #[test]
    fn test_code_detection() {
        assert!(is_code("    let x = 1"));
        assert!(is_code("\treturn x"));
        assert!(is_code("fn main() {"));
        assert!(is_code("}"));
        assert!(is_code("x = compute(y);"));
        assert!(!is_code("An ordinary sentence."));
    }

    #[test]
    fn test_split_cells() {
        assert_eq!(split_cells("Name\tAge\tCity"), vec!["Name", "Age", "City"]);
        assert_eq!(split_cells("Alice   30  Paris"), vec!["Alice", "30", "Paris"]);
        assert_eq!(table_cell_count("one two three"), None);
        assert_eq!(table_cell_count("left  right"), Some(2));
    }

    #[test]
    fn test_rule_order_first_match_wins() {
        // all caps and a list marker: heading rule runs first
        assert_eq!(classify(&ctx("1. OVERVIEW")), BlockKind::Heading);
        // list marker inside a table run: list rule runs before table
        let in_run = LineContext {
            line: "- a  b",
            in_table_run: true,
        };
        assert_eq!(classify(&in_run), BlockKind::ListItem);
        assert_eq!(classify(&ctx("just words here.")), BlockKind::Paragraph);
    }

    #[test]
    fn test_indent_columns_counts_tabs_as_four() {
        assert_eq!(indent_columns("\tx"), 4);
        assert_eq!(indent_columns("  x"), 2);
    }
}

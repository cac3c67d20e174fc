use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::rules::{self, LineContext};
use super::{BlockKind, TextBlock};

const PREVIEW_COUNT: usize = 3;
const MAX_LIST_LEVEL: u8 = 9;

/// Classify extracted text into ordered blocks.
///
/// Fenced regions (```` ``` ```` or `~~~` pairs) are resolved first: their
/// inner lines become code and the fence lines themselves are dropped. An
/// unmatched fence line is ordinary text. Everything else goes through
/// [`rules::classify`] line by line, and adjacent paragraph lines are merged
/// until a blank line or another kind interrupts them.
pub fn analyze(text: &str) -> Vec<TextBlock> {
    let lines: Vec<&str> = text.lines().collect();
    let fenced = fenced_lines(&lines);
    let in_table = table_runs(&lines, &fenced);

    let mut blocks: Vec<TextBlock> = Vec::new();
    let mut paragraph_open = false;

    for (idx, line) in lines.iter().enumerate() {
        match fenced[idx] {
            Fence::Marker => {
                paragraph_open = false;
                continue;
            }
            Fence::Inside => {
                paragraph_open = false;
                push(&mut blocks, BlockKind::Code, line.trim_end().to_string(), 0, idx);
                continue;
            }
            Fence::Outside => {}
        }

        if line.trim().is_empty() {
            paragraph_open = false;
            continue;
        }

        let ctx = LineContext {
            line,
            in_table_run: in_table[idx],
        };
        let kind = rules::classify(&ctx);

        match kind {
            BlockKind::Paragraph => {
                let content = line.trim();
                match blocks.last_mut() {
                    Some(last) if paragraph_open => {
                        last.content.push('\n');
                        last.content.push_str(content);
                    }
                    _ => push(&mut blocks, kind, content.to_string(), 0, idx),
                }
                paragraph_open = true;
                continue;
            }
            BlockKind::Heading => {
                let (level, content) = rules::markdown_heading(line).unwrap_or((1, line.trim()));
                push(&mut blocks, kind, content.to_string(), level, idx);
            }
            BlockKind::ListItem => {
                let depth = rules::indent_columns(line) / 2 + 1;
                let level = u8::try_from(depth).unwrap_or(MAX_LIST_LEVEL).min(MAX_LIST_LEVEL);
                push(&mut blocks, kind, line.trim().to_string(), level, idx);
            }
            BlockKind::TableRow => {
                push(&mut blocks, kind, line.trim().to_string(), 0, idx);
            }
            BlockKind::Code => {
                push(&mut blocks, kind, line.trim_end().to_string(), 0, idx);
            }
        }
        paragraph_open = false;
    }

    blocks
}

fn push(blocks: &mut Vec<TextBlock>, kind: BlockKind, content: String, level: u8, idx: usize) {
    let order = blocks.len();
    blocks.push(TextBlock {
        kind,
        content,
        order,
        level,
        line: idx + 1,
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fence {
    Outside,
    Marker,
    Inside,
}

fn fence_marker(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    ["```", "~~~"]
        .into_iter()
        .find(|marker| trimmed.starts_with(marker))
}

fn fenced_lines(lines: &[&str]) -> Vec<Fence> {
    let mut state = vec![Fence::Outside; lines.len()];
    let mut idx = 0;

    while idx < lines.len() {
        let Some(marker) = fence_marker(lines[idx]) else {
            idx += 1;
            continue;
        };
        let close = (idx + 1..lines.len()).find(|&j| fence_marker(lines[j]) == Some(marker));
        match close {
            Some(end) => {
                state[idx] = Fence::Marker;
                state[end] = Fence::Marker;
                for slot in &mut state[idx + 1..end] {
                    *slot = Fence::Inside;
                }
                idx = end + 1;
            }
            None => idx += 1,
        }
    }

    state
}

/// Marks lines that belong to a run of adjacent table-shaped lines sharing
/// one cell count.
fn table_runs(lines: &[&str], fenced: &[Fence]) -> Vec<bool> {
    let counts: Vec<Option<usize>> = lines
        .iter()
        .zip(fenced)
        .map(|(line, fence)| match fence {
            Fence::Outside => rules::table_cell_count(line),
            _ => None,
        })
        .collect();

    let mut marks = vec![false; lines.len()];
    let mut start = 0;
    while start < counts.len() {
        let Some(cells) = counts[start] else {
            start += 1;
            continue;
        };
        let mut end = start + 1;
        while end < counts.len() && counts[end] == Some(cells) {
            end += 1;
        }
        if end - start >= rules::TABLE_MIN_ROWS {
            for mark in &mut marks[start..end] {
                *mark = true;
            }
        }
        start = end;
    }

    marks
}

/// Block counts plus the first few headings and list items, shown next to
/// the extracted text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StructureSummary {
    pub headings: usize,
    pub list_items: usize,
    pub table_rows: usize,
    pub code_lines: usize,
    pub paragraphs: usize,
    pub heading_preview: Vec<String>,
    pub list_preview: Vec<String>,
}

impl StructureSummary {
    pub fn from_blocks(blocks: &[TextBlock]) -> Self {
        let mut summary = Self::default();
        for block in blocks {
            match block.kind {
                BlockKind::Heading => {
                    summary.headings += 1;
                    if summary.heading_preview.len() < PREVIEW_COUNT {
                        summary.heading_preview.push(block.content.clone());
                    }
                }
                BlockKind::ListItem => {
                    summary.list_items += 1;
                    if summary.list_preview.len() < PREVIEW_COUNT {
                        summary.list_preview.push(block.content.clone());
                    }
                }
                BlockKind::TableRow => summary.table_rows += 1,
                BlockKind::Code => summary.code_lines += 1,
                BlockKind::Paragraph => summary.paragraphs += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(blocks: &[TextBlock]) -> Vec<BlockKind> {
        blocks.iter().map(|b| b.kind).collect()
    }

    #[test]
    fn test_heading_then_paragraph() {
        let text = "SUMMARY\nThe quarter closed with revenue up.\nCosts were flat year over year.";
        let blocks = analyze(text);

        assert_eq!(kinds(&blocks), vec![BlockKind::Heading, BlockKind::Paragraph]);
        assert_eq!(blocks[0].content, "SUMMARY");
        assert_eq!(blocks[0].level, 1);
        assert_eq!(
            blocks[1].content,
            "The quarter closed with revenue up.\nCosts were flat year over year."
        );
        assert_eq!(blocks[1].line, 2);
    }

    #[test]
    fn test_blank_line_splits_paragraphs() {
        let blocks = analyze("first paragraph here.\n\nsecond paragraph here.");
        assert_eq!(kinds(&blocks), vec![BlockKind::Paragraph, BlockKind::Paragraph]);
        assert_eq!(blocks[1].order, 1);
        assert_eq!(blocks[1].line, 3);
    }

    #[test]
    fn test_list_items_with_nesting() {
        let blocks = analyze("- apples\n  - green ones\n2. pears");
        assert_eq!(kinds(&blocks), vec![BlockKind::ListItem; 3]);
        assert_eq!(blocks[0].level, 1);
        assert_eq!(blocks[1].level, 2);
        assert_eq!(blocks[1].content, "- green ones");
    }

    #[test]
    fn test_table_requires_consistent_run() {
        let text = "Name    Age    City\nAlice   30     Paris\nBob     41     Rome\nthis is prose  with a gap.";
        let blocks = analyze(text);

        assert_eq!(
            kinds(&blocks),
            vec![
                BlockKind::TableRow,
                BlockKind::TableRow,
                BlockKind::TableRow,
                BlockKind::Paragraph
            ]
        );
        assert_eq!(blocks[1].cells(), vec!["Alice", "30", "Paris"]);
    }

    #[test]
    fn test_single_gapped_line_is_not_a_table() {
        let blocks = analyze("total due  42 dollars today.");
        assert_eq!(kinds(&blocks), vec![BlockKind::Paragraph]);
    }

    #[test]
    fn test_fenced_code_drops_fences() {
        let text = "Example:\n```\nNAME  VALUE\n- not a list\n```\nafter the block.";
        let blocks = analyze(text);

        assert_eq!(
            kinds(&blocks),
            vec![
                BlockKind::Paragraph,
                BlockKind::Code,
                BlockKind::Code,
                BlockKind::Paragraph
            ]
        );
        assert_eq!(blocks[1].content, "NAME  VALUE");
        assert_eq!(blocks[2].content, "- not a list");
    }

    #[test]
    fn test_unmatched_fence_is_plain_text() {
        let blocks = analyze("```\nloose text here.");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
        assert_eq!(blocks[0].content, "```\nloose text here.");
    }

    #[test]
    fn test_indented_and_braced_code() {
        let blocks = analyze("fn main() {\n    println!(\"hi\")\n}");
        assert_eq!(kinds(&blocks), vec![BlockKind::Code; 3]);
        assert_eq!(blocks[1].content, "    println!(\"hi\")");
    }

    #[test]
    fn test_markdown_heading_level() {
        let blocks = analyze("## Setup steps\nrun the installer first.");
        assert_eq!(blocks[0].kind, BlockKind::Heading);
        assert_eq!(blocks[0].level, 2);
        assert_eq!(blocks[0].content, "Setup steps");
    }

    #[test]
    fn test_crlf_input() {
        let blocks = analyze("TITLE\r\nbody text goes here.\r\n");
        assert_eq!(kinds(&blocks), vec![BlockKind::Heading, BlockKind::Paragraph]);
        assert_eq!(blocks[1].content, "body text goes here.");
    }

    #[test]
    fn test_orders_are_sequential() {
        let text = "INTRO\n- a thing\nsome words.\n\n    code line\nEND";
        let blocks = analyze(text);
        let orders: Vec<usize> = blocks.iter().map(|b| b.order).collect();
        assert_eq!(orders, (0..blocks.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_deterministic() {
        let text = "REPORT\nName  Qty\nPens  4\n- one\n```\nx;\n```\nclosing words.";
        assert_eq!(analyze(text), analyze(text));
    }

    #[test]
    fn test_empty_text() {
        assert!(analyze("").is_empty());
        assert!(analyze("\n\n   \n").is_empty());
    }

    #[test]
    fn test_summary_counts_and_previews() {
        let text = "ONE\nTWO\nTHREE\nFOUR\n- a\n- b\n- c\n- d\nplain words.";
        let summary = StructureSummary::from_blocks(&analyze(text));

        assert_eq!(summary.headings, 4);
        assert_eq!(summary.list_items, 4);
        assert_eq!(summary.paragraphs, 1);
        assert_eq!(summary.heading_preview, vec!["ONE", "TWO", "THREE"]);
        assert_eq!(summary.list_preview, vec!["- a", "- b", "- c"]);
    }
}

//! Heuristic structure detection over extracted text.
//!
//! `analyze` turns newline-delimited OCR text into an ordered sequence of
//! [`TextBlock`]s. The classifier is deliberately simple and deterministic;
//! misclassifications are expected, nondeterminism is not.

mod analyzer;
pub mod rules;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use analyzer::{analyze, StructureSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Heading,
    ListItem,
    TableRow,
    Code,
    Paragraph,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Heading => "heading",
            BlockKind::ListItem => "list-item",
            BlockKind::TableRow => "table-row",
            BlockKind::Code => "code",
            BlockKind::Paragraph => "paragraph",
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    pub kind: BlockKind,
    pub content: String,
    /// Position in document order, starting at 0.
    pub order: usize,
    /// Heading level (1 = top) or list nesting depth (1 = outermost). 0 otherwise.
    #[serde(default)]
    pub level: u8,
    /// 1-based source line of the block's first line.
    #[serde(default)]
    pub line: usize,
}

impl TextBlock {
    /// Cells of a table row; a single cell for any other kind.
    pub fn cells(&self) -> Vec<&str> {
        match self.kind {
            BlockKind::TableRow => rules::split_cells(&self.content),
            _ => vec![self.content.as_str()],
        }
    }
}

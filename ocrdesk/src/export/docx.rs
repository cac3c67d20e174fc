use std::io::Cursor;

use docx_rs::{BreakType, Docx, Paragraph, Run, RunFonts, Style, StyleType, Table, TableCell, TableRow};

use crate::error::Result;
use crate::structure::{BlockKind, TextBlock};

use super::{export_error, ExportFormat, ReportInfo, REPORT_TITLE};

const CODE_STYLE: &str = "Code";
const CODE_FONT: &str = "Courier New";
/// Left indent per list level, in twentieths of a point.
const LIST_INDENT_TWIPS: i32 = 360;

pub fn render(blocks: &[TextBlock], info: &ReportInfo) -> Result<Vec<u8>> {
    for block in blocks {
        check_xml_text(&block.content)?;
    }

    let mut docx = with_styles(Docx::new())
        .add_paragraph(Paragraph::new().style("Title").add_run(Run::new().add_text(REPORT_TITLE)))
        .add_paragraph(text_paragraph(&format!("Generated: {}", info.generated_label())))
        .add_paragraph(text_paragraph(&format!("Language: {}", info.language_label())));

    let mut pending_rows: Vec<&TextBlock> = Vec::new();
    for block in blocks {
        if block.kind == BlockKind::TableRow {
            let same_shape = pending_rows
                .first()
                .map_or(true, |first| first.cells().len() == block.cells().len());
            if !same_shape {
                docx = docx.add_table(build_table(&pending_rows));
                pending_rows.clear();
            }
            pending_rows.push(block);
            continue;
        }
        if !pending_rows.is_empty() {
            docx = docx.add_table(build_table(&pending_rows));
            pending_rows.clear();
        }

        docx = match block.kind {
            BlockKind::Heading => {
                let level = block.level.clamp(1, 3);
                docx.add_paragraph(
                    Paragraph::new()
                        .style(&format!("Heading{level}"))
                        .add_run(Run::new().add_text(&block.content)),
                )
            }
            BlockKind::ListItem => {
                let indent = LIST_INDENT_TWIPS * i32::from(block.level.max(1));
                docx.add_paragraph(
                    text_paragraph(&block.content).indent(Some(indent), None, None, None),
                )
            }
            BlockKind::Code => docx.add_paragraph(
                Paragraph::new().style(CODE_STYLE).add_run(
                    Run::new()
                        .fonts(RunFonts::new().ascii(CODE_FONT).hi_ansi(CODE_FONT))
                        .add_text(&block.content),
                ),
            ),
            BlockKind::Paragraph => {
                let mut run = Run::new();
                for (i, line) in block.content.lines().enumerate() {
                    if i > 0 {
                        run = run.add_break(BreakType::TextWrapping);
                    }
                    run = run.add_text(line);
                }
                docx.add_paragraph(Paragraph::new().add_run(run))
            }
            BlockKind::TableRow => docx,
        };
    }
    if !pending_rows.is_empty() {
        docx = docx.add_table(build_table(&pending_rows));
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| export_error(ExportFormat::Docx, e))?;
    Ok(buffer.into_inner())
}

fn with_styles(docx: Docx) -> Docx {
    docx.add_style(Style::new("Title", StyleType::Paragraph).name("Title").size(36).bold())
        .add_style(Style::new("Heading1", StyleType::Paragraph).name("Heading 1").size(32).bold())
        .add_style(Style::new("Heading2", StyleType::Paragraph).name("Heading 2").size(28).bold())
        .add_style(Style::new("Heading3", StyleType::Paragraph).name("Heading 3").size(24).bold())
        .add_style(Style::new(CODE_STYLE, StyleType::Paragraph).name("Code").size(20))
}

fn text_paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

fn build_table(rows: &[&TextBlock]) -> Table {
    let rows = rows
        .iter()
        .map(|block| {
            let cells = block
                .cells()
                .into_iter()
                .map(|cell| TableCell::new().add_paragraph(text_paragraph(cell)))
                .collect();
            TableRow::new(cells)
        })
        .collect();
    Table::new(rows)
}

/// Word documents are XML; control characters other than tab and newlines
/// cannot be represented at all.
fn check_xml_text(text: &str) -> Result<()> {
    let invalid = text.chars().find(|&c| {
        matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
    });
    match invalid {
        Some(c) => Err(export_error(
            ExportFormat::Docx,
            format!("control character U+{:04X} cannot be written to a Word document", c as u32),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrDeskError;
    use crate::structure::analyze;

    fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
        let mut content = String::new();
        for child in &paragraph.children {
            if let docx_rs::ParagraphChild::Run(run) = child {
                for run_child in &run.children {
                    match run_child {
                        docx_rs::RunChild::Text(text) => content.push_str(&text.text),
                        docx_rs::RunChild::Break(_) => content.push('\n'),
                        _ => {}
                    }
                }
            }
        }
        content
    }

    fn read_back(bytes: &[u8]) -> (Vec<(Option<String>, String)>, usize) {
        let docx = docx_rs::read_docx(bytes).unwrap();
        let mut paragraphs = Vec::new();
        let mut tables = 0;
        for child in &docx.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(p) => {
                    let style = p.property.style.as_ref().map(|s| s.val.clone());
                    paragraphs.push((style, paragraph_text(p)));
                }
                docx_rs::DocumentChild::Table(_) => tables += 1,
                _ => {}
            }
        }
        (paragraphs, tables)
    }

    #[test]
    fn test_renders_styled_document() {
        let text = "SUMMARY\nfirst line.\nsecond line.\n- item\nName  Qty\nPens  4\nfn main() {";
        let bytes = render(&analyze(text), &ReportInfo::new("eng")).unwrap();
        let (paragraphs, tables) = read_back(&bytes);

        assert_eq!(paragraphs[0], (Some("Title".to_string()), REPORT_TITLE.to_string()));
        assert!(paragraphs[1].1.starts_with("Generated: "));
        assert_eq!(paragraphs[2].1, "Language: English (eng)");
        assert_eq!(paragraphs[3], (Some("Heading1".to_string()), "SUMMARY".to_string()));
        assert_eq!(paragraphs[4].1, "first line.\nsecond line.");
        assert_eq!(paragraphs[5].1, "- item");
        assert_eq!(paragraphs[6], (Some("Code".to_string()), "fn main() {".to_string()));
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_unicode_is_fine() {
        let bytes = render(&analyze("東京の天気"), &ReportInfo::new("jpn")).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_control_characters_rejected() {
        let blocks = analyze("bad \u{1} byte here.");
        let err = render(&blocks, &ReportInfo::new("eng")).unwrap_err();
        assert!(matches!(err, OcrDeskError::Export(_)));
    }
}

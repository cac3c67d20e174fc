use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::Result;
use crate::structure::{BlockKind, TextBlock};

use super::{export_error, ExportFormat, ReportInfo, REPORT_TITLE};

// A4 in points
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 56;
const LIST_INDENT: i64 = 16;

const BODY_SIZE: i64 = 11;
const CODE_SIZE: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
    Mono,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Mono => "F3",
        }
    }

    fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Mono => "Courier",
        }
    }

    /// Rough characters per line; the standard fonts carry no metrics here.
    fn chars_per_line(&self, size: i64, width: i64) -> usize {
        let per_char_milli = match self {
            Font::Mono => 600,
            Font::Regular | Font::Bold => 520,
        };
        let fit = width * 1000 / (size * per_char_milli);
        fit.max(10) as usize
    }
}

struct Line {
    font: Font,
    size: i64,
    indent: i64,
    bytes: Vec<u8>,
    space_after: i64,
}

/// Lays out lines top to bottom and starts a new page when the bottom
/// margin is reached.
struct PageWriter {
    pages: Vec<Vec<Operation>>,
    y: i64,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn write(&mut self, line: Line) {
        let leading = line.size * 14 / 10;
        if self.y - leading < MARGIN {
            self.pages.push(Vec::new());
            self.y = PAGE_HEIGHT - MARGIN;
        }
        self.y -= leading;

        if let Some(ops) = self.pages.last_mut() {
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new(
                "Tf",
                vec![line.font.resource().into(), line.size.into()],
            ));
            ops.push(Operation::new(
                "Td",
                vec![(MARGIN + line.indent).into(), self.y.into()],
            ));
            ops.push(Operation::new("Tj", vec![Object::string_literal(line.bytes)]));
            ops.push(Operation::new("ET", vec![]));
        }
        self.y -= line.space_after;
    }
}

pub fn render(blocks: &[TextBlock], info: &ReportInfo) -> Result<Vec<u8>> {
    let mut writer = PageWriter::new();

    emit(&mut writer, REPORT_TITLE, Font::Bold, 16, 0, 6)?;
    emit(
        &mut writer,
        &format!("Generated: {}", info.generated_label()),
        Font::Regular,
        10,
        0,
        0,
    )?;
    emit(
        &mut writer,
        &format!("Language: {}", info.language_label()),
        Font::Regular,
        10,
        0,
        14,
    )?;

    for block in blocks {
        match block.kind {
            BlockKind::Heading => {
                let size = match block.level {
                    0 | 1 => 16,
                    2 => 14,
                    _ => 12,
                };
                emit(&mut writer, &block.content, Font::Bold, size, 0, 6)?;
            }
            BlockKind::ListItem => {
                let indent = LIST_INDENT * i64::from(block.level.max(1));
                emit(&mut writer, &block.content, Font::Regular, BODY_SIZE, indent, 2)?;
            }
            BlockKind::TableRow => {
                let row = block.cells().join("  |  ");
                emit(&mut writer, &row, Font::Mono, CODE_SIZE, 0, 0)?;
            }
            BlockKind::Code => {
                emit(&mut writer, &block.content, Font::Mono, CODE_SIZE, 0, 0)?;
            }
            BlockKind::Paragraph => {
                for line in block.content.lines() {
                    emit(&mut writer, line, Font::Regular, BODY_SIZE, 0, 0)?;
                }
                writer.y -= 8;
            }
        }
    }

    assemble(writer.pages)
}

fn emit(
    writer: &mut PageWriter,
    text: &str,
    font: Font,
    size: i64,
    indent: i64,
    space_after: i64,
) -> Result<()> {
    let encoded = encode_win_ansi(text)?;
    let width = PAGE_WIDTH - 2 * MARGIN - indent;
    let chunks = wrap(&encoded, font.chars_per_line(size, width), font == Font::Mono);
    let last = chunks.len().saturating_sub(1);

    for (i, bytes) in chunks.into_iter().enumerate() {
        writer.write(Line {
            font,
            size,
            indent,
            bytes,
            space_after: if i == last { space_after } else { 0 },
        });
    }
    Ok(())
}

/// Characters WinAnsi places in 0x80..=0x9F, where Latin-1 has controls.
const WIN_ANSI_EXTRAS: [(char, u8); 27] = [
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];

/// Encodes text for the standard fonts' WinAnsi encoding: printable Latin-1
/// maps byte for byte, plus the extras table. Anything else is refused.
fn encode_win_ansi(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\t' => out.extend_from_slice(b"    "),
            ' '..='~' | '\u{a0}'..='\u{ff}' => out.push(c as u8),
            other => match WIN_ANSI_EXTRAS.iter().find(|(ch, _)| *ch == other) {
                Some((_, byte)) => out.push(*byte),
                None => {
                    return Err(export_error(
                        ExportFormat::Pdf,
                        format!(
                            "character {:?} (U+{:04X}) is not supported by the PDF fonts",
                            other, other as u32
                        ),
                    ));
                }
            },
        }
    }
    Ok(out)
}

/// Splits at spaces where possible, hard-breaking words longer than a line.
/// Monospace lines are broken at the width without looking for spaces.
fn wrap(bytes: &[u8], width: usize, hard: bool) -> Vec<Vec<u8>> {
    if bytes.len() <= width {
        return vec![bytes.to_vec()];
    }
    if hard {
        return bytes.chunks(width).map(<[u8]>::to_vec).collect();
    }

    let mut lines = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    for word in bytes.split(|b| *b == b' ').filter(|w| !w.is_empty()) {
        let needed = if current.is_empty() { word.len() } else { current.len() + 1 + word.len() };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for piece in word.chunks(width) {
            if !current.is_empty() {
                if current.len() + 1 + piece.len() > width {
                    lines.push(std::mem::take(&mut current));
                } else {
                    current.push(b' ');
                }
            }
            current.extend_from_slice(piece);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn assemble(pages: Vec<Vec<Operation>>) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for font in [Font::Regular, Font::Bold, Font::Mono] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| export_error(ExportFormat::Pdf, e))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let media_box: Vec<Object> = vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()];
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => media_box,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| export_error(ExportFormat::Pdf, e))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrDeskError;
    use crate::structure::analyze;

    fn page_count(bytes: &[u8]) -> usize {
        Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[test]
    fn test_renders_loadable_pdf() {
        let blocks = analyze("SUMMARY\nRevenue grew (a lot) this year.\n- item one\nName  Qty\nPens  4");
        let bytes = render(&blocks, &ReportInfo::new("eng")).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(page_count(&bytes), 1);
    }

    #[test]
    fn test_long_text_paginates() {
        let text = (0..200)
            .map(|i| format!("line number {i} of a long scanned page."))
            .collect::<Vec<_>>()
            .join("\n");
        let bytes = render(&analyze(&text), &ReportInfo::new("eng")).unwrap();

        assert!(page_count(&bytes) > 1);
    }

    #[test]
    fn test_latin1_accepted() {
        let blocks = analyze("café déjà vu, naïve.");
        assert!(render(&blocks, &ReportInfo::new("fre")).is_ok());
    }

    #[test]
    fn test_typographic_punctuation_accepted() {
        let blocks = analyze("SHOPPING\n• bread\n• milk\n\u{201C}Fresh\u{201D} loaf \u{2013} \u{20AC}4\u{2026}");
        assert!(blocks.iter().any(|b| b.kind == BlockKind::ListItem));

        let bytes = render(&blocks, &ReportInfo::new("eng")).unwrap();
        assert_eq!(page_count(&bytes), 1);
    }

    #[test]
    fn test_win_ansi_extras_map_to_high_bytes() {
        assert_eq!(
            encode_win_ansi("\u{20AC}\u{201C}\u{201D}\u{2022}\u{2013}\u{2014}\u{2026}\u{2122}").unwrap(),
            vec![0x80, 0x93, 0x94, 0x95, 0x96, 0x97, 0x85, 0x99]
        );
        assert_eq!(encode_win_ansi("a\u{e9}\t").unwrap(), b"a\xe9    ".to_vec());
    }

    #[test]
    fn test_unsupported_characters_are_export_errors() {
        let blocks = analyze("東京の天気");
        let err = render(&blocks, &ReportInfo::new("jpn")).unwrap_err();
        assert!(matches!(err, OcrDeskError::Export(_)));
    }

    #[test]
    fn test_wrap_breaks_on_spaces() {
        let lines = wrap(b"aaa bbb ccc", 7, false);
        assert_eq!(lines, vec![b"aaa bbb".to_vec(), b"ccc".to_vec()]);

        let long = wrap(b"abcdefghij", 4, false);
        assert_eq!(long, vec![b"abcd".to_vec(), b"efgh".to_vec(), b"ij".to_vec()]);

        assert_eq!(wrap(b"abcdef", 4, true).len(), 2);
    }
}

//! Minimal PDF writer for collection reports
//!
//! Produces a PDF 1.4 file with one Helvetica font, paginated text lines
//! and a byte-exact cross-reference table. Text is written in the font's
//! WinAnsi encoding: Latin-1 and the Windows-1252 punctuation print as is,
//! Latin Extended-A letters lose their diacritic, and anything else
//! becomes `?`.

use chrono::{DateTime, Utc};

use crate::models::{ReportRow, ReportType};

const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const MARGIN: u32 = 72;
const LINES_PER_PAGE: usize = 34;

/// Everything a rendered report shows
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub report_type: ReportType,
    pub criteria: String,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
}

struct Line {
    size: u32,
    text: String,
}

impl Line {
    fn new(size: u32, text: impl Into<String>) -> Self {
        Self {
            size,
            text: text.into(),
        }
    }
}

impl ReportDocument {
    fn lines(&self) -> Vec<Line> {
        let mut lines = vec![
            Line::new(20, "Waste Management Report"),
            Line::new(12, ""),
            Line::new(14, format!("Report Type: {}", self.report_type)),
            Line::new(14, format!("Criteria: {}", self.criteria)),
            Line::new(
                12,
                format!(
                    "Generated by {} on {}",
                    self.generated_by,
                    self.generated_at.format("%Y-%m-%d %H:%M UTC")
                ),
            ),
            Line::new(12, ""),
            Line::new(14, "Collections by waste type"),
        ];

        if self.rows.is_empty() {
            lines.push(Line::new(12, "No collections in this period."));
        }
        for row in &self.rows {
            lines.push(Line::new(
                12,
                format!(
                    "{}: {} collections, {:.2} kg",
                    row.waste_type, row.total_collections, row.total_quantity
                ),
            ));
        }

        let total_quantity: f64 = self.rows.iter().map(|r| r.total_quantity).sum();
        let total_collections: i64 = self.rows.iter().map(|r| r.total_collections).sum();
        lines.push(Line::new(12, ""));
        lines.push(Line::new(
            14,
            format!(
                "Total: {} collections, {:.2} kg",
                total_collections, total_quantity
            ),
        ));
        lines
    }
}

/// Base letter of each character in U+0100..=U+017F
const LATIN_EXTENDED_A: &[u8; 128] = b"AaAaAaCcCcCcCcDdDdEeEeEeEeEeGgGgGgGgHhHhIiIiIiIiIiIiJjKkk\
LlLlLlLlLlNnNnNnnNnOoOoOoOoRrRrRrSsSsSsSsTtTtTtUuUuUuUuUuUuWwYyYZzZzZzs";

/// Byte for `c` under WinAnsiEncoding
fn win_ansi(c: char) -> Option<u8> {
    let byte = match c {
        ' '..='~' | '\u{a0}'..='\u{ff}' => c as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        '\u{100}'..='\u{17f}' => LATIN_EXTENDED_A[c as usize - 0x100],
        _ => return None,
    };
    Some(byte)
}

/// A PDF literal string body. Bytes above ASCII are written as octal
/// escapes so the content stream stays 7-bit.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match win_ansi(c) {
            Some(b'\\' | b'(' | b')') => {
                escaped.push('\\');
                escaped.push(c);
            }
            Some(byte) if byte.is_ascii() => escaped.push(char::from(byte)),
            Some(byte) => escaped.push_str(&format!("\\{:03o}", byte)),
            None => escaped.push('?'),
        }
    }
    escaped
}

fn content_stream(lines: &[Line]) -> String {
    let mut stream = String::new();
    let mut y = PAGE_HEIGHT - MARGIN;
    for line in lines {
        y = y.saturating_sub(line.size + 6);
        stream.push_str(&format!(
            "BT /F1 {} Tf {} {} Td ({}) Tj ET\n",
            line.size,
            MARGIN,
            y,
            escape(&line.text)
        ));
    }
    stream
}

/// Render a report to PDF bytes
pub fn render(document: &ReportDocument) -> Vec<u8> {
    let lines = document.lines();
    let pages: Vec<&[Line]> = lines.chunks(LINES_PER_PAGE).collect();

    // 1 catalog, 2 page tree, 3 font, then a page and its content per page
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            page_ids
                .iter()
                .map(|id| format!("{} 0 R", id))
                .collect::<Vec<_>>()
                .join(" "),
            pages.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    for (page, page_id) in pages.iter().zip(&page_ids) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH,
            PAGE_HEIGHT,
            page_id + 1
        ));
        let stream = content_stream(page);
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            stream.len(),
            stream
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", index + 1, body));
    }

    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));

    out.into_bytes()
}

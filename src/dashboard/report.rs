//! Snapshot report
//!
//! Builds the one-page telemetry report and serializes it as a minimal
//! PDF 1.4 document: one A4 page, Helvetica, one text line per row.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;

use super::model::{LoadId, LoadReading};
use super::render::report_line;

/// File name the report is saved under
pub const REPORT_FILE_NAME: &str = "Power_Report.pdf";

/// Title line at the top of the report
pub const REPORT_TITLE: &str = "Smart Energy Tracker - Snapshot";

const MM_TO_PT: f64 = 72.0 / 25.4;
const PAGE_WIDTH_PT: f64 = 595.28;
const PAGE_HEIGHT_PT: f64 = 841.89;
const FONT_SIZE: u32 = 16;
const LEFT_MARGIN_MM: f64 = 10.0;
const TITLE_Y_MM: f64 = 12.0;
const TITLE_GAP_MM: f64 = 8.0;
const LINE_GAP_MM: f64 = 6.0;

/// Report text before it is laid out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotReport {
    pub title: String,
    pub lines: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl SnapshotReport {
    /// Build the report from a point-in-time `loads` snapshot
    pub fn from_loads(loads: &Value) -> Self {
        let readings = LoadReading::all_from_snapshot(loads);
        Self {
            title: REPORT_TITLE.to_string(),
            lines: LoadId::all()
                .map(|id| report_line(id, &readings[id.index()]))
                .collect(),
            generated_at: Utc::now(),
        }
    }

    /// Serialize as a PDF document
    pub fn to_pdf(&self) -> Vec<u8> {
        let mut rows = Vec::with_capacity(self.lines.len() + 1);
        let mut y = TITLE_Y_MM;
        rows.push((y, self.title.as_str()));
        y += TITLE_GAP_MM;
        for line in &self.lines {
            rows.push((y, line.as_str()));
            y += LINE_GAP_MM;
        }

        let mut content = String::new();
        for (y_mm, text) in rows {
            // PDF origin is bottom-left; layout is measured from the top
            let _ = writeln!(
                content,
                "BT /F1 {} Tf {:.2} {:.2} Td ({}) Tj ET",
                FONT_SIZE,
                LEFT_MARGIN_MM * MM_TO_PT,
                PAGE_HEIGHT_PT - y_mm * MM_TO_PT,
                escape_text(text)
            );
        }

        let content = content.trim_end_matches('\n');

        let objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>",
                PAGE_WIDTH_PT, PAGE_HEIGHT_PT
            ),
            format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                content.len(),
                content
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
            format!(
                "<< /Title ({}) /Producer (energy-tracker) /CreationDate (D:{}Z) >>",
                escape_text(&self.title),
                self.generated_at.format("%Y%m%d%H%M%S")
            ),
        ];

        write_pdf(&objects)
    }
}

/// Lay out numbered objects, the xref table and the trailer.
/// Object 1 is the catalog and the last object the info dictionary.
fn write_pdf(objects: &[String]) -> Vec<u8> {
    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());

    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{}\nendobj\n", i + 1, body);
    }

    let xref_offset = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in &offsets {
        let _ = write!(out, "{:010} 00000 n \n", offset);
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        objects.len(),
        xref_offset
    );

    out.into_bytes()
}

/// Escape a string literal; characters outside printable ASCII become `?`
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' '..='~' => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}

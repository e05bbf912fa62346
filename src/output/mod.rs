pub mod report;

use crate::table::{self, Column, PermissionRecord, ReportSummary, SortState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" | "table" => Some(Self::Text),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".csv") {
        return Some(OutputFormat::Csv);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

pub fn render(
    format: OutputFormat,
    records: &[PermissionRecord],
    sort: Option<SortState>,
    summary: Option<&ReportSummary>,
) -> Vec<u8> {
    match format {
        OutputFormat::Text => table::render_text(records, sort).into_bytes(),
        OutputFormat::Json => render_json(records),
        OutputFormat::Csv => render_csv(records),
        OutputFormat::Html => report::render_html(records, summary),
    }
}

pub fn render_json(records: &[PermissionRecord]) -> Vec<u8> {
    let mut out = serde_json::to_vec_pretty(records).unwrap_or_else(|_| b"[]".to_vec());
    out.push(b'\n');
    out
}

fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn render_csv(records: &[PermissionRecord]) -> Vec<u8> {
    let mut out = String::new();
    let header: Vec<_> = Column::ALL.iter().map(|c| escape_csv(c.label())).collect();
    out.push_str(&header.join(","));
    out.push_str("\r\n");
    for r in records {
        let row: Vec<_> = Column::ALL
            .iter()
            .map(|c| escape_csv(c.value(r).unwrap_or("")))
            .collect();
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }
    out.into_bytes()
}

use serde::Serialize;

use crate::model::Record;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct SelectionSummary<'a> {
    pub count: usize,
    pub records: Vec<&'a Record>,
}

impl<'a> SelectionSummary<'a> {
    pub fn new(records: Vec<&'a Record>) -> Self {
        Self {
            count: records.len(),
            records,
        }
    }
}

pub fn render_text(summary: &SelectionSummary<'_>) -> Vec<u8> {
    let mut out = String::new();
    for r in summary.records.iter() {
        out.push_str(&r.id.to_string());
        out.push('\t');
        out.push_str(&r.title);
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_json(summary: &SelectionSummary<'_>) -> Vec<u8> {
    serde_json::to_vec_pretty(summary).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render(summary: &SelectionSummary<'_>, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(summary),
        OutputFormat::Json => render_json(summary),
    }
}

pub async fn write_summary(
    path: &str,
    format: Option<OutputFormat>,
    summary: &SelectionSummary<'_>,
) -> Result<OutputFormat, String> {
    let format = format
        .or_else(|| infer_format_from_path(path))
        .unwrap_or(OutputFormat::Text);
    tokio::fs::write(path, render(summary, format))
        .await
        .map_err(|e| format!("failed to write output file '{path}': {e}"))?;
    Ok(format)
}

use crate::error::OutputError;
use crate::parser::record::value_as_text;
use crate::parser::FeedbackRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A finished evaluation: the raw feedback record plus the overall grade
/// lifted out of it for storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub evaluation_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub overall_grade: String,
    pub response: FeedbackRecord,
}

impl EvaluationReport {
    pub fn new(evaluation_id: Uuid, response: FeedbackRecord) -> Self {
        let overall_grade = response.overall_grade().unwrap_or("-").to_string();
        Self {
            evaluation_id,
            evaluated_at: Utc::now(),
            overall_grade,
            response,
        }
    }
}

/// Write `<id>.json` and `<id>.md` into `report_dir`, returning the JSON path
pub fn write_report(report_dir: &Path, report: &EvaluationReport) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(report_dir).map_err(OutputError::CreateDir)?;

    let json_path = report_dir.join(format!("{}.json", report.evaluation_id));
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&json_path, json).map_err(OutputError::WriteReport)?;

    let md_path = report_dir.join(format!("{}.md", report.evaluation_id));
    fs::write(&md_path, build_markdown(report)).map_err(OutputError::WriteReport)?;

    Ok(json_path)
}

fn build_markdown(report: &EvaluationReport) -> String {
    let mut content = String::new();

    content.push_str(&format!("# Feedback {}\n\n", report.evaluation_id));
    content.push_str("| Metric | Value |\n");
    content.push_str("|--------|-------|\n");
    content.push_str(&format!("| Overall Grade | {} |\n", report.overall_grade));
    content.push_str(&format!(
        "| Evaluated At | {} |\n",
        report.evaluated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    content.push_str(&format!("| Fields | {} |\n", report.response.len()));
    content.push_str("\n---\n\n");

    for (key, value) in report.response.iter() {
        content.push_str(&format!("## {}\n\n{}\n\n", key.replace('_', " "), value_as_text(value)));
    }

    content
}

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Finding, RejectedFinding};
use crate::pipeline::RunState;

/// Where and when a run happened
#[derive(Debug, Clone)]
pub struct RunMetadata {
    pub provider: String,
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

impl RunMetadata {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            generated_at: Utc::now(),
        }
    }
}

/// Machine-readable audit record of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub provider: String,
    pub model: String,
    pub windows_total: usize,
    pub windows_failed: usize,
    pub verified_findings: Vec<Finding>,
    pub rejected_findings: Vec<RejectedFinding>,
    pub rejected_count: usize,
    pub per_chunk_log: Vec<String>,
}

impl RunRecord {
    pub fn new(state: &RunState, metadata: &RunMetadata) -> Self {
        Self {
            run_id: state.run_id,
            generated_at: metadata.generated_at,
            provider: metadata.provider.clone(),
            model: metadata.model.clone(),
            windows_total: state.windows_total,
            windows_failed: state.windows_failed,
            verified_findings: state.verified_findings.clone(),
            rejected_findings: state.rejected_findings.clone(),
            rejected_count: state.rejected_count(),
            per_chunk_log: state.per_chunk_log.clone(),
        }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = create_file(path)?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}

/// Final Markdown report: a metadata header followed by the Reporter's text
pub struct ReportDocument<'a> {
    report: &'a str,
    state: &'a RunState,
    metadata: &'a RunMetadata,
}

impl<'a> ReportDocument<'a> {
    pub fn new(report: &'a str, state: &'a RunState, metadata: &'a RunMetadata) -> Self {
        Self {
            report,
            state,
            metadata,
        }
    }

    pub fn format(&self) -> String {
        let mut output = String::from("# 신문조서 분석 보고서\n\n");

        output.push_str(&format!("- 실행 ID: {}\n", self.state.run_id));
        output.push_str(&format!(
            "- 생성 시각: {}\n",
            self.metadata
                .generated_at
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        output.push_str(&format!(
            "- 모델: {} / {}\n",
            self.metadata.provider, self.metadata.model
        ));
        output.push_str(&format!(
            "- 분석 구간: {}/{} (실패 {})\n",
            self.state.windows_processed, self.state.windows_total, self.state.windows_failed
        ));
        output.push_str(&format!(
            "- 검증 발견: {}건, 기각: {}건\n",
            self.state.verified_findings.len(),
            self.state.rejected_count()
        ));
        output.push_str("\n---\n\n");

        output.push_str(self.report.trim_end());
        output.push('\n');
        output
    }

    /// Write to a Markdown file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let mut file = create_file(path)?;
        write!(file, "{}", self.format())?;
        Ok(())
    }
}

fn create_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    std::fs::File::create(path).with_context(|| format!("Failed to create file: {:?}", path))
}

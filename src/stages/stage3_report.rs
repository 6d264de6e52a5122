use tracing::{info, warn};

use crate::llm::{
    build_reporter_prompt, GatewayError, ModelGateway, StageRole, REPORTER_SYSTEM_PROMPT,
    REPORT_SECTIONS,
};
use crate::models::Finding;

/// Execute Stage 3: compile every verified finding into the final report
///
/// The report is Markdown text and is returned as-is. Missing sections are
/// logged but do not fail the stage.
pub async fn execute_reporter(
    gateway: &dyn ModelGateway,
    findings: &[Finding],
) -> Result<String, GatewayError> {
    info!("Stage 3: compiling report from {} verified findings", findings.len());

    let prompt = build_reporter_prompt(findings);
    let report = gateway
        .invoke(StageRole::Reporter, REPORTER_SYSTEM_PROMPT, &prompt)
        .await?;

    let missing = missing_report_sections(&report);
    if !missing.is_empty() {
        warn!("Report is missing sections: {}", missing.join(", "));
    }

    Ok(report)
}

/// Sections of the fixed report layout that do not appear as headings
pub fn missing_report_sections(report: &str) -> Vec<&'static str> {
    let headings: Vec<&str> = report
        .lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with('#'))
        .collect();

    REPORT_SECTIONS
        .iter()
        .copied()
        .filter(|section| !headings.iter().any(|h| h.contains(section)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, FindingCategory};
    use crate::test_support::ScriptedGateway;

    const FULL_REPORT: &str = "### 🔎 분석 요약\n요약\n\n### 🚨 핵심 발견 사항\n1. **[혐의]** ...\n\n### 📋 위협평가 체크리스트\n| 영역 | 항목 | 판정 | 근거 요약 |\n\n### 💡 종합 의견\n의견";

    #[test]
    fn test_full_report_has_all_sections() {
        assert!(missing_report_sections(FULL_REPORT).is_empty());
    }

    #[test]
    fn test_missing_sections_detected() {
        let report = "### 🔎 분석 요약\n종합 의견은 다음과 같다";
        assert_eq!(
            missing_report_sections(report),
            vec!["핵심 발견 사항", "위협평가 체크리스트", "종합 의견"]
        );
    }

    #[tokio::test]
    async fn test_reporter_sends_serialized_findings() {
        let gateway = ScriptedGateway::new(|_, _| Ok(FULL_REPORT.to_string()));
        let findings = vec![Finding {
            category: FindingCategory::Contradiction,
            description: "귀가 시각 진술이 엇갈림".to_string(),
            references: vec!["A7".to_string(), "A15".to_string()],
            confidence: Confidence::High,
            window_index: 0,
        }];

        let report = execute_reporter(&gateway, &findings).await.unwrap();

        assert_eq!(report, FULL_REPORT);
        let prompt = &gateway.calls_for(StageRole::Reporter)[0];
        assert!(prompt.contains("귀가 시각 진술이 엇갈림"));
        assert!(prompt.contains("\"contradiction\""));
    }
}

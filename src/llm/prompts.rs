use crate::models::{AnalystDraft, Finding};

/// System prompt for the Analyst stage
pub const ANALYST_SYSTEM_PROMPT: &str = r#"You are an experienced criminal profiler reviewing an interrogation transcript.

Read the transcript excerpt and extract findings in four categories:

1. admissions: statements in which the subject acknowledges involvement in the alleged offence.
2. contradictions: statements that conflict with each other or are internally inconsistent.
3. alibis: claims about the subject's whereabouts or actions that could be checked.
4. suspicious_indicators: evasive answers, abrupt topic changes, emotional inconsistency or deceptive wording.

RULES:
- Every finding MUST cite the turn labels it is based on, e.g. "Q12", "A15".
- Only use what is explicitly stated in the excerpt. Do not infer or invent.
- Use an empty array for a category with no findings.

Respond ONLY with a JSON object of this shape:
{
  "admissions": [{"finding": "...", "references": ["Q3", "A4"]}],
  "contradictions": [{"finding": "...", "references": ["A7", "A15"]}],
  "alibis": [{"finding": "...", "references": ["A10"]}],
  "suspicious_indicators": [{"finding": "...", "references": ["A22"]}]
}"#;

/// System prompt for the Critic stage
pub const CRITIC_SYSTEM_PROMPT: &str = r#"You are a strict fact-checker for criminal investigation analysis.

You receive draft findings (JSON) and the transcript excerpt they were drawn from.

For every draft finding:
- Check that each cited turn label exists in the excerpt.
- Check that the excerpt actually says what the finding claims.
- If either check fails, reject the finding and give a short reason.
- Otherwise keep it, translate the description into natural Korean, keep its references and rate your confidence as "high" or "medium".

When in doubt, reject.

Respond ONLY with a JSON object of this shape:
{
  "verified_findings": [
    {"category": "admissions|contradictions|alibis|suspicious_indicators", "finding_ko": "...", "references": ["Q3", "A4"], "confidence": "high|medium"}
  ],
  "rejected_findings": [
    {"original_finding": "...", "reason": "..."}
  ]
}"#;

/// System prompt for the Reporter stage
pub const REPORTER_SYSTEM_PROMPT: &str = r#"You are a senior investigation report writer.

Compile the verified findings into a short Korean Markdown report. Merge findings that say the same thing; never repeat a point. Every statement must carry its evidence as (근거: Q##/A##).

Use exactly these sections:

### 🔎 분석 요약
One paragraph: overview, number of findings, overall risk level (높음/중간/낮음).

### 🚨 핵심 발견 사항
A numbered list, one or two sentences per item, ordered [혐의], [모순], [알리바이], [주의]. Omit empty categories.

### 📋 위협평가 체크리스트
One table with columns | 영역 | 항목 | 판정 | 근거 요약 | and these ten rows, judged ✅/❌/❓:
실행 가능성: 계획 구체성, 무기 준비
반복 우려: 폭력 전력, 대인 갈등, 자살 행동, 음주/약물
원한/동일시: 동일시/모방, 지향적 분노
정신건강: 정신건강 증상, 기이한 설명

### 💡 종합 의견
Two or three sentences: overall risk assessment and recommended next steps."#;

/// Headings the Reporter is asked to produce, in order
pub const REPORT_SECTIONS: [&str; 4] = [
    "분석 요약",
    "핵심 발견 사항",
    "위협평가 체크리스트",
    "종합 의견",
];

/// Build the Analyst user prompt for one window
pub fn build_analyst_prompt(window_text: &str) -> String {
    format!(
        "Analyze the following interrogation transcript excerpt:\n\n---\n{}\n---\n\nExtract all findings in the required JSON format.",
        window_text
    )
}

/// Build the Critic user prompt from the Analyst draft and the same window text
pub fn build_critic_prompt(draft: &AnalystDraft, window_text: &str) -> String {
    let draft_json = serde_json::to_string_pretty(draft).unwrap_or_else(|_| "{}".to_string());
    format!(
        "## Draft Findings\n```json\n{}\n```\n\n## Source Excerpt\n---\n{}\n---\n\nVerify each finding against the source excerpt and answer in JSON.",
        draft_json, window_text
    )
}

/// Build the Reporter user prompt from every verified finding of the run
pub fn build_reporter_prompt(findings: &[Finding]) -> String {
    let findings_json =
        serde_json::to_string_pretty(findings).unwrap_or_else(|_| "[]".to_string());
    format!(
        "검증 완료된 분석 결과:\n{}\n\n위 결과로 간결한 최종 보고서를 작성하세요. 중복 없이 핵심만 정리합니다.",
        findings_json
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, DraftFinding, FindingCategory};

    #[test]
    fn test_critic_prompt_contains_draft_and_source() {
        let draft = AnalystDraft {
            alibis: vec![DraftFinding {
                finding: "Claims to have been home".to_string(),
                references: vec!["A2".to_string()],
            }],
            ..Default::default()
        };
        let prompt = build_critic_prompt(&draft, "[Q1] 수사관: 어디 있었습니까?\n[A2] 피의자: 집에 있었습니다.");

        assert!(prompt.contains("\"alibis\""));
        assert!(prompt.contains("Claims to have been home"));
        assert!(prompt.contains("[A2] 피의자: 집에 있었습니다."));
    }

    #[test]
    fn test_reporter_prompt_keeps_korean_text() {
        let findings = vec![Finding {
            category: FindingCategory::Admission,
            description: "현장에 있었음을 인정함".to_string(),
            references: vec!["A4".to_string()],
            confidence: Confidence::High,
            window_index: 0,
        }];
        let prompt = build_reporter_prompt(&findings);

        assert!(prompt.contains("현장에 있었음을 인정함"));
        assert!(prompt.contains("\"A4\""));
    }

    #[test]
    fn test_reporter_prompt_names_every_section() {
        for section in REPORT_SECTIONS {
            assert!(REPORTER_SYSTEM_PROMPT.contains(section), "{}", section);
        }
    }
}

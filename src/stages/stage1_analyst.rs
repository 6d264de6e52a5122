use tracing::debug;

use crate::llm::{
    build_analyst_prompt, decode_analyst, GatewayError, ModelGateway, StageRole,
    ANALYST_SYSTEM_PROMPT,
};
use crate::models::{AnalystDraft, Window};

/// Execute Stage 1: extract draft findings from one window
///
/// Gateway failures (after retries) are returned to the caller; an
/// unparseable response is not an error and yields an empty draft.
pub async fn execute_analyst(
    gateway: &dyn ModelGateway,
    window: &Window,
) -> Result<AnalystDraft, GatewayError> {
    let prompt = build_analyst_prompt(&window.text);
    let response = gateway
        .invoke(StageRole::Analyst, ANALYST_SYSTEM_PROMPT, &prompt)
        .await?;

    let draft = decode_analyst(&response);
    debug!(
        "Window {}: {} admissions, {} contradictions, {} alibis, {} indicators",
        window.index,
        draft.admissions.len(),
        draft.contradictions.len(),
        draft.alibis.len(),
        draft.suspicious_indicators.len()
    );
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{exhausted, ScriptedGateway};

    fn window() -> Window {
        Window {
            index: 0,
            first_turn: 1,
            last_turn: 2,
            text: "[Q1] 수사관: 그날 어디 있었습니까?\n[A2] 피의자: 집에 있었습니다.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_analyst_decodes_fenced_response() {
        let gateway = ScriptedGateway::new(|_, _| {
            Ok("```json\n{\"alibis\": [{\"finding\": \"Home all day\", \"references\": [\"A2\"]}]}\n```".to_string())
        });

        let draft = execute_analyst(&gateway, &window()).await.unwrap();

        assert_eq!(draft.finding_count(), 1);
        assert_eq!(draft.alibis[0].references, vec!["A2"]);
        let prompts = gateway.calls_for(StageRole::Analyst);
        assert!(prompts[0].contains("[A2] 피의자: 집에 있었습니다."));
    }

    #[tokio::test]
    async fn test_analyst_garbage_is_empty_draft() {
        let gateway = ScriptedGateway::new(|_, _| Ok("no json here".to_string()));
        let draft = execute_analyst(&gateway, &window()).await.unwrap();
        assert!(draft.is_empty());
    }

    #[tokio::test]
    async fn test_analyst_propagates_gateway_failure() {
        let gateway = ScriptedGateway::new(|_, _| Err(exhausted()));
        assert!(execute_analyst(&gateway, &window()).await.is_err());
    }
}

use tracing::debug;

use crate::llm::{
    build_critic_prompt, decode_critic, GatewayError, ModelGateway, StageRole,
    CRITIC_SYSTEM_PROMPT,
};
use crate::models::{AnalystDraft, Finding, RejectedFinding, Window};

/// Result of Stage 2 for one window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriticOutcome {
    /// Findings the Critic confirmed, in the Critic's order
    pub verified: Vec<Finding>,
    /// Findings the Critic dropped, with reasons
    pub rejected: Vec<RejectedFinding>,
}

/// Execute Stage 2: verify a window's draft findings against the window text
pub async fn execute_critic(
    gateway: &dyn ModelGateway,
    window: &Window,
    draft: &AnalystDraft,
) -> Result<CriticOutcome, GatewayError> {
    let prompt = build_critic_prompt(draft, &window.text);
    let response = gateway
        .invoke(StageRole::Critic, CRITIC_SYSTEM_PROMPT, &prompt)
        .await?;

    let verdict = decode_critic(&response);

    for rejected in &verdict.rejected_findings {
        debug!(
            "Window {}: rejected \"{}\" ({})",
            window.index, rejected.original_finding, rejected.reason
        );
    }

    Ok(CriticOutcome {
        verified: verdict
            .verified_findings
            .into_iter()
            .map(|v| Finding::from_verified(v, window.index))
            .collect(),
        rejected: verdict
            .rejected_findings
            .into_iter()
            .map(|r| RejectedFinding::from_rejected(r, window.index))
            .collect(),
    })
}

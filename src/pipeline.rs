use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm::{GatewayError, ModelGateway};
use crate::models::{Finding, RejectedFinding, TurnRecord, Window, WindowConfig};
use crate::stages::{create_chunks, execute_analyst, execute_critic, execute_reporter, CriticOutcome};

/// Configuration for one end-to-end run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Window size and overlap
    pub window: WindowConfig,
    /// Windows whose Analyst+Critic round-trips may be in flight at once
    pub max_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            max_concurrency: 1,
        }
    }
}

/// Shared flag that stops a run from starting further windows
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything accumulated over one run
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    pub run_id: Uuid,
    /// Windows produced by chunking
    pub windows_total: usize,
    /// Windows merged into this state, failed ones included
    pub windows_processed: usize,
    /// Windows skipped because a stage call failed
    pub windows_failed: usize,
    /// Verified findings in window order, then Critic order
    pub verified_findings: Vec<Finding>,
    /// Rejected findings, kept for audit only
    pub rejected_findings: Vec<RejectedFinding>,
    /// One line per processed window
    pub per_chunk_log: Vec<String>,
}

impl RunState {
    fn new(windows_total: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            windows_total,
            windows_processed: 0,
            windows_failed: 0,
            verified_findings: Vec::new(),
            rejected_findings: Vec::new(),
            per_chunk_log: Vec::new(),
        }
    }

    /// Total findings dropped by the Critic
    pub fn rejected_count(&self) -> usize {
        self.rejected_findings.len()
    }
}

/// How a run ended when no run-fatal error occurred
#[derive(Debug)]
pub enum RunOutcome {
    /// Chunking produced no windows; no model call was made
    EmptyInput,
    /// Every window was attempted but nothing survived verification
    NoFindings(RunState),
    /// The run was cancelled; the state covers a prefix of the windows
    Cancelled(RunState),
    /// Final report compiled from the verified findings
    Report { report: String, state: RunState },
}

impl RunOutcome {
    pub fn state(&self) -> Option<&RunState> {
        match self {
            RunOutcome::EmptyInput => None,
            RunOutcome::NoFindings(state) | RunOutcome::Cancelled(state) => Some(state),
            RunOutcome::Report { state, .. } => Some(state),
        }
    }

    pub fn report(&self) -> Option<&str> {
        match self {
            RunOutcome::Report { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Run-fatal failures
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The single Reporter call failed; the accumulated state is kept for diagnostics
    #[error("reporter stage failed: {source}")]
    Reporter {
        source: GatewayError,
        state: Box<RunState>,
    },
}

enum WindowOutcome {
    Completed {
        draft_count: usize,
        critic: CriticOutcome,
    },
    AnalystFailed(GatewayError),
    CriticFailed {
        draft_count: usize,
        error: GatewayError,
    },
    Cancelled,
}

/// Run Analyst -> Critic over every window of `turns`, then the Reporter once
///
/// A window whose Analyst or Critic call fails is logged and skipped; the
/// run carries on with the next window. Only a Reporter failure aborts the
/// run.
pub async fn run_pipeline(
    gateway: &dyn ModelGateway,
    turns: &[TurnRecord],
    config: &PipelineConfig,
    cancel: &CancelFlag,
) -> Result<RunOutcome, PipelineError> {
    let windows = create_chunks(turns, &config.window);
    if windows.is_empty() {
        warn!("No turns to analyze");
        return Ok(RunOutcome::EmptyInput);
    }

    let total = windows.len();
    let concurrency = config.max_concurrency.max(1);
    info!(
        "Processing {} turns in {} windows (size {}, overlap {}, concurrency {})",
        turns.len(),
        total,
        config.window.size,
        config.window.overlap,
        concurrency
    );

    let mut outcomes: Vec<(usize, WindowOutcome)> = stream::iter(windows.iter().map(|window| async move {
        (window.index, process_window(gateway, window, total, cancel).await)
    }))
    .buffer_unordered(concurrency)
    .collect()
    .await;
    outcomes.sort_by_key(|(index, _)| *index);

    let mut state = RunState::new(total);
    let mut cancelled = false;

    for (index, outcome) in outcomes {
        if !merge_window(&mut state, &windows[index], total, outcome) {
            cancelled = true;
            break;
        }
    }

    info!(
        "Windows complete: {} verified, {} rejected, {} failed windows",
        state.verified_findings.len(),
        state.rejected_count(),
        state.windows_failed
    );

    if cancelled {
        warn!(
            "Run cancelled after {} of {} windows",
            state.windows_processed, total
        );
        return Ok(RunOutcome::Cancelled(state));
    }

    if state.verified_findings.is_empty() {
        warn!("No findings survived verification; skipping report");
        return Ok(RunOutcome::NoFindings(state));
    }

    match execute_reporter(gateway, &state.verified_findings).await {
        Ok(report) => Ok(RunOutcome::Report { report, state }),
        Err(source) => Err(PipelineError::Reporter {
            source,
            state: Box::new(state),
        }),
    }
}

async fn process_window(
    gateway: &dyn ModelGateway,
    window: &Window,
    total: usize,
    cancel: &CancelFlag,
) -> WindowOutcome {
    if cancel.is_cancelled() {
        return WindowOutcome::Cancelled;
    }

    let label = window.label(total);
    info!(
        "{} analyzing turns {}-{}",
        label, window.first_turn, window.last_turn
    );

    let draft = match execute_analyst(gateway, window).await {
        Ok(draft) => draft,
        Err(e) => {
            warn!("{} analyst failed, skipping window: {}", label, e);
            return WindowOutcome::AnalystFailed(e);
        }
    };

    let draft_count = draft.finding_count();
    info!("{} verifying {} draft findings", label, draft_count);
    match execute_critic(gateway, window, &draft).await {
        Ok(critic) => {
            info!(
                "{} {} verified, {} rejected",
                label,
                critic.verified.len(),
                critic.rejected.len()
            );
            WindowOutcome::Completed {
                draft_count,
                critic,
            }
        }
        Err(error) => {
            warn!("{} critic failed, discarding {} draft findings: {}", label, draft_count, error);
            WindowOutcome::CriticFailed { draft_count, error }
        }
    }
}

/// Fold one window's outcome into the state. Returns false on cancellation.
fn merge_window(state: &mut RunState, window: &Window, total: usize, outcome: WindowOutcome) -> bool {
    let label = window.label(total);

    let line = match outcome {
        WindowOutcome::Cancelled => return false,
        WindowOutcome::AnalystFailed(e) => {
            state.windows_failed += 1;
            format!("{} analyst failed: {}", label, e)
        }
        WindowOutcome::CriticFailed { draft_count, error } => {
            state.windows_failed += 1;
            format!(
                "{} analyst: {} draft findings; critic failed: {}",
                label, draft_count, error
            )
        }
        WindowOutcome::Completed {
            draft_count,
            critic,
        } => {
            let verified = critic.verified.len();
            let rejected = critic.rejected.len();
            state.verified_findings.extend(critic.verified);
            state.rejected_findings.extend(critic.rejected);
            format!(
                "{} analyst: {} draft findings; critic: {} verified / {} rejected",
                label, draft_count, verified, rejected
            )
        }
    };

    state.per_chunk_log.push(line);
    state.windows_processed += 1;
    true
}

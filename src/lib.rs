pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod stages;

#[cfg(test)]
mod test_support;

pub use io::{
    load_turns_file, parse_transcript_file, parse_transcript_text, write_turns_file,
    ReportDocument, RunMetadata, RunRecord,
};
pub use llm::{
    build_gateway, BackendConfig, GatewayError, ModelBackend, ModelGateway, Provider,
    ReasoningLevel, RetryPolicy, RetryingGateway, StageRole,
};
pub use models::{Finding, RejectedFinding, Role, Speaker, TurnRecord, Window, WindowConfig};
pub use pipeline::{run_pipeline, CancelFlag, PipelineConfig, PipelineError, RunOutcome, RunState};
pub use stages::{create_chunks, render_turns};

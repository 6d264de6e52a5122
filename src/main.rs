use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use qa_triage::{
    build_gateway, create_chunks, load_turns_file, parse_transcript_file, run_pipeline,
    write_turns_file, BackendConfig, CancelFlag, PipelineConfig, PipelineError, Provider,
    ReasoningLevel, ReportDocument, RetryPolicy, Role, RunMetadata, RunOutcome, RunRecord,
    RunState, TurnRecord, WindowConfig,
};

#[derive(Parser)]
#[command(name = "qa-triage")]
#[command(author, version, about = "Interrogation transcript triage pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment a plain-text transcript into question/answer turns
    Parse {
        /// Input transcript file (문/답 text)
        #[arg(short, long)]
        input: PathBuf,

        /// Write the turns as JSON for review
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the windows a transcript would be split into
    Chunk {
        #[command(flatten)]
        source: TurnSource,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Run the Analyst -> Critic -> Reporter pipeline and write the report
    Analyze {
        #[command(flatten)]
        source: TurnSource,

        /// Output file for the Markdown report
        #[arg(short, long)]
        output: PathBuf,

        /// Output file for the JSON run record
        #[arg(long)]
        record: Option<PathBuf>,

        /// Model provider (openai, gemini, anthropic)
        #[arg(long, default_value = "openai")]
        provider: Provider,

        /// Model id (defaults to the provider's default model)
        #[arg(long)]
        model: Option<String>,

        /// Reasoning level (minimal, low, medium, high)
        #[arg(long)]
        reasoning: Option<ReasoningLevel>,

        #[command(flatten)]
        window: WindowArgs,

        /// Windows analyzed in parallel
        #[arg(long, default_value = "1")]
        concurrency: usize,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Args)]
struct TurnSource {
    /// Plain-text transcript file
    #[arg(short, long, conflicts_with = "turns", required_unless_present = "turns")]
    input: Option<PathBuf>,

    /// Reviewed turns JSON written by `parse --output`
    #[arg(long)]
    turns: Option<PathBuf>,

    /// Renumber the turns file from 1 after rows were inserted or deleted
    #[arg(long, requires = "turns")]
    renumber: bool,
}

impl TurnSource {
    fn load(&self) -> Result<Vec<TurnRecord>> {
        match (&self.input, &self.turns) {
            (_, Some(path)) => {
                info!("Loading turns from {:?}", path);
                load_turns_file(path, self.renumber).context("Failed to load turns file")
            }
            (Some(path), None) => {
                info!("Loading transcript from {:?}", path);
                parse_transcript_file(path).context("Failed to parse input transcript")
            }
            (None, None) => bail!("either --input or --turns is required"),
        }
    }
}

#[derive(Args)]
struct WindowArgs {
    /// Turns per window
    #[arg(long, default_value = "20")]
    window_size: usize,

    /// Turns shared by consecutive windows
    #[arg(long, default_value = "3")]
    overlap: usize,
}

impl WindowArgs {
    fn config(&self) -> WindowConfig {
        WindowConfig {
            size: self.window_size,
            overlap: self.overlap,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { input, output } => {
            setup_logging(false);
            parse_transcript(input, output)
        }
        Commands::Chunk { source, window } => {
            setup_logging(false);
            show_chunks(&source, &window)
        }
        Commands::Analyze {
            source,
            output,
            record,
            provider,
            model,
            reasoning,
            window,
            concurrency,
            verbose,
        } => {
            setup_logging(verbose);
            let turns = source.load()?;
            let backend = BackendConfig::from_env(provider, model, reasoning)
                .context("Failed to configure model backend")?;
            let config = PipelineConfig {
                window: window.config(),
                max_concurrency: concurrency,
            };
            analyze_transcript(&turns, &backend, &config, output, record).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn parse_transcript(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    info!("Parsing transcript from {:?}", input);
    let turns = parse_transcript_file(&input).context("Failed to parse input transcript")?;

    let questions = turns.iter().filter(|t| t.role == Role::Question).count();
    println!("Transcript Turns");
    println!("================");
    println!("Total turns: {}", turns.len());
    println!("Questions: {}", questions);
    println!("Answers: {}", turns.len() - questions);

    if let Some(path) = output {
        write_turns_file(&turns, &path)?;
        info!("Turns written to {:?}", path);
    }

    Ok(())
}

fn show_chunks(source: &TurnSource, window: &WindowArgs) -> Result<()> {
    let turns = source.load()?;
    let windows = create_chunks(&turns, &window.config());

    println!(
        "{} turns -> {} windows (size {}, overlap {})",
        turns.len(),
        windows.len(),
        window.window_size,
        window.overlap
    );
    for w in &windows {
        println!();
        println!(
            "{} turns {}-{}",
            w.label(windows.len()),
            w.first_turn,
            w.last_turn
        );
        println!("{}", w.text);
    }

    Ok(())
}

async fn analyze_transcript(
    turns: &[TurnRecord],
    backend: &BackendConfig,
    config: &PipelineConfig,
    output: PathBuf,
    record: Option<PathBuf>,
) -> Result<()> {
    info!(
        "Using {} model {}{}",
        backend.provider,
        backend.model_id,
        backend
            .reasoning_level
            .map(|level| format!(" (reasoning {})", level.as_str()))
            .unwrap_or_default()
    );
    let gateway = build_gateway(backend, RetryPolicy::default())?;
    let metadata = RunMetadata::new(backend.provider.name(), &backend.model_id);

    let cancel = CancelFlag::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; no further windows will be started");
            interrupt.cancel();
        }
    });

    match run_pipeline(&gateway, turns, config, &cancel).await {
        Ok(RunOutcome::EmptyInput) => {
            warn!("Transcript contains no turns; nothing to analyze");
            Ok(())
        }
        Ok(RunOutcome::NoFindings(state)) => {
            warn!("No verified findings; no report written");
            write_record(record, &state, &metadata)
        }
        Ok(RunOutcome::Cancelled(state)) => {
            write_record(record, &state, &metadata)?;
            bail!(
                "Run cancelled after {} of {} windows",
                state.windows_processed,
                state.windows_total
            )
        }
        Ok(RunOutcome::Report { report, state }) => {
            ReportDocument::new(&report, &state, &metadata).write_file(&output)?;
            info!("Report written to {:?}", output);
            write_record(record, &state, &metadata)?;
            info!(
                "Complete: {} verified findings, {} rejected, {} failed windows",
                state.verified_findings.len(),
                state.rejected_count(),
                state.windows_failed
            );
            Ok(())
        }
        Err(PipelineError::Reporter { source, state }) => {
            for line in &state.per_chunk_log {
                eprintln!("{}", line);
            }
            write_record(record, &state, &metadata)?;
            Err(source).context("Failed to compile the final report")
        }
    }
}

fn write_record(path: Option<PathBuf>, state: &RunState, metadata: &RunMetadata) -> Result<()> {
    if let Some(path) = path {
        RunRecord::new(state, metadata).write_json(&path)?;
        info!("Run record written to {:?}", path);
    }
    Ok(())
}

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use recitalyzer::cli::{Cli, Command, CompareArgs, EvaluateArgs};
use recitalyzer::practice::PracticeEvaluator;
use recitalyzer::transcription::WhisperTranscriber;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Evaluate(args) => handle_evaluate(&args),
        Command::Compare(args) => handle_compare(&args),
        Command::Ping => print_json(
            &serde_json::json!({ "message": "recitalyzer is ready" }),
            false,
        ),
    }
}

fn handle_evaluate(args: &EvaluateArgs) -> Result<()> {
    args.validate()
        .context("Failed to validate command-line arguments")?;
    let config = args
        .resolve_config()
        .context("Failed to resolve configuration")?;
    info!(
        audio = %args.audio.display(),
        model = %config.whisper_model.display(),
        embedder = ?config.embedder,
        "evaluating recording"
    );

    let transcriber = WhisperTranscriber::new(config.whisper_options())?;
    let orchestrator = config
        .build_orchestrator()
        .context("Failed to set up comparison engine")?;
    let evaluator = PracticeEvaluator::new(Arc::new(transcriber), orchestrator);

    let result = evaluator.evaluate_file(&args.audio, &args.request.to_request())?;
    print_json(&result, args.engine.pretty)
}

fn handle_compare(args: &CompareArgs) -> Result<()> {
    let config = args
        .engine
        .resolve()
        .context("Failed to resolve configuration")?;
    let orchestrator = config
        .build_orchestrator()
        .context("Failed to set up comparison engine")?;
    let request = args.request.to_request();
    let result = orchestrator.compare(
        &args.transcribed,
        request.expected_text.as_deref(),
        request.mode,
    )?;
    print_json(&result, args.engine.pretty)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize result")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}").context("Failed to write result")?;
    Ok(())
}

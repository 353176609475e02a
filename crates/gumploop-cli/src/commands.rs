//! Command handlers for CLI subcommands.

use std::future::Future;

use tracing::{error, info, warn};

use gumploop_agents::AgentConfig;
use gumploop_persistence::StateStore;
use gumploop_pipeline::{
    reset_state, status_report, PhaseReport, PipelineConfig, PipelineOrchestrator,
};

use crate::cli::Commands;

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Execute a CLI command.
///
/// Aborted phases come back as failure reports; only setup problems
/// (no tmux, no async runtime) are errors.
pub fn execute(command: Commands) -> Result<PhaseReport> {
    let store = StateStore::from_env();
    match command {
        Commands::Status => return Ok(status_report(&store)),
        Commands::Reset => return Ok(reset_state(&store)?),
        _ => {}
    }

    let orchestrator =
        PipelineOrchestrator::from_env(PipelineConfig::default(), AgentConfig::default())?;
    let runtime = tokio::runtime::Runtime::new()?;
    Ok(runtime.block_on(supervise(&orchestrator, command)))
}

/// Runs a phase, abandoning it on SIGINT, SIGTERM or SIGHUP.
async fn supervise(orchestrator: &PipelineOrchestrator, command: Commands) -> PhaseReport {
    let signal = match until_interrupted(run(orchestrator, command), shutdown_signal()).await {
        Ok(outcome) => return into_report(outcome),
        Err(signal) => signal,
    };

    warn!(signal, "interrupted, stopping agent sessions");
    if let Err(e) = orchestrator.stop().await {
        error!(error = %e, "failed to stop the pipeline after interrupt");
    }
    PhaseReport::failure(format!(
        "Interrupted by {}. All agent sessions were stopped and the phase was abandoned.",
        signal
    ))
}

/// Races `phase` against `interrupt`.
///
/// On interrupt the phase future is dropped before returning, so the
/// sessions it owns are already torn down.
async fn until_interrupted<P, S, T>(phase: P, interrupt: S) -> std::result::Result<T, &'static str>
where
    P: Future<Output = T>,
    S: Future<Output = &'static str>,
{
    tokio::select! {
        outcome = phase => Ok(outcome),
        signal = interrupt => Err(signal),
    }
}

/// Resolves with the name of the first termination signal received.
#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let wait_for = |kind: SignalKind, name: &'static str| async move {
        match signal(kind) {
            Ok(mut stream) => {
                stream.recv().await;
                name
            }
            Err(e) => {
                warn!(signal = name, error = %e, "failed to install signal handler");
                std::future::pending().await
            }
        }
    };
    tokio::select! {
        name = ctrl_c() => name,
        name = wait_for(SignalKind::terminate(), "SIGTERM") => name,
        name = wait_for(SignalKind::hangup(), "SIGHUP") => name,
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    match tokio::signal::ctrl_c().await {
        Ok(()) => "SIGINT",
        Err(e) => {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending().await
        }
    }
}

fn into_report(outcome: gumploop_pipeline::Result<PhaseReport>) -> PhaseReport {
    match outcome {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "command failed");
            PhaseReport::failure(format!(
                "Phase aborted: {}\nAll agent sessions were stopped. Run status to inspect the artifacts.",
                e
            ))
        }
    }
}

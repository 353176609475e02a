//! Command-line interface definition using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use gumploop_pipeline::ResearchDepth;

/// Version with git hash and build date, e.g. "0.1.0 (abc1234, 2026-10-17)".
fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const BUILD_DATE: &str = env!("BUILD_DATE");

    static VERSION_STRING: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} ({}, {})", VERSION, GIT_HASH, BUILD_DATE))
}

/// gumploop - plan, code, test and debug with a crew of CLI agents
#[derive(Parser, Debug)]
#[command(name = "gumploop")]
#[command(author, version = version_string(), about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Draft a plan and iterate until both reviewers approve it
    Plan {
        /// What to build
        #[arg(required = true)]
        task: String,

        /// Project directory (default: the sandbox)
        #[arg(short, long)]
        work_dir: Option<PathBuf>,

        /// Maximum review rounds
        #[arg(short, long)]
        max_iterations: Option<u32>,
    },

    /// Implement the approved plan until the technical reviewer approves
    Code {
        /// Maximum review rounds
        #[arg(short, long)]
        max_iterations: Option<u32>,
    },

    /// Run the project's test suite
    Test,

    /// Analyze and fix failing tests
    Debug {
        /// Maximum analyze-fix-test rounds
        #[arg(short, long)]
        max_iterations: Option<u32>,
    },

    /// Research a question with all three agents
    Research {
        /// Question to research
        #[arg(required = true)]
        question: String,

        /// Project directory the question is about
        #[arg(short, long, required = true)]
        work_dir: PathBuf,

        /// quick, standard or deep
        #[arg(short, long, default_value = "standard")]
        depth: ResearchDepth,
    },

    /// Explore an existing project with all three agents
    Discover {
        /// Project directory to explore
        #[arg(required = true)]
        work_dir: PathBuf,

        /// Maximum exploration rounds
        #[arg(short, long)]
        max_iterations: Option<u32>,
    },

    /// Show pipeline state and artifacts
    Status,

    /// Kill every agent session and mark the pipeline idle
    Stop,

    /// Forget all progress for the current project
    Reset,
}

impl Cli {
    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

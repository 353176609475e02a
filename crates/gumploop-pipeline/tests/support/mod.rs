//! Scripted agent sessions for driving phase executors without tmux.
//!
//! A fake session reads the footer of each prompt it is sent, asks the
//! script how the agent should react and then behaves like a
//! well-mannered agent: writes the artifact and appends the progress line.

#![allow(dead_code)]

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use gumploop_agents::{AgentError, AgentSession, Result, SessionFactory};
use gumploop_models::{AgentKind, ProgressEvent, SessionId, TokenPair};
use gumploop_persistence::{ProgressLog, StateStore};
use gumploop_pipeline::prompts::OUTPUT_FILE_LABEL;
use gumploop_pipeline::{PipelineConfig, PipelineOrchestrator};

const LOG_LINE_PREFIX: &str = "When you are done, append exactly this line to ";

/// How a scripted agent reacts to one step.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Write this text to the output file (if any) and report the event.
    Write(String),
    /// Report the event without writing anything.
    EventOnly,
    /// Write and report like `Write`, but never acknowledge the reply.
    Unacknowledged(String),
    /// Never report back.
    Hang,
}

/// Pads a verdict so it clears the minimum artifact length.
pub fn artifact(verdict: &str) -> Reply {
    Reply::Write(format!(
        "Reviewed every section against the repository layout and conventions.\n\n{}\n",
        verdict
    ))
}

pub type Script = dyn Fn(AgentKind, &str, u32) -> Reply + Send + Sync;

/// What the fake agents saw and did.
#[derive(Debug, Default)]
pub struct Journal {
    pub created: Vec<String>,
    pub stopped: Vec<String>,
    /// (kind, action, iteration, prompt) per delivered message.
    pub prompts: Vec<(AgentKind, String, u32, String)>,
}

impl Journal {
    pub fn prompts_for(&self, kind: AgentKind, action: &str) -> Vec<(u32, String)> {
        self.prompts
            .iter()
            .filter(|(k, a, _, _)| *k == kind && a == action)
            .map(|(_, _, iteration, prompt)| (*iteration, prompt.clone()))
            .collect()
    }
}

struct Footer {
    output: Option<PathBuf>,
    log: PathBuf,
    event: ProgressEvent,
}

fn parse_footer(prompt: &str) -> Footer {
    let output = prompt
        .lines()
        .find_map(|l| l.strip_prefix(OUTPUT_FILE_LABEL))
        .map(PathBuf::from);
    let log = prompt
        .lines()
        .find_map(|l| l.strip_prefix(LOG_LINE_PREFIX))
        .and_then(|l| l.strip_suffix(':'))
        .map(PathBuf::from)
        .expect("prompt names the progress log");
    let event = prompt
        .lines()
        .last()
        .and_then(ProgressEvent::parse_line)
        .expect("prompt ends with the progress line");
    Footer { output, log, event }
}

pub struct FakeSession {
    id: SessionId,
    kind: AgentKind,
    running: bool,
    acknowledged: bool,
    log: Option<PathBuf>,
    script: Arc<Script>,
    journal: Arc<Mutex<Journal>>,
}

#[async_trait]
impl AgentSession for FakeSession {
    fn id(&self) -> &SessionId {
        &self.id
    }

    fn kind(&self) -> AgentKind {
        self.kind
    }

    async fn start(&mut self) -> Result<()> {
        self.running = true;
        Ok(())
    }

    async fn send_message(&mut self, text: &str) -> Result<TokenPair> {
        if !self.running {
            return Err(AgentError::NotStarted(self.id.to_string()));
        }
        let footer = parse_footer(text);
        self.journal.lock().unwrap().prompts.push((
            self.kind,
            footer.event.action.clone(),
            footer.event.iteration,
            text.to_string(),
        ));

        self.acknowledged = true;
        match (self.script)(self.kind, &footer.event.action, footer.event.iteration) {
            Reply::Write(content) => write_and_report(&footer, &content),
            Reply::Unacknowledged(content) => {
                write_and_report(&footer, &content);
                self.acknowledged = false;
            }
            Reply::EventOnly => append_event(&footer.log, &footer.event),
            Reply::Hang => {}
        }
        self.log = Some(footer.log);
        Ok(TokenPair::generate())
    }

    async fn wait_for_completion(&mut self) -> Result<()> {
        if self.acknowledged {
            return Ok(());
        }
        Err(AgentError::Timeout {
            session: self.id.to_string(),
            waiting_for: "completion".to_string(),
            waited: Duration::from_secs(30 * 60),
        })
    }

    async fn wait_for_progress_event(
        &mut self,
        agent: &str,
        action: &str,
        iteration: u32,
    ) -> Result<()> {
        let seen = self
            .log
            .as_ref()
            .is_some_and(|log| ProgressLog::new(log).contains(agent, action, iteration));
        if seen {
            Ok(())
        } else {
            Err(AgentError::Timeout {
                session: self.id.to_string(),
                waiting_for: format!("progress event {}", action),
                waited: Duration::from_secs(30 * 60),
            })
        }
    }

    async fn stop(&mut self) {
        self.running = false;
        self.journal.lock().unwrap().stopped.push(self.id.to_string());
    }
}

fn write_and_report(footer: &Footer, content: &str) {
    if let Some(path) = &footer.output {
        fs::write(path, content).unwrap();
    }
    append_event(&footer.log, &footer.event);
}

fn append_event(log: &Path, event: &ProgressEvent) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log)
        .unwrap();
    writeln!(file, "{}", event.to_json_line()).unwrap();
}

pub struct FakeFactory {
    script: Arc<Script>,
    journal: Arc<Mutex<Journal>>,
}

impl SessionFactory for FakeFactory {
    fn create(&self, kind: AgentKind, _work_dir: &Path) -> Box<dyn AgentSession> {
        let id = SessionId::new(kind);
        self.journal.lock().unwrap().created.push(id.to_string());
        Box::new(FakeSession {
            id,
            kind,
            running: false,
            acknowledged: true,
            log: None,
            script: Arc::clone(&self.script),
            journal: Arc::clone(&self.journal),
        })
    }
}

/// A temp project plus an orchestrator whose agents follow `script`.
pub struct Harness {
    pub tmp: TempDir,
    pub project: PathBuf,
    pub orchestrator: PipelineOrchestrator,
    pub journal: Arc<Mutex<Journal>>,
}

impl Harness {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(AgentKind, &str, u32) -> Reply + Send + Sync + 'static,
    {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("project");
        fs::create_dir_all(&project).unwrap();
        let project = project.canonicalize().unwrap();

        let journal = Arc::new(Mutex::new(Journal::default()));
        let factory = FakeFactory {
            script: Arc::new(script),
            journal: Arc::clone(&journal),
        };
        let store = StateStore::new(tmp.path().join("global/state.json"));
        let orchestrator =
            PipelineOrchestrator::with_factory(PipelineConfig::default(), store, Arc::new(factory));

        Self {
            tmp,
            project,
            orchestrator,
            journal,
        }
    }

    pub fn store(&self) -> &StateStore {
        self.orchestrator.store()
    }

    /// Saves a project state with the given flags already earned.
    pub fn seed(&self, edit: impl FnOnce(&mut gumploop_models::PipelineState)) {
        let mut state = gumploop_models::PipelineState::for_directory(&self.project);
        edit(&mut state);
        self.store().save(&mut state).unwrap();
    }

    pub fn state(&self) -> gumploop_models::PipelineState {
        self.store().load(Some(self.project.as_path()))
    }

    pub fn artifact(&self, name: &str) -> String {
        fs::read_to_string(self.project.join(".gumploop").join(name)).unwrap_or_default()
    }

    /// Every created session was stopped at least once.
    pub fn all_stopped(&self) -> bool {
        let journal = self.journal.lock().unwrap();
        journal
            .created
            .iter()
            .all(|id| journal.stopped.contains(id))
    }

    pub fn created(&self) -> usize {
        self.journal.lock().unwrap().created.len()
    }
}

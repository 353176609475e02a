//! Screen patterns for the supported agent CLIs.

use std::sync::OnceLock;

use regex::Regex;

use gumploop_core::text::{strip_ansi, tail_lines};
use gumploop_models::AgentKind;

/// A compiled pattern for matching terminal output.
#[derive(Debug)]
pub struct Pattern {
    /// Human-readable name for this pattern.
    pub name: &'static str,
    regex: Regex,
}

impl Pattern {
    /// Creates a new pattern. Panics on an invalid literal regex.
    pub fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("Invalid regex pattern"),
        }
    }

    /// Checks if the pattern matches the given text.
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Returns the first pattern in `patterns` matching `text`.
pub fn first_match<'a>(patterns: &'a [Pattern], text: &str) -> Option<&'a Pattern> {
    patterns.iter().find(|p| p.matches(text))
}

/// Indicators that the CLI finished starting up and accepts input.
pub fn ready_patterns(kind: AgentKind) -> &'static [Pattern] {
    static CLAUDE: OnceLock<Vec<Pattern>> = OnceLock::new();
    static GEMINI: OnceLock<Vec<Pattern>> = OnceLock::new();
    static CODEX: OnceLock<Vec<Pattern>> = OnceLock::new();
    match kind {
        AgentKind::Implementer => CLAUDE.get_or_init(|| {
            vec![
                Pattern::new("shortcuts_hint", r"\? for shortcuts"),
                Pattern::new("bypass_banner", r"(?i)bypass permissions"),
                Pattern::new("welcome", r"Welcome to Claude"),
            ]
        }),
        AgentKind::UxReviewer => GEMINI.get_or_init(|| {
            vec![
                Pattern::new("input_hint", r"(?i)type your message"),
                Pattern::new("yolo_banner", r"(?i)YOLO mode"),
            ]
        }),
        AgentKind::TechReviewer => CODEX.get_or_init(|| {
            vec![
                Pattern::new("banner", r"OpenAI Codex"),
                Pattern::new("get_started", r"(?i)to get started"),
                Pattern::new("shortcuts_hint", r"\? for shortcuts"),
            ]
        }),
    }
}

/// Indicators that the agent is working on a request.
pub fn busy_patterns() -> &'static [Pattern] {
    static PATTERNS: OnceLock<Vec<Pattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Pattern::new("interrupt_hint", r"(?i)esc to interrupt"),
            Pattern::new("working", r"(?i)\bworking\b.*\(\d+s"),
            Pattern::new("thinking", r"(?im)^\W*thinking\b"),
            Pattern::new("spinner", r"[⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏]"),
        ]
    })
}

/// Indicators that the agent is back at its input prompt.
pub fn idle_patterns() -> &'static [Pattern] {
    static PATTERNS: OnceLock<Vec<Pattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Pattern::new("prompt", r"(?m)^\s*[›>▌]\s*$"),
            Pattern::new("shortcuts_hint", r"\? for shortcuts"),
            Pattern::new("send_hint", r"(?i)⏎ send"),
        ]
    })
}

/// Screen state derived from the tail of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Busy,
    Idle,
    Unknown,
}

impl ScreenState {
    /// Classifies the last `tail` non-blank lines of `snapshot`.
    ///
    /// Any busy indicator wins over idle ones.
    pub fn classify(snapshot: &str, tail: usize) -> Self {
        let clean = strip_ansi(snapshot);
        let text = tail_lines(&clean, tail).join("\n");
        if first_match(busy_patterns(), &text).is_some() {
            ScreenState::Busy
        } else if first_match(idle_patterns(), &text).is_some() {
            ScreenState::Idle
        } else {
            ScreenState::Unknown
        }
    }
}

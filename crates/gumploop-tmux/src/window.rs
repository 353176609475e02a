//! Window-manager tree model for placing agent windows.
//!
//! `swaymsg -t get_tree` and `i3-msg -t get_tree` both return a nested
//! JSON tree of outputs, workspaces, containers and windows. It is parsed
//! into [`WindowNode`], folded once to find an empty workspace, and
//! dropped.

use std::fmt;
use std::process::Command;
use std::str::FromStr;

use serde::Deserialize;
use tracing::{debug, warn};

use gumploop_core::config::window_manager_setting;

use crate::{Result, TmuxError};

/// Workspace names that never receive agent windows.
const HIDDEN_WORKSPACES: &[&str] = &["__i3_scratch"];

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(rename = "type", default)]
    node_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    pid: Option<i64>,
    #[serde(default)]
    window: Option<i64>,
    #[serde(default)]
    app_id: Option<String>,
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    floating_nodes: Vec<RawNode>,
}

/// One node of the window-manager tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowNode {
    /// Root, output or split container.
    Container { children: Vec<WindowNode> },
    /// A named workspace.
    Workspace { name: String, children: Vec<WindowNode> },
    /// A client window.
    Window { name: Option<String> },
}

impl From<RawNode> for WindowNode {
    fn from(raw: RawNode) -> Self {
        let is_window = raw.pid.is_some() || raw.window.is_some() || raw.app_id.is_some();
        let children: Vec<WindowNode> = raw
            .nodes
            .into_iter()
            .chain(raw.floating_nodes)
            .map(WindowNode::from)
            .collect();

        if raw.node_type == "workspace" {
            WindowNode::Workspace {
                name: raw.name.unwrap_or_default(),
                children,
            }
        } else if is_window && children.is_empty() {
            WindowNode::Window { name: raw.name }
        } else {
            WindowNode::Container { children }
        }
    }
}

impl WindowNode {
    /// Parses the JSON output of `get_tree`.
    pub fn parse(json: &str) -> Result<Self> {
        let raw: RawNode =
            serde_json::from_str(json).map_err(|e| TmuxError::ParseError(e.to_string()))?;
        Ok(raw.into())
    }

    fn children(&self) -> &[WindowNode] {
        match self {
            WindowNode::Container { children } | WindowNode::Workspace { children, .. } => children,
            WindowNode::Window { .. } => &[],
        }
    }

    /// Pre-order fold over the tree.
    pub fn fold<B>(&self, init: B, f: &mut impl FnMut(B, &WindowNode) -> B) -> B {
        let acc = f(init, self);
        self.children()
            .iter()
            .fold(acc, |acc, child| child.fold(acc, &mut *f))
    }

    /// Number of windows in this subtree.
    pub fn window_count(&self) -> usize {
        self.fold(0, &mut |n: usize, node: &WindowNode| match node {
            WindowNode::Window { .. } => n + 1,
            _ => n,
        })
    }

    /// Names of visible workspaces holding no windows, in tree order.
    pub fn empty_workspaces(&self) -> Vec<String> {
        self.fold(Vec::new(), &mut |mut acc: Vec<String>, node: &WindowNode| {
            if let WindowNode::Workspace { name, .. } = node {
                if node.window_count() == 0 && !HIDDEN_WORKSPACES.contains(&name.as_str()) {
                    acc.push(name.clone());
                }
            }
            acc
        })
    }

    /// Highest numeric workspace name in the tree.
    pub fn max_numbered_workspace(&self) -> u32 {
        self.fold(0, &mut |max: u32, node: &WindowNode| match node {
            WindowNode::Workspace { name, .. } => name.parse::<u32>().map_or(max, |n| max.max(n)),
            _ => max,
        })
    }
}

/// Where agent windows should be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementTarget {
    /// Workspace name to switch to before launching.
    pub workspace: String,
}

impl PlacementTarget {
    /// Picks the first empty workspace, or the next unused number.
    pub fn choose(tree: &WindowNode) -> Self {
        let workspace = tree
            .empty_workspaces()
            .into_iter()
            .next()
            .unwrap_or_else(|| (tree.max_numbered_workspace() + 1).to_string());
        Self { workspace }
    }
}

/// A window manager together with the workspace chosen for agent windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub wm: WindowManager,
    pub target: PlacementTarget,
}

impl Placement {
    /// Detects the configured window manager and picks a target.
    ///
    /// Any failure disables placement.
    pub fn detect() -> Option<Self> {
        let wm = WindowManager::from_env()?;
        match wm.find_placement() {
            Ok(target) => Some(Self { wm, target }),
            Err(e) => {
                warn!(wm = %wm, error = %e, "window placement unavailable");
                None
            }
        }
    }

    /// Focuses the target workspace, logging failures.
    pub fn apply(&self) {
        if let Err(e) = self.wm.focus(&self.target) {
            warn!(workspace = %self.target.workspace, error = %e, "failed to focus workspace");
        }
    }
}

/// Supported tiling window managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowManager {
    Sway,
    I3,
}

impl WindowManager {
    /// Reads `GUMPLOOP_WM`; `None` disables placement.
    pub fn from_env() -> Option<Self> {
        window_manager_setting().and_then(|s| s.parse().ok())
    }

    fn msg_binary(&self) -> &'static str {
        match self {
            WindowManager::Sway => "swaymsg",
            WindowManager::I3 => "i3-msg",
        }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(self.msg_binary()).args(args).output()?;
        if !output.status.success() {
            return Err(TmuxError::WindowManager(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Fetches and parses the current window tree.
    pub fn tree(&self) -> Result<WindowNode> {
        WindowNode::parse(&self.run(&["-t", "get_tree"])?)
    }

    /// Chooses a placement target from the live tree.
    pub fn find_placement(&self) -> Result<PlacementTarget> {
        let target = PlacementTarget::choose(&self.tree()?);
        debug!(wm = %self, workspace = %target.workspace, "chose placement target");
        Ok(target)
    }

    /// Focuses the target workspace so the next window opens there.
    pub fn focus(&self, target: &PlacementTarget) -> Result<()> {
        self.run(&[&format!("workspace {}", target.workspace)])?;
        Ok(())
    }
}

impl fmt::Display for WindowManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowManager::Sway => f.write_str("sway"),
            WindowManager::I3 => f.write_str("i3"),
        }
    }
}

impl FromStr for WindowManager {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sway" => Ok(WindowManager::Sway),
            "i3" => Ok(WindowManager::I3),
            other => Err(format!("unsupported window manager: {}", other)),
        }
    }
}

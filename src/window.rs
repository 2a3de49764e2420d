use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized description of the focused window, identical for every platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowInfo {
    pub title: String,
    pub class: String,
    /// `0` when the platform does not report an owning process.
    pub pid: u32,
    pub workspace: String,
}

impl WindowInfo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = workspace.into();
        self
    }

    /// Both title and class empty means nothing is focused.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.class.is_empty()
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "No active window found!")
        } else {
            write!(f, "🪟 {} ({})", self.title, self.class)
        }
    }
}

use crate::errors::EditorError;
use serde::{Deserialize, Serialize};

/// How a format toggle decides between setting and clearing a mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormatPolicy {
    /// Clear only when every intersected run already has the mark
    #[default]
    Unanimous,
    /// Follow the state of the first intersected run
    FirstNode,
}

/// Editor session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum undo levels (0 = unlimited)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default)]
    pub format_policy: FormatPolicy,

    /// Applying inline code strips every other mark, and vice versa
    #[serde(default)]
    pub code_excludes_marks: bool,

    /// Seeds node keys for the session
    #[serde(default = "default_document_name")]
    pub document_name: String,
}

fn default_history_limit() -> usize {
    100
}

fn default_document_name() -> String {
    "untitled".to_string()
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            format_policy: FormatPolicy::default(),
            code_excludes_marks: false,
            document_name: default_document_name(),
        }
    }
}

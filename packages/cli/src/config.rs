use folio_editor::EditorConfig;
use folio_markup::MarkupOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Folio configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Editor session settings
    #[serde(default)]
    pub editor: EditorConfig,

    /// Markup output settings
    #[serde(default)]
    pub markup: MarkupSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkupSettings {
    /// One block per line
    #[serde(default)]
    pub pretty: bool,

    #[serde(default = "default_indent")]
    pub indent: String,
}

fn default_indent() -> String {
    "  ".to_string()
}

impl Default for MarkupSettings {
    fn default() -> Self {
        Self {
            pretty: false,
            indent: default_indent(),
        }
    }
}

impl MarkupSettings {
    /// Writer options, with `pretty` forced on when requested from the command line
    pub fn options(&self, pretty: bool) -> MarkupOptions {
        MarkupOptions {
            pretty: self.pretty || pretty,
            indent: self.indent.clone(),
        }
    }
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_editor::FormatPolicy;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "editor": { "historyLimit": 10, "formatPolicy": "firstNode", "documentName": "notes" },
            "markup": { "pretty": true, "indent": "\t" }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.editor.history_limit, 10);
        assert_eq!(config.editor.format_policy, FormatPolicy::FirstNode);
        assert_eq!(config.editor.document_name, "notes");
        assert!(!config.editor.code_excludes_marks);
        assert!(config.markup.pretty);
        assert_eq!(config.markup.indent, "\t");
    }

    #[test]
    fn test_default_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.editor, EditorConfig::default());
        assert_eq!(config.markup, MarkupSettings::default());
        assert!(config.markup.options(true).pretty);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = std::env::temp_dir().join("folio-config-missing");
        let config = Config::load(&dir.display().to_string()).unwrap();
        assert_eq!(config.editor.history_limit, 100);
    }
}

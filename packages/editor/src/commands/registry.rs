//! Named command lookup

use super::{
    callout_command, clear_formatting_command, details_command, format_command, heading_command,
    image_command, link_command, paragraph_command, quote_command, redo_command, source_command,
    undo_command, Command, CommandOutcome, EditorContext,
};
use crate::errors::EditorError;
use crate::modal::ModalHost;
use crate::selection::Selection;
use folio_document::{CalloutCategory, HeadingLevel, Snapshot, TextFormat};
use tracing::debug;

/// Commands in toolbar order, addressed by name
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard toolbar set
    pub fn default_registry() -> Self {
        let mut registry = Self::new();
        for command in [
            undo_command(),
            redo_command(),
            heading_command(HeadingLevel::H2, "Large Header"),
            heading_command(HeadingLevel::H3, "Medium Header"),
            heading_command(HeadingLevel::H4, "Small Header"),
            heading_command(HeadingLevel::H5, "Tiny Header"),
            quote_command("Blockquote"),
            paragraph_command("Paragraph"),
            callout_command(CalloutCategory::Info, "Info Callout"),
            callout_command(CalloutCategory::Danger, "Danger Callout"),
            callout_command(CalloutCategory::Warning, "Warning Callout"),
            callout_command(CalloutCategory::Success, "Success Callout"),
            format_command(TextFormat::BOLD, "Bold"),
            format_command(TextFormat::ITALIC, "Italic"),
            format_command(TextFormat::UNDERLINE, "Underline"),
            format_command(TextFormat::STRIKETHROUGH, "Strikethrough"),
            format_command(TextFormat::SUPERSCRIPT, "Superscript"),
            format_command(TextFormat::SUBSCRIPT, "Subscript"),
            format_command(TextFormat::CODE, "Inline Code"),
            clear_formatting_command(),
            link_command(),
            image_command(),
            details_command(),
            source_command(),
        ] {
            registry.register(command);
        }
        registry
    }

    /// Add a command, replacing (and returning) any command of the same name
    pub fn register(&mut self, command: Command) -> Option<Command> {
        match self.commands.iter_mut().find(|existing| existing.name == command.name) {
            Some(existing) => Some(std::mem::replace(existing, command)),
            None => {
                self.commands.push(command);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|command| command.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|command| command.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn is_active(
        &self,
        name: &str,
        snapshot: &Snapshot,
        selection: &Selection,
    ) -> Result<bool, EditorError> {
        let command = self
            .get(name)
            .ok_or_else(|| EditorError::UnknownCommand(name.to_string()))?;
        Ok(command.is_active(snapshot, selection))
    }

    /// Look up `name` and apply it
    pub async fn dispatch<H: ModalHost>(
        &self,
        name: &str,
        ctx: &mut EditorContext<'_, H>,
    ) -> Result<CommandOutcome, EditorError> {
        let command = self
            .get(name)
            .ok_or_else(|| EditorError::UnknownCommand(name.to_string()))?;
        let outcome = command.apply(ctx).await?;
        debug!(command = name, ?outcome, "command finished");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::modal::NoModals;
    use crate::session::EditorSession;

    #[test]
    fn test_default_registry_contents() {
        let registry = CommandRegistry::default_registry();
        assert_eq!(registry.len(), 24);
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(&names[..4], &["undo", "redo", "h2", "h3"]);
        assert!(names.contains(&"callout-success"));
        assert!(names.contains(&"clear-formatting"));
        assert_eq!(registry.get("code").unwrap().label, "Inline Code");
        assert_eq!(registry.get("h2").unwrap().label, "Large Header");
        assert!(registry.get("highlight").is_none());
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut registry = CommandRegistry::default_registry();
        let previous = registry.register(heading_command(HeadingLevel::H2, "Title"));
        assert_eq!(previous.unwrap().label, "Large Header");
        assert_eq!(registry.len(), 24);
        assert_eq!(registry.get("h2").unwrap().label, "Title");

        assert!(registry
            .register(heading_command(HeadingLevel::H1, "Huge Header"))
            .is_none());
        assert_eq!(registry.len(), 25);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_command() {
        let registry = CommandRegistry::default_registry();
        let mut session = EditorSession::new(EditorConfig::default());
        let mut modals = NoModals;

        let result = registry
            .dispatch("highlight", &mut EditorContext::new(&mut session, &mut modals))
            .await;
        assert!(matches!(result, Err(EditorError::UnknownCommand(name)) if name == "highlight"));
        assert!(registry
            .is_active("highlight", session.snapshot(), session.selection())
            .is_err());
    }
}

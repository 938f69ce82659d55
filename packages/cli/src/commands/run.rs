//! Scripted editing sessions.
//!
//! A script is a JSON list of steps run against one document:
//!
//! ```json
//! [
//!   { "op": "select", "anchor": { "path": [0, 0], "offset": 0 }, "focus": { "path": [1, 0], "offset": 1 } },
//!   { "op": "command", "name": "h2" },
//!   { "op": "command", "name": "link", "respond": { "kind": "link", "url": "https://example.com" } },
//!   { "op": "undo" }
//! ]
//! ```

use crate::config::Config;
use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use colored::Colorize;
use folio_document::NodeKey;
use folio_editor::{
    CommandOutcome, CommandRegistry, EditorContext, EditorSession, ModalForm, ModalOutcome, Point,
    ScriptedModals, Selection,
};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Markup file to edit
    pub path: String,

    /// JSON script of editing steps
    #[arg(short, long)]
    pub script: String,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub out: Option<String>,

    /// One block per line
    #[arg(long)]
    pub pretty: bool,
}

/// A point addressed by child-index path from the root
#[derive(Debug, Clone, Deserialize)]
pub struct PathPoint {
    pub path: Vec<usize>,
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    /// Range selection; a missing focus makes a caret
    Select {
        anchor: PathPoint,
        #[serde(default)]
        focus: Option<PathPoint>,
    },
    SelectNodes {
        paths: Vec<Vec<usize>>,
    },
    ClearSelection,
    /// Dispatch a registry command, answering its modal with `respond`,
    /// or cancelling it when `cancel` is set
    Command {
        name: String,
        #[serde(default)]
        respond: Option<ModalForm>,
        #[serde(default)]
        cancel: bool,
    },
    Undo,
    Redo,
}

pub async fn run(args: RunArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let source_path = PathBuf::from(cwd).join(&args.path);
    let script_path = PathBuf::from(cwd).join(&args.script);

    let source = fs::read_to_string(&source_path)
        .with_context(|| format!("reading {}", source_path.display()))?;
    let script = fs::read_to_string(&script_path)
        .with_context(|| format!("reading {}", script_path.display()))?;
    let steps: Vec<Step> = serde_json::from_str(&script)
        .with_context(|| format!("parsing {}", script_path.display()))?;

    let mut session = EditorSession::from_markup(config.editor.clone(), &source)?;
    info!(session = session.id(), steps = steps.len(), "running script");

    run_steps(&mut session, &steps).await?;

    let markup = session.to_markup_with(&config.markup.options(args.pretty));
    match &args.out {
        Some(out) => {
            let target = PathBuf::from(cwd).join(out);
            fs::write(&target, &markup)?;
            eprintln!("{} {}", "✨ Wrote".green().bold(), target.display());
        }
        None => println!("{}", markup),
    }
    Ok(())
}

pub async fn run_steps(session: &mut EditorSession, steps: &[Step]) -> Result<()> {
    let registry = CommandRegistry::default_registry();
    let mut modals = ScriptedModals::new();

    for (index, step) in steps.iter().enumerate() {
        debug!(step = index, ?step, "running step");
        match step {
            Step::Select { anchor, focus } => {
                let anchor = resolve(session, anchor)?;
                let focus = match focus {
                    Some(focus) => resolve(session, focus)?,
                    None => anchor.clone(),
                };
                session.set_selection(Selection::range(anchor, focus));
            }
            Step::SelectNodes { paths } => {
                let keys = paths
                    .iter()
                    .map(|path| key_at(session, path))
                    .collect::<Result<Vec<_>>>()?;
                session.set_selection(Selection::nodes(keys));
            }
            Step::ClearSelection => session.set_selection(Selection::None),
            Step::Command {
                name,
                respond,
                cancel,
            } => {
                if let Some(form) = respond {
                    modals.respond(ModalOutcome::Submitted(form.clone()));
                } else if *cancel {
                    modals.respond(ModalOutcome::Cancelled);
                }

                let outcome = registry
                    .dispatch(name, &mut EditorContext::new(session, &mut modals))
                    .await?;
                if modals.pending() > 0 {
                    bail!("step {}: command `{}` did not open a modal", index, name);
                }
                report(name, outcome);
            }
            Step::Undo => report("undo", history_outcome(session.undo(), session)),
            Step::Redo => report("redo", history_outcome(session.redo(), session)),
        }
    }
    Ok(())
}

fn history_outcome(moved: bool, session: &EditorSession) -> CommandOutcome {
    if moved {
        CommandOutcome::Applied {
            version: session.snapshot().version(),
        }
    } else {
        CommandOutcome::Unchanged
    }
}

fn report(name: &str, outcome: CommandOutcome) {
    match outcome {
        CommandOutcome::Applied { version } => {
            eprintln!("  {} {} → v{}", "✓".green(), name, version)
        }
        CommandOutcome::Unchanged => eprintln!("  {} {} (no change)", "·".dimmed(), name),
        CommandOutcome::Cancelled => eprintln!("  {} {} (cancelled)", "✗".yellow(), name),
    }
}

fn key_at(session: &EditorSession, path: &[usize]) -> Result<NodeKey> {
    session
        .snapshot()
        .node_at_path(path)
        .map(|node| node.key.clone())
        .ok_or_else(|| anyhow!("no node at path {:?}", path))
}

fn resolve(session: &EditorSession, point: &PathPoint) -> Result<Point> {
    Ok(Point::new(key_at(session, &point.path)?, point.offset))
}

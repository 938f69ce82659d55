use folio_editor::{
    CommandOutcome, CommandRegistry, EditorConfig, EditorContext, EditorError, EditorSession,
    ModalForm, ModalOutcome, ScriptedModals, Selection,
};
use folio_markup::MarkupOptions;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// An editor session driven from JavaScript.
///
/// Modal answers are passed in with the command: `dispatch("link", json)`
/// submits `json` to the link modal, `dispatch("link", null)` cancels it.
#[wasm_bindgen]
pub struct Editor {
    session: EditorSession,
    registry: CommandRegistry,
    modals: ScriptedModals,
}

impl Editor {
    fn open(markup: &str, config_json: Option<&str>) -> Result<Self, EditorError> {
        let config = match config_json {
            Some(json) => EditorConfig::from_json(json)?,
            None => EditorConfig::default(),
        };
        Ok(Self {
            session: EditorSession::from_markup(config, markup)?,
            registry: CommandRegistry::default_registry(),
            modals: ScriptedModals::new(),
        })
    }

    fn run(&mut self, name: &str, response_json: Option<&str>) -> Result<CommandOutcome, EditorError> {
        if let Some(json) = response_json {
            let form: ModalForm = serde_json::from_str(json)?;
            self.modals.respond(ModalOutcome::Submitted(form));
        }
        let mut ctx = EditorContext::new(&mut self.session, &mut self.modals);
        let outcome = futures::executor::block_on(self.registry.dispatch(name, &mut ctx));

        // an answer the command never asked for must not leak into the next modal
        if self.modals.pending() > 0 {
            self.modals = ScriptedModals::new();
        }
        outcome
    }
}

#[wasm_bindgen]
impl Editor {
    #[wasm_bindgen(constructor)]
    pub fn new(markup: &str, config_json: Option<String>) -> Result<Editor, JsValue> {
        Editor::open(markup, config_json.as_deref()).map_err(to_js)
    }

    /// Run a command; resolves to "applied", "unchanged" or "cancelled"
    pub fn dispatch(&mut self, name: &str, response_json: Option<String>) -> Result<String, JsValue> {
        let outcome = self.run(name, response_json.as_deref()).map_err(to_js)?;
        Ok(match outcome {
            CommandOutcome::Applied { .. } => "applied",
            CommandOutcome::Unchanged => "unchanged",
            CommandOutcome::Cancelled => "cancelled",
        }
        .to_string())
    }

    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self, name: &str) -> Result<bool, JsValue> {
        self.registry
            .is_active(name, self.session.snapshot(), self.session.selection())
            .map_err(to_js)
    }

    /// Commands in toolbar order as `[{ name, label }]`
    pub fn commands(&self) -> String {
        let commands: Vec<serde_json::Value> = self
            .registry
            .iter()
            .map(|command| serde_json::json!({ "name": command.name, "label": command.label }))
            .collect();
        serde_json::Value::Array(commands).to_string()
    }

    #[wasm_bindgen(js_name = setSelection)]
    pub fn set_selection(&mut self, json: &str) -> Result<(), JsValue> {
        let selection: Selection = serde_json::from_str(json).map_err(to_js)?;
        self.session.set_selection(selection);
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn selection(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.session.selection()).map_err(to_js)
    }

    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.session.redo()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }

    #[wasm_bindgen(getter)]
    pub fn version(&self) -> f64 {
        self.session.snapshot().version() as f64
    }

    #[wasm_bindgen(js_name = toMarkup)]
    pub fn to_markup(&self, pretty: bool) -> String {
        self.session.to_markup_with(&MarkupOptions {
            pretty,
            ..MarkupOptions::default()
        })
    }

    /// The document tree as JSON node templates
    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.snapshot().to_templates()).map_err(to_js)
    }
}

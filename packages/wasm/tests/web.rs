//! Tests for the exported `Editor` class, run under wasm-bindgen-test

#![cfg(target_arch = "wasm32")]

use folio_wasm::Editor;
use wasm_bindgen_test::*;

#[wasm_bindgen_test]
fn editor_runs_modal_commands() {
    let mut editor = Editor::new("<p>Hello</p>", None).unwrap();

    let outcome = editor
        .dispatch("image", Some(r#"{"kind":"image","src":"/cat.png","alt":"Cat"}"#.to_string()))
        .unwrap();
    assert_eq!(outcome, "applied");
    assert_eq!(editor.version(), 1.0);
    assert_eq!(
        editor.to_markup(false),
        r#"<p>Hello</p><p><img src="/cat.png" alt="Cat"></p>"#
    );

    assert!(editor.undo());
    assert_eq!(editor.to_markup(false), "<p>Hello</p>");
    assert_eq!(editor.dispatch("link", None).unwrap(), "cancelled");
    assert!(!editor.can_undo());
}

#[wasm_bindgen_test]
fn editor_reports_errors_as_js_values() {
    assert!(Editor::new("<p>broken</em></p>", None).is_err());

    let mut editor = Editor::new("<p>Hello</p>", None).unwrap();
    let err = editor.dispatch("highlight", None).unwrap_err();
    assert!(err.as_string().unwrap().contains("highlight"));
    assert!(editor.is_active("highlight").is_err());
    assert!(editor.set_selection("{\"type\":\"range\"}").is_err());
}

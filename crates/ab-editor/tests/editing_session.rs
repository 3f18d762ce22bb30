//! Integration tests: canvas input → editor session → store → generated code.

use ab_core::persist::{self, FileStore};
use ab_core::{CanvasConfig, ComponentKind, Document};
use ab_editor::{CanvasController, Editor, InputEvent, Modifiers, PointerButton, Response, ViewCommand};
use pretty_assertions::assert_eq;
use serde_json::json;

fn key(k: &str, modifiers: Modifiers) -> InputEvent {
    InputEvent::KeyDown {
        key: k.to_string(),
        modifiers,
    }
}

fn click(x: f64, y: f64) -> InputEvent {
    InputEvent::PointerDown {
        x,
        y,
        button: PointerButton::Primary,
    }
}

// ─── Canvas flow ─────────────────────────────────────────────────────────

#[test]
fn drop_select_drag_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let mut ed = Editor::open(FileStore::new(dir.path()), CanvasConfig::default());
    let mut ctl = CanvasController::new();

    let drop = InputEvent::PaletteDrop {
        kind: ComponentKind::Button,
        x: 100.0,
        y: 100.0,
    };
    assert_eq!(ctl.handle(&mut ed, &drop), Response::Document);
    let id = ed.document().components()[0].id;

    // Button occupies (40, 80)–(160, 120).
    assert_eq!(ctl.handle(&mut ed, &click(50.0, 90.0)), Response::Selection);
    assert_eq!(ed.selection().component, Some(id));

    ctl.handle(&mut ed, &InputEvent::PointerMove { x: 150.0, y: 150.0 });
    assert_eq!(ctl.handle(&mut ed, &InputEvent::PointerUp { x: 200.0, y: 200.0 }), Response::Document);
    let moved = ed.document().component(id).unwrap();
    assert_eq!((moved.x, moved.y), (140.0, 180.0));

    assert_eq!(ctl.handle(&mut ed, &key("Delete", Modifiers::NONE)), Response::Document);
    assert!(ed.document().components().is_empty());
    assert_eq!(ed.selection().component, None);

    let reopened = Editor::open(FileStore::new(dir.path()), CanvasConfig::default());
    assert_eq!(reopened.document(), ed.document());
}

#[test]
fn click_without_move_only_selects() {
    let mut ed = Editor::open(persist::MemoryStore::new(), CanvasConfig::default());
    let mut ctl = CanvasController::new();
    let id = ed
        .place_component(&ComponentKind::Button, kurbo::Point::new(100.0, 100.0))
        .unwrap()
        .unwrap();
    let before = ed.document().clone();
    ctl.handle(&mut ed, &click(100.0, 100.0));
    assert_eq!(ctl.handle(&mut ed, &InputEvent::PointerUp { x: 100.0, y: 100.0 }), Response::Ignored);
    assert_eq!(ed.document(), &before);
    assert_eq!(ed.selection().component, Some(id));

    assert_eq!(ctl.handle(&mut ed, &click(900.0, 900.0)), Response::Selection);
    assert_eq!(ed.selection().component, None);
}

#[test]
fn duplicate_shortcut_selects_the_copy() {
    let mut ed = Editor::open(persist::MemoryStore::new(), CanvasConfig::default());
    let mut ctl = CanvasController::new();
    ctl.handle(
        &mut ed,
        &InputEvent::PaletteDrop {
            kind: ComponentKind::Text,
            x: 100.0,
            y: 20.0,
        },
    );
    let original = ed.document().components()[0].clone();
    ed.select_component(Some(original.id));

    assert_eq!(ctl.handle(&mut ed, &key("d", Modifiers::CTRL)), Response::Document);
    let copy_id = ed.selection().component.unwrap();
    assert_ne!(copy_id, original.id);
    let copy = ed.document().component(copy_id).unwrap();
    assert_eq!((copy.x, copy.y), (original.x + 20.0, original.y + 20.0));

    assert_eq!(ctl.handle(&mut ed, &key("Escape", Modifiers::NONE)), Response::Selection);
    assert_eq!(ed.selection().component, None);
    assert_eq!(ctl.handle(&mut ed, &key("Delete", Modifiers::NONE)), Response::Ignored);
}

#[test]
fn locked_canvas_still_selects_but_never_moves() {
    let mut ed = Editor::open(persist::MemoryStore::new(), CanvasConfig::default());
    let mut ctl = CanvasController::new();
    let id = ed
        .place_component(&ComponentKind::Button, kurbo::Point::new(100.0, 100.0))
        .unwrap()
        .unwrap();
    ctl.handle(&mut ed, &InputEvent::View(ViewCommand::ToggleLock));

    ctl.handle(&mut ed, &click(50.0, 90.0));
    assert_eq!(ed.selection().component, Some(id));
    assert!(!ctl.is_dragging());
    ctl.handle(&mut ed, &InputEvent::PointerMove { x: 300.0, y: 300.0 });
    ctl.handle(&mut ed, &InputEvent::PointerUp { x: 300.0, y: 300.0 });
    let c = ed.document().component(id).unwrap();
    assert_eq!((c.x, c.y), (40.0, 80.0));

    let drop = InputEvent::PaletteDrop {
        kind: ComponentKind::Input,
        x: 400.0,
        y: 400.0,
    };
    assert_eq!(ctl.handle(&mut ed, &drop), Response::Ignored);
    assert_eq!(ed.document().components().len(), 1);
}

#[test]
fn zoomed_and_panned_clicks_hit_document_space() {
    let mut ed = Editor::open(persist::MemoryStore::new(), CanvasConfig::default());
    let mut ctl = CanvasController::new();
    let id = ed
        .place_component(&ComponentKind::Button, kurbo::Point::new(100.0, 100.0))
        .unwrap()
        .unwrap();

    // Past the maximum; the clamp lands exactly on 2.0.
    for _ in 0..12 {
        ctl.handle(&mut ed, &key("=", Modifiers::CTRL));
    }
    assert_eq!(ed.canvas().scale(), 2.0);
    ctl.handle(
        &mut ed,
        &InputEvent::PointerDown {
            x: 0.0,
            y: 0.0,
            button: PointerButton::Middle,
        },
    );
    ctl.handle(&mut ed, &InputEvent::PointerMove { x: 10.0, y: 10.0 });
    ctl.handle(&mut ed, &InputEvent::PointerUp { x: 10.0, y: 10.0 });

    // Document (50, 90) → screen (50 * 2 + 10, 90 * 2 + 10).
    ctl.handle(&mut ed, &click(110.0, 190.0));
    assert_eq!(ed.selection().component, Some(id));

    ctl.handle(&mut ed, &key("0", Modifiers::CTRL));
    assert_eq!(ed.canvas().scale(), 1.0);
    assert_eq!(ed.canvas().pan(), kurbo::Vec2::ZERO);
}

// ─── Panels and output ───────────────────────────────────────────────────

#[test]
fn property_panel_edits_reach_generated_code() {
    let mut ed = Editor::open(persist::MemoryStore::new(), CanvasConfig::default());
    let id = ed
        .place_component(&ComponentKind::Button, kurbo::Point::new(100.0, 100.0))
        .unwrap()
        .unwrap();

    let editors = ed.property_editors(id).unwrap();
    let keys: Vec<_> = editors.iter().map(|e| e.entry.key()).collect();
    assert_eq!(keys, vec!["label", "tooltip", "visible", "disabled", "loading", "variant", "size"]);

    ed.edit_property(id, "label", json!("Submit")).unwrap();
    ed.edit_property(id, "disabled", json!("true")).unwrap();
    ed.edit_style(id, "borderRadius", Some(json!("8px"))).unwrap();

    let code = ed.generate().unwrap();
    assert!(code.html.contains(&format!("<button data-component-id=\"{id}\" disabled>Submit</button>")));
    assert!(code.css.contains("    border-radius: 8px;"));

    let export = ed.export_html().unwrap();
    assert_eq!(export.file_name, "Home.html");
    assert!(export.contents.contains("Submit"));
}

#[test]
fn pages_keep_their_own_components() {
    let mut ed = Editor::open(persist::MemoryStore::new(), CanvasConfig::default());
    let home = ed.document().current_page_id;
    ed.place_component(&ComponentKind::Button, kurbo::Point::new(100.0, 100.0))
        .unwrap();

    let copy = ed.duplicate_page(home).unwrap();
    ed.switch_page(copy).unwrap();
    assert_eq!(ed.document().components().len(), 1);
    assert_ne!(
        ed.document().components()[0].id,
        ed.document().page(home).unwrap().components[0].id
    );

    ed.place_component(&ComponentKind::Text, kurbo::Point::new(300.0, 300.0))
        .unwrap();
    ed.switch_page(home).unwrap();
    assert_eq!(ed.document().components().len(), 1);

    let stored = persist::load(ed.store()).unwrap();
    assert_eq!(stored.page(copy).unwrap().components.len(), 2);
    assert_eq!(stored.page(copy).unwrap().name, "Home Copy");
}

#[test]
fn import_replaces_session_document() {
    let mut source = Editor::open(persist::MemoryStore::new(), CanvasConfig::default());
    source
        .place_component(&ComponentKind::Chart, kurbo::Point::new(300.0, 300.0))
        .unwrap();
    let export = source.export_project().unwrap();

    let mut ed = Editor::open(persist::MemoryStore::new(), CanvasConfig::default());
    assert_eq!(ed.document(), &Document::new());
    ed.import_project(&export.contents).unwrap();
    assert_eq!(ed.document(), source.document());
    assert_eq!(persist::load(ed.store()).as_ref(), Some(source.document()));
}

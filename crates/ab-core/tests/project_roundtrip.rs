//! Integration tests: stored project → Document → stored project, and
//! Document → generated code.
//!
//! `legacy_project.json` is a record written by an earlier build of the app:
//! integer coordinates, props missing most keys, a kind this build does not
//! know, and keys no struct declares. `hand_edited_project.json` has the
//! damage a person editing the file leaves behind: mistyped props, missing
//! or zero sizes, null coordinates, and a null API response.

use ab_core::codegen::{export_html, generate};
use ab_core::id::{ComponentId, PageId, RecordId};
use ab_core::persist::{self, FileStore, KvStore, MemoryStore, STORAGE_KEY};
use ab_core::props::{ActionType, ComponentKind, ComponentProps};
use ab_core::registry::lookup;
use ab_core::{ComponentPatch, Document, binding};
use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::json;

fn legacy() -> Document {
    persist::decode(include_str!("fixtures/legacy_project.json")).expect("fixture should decode")
}

const HAND_EDITED: &str = include_str!("fixtures/hand_edited_project.json");

// ─── Decoding ────────────────────────────────────────────────────────────

#[test]
fn legacy_record_decodes() {
    let doc = legacy();
    assert_eq!(doc.pages.len(), 2);
    assert_eq!(doc.current_page_id, PageId::intern("page-1"));
    assert_eq!(doc.components().len(), 3);

    let button = doc.component(ComponentId::intern("button-1712345678901")).unwrap();
    let ComponentProps::Button(props) = &button.props else {
        panic!("expected button props, got {:?}", button.props);
    };
    assert_eq!(props.label, "Sign in");
    assert_eq!(props.actions.on_click.action, ActionType::Navigate);
    assert_eq!(props.extra.get("recaptcha").map(|r| r["version"].clone()), Some(json!("v2")));

    let text = doc.component(ComponentId::intern("text-1712345678902")).unwrap();
    assert_eq!(text.props.get("fontSize"), Some(json!("14px")));

    let gauge = doc.component(ComponentId::intern("gauge-1712345678903")).unwrap();
    assert_eq!(gauge.kind, ComponentKind::Other("gauge".into()));
    assert_eq!(gauge.props.get("value"), Some(json!(42)));

    let ds = doc.datasource(RecordId::intern("ds-1")).unwrap();
    assert_eq!(ds.config.port, Some(5432));
    assert_eq!(doc.settings.theme.colors.primary, "#3B82F6");
}

#[test]
fn legacy_record_roundtrips_through_store() {
    let doc = legacy();
    let mut store = MemoryStore::new();
    persist::save(&mut store, &doc).unwrap();
    assert_eq!(persist::load(&store), Some(doc));
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let doc = legacy();
    {
        let mut store = FileStore::new(dir.path());
        persist::save(&mut store, &doc).unwrap();
    }
    let reopened = FileStore::new(dir.path());
    assert!(reopened.get(STORAGE_KEY).unwrap().is_some());
    assert_eq!(persist::load(&reopened), Some(doc));
}

#[test]
fn import_replaces_record_and_export_reimports() {
    let mut store = MemoryStore::new();
    persist::save(&mut store, &Document::new()).unwrap();

    let imported = persist::import_project(&mut store, include_str!("fixtures/legacy_project.json")).unwrap();
    assert_eq!(persist::load(&store), Some(imported.clone()));

    let export = persist::export_project(&imported, Utc::now()).unwrap();
    assert!(export.file_name.starts_with("appsmith-project-"));
    let mut other = MemoryStore::new();
    let again = persist::import_project(&mut other, &export.contents).unwrap();
    assert_eq!(again, imported);
}

// ── Hand-edited records ──

#[test]
fn hand_edited_record_loads_from_store() {
    let mut store = MemoryStore::new();
    store.set(STORAGE_KEY, HAND_EDITED).unwrap();
    let doc = persist::load(&store).expect("a mistyped prop must not discard the project");
    assert_eq!(doc.components().len(), 3);

    let input = doc.component(ComponentId::intern("input-edit-1")).unwrap();
    let ComponentProps::Input(props) = &input.props else {
        panic!("expected input props, got {:?}", input.props);
    };
    assert_eq!(props.label, "Email");
    assert_eq!(props.max_length, 13);
    assert!(props.required);
    assert_eq!(input.props.get("type"), Some(json!("text")));

    let checkbox = doc.component(ComponentId::intern("checkbox-edit-3")).unwrap();
    assert_eq!(checkbox.props.get("checked"), Some(json!(false)));
    assert_eq!(checkbox.props.get("label"), Some(json!("Agree")));
}

#[test]
fn hand_edited_geometry_is_repaired() {
    let doc = persist::decode(HAND_EDITED).unwrap();

    let text = doc.component(ComponentId::intern("text-edit-2")).unwrap();
    assert_eq!((text.x, text.y), (0.0, 5.0));
    assert_eq!(text.size(), lookup(&ComponentKind::Text).unwrap().default_size);

    let checkbox = doc.component(ComponentId::intern("checkbox-edit-3")).unwrap();
    assert_eq!(checkbox.size(), lookup(&ComponentKind::Checkbox).unwrap().default_size);

    let html = generate(&doc, doc.current_page_id).unwrap().html;
    assert!(!html.contains("width: 0px"));
    assert!(!html.contains("NaN"));
}

#[test]
fn hand_edited_record_roundtrips_after_repair() {
    let doc = persist::decode(HAND_EDITED).unwrap();
    assert_eq!(doc.api(RecordId::intern("api-edit")).unwrap().response, Some(serde_json::Value::Null));

    let mut store = MemoryStore::new();
    persist::save(&mut store, &doc).unwrap();
    assert_eq!(persist::load(&store), Some(doc.clone()));

    let imported = persist::import_project(&mut MemoryStore::new(), HAND_EDITED).unwrap();
    assert_eq!(imported, doc);
}

#[test]
fn non_finite_move_does_not_corrupt_the_store() {
    let mut doc = legacy();
    let id = ComponentId::intern("button-1712345678901");
    doc.component_mut(id).unwrap().apply_patch(&ComponentPatch {
        x: Some(f64::NAN),
        y: Some(f64::INFINITY),
        ..ComponentPatch::default()
    });

    let mut store = MemoryStore::new();
    persist::save(&mut store, &doc).unwrap();
    let reloaded = persist::load(&store).expect("record should still load");
    let button = reloaded.component(id).unwrap();
    assert_eq!((button.x, button.y), (40.0, 80.0));
}

// ─── Generation ──────────────────────────────────────────────────────────

#[test]
fn legacy_page_generates_code() {
    let doc = legacy();
    let code = generate(&doc, doc.current_page_id).unwrap();

    assert!(code.html.contains("<title>Home Page</title>"));
    assert!(code.html.contains("<button data-component-id=\"button-1712345678901\">Sign in</button>"));
    assert!(code.html.contains("Unknown component: gauge"));
    assert!(code.html.contains("left: 300px; top: 300px; width: 150px; height: 150px;"));

    assert!(code.css.contains(
        "[data-component-id=\"button-1712345678901\"] {\n    background-color: transparent;\n    border: none;\n    font-size: 16px;\n}"
    ));
    assert!(code.css.contains("    z-index: 2;"));

    assert!(code.javascript.contains("addEventListener('click', () => console.log('clicked'));"));
    assert!(code.javascript.contains("this.state['fetch_users'] = data;"));
    assert!(code.javascript.contains("method: 'GET',"));
}

#[test]
fn generation_ignores_other_pages() {
    let doc = legacy();
    let dashboard = PageId::intern("page-1712345678999");
    let code = generate(&doc, dashboard).unwrap();
    assert!(code.html.contains("<title>Dashboard</title>"));
    assert!(!code.html.contains("data-component-id"));
}

#[test]
fn edits_show_up_in_generated_code() {
    let mut doc = legacy();
    let id = ComponentId::intern("text-1712345678902");
    let edited = binding::apply_property_edit(doc.component(id).unwrap(), "content", json!("Hello")).unwrap();
    *doc.component_mut(id).unwrap() = edited;
    let html = generate(&doc, doc.current_page_id).unwrap().html;
    assert!(html.contains("<div data-component-id=\"text-1712345678902\">Hello</div>"));
}

#[test]
fn single_file_export_matches_generated_parts() {
    let doc = legacy();
    let code = generate(&doc, doc.current_page_id).unwrap();
    let export = export_html(&doc, doc.current_page_id).unwrap();
    assert_eq!(export.file_name, "Home.html");
    assert!(export.contents.contains(&code.css));
    assert!(export.contents.contains(&code.javascript));
}

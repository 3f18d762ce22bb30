//! Subcommand implementations. Each returns what it wrote so `main` can report it.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use ab_core::persist::{self, FileStore};
use ab_core::{CanvasConfig, Document, PageId, RecordId, registry};
use ab_editor::{
    CollaboratorConfig, Editor, HttpTransport, SimulatedExecutor, SimulatedTester, run_api, run_query,
    test_datasource,
};
use anyhow::{Context, Result, anyhow};

/// What `ab run` executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunTarget {
    Api(String),
    Query(String),
    Datasource(String),
}

// ─── Registry ────────────────────────────────────────────────────────────

/// The palette: every kind grouped by category, with its default size.
pub fn components_listing() -> String {
    let mut out = String::new();
    for (category, defs) in registry().by_category() {
        if defs.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{}", category.as_str());
        for def in defs {
            let _ = writeln!(
                out,
                "  {:<16} {:<16} {}x{}",
                def.kind.as_str(),
                def.display_name,
                def.default_size.width,
                def.default_size.height
            );
        }
    }
    out
}

// ─── Code generation ─────────────────────────────────────────────────────

fn read_project(path: &Path) -> Result<Document> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    persist::decode(&contents).with_context(|| format!("parsing project {}", path.display()))
}

fn resolve_page(doc: &Document, page: Option<&str>) -> Result<PageId> {
    let id = page.map_or(doc.current_page_id, PageId::intern);
    doc.page(id).map(|p| p.id).ok_or_else(|| anyhow!("no page `{id}` in project"))
}

fn write_file(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(name);
    fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Write `index.html`, `styles.css` and `script.js` for one page.
pub fn generate(project: &Path, page: Option<&str>, out: &Path) -> Result<Vec<PathBuf>> {
    let doc = read_project(project)?;
    let page_id = resolve_page(&doc, page)?;
    let code = ab_core::generate(&doc, page_id).ok_or_else(|| anyhow!("no page `{page_id}` in project"))?;
    Ok(vec![
        write_file(out, "index.html", &code.html)?,
        write_file(out, "styles.css", &code.css)?,
        write_file(out, "script.js", &code.javascript)?,
    ])
}

/// Write the single-file `<page name>.html` export.
pub fn export_html(project: &Path, page: Option<&str>, out: &Path) -> Result<PathBuf> {
    let doc = read_project(project)?;
    let page_id = resolve_page(&doc, page)?;
    let export = ab_core::export_html(&doc, page_id).ok_or_else(|| anyhow!("no page `{page_id}` in project"))?;
    write_file(out, &export.file_name, &export.contents)
}

// ─── Project store ───────────────────────────────────────────────────────

fn open_store(store: &Path) -> Editor<FileStore> {
    Editor::open(FileStore::new(store), CanvasConfig::default())
}

/// Replace the stored project with `file`. Returns the page count.
pub fn import(store: &Path, file: &Path) -> Result<usize> {
    let contents = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let mut editor = open_store(store);
    editor
        .import_project(&contents)
        .with_context(|| format!("importing {}", file.display()))?;
    Ok(editor.document().pages.len())
}

/// Write the stored project to `appsmith-project-<ms>.json` in `out`.
pub fn export(store: &Path, out: &Path) -> Result<PathBuf> {
    let editor = open_store(store);
    let export = editor.export_project()?;
    write_file(out, &export.file_name, &export.contents)
}

// ─── Collaborator runs ───────────────────────────────────────────────────

/// Run one collaborator against the stored project and print its outcome.
/// Returns whether it succeeded.
pub async fn run(store: &Path, target: &RunTarget) -> Result<bool> {
    let mut editor = open_store(store);
    let config = CollaboratorConfig::default();
    match target {
        RunTarget::Api(id) => {
            let id = RecordId::intern(id);
            if editor.document().api(id).is_none() {
                return Err(anyhow!("no API `{id}` in project"));
            }
            let ok = run_api(&mut editor, &HttpTransport::new(), id, &config).await;
            if let Some(api) = editor.document().api(id) {
                match (&api.response, &api.error) {
                    (_, Some(error)) if !ok => println!("{}: {error}", api.name),
                    (Some(response), _) => println!("{}", serde_json::to_string_pretty(response)?),
                    _ => {}
                }
            }
            Ok(ok)
        }
        RunTarget::Query(id) => {
            let id = RecordId::intern(id);
            if editor.document().query(id).is_none() {
                return Err(anyhow!("no query `{id}` in project"));
            }
            let ok = run_query(&mut editor, &SimulatedExecutor::new(&config), id, &config).await;
            if let Some(query) = editor.document().query(id) {
                for row in query.result.iter().flatten() {
                    println!("{row}");
                }
            }
            Ok(ok)
        }
        RunTarget::Datasource(id) => {
            let id = RecordId::intern(id);
            if editor.document().datasource(id).is_none() {
                return Err(anyhow!("no datasource `{id}` in project"));
            }
            let ok = test_datasource(&mut editor, &SimulatedTester::new(&config), id, &config).await;
            println!("{}", if ok { "connected" } else { "unreachable" });
            Ok(ok)
        }
    }
}

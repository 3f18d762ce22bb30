//! Editor session: the single owner of a [`Document`].
//!
//! Every change to the document goes through [`Editor::apply`] as a
//! [`Mutation`]. A mutation that changes the document is followed by a save of
//! the whole document to the session's store (write-through). A failed save
//! is logged and the in-memory document stays authoritative.
//!
//! Selection and canvas view state live here too but are not persisted.

use crate::error::EditorError;
use ab_core::codegen::{self, GeneratedCode, HtmlExport};
use ab_core::persist::{self, KvStore, ProjectExport};
use ab_core::{
    ApiEndpoint, BoundEditor, CanvasConfig, CanvasState, CodeSlot, ComponentId, ComponentInstance,
    ComponentKind, ComponentPatch, Datasource, Document, Page, PageId, PagePatch, RecordId, SettingsPatch,
    SqlQuery, Theme, binding,
};
use chrono::{DateTime, Utc};
use kurbo::Point;
use serde_json::Value;

// ─── Selection ───────────────────────────────────────────────────────────

/// What the panels currently focus on. At most one of each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub component: Option<ComponentId>,
    pub api: Option<RecordId>,
    pub query: Option<RecordId>,
    pub datasource: Option<RecordId>,
}

// ─── Mutations ───────────────────────────────────────────────────────────

/// A change to the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    // ── Components (current page) ──
    AddComponent {
        component: Box<ComponentInstance>,
    },
    MoveComponent {
        id: ComponentId,
        x: f64,
        y: f64,
    },
    ResizeComponent {
        id: ComponentId,
        width: f64,
        height: f64,
    },
    UpdateComponent {
        id: ComponentId,
        patch: ComponentPatch,
    },
    /// Swap in an edited copy with the same id and kind.
    ReplaceComponent {
        component: Box<ComponentInstance>,
    },
    DeleteComponent {
        id: ComponentId,
    },
    /// Copy under a fresh id, shifted by the canvas duplicate offset.
    DuplicateComponent {
        id: ComponentId,
    },

    // ── Pages ──
    AddPage {
        page: Box<Page>,
    },
    UpdatePage {
        id: PageId,
        patch: PagePatch,
    },
    DeletePage {
        id: PageId,
    },
    DuplicatePage {
        id: PageId,
    },
    SwitchPage {
        id: PageId,
    },

    // ── Collaborator records ──
    AddApi {
        api: Box<ApiEndpoint>,
    },
    /// Replace the record with the same id.
    UpdateApi {
        api: Box<ApiEndpoint>,
    },
    DeleteApi {
        id: RecordId,
    },
    DuplicateApi {
        id: RecordId,
    },
    AddQuery {
        query: Box<SqlQuery>,
    },
    UpdateQuery {
        query: Box<SqlQuery>,
    },
    DeleteQuery {
        id: RecordId,
    },
    DuplicateQuery {
        id: RecordId,
    },
    AddDatasource {
        datasource: Box<Datasource>,
    },
    UpdateDatasource {
        datasource: Box<Datasource>,
    },
    DeleteDatasource {
        id: RecordId,
    },

    // ── Collaborator runs ──
    ApiRunStarted {
        id: RecordId,
    },
    ApiRunFinished {
        id: RecordId,
        result: Result<Value, String>,
    },
    QueryRunStarted {
        id: RecordId,
    },
    QueryRunFinished {
        id: RecordId,
        result: Result<Vec<Value>, String>,
    },
    ConnectionTested {
        id: RecordId,
        connected: bool,
        at: DateTime<Utc>,
    },

    // ── Settings ──
    UpdateSettings {
        patch: SettingsPatch,
    },
    UpdateTheme {
        theme: Box<Theme>,
    },
    /// `None` removes the key.
    SetGlobalState {
        key: String,
        value: Option<Value>,
    },
}

/// What [`Editor::apply`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Target missing, or nothing to change. Nothing was saved.
    Unchanged,
    Changed,
    CreatedComponent(ComponentId),
    CreatedPage(PageId),
    CreatedRecord(RecordId),
}

impl Applied {
    pub fn changed(self) -> bool {
        self != Applied::Unchanged
    }
}

// ─── Editor ──────────────────────────────────────────────────────────────

/// One editing session over a document and the store it persists to.
pub struct Editor<S: KvStore> {
    doc: Document,
    selection: Selection,
    canvas: CanvasState,
    store: S,
    last_saved: Option<DateTime<Utc>>,
}

impl<S: KvStore> Editor<S> {
    /// Load the stored document (or start a fresh one) and clear loading
    /// flags an interrupted session left behind.
    pub fn open(store: S, config: CanvasConfig) -> Self {
        let doc = persist::load_or_default(&store);
        let mut editor = Self::with_document(store, doc, config);
        let reset = editor.doc.reset_stale_loading();
        if reset > 0 {
            log::info!("reset {reset} stale loading flag(s) from a previous session");
            editor.persist();
        }
        editor
    }

    /// Start a session on an explicit document. Nothing is saved until the
    /// first mutation.
    pub fn with_document(store: S, mut doc: Document, config: CanvasConfig) -> Self {
        doc.normalize();
        Self {
            doc,
            selection: Selection::default(),
            canvas: CanvasState::new(config),
            store,
            last_saved: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn canvas(&self) -> &CanvasState {
        &self.canvas
    }

    /// View state (zoom, pan, grid, lock). Not persisted.
    pub fn canvas_mut(&mut self) -> &mut CanvasState {
        &mut self.canvas
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Timestamp of the last successful save in this session.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// The selected component, read from the document so it always mirrors
    /// the latest edit.
    pub fn selected_component(&self) -> Option<&ComponentInstance> {
        self.doc.component(self.selection.component?)
    }

    // ─── Apply ───────────────────────────────────────────────────────────

    /// Apply a mutation and, if it changed anything, save the document.
    pub fn apply(&mut self, mutation: Mutation) -> Applied {
        let applied = self.apply_to_document(mutation);
        if applied.changed() {
            self.persist();
        }
        applied
    }

    /// Save now. Write-through saves already happen after every mutation.
    pub fn save(&mut self) -> Result<DateTime<Utc>, EditorError> {
        let at = persist::save(&mut self.store, &self.doc)?;
        self.last_saved = Some(at);
        Ok(at)
    }

    fn persist(&mut self) {
        if let Err(e) = self.save() {
            log::warn!("write-through save failed: {e}");
        }
    }

    fn apply_to_document(&mut self, mutation: Mutation) -> Applied {
        match mutation {
            Mutation::AddComponent { component } => {
                if self.doc.component(component.id).is_some() {
                    log::warn!("component {} already exists", component.id);
                    return Applied::Unchanged;
                }
                let id = component.id;
                if self.doc.add_component(*component) {
                    Applied::CreatedComponent(id)
                } else {
                    Applied::Unchanged
                }
            }
            Mutation::MoveComponent { id, x, y } => self.patch_component(
                id,
                &ComponentPatch {
                    x: Some(x),
                    y: Some(y),
                    ..ComponentPatch::default()
                },
            ),
            Mutation::ResizeComponent { id, width, height } => self.patch_component(
                id,
                &ComponentPatch {
                    width: Some(width),
                    height: Some(height),
                    ..ComponentPatch::default()
                },
            ),
            Mutation::UpdateComponent { id, patch } => self.patch_component(id, &patch),
            Mutation::ReplaceComponent { component } => {
                let Some(slot) = self.doc.component_mut(component.id) else {
                    return Applied::Unchanged;
                };
                if slot.kind != component.kind {
                    log::warn!(
                        "refusing to change the kind of {} from {} to {}",
                        component.id,
                        slot.kind,
                        component.kind
                    );
                    return Applied::Unchanged;
                }
                *slot = *component;
                Applied::Changed
            }
            Mutation::DeleteComponent { id } => {
                if self.doc.remove_component(id).is_none() {
                    return Applied::Unchanged;
                }
                if self.selection.component == Some(id) {
                    self.selection.component = None;
                }
                Applied::Changed
            }
            Mutation::DuplicateComponent { id } => {
                let offset = self.canvas.config().duplicate_offset;
                self.doc
                    .duplicate_component(id, offset)
                    .map_or(Applied::Unchanged, Applied::CreatedComponent)
            }

            Mutation::AddPage { page } => {
                if self.doc.page(page.id).is_some() {
                    log::warn!("page {} already exists", page.id);
                    return Applied::Unchanged;
                }
                Applied::CreatedPage(self.doc.add_page(*page))
            }
            Mutation::UpdatePage { id, patch } => changed_if(self.doc.update_page(id, patch)),
            Mutation::DeletePage { id } => {
                let was_current = self.doc.current_page_id == id;
                if !self.doc.delete_page(id) {
                    return Applied::Unchanged;
                }
                if was_current {
                    self.selection.component = None;
                }
                Applied::Changed
            }
            Mutation::DuplicatePage { id } => self
                .doc
                .duplicate_page(id)
                .map_or(Applied::Unchanged, Applied::CreatedPage),
            Mutation::SwitchPage { id } => {
                if !self.doc.switch_page(id) {
                    return Applied::Unchanged;
                }
                self.selection.component = None;
                Applied::Changed
            }

            Mutation::AddApi { api } => {
                if self.doc.api(api.id).is_some() {
                    return Applied::Unchanged;
                }
                let id = api.id;
                self.doc.apis.push(*api);
                Applied::CreatedRecord(id)
            }
            Mutation::UpdateApi { api } => match self.doc.api_mut(api.id) {
                Some(slot) => {
                    *slot = *api;
                    Applied::Changed
                }
                None => Applied::Unchanged,
            },
            Mutation::DeleteApi { id } => {
                let before = self.doc.apis.len();
                self.doc.apis.retain(|a| a.id != id);
                if self.doc.apis.len() == before {
                    return Applied::Unchanged;
                }
                if self.selection.api == Some(id) {
                    self.selection.api = None;
                }
                Applied::Changed
            }
            Mutation::DuplicateApi { id } => self
                .doc
                .duplicate_api(id)
                .map_or(Applied::Unchanged, Applied::CreatedRecord),
            Mutation::AddQuery { query } => {
                if self.doc.query(query.id).is_some() {
                    return Applied::Unchanged;
                }
                let id = query.id;
                self.doc.sql_queries.push(*query);
                Applied::CreatedRecord(id)
            }
            Mutation::UpdateQuery { query } => match self.doc.query_mut(query.id) {
                Some(slot) => {
                    *slot = *query;
                    Applied::Changed
                }
                None => Applied::Unchanged,
            },
            Mutation::DeleteQuery { id } => {
                let before = self.doc.sql_queries.len();
                self.doc.sql_queries.retain(|q| q.id != id);
                if self.doc.sql_queries.len() == before {
                    return Applied::Unchanged;
                }
                if self.selection.query == Some(id) {
                    self.selection.query = None;
                }
                Applied::Changed
            }
            Mutation::DuplicateQuery { id } => self
                .doc
                .duplicate_query(id)
                .map_or(Applied::Unchanged, Applied::CreatedRecord),
            Mutation::AddDatasource { datasource } => {
                if self.doc.datasource(datasource.id).is_some() {
                    return Applied::Unchanged;
                }
                let id = datasource.id;
                self.doc.datasources.push(*datasource);
                Applied::CreatedRecord(id)
            }
            Mutation::UpdateDatasource { datasource } => match self.doc.datasource_mut(datasource.id) {
                Some(slot) => {
                    *slot = *datasource;
                    Applied::Changed
                }
                None => Applied::Unchanged,
            },
            Mutation::DeleteDatasource { id } => {
                let before = self.doc.datasources.len();
                self.doc.datasources.retain(|d| d.id != id);
                if self.doc.datasources.len() == before {
                    return Applied::Unchanged;
                }
                if self.selection.datasource == Some(id) {
                    self.selection.datasource = None;
                }
                Applied::Changed
            }

            Mutation::ApiRunStarted { id } => match self.doc.api_mut(id) {
                Some(api) => {
                    api.is_loading = true;
                    api.error = None;
                    Applied::Changed
                }
                None => Applied::Unchanged,
            },
            Mutation::ApiRunFinished { id, result } => match self.doc.api_mut(id) {
                Some(api) => {
                    api.is_loading = false;
                    match result {
                        Ok(response) => api.response = Some(response),
                        Err(error) => api.error = Some(error),
                    }
                    Applied::Changed
                }
                None => Applied::Unchanged,
            },
            Mutation::QueryRunStarted { id } => match self.doc.query_mut(id) {
                Some(query) => {
                    query.is_loading = true;
                    query.error = None;
                    Applied::Changed
                }
                None => Applied::Unchanged,
            },
            Mutation::QueryRunFinished { id, result } => match self.doc.query_mut(id) {
                Some(query) => {
                    query.is_loading = false;
                    match result {
                        Ok(rows) => query.result = Some(rows),
                        Err(error) => query.error = Some(error),
                    }
                    Applied::Changed
                }
                None => Applied::Unchanged,
            },
            Mutation::ConnectionTested { id, connected, at } => match self.doc.datasource_mut(id) {
                Some(ds) => {
                    ds.is_connected = Some(connected);
                    ds.last_tested = Some(at);
                    Applied::Changed
                }
                None => Applied::Unchanged,
            },

            Mutation::UpdateSettings { patch } => {
                self.doc.settings.apply_patch(patch);
                Applied::Changed
            }
            Mutation::UpdateTheme { theme } => {
                self.doc.settings.theme = *theme;
                Applied::Changed
            }
            Mutation::SetGlobalState { key, value } => match value {
                Some(value) => {
                    self.doc.global_state.insert(key, value);
                    Applied::Changed
                }
                None => changed_if(self.doc.global_state.shift_remove(&key).is_some()),
            },
        }
    }

    fn patch_component(&mut self, id: ComponentId, patch: &ComponentPatch) -> Applied {
        match self.doc.component_mut(id) {
            Some(component) => {
                component.apply_patch(patch);
                Applied::Changed
            }
            None => Applied::Unchanged,
        }
    }

    // ─── Components ──────────────────────────────────────────────────────

    /// Drop a new component of `kind` at a screen point. `Ok(None)` while the
    /// canvas is locked.
    pub fn place_component(&mut self, kind: &ComponentKind, screen: Point) -> Result<Option<ComponentId>, EditorError> {
        if self.canvas.locked {
            log::debug!("canvas locked, ignoring drop of {kind}");
            return Ok(None);
        }
        let component = self.canvas.place_new(kind, screen)?;
        match self.apply(Mutation::AddComponent {
            component: Box::new(component),
        }) {
            Applied::CreatedComponent(id) => Ok(Some(id)),
            _ => Ok(None),
        }
    }

    /// Drag an existing component to a screen point. Ignored while locked.
    pub fn drop_component(&mut self, id: ComponentId, screen: Point) -> bool {
        if self.canvas.locked {
            log::debug!("canvas locked, ignoring move of {id}");
            return false;
        }
        let Some(mut moved) = self.doc.component(id).cloned() else {
            return false;
        };
        self.canvas.place_existing(&mut moved, screen);
        self.apply(Mutation::MoveComponent {
            id,
            x: moved.x,
            y: moved.y,
        })
        .changed()
    }

    pub fn move_component(&mut self, id: ComponentId, x: f64, y: f64) -> bool {
        self.apply(Mutation::MoveComponent { id, x, y }).changed()
    }

    pub fn resize_component(&mut self, id: ComponentId, width: f64, height: f64) -> bool {
        self.apply(Mutation::ResizeComponent { id, width, height }).changed()
    }

    pub fn update_component(&mut self, id: ComponentId, patch: ComponentPatch) -> bool {
        self.apply(Mutation::UpdateComponent { id, patch }).changed()
    }

    /// Remove a component from the current page. Unknown ids are a no-op.
    pub fn delete_component(&mut self, id: ComponentId) -> bool {
        self.apply(Mutation::DeleteComponent { id }).changed()
    }

    pub fn duplicate_component(&mut self, id: ComponentId) -> Option<ComponentId> {
        match self.apply(Mutation::DuplicateComponent { id }) {
            Applied::CreatedComponent(new_id) => Some(new_id),
            _ => None,
        }
    }

    /// Select a component on the current page, or clear with `None`.
    /// Returns false when the id is not on the current page.
    pub fn select_component(&mut self, id: Option<ComponentId>) -> bool {
        if let Some(id) = id
            && self.doc.component(id).is_none()
        {
            return false;
        }
        self.selection.component = id;
        true
    }

    // ─── Property binding ────────────────────────────────────────────────

    fn current_component(&self, id: ComponentId) -> Result<&ComponentInstance, EditorError> {
        self.doc.component(id).ok_or(EditorError::ComponentNotFound(id))
    }

    /// Editors for a component's property panel.
    pub fn property_editors(&self, id: ComponentId) -> Result<Vec<BoundEditor>, EditorError> {
        Ok(binding::editors_for(self.current_component(id)?)?)
    }

    pub fn edit_property(&mut self, id: ComponentId, key: &str, value: Value) -> Result<(), EditorError> {
        let next = binding::apply_property_edit(self.current_component(id)?, key, value)?;
        self.apply(Mutation::ReplaceComponent {
            component: Box::new(next),
        });
        Ok(())
    }

    /// Set a style entry, or remove it with `None`.
    pub fn edit_style(&mut self, id: ComponentId, key: &str, value: Option<Value>) -> Result<(), EditorError> {
        let next = binding::apply_style_edit(self.current_component(id)?, key, value);
        self.apply(Mutation::ReplaceComponent {
            component: Box::new(next),
        });
        Ok(())
    }

    pub fn edit_custom_code(&mut self, id: ComponentId, slot: CodeSlot, text: &str) -> Result<(), EditorError> {
        let next = binding::apply_custom_code(self.current_component(id)?, slot, text);
        self.apply(Mutation::ReplaceComponent {
            component: Box::new(next),
        });
        Ok(())
    }

    // ─── Pages ───────────────────────────────────────────────────────────

    pub fn add_page(&mut self, name: &str, route: &str) -> PageId {
        let page = Page::new(PageId::fresh("page"), name, route);
        let id = page.id;
        self.apply(Mutation::AddPage { page: Box::new(page) });
        id
    }

    pub fn update_page(&mut self, id: PageId, patch: PagePatch) -> bool {
        self.apply(Mutation::UpdatePage { id, patch }).changed()
    }

    /// The last remaining page is never deleted.
    pub fn delete_page(&mut self, id: PageId) -> bool {
        self.apply(Mutation::DeletePage { id }).changed()
    }

    pub fn duplicate_page(&mut self, id: PageId) -> Option<PageId> {
        match self.apply(Mutation::DuplicatePage { id }) {
            Applied::CreatedPage(new_id) => Some(new_id),
            _ => None,
        }
    }

    /// Make `id` the current page and clear the component selection.
    pub fn switch_page(&mut self, id: PageId) -> Result<(), EditorError> {
        if self.apply(Mutation::SwitchPage { id }).changed() {
            Ok(())
        } else {
            Err(EditorError::PageNotFound(id))
        }
    }

    // ─── Collaborator records ────────────────────────────────────────────

    pub fn add_api(&mut self, api: ApiEndpoint) -> bool {
        self.apply(Mutation::AddApi { api: Box::new(api) }).changed()
    }

    pub fn update_api(&mut self, api: ApiEndpoint) -> bool {
        self.apply(Mutation::UpdateApi { api: Box::new(api) }).changed()
    }

    pub fn delete_api(&mut self, id: RecordId) -> bool {
        self.apply(Mutation::DeleteApi { id }).changed()
    }

    pub fn duplicate_api(&mut self, id: RecordId) -> Option<RecordId> {
        created_record(self.apply(Mutation::DuplicateApi { id }))
    }

    pub fn select_api(&mut self, id: Option<RecordId>) {
        self.selection.api = id.filter(|id| self.doc.api(*id).is_some());
    }

    pub fn add_query(&mut self, query: SqlQuery) -> bool {
        self.apply(Mutation::AddQuery { query: Box::new(query) }).changed()
    }

    pub fn update_query(&mut self, query: SqlQuery) -> bool {
        self.apply(Mutation::UpdateQuery { query: Box::new(query) }).changed()
    }

    pub fn delete_query(&mut self, id: RecordId) -> bool {
        self.apply(Mutation::DeleteQuery { id }).changed()
    }

    pub fn duplicate_query(&mut self, id: RecordId) -> Option<RecordId> {
        created_record(self.apply(Mutation::DuplicateQuery { id }))
    }

    pub fn select_query(&mut self, id: Option<RecordId>) {
        self.selection.query = id.filter(|id| self.doc.query(*id).is_some());
    }

    pub fn add_datasource(&mut self, datasource: Datasource) -> bool {
        self.apply(Mutation::AddDatasource {
            datasource: Box::new(datasource),
        })
        .changed()
    }

    pub fn update_datasource(&mut self, datasource: Datasource) -> bool {
        self.apply(Mutation::UpdateDatasource {
            datasource: Box::new(datasource),
        })
        .changed()
    }

    pub fn delete_datasource(&mut self, id: RecordId) -> bool {
        self.apply(Mutation::DeleteDatasource { id }).changed()
    }

    pub fn select_datasource(&mut self, id: Option<RecordId>) {
        self.selection.datasource = id.filter(|id| self.doc.datasource(*id).is_some());
    }

    // ─── Collaborator runs ───────────────────────────────────────────────

    /// Mark an API as loading and hand back a snapshot to run.
    pub fn begin_api_run(&mut self, id: RecordId) -> Option<ApiEndpoint> {
        self.apply(Mutation::ApiRunStarted { id })
            .changed()
            .then(|| self.doc.api(id).cloned())
            .flatten()
    }

    pub fn finish_api_run(&mut self, id: RecordId, result: Result<Value, String>) {
        self.apply(Mutation::ApiRunFinished { id, result });
    }

    pub fn begin_query_run(&mut self, id: RecordId) -> Option<SqlQuery> {
        self.apply(Mutation::QueryRunStarted { id })
            .changed()
            .then(|| self.doc.query(id).cloned())
            .flatten()
    }

    pub fn finish_query_run(&mut self, id: RecordId, result: Result<Vec<Value>, String>) {
        self.apply(Mutation::QueryRunFinished { id, result });
    }

    pub fn record_connection_test(&mut self, id: RecordId, connected: bool, at: DateTime<Utc>) {
        self.apply(Mutation::ConnectionTested { id, connected, at });
    }

    // ─── Settings ────────────────────────────────────────────────────────

    pub fn update_settings(&mut self, patch: SettingsPatch) {
        self.apply(Mutation::UpdateSettings { patch });
    }

    pub fn update_theme(&mut self, theme: Theme) {
        self.apply(Mutation::UpdateTheme { theme: Box::new(theme) });
    }

    pub fn set_global_state(&mut self, key: &str, value: Option<Value>) -> bool {
        self.apply(Mutation::SetGlobalState {
            key: key.to_string(),
            value,
        })
        .changed()
    }

    // ─── Output ──────────────────────────────────────────────────────────

    /// Generated code for the current page.
    pub fn generate(&self) -> Option<GeneratedCode> {
        codegen::generate(&self.doc, self.doc.current_page_id)
    }

    /// Single-file export of the current page.
    pub fn export_html(&self) -> Option<HtmlExport> {
        codegen::export_html(&self.doc, self.doc.current_page_id)
    }

    pub fn export_project(&self) -> Result<ProjectExport, EditorError> {
        Ok(persist::export_project(&self.doc, Utc::now())?)
    }

    /// Replace the document with a project file. On a parse failure both the
    /// session and the store are left untouched.
    pub fn import_project(&mut self, contents: &str) -> Result<(), EditorError> {
        let mut doc = persist::import_project(&mut self.store, contents)?;
        let reset = doc.reset_stale_loading();
        self.doc = doc;
        self.selection = Selection::default();
        log::info!("imported project with {} page(s)", self.doc.pages.len());
        if reset > 0 {
            self.persist();
        }
        Ok(())
    }
}

fn changed_if(changed: bool) -> Applied {
    if changed { Applied::Changed } else { Applied::Unchanged }
}

fn created_record(applied: Applied) -> Option<RecordId> {
    match applied {
        Applied::CreatedRecord(id) => Some(id),
        _ => None,
    }
}

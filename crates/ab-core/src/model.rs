//! Core document model for app-builder projects.
//!
//! A [`Document`] owns an ordered list of [`Page`]s, each of which owns its
//! [`ComponentInstance`]s in z-order (later entries paint on top). Exactly one
//! page is current; its component list is the live working set. Collaborator
//! records (API endpoints, SQL queries, datasources) ride along opaquely so
//! they persist with the rest of the project.

use crate::id::{ComponentId, PageId, RecordId};
use crate::props::{ComponentKind, ComponentProps, PropMap};
use chrono::{DateTime, Utc};
use kurbo::{Rect, Size, Vec2};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ─── Component instances ─────────────────────────────────────────────────

/// A placed component. `id` and `kind` never change after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInstance {
    pub id: ComponentId,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub props: ComponentProps,
    pub style: PropMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bindings: Option<PropMap>,
    /// DOM event name → handler expression, wired up by generated script.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<PropMap>,
    #[serde(rename = "customCSS", skip_serializing_if = "Option::is_none")]
    pub custom_css: Option<String>,
    #[serde(rename = "customJS", skip_serializing_if = "Option::is_none")]
    pub custom_js: Option<String>,
    #[serde(rename = "customHTML", skip_serializing_if = "Option::is_none")]
    pub custom_html: Option<String>,
}

/// Wire shape of a component before its props are typed by kind.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawComponent {
    id: ComponentId,
    #[serde(rename = "type")]
    kind: ComponentKind,
    #[serde(default, deserialize_with = "finite_number")]
    x: Option<f64>,
    #[serde(default, deserialize_with = "finite_number")]
    y: Option<f64>,
    #[serde(default, deserialize_with = "finite_number")]
    width: Option<f64>,
    #[serde(default, deserialize_with = "finite_number")]
    height: Option<f64>,
    #[serde(default)]
    props: PropMap,
    #[serde(default)]
    style: PropMap,
    #[serde(default)]
    bindings: Option<PropMap>,
    #[serde(default)]
    events: Option<PropMap>,
    #[serde(default, rename = "customCSS")]
    custom_css: Option<String>,
    #[serde(default, rename = "customJS")]
    custom_js: Option<String>,
    #[serde(default, rename = "customHTML")]
    custom_html: Option<String>,
}

impl<'de> Deserialize<'de> for ComponentInstance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawComponent::deserialize(deserializer)?;
        let default_size = crate::registry::registry()
            .lookup(&raw.kind)
            .map_or(Size::new(MIN_EXTENT, MIN_EXTENT), |def| def.default_size);
        let extent = |stored: Option<f64>, fallback: f64| stored.filter(|v| *v > 0.0).unwrap_or(fallback);
        let props = ComponentProps::from_stored(&raw.kind, raw.props);
        Ok(Self {
            width: extent(raw.width, default_size.width),
            height: extent(raw.height, default_size.height),
            id: raw.id,
            kind: raw.kind,
            x: raw.x.unwrap_or(0.0),
            y: raw.y.unwrap_or(0.0),
            props,
            style: raw.style,
            bindings: raw.bindings,
            events: raw.events,
            custom_css: raw.custom_css,
            custom_js: raw.custom_js,
            custom_html: raw.custom_html,
        })
    }
}

impl ComponentInstance {
    pub fn new(id: ComponentId, kind: ComponentKind, props: ComponentProps, style: PropMap, size: Size) -> Self {
        Self {
            id,
            kind,
            x: 0.0,
            y: 0.0,
            width: size.width,
            height: size.height,
            props,
            style,
            bindings: None,
            events: None,
            custom_css: None,
            custom_js: None,
            custom_html: None,
        }
    }

    /// Document-space bounding box.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Apply a partial field update. Non-finite coordinates are ignored and
    /// width and height stay positive.
    pub fn apply_patch(&mut self, patch: &ComponentPatch) {
        if let Some(x) = patch.x.filter(|x| x.is_finite()) {
            self.x = x;
        }
        if let Some(y) = patch.y.filter(|y| y.is_finite()) {
            self.y = y;
        }
        if let Some(w) = patch.width {
            self.width = clamp_extent(w, self.width);
        }
        if let Some(h) = patch.height {
            self.height = clamp_extent(h, self.height);
        }
        if let Some(style) = &patch.style {
            self.style = style.clone();
        }
        if let Some(events) = &patch.events {
            self.events = Some(events.clone());
        }
        if let Some(bindings) = &patch.bindings {
            self.bindings = Some(bindings.clone());
        }
    }
}

/// Smallest width or height a component may shrink to.
pub const MIN_EXTENT: f64 = 1.0;

/// A stored coordinate or extent: a finite number, or a numeric string.
/// Anything else (null, NaN written as null, text) reads as absent.
fn finite_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}

/// Keeps a present `null` as `Some(Value::Null)`.
fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

fn clamp_extent(requested: f64, current: f64) -> f64 {
    if requested.is_finite() {
        requested.max(MIN_EXTENT)
    } else {
        current
    }
}

/// A partial update to a component's geometry and free-form maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub style: Option<PropMap>,
    pub events: Option<PropMap>,
    pub bindings: Option<PropMap>,
}

// ─── Pages ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Seo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    pub name: String,
    #[serde(default)]
    pub components: Vec<ComponentInstance>,
    #[serde(default)]
    pub apis: Vec<RecordId>,
    #[serde(default)]
    pub queries: Vec<RecordId>,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub is_home_page: bool,
    #[serde(default)]
    pub seo: Seo,
}

impl Page {
    pub fn new(id: PageId, name: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            components: Vec::new(),
            apis: Vec::new(),
            queries: Vec::new(),
            route: route.into(),
            is_home_page: false,
            seo: Seo::default(),
        }
    }

    /// The page every fresh document starts with.
    pub fn home() -> Self {
        Self {
            is_home_page: true,
            seo: Seo {
                title: Some("Home Page".into()),
                description: Some("Welcome to our application".into()),
                keywords: None,
            },
            ..Self::new(PageId::intern("page-1"), "Home", "/")
        }
    }

    pub fn component(&self, id: ComponentId) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut ComponentInstance> {
        self.components.iter_mut().find(|c| c.id == id)
    }
}

/// A partial update to a page. Setting `is_home_page` to true clears the flag
/// on every other page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagePatch {
    pub name: Option<String>,
    pub route: Option<String>,
    pub seo: Option<Seo>,
    pub is_home_page: Option<bool>,
}

// ─── Collaborator records ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthType {
    #[default]
    None,
    Bearer,
    Basic,
    ApiKey,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Authentication {
    #[serde(rename = "type")]
    pub auth_type: AuthType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_header: Option<String>,
}

/// A declared HTTP call. `is_loading`, `response` and `error` are written by
/// the API runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headers: PropMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<PropMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Authentication>,
    /// A `null` body is a response; only an absent key means none yet.
    #[serde(default, deserialize_with = "present_value", skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Milliseconds; the runner's default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
}

impl ApiEndpoint {
    pub fn new(id: RecordId, name: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            method,
            url: url.into(),
            headers: PropMap::new(),
            body: None,
            params: None,
            authentication: None,
            response: None,
            is_loading: false,
            error: None,
            timeout: None,
            retries: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlQuery {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub query: String,
    /// Id of the datasource the query runs against.
    #[serde(default)]
    pub datasource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<Value>>,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<PropMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl SqlQuery {
    pub fn new(id: RecordId, name: impl Into<String>, query: impl Into<String>, datasource: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            query: query.into(),
            datasource: datasource.into(),
            result: None,
            is_loading: false,
            error: None,
            parameters: None,
            timeout: None,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasourceKind {
    #[default]
    Postgresql,
    Mysql,
    Mongodb,
    RestApi,
    Graphql,
    Firebase,
    Supabase,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatasourceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datasource {
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: DatasourceKind,
    #[serde(default)]
    pub config: DatasourceConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_connected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tested: Option<DateTime<Utc>>,
}

impl Datasource {
    pub fn new(id: RecordId, name: impl Into<String>, kind: DatasourceKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            config: DatasourceConfig::default(),
            is_connected: None,
            last_tested: None,
        }
    }
}

// ─── Settings & theme ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeColors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub surface: String,
    pub text: String,
    pub text_secondary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeFonts {
    pub primary: String,
    pub secondary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSpacing {
    pub xs: String,
    pub sm: String,
    pub md: String,
    pub lg: String,
    pub xl: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub name: String,
    pub colors: ThemeColors,
    pub fonts: ThemeFonts,
    pub spacing: ThemeSpacing,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            id: "default".into(),
            name: "Default".into(),
            colors: ThemeColors {
                primary: "#3B82F6".into(),
                secondary: "#6B7280".into(),
                accent: "#10B981".into(),
                background: "#FFFFFF".into(),
                surface: "#F9FAFB".into(),
                text: "#1F2937".into(),
                text_secondary: "#6B7280".into(),
            },
            fonts: ThemeFonts {
                primary: "Inter, sans-serif".into(),
                secondary: "JetBrains Mono, monospace".into(),
            },
            spacing: ThemeSpacing {
                xs: "0.25rem".into(),
                sm: "0.5rem".into(),
                md: "1rem".into(),
                lg: "1.5rem".into(),
                xl: "2rem".into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub theme: Theme,
    pub responsive: bool,
    pub rtl: bool,
    pub animations: bool,
    pub debug_mode: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            responsive: true,
            rtl: false,
            animations: true,
            debug_mode: false,
        }
    }
}

/// A partial update to the app-wide flags. The theme has its own setter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub responsive: Option<bool>,
    pub rtl: Option<bool>,
    pub animations: Option<bool>,
    pub debug_mode: Option<bool>,
}

impl AppSettings {
    pub fn apply_patch(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.responsive {
            self.responsive = v;
        }
        if let Some(v) = patch.rtl {
            self.rtl = v;
        }
        if let Some(v) = patch.animations {
            self.animations = v;
        }
        if let Some(v) = patch.debug_mode {
            self.debug_mode = v;
        }
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// The aggregate root. `current_page_id` always names a page in `pages`
/// once [`Document::normalize`] has run.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub pages: Vec<Page>,
    pub current_page_id: PageId,
    pub apis: Vec<ApiEndpoint>,
    pub sql_queries: Vec<SqlQuery>,
    pub datasources: Vec<Datasource>,
    pub settings: AppSettings,
    /// Runtime state seeded into generated script.
    pub global_state: PropMap,
    /// Top-level keys from a stored project this build does not model.
    pub extras: PropMap,
}

impl Default for Document {
    fn default() -> Self {
        let home = Page::home();
        Self {
            current_page_id: home.id,
            pages: vec![home],
            apis: Vec::new(),
            sql_queries: Vec::new(),
            datasources: Vec::new(),
            settings: AppSettings::default(),
            global_state: PropMap::new(),
            extras: PropMap::new(),
        }
    }
}

/// Where a duplicated record's copy gets its name.
fn copy_name(name: &str) -> String {
    format!("{name} Copy")
}

/// Route for a duplicated page. The root route has nothing to suffix, so
/// the copy takes a slug of the page name instead (`Home` → `/home-copy`).
fn copy_route(route: &str, name: &str) -> String {
    let trimmed = route.trim_end_matches('/');
    if !trimmed.trim_start_matches('/').is_empty() {
        return format!("{trimmed}-copy");
    }
    let slug = name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "/page-copy".to_string()
    } else {
        format!("/{slug}-copy")
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the page invariants: at least one page, a valid current page,
    /// and at most one home page.
    pub fn normalize(&mut self) {
        if self.pages.is_empty() {
            log::warn!("document has no pages, adding the default page");
            self.pages.push(Page::home());
        }
        if !self.pages.iter().any(|p| p.id == self.current_page_id) {
            log::warn!(
                "current page {} does not exist, falling back to the first page",
                self.current_page_id
            );
            self.current_page_id = self.pages[0].id;
        }
        let mut seen_home = false;
        for page in &mut self.pages {
            if page.is_home_page {
                if seen_home {
                    page.is_home_page = false;
                }
                seen_home = true;
            }
        }
    }

    // ── Pages ──

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn page_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == id)
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.page(self.current_page_id)
    }

    pub fn current_page_mut(&mut self) -> Option<&mut Page> {
        self.page_mut(self.current_page_id)
    }

    /// The working set: the current page's components in z-order.
    pub fn components(&self) -> &[ComponentInstance] {
        self.current_page().map_or(&[], |p| p.components.as_slice())
    }

    pub fn add_page(&mut self, page: Page) -> PageId {
        let id = page.id;
        let is_home = page.is_home_page;
        self.pages.push(page);
        if is_home {
            self.set_home_page(id);
        }
        id
    }

    pub fn update_page(&mut self, id: PageId, patch: PagePatch) -> bool {
        let Some(page) = self.page_mut(id) else {
            return false;
        };
        if let Some(name) = patch.name {
            page.name = name;
        }
        if let Some(route) = patch.route {
            page.route = route;
        }
        if let Some(seo) = patch.seo {
            page.seo = seo;
        }
        if patch.is_home_page == Some(false) {
            page.is_home_page = false;
        }
        if patch.is_home_page == Some(true) {
            self.set_home_page(id);
        }
        true
    }

    fn set_home_page(&mut self, id: PageId) {
        for page in &mut self.pages {
            page.is_home_page = page.id == id;
        }
    }

    /// Remove a page. The last page is never removed. Returns whether the
    /// page was deleted; the current page falls back to the first remaining.
    pub fn delete_page(&mut self, id: PageId) -> bool {
        if self.pages.len() <= 1 || self.page(id).is_none() {
            return false;
        }
        self.pages.retain(|p| p.id != id);
        if self.current_page_id == id {
            self.current_page_id = self.pages[0].id;
        }
        true
    }

    /// Copy a page with fresh ids for the page and every component on it.
    pub fn duplicate_page(&mut self, id: PageId) -> Option<PageId> {
        let source = self.page(id)?;
        let mut copy = source.clone();
        copy.id = PageId::fresh("page");
        copy.name = copy_name(&source.name);
        copy.route = copy_route(&source.route, &source.name);
        copy.is_home_page = false;
        for component in &mut copy.components {
            component.id = ComponentId::fresh(component.kind.as_str());
        }
        let new_id = copy.id;
        self.pages.push(copy);
        Some(new_id)
    }

    /// Make `id` the current page. Unknown ids are ignored.
    pub fn switch_page(&mut self, id: PageId) -> bool {
        if self.page(id).is_none() {
            return false;
        }
        self.current_page_id = id;
        true
    }

    // ── Components (current page) ──

    pub fn component(&self, id: ComponentId) -> Option<&ComponentInstance> {
        self.current_page()?.component(id)
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut ComponentInstance> {
        self.current_page_mut()?.component_mut(id)
    }

    /// Append on top of the current page.
    pub fn add_component(&mut self, component: ComponentInstance) -> bool {
        match self.current_page_mut() {
            Some(page) => {
                page.components.push(component);
                true
            }
            None => false,
        }
    }

    /// Remove exactly the instance with `id`; `None` when absent.
    pub fn remove_component(&mut self, id: ComponentId) -> Option<ComponentInstance> {
        let page = self.current_page_mut()?;
        let idx = page.components.iter().position(|c| c.id == id)?;
        Some(page.components.remove(idx))
    }

    /// Copy a component under a fresh id, shifted by `offset`, on top.
    pub fn duplicate_component(&mut self, id: ComponentId, offset: Vec2) -> Option<ComponentId> {
        let mut copy = self.component(id)?.clone();
        copy.id = ComponentId::fresh(copy.kind.as_str());
        copy.x += offset.x;
        copy.y += offset.y;
        let new_id = copy.id;
        self.add_component(copy);
        Some(new_id)
    }

    // ── Collaborator records ──

    pub fn api(&self, id: RecordId) -> Option<&ApiEndpoint> {
        self.apis.iter().find(|a| a.id == id)
    }

    pub fn api_mut(&mut self, id: RecordId) -> Option<&mut ApiEndpoint> {
        self.apis.iter_mut().find(|a| a.id == id)
    }

    pub fn duplicate_api(&mut self, id: RecordId) -> Option<RecordId> {
        let mut copy = self.api(id)?.clone();
        copy.id = RecordId::fresh("api");
        copy.name = copy_name(&copy.name);
        let new_id = copy.id;
        self.apis.push(copy);
        Some(new_id)
    }

    pub fn query(&self, id: RecordId) -> Option<&SqlQuery> {
        self.sql_queries.iter().find(|q| q.id == id)
    }

    pub fn query_mut(&mut self, id: RecordId) -> Option<&mut SqlQuery> {
        self.sql_queries.iter_mut().find(|q| q.id == id)
    }

    pub fn duplicate_query(&mut self, id: RecordId) -> Option<RecordId> {
        let mut copy = self.query(id)?.clone();
        copy.id = RecordId::fresh("query");
        copy.name = copy_name(&copy.name);
        let new_id = copy.id;
        self.sql_queries.push(copy);
        Some(new_id)
    }

    pub fn datasource(&self, id: RecordId) -> Option<&Datasource> {
        self.datasources.iter().find(|d| d.id == id)
    }

    pub fn datasource_mut(&mut self, id: RecordId) -> Option<&mut Datasource> {
        self.datasources.iter_mut().find(|d| d.id == id)
    }

    /// Clear `isLoading` flags left behind by an interrupted session.
    /// Returns how many records were reset.
    pub fn reset_stale_loading(&mut self) -> usize {
        let mut reset = 0;
        for api in self.apis.iter_mut().filter(|a| a.is_loading) {
            api.is_loading = false;
            reset += 1;
        }
        for query in self.sql_queries.iter_mut().filter(|q| q.is_loading) {
            query.is_loading = false;
            reset += 1;
        }
        reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(id: &str, x: f64, y: f64) -> ComponentInstance {
        let kind = ComponentKind::Button;
        let mut c = ComponentInstance::new(
            ComponentId::intern(id),
            kind.clone(),
            ComponentProps::defaults(&kind),
            PropMap::new(),
            Size::new(120.0, 40.0),
        );
        c.x = x;
        c.y = y;
        c
    }

    #[test]
    fn default_document_has_one_home_page() {
        let doc = Document::new();
        assert_eq!(doc.pages.len(), 1);
        let page = doc.current_page().unwrap();
        assert_eq!(page.name, "Home");
        assert_eq!(page.route, "/");
        assert!(page.is_home_page);
        assert!(doc.components().is_empty());
    }

    #[test]
    fn remove_component_is_exact() {
        let mut doc = Document::new();
        doc.add_component(button("a", 0.0, 0.0));
        doc.add_component(button("b", 10.0, 10.0));
        assert!(doc.remove_component(ComponentId::intern("a")).is_some());
        assert!(doc.remove_component(ComponentId::intern("missing")).is_none());
        let ids: Vec<_> = doc.components().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn duplicate_component_offsets_and_keeps_original() {
        let mut doc = Document::new();
        doc.add_component(button("orig", 50.0, 50.0));
        let copy = doc
            .duplicate_component(ComponentId::intern("orig"), Vec2::new(20.0, 20.0))
            .unwrap();
        assert_ne!(copy, ComponentId::intern("orig"));
        let c = doc.component(copy).unwrap();
        assert_eq!((c.x, c.y), (70.0, 70.0));
        assert_eq!(doc.components().len(), 2);
    }

    #[test]
    fn patch_keeps_extent_positive() {
        let mut c = button("p", 0.0, 0.0);
        c.apply_patch(&ComponentPatch {
            width: Some(-5.0),
            height: Some(f64::NAN),
            ..Default::default()
        });
        assert_eq!(c.width, MIN_EXTENT);
        assert_eq!(c.height, 40.0);
    }

    #[test]
    fn patch_ignores_non_finite_position() {
        let mut c = button("nan-move", 30.0, 40.0);
        c.apply_patch(&ComponentPatch {
            x: Some(f64::NAN),
            y: Some(f64::INFINITY),
            ..Default::default()
        });
        assert_eq!((c.x, c.y), (30.0, 40.0));
        c.apply_patch(&ComponentPatch {
            x: Some(f64::NEG_INFINITY),
            y: Some(55.0),
            ..Default::default()
        });
        assert_eq!((c.x, c.y), (30.0, 55.0));
    }

    #[test]
    fn stored_component_fills_missing_geometry() {
        let c: ComponentInstance = serde_json::from_value(serde_json::json!({
            "id": "bare-input",
            "type": "input",
            "x": null,
            "y": "12",
            "height": 0,
        }))
        .unwrap();
        assert_eq!((c.x, c.y), (0.0, 12.0));
        let default_size = crate::registry::lookup(&ComponentKind::Input).unwrap().default_size;
        assert_eq!(c.size(), default_size);

        let other: ComponentInstance = serde_json::from_value(serde_json::json!({
            "id": "bare-widget",
            "type": "widget",
            "width": -3,
            "height": 25,
        }))
        .unwrap();
        assert_eq!(other.size(), Size::new(MIN_EXTENT, 25.0));
    }

    #[test]
    fn null_response_survives_roundtrip() {
        let mut api = ApiEndpoint::new(RecordId::intern("api-null"), "Ping", HttpMethod::Get, "https://x");
        api.response = Some(Value::Null);
        let text = serde_json::to_string(&api).unwrap();
        assert!(text.contains(r#""response":null"#));
        let back: ApiEndpoint = serde_json::from_str(&text).unwrap();
        assert_eq!(back.response, Some(Value::Null));

        api.response = None;
        let back: ApiEndpoint = serde_json::from_str(&serde_json::to_string(&api).unwrap()).unwrap();
        assert_eq!(back.response, None);
    }

    #[test]
    fn last_page_cannot_be_deleted() {
        let mut doc = Document::new();
        let only = doc.current_page_id;
        assert!(!doc.delete_page(only));
        assert_eq!(doc.pages.len(), 1);
    }

    #[test]
    fn deleting_current_page_falls_back_to_first() {
        let mut doc = Document::new();
        let home = doc.current_page_id;
        let about = doc.add_page(Page::new(PageId::intern("about"), "About", "/about"));
        doc.switch_page(about);
        assert!(doc.delete_page(about));
        assert_eq!(doc.current_page_id, home);
    }

    #[test]
    fn home_flag_is_exclusive() {
        let mut doc = Document::new();
        let about = doc.add_page(Page::new(PageId::intern("about-home"), "About", "/about"));
        doc.update_page(
            about,
            PagePatch {
                is_home_page: Some(true),
                ..Default::default()
            },
        );
        let homes: Vec<_> = doc.pages.iter().filter(|p| p.is_home_page).map(|p| p.id).collect();
        assert_eq!(homes, vec![about]);
    }

    #[test]
    fn duplicate_page_reidentifies_components() {
        let mut doc = Document::new();
        doc.add_component(button("dup-src", 1.0, 2.0));
        let home = doc.current_page_id;
        let copy_id = doc.duplicate_page(home).unwrap();
        let copy = doc.page(copy_id).unwrap();
        assert_eq!(copy.name, "Home Copy");
        assert_eq!(copy.route, "/home-copy");
        assert!(!copy.is_home_page);
        assert_eq!(copy.components.len(), 1);
        assert_ne!(copy.components[0].id, ComponentId::intern("dup-src"));
    }

    #[test]
    fn copied_routes() {
        assert_eq!(copy_route("/about", "About"), "/about-copy");
        assert_eq!(copy_route("/about/", "About"), "/about-copy");
        assert_eq!(copy_route("/", "Landing Page"), "/landing-page-copy");
        assert_eq!(copy_route("", "Home"), "/home-copy");
        assert_eq!(copy_route("/", "!!"), "/page-copy");
    }

    #[test]
    fn normalize_repairs_dangling_current_page() {
        let mut doc = Document {
            pages: Vec::new(),
            current_page_id: PageId::intern("gone"),
            ..Document::default()
        };
        doc.normalize();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.current_page_id, doc.pages[0].id);
    }

    #[test]
    fn stale_loading_flags_reset() {
        let mut doc = Document::new();
        let mut api = ApiEndpoint::new(RecordId::intern("api-1"), "Users", HttpMethod::Get, "https://x");
        api.is_loading = true;
        doc.apis.push(api);
        assert_eq!(doc.reset_stale_loading(), 1);
        assert!(!doc.apis[0].is_loading);
    }
}

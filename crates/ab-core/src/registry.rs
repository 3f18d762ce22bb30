//! The process-wide component catalog.
//!
//! One [`ComponentDefinition`] per built-in kind carries everything the other
//! layers need: default props/style/size for placement, the property schema
//! for the editor panel, and the HTML fragment writer for code generation.

use crate::codegen::fragments;
use crate::error::UnknownKindError;
use crate::model::ComponentInstance;
use crate::props::{ComponentKind, ComponentProps, PropMap};
use kurbo::Size;
use serde_json::{Value, json};
use smallvec::SmallVec;
use std::fmt;
use std::sync::LazyLock;

// ─── Schema ──────────────────────────────────────────────────────────────

/// Palette grouping shown in the component library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Basic,
    Form,
    Data,
    Layout,
    Advanced,
    Custom,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Basic,
        Category::Form,
        Category::Data,
        Category::Layout,
        Category::Advanced,
        Category::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Form => "form",
            Self::Data => "data",
            Self::Layout => "layout",
            Self::Advanced => "advanced",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which editor widget a schema entry gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorType {
    Text,
    Number,
    Boolean,
    Select,
    Color,
    TextArea,
    Code,
    Url,
}

/// Options list for select entries. Most selects have a handful of choices.
pub type SelectOptions = SmallVec<[&'static str; 8]>;

/// One editable property. `options` is present exactly when the editor is a select.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySchemaEntry {
    key: &'static str,
    label: &'static str,
    editor: EditorType,
    options: Option<SelectOptions>,
    default_value: Option<Value>,
}

impl PropertySchemaEntry {
    fn new(key: &'static str, label: &'static str, editor: EditorType) -> Self {
        Self {
            key,
            label,
            editor,
            options: None,
            default_value: None,
        }
    }

    pub fn text(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, EditorType::Text)
    }

    pub fn number(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, EditorType::Number)
    }

    pub fn boolean(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, EditorType::Boolean)
    }

    pub fn color(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, EditorType::Color)
    }

    pub fn textarea(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, EditorType::TextArea)
    }

    pub fn code(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, EditorType::Code)
    }

    pub fn url(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, EditorType::Url)
    }

    pub fn select(key: &'static str, label: &'static str, options: &[&'static str]) -> Self {
        Self {
            options: Some(options.iter().copied().collect()),
            ..Self::new(key, label, EditorType::Select)
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn editor(&self) -> EditorType {
        self.editor
    }

    /// Allowed values; `Some` only for select entries.
    pub fn options(&self) -> Option<&[&'static str]> {
        self.options.as_deref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }
}

// ─── Definitions ─────────────────────────────────────────────────────────

/// Writes a component's inner HTML for generated output.
pub type FragmentFn = fn(&ComponentInstance) -> String;

/// Immutable descriptor of one component kind.
#[derive(Debug, Clone)]
pub struct ComponentDefinition {
    pub kind: ComponentKind,
    pub display_name: &'static str,
    pub icon: &'static str,
    pub category: Category,
    pub default_props: ComponentProps,
    pub default_style: PropMap,
    pub default_size: Size,
    pub property_schema: Vec<PropertySchemaEntry>,
    pub fragment: FragmentFn,
}

impl ComponentDefinition {
    /// Schema entry for `key`, if the kind declares one.
    pub fn schema_entry(&self, key: &str) -> Option<&PropertySchemaEntry> {
        self.property_schema.iter().find(|e| e.key == key)
    }
}

/// Independent copies of a kind's defaults, ready for a new instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    pub props: ComponentProps,
    pub style: PropMap,
    pub size: Size,
}

fn style(entries: Value) -> PropMap {
    match entries {
        Value::Object(map) => map,
        _ => PropMap::new(),
    }
}

#[allow(clippy::too_many_arguments)]
fn define(
    kind: ComponentKind,
    display_name: &'static str,
    icon: &'static str,
    category: Category,
    size: (f64, f64),
    default_style: Value,
    property_schema: Vec<PropertySchemaEntry>,
    fragment: FragmentFn,
) -> ComponentDefinition {
    ComponentDefinition {
        default_props: ComponentProps::defaults(&kind),
        kind,
        display_name,
        icon,
        category,
        default_style: style(default_style),
        default_size: Size::new(size.0, size.1),
        property_schema,
        fragment,
    }
}

use PropertySchemaEntry as E;

const SIZES: &[&str] = &["xs", "sm", "md", "lg", "xl"];
const FONT_WEIGHTS: &[&str] = &[
    "normal", "bold", "100", "200", "300", "400", "500", "600", "700", "800", "900",
];

fn builtin_definitions() -> Vec<ComponentDefinition> {
    use ComponentKind as K;
    vec![
        define(
            K::Button,
            "Button",
            "MousePointerClick",
            Category::Basic,
            (120.0, 40.0),
            json!({ "backgroundColor": "transparent", "border": "none" }),
            vec![
                E::text("label", "Label").with_default("Button"),
                E::text("tooltip", "Tooltip"),
                E::boolean("visible", "Visible").with_default(true),
                E::boolean("disabled", "Disabled").with_default(false),
                E::boolean("loading", "Loading").with_default(false),
                E::select(
                    "variant",
                    "Variant",
                    &["primary", "secondary", "danger", "success", "warning", "info"],
                )
                .with_default("primary"),
                E::select("size", "Size", SIZES).with_default("md"),
            ],
            fragments::button,
        ),
        define(
            K::Input,
            "Input",
            "Type",
            Category::Form,
            (250.0, 75.0),
            json!({ "backgroundColor": "transparent" }),
            vec![
                E::text("label", "Label").with_default("Input"),
                E::text("placeholder", "Placeholder"),
                E::select(
                    "type",
                    "Type",
                    &["text", "email", "password", "number", "tel", "url", "search"],
                )
                .with_default("text"),
                E::boolean("visible", "Visible").with_default(true),
                E::boolean("disabled", "Disabled").with_default(false),
                E::boolean("readonly", "Read Only").with_default(false),
                E::boolean("required", "Required").with_default(false),
                E::number("maxLength", "Max Length").with_default(100),
                E::boolean("showCharacterCount", "Show Character Count").with_default(false),
            ],
            fragments::input,
        ),
        define(
            K::Text,
            "Text",
            "Type",
            Category::Basic,
            (200.0, 40.0),
            json!({}),
            vec![
                E::textarea("content", "Content").with_default("Text"),
                E::text("fontSize", "Font Size").with_default("14px"),
                E::select("fontWeight", "Font Weight", FONT_WEIGHTS).with_default("normal"),
                E::color("color", "Color").with_default("#000000"),
                E::select("textAlign", "Text Align", &["left", "center", "right", "justify"])
                    .with_default("left"),
                E::boolean("visible", "Visible").with_default(true),
                E::boolean("richText", "Rich Text").with_default(false),
            ],
            fragments::text,
        ),
        define(
            K::Image,
            "Image",
            "Image",
            Category::Basic,
            (300.0, 200.0),
            json!({}),
            vec![
                E::url("src", "Source URL").with_default(""),
                E::text("alt", "Alt Text").with_default("Image"),
                E::select("fit", "Fit Mode", &["cover", "contain", "fill", "scale-down", "none"])
                    .with_default("cover"),
                E::text("borderRadius", "Border Radius").with_default("0px"),
                E::number("opacity", "Opacity").with_default(1),
                E::boolean("visible", "Visible").with_default(true),
            ],
            fragments::image,
        ),
        define(
            K::Table,
            "Table",
            "Table",
            Category::Data,
            (800.0, 400.0),
            json!({}),
            vec![
                E::boolean("visible", "Visible").with_default(true),
                E::boolean("compact", "Compact").with_default(false),
                E::boolean("striped", "Striped").with_default(true),
                E::boolean("bordered", "Bordered").with_default(false),
                E::boolean("hoverable", "Hoverable").with_default(true),
            ],
            fragments::table,
        ),
        define(
            K::Select,
            "Select",
            "ChevronDown",
            Category::Form,
            (250.0, 75.0),
            json!({}),
            vec![
                E::text("label", "Label").with_default("Select"),
                E::text("placeholder", "Placeholder").with_default("Choose an option..."),
                E::boolean("visible", "Visible").with_default(true),
                E::boolean("disabled", "Disabled").with_default(false),
                E::boolean("required", "Required").with_default(false),
                E::boolean("multiple", "Multiple").with_default(false),
                E::boolean("searchable", "Searchable").with_default(true),
                E::boolean("clearable", "Clearable").with_default(true),
            ],
            fragments::select,
        ),
        define(
            K::Checkbox,
            "Checkbox",
            "CheckSquare",
            Category::Form,
            (150.0, 40.0),
            json!({}),
            vec![
                E::text("label", "Label").with_default("Checkbox"),
                E::boolean("checked", "Checked").with_default(false),
                E::boolean("visible", "Visible").with_default(true),
                E::boolean("disabled", "Disabled").with_default(false),
                E::boolean("required", "Required").with_default(false),
                E::select("size", "Size", &["sm", "md", "lg"]).with_default("md"),
                E::color("color", "Color").with_default("#3B82F6"),
            ],
            fragments::checkbox,
        ),
        define(
            K::Radio,
            "Radio",
            "Circle",
            Category::Form,
            (200.0, 100.0),
            json!({}),
            vec![
                E::text("label", "Label").with_default("Radio Group"),
                E::boolean("visible", "Visible").with_default(true),
                E::boolean("disabled", "Disabled").with_default(false),
                E::boolean("required", "Required").with_default(false),
            ],
            fragments::radio,
        ),
        define(
            K::Switch,
            "Switch",
            "ToggleLeft",
            Category::Form,
            (150.0, 40.0),
            json!({}),
            vec![
                E::text("label", "Label").with_default("Switch"),
                E::boolean("checked", "Checked").with_default(false),
                E::boolean("visible", "Visible").with_default(true),
                E::boolean("disabled", "Disabled").with_default(false),
            ],
            fragments::switch,
        ),
        define(
            K::Slider,
            "Slider",
            "SlidersHorizontal",
            Category::Form,
            (300.0, 60.0),
            json!({}),
            vec![
                E::text("label", "Label").with_default("Slider"),
                E::number("value", "Value").with_default(50),
                E::number("min", "Min").with_default(0),
                E::number("max", "Max").with_default(100),
                E::number("step", "Step").with_default(1),
                E::boolean("visible", "Visible").with_default(true),
                E::boolean("disabled", "Disabled").with_default(false),
            ],
            fragments::slider,
        ),
        define(
            K::DatePicker,
            "Date Picker",
            "Calendar",
            Category::Form,
            (250.0, 75.0),
            json!({}),
            vec![
                E::text("label", "Label").with_default("Date"),
                E::text("format", "Format").with_default("YYYY-MM-DD"),
                E::boolean("visible", "Visible").with_default(true),
                E::boolean("disabled", "Disabled").with_default(false),
                E::boolean("required", "Required").with_default(false),
            ],
            fragments::date_picker,
        ),
        define(
            K::FileUpload,
            "File Upload",
            "Upload",
            Category::Form,
            (300.0, 100.0),
            json!({}),
            vec![
                E::text("label", "Label").with_default("Upload File"),
                E::text("accept", "Accept").with_default("*"),
                E::boolean("multiple", "Multiple").with_default(false),
                E::number("maxSize", "Max Size (bytes)").with_default(10_485_760),
                E::boolean("visible", "Visible").with_default(true),
                E::boolean("disabled", "Disabled").with_default(false),
            ],
            fragments::file_upload,
        ),
        define(
            K::Chart,
            "Chart",
            "BarChart3",
            Category::Data,
            (500.0, 300.0),
            json!({}),
            vec![
                E::select("type", "Chart Type", &["bar", "line", "pie", "area"]).with_default("bar"),
                E::boolean("visible", "Visible").with_default(true),
            ],
            fragments::chart,
        ),
        define(
            K::List,
            "List",
            "List",
            Category::Data,
            (300.0, 400.0),
            json!({}),
            vec![E::boolean("visible", "Visible").with_default(true)],
            fragments::list,
        ),
        define(
            K::Container,
            "Container",
            "Box",
            Category::Layout,
            (400.0, 300.0),
            json!({
                "backgroundColor": "#f9fafb",
                "border": "1px solid #e5e7eb",
                "borderRadius": "8px",
                "padding": "16px"
            }),
            vec![E::boolean("visible", "Visible").with_default(true)],
            fragments::container,
        ),
        define(
            K::Modal,
            "Modal",
            "Square",
            Category::Layout,
            (500.0, 400.0),
            json!({}),
            vec![
                E::text("title", "Title").with_default("Modal"),
                E::boolean("visible", "Visible").with_default(false),
            ],
            fragments::modal,
        ),
        define(
            K::Tabs,
            "Tabs",
            "Tabs",
            Category::Layout,
            (600.0, 400.0),
            json!({}),
            vec![
                E::text("activeTab", "Active Tab").with_default("tab1"),
                E::boolean("visible", "Visible").with_default(true),
            ],
            fragments::tabs,
        ),
        define(
            K::CustomFunction,
            "Custom",
            "Code",
            Category::Custom,
            (400.0, 300.0),
            json!({}),
            vec![
                E::code("html", "HTML"),
                E::code("css", "CSS"),
                E::code("javascript", "JavaScript"),
                E::number("height", "Height").with_default(300),
                E::boolean("visible", "Visible").with_default(true),
            ],
            fragments::custom_function,
        ),
    ]
}

// ─── Registry ────────────────────────────────────────────────────────────

/// Read-only catalog of component definitions.
#[derive(Debug)]
pub struct Registry {
    definitions: Vec<ComponentDefinition>,
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| Registry {
    definitions: builtin_definitions(),
});

/// The process-wide registry, built on first use.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

impl Registry {
    pub fn lookup(&self, kind: &ComponentKind) -> Result<&ComponentDefinition, UnknownKindError> {
        self.definitions
            .iter()
            .find(|d| &d.kind == kind)
            .ok_or_else(|| UnknownKindError(kind.clone()))
    }

    /// Deep copies of the kind's default props, style, and size.
    pub fn instantiate_defaults(&self, kind: &ComponentKind) -> Result<Defaults, UnknownKindError> {
        let def = self.lookup(kind)?;
        Ok(Defaults {
            props: def.default_props.clone(),
            style: def.default_style.clone(),
            size: def.default_size,
        })
    }

    pub fn all(&self) -> &[ComponentDefinition] {
        &self.definitions
    }

    /// Definitions grouped by category, in palette order. Empty categories are kept.
    pub fn by_category(&self) -> Vec<(Category, Vec<&ComponentDefinition>)> {
        Category::ALL
            .iter()
            .map(|&cat| {
                let defs = self.definitions.iter().filter(|d| d.category == cat).collect();
                (cat, defs)
            })
            .collect()
    }
}

/// Shorthand for `registry().lookup(kind)`.
pub fn lookup(kind: &ComponentKind) -> Result<&'static ComponentDefinition, UnknownKindError> {
    registry().lookup(kind)
}

//! Component kinds and their strongly-typed property sets.
//!
//! Every built-in kind owns one props struct. Each struct carries a flattened
//! `extra` map so keys the struct does not know about survive a load/save
//! round-trip. Kinds that are not built in keep their props as a raw map.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Insertion-ordered JSON object used for free-form bags (props, style, headers).
pub type PropMap = serde_json::Map<String, Value>;

// ─── Kinds ───────────────────────────────────────────────────────────────

/// The discriminant that selects a component's definition and props variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    Button,
    Input,
    Text,
    Image,
    Table,
    Select,
    Checkbox,
    Radio,
    Switch,
    Slider,
    DatePicker,
    FileUpload,
    Chart,
    List,
    Container,
    Modal,
    Tabs,
    CustomFunction,
    /// A kind tag this build does not know. Kept verbatim.
    Other(String),
}

impl ComponentKind {
    /// Every kind with a registry entry, in catalog order.
    pub const BUILTIN: [ComponentKind; 18] = [
        ComponentKind::Button,
        ComponentKind::Input,
        ComponentKind::Text,
        ComponentKind::Image,
        ComponentKind::Table,
        ComponentKind::Select,
        ComponentKind::Checkbox,
        ComponentKind::Radio,
        ComponentKind::Switch,
        ComponentKind::Slider,
        ComponentKind::DatePicker,
        ComponentKind::FileUpload,
        ComponentKind::Chart,
        ComponentKind::List,
        ComponentKind::Container,
        ComponentKind::Modal,
        ComponentKind::Tabs,
        ComponentKind::CustomFunction,
    ];

    /// Parse a kind tag. Unrecognized tags become `Other`.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "button" => Self::Button,
            "input" => Self::Input,
            "text" => Self::Text,
            "image" => Self::Image,
            "table" => Self::Table,
            "select" => Self::Select,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "switch" => Self::Switch,
            "slider" => Self::Slider,
            "datepicker" => Self::DatePicker,
            "fileupload" => Self::FileUpload,
            "chart" => Self::Chart,
            "list" => Self::List,
            "container" => Self::Container,
            "modal" => Self::Modal,
            "tabs" => Self::Tabs,
            "customfunction" => Self::CustomFunction,
            other => Self::Other(other.to_string()),
        }
    }

    /// The kind's tag as stored in documents.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Button => "button",
            Self::Input => "input",
            Self::Text => "text",
            Self::Image => "image",
            Self::Table => "table",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::Switch => "switch",
            Self::Slider => "slider",
            Self::DatePicker => "datepicker",
            Self::FileUpload => "fileupload",
            Self::Chart => "chart",
            Self::List => "list",
            Self::Container => "container",
            Self::Modal => "modal",
            Self::Tabs => "tabs",
            Self::CustomFunction => "customfunction",
            Self::Other(tag) => tag,
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ComponentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ComponentKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ComponentKind::parse(&s))
    }
}

// ─── Shared prop types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Query,
    Js,
    Modal,
    Navigate,
    Alert,
    Download,
    Copy,
    #[default]
    None,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Confirmation {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// What happens when a component fires its primary action.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionConfig {
    #[serde(rename = "type")]
    pub action: ActionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<PropMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<Confirmation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlSize {
    Xs,
    Sm,
    #[default]
    Md,
    Lg,
    Xl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }
}

/// An option entry for select and radio groups.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl SelectOption {
    fn new(label: &str, value: &str) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            ..Default::default()
        }
    }
}

// ─── Button ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
    #[default]
    Primary,
    Secondary,
    Danger,
    Success,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ButtonActions {
    pub on_click: ActionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ButtonProps {
    pub label: String,
    pub tooltip: String,
    pub visible: bool,
    pub disabled: bool,
    pub loading: bool,
    pub variant: ButtonVariant,
    pub size: ControlSize,
    pub actions: ButtonActions,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for ButtonProps {
    fn default() -> Self {
        Self {
            label: "Button".into(),
            tooltip: String::new(),
            visible: true,
            disabled: false,
            loading: false,
            variant: ButtonVariant::Primary,
            size: ControlSize::Md,
            actions: ButtonActions::default(),
            extra: PropMap::new(),
        }
    }
}

// ─── Input ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Text,
    Email,
    Password,
    Number,
    Tel,
    Url,
    Search,
}

impl InputType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Password => "password",
            Self::Number => "number",
            Self::Tel => "tel",
            Self::Url => "url",
            Self::Search => "search",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputValidation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputProps {
    pub label: String,
    pub placeholder: String,
    pub value: String,
    #[serde(rename = "type")]
    pub input_type: InputType,
    pub disabled: bool,
    pub readonly: bool,
    pub required: bool,
    pub visible: bool,
    pub validation: InputValidation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    pub max_length: u32,
    pub show_character_count: bool,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for InputProps {
    fn default() -> Self {
        Self {
            label: "Input".into(),
            placeholder: "Enter text...".into(),
            value: String::new(),
            input_type: InputType::Text,
            disabled: false,
            readonly: false,
            required: false,
            visible: true,
            validation: InputValidation::default(),
            prefix: None,
            suffix: None,
            max_length: 100,
            show_character_count: false,
            extra: PropMap::new(),
        }
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextProps {
    pub content: String,
    pub rich_text: bool,
    pub font_size: String,
    pub font_weight: String,
    pub color: String,
    pub text_align: TextAlign,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_decoration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_transform: Option<String>,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            content: "Text".into(),
            rich_text: false,
            font_size: "14px".into(),
            font_weight: "normal".into(),
            color: "#000000".into(),
            text_align: TextAlign::Left,
            visible: true,
            line_height: None,
            letter_spacing: None,
            text_decoration: None,
            text_transform: None,
            extra: PropMap::new(),
        }
    }
}

// ─── Image ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageFit {
    #[default]
    Cover,
    Contain,
    Fill,
    ScaleDown,
    None,
}

impl ImageFit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Contain => "contain",
            Self::Fill => "fill",
            Self::ScaleDown => "scale-down",
            Self::None => "none",
        }
    }
}

pub const DEFAULT_IMAGE_SRC: &str = "https://images.pexels.com/photos/3861969/pexels-photo-3861969.jpeg?auto=compress&cs=tinysrgb&w=400";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageProps {
    pub src: String,
    pub alt: String,
    pub fit: ImageFit,
    pub visible: bool,
    pub border_radius: String,
    pub opacity: f64,
    pub click_action: ActionConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grayscale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<f64>,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for ImageProps {
    fn default() -> Self {
        Self {
            src: DEFAULT_IMAGE_SRC.into(),
            alt: "Image".into(),
            fit: ImageFit::Cover,
            visible: true,
            border_radius: "0px".into(),
            opacity: 1.0,
            click_action: ActionConfig::default(),
            grayscale: None,
            blur: None,
            extra: PropMap::new(),
        }
    }
}

// ─── Table ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Date,
    Boolean,
    Image,
    Link,
    Badge,
    Progress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableColumn {
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub visible: bool,
    pub sortable: bool,
    pub filterable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Default for TableColumn {
    fn default() -> Self {
        Self {
            key: String::new(),
            name: String::new(),
            column_type: ColumnType::Text,
            visible: true,
            sortable: true,
            filterable: true,
            width: None,
            min_width: None,
            max_width: None,
            align: None,
            format: None,
            color: None,
        }
    }
}

impl TableColumn {
    fn new(key: &str, name: &str, column_type: ColumnType, sortable: bool, filterable: bool, width: f64) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            column_type,
            sortable,
            filterable,
            width: Some(width),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableDataSource {
    #[default]
    Static,
    Api,
    Query,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub enabled: bool,
    pub page_size: u32,
    pub show_page_size_options: bool,
    pub page_size_options: Vec<u32>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            enabled: true,
            page_size: 10,
            show_page_size_options: true,
            page_size_options: vec![5, 10, 20, 50, 100],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sorting {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_order: Option<SortOrder>,
}

impl Default for Sorting {
    fn default() -> Self {
        Self {
            enabled: true,
            default_sort: Some("id".into()),
            default_order: Some(SortOrder::Asc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Filtering {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_placeholder: Option<String>,
}

impl Default for Filtering {
    fn default() -> Self {
        Self {
            enabled: true,
            search_placeholder: Some("Search...".into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    None,
    Single,
    #[default]
    Multiple,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RowSelection {
    pub mode: SelectionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_select_all: Option<bool>,
}

impl Default for RowSelection {
    fn default() -> Self {
        Self {
            mode: SelectionMode::Multiple,
            show_select_all: Some(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableProps {
    pub columns: Vec<TableColumn>,
    pub data_source: TableDataSource,
    pub data: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    pub pagination: Pagination,
    pub sorting: Sorting,
    pub filtering: Filtering,
    pub selection: RowSelection,
    pub row_actions: Vec<ActionConfig>,
    pub visible: bool,
    pub compact: bool,
    pub striped: bool,
    pub bordered: bool,
    pub hoverable: bool,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for TableProps {
    fn default() -> Self {
        Self {
            columns: vec![
                TableColumn::new("id", "ID", ColumnType::Number, true, false, 60.0),
                TableColumn::new("name", "Name", ColumnType::Text, true, true, 150.0),
                TableColumn::new("email", "Email", ColumnType::Text, true, true, 200.0),
                TableColumn::new("role", "Role", ColumnType::Badge, true, true, 100.0),
                TableColumn::new("status", "Status", ColumnType::Badge, false, true, 100.0),
            ],
            data_source: TableDataSource::Static,
            data: Vec::new(),
            api_endpoint: None,
            query_id: None,
            pagination: Pagination::default(),
            sorting: Sorting::default(),
            filtering: Filtering::default(),
            selection: RowSelection::default(),
            row_actions: Vec::new(),
            visible: true,
            compact: false,
            striped: true,
            bordered: false,
            hoverable: true,
            extra: PropMap::new(),
        }
    }
}

// ─── Select / Checkbox / Radio / Switch ──────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectProps {
    pub label: String,
    pub placeholder: String,
    /// A single value, or an array of values when `multiple` is set.
    pub value: Value,
    pub options: Vec<SelectOption>,
    pub multiple: bool,
    pub searchable: bool,
    pub clearable: bool,
    pub disabled: bool,
    pub required: bool,
    pub visible: bool,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f64>,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for SelectProps {
    fn default() -> Self {
        Self {
            label: "Select".into(),
            placeholder: "Choose an option...".into(),
            value: Value::String(String::new()),
            options: vec![
                SelectOption::new("Option 1", "option1"),
                SelectOption::new("Option 2", "option2"),
                SelectOption::new("Option 3", "option3"),
            ],
            multiple: false,
            searchable: true,
            clearable: true,
            disabled: false,
            required: false,
            visible: true,
            loading: false,
            max_height: None,
            extra: PropMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckboxProps {
    pub label: String,
    pub checked: bool,
    pub disabled: bool,
    pub required: bool,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indeterminate: Option<bool>,
    pub size: ControlSize,
    pub color: String,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for CheckboxProps {
    fn default() -> Self {
        Self {
            label: "Checkbox".into(),
            checked: false,
            disabled: false,
            required: false,
            visible: true,
            indeterminate: None,
            size: ControlSize::Md,
            color: "#3B82F6".into(),
            extra: PropMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RadioProps {
    pub label: String,
    pub value: String,
    pub options: Vec<SelectOption>,
    pub disabled: bool,
    pub required: bool,
    pub visible: bool,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for RadioProps {
    fn default() -> Self {
        Self {
            label: "Radio Group".into(),
            value: String::new(),
            options: vec![
                SelectOption::new("Option 1", "option1"),
                SelectOption::new("Option 2", "option2"),
            ],
            disabled: false,
            required: false,
            visible: true,
            extra: PropMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwitchProps {
    pub label: String,
    pub checked: bool,
    pub disabled: bool,
    pub visible: bool,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for SwitchProps {
    fn default() -> Self {
        Self {
            label: "Switch".into(),
            checked: false,
            disabled: false,
            visible: true,
            extra: PropMap::new(),
        }
    }
}

// ─── Slider / DatePicker / FileUpload ────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SliderProps {
    pub label: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub disabled: bool,
    pub visible: bool,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for SliderProps {
    fn default() -> Self {
        Self {
            label: "Slider".into(),
            value: 50.0,
            min: 0.0,
            max: 100.0,
            step: 1.0,
            disabled: false,
            visible: true,
            extra: PropMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatePickerProps {
    pub label: String,
    pub value: String,
    pub format: String,
    pub disabled: bool,
    pub required: bool,
    pub visible: bool,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for DatePickerProps {
    fn default() -> Self {
        Self {
            label: "Date".into(),
            value: String::new(),
            format: "YYYY-MM-DD".into(),
            disabled: false,
            required: false,
            visible: true,
            extra: PropMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileUploadProps {
    pub label: String,
    pub accept: String,
    pub multiple: bool,
    /// Maximum upload size in bytes.
    pub max_size: u64,
    pub disabled: bool,
    pub visible: bool,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for FileUploadProps {
    fn default() -> Self {
        Self {
            label: "Upload File".into(),
            accept: "*".into(),
            multiple: false,
            max_size: 10 * 1024 * 1024,
            disabled: false,
            visible: true,
            extra: PropMap::new(),
        }
    }
}

// ─── Data & layout kinds ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartProps {
    #[serde(rename = "type")]
    pub chart_type: String,
    pub data: Vec<Value>,
    pub visible: bool,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for ChartProps {
    fn default() -> Self {
        Self {
            chart_type: "bar".into(),
            data: Vec::new(),
            visible: true,
            extra: PropMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListProps {
    pub items: Vec<Value>,
    pub visible: bool,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for ListProps {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            visible: true,
            extra: PropMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerProps {
    pub visible: bool,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for ContainerProps {
    fn default() -> Self {
        Self {
            visible: true,
            extra: PropMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModalProps {
    pub title: String,
    pub visible: bool,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for ModalProps {
    fn default() -> Self {
        Self {
            title: "Modal".into(),
            visible: false,
            extra: PropMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tab {
    pub id: String,
    pub label: String,
    pub content: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabsProps {
    pub tabs: Vec<Tab>,
    pub active_tab: String,
    pub visible: bool,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for TabsProps {
    fn default() -> Self {
        let tab = |id: &str, label: &str| Tab {
            id: id.into(),
            label: label.into(),
            content: Vec::new(),
        };
        Self {
            tabs: vec![tab("tab1", "Tab 1"), tab("tab2", "Tab 2")],
            active_tab: "tab1".into(),
            visible: true,
            extra: PropMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomFunctionProps {
    pub html: String,
    pub css: String,
    pub javascript: String,
    pub props: PropMap,
    pub visible: bool,
    pub height: f64,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Default for CustomFunctionProps {
    fn default() -> Self {
        Self {
            html: "<div class=\"custom-component\">\n  <h3>Custom Component</h3>\n  <p>Edit the HTML, CSS, and JavaScript to create your custom component</p>\n</div>".into(),
            css: ".custom-component {\n  padding: 20px;\n  background: #f0f0f0;\n  border-radius: 8px;\n}\n\n.custom-component h3 {\n  margin: 0 0 10px 0;\n  color: #333;\n}".into(),
            javascript: "// Your custom JavaScript code here\nconsole.log(\"Custom component loaded\");".into(),
            props: PropMap::new(),
            visible: true,
            height: 300.0,
            extra: PropMap::new(),
        }
    }
}

// ─── The tagged union ────────────────────────────────────────────────────

macro_rules! component_props {
    ($($variant:ident($props:ident)),* $(,)?) => {
        /// A component's props, one strongly-typed variant per built-in kind.
        #[derive(Debug, Clone, PartialEq)]
        pub enum ComponentProps {
            $($variant($props),)*
            /// Props of a kind with no registry entry, kept as a raw map.
            Other(PropMap),
        }

        impl ComponentProps {
            /// Fresh default props for `kind`.
            pub fn defaults(kind: &ComponentKind) -> Self {
                match kind {
                    $(ComponentKind::$variant => Self::$variant($props::default()),)*
                    ComponentKind::Other(_) => Self::Other(PropMap::new()),
                }
            }

            /// Build typed props for `kind` from a raw map. Missing keys take
            /// the kind's defaults; unknown keys land in the variant's `extra`.
            pub fn from_map(kind: &ComponentKind, map: PropMap) -> Result<Self, serde_json::Error> {
                Ok(match kind {
                    $(ComponentKind::$variant => {
                        Self::$variant(serde_json::from_value(Value::Object(map))?)
                    })*
                    ComponentKind::Other(_) => Self::Other(map),
                })
            }

            /// Flatten back into a raw map in field declaration order.
            pub fn to_map(&self) -> PropMap {
                let value = match self {
                    $(Self::$variant(props) => serde_json::to_value(props),)*
                    Self::Other(map) => return map.clone(),
                };
                match value {
                    Ok(Value::Object(map)) => map,
                    Ok(other) => {
                        log::error!("props serialized to a non-object: {other}");
                        PropMap::new()
                    }
                    Err(err) => {
                        log::error!("props failed to serialize: {err}");
                        PropMap::new()
                    }
                }
            }
        }
    };
}

component_props! {
    Button(ButtonProps),
    Input(InputProps),
    Text(TextProps),
    Image(ImageProps),
    Table(TableProps),
    Select(SelectProps),
    Checkbox(CheckboxProps),
    Radio(RadioProps),
    Switch(SwitchProps),
    Slider(SliderProps),
    DatePicker(DatePickerProps),
    FileUpload(FileUploadProps),
    Chart(ChartProps),
    List(ListProps),
    Container(ContainerProps),
    Modal(ModalProps),
    Tabs(TabsProps),
    CustomFunction(CustomFunctionProps),
}

impl ComponentProps {
    /// Read a single prop by key.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Self::Other(map) => map.get(key).cloned(),
            _ => self.to_map().remove(key),
        }
    }

    /// Write a single prop by key. The value must fit the variant's field
    /// type; keys the variant does not declare are kept as extras.
    pub fn set(&mut self, kind: &ComponentKind, key: &str, value: Value) -> Result<(), serde_json::Error> {
        if let Self::Other(map) = self {
            map.insert(key.to_string(), value);
            return Ok(());
        }
        let mut map = self.to_map();
        map.insert(key.to_string(), value);
        *self = Self::from_map(kind, map)?;
        Ok(())
    }

    /// Build props from stored data. Unlike [`Self::from_map`] this never
    /// fails: keys are applied one at a time, a value that does not fit its
    /// field is coerced when the intent is clear (`12.5` for an integer field
    /// becomes `13`, `"true"` becomes `true`), and anything else leaves the
    /// field at its default and is dropped with a warning.
    pub fn from_stored(kind: &ComponentKind, map: PropMap) -> Self {
        if !kind.is_builtin() {
            return Self::Other(map);
        }
        if let Ok(props) = Self::from_map(kind, map.clone()) {
            return props;
        }
        let mut props = Self::defaults(kind);
        for (key, value) in map {
            if props.set(kind, &key, value.clone()).is_ok() {
                continue;
            }
            let coerced = stored_coercions(&value)
                .into_iter()
                .any(|candidate| props.set(kind, &key, candidate).is_ok());
            if coerced {
                log::debug!("coerced stored prop `{key}` = {value} on {kind}");
            } else {
                log::warn!("dropping stored prop `{key}` = {value} on {kind}: does not fit the field");
            }
        }
        props
    }

    /// The `visible` flag shared by every built-in kind. Raw props default to visible.
    pub fn visible(&self) -> bool {
        self.get("visible").and_then(|v| v.as_bool()).unwrap_or(true)
    }
}

impl Serialize for ComponentProps {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// Alternatives for a stored value that failed to decode, tried in order.
fn stored_coercions(value: &Value) -> Vec<Value> {
    let mut out = Vec::new();
    match value {
        Value::Number(n) => {
            if let Some(f) = n.as_f64()
                && f.is_finite()
            {
                let rounded = f.round();
                if rounded >= 0.0 && rounded <= u64::MAX as f64 {
                    out.push(Value::from(rounded as u64));
                } else if rounded >= i64::MIN as f64 {
                    out.push(Value::from(rounded as i64));
                }
            }
            out.push(Value::String(n.to_string()));
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                out.push(Value::from(n));
            }
            if let Ok(f) = trimmed.parse::<f64>()
                && f.is_finite()
            {
                out.push(Value::from(f));
                out.push(Value::from(f.round() as i64));
            }
            match trimmed {
                "true" => out.push(Value::Bool(true)),
                "false" => out.push(Value::Bool(false)),
                _ => {}
            }
        }
        Value::Bool(b) => out.push(Value::String(b.to_string())),
        _ => {}
    }
    out
}

pub mod binding;
pub mod canvas;
pub mod codegen;
pub mod error;
pub mod id;
pub mod model;
pub mod persist;
pub mod props;
pub mod registry;

pub use binding::{BoundEditor, CodeSlot, EditorWidget, apply_custom_code, apply_property_edit, apply_style_edit, editors_for};
pub use canvas::{CanvasConfig, CanvasState, DropAnchor, hit_test, hit_test_background};
pub use codegen::{GeneratedCode, HtmlExport, export_html, generate};
pub use error::{BindingError, PersistenceError, UnknownKindError};
pub use id::{ComponentId, PageId, RecordId};
pub use model::*;
pub use persist::{FileStore, KvStore, MemoryStore, STORAGE_KEY};
pub use props::{ComponentKind, ComponentProps, PropMap};
pub use registry::{Category, ComponentDefinition, EditorType, PropertySchemaEntry, Registry, registry};

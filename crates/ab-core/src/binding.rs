//! Property binding: schema-driven editors over a component instance.
//!
//! Edits are functional. Each `apply_*` call returns a new instance and leaves
//! the input untouched, so callers commit the result (and persist) in one step.

use crate::error::{BindingError, UnknownKindError};
use crate::model::ComponentInstance;
use crate::registry::{EditorType, PropertySchemaEntry, registry};
use serde_json::{Number, Value};
use winnow::ascii::{float, multispace0};
use winnow::combinator::terminated;
use winnow::prelude::*;
use winnow::token::take_while;

/// The widget a property is edited with.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorWidget {
    Toggle,
    /// Restricted to the listed options.
    Select(Vec<&'static str>),
    Color,
    Number,
    Text,
    TextArea,
    Code,
    Url,
}

impl EditorWidget {
    fn for_entry(entry: &PropertySchemaEntry) -> Self {
        match entry.editor() {
            EditorType::Boolean => Self::Toggle,
            EditorType::Select => Self::Select(entry.options().unwrap_or_default().to_vec()),
            EditorType::Color => Self::Color,
            EditorType::Number => Self::Number,
            EditorType::Text => Self::Text,
            EditorType::TextArea => Self::TextArea,
            EditorType::Code => Self::Code,
            EditorType::Url => Self::Url,
        }
    }
}

/// A schema entry paired with the instance's current value for it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundEditor {
    pub entry: &'static PropertySchemaEntry,
    pub widget: EditorWidget,
    pub value: Value,
}

/// Editors for every schema entry of the instance's kind, in schema order.
/// Values come from the instance's props, falling back to the entry default.
pub fn editors_for(instance: &ComponentInstance) -> Result<Vec<BoundEditor>, UnknownKindError> {
    let def = registry().lookup(&instance.kind)?;
    let props = instance.props.to_map();
    Ok(def
        .property_schema
        .iter()
        .map(|entry| {
            let value = props
                .get(entry.key())
                .or(entry.default_value())
                .cloned()
                .unwrap_or(Value::Null);
            BoundEditor {
                entry,
                widget: EditorWidget::for_entry(entry),
                value,
            }
        })
        .collect())
}

/// Set one prop. The value is coerced by the entry's editor type; keys with
/// no schema entry are stored as-is.
pub fn apply_property_edit(instance: &ComponentInstance, key: &str, value: Value) -> Result<ComponentInstance, BindingError> {
    let def = registry().lookup(&instance.kind)?;
    let value = match def.schema_entry(key) {
        Some(entry) => coerce(entry, key, value)?,
        None => value,
    };
    let mut next = instance.clone();
    next.props
        .set(&instance.kind, key, value)
        .map_err(|e| BindingError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
    log::trace!("{}: prop {key} updated", instance.id);
    Ok(next)
}

/// Set or remove (`None`) one style entry. Keys keep their camelCase form.
pub fn apply_style_edit(instance: &ComponentInstance, key: &str, value: Option<Value>) -> ComponentInstance {
    let mut next = instance.clone();
    match value {
        Some(v) => {
            next.style.insert(key.to_string(), v);
        }
        None => {
            next.style.shift_remove(key);
        }
    }
    next
}

/// The user-authored code slots on an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSlot {
    Css,
    Js,
    Html,
}

impl std::str::FromStr for CodeSlot {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "css" | "customcss" => Ok(Self::Css),
            "js" | "javascript" | "customjs" => Ok(Self::Js),
            "html" | "customhtml" => Ok(Self::Html),
            _ => Err(BindingError::UnknownSlot(s.to_string())),
        }
    }
}

/// Store custom code verbatim. An empty string clears the slot.
pub fn apply_custom_code(instance: &ComponentInstance, slot: CodeSlot, text: &str) -> ComponentInstance {
    let mut next = instance.clone();
    let code = (!text.is_empty()).then(|| text.to_string());
    match slot {
        CodeSlot::Css => next.custom_css = code,
        CodeSlot::Js => next.custom_js = code,
        CodeSlot::Html => next.custom_html = code,
    }
    next
}

// ─── Coercion ────────────────────────────────────────────────────────────

fn coerce(entry: &PropertySchemaEntry, key: &str, value: Value) -> Result<Value, BindingError> {
    match entry.editor() {
        EditorType::Number => coerce_number(key, value),
        EditorType::Boolean => coerce_bool(key, value),
        EditorType::Select => {
            let options = entry.options().unwrap_or_default();
            let text = match &value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => other.to_string(),
            };
            if options.contains(&text.as_str()) {
                Ok(Value::String(text))
            } else {
                Err(BindingError::NotAnOption {
                    key: key.to_string(),
                    value: text,
                })
            }
        }
        // Colors follow a #RGB / #RRGGBB policy that is not enforced.
        EditorType::Color
        | EditorType::Text
        | EditorType::TextArea
        | EditorType::Code
        | EditorType::Url => Ok(value),
    }
}

fn coerce_bool(key: &str, value: Value) -> Result<Value, BindingError> {
    match &value {
        Value::Bool(_) => Ok(value),
        Value::String(s) if s == "true" => Ok(Value::Bool(true)),
        Value::String(s) if s == "false" => Ok(Value::Bool(false)),
        other => Err(BindingError::InvalidValue {
            key: key.to_string(),
            reason: format!("expected a boolean, got {other}"),
        }),
    }
}

fn coerce_number(key: &str, value: Value) -> Result<Value, BindingError> {
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric.parse(s.trim()).ok(),
        _ => None,
    };
    match parsed.filter(|n| n.is_finite()) {
        Some(n) => Ok(number_value(n)),
        None => Err(BindingError::NotANumber {
            key: key.to_string(),
            value: match value {
                Value::String(s) => s,
                other => other.to_string(),
            },
        }),
    }
}

/// A number with an optional trailing CSS unit, e.g. `12`, `-0.5`, `16px`, `50%`.
fn parse_numeric(input: &mut &str) -> ModalResult<f64> {
    terminated(
        float,
        (
            take_while(0.., |c: char| c.is_ascii_alphabetic() || c == '%'),
            multispace0,
        ),
    )
    .parse_next(input)
}

/// Integral values are stored as integers so integer-typed props accept them.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasState;
    use crate::props::ComponentKind;
    use kurbo::Point;
    use serde_json::json;

    fn place(kind: ComponentKind) -> ComponentInstance {
        CanvasState::default().place_new(&kind, Point::new(200.0, 200.0)).unwrap()
    }

    #[test]
    fn editors_follow_schema_order_and_defaults() {
        let input = place(ComponentKind::Input);
        let editors = editors_for(&input).unwrap();
        let keys: Vec<_> = editors.iter().map(|e| e.entry.key()).collect();
        assert_eq!(keys[..3], ["label", "placeholder", "type"]);
        assert_eq!(editors[0].value, json!("Input"));
        assert!(matches!(editors[2].widget, EditorWidget::Select(ref o) if o.contains(&"email")));
    }

    #[test]
    fn property_edit_is_functional() {
        let button = place(ComponentKind::Button);
        let edited = apply_property_edit(&button, "label", json!("Submit")).unwrap();
        assert_eq!(edited.props.get("label"), Some(json!("Submit")));
        assert_eq!(button.props.get("label"), Some(json!("Button")));
        assert_eq!(edited.id, button.id);
    }

    #[test]
    fn number_edits_are_coerced() {
        let input = place(ComponentKind::Input);
        let edited = apply_property_edit(&input, "maxLength", json!("250")).unwrap();
        assert_eq!(edited.props.get("maxLength"), Some(json!(250)));

        let image = place(ComponentKind::Image);
        let edited = apply_property_edit(&image, "opacity", json!("0.5")).unwrap();
        assert_eq!(edited.props.get("opacity"), Some(json!(0.5)));

        let err = apply_property_edit(&image, "opacity", json!("very")).unwrap_err();
        assert!(matches!(err, BindingError::NotANumber { .. }));
    }

    #[test]
    fn numbers_accept_css_units() {
        assert_eq!(parse_numeric.parse("16px").ok(), Some(16.0));
        assert_eq!(parse_numeric.parse("50%").ok(), Some(50.0));
        assert!(parse_numeric.parse("px16").is_err());
    }

    #[test]
    fn select_is_restricted_to_options() {
        let button = place(ComponentKind::Button);
        let edited = apply_property_edit(&button, "variant", json!("danger")).unwrap();
        assert_eq!(edited.props.get("variant"), Some(json!("danger")));
        let err = apply_property_edit(&button, "variant", json!("rainbow")).unwrap_err();
        assert_eq!(
            err,
            BindingError::NotAnOption {
                key: "variant".into(),
                value: "rainbow".into()
            }
        );
    }

    #[test]
    fn invalid_color_passes_through() {
        let text = place(ComponentKind::Text);
        let edited = apply_property_edit(&text, "color", json!("not-a-color")).unwrap();
        assert_eq!(edited.props.get("color"), Some(json!("not-a-color")));
    }

    #[test]
    fn keys_outside_schema_are_kept() {
        let text = place(ComponentKind::Text);
        let edited = apply_property_edit(&text, "dataTestId", json!("hero")).unwrap();
        assert_eq!(edited.props.get("dataTestId"), Some(json!("hero")));
    }

    #[test]
    fn style_edit_inserts_and_removes() {
        let button = place(ComponentKind::Button);
        let styled = apply_style_edit(&button, "fontSize", Some(json!("18px")));
        assert_eq!(styled.style.get("fontSize"), Some(&json!("18px")));
        let cleared = apply_style_edit(&styled, "border", None);
        assert!(cleared.style.get("border").is_none());
    }

    #[test]
    fn custom_code_is_verbatim() {
        let button = place(ComponentKind::Button);
        let code = "console.log('<hi>')";
        let edited = apply_custom_code(&button, "js".parse().unwrap(), code);
        assert_eq!(edited.custom_js.as_deref(), Some(code));
        assert!("python".parse::<CodeSlot>().is_err());
    }
}

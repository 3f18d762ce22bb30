//! Code generation: Document → standalone HTML, CSS, and JavaScript.
//!
//! Output is a pure function of the document. Components are emitted in page
//! order and every map in insertion order, so the same document always yields
//! byte-identical code. User-authored HTML and CSS are inlined verbatim; user
//! script is wrapped in a `try`/`catch` that logs to the console.

use crate::id::PageId;
use crate::model::{ApiEndpoint, ComponentInstance, Document, Page};
use crate::props::{ComponentProps, PropMap};
use crate::registry::registry;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;

/// The three generated sources for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub html: String,
    pub css: String,
    pub javascript: String,
}

/// A single self-contained HTML file with inline style and script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlExport {
    pub file_name: String,
    pub contents: String,
}

/// Generate code for `page_id`. `None` if the page does not exist.
#[must_use]
pub fn generate(doc: &Document, page_id: PageId) -> Option<GeneratedCode> {
    let page = doc.page(page_id)?;
    let css = emit_css(doc, page);
    let javascript = emit_javascript(doc, page);
    let html = emit_html(page, &Assets::Linked);
    Some(GeneratedCode { html, css, javascript })
}

/// Generate a single-file export of `page_id`, named after the page.
#[must_use]
pub fn export_html(doc: &Document, page_id: PageId) -> Option<HtmlExport> {
    let page = doc.page(page_id)?;
    let css = emit_css(doc, page);
    let javascript = emit_javascript(doc, page);
    let contents = emit_html(page, &Assets::Inline { css: &css, javascript: &javascript });
    Some(HtmlExport {
        file_name: export_file_name(&page.name),
        contents,
    })
}

fn export_file_name(page_name: &str) -> String {
    let stem: String = page_name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect();
    if stem.is_empty() {
        "page.html".to_string()
    } else {
        format!("{stem}.html")
    }
}

// ─── HTML ────────────────────────────────────────────────────────────────

enum Assets<'a> {
    Linked,
    Inline { css: &'a str, javascript: &'a str },
}

fn emit_html(page: &Page, assets: &Assets<'_>) -> String {
    let mut out = String::with_capacity(2048);
    let title = page.seo.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(&page.name);
    let description = page.seo.description.as_deref().unwrap_or("");

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("    <meta charset=\"UTF-8\">\n");
    out.push_str("    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    let _ = writeln!(out, "    <title>{}</title>", escape_html(title));
    let _ = writeln!(out, "    <meta name=\"description\" content=\"{}\">", escape_html(description));
    match assets {
        Assets::Linked => out.push_str("    <link rel=\"stylesheet\" href=\"styles.css\">\n"),
        Assets::Inline { css, .. } => {
            let _ = writeln!(out, "    <style>\n{}\n    </style>", close_tag_safe(css, "style"));
        }
    }
    out.push_str("</head>\n<body>\n    <div id=\"app\">\n");

    for component in &page.components {
        emit_component_html(&mut out, component);
    }

    out.push_str("    </div>\n");
    match assets {
        Assets::Linked => out.push_str("    <script src=\"script.js\"></script>\n"),
        Assets::Inline { javascript, .. } => {
            let _ = writeln!(out, "    <script>\n{}\n    </script>", close_tag_safe(javascript, "script"));
        }
    }
    out.push_str("</body>\n</html>\n");
    out
}

/// Break up every `</tag` (any case) in text inlined inside `<tag>` so user
/// code cannot end the element early. `<\/tag` means the same thing in
/// JavaScript strings and is inert in CSS.
fn close_tag_safe(text: &str, tag: &str) -> String {
    let needle = format!("</{tag}");
    let lower = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (at, _) in lower.match_indices(&needle) {
        out.push_str(&text[last..at]);
        out.push_str("<\\/");
        last = at + 2;
    }
    out.push_str(&text[last..]);
    out
}

fn emit_component_html(out: &mut String, component: &ComponentInstance) {
    let _ = writeln!(
        out,
        "        <div class=\"component component-{}\" style=\"position: absolute; left: {}px; top: {}px; width: {}px; height: {}px;\">",
        escape_html(component.kind.as_str()),
        format_num(component.x),
        format_num(component.y),
        format_num(component.width),
        format_num(component.height),
    );
    let fragment = match registry().lookup(&component.kind) {
        Ok(def) => (def.fragment)(component),
        Err(err) => {
            log::debug!("{}: {err}, emitting placeholder", component.id);
            fragments::placeholder(component)
        }
    };
    let _ = writeln!(out, "            {fragment}");
    if let Some(html) = component.custom_html.as_deref().filter(|h| !h.is_empty()) {
        let _ = writeln!(out, "            {html}");
    }
    out.push_str("        </div>\n");
}

// ─── CSS ─────────────────────────────────────────────────────────────────

fn emit_css(doc: &Document, page: &Page) -> String {
    let theme = &doc.settings.theme;
    let mut out = String::with_capacity(1024);
    out.push_str("/* Generated CSS */\n");
    out.push_str("* {\n    margin: 0;\n    padding: 0;\n    box-sizing: border-box;\n}\n\n");
    let _ = writeln!(
        out,
        "body {{\n    font-family: {};\n    background-color: {};\n    color: {};\n}}\n",
        theme.fonts.primary, theme.colors.background, theme.colors.text
    );
    out.push_str("#app {\n    position: relative;\n    min-height: 100vh;\n}\n\n");
    out.push_str(".component {\n    position: absolute;\n}\n");

    for component in &page.components {
        out.push('\n');
        emit_component_css(&mut out, component);
    }
    out
}

fn emit_component_css(out: &mut String, component: &ComponentInstance) {
    let _ = writeln!(out, "[data-component-id=\"{}\"] {{", css_attr(component.id.as_str()));
    for (key, value) in &component.style {
        let _ = writeln!(out, "    {}: {};", kebab_case(key), css_value(value));
    }
    out.push_str("}\n");
    if let ComponentProps::CustomFunction(custom) = &component.props
        && !custom.css.is_empty()
    {
        let _ = writeln!(out, "{}", custom.css);
    }
    if let Some(css) = component.custom_css.as_deref().filter(|c| !c.is_empty()) {
        let _ = writeln!(out, "{css}");
    }
}

/// `backgroundColor` → `background-color`: a hyphen before each uppercase
/// letter, then lowercased.
pub fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_uppercase() {
            out.push('-');
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn css_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn css_attr(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

// ─── JavaScript ──────────────────────────────────────────────────────────

fn emit_javascript(doc: &Document, page: &Page) -> String {
    let mut out = String::with_capacity(2048);
    out.push_str("// Generated JavaScript\n");
    out.push_str("class AppBuilder {\n");
    out.push_str("    constructor() {\n");
    let _ = writeln!(out, "        this.state = {};", indent_tail(&to_json(&doc.global_state), 8));
    out.push_str("        this.init();\n    }\n\n");

    out.push_str("    init() {\n        this.bindEvents();\n        this.runCustomScripts();\n        this.loadData();\n    }\n\n");

    out.push_str("    bindEvents() {\n        // Event bindings for components\n");
    for component in &page.components {
        let Some(events) = &component.events else {
            continue;
        };
        for (event, handler) in events {
            let handler = match handler {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let _ = writeln!(
                out,
                "        document.querySelector('[data-component-id=\"{}\"]')?.addEventListener('{}', {handler});",
                js_str(component.id.as_str()),
                js_str(event),
            );
        }
    }
    out.push_str("    }\n\n");

    out.push_str("    runCustomScripts() {\n        // User scripts\n");
    for component in &page.components {
        for script in user_scripts(component) {
            emit_guarded_script(&mut out, component, script);
        }
    }
    out.push_str("    }\n\n");

    out.push_str("    async loadData() {\n        // API calls\n");
    let calls: Vec<String> = doc.apis.iter().map(emit_api_call).collect();
    out.push_str(&calls.join("\n"));
    if !calls.is_empty() {
        out.push('\n');
    }
    out.push_str("    }\n\n");

    out.push_str("    updateComponent(id, data) {\n");
    out.push_str("        const element = document.querySelector(`[data-component-id=\"${id}\"]`);\n");
    out.push_str("        if (element) {\n            this.renderComponent(element, data);\n        }\n    }\n\n");
    out.push_str("    renderComponent(element, data) {\n        element.textContent = JSON.stringify(data);\n    }\n");
    out.push_str("}\n\n");

    out.push_str("// Initialize the application\n");
    out.push_str("document.addEventListener('DOMContentLoaded', () => {\n    new AppBuilder();\n});\n");
    out
}

fn user_scripts(component: &ComponentInstance) -> impl Iterator<Item = &str> {
    let custom_fn = match &component.props {
        ComponentProps::CustomFunction(custom) => Some(custom.javascript.as_str()),
        _ => None,
    };
    custom_fn
        .into_iter()
        .chain(component.custom_js.as_deref())
        .filter(|s| !s.trim().is_empty())
}

fn emit_guarded_script(out: &mut String, component: &ComponentInstance, script: &str) {
    let id = js_str(component.id.as_str());
    let _ = writeln!(out, "        // {id}");
    out.push_str("        try {\n");
    for line in script.lines() {
        if line.is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "            {line}");
        }
    }
    out.push_str("        } catch (error) {\n");
    let _ = writeln!(out, "            console.error('Error in custom script for {id}:', error);");
    out.push_str("        }\n");
}

fn emit_api_call(api: &ApiEndpoint) -> String {
    let mut out = String::new();
    let name = js_str(&api.name);
    let _ = writeln!(out, "        // {name}");
    out.push_str("        try {\n");
    let _ = writeln!(out, "            const response = await fetch('{}', {{", js_str(&api.url));
    let _ = writeln!(out, "                method: '{}',", api.method.as_str());
    let _ = writeln!(out, "                headers: {}", indent_tail(&to_json(&api.headers), 16));
    out.push_str("            });\n");
    out.push_str("            const data = await response.json();\n");
    let _ = writeln!(out, "            this.state['{}'] = data;", js_str(&state_key(&api.name)));
    out.push_str("        } catch (error) {\n");
    let _ = writeln!(out, "            console.error('Error loading {name}:', error);");
    out.push_str("        }");
    out
}

/// State-bag key for an API's result: lowercased, whitespace runs → `_`.
pub fn state_key(api_name: &str) -> String {
    api_name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Pretty JSON with four-space indentation.
fn to_json(map: &PropMap) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if map.serialize(&mut ser).is_err() {
        return "{}".to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| "{}".to_string())
}

/// Indent every line after the first by `n` spaces.
fn indent_tail(text: &str, n: usize) -> String {
    let pad = " ".repeat(n);
    text.lines()
        .enumerate()
        .map(|(i, line)| if i == 0 { line.to_string() } else { format!("{pad}{line}") })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape for a single-quoted JS string literal.
fn js_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '<' => out.push_str("\\u003c"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

// ─── Shared helpers ──────────────────────────────────────────────────────

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn format_num(n: f64) -> String {
    if n == n.floor() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ─── Fragments ───────────────────────────────────────────────────────────

/// Per-kind inner HTML writers, referenced from the registry.
pub(crate) mod fragments {
    use super::{escape_html, format_num};
    use crate::model::ComponentInstance;
    use crate::props::{ComponentProps, SelectOption};
    use serde_json::Value;
    use std::fmt::Write;

    fn id_attr(c: &ComponentInstance) -> String {
        format!("data-component-id=\"{}\"", escape_html(c.id.as_str()))
    }

    fn flag(on: bool, name: &str) -> String {
        if on { format!(" {name}") } else { String::new() }
    }

    fn display(value: &Value) -> String {
        match value {
            Value::String(s) => escape_html(s),
            Value::Null => String::new(),
            other => escape_html(&other.to_string()),
        }
    }

    /// Shown for kinds with no definition, and for props that do not match their kind.
    pub fn placeholder(c: &ComponentInstance) -> String {
        format!(
            "<div {}>Unknown component: {}</div>",
            id_attr(c),
            escape_html(c.kind.as_str())
        )
    }

    pub fn button(c: &ComponentInstance) -> String {
        let ComponentProps::Button(p) = &c.props else {
            return placeholder(c);
        };
        let title = if p.tooltip.is_empty() {
            String::new()
        } else {
            format!(" title=\"{}\"", escape_html(&p.tooltip))
        };
        format!(
            "<button {}{title}{}>{}</button>",
            id_attr(c),
            flag(p.disabled, "disabled"),
            escape_html(&p.label)
        )
    }

    pub fn input(c: &ComponentInstance) -> String {
        let ComponentProps::Input(p) = &c.props else {
            return placeholder(c);
        };
        format!(
            "<input {} type=\"{}\" placeholder=\"{}\"{}{}{} />",
            id_attr(c),
            p.input_type.as_str(),
            escape_html(&p.placeholder),
            flag(p.required, "required"),
            flag(p.disabled, "disabled"),
            flag(p.readonly, "readonly"),
        )
    }

    pub fn text(c: &ComponentInstance) -> String {
        let ComponentProps::Text(p) = &c.props else {
            return placeholder(c);
        };
        // rich text is authored HTML
        let content = if p.rich_text { p.content.clone() } else { escape_html(&p.content) };
        format!("<div {}>{content}</div>", id_attr(c))
    }

    pub fn image(c: &ComponentInstance) -> String {
        let ComponentProps::Image(p) = &c.props else {
            return placeholder(c);
        };
        format!(
            "<img {} src=\"{}\" alt=\"{}\" style=\"object-fit: {};\" />",
            id_attr(c),
            escape_html(&p.src),
            escape_html(&p.alt),
            p.fit.as_str()
        )
    }

    pub fn table(c: &ComponentInstance) -> String {
        let ComponentProps::Table(p) = &c.props else {
            return placeholder(c);
        };
        let columns: Vec<_> = p.columns.iter().filter(|col| col.visible).collect();
        let mut out = format!("<table {}><thead><tr>", id_attr(c));
        for col in &columns {
            let _ = write!(out, "<th>{}</th>", escape_html(&col.name));
        }
        out.push_str("</tr></thead><tbody>");
        for row in &p.data {
            out.push_str("<tr>");
            for col in &columns {
                let cell = row.get(&col.key).map(display).unwrap_or_default();
                let _ = write!(out, "<td>{cell}</td>");
            }
            out.push_str("</tr>");
        }
        out.push_str("</tbody></table>");
        out
    }

    fn options_html(options: &[SelectOption]) -> String {
        options
            .iter()
            .map(|o| {
                format!(
                    "<option value=\"{}\"{}>{}</option>",
                    escape_html(&o.value),
                    flag(o.disabled.unwrap_or(false), "disabled"),
                    escape_html(&o.label)
                )
            })
            .collect()
    }

    pub fn select(c: &ComponentInstance) -> String {
        let ComponentProps::Select(p) = &c.props else {
            return placeholder(c);
        };
        format!(
            "<select {}{}{}{}><option value=\"\">{}</option>{}</select>",
            id_attr(c),
            flag(p.multiple, "multiple"),
            flag(p.required, "required"),
            flag(p.disabled, "disabled"),
            escape_html(&p.placeholder),
            options_html(&p.options)
        )
    }

    pub fn checkbox(c: &ComponentInstance) -> String {
        let ComponentProps::Checkbox(p) = &c.props else {
            return placeholder(c);
        };
        format!(
            "<label {}><input type=\"checkbox\"{}{}{} /> {}</label>",
            id_attr(c),
            flag(p.checked, "checked"),
            flag(p.required, "required"),
            flag(p.disabled, "disabled"),
            escape_html(&p.label)
        )
    }

    pub fn radio(c: &ComponentInstance) -> String {
        let ComponentProps::Radio(p) = &c.props else {
            return placeholder(c);
        };
        let name = escape_html(c.id.as_str());
        let mut out = format!("<fieldset {}><legend>{}</legend>", id_attr(c), escape_html(&p.label));
        for o in &p.options {
            let _ = write!(
                out,
                "<label><input type=\"radio\" name=\"{name}\" value=\"{}\"{}{} /> {}</label>",
                escape_html(&o.value),
                flag(o.value == p.value, "checked"),
                flag(p.disabled, "disabled"),
                escape_html(&o.label)
            );
        }
        out.push_str("</fieldset>");
        out
    }

    pub fn switch(c: &ComponentInstance) -> String {
        let ComponentProps::Switch(p) = &c.props else {
            return placeholder(c);
        };
        format!(
            "<label {}><input type=\"checkbox\" role=\"switch\"{}{} /> {}</label>",
            id_attr(c),
            flag(p.checked, "checked"),
            flag(p.disabled, "disabled"),
            escape_html(&p.label)
        )
    }

    pub fn slider(c: &ComponentInstance) -> String {
        let ComponentProps::Slider(p) = &c.props else {
            return placeholder(c);
        };
        format!(
            "<input {} type=\"range\" min=\"{}\" max=\"{}\" step=\"{}\" value=\"{}\"{} />",
            id_attr(c),
            format_num(p.min),
            format_num(p.max),
            format_num(p.step),
            format_num(p.value),
            flag(p.disabled, "disabled")
        )
    }

    pub fn date_picker(c: &ComponentInstance) -> String {
        let ComponentProps::DatePicker(p) = &c.props else {
            return placeholder(c);
        };
        format!(
            "<input {} type=\"date\" value=\"{}\"{}{} />",
            id_attr(c),
            escape_html(&p.value),
            flag(p.required, "required"),
            flag(p.disabled, "disabled")
        )
    }

    pub fn file_upload(c: &ComponentInstance) -> String {
        let ComponentProps::FileUpload(p) = &c.props else {
            return placeholder(c);
        };
        format!(
            "<input {} type=\"file\" accept=\"{}\"{}{} />",
            id_attr(c),
            escape_html(&p.accept),
            flag(p.multiple, "multiple"),
            flag(p.disabled, "disabled")
        )
    }

    pub fn chart(c: &ComponentInstance) -> String {
        let ComponentProps::Chart(p) = &c.props else {
            return placeholder(c);
        };
        format!(
            "<canvas {} data-chart-type=\"{}\"></canvas>",
            id_attr(c),
            escape_html(&p.chart_type)
        )
    }

    pub fn list(c: &ComponentInstance) -> String {
        let ComponentProps::List(p) = &c.props else {
            return placeholder(c);
        };
        let items: String = p.items.iter().map(|i| format!("<li>{}</li>", display(i))).collect();
        format!("<ul {}>{items}</ul>", id_attr(c))
    }

    pub fn container(c: &ComponentInstance) -> String {
        format!("<div {}></div>", id_attr(c))
    }

    pub fn modal(c: &ComponentInstance) -> String {
        let ComponentProps::Modal(p) = &c.props else {
            return placeholder(c);
        };
        format!(
            "<dialog {}{}><h2>{}</h2></dialog>",
            id_attr(c),
            flag(p.visible, "open"),
            escape_html(&p.title)
        )
    }

    pub fn tabs(c: &ComponentInstance) -> String {
        let ComponentProps::Tabs(p) = &c.props else {
            return placeholder(c);
        };
        let mut out = format!("<div {} role=\"tablist\">", id_attr(c));
        for tab in &p.tabs {
            let _ = write!(
                out,
                "<button role=\"tab\" aria-selected=\"{}\">{}</button>",
                tab.id == p.active_tab,
                escape_html(&tab.label)
            );
        }
        out.push_str("</div>");
        out
    }

    pub fn custom_function(c: &ComponentInstance) -> String {
        let ComponentProps::CustomFunction(p) = &c.props else {
            return placeholder(c);
        };
        format!("<div {}>{}</div>", id_attr(c), p.html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasState;
    use crate::id::{ComponentId, RecordId};
    use crate::model::HttpMethod;
    use crate::props::ComponentKind;
    use kurbo::{Point, Size};
    use serde_json::json;

    fn doc_with(components: Vec<ComponentInstance>) -> Document {
        let mut doc = Document::new();
        for c in components {
            doc.add_component(c);
        }
        doc
    }

    #[test]
    fn kebab_case_conversion() {
        assert_eq!(kebab_case("backgroundColor"), "background-color");
        assert_eq!(kebab_case("borderTopLeftRadius"), "border-top-left-radius");
        assert_eq!(kebab_case("color"), "color");
    }

    #[test]
    fn state_key_slugifies() {
        assert_eq!(state_key("Get  Users\tList"), "get_users_list");
    }

    #[test]
    fn html_wraps_each_component() {
        let button = CanvasState::default()
            .place_new(&ComponentKind::Button, Point::new(100.0, 100.0))
            .unwrap();
        let doc = doc_with(vec![button.clone()]);
        let code = generate(&doc, doc.current_page_id).unwrap();
        assert!(code.html.contains("<title>Home Page</title>"));
        assert!(code.html.contains(
            "style=\"position: absolute; left: 40px; top: 80px; width: 120px; height: 40px;\""
        ));
        assert!(code.html.contains(&format!("<button data-component-id=\"{}\">Button</button>", button.id)));
        assert!(code.html.contains("<link rel=\"stylesheet\" href=\"styles.css\">"));
    }

    #[test]
    fn css_has_theme_and_component_rules() {
        let button = CanvasState::default()
            .place_new(&ComponentKind::Button, Point::new(100.0, 100.0))
            .unwrap();
        let doc = doc_with(vec![button.clone()]);
        let code = generate(&doc, doc.current_page_id).unwrap();
        assert!(code.css.contains("font-family: Inter, sans-serif;"));
        assert!(code.css.contains(&format!(
            "[data-component-id=\"{}\"] {{\n    background-color: transparent;\n    border: none;\n}}",
            button.id
        )));
    }

    #[test]
    fn unknown_kind_becomes_placeholder() {
        let kind = ComponentKind::parse("hologram");
        let mut ghost = ComponentInstance::new(
            ComponentId::intern("ghost"),
            kind.clone(),
            ComponentProps::defaults(&kind),
            PropMap::new(),
            Size::new(10.0, 10.0),
        );
        ghost.style.insert("zIndex".into(), json!(3));
        let doc = doc_with(vec![ghost]);
        let code = generate(&doc, doc.current_page_id).unwrap();
        assert!(code.html.contains("<div data-component-id=\"ghost\">Unknown component: hologram</div>"));
        assert!(code.css.contains("z-index: 3;"));
    }

    #[test]
    fn events_and_apis_in_script() {
        let mut button = CanvasState::default()
            .place_new(&ComponentKind::Button, Point::new(100.0, 100.0))
            .unwrap();
        let mut events = PropMap::new();
        events.insert("click".into(), json!("() => alert('hi')"));
        button.events = Some(events);
        let mut doc = doc_with(vec![button.clone()]);
        let mut api = ApiEndpoint::new(RecordId::intern("api-users"), "Get Users", HttpMethod::Get, "https://api.example.com/users");
        api.headers.insert("Accept".into(), json!("application/json"));
        doc.apis.push(api);

        let js = generate(&doc, doc.current_page_id).unwrap().javascript;
        assert!(js.contains(&format!(
            "document.querySelector('[data-component-id=\"{}\"]')?.addEventListener('click', () => alert('hi'));",
            button.id
        )));
        assert!(js.contains("await fetch('https://api.example.com/users', {"));
        assert!(js.contains("this.state['get_users'] = data;"));
        assert!(js.contains("\"Accept\": \"application/json\""));
    }

    #[test]
    fn user_script_is_guarded() {
        let mut button = CanvasState::default()
            .place_new(&ComponentKind::Button, Point::new(100.0, 100.0))
            .unwrap();
        button.custom_js = Some("throw new Error('boom');".into());
        let doc = doc_with(vec![button]);
        let js = generate(&doc, doc.current_page_id).unwrap().javascript;
        assert!(js.contains("        try {\n            throw new Error('boom');\n        } catch (error) {"));
    }

    #[test]
    fn text_content_is_escaped() {
        let canvas = CanvasState::default();
        let text = canvas.place_new(&ComponentKind::Text, Point::new(300.0, 300.0)).unwrap();
        let text = crate::binding::apply_property_edit(&text, "content", json!("<b>&</b>")).unwrap();
        let doc = doc_with(vec![text]);
        let html = generate(&doc, doc.current_page_id).unwrap().html;
        assert!(html.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
    }

    #[test]
    fn single_file_export_inlines_assets() {
        let doc = Document::new();
        let export = export_html(&doc, doc.current_page_id).unwrap();
        assert_eq!(export.file_name, "Home.html");
        assert!(export.contents.contains("<style>\n/* Generated CSS */"));
        assert!(export.contents.contains("<script>\n// Generated JavaScript"));
        assert!(!export.contents.contains("styles.css"));
    }

    #[test]
    fn inline_export_cannot_close_its_own_tags() {
        let mut button = CanvasState::default()
            .place_new(&ComponentKind::Button, Point::new(100.0, 100.0))
            .unwrap();
        button.custom_js = Some("const tail = '</SCRIPT><img src=x>';".into());
        button.custom_css = Some("content: '</style>';".into());
        let doc = doc_with(vec![button]);
        let export = export_html(&doc, doc.current_page_id).unwrap().contents;
        assert!(export.contains(r"const tail = '<\/SCRIPT><img src=x>';"));
        assert!(export.contains(r"content: '<\/style>';"));
        assert_eq!(export.matches("</script>").count(), 1);
        assert_eq!(export.matches("</style>").count(), 1);

        // the linked script file is left as written
        let js = generate(&doc, doc.current_page_id).unwrap().javascript;
        assert!(js.contains("'</SCRIPT><img src=x>'"));
    }

    #[test]
    fn string_literals_escape_line_separators() {
        assert_eq!(js_str("a\u{2028}b\u{2029}c"), r"a\u2028b\u2029c");
        assert_eq!(js_str("it's <b>\n"), r"it\'s \u003cb>\n");

        let mut doc = Document::new();
        doc.apis.push(ApiEndpoint::new(
            RecordId::intern("api-sep"),
            "Feed",
            HttpMethod::Get,
            "https://api.example.com/feed\u{2028}x",
        ));
        let js = generate(&doc, doc.current_page_id).unwrap().javascript;
        assert!(js.contains(r"fetch('https://api.example.com/feed\u2028x'"));
        assert!(!js.contains('\u{2028}'));
    }

    #[test]
    fn generation_is_deterministic_and_pure() {
        let canvas = CanvasState::default();
        let doc = doc_with(vec![
            canvas.place_new(&ComponentKind::Input, Point::new(300.0, 300.0)).unwrap(),
            canvas.place_new(&ComponentKind::Table, Point::new(600.0, 600.0)).unwrap(),
        ]);
        let before = doc.clone();
        let a = generate(&doc, doc.current_page_id).unwrap();
        let b = generate(&doc, doc.current_page_id).unwrap();
        assert_eq!(a, b);
        assert_eq!(doc, before);
    }

    #[test]
    fn missing_page_generates_nothing() {
        let doc = Document::new();
        assert!(generate(&doc, PageId::intern("nope")).is_none());
    }
}

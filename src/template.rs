//! Rendering CV records through Jinja templates.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment, ErrorKind, HtmlEscape, State, Value};

use crate::config::PaperSize;
use crate::error::{Error, Result};
use crate::linkify::{linkify, linkify_with};
use crate::record::Record;

/// Template name used for inline sources passed to [`Renderer::render_str`].
const INLINE_TEMPLATE_NAME: &str = "inline.html";

/// Suffixes of templates that get HTML auto-escaping.
const HTML_SUFFIXES: &[&str] = &[".html", ".htm", ".xml", ".j2", ".jinja", ".jinja2"];

/// Renders records into HTML using templates from one directory.
///
/// Templates see every top-level field of the record plus three derived
/// variables:
///
/// - `paper_size`: the selector, `"a4"` or `"letter"`
/// - `page_size`: the CSS page size name, `"A4"` or `"letter"`
/// - `page_width`: the page width as a CSS length, `"210mm"` or `"216mm"`
///
/// and the `linkify` filter, which turns contact details into links.
pub struct Renderer {
    env: Environment<'static>,
    templates_dir: PathBuf,
}

impl Renderer {
    /// Create a renderer loading templates from `templates_dir`.
    ///
    /// The directory is not read until a template is requested.
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        let templates_dir = templates_dir.into();

        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(&templates_dir));
        env.set_auto_escape_callback(auto_escape_for);
        env.add_filter("linkify", linkify_filter);

        Self { env, templates_dir }
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Render the named template with `record`.
    ///
    /// # Errors
    ///
    /// - [`Error::TemplateNotFound`] if the template does not exist
    /// - [`Error::TemplateRender`] if it fails to parse or render, for
    ///   example when it reads an attribute of a field the record lacks
    pub fn render(&self, template_name: &str, record: &Record, paper_size: PaperSize) -> Result<String> {
        let template = self.env.get_template(template_name).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => Error::TemplateNotFound(template_name.to_string()),
            _ => render_error(&e),
        })?;

        tracing::debug!(template = template_name, %paper_size, "rendering template");
        template
            .render(context(record, paper_size))
            .map_err(|e| render_error(&e))
    }

    /// Render an inline template source with `record`.
    ///
    /// The source is treated as HTML and may include or extend templates
    /// from the template directory.
    pub fn render_str(&self, source: &str, record: &Record, paper_size: PaperSize) -> Result<String> {
        self.env
            .render_named_str(INLINE_TEMPLATE_NAME, source, context(record, paper_size))
            .map_err(|e| render_error(&e))
    }

    /// List the templates in the template directory, sorted by name.
    ///
    /// Names are relative to the directory and use `/` as separator, the
    /// same form [`Renderer::render`] accepts. Hidden files are skipped.
    pub fn templates(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        collect_templates(&self.templates_dir, "", &mut names)?;
        names.sort();
        Ok(names)
    }
}

/// Build the template namespace: the record's fields, then the derived
/// page variables, which take precedence over record fields of the same name.
fn context(record: &Record, paper_size: PaperSize) -> BTreeMap<String, Value> {
    let geometry = paper_size.geometry();

    let mut ctx: BTreeMap<String, Value> = record
        .iter()
        .map(|(key, value)| (key.clone(), Value::from_serialize(value)))
        .collect();
    ctx.insert("paper_size".into(), Value::from(paper_size.as_str()));
    ctx.insert("page_size".into(), Value::from(geometry.css_size_name));
    ctx.insert("page_width".into(), Value::from(geometry.css_width));
    ctx
}

fn linkify_filter(state: &State, value: Value) -> Value {
    linkify_value(value, matches!(state.auto_escape(), AutoEscape::Html))
}

/// The result is marked safe, so with `escape_html` set the text around and
/// inside the links is escaped here. Values already marked safe are trusted.
fn linkify_value(value: Value, escape_html: bool) -> Value {
    let Some(text) = value.as_str() else {
        return value;
    };
    let html = if escape_html && !value.is_safe() {
        linkify_with(text, escape_html_text)
    } else {
        linkify(text)
    };
    Value::from_safe_string(html)
}

fn escape_html_text(text: &str) -> Cow<'_, str> {
    Cow::Owned(HtmlEscape(text).to_string())
}

fn auto_escape_for(name: &str) -> AutoEscape {
    if HTML_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
        AutoEscape::Html
    } else {
        AutoEscape::None
    }
}

fn render_error(err: &minijinja::Error) -> Error {
    tracing::debug!("template error detail: {err:#}");
    Error::TemplateRender(err.to_string())
}

fn collect_templates(dir: &Path, prefix: &str, names: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if file_name.starts_with('.') {
            continue;
        }

        let name = format!("{prefix}{file_name}");
        if entry.file_type()?.is_dir() {
            collect_templates(&entry.path(), &format!("{name}/"), names)?;
        } else {
            names.push(name);
        }
    }
    Ok(())
}

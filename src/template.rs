//! Compilation of JSON templates into resolver trees.
//!
//! A template is an ordinary JSON document. String nodes of the form
//! `${json:NAME}` or `${json:NAME:KEY}` are placeholders; they are looked up
//! once, at compile time, and replaced by the resolver the lookup returns.
//! Every other node is kept as a literal.

use crate::error::ConfigError;
use crate::writer::JsonWriter;
use serde_json::Value;

const PLACEHOLDER_PREFIX: &str = "${json:";
const PLACEHOLDER_SUFFIX: &str = "}";

/// A pre-bound strategy writing one JSON value for an input.
pub trait Resolve<T: ?Sized> {
    fn resolve(&self, input: &T, writer: &mut dyn JsonWriter);

    /// Whether `resolve` would write something other than `null` or `""`.
    ///
    /// Objects consult this to drop members when empty-property exclusion is
    /// enabled.
    fn is_resolvable(&self, _input: &T) -> bool {
        true
    }
}

/// Placeholder reference parsed from a template string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    pub name: &'a str,
    pub key: Option<&'a str>,
}

impl<'a> Placeholder<'a> {
    /// Returns `Ok(None)` for strings that are not placeholders at all.
    pub fn parse(text: &'a str) -> Result<Option<Self>, ConfigError> {
        let Some(rest) = text.strip_prefix(PLACEHOLDER_PREFIX) else {
            return Ok(None);
        };
        let body = rest
            .strip_suffix(PLACEHOLDER_SUFFIX)
            .ok_or_else(|| ConfigError::MalformedPlaceholder(text.to_string()))?;
        let (name, key) = match body.split_once(':') {
            Some((name, key)) => (name, Some(key)),
            None => (body, None),
        };
        if name.is_empty() || key == Some("") || body.contains(['{', '}']) {
            return Err(ConfigError::MalformedPlaceholder(text.to_string()));
        }
        Ok(Some(Placeholder { name, key }))
    }
}

/// Compiled template mirroring the shape of the source JSON.
#[derive(Debug, Clone)]
pub enum TemplateNode<R> {
    Literal(Value),
    Array(Vec<TemplateNode<R>>),
    Object(Vec<(String, TemplateNode<R>)>),
    Resolver(R),
}

impl<R> TemplateNode<R> {
    /// Compile `template`, calling `lookup` once per placeholder.
    pub fn compile<F>(template: &Value, lookup: &mut F) -> Result<Self, ConfigError>
    where
        F: FnMut(Placeholder<'_>) -> Result<R, ConfigError>,
    {
        match template {
            Value::String(text) => match Placeholder::parse(text)? {
                Some(placeholder) => {
                    tracing::debug!(
                        resolver = placeholder.name,
                        key = ?placeholder.key,
                        "compiling template placeholder"
                    );
                    lookup(placeholder).map(TemplateNode::Resolver)
                }
                None => Ok(TemplateNode::Literal(template.clone())),
            },
            Value::Array(items) => items
                .iter()
                .map(|item| TemplateNode::compile(item, lookup))
                .collect::<Result<Vec<_>, _>>()
                .map(TemplateNode::Array),
            Value::Object(map) => map
                .iter()
                .map(|(key, item)| Ok((key.clone(), TemplateNode::compile(item, lookup)?)))
                .collect::<Result<Vec<_>, ConfigError>>()
                .map(TemplateNode::Object),
            other => Ok(TemplateNode::Literal(other.clone())),
        }
    }

    /// Write this node for `input`. With `exclude_empty`, object members whose
    /// value is not resolvable are skipped.
    pub fn render<T: ?Sized>(&self, input: &T, writer: &mut dyn JsonWriter, exclude_empty: bool)
    where
        R: Resolve<T>,
    {
        match self {
            TemplateNode::Literal(value) => writer.write_value(value),
            TemplateNode::Resolver(resolver) => resolver.resolve(input, writer),
            TemplateNode::Array(items) => {
                writer.start_array();
                for item in items {
                    item.render(input, writer, exclude_empty);
                }
                writer.end_array();
            }
            TemplateNode::Object(_) => {
                writer.start_object();
                self.render_fields(input, writer, exclude_empty);
                writer.end_object();
            }
        }
    }

    /// Write the members of an object node without the surrounding braces.
    /// Does nothing for other node kinds.
    pub fn render_fields<T: ?Sized>(&self, input: &T, writer: &mut dyn JsonWriter, exclude_empty: bool)
    where
        R: Resolve<T>,
    {
        if let TemplateNode::Object(fields) = self {
            for (key, item) in fields {
                if exclude_empty && !item.is_resolvable(input) {
                    continue;
                }
                writer.write_field_name(key);
                item.render(input, writer, exclude_empty);
            }
        }
    }

    pub fn is_resolvable<T: ?Sized>(&self, input: &T) -> bool
    where
        R: Resolve<T>,
    {
        match self {
            TemplateNode::Literal(Value::Null) => false,
            TemplateNode::Literal(Value::String(s)) => !s.is_empty(),
            TemplateNode::Literal(_) | TemplateNode::Array(_) | TemplateNode::Object(_) => true,
            TemplateNode::Resolver(resolver) => resolver.is_resolvable(input),
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, TemplateNode::Object(_))
    }
}

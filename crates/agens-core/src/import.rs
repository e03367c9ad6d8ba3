//! Planning the import of in-memory graphs.
//!
//! Each vertex or edge of an in-memory graph becomes an [`EntityPlan`]: the
//! label to create it with and the properties to store.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::Properties;
use crate::error::{AgensError, AgensResult};

/// Options shared by every import source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Label used when no label attribute applies.
    pub node_label: Option<String>,
    /// Attribute whose string value is the vertex label.
    pub node_label_attr: Option<String>,
    pub edge_label: Option<String>,
    pub edge_label_attr: Option<String>,
    /// Replace `strip_tokens` in attribute keys and string values with `_`.
    pub strip_attrs: bool,
    pub strip_tokens: Vec<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            node_label: None,
            node_label_attr: None,
            edge_label: None,
            edge_label_attr: None,
            strip_attrs: false,
            strip_tokens: vec![" ".to_string(), "/".to_string(), "-".to_string()],
        }
    }
}

impl ImportOptions {
    pub fn node_label(mut self, label: impl Into<String>) -> Self {
        self.node_label = Some(label.into());
        self
    }

    pub fn node_label_attr(mut self, attr: impl Into<String>) -> Self {
        self.node_label_attr = Some(attr.into());
        self
    }

    pub fn edge_label(mut self, label: impl Into<String>) -> Self {
        self.edge_label = Some(label.into());
        self
    }

    pub fn edge_label_attr(mut self, attr: impl Into<String>) -> Self {
        self.edge_label_attr = Some(attr.into());
        self
    }

    pub fn strip_attrs(mut self, strip: bool) -> Self {
        self.strip_attrs = strip;
        self
    }

    /// Compiled token matcher, `None` when stripping is off.
    pub fn stripper(&self) -> AgensResult<Option<Regex>> {
        if !self.strip_attrs {
            return Ok(None);
        }
        token_regex(&self.strip_tokens)
    }
}

fn token_regex(tokens: &[String]) -> AgensResult<Option<Regex>> {
    let alternatives: Vec<String> = tokens
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| regex::escape(t))
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    Regex::new(&alternatives.join("|"))
        .map(Some)
        .map_err(|e| AgensError::validation(format!("invalid strip tokens: {}", e)))
}

/// Replace every token in keys and string values with `_`.
///
/// A renamed key overwrites an existing key with the same name.
pub fn strip_attributes(map: Properties, tokens: &[String]) -> AgensResult<Properties> {
    match token_regex(tokens)? {
        Some(re) => Ok(strip_with(map, &re)),
        None => Ok(map),
    }
}

fn strip_with(map: Properties, re: &Regex) -> Properties {
    map.into_iter()
        .map(|(key, value)| {
            let key = re.replace_all(&key, "_").into_owned();
            let value = match value {
                Value::String(s) => Value::String(re.replace_all(&s, "_").into_owned()),
                other => other,
            };
            (key, value)
        })
        .collect()
}

/// Label and properties for one entity to create.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityPlan {
    pub label: Option<String>,
    pub properties: Properties,
}

/// Strip `attrs` when a matcher is given, then take the label from
/// `label_attr` if present, otherwise from `fallback_label`.
pub fn plan_entity(
    attrs: Properties,
    label_attr: Option<&str>,
    fallback_label: Option<&str>,
    stripper: Option<&Regex>,
) -> AgensResult<EntityPlan> {
    let mut properties = match stripper {
        Some(re) => strip_with(attrs, re),
        None => attrs,
    };
    if let Some(attr) = label_attr {
        match properties.remove(attr) {
            Some(Value::String(label)) => {
                return Ok(EntityPlan {
                    label: Some(label),
                    properties,
                })
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                return Err(AgensError::validation(format!(
                    "label attribute '{}' must be a string, got {}",
                    attr, other
                )))
            }
        }
    }
    Ok(EntityPlan {
        label: fallback_label.map(str::to_string),
        properties,
    })
}

/// Resolve the label and properties of an imported vertex.
pub fn plan_vertex(
    attrs: Properties,
    opts: &ImportOptions,
    stripper: Option<&Regex>,
) -> AgensResult<EntityPlan> {
    plan_entity(
        attrs,
        opts.node_label_attr.as_deref(),
        opts.node_label.as_deref(),
        stripper,
    )
}

/// Resolve the label and properties of an imported edge.
pub fn plan_edge(
    attrs: Properties,
    opts: &ImportOptions,
    stripper: Option<&Regex>,
) -> AgensResult<EntityPlan> {
    plan_entity(
        attrs,
        opts.edge_label_attr.as_deref(),
        opts.edge_label.as_deref(),
        stripper,
    )
}

//! Dependency extraction from DTDL model documents.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::Error;
use crate::model::dtmi::is_valid_dtmi;

const ID: &str = "@id";
const TYPE: &str = "@type";
const EXTENDS: &str = "extends";
const CONTENTS: &str = "contents";
const SCHEMA: &str = "schema";
const COMPONENT: &str = "Component";

/// Identity and dependencies declared by one model document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMetadata {
    /// Declared root identifier
    pub id: String,
    /// Models this one extends
    pub extends: Vec<String>,
    /// Interfaces referenced as component schemas
    pub component_schemas: Vec<String>,
}

impl ModelMetadata {
    /// Every referenced identifier, extends first, without duplicates.
    pub fn dependencies(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.extends
            .iter()
            .chain(self.component_schemas.iter())
            .filter(|dtmi| seen.insert(dtmi.as_str()))
            .cloned()
            .collect()
    }
}

/// Queries a fetched model document.
///
/// `path` is only used to attribute parse failures.
pub struct ModelQuery<'a> {
    content: &'a str,
    path: &'a str,
}

impl<'a> ModelQuery<'a> {
    pub fn new(content: &'a str, path: &'a str) -> Self {
        Self { content, path }
    }

    /// Parse the document's root identifier and dependencies.
    pub fn parse_model(&self) -> Result<ModelMetadata, Error> {
        let root = self.parse_root()?;
        let id = self.root_id(&root)?;

        let mut dependencies = Dependencies::default();
        dependencies.scan_interface(&root);

        Ok(ModelMetadata {
            id,
            extends: dependencies.extends,
            component_schemas: dependencies.component_schemas,
        })
    }

    /// Parse only the root identifier.
    pub fn parse_id(&self) -> Result<String, Error> {
        let root = self.parse_root()?;
        self.root_id(&root)
    }

    /// Split an expanded document into `(id, content)` pairs.
    ///
    /// An expanded document is a JSON array holding a model and every model in
    /// its dependency closure. Each entry is re-serialised on its own.
    pub fn decompose_expanded(&self) -> Result<Vec<(String, String)>, Error> {
        let value: Value = serde_json::from_str(self.content)
            .map_err(|e| self.parse_error(format!("invalid JSON: {}", e)))?;

        let entries = match value {
            Value::Array(entries) => entries,
            _ => return Err(self.parse_error("expanded content must be a JSON array")),
        };

        entries
            .into_iter()
            .map(|entry| -> Result<(String, String), Error> {
                let object = entry
                    .as_object()
                    .ok_or_else(|| self.parse_error("expanded entry is not a JSON object"))?;
                let id = self.root_id(object)?;
                let content = serde_json::to_string(&entry)
                    .map_err(|e| self.parse_error(e.to_string()))?;
                Ok((id, content))
            })
            .collect()
    }

    fn parse_root(&self) -> Result<Map<String, Value>, Error> {
        let value: Value = serde_json::from_str(self.content)
            .map_err(|e| self.parse_error(format!("invalid JSON: {}", e)))?;

        match value {
            Value::Object(root) => Ok(root),
            _ => Err(self.parse_error("model content must be a JSON object")),
        }
    }

    fn root_id(&self, root: &Map<String, Value>) -> Result<String, Error> {
        let id = root
            .get(ID)
            .and_then(|v| v.as_str())
            .ok_or_else(|| self.parse_error("missing root \"@id\""))?;

        if !is_valid_dtmi(id) {
            return Err(self.parse_error(format!("root \"@id\" \"{}\" is not a valid DTMI", id)));
        }
        Ok(id.to_string())
    }

    fn parse_error(&self, reason: impl Into<String>) -> Error {
        Error::Parse {
            path: self.path.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Default)]
struct Dependencies {
    extends: Vec<String>,
    component_schemas: Vec<String>,
}

impl Dependencies {
    /// Collect references from an interface, descending into inline interfaces.
    fn scan_interface(&mut self, interface: &Map<String, Value>) {
        match interface.get(EXTENDS) {
            Some(Value::String(base)) => push_unique(&mut self.extends, base),
            Some(Value::Array(bases)) => {
                for base in bases {
                    match base {
                        Value::String(base) => push_unique(&mut self.extends, base),
                        // Inline definition; only its own references count
                        Value::Object(inline) => self.scan_interface(inline),
                        _ => {}
                    }
                }
            }
            Some(Value::Object(inline)) => self.scan_interface(inline),
            _ => {}
        }

        if let Some(Value::Array(contents)) = interface.get(CONTENTS) {
            for element in contents.iter().filter_map(Value::as_object) {
                if !is_component(element) {
                    continue;
                }
                match element.get(SCHEMA) {
                    Some(Value::String(schema)) => {
                        push_unique(&mut self.component_schemas, schema)
                    }
                    Some(Value::Object(inline)) => self.scan_interface(inline),
                    _ => {}
                }
            }
        }
    }
}

fn is_component(element: &Map<String, Value>) -> bool {
    match element.get(TYPE) {
        Some(Value::String(kind)) => kind == COMPONENT,
        Some(Value::Array(kinds)) => kinds.iter().any(|k| k.as_str() == Some(COMPONENT)),
        _ => false,
    }
}

fn push_unique(list: &mut Vec<String>, dtmi: &str) {
    if !list.iter().any(|existing| existing == dtmi) {
        list.push(dtmi.to_string());
    }
}

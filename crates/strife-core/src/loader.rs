//! Record loading and minimal shape validation.
//!
//! The loader turns untyped rows (JSON or YAML) into [`EntityRecord`] and
//! [`RelationRecord`] tables. Bad rows never abort a load: they are skipped
//! or repaired and reported as [`Issue`]s. Only an input that cannot be
//! located, read, or parsed at all returns a [`LoadError`].

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::record::{
    DEFAULT_RELATION_TYPE, EntityKind, EntityRecord, Issue, IssueKind, RelationRecord,
};

const ENTITY_FIELDS: [&str; 4] = ["id", "name", "type", "domain"];
const RELATION_FIELDS: [&str; 4] = ["source_id", "target_id", "relation_type", "strength"];

/// Serialized document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
}

impl InputFormat {
    /// Infer the format from a file extension (`.json`, `.yaml`, `.yml`).
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Output of a load: the typed tables plus every data-quality issue found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedRecords {
    pub entities: Vec<EntityRecord>,
    pub relations: Vec<RelationRecord>,
    pub issues: Vec<Issue>,
}

/// Converts raw rows into typed records.
#[derive(Debug, Clone, Default)]
pub struct RecordLoader {
    domains: BTreeSet<String>,
}

impl RecordLoader {
    #[must_use]
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            domains: config.domains.iter().cloned().collect(),
        }
    }

    /// Validate already-split entity and relation rows.
    #[must_use]
    #[instrument(skip_all, fields(entities = entities.len(), relations = relations.len()))]
    pub fn load_rows(
        &self,
        entities: &[Map<String, Value>],
        relations: &[Map<String, Value>],
    ) -> LoadedRecords {
        let mut out = LoadedRecords::default();

        for row in entities {
            if let Some(entity) = self.parse_entity(row, &mut out.issues) {
                out.entities.push(entity);
            }
        }
        for row in relations {
            if let Some(relation) = parse_relation(row, &mut out.issues) {
                out.relations.push(relation);
            }
        }

        info!(
            entities = out.entities.len(),
            relations = out.relations.len(),
            issues = out.issues.len(),
            "records loaded"
        );
        out
    }

    /// Load a `{ "entities": [...], "relations": [...] }` document.
    ///
    /// A missing table is treated as empty. Array elements that are not
    /// objects are reported as `invalid_field` and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Parse`] if the document is not a mapping and
    /// [`LoadError::Shape`] if either table is present but not an array.
    pub fn load_document(&self, document: &Value) -> Result<LoadedRecords, LoadError> {
        let Value::Object(root) = document else {
            return Err(LoadError::Parse(
                "top-level document must be a mapping".to_string(),
            ));
        };

        let mut issues = Vec::new();
        let entities = table(root, "entities", &mut issues)?;
        let relations = table(root, "relations", &mut issues)?;

        let mut loaded = self.load_rows(&entities, &relations);
        issues.append(&mut loaded.issues);
        loaded.issues = issues;
        Ok(loaded)
    }

    /// Parse `text` in the given format and load it.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Parse`] on malformed input, or any error from
    /// [`Self::load_document`].
    pub fn load_str(&self, text: &str, format: InputFormat) -> Result<LoadedRecords, LoadError> {
        let document: Value = match format {
            InputFormat::Json => {
                serde_json::from_str(text).map_err(|e| LoadError::Parse(e.to_string()))?
            }
            InputFormat::Yaml => {
                serde_yaml::from_str(text).map_err(|e| LoadError::Parse(e.to_string()))?
            }
        };
        self.load_document(&document)
    }

    /// Read and load a `.json`, `.yaml`, or `.yml` file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file is missing, has an unsupported
    /// extension, cannot be read, or cannot be parsed.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn load_path(&self, path: &Path) -> Result<LoadedRecords, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let format = InputFormat::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(bytes = text.len(), ?format, "input read");
        self.load_str(&text, format)
    }

    fn parse_entity(&self, row: &Map<String, Value>, issues: &mut Vec<Issue>) -> Option<EntityRecord> {
        let reject = |issues: &mut Vec<Issue>, kind: IssueKind, message: String| {
            debug!(%message, "entity row skipped");
            issues.push(Issue::load(kind, message, Value::Object(row.clone())));
        };

        let id = match text_field(row, "id") {
            Ok(id) => id,
            Err((kind, message)) => {
                reject(issues, kind, format!("entity {message}"));
                return None;
            }
        };
        let name = match text_field(row, "name") {
            Ok(name) => name,
            Err((kind, message)) => {
                reject(issues, kind, format!("entity `{id}` {message}"));
                return None;
            }
        };
        let kind = match text_field(row, "type") {
            Ok(label) => EntityKind::parse(&label),
            Err((kind, message)) => {
                reject(issues, kind, format!("entity `{id}` {message}"));
                return None;
            }
        };

        let domain = match row.get("domain") {
            None | Some(Value::Null) => None,
            Some(Value::String(domain)) if !domain.trim().is_empty() => {
                let domain = domain.trim().to_string();
                if self.domains.is_empty() || self.domains.contains(&domain) {
                    Some(domain)
                } else {
                    issues.push(Issue::load(
                        IssueKind::UnknownDomain,
                        format!("entity `{id}` has unknown domain `{domain}`; domain dropped"),
                        Value::Object(row.clone()),
                    ));
                    None
                }
            }
            Some(_) => {
                issues.push(Issue::load(
                    IssueKind::InvalidField,
                    format!("entity `{id}` field `domain` must be a non-empty string; domain dropped"),
                    Value::Object(row.clone()),
                ));
                None
            }
        };

        Some(EntityRecord {
            id,
            name,
            kind,
            domain,
            metadata: extra_fields(row, &ENTITY_FIELDS),
        })
    }
}

fn parse_relation(row: &Map<String, Value>, issues: &mut Vec<Issue>) -> Option<RelationRecord> {
    let reject = |issues: &mut Vec<Issue>, kind: IssueKind, message: String| {
        debug!(%message, "relation row skipped");
        issues.push(Issue::load(kind, message, Value::Object(row.clone())));
    };

    let source_id = match text_field(row, "source_id") {
        Ok(id) => id,
        Err((kind, message)) => {
            reject(issues, kind, format!("relation {message}"));
            return None;
        }
    };
    let target_id = match text_field(row, "target_id") {
        Ok(id) => id,
        Err((kind, message)) => {
            reject(issues, kind, format!("relation {message}"));
            return None;
        }
    };
    let label = format!("relation `{source_id}` -> `{target_id}`");

    let raw_strength = match row.get("strength") {
        None => {
            reject(issues, IssueKind::MissingField, format!("{label} missing field `strength`"));
            return None;
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(_) => None,
    };
    let Some(raw_strength) = raw_strength.filter(|s| s.is_finite()) else {
        reject(
            issues,
            IssueKind::InvalidField,
            format!("{label} field `strength` must be a finite number"),
        );
        return None;
    };
    let strength = raw_strength.clamp(0.0, 1.0);
    if (strength - raw_strength).abs() > f64::EPSILON {
        issues.push(Issue::load(
            IssueKind::OutOfRange,
            format!("{label} strength {raw_strength} clamped to {strength}"),
            Value::Object(row.clone()),
        ));
    }

    let relation_type = match row.get("relation_type") {
        Some(Value::String(kind)) if !kind.trim().is_empty() => kind.trim().to_string(),
        _ => DEFAULT_RELATION_TYPE.to_string(),
    };

    Some(RelationRecord {
        source_id,
        target_id,
        relation_type,
        strength,
        metadata: extra_fields(row, &RELATION_FIELDS),
    })
}

/// Read a required identifier-like field. Numbers are stringified.
fn text_field(row: &Map<String, Value>, key: &str) -> Result<String, (IssueKind, String)> {
    match row.get(key) {
        None | Some(Value::Null) => Err((IssueKind::MissingField, format!("missing field `{key}`"))),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err((IssueKind::MissingField, format!("field `{key}` is empty")))
        }
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err((
            IssueKind::InvalidField,
            format!("field `{key}` must be a string, got {}", json_type(other)),
        )),
    }
}

fn extra_fields(row: &Map<String, Value>, known: &[&str]) -> Map<String, Value> {
    row.iter()
        .filter(|(key, _)| !known.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn table(
    root: &Map<String, Value>,
    field: &'static str,
    issues: &mut Vec<Issue>,
) -> Result<Vec<Map<String, Value>>, LoadError> {
    let rows = match root.get(field) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(rows)) => rows,
        Some(_) => return Err(LoadError::Shape { field }),
    };

    let mut maps = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        if let Value::Object(map) = row {
            maps.push(map.clone());
        } else {
            issues.push(Issue::load(
                IssueKind::InvalidField,
                format!("{field}[{index}] must be a mapping, got {}", json_type(row)),
                row.clone(),
            ));
        }
    }
    Ok(maps)
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

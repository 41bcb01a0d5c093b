//! Typed entity and relation records plus the data-quality issue list.
//!
//! Records are immutable once loaded. Any field the loader does not know
//! about is kept in `metadata` rather than dropped, so downstream consumers
//! can still see everything the source provided.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Relation type assigned when a row does not carry one.
pub const DEFAULT_RELATION_TYPE: &str = "conflict";

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Narrative category of an entity.
///
/// Unknown labels are preserved as [`EntityKind::Other`] instead of being
/// rejected: the category set grows faster than the engine does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityKind {
    Character,
    Faction,
    Location,
    Concept,
    Event,
    Artifact,
    Other(String),
}

impl EntityKind {
    /// Parse a category label (case-insensitive, surrounding whitespace ignored).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "character" | "person" => Self::Character,
            "faction" | "organization" | "organisation" => Self::Faction,
            "location" | "place" | "region" => Self::Location,
            "concept" | "idea" | "ideology" => Self::Concept,
            "event" => Self::Event,
            "artifact" | "artefact" | "item" => Self::Artifact,
            _ => Self::Other(normalized),
        }
    }

    /// Canonical label used in serialized output.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Character => "character",
            Self::Faction => "faction",
            Self::Location => "location",
            Self::Concept => "concept",
            Self::Event => "event",
            Self::Artifact => "artifact",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for EntityKind {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.label().to_string()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A narrative element (character, faction, concept, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Extra fields from the source row, preserved verbatim.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl EntityRecord {
    /// Convenience constructor used by tests and programmatic callers.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            domain: None,
            metadata: Map::new(),
        }
    }

    /// Builder-style domain assignment.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------------

/// A conflict linkage between two entities.
///
/// Direction is kept as supplied but the graph treats it as undirected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub source_id: String,
    pub target_id: String,
    #[serde(default = "default_relation_type")]
    pub relation_type: String,
    /// Strength in `[0, 1]` (the loader clamps out-of-range values).
    pub strength: f64,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl RelationRecord {
    #[must_use]
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, strength: f64) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation_type: default_relation_type(),
            strength,
            metadata: Map::new(),
        }
    }

    /// Builder-style relation type assignment.
    #[must_use]
    pub fn with_type(mut self, relation_type: impl Into<String>) -> Self {
        self.relation_type = relation_type.into();
        self
    }
}

fn default_relation_type() -> String {
    DEFAULT_RELATION_TYPE.to_string()
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// Pipeline stage that produced an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStage {
    Load,
    Build,
}

/// Category of a data-quality issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingField,
    InvalidField,
    OutOfRange,
    UnknownDomain,
    DuplicateEntity,
    DanglingReference,
    SelfLoop,
}

/// A recoverable data-quality problem surfaced in the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub stage: IssueStage,
    pub kind: IssueKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<Value>,
}

impl Issue {
    /// Issue raised while loading a raw row.
    #[must_use]
    pub fn load(kind: IssueKind, message: impl Into<String>, row: Value) -> Self {
        Self {
            stage: IssueStage::Load,
            kind,
            message: message.into(),
            row: Some(row),
        }
    }

    /// Issue raised while building the graph.
    #[must_use]
    pub fn build(kind: IssueKind, message: impl Into<String>, row: Option<Value>) -> Self {
        Self {
            stage: IssueStage::Build,
            kind,
            message: message.into(),
            row,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

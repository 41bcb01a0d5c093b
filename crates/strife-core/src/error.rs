use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes shared by the loader, engine, and CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InputNotFound,
    InputUnreadable,
    InputParseError,
    UnsupportedFormat,
    ConfigParseError,
    UnknownNode,
    UnknownDomain,
    NonConvergence,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InputNotFound => "E1001",
            Self::InputUnreadable => "E1002",
            Self::InputParseError => "E1003",
            Self::UnsupportedFormat => "E1004",
            Self::ConfigParseError => "E1005",
            Self::UnknownNode => "E2001",
            Self::UnknownDomain => "E2002",
            Self::NonConvergence => "E3001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InputNotFound => "Input source not found",
            Self::InputUnreadable => "Input source could not be read",
            Self::InputParseError => "Input document could not be parsed",
            Self::UnsupportedFormat => "Unsupported input format",
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownNode => "Entity not present in graph",
            Self::UnknownDomain => "Domain not present in graph",
            Self::NonConvergence => "Iterative computation did not converge",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InputNotFound => Some("Check the input path and retry."),
            Self::InputUnreadable => Some("Check file permissions and encoding (UTF-8)."),
            Self::InputParseError => Some(
                "Provide a document with top-level `entities` and `relations` arrays.",
            ),
            Self::UnsupportedFormat => Some("Use a .json, .yaml, or .yml input file."),
            Self::ConfigParseError => Some("Fix syntax in the TOML config file and retry."),
            Self::UnknownNode => Some("Use an entity id that survived loading (see issues)."),
            Self::UnknownDomain => Some("Use a domain assigned to at least one entity."),
            Self::NonConvergence => Some("Raise the iteration cap or loosen the tolerance."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Fatal input errors. Anything else found while loading is an [`crate::Issue`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("input not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported input format for {}: expected .json, .yaml, or .yml", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to parse input document: {0}")]
    Parse(String),

    #[error("input document field `{field}` must be an array")]
    Shape { field: &'static str },
}

impl LoadError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::InputNotFound,
            Self::Unreadable { .. } => ErrorCode::InputUnreadable,
            Self::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            Self::Parse(_) | Self::Shape { .. } => ErrorCode::InputParseError,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

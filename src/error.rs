//! Error types.
//!
//! Two kinds of failure never mix:
//!
//! - [`GenerationError`] means the schema derived from the command tree is
//!   itself broken. It is a bug in how the CLI was declared, never something a
//!   user can fix by editing a config file.
//! - [`ValidationReport`] collects every [`Violation`] found in the user's
//!   configuration: unknown keys, missing required keys, and type mismatches.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

pub(crate) const REQUIRED_HINT: &str = "Hint: Required fields must be provided in the config file";
pub(crate) const UNKNOWN_HINT: &str = "Hint: Check that all config keys correspond to valid CLI flags";

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum ClapcueError {
    #[error("failed to generate config schema: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(clapcue::generation)))]
    Generation(#[from] GenerationError),

    #[error("{0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(clapcue::invalid_config)))]
    Invalid(ValidationReport),

    #[error("Failed to parse {path}: {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(clapcue::parse)))]
    ParseError { path: PathBuf, reason: String },

    #[error("config conflict between {} and {} at '{key}': {reason}", first.display(), second.display())]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(clapcue::conflict),
            help("config files are unified, not overridden; a key may only be set to one value")
        )
    )]
    ConfigConflict {
        first: PathBuf,
        second: PathBuf,
        key: String,
        reason: String,
    },

    #[error("Could not determine the home directory to expand '~'")]
    HomeDirUnavailable,

    #[cfg(feature = "clap")]
    #[error(transparent)]
    Clap(#[from] clap::Error),
}

/// The derived schema is inconsistent. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum GenerationError {
    #[error("definition name collision: commands '{first}' and '{second}' both map to #{name}")]
    DefinitionNameCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("field name collision in #{definition}: '{first}' and '{second}' both map to '{field}'")]
    FieldNameCollision {
        definition: String,
        field: String,
        first: String,
        second: String,
    },

    #[error("malformed definition #{definition}: {reason}")]
    MalformedDefinition { definition: String, reason: String },
}

/// One problem found in a configuration document.
///
/// `definition` names the generated definition that rejected the value. It is
/// kept for diagnostics and never rendered to end users.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    UnknownField {
        path: String,
        #[serde(skip)]
        definition: String,
    },
    MissingRequiredField {
        path: String,
        #[serde(skip)]
        definition: String,
    },
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
        #[serde(skip)]
        definition: String,
    },
}

impl Violation {
    pub fn path(&self) -> &str {
        match self {
            Violation::UnknownField { path, .. }
            | Violation::MissingRequiredField { path, .. }
            | Violation::TypeMismatch { path, .. } => path,
        }
    }

    pub fn is_unknown_field(&self) -> bool {
        matches!(self, Violation::UnknownField { .. })
    }

    pub fn is_missing_required(&self) -> bool {
        matches!(self, Violation::MissingRequiredField { .. })
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Violation::TypeMismatch { .. })
    }

    /// Human-readable detail, without the path.
    pub fn detail(&self) -> String {
        match self {
            Violation::UnknownField { .. } => "field not allowed".to_string(),
            Violation::MissingRequiredField { .. } => {
                "incomplete value: required field is missing".to_string()
            }
            Violation::TypeMismatch {
                expected, found, ..
            } => format!("conflicting values: expected {expected}, found {found}"),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path(), self.detail())
    }
}

/// Every violation from both validation passes, unknown-field pass first.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Machine-readable form of the report.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{violation}")?;
        }
        if self.violations.iter().any(Violation::is_missing_required) {
            write!(f, "\n{REQUIRED_HINT}")?;
        }
        if self.violations.iter().any(Violation::is_unknown_field) {
            write!(f, "\n{UNKNOWN_HINT}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

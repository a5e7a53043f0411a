//! Where a config document may carry keys that no flag or command declares.
//!
//! Paths use dot notation matching the config structure (`"server"`,
//! `"server.tls"`). A path is open when it equals an allowed prefix or sits
//! below one; everything else is closed. Segments may be written the way the
//! command is spelled on the command line: `client-mode` names the
//! `client_mode` section.
//!
//! A [`PathPolicy`] is built fresh for every generation call from a
//! [`SchemaOptions`] value and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::types::kebab_to_snake;

/// Caller-facing unknown-field settings, carried by the builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaOptions {
    /// Paths below which unknown keys are tolerated.
    #[serde(default)]
    pub allow_unknown_paths: Vec<String>,
    /// Tolerate unknown keys everywhere. Overrides `allow_unknown_paths`.
    #[serde(default)]
    pub allow_all: bool,
}

impl SchemaOptions {
    /// Build the immutable policy for one generation call.
    pub fn policy(&self) -> PathPolicy {
        if self.allow_all {
            PathPolicy::allow_everywhere()
        } else {
            PathPolicy::allow_paths(&self.allow_unknown_paths)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathPolicy {
    allowed: Vec<String>,
    allow_all: bool,
}

impl PathPolicy {
    /// Unknown keys are rejected everywhere.
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn allow_everywhere() -> Self {
        Self {
            allowed: Vec::new(),
            allow_all: true,
        }
    }

    /// Allow unknown keys at and below each of `paths`.
    ///
    /// Duplicates are dropped, first occurrence wins. An empty path names the
    /// document root and is equivalent to [`allow_everywhere`](Self::allow_everywhere).
    pub fn allow_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed: Vec<String> = Vec::new();
        for path in paths {
            let path = kebab_to_snake(path.as_ref().trim());
            if path.is_empty() {
                return Self::allow_everywhere();
            }
            if !allowed.contains(&path) {
                allowed.push(path);
            }
        }
        Self {
            allowed,
            allow_all: false,
        }
    }

    pub fn allows_all(&self) -> bool {
        self.allow_all
    }

    pub fn allowed_paths(&self) -> &[String] {
        &self.allowed
    }

    /// Whether the definition at `path` (`""` for the root) stays open.
    pub fn allows_unknown(&self, path: &str) -> bool {
        if self.allow_all {
            return true;
        }
        self.allowed.iter().any(|allowed| {
            path == allowed
                || path
                    .strip_prefix(allowed.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    /// Wildcard field names to inject into the definition at `path`.
    ///
    /// Empty when unknown keys are allowed everywhere, since every definition
    /// is open anyway.
    pub fn synthetic_fields<'a>(&'a self, path: &str) -> Vec<&'a str> {
        if self.allow_all {
            return Vec::new();
        }
        let mut fields: Vec<&str> = Vec::new();
        for allowed in &self.allowed {
            if let Some(name) = synthetic_field_at(allowed, path)
                && !fields.contains(&name)
            {
                fields.push(name);
            }
        }
        fields
    }
}

/// The next segment of `allowed` below `current`, if `allowed` lies strictly
/// below `current`.
///
/// - `("messy", "")` → `Some("messy")`
/// - `("foo.bar", "")` → `Some("foo")`
/// - `("foo.bar", "foo")` → `Some("bar")`
/// - `("foo.bar.baz", "foo")` → `Some("bar")`, deeper segments are covered by the wildcard
/// - `("messy", "foo")` → `None`
/// - `("foo", "foo")` → `None`, the definition itself is open instead
pub fn synthetic_field_at<'a>(allowed: &'a str, current: &str) -> Option<&'a str> {
    let rest = if current.is_empty() {
        allowed
    } else {
        allowed.strip_prefix(current)?.strip_prefix('.')?
    };
    let next = rest.split('.').next().unwrap_or(rest);
    (!next.is_empty()).then_some(next)
}

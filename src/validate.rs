//! Two-pass validation of a merged config document.
//!
//! 1. **Unknown-field pass.** The document is unified with a copy of the
//!    schema whose flag types are all `_`. Closedness is kept, so the only
//!    thing that can fail is a key no definition declares. Skipped when the
//!    policy allows unknown fields everywhere.
//! 2. **Strict pass.** The document is unified with the real schema in
//!    concrete mode, catching type mismatches and missing required fields.
//!
//! Both passes always run. Their violations are reported pass 1 first, each
//! in document order, with no deduplication between them.

use toml::{Table, Value};

use crate::engine::{Concreteness, lookup_path};
use crate::error::{ValidationReport, Violation};
use crate::policy::PathPolicy;
use crate::schema::Schema;

/// A document that satisfied the strict schema, with coercions applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundDocument {
    table: Table,
}

impl BoundDocument {
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn lookup(&self, dotted: &str) -> Option<&Value> {
        lookup_path(&self.table, dotted)
    }
}

/// Validate `document` against `schema`.
///
/// `policy` must be the one `schema` was generated with.
pub fn validate(
    document: &Table,
    schema: &Schema,
    policy: &PathPolicy,
) -> Result<BoundDocument, ValidationReport> {
    let mut violations: Vec<Violation> = Vec::new();

    if !policy.allows_all() {
        let permissive = schema.compiled().with_wildcard_types();
        let unified = permissive.unify(document, Concreteness::Partial);
        // A scalar where a command section belongs still mismatches its
        // reference here; the strict pass reports it.
        violations.extend(
            unified
                .violations
                .into_iter()
                .filter(Violation::is_unknown_field),
        );
    }

    let strict = schema.compiled().unify(document, Concreteness::Concrete);
    let unknown = violations.len();
    violations.extend(strict.violations);

    if violations.is_empty() {
        return Ok(BoundDocument { table: strict.bound });
    }

    tracing::warn!(
        event = "clapcue.validation.failed",
        unknown_fields = unknown,
        strict_violations = violations.len() - unknown,
    );
    Err(ValidationReport { violations })
}

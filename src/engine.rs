//! Structural constraint engine over `toml` documents.
//!
//! [`CompiledSchema::compile`] links a [`DefinitionSet`] so every reference
//! resolves, then [`CompiledSchema::unify`] walks a document against it. The
//! walk never stops at the first problem: it records a [`Violation`] for each
//! one and keeps going, returning whatever part of the document did conform
//! as the bound table.
//!
//! Scalars are coerced the way a string-typed config source expects: `"8080"`
//! satisfies `int`, `"true"` satisfies `bool`, and so on. Coerced values land
//! in the bound table in their typed form.

use std::collections::HashSet;

use toml::{Table, Value};

use crate::definition::{Definition, DefinitionSet, ROOT_DEFINITION};
use crate::error::{GenerationError, Violation};
use crate::typemap::TypeExpr;

/// Whether required fields must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concreteness {
    /// Absent required fields are fine.
    Partial,
    /// Absent required fields are violations.
    Concrete,
}

/// Result of unifying one document with a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Unified {
    pub bound: Table,
    pub violations: Vec<Violation>,
}

impl Unified {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A linked set of definitions, entered at `#Root`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchema {
    definitions: DefinitionSet,
}

impl CompiledSchema {
    /// Check that every definition is well formed and every reference
    /// resolves.
    pub fn compile(definitions: DefinitionSet) -> Result<Self, GenerationError> {
        for def in definitions.iter() {
            check_definition(def, &definitions)?;
        }
        Ok(Self { definitions })
    }

    /// The same schema with every flag typed `_`.
    ///
    /// Erasing types adds no references, so the result needs no relinking.
    pub fn with_wildcard_types(&self) -> CompiledSchema {
        Self {
            definitions: self.definitions.with_wildcard_types(),
        }
    }

    pub fn definitions(&self) -> &DefinitionSet {
        &self.definitions
    }

    pub fn root(&self) -> &Definition {
        &self.definitions.root
    }

    /// Unify `document` with `#Root`.
    pub fn unify(&self, document: &Table, mode: Concreteness) -> Unified {
        let mut violations = Vec::new();
        let bound = self.unify_table(self.root(), document, "", mode, &mut violations);
        Unified { bound, violations }
    }

    fn unify_table(
        &self,
        def: &Definition,
        table: &Table,
        path: &str,
        mode: Concreteness,
        out: &mut Vec<Violation>,
    ) -> Table {
        let mut bound = Table::new();
        for (key, value) in table {
            let key_path = join(path, key);
            match def.field(key) {
                Some(field) => {
                    if let Some(value) = self.check(&field.ty, value, &key_path, def, mode, out) {
                        bound.insert(key.clone(), value);
                    }
                }
                None if def.closed => out.push(Violation::UnknownField {
                    path: key_path,
                    definition: def.name.clone(),
                }),
                None => {
                    bound.insert(key.clone(), value.clone());
                }
            }
        }

        if mode == Concreteness::Concrete {
            for field in def.fields.iter().filter(|f| f.required) {
                if !table.contains_key(&field.name) {
                    out.push(Violation::MissingRequiredField {
                        path: join(path, &field.name),
                        definition: def.name.clone(),
                    });
                }
            }
        }
        bound
    }

    fn check(
        &self,
        ty: &TypeExpr,
        value: &Value,
        path: &str,
        owner: &Definition,
        mode: Concreteness,
        out: &mut Vec<Violation>,
    ) -> Option<Value> {
        let coerced = match (ty, value) {
            (TypeExpr::Any, v) => Some(v.clone()),
            (TypeExpr::String, Value::String(_)) => Some(value.clone()),
            (TypeExpr::String, Value::Datetime(dt)) => Some(Value::String(dt.to_string())),
            (TypeExpr::Int, Value::Integer(_)) => Some(value.clone()),
            (TypeExpr::Int, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::Integer),
            (TypeExpr::Number, Value::Integer(_) | Value::Float(_)) => Some(value.clone()),
            (TypeExpr::Number, Value::String(s)) => parse_number(s),
            (TypeExpr::Bool, Value::Boolean(_)) => Some(value.clone()),
            (TypeExpr::Bool, Value::String(s)) => parse_bool(s).map(Value::Boolean),
            (TypeExpr::Map, Value::Table(_)) => Some(value.clone()),
            (TypeExpr::List(elem), Value::Array(items)) => {
                let before = out.len();
                let mut checked = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{i}]");
                    if let Some(v) = self.check(elem, item, &item_path, owner, mode, out) {
                        checked.push(v);
                    }
                }
                // Element violations are already recorded.
                return (out.len() == before).then_some(Value::Array(checked));
            }
            (TypeExpr::Ref(name), Value::Table(table)) => {
                return match self.definitions.get(name) {
                    Some(def) => Some(Value::Table(self.unify_table(def, table, path, mode, out))),
                    None => Some(value.clone()),
                };
            }
            _ => None,
        };

        if coerced.is_none() {
            out.push(Violation::TypeMismatch {
                path: path.to_string(),
                expected: expectation(ty),
                found: describe(value),
                definition: owner.name.clone(),
            });
        }
        coerced
    }
}

/// Look up a dotted path (`"agent.ca_url"`) in a table.
pub fn lookup_path<'a>(table: &'a Table, dotted: &str) -> Option<&'a Value> {
    let mut segments = dotted.split('.');
    let mut current = table.get(segments.next()?)?;
    for segment in segments {
        current = current.as_table()?.get(segment)?;
    }
    Some(current)
}

pub fn as_bool(value: &Value) -> Option<bool> {
    value.as_bool()
}

pub fn as_int(value: &Value) -> Option<i64> {
    value.as_integer()
}

/// Integers widen to floats.
pub fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

pub fn as_str(value: &Value) -> Option<&str> {
    value.as_str()
}

pub fn as_list(value: &Value) -> Option<&[Value]> {
    value.as_array().map(Vec::as_slice)
}

fn check_definition(def: &Definition, all: &DefinitionSet) -> Result<(), GenerationError> {
    let malformed = |reason: String| GenerationError::MalformedDefinition {
        definition: def.name.clone(),
        reason,
    };

    if def.name.is_empty() || !def.name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(malformed(format!("invalid definition name '{}'", def.name)));
    }

    let mut seen = HashSet::new();
    for field in &def.fields {
        if !is_valid_label(&field.name) {
            return Err(malformed(format!("invalid field label '{}'", field.name)));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(malformed(format!("duplicate field label '{}'", field.name)));
        }
        if let Some(target) = dangling_ref(&field.ty, all) {
            return Err(malformed(format!(
                "field '{}' references undefined #{target}",
                field.name
            )));
        }
        if let TypeExpr::Ref(target) = &field.ty
            && target == ROOT_DEFINITION
        {
            return Err(malformed(format!("field '{}' references #Root", field.name)));
        }
    }
    Ok(())
}

fn dangling_ref<'a>(ty: &'a TypeExpr, all: &DefinitionSet) -> Option<&'a str> {
    match ty {
        TypeExpr::Ref(name) if all.get(name).is_none() => Some(name),
        TypeExpr::List(elem) => dangling_ref(elem, all),
        _ => None,
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label
            .chars()
            .all(|c| !c.is_whitespace() && !matches!(c, '.' | '"' | '#' | ':' | '[' | ']'))
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite()).map(Value::Float)
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// What the user is told a field expects. Definition names stay internal.
fn expectation(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Ref(_) => "struct".to_string(),
        TypeExpr::List(elem) => format!("[...{}]", expectation(elem)),
        other => other.to_string(),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(dt) => dt.to_string(),
        Value::Array(_) => "list".to_string(),
        Value::Table(_) => "struct".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{Field, FieldOrigin, build_definitions};
    use crate::fixtures::test::{agent_cli, doc, nested_cli, schema_cli};
    use crate::policy::PathPolicy;

    fn compiled(set: DefinitionSet) -> CompiledSchema {
        CompiledSchema::compile(set).unwrap()
    }

    fn strict(tree: &crate::types::CommandNode) -> CompiledSchema {
        compiled(build_definitions(tree, &PathPolicy::strict(), "config").unwrap())
    }

    #[test]
    fn conforming_document_binds_unchanged() {
        let schema = strict(&agent_cli());
        let input = doc(
            r#"
            log_file = "/tmp/x"
            [agent]
            ca_url = "https://x"
            match = ["*.a", "*.b"]
            "#,
        );
        let unified = schema.unify(&input, Concreteness::Concrete);
        assert!(unified.is_ok(), "{:?}", unified.violations);
        assert_eq!(unified.bound, input);
    }

    #[test]
    fn unknown_key_in_closed_definition() {
        let schema = strict(&agent_cli());
        let unified = schema.unify(
            &doc("[agent]\nca_url = \"https://x\"\nbad_field = 1"),
            Concreteness::Concrete,
        );
        assert_eq!(unified.violations.len(), 1);
        assert!(unified.violations[0].is_unknown_field());
        assert_eq!(unified.violations[0].path(), "agent.bad_field");
        assert!(lookup_path(&unified.bound, "agent.bad_field").is_none());
    }

    #[test]
    fn required_field_only_enforced_when_concrete() {
        let schema = strict(&agent_cli());
        let input = doc("[agent]");
        assert!(schema.unify(&input, Concreteness::Partial).is_ok());
        let unified = schema.unify(&input, Concreteness::Concrete);
        assert_eq!(unified.violations.len(), 1);
        assert!(unified.violations[0].is_missing_required());
        assert_eq!(unified.violations[0].path(), "agent.ca_url");
    }

    #[test]
    fn absent_command_section_is_not_checked_for_required() {
        let schema = strict(&agent_cli());
        assert!(schema.unify(&Table::new(), Concreteness::Concrete).is_ok());
    }

    #[test]
    fn numeric_strings_coerce_to_int() {
        let schema = strict(&schema_cli());
        let unified = schema.unify(
            &doc("verbose = \"3\"\n[agent]\nport = \"8080\""),
            Concreteness::Concrete,
        );
        assert!(unified.is_ok());
        assert_eq!(lookup_path(&unified.bound, "agent.port"), Some(&Value::Integer(8080)));
        assert_eq!(unified.bound["verbose"], Value::Integer(3));
    }

    #[test]
    fn bool_and_number_coercion() {
        let schema = strict(&schema_cli());
        let unified = schema.unify(
            &doc("debug = \"TRUE\"\nratio = \"0.5\""),
            Concreteness::Concrete,
        );
        assert!(unified.is_ok());
        assert_eq!(unified.bound["debug"], Value::Boolean(true));
        assert_eq!(unified.bound["ratio"], Value::Float(0.5));
    }

    #[test]
    fn number_accepts_integers() {
        let schema = strict(&schema_cli());
        assert!(schema.unify(&doc("ratio = 2"), Concreteness::Concrete).is_ok());
    }

    #[test]
    fn type_mismatch_reports_expected_and_found() {
        let schema = strict(&schema_cli());
        let unified = schema.unify(&doc("[agent]\nport = \"abc\""), Concreteness::Concrete);
        assert_eq!(
            unified.violations,
            vec![Violation::TypeMismatch {
                path: "agent.port".into(),
                expected: "int".into(),
                found: "\"abc\"".into(),
                definition: "Agent".into(),
            }]
        );
    }

    #[test]
    fn list_elements_checked_individually() {
        let schema = strict(&agent_cli());
        let unified = schema.unify(
            &doc("[agent]\nca_url = \"x\"\nmatch = [\"a\", 2, \"c\", 4]"),
            Concreteness::Concrete,
        );
        let paths: Vec<&str> = unified.violations.iter().map(Violation::path).collect();
        assert_eq!(paths, vec!["agent.match[1]", "agent.match[3]"]);
        assert!(lookup_path(&unified.bound, "agent.match").is_none());
    }

    #[test]
    fn scalar_for_command_section_mismatches_without_leaking_name() {
        let schema = strict(&agent_cli());
        let unified = schema.unify(&doc("agent = \"x\""), Concreteness::Concrete);
        match &unified.violations[0] {
            Violation::TypeMismatch { expected, .. } => assert_eq!(expected, "struct"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn map_accepts_any_table() {
        let schema = strict(&schema_cli());
        let unified = schema.unify(&doc("[labels]\nteam = \"core\"\ntier = 1"), Concreteness::Concrete);
        assert!(unified.is_ok());
    }

    #[test]
    fn open_definition_passes_unknown_keys_through() {
        let set = build_definitions(&nested_cli(), &PathPolicy::allow_paths(["server"]), "config").unwrap();
        let schema = compiled(set);
        let unified = schema.unify(
            &doc("[server]\nextra = 1\n[server.tls]\nwhatever = true"),
            Concreteness::Concrete,
        );
        assert!(unified.is_ok());
        assert_eq!(lookup_path(&unified.bound, "server.tls.whatever"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn violations_follow_document_order() {
        let schema = strict(&schema_cli());
        let unified = schema.unify(
            &doc("zzz = 1\nverbose = \"x\"\naaa = 2"),
            Concreteness::Concrete,
        );
        let paths: Vec<&str> = unified.violations.iter().map(Violation::path).collect();
        assert_eq!(paths, vec!["zzz", "verbose", "aaa"]);
    }

    #[test]
    fn dangling_reference_is_malformed() {
        let mut set = build_definitions(&agent_cli(), &PathPolicy::strict(), "config").unwrap();
        set.commands.clear();
        let err = CompiledSchema::compile(set).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::MalformedDefinition { ref definition, ref reason }
                if definition == "Root" && reason.contains("#Agent")
        ));
    }

    #[test]
    fn duplicate_label_is_malformed() {
        let mut set = build_definitions(&agent_cli(), &PathPolicy::strict(), "config").unwrap();
        set.root.fields.push(Field {
            name: "log_file".into(),
            ty: TypeExpr::String,
            required: false,
            help: None,
            origin: FieldOrigin::Flag,
        });
        assert!(CompiledSchema::compile(set).is_err());
    }

    #[test]
    fn lookup_path_walks_tables() {
        let table = doc("[a.b]\nc = 1");
        assert_eq!(lookup_path(&table, "a.b.c"), Some(&Value::Integer(1)));
        assert!(lookup_path(&table, "a.x").is_none());
        assert!(lookup_path(&table, "a.b.c.d").is_none());
    }

    #[test]
    fn readers() {
        assert_eq!(as_float(&Value::Integer(2)), Some(2.0));
        assert_eq!(as_int(&Value::Float(2.0)), None);
        assert_eq!(as_str(&Value::String("x".into())), Some("x"));
        assert_eq!(as_bool(&Value::Boolean(false)), Some(false));
        assert_eq!(as_list(&Value::Array(vec![Value::Integer(1)])).map(<[Value]>::len), Some(1));
    }
}

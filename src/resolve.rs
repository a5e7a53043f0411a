//! Flag resolution: read one flag's value out of a bound document.
//!
//! A flag `--ca-url` on command `agent` is looked up at `agent.ca_url`; a root
//! flag at its bare snake_case name. What comes back is a default for the
//! flag, never a forced value, so explicit command-line arguments still win.
//!
//! # Zero values
//!
//! A stored `false`, `0`, `0.0` or `""` resolves to `None`, exactly like an
//! absent key. The flag's own default applies in both cases. A config file
//! therefore cannot switch off a flag whose built-in default is `true`, or set
//! a number back to zero.
//!
//! The rule holds for flags without a declared kind too: their stored value
//! is judged by its own type. Counters additionally ignore negative values.

use std::fmt;

use toml::Value;

use crate::engine::{as_bool, as_float, as_int, as_list, as_str};
use crate::types::{FlagKind, FlagSpec, ScalarKind, kebab_to_snake};
use crate::validate::BoundDocument;

/// A resolved flag default.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Strings, and lists or maps already joined with the separator.
    Str(String),
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{b}"),
            FlagValue::Int(i) => write!(f, "{i}"),
            FlagValue::Float(x) => write!(f, "{x}"),
            FlagValue::Str(s) => f.write_str(s),
        }
    }
}

/// Dotted lookup key for `flag_name` under `command_path`.
///
/// `(["server", "tls"], "cert-file")` → `"server.tls.cert_file"`.
pub fn lookup_key<S: AsRef<str>>(command_path: &[S], flag_name: &str) -> String {
    let mut segments: Vec<String> = command_path
        .iter()
        .map(|s| kebab_to_snake(s.as_ref()))
        .collect();
    segments.push(kebab_to_snake(flag_name));
    segments.join(".")
}

/// Resolve `flag` on the command at `command_path`.
///
/// `separator` joins list elements and map entries into one string.
pub fn resolve<S: AsRef<str>>(
    document: &BoundDocument,
    command_path: &[S],
    flag: &FlagSpec,
    separator: &str,
) -> Option<FlagValue> {
    let key = lookup_key(command_path, &flag.name);
    let value = document.lookup(&key)?;
    let resolved = convert(value, flag.kind, separator);
    if let Some(resolved) = &resolved {
        tracing::debug!(event = "clapcue.flag.resolved", key = %key, value = %resolved);
    }
    resolved
}

fn convert(value: &Value, kind: FlagKind, separator: &str) -> Option<FlagValue> {
    match kind {
        FlagKind::List(_) => join_list(value, separator),
        FlagKind::Map => join_map(value, separator),
        FlagKind::Bool | FlagKind::Scalar(ScalarKind::Bool) => {
            as_bool(value).filter(|b| *b).map(FlagValue::Bool)
        }
        // A count can't go below zero.
        FlagKind::Counter => as_int(value).filter(|i| *i > 0).map(FlagValue::Int),
        FlagKind::Scalar(ScalarKind::Integer) => {
            as_int(value).filter(|i| *i != 0).map(FlagValue::Int)
        }
        FlagKind::Scalar(ScalarKind::Float) => {
            as_float(value).filter(|x| *x != 0.0).map(FlagValue::Float)
        }
        FlagKind::Scalar(ScalarKind::String) => as_str(value)
            .filter(|s| !s.is_empty())
            .map(|s| FlagValue::Str(s.to_string())),
        FlagKind::Scalar(ScalarKind::Unknown) | FlagKind::Unset => match value {
            Value::Array(_) => join_list(value, separator),
            Value::Table(_) => join_map(value, separator),
            Value::Boolean(b) => b.then_some(FlagValue::Bool(true)),
            Value::Integer(i) => (*i != 0).then_some(FlagValue::Int(*i)),
            Value::Float(x) => (*x != 0.0).then_some(FlagValue::Float(*x)),
            other => scalar_text(other)
                .filter(|s| !s.is_empty())
                .map(FlagValue::Str),
        },
    }
}

fn join_list(value: &Value, separator: &str) -> Option<FlagValue> {
    let parts: Vec<String> = match as_list(value) {
        Some(items) => items.iter().filter_map(scalar_text).collect(),
        None => scalar_text(value).into_iter().collect(),
    };
    if parts.is_empty() {
        return None;
    }
    Some(FlagValue::Str(parts.join(separator)))
}

fn join_map(value: &Value, separator: &str) -> Option<FlagValue> {
    let table = value.as_table()?;
    let pairs: Vec<String> = table
        .iter()
        .filter_map(|(k, v)| scalar_text(v).map(|v| format!("{k}={v}")))
        .collect();
    if pairs.is_empty() {
        return None;
    }
    Some(FlagValue::Str(pairs.join(separator)))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(dt) => Some(dt.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}

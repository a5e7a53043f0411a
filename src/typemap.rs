//! Flag kinds to schema type expressions.

use std::fmt;

use crate::types::{FlagKind, FlagSpec, ScalarKind};

/// A schema value-type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    String,
    Int,
    Number,
    Bool,
    /// `[...T]`
    List(Box<TypeExpr>),
    /// `{[string]: _}`, any key, any value.
    Map,
    /// `_`, matches anything.
    Any,
    /// Reference to another definition by name.
    Ref(String),
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::String => write!(f, "string"),
            TypeExpr::Int => write!(f, "int"),
            TypeExpr::Number => write!(f, "number"),
            TypeExpr::Bool => write!(f, "bool"),
            TypeExpr::List(elem) => write!(f, "[...{elem}]"),
            TypeExpr::Map => write!(f, "{{[string]: _}}"),
            TypeExpr::Any => write!(f, "_"),
            TypeExpr::Ref(name) => write!(f, "#{name}"),
        }
    }
}

/// Map a flag to the type its config value must have.
///
/// Never fails: kinds that cannot be classified degrade to [`TypeExpr::Any`].
pub fn map_type(flag: &FlagSpec) -> TypeExpr {
    match flag.kind {
        FlagKind::List(elem) => TypeExpr::List(Box::new(scalar_type(elem))),
        // Map shapes can't be enumerated ahead of time.
        FlagKind::Map => TypeExpr::Map,
        FlagKind::Counter => TypeExpr::Int,
        FlagKind::Bool => TypeExpr::Bool,
        FlagKind::Scalar(kind) => scalar_type(kind),
        FlagKind::Unset => TypeExpr::Any,
    }
}

fn scalar_type(kind: ScalarKind) -> TypeExpr {
    match kind {
        ScalarKind::String => TypeExpr::String,
        ScalarKind::Integer => TypeExpr::Int,
        ScalarKind::Float => TypeExpr::Number,
        ScalarKind::Bool => TypeExpr::Bool,
        ScalarKind::Unknown => TypeExpr::Any,
    }
}

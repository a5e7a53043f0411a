use toml::{Table, Value};

/// Where and why two documents disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Dotted path of the disputed key.
    pub key: String,
    pub reason: String,
}

/// Unify `overlay` into `base`.
///
/// Unification is not overriding: tables merge recursively, identical values
/// are accepted, and any other disagreement is a [`Conflict`].
pub fn unify(base: Table, overlay: Table) -> Result<Table, Conflict> {
    unify_at(base, overlay, "")
}

fn unify_at(mut base: Table, overlay: Table, path: &str) -> Result<Table, Conflict> {
    for (key, overlay_val) in overlay {
        let key_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };
        let merged = match (base.remove(&key), overlay_val) {
            (None, overlay_val) => overlay_val,
            (Some(Value::Table(base_tbl)), Value::Table(overlay_tbl)) => {
                Value::Table(unify_at(base_tbl, overlay_tbl, &key_path)?)
            }
            (Some(base_val), overlay_val) if base_val == overlay_val => base_val,
            (Some(base_val), overlay_val) => {
                return Err(Conflict {
                    key: key_path,
                    reason: format!(
                        "conflicting values {} and {}",
                        render(&base_val),
                        render(&overlay_val)
                    ),
                });
            }
        };
        base.insert(key, merged);
    }
    Ok(base)
}

fn render(value: &Value) -> String {
    match value {
        Value::Table(_) => "(struct)".to_string(),
        other => other.to_string(),
    }
}

//! Definition builder: one named schema definition per command.
//!
//! The tree is walked depth-first. Every command below the root becomes a
//! [`Definition`] keyed by a PascalCase name built from its full path
//! (`server tls` → `ServerTls`). The root is built last, after every
//! definition it references exists, and is always named [`ROOT_DEFINITION`].
//!
//! Each definition lists, in order:
//!
//! 1. the command's own configurable flags, typed via [`map_type`],
//! 2. one optional reference field per direct child command,
//! 3. synthetic wildcard fields for allowed-unknown paths that pass through
//!    this level without being fully open here.

use std::collections::{BTreeMap, HashMap};

use crate::error::GenerationError;
use crate::policy::PathPolicy;
use crate::typemap::{TypeExpr, map_type};
use crate::types::{CommandNode, kebab_to_snake};

pub const ROOT_DEFINITION: &str = "Root";

/// Where a field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrigin {
    Flag,
    Command,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Label in the config document (snake_case).
    pub name: String,
    pub ty: TypeExpr,
    pub required: bool,
    pub help: Option<String>,
    pub origin: FieldOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: String,
    /// Dotted config path of the command, `""` for the root.
    pub path: String,
    pub fields: Vec<Field>,
    /// Closed definitions reject keys they don't declare.
    pub closed: bool,
}

impl Definition {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn with_wildcard_types(&self) -> Definition {
        let fields = self
            .fields
            .iter()
            .map(|field| match field.origin {
                FieldOrigin::Flag => Field {
                    ty: TypeExpr::Any,
                    ..field.clone()
                },
                FieldOrigin::Command | FieldOrigin::Synthetic => field.clone(),
            })
            .collect();
        Definition {
            fields,
            ..self.clone()
        }
    }
}

/// The root definition plus every command definition, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionSet {
    pub root: Definition,
    pub commands: BTreeMap<String, Definition>,
}

impl DefinitionSet {
    /// Root first, then commands in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        std::iter::once(&self.root).chain(self.commands.values())
    }

    pub fn get(&self, name: &str) -> Option<&Definition> {
        if name == ROOT_DEFINITION {
            Some(&self.root)
        } else {
            self.commands.get(name)
        }
    }

    /// Same shape and closedness, but every flag is typed `_`.
    ///
    /// Nothing can mismatch a wildcard, so unifying a document against this
    /// set can only ever report unknown fields.
    pub fn with_wildcard_types(&self) -> DefinitionSet {
        DefinitionSet {
            root: self.root.with_wildcard_types(),
            commands: self
                .commands
                .iter()
                .map(|(name, def)| (name.clone(), def.with_wildcard_types()))
                .collect(),
        }
    }
}

/// Build every definition for `root`.
///
/// `config_flag` names the flag that lists config files; it never becomes a
/// field. Fails when two commands map to the same definition name or two
/// members of one command map to the same field label.
pub fn build_definitions(
    root: &CommandNode,
    policy: &PathPolicy,
    config_flag: &str,
) -> Result<DefinitionSet, GenerationError> {
    let mut builder = Builder {
        policy,
        config_flag,
        commands: BTreeMap::new(),
        owners: HashMap::new(),
    };
    builder.collect(root, &[])?;
    let root = builder.definition(ROOT_DEFINITION, root, &[])?;
    Ok(DefinitionSet {
        root,
        commands: builder.commands,
    })
}

/// `"ca-url"` → `"CaUrl"`, `"my_cmd"` → `"MyCmd"`.
pub fn pascal_case(s: &str) -> String {
    s.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// `["server", "tls"]` → `"ServerTls"`.
pub fn command_def_name<S: AsRef<str>>(path: &[S]) -> String {
    let joined: Vec<&str> = path.iter().map(AsRef::as_ref).collect();
    pascal_case(&joined.join("_"))
}

/// `["server", "tls-opts"]` → `"server.tls_opts"`.
pub fn config_path<S: AsRef<str>>(path: &[S]) -> String {
    path.iter()
        .map(|segment| kebab_to_snake(segment.as_ref()))
        .collect::<Vec<_>>()
        .join(".")
}

struct Builder<'a> {
    policy: &'a PathPolicy,
    config_flag: &'a str,
    commands: BTreeMap<String, Definition>,
    /// Definition name → display path of the command that claimed it.
    owners: HashMap<String, String>,
}

impl Builder<'_> {
    fn collect(&mut self, node: &CommandNode, path: &[&str]) -> Result<(), GenerationError> {
        for child in &node.children {
            let mut child_path = path.to_vec();
            child_path.push(child.name.as_str());

            let name = command_def_name(&child_path);
            let display = child_path.join(" ");
            if name == ROOT_DEFINITION {
                return Err(GenerationError::DefinitionNameCollision {
                    name,
                    first: "<root>".into(),
                    second: display,
                });
            }
            if let Some(first) = self.owners.get(&name) {
                return Err(GenerationError::DefinitionNameCollision {
                    name,
                    first: first.clone(),
                    second: display,
                });
            }

            let definition = self.definition(&name, child, &child_path)?;
            self.owners.insert(name.clone(), display);
            self.commands.insert(name, definition);

            self.collect(child, &child_path)?;
        }
        Ok(())
    }

    fn definition(
        &self,
        name: &str,
        node: &CommandNode,
        path: &[&str],
    ) -> Result<Definition, GenerationError> {
        let dotted = config_path(path);
        let mut fields: Vec<Field> = Vec::new();
        // Field label → the declared name that produced it.
        let mut claimed: HashMap<String, String> = HashMap::new();

        let mut claim = |label: &str, source: &str| match claimed.get(label) {
            Some(first) => Err(GenerationError::FieldNameCollision {
                definition: name.to_string(),
                field: label.to_string(),
                first: first.clone(),
                second: source.to_string(),
            }),
            None => {
                claimed.insert(label.to_string(), source.to_string());
                Ok(())
            }
        };

        for flag in node.flags.iter().filter(|f| f.is_configurable(self.config_flag)) {
            let label = flag.config_key();
            claim(&label, &format!("--{}", flag.name))?;
            fields.push(Field {
                name: label,
                ty: map_type(flag),
                required: flag.required,
                help: flag.help.clone(),
                origin: FieldOrigin::Flag,
            });
        }

        for child in &node.children {
            let label = kebab_to_snake(&child.name);
            claim(&label, &child.name)?;
            let mut child_path = path.to_vec();
            child_path.push(child.name.as_str());
            fields.push(Field {
                name: label,
                ty: TypeExpr::Ref(command_def_name(&child_path)),
                required: false,
                help: child.help.clone(),
                origin: FieldOrigin::Command,
            });
        }

        for synthetic in self.policy.synthetic_fields(&dotted) {
            if fields.iter().any(|f| f.name == synthetic) {
                continue;
            }
            fields.push(Field {
                name: synthetic.to_string(),
                ty: TypeExpr::Any,
                required: false,
                help: None,
                origin: FieldOrigin::Synthetic,
            });
        }

        Ok(Definition {
            name: name.to_string(),
            closed: !self.policy.allows_unknown(&dotted),
            path: dotted,
            fields,
        })
    }
}

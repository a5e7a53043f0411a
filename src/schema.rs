//! Schema assembly: deterministic CUE text plus the compiled form.
//!
//! The text is documentation. It is what the config-doc sub-command prints
//! and what users can feed to `cue vet`. Validation never re-parses it; it
//! runs on the [`CompiledSchema`] built from the same definitions, so the two
//! cannot drift apart.
//!
//! ```text
//! #Root: close({
//! 	// Where to write logs
//! 	log_file?: string
//! 	agent?: #Agent
//! })
//!
//! #Agent: close({
//! 	ca_url: string
//! 	match?: [...string]
//! })
//! ```

use std::fmt::Write as _;

use crate::definition::{Definition, DefinitionSet, build_definitions};
use crate::engine::CompiledSchema;
use crate::error::GenerationError;
use crate::policy::PathPolicy;
use crate::types::CommandNode;

const HEADER: &[&str] = &[
    "Configuration schema for validating config files.",
    "",
    "This schema is written in CUE (https://cuelang.org), a language for",
    "describing and validating configuration data.",
    "",
    "To check a config file against it:",
    "  1. Save this schema to a file, e.g. schema.cue",
    "  2. Run: cue vet -d '#Root' schema.cue your-config.yaml",
    "",
    "Fields marked with ? are optional. Fields without ? are required.",
];

/// A generated schema: its text and its compiled form.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    text: String,
    compiled: CompiledSchema,
}

impl Schema {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn compiled(&self) -> &CompiledSchema {
        &self.compiled
    }

    pub fn definitions(&self) -> &DefinitionSet {
        self.compiled.definitions()
    }
}

/// Build definitions for `tree` and assemble them.
pub fn generate(
    tree: &CommandNode,
    policy: &PathPolicy,
    config_flag: &str,
) -> Result<Schema, GenerationError> {
    let definitions = build_definitions(tree, policy, config_flag)?;
    let schema = assemble(definitions)?;
    tracing::debug!(
        event = "clapcue.schema.generated",
        definitions = schema.definitions().commands.len() + 1,
        open_everywhere = policy.allows_all(),
    );
    Ok(schema)
}

/// Render and compile a definition set.
pub fn assemble(definitions: DefinitionSet) -> Result<Schema, GenerationError> {
    let text = render(&definitions);
    let compiled = CompiledSchema::compile(definitions)?;
    Ok(Schema { text, compiled })
}

/// `#Root` first with the header, then every command definition in name
/// order, separated by blank lines.
pub fn render(definitions: &DefinitionSet) -> String {
    let mut out = String::new();
    for line in HEADER {
        if line.is_empty() {
            out.push_str("//\n");
        } else {
            let _ = writeln!(out, "// {line}");
        }
    }
    for (i, def) in definitions.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        render_definition(&mut out, def);
    }
    out
}

fn render_definition(out: &mut String, def: &Definition) {
    let (open, close) = if def.closed {
        ("close({", "})")
    } else {
        ("{", "}")
    };

    if def.closed && def.fields.is_empty() {
        let _ = writeln!(out, "#{}: close({{}})", def.name);
        return;
    }

    let _ = writeln!(out, "#{}: {open}", def.name);
    for field in &def.fields {
        if let Some(help) = &field.help {
            for line in help.lines() {
                let _ = writeln!(out, "\t// {}", line.trim_end());
            }
        }
        let marker = if field.required { "" } else { "?" };
        let _ = writeln!(out, "\t{}{marker}: {}", label(&field.name), field.ty);
    }
    if !def.closed {
        out.push_str("\t...\n");
    }
    let _ = writeln!(out, "{close}");
}

/// Bare identifier when possible, quoted otherwise.
fn label(name: &str) -> String {
    let mut chars = name.chars();
    let bare = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !name.starts_with("_#");
    if bare {
        name.to_string()
    } else {
        format!("{name:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{agent_cli, nested_cli, schema_cli};

    fn text(tree: &CommandNode, policy: &PathPolicy) -> String {
        generate(tree, policy, "config").unwrap().text().to_string()
    }

    #[test]
    fn agent_schema_text() {
        let out = text(&agent_cli(), &PathPolicy::strict());
        let body = out.split_once("#Root").unwrap().1;
        assert_eq!(
            body,
            ": close({
\t// Where to write logs
\tlog_file?: string
\t// Run the agent
\tagent?: #Agent
})

#Agent: close({
\t// CA endpoint
\tca_url: string
\tmatch?: [...string]
})
"
        );
    }

    #[test]
    fn header_explains_validation() {
        let out = text(&agent_cli(), &PathPolicy::strict());
        assert!(out.starts_with("// Configuration schema"));
        assert!(out.contains("cue vet -d '#Root'"));
        assert!(out.contains("Fields marked with ? are optional"));
    }

    #[test]
    fn definitions_sorted_after_root() {
        let tree = CommandNode::root()
            .child(CommandNode::new("zeta"))
            .child(CommandNode::new("alpha"));
        let out = text(&tree, &PathPolicy::strict());
        let root = out.find("#Root:").unwrap();
        let alpha = out.find("#Alpha:").unwrap();
        let zeta = out.find("#Zeta:").unwrap();
        assert!(root < alpha && alpha < zeta);
        assert!(out.contains("#Alpha: close({})"));
    }

    #[test]
    fn open_definitions_end_with_ellipsis() {
        let out = text(&nested_cli(), &PathPolicy::allow_paths(["server"]));
        assert!(out.contains("#Root: close({"));
        assert!(out.contains("\t// Server configuration\n\tserver?: #Server\n"));
        assert!(out.contains("#Server: {\n\tport?: int\n\ttls?: #ServerTls\n\t...\n}"));
        assert!(out.contains("#ServerTls: {\n\t// PEM certificate\n\tcert_file?: string\n\t...\n}"));
    }

    #[test]
    fn synthetic_fields_render_as_wildcards() {
        let out = text(&nested_cli(), &PathPolicy::allow_paths(["messy"]));
        assert!(out.contains("\tmessy?: _\n"));
    }

    #[test]
    fn every_kind_renders() {
        let out = text(&schema_cli(), &PathPolicy::strict());
        assert!(out.contains("\t// Increase verbosity\n\tverbose?: int\n"));
        assert!(out.contains("\tdebug?: bool\n"));
        assert!(out.contains("\tratio?: number\n"));
        assert!(out.contains("\tlabels?: {[string]: _}\n"));
        assert!(out.contains("\tport?: int\n"));
        assert!(!out.contains("config?"));
        assert!(!out.contains("token"));
    }

    #[test]
    fn generation_is_deterministic() {
        let policy = PathPolicy::allow_paths(["server.extra"]);
        let first = text(&nested_cli(), &policy);
        let second = text(&nested_cli(), &policy);
        assert_eq!(first, second);
    }

    #[test]
    fn odd_labels_are_quoted() {
        assert_eq!(label("log_file"), "log_file");
        assert_eq!(label("2fa"), "\"2fa\"");
        assert_eq!(label("a.b"), "\"a.b\"");
    }
}

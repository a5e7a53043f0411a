use std::collections::BTreeMap;

use toml::Table;

use crate::error::ClapcueError;
use crate::file;
use crate::policy::SchemaOptions;
use crate::resolve::{self, FlagValue};
use crate::schema::{self, Schema};
use crate::types::{CommandNode, FlagKind, FlagSpec};
use crate::validate::{self, BoundDocument};

pub(crate) const DEFAULT_CONFIG_FLAG: &str = "config";
pub(crate) const DEFAULT_CONFIG_DOC_COMMAND: &str = "config-doc";
pub(crate) const DEFAULT_SEPARATOR: &str = ",";

/// Entry point for building a clapcue configuration.
pub struct Clapcue;

impl Clapcue {
    pub fn builder() -> ClapcueBuilder {
        ClapcueBuilder::new()
    }
}

/// Builder for schema generation, config loading and flag resolution.
///
/// Every option lives on the builder value itself. Nothing is stashed in
/// process-wide state, so two builders never see each other's settings and
/// a builder can be reused for any number of parses.
#[derive(Debug, Clone)]
pub struct ClapcueBuilder {
    pub(crate) options: SchemaOptions,
    pub(crate) config_flag: String,
    pub(crate) config_doc_command: Option<String>,
    pub(crate) separator: String,
    /// Explicit kinds keyed by dotted flag path (`"agent.port"`).
    pub(crate) flag_kinds: BTreeMap<String, FlagKind>,
    files: Vec<String>,
}

impl ClapcueBuilder {
    fn new() -> Self {
        Self {
            options: SchemaOptions::default(),
            config_flag: DEFAULT_CONFIG_FLAG.to_string(),
            config_doc_command: Some(DEFAULT_CONFIG_DOC_COMMAND.to_string()),
            separator: DEFAULT_SEPARATOR.to_string(),
            flag_kinds: BTreeMap::new(),
            files: Vec::new(),
        }
    }

    /// Tolerate unknown config keys at and below each dotted path.
    ///
    /// An empty list tolerates them everywhere, same as
    /// [`allow_all_unknown_fields`](Self::allow_all_unknown_fields).
    pub fn allow_unknown_fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        if paths.is_empty() {
            self.options.allow_all = true;
        } else {
            self.options.allow_unknown_paths.extend(paths);
        }
        self
    }

    /// Tolerate unknown config keys everywhere.
    pub fn allow_all_unknown_fields(mut self) -> Self {
        self.options.allow_all = true;
        self
    }

    /// Replace the unknown-field settings wholesale.
    pub fn schema_options(mut self, options: SchemaOptions) -> Self {
        self.options = options;
        self
    }

    /// Name of the flag that lists config files (default: `"config"`).
    pub fn config_flag(mut self, name: &str) -> Self {
        self.config_flag = name.to_string();
        self
    }

    /// Name of the sub-command that prints the schema (default: `"config-doc"`).
    pub fn config_doc_command(mut self, name: &str) -> Self {
        self.config_doc_command = Some(name.to_string());
        self
    }

    /// Don't offer a schema-printing sub-command.
    pub fn no_config_doc(mut self) -> Self {
        self.config_doc_command = None;
        self
    }

    /// Separator used to join list and map values (default: `","`).
    pub fn separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    /// Declare the kind of the flag at `path` (`"agent.port"`, or `"port"` at
    /// the root) instead of deriving it from the argument parser.
    pub fn flag_kind(mut self, path: &str, kind: FlagKind) -> Self {
        self.flag_kinds.insert(path.to_string(), kind);
        self
    }

    /// Config file patterns for [`load`](Self::load).
    pub fn files<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Generate the schema for `tree` under the current options.
    pub fn schema(&self, tree: &CommandNode) -> Result<Schema, ClapcueError> {
        let policy = self.options.policy();
        Ok(schema::generate(tree, &policy, &self.config_flag)?)
    }

    /// The schema document as text, for a documentation command.
    pub fn schema_text(&self, tree: &CommandNode) -> Result<String, ClapcueError> {
        Ok(self.schema(tree)?.text().to_string())
    }

    /// Validate an already-merged document and bind it.
    ///
    /// An empty document means no configuration was supplied; it binds
    /// without validation so required flags fall back to the argument
    /// parser's own checks.
    pub fn bind(&self, tree: &CommandNode, document: &Table) -> Result<Binding, ClapcueError> {
        if document.is_empty() {
            tracing::debug!(event = "clapcue.validation.skipped", reason = "empty document");
            return Ok(self.binding(BoundDocument::default()));
        }
        let policy = self.options.policy();
        let schema = schema::generate(tree, &policy, &self.config_flag)?;
        let bound = validate::validate(document, &schema, &policy).map_err(ClapcueError::Invalid)?;
        Ok(self.binding(bound))
    }

    /// Load the files given to [`files`](Self::files), then bind.
    pub fn load(&self, tree: &CommandNode) -> Result<Binding, ClapcueError> {
        self.load_from(tree, &self.files)
    }

    /// Load explicit file patterns, then bind.
    pub fn load_from<S: AsRef<str>>(
        &self,
        tree: &CommandNode,
        patterns: &[S],
    ) -> Result<Binding, ClapcueError> {
        let document = file::load_and_unify(patterns)?;
        self.bind(tree, &document)
    }

    fn binding(&self, document: BoundDocument) -> Binding {
        Binding {
            document,
            separator: self.separator.clone(),
        }
    }
}

/// A validated config document, ready to answer flag lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    document: BoundDocument,
    separator: String,
}

impl Binding {
    pub fn document(&self) -> &BoundDocument {
        &self.document
    }

    /// Default for `flag` on the command at `command_path`, if the config
    /// supplies one.
    pub fn resolve<S: AsRef<str>>(&self, command_path: &[S], flag: &FlagSpec) -> Option<FlagValue> {
        resolve::resolve(&self.document, command_path, flag, &self.separator)
    }
}

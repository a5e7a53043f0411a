//! Strict config files for command-line apps, with the schema derived from
//! the command tree itself.
//!
//! Clapcue lets users put any flag of your CLI into a YAML, JSON or TOML file.
//! It reads the declared commands and flags, generates a schema from them,
//! checks every config file against that schema, and only then feeds the
//! values in as flag defaults.
//!
//! ```ignore
//! let cli = match Clapcue::builder().try_parse::<Cli>()? {
//!     Outcome::Run(cli) => cli,
//!     Outcome::ConfigDoc(schema) => {
//!         print!("{schema}");
//!         return Ok(());
//!     }
//! };
//! ```
//!
//! With that call, `myapp --config ~/.myapp.yaml agent` loads the file,
//! rejects keys that match no flag, rejects values of the wrong type, and
//! fills `--ca-url` from `agent.ca_url` unless it was given on the command
//! line.
//!
//! # Why clapcue
//!
//! Config files for CLIs usually drift. A flag gets renamed, the old key
//! lingers in someone's config and is silently ignored. A number gets quoted
//! and fails three layers down with an unhelpful message. Clapcue treats the
//! command tree as the only source of truth. There is no separate schema to
//! keep in sync, and a config key either maps to a real flag or is an error.
//!
//! # Key mapping
//!
//! Every command becomes a nested section and every flag a snake_case key:
//!
//! | Flag | Config key |
//! |------|------------|
//! | `myapp --log-file` | `log_file` |
//! | `myapp agent --ca-url` | `agent.ca_url` |
//! | `myapp server tls --cert-file` | `server.tls.cert_file` |
//!
//! `--help`, `--version`, hidden flags and the config flag itself never
//! appear in the schema.
//!
//! # The schema
//!
//! The generated schema is plain [CUE](https://cuelang.org) text, one
//! definition per command:
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
//!
//! Optional fields carry `?`; flags declared required do not. Output is
//! byte-for-byte deterministic, so it can be checked in and diffed. Users
//! see it through the `config-doc` sub-command, and can validate files with
//! `cue vet` without running your app.
//!
//! Validation itself does not need a CUE toolchain: the same definitions
//! are checked by a small structural engine inside this crate.
//!
//! # Validation
//!
//! Documents are checked in two passes so the report can tell problems
//! apart:
//!
//! - **Unknown fields.** The schema with every type replaced by `_`. Only a
//!   key that no flag or command declares can fail here.
//! - **Strict.** The real types and required flags. Failures are type
//!   mismatches or missing required fields.
//!
//! Both passes always run and everything they find is reported at once:
//!
//! ```text
//! agent.bad_field: field not allowed
//! agent.port: conflicting values: expected int, found "eighty"
//! Hint: Check that all config keys correspond to valid CLI flags
//! ```
//!
//! Scalars coerce from strings where that is unambiguous: `"8080"` is a
//! valid `int`, `"true"` a valid `bool`.
//!
//! # Unknown fields
//!
//! Everything is closed by default. Open parts of the document with
//! [`allow_unknown_fields`](ClapcueBuilder::allow_unknown_fields):
//!
//! - `["messy"]` opens the top-level `messy` key and everything below it.
//! - `["agent"]` opens the whole `agent` section, so `agent.anything` passes
//!   while `anything` at the top level still fails.
//! - `[]` or [`allow_all_unknown_fields`](ClapcueBuilder::allow_all_unknown_fields)
//!   opens everything and skips the unknown-field pass.
//!
//! # Loading files
//!
//! The config flag (`--config` by default) takes file patterns. `~` expands
//! to the home directory, `{a,b}` alternatives and glob wildcards expand to
//! every match. Missing files are skipped. Files that are found are unified,
//! not layered: two files may both set a key only if they agree on its value,
//! otherwise loading fails naming both files.
//!
//! # Precedence
//!
//! ```text
//! Flag's own default        #[arg(default_value = ...)]
//!        ↑ overridden by
//! Config files              --config, unified
//!        ↑ overridden by
//! Command line              --flag value
//! ```
//!
//! A config value that equals the zero of its type (`false`, `0`, `""`, an
//! empty list) counts as absent and never overrides a flag's own default.
//! See [`resolve`](crate::resolve).
//!
//! # Core library
//!
//! The clap adapter (the `cli` module, behind the `clap` Cargo feature, on by
//! default) is a thin layer. Everything else works on a plain
//! [`CommandNode`] tree and a `toml::Table`, so other argument parsers can
//! build the tree by hand and use [`ClapcueBuilder::schema_text`],
//! [`ClapcueBuilder::bind`] and [`Binding::resolve`] directly.
//!
//! # Error handling
//!
//! All fallible operations return [`ClapcueError`]. A broken schema (two
//! commands mapping to the same definition name, for example) is a
//! [`GenerationError`] and points at the CLI declaration. A bad config file
//! is a [`ValidationReport`] listing every [`Violation`]. See the [`error`]
//! module for the full set.

pub mod error;
pub mod resolve;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod definition;
mod engine;
mod file;
mod merge;
mod policy;
mod schema;
mod typemap;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{Binding, Clapcue, ClapcueBuilder};
#[cfg(feature = "clap")]
pub use cli::Outcome;
pub use definition::{Definition, DefinitionSet, Field, FieldOrigin, build_definitions};
pub use engine::{CompiledSchema, Concreteness, Unified};
pub use error::{ClapcueError, GenerationError, ValidationReport, Violation};
pub use file::load_and_unify;
pub use policy::{PathPolicy, SchemaOptions};
pub use resolve::FlagValue;
pub use schema::{Schema, assemble, generate};
pub use typemap::{TypeExpr, map_type};
pub use types::{CommandNode, FlagKind, FlagSpec, ScalarKind};
pub use validate::{BoundDocument, validate};

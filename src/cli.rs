//! Clap adapter for clapcue.
//!
//! This module is the **optional integration layer** between clapcue's
//! parser-agnostic core and [clap](https://docs.rs/clap). It is compiled only
//! when the `clap` Cargo feature is enabled (on by default).
//!
//! A parse goes through four steps:
//!
//! 1. A lenient pre-parse reads the raw values of the config flag and spots
//!    the config-doc sub-command. Invoking it short-circuits everything else
//!    and yields [`Outcome::ConfigDoc`] with the schema text.
//! 2. The listed files are loaded, unified, validated and bound.
//! 3. Every flag the config supplies gets that value installed as its clap
//!    default, and stops being required.
//! 4. The real parse runs. Explicit command-line arguments beat defaults, so
//!    they beat the config file.
//!
//! Flag kinds come from each argument's [`ArgAction`]. Value parsers are
//! opaque, so an `Option<u16>` flag is seen as a string unless tagged with
//! [`flag_kind`](ClapcueBuilder::flag_kind).

use std::ffi::OsString;

use clap::{Arg, ArgAction, ArgMatches, Command, Parser};

use crate::builder::{Binding, ClapcueBuilder};
use crate::error::ClapcueError;
use crate::resolve::lookup_key;
use crate::types::{CommandNode, FlagKind, FlagSpec, ScalarKind};

/// What a parse produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Normal invocation.
    Run(T),
    /// The config-doc sub-command was invoked; print this and exit.
    ConfigDoc(String),
}

impl ClapcueBuilder {
    /// The command tree clapcue sees for `cmd`.
    pub fn command_tree(&self, cmd: &Command) -> CommandNode {
        self.node(cmd, String::new(), &[])
    }

    /// Parse `args` against `cmd`, with config-file values as flag defaults.
    pub fn try_get_matches_from<I, T>(
        &self,
        cmd: Command,
        args: I,
    ) -> Result<Outcome<ArgMatches>, ClapcueError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let cmd = self.prepare(cmd);
        let tree = self.command_tree(&cmd);

        let mut patterns: Vec<String> = Vec::new();
        if let Ok(pre) = cmd.clone().ignore_errors(true).try_get_matches_from(&args) {
            let chain = invoked_chain(&pre);
            if let Some(doc) = &self.config_doc_command
                && chain.iter().skip(1).any(|(name, _)| name == doc)
            {
                return Ok(Outcome::ConfigDoc(self.schema_text(&tree)?));
            }
            patterns = self.config_patterns(&chain);
        }

        let binding = self.load_from(&tree, &patterns)?;
        let cmd = self.install_defaults(cmd, &binding, &[]);
        Ok(Outcome::Run(cmd.try_get_matches_from(args)?))
    }

    /// Like [`try_get_matches_from`](Self::try_get_matches_from), for a clap
    /// derive type.
    pub fn try_parse_from<P, I, T>(&self, args: I) -> Result<Outcome<P>, ClapcueError>
    where
        P: Parser,
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match self.try_get_matches_from(P::command(), args)? {
            Outcome::Run(mut matches) => Ok(Outcome::Run(P::from_arg_matches_mut(&mut matches)?)),
            Outcome::ConfigDoc(text) => Ok(Outcome::ConfigDoc(text)),
        }
    }

    /// Parse the process arguments.
    pub fn try_parse<P: Parser>(&self) -> Result<Outcome<P>, ClapcueError> {
        self.try_parse_from(std::env::args_os())
    }

    /// Add the config flag and config-doc sub-command unless `cmd` already
    /// declares them.
    fn prepare(&self, mut cmd: Command) -> Command {
        if !cmd.get_arguments().any(|a| a.get_id() == self.config_flag.as_str()) {
            cmd = cmd.arg(
                Arg::new(self.config_flag.clone())
                    .long(self.config_flag.clone())
                    .value_name("FILE")
                    .action(ArgAction::Append)
                    .global(true)
                    .help("Config file to load (globs allowed, may repeat)"),
            );
        }
        if let Some(doc) = &self.config_doc_command
            && cmd.find_subcommand(doc).is_none()
        {
            cmd = cmd.subcommand(Command::new(doc.clone()).about("Print the config file schema"));
        }
        cmd
    }

    fn node(&self, cmd: &Command, name: String, path: &[String]) -> CommandNode {
        let flags = self.flag_specs(cmd, path).into_iter().map(|(_, spec)| spec).collect();
        let children = cmd
            .get_subcommands()
            .filter(|sub| self.is_config_command(sub))
            .map(|sub| {
                let mut child_path = path.to_vec();
                child_path.push(sub.get_name().to_string());
                self.node(sub, sub.get_name().to_string(), &child_path)
            })
            .collect();
        CommandNode {
            name,
            help: cmd.get_about().map(ToString::to_string),
            flags,
            children,
        }
    }

    fn is_config_command(&self, sub: &Command) -> bool {
        !sub.is_hide_set() && self.config_doc_command.as_deref() != Some(sub.get_name())
    }

    /// `(arg id, flag)` for every named argument of `cmd`.
    fn flag_specs(&self, cmd: &Command, path: &[String]) -> Vec<(String, FlagSpec)> {
        cmd.get_arguments()
            .filter(|arg| !arg.is_positional())
            .filter(|arg| {
                !matches!(
                    arg.get_action(),
                    ArgAction::Help | ArgAction::HelpShort | ArgAction::HelpLong | ArgAction::Version
                )
            })
            .map(|arg| {
                let name = arg
                    .get_long()
                    .map(str::to_string)
                    .unwrap_or_else(|| arg.get_id().to_string());
                let kind = self
                    .flag_kinds
                    .get(&lookup_key(path, &name))
                    .copied()
                    .unwrap_or_else(|| kind_from_action(arg.get_action()));
                let spec = FlagSpec {
                    help: arg.get_help().map(ToString::to_string),
                    required: arg.is_required_set(),
                    hidden: arg.is_hide_set(),
                    kind,
                    name,
                };
                (arg.get_id().to_string(), spec)
            })
            .collect()
    }

    /// Raw config-flag values from the deepest invoked command carrying them.
    ///
    /// Global arguments are copied down to every sub-command, so the deepest
    /// level sees values given anywhere above it.
    fn config_patterns(&self, chain: &[(String, &ArgMatches)]) -> Vec<String> {
        chain
            .iter()
            .rev()
            .find_map(|(_, matches)| {
                let raw = matches.try_get_raw(&self.config_flag).ok().flatten()?;
                Some(
                    raw.map(|v| v.to_string_lossy().into_owned())
                        .collect::<Vec<_>>(),
                )
            })
            .unwrap_or_default()
    }

    fn install_defaults(&self, mut cmd: Command, binding: &Binding, path: &[String]) -> Command {
        for (id, spec) in self.flag_specs(&cmd, path) {
            if !spec.is_configurable(&self.config_flag) {
                continue;
            }
            let Some(value) = binding.resolve(path, &spec) else {
                continue;
            };
            let value = value.to_string();
            let separator = self.separator.clone();
            cmd = cmd.mut_arg(id, |arg| {
                let arg = arg.required(false);
                match spec.kind {
                    FlagKind::List(_) | FlagKind::Map => arg.default_values(
                        value
                            .split(separator.as_str())
                            .map(str::to_string)
                            .collect::<Vec<_>>(),
                    ),
                    _ => arg.default_value(value),
                }
            });
        }

        let children: Vec<String> = cmd
            .get_subcommands()
            .filter(|sub| self.is_config_command(sub))
            .map(|sub| sub.get_name().to_string())
            .collect();
        for name in children {
            let mut child_path = path.to_vec();
            child_path.push(name.clone());
            cmd = cmd.mut_subcommand(name, |sub| self.install_defaults(sub, binding, &child_path));
        }
        cmd
    }
}

fn kind_from_action(action: &ArgAction) -> FlagKind {
    match action {
        ArgAction::SetTrue | ArgAction::SetFalse => FlagKind::Bool,
        ArgAction::Count => FlagKind::Counter,
        ArgAction::Append => FlagKind::List(ScalarKind::String),
        ArgAction::Set => FlagKind::Scalar(ScalarKind::String),
        _ => FlagKind::Unset,
    }
}

/// Root matches followed by each invoked sub-command's, with their names.
fn invoked_chain(root: &ArgMatches) -> Vec<(String, &ArgMatches)> {
    let mut chain = vec![(String::new(), root)];
    let mut current = root;
    while let Some((name, sub)) = current.subcommand() {
        chain.push((name.to_string(), sub));
        current = sub;
    }
    chain
}

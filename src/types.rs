//! The command tree as the schema generator sees it.
//!
//! A [`CommandNode`] is a read-only snapshot of one command (or the root
//! application): its flags, its invokable sub-commands, and its help text.
//! The clap adapter builds one from a `clap::Command`; callers using another
//! argument parser can build one by hand.
//!
//! ```
//! use clapcue::{CommandNode, FlagKind, FlagSpec, ScalarKind};
//!
//! let tree = CommandNode::root()
//!     .flag(FlagSpec::new("log-file", FlagKind::Scalar(ScalarKind::String)))
//!     .child(
//!         CommandNode::new("agent")
//!             .flag(FlagSpec::new("ca-url", FlagKind::Scalar(ScalarKind::String)).required())
//!             .flag(FlagSpec::new("match", FlagKind::List(ScalarKind::String))),
//!     );
//! assert_eq!(tree.children.len(), 1);
//! ```

/// Flag names that never appear in a generated schema.
pub const RESERVED_FLAGS: &[&str] = &["help", "help-all", "version"];

/// Element or value kind of a scalar flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    /// Any signed or unsigned integer width.
    Integer,
    /// Any floating point width.
    Float,
    Bool,
    /// A type the declaring side could not classify.
    Unknown,
}

/// The closed set of value shapes a flag can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Scalar(ScalarKind),
    /// Repeatable flag; the payload is the element kind.
    List(ScalarKind),
    /// `key=value` pairs.
    Map,
    /// `-v -v -v` style occurrence counter.
    Counter,
    /// Switch with no value.
    Bool,
    /// No kind declared.
    Unset,
}

impl FlagKind {
    pub fn is_list(self) -> bool {
        matches!(self, FlagKind::List(_))
    }
}

/// One declared flag.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagSpec {
    /// Kebab-case name as typed on the command line, without dashes.
    pub name: String,
    pub help: Option<String>,
    pub required: bool,
    pub hidden: bool,
    pub kind: FlagKind,
}

impl FlagSpec {
    pub fn new(name: impl Into<String>, kind: FlagKind) -> Self {
        Self {
            name: name.into(),
            help: None,
            required: false,
            hidden: false,
            kind,
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Name of the config key this flag reads from (`ca-url` → `ca_url`).
    pub fn config_key(&self) -> String {
        kebab_to_snake(&self.name)
    }

    /// Whether the flag belongs in the generated schema at all.
    ///
    /// Hidden flags, `--help`/`--version` and the config file flag itself
    /// (`config_flag`) are left out.
    pub fn is_configurable(&self, config_flag: &str) -> bool {
        !self.hidden && self.name != config_flag && !RESERVED_FLAGS.contains(&self.name.as_str())
    }
}

/// A command, or the root application when `name` is empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandNode {
    pub name: String,
    pub help: Option<String>,
    pub flags: Vec<FlagSpec>,
    /// Invokable sub-commands only.
    pub children: Vec<CommandNode>,
}

impl CommandNode {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn flag(mut self, flag: FlagSpec) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn child(mut self, child: CommandNode) -> Self {
        self.children.push(child);
        self
    }
}

/// `ca-url` → `ca_url`.
pub fn kebab_to_snake(s: &str) -> String {
    s.replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_key_is_snake_case() {
        let flag = FlagSpec::new("ca-url", FlagKind::Scalar(ScalarKind::String));
        assert_eq!(flag.config_key(), "ca_url");
    }

    #[test]
    fn reserved_and_hidden_flags_are_not_configurable() {
        let help = FlagSpec::new("help", FlagKind::Bool);
        let config = FlagSpec::new("config", FlagKind::List(ScalarKind::String));
        let secret = FlagSpec::new("token", FlagKind::Scalar(ScalarKind::String)).hidden();
        let name = FlagSpec::new("name", FlagKind::Scalar(ScalarKind::String));
        assert!(!help.is_configurable("config"));
        assert!(!config.is_configurable("config"));
        assert!(!secret.is_configurable("config"));
        assert!(name.is_configurable("config"));
    }

    #[test]
    fn builder_methods_compose() {
        let node = CommandNode::new("server")
            .help("Run the server")
            .flag(FlagSpec::new("port", FlagKind::Scalar(ScalarKind::Integer)).required())
            .child(CommandNode::new("tls"));
        assert_eq!(node.help.as_deref(), Some("Run the server"));
        assert!(node.flags[0].required);
        assert_eq!(node.children[0].name, "tls");
    }
}

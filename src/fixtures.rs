#[cfg(test)]
pub mod test {
    use toml::Table;

    use crate::types::{CommandNode, FlagKind, FlagSpec, ScalarKind};

    fn string(name: &str) -> FlagSpec {
        FlagSpec::new(name, FlagKind::Scalar(ScalarKind::String))
    }

    /// Root `--log-file`, plus `agent` with a required `--ca-url` and a
    /// repeatable `--match`.
    pub fn agent_cli() -> CommandNode {
        CommandNode::root()
            .flag(string("log-file").help("Where to write logs"))
            .child(
                CommandNode::new("agent")
                    .help("Run the agent")
                    .flag(string("ca-url").help("CA endpoint").required())
                    .flag(FlagSpec::new("match", FlagKind::List(ScalarKind::String))),
            )
    }

    /// A wider tree with every flag kind, all optional.
    pub fn schema_cli() -> CommandNode {
        CommandNode::root()
            .flag(FlagSpec::new("verbose", FlagKind::Counter).help("Increase verbosity"))
            .flag(string("log-file"))
            .flag(FlagSpec::new("debug", FlagKind::Bool))
            .flag(FlagSpec::new("ratio", FlagKind::Scalar(ScalarKind::Float)))
            .flag(FlagSpec::new("labels", FlagKind::Map))
            .flag(FlagSpec::new("config", FlagKind::List(ScalarKind::String)))
            .flag(FlagSpec::new("help", FlagKind::Bool))
            .flag(string("token").hidden())
            .child(
                CommandNode::new("agent")
                    .flag(string("ca-url"))
                    .flag(FlagSpec::new("match", FlagKind::List(ScalarKind::String)))
                    .flag(FlagSpec::new("port", FlagKind::Scalar(ScalarKind::Integer))),
            )
    }

    /// `server` with a nested `tls` command.
    pub fn nested_cli() -> CommandNode {
        CommandNode::root().child(
            CommandNode::new("server")
                .help("Server configuration")
                .flag(FlagSpec::new("port", FlagKind::Scalar(ScalarKind::Integer)))
                .child(CommandNode::new("tls").flag(string("cert-file").help("PEM certificate"))),
        )
    }

    pub fn doc(toml_str: &str) -> Table {
        toml_str.parse::<Table>().unwrap()
    }

    #[test]
    fn agent_cli_shape() {
        let tree = agent_cli();
        assert_eq!(tree.flags.len(), 1);
        assert_eq!(tree.children[0].name, "agent");
        assert!(tree.children[0].flags[0].required);
    }
}

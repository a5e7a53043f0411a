#![cfg(feature = "clap")]

use std::fs;

use clap::{Parser, Subcommand};
use clapcue::{Clapcue, ClapcueError, FlagKind, Outcome, ScalarKind};
use tempfile::TempDir;

#[derive(Debug, Parser)]
#[command(name = "tool")]
struct Cli {
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, global = true)]
    config: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Serve {
        #[arg(long, required = true)]
        port: u16,

        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn builder() -> clapcue::ClapcueBuilder {
    Clapcue::builder().flag_kind("serve.port", FlagKind::Scalar(ScalarKind::Integer))
}

fn parse(args: &[&str]) -> Result<Cli, ClapcueError> {
    match builder().try_parse_from::<Cli, _, _>(args)? {
        Outcome::Run(cli) => Ok(cli),
        Outcome::ConfigDoc(text) => panic!("unexpected config doc:\n{text}"),
    }
}

#[test]
fn toml_config_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "tool.toml", "verbose = 2\n[serve]\nport = 8080\nhost = \"127.0.0.1\"\n");
    let cli = parse(&["tool", "--config", path.as_str(), "serve"]).unwrap();
    assert_eq!(cli.verbose, 2);
    let Commands::Serve { port, host } = cli.command;
    assert_eq!(port, 8080);
    assert_eq!(host, "127.0.0.1");
}

#[test]
fn zero_in_config_keeps_flag_default() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "tool.yaml", "serve:\n  port: 9000\n  host: ''\n");
    let cli = parse(&["tool", "serve", "--config", path.as_str()]).unwrap();
    let Commands::Serve { port, host } = cli.command;
    assert_eq!(port, 9000);
    assert_eq!(host, "0.0.0.0");
}

#[test]
fn glob_loads_agreeing_files() {
    let dir = TempDir::new().unwrap();
    write(&dir, "a.yaml", "serve:\n  port: 7000\n");
    write(&dir, "b.json", r#"{"serve": {"port": 7000, "host": "localhost"}}"#);
    let pattern = dir.path().join("*.{yaml,json}").to_string_lossy().into_owned();
    let cli = parse(&["tool", "--config", pattern.as_str(), "serve"]).unwrap();
    let Commands::Serve { port, host } = cli.command;
    assert_eq!(port, 7000);
    assert_eq!(host, "localhost");
}

#[test]
fn disagreeing_files_conflict() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.yaml", "serve:\n  port: 7000\n");
    let b = write(&dir, "b.yaml", "serve:\n  port: 7001\n");
    let err = parse(&["tool", "--config", a.as_str(), "--config", b.as_str(), "serve"]).unwrap_err();
    match err {
        ClapcueError::ConfigConflict { key, .. } => assert_eq!(key, "serve.port"),
        other => panic!("Expected ConfigConflict, got: {other:?}"),
    }
}

#[test]
fn wrong_type_is_reported_before_clap_runs() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "tool.yaml", "serve:\n  port: eighty\n");
    let err = parse(&["tool", "--config", path.as_str(), "serve"]).unwrap_err();
    let ClapcueError::Invalid(report) = err else {
        panic!("expected an invalid config report");
    };
    assert_eq!(
        report.to_string(),
        "serve.port: conflicting values: expected int, found \"eighty\""
    );
}

#[test]
fn config_doc_lists_every_command() {
    let out = builder().try_parse_from::<Cli, _, _>(["tool", "config-doc"]).unwrap();
    let Outcome::ConfigDoc(text) = out else {
        panic!("expected config doc");
    };
    assert!(text.contains("\tverbose?: int\n"));
    assert!(text.contains("\tserve?: #Serve\n"));
    assert!(text.contains("#Serve: close({\n\tport: int\n\thost?: string\n})"));
}

//! # clapcue demo application
//!
//! A small greeter CLI that shows how to wire
//! [clapcue](https://docs.rs/clapcue) into a clap derive app. It exists to
//! demonstrate and manually verify clapcue's behavior, not to be useful.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example greeter -- greet --name Ada
//! cargo run --example greeter -- config-doc
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                    | How to exercise it                                                      |
//! |----------------------------|-------------------------------------------------------------------------|
//! | Print the schema           | `cargo run --example greeter -- config-doc`                             |
//! | Config supplies a flag     | Put `greet: {name: Ada}` in `greeter.yaml`, run `-- --config greeter.yaml greet` |
//! | Command line wins          | Same file, run `-- --config greeter.yaml greet --name Grace`            |
//! | Unknown key rejected       | Add `greet: {nmae: x}` to the file                                      |
//! | Wrong type rejected        | Add `greet: {times: many}` to the file                                  |
//! | Tolerated section          | Anything under `messy:` is accepted                                     |
//! | Several files              | `-- --config 'conf.d/*.yaml' greet` (files must agree on shared keys)    |
//! | Logging                    | `RUST_LOG=clapcue=debug cargo run --example greeter -- ...`             |

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use clapcue::{Clapcue, ClapcueError, FlagKind, Outcome, ScalarKind};

/// greeter: says hello and goodbye, configurably.
#[derive(Parser, Debug)]
#[command(name = "greeter")]
struct Cli {
    /// Shout everything.
    #[arg(long, global = true)]
    loud: bool,

    /// Config files to load (globs allowed, `;`-separated or repeated).
    #[arg(long, global = true, value_delimiter = ';')]
    config: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Say hello.
    Greet(GreetArgs),
    /// Say goodbye.
    Depart {
        /// Who is leaving.
        #[arg(long, default_value = "friend")]
        name: String,
    },
}

#[derive(Args, Debug)]
struct GreetArgs {
    /// Who to greet.
    #[arg(long, required = true)]
    name: String,

    /// How many times.
    #[arg(long, default_value_t = 1)]
    times: u32,

    /// Extra words to append.
    #[arg(long = "word")]
    words: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let builder = Clapcue::builder()
        .allow_unknown_fields(["messy"])
        .flag_kind("greet.times", FlagKind::Scalar(ScalarKind::Integer));

    let cli = match builder.try_parse::<Cli>() {
        Ok(Outcome::Run(cli)) => cli,
        Ok(Outcome::ConfigDoc(schema)) => {
            print!("{schema}");
            return;
        }
        Err(ClapcueError::Clap(e)) => e.exit(),
        Err(e) => {
            eprintln!("Failed to load config:\n{e}");
            std::process::exit(1);
        }
    };

    let line = match &cli.command {
        Commands::Greet(args) => {
            let mut line = format!("Hello, {}", args.name);
            for word in &args.words {
                line.push(' ');
                line.push_str(word);
            }
            vec![line; args.times as usize].join("\n")
        }
        Commands::Depart { name } => format!("Goodbye, {name}"),
    };

    if cli.loud {
        println!("{}!", line.to_uppercase());
    } else {
        println!("{line}");
    }
}

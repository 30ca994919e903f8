#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use commands::resolve::ResolveArgs;
use miette::Result;
use modspec_core::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "modspec")]
#[command(author, version, about = "Print the candidates a module specifier resolves to", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Resolve a module specifier and print its candidates in order
    Resolve {
        /// The specifier to resolve (e.g. "./util", "react/jsx-runtime", "#internal")
        specifier: String,

        /// URL or path of the importing module (default: the working directory)
        #[arg(long, value_name = "URL|PATH")]
        parent: Option<String>,

        /// Active condition, in priority order (repeatable)
        #[arg(short = 'c', long = "condition", value_name = "CONDITION")]
        conditions: Vec<String>,

        /// Extension to try after the literal file name (repeatable)
        #[arg(short = 'e', long = "extension", value_name = "EXT")]
        extensions: Vec<String>,

        /// Builtin module, optionally pinned to a version (repeatable)
        #[arg(long = "builtin", value_name = "NAME[@VERSION]")]
        builtins: Vec<String>,

        /// Engine version checked against package "engines" (repeatable)
        #[arg(long = "engine", value_name = "NAME=VERSION", value_parser = parse_engine)]
        engines: Vec<(String, String)>,

        /// Scheme prefix for builtin candidates
        #[arg(long, value_name = "PROTOCOL")]
        builtin_protocol: Option<String>,

        /// JSON file with resolve options; flags are layered on top
        #[arg(long, value_name = "FILE")]
        options: Option<PathBuf>,

        /// Stop at the first candidate that exists on disk
        #[arg(long)]
        first: bool,

        /// Read package.json files asynchronously
        #[arg(long = "async")]
        use_async: bool,
    },
}

fn parse_engine(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, version)) if !name.is_empty() && !version.is_empty() => {
            Ok((name.to_string(), version.to_string()))
        }
        _ => Err(format!("expected NAME=VERSION, got '{s}'")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let config = Config::new(cwd)
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);

    logging::init(config.verbosity, config.json_logs);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(cli.json),
        Some(Commands::Resolve {
            specifier,
            parent,
            conditions,
            extensions,
            builtins,
            engines,
            builtin_protocol,
            options,
            first,
            use_async,
        }) => {
            let args = ResolveArgs {
                specifier,
                parent,
                conditions,
                extensions,
                builtins,
                engines,
                builtin_protocol,
                options,
                first,
                use_async,
            };
            commands::resolve::run(&config, &args, cli.json)
        }
    }
}

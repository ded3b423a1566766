#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use mozaic_core::config::{CompilerKind, HostKind};
use mozaic_core::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mozaic")]
#[command(author, version, about = "Compile and bundle cs! loader modules", long_about = None)]
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

/// Overrides shared by commands that load modules.
#[derive(clap::Args, Debug, Clone, Default)]
struct PipelineArgs {
    /// Fetch strategy (auto, filesystem, network, embedded)
    #[arg(long, value_parser = parse_host)]
    host: Option<HostKind>,

    /// Compiler backend (node, identity)
    #[arg(long, value_parser = parse_compiler)]
    compiler: Option<CompilerKind>,

    /// Base URL modules are resolved against
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Show host capabilities and the fetch strategy they select
    Probe {
        /// Host kind to probe instead of the configured one
        #[arg(long, value_parser = parse_host)]
        host: Option<HostKind>,
    },

    /// Compile one module and print the result
    Compile {
        /// Module name (e.g. core/constants)
        module: String,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Compile modules in bundling mode and write a static bundle
    Bundle {
        /// Module names to include
        modules: Vec<String>,

        /// Include every source file under the base URL
        #[arg(long)]
        all: bool,

        /// Output file (if not specified, prints to stdout)
        #[arg(long, short = 'o')]
        outfile: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

fn parse_host(s: &str) -> Result<HostKind, String> {
    match s.to_lowercase().as_str() {
        "auto" => Ok(HostKind::Auto),
        "filesystem" | "fs" => Ok(HostKind::Filesystem),
        "network" | "http" => Ok(HostKind::Network),
        "embedded" => Ok(HostKind::Embedded),
        other => Err(format!("unknown host kind `{other}`")),
    }
}

fn parse_compiler(s: &str) -> Result<CompilerKind, String> {
    match s.to_lowercase().as_str() {
        "node" | "coffee" => Ok(CompilerKind::Node),
        "identity" | "js" => Ok(CompilerKind::Identity),
        other => Err(format!("unknown compiler `{other}`")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let config = Config::new(cwd)
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);

    logging::init(config.verbosity, config.json_logs);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Probe { host }) => commands::probe::run(&config, host, cli.json),
        Some(Commands::Compile { module, pipeline }) => commands::compile::run(
            &config,
            &module,
            commands::Overrides::from(pipeline),
            cli.json,
        ),
        Some(Commands::Bundle {
            modules,
            all,
            outfile,
            pipeline,
        }) => commands::bundle::run(
            &config,
            commands::bundle::BundleAction {
                modules,
                all,
                outfile,
                overrides: commands::Overrides::from(pipeline),
            },
            cli.json,
        ),
    }
}

impl From<PipelineArgs> for commands::Overrides {
    fn from(args: PipelineArgs) -> Self {
        Self {
            host: args.host,
            compiler: args.compiler,
            base_url: args.base_url,
        }
    }
}

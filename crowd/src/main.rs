mod commands;
mod formatting;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "crowd")]
#[command(about = "Run scripts and publish packages across a monorepo in dependency order")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root containing crowd.toml and the packages directory.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(short, long, global = true, action)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the packages of the workspace.
    List {
        /// Dependencies before their dependents.
        #[arg(short, long, action)]
        toposort: bool,
        #[arg(long, action)]
        json: bool,
    },
    /// Show the internal dependency graph.
    Graph,
    /// Run a package.json script in every package that has it.
    Run {
        script: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
        #[arg(long, action)]
        no_progress: bool,
        /// Also run the script in the workspace root afterwards.
        #[arg(long, action)]
        with_root: bool,
    },
    /// Publish every public package, dependencies first.
    Publish {
        #[arg(long, action, conflicts_with = "stable")]
        prerelease: bool,
        #[arg(long, action)]
        stable: bool,
        #[arg(long, action)]
        no_progress: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::List { toposort, json } => commands::cmd_list(cli.root, toposort, json)?,
        Commands::Graph => commands::cmd_graph(cli.root)?,
        Commands::Run {
            script,
            args,
            no_progress,
            with_root,
        } => commands::cmd_run(cli.root, script, args, no_progress || cli.quiet, with_root)?,
        Commands::Publish {
            prerelease,
            stable,
            no_progress,
        } => {
            let prerelease = match (prerelease, stable) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            commands::cmd_publish(cli.root, prerelease, no_progress || cli.quiet)?
        }
    }

    Ok(())
}

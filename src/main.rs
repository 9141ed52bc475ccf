//! Build Runner Demon - build_runner supervision for editors and terminals
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;

use brdemon_app::ProjectRoots;

/// Build Runner Demon - run and watch Dart/Flutter build_runner
#[derive(Parser, Debug)]
#[command(name = "brdemon")]
#[command(about = "Run and watch Dart/Flutter build_runner", long_about = None)]
struct Args {
    /// Active file or directory used to locate the project
    #[arg(long, value_name = "PATH")]
    project: Option<PathBuf>,

    /// Workspace root; project detection walks down from here
    #[arg(long, value_name = "DIR")]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// One-shot build, optionally restricted to some outputs
    Build {
        /// `--build-filter` glob, repeatable
        #[arg(long = "filter", value_name = "GLOB")]
        filters: Vec<String>,
    },
    /// Start a watch session; Ctrl+C stops it gracefully
    Watch,
    /// NDJSON stdio host protocol for editor integration
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    brdemon_core::logging::init()?;

    let args = Args::parse();

    let active = args
        .project
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let roots = ProjectRoots::new(active, args.workspace);

    match args.command {
        Command::Serve => build_runner_demon::run_serve(roots).await?,
        Command::Watch => build_runner_demon::run_watch(roots).await?,
        Command::Build { filters } => {
            if !build_runner_demon::run_build_once(roots, filters).await? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

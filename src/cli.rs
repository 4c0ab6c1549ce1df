//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tutkit tutorial manager CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Workspace root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: tutkit.toml)
    #[arg(short = 'C', long, default_value = "tutkit.toml")]
    pub config: PathBuf,

    /// Output everything including debug info
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress output except for errors and reports
    #[arg(short, long)]
    pub quiet: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Init a tutorial workspace
    Init {
        /// the name(path) of the workspace directory, relative to `root`
        name: Option<PathBuf>,
    },

    /// Choose the tutorials environment
    Env {
        /// Environment name, as listed in [env.environments]
        name: String,
    },

    /// Switch the apps directory to the tutorial exercises
    Exercise,

    /// Switch the apps directory to the tutorial solutions
    Solution,

    /// Switch the apps directory to the raw templates
    Template,

    /// Show the environment and view of the current workspace
    Status,

    /// Reset the environment by regenerating from templates
    Reset,

    /// Render one tutorial stage
    Render {
        /// Tutorial to render
        tut: String,

        /// Task to render the stage for
        /// (default: the first task, or the last with --solution)
        #[arg(short, long)]
        task: Option<String>,

        /// Render the solution instead of the exercise
        #[arg(short, long)]
        solution: bool,

        /// Architecture/runtime tag passed through to templates
        #[arg(long)]
        target: Option<String>,

        /// Output directory
        /// (default: the stage dir under solutions/ or exercises/)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Build a tutorial and run it in the emulator
    Run {
        /// Name of the tutorial to run
        name: String,

        /// Platform to build for and emulate
        #[arg(short, long)]
        plat: Option<String>,

        /// Number of jobs to use while building
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Build and run tutorial solutions, checking completion output
    Test {
        /// Restrict to one tutorial
        #[arg(long)]
        name: Option<String>,

        /// Restrict to one platform
        #[arg(short, long)]
        plat: Option<String>,

        /// Timeout per test in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Publish the tutorials to a git repo
    Publish {
        /// Git repo to publish to
        git: String,

        /// Branch to publish
        #[arg(default_value = "master")]
        branch: String,
    },
}

#[allow(unused)]
impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }
    pub const fn is_render(&self) -> bool {
        matches!(self.command, Commands::Render { .. })
    }
    pub const fn is_run(&self) -> bool {
        matches!(self.command, Commands::Run { .. })
    }
    pub const fn is_test(&self) -> bool {
        matches!(self.command, Commands::Test { .. })
    }
}

//! Tutkit - tutorial authoring and build orchestration for embedded/OS
//! teaching exercises.

mod cli;
mod config;
mod init;
mod logger;
mod publish;
mod render;
mod report;
mod runner;
mod tutorial;
mod utils;
mod workspace;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use config::WorkspaceConfig;
use init::new_workspace;
use std::path::Path;
use workspace::View;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    logger::set_level(cli.verbose, cli.quiet);
    let config: &'static WorkspaceConfig = Box::leak(Box::new(load_config(cli)?));

    match &cli.command {
        Commands::Init { name } => new_workspace(config, name.is_some()),
        Commands::Env { name } => workspace::switch_env(config, name),
        Commands::Exercise => workspace::switch_view(config, View::Exercise),
        Commands::Solution => workspace::switch_view(config, View::Solution),
        Commands::Template => workspace::switch_view(config, View::Template),
        Commands::Status => workspace::status(config),
        Commands::Reset => workspace::reset(config),
        Commands::Render {
            tut,
            task,
            solution,
            target,
            out_dir,
        } => render::handle(
            config,
            tut,
            task.as_deref(),
            *solution,
            target.as_deref(),
            out_dir.as_deref(),
        ),
        Commands::Run { name, plat, jobs } => {
            runner::handle_run(config, name, plat.as_deref(), *jobs)
        }
        Commands::Test {
            name,
            plat,
            timeout,
        } => runner::handle_test(config, name.as_deref(), plat.as_deref(), *timeout),
        Commands::Publish { git, branch } => publish::publish(config, git, branch),
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &'static Cli) -> Result<WorkspaceConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        WorkspaceConfig::from_path(&config_path)?
    } else {
        WorkspaceConfig::default()
    };
    config.update_with_cli(cli);

    // Validate config state based on command
    let config_exists = config.config_path.exists();
    match (cli.is_init(), config_exists) {
        (true, true) => {
            bail!("Config file already exists. Remove it manually or init in a different path.")
        }
        (false, false) => bail!("Config file not found."),
        _ => {}
    }

    if !cli.is_init() {
        config.validate()?;
    }

    Ok(config)
}

//! Provider Test Matrix CLI
//!
//! Runs install/configure/test command groups for each coding assistant
//! provider inside the containerized runner.

use anyhow::Result;
use clap::Parser;
use provider_test_matrix::{
    ConfigLoadOptions, ConfigLoader, MatrixConfig, MatrixConfigFile, MatrixRunner,
    TokioProcessLauncher,
};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Integration-test matrix driver for coding assistant providers
#[derive(Parser)]
#[command(name = "provider-test-matrix")]
#[command(version)]
#[command(about = "Integration-test matrix driver for coding assistant providers", long_about = None)]
struct Cli {
    /// Configuration file (defaults to <repo-root>/.matrix-config.yaml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Repository root holding scripts/colima-runner.sh
    #[arg(long, value_name = "DIR", default_value = ".")]
    repo_root: PathBuf,

    /// Runner executable (overrides config and MATRIX_RUNNER)
    #[arg(long, value_name = "PATH")]
    runner: Option<PathBuf>,

    /// Login program used to build the login command
    #[arg(long)]
    login_program: Option<String>,

    /// Command run before login in every group
    #[arg(long, value_name = "CMD")]
    reset_command: Option<String>,

    /// Print the configured command groups and exit
    #[arg(long)]
    list_groups: bool,

    /// Enable debug diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\nUnexpected error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Snapshot of the process environment; non-UTF-8 entries are skipped
fn process_env() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

async fn run(cli: Cli) -> Result<i32> {
    let env = process_env();

    let options = ConfigLoadOptions {
        repo_root: cli.repo_root,
        config_path: cli.config,
        cli_args: Some(MatrixConfigFile {
            runner: cli.runner,
            login_program: cli.login_program,
            reset_command: cli.reset_command,
            ..Default::default()
        }),
        env: env.clone(),
    };

    let config = ConfigLoader::load(options).await?;

    if cli.list_groups {
        list_groups(&config);
        return Ok(0);
    }

    let runner = MatrixRunner::new(config, TokioProcessLauncher::new());
    let code = runner
        .run(&env, &mut io::stdout(), &mut io::stderr())
        .await;

    Ok(code)
}

fn list_groups(config: &MatrixConfig) {
    println!("Runner: {}", config.runner.display());
    for (index, group) in config.groups.iter().enumerate() {
        match &group.name {
            Some(name) => println!("\n=== Command group {} ({}) ===", index + 1, name),
            None => println!("\n=== Command group {} ===", index + 1),
        }
        for command in &group.commands {
            println!("  {}", command);
        }
    }
}

//! climc - cloud management CLI
//!
//! Region service requests built from option structs, plus direct read
//! access to JD Cloud through the provider-neutral resource traits.

mod api;
mod cli;
mod cloudprovider;
mod commands;
mod config;
mod jdcloud;
mod options;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use output::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Handle --manifest before anything else
    if cli.manifest {
        output::print_manifest();
        return;
    }

    let out = output::Output::new(cli.agent, cli.verbose);

    // If no command provided, show help
    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            eprintln!("Error: no command provided. Use --help for usage.");
            std::process::exit(1);
        }
    };

    let dry_run = cli.dry_run;
    let (op, result) = match command {
        Commands::Server(cmd) => ("server", commands::servers::run(cmd, dry_run, &out).await),
        Commands::Host(cmd) => ("host", commands::hosts::run(cmd, dry_run, &out).await),
        Commands::CloudAccount(cmd) => (
            "cloud-account",
            commands::cloudaccounts::run(cmd, dry_run, &out).await,
        ),
        Commands::Pod(cmd) => ("pod", commands::pods::run(cmd, dry_run, &out).await),
        Commands::Jd(cmd) => ("jd", commands::jdcloud::run(cmd, &out).await),
    };

    if let Err(e) = result {
        out.error(CliError::from_anyhow(&e).with_op(op));
    }
}

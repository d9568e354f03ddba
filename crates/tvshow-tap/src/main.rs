//! tvshow-tap CLI

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tvshow_core::Reporter;
use tvshow_tap::cmd::{self, Context, install::InstallArgs};
use tvshow_tap::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = Context::from_cli(&cli);

    match run(&ctx, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ctx.output.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Info => cmd::info::info(ctx),
        Commands::Resolve { os, arch, json } => cmd::descriptor::resolve(ctx, os, arch, json),
        Commands::Install {
            os,
            arch,
            skip_test,
            force,
            timeout,
        } => {
            let args = InstallArgs {
                os,
                arch,
                skip_test,
                force,
                timeout,
            };
            cmd::install::install(ctx, &args).await
        }
        Commands::Test { timeout } => cmd::install::test(ctx, timeout).await,
        Commands::Uninstall => cmd::install::uninstall(ctx),
        Commands::Status { json } => cmd::status::status(ctx, json),
        Commands::Check { strict } => cmd::descriptor::check(ctx, strict),
        Commands::Render { output } => cmd::descriptor::render(ctx, output.as_deref()),
        Commands::Checksum { write, all } => cmd::descriptor::checksum(ctx, write, all).await,
        Commands::Bump { version } => cmd::descriptor::bump(ctx, &version),
        Commands::Hash { files } => cmd::hash::hash(&files),
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    }
}

//! reqsync: requirements maintenance for the CI test container.
//!
//! # Usage
//!
//! ```text
//! reqsync update [--branch <b>] [--ref <sha>] [--dir <repo>] [--dry-run] [--json]
//! reqsync diff [--branch <b>] [--ref <sha>] [--dir <repo>]
//! reqsync freeze <container> [--dir <repo>]
//! reqsync prime <context> [--files-dir <dir>] [--python <bin>]
//! reqsync requirements <context> [--files-dir <dir>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    diff::DiffArgs, freeze::FreezeArgs, prime::PrimeArgs, requirements::RequirementsArgs,
    update::UpdateArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "reqsync",
    version,
    about = "Keep test container requirements in step with upstream",
    long_about = None,
)]
struct Cli {
    /// Log debug detail to stderr (RUST_LOG takes precedence).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pin the upstream ref and reconcile requirements/ against it.
    Update(UpdateArgs),

    /// Show unified diff of what update would change.
    Diff(DiffArgs),

    /// Build the container and freeze pip packages per interpreter.
    Freeze(FreezeArgs),

    /// Prime ansible-test sanity virtual environments.
    Prime(PrimeArgs),

    /// Install and validate requirements for every interpreter.
    Requirements(RequirementsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Update(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Freeze(args) => args.run(),
        Commands::Prime(args) => args.run(),
        Commands::Requirements(args) => args.run(),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

mod cmd;
mod file;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use eyre::Result;
use human_panic::setup_panic;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about=None)]
/// Build the job graph of the VarScan2 variant calling workflow.
struct Args {
    #[clap(flatten)]
    verbose: Verbosity,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the workflow as a bash script plus provisioning manifest and
    /// graph description
    Build(cmd::build::BuildCmd),

    /// Print the jobs in the order they would run, with their parents and
    /// resources
    Plan(cmd::plan::PlanCmd),
}

fn main() -> Result<()> {
    setup_panic!();
    jane_eyre::install()?;

    let args = Args::parse();
    let log_level_filter = args.verbose.log_level_filter();
    let logs_to_file = matches!(&args.command, Commands::Build(cmd) if cmd.writes_log_file());
    if !logs_to_file {
        env_logger::Builder::new()
            .filter_level(log_level_filter)
            .init();
    }

    match args.command {
        Commands::Build(cmd) => cmd.run(log_level_filter)?,
        Commands::Plan(cmd) => cmd.run()?,
    }
    Ok(())
}

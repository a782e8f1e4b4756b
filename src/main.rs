use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use labgen::docker::DockerCli;
use labgen::generator::{generate_lab, GenerateOptions};
use labgen::prompt::{AutoPrompter, InteractivePrompter, Prompter};

/// Log file used when verbose diagnostics are requested.
const LOG_FILE: &str = "labgen.log";

/// Generate docker-compose.yml and device configs for a cEOS lab
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Topology YAML file
    #[arg(default_value = "topology.yml")]
    topology: PathBuf,

    /// Run in non-interactive mode with defaults
    #[arg(long)]
    auto: bool,

    /// Validate everything but don't create files or networks
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging to labgen.log
    #[arg(long)]
    verbose: bool,

    /// Specify parent interface explicitly (e.g., eth0)
    #[arg(long)]
    parent: Option<String>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging: stderr at info by default, labgen.log at debug
    // with --verbose
    if args.verbose {
        let log_file = std::fs::File::create(LOG_FILE)?;
        env_logger::Builder::from_env(Env::default().default_filter_or("debug"))
            .target(env_logger::Target::Pipe(Box::new(log_file)))
            .init();
    } else {
        env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    }

    info!("Starting labgen");
    info!("Topology file: {:?}", args.topology);

    let runtime = DockerCli::detect();
    let prompter: Box<dyn Prompter> = if args.auto {
        Box::new(AutoPrompter)
    } else {
        Box::new(InteractivePrompter)
    };

    let options = GenerateOptions {
        topology: args.topology,
        dry_run: args.dry_run,
        parent: args.parent,
        output_root: PathBuf::from("."),
    };

    generate_lab(&options, &runtime, prompter.as_ref())?;
    Ok(())
}

//! DiskScraper command line
//!
//! With no subcommand the binary behaves like `diskscraper run`: it reads
//! `config.txt` from the working directory and scrapes the configured tree.

use anyhow::Result;
use clap::{Parser, Subcommand};
use diskscraper::config::DEFAULT_CONFIG_FILE;
use diskscraper::split::DEFAULT_LINES_PER_FILE;
use diskscraper_logging::{init_logging, LogConfig, LogHandle};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(
    name = "diskscraper",
    version,
    about = "Record the extended properties of every file under a directory"
)]
struct Cli {
    /// Mirror debug logging to stderr
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Configuration file
    #[arg(short = 'c', long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape the configured directory (the default)
    Run {
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve and print the categories a run would extract
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Split an output file into smaller parts
    Split {
        /// Output file to split
        file: PathBuf,

        /// Data rows per part
        #[arg(short = 'n', long, default_value_t = DEFAULT_LINES_PER_FILE)]
        lines: usize,
    },
}

fn command_wants_json(command: &Option<Commands>) -> bool {
    matches!(
        command,
        Some(Commands::Run { json: true }) | Some(Commands::Categories { json: true })
    )
}

fn run_command(cli: Cli, log: &LogHandle) -> Result<()> {
    match cli.command {
        None => cli::run::run(cli::run::RunArgs {
            config: cli.config,
            json: false,
            log_file: log.log_file().to_path_buf(),
        }),
        Some(Commands::Run { json }) => cli::run::run(cli::run::RunArgs {
            config: cli.config,
            json,
            log_file: log.log_file().to_path_buf(),
        }),
        Some(Commands::Categories { json }) => cli::categories::run(cli::categories::CategoriesArgs {
            config: cli.config,
            json,
            log_file: log.log_file().to_path_buf(),
        }),
        Some(Commands::Split { file, lines }) => {
            cli::split::run(cli::split::SplitArgs { file, lines })
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = command_wants_json(&cli.command);

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            eprintln!("ERROR: cannot determine the working directory: {}", err);
            return ExitCode::from(1);
        }
    };

    let mut log_config = LogConfig::in_dir(cwd);
    log_config.verbose = cli.verbose;
    log_config.quiet_console = json_mode;
    let log = match init_logging(log_config) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("{:?}", err);
            return ExitCode::from(1);
        }
    };

    match run_command(cli, &log) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}

use std::process;

use clap::{Parser, Subcommand};

mod run;

#[derive(Parser, Debug)]
#[clap(author, version, about = "VPN storefront API server", long_about = None)]
struct Opts {
    /// Path to a .env file with gateway/backend configuration
    #[arg(long = "env-file", short = 'e', global = true, default_value = "./.env")]
    env_file: std::path::PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Start the storefront API server
    Run(run::RunCommand),
}

#[tokio::main]
async fn main() {
    let opts: Opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            let _ = e.print();
            process::exit(e.exit_code());
        }
    };

    // Load environment variables before anything reads configuration.
    if opts.env_file.exists() {
        match dotenvy::from_path(&opts.env_file) {
            Ok(()) => eprintln!("✓ Loaded environment from {}", opts.env_file.display()),
            Err(e) => eprintln!("Warning: could not load {}: {}", opts.env_file.display(), e),
        }
    }

    let result = match opts.command {
        Command::Run(command) => command.execute().await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

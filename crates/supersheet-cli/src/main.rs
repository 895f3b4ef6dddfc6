mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "supersheet",
    version,
    about = "Extract structured property data from SuperSheet PDF reports"
)]
struct Cli {
    /// Log pipeline stages to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a SuperSheet PDF into a structured record
    Parse {
        /// Path to the PDF file
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the record to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Custom extraction config (JSON); defaults to the built-in profile
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Merge words closer than this fraction of the word height into one fragment
        #[arg(long, value_name = "RATIO", default_value_t = 0.5)]
        word_gap: f32,
    },
    /// Inspect and validate extraction configs
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the built-in extraction config as JSON
    Show,
    /// Validate a custom extraction config
    Validate {
        /// Path to JSON config file
        file: PathBuf,
    },
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Parse {
            input_file,
            output,
            out,
            config,
            word_gap,
        } => commands::parse::run(input_file, &output, out, config, word_gap),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(),
            ConfigAction::Validate { file } => commands::config::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(if e.is_structural() { 2 } else { 1 });
    }
}

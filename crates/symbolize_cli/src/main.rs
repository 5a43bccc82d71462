mod decode;
mod error;
mod jail;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use error::Error;

#[derive(Debug, Parser)]
#[command(name = "symbolize")]
#[command(about = "Decode serial debug logs and symbolizer markup")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Attribute each log line to its process and optionally parse its markup.
    Decode(decode::Args),
    /// Print the nsjail command line for running a command in a sandbox.
    Jail(jail::Args),
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Decode(args) => decode::run(args).await,
        Command::Jail(args) => jail::run(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

use clap::{Args, Parser, Subcommand};

use crate::demo::{run_demo, run_import, DemoArgs, ImportArgs};
use crate::server;
use reparv_engine::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Reparv Back Office",
    about = "Run the Reparv referral back office or exercise it from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk one enquiry from intake to booking and print the timeline
    Demo(DemoArgs),
    /// Import enquiries from a CSV export and print the batch outcome
    Import(ImportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Import(args) => run_import(args),
    }
}

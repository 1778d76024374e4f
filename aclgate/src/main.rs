//! aclgate entry point

use aclgate::cli::{serve::ServeArgs, Cli, Commands};
use aclgate::logging;
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => run_server(&args).await,
        Some(Commands::Call(args)) => {
            if let Err(e) = aclgate::cli::call::execute(&args).await {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Tail(args)) => {
            if let Err(e) = aclgate::cli::tail::execute(&args).await {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            // No subcommand - default to serve
            run_server(&ServeArgs::parse_from(["serve"])).await;
        }
    }
}

async fn run_server(args: &ServeArgs) {
    if let Err(e) = logging::init() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = aclgate::cli::serve::execute(args).await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

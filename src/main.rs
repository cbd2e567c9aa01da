use bathyclean::cli::commands::{self, Completion};
use bathyclean::cli::{Args, setup_logging};
use clap::Parser;
use std::process;

fn main() {
    let args = Args::parse();
    setup_logging(args.command.log_args());

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    match runtime.block_on(commands::run(args)) {
        Ok(Completion::Success) => process::exit(0),
        Ok(Completion::PartialFailure) => process::exit(2),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

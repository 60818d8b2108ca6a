// CLI modules
mod cli;

use std::time::Duration;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Init, Retrieve, Serve, Store, Version};

command_enum! {
    (Init, Init),
    (Retrieve, Retrieve),
    (Serve, Serve),
    (Store, Store),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_level = cli::op::resolve_log_level(args.config_path.clone());
    let guard = tanglepaste::init_logging(log_level);

    let ctx = cli::op::OpContext::new(args.config_path, Duration::from_secs(args.timeout_secs));

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush buffered log lines before exiting
    drop(guard);
    std::process::exit(code);
}

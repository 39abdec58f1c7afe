mod args;
mod op;
mod ops;
mod state;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Init, Scan, Service, Setup, Version};

command_enum! {
    (Init, Init),
    (Service, Service),
    (Setup, Setup),
    (Scan, Scan),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    // a missing .env file is fine
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let remote = match args.remote() {
        Ok(remote) => remote,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    let ctx = match op::OpContext::new(remote) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

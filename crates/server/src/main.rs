mod cli;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Cache, Collection, Health, Init, Product, Serve, Version};

command_enum! {
    (Cache, Cache),
    (Collection, Collection),
    (Health, Health),
    (Init, Init),
    (Product, Product),
    (Serve, Serve),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Flags beat the config file, which beats the dev defaults.
    let remote = cli::op::resolve_remote(args.remote, args.config_path.clone());
    let token = cli::op::resolve_token(args.token, args.config_path.clone());

    let ctx = match cli::op::OpContext::new(remote, token, args.config_path) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: Failed to create API client: {}", e);
            std::process::exit(1);
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

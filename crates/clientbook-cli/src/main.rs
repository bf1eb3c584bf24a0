mod cli;
mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use client::ClientbookClient;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();
    let client = ClientbookClient::new(&cli.server, cli.token.clone());

    match &cli.command {
        Commands::Status => commands::server::status(&client, &cli.server).await?,
        Commands::List(args) => {
            commands::crud::list(&client, args.limit, args.offset, format).await?;
        }
        Commands::Get(args) => commands::crud::get(&client, &args.email, format).await?,
        Commands::Add(args) => commands::crud::add(&client, args).await?,
        Commands::Update(args) => commands::crud::update(&client, args).await?,
        Commands::Delete(args) => commands::crud::delete(&client, &args.email).await?,
        Commands::Seed(args) => {
            commands::seed::seed(&client, args.count, args.concurrency).await?;
        }
    }

    Ok(())
}

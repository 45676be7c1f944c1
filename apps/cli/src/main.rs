use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use client_core::CounterClient;
use shared::{domain::Operation, protocol::CounterPayload};

#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the counter server.
    #[arg(long, default_value = "http://127.0.0.1:8443")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current counter, creating it on first access.
    Get,
    /// Add one to the counter.
    Increment,
    /// Subtract one from the counter.
    Decrement,
    /// Set the counter back to zero.
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let client = CounterClient::new(&args.server_url)?;
    let counter = match args.command {
        Command::Get => client.get_counter().await?,
        Command::Increment => client.update_counter(Operation::Increment).await?,
        Command::Decrement => client.update_counter(Operation::Decrement).await?,
        Command::Reset => client.update_counter(Operation::Reset).await?,
    };
    print_counter(&counter);
    Ok(())
}

fn print_counter(counter: &CounterPayload) {
    println!("{}", counter.value);
    println!(
        "last updated {}",
        counter.updated_at.with_timezone(&Local).format("%H:%M:%S")
    );
}

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "aid-dispatch")]
#[command(about = "Aid Fallback Dispatch Service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the dispatch service: transport, timeout monitor, and healer.
    Start,
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Offline statistics over a collected event timeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Blocks, origins and (block, origin) pairs with many events
    Busy(BusyArgs),
    /// Average priority fee (wei) over all events
    PriorityFee(EventsArgs),
    /// Extract the sandwich tag index from a labelled timeline
    Sandwich(SandwichArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EventsArgs {
    /// Timeline written by `collector timeline`
    #[arg(long, default_value = "data/graph/events.json")]
    pub events: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct BusyArgs {
    #[command(flatten)]
    pub input: EventsArgs,

    #[arg(long, default_value_t = 3)]
    pub min_block_events: usize,

    #[arg(long, default_value_t = 2)]
    pub min_origin_events: usize,

    #[arg(long, default_value_t = 2)]
    pub min_pair_events: usize,
}

#[derive(Args, Debug, Clone)]
pub struct SandwichArgs {
    #[command(flatten)]
    pub input: EventsArgs,

    #[arg(long, default_value = "data/graph/sandwich.json")]
    pub out: PathBuf,
}

use anyhow::Result;
use clap::Parser;
use log::info;

mod config;
mod fee_cache;
mod pipeline;
mod probe;
mod rpc;
mod subgraph;

use config::Command;

fn setup_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = config::Cli::parse();
    let cfg = config::load(&cli)?;

    // endpoint urls embed api keys, only the pool is logged
    info!("pool={}", cfg.pool_id);

    let subgraph = subgraph::SubgraphClient::new(cfg.subgraph_url.clone())?;

    match &cli.command {
        Command::Timeline(args) => {
            let rpc = rpc::RpcClient::new(cfg.rpc_url()?.to_string())?;
            pipeline::run_timeline(&subgraph, &rpc, &cfg.pool_id, args).await?;
        }
        Command::Split(args) => {
            pipeline::run_split(&subgraph, &cfg.pool_id, args).await?;
        }
        Command::RecentVolume(args) => {
            let avg = probe::recent_volume(&subgraph, &cfg.pool_id, args).await?;
            println!("{avg}");
        }
        Command::RecentPriorityFees(args) => {
            let rpc = rpc::RpcClient::new(cfg.rpc_url()?.to_string())?;
            let avg = probe::recent_priority_fees(&subgraph, &rpc, args).await?;
            println!("{avg}");
        }
    }

    Ok(())
}

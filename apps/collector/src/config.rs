use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use schema::PoolDecimals;
use std::{env, path::PathBuf};

use crate::subgraph::PageSizes;

/// LAI/USDT pool on Uniswap v3 mainnet
pub const DEFAULT_POOL_ID: &str = "0xc0b7f8b3f857df57027d340cf101a164c3b20bb8";

/// WETH/USDC 0.05% pool, default for `recent-volume`
pub const VOLUME_POOL_ID: &str = "0x88e6a0c2ddd26feeb64f039a2c41296fcb3f5640";

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Collect and normalize Uniswap v3 pool events")]
pub struct Cli {
    /// Pool address (POOL_ID, then LAI/USDT, or WETH/USDC for recent-volume)
    #[arg(long, global = true)]
    pub pool: Option<String>,

    /// Subgraph endpoint (SUBGRAPH_URL, then the gateway from GRAPH_API_KEY + UNI_V3_SUBGRAPH)
    #[arg(long, global = true)]
    pub subgraph_url: Option<String>,

    /// Ethereum JSON-RPC endpoint (RPC_URL, then Infura from INFURA_API_KEY)
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Unified timeline annotated with base fees and sandwich tags
    Timeline(TimelineArgs),
    /// Per-kind exports: all.json, swaps.json, mints.json, burns.json
    Split(SplitArgs),
    /// Average stablecoin size of the pool's latest swaps
    RecentVolume(RecentVolumeArgs),
    /// Average priority fee (gwei) of the latest swaps on any pool
    RecentPriorityFees(RecentPriorityFeesArgs),
}

impl Command {
    /// Pool used when neither `--pool` nor `POOL_ID` is set.
    pub fn default_pool(&self) -> &'static str {
        match self {
            Command::RecentVolume(_) => VOLUME_POOL_ID,
            _ => DEFAULT_POOL_ID,
        }
    }
}

/// First-page size of each event collection (no pagination).
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1000)]
    pub swaps: usize,

    #[arg(long, default_value_t = 50)]
    pub mints: usize,

    #[arg(long, default_value_t = 20)]
    pub burns: usize,
}

impl PageArgs {
    pub fn page_sizes(&self) -> PageSizes {
        PageSizes {
            swaps: self.swaps,
            mints: self.mints,
            burns: self.burns,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct DecimalArgs {
    /// Decimals of token0
    #[arg(long, default_value_t = 18)]
    pub decimals0: u32,

    /// Decimals of token1
    #[arg(long, default_value_t = 6)]
    pub decimals1: u32,

    /// Decimals of the USD-equivalent amount
    #[arg(long, default_value_t = 6)]
    pub usd_decimals: u32,
}

impl DecimalArgs {
    pub fn pool_decimals(&self) -> PoolDecimals {
        PoolDecimals::new(self.decimals0, self.decimals1, self.usd_decimals)
    }
}

#[derive(Args, Debug, Clone)]
pub struct TimelineArgs {
    #[command(flatten)]
    pub page: PageArgs,

    #[command(flatten)]
    pub decimals: DecimalArgs,

    /// Block base fee cache, read at start and rewritten at the end
    #[arg(long, default_value = "data/graph/block_info.json")]
    pub fee_cache: PathBuf,

    /// Sandwich tag index (see `stats sandwich`)
    #[arg(long, default_value = "data/graph/sandwich.json")]
    pub sandwich: PathBuf,

    /// Timeline output
    #[arg(long, default_value = "data/graph/events.json")]
    pub out: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct SplitArgs {
    #[command(flatten)]
    pub page: PageArgs,

    #[command(flatten)]
    pub decimals: DecimalArgs,

    /// Directory receiving all.json, swaps.json, mints.json and burns.json
    #[arg(long, default_value = "data")]
    pub out_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct RecentVolumeArgs {
    #[arg(long, default_value_t = 20)]
    pub first: usize,

    /// Token symbol whose leg is averaged
    #[arg(long, default_value = "USDC")]
    pub stable_symbol: String,
}

#[derive(Args, Debug, Clone)]
pub struct RecentPriorityFeesArgs {
    #[arg(long, default_value_t = 10)]
    pub first: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub subgraph_url: String,
    pub rpc_url: Option<String>,
    pub pool_id: String,
}

impl Config {
    pub fn rpc_url(&self) -> Result<&str> {
        self.rpc_url.as_deref().ok_or_else(|| {
            anyhow!("Missing RPC endpoint: pass --rpc-url or set RPC_URL / INFURA_API_KEY")
        })
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub fn load(cli: &Cli) -> Result<Config> {
    let subgraph_url = match non_empty(cli.subgraph_url.clone())
        .or_else(|| non_empty(env::var("SUBGRAPH_URL").ok()))
    {
        Some(url) => url,
        None => {
            let api_key = non_empty(env::var("GRAPH_API_KEY").ok())
                .ok_or_else(|| anyhow!("Missing GRAPH_API_KEY (or pass --subgraph-url)"))?;
            let subgraph_id = non_empty(env::var("UNI_V3_SUBGRAPH").ok())
                .ok_or_else(|| anyhow!("Missing UNI_V3_SUBGRAPH (or pass --subgraph-url)"))?;
            format!("https://gateway.thegraph.com/api/{api_key}/subgraphs/id/{subgraph_id}")
        }
    };

    let rpc_url = non_empty(cli.rpc_url.clone())
        .or_else(|| non_empty(env::var("RPC_URL").ok()))
        .or_else(|| {
            non_empty(env::var("INFURA_API_KEY").ok())
                .map(|key| format!("https://mainnet.infura.io/v3/{key}"))
        });

    // the subgraph indexes pool ids in lowercase
    let pool_id = non_empty(cli.pool.clone())
        .or_else(|| non_empty(env::var("POOL_ID").ok()))
        .unwrap_or_else(|| cli.command.default_pool().to_string())
        .to_lowercase();

    Ok(Config {
        subgraph_url,
        rpc_url,
        pool_id,
    })
}

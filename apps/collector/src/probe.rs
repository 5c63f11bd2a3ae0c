use crate::{
    config::{RecentPriorityFeesArgs, RecentVolumeArgs},
    rpc::{RpcClient, block_base_fee, parse_quantity},
    subgraph::SubgraphClient,
};
use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use schema::RecentSwap;
use serde_json::Value;

const WEI_PER_GWEI: f64 = 1_000_000_000.0;

/// Absolute size of the leg denominated in `stable_symbol`, if either is.
pub fn stable_leg(swap: &RecentSwap, stable_symbol: &str) -> Result<Option<f64>> {
    let raw = if swap.token0.symbol == stable_symbol {
        &swap.amount0
    } else if swap.token1.symbol == stable_symbol {
        &swap.amount1
    } else {
        return Ok(None);
    };

    let amount: f64 = raw
        .parse()
        .map_err(|_| anyhow!("bad amount {raw:?} in tx {}", swap.transaction.id))?;
    Ok(Some(amount.abs()))
}

/// Arithmetic mean, 0 for no samples.
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Tip paid by a transaction (wei): `maxPriorityFeePerGas` for EIP-1559
/// transactions, else `gasPrice` minus the block base fee.
pub fn priority_fee_wei(tx: &Value, block_base_fee: Option<u64>) -> Result<u64> {
    if let Some(v) = tx.get("maxPriorityFeePerGas").filter(|v| !v.is_null()) {
        return parse_quantity(v).context("maxPriorityFeePerGas");
    }

    let gas_price = tx
        .get("gasPrice")
        .ok_or_else(|| anyhow!("transaction without gasPrice"))
        .and_then(parse_quantity)
        .context("gasPrice")?;
    Ok(gas_price.saturating_sub(block_base_fee.unwrap_or(0)))
}

pub async fn recent_volume(
    subgraph: &SubgraphClient,
    pool_id: &str,
    args: &RecentVolumeArgs,
) -> Result<f64> {
    let swaps = subgraph.recent_pool_swaps(pool_id, args.first).await?;
    info!("recent-volume: pool={} swaps={}", pool_id, swaps.len());

    let mut amounts = Vec::with_capacity(swaps.len());
    for swap in &swaps {
        info!(
            "tx={} {} {} / {} {}",
            swap.transaction.id,
            swap.amount0,
            swap.token0.symbol,
            swap.amount1,
            swap.token1.symbol
        );
        if let Some(amount) = stable_leg(swap, &args.stable_symbol)? {
            amounts.push(amount);
        }
    }

    if amounts.is_empty() && !swaps.is_empty() {
        warn!(
            "no swap in pool {} has a {} leg, average is 0",
            pool_id, args.stable_symbol
        );
    }

    let avg = average(&amounts);
    info!(
        "average {} size over {} swaps: {:.2}",
        args.stable_symbol,
        amounts.len(),
        avg
    );
    Ok(avg)
}

pub async fn recent_priority_fees(
    subgraph: &SubgraphClient,
    rpc: &RpcClient,
    args: &RecentPriorityFeesArgs,
) -> Result<f64> {
    let hashes = subgraph.latest_swap_transactions(args.first).await?;
    info!("recent-priority-fees: transactions={}", hashes.len());

    let mut fees = Vec::with_capacity(hashes.len());
    for hash in &hashes {
        let tx = rpc.get_transaction(hash).await?;

        let base_fee = if tx.get("maxPriorityFeePerGas").is_some_and(|v| !v.is_null()) {
            None
        } else {
            let block_number = tx
                .get("blockNumber")
                .ok_or_else(|| anyhow!("transaction {hash} has no blockNumber"))
                .and_then(parse_quantity)?;
            block_base_fee(&rpc.get_block(block_number).await?)?
        };

        let fee = priority_fee_wei(&tx, base_fee).with_context(|| format!("tx={hash}"))?;
        let gwei = fee as f64 / WEI_PER_GWEI;
        info!("tx={} priority_fee={:.3} gwei", hash, gwei);
        fees.push(gwei);
    }

    let avg = average(&fees);
    info!("average priority fee over {} txs: {:.3} gwei", fees.len(), avg);
    Ok(avg)
}

//! Raw subgraph records, exactly as the Uniswap v3 subgraph returns them.
//!
//! Every numeric field arrives as a string. Fields are required: a record
//! missing any of them fails to deserialize.

use crate::units::{parse_int, ConvertError};
use serde::{Deserialize, Serialize};

/// Transaction metadata embedded in every pool event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub id: String,
    pub block_number: String,
    pub timestamp: String,
    pub gas_used: String,
    pub gas_price: String,
}

impl RawTransaction {
    pub fn block_number(&self) -> Result<u64, ConvertError> {
        parse_int(&self.block_number).map_err(|e| e.in_field("transaction.blockNumber"))
    }

    pub fn gas_used(&self) -> Result<u64, ConvertError> {
        parse_int(&self.gas_used).map_err(|e| e.in_field("transaction.gasUsed"))
    }

    pub fn gas_price(&self) -> Result<u64, ConvertError> {
        parse_int(&self.gas_price).map_err(|e| e.in_field("transaction.gasPrice"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSwap {
    pub transaction: RawTransaction,
    pub timestamp: String,
    pub sender: String,
    pub recipient: String,
    pub origin: String,
    pub amount0: String,
    pub amount1: String,
    #[serde(rename = "amountUSD")]
    pub amount_usd: String,
    #[serde(rename = "sqrtPriceX96")]
    pub sqrt_price_x96: String,
    pub tick: String,
    pub log_index: String,
}

/// Liquidity added to a tick range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMint {
    pub transaction: RawTransaction,
    pub timestamp: String,
    pub owner: String,
    pub sender: String,
    pub origin: String,
    pub tick_lower: String,
    pub tick_upper: String,
    pub amount: String,
    pub amount0: String,
    pub amount1: String,
    pub log_index: String,
}

/// Liquidity removed from a tick range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBurn {
    pub transaction: RawTransaction,
    pub timestamp: String,
    pub owner: String,
    pub origin: String,
    pub tick_lower: String,
    pub tick_upper: String,
    pub amount: String,
    pub amount0: String,
    pub amount1: String,
    pub log_index: String,
}

/// The `data` object of a pool events query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEvents {
    pub swaps: Vec<RawSwap>,
    pub mints: Vec<RawMint>,
    pub burns: Vec<RawBurn>,
}

impl PoolEvents {
    pub fn len(&self) -> usize {
        self.swaps.len() + self.mints.len() + self.burns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSymbol {
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionId {
    pub id: String,
}

/// A swap as returned by the recent-volume query, with token symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentSwap {
    pub amount0: String,
    pub amount1: String,
    pub token0: TokenSymbol,
    pub token1: TokenSymbol,
    pub transaction: TransactionId,
}

/// Transaction ids of the latest swaps, any pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapTransaction {
    pub transaction: TransactionId,
}

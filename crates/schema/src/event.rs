//! Normalized pool events.
//!
//! [`UnifiedEvent`] is the fixed-shape record of the timeline export: every
//! field is present for every event kind, with explicit zeros where a field
//! does not apply. The split export writes narrower per-kind projections
//! ([`SwapRow`], [`LiquidityRow`]) plus a [`TimelineEntry`] index.

use crate::raw::{RawBurn, RawMint, RawSwap, RawTransaction};
use crate::units::{decimal_u256, parse_int, parse_u256, to_fixed, ConvertError, PoolDecimals};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event label used by the timeline export and the sandwich index keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Swap,
    Liquidity,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Swap => "swap",
            EventType::Liquidity => "liquidity",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-block and per-transaction values resolved outside the raw record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventContext {
    /// Base fee of the event's block (wei)
    pub block_base_fee_per_gas: u64,
    /// Sandwich tag from the tag index (0 = none)
    pub sandwich: u8,
}

/// Canonical timeline record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedEvent {
    pub sandwich: u8,
    pub event_type: EventType,
    pub origin: String,
    pub tx_id: String,
    pub block_number: u64,
    pub block_base_fee_per_gas: u64,
    /// Unix seconds
    pub timestamp: u64,
    pub log_index: u64,
    pub gas_used: u64,
    pub gas_price: u64,
    pub amount0: i128,
    pub amount1: i128,
    /// Signed USD amount for swaps, liquidity delta for mints and burns
    pub amount: i128,
    #[serde(rename = "sqrtPriceX96", with = "decimal_u256")]
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

/// Fields shared by every event kind.
struct Header {
    tx_id: String,
    block_number: u64,
    timestamp: u64,
    log_index: u64,
    gas_used: u64,
    gas_price: u64,
}

impl Header {
    fn parse(
        transaction: &RawTransaction,
        timestamp: &str,
        log_index: &str,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            tx_id: transaction.id.clone(),
            block_number: transaction.block_number()?,
            timestamp: parse_int(timestamp).map_err(|e| e.in_field("timestamp"))?,
            log_index: parse_int(log_index).map_err(|e| e.in_field("logIndex"))?,
            gas_used: transaction.gas_used()?,
            gas_price: transaction.gas_price()?,
        })
    }
}

/// Normalized swap amounts.
///
/// Both token legs are negated: the subgraph reports pool-side deltas while
/// the consuming protocol model uses the opposite convention.
struct SwapAmounts {
    amount0: i128,
    amount1: i128,
    usd: i128,
}

impl SwapAmounts {
    fn parse(raw: &RawSwap, decimals: &PoolDecimals) -> Result<Self, ConvertError> {
        let amount0 = to_fixed(&raw.amount0, decimals.token0).map_err(|e| e.in_field("amount0"))?;
        let amount1 = to_fixed(&raw.amount1, decimals.token1).map_err(|e| e.in_field("amount1"))?;
        let usd = to_fixed(&raw.amount_usd, decimals.usd).map_err(|e| e.in_field("amountUSD"))?;

        Ok(Self {
            amount0: -amount0,
            amount1: -amount1,
            usd,
        })
    }
}

/// USD amount signed after the direction of the (already inverted) token1 leg.
pub fn signed_usd_amount(amount1: i128, usd: i128) -> i128 {
    if amount1 < 0 {
        -usd
    } else {
        usd
    }
}

/// Position liquidity is a uint128 on chain. Signed deltas hold values up to
/// `i128::MAX`; anything larger is rejected.
fn parse_liquidity(value: &str) -> Result<i128, ConvertError> {
    let liquidity: u128 = parse_int(value)?;
    i128::try_from(liquidity).map_err(|_| ConvertError::Overflow {
        value: value.to_string(),
        decimals: 0,
    })
}

/// Normalized liquidity fields shared by mints and burns.
struct LiquidityAmounts {
    tick_lower: i32,
    tick_upper: i32,
    liquidity: i128,
    amount0: i128,
    amount1: i128,
}

impl LiquidityAmounts {
    fn parse(
        tick_lower: &str,
        tick_upper: &str,
        amount: &str,
        amount0: &str,
        amount1: &str,
        decimals: &PoolDecimals,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            tick_lower: parse_int(tick_lower).map_err(|e| e.in_field("tickLower"))?,
            tick_upper: parse_int(tick_upper).map_err(|e| e.in_field("tickUpper"))?,
            liquidity: parse_liquidity(amount).map_err(|e| e.in_field("amount"))?,
            amount0: to_fixed(amount0, decimals.token0).map_err(|e| e.in_field("amount0"))?,
            amount1: to_fixed(amount1, decimals.token1).map_err(|e| e.in_field("amount1"))?,
        })
    }

    fn from_mint(raw: &RawMint, decimals: &PoolDecimals) -> Result<Self, ConvertError> {
        Self::parse(
            &raw.tick_lower,
            &raw.tick_upper,
            &raw.amount,
            &raw.amount0,
            &raw.amount1,
            decimals,
        )
    }

    /// Burns carry the liquidity delta as a removal.
    fn from_burn(raw: &RawBurn, decimals: &PoolDecimals) -> Result<Self, ConvertError> {
        let mut amounts = Self::parse(
            &raw.tick_lower,
            &raw.tick_upper,
            &raw.amount,
            &raw.amount0,
            &raw.amount1,
            decimals,
        )?;
        amounts.liquidity = -amounts.liquidity;
        Ok(amounts)
    }
}

impl UnifiedEvent {
    pub fn from_swap(
        raw: &RawSwap,
        decimals: &PoolDecimals,
        ctx: EventContext,
    ) -> Result<Self, ConvertError> {
        let header = Header::parse(&raw.transaction, &raw.timestamp, &raw.log_index)?;
        let amounts = SwapAmounts::parse(raw, decimals)?;

        Ok(Self {
            sandwich: ctx.sandwich,
            event_type: EventType::Swap,
            origin: raw.origin.clone(),
            tx_id: header.tx_id,
            block_number: header.block_number,
            block_base_fee_per_gas: ctx.block_base_fee_per_gas,
            timestamp: header.timestamp,
            log_index: header.log_index,
            gas_used: header.gas_used,
            gas_price: header.gas_price,
            amount0: amounts.amount0,
            amount1: amounts.amount1,
            amount: signed_usd_amount(amounts.amount1, amounts.usd),
            sqrt_price_x96: parse_u256(&raw.sqrt_price_x96)
                .map_err(|e| e.in_field("sqrtPriceX96"))?,
            tick: parse_int(&raw.tick).map_err(|e| e.in_field("tick"))?,
            tick_lower: 0,
            tick_upper: 0,
        })
    }

    pub fn from_mint(
        raw: &RawMint,
        decimals: &PoolDecimals,
        ctx: EventContext,
    ) -> Result<Self, ConvertError> {
        let header = Header::parse(&raw.transaction, &raw.timestamp, &raw.log_index)?;
        let amounts = LiquidityAmounts::from_mint(raw, decimals)?;
        Ok(Self::liquidity(raw.origin.clone(), header, amounts, ctx))
    }

    pub fn from_burn(
        raw: &RawBurn,
        decimals: &PoolDecimals,
        ctx: EventContext,
    ) -> Result<Self, ConvertError> {
        let header = Header::parse(&raw.transaction, &raw.timestamp, &raw.log_index)?;
        let amounts = LiquidityAmounts::from_burn(raw, decimals)?;
        Ok(Self::liquidity(raw.origin.clone(), header, amounts, ctx))
    }

    fn liquidity(
        origin: String,
        header: Header,
        amounts: LiquidityAmounts,
        ctx: EventContext,
    ) -> Self {
        Self {
            sandwich: ctx.sandwich,
            event_type: EventType::Liquidity,
            origin,
            tx_id: header.tx_id,
            block_number: header.block_number,
            block_base_fee_per_gas: ctx.block_base_fee_per_gas,
            timestamp: header.timestamp,
            log_index: header.log_index,
            gas_used: header.gas_used,
            gas_price: header.gas_price,
            amount0: amounts.amount0,
            amount1: amounts.amount1,
            amount: amounts.liquidity,
            sqrt_price_x96: U256::ZERO,
            tick: 0,
            tick_lower: amounts.tick_lower,
            tick_upper: amounts.tick_upper,
        }
    }

    /// Gas price above the block's base fee (wei).
    pub fn priority_fee(&self) -> i128 {
        i128::from(self.gas_price) - i128::from(self.block_base_fee_per_gas)
    }
}

/// Swap projection of the split export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRow {
    pub amount0: i128,
    pub amount1: i128,
    /// Normalized but never sign-adjusted
    #[serde(rename = "amountUSD")]
    pub amount_usd: i128,
    #[serde(rename = "sqrtPriceX96", with = "decimal_u256")]
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub block_number: u64,
    pub log_index: u64,
}

impl SwapRow {
    pub fn from_raw(raw: &RawSwap, decimals: &PoolDecimals) -> Result<Self, ConvertError> {
        let amounts = SwapAmounts::parse(raw, decimals)?;
        Ok(Self {
            amount0: amounts.amount0,
            amount1: amounts.amount1,
            amount_usd: amounts.usd,
            sqrt_price_x96: parse_u256(&raw.sqrt_price_x96)
                .map_err(|e| e.in_field("sqrtPriceX96"))?,
            tick: parse_int(&raw.tick).map_err(|e| e.in_field("tick"))?,
            block_number: raw.transaction.block_number()?,
            log_index: parse_int(&raw.log_index).map_err(|e| e.in_field("logIndex"))?,
        })
    }
}

/// Mint or burn projection of the split export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityRow {
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount: i128,
    pub amount0: i128,
    pub amount1: i128,
    pub block_number: u64,
    pub log_index: u64,
}

impl LiquidityRow {
    pub fn from_mint(raw: &RawMint, decimals: &PoolDecimals) -> Result<Self, ConvertError> {
        let amounts = LiquidityAmounts::from_mint(raw, decimals)?;
        Self::build(amounts, &raw.transaction, &raw.log_index)
    }

    pub fn from_burn(raw: &RawBurn, decimals: &PoolDecimals) -> Result<Self, ConvertError> {
        let amounts = LiquidityAmounts::from_burn(raw, decimals)?;
        Self::build(amounts, &raw.transaction, &raw.log_index)
    }

    fn build(
        amounts: LiquidityAmounts,
        transaction: &RawTransaction,
        log_index: &str,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            tick_lower: amounts.tick_lower,
            tick_upper: amounts.tick_upper,
            amount: amounts.liquidity,
            amount0: amounts.amount0,
            amount1: amounts.amount1,
            block_number: transaction.block_number()?,
            log_index: parse_int(log_index).map_err(|e| e.in_field("logIndex"))?,
        })
    }
}

/// Event label of the split export index, which keeps mints and burns apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitKind {
    Swap,
    Mint,
    Burn,
}

/// Transaction-level index row of the split export (`all.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub event_type: SplitKind,
    pub origin: String,
    pub tx_id: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub log_index: u64,
    pub gas_used: u64,
    pub gas_price: u64,
}

impl TimelineEntry {
    pub fn from_swap(raw: &RawSwap) -> Result<Self, ConvertError> {
        Self::build(
            SplitKind::Swap,
            &raw.origin,
            &raw.transaction,
            &raw.timestamp,
            &raw.log_index,
        )
    }

    pub fn from_mint(raw: &RawMint) -> Result<Self, ConvertError> {
        Self::build(
            SplitKind::Mint,
            &raw.origin,
            &raw.transaction,
            &raw.timestamp,
            &raw.log_index,
        )
    }

    pub fn from_burn(raw: &RawBurn) -> Result<Self, ConvertError> {
        Self::build(
            SplitKind::Burn,
            &raw.origin,
            &raw.transaction,
            &raw.timestamp,
            &raw.log_index,
        )
    }

    fn build(
        event_type: SplitKind,
        origin: &str,
        transaction: &RawTransaction,
        timestamp: &str,
        log_index: &str,
    ) -> Result<Self, ConvertError> {
        let header = Header::parse(transaction, timestamp, log_index)?;
        Ok(Self {
            event_type,
            origin: origin.to_string(),
            tx_id: header.tx_id,
            block_number: header.block_number,
            timestamp: header.timestamp,
            log_index: header.log_index,
            gas_used: header.gas_used,
            gas_price: header.gas_price,
        })
    }
}

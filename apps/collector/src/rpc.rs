use anyhow::{Result, anyhow};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

use crate::fee_cache::BaseFeeSource;

#[derive(Clone)]
pub struct RpcClient {
    http: Client,
    url: String,
}

impl RpcClient {
    pub fn new(url: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| anyhow!("reqwest client: {e:?}"))?;
        Ok(Self { http, url })
    }

    /// Single JSON-RPC round trip. Failures are returned as-is, without retry.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });

        let r = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("rpc request failed: {e:?}"))?;

        let status = r.status();
        let v: Value = r.json().await.map_err(|e| anyhow!("rpc decode error: {e:?}"))?;

        if !status.is_success() {
            return Err(anyhow!("rpc http error status={status} body={v}"));
        }

        extract_result(v)
    }

    /// `eth_getBlockByNumber` without transaction bodies.
    pub async fn get_block(&self, block_number: u64) -> Result<Value> {
        let block = self
            .call("eth_getBlockByNumber", json!([format!("{block_number:#x}"), false]))
            .await?;
        if block.is_null() {
            return Err(anyhow!("block {block_number} not found"));
        }
        Ok(block)
    }

    pub async fn get_transaction(&self, hash: &str) -> Result<Value> {
        let tx = self.call("eth_getTransactionByHash", json!([hash])).await?;
        if tx.is_null() {
            return Err(anyhow!("transaction {hash} not found"));
        }
        Ok(tx)
    }
}

impl BaseFeeSource for RpcClient {
    async fn base_fee_per_gas(&self, block_number: u64) -> Result<u64> {
        let block = self.get_block(block_number).await?;
        block_base_fee(&block)?
            .ok_or_else(|| anyhow!("block {block_number} has no baseFeePerGas"))
    }
}

fn extract_result(v: Value) -> Result<Value> {
    if let Some(err) = v.get("error") {
        return Err(anyhow!("rpc returned error: {err}"));
    }
    v.get("result")
        .cloned()
        .ok_or_else(|| anyhow!("missing result field"))
}

/// Decode a hex `QUANTITY` (`"0x1a"`).
pub fn parse_quantity(v: &Value) -> Result<u64> {
    let s = v
        .as_str()
        .ok_or_else(|| anyhow!("expected hex quantity, got {v}"))?;
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| anyhow!("quantity without 0x prefix: {s}"))?;
    u64::from_str_radix(digits, 16).map_err(|e| anyhow!("bad quantity {s}: {e}"))
}

/// `baseFeePerGas` of a block object; `None` for pre-London blocks.
pub fn block_base_fee(block: &Value) -> Result<Option<u64>> {
    match block.get("baseFeePerGas") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => parse_quantity(v).map(Some),
    }
}

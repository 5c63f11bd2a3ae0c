use anyhow::{Result, anyhow};
use reqwest::Client;
use schema::{PoolEvents, RecentSwap, SwapTransaction};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::time::Duration;

/// First-page size per event collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizes {
    pub swaps: usize,
    pub mints: usize,
    pub burns: usize,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Swaps<T> {
    swaps: Vec<T>,
}

#[derive(Clone)]
pub struct SubgraphClient {
    http: Client,
    url: String,
}

impl SubgraphClient {
    pub fn new(url: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| anyhow!("reqwest client: {e:?}"))?;
        Ok(Self { http, url })
    }

    /// Run one query and decode its `data` object. No retry.
    pub async fn query<T: DeserializeOwned>(&self, query: &str) -> Result<T> {
        let resp = self
            .http
            .post(&self.url)
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| anyhow!("subgraph request failed: {e:?}"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| anyhow!("subgraph read error: {e:?}"))?;

        if !status.is_success() {
            return Err(anyhow!("subgraph http error status={status} body={body}"));
        }

        decode_response(&body)
    }

    /// Swaps, mints and burns of one pool, oldest first, first page only.
    pub async fn pool_events(&self, pool_id: &str, page: PageSizes) -> Result<PoolEvents> {
        self.query(&pool_events_query(pool_id, page)).await
    }

    /// Latest swaps of one pool with token symbols, newest first.
    pub async fn recent_pool_swaps(&self, pool_id: &str, first: usize) -> Result<Vec<RecentSwap>> {
        let res: Swaps<RecentSwap> = self.query(&recent_pool_swaps_query(pool_id, first)).await?;
        Ok(res.swaps)
    }

    /// Transaction hashes of the latest swaps across all pools, newest first.
    pub async fn latest_swap_transactions(&self, first: usize) -> Result<Vec<String>> {
        let res: Swaps<SwapTransaction> = self.query(&latest_swaps_query(first)).await?;
        Ok(res.swaps.into_iter().map(|s| s.transaction.id).collect())
    }
}

fn decode_response<T: DeserializeOwned>(body: &str) -> Result<T> {
    let resp: GraphQlResponse<T> =
        serde_json::from_str(body).map_err(|e| anyhow!("subgraph decode error: {e}"))?;

    if !resp.errors.is_empty() {
        return Err(anyhow!("subgraph returned errors: {}", Value::Array(resp.errors)));
    }

    resp.data.ok_or_else(|| anyhow!("missing data field"))
}

const TRANSACTION_FIELDS: &str = "transaction { id blockNumber timestamp gasUsed gasPrice }";

pub fn pool_events_query(pool_id: &str, page: PageSizes) -> String {
    let filter =
        format!(r#"orderBy: timestamp, orderDirection: asc, where: {{ pool: "{pool_id}" }}"#);
    format!(
        r#"{{
  swaps(first: {swaps}, {filter}) {{
    {TRANSACTION_FIELDS}
    timestamp sender recipient origin amount0 amount1 amountUSD sqrtPriceX96 tick logIndex
  }}
  mints(first: {mints}, {filter}) {{
    {TRANSACTION_FIELDS}
    timestamp owner sender origin tickLower tickUpper amount amount0 amount1 logIndex
  }}
  burns(first: {burns}, {filter}) {{
    {TRANSACTION_FIELDS}
    timestamp owner origin tickLower tickUpper amount amount0 amount1 logIndex
  }}
}}"#,
        swaps = page.swaps,
        mints = page.mints,
        burns = page.burns,
    )
}

pub fn recent_pool_swaps_query(pool_id: &str, first: usize) -> String {
    format!(
        r#"{{
  swaps(first: {first}, orderBy: timestamp, orderDirection: desc, where: {{ pool: "{pool_id}" }}) {{
    amount0 amount1
    token0 {{ symbol }}
    token1 {{ symbol }}
    transaction {{ id }}
  }}
}}"#
    )
}

pub fn latest_swaps_query(first: usize) -> String {
    format!(
        r#"{{
  swaps(first: {first}, orderBy: timestamp, orderDirection: desc) {{
    transaction {{ id }}
  }}
}}"#
    )
}

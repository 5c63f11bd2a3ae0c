use anyhow::Result;
use log::{debug, info, warn};
use schema::{INDENT_WIDE, encode_json, load_optional};
use std::{collections::BTreeMap, path::Path};

/// Where block base fees come from on a cache miss.
pub trait BaseFeeSource {
    async fn base_fee_per_gas(&self, block_number: u64) -> Result<u64>;
}

/// Block number → base fee per gas (wei), persisted between runs.
///
/// Entries are only ever added; the file is rewritten by [`BlockFeeCache::flush`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockFeeCache {
    fees: BTreeMap<u64, u64>,
    fetched: usize,
}

impl BlockFeeCache {
    pub fn load(path: &Path) -> Result<Self> {
        let fees: Option<BTreeMap<u64, u64>> = load_optional(path)?;
        let fees = match fees {
            Some(fees) => {
                info!("loaded {} cached base fees from {}", fees.len(), path.display());
                fees
            }
            None => {
                warn!("no fee cache at {}, starting empty", path.display());
                BTreeMap::new()
            }
        };
        Ok(Self { fees, fetched: 0 })
    }

    pub fn get(&self, block_number: u64) -> Option<u64> {
        self.fees.get(&block_number).copied()
    }

    pub fn put(&mut self, block_number: u64, base_fee_per_gas: u64) {
        self.fees.insert(block_number, base_fee_per_gas);
    }

    pub fn len(&self) -> usize {
        self.fees.len()
    }

    /// Number of entries fetched from the source since load.
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    /// Cached fee, or exactly one source call on a miss.
    pub async fn get_or_fetch<S: BaseFeeSource>(
        &mut self,
        block_number: u64,
        source: &S,
    ) -> Result<u64> {
        if let Some(fee) = self.get(block_number) {
            return Ok(fee);
        }

        let fee = source.base_fee_per_gas(block_number).await?;
        debug!("fetched base fee block={} fee={}", block_number, fee);
        self.put(block_number, fee);
        self.fetched += 1;
        Ok(fee)
    }

    /// Encodes the whole cache before touching `path`.
    pub fn flush(&self, path: &Path) -> Result<()> {
        encode_json(path, &self.fees, INDENT_WIDE)?.write()?;
        info!("saved {} base fees to {}", self.fees.len(), path.display());
        Ok(())
    }
}

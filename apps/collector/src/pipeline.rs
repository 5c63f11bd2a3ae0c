use crate::{
    config::{SplitArgs, TimelineArgs},
    fee_cache::{BaseFeeSource, BlockFeeCache},
    rpc::RpcClient,
    subgraph::SubgraphClient,
};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use schema::{
    EventContext, EventType, INDENT_WIDE, LiquidityRow, PoolDecimals, PoolEvents,
    SandwichTagIndex, SwapRow, TimelineEntry, UnifiedEvent, encode_json, load_optional, sequence,
};
use std::path::Path;

fn load_tags(path: &Path) -> Result<SandwichTagIndex> {
    match load_optional::<SandwichTagIndex>(path)? {
        Some(tags) => {
            info!("loaded {} sandwich tags from {}", tags.len(), path.display());
            Ok(tags)
        }
        None => {
            warn!("no sandwich index at {}, all events untagged", path.display());
            Ok(SandwichTagIndex::default())
        }
    }
}

/// Project every raw event into the unified shape, in input order:
/// swaps, then mints, then burns. Base fees are resolved through `fees`,
/// calling `source` once per block missing from the cache.
pub async fn merge<S: BaseFeeSource>(
    events: &PoolEvents,
    decimals: &PoolDecimals,
    fees: &mut BlockFeeCache,
    source: &S,
    tags: &SandwichTagIndex,
) -> Result<Vec<UnifiedEvent>> {
    let mut out = Vec::with_capacity(events.len());

    for s in &events.swaps {
        let tx_id = &s.transaction.id;
        let ctx = resolve_context(&s.transaction, EventType::Swap, fees, source, tags).await?;
        let ev = UnifiedEvent::from_swap(s, decimals, ctx)
            .with_context(|| format!("swap tx={tx_id}"))?;
        debug!(
            "swap tx={} block={} log_index={} amount={} sandwich={}",
            tx_id, ev.block_number, ev.log_index, ev.amount, ev.sandwich
        );
        out.push(ev);
    }

    for m in &events.mints {
        let tx_id = &m.transaction.id;
        let ctx = resolve_context(&m.transaction, EventType::Liquidity, fees, source, tags).await?;
        let ev = UnifiedEvent::from_mint(m, decimals, ctx)
            .with_context(|| format!("mint tx={tx_id}"))?;
        debug!(
            "mint tx={} block={} log_index={} liquidity={}",
            tx_id, ev.block_number, ev.log_index, ev.amount
        );
        out.push(ev);
    }

    for b in &events.burns {
        let tx_id = &b.transaction.id;
        let ctx = resolve_context(&b.transaction, EventType::Liquidity, fees, source, tags).await?;
        let ev = UnifiedEvent::from_burn(b, decimals, ctx)
            .with_context(|| format!("burn tx={tx_id}"))?;
        debug!(
            "burn tx={} block={} log_index={} liquidity={}",
            tx_id, ev.block_number, ev.log_index, ev.amount
        );
        out.push(ev);
    }

    Ok(out)
}

async fn resolve_context<S: BaseFeeSource>(
    transaction: &schema::RawTransaction,
    event_type: EventType,
    fees: &mut BlockFeeCache,
    source: &S,
    tags: &SandwichTagIndex,
) -> Result<EventContext> {
    let block_number = transaction
        .block_number()
        .with_context(|| format!("tx={}", transaction.id))?;
    let block_base_fee_per_gas = fees
        .get_or_fetch(block_number, source)
        .await
        .with_context(|| format!("base fee for block {block_number}"))?;

    Ok(EventContext {
        block_base_fee_per_gas,
        sandwich: tags.lookup(&transaction.id, event_type),
    })
}

/// Fetch, merge and sequence the unified timeline, then persist it with the fee cache.
pub async fn run_timeline(
    subgraph: &SubgraphClient,
    rpc: &RpcClient,
    pool_id: &str,
    args: &TimelineArgs,
) -> Result<()> {
    let mut fees = BlockFeeCache::load(&args.fee_cache)?;
    let tags = load_tags(&args.sandwich)?;

    let page = args.page.page_sizes();
    info!(
        "timeline: pool={} swaps<={} mints<={} burns<={}",
        pool_id, page.swaps, page.mints, page.burns
    );

    let raw = subgraph.pool_events(pool_id, page).await?;
    info!(
        "fetched swaps={} mints={} burns={}",
        raw.swaps.len(),
        raw.mints.len(),
        raw.burns.len()
    );

    let mut events = merge(&raw, &args.decimals.pool_decimals(), &mut fees, rpc, &tags).await?;
    sequence(&mut events);

    info!(
        "events={} base_fees_fetched={} tagged={}",
        events.len(),
        fees.fetched(),
        events.iter().filter(|e| e.sandwich != 0).count()
    );

    persist_timeline(&events, &fees, &args.out, &args.fee_cache)?;
    info!("events saved to {}", args.out.display());
    Ok(())
}

/// The events are encoded before the cache is flushed and written after it.
fn persist_timeline(
    events: &[UnifiedEvent],
    fees: &BlockFeeCache,
    out: &Path,
    fee_cache: &Path,
) -> Result<()> {
    let events_file = encode_json(out, events, INDENT_WIDE)?;
    fees.flush(fee_cache)?;
    events_file.write()?;
    Ok(())
}

/// Per-kind projections of one fetch, each sequenced on its own.
#[derive(Debug, Default)]
pub struct SplitExport {
    pub all: Vec<TimelineEntry>,
    pub swaps: Vec<SwapRow>,
    pub mints: Vec<LiquidityRow>,
    pub burns: Vec<LiquidityRow>,
}

impl SplitExport {
    pub fn build(events: &PoolEvents, decimals: &PoolDecimals) -> Result<Self> {
        let mut out = SplitExport::default();

        for s in &events.swaps {
            let ctx = || format!("swap tx={}", s.transaction.id);
            out.swaps.push(SwapRow::from_raw(s, decimals).with_context(ctx)?);
            out.all.push(TimelineEntry::from_swap(s).with_context(ctx)?);
        }

        for m in &events.mints {
            let ctx = || format!("mint tx={}", m.transaction.id);
            out.mints.push(LiquidityRow::from_mint(m, decimals).with_context(ctx)?);
            out.all.push(TimelineEntry::from_mint(m).with_context(ctx)?);
        }

        for b in &events.burns {
            let ctx = || format!("burn tx={}", b.transaction.id);
            out.burns.push(LiquidityRow::from_burn(b, decimals).with_context(ctx)?);
            out.all.push(TimelineEntry::from_burn(b).with_context(ctx)?);
        }

        sequence(&mut out.all);
        sequence(&mut out.swaps);
        sequence(&mut out.mints);
        sequence(&mut out.burns);
        Ok(out)
    }

    pub fn write(&self, out_dir: &Path) -> Result<()> {
        let files = [
            encode_json(&out_dir.join("all.json"), &self.all, INDENT_WIDE)?,
            encode_json(&out_dir.join("swaps.json"), &self.swaps, INDENT_WIDE)?,
            encode_json(&out_dir.join("mints.json"), &self.mints, INDENT_WIDE)?,
            encode_json(&out_dir.join("burns.json"), &self.burns, INDENT_WIDE)?,
        ];
        for file in &files {
            file.write()?;
        }
        Ok(())
    }
}

pub async fn run_split(subgraph: &SubgraphClient, pool_id: &str, args: &SplitArgs) -> Result<()> {
    let page = args.page.page_sizes();
    info!(
        "split: pool={} swaps<={} mints<={} burns<={}",
        pool_id, page.swaps, page.mints, page.burns
    );

    let raw = subgraph.pool_events(pool_id, page).await?;
    let export = SplitExport::build(&raw, &args.decimals.pool_decimals())?;
    export.write(&args.out_dir)?;

    info!(
        "saved all={} swaps={} mints={} burns={} to {}",
        export.all.len(),
        export.swaps.len(),
        export.mints.len(),
        export.burns.len(),
        args.out_dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fee_cache::tests::CountingSource;
    use schema::{is_sequenced, write_json};

    const RESPONSE: &str =
        include_str!("../../../crates/schema/tests/fixtures/pool_events_response.json");
    const DECIMALS: PoolDecimals = PoolDecimals::new(18, 6, 6);

    fn pool_events() -> PoolEvents {
        let v: serde_json::Value = serde_json::from_str(RESPONSE).unwrap();
        serde_json::from_value(v["data"].clone()).unwrap()
    }

    #[tokio::test]
    async fn test_merge_emits_one_event_per_record() {
        let raw = pool_events();
        let source = CountingSource::default();
        let mut fees = BlockFeeCache::default();

        let events = merge(&raw, &DECIMALS, &mut fees, &source, &SandwichTagIndex::default())
            .await
            .unwrap();

        assert_eq!(events.len(), raw.swaps.len() + raw.mints.len() + raw.burns.len());
        // four distinct blocks, one of them shared by two swaps
        assert_eq!(source.calls(), 4);
        assert_eq!(fees.len(), 4);
        for ev in &events {
            assert_eq!(Some(ev.block_base_fee_per_gas), fees.get(ev.block_number));
        }
    }

    #[tokio::test]
    async fn test_merge_keeps_input_order_until_sequenced() {
        let raw = pool_events();
        let mut fees = BlockFeeCache::default();
        let mut events = merge(
            &raw,
            &DECIMALS,
            &mut fees,
            &CountingSource::default(),
            &SandwichTagIndex::default(),
        )
        .await
        .unwrap();

        let kinds: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec![
                EventType::Swap,
                EventType::Swap,
                EventType::Swap,
                EventType::Liquidity,
                EventType::Liquidity,
            ]
        );
        assert!(!is_sequenced(&events));

        sequence(&mut events);
        assert!(is_sequenced(&events));
    }

    #[tokio::test]
    async fn test_merge_applies_sandwich_tags() {
        let raw = pool_events();
        let victim = raw.swaps[1].transaction.id.clone();
        let tags: SandwichTagIndex = serde_json::from_str(&format!(
            r#"{{"{victim} swap": 5, "{victim} liquidity": 9}}"#
        ))
        .unwrap();

        let mut fees = BlockFeeCache::default();
        let events = merge(&raw, &DECIMALS, &mut fees, &CountingSource::default(), &tags)
            .await
            .unwrap();

        let tagged: Vec<&UnifiedEvent> = events.iter().filter(|e| e.sandwich != 0).collect();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].tx_id, victim);
        assert_eq!(tagged[0].sandwich, 5);
    }

    #[tokio::test]
    async fn test_warm_cache_makes_no_calls() {
        let raw = pool_events();
        let mut fees = BlockFeeCache::default();
        for block in 19_000_000..=19_000_003 {
            fees.put(block, 42);
        }
        let source = CountingSource::default();

        let events = merge(&raw, &DECIMALS, &mut fees, &source, &SandwichTagIndex::default())
            .await
            .unwrap();

        assert_eq!(source.calls(), 0);
        assert!(events.iter().all(|e| e.block_base_fee_per_gas == 42));
    }

    #[tokio::test]
    async fn test_merge_twice_is_byte_identical() {
        let raw = pool_events();
        let tags = SandwichTagIndex::default();

        let mut fees = BlockFeeCache::default();
        let mut first = merge(&raw, &DECIMALS, &mut fees, &CountingSource::default(), &tags)
            .await
            .unwrap();
        sequence(&mut first);

        let mut second = merge(&raw, &DECIMALS, &mut fees, &CountingSource::default(), &tags)
            .await
            .unwrap();
        sequence(&mut second);

        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        write_json(&a, &first, INDENT_WIDE).unwrap();
        write_json(&b, &second, INDENT_WIDE).unwrap();
        assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let source = CountingSource::default();
        let mut fees = BlockFeeCache::default();
        let events = merge(
            &PoolEvents::default(),
            &DECIMALS,
            &mut fees,
            &source,
            &SandwichTagIndex::default(),
        )
        .await
        .unwrap();

        assert!(events.is_empty());
        assert_eq!(source.calls(), 0);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("events.json");
        write_json(&out, &events, INDENT_WIDE).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_bad_record_names_transaction() {
        let mut raw = pool_events();
        raw.swaps[2].amount1 = "lots".to_string();
        let mut fees = BlockFeeCache::default();

        let err = merge(
            &raw,
            &DECIMALS,
            &mut fees,
            &CountingSource::default(),
            &SandwichTagIndex::default(),
        )
        .await
        .unwrap_err();

        let msg = format!("{err:#}");
        assert!(msg.contains(&raw.swaps[2].transaction.id), "{msg}");
        assert!(msg.contains("amount1"), "{msg}");
    }

    #[tokio::test]
    async fn test_repeated_swap_is_not_deduplicated() {
        let mut raw = pool_events();
        let repeated = raw.swaps[0].clone();
        raw.swaps.push(repeated.clone());

        let mut fees = BlockFeeCache::default();
        let mut events = merge(
            &raw,
            &DECIMALS,
            &mut fees,
            &CountingSource::default(),
            &SandwichTagIndex::default(),
        )
        .await
        .unwrap();
        assert_eq!(events.len(), raw.len());

        sequence(&mut events);
        let copies: Vec<usize> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.tx_id == repeated.transaction.id && e.log_index == 44)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(copies.len(), 2);
        assert_eq!(copies[1], copies[0] + 1);
        assert_eq!(events[copies[0]], events[copies[1]]);
    }

    #[test]
    fn test_failed_cache_write_keeps_previous_events() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("events.json");
        std::fs::write(&out, "previous run").unwrap();

        // a regular file where the cache directory should be
        let blocker = dir.path().join("graph");
        std::fs::write(&blocker, "").unwrap();
        let fee_cache = blocker.join("block_info.json");

        let mut fees = BlockFeeCache::default();
        fees.put(19_000_000, 1);

        assert!(persist_timeline(&[], &fees, &out, &fee_cache).is_err());
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "previous run");
    }

    #[test]
    fn test_persist_timeline_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("graph/events.json");
        let fee_cache = dir.path().join("graph/block_info.json");

        let mut fees = BlockFeeCache::default();
        fees.put(19_000_000, 1);

        persist_timeline(&[], &fees, &out, &fee_cache).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "[]");
        assert_eq!(BlockFeeCache::load(&fee_cache).unwrap().get(19_000_000), Some(1));
    }

    #[test]
    fn test_split_export_files() {
        let raw = pool_events();
        let export = SplitExport::build(&raw, &PoolDecimals::new(6, 18, 6)).unwrap();

        assert_eq!(export.all.len(), 5);
        assert_eq!(export.swaps.len(), 3);
        assert_eq!(export.mints.len(), 1);
        assert_eq!(export.burns.len(), 1);
        assert!(is_sequenced(&export.all));
        assert!(is_sequenced(&export.swaps));

        let dir = tempfile::tempdir().unwrap();
        export.write(dir.path()).unwrap();
        for name in ["all.json", "swaps.json", "mints.json", "burns.json"] {
            assert!(dir.path().join(name).exists(), "{name} missing");
        }

        let burns = std::fs::read_to_string(dir.path().join("burns.json")).unwrap();
        assert!(burns.contains("\"amount\": -1500000000000000"));
    }
}

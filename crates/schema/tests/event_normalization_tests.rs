//! Event normalization tests
//!
//! Tests for:
//! - Subgraph response decoding into typed raw records
//! - Sign conventions of swaps and burns
//! - Timeline and split projections over a recorded response
//! - Deterministic output

use serde_json::Value;
use std::fs;

use schema::{
    EventContext, EventType, LiquidityRow, PoolDecimals, PoolEvents, SplitKind, SwapRow,
    TimelineEntry, UnifiedEvent, is_sequenced, sequence, to_fixed,
};

const FIXTURES_DIR: &str = "tests/fixtures";

fn load_fixture(name: &str) -> Value {
    let path = format!("{}/{}.json", FIXTURES_DIR, name);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path, e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path, e))
}

fn pool_events() -> PoolEvents {
    let response = load_fixture("pool_events_response");
    serde_json::from_value(response["data"].clone()).expect("pool events")
}

const DECIMALS: PoolDecimals = PoolDecimals::new(18, 6, 6);

fn unified(events: &PoolEvents) -> Vec<UnifiedEvent> {
    let ctx = EventContext::default();
    let mut out = Vec::new();
    for s in &events.swaps {
        out.push(UnifiedEvent::from_swap(s, &DECIMALS, ctx).unwrap());
    }
    for m in &events.mints {
        out.push(UnifiedEvent::from_mint(m, &DECIMALS, ctx).unwrap());
    }
    for b in &events.burns {
        out.push(UnifiedEvent::from_burn(b, &DECIMALS, ctx).unwrap());
    }
    out
}

// =============================================================================
// Decoding
// =============================================================================

mod decoding_tests {
    use super::*;

    #[test]
    fn test_decode_response() {
        let events = pool_events();
        assert_eq!(events.swaps.len(), 3);
        assert_eq!(events.mints.len(), 1);
        assert_eq!(events.burns.len(), 1);
        assert_eq!(events.len(), 5);
        assert_eq!(events.swaps[0].amount_usd, "3000.0");
        assert_eq!(events.mints[0].tick_lower, "-201000");
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let mut response = load_fixture("pool_events_response");
        response["data"]["swaps"][0]
            .as_object_mut()
            .unwrap()
            .remove("logIndex");

        let res: Result<PoolEvents, _> = serde_json::from_value(response["data"].clone());
        let err = res.unwrap_err().to_string();
        assert!(err.contains("logIndex"), "unexpected error: {err}");
    }

    #[test]
    fn test_empty_collections() {
        let events: PoolEvents =
            serde_json::from_str(r#"{"swaps": [], "mints": [], "burns": []}"#).unwrap();
        assert!(events.is_empty());
        assert!(unified(&events).is_empty());
    }
}

// =============================================================================
// Sign conventions
// =============================================================================

mod sign_tests {
    use super::*;

    #[test]
    fn test_swap_legs_oppose_raw_sign() {
        let events = pool_events();
        for raw in &events.swaps {
            let ev = UnifiedEvent::from_swap(raw, &DECIMALS, EventContext::default()).unwrap();
            let raw0 = to_fixed(&raw.amount0, DECIMALS.token0).unwrap();
            let raw1 = to_fixed(&raw.amount1, DECIMALS.token1).unwrap();

            assert_eq!(ev.amount0, -raw0, "tx {}", raw.transaction.id);
            assert_eq!(ev.amount1, -raw1, "tx {}", raw.transaction.id);
            assert_eq!(ev.amount.signum(), if ev.amount1 < 0 { -1 } else { 1 });
        }
    }

    #[test]
    fn test_reference_swap_scenario() {
        let events = pool_events();
        let ev =
            UnifiedEvent::from_swap(&events.swaps[0], &DECIMALS, EventContext::default()).unwrap();

        assert_eq!(ev.amount0, -1_500_000_000_000_000_000);
        assert_eq!(ev.amount1, 3_000_000_000);
        assert_eq!(ev.amount, 3_000_000_000);
    }

    #[test]
    fn test_burn_amount_is_negated_liquidity() {
        let events = pool_events();
        let raw = &events.burns[0];
        let ev = UnifiedEvent::from_burn(raw, &DECIMALS, EventContext::default()).unwrap();

        assert_eq!(ev.amount, -raw.amount.parse::<i128>().unwrap());
        assert_eq!(ev.amount0, 3_250_000_000_000_000_000);
        assert_eq!(ev.amount1, 6_000_500_000);
    }

    #[test]
    fn test_mint_amounts_keep_sign() {
        let events = pool_events();
        let ev = UnifiedEvent::from_mint(&events.mints[0], &DECIMALS, EventContext::default())
            .unwrap();

        assert_eq!(ev.event_type, EventType::Liquidity);
        assert_eq!(ev.amount, 4_500_000_000_000_000);
        assert_eq!(ev.amount0, 10_000_000_000_000_000_000);
        assert_eq!(ev.amount1, 20_000_000_000);
    }
}

// =============================================================================
// Timeline
// =============================================================================

mod timeline_tests {
    use super::*;

    #[test]
    fn test_unified_timeline_order() {
        let mut events = unified(&pool_events());
        assert_eq!(events.len(), 5);

        sequence(&mut events);
        assert!(is_sequenced(&events));

        let positions: Vec<(u64, u64)> = events
            .iter()
            .map(|e| (e.block_number, e.log_index))
            .collect();
        assert_eq!(
            positions,
            vec![
                (19_000_000, 120),
                (19_000_001, 7),
                (19_000_002, 3),
                (19_000_002, 44),
                (19_000_003, 0),
            ]
        );
    }

    #[test]
    fn test_timeline_output_is_deterministic() {
        let raw = pool_events();

        let mut first = unified(&raw);
        sequence(&mut first);
        let mut second = unified(&raw);
        sequence(&mut second);

        assert_eq!(
            serde_json::to_vec_pretty(&first).unwrap(),
            serde_json::to_vec_pretty(&second).unwrap()
        );
    }

    #[test]
    fn test_split_projections() {
        let raw = pool_events();
        let decimals = PoolDecimals::new(6, 18, 6);

        let mut swaps: Vec<SwapRow> = raw
            .swaps
            .iter()
            .map(|s| SwapRow::from_raw(s, &decimals).unwrap())
            .collect();
        sequence(&mut swaps);
        assert!(is_sequenced(&swaps));
        assert_eq!(swaps[0].block_number, 19_000_001);
        // USD is normalized but never sign-adjusted in the split export
        assert!(swaps.iter().all(|s| s.amount_usd > 0));

        let burns: Vec<LiquidityRow> = raw
            .burns
            .iter()
            .map(|b| LiquidityRow::from_burn(b, &decimals).unwrap())
            .collect();
        assert_eq!(burns[0].amount, -1_500_000_000_000_000);

        let mut all: Vec<TimelineEntry> = Vec::new();
        all.extend(raw.swaps.iter().map(|s| TimelineEntry::from_swap(s).unwrap()));
        all.extend(raw.mints.iter().map(|m| TimelineEntry::from_mint(m).unwrap()));
        all.extend(raw.burns.iter().map(|b| TimelineEntry::from_burn(b).unwrap()));
        sequence(&mut all);

        let kinds: Vec<SplitKind> = all.iter().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec![
                SplitKind::Mint,
                SplitKind::Swap,
                SplitKind::Swap,
                SplitKind::Swap,
                SplitKind::Burn,
            ]
        );
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use schema::{INDENT_NARROW, SandwichTagIndex, UnifiedEvent, load_json, write_json};
use std::path::Path;

mod config;
mod report;

use config::Command;
use report::{BusyReport, BusyThresholds, Tally};

fn setup_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

fn load_events(path: &Path) -> Result<Vec<UnifiedEvent>> {
    let events: Vec<UnifiedEvent> =
        load_json(path).with_context(|| format!("reading timeline {}", path.display()))?;
    info!("loaded {} events from {}", events.len(), path.display());
    Ok(events)
}

fn print_tally(title: &str, tally: &Tally) {
    println!("{title} ({}):", tally.len());
    for (key, count) in tally.first_seen() {
        println!("  {key}: {count}");
    }
    println!("{title} by count:");
    for (key, count) in tally.by_count() {
        println!("  {key}: {count}");
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = config::Cli::parse();

    match &cli.command {
        Command::Busy(args) => {
            let events = load_events(&args.input.events)?;
            let thresholds = BusyThresholds {
                block: args.min_block_events,
                origin: args.min_origin_events,
                pair: args.min_pair_events,
            };
            let report = BusyReport::build(&events, thresholds);
            print_tally("blocks", &report.blocks);
            print_tally("origins", &report.origins);
            print_tally("block origins", &report.pairs);
        }
        Command::PriorityFee(args) => {
            let events = load_events(&args.events)?;
            let avg = report::average_priority_fee(&events);
            println!("average priority fee: {avg} wei");
        }
        Command::Sandwich(args) => {
            let events = load_events(&args.input.events)?;
            let tags = SandwichTagIndex::from_events(&events);
            for (key, tag) in tags.iter() {
                debug!("{key} -> {tag}");
            }
            write_json(&args.out, &tags, INDENT_NARROW)?;
            info!("saved {} sandwich tags to {}", tags.len(), args.out.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::EventType;

    #[test]
    fn test_sandwich_extraction_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let events_path = dir.path().join("events.json");
        let out = dir.path().join("graph/sandwich.json");

        std::fs::write(
            &events_path,
            r#"[
    {"sandwich": 1, "eventType": "swap", "origin": "0xbot", "txId": "0xaa", "blockNumber": 10,
     "blockBaseFeePerGas": 5, "timestamp": 1, "logIndex": 0, "gasUsed": 1, "gasPrice": 9,
     "amount0": 1, "amount1": -1, "amount": -1, "sqrtPriceX96": 79228162514264337593543950336,
     "tick": 0, "tickLower": 0, "tickUpper": 0},
    {"sandwich": 0, "eventType": "liquidity", "origin": "0xlp", "txId": "0xbb", "blockNumber": 10,
     "blockBaseFeePerGas": 5, "timestamp": 1, "logIndex": 1, "gasUsed": 1, "gasPrice": 9,
     "amount0": 1, "amount1": 1, "amount": 100, "sqrtPriceX96": 0,
     "tick": 0, "tickLower": -60, "tickUpper": 60}
]"#,
        )
        .unwrap();

        let events = load_events(&events_path).unwrap();
        let tags = SandwichTagIndex::from_events(&events);
        write_json(&out, &tags, INDENT_NARROW).unwrap();

        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "{\n  \"0xaa swap\": 1\n}"
        );

        let reloaded: SandwichTagIndex = load_json(&out).unwrap();
        assert_eq!(reloaded.lookup("0xaa", EventType::Swap), 1);
        assert_eq!(reloaded.lookup("0xbb", EventType::Liquidity), 0);
    }

    #[test]
    fn test_missing_timeline_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_events(&dir.path().join("nope.json")).unwrap_err();
        assert!(format!("{err:#}").contains("reading timeline"));
    }
}

pub mod event;
pub mod raw;
pub mod sandwich;
pub mod store;
pub mod timeline;
pub mod units;

// Subgraph input records
pub use raw::{
    PoolEvents, RawBurn, RawMint, RawSwap, RawTransaction, RecentSwap, SwapTransaction,
    TokenSymbol, TransactionId,
};

// Output records
pub use event::{
    EventContext, EventType, LiquidityRow, SplitKind, SwapRow, TimelineEntry, UnifiedEvent,
    signed_usd_amount,
};

// Sandwich tags
pub use sandwich::{SandwichError, SandwichTagIndex};

// Ordering
pub use timeline::{Chronological, is_sequenced, sequence};

// Units
pub use units::{ConvertError, PoolDecimals, parse_int, parse_u256, to_fixed};

// Persistence
pub use store::{
    EncodedFile, INDENT_NARROW, INDENT_WIDE, StoreError, encode_json, load_json, load_optional,
    write_json,
};

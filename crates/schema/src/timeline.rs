//! Chronological ordering of pool events by `(blockNumber, logIndex)`.

use crate::event::{LiquidityRow, SwapRow, TimelineEntry, UnifiedEvent};

/// Records that can be placed on the chain timeline.
pub trait Chronological {
    fn block_number(&self) -> u64;
    fn log_index(&self) -> u64;

    fn position(&self) -> (u64, u64) {
        (self.block_number(), self.log_index())
    }
}

/// Stable sort ascending by `(blockNumber, logIndex)`; ties keep input order.
pub fn sequence<T: Chronological>(events: &mut [T]) {
    events.sort_by_key(|e| e.position());
}

/// True when every adjacent pair is in non-decreasing timeline order.
pub fn is_sequenced<T: Chronological>(events: &[T]) -> bool {
    events.windows(2).all(|w| w[0].position() <= w[1].position())
}

macro_rules! impl_chronological {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Chronological for $ty {
                fn block_number(&self) -> u64 {
                    self.block_number
                }

                fn log_index(&self) -> u64 {
                    self.log_index
                }
            }
        )*
    };
}

impl_chronological!(UnifiedEvent, SwapRow, LiquidityRow, TimelineEntry);

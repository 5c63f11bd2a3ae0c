use schema::UnifiedEvent;
use std::collections::HashMap;

/// Occurrence counts that remember the order keys were first seen in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl Tally {
    pub fn add(&mut self, key: String) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    /// Drop keys seen fewer than `min` times.
    pub fn at_least(self, min: usize) -> Self {
        let mut out = Tally::default();
        for (key, count) in self.entries.into_iter().filter(|(_, c)| *c >= min) {
            out.index.insert(key.clone(), out.entries.len());
            out.entries.push((key, count));
        }
        out
    }

    #[cfg(test)]
    fn get(&self, key: &str) -> Option<usize> {
        self.index.get(key).map(|&i| self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn first_seen(&self) -> &[(String, usize)] {
        &self.entries
    }

    /// Highest counts first; ties keep first-seen order.
    pub fn by_count(&self) -> Vec<(String, usize)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyThresholds {
    pub block: usize,
    pub origin: usize,
    pub pair: usize,
}

impl Default for BusyThresholds {
    fn default() -> Self {
        Self {
            block: 3,
            origin: 2,
            pair: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusyReport {
    pub blocks: Tally,
    pub origins: Tally,
    /// keyed `"{block} {origin}"`
    pub pairs: Tally,
}

impl BusyReport {
    pub fn build(events: &[UnifiedEvent], thresholds: BusyThresholds) -> Self {
        let mut blocks = Tally::default();
        let mut origins = Tally::default();
        let mut pairs = Tally::default();

        for ev in events {
            blocks.add(ev.block_number.to_string());
            origins.add(ev.origin.clone());
            pairs.add(format!("{} {}", ev.block_number, ev.origin));
        }

        Self {
            blocks: blocks.at_least(thresholds.block),
            origins: origins.at_least(thresholds.origin),
            pairs: pairs.at_least(thresholds.pair),
        }
    }
}

/// Mean of `gasPrice - blockBaseFeePerGas` in wei; 0 for an empty timeline.
pub fn average_priority_fee(events: &[UnifiedEvent]) -> f64 {
    if events.is_empty() {
        return 0.0;
    }
    let total: i128 = events.iter().map(UnifiedEvent::priority_fee).sum();
    total as f64 / events.len() as f64
}

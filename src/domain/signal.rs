//! Trading signals and per-timestamp signal maps.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Strategy-derived trading intent at a single timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Precedence used when conflicting signals land on one timestamp:
    /// Sell over Buy over Hold, so a conflict never compounds exposure.
    fn rank(self) -> u8 {
        match self {
            Signal::Sell => 2,
            Signal::Buy => 1,
            Signal::Hold => 0,
        }
    }
}

/// Timestamp-ordered signal map. Timestamps absent from the map are Hold.
pub type SignalMap = BTreeMap<DateTime<Utc>, Signal>;

/// Fold a strategy's raw output into a [`SignalMap`], resolving duplicate
/// timestamps by precedence (Sell wins over Buy). Strategies should not emit
/// duplicates, but the engine must not compound exposure if one does.
pub fn collect_signals(
    raw: impl IntoIterator<Item = (DateTime<Utc>, Signal)>,
) -> SignalMap {
    let mut map = SignalMap::new();
    for (timestamp, signal) in raw {
        map.entry(timestamp)
            .and_modify(|existing| {
                if signal.rank() > existing.rank() {
                    *existing = signal;
                }
            })
            .or_insert(signal);
    }
    map
}

/// The signal effective at a timestamp; missing entries default to Hold.
pub fn effective_signal(map: &SignalMap, timestamp: DateTime<Utc>) -> Signal {
    map.get(&timestamp).copied().unwrap_or(Signal::Hold)
}

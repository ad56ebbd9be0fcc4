//! Cumulative transmission counts and the derived top-spreader ranking.

use std::collections::HashMap;

/// Number of spreaders listed in each step record.
pub const LEADERBOARD_SIZE: usize = 5;

/// Ranked spreader with its cumulative transmission count.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LeaderboardEntry {
    /// Display name of the spreader.
    pub id: String,
    /// Successful transmissions credited so far.
    pub count: u64,
}

/// Transmission counts keyed by spreader display name.
///
/// Names are remembered in the order they were first credited; that order
/// breaks ties in [`TransmissionLedger::top`].
///
/// # Examples
/// ```
/// use contagion_core::TransmissionLedger;
///
/// let mut ledger = TransmissionLedger::default();
/// ledger.credit("a");
/// ledger.credit("b");
/// ledger.credit("b");
/// ledger.credit("c");
/// let names: Vec<_> = ledger.top(5).into_iter().map(|entry| entry.id).collect();
/// assert_eq!(names, ["b", "a", "c"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransmissionLedger {
    entries: Vec<LeaderboardEntry>,
    index: HashMap<String, usize>,
}

impl TransmissionLedger {
    /// Adds one transmission to `name`.
    pub fn credit(&mut self, name: &str) {
        if let Some(&position) = self.index.get(name) {
            if let Some(entry) = self.entries.get_mut(position) {
                entry.count += 1;
            }
            return;
        }
        self.index.insert(name.to_owned(), self.entries.len());
        self.entries.push(LeaderboardEntry {
            id: name.to_owned(),
            count: 1,
        });
    }

    /// Count credited to `name`, zero if never credited.
    #[must_use]
    pub fn count(&self, name: &str) -> u64 {
        self.index
            .get(name)
            .and_then(|&position| self.entries.get(position))
            .map_or(0, |entry| entry.count)
    }

    /// Number of distinct spreaders credited.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been credited yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all credited transmissions.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    /// The `limit` highest counts, descending, ties in first-credited order.
    ///
    /// Re-derived from scratch on every call.
    #[must_use]
    pub fn top(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let mut ranked = self.entries.clone();
        // Stable sort keeps first-credited order among equal counts.
        ranked.sort_by(|left, right| right.count.cmp(&left.count));
        ranked.truncate(limit);
        ranked
    }
}

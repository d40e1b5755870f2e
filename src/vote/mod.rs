//! Self-consistency voting over repeated model outcomes.
//!
//! A vote round is resolved by a first-found strict-majority scan: positions
//! are visited in issuance order and the first value occurring more than
//! `n / 2` times wins. Callers must keep outcomes in the order the calls were
//! issued so tie handling stays reproducible.

mod confidence;

pub use confidence::{parse_percent, Confidence};

/// Winning value of a vote round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Majority {
    /// Index of the earliest occurrence of the winning value
    pub index: usize,
    /// How many votes the winning value received
    pub count: usize,
}

/// Find the earliest value whose count strictly exceeds half the votes.
///
/// Returns `None` when no value has a strict majority (including an empty
/// round).
pub fn resolve_majority<T: PartialEq>(votes: &[T]) -> Option<Majority> {
    let total = votes.len();
    for (index, vote) in votes.iter().enumerate() {
        let count = votes.iter().filter(|v| *v == vote).count();
        // count > total / 2 with real division
        if 2 * count > total {
            return Some(Majority { index, count });
        }
    }
    None
}

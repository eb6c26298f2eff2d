//! Status transition table.
//!
//! The board currently lets a report move between any two distinct states.
//! Restricting the workflow means deleting rows here; nothing else encodes
//! which moves are legal.

use crate::model::Status;

/// Allowed `(from, to)` moves.
pub const TRANSITIONS: &[(Status, Status)] = &[
    (Status::New, Status::InProgress),
    (Status::New, Status::Done),
    (Status::InProgress, Status::New),
    (Status::InProgress, Status::Done),
    (Status::Done, Status::New),
    (Status::Done, Status::InProgress),
];

#[must_use]
pub fn is_allowed(from: Status, to: Status) -> bool {
    TRANSITIONS.iter().any(|&(f, t)| f == from && t == to)
}

/// Every state reachable from `from` in one move, in table order.
pub fn targets(from: Status) -> impl Iterator<Item = Status> {
    TRANSITIONS
        .iter()
        .filter(move |(f, _)| *f == from)
        .map(|&(_, t)| t)
}

#[cfg(test)]
mod tests {
    use super::{TRANSITIONS, is_allowed, targets};
    use crate::model::Status;
    use std::collections::HashSet;

    #[test]
    fn every_distinct_pair_is_listed() {
        for from in Status::ALL {
            for to in Status::ALL {
                assert_eq!(is_allowed(from, to), from != to, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn table_has_no_duplicates() {
        let unique: HashSet<_> = TRANSITIONS.iter().collect();
        assert_eq!(unique.len(), TRANSITIONS.len());
    }

    #[test]
    fn targets_follow_table_order() {
        let from_new: Vec<_> = targets(Status::New).collect();
        assert_eq!(from_new, vec![Status::InProgress, Status::Done]);
        assert_eq!(targets(Status::Done).count(), 2);
    }
}

//! Operation merging.
//!
//! # Invariants
//! - Ids are unique in the output
//! - Output is sorted by date descending; equal dates keep prior entries
//!   first, then newly discovered ones in discovery order
//! - Every id from `old` is present in the output
//!
//! Lookup goes through an id → position map, so merging is linear in the
//! input sizes plus the final sort.

use std::collections::HashMap;

use crate::account::Operation;

/// Merge freshly fetched operations into the prior date-descending list.
///
/// A known id is replaced in place by the fresh entry (status and
/// confirmation fields refined); an unknown id is appended before re-sorting.
pub fn merge_operations(old: &[Operation], new: &[Operation]) -> Vec<Operation> {
    if new.is_empty() {
        return old.to_vec();
    }

    let mut merged: Vec<Operation> = Vec::with_capacity(old.len() + new.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(old.len() + new.len());

    for op in old {
        match positions.get(&op.id) {
            Some(&i) => merged[i] = op.clone(),
            None => {
                positions.insert(op.id.clone(), merged.len());
                merged.push(op.clone());
            }
        }
    }

    let mut inserted = 0usize;
    for op in new {
        match positions.get(&op.id) {
            Some(&i) => merged[i] = op.clone(),
            None => {
                positions.insert(op.id.clone(), merged.len());
                merged.push(op.clone());
                inserted += 1;
            }
        }
    }

    // sort_by is stable, which preserves discovery order among equal dates.
    merged.sort_by(|a, b| b.date.cmp(&a.date));

    tracing::trace!(
        prior = old.len(),
        fetched = new.len(),
        inserted = inserted,
        total = merged.len(),
        "Merged operations"
    );

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Amount, OperationType};
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    fn op(id: &str, ts: i64) -> Operation {
        Operation {
            id: id.to_string(),
            hash: id.to_string(),
            account_id: "acc".to_string(),
            op_type: OperationType::In,
            value: Amount::from(1u64),
            fee: Amount::ZERO,
            senders: vec!["them".to_string()],
            recipients: vec!["me".to_string()],
            date: Utc.timestamp_opt(ts, 0).unwrap(),
            block_height: Some(1),
            block_hash: None,
            transaction_sequence_number: None,
            has_failed: false,
        }
    }

    fn ids(ops: &[Operation]) -> Vec<&str> {
        ops.iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn test_known_identity_is_refined_in_place() {
        let old = vec![op("A", 2)];
        let mut failed = op("A", 2);
        failed.has_failed = true;

        let merged = merge_operations(&old, &[failed]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "A");
        assert!(merged[0].has_failed);
    }

    #[test]
    fn test_new_operations_sorted_descending() {
        let merged = merge_operations(&[], &[op("B", 1), op("C", 3)]);
        assert_eq!(ids(&merged), vec!["C", "B"]);
    }

    #[test]
    fn test_no_loss_from_narrow_window() {
        let old = vec![op("D", 9), op("C", 7), op("B", 5)];
        let merged = merge_operations(&old, &[op("E", 10)]);
        assert_eq!(ids(&merged), vec!["E", "D", "C", "B"]);

        let merged = merge_operations(&old, &[]);
        assert_eq!(merged, old);
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let old = vec![op("A", 5)];
        let merged = merge_operations(&old, &[op("X", 5), op("Y", 5), op("Z", 6)]);
        assert_eq!(ids(&merged), vec!["Z", "A", "X", "Y"]);
    }

    #[test]
    fn test_duplicates_within_fetch_collapse() {
        let mut second = op("B", 4);
        second.block_height = Some(99);
        let merged = merge_operations(&[], &[op("B", 4), second]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].block_height, Some(99));
    }

    #[test]
    fn test_idempotent() {
        let old = vec![op("D", 9), op("B", 5)];
        let mut refined = op("B", 5);
        refined.has_failed = true;
        let new = vec![op("C", 5), refined, op("E", 12)];

        let once = merge_operations(&old, &new);
        let twice = merge_operations(&old, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_every_prior_identity_survives() {
        let old: Vec<Operation> = (0..50).rev().map(|i| op(&format!("op{}", i), i)).collect();
        let new: Vec<Operation> = (40..60).map(|i| op(&format!("op{}", i), i)).collect();

        let merged = merge_operations(&old, &new);
        let merged_ids: HashSet<&str> = merged.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(merged.len(), merged_ids.len());
        for o in &old {
            assert!(merged_ids.contains(o.id.as_str()));
        }
        assert_eq!(merged.len(), 60);
        assert!(merged.windows(2).all(|w| w[0].date >= w[1].date));
    }
}

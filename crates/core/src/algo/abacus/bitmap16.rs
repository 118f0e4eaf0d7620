//! 16-item bitmap machine for closed-itemset mining (§4.7, §9).
//!
//! When the number of distinct `(layer, community)` labels is ≤16, every
//! transaction's item set fits a `u16` bitmask. Closed itemsets are
//! enumerated by recursive projection: extend a prefix itemset one item
//! at a time (in increasing item-index order, so every combination is
//! visited exactly once), intersecting tidsets as we go, and discarding
//! the branch as soon as its tidset empties out. Grounded on
//! `lib/eclat/tract/src/fim16.c`'s fixed-size per-item transaction
//! buckets.

use super::{intersect, is_superset, ClosedItemsetMiner};

pub struct Bitmap16Miner;

impl ClosedItemsetMiner for Bitmap16Miner {
    fn mine(
        transactions: &[Vec<usize>],
        num_items: usize,
        min_support: usize,
        max_size: Option<usize>,
    ) -> Vec<(Vec<usize>, Vec<usize>)> {
        assert!(num_items <= 16, "Bitmap16Miner only handles up to 16 distinct items");

        let mut item_tid: Vec<Vec<usize>> = vec![Vec::new(); num_items];
        for (ti, tx) in transactions.iter().enumerate() {
            for &item in tx {
                item_tid[item].push(ti);
            }
        }

        let full_tid: Vec<usize> = (0..transactions.len()).collect();
        let mut candidates: Vec<(u16, Vec<usize>)> = Vec::new();
        recurse(&item_tid, num_items, 0, 0u16, full_tid, &mut candidates);

        let mut results = Vec::new();
        for (mask, tid) in &candidates {
            let size = mask.count_ones() as usize;
            // `s` is both the minimum itemset size (§4.7, step 3 — "at
            // least s items") and, per the Eclat semantics `abacus.h`'s
            // `eclat_merge` mines under, the minimum tidset frequency:
            // an itemset supported by too few actors is discarded even
            // if it happens to span enough labels.
            if size < min_support || tid.len() < min_support {
                continue;
            }
            if let Some(max) = max_size {
                if size > max {
                    continue;
                }
            }
            let closed = (0..num_items).all(|i| mask & (1u16 << i) != 0 || !is_superset(&item_tid[i], tid));
            if closed {
                let itemset: Vec<usize> = (0..num_items).filter(|&i| mask & (1u16 << i) != 0).collect();
                results.push((itemset, tid.clone()));
            }
        }
        results
    }
}

fn recurse(
    item_tid: &[Vec<usize>],
    num_items: usize,
    start: usize,
    mask: u16,
    tid: Vec<usize>,
    out: &mut Vec<(u16, Vec<usize>)>,
) {
    for j in start..num_items {
        let new_tid = intersect(&tid, &item_tid[j]);
        if new_tid.is_empty() {
            continue;
        }
        let new_mask = mask | (1u16 << j);
        recurse(item_tid, num_items, j + 1, new_mask, new_tid.clone(), out);
        out.push((new_mask, new_tid));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_itemsets_match_scenario_d() {
        // Items: 0=(L1,c1) 1=(L1,c2) 2=(L2,c1) 3=(L2,c2)
        // A:{0,2} B:{0,2} C:{0,3} D:{1,3} E:{1,3}
        let tx = vec![vec![0, 2], vec![0, 2], vec![0, 3], vec![1, 3], vec![1, 3]];
        let mut results = Bitmap16Miner::mine(&tx, 4, 2, None);
        results.sort();
        assert_eq!(results, vec![(vec![0, 2], vec![0, 1]), (vec![1, 3], vec![3, 4])]);
    }

    #[test]
    fn below_min_size_is_excluded() {
        // A:{0,1} B:{0,1} C:{0} alone — {0} meets the support threshold
        // (3 actors) but not the size threshold; {1} meets neither size
        // nor support; only {0,1} (size 2, support 2) survives.
        let tx = vec![vec![0, 1], vec![0, 1], vec![0]];
        let results = Bitmap16Miner::mine(&tx, 2, 2, None);
        assert_eq!(results, vec![(vec![0, 1], vec![0, 1])]);
    }

    #[test]
    fn below_min_support_is_excluded_despite_meeting_size() {
        // A:{0,2} B:{0,2} C:{0,3}: {0,3} has itemset size 2 but support 1
        // (only actor C), so it must be excluded even though it is closed.
        let tx = vec![vec![0, 2], vec![0, 2], vec![0, 3]];
        let results = Bitmap16Miner::mine(&tx, 4, 2, None);
        assert_eq!(results, vec![(vec![0, 2], vec![0, 1])]);
    }

    #[test]
    fn max_itemset_size_caps_results() {
        let tx = vec![vec![0, 1, 2], vec![0, 1, 2]];
        let results = Bitmap16Miner::mine(&tx, 3, 1, Some(2));
        assert!(results.iter().all(|(items, _)| items.len() <= 2));
    }
}

//! Eclat-style vertical-tidset closed-itemset miner for >16 items (§4.7,
//! §9).
//!
//! Same recursive-projection algorithm as [`super::bitmap16::Bitmap16Miner`],
//! generalized from a `u16` bitmask to a `Vec<usize>` itemset so it scales
//! past 16 distinct `(layer, community)` labels. The two miners must agree
//! on any instance small enough for both to run (tested below and in
//! `mod.rs`).

use super::{intersect, is_superset, ClosedItemsetMiner};

pub struct EclatMiner;

impl ClosedItemsetMiner for EclatMiner {
    fn mine(
        transactions: &[Vec<usize>],
        num_items: usize,
        min_support: usize,
        max_size: Option<usize>,
    ) -> Vec<(Vec<usize>, Vec<usize>)> {
        let mut item_tid: Vec<Vec<usize>> = vec![Vec::new(); num_items];
        for (ti, tx) in transactions.iter().enumerate() {
            for &item in tx {
                item_tid[item].push(ti);
            }
        }

        let full_tid: Vec<usize> = (0..transactions.len()).collect();
        let mut candidates: Vec<(Vec<usize>, Vec<usize>)> = Vec::new();
        recurse(&item_tid, num_items, 0, Vec::new(), full_tid, &mut candidates);

        let mut results = Vec::new();
        for (itemset, tid) in &candidates {
            // Same dual size/frequency threshold as `Bitmap16Miner` (see
            // its comment): `s` bounds both itemset length and tidset
            // size, matching `abacus.h`'s `eclat_merge(mnet, …,
            // min_support)`.
            if itemset.len() < min_support || tid.len() < min_support {
                continue;
            }
            if let Some(max) = max_size {
                if itemset.len() > max {
                    continue;
                }
            }
            let closed = (0..num_items)
                .all(|i| itemset.binary_search(&i).is_ok() || !is_superset(&item_tid[i], tid));
            if closed {
                results.push((itemset.clone(), tid.clone()));
            }
        }
        results
    }
}

fn recurse(
    item_tid: &[Vec<usize>],
    num_items: usize,
    start: usize,
    itemset: Vec<usize>,
    tid: Vec<usize>,
    out: &mut Vec<(Vec<usize>, Vec<usize>)>,
) {
    for j in start..num_items {
        let new_tid = intersect(&tid, &item_tid[j]);
        if new_tid.is_empty() {
            continue;
        }
        let mut new_itemset = itemset.clone();
        new_itemset.push(j);
        recurse(item_tid, num_items, j + 1, new_itemset.clone(), new_tid.clone(), out);
        out.push((new_itemset, new_tid));
    }
}

#[cfg(test)]
mod tests {
    use super::super::bitmap16::Bitmap16Miner;
    use super::*;

    fn scenario_d_transactions() -> Vec<Vec<usize>> {
        vec![vec![0, 2], vec![0, 2], vec![0, 3], vec![1, 3], vec![1, 3]]
    }

    #[test]
    fn agrees_with_bitmap16_on_small_instance() {
        let tx = scenario_d_transactions();
        let mut eclat_results = EclatMiner::mine(&tx, 4, 2, None);
        let mut bitmap_results = Bitmap16Miner::mine(&tx, 4, 2, None);
        eclat_results.sort();
        bitmap_results.sort();
        assert_eq!(eclat_results, bitmap_results);
    }

    #[test]
    fn scales_past_sixteen_items() {
        // 20 items, each transaction carries two adjacent items so every
        // pair `(2i, 2i+1)` is a closed itemset with its own singleton
        // tidset. `min_support = 1` here since each itemset is supported
        // by exactly one actor; this test is about scaling past 16 items,
        // not about the size/frequency threshold.
        let tx: Vec<Vec<usize>> = (0..10).map(|i| vec![2 * i, 2 * i + 1]).collect();
        let results = EclatMiner::mine(&tx, 20, 1, None);
        assert_eq!(results.len(), 10);
        for (itemset, tid) in &results {
            assert_eq!(itemset.len(), 2);
            assert_eq!(tid.len(), 1);
        }
    }
}

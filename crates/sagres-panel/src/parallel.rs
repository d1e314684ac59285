//! Per-group execution helpers.
//!
//! Linking, as-of matching and rolling volatility are independent across
//! securities or firms. These helpers run one closure per group, using rayon
//! when the `parallel` feature is enabled and a plain iterator otherwise. The
//! `cfg` switch lives here only, so call sites read the same either way.
//!
//! Group outputs always come back in ascending key order, so results are
//! identical with or without the feature.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use std::collections::BTreeMap;

/// Map a function over a slice, potentially in parallel.
///
/// Returns a Vec of results in the same order as the input.
#[inline]
pub fn map_slice<T, F, R>(slice: &[T], f: F) -> Vec<R>
where
    T: Sync,
    F: Fn(&T) -> R + Sync + Send,
    R: Send,
{
    #[cfg(feature = "parallel")]
    {
        slice.par_iter().map(f).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        slice.iter().map(f).collect()
    }
}

/// Partition row positions by key.
///
/// Keys come back in ascending order; positions within a group keep input order.
pub fn group_indices<'a, T, K, F>(items: &'a [T], key: F) -> BTreeMap<K, Vec<usize>>
where
    K: Ord,
    F: Fn(&'a T) -> K,
{
    let mut groups: BTreeMap<K, Vec<usize>> = BTreeMap::new();
    for (i, item) in items.iter().enumerate() {
        groups.entry(key(item)).or_default().push(i);
    }
    groups
}

/// Apply `f` to every group of `items`, potentially in parallel.
///
/// `f` receives the group key and the positions of the group's rows in
/// `items`. The result holds one `(key, output)` pair per group in ascending
/// key order.
///
/// # Example
///
/// ```
/// use sagres_panel::map_groups;
///
/// let rows = [(2, 1.0), (1, 2.0), (2, 3.0)];
/// let sums = map_groups(&rows, |r| r.0, |_, idx| idx.iter().map(|&i| rows[i].1).sum::<f64>());
/// assert_eq!(sums, vec![(1, 2.0), (2, 4.0)]);
/// ```
pub fn map_groups<'a, T, K, KF, F, R>(items: &'a [T], key: KF, f: F) -> Vec<(K, R)>
where
    T: Sync,
    K: Ord + Send + Sync,
    KF: Fn(&'a T) -> K,
    F: Fn(&K, &[usize]) -> R + Sync + Send,
    R: Send,
{
    let groups: Vec<(K, Vec<usize>)> = group_indices(items, key).into_iter().collect();
    let outputs = map_slice(&groups, |(k, positions)| f(k, positions));
    groups.into_iter().map(|(k, _)| k).zip(outputs).collect()
}

/// Apply `f` per group and write its per-row outputs back into input order.
///
/// `f` must return one value per position it receives, in the same order.
/// Positions `f` leaves unfilled get `V::default()`.
pub fn map_groups_aligned<'a, T, K, KF, F, V>(items: &'a [T], key: KF, f: F) -> Vec<V>
where
    T: Sync,
    K: Ord + Send + Sync,
    KF: Fn(&'a T) -> K,
    F: Fn(&K, &[usize]) -> Vec<V> + Sync + Send,
    V: Default + Send,
{
    let mut out: Vec<V> = std::iter::repeat_with(V::default).take(items.len()).collect();
    let groups: Vec<(K, Vec<usize>)> = group_indices(items, key).into_iter().collect();
    let outputs = map_slice(&groups, |(k, positions)| f(k, positions));
    for ((_, positions), values) in groups.iter().zip(outputs) {
        for (&i, value) in positions.iter().zip(values) {
            out[i] = value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_indices_preserves_order() {
        let items = ["b", "a", "b", "c", "a"];
        let groups = group_indices(&items, |s| *s);
        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(groups["a"], vec![1, 4]);
        assert_eq!(groups["b"], vec![0, 2]);
    }

    #[test]
    fn test_map_groups_key_order() {
        let items = [3, 1, 3, 2, 1, 3];
        let counts = map_groups(&items, |x| *x, |_, idx| idx.len());
        assert_eq!(counts, vec![(1, 2), (2, 1), (3, 3)]);
    }

    #[test]
    fn test_map_groups_aligned_scatters_back() {
        let items = [10, 20, 11, 21, 12];
        // rank of each value within its decade
        let ranks = map_groups_aligned(&items, |x| x / 10, |_, idx| (0..idx.len()).collect());
        assert_eq!(ranks, vec![0, 0, 1, 1, 2]);
    }

    #[test]
    fn test_map_slice_preserves_order() {
        let items: Vec<u32> = (0..1000).collect();
        let doubled = map_slice(&items, |x| x * 2);
        assert!(doubled.iter().enumerate().all(|(i, &v)| v == 2 * i as u32));
    }
}

//! Grouped backward as-of join.
//!
//! Both sides are sorted by time within each group, then merged by advancing
//! a single pointer through the right-hand side. A left key is matched to the
//! last right-hand row whose key does not exceed it.

use std::collections::BTreeMap;

/// Position of the last element of `sorted` whose key is `<= target`.
///
/// `sorted` must be in ascending key order. Returns `None` if every key is
/// greater than `target`.
///
/// # Example
///
/// ```
/// use sagres_panel::asof::backward_position;
///
/// let keys = [1, 3, 3, 7];
/// assert_eq!(backward_position(&keys, &3, |k| *k), Some(2));
/// assert_eq!(backward_position(&keys, &0, |k| *k), None);
/// ```
pub fn backward_position<T, K, F>(sorted: &[T], target: &K, key: F) -> Option<usize>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    sorted
        .partition_point(|item| key(item) <= *target)
        .checked_sub(1)
}

/// Backward as-of merge of ascending `left` keys against ascending `right` rows.
///
/// Returns, for each left key, the position in `right` of its match. Runs in
/// `O(left + right)`. Among right rows sharing a key the last one wins.
pub fn merge_backward<T, K, F>(left: &[K], right: &[T], key: F) -> Vec<Option<usize>>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut matches = Vec::with_capacity(left.len());
    let mut next = 0;
    for target in left {
        while next < right.len() && key(&right[next]) <= *target {
            next += 1;
        }
        matches.push(next.checked_sub(1));
    }
    matches
}

/// Split `items` into groups, each sorted by `key` ascending.
///
/// The sort is stable, so rows with equal keys keep their input order.
pub fn sorted_groups<T, G, K, GF, KF>(
    items: impl IntoIterator<Item = T>,
    group: GF,
    key: KF,
) -> BTreeMap<G, Vec<T>>
where
    G: Ord,
    K: Ord,
    GF: Fn(&T) -> G,
    KF: Fn(&T) -> K,
{
    let mut groups: BTreeMap<G, Vec<T>> = BTreeMap::new();
    for item in items {
        groups.entry(group(&item)).or_default().push(item);
    }
    for rows in groups.values_mut() {
        rows.sort_by_key(&key);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backward_position_edges() {
        let keys = [10, 20, 30];
        assert_eq!(backward_position(&keys, &5, |k| *k), None);
        assert_eq!(backward_position(&keys, &10, |k| *k), Some(0));
        assert_eq!(backward_position(&keys, &25, |k| *k), Some(1));
        assert_eq!(backward_position(&keys, &99, |k| *k), Some(2));
        assert_eq!(backward_position(&[] as &[i32], &1, |k| *k), None);
    }

    #[test]
    fn test_merge_backward_matches_binary_search() {
        let right = [2, 4, 4, 9, 15];
        let left = [0, 2, 3, 4, 8, 9, 20];
        let merged = merge_backward(&left, &right, |k| *k);
        let searched: Vec<_> = left
            .iter()
            .map(|t| backward_position(&right, t, |k| *k))
            .collect();
        assert_eq!(merged, searched);
        assert_eq!(merged, vec![None, Some(0), Some(0), Some(2), Some(2), Some(3), Some(4)]);
    }

    #[test]
    fn test_merge_backward_empty_right() {
        let right: [i32; 0] = [];
        assert_eq!(merge_backward(&[1, 2], &right, |k| *k), vec![None, None]);
    }

    #[test]
    fn test_sorted_groups_stable() {
        let rows = vec![("b", 3, 'x'), ("a", 2, 'y'), ("b", 1, 'z'), ("b", 3, 'w')];
        let groups = sorted_groups(rows, |r| r.0, |r| r.1);
        assert_eq!(groups["a"], vec![("a", 2, 'y')]);
        let tags: Vec<char> = groups["b"].iter().map(|r| r.2).collect();
        assert_eq!(tags, vec!['z', 'x', 'w']);
    }
}

use alloc::vec::Vec;
use core::cmp;

/// Prefix sums over per-item strides (`size + gap`).
///
/// `prefix_sum(i)` is the offset of item `i` relative to the first item, so item starts are
/// read in `O(log n)` and a re-measurement is an `O(log n)` point update instead of a rescan.
#[derive(Clone, Debug, Default)]
pub(crate) struct Fenwick {
    tree: Vec<u64>, // 1-indexed
    total: u64,
    max_bit: usize,
}

impl Fenwick {
    /// Builds the tree in `O(n)`.
    pub(crate) fn from_strides(strides: impl ExactSizeIterator<Item = u64>) -> Self {
        let n = strides.len();
        let mut tree = Vec::with_capacity(n + 1);
        tree.push(0u64);
        tree.extend(strides);
        let total = tree[1..].iter().fold(0u64, |acc, &v| acc.saturating_add(v));
        for i in 1..=n {
            let j = i + lsb(i);
            if j <= n {
                tree[j] = tree[j].saturating_add(tree[i]);
            }
        }
        Self {
            tree,
            total,
            max_bit: highest_power_of_two_leq(n),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.tree.len().saturating_sub(1)
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }

    /// Adds `delta` to the stride at `index`. Out-of-range indexes are ignored.
    pub(crate) fn add(&mut self, index: usize, delta: i64) {
        let n = self.len();
        if index >= n || delta == 0 {
            return;
        }
        self.total = apply_delta(self.total, delta);
        let mut i = index + 1;
        while i <= n {
            debug_assert!(
                delta >= 0 || self.tree[i] >= delta.unsigned_abs(),
                "Fenwick underflow (idx={i}, cur={}, delta={delta})",
                self.tree[i]
            );
            self.tree[i] = apply_delta(self.tree[i], delta);
            i += lsb(i);
        }
    }

    /// Sum of the first `count` strides.
    pub(crate) fn prefix_sum(&self, count: usize) -> u64 {
        let mut i = cmp::min(count, self.len());
        let mut sum = 0u64;
        while i > 0 {
            sum = sum.saturating_add(self.tree[i]);
            i &= i - 1;
        }
        sum
    }

    /// Returns the largest `c` such that `prefix_sum(c) <= target`.
    pub(crate) fn count_le(&self, mut target: u64) -> usize {
        let n = self.len();
        let mut idx = 0usize;
        let mut bit = self.max_bit;
        while bit != 0 {
            let next = idx + bit;
            if next <= n && self.tree[next] <= target {
                target -= self.tree[next];
                idx = next;
            }
            bit >>= 1;
        }
        idx
    }

    /// Returns the largest `c` such that `prefix_sum(c) < target`.
    pub(crate) fn count_lt(&self, target: u64) -> usize {
        match target.checked_sub(1) {
            Some(t) => self.count_le(t),
            None => 0,
        }
    }
}

fn apply_delta(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta as u64)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

fn lsb(i: usize) -> usize {
    i & i.wrapping_neg()
}

fn highest_power_of_two_leq(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let mut p = 1usize;
    while p <= n / 2 {
        p <<= 1;
    }
    p
}

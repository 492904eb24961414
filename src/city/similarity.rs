//! Ratcliff/Obershelp sequence similarity.
//!
//! `ratio = 2 * M / T` where `M` is the number of characters in the matching
//! blocks and `T` the combined length. Blocks are found by taking the longest
//! common block, then recursing on the pieces to its left and right.

use std::collections::{HashMap, HashSet};

/// Minimum score for a catalog name to be offered as a suggestion.
pub const SIMILARITY_CUTOFF: f64 = 0.6;

/// Sequences at least this long get their most frequent characters excluded
/// from seeding a block.
const POPULAR_MIN_LEN: usize = 200;

#[cfg(test)]
thread_local! {
    pub(crate) static LONGEST_MATCH_CALLS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Similarity of `a` (catalog name) against `b` (query), in `[0, 1]`.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// `ratio(a, b)` when it can reach `cutoff`, skipping the block search for
/// pairs whose cheap upper bounds already fall short.
pub fn close_ratio(a: &str, b: &str, cutoff: f64) -> Option<f64> {
    if length_bound(a, b) < cutoff || char_bound(a, b) < cutoff {
        return None;
    }
    Some(ratio(a, b)).filter(|&score| score >= cutoff)
}

/// Upper bound on `ratio` from the lengths alone.
pub(crate) fn length_bound(a: &str, b: &str) -> f64 {
    let (la, lb) = (a.chars().count(), b.chars().count());
    if la + lb == 0 {
        return 1.0;
    }
    2.0 * la.min(lb) as f64 / (la + lb) as f64
}

/// Upper bound on `ratio` from the characters both sides share, ignoring order.
pub(crate) fn char_bound(a: &str, b: &str) -> f64 {
    let mut available: HashMap<char, usize> = HashMap::new();
    for c in b.chars() {
        *available.entry(c).or_default() += 1;
    }

    let mut shared = 0;
    let mut la = 0;
    for c in a.chars() {
        la += 1;
        if let Some(n) = available.get_mut(&c).filter(|n| **n > 0) {
            *n -= 1;
            shared += 1;
        }
    }

    let total = la + b.chars().count();
    if total == 0 {
        return 1.0;
    }
    2.0 * shared as f64 / total as f64
}

/// Total size of all matching blocks between `a` and `b`.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let popular = popular_chars(b);
    let mut pending = vec![(0, a.len(), 0, b.len())];
    let mut matched = 0;

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, (alo, ahi), (blo, bhi), &popular);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }
    matched
}

fn popular_chars(b: &[char]) -> HashSet<char> {
    if b.len() < POPULAR_MIN_LEN {
        return HashSet::new();
    }
    let threshold = b.len() / 100 + 1;
    let mut counts: HashMap<char, usize> = HashMap::new();
    for &c in b {
        *counts.entry(c).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|&(_, n)| n > threshold)
        .map(|(c, _)| c)
        .collect()
}

/// Longest common block inside `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Ties go to the block starting earliest in `a`, then earliest in `b`.
/// Returns `(i, j, len)`; `len == 0` when nothing matches.
fn longest_match(
    a: &[char],
    b: &[char],
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
    popular: &HashSet<char>,
) -> (usize, usize, usize) {
    #[cfg(test)]
    LONGEST_MATCH_CALLS.with(|calls| calls.set(calls.get() + 1));

    let width = bhi - blo;
    let mut prev = vec![0usize; width + 1];
    let mut curr = vec![0usize; width + 1];
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);

    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo + 1;
            curr[col] = if a[i] == b[j] && !popular.contains(&b[j]) {
                prev[col - 1] + 1
            } else {
                0
            };
            if curr[col] > best_k {
                best_k = curr[col];
                best_i = i + 1 - best_k;
                best_j = j + 1 - best_k;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    // Popular characters may still extend a block at its edges.
    while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
        best_i -= 1;
        best_j -= 1;
        best_k += 1;
    }
    while best_i + best_k < ahi && best_j + best_k < bhi && a[best_i + best_k] == b[best_j + best_k]
    {
        best_k += 1;
    }

    (best_i, best_j, best_k)
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::hash::{HashFamily, Method, Symbol};
use crate::rolling_hash::RollingHash;

/// Counters for one search. Always `collisions <= checks <= collisions + 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Windows whose digest matched the pattern's but whose characters did not.
    pub collisions: u64,
    /// Full character-wise comparisons performed.
    pub checks: u64,
    /// Windows after the first whose digest was computed from scratch.
    pub rehashes: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    pub position: Option<usize>,
    pub stats: SearchStats,
}

/// Rabin-Karp search bound to one comparison method.
///
/// `search` takes `&self` and returns fresh stats, so a shared engine can be
/// used from several threads. `find` keeps the stats of the last call on the
/// engine instead.
#[derive(Debug)]
pub struct SearchEngine {
    method: Method,
    last: SearchStats,
    fallback_logged: AtomicBool,
}

impl SearchEngine {
    pub fn new(method: impl Into<Method>) -> Self {
        Self {
            method: method.into(),
            last: SearchStats::default(),
            fallback_logged: AtomicBool::new(false),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Position of the leftmost occurrence of `pattern` in `text`.
    pub fn find<S: Symbol>(&mut self, pattern: &[S], text: &[S]) -> Option<usize> {
        let outcome = self.search(pattern, text);
        self.last = outcome.stats;
        outcome.position
    }

    /// Stats of the most recent `find` call.
    pub fn stats(&self) -> SearchStats {
        self.last
    }

    pub fn search<S: Symbol>(&self, pattern: &[S], text: &[S]) -> SearchOutcome {
        let start = Instant::now();
        let mut stats = SearchStats::default();

        let position = if pattern.is_empty() || text.is_empty() || pattern.len() > text.len() {
            None
        } else {
            match self.method {
                Method::Direct => scan_direct(pattern, text, &mut stats),
                Method::Hashed(family) => {
                    self.log_fallback(family);
                    scan_hashed(family, pattern, text, &mut stats)
                }
            }
        };

        stats.elapsed = start.elapsed();
        trace!(
            method = %self.method,
            pattern_len = pattern.len(),
            text_len = text.len(),
            ?position,
            collisions = stats.collisions,
            checks = stats.checks,
            "search finished"
        );
        SearchOutcome { position, stats }
    }

    fn log_fallback(&self, family: HashFamily) {
        if family.is_rolling() {
            return;
        }
        if !self.fallback_logged.swap(true, Ordering::Relaxed) {
            debug!(
                hash = family.name(),
                "no rolling update for this hash family, rehashing every window"
            );
        }
    }
}

fn scan_hashed<S: Symbol>(
    family: HashFamily,
    pattern: &[S],
    text: &[S],
    stats: &mut SearchStats,
) -> Option<usize> {
    let m = pattern.len();
    let last = text.len() - m;

    let pattern_digest = family.digest(pattern);
    let mut window = RollingHash::new(family, &text[..m]);

    for i in 0..=last {
        if window.digest() == pattern_digest {
            stats.checks += 1;
            if is_match(&text[i..i + m], pattern) {
                return Some(i);
            }
            stats.collisions += 1;
        }

        if i < last && !window.rotate(text[i], text[i + m], &text[i + 1..i + 1 + m]) {
            stats.rehashes += 1;
        }
    }

    None
}

/// Baseline cost curve: one comparison per window examined, no hashing.
fn scan_direct<S: Symbol>(pattern: &[S], text: &[S], stats: &mut SearchStats) -> Option<usize> {
    let m = pattern.len();
    for i in 0..=text.len() - m {
        stats.checks += 1;
        if text[i..i + m] == *pattern {
            return Some(i);
        }
    }
    None
}

// Kept out of line so the scan loop stays tight; digest matches are rare.
#[cold]
#[inline(never)]
fn is_match<S: Symbol>(window: &[S], pattern: &[S]) -> bool {
    window == pattern
}

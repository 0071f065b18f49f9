use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::hash::Method;
use crate::search::SearchEngine;

/// Pattern lengths measured when none are given.
pub const DEFAULT_LENGTHS: &[usize] = &[
    1, 5, 10, 20, 50, 100, 150, 200, 300, 400, 500, 800, 1000, 1500, 2000, 2500, 3000, 3500,
    4000, 4500, 5000, 6000, 8000, 10000,
];

/// Patterns are cut from the text starting here, past any title matter.
pub const DEFAULT_OFFSET: usize = 1000;

/// Where the patterns of a sweep come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSource {
    /// `text[offset..offset + len]` for every length; patterns always occur.
    Slice { offset: usize, lengths: Vec<usize> },
    /// Caller-supplied patterns, usually absent from the text, for measuring
    /// collision rates over a full scan.
    Fixed(Vec<String>),
}

impl Default for PatternSource {
    fn default() -> Self {
        PatternSource::Slice {
            offset: DEFAULT_OFFSET,
            lengths: DEFAULT_LENGTHS.to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub patterns: PatternSource,
    pub methods: Vec<Method>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            patterns: PatternSource::default(),
            methods: Method::ALL.to_vec(),
        }
    }
}

/// One `(method, pattern)` data point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub hash_function: &'static str,
    pub pattern_length: usize,
    /// Only recorded for caller-supplied patterns.
    pub pattern: Option<String>,
    pub time_ms: f64,
    pub collisions: u64,
    pub checks: u64,
    /// `n - m + 1`, the windows a scan that finds nothing examines.
    pub total_windows: usize,
    pub found: bool,
    /// `-1` when the pattern was not found.
    pub position: i64,
}

struct Case {
    pattern: Vec<char>,
    label: Option<String>,
}

fn collect_cases(text: &[char], source: &PatternSource) -> Vec<Case> {
    let mut cases = Vec::new();
    match source {
        PatternSource::Slice { offset, lengths } => {
            for &len in lengths {
                let end = offset.checked_add(len);
                match end {
                    Some(end) if len > 0 && end <= text.len() => cases.push(Case {
                        pattern: text[*offset..end].to_vec(),
                        label: None,
                    }),
                    _ => warn!(
                        pattern_length = len,
                        offset,
                        text_len = text.len(),
                        "skipping pattern length: runs past the end of the text"
                    ),
                }
            }
        }
        PatternSource::Fixed(patterns) => {
            for pattern in patterns {
                let chars: Vec<char> = pattern.chars().collect();
                if chars.is_empty() || chars.len() > text.len() {
                    warn!(
                        pattern_length = chars.len(),
                        text_len = text.len(),
                        "skipping pattern: empty or longer than the text"
                    );
                    continue;
                }
                cases.push(Case {
                    pattern: chars,
                    label: Some(pattern.clone()),
                });
            }
        }
    }
    cases
}

/// Search for every configured pattern with every configured method. Each
/// pair gets its own engine; pairs run in parallel and come back
/// pattern-major in configuration order.
pub fn sweep(text: &[char], config: &SweepConfig) -> Vec<Measurement> {
    let cases = collect_cases(text, &config.patterns);
    let jobs: Vec<(&Case, Method)> = cases
        .iter()
        .flat_map(|case| config.methods.iter().map(move |&method| (case, method)))
        .collect();

    info!(jobs = jobs.len(), text_len = text.len(), "running sweep");

    jobs.par_iter()
        .map(|&(case, method)| {
            let outcome = SearchEngine::new(method).search(&case.pattern, text);
            Measurement {
                hash_function: method.name(),
                pattern_length: case.pattern.len(),
                pattern: case.label.clone(),
                time_ms: outcome.stats.elapsed.as_secs_f64() * 1000.0,
                collisions: outcome.stats.collisions,
                checks: outcome.stats.checks,
                total_windows: text.len() - case.pattern.len() + 1,
                found: outcome.position.is_some(),
                position: outcome.position.map_or(-1, |p| p as i64),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashFamily;

    fn sample_text() -> Vec<char> {
        "abracadabra, simsalabim. "
            .repeat(20)
            .chars()
            .collect()
    }

    fn sliced(offset: usize, lengths: Vec<usize>, methods: Vec<Method>) -> SweepConfig {
        SweepConfig {
            patterns: PatternSource::Slice { offset, lengths },
            methods,
        }
    }

    #[test]
    fn test_sweep_order_and_positions() {
        let text = sample_text();
        let config = sliced(30, vec![3, 8], Method::ALL.to_vec());

        let rows = sweep(&text, &config);
        assert_eq!(rows.len(), 2 * Method::ALL.len());

        for (row, (len, method)) in rows.iter().zip(
            [3usize, 8]
                .iter()
                .flat_map(|&l| Method::ALL.iter().map(move |&m| (l, m))),
        ) {
            assert_eq!(row.pattern_length, len);
            assert_eq!(row.hash_function, method.name());
            assert_eq!(row.pattern, None);
            assert_eq!(row.total_windows, text.len() - len + 1);
            assert!(row.found);
            assert!(row.position <= 30);
            assert!(row.collisions <= row.checks);
        }

        // The repeated phrase is 25 characters long, so the pattern reappears at offset 5.
        assert!(rows.iter().all(|r| r.position == 5));
    }

    #[test]
    fn test_sweep_skips_lengths_past_end() {
        let text = sample_text();
        let config = sliced(100, vec![0, 10, 10_000], vec![HashFamily::PolynomialModular.into()]);
        let rows = sweep(&text, &config);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pattern_length, 10);
    }

    #[test]
    fn test_sweep_offset_at_usize_max_is_skipped() {
        let text: Vec<char> = "abc".chars().collect();
        let config = sliced(usize::MAX, vec![2], Method::ALL.to_vec());
        assert!(sweep(&text, &config).is_empty());
    }

    #[test]
    fn test_fixed_patterns_measure_full_scans() {
        let text = sample_text();
        let config = SweepConfig {
            patterns: PatternSource::Fixed(vec![
                "ATCG".to_string(),
                String::new(),
                "ATCGATCG".to_string(),
                "simsala".to_string(),
            ]),
            methods: Method::ALL.to_vec(),
        };

        let rows = sweep(&text, &config);
        assert_eq!(rows.len(), 3 * Method::ALL.len());

        for row in &rows[..2 * Method::ALL.len()] {
            assert!(!row.found);
            assert_eq!(row.position, -1);
            assert_eq!(row.total_windows, text.len() - row.pattern_length + 1);
            if row.hash_function == Method::Direct.name() {
                assert_eq!(row.checks as usize, row.total_windows);
            } else {
                assert_eq!(row.checks, row.collisions);
            }
        }
        assert_eq!(rows[0].pattern.as_deref(), Some("ATCG"));
        assert_eq!(rows[Method::ALL.len()].pattern.as_deref(), Some("ATCGATCG"));

        let last = rows.last().unwrap();
        assert_eq!(last.pattern.as_deref(), Some("simsala"));
        assert_eq!(last.position, 13);
    }

    #[test]
    fn test_default_config_covers_every_method() {
        let config = SweepConfig::default();
        assert_eq!(config.methods.len(), 6);
        match config.patterns {
            PatternSource::Slice { offset, lengths } => {
                assert_eq!(offset, DEFAULT_OFFSET);
                assert!(lengths.windows(2).all(|w| w[0] < w[1]));
            }
            other => panic!("unexpected default source: {:?}", other),
        }
    }
}

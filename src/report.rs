use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use crate::sweep::Measurement;

/// Per-method aggregate over every measured pattern length.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSummary {
    pub hash_function: &'static str,
    pub avg_time_ms: f64,
    pub total_collisions: u64,
    pub total_checks: u64,
    pub total_windows: usize,
}

impl MethodSummary {
    /// Collisions per window scanned, in percent.
    pub fn collision_rate(&self) -> f64 {
        if self.total_windows == 0 {
            0.0
        } else {
            self.total_collisions as f64 * 100.0 / self.total_windows as f64
        }
    }
}

/// Group rows by method, keeping the order in which methods first appear.
pub fn summarize(rows: &[Measurement]) -> Vec<MethodSummary> {
    let mut groups: Vec<(&'static str, Vec<&Measurement>)> = Vec::new();
    for row in rows {
        match groups.iter_mut().find(|(name, _)| *name == row.hash_function) {
            Some((_, members)) => members.push(row),
            None => groups.push((row.hash_function, vec![row])),
        }
    }

    groups
        .into_iter()
        .map(|(hash_function, members)| MethodSummary {
            hash_function,
            avg_time_ms: members.iter().map(|r| r.time_ms).sum::<f64>() / members.len() as f64,
            total_collisions: members.iter().map(|r| r.collisions).sum(),
            total_checks: members.iter().map(|r| r.checks).sum(),
            total_windows: members.iter().map(|r| r.total_windows).sum(),
        })
        .collect()
}

/// Method with the lowest average time.
pub fn fastest(summaries: &[MethodSummary]) -> Option<&MethodSummary> {
    summaries
        .iter()
        .min_by(|a, b| a.avg_time_ms.total_cmp(&b.avg_time_ms))
}

pub fn write_csv(path: &Path, rows: &[Measurement]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write CSV row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush CSV file: {}", path.display()))?;
    Ok(())
}

/// Human-readable summary: one table per method, its averages, and the overall fastest.
pub fn render_summary(corpus: &str, fingerprint: &str, text_len: usize, rows: &[Measurement]) -> String {
    let rule = "-".repeat(60);
    let mut out = String::new();

    let _ = writeln!(out, "Corpus: {}", corpus);
    let _ = writeln!(out, "BLAKE3: {}", fingerprint);
    let _ = writeln!(out, "Length: {} characters", text_len);
    let _ = writeln!(out, "{}", "=".repeat(60));

    let summaries = summarize(rows);
    for summary in &summaries {
        let _ = writeln!(out, "\n{}", summary.hash_function);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(
            out,
            "{:>8} | {:>12} | {:>10} | {:>10} | {:>8}",
            "length", "time (ms)", "collisions", "checks", "position"
        );
        let _ = writeln!(out, "{}", rule);
        for row in rows.iter().filter(|r| r.hash_function == summary.hash_function) {
            let _ = writeln!(
                out,
                "{:>8} | {:>12.4} | {:>10} | {:>10} | {:>8}",
                row.pattern_length, row.time_ms, row.collisions, row.checks, row.position
            );
        }
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(
            out,
            "avg time: {:.4} ms | total collisions: {} | total checks: {}",
            summary.avg_time_ms, summary.total_collisions, summary.total_checks
        );
        let _ = writeln!(
            out,
            "collision rate: {:.1}% ({} collisions over {} windows)",
            summary.collision_rate(),
            summary.total_collisions,
            summary.total_windows
        );
    }

    if let Some(best) = fastest(&summaries) {
        let _ = writeln!(out, "\n{}", "=".repeat(60));
        let _ = writeln!(
            out,
            "fastest: {} ({:.4} ms average)",
            best.hash_function, best.avg_time_ms
        );
    }

    out
}

pub fn write_summary(path: &Path, summary: &str) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create summary file: {}", path.display()))?;
    file.write_all(summary.as_bytes())
        .with_context(|| format!("Failed to write summary file: {}", path.display()))?;
    file.flush()
        .with_context(|| format!("Failed to flush summary file: {}", path.display()))?;
    Ok(())
}

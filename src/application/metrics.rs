//! Compression and overlap metrics merged into a completed run.

use std::collections::HashSet;

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// `final / eligible × 100`, 0 when nothing was eligible.
pub fn compression_efficiency(final_count: usize, eligible_count: usize) -> f64 {
    if eligible_count == 0 {
        return 0.0;
    }
    round2((final_count as f64 / eligible_count as f64 * 100.0).clamp(0.0, 100.0))
}

/// `eligible / final`, 0 when nothing was selected.
pub fn compression_ratio(eligible_count: usize, final_count: usize) -> f64 {
    if final_count == 0 {
        return 0.0;
    }
    round2(eligible_count as f64 / final_count as f64)
}

pub fn success_rate(succeeded: u32, attempted: u32) -> f64 {
    if attempted == 0 {
        return 0.0;
    }
    round2(succeeded as f64 / attempted as f64 * 100.0)
}

/// Share of this run's final symbols that were also final in `previous`.
pub fn overlap_pct(current: &[String], previous: &[String]) -> f64 {
    let current: HashSet<&str> = current.iter().map(String::as_str).collect();
    if current.is_empty() {
        return 0.0;
    }
    let previous: HashSet<&str> = previous.iter().map(String::as_str).collect();
    let shared = current.intersection(&previous).count();
    round2(shared as f64 / current.len() as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn efficiency_is_zero_without_eligible_candidates() {
        assert_eq!(compression_efficiency(0, 0), 0.0);
        assert_eq!(compression_efficiency(5, 40), 12.5);
        assert_eq!(compression_ratio(40, 5), 8.0);
        assert_eq!(compression_ratio(40, 0), 0.0);
    }

    #[test]
    fn success_rate_rounds_to_two_places() {
        assert_eq!(success_rate(10, 15), 66.67);
        assert_eq!(success_rate(0, 0), 0.0);
    }

    #[test]
    fn overlap_counts_shared_symbols() {
        let now = vec!["AAA".to_string(), "BBB".into(), "CCC".into(), "DDD".into()];
        let before = vec!["BBB".to_string(), "DDD".into(), "ZZZ".into()];
        assert_eq!(overlap_pct(&now, &before), 50.0);
        assert_eq!(overlap_pct(&[], &before), 0.0);
    }
}

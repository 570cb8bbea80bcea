//! Weighted score fusion across retrieval branches.

use std::collections::HashMap;

/// One branch's output: its configured weight and scored ids.
/// A branch that did not run (timeout, missing embedder) is simply not
/// passed to [`fuse`]; the remaining weights renormalize.
#[derive(Debug, Clone)]
pub struct BranchOutput {
    pub name: &'static str,
    pub weight: f64,
    pub results: Vec<(String, f64)>,
}

impl BranchOutput {
    pub fn new(name: &'static str, weight: f64, results: Vec<(String, f64)>) -> Self {
        Self { name, weight, results }
    }
}

/// Fuse branch outputs into combined `[0, 1]` scores per id.
///
/// Each branch is min-max normalized so BM25 magnitudes, cosine
/// similarities, and token hit counts are comparable; the weighted sum
/// uses weights renormalized over the branches present.
pub fn fuse(branches: &[BranchOutput]) -> Vec<(String, f64)> {
    let total_weight: f64 = branches.iter().map(|b| b.weight).sum();
    if total_weight <= 0.0 {
        return Vec::new();
    }

    let mut combined: HashMap<String, f64> = HashMap::new();
    for branch in branches {
        let normalized = min_max_normalize(&branch.results);
        let share = branch.weight / total_weight;
        for (id, score) in normalized {
            *combined.entry(id).or_default() += share * score;
        }
    }

    let mut results: Vec<(String, f64)> = combined.into_iter().collect();
    results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    results
}

/// Normalize a branch's scores to `[0, 1]`. A degenerate branch (one
/// result, or all scores equal) maps to 1.0.
fn min_max_normalize(results: &[(String, f64)]) -> Vec<(String, f64)> {
    if results.is_empty() {
        return Vec::new();
    }
    let min = results.iter().map(|(_, s)| *s).fold(f64::INFINITY, f64::min);
    let max = results.iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    results
        .iter()
        .map(|(id, s)| {
            let norm = if range <= f64::EPSILON { 1.0 } else { (s - min) / range };
            (id.clone(), norm)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(results: &[(String, f64)]) -> Vec<&str> {
        results.iter().map(|(id, _)| id.as_str()).collect()
    }

    #[test]
    fn fuses_overlapping_branches() {
        let lexical = BranchOutput::new(
            "lexical",
            0.5,
            vec![("a".into(), 4.0), ("b".into(), 2.0)],
        );
        let vector = BranchOutput::new(
            "vector",
            0.4,
            vec![("b".into(), 0.9), ("c".into(), 0.5)],
        );
        let fused = fuse(&[lexical, vector]);

        // b appears in both branches and should lead.
        assert_eq!(ids(&fused)[0], "b");
        for (_, score) in &fused {
            assert!((0.0..=1.0).contains(score));
        }
    }

    #[test]
    fn renormalizes_when_branch_absent() {
        // Only the lexical branch ran; its top hit should score 1.0, not 0.5.
        let lexical = BranchOutput::new(
            "lexical",
            0.5,
            vec![("a".into(), 3.0), ("b".into(), 1.0)],
        );
        let fused = fuse(&[lexical]);
        assert_eq!(fused[0], ("a".to_string(), 1.0));
    }

    #[test]
    fn degenerate_branch_maps_to_one() {
        let token = BranchOutput::new("token", 1.0, vec![("a".into(), 0.5)]);
        let fused = fuse(&[token]);
        assert_eq!(fused[0].1, 1.0);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(fuse(&[]).is_empty());
    }
}

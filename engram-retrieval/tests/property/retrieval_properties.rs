use engram_retrieval::{fuse, BranchOutput};
use proptest::prelude::*;

// Branch outputs never repeat an id (the SQL layer deduplicates), so the
// generator enforces that too.
fn arb_results() -> impl Strategy<Value = Vec<(String, f64)>> {
    proptest::collection::vec(("[a-e]", 0.0f64..100.0), 0..10).prop_map(|v| {
        let mut seen = std::collections::HashSet::new();
        v.into_iter()
            .filter(|(id, _)| seen.insert(id.clone()))
            .collect()
    })
}

proptest! {
    // Fused scores always land in [0, 1]: each branch is normalized and
    // the weights renormalize to sum 1.
    #[test]
    fn fused_scores_bounded(
        lexical in arb_results(),
        vector in arb_results(),
        tokens in arb_results(),
    ) {
        let fused = fuse(&[
            BranchOutput::new("lexical", 0.5, lexical),
            BranchOutput::new("vector", 0.4, vector),
            BranchOutput::new("token", 0.1, tokens),
        ]);
        for (_, score) in fused {
            prop_assert!((0.0..=1.0 + 1e-9).contains(&score), "score {score} out of bounds");
        }
    }
}

proptest! {
    // Output is sorted descending by score.
    #[test]
    fn fused_output_sorted(
        lexical in arb_results(),
        vector in arb_results(),
    ) {
        let fused = fuse(&[
            BranchOutput::new("lexical", 0.5, lexical),
            BranchOutput::new("vector", 0.4, vector),
        ]);
        for pair in fused.windows(2) {
            prop_assert!(pair[0].1 >= pair[1].1);
        }
    }
}

proptest! {
    // A missing branch renormalizes: scaling the single present branch's
    // weight must not change the fused ranking or values.
    #[test]
    fn single_branch_weight_is_irrelevant(
        results in arb_results(),
        weight in 0.05f64..10.0,
    ) {
        let a = fuse(&[BranchOutput::new("lexical", 0.5, results.clone())]);
        let b = fuse(&[BranchOutput::new("lexical", weight, results)]);
        prop_assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            prop_assert!((x.1 - y.1).abs() < 1e-9);
        }
    }
}

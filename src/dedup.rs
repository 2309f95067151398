//! Duplicate suppression (spec.md §4.2, C2): two hypotheses that agree on
//! both token sequence and last decoded frame are the same hypothesis under
//! a different expansion order and only the higher-scoring one survives.

use crate::hypothesis::Hypothesis;

/// Collapses `hyps` in place, keeping the highest-scoring hypothesis for
/// each `(tokens, last_frame)` key. Grounded on NeMo's
/// `remove_duplicate_hypotheses`: sort descending by score first so the
/// first hypothesis seen for a key is always the one kept.
pub fn remove_duplicates<S: Clone, L: Clone>(
    mut hyps: Vec<Hypothesis<S, L>>,
) -> Vec<Hypothesis<S, L>> {
    hyps.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(hyps.len());
    for hyp in hyps {
        let key = (hyp.tokens.clone(), hyp.last_frame);
        if seen.insert(key) {
            out.push(hyp);
        }
    }
    out
}

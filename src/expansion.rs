//! Expansion selector (spec.md §4.3, C3): turns a hypothesis's independent
//! token and duration top-k lists into a pruned, scored candidate list.

/// One `(token, duration)` candidate produced for a hypothesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expansion {
    pub token_idx: usize,
    pub duration_idx: usize,
    /// `h.score + token_logp + duration_logp`.
    pub score: f32,
}

/// Forms the Cartesian product of `token_topk` and `dur_topk`, adds
/// `hyp_score`, finds the max `M`, and keeps every candidate with
/// `score >= M - gamma`, sorted ascending by score.
///
/// At least the argmax candidate always survives, since it trivially
/// satisfies `score >= M - gamma` for any `gamma > 0`.
pub fn select_k_expansions(
    hyp_score: f32,
    token_topk: &[(usize, f32)],
    dur_topk: &[(usize, f32)],
    gamma: f32,
) -> Vec<Expansion> {
    let mut candidates: Vec<Expansion> = Vec::with_capacity(token_topk.len() * dur_topk.len());
    for &(token_idx, token_logp) in token_topk {
        for &(duration_idx, dur_logp) in dur_topk {
            candidates.push(Expansion {
                token_idx,
                duration_idx,
                score: hyp_score + token_logp + dur_logp,
            });
        }
    }

    let max_score = candidates
        .iter()
        .map(|c| c.score)
        .fold(f32::NEG_INFINITY, f32::max);
    let threshold = max_score - gamma;

    candidates.retain(|c| c.score >= threshold);
    candidates.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap());
    candidates
}

//! Post-sort (spec.md §4.8, C8): orders the final hypothesis set by raw or
//! length-normalized score. Callers decide how many of the result to keep.

use crate::hypothesis::Hypothesis;

pub fn sort_nbest<S: Clone, L: Clone>(mut hyps: Vec<Hypothesis<S, L>>, score_norm: bool) -> Vec<Hypothesis<S, L>> {
    if score_norm {
        hyps.sort_by(|a, b| {
            let a_norm = a.score / a.len() as f32;
            let b_norm = b.score / b.len() as f32;
            b_norm.partial_cmp(&a_norm).unwrap()
        });
    } else {
        hyps.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    }
    hyps
}

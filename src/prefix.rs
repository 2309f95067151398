//! Prefix-score corrector (spec.md §4.4, C4): folds a shorter hypothesis's
//! probability mass into a longer hypothesis that shares it as a strict
//! prefix, along the zero-duration chain. mAES-only — it is only invoked
//! when a zero-duration index exists.

use ndarray::Array1;

use crate::error::Result;
use crate::hypothesis::Hypothesis;
use crate::math::log_add_exp;

/// Corrects every pair `(longer, shorter)` in `hyps` where `shorter.tokens`
/// is a strict prefix of `longer.tokens` and the length gap is `<= alpha`.
/// `hyps` is expected pre-sorted by `len(tokens)` descending, as required
/// by the search driver; this function does not itself depend on that
/// order beyond iterating all pairs.
///
/// `score_step` scores one step of the zero-duration chain: given a
/// predictor output, it returns `(token_logp, duration_logp)` already
/// temperature-scaled and log-softmaxed — supplied by the caller so this
/// module stays decoupled from the `Joint` trait. `lm` is
/// `(alpha_lm, score_fn)` with `score_fn(state, token_id) -> (natural_log_score, next_state)`.
pub fn correct_prefixes<S: Clone, L: Clone>(
    hyps: &mut [Hypothesis<S, L>],
    zero_idx: usize,
    alpha: u32,
    mut score_step: impl FnMut(&Array1<f32>) -> Result<(Array1<f32>, Array1<f32>)>,
    lm: Option<(f32, impl Fn(&L, u32) -> (f32, L))>,
) -> Result<()> {
    let n = hyps.len();
    for longer_idx in 0..n {
        for shorter_idx in 0..n {
            if longer_idx == shorter_idx {
                continue;
            }

            let shorter_len = hyps[shorter_idx].len();
            let longer_len = hyps[longer_idx].len();
            if longer_len <= shorter_len || longer_len - shorter_len > alpha as usize {
                continue;
            }
            if !hyps[longer_idx].has_strict_prefix(&hyps[shorter_idx].tokens) {
                continue;
            }

            let shorter_score = hyps[shorter_idx].score;
            let shorter_last_output = hyps[shorter_idx]
                .predictor_outputs
                .last()
                .expect("prefix correction requires cached predictor outputs")
                .clone();
            let mut lm_state = hyps[shorter_idx].lm_state.clone();
            let longer_tokens = hyps[longer_idx].tokens.clone();

            let mut delta = 0.0f32;

            let (token_logp, duration_logp) = score_step(&shorter_last_output)?;
            let first_token = longer_tokens[shorter_len] as usize;
            delta += token_logp[first_token] + duration_logp[zero_idx];
            if let Some((alpha_lm, lm_score_fn)) = lm.as_ref() {
                if let Some(state) = lm_state.as_ref() {
                    let (s, next) = lm_score_fn(state, longer_tokens[shorter_len]);
                    delta += alpha_lm * s;
                    lm_state = Some(next);
                }
            }

            // Indexes both `longer_tokens[k]` and `predictor_outputs[k - 1]` per step.
            #[allow(clippy::needless_range_loop)]
            for k in (shorter_len + 1)..longer_len {
                let pred_out = &hyps[longer_idx].predictor_outputs[k - 1];
                let (token_logp, duration_logp) = score_step(pred_out)?;
                let token = longer_tokens[k] as usize;
                delta += token_logp[token] + duration_logp[zero_idx];
                if let Some((alpha_lm, lm_score_fn)) = lm.as_ref() {
                    if let Some(state) = lm_state.as_ref() {
                        let (s, next) = lm_score_fn(state, longer_tokens[k]);
                        delta += alpha_lm * s;
                        lm_state = Some(next);
                    }
                }
            }

            hyps[longer_idx].score = log_add_exp(hyps[longer_idx].score, shorter_score + delta);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    fn hyp(score: f32, tokens: Vec<u32>) -> Hypothesis<()> {
        Hypothesis {
            score,
            timesteps: vec![-1; tokens.len()],
            tokens,
            predictor_state: (),
            last_frame: 2,
            predictor_outputs: vec![arr1(&[0.0f32]); 2],
            lm_state: None,
        }
    }

    /// S4: A=[0,1,2] score -1.0, B=[0,1] score -2.0, alpha=1, stubbed
    /// delta=-0.5 -> A.score becomes log_add_exp(-1.0, -2.5).
    #[test]
    fn folds_shorter_prefix_into_longer() {
        let mut hyps = vec![hyp(-1.0, vec![0, 1, 2]), hyp(-2.0, vec![0, 1])];
        correct_prefixes(
            &mut hyps,
            0,
            1,
            |_pred_out| Ok((arr1(&[0.0f32, 0.0, -0.3]), arr1(&[-0.2f32]))),
            None::<(f32, fn(&(), u32) -> (f32, ()))>,
        )
        .unwrap();

        let expected = log_add_exp(-1.0, -2.5);
        assert!((hyps[0].score - expected).abs() < 1e-4);
        assert_eq!(hyps[1].score, -2.0, "shorter hypothesis is untouched");
    }

    #[test]
    fn length_gap_beyond_alpha_is_skipped() {
        let mut hyps = vec![hyp(-1.0, vec![0, 1, 2, 3]), hyp(-2.0, vec![0])];
        correct_prefixes(
            &mut hyps,
            0,
            1,
            |_pred_out| Ok((arr1(&[0.0f32, 0.0, 0.0, -0.3]), arr1(&[-0.2f32]))),
            None::<(f32, fn(&(), u32) -> (f32, ()))>,
        )
        .unwrap();
        assert_eq!(hyps[0].score, -1.0);
    }

    #[test]
    fn non_prefix_pair_is_skipped() {
        let mut hyps = vec![hyp(-1.0, vec![0, 1, 2]), hyp(-2.0, vec![0, 9])];
        correct_prefixes(
            &mut hyps,
            0,
            1,
            |_pred_out| Ok((arr1(&[0.0f32, 0.0, -0.3]), arr1(&[-0.2f32]))),
            None::<(f32, fn(&(), u32) -> (f32, ()))>,
        )
        .unwrap();
        assert_eq!(hyps[0].score, -1.0);
    }
}

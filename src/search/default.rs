//! Default beam search (spec.md §4.6, C6): frame-indexed expansion with
//! joint (token, duration) top-k selection and duplicate suppression.

use std::collections::HashMap;

use ndarray::Array2;
use tracing::{debug, warn};

use crate::config::DecoderConfig;
use crate::dedup::remove_duplicates;
use crate::durations::DurationTable;
use crate::error::Result;
use crate::hypothesis::Hypothesis;
use crate::math::{split_log_softmax, top_k};
use crate::model::{Joint, Predictor};
use crate::sort::sort_nbest;

/// Runs the default beam search over `encoder_output[..valid_length]` and
/// returns the N-best list, already sorted by [`crate::sort::sort_nbest`].
#[allow(clippy::too_many_arguments)]
pub fn search<P: Predictor, J: Joint, L: Clone>(
    encoder_output: &Array2<f32>,
    valid_length: usize,
    blank_id: u32,
    vocab_size: usize,
    durations: &DurationTable,
    config: &DecoderConfig,
    predictor: &P,
    joint: &J,
) -> Result<Vec<Hypothesis<P::State, L>>> {
    let beam = config.beam_size.min(vocab_size);
    let beam_k = beam.min(vocab_size - 1);
    let duration_beam_k = beam.min(durations.len());

    let mut cache = HashMap::new();
    let sentinel = Hypothesis::sentinel(blank_id, predictor.initialize_state());
    let mut kept: Vec<Hypothesis<P::State, L>> = vec![sentinel];

    for t in 0..valid_length {
        let mut hyps_now: Vec<Hypothesis<P::State, L>> =
            kept.iter().filter(|h| h.last_frame == t).cloned().collect();
        let mut hyps_future: Vec<Hypothesis<P::State, L>> =
            kept.into_iter().filter(|h| h.last_frame > t).collect();

        let encoder_frame = encoder_output.row(t).to_owned();

        let mut same_frame_expansions = 0usize;
        while !hyps_now.is_empty() {
            if same_frame_expansions >= config.max_same_frame_expansions {
                warn!(
                    frame = t,
                    limit = config.max_same_frame_expansions,
                    "default search hit max_same_frame_expansions; forcing frame advance"
                );
                hyps_future.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
                hyps_future.truncate(beam);
                break;
            }
            same_frame_expansions += 1;

            let max_idx = hyps_now
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.score.partial_cmp(&b.1.score).unwrap())
                .map(|(i, _)| i)
                .expect("hyps_now checked non-empty above");
            let h_star = hyps_now.remove(max_idx);

            let (pred_out, new_state) = predictor.score_hypothesis(&h_star, &mut cache)?;
            let joint_out = joint.joint(&encoder_frame, &pred_out)?;
            let (vocab_logp, duration_logp) =
                split_log_softmax(&joint_out, vocab_size, config.softmax_temperature);

            let mut vocab_no_blank = vocab_logp.clone();
            vocab_no_blank[blank_id as usize] = f32::NEG_INFINITY;
            let (token_idx, token_logp) = top_k(&vocab_no_blank, beam_k);
            let (dur_idx, dur_logp) = top_k(&duration_logp, duration_beam_k);

            let mut pairs: Vec<(usize, f32, usize, f32)> = Vec::with_capacity(token_idx.len() * dur_idx.len());
            for (&tok, &tlogp) in token_idx.iter().zip(token_logp.iter()) {
                for (&dur, &dlogp) in dur_idx.iter().zip(dur_logp.iter()) {
                    pairs.push((tok, tlogp, dur, dlogp));
                }
            }
            pairs.sort_by(|a, b| (b.1 + b.3).partial_cmp(&(a.1 + a.3)).unwrap());
            pairs.truncate(beam_k);

            for (tok, tlogp, dur, dlogp) in pairs {
                let duration_val = durations.value(dur);
                let mut tokens = h_star.tokens.clone();
                tokens.push(tok as u32);
                let mut timesteps = h_star.timesteps.clone();
                timesteps.push(t as i64 + duration_val as i64);

                let child = Hypothesis {
                    score: h_star.score + tlogp + dlogp,
                    tokens,
                    timesteps,
                    predictor_state: new_state.clone(),
                    last_frame: h_star.last_frame + duration_val as usize,
                    predictor_outputs: Vec::new(),
                    lm_state: None,
                };

                if duration_val == 0 {
                    hyps_now.push(child);
                } else {
                    hyps_future.push(child);
                }
            }

            for &dur in &dur_idx {
                let dur = if Some(dur) == durations.zero_idx() {
                    if dur_idx.len() == 1 {
                        durations.min_nonzero_idx()
                    } else {
                        continue;
                    }
                } else {
                    dur
                };
                let duration_val = durations.value(dur);

                let child = Hypothesis {
                    score: h_star.score + vocab_logp[blank_id as usize] + duration_logp[dur],
                    tokens: h_star.tokens.clone(),
                    timesteps: h_star.timesteps.clone(),
                    predictor_state: h_star.predictor_state.clone(),
                    last_frame: h_star.last_frame + duration_val as usize,
                    predictor_outputs: Vec::new(),
                    lm_state: None,
                };
                hyps_future.push(child);
            }

            hyps_future = remove_duplicates(hyps_future);

            if !hyps_now.is_empty() {
                let s_star = hyps_now
                    .iter()
                    .map(|h| h.score)
                    .fold(f32::NEG_INFINITY, f32::max);
                let mut kept_most_prob: Vec<Hypothesis<P::State, L>> = hyps_future
                    .iter()
                    .filter(|h| h.score > s_star)
                    .cloned()
                    .collect();
                if kept_most_prob.len() >= beam {
                    kept_most_prob.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
                    kept_most_prob.truncate(beam);
                    hyps_future = kept_most_prob;
                    break;
                }
            } else {
                hyps_future.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
                hyps_future.truncate(beam);
            }
        }

        kept = hyps_future;
        debug!(frame = t, frontier_size = kept.len(), "frame complete");
    }

    Ok(sort_nbest(kept, config.score_norm))
}

//! Modified Adaptive Expansion Search (spec.md §4.7, C7): per-frame,
//! bounded adaptive expansion rounds with prefix-score correction and
//! optional N-gram LM shallow fusion.

use std::collections::{HashMap, HashSet};

use ndarray::Array2;
use tracing::debug;

use crate::config::DecoderConfig;
use crate::dedup::remove_duplicates;
use crate::durations::DurationTable;
use crate::error::Result;
use crate::expansion::select_k_expansions;
use crate::hypothesis::Hypothesis;
use crate::lm::LmAdapter;
use crate::math::{split_log_softmax, top_k};
use crate::model::{Joint, NgramLm, Predictor};
use crate::prefix::correct_prefixes;
use crate::sort::sort_nbest;

/// Runs mAES over `encoder_output[..valid_length]` and returns the N-best
/// list. `lm` is `(adapter, alpha_lm)`; `None` disables shallow fusion.
#[allow(clippy::too_many_arguments)]
pub fn search<P: Predictor, J: Joint, M: NgramLm>(
    encoder_output: &Array2<f32>,
    valid_length: usize,
    blank_id: u32,
    vocab_size: usize,
    durations: &DurationTable,
    config: &DecoderConfig,
    predictor: &P,
    joint: &J,
    lm: Option<(&LmAdapter<M>, f32)>,
) -> Result<Vec<Hypothesis<P::State, M::State>>> {
    let beam = config.beam_size.min(vocab_size);
    let max_candidates = config.max_candidates().min(vocab_size);
    let duration_beam_k = config.maes_duration_beam_size.min(durations.len());

    let mut cache = HashMap::new();

    let init_state = predictor.initialize_state();
    let mut sentinel: Hypothesis<P::State, M::State> = Hypothesis::sentinel(blank_id, init_state);
    let (pred_out_0, state_0) = predictor.score_hypothesis(&sentinel, &mut cache)?;
    sentinel.predictor_state = state_0;
    sentinel.predictor_outputs.push(pred_out_0);
    sentinel.lm_state = lm.map(|(adapter, _)| adapter.begin_sentence());

    let mut kept: Vec<Hypothesis<P::State, M::State>> = vec![sentinel];

    for t in 0..valid_length {
        let mut hyps: Vec<Hypothesis<P::State, M::State>> =
            kept.iter().filter(|h| h.last_frame == t).cloned().collect();
        kept.retain(|h| h.last_frame > t);

        if hyps.is_empty() {
            continue;
        }

        let encoder_frame = encoder_output.row(t).to_owned();

        if let Some(zero_idx) = durations.zero_idx() {
            hyps.sort_by_key(|b| std::cmp::Reverse(b.len()));
            let score_step = |pred_out: &ndarray::Array1<f32>| -> Result<(ndarray::Array1<f32>, ndarray::Array1<f32>)> {
                let joint_out = joint.joint(&encoder_frame, pred_out)?;
                Ok(split_log_softmax(&joint_out, vocab_size, config.softmax_temperature))
            };
            let lm_param = lm.map(|(adapter, alpha)| {
                (alpha, move |state: &M::State, token: u32| adapter.score(state, token))
            });
            correct_prefixes(&mut hyps, zero_idx, config.maes_prefix_alpha, score_step, lm_param)?;
        }

        let dup_check: HashSet<Vec<u32>> = hyps.iter().map(|h| h.tokens.clone()).collect();

        let mut list_blank: Vec<Hypothesis<P::State, M::State>> = Vec::new();
        let mut list_nonblank_nonzero: Vec<Hypothesis<P::State, M::State>> = Vec::new();

        for n in 0..config.maes_num_steps {
            let mut list_expand: Vec<Hypothesis<P::State, M::State>> = Vec::new();

            for hyp in &hyps {
                let pred_out = hyp
                    .predictor_outputs
                    .last()
                    .expect("mAES hypotheses always carry a cached predictor output");
                let joint_out = joint.joint(&encoder_frame, pred_out)?;
                let (vocab_logp, duration_logp) =
                    split_log_softmax(&joint_out, vocab_size, config.softmax_temperature);

                let (tok_idx, tok_logp) = top_k(&vocab_logp, max_candidates);
                let (dur_idx, dur_logp) = top_k(&duration_logp, duration_beam_k);
                let token_topk: Vec<(usize, f32)> = tok_idx.into_iter().zip(tok_logp).collect();
                let dur_topk: Vec<(usize, f32)> = dur_idx.into_iter().zip(dur_logp).collect();

                let expansions =
                    select_k_expansions(hyp.score, &token_topk, &dur_topk, config.maes_expansion_gamma);

                for exp in expansions {
                    let mut duration_idx = exp.duration_idx;
                    if exp.token_idx == blank_id as usize && Some(duration_idx) == durations.zero_idx() {
                        duration_idx = durations.min_nonzero_idx();
                    }
                    let duration_val = durations.value(duration_idx);
                    let last_frame = hyp.last_frame + duration_val as usize;

                    if exp.token_idx == blank_id as usize {
                        let mut score = exp.score;
                        if let Some((_, alpha_lm)) = lm {
                            score += alpha_lm * (vocab_logp[blank_id as usize] + duration_logp[duration_idx]);
                        }
                        list_blank.push(Hypothesis {
                            score,
                            tokens: hyp.tokens.clone(),
                            timesteps: hyp.timesteps.clone(),
                            predictor_state: hyp.predictor_state.clone(),
                            last_frame,
                            predictor_outputs: hyp.predictor_outputs.clone(),
                            lm_state: hyp.lm_state.clone(),
                        });
                    } else {
                        let mut tokens = hyp.tokens.clone();
                        tokens.push(exp.token_idx as u32);
                        let mut timesteps = hyp.timesteps.clone();
                        timesteps.push(t as i64);

                        let mut score = exp.score;
                        let mut lm_state = hyp.lm_state.clone();
                        if let Some((adapter, alpha_lm)) = lm {
                            if let Some(state) = lm_state.as_ref() {
                                let (lm_score, next) = adapter.score(state, exp.token_idx as u32);
                                score += alpha_lm * lm_score;
                                lm_state = Some(next);
                            }
                        }

                        let child = Hypothesis {
                            score,
                            tokens,
                            timesteps,
                            predictor_state: hyp.predictor_state.clone(),
                            last_frame,
                            predictor_outputs: hyp.predictor_outputs.clone(),
                            lm_state,
                        };

                        if duration_val == 0 && !dup_check.contains(&child.tokens) {
                            list_expand.push(child);
                        } else {
                            list_nonblank_nonzero.push(child);
                        }
                    }
                }
            }

            {
                let expand_len = list_expand.len();
                let to_update: Vec<&Hypothesis<P::State, M::State>> = list_expand
                    .iter()
                    .chain(list_nonblank_nonzero.iter())
                    .collect();
                if !to_update.is_empty() {
                    let refreshed = predictor.batch_score_hypothesis(&to_update, &mut cache)?;
                    for (i, (pred_out, new_state)) in refreshed.into_iter().enumerate() {
                        if i < expand_len {
                            list_expand[i].predictor_state = new_state;
                            list_expand[i].predictor_outputs.push(pred_out);
                        } else {
                            let j = i - expand_len;
                            list_nonblank_nonzero[j].predictor_state = new_state;
                            list_nonblank_nonzero[j].predictor_outputs.push(pred_out);
                        }
                    }
                }
            }

            if list_expand.is_empty() {
                let merged: Vec<_> = kept
                    .drain(..)
                    .chain(list_blank.drain(..))
                    .chain(list_nonblank_nonzero.drain(..))
                    .collect();
                let mut deduped = remove_duplicates(merged);
                deduped.truncate(beam);
                kept = deduped;
                break;
            } else if n == config.maes_num_steps - 1 {
                for hyp in &mut list_expand {
                    let pred_out = hyp.predictor_outputs.last().expect("refreshed above");
                    let joint_out = joint.joint(&encoder_frame, pred_out)?;
                    let (vocab_logp, duration_logp) =
                        split_log_softmax(&joint_out, vocab_size, config.softmax_temperature);
                    let (max_idx, _) = duration_logp
                        .iter()
                        .enumerate()
                        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                        .map(|(i, &v)| (i, v))
                        .expect("duration table is non-empty");
                    let duration_idx = if Some(max_idx) == durations.zero_idx() {
                        durations.min_nonzero_idx()
                    } else {
                        max_idx
                    };
                    hyp.score += vocab_logp[blank_id as usize] + duration_logp[duration_idx];
                    hyp.last_frame += durations.value(duration_idx) as usize;
                }

                let merged: Vec<_> = kept
                    .drain(..)
                    .chain(list_blank.drain(..))
                    .chain(list_expand.drain(..))
                    .chain(list_nonblank_nonzero.drain(..))
                    .collect();
                let mut deduped = remove_duplicates(merged);
                deduped.truncate(beam);
                kept = deduped;
                break;
            } else {
                hyps = remove_duplicates(list_expand);
            }
        }

        debug!(frame = t, frontier_size = kept.len(), "frame complete");
    }

    Ok(sort_nbest(kept, config.score_norm))
}

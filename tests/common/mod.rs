//! Shared test harness: literal-stub `Predictor`/`Joint` implementations
//! that return a fixed, caller-supplied logit table instead of running a
//! real neural network, so search behavior can be pinned down exactly.

use ndarray::{Array1, Array2};
use tdt_beam_decoder::{Joint, Predictor, PredictorCache, Result};

/// Ignores hypothesis content entirely; state is `()`, output is a fixed
/// zero vector the stub `Joint` below never reads.
pub struct StubPredictor;

impl Predictor for StubPredictor {
    type State = ();

    fn initialize_state(&self) {}

    fn score_hypothesis<L: Clone>(
        &self,
        _hyp: &tdt_beam_decoder::Hypothesis<(), L>,
        _cache: &mut PredictorCache<()>,
    ) -> Result<(Array1<f32>, ())> {
        Ok((Array1::zeros(1), ()))
    }

    fn batch_score_hypothesis<L: Clone>(
        &self,
        hyps: &[&tdt_beam_decoder::Hypothesis<(), L>],
        _cache: &mut PredictorCache<()>,
    ) -> Result<Vec<(Array1<f32>, ())>> {
        Ok(hyps.iter().map(|_| (Array1::zeros(1), ())).collect())
    }
}

/// Returns `table[t]` for every call at frame `t`, identified by reading
/// `encoder_frame[0]` back as the frame index (the frame passed in by the
/// search loop is `encoder_output.row(t)`, so this round-trips cleanly).
pub struct StubJoint {
    pub table: Vec<Array1<f32>>,
}

impl Joint for StubJoint {
    fn joint(&self, encoder_frame: &Array1<f32>, _predictor_output: &Array1<f32>) -> Result<Array1<f32>> {
        let t = encoder_frame[0].round() as usize;
        Ok(self.table[t].clone())
    }
}

/// `[T, 1]` encoder output whose only role is to let `StubJoint` recover the
/// frame index; real encoder features never reach the stub.
pub fn frame_index_encoder(t: usize) -> Array2<f32> {
    let mut out = Array2::zeros((t, 1));
    for i in 0..t {
        out[[i, 0]] = i as f32;
    }
    out
}

/// Builds one frame's joint logits: `vocab_size` vocabulary entries followed
/// by `duration_size` duration entries, concatenated.
pub fn logits(vocab: &[f32], duration: &[f32]) -> Array1<f32> {
    let mut v = vocab.to_vec();
    v.extend_from_slice(duration);
    Array1::from(v)
}

//! External collaborator contracts (spec.md §3, §6).
//!
//! The prediction network, joint network, and N-gram LM are neural/opaque
//! modules out of this crate's scope — only the interfaces the search calls
//! are specified here. Tensor primitives (log-softmax, top-k) live in
//! [`crate::math`] and are applied by the search, not by these traits.

use ndarray::Array1;

use crate::error::Result;
use crate::hypothesis::Hypothesis;

/// Per-call cache keyed by a hypothesis's token sequence, owned by the
/// decode call and discarded at return (spec.md §5).
pub type PredictorCache<S> = std::collections::HashMap<Vec<u32>, (Array1<f32>, S)>;

/// The prediction network ("decoder" in RNN-T/TDT terminology): a stateful
/// autoregressive model over token sequences.
///
/// `State` is opaque to the search — it is cloned on hypothesis branching
/// and never inspected (spec.md Design Notes §9).
pub trait Predictor {
    type State: Clone;

    /// Initial state for a fresh, sentinel hypothesis.
    fn initialize_state(&self) -> Self::State;

    /// Scores a single hypothesis, optionally consulting `cache`.
    /// Returns the prediction-network output vector and the resulting
    /// state. Generic over `L` (the hypothesis's LM-state type) since the
    /// predictor never looks at it.
    fn score_hypothesis<L: Clone>(
        &self,
        hyp: &Hypothesis<Self::State, L>,
        cache: &mut PredictorCache<Self::State>,
    ) -> Result<(Array1<f32>, Self::State)>;

    /// Batched form of [`Predictor::score_hypothesis`], used by mAES to
    /// refresh predictor state/outputs for every expansion of a round in
    /// one call.
    fn batch_score_hypothesis<L: Clone>(
        &self,
        hyps: &[&Hypothesis<Self::State, L>],
        cache: &mut PredictorCache<Self::State>,
    ) -> Result<Vec<(Array1<f32>, Self::State)>>;
}

/// The joint network: combines one encoder frame and one predictor output
/// into a single logit vector `[V | |D|]` (spec.md §3).
pub trait Joint {
    fn joint(&self, encoder_frame: &Array1<f32>, predictor_output: &Array1<f32>) -> Result<Array1<f32>>;
}

/// N-gram LM contract (spec.md §6, §4.5). `State` is opaque, threaded
/// hypothesis-to-hypothesis exactly like the predictor's state.
///
/// `symbol` is the already-encoded LM vocabulary symbol — single-codepoint
/// string for subword mode, decimal string for char mode — since that
/// encoding (spec.md §4.5) is the adapter's job, not the model's.
pub trait NgramLm {
    type State: Clone;

    fn begin_sentence(&self) -> Self::State;

    /// Returns the **log10** score for `symbol` given `state`, plus the
    /// resulting state. Conversion to natural log happens in
    /// [`crate::lm::LmAdapter`], not here — this trait mirrors the KenLM
    /// `base_score` contract directly.
    fn base_score(&self, state: &Self::State, symbol: &str) -> (f32, Self::State);
}

/// Placeholder `NgramLm` used as [`crate::TdtBeamDecoder`]'s default LM type
/// parameter when shallow fusion is disabled. Never called: mAES only
/// invokes the LM when a [`crate::lm::LmAdapter`] is actually constructed,
/// which requires an `M: NgramLm` value — this type exists purely so the
/// generic search functions have something to monomorphize against.
#[derive(Debug, Clone, Copy)]
pub struct NoLm;

impl NgramLm for NoLm {
    type State = ();

    fn begin_sentence(&self) {}

    fn base_score(&self, _state: &(), _symbol: &str) -> (f32, ()) {
        unreachable!("NoLm is never invoked")
    }
}

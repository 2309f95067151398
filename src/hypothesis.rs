use ndarray::Array1;

/// A partial decoding hypothesis (spec.md §3, C1).
///
/// Value type: branching produces a new record whose `tokens`, `timesteps`,
/// and `predictor_outputs` are extended by at most one element, and whose
/// `predictor_state`/`lm_state` are logically copied. Rust's ownership model
/// makes the "shared until mutated" guarantee from the Design Notes a
/// property of `Clone` on plain `Vec`s rather than something this type has
/// to implement itself — see DESIGN.md for the tradeoff.
#[derive(Debug, Clone)]
pub struct Hypothesis<S: Clone, L: Clone = ()> {
    /// Cumulative natural-log probability.
    pub score: f32,
    /// Position 0 is always the blank sentinel; only non-blank tokens are
    /// appended thereafter.
    pub tokens: Vec<u32>,
    /// Aligned with `tokens`; position 0 is always -1.
    pub timesteps: Vec<i64>,
    /// Opaque prediction-network state.
    pub predictor_state: S,
    /// Frame index at which this hypothesis next decodes.
    pub last_frame: usize,
    /// mAES only: cached predictor outputs, parallel to successful
    /// non-blank expansions. Empty for the default search.
    pub predictor_outputs: Vec<Array1<f32>>,
    /// mAES + LM only.
    pub lm_state: Option<L>,
}

impl<S: Clone, L: Clone> Hypothesis<S, L> {
    /// The sentinel hypothesis every search starts from (spec.md §4.6,
    /// §4.7): `tokens = [blank]`, `timesteps = [-1]`, `score = 0`,
    /// `last_frame = 0`.
    pub fn sentinel(blank: u32, predictor_state: S) -> Self {
        Self {
            score: 0.0,
            tokens: vec![blank],
            timesteps: vec![-1],
            predictor_state,
            last_frame: 0,
            predictor_outputs: Vec::new(),
            lm_state: None,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// `shorter.tokens` is a strict prefix of `self.tokens` (spec.md §4.4).
    pub fn has_strict_prefix(&self, shorter: &[u32]) -> bool {
        shorter.len() < self.tokens.len() && self.tokens[..shorter.len()] == *shorter
    }
}

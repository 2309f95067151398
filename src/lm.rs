//! LM scorer adapter (spec.md §4.5, C5): a uniform contract over an N-gram
//! LM state machine, symbol-encoding token ids and converting log10 scores
//! to natural-log.

use crate::config::{TokensType, DEFAULT_TOKEN_OFFSET};
use crate::model::NgramLm;

/// `1 / log10(e)`, the log10 -> ln conversion factor (spec.md §4.5).
const LOG10_TO_LN: f32 = std::f32::consts::LN_10;

pub struct LmAdapter<'a, M: NgramLm> {
    model: &'a M,
    tokens_type: TokensType,
}

impl<'a, M: NgramLm> LmAdapter<'a, M> {
    pub fn new(model: &'a M, tokens_type: TokensType) -> Self {
        Self { model, tokens_type }
    }

    pub fn begin_sentence(&self) -> M::State {
        self.model.begin_sentence()
    }

    /// Encodes `token_id` into the LM's vocabulary symbol per
    /// [`TokensType`], scores it, and returns the natural-log score plus
    /// the resulting state.
    pub fn score(&self, state: &M::State, token_id: u32) -> (f32, M::State) {
        let symbol = self.encode_symbol(token_id);
        let (log10_score, next_state) = self.model.base_score(state, &symbol);
        (log10_score * LOG10_TO_LN, next_state)
    }

    fn encode_symbol(&self, token_id: u32) -> String {
        match self.tokens_type {
            TokensType::Subword => {
                let codepoint = token_id + DEFAULT_TOKEN_OFFSET;
                char::from_u32(codepoint)
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| token_id.to_string())
            }
            TokensType::Char => token_id.to_string(),
        }
    }
}

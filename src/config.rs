use serde::{Deserialize, Serialize};

use crate::error::{DecoderError, Result};

/// Which beam search algorithm to run (spec.md §6).
///
/// NeMo's `self.search_algorithm` also dispatches to a `greedy_search` path
/// when `beam_size == 1`; this core has no separate greedy algorithm, so
/// `beam_size == 1` still runs ordinary [`Default`](SearchType::Default)
/// beam-search mechanics with a frontier of width one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Default,
    Maes,
}

/// How token ids are mapped to N-gram LM symbols (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokensType {
    Subword,
    Char,
}

/// NeMo's `train_kenlm.py` offsets subword ids into the Unicode private-use
/// area so each token id round-trips through KenLM as a single codepoint.
pub const DEFAULT_TOKEN_OFFSET: u32 = 100;

/// Shallow-fusion N-gram LM configuration (spec.md §6). Requires
/// `search_type = maes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmConfig {
    pub alpha: f32,
    pub tokens_type: TokensType,
}

/// Hyperparameters for [`crate::TdtBeamDecoder`] (spec.md §6).
///
/// Grounded on the teacher's `DecodingConfig`: a plain serde-derived struct
/// with a `Default` impl, validated once at decoder construction rather than
/// scattered through the search loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Width of the surviving frontier. Must be >= 1 (spec.md §6); `1` is a
    /// legal width that runs the same search mechanics as any other beam
    /// size, not a separate greedy algorithm.
    pub beam_size: usize,
    pub search_type: SearchType,
    /// Post-sort by length-normalized score instead of raw score.
    pub score_norm: bool,
    /// Logit scaling applied before both log-softmaxes.
    pub softmax_temperature: f32,

    /// mAES expansion rounds per frame. Must be >= 2.
    pub maes_num_steps: u32,
    /// Max prefix length gap considered by the prefix-score corrector.
    pub maes_prefix_alpha: u32,
    /// Extra candidates kept above `beam_size` during expansion.
    pub maes_expansion_beta: usize,
    /// Prune-by-value margin (natural-log) used by the expansion selector.
    pub maes_expansion_gamma: f32,
    /// Duration top-k width per expansion round (`tdt_duration_beam_size`
    /// in the original; typically 2).
    pub maes_duration_beam_size: usize,

    /// Shallow-fusion LM weight and symbol encoding. `None` disables LM
    /// fusion.
    pub lm: Option<LmConfig>,

    /// Returns only the single best hypothesis from `decode_best`
    /// regardless of how many survive to the N-best list (mirrors the
    /// original's `return_best_hypothesis` flag; `decode` always returns
    /// the full ordered N-best Vec).
    pub return_best_hypothesis: bool,

    /// Safety cap on zero-duration same-frame expansions the default search
    /// pops per frame before it forces the frontier onward. Not part of
    /// spec.md's algorithm; a pathological joint distribution that always
    /// prefers a zero-duration emission can otherwise keep the per-frame
    /// loop growing without bound. Mirrors the teacher's
    /// `max_iterations = encoder_time * 10` guard in its greedy TDT loop.
    pub max_same_frame_expansions: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            beam_size: 4,
            search_type: SearchType::Default,
            score_norm: true,
            softmax_temperature: 1.0,
            maes_num_steps: 2,
            maes_prefix_alpha: 1,
            maes_expansion_beta: 2,
            maes_expansion_gamma: 2.3,
            maes_duration_beam_size: 2,
            lm: None,
            return_best_hypothesis: true,
            max_same_frame_expansions: 512,
        }
    }
}

impl DecoderConfig {
    pub fn beam_search(beam_size: usize) -> Self {
        Self {
            beam_size,
            ..Self::default()
        }
    }

    pub fn maes(beam_size: usize) -> Self {
        Self {
            beam_size,
            search_type: SearchType::Maes,
            ..Self::default()
        }
    }

    pub fn with_softmax_temperature(mut self, temperature: f32) -> Self {
        self.softmax_temperature = temperature;
        self
    }

    pub fn with_lm(mut self, alpha: f32, tokens_type: TokensType) -> Self {
        self.lm = Some(LmConfig { alpha, tokens_type });
        self
    }

    /// Validates every construction-time contract in spec.md §6–§7.
    /// `vocab_size` includes the blank id.
    pub fn validate(&self, vocab_size: usize) -> Result<()> {
        if self.beam_size < 1 {
            return Err(DecoderError::config("beam_size must be >= 1"));
        }

        if self.lm.is_some() && self.search_type != SearchType::Maes {
            return Err(DecoderError::config(
                "an N-gram LM requires search_type = maes",
            ));
        }

        if self.search_type == SearchType::Maes {
            if self.maes_num_steps < 2 {
                return Err(DecoderError::config("maes_num_steps must be >= 2"));
            }
            if vocab_size < self.beam_size + self.maes_expansion_beta {
                return Err(DecoderError::config(format!(
                    "beam_size ({}) + maes_expansion_beta ({}) must be <= vocab_size ({})",
                    self.beam_size, self.maes_expansion_beta, vocab_size
                )));
            }
        }

        if self.softmax_temperature <= 0.0 {
            return Err(DecoderError::config("softmax_temperature must be > 0"));
        }

        Ok(())
    }

    /// Effective candidate budget for mAES: `beam + beta` (spec.md §4.7).
    pub fn max_candidates(&self) -> usize {
        self.beam_size + self.maes_expansion_beta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_beam_size_zero() {
        let cfg = DecoderConfig::beam_search(0);
        assert!(cfg.validate(100).is_err());
    }

    #[test]
    fn accepts_beam_size_one() {
        let cfg = DecoderConfig::beam_search(1);
        assert!(cfg.validate(100).is_ok());
    }

    #[test]
    fn rejects_lm_without_maes() {
        let cfg = DecoderConfig::beam_search(4).with_lm(0.5, TokensType::Subword);
        assert!(cfg.validate(100).is_err());
    }

    #[test]
    fn rejects_maes_with_small_vocab() {
        let cfg = DecoderConfig::maes(10);
        assert!(cfg.validate(5).is_err());
    }

    #[test]
    fn accepts_sane_defaults() {
        let cfg = DecoderConfig::default();
        assert!(cfg.validate(8193).is_ok());
    }
}

mod config;
mod dedup;
mod durations;
mod error;
mod expansion;
mod hypothesis;
mod lm;
mod math;
mod model;
mod prefix;
mod search;
mod sort;

use ndarray::Array2;
use tracing::info;

pub use config::{DecoderConfig, LmConfig, SearchType, TokensType, DEFAULT_TOKEN_OFFSET};
pub use durations::DurationTable;
pub use error::{DecoderError, Result};
pub use hypothesis::Hypothesis;
pub use lm::LmAdapter;
pub use model::{Joint, NgramLm, NoLm, PredictorCache, Predictor};

/// Beam-search decoder for a Token-and-Duration Transducer model (spec.md
/// §1). Owns the hyperparameters, vocabulary size, duration table, and the
/// predictor/joint/LM collaborators; one instance decodes one utterance at
/// a time (spec.md §5).
pub struct TdtBeamDecoder<P: Predictor, J: Joint, M: NgramLm = NoLm> {
    config: DecoderConfig,
    blank_id: u32,
    vocab_size: usize,
    durations: DurationTable,
    predictor: P,
    joint: J,
    lm_model: Option<M>,
}

impl<P: Predictor, J: Joint> TdtBeamDecoder<P, J, NoLm> {
    /// Constructs a decoder with no LM fusion. Fails if `config` requests
    /// an LM (use [`TdtBeamDecoder::with_lm`] instead) or fails any other
    /// construction-time check (spec.md §6–§7).
    pub fn new(
        config: DecoderConfig,
        blank_id: u32,
        vocab_size: usize,
        durations: DurationTable,
        predictor: P,
        joint: J,
    ) -> Result<Self> {
        if config.lm.is_some() {
            return Err(DecoderError::config(
                "config requests an LM; construct with TdtBeamDecoder::with_lm",
            ));
        }
        config.validate(vocab_size)?;
        info!(beam_size = config.beam_size, search_type = ?config.search_type, "constructed decoder");
        Ok(Self {
            config,
            blank_id,
            vocab_size,
            durations,
            predictor,
            joint,
            lm_model: None,
        })
    }
}

impl<P: Predictor, J: Joint, M: NgramLm> TdtBeamDecoder<P, J, M> {
    /// Constructs a decoder with N-gram LM shallow fusion. `config.lm` must
    /// be set and `config.search_type` must be `maes` (spec.md §6).
    pub fn with_lm(
        config: DecoderConfig,
        blank_id: u32,
        vocab_size: usize,
        durations: DurationTable,
        predictor: P,
        joint: J,
        lm_model: M,
    ) -> Result<Self> {
        if config.lm.is_none() {
            return Err(DecoderError::config(
                "an LM model instance was supplied but config.lm is None",
            ));
        }
        config.validate(vocab_size)?;
        info!(beam_size = config.beam_size, "constructed decoder with LM fusion");
        Ok(Self {
            config,
            blank_id,
            vocab_size,
            durations,
            predictor,
            joint,
            lm_model: Some(lm_model),
        })
    }

    /// Decodes one utterance and returns its N-best list, ordered per
    /// [`DecoderConfig::score_norm`] (spec.md §6).
    ///
    /// `encoder_output` is `[T, D_enc]` (the batch-1 axis of the original
    /// `[1, T, D_enc]` contract is dropped — this core decodes one
    /// utterance per call, so it carries no information).
    pub fn decode(
        &self,
        encoder_output: &Array2<f32>,
        valid_length: usize,
    ) -> Result<Vec<Hypothesis<P::State, M::State>>> {
        info!(valid_length, search_type = ?self.config.search_type, "decode call starting");
        let nbest = match self.config.search_type {
            SearchType::Default => search::default::search(
                encoder_output,
                valid_length,
                self.blank_id,
                self.vocab_size,
                &self.durations,
                &self.config,
                &self.predictor,
                &self.joint,
            ),
            SearchType::Maes => {
                let adapter = match (&self.lm_model, &self.config.lm) {
                    (Some(model), Some(lm_cfg)) => Some(LmAdapter::new(model, lm_cfg.tokens_type)),
                    _ => None,
                };
                let lm = adapter
                    .as_ref()
                    .map(|a| (a, self.config.lm.as_ref().unwrap().alpha));
                search::maes::search(
                    encoder_output,
                    valid_length,
                    self.blank_id,
                    self.vocab_size,
                    &self.durations,
                    &self.config,
                    &self.predictor,
                    &self.joint,
                    lm,
                )
            }
        }?;
        info!(
            frames_decoded = valid_length,
            nbest_count = nbest.len(),
            best_score = nbest.first().map(|h| h.score),
            "decode call finished"
        );
        Ok(nbest)
    }

    /// Decodes and returns only the single best hypothesis, honoring
    /// [`DecoderConfig::return_best_hypothesis`]'s intent at the call site
    /// rather than the full N-best list.
    pub fn decode_best(
        &self,
        encoder_output: &Array2<f32>,
        valid_length: usize,
    ) -> Result<Option<Hypothesis<P::State, M::State>>> {
        let mut nbest = self.decode(encoder_output, valid_length)?;
        Ok(if nbest.is_empty() {
            None
        } else {
            Some(nbest.remove(0))
        })
    }
}

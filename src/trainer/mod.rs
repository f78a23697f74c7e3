//! Trainer: builds a Vocabulary Store from a raw text corpus.
//!
//! Unigram-model training: seed a large candidate piece set from corpus
//! substrings, then alternate likelihood re-estimation (EM) with pruning
//! of the weakest candidates until the target vocabulary size is reached.
//! Single-character pieces are never pruned, so any string over the
//! corpus alphabet stays segmentable with zero unknown-token fallback.

mod em;
mod seed;

use std::sync::atomic::AtomicBool;

use log::info;

use crate::core::error::TokenizerError;
use crate::core::types::{Piece, TrainedModel, TrainerConfig};
use crate::vocab::Vocabulary;

/// Batch, single-owner training driver. Holds only configuration: the
/// per-run working state lives on the stack of `train`, so one `Trainer`
/// can run repeatedly but is not re-entrant mid-run.
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Train a model from the corpus (one record per element).
    ///
    /// # Errors
    /// `InsufficientCoverage` when `target_vocab_size` cannot hold the
    /// reserved special tokens plus one piece per distinct corpus
    /// character.
    pub fn train(&self, corpus: &[String]) -> Result<TrainedModel, TokenizerError> {
        self.train_with_cancel(corpus, None)
    }

    /// `train` with a coarse cancellation point between EM iterations.
    ///
    /// When `cancel` becomes true the current iteration finishes, the
    /// working set is pruned straight to the target size, and the model
    /// is finalized from the pieces surviving so far.
    pub fn train_with_cancel(
        &self,
        corpus: &[String],
        cancel: Option<&AtomicBool>,
    ) -> Result<TrainedModel, TokenizerError> {
        let config = &self.config;
        let specs = config.specials.to_specs();

        info!(
            "Training on {} corpus records (target vocabulary size {})",
            corpus.len(),
            config.target_vocab_size
        );

        let counts = seed::count_substrings(corpus, config);
        let candidates = seed::select_candidates(counts, config);
        let single_count = candidates.iter().filter(|(t, _)| t.chars().count() == 1).count();

        // The single-character floor plus reserved slots must fit
        let required = specs.len() + single_count;
        if config.target_vocab_size < required {
            return Err(TokenizerError::InsufficientCoverage {
                required,
                target: config.target_vocab_size,
            });
        }
        let keep_multi = config.target_vocab_size - required;

        let mut survivors = em::run_em(candidates, corpus, config, keep_multi, cancel);
        em::finalize_to_target(&mut survivors, keep_multi);

        // Dense id assignment: specials take the lowest ids, trained
        // pieces follow in descending score order, ties by piece string
        survivors.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.text.cmp(&b.text))
        });
        let id_offset = specs.len() as u32;
        let pieces: Vec<Piece> = survivors
            .into_iter()
            .enumerate()
            .map(|(idx, c)| Piece {
                text: c.text,
                id: id_offset + idx as u32,
                score: c.score,
            })
            .collect();

        let vocabulary = Vocabulary::from_pieces(pieces)?;
        info!(
            "Training complete: {} pieces + {} special tokens",
            vocabulary.size(),
            specs.len()
        );
        Ok(TrainedModel {
            vocabulary,
            specials: specs,
        })
    }
}

use log::info;
use rayon::prelude::*;

use crate::core::types::{CoveragePolicy, Piece, TrainerConfig};
use crate::segmenter::segment;
use crate::vocab::Vocabulary;

/// Shard size for the parallel E-step.
const EM_SHARD_LINES: usize = 256;

/// Sentinel unknown id for training-time segmentation. Never observed:
/// the candidate set contains every character of the corpus, so training
/// segmentations have full coverage by construction.
const UNK_SENTINEL: u32 = u32::MAX;

/// A piece still alive in the EM working set.
pub(super) struct Candidate {
    pub text: String,
    /// Usage count from the most recent E-step (seed frequency before the
    /// first iteration)
    pub count: u64,
    /// Current log probability
    pub score: f32,
    pub is_multi: bool,
}

/// Run EM iterations until at most `keep_multi` multi-character candidates
/// survive, the iteration cap is hit, or cancellation is requested.
///
/// Each iteration: E-step segments the corpus under the current scores
/// (shard-parallel map, serial reduce of usage counts), M-step
/// re-estimates log probabilities with additive smoothing, then the
/// lowest-usage fraction of multi-character candidates is pruned.
/// Single-character candidates are never pruned.
///
/// A cancelled run returns the working set as of the last completed
/// iteration; `finalize_to_target` then prunes the remainder straight to
/// the target size.
pub(super) fn run_em(
    seeds: Vec<(String, u64)>,
    corpus: &[String],
    config: &TrainerConfig,
    keep_multi: usize,
    cancel: Option<&std::sync::atomic::AtomicBool>,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = seeds
        .into_iter()
        .map(|(text, count)| Candidate {
            is_multi: text.chars().count() > 1,
            text,
            count,
            score: 0.0,
        })
        .collect();
    if candidates.is_empty() {
        return candidates;
    }
    rescore(&mut candidates);

    for iteration in 1..=config.em_iterations {
        if cancel
            .map(|flag| flag.load(std::sync::atomic::Ordering::Relaxed))
            .unwrap_or(false)
        {
            info!("Training cancelled before iteration {}", iteration);
            break;
        }

        let (counts, log_likelihood) = e_step(&candidates, corpus);
        for (candidate, count) in candidates.iter_mut().zip(&counts) {
            candidate.count = *count;
        }
        rescore(&mut candidates);

        let multi_count = candidates.iter().filter(|c| c.is_multi).count();
        if multi_count <= keep_multi {
            info!(
                "EM iteration {}/{}: {} candidates, corpus log-likelihood {:.2}, target reached",
                iteration,
                config.em_iterations,
                candidates.len(),
                log_likelihood
            );
            break;
        }

        let excess = multi_count - keep_multi;
        let fraction = ((multi_count as f64) * config.prune_fraction).ceil() as usize;
        let prune_n = excess.min(fraction.max(1));
        prune_lowest_usage(&mut candidates, prune_n);

        info!(
            "EM iteration {}/{}: {} candidates, corpus log-likelihood {:.2}, pruned {}",
            iteration,
            config.em_iterations,
            candidates.len(),
            log_likelihood,
            prune_n
        );
    }

    candidates
}

/// Prune any multi-character candidates still above `keep_multi`, lowest
/// usage first. Called after the EM loop so a cancelled or
/// iteration-capped run still lands exactly on the target size.
pub(super) fn finalize_to_target(candidates: &mut Vec<Candidate>, keep_multi: usize) {
    let multi_count = candidates.iter().filter(|c| c.is_multi).count();
    if multi_count > keep_multi {
        prune_lowest_usage(candidates, multi_count - keep_multi);
    }
}

/// One parallel pass of Viterbi segmentation over the corpus, returning
/// per-candidate usage counts and the corpus log-likelihood.
fn e_step(candidates: &[Candidate], corpus: &[String]) -> (Vec<u64>, f64) {
    // Temporary vocabulary with ids equal to working-set indices
    let pieces = candidates
        .iter()
        .enumerate()
        .map(|(idx, c)| Piece {
            text: c.text.clone(),
            id: idx as u32,
            score: c.score,
        })
        .collect();
    let vocab = Vocabulary::from_pieces(pieces)
        .expect("working-set candidates are unique and densely indexed");

    corpus
        .par_chunks(EM_SHARD_LINES)
        .map(|shard| {
            let mut counts = vec![0u64; candidates.len()];
            let mut log_likelihood = 0.0f64;
            for line in shard {
                for piece in segment(line, &vocab, UNK_SENTINEL, CoveragePolicy::Codepoint) {
                    if piece.id != UNK_SENTINEL {
                        counts[piece.id as usize] += 1;
                        log_likelihood += f64::from(candidates[piece.id as usize].score);
                    }
                }
            }
            (counts, log_likelihood)
        })
        .reduce(
            || (vec![0u64; candidates.len()], 0.0),
            |(mut acc, acc_ll), (shard, shard_ll)| {
                for (slot, count) in acc.iter_mut().zip(shard) {
                    *slot += count;
                }
                (acc, acc_ll + shard_ll)
            },
        )
}

/// M-step: log probabilities from usage counts with +0.5 additive
/// smoothing, so unused-but-mandatory pieces (single characters) keep a
/// finite score and remain usable for coverage.
fn rescore(candidates: &mut [Candidate]) {
    let total: u64 = candidates.iter().map(|c| c.count).sum();
    let denom = total as f64 + 0.5 * candidates.len() as f64;
    for candidate in candidates.iter_mut() {
        candidate.score = ((candidate.count as f64 + 0.5) / denom).ln() as f32;
    }
}

fn prune_lowest_usage(candidates: &mut Vec<Candidate>, prune_n: usize) {
    // Rank multi-character candidates by usage, lowest first; ties by
    // piece string for a fully ordered (deterministic) prune
    let mut ranked: Vec<usize> = (0..candidates.len())
        .filter(|&i| candidates[i].is_multi)
        .collect();
    ranked.sort_by(|&a, &b| {
        candidates[a]
            .count
            .cmp(&candidates[b].count)
            .then_with(|| candidates[a].text.cmp(&candidates[b].text))
    });
    let doomed: std::collections::HashSet<usize> = ranked.into_iter().take(prune_n).collect();

    let mut idx = 0;
    candidates.retain(|_| {
        let keep = !doomed.contains(&idx);
        idx += 1;
        keep
    });
}

use std::collections::HashMap;

use rayon::prelude::*;

use crate::core::types::TrainerConfig;

/// Shard size for the parallel substring count; big enough that the merge
/// cost stays small next to the counting itself.
const COUNT_SHARD_LINES: usize = 512;

/// Count every candidate substring of the corpus up to
/// `config.max_piece_len` codepoints.
///
/// The count map is built shard-parallel (map) and merged serially
/// (reduce), so the result is independent of thread scheduling.
pub(super) fn count_substrings(corpus: &[String], config: &TrainerConfig) -> HashMap<String, u64> {
    let max_len = config.max_piece_len.max(1);
    corpus
        .par_chunks(COUNT_SHARD_LINES)
        .map(|shard| {
            let mut counts: HashMap<String, u64> = HashMap::new();
            for line in shard {
                count_line(line, max_len, &mut counts);
            }
            counts
        })
        .reduce(HashMap::new, |mut acc, shard| {
            for (text, count) in shard {
                *acc.entry(text).or_insert(0) += count;
            }
            acc
        })
}

fn count_line(line: &str, max_len: usize, counts: &mut HashMap<String, u64>) {
    let bounds: Vec<usize> = line
        .char_indices()
        .map(|(pos, _)| pos)
        .chain(std::iter::once(line.len()))
        .collect();
    let n = bounds.len() - 1;
    for start in 0..n {
        for len in 1..=max_len.min(n - start) {
            let span = &line[bounds[start]..bounds[start + len]];
            *counts.entry(span.to_string()).or_insert(0) += 1;
        }
    }
}

/// Select the seed candidate set from raw substring counts.
///
/// Every single character survives unconditionally (the coverage floor);
/// multi-character candidates must clear `min_candidate_freq` and the set
/// is capped at `seed_size` by descending frequency, ties by piece string,
/// so seeding is fully deterministic.
pub(super) fn select_candidates(
    counts: HashMap<String, u64>,
    config: &TrainerConfig,
) -> Vec<(String, u64)> {
    let mut singles = Vec::new();
    let mut multis = Vec::new();
    for (text, count) in counts {
        if text.chars().count() == 1 {
            singles.push((text, count));
        } else if count >= config.min_candidate_freq {
            multis.push((text, count));
        }
    }

    multis.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    multis.truncate(config.seed_size);

    singles.sort_by(|a, b| a.0.cmp(&b.0));
    singles.extend(multis);
    singles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_piece_len: usize, min_freq: u64, seed_size: usize) -> TrainerConfig {
        TrainerConfig {
            max_piece_len,
            min_candidate_freq: min_freq,
            seed_size,
            ..TrainerConfig::default()
        }
    }

    #[test]
    fn test_counts_substrings_up_to_max_len() {
        let corpus = vec!["abab".to_string()];
        let counts = count_substrings(&corpus, &config(2, 1, 100));
        assert_eq!(counts.get("a"), Some(&2));
        assert_eq!(counts.get("b"), Some(&2));
        assert_eq!(counts.get("ab"), Some(&2));
        assert_eq!(counts.get("ba"), Some(&1));
        // Length 3 substrings are never counted with max_piece_len = 2
        assert_eq!(counts.get("aba"), None);
    }

    #[test]
    fn test_single_chars_survive_any_frequency_filter() {
        let corpus = vec!["abc".to_string()];
        let counts = count_substrings(&corpus, &config(3, 10, 100));
        let candidates = select_candidates(counts, &config(3, 10, 100));
        let singles: Vec<&str> = candidates
            .iter()
            .filter(|(t, _)| t.chars().count() == 1)
            .map(|(t, _)| t.as_str())
            .collect();
        assert_eq!(singles, vec!["a", "b", "c"]);
        // Every multi-char substring occurs once, below min_candidate_freq
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn test_seed_cap_keeps_most_frequent_multis() {
        let corpus = vec!["ababab xyxy".to_string()];
        let cfg = config(2, 1, 1);
        let candidates = select_candidates(count_substrings(&corpus, &cfg), &cfg);
        let multis: Vec<&str> = candidates
            .iter()
            .filter(|(t, _)| t.chars().count() > 1)
            .map(|(t, _)| t.as_str())
            .collect();
        // "ab" (3 occurrences) is the single capped survivor
        assert_eq!(multis, vec!["ab"]);
    }

    #[test]
    fn test_multibyte_chars_count_as_single_units() {
        let corpus = vec!["éé".to_string()];
        let cfg = config(2, 1, 100);
        let counts = count_substrings(&corpus, &cfg);
        assert_eq!(counts.get("é"), Some(&2));
        assert_eq!(counts.get("éé"), Some(&1));
    }
}

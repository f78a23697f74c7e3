use crate::core::types::{CoveragePolicy, SegmentPiece, Segmentation};
use crate::vocab::Vocabulary;

/// Log-prob penalty for covering one fallback unit with the unknown token.
/// Far below any trained piece score, so unknown pieces only appear where
/// no trained path exists.
const UNK_PENALTY: f32 = -100.0;

/// Segment `text` into the maximum cumulative log-probability sequence of
/// vocabulary pieces.
///
/// Dynamic program over codepoint positions: for each end position, every
/// piece of length up to `vocab.max_piece_chars()` ending there is tried;
/// the best path is kept and backtracked at the end.
/// O(chars × max piece length) time, O(chars) space.
///
/// Ties are broken deterministically: equal cumulative scores prefer the
/// longer piece, then the lower id.
///
/// Positions no trained piece reaches are covered by the unknown fallback,
/// one codepoint at a time, with the original text preserved on the
/// emitted piece so concatenating the segmentation reconstructs the input
/// exactly. Under `CoveragePolicy::Byte` an uncovered codepoint emits one
/// unknown piece per UTF-8 byte instead of one per codepoint.
///
/// The empty string yields an empty segmentation.
pub fn segment(
    text: &str,
    vocab: &Vocabulary,
    unk_id: u32,
    policy: CoveragePolicy,
) -> Segmentation {
    if text.is_empty() {
        return Vec::new();
    }

    // Char boundaries as byte offsets, with the end offset appended so
    // bounds[i]..bounds[j] slices chars i..j.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(pos, _)| pos)
        .chain(std::iter::once(text.len()))
        .collect();
    let n = bounds.len() - 1;
    let max_len = vocab.max_piece_chars().max(1);

    let mut best = vec![f32::NEG_INFINITY; n + 1];
    // back[end] = (start, Some(id)) for a trained piece, (end - 1, None)
    // for one unknown fallback unit
    let mut back: Vec<Option<(usize, Option<u32>)>> = vec![None; n + 1];
    best[0] = 0.0;

    for end in 1..=n {
        let mut chosen: Option<(f32, usize, u32)> = None;
        for len in 1..=max_len.min(end) {
            let start = end - len;
            if best[start] == f32::NEG_INFINITY {
                continue;
            }
            let span = &text[bounds[start]..bounds[end]];
            let Some(id) = vocab.lookup_id(span) else {
                continue;
            };
            let score = match vocab.score(id) {
                Some(s) => best[start] + s,
                None => continue,
            };
            let better = match chosen {
                None => true,
                Some((best_score, best_len, best_id)) => {
                    score > best_score
                        || (score == best_score
                            && (len > best_len || (len == best_len && id < best_id)))
                }
            };
            if better {
                chosen = Some((score, len, id));
            }
        }

        if let Some((score, len, id)) = chosen {
            best[end] = score;
            back[end] = Some((end - len, Some(id)));
        } else {
            // No trained piece ends here: cover one codepoint with the
            // unknown token. best[end - 1] is always reachable by induction.
            best[end] = best[end - 1] + UNK_PENALTY;
            back[end] = Some((end - 1, None));
        }
    }

    // Backtrack from the end; pieces come out reversed and are flipped once.
    let mut rev: Segmentation = Vec::new();
    let mut pos = n;
    while pos > 0 {
        let (start, id) = back[pos].expect("every position is reachable via the unknown fallback");
        let span = &text[bounds[start]..bounds[pos]];
        match id {
            Some(id) => rev.push(SegmentPiece {
                text: span.to_string(),
                id,
            }),
            None => push_unknown_rev(&mut rev, span, unk_id, policy),
        }
        pos = start;
    }
    rev.reverse();
    rev
}

/// Emit the unknown pieces for one uncovered codepoint, in reverse order
/// (the caller reverses the whole segmentation once at the end).
///
/// Byte granularity emits one piece per UTF-8 byte; only the first piece
/// of the span carries the text, keeping reconstruction exact while the
/// unknown count reflects bytes.
fn push_unknown_rev(out: &mut Segmentation, span: &str, unk_id: u32, policy: CoveragePolicy) {
    match policy {
        CoveragePolicy::Codepoint => out.push(SegmentPiece {
            text: span.to_string(),
            id: unk_id,
        }),
        CoveragePolicy::Byte => {
            for i in (0..span.len()).rev() {
                let text = if i == 0 {
                    span.to_string()
                } else {
                    String::new()
                };
                out.push(SegmentPiece { text, id: unk_id });
            }
        }
    }
}

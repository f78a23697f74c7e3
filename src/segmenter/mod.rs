/// Segmenter: maximum-likelihood decomposition of text into vocabulary
/// pieces via a Viterbi dynamic program.
///
/// Segmentation is a total function: uncovered spans fall back to the
/// unknown-token id instead of failing. Special-token injection is not
/// done here; the tokenizer facade prepends the begin-of-sequence id as a
/// separate post-processing step.
pub mod viterbi;

pub use viterbi::segment;

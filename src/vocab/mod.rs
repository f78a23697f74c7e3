/// Vocabulary Store: the immutable piece table produced by training or
/// loaded from a model file, shared read-only across all segmentations.
pub mod store;

pub use store::Vocabulary;

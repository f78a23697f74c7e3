/// Special Token Registry: the process-wide mapping from configured
/// special-token strings to reserved ids, consulted before any vocabulary
/// lookup.
pub mod registry;

pub use registry::{SpecialOverrides, SpecialTokenRegistry};

//! The extraction unit contract.

use std::sync::Arc;

use kbforge_core::Theme;

use crate::context::ExtractionContext;

/// A node of the pipeline graph: reads input themes, writes output themes.
///
/// The scheduler opens every output before [`Extractor::extract`] runs and
/// closes them afterwards, whether extraction succeeded or not. A unit may
/// only write its declared outputs and read its declared inputs.
pub trait Extractor: Send + Sync {
    /// Unique name. Multilingual instances include their language, e.g.
    /// `LabelExtractor(de)`.
    fn name(&self) -> String;

    /// Themes read from the location this run produces into.
    fn input(&self) -> Vec<Theme>;

    /// Themes read from the cache location and kept in memory as frozen
    /// fact stores while any pending unit still needs them.
    fn input_cached(&self) -> Vec<Theme> {
        Vec::new()
    }

    fn output(&self) -> Vec<Theme>;

    /// Units run right after this one completes successfully.
    fn follow_up(&self) -> Vec<Arc<dyn Extractor>> {
        Vec::new()
    }

    fn extract(&self, context: &ExtractionContext<'_>) -> anyhow::Result<()>;
}

impl std::fmt::Debug for dyn Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Every declared input, cached or not.
#[must_use]
pub fn all_inputs(unit: &dyn Extractor) -> Vec<Theme> {
    let mut inputs = unit.input();
    inputs.extend(unit.input_cached());
    inputs
}

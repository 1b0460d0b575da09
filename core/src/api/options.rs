//! Configuration options for the furipota engine.

use crate::evaluator::DEFAULT_TRACE_DEPTH;

/// Configuration options for the furipota engine.
///
/// # Example
///
/// ```
/// use furipota_core::api::EngineOptions;
///
/// let options = EngineOptions {
///     max_depth: 200,
///     ..EngineOptions::default()
/// };
/// assert_eq!(options.trace_depth, 10);
/// ```
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Number of trace entries kept for diagnostics.
    ///
    /// Default: 10
    pub trace_depth: usize,

    /// Maximum evaluation nesting depth (for recursion protection).
    ///
    /// Default: 1000
    pub max_depth: usize,

    /// Show host-level error details when rendering diagnostics.
    ///
    /// Default: whether `FURIPOTA_DEBUG` is set in the environment.
    pub debug: bool,

    /// Open the `prelude` core module into the global environment.
    ///
    /// Default: true
    pub prelude: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            trace_depth: DEFAULT_TRACE_DEPTH,
            max_depth: 1000,
            debug: std::env::var_os("FURIPOTA_DEBUG").is_some(),
            prelude: true,
        }
    }
}

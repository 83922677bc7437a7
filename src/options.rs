pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Knobs for one rehydration pass.
#[derive(Debug, Clone)]
pub struct RehydrateOptions {
    /// Recursion guard for deeply nested inputs.
    pub max_depth: usize,
    /// When set, an object counts as a reference marker only if `$ref` is its
    /// sole member. The permissive default matches the original utility,
    /// which ignores any extra members.
    pub strict_markers: bool,
}

impl RehydrateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_strict_markers(mut self, strict_markers: bool) -> Self {
        self.strict_markers = strict_markers;
        self
    }
}

impl Default for RehydrateOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict_markers: false,
        }
    }
}

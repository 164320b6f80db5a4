// SEARCH MODE
// ================================================================================================

/// Fallback search strategy used by the front end when walking the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    TopDown,
    DivideAndQuery,
}

impl SearchMode {
    /// Parses the user-facing name of a search mode.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "top_down" => Some(SearchMode::TopDown),
            "divide_and_query" => Some(SearchMode::DivideAndQuery),
            _ => None,
        }
    }
}

// SESSION PARAMETERS
// ================================================================================================

/// Externally set knobs of a declarative debugging session.
#[derive(Debug, Clone, Copy)]
pub struct DeclDebugParams {
    /// Initial depth bound of a materialized subtree, and the number of ancestor levels each
    /// supertree request climbs.
    pub initial_depth_step_size: u64,
    /// Passed through to the replay mechanism; promises that every I/O action of the program is
    /// tabled and can be safely re-executed.
    pub assume_all_io_is_tabled: bool,
}

impl Default for DeclDebugParams {
    fn default() -> Self {
        Self { initial_depth_step_size: 3, assume_all_io_is_tabled: false }
    }
}

use alloc::sync::Arc;
use core::fmt;

// GOAL PATH
// ================================================================================================

/// A goal path: a `;`-delimited ASCII string locating a goal within a procedure body.
///
/// Each component is a maximal substring terminated by `;`, e.g. `"c2;"` (second conjunct),
/// `"d1;"` (first disjunct), `"c2;t;"` (then-branch of the if-then-else at the second conjunct).
/// Paths are compared byte-wise; they are never parsed into a structured form.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct GoalPath(Arc<str>);

impl GoalPath {
    /// Returns an empty goal path.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if this path and `other` denote goals in the same enclosing construct.
    pub fn same_construct(&self, other: &str) -> bool {
        same_construct(&self.0, other)
    }
}

impl From<&str> for GoalPath {
    fn from(path: &str) -> Self {
        Self(path.into())
    }
}

impl fmt::Debug for GoalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GoalPath({:?})", &*self.0)
    }
}

impl fmt::Display for GoalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// PREDICATES
// ================================================================================================

/// Checks whether two goal paths denote goals in the same enclosing construct.
///
/// The paths match iff they are byte-equal, or they agree up to their final component and each
/// has exactly one component remaining after the common prefix. A construct-entry path (the path
/// of the construct itself) also matches a path holding exactly one additional component: the
/// COND event of an if-then-else may carry the construct's own path while the THEN carries one
/// more component.
pub fn same_construct(p1: &str, p2: &str) -> bool {
    let a = p1.as_bytes();
    let b = p2.as_bytes();
    let common = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
    let rest1 = &a[common..];
    let rest2 = &b[common..];

    match (rest1.is_empty(), rest2.is_empty()) {
        // Identical paths.
        (true, true) => true,
        // One path extends the other by exactly one component.
        (true, false) => single_component(rest2),
        (false, true) => single_component(rest1),
        // Sibling components of one construct.
        (false, false) => single_component(rest1) && single_component(rest2),
    }
}

/// Returns true iff the path's terminal component is `"d1;"`, i.e. the event enters the first
/// disjunct of a disjunction.
pub fn is_first_disjunct(path: &str) -> bool {
    path.as_bytes().ends_with(b"d1;")
}

/// A single component: exactly one `;`, at the end of the string.
fn single_component(path: &[u8]) -> bool {
    match path.iter().position(|&b| b == b';') {
        Some(idx) => idx + 1 == path.len(),
        None => false,
    }
}

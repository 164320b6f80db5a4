use crate::store::NodeId;

// STORE ERRORS
// ================================================================================================

/// A typed store accessor was asked about a node of the wrong kind.
///
/// Every variant indicates that a store invariant has been broken: node kinds are fixed at
/// allocation and the construction rules only ever hand a matching kind to these accessors.
/// Callers treat these as unrecoverable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("node {0} is not a CALL node")]
    NotACallNode(NodeId),
    #[error("node {0} is not a COND node")]
    NotACondNode(NodeId),
    #[error("node {0} is not a NEG_ENTER node")]
    NotANegNode(NodeId),
    #[error("node {0} is not an interface event")]
    NotAnInterfaceEvent(NodeId),
    #[error("node {0} is not a DISJ node")]
    NotADisjNode(NodeId),
}

// CONTOUR ERRORS
// ================================================================================================

/// A contour traversal stepped where the tree has no node.
///
/// The construction rules guarantee that every pairing walk terminates inside the materialized
/// region; walking off it means the store holds a malformed tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContourError {
    #[error("no node left of {0} in the contour")]
    NoLeftNeighbor(NodeId),
    #[error("no contour precedes node {0}")]
    NoPrevContour(NodeId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

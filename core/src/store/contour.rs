use crate::{
    errors::ContourError,
    store::{NodeId, NodeStore, TraceNode},
};

// CONTOUR TRAVERSAL
// ================================================================================================
//
// The contour of an in-progress tree is the frontier of nodes whose bindings are still live:
// completed call regions hang below their final event, failed regions are dead, and walking
// leftward along the contour visits exactly the nodes a pairing search must consider. Both
// traversals here are read-only over the nodes but count as outward observations, so each step
// bumps the store's observation counter.

impl NodeStore {
    /// Steps one node leftward along the contour.
    ///
    /// A completed invocation (seen through its EXIT, FAIL or EXCP) is skipped as a whole: the
    /// step lands on whatever preceded its CALL. A REDO re-opens its invocation, so the step
    /// lands on the CALL itself. THEN and ELSE step to their COND (skipping the condition's
    /// events, which are dead after ELSE), NEG_SUCCESS and NEG_FAILURE to their NEG_ENTER, and
    /// every other node to its predecessor in construction order.
    pub fn step_left_in_contour(&self, node: NodeId) -> Result<NodeId, ContourError> {
        self.bump_version();
        let next = match &self[node] {
            TraceNode::Exit(n) => self[n.call()].prev(),
            TraceNode::Fail(n) => self[n.call()].prev(),
            TraceNode::Excp(n) => self[n.call()].prev(),
            TraceNode::Redo(n) => Some(n.call()),
            TraceNode::Then(n) => Some(n.cond()),
            TraceNode::Else(n) => Some(n.cond()),
            TraceNode::NegSuccess(n) => Some(n.neg()),
            TraceNode::NegFailure(n) => Some(n.neg()),
            other => other.prev(),
        };
        next.ok_or(ContourError::NoLeftNeighbor(node))
    }

    /// Steps out of the current open construct to the preceding complete contour.
    ///
    /// Used when a search must cross a failed attempt (REDO looking for the EXIT it re-enters,
    /// FAIL looking for its CALL) or a disjunction boundary (a later disjunct looking for an
    /// earlier one). For a FAIL or EXCP the preceding contour is whatever preceded the failed
    /// CALL; for a REDO it is the contour as it stood just before the EXIT being re-entered,
    /// whose interior is live again.
    pub fn find_prev_contour(&self, node: NodeId) -> Result<NodeId, ContourError> {
        self.bump_version();
        let next = match &self[node] {
            TraceNode::Fail(n) => self[n.call()].prev(),
            TraceNode::Excp(n) => self[n.call()].prev(),
            TraceNode::Redo(n) => self[n.prev_interface()].prev(),
            TraceNode::NegSuccess(n) => self[n.neg()].prev(),
            TraceNode::NegFailure(n) => self[n.neg()].prev(),
            TraceNode::Then(n) => Some(n.cond()),
            TraceNode::Else(n) => Some(n.cond()),
            other => other.prev(),
        };
        next.ok_or(ContourError::NoPrevContour(node))
    }
}

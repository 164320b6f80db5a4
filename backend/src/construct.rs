use edt_core::{
    GoalPath, Port, TraceAtom, TraceEvent, is_first_disjunct,
    errors::ContourError,
    store::{GoalStatus, NodeId, NodeStore, TraceNode},
};
use tracing::trace;

use crate::SessionError;

// NODE CONSTRUCTION
// ================================================================================================

/// Builds the node for an accepted event and splices it into the tree.
///
/// `prev` is the most recently constructed node; the new node's `prev` pointer links to it, and
/// every pairing search starts from it.
pub(crate) fn construct_node(
    store: &mut NodeStore,
    prev: Option<NodeId>,
    event: &TraceEvent<'_>,
    at_depth_limit: bool,
) -> Result<NodeId, SessionError> {
    let node = match event.port {
        Port::Call => call_node(store, prev, event, at_depth_limit),
        Port::Exit => exit_node(store, prev, event)?,
        Port::Redo => redo_node(store, prev, event)?,
        Port::Fail => fail_node(store, prev, event)?,
        Port::Exception => excp_node(store, prev, event)?,
        Port::Cond => store.new_cond(prev, event.event_number, event.goal_path.into()),
        Port::Then => then_node(store, prev, event)?,
        Port::Else => else_node(store, prev, event)?,
        Port::NegEnter => store.new_neg_enter(prev, event.event_number, event.goal_path.into()),
        Port::NegSuccess => neg_branch_node(store, prev, event, GoalStatus::Succeeded)?,
        Port::NegFailure => neg_branch_node(store, prev, event, GoalStatus::Failed)?,
        Port::Switch => store.new_switch(prev, event.event_number, event.goal_path.into()),
        Port::Disj => disj_node(store, prev, event)?,
        Port::PragmaFirst | Port::PragmaLater => {
            return Err(SessionError::ForeignCode { port: event.port });
        },
    };
    trace!(target: "edt::construct", node = %node, port = %event.port, "ALLOC");
    Ok(node)
}

fn call_node(
    store: &mut NodeStore,
    prev: Option<NodeId>,
    event: &TraceEvent<'_>,
    at_depth_limit: bool,
) -> NodeId {
    let atom = TraceAtom::capture(event.layout, event.regs, event.port);
    // The return goal path comes from one frame up the stack; it may be unavailable even when
    // the walk succeeds, e.g. inside the program entry point.
    let return_path = event.regs.caller_return_path().unwrap_or_else(GoalPath::empty);
    store.new_call(
        prev,
        event.event_number,
        atom,
        event.call_seqno,
        at_depth_limit,
        event.layout.body_rep.clone(),
        return_path,
        event.io_counter,
    )
}

fn exit_node(
    store: &mut NodeStore,
    prev: Option<NodeId>,
    event: &TraceEvent<'_>,
) -> Result<NodeId, SessionError> {
    let prev = current(prev, event)?;
    let atom = TraceAtom::capture(event.layout, event.regs, event.port);
    let call = matching_call(store, prev)?;
    let last_interface = store.get_last_interface(call)?;
    let node =
        store.new_exit(Some(prev), event.event_number, atom, call, last_interface, event.io_counter);
    store.set_last_interface(call, node)?;
    Ok(node)
}

fn redo_node(
    store: &mut NodeStore,
    prev: Option<NodeId>,
    event: &TraceEvent<'_>,
) -> Result<NodeId, SessionError> {
    let prev = current(prev, event)?;

    // Search the previous contour for the interface event this REDO re-enters: the matching
    // EXIT, or the CALL/FAIL of a first attempt that never exited. When no contour precedes the
    // current node, the search starts at the current node itself.
    trace!(target: "edt::construct", from = %prev, "FIND");
    let mut next = match store.find_prev_contour(prev) {
        Ok(node) => node,
        Err(ContourError::NoPrevContour(_)) => prev,
        Err(err) => return Err(err.into()),
    };
    let call = loop {
        if store[next].port().is_interface() && store.node_seqno(next)? == event.call_seqno {
            // EXIT/REDO/FAIL/EXCP carry their CALL; a CALL is its own match.
            break store[next].call_id().unwrap_or(next);
        }
        next = step_or(store, next, SessionError::NoMatchingExit { seqno: event.call_seqno })?;
    };
    trace!(target: "edt::construct", call = %call, "MATCH");

    let last_interface = store.get_last_interface(call)?;
    let node = store.new_redo(Some(prev), event.event_number, call, last_interface);
    store.set_last_interface(call, node)?;
    Ok(node)
}

fn fail_node(
    store: &mut NodeStore,
    prev: Option<NodeId>,
    event: &TraceEvent<'_>,
) -> Result<NodeId, SessionError> {
    let prev = current(prev, event)?;
    let call = if store[prev].port() == Port::Call {
        // The trivially failing call: prev is already the match.
        prev
    } else {
        let next = store.find_prev_contour(prev)?;
        matching_call(store, next)?
    };

    let last_interface = store.get_last_interface(call)?;
    let node = store.new_fail(Some(prev), event.event_number, call, last_interface);
    store.set_last_interface(call, node)?;
    Ok(node)
}

fn excp_node(
    store: &mut NodeStore,
    prev: Option<NodeId>,
    event: &TraceEvent<'_>,
) -> Result<NodeId, SessionError> {
    let prev = current(prev, event)?;
    let call = if store[prev].port() == Port::Call {
        prev
    } else {
        let next = store.find_prev_contour(prev)?;
        matching_call(store, next)?
    };

    let last_interface = store.get_last_interface(call)?;
    let exception = event.regs.exception_value();
    let node = store.new_excp(Some(prev), event.event_number, exception, call, last_interface);
    store.set_last_interface(call, node)?;
    Ok(node)
}

fn then_node(
    store: &mut NodeStore,
    prev: Option<NodeId>,
    event: &TraceEvent<'_>,
) -> Result<NodeId, SessionError> {
    let prev = current(prev, event)?;
    let cond = matching_cond(store, prev, event.goal_path)?;
    store.set_cond_status(cond, GoalStatus::Succeeded)?;
    Ok(store.new_then(Some(prev), event.event_number, cond))
}

fn else_node(
    store: &mut NodeStore,
    prev: Option<NodeId>,
    event: &TraceEvent<'_>,
) -> Result<NodeId, SessionError> {
    let prev = current(prev, event)?;
    let cond = matching_cond(store, prev, event.goal_path)?;
    store.set_cond_status(cond, GoalStatus::Failed)?;
    Ok(store.new_else(Some(prev), event.event_number, cond))
}

fn neg_branch_node(
    store: &mut NodeStore,
    prev: Option<NodeId>,
    event: &TraceEvent<'_>,
    status: GoalStatus,
) -> Result<NodeId, SessionError> {
    let prev = current(prev, event)?;
    let neg = matching_neg(store, prev, event.goal_path)?;
    store.set_neg_status(neg, status)?;
    let node = match status {
        GoalStatus::Succeeded => store.new_neg_success(Some(prev), event.event_number, neg),
        _ => store.new_neg_failure(Some(prev), event.event_number, neg),
    };
    Ok(node)
}

fn disj_node(
    store: &mut NodeStore,
    prev: Option<NodeId>,
    event: &TraceEvent<'_>,
) -> Result<NodeId, SessionError> {
    if is_first_disjunct(event.goal_path) {
        return Ok(store.new_first_disj(prev, event.event_number, event.goal_path.into()));
    }

    // A later disjunct: find a disjunct of the same disjunction in the previous contour, and
    // through it the disjunction's first disjunct.
    let prev = current(prev, event)?;
    trace!(target: "edt::construct", from = %prev, "FIND");
    let mut next = store.find_prev_contour(prev)?;
    let disj = loop {
        if matches!(&store[next], TraceNode::FirstDisj(_) | TraceNode::LaterDisj(_))
            && store[next].goal_path().is_some_and(|path| path.same_construct(event.goal_path))
        {
            break next;
        }
        next = store.step_left_in_contour(next)?;
    };
    trace!(target: "edt::construct", disj = %disj, "MATCH");

    let first = store.first_disj(disj)?.unwrap_or(disj);
    Ok(store.new_later_disj(Some(prev), event.event_number, event.goal_path.into(), first))
}

// PAIRING SEARCHES
// ================================================================================================

/// Walks leftward along the contour from `start` to the first CALL node. There is only one CALL
/// reachable this way: every completed region is skipped as a whole, so the walk lands on the
/// innermost open invocation.
fn matching_call(store: &NodeStore, start: NodeId) -> Result<NodeId, SessionError> {
    let mut node = start;
    loop {
        if store[node].port() == Port::Call {
            trace!(target: "edt::construct", call = %node, "MATCH");
            return Ok(node);
        }
        trace!(target: "edt::construct", node = %node, "STEP");
        node = store.step_left_in_contour(node)?;
    }
}

/// Walks leftward along the contour from `start` to the COND of the same construct as `path`.
fn matching_cond(store: &NodeStore, start: NodeId, path: &str) -> Result<NodeId, SessionError> {
    let mut node = start;
    loop {
        if let TraceNode::Cond(cond) = &store[node]
            && cond.path().same_construct(path)
        {
            trace!(target: "edt::construct", cond = %node, "MATCH");
            return Ok(node);
        }
        node = store.step_left_in_contour(node)?;
    }
}

/// Walks leftward along the contour from `start` to the NEG_ENTER of the same construct.
fn matching_neg(store: &NodeStore, start: NodeId, path: &str) -> Result<NodeId, SessionError> {
    let mut node = start;
    loop {
        if let TraceNode::NegEnter(neg) = &store[node]
            && neg.path().same_construct(path)
        {
            trace!(target: "edt::construct", neg = %node, "MATCH");
            return Ok(node);
        }
        node = store.step_left_in_contour(node)?;
    }
}

// HELPERS
// ================================================================================================

fn current(prev: Option<NodeId>, event: &TraceEvent<'_>) -> Result<NodeId, SessionError> {
    prev.ok_or(SessionError::NoCurrentNode { port: event.port })
}

fn step_or(store: &NodeStore, node: NodeId, on_exhausted: SessionError) -> Result<NodeId, SessionError> {
    match store.step_left_in_contour(node) {
        Ok(next) => Ok(next),
        Err(ContourError::NoLeftNeighbor(_)) => Err(on_exhausted),
        Err(err) => Err(err.into()),
    }
}

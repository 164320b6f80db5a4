use crate::{BodyRep, GoalPath, Port, TraceAtom, Univ, store::NodeId};

// GOAL STATUS
// ================================================================================================

/// Outcome recorded on a COND or NEG_ENTER node once the matching branch event arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalStatus {
    Undecided,
    Succeeded,
    Failed,
}

// NODE PAYLOADS
// ================================================================================================

/// A procedure invocation. The root of every materialized subtree is a CALL.
///
/// `last_interface` is the head of the interface chain: it points at the most recently
/// constructed interface event of this invocation and is updated every time an EXIT, REDO, FAIL
/// or EXCP is spliced in. At allocation it points at the CALL itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallNode {
    pub(super) prev: Option<NodeId>,
    pub(super) event_number: u64,
    pub(super) atom: TraceAtom,
    pub(super) call_seqno: u64,
    pub(super) at_depth_limit: bool,
    pub(super) body: Option<BodyRep>,
    /// Goal path of the call site in the caller; empty when unavailable.
    pub(super) return_path: GoalPath,
    pub(super) io_counter: u64,
    pub(super) last_interface: NodeId,
}

impl CallNode {
    pub fn atom(&self) -> &TraceAtom {
        &self.atom
    }

    pub fn call_seqno(&self) -> u64 {
        self.call_seqno
    }

    pub fn at_depth_limit(&self) -> bool {
        self.at_depth_limit
    }

    pub fn body(&self) -> Option<&BodyRep> {
        self.body.as_ref()
    }

    pub fn return_path(&self) -> &GoalPath {
        &self.return_path
    }

    pub fn io_counter(&self) -> u64 {
        self.io_counter
    }

    pub fn last_interface(&self) -> NodeId {
        self.last_interface
    }
}

/// A successful completion of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitNode {
    pub(super) prev: Option<NodeId>,
    pub(super) event_number: u64,
    pub(super) atom: TraceAtom,
    pub(super) call: NodeId,
    /// The CALL's `last_interface` at the moment this node was created; together these form a
    /// linked chain through the invocation's interface events, ending at the CALL.
    pub(super) prev_interface: NodeId,
    pub(super) io_counter: u64,
}

impl ExitNode {
    pub fn atom(&self) -> &TraceAtom {
        &self.atom
    }

    pub fn call(&self) -> NodeId {
        self.call
    }

    pub fn prev_interface(&self) -> NodeId {
        self.prev_interface
    }

    pub fn io_counter(&self) -> u64 {
        self.io_counter
    }
}

/// A re-entry into a completed invocation on backtracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedoNode {
    pub(super) prev: Option<NodeId>,
    pub(super) event_number: u64,
    pub(super) call: NodeId,
    pub(super) prev_interface: NodeId,
}

impl RedoNode {
    pub fn call(&self) -> NodeId {
        self.call
    }

    pub fn prev_interface(&self) -> NodeId {
        self.prev_interface
    }
}

/// A failed completion of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailNode {
    pub(super) prev: Option<NodeId>,
    pub(super) event_number: u64,
    pub(super) call: NodeId,
    pub(super) prev_interface: NodeId,
}

impl FailNode {
    pub fn call(&self) -> NodeId {
        self.call
    }

    pub fn prev_interface(&self) -> NodeId {
        self.prev_interface
    }
}

/// An exception propagating out of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcpNode {
    pub(super) prev: Option<NodeId>,
    pub(super) event_number: u64,
    pub(super) exception: Univ,
    pub(super) call: NodeId,
    pub(super) prev_interface: NodeId,
}

impl ExcpNode {
    pub fn exception(&self) -> &Univ {
        &self.exception
    }

    pub fn call(&self) -> NodeId {
        self.call
    }

    pub fn prev_interface(&self) -> NodeId {
        self.prev_interface
    }
}

/// Entry to the condition of an if-then-else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondNode {
    pub(super) prev: Option<NodeId>,
    pub(super) event_number: u64,
    pub(super) path: GoalPath,
    pub(super) status: GoalStatus,
}

impl CondNode {
    pub fn path(&self) -> &GoalPath {
        &self.path
    }

    pub fn status(&self) -> GoalStatus {
        self.status
    }
}

/// Entry to a then-branch; resolves its COND to SUCCEEDED.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThenNode {
    pub(super) prev: Option<NodeId>,
    pub(super) event_number: u64,
    pub(super) cond: NodeId,
}

impl ThenNode {
    pub fn cond(&self) -> NodeId {
        self.cond
    }
}

/// Entry to an else-branch; resolves its COND to FAILED.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElseNode {
    pub(super) prev: Option<NodeId>,
    pub(super) event_number: u64,
    pub(super) cond: NodeId,
}

impl ElseNode {
    pub fn cond(&self) -> NodeId {
        self.cond
    }
}

/// Entry to a negated goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegEnterNode {
    pub(super) prev: Option<NodeId>,
    pub(super) event_number: u64,
    pub(super) path: GoalPath,
    pub(super) status: GoalStatus,
}

impl NegEnterNode {
    pub fn path(&self) -> &GoalPath {
        &self.path
    }

    pub fn status(&self) -> GoalStatus {
        self.status
    }
}

/// A negation succeeded (the negated goal failed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegSuccessNode {
    pub(super) prev: Option<NodeId>,
    pub(super) event_number: u64,
    pub(super) neg: NodeId,
}

impl NegSuccessNode {
    pub fn neg(&self) -> NodeId {
        self.neg
    }
}

/// A negation failed (the negated goal succeeded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegFailureNode {
    pub(super) prev: Option<NodeId>,
    pub(super) event_number: u64,
    pub(super) neg: NodeId,
}

impl NegFailureNode {
    pub fn neg(&self) -> NodeId {
        self.neg
    }
}

/// Entry to a switch arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchNode {
    pub(super) prev: Option<NodeId>,
    pub(super) event_number: u64,
    pub(super) path: GoalPath,
}

impl SwitchNode {
    pub fn path(&self) -> &GoalPath {
        &self.path
    }
}

/// Entry to the first disjunct of a disjunction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstDisjNode {
    pub(super) prev: Option<NodeId>,
    pub(super) event_number: u64,
    pub(super) path: GoalPath,
}

impl FirstDisjNode {
    pub fn path(&self) -> &GoalPath {
        &self.path
    }
}

/// Entry to a later disjunct; back-points at the disjunction's first disjunct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaterDisjNode {
    pub(super) prev: Option<NodeId>,
    pub(super) event_number: u64,
    pub(super) path: GoalPath,
    pub(super) first_disj: NodeId,
}

impl LaterDisjNode {
    pub fn path(&self) -> &GoalPath {
        &self.path
    }

    pub fn first_disj(&self) -> NodeId {
        self.first_disj
    }
}

// TRACE NODE
// ================================================================================================

/// A node of the execution dependency tree.
///
/// The kinds are a closed set; cross-references are `NodeId`s into the owning store, never
/// pointers, so the graph (a DAG through the back edges) carries no lifetime obligations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceNode {
    Call(CallNode),
    Exit(ExitNode),
    Redo(RedoNode),
    Fail(FailNode),
    Excp(ExcpNode),
    Cond(CondNode),
    Then(ThenNode),
    Else(ElseNode),
    NegEnter(NegEnterNode),
    NegSuccess(NegSuccessNode),
    NegFailure(NegFailureNode),
    Switch(SwitchNode),
    FirstDisj(FirstDisjNode),
    LaterDisj(LaterDisjNode),
}

impl TraceNode {
    /// Returns the port of the event this node was created for.
    pub fn port(&self) -> Port {
        match self {
            TraceNode::Call(_) => Port::Call,
            TraceNode::Exit(_) => Port::Exit,
            TraceNode::Redo(_) => Port::Redo,
            TraceNode::Fail(_) => Port::Fail,
            TraceNode::Excp(_) => Port::Exception,
            TraceNode::Cond(_) => Port::Cond,
            TraceNode::Then(_) => Port::Then,
            TraceNode::Else(_) => Port::Else,
            TraceNode::NegEnter(_) => Port::NegEnter,
            TraceNode::NegSuccess(_) => Port::NegSuccess,
            TraceNode::NegFailure(_) => Port::NegFailure,
            TraceNode::Switch(_) => Port::Switch,
            TraceNode::FirstDisj(_) | TraceNode::LaterDisj(_) => Port::Disj,
        }
    }

    /// Returns the node constructed immediately before this one, or `None` for the first node of
    /// a collection.
    pub fn prev(&self) -> Option<NodeId> {
        match self {
            TraceNode::Call(n) => n.prev,
            TraceNode::Exit(n) => n.prev,
            TraceNode::Redo(n) => n.prev,
            TraceNode::Fail(n) => n.prev,
            TraceNode::Excp(n) => n.prev,
            TraceNode::Cond(n) => n.prev,
            TraceNode::Then(n) => n.prev,
            TraceNode::Else(n) => n.prev,
            TraceNode::NegEnter(n) => n.prev,
            TraceNode::NegSuccess(n) => n.prev,
            TraceNode::NegFailure(n) => n.prev,
            TraceNode::Switch(n) => n.prev,
            TraceNode::FirstDisj(n) => n.prev,
            TraceNode::LaterDisj(n) => n.prev,
        }
    }

    /// Returns the event number at which this node was created.
    pub fn event_number(&self) -> u64 {
        match self {
            TraceNode::Call(n) => n.event_number,
            TraceNode::Exit(n) => n.event_number,
            TraceNode::Redo(n) => n.event_number,
            TraceNode::Fail(n) => n.event_number,
            TraceNode::Excp(n) => n.event_number,
            TraceNode::Cond(n) => n.event_number,
            TraceNode::Then(n) => n.event_number,
            TraceNode::Else(n) => n.event_number,
            TraceNode::NegEnter(n) => n.event_number,
            TraceNode::NegSuccess(n) => n.event_number,
            TraceNode::NegFailure(n) => n.event_number,
            TraceNode::Switch(n) => n.event_number,
            TraceNode::FirstDisj(n) => n.event_number,
            TraceNode::LaterDisj(n) => n.event_number,
        }
    }

    /// Returns the goal path carried by this node, if its kind records one.
    pub fn goal_path(&self) -> Option<&GoalPath> {
        match self {
            TraceNode::Cond(n) => Some(&n.path),
            TraceNode::NegEnter(n) => Some(&n.path),
            TraceNode::Switch(n) => Some(&n.path),
            TraceNode::FirstDisj(n) => Some(&n.path),
            TraceNode::LaterDisj(n) => Some(&n.path),
            _ => None,
        }
    }

    /// Returns the CALL back-pointer of an EXIT, REDO, FAIL or EXCP node.
    pub fn call_id(&self) -> Option<NodeId> {
        match self {
            TraceNode::Exit(n) => Some(n.call),
            TraceNode::Redo(n) => Some(n.call),
            TraceNode::Fail(n) => Some(n.call),
            TraceNode::Excp(n) => Some(n.call),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&CallNode> {
        match self {
            TraceNode::Call(n) => Some(n),
            _ => None,
        }
    }
}

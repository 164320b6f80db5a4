use alloc::vec::Vec;
use core::{cell::Cell, fmt, ops::Index};

use crate::{
    BodyRep, GoalPath, TraceAtom, Univ,
    errors::StoreError,
    utils::DeserializationError,
};

mod contour;

mod node;
pub use node::{
    CallNode, CondNode, ElseNode, ExcpNode, ExitNode, FailNode, FirstDisjNode, GoalStatus,
    LaterDisjNode, NegEnterNode, NegFailureNode, NegSuccessNode, RedoNode, SwitchNode, ThenNode,
    TraceNode,
};

mod serialization;
pub use serialization::{TraceDump, write_trace};


// NODE ID
// ================================================================================================

/// Stable handle of a node in a [`NodeStore`].
///
/// Ids are issued by the store in allocation order and stay valid for the lifetime of the store;
/// nodes are never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns a new `NodeId` for a node in a store holding `node_count` nodes.
    ///
    /// Used during deserialization, where ids arrive from outside the store.
    pub fn from_u32_with_node_count(
        value: u32,
        node_count: usize,
    ) -> Result<Self, DeserializationError> {
        if (value as usize) < node_count {
            Ok(Self(value))
        } else {
            Err(DeserializationError::InvalidValue(format!(
                "node id {value} is out of range for a store of {node_count} nodes"
            )))
        }
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn to_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// NODE STORE
// ================================================================================================

/// Arena holding every node of one debugging session's materialized tree fragments.
///
/// The store is the exclusive owner of node storage; all cross-references between nodes are
/// [`NodeId`]s into it, and the whole arena is freed at once when the session ends. Nodes are
/// appended in event order and never removed.
///
/// `version` is the observation counter read by the front end to detect staleness of memoized
/// node positions. It is incremented before every operation that exposes node handles to a
/// client outside the store, which includes the read-only contour traversals; a
/// [`Cell`] keeps those traversals borrow-compatible with the single-threaded, strictly
/// cooperative execution model.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: Vec<TraceNode>,
    version: Cell<u64>,
}

impl NodeStore {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node with the given id, or `None` if the id was issued by a different store.
    pub fn get(&self, id: NodeId) -> Option<&TraceNode> {
        self.nodes.get(id.to_usize())
    }

    /// Iterates over `(id, node)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TraceNode)> {
        self.nodes.iter().enumerate().map(|(idx, node)| (NodeId(idx as u32), node))
    }

    /// Returns the current observation counter.
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    /// Increments and returns the observation counter. Called before every outbound call that
    /// conveys a node handle to a consumer that memoizes node positions.
    pub fn bump_version(&self) -> u64 {
        let next = self.version.get() + 1;
        self.version.set(next);
        next
    }

    // NODE CONSTRUCTORS
    // --------------------------------------------------------------------------------------------
    //
    // Each constructor appends a node and returns its id. Allocation cannot fail short of the
    // process running out of memory.

    #[allow(clippy::too_many_arguments)]
    pub fn new_call(
        &mut self,
        prev: Option<NodeId>,
        event_number: u64,
        atom: TraceAtom,
        call_seqno: u64,
        at_depth_limit: bool,
        body: Option<BodyRep>,
        return_path: GoalPath,
        io_counter: u64,
    ) -> NodeId {
        // A fresh CALL is its own most recent interface event.
        let id = self.next_id();
        self.push(TraceNode::Call(CallNode {
            prev,
            event_number,
            atom,
            call_seqno,
            at_depth_limit,
            body,
            return_path,
            io_counter,
            last_interface: id,
        }))
    }

    pub fn new_exit(
        &mut self,
        prev: Option<NodeId>,
        event_number: u64,
        atom: TraceAtom,
        call: NodeId,
        prev_interface: NodeId,
        io_counter: u64,
    ) -> NodeId {
        self.push(TraceNode::Exit(ExitNode {
            prev,
            event_number,
            atom,
            call,
            prev_interface,
            io_counter,
        }))
    }

    pub fn new_redo(
        &mut self,
        prev: Option<NodeId>,
        event_number: u64,
        call: NodeId,
        prev_interface: NodeId,
    ) -> NodeId {
        self.push(TraceNode::Redo(RedoNode { prev, event_number, call, prev_interface }))
    }

    pub fn new_fail(
        &mut self,
        prev: Option<NodeId>,
        event_number: u64,
        call: NodeId,
        prev_interface: NodeId,
    ) -> NodeId {
        self.push(TraceNode::Fail(FailNode { prev, event_number, call, prev_interface }))
    }

    pub fn new_excp(
        &mut self,
        prev: Option<NodeId>,
        event_number: u64,
        exception: Univ,
        call: NodeId,
        prev_interface: NodeId,
    ) -> NodeId {
        self.push(TraceNode::Excp(ExcpNode { prev, event_number, exception, call, prev_interface }))
    }

    pub fn new_cond(&mut self, prev: Option<NodeId>, event_number: u64, path: GoalPath) -> NodeId {
        self.push(TraceNode::Cond(CondNode {
            prev,
            event_number,
            path,
            status: GoalStatus::Undecided,
        }))
    }

    pub fn new_then(&mut self, prev: Option<NodeId>, event_number: u64, cond: NodeId) -> NodeId {
        self.push(TraceNode::Then(ThenNode { prev, event_number, cond }))
    }

    pub fn new_else(&mut self, prev: Option<NodeId>, event_number: u64, cond: NodeId) -> NodeId {
        self.push(TraceNode::Else(ElseNode { prev, event_number, cond }))
    }

    pub fn new_neg_enter(
        &mut self,
        prev: Option<NodeId>,
        event_number: u64,
        path: GoalPath,
    ) -> NodeId {
        self.push(TraceNode::NegEnter(NegEnterNode {
            prev,
            event_number,
            path,
            status: GoalStatus::Undecided,
        }))
    }

    pub fn new_neg_success(
        &mut self,
        prev: Option<NodeId>,
        event_number: u64,
        neg: NodeId,
    ) -> NodeId {
        self.push(TraceNode::NegSuccess(NegSuccessNode { prev, event_number, neg }))
    }

    pub fn new_neg_failure(
        &mut self,
        prev: Option<NodeId>,
        event_number: u64,
        neg: NodeId,
    ) -> NodeId {
        self.push(TraceNode::NegFailure(NegFailureNode { prev, event_number, neg }))
    }

    pub fn new_switch(&mut self, prev: Option<NodeId>, event_number: u64, path: GoalPath) -> NodeId {
        self.push(TraceNode::Switch(SwitchNode { prev, event_number, path }))
    }

    pub fn new_first_disj(
        &mut self,
        prev: Option<NodeId>,
        event_number: u64,
        path: GoalPath,
    ) -> NodeId {
        self.push(TraceNode::FirstDisj(FirstDisjNode { prev, event_number, path }))
    }

    pub fn new_later_disj(
        &mut self,
        prev: Option<NodeId>,
        event_number: u64,
        path: GoalPath,
        first_disj: NodeId,
    ) -> NodeId {
        self.push(TraceNode::LaterDisj(LaterDisjNode { prev, event_number, path, first_disj }))
    }

    // INTERFACE CHAIN
    // --------------------------------------------------------------------------------------------

    /// Returns the most recent interface event of the given CALL.
    pub fn get_last_interface(&self, call: NodeId) -> Result<NodeId, StoreError> {
        match &self[call] {
            TraceNode::Call(node) => Ok(node.last_interface),
            _ => Err(StoreError::NotACallNode(call)),
        }
    }

    /// Records `interface` as the most recent interface event of the given CALL.
    pub fn set_last_interface(
        &mut self,
        call: NodeId,
        interface: NodeId,
    ) -> Result<(), StoreError> {
        match &mut self.nodes[call.to_usize()] {
            TraceNode::Call(node) => {
                node.last_interface = interface;
                Ok(())
            },
            _ => Err(StoreError::NotACallNode(call)),
        }
    }

    // STATUS MUTATORS
    // --------------------------------------------------------------------------------------------

    pub fn set_cond_status(&mut self, cond: NodeId, status: GoalStatus) -> Result<(), StoreError> {
        match &mut self.nodes[cond.to_usize()] {
            TraceNode::Cond(node) => {
                node.status = status;
                Ok(())
            },
            _ => Err(StoreError::NotACondNode(cond)),
        }
    }

    pub fn set_neg_status(&mut self, neg: NodeId, status: GoalStatus) -> Result<(), StoreError> {
        match &mut self.nodes[neg.to_usize()] {
            TraceNode::NegEnter(node) => {
                node.status = status;
                Ok(())
            },
            _ => Err(StoreError::NotANegNode(neg)),
        }
    }

    // NODE QUERIES
    // --------------------------------------------------------------------------------------------

    /// Returns the call seqno of an interface node, resolving EXIT/REDO/FAIL/EXCP through their
    /// CALL back-pointer.
    ///
    /// Bumps the observation counter: seqno lookups are performed on behalf of position-memoizing
    /// consumers.
    pub fn node_seqno(&self, id: NodeId) -> Result<u64, StoreError> {
        self.bump_version();
        let call = match &self[id] {
            TraceNode::Call(node) => return Ok(node.call_seqno),
            node => node.call_id().ok_or(StoreError::NotAnInterfaceEvent(id))?,
        };
        match &self[call] {
            TraceNode::Call(node) => Ok(node.call_seqno),
            _ => Err(StoreError::NotACallNode(call)),
        }
    }

    /// Returns the first-disjunct back-pointer of a DISJ node: `None` for a FIRST_DISJ, the
    /// recorded pointer for a LATER_DISJ.
    pub fn first_disj(&self, id: NodeId) -> Result<Option<NodeId>, StoreError> {
        match &self[id] {
            TraceNode::FirstDisj(_) => Ok(None),
            TraceNode::LaterDisj(node) => Ok(Some(node.first_disj)),
            _ => Err(StoreError::NotADisjNode(id)),
        }
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len() as u32)
    }

    fn push(&mut self, node: TraceNode) -> NodeId {
        let id = self.next_id();
        self.nodes.push(node);
        id
    }
}

impl Index<NodeId> for NodeStore {
    type Output = TraceNode;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.to_usize()]
    }
}

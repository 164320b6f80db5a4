use alloc::{string::String, vec::Vec};

use winter_utils::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable};

use crate::{
    AtomArg, BodyRep, GoalPath, PredFunc, ProcId, TraceAtom, Univ,
    store::{GoalStatus, NodeId, NodeStore, TraceNode},
};

// CONSTANTS
// ================================================================================================

/// Magic bytes opening a serialized trace dump.
const MAGIC: &[u8; 4] = b"EDT\0";

/// Version of the dump format.
const FORMAT_VERSION: u32 = 1;

// Node tags.
const CALL: u8 = 0;
const EXIT: u8 = 1;
const REDO: u8 = 2;
const FAIL: u8 = 3;
const EXCP: u8 = 4;
const COND: u8 = 5;
const THEN: u8 = 6;
const ELSE: u8 = 7;
const NEG_ENTER: u8 = 8;
const NEG_SUCCESS: u8 = 9;
const NEG_FAILURE: u8 = 10;
const SWITCH: u8 = 11;
const FIRST_DISJ: u8 = 12;
const LATER_DISJ: u8 = 13;

// TRACE DUMP
// ================================================================================================

/// A completed store plus its root, as written to the dump sink.
///
/// The format is consumed by external tooling only; its sole contract here is that it
/// round-trips: parsing a dump reproduces the same node graph.
#[derive(Debug)]
pub struct TraceDump {
    pub store: NodeStore,
    pub root: NodeId,
}

impl Serializable for TraceDump {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        write_trace(target, &self.store, self.root);
    }
}

/// Writes a store and its root in the dump format, without taking ownership of either.
pub fn write_trace<W: ByteWriter>(target: &mut W, store: &NodeStore, root: NodeId) {
    target.write_bytes(MAGIC);
    target.write_u32(FORMAT_VERSION);
    target.write_u32(root.as_u32());
    store.write_into(target);
}

impl Deserializable for TraceDump {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let magic = source.read_vec(MAGIC.len())?;
        if magic.as_slice() != MAGIC.as_slice() {
            return Err(DeserializationError::InvalidValue(format!(
                "invalid dump magic: {magic:x?}"
            )));
        }
        let version = source.read_u32()?;
        if version != FORMAT_VERSION {
            return Err(DeserializationError::InvalidValue(format!(
                "unsupported dump format version {version}"
            )));
        }
        let root = source.read_u32()?;
        let store = NodeStore::read_from(source)?;
        let root = NodeId::from_u32_with_node_count(root, store.len())?;
        Ok(Self { store, root })
    }
}

// NODE STORE
// ================================================================================================

impl Serializable for NodeStore {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u32(self.len() as u32);
        for (_, node) in self.iter() {
            write_node(target, node);
        }
    }
}

impl Deserializable for NodeStore {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let node_count = source.read_u32()? as usize;
        let mut nodes = Vec::with_capacity(node_count);
        for _ in 0..node_count {
            nodes.push(read_node(source, node_count)?);
        }

        let mut store = NodeStore::new();
        for node in nodes {
            store.push_deserialized(node);
        }
        Ok(store)
    }
}

impl NodeStore {
    /// Appends a node rebuilt from a dump, bypassing the typed constructors.
    fn push_deserialized(&mut self, node: TraceNode) {
        self.push(node);
    }
}

fn write_node<W: ByteWriter>(target: &mut W, node: &TraceNode) {
    match node {
        TraceNode::Call(n) => {
            target.write_u8(CALL);
            write_opt_id(target, n.prev);
            target.write_u64(n.event_number);
            n.atom().write_into(target);
            target.write_u64(n.call_seqno());
            write_flag(target, n.at_depth_limit());
            write_opt_body(target, n.body());
            write_str(target, n.return_path().as_str());
            target.write_u64(n.io_counter());
            target.write_u32(n.last_interface().as_u32());
        },
        TraceNode::Exit(n) => {
            target.write_u8(EXIT);
            write_opt_id(target, n.prev);
            target.write_u64(n.event_number);
            n.atom().write_into(target);
            target.write_u32(n.call().as_u32());
            target.write_u32(n.prev_interface().as_u32());
            target.write_u64(n.io_counter());
        },
        TraceNode::Redo(n) => {
            target.write_u8(REDO);
            write_opt_id(target, n.prev);
            target.write_u64(n.event_number);
            target.write_u32(n.call().as_u32());
            target.write_u32(n.prev_interface().as_u32());
        },
        TraceNode::Fail(n) => {
            target.write_u8(FAIL);
            write_opt_id(target, n.prev);
            target.write_u64(n.event_number);
            target.write_u32(n.call().as_u32());
            target.write_u32(n.prev_interface().as_u32());
        },
        TraceNode::Excp(n) => {
            target.write_u8(EXCP);
            write_opt_id(target, n.prev);
            target.write_u64(n.event_number);
            n.exception().write_into(target);
            target.write_u32(n.call().as_u32());
            target.write_u32(n.prev_interface().as_u32());
        },
        TraceNode::Cond(n) => {
            target.write_u8(COND);
            write_opt_id(target, n.prev);
            target.write_u64(n.event_number);
            write_str(target, n.path().as_str());
            n.status().write_into(target);
        },
        TraceNode::Then(n) => {
            target.write_u8(THEN);
            write_opt_id(target, n.prev);
            target.write_u64(n.event_number);
            target.write_u32(n.cond().as_u32());
        },
        TraceNode::Else(n) => {
            target.write_u8(ELSE);
            write_opt_id(target, n.prev);
            target.write_u64(n.event_number);
            target.write_u32(n.cond().as_u32());
        },
        TraceNode::NegEnter(n) => {
            target.write_u8(NEG_ENTER);
            write_opt_id(target, n.prev);
            target.write_u64(n.event_number);
            write_str(target, n.path().as_str());
            n.status().write_into(target);
        },
        TraceNode::NegSuccess(n) => {
            target.write_u8(NEG_SUCCESS);
            write_opt_id(target, n.prev);
            target.write_u64(n.event_number);
            target.write_u32(n.neg().as_u32());
        },
        TraceNode::NegFailure(n) => {
            target.write_u8(NEG_FAILURE);
            write_opt_id(target, n.prev);
            target.write_u64(n.event_number);
            target.write_u32(n.neg().as_u32());
        },
        TraceNode::Switch(n) => {
            target.write_u8(SWITCH);
            write_opt_id(target, n.prev);
            target.write_u64(n.event_number);
            write_str(target, n.path().as_str());
        },
        TraceNode::FirstDisj(n) => {
            target.write_u8(FIRST_DISJ);
            write_opt_id(target, n.prev);
            target.write_u64(n.event_number);
            write_str(target, n.path().as_str());
        },
        TraceNode::LaterDisj(n) => {
            target.write_u8(LATER_DISJ);
            write_opt_id(target, n.prev);
            target.write_u64(n.event_number);
            write_str(target, n.path().as_str());
            target.write_u32(n.first_disj().as_u32());
        },
    }
}

fn read_node<R: ByteReader>(
    source: &mut R,
    node_count: usize,
) -> Result<TraceNode, DeserializationError> {
    use crate::store::node::*;

    let tag = source.read_u8()?;
    let prev = read_opt_id(source, node_count)?;
    let event_number = source.read_u64()?;
    let id = |source: &mut R| -> Result<NodeId, DeserializationError> {
        NodeId::from_u32_with_node_count(source.read_u32()?, node_count)
    };

    let node = match tag {
        CALL => {
            let atom = TraceAtom::read_from(source)?;
            let call_seqno = source.read_u64()?;
            let at_depth_limit = read_flag(source)?;
            let body = read_opt_body(source)?;
            let return_path = read_path(source)?;
            let io_counter = source.read_u64()?;
            let last_interface = id(source)?;
            TraceNode::Call(CallNode {
                prev,
                event_number,
                atom,
                call_seqno,
                at_depth_limit,
                body,
                return_path,
                io_counter,
                last_interface,
            })
        },
        EXIT => {
            let atom = TraceAtom::read_from(source)?;
            let call = id(source)?;
            let prev_interface = id(source)?;
            let io_counter = source.read_u64()?;
            TraceNode::Exit(ExitNode { prev, event_number, atom, call, prev_interface, io_counter })
        },
        REDO => {
            let call = id(source)?;
            let prev_interface = id(source)?;
            TraceNode::Redo(RedoNode { prev, event_number, call, prev_interface })
        },
        FAIL => {
            let call = id(source)?;
            let prev_interface = id(source)?;
            TraceNode::Fail(FailNode { prev, event_number, call, prev_interface })
        },
        EXCP => {
            let exception = Univ::read_from(source)?;
            let call = id(source)?;
            let prev_interface = id(source)?;
            TraceNode::Excp(ExcpNode { prev, event_number, exception, call, prev_interface })
        },
        COND => {
            let path = read_path(source)?;
            let status = GoalStatus::read_from(source)?;
            TraceNode::Cond(CondNode { prev, event_number, path, status })
        },
        THEN => TraceNode::Then(ThenNode { prev, event_number, cond: id(source)? }),
        ELSE => TraceNode::Else(ElseNode { prev, event_number, cond: id(source)? }),
        NEG_ENTER => {
            let path = read_path(source)?;
            let status = GoalStatus::read_from(source)?;
            TraceNode::NegEnter(NegEnterNode { prev, event_number, path, status })
        },
        NEG_SUCCESS => TraceNode::NegSuccess(NegSuccessNode { prev, event_number, neg: id(source)? }),
        NEG_FAILURE => TraceNode::NegFailure(NegFailureNode { prev, event_number, neg: id(source)? }),
        SWITCH => TraceNode::Switch(SwitchNode { prev, event_number, path: read_path(source)? }),
        FIRST_DISJ => {
            TraceNode::FirstDisj(FirstDisjNode { prev, event_number, path: read_path(source)? })
        },
        LATER_DISJ => {
            let path = read_path(source)?;
            let first_disj = id(source)?;
            TraceNode::LaterDisj(LaterDisjNode { prev, event_number, path, first_disj })
        },
        _ => {
            return Err(DeserializationError::InvalidValue(format!("invalid node tag: {tag}")));
        },
    };
    Ok(node)
}

// COMPONENT TYPES
// ================================================================================================

impl Serializable for Univ {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        write_str(target, self.type_name());
        write_bytes(target, self.value());
    }
}

impl Deserializable for Univ {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let type_name = read_string(source)?;
        let value = read_bytes(source)?;
        Ok(Univ::new(&type_name, value))
    }
}

impl Serializable for ProcId {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        write_str(target, &self.module);
        write_str(target, &self.name);
        target.write_u16(self.arity);
        target.write_u8(match self.kind {
            PredFunc::Predicate => 0,
            PredFunc::Function => 1,
        });
    }
}

impl Deserializable for ProcId {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let module = read_string(source)?;
        let name = read_string(source)?;
        let arity = source.read_u16()?;
        let kind = match source.read_u8()? {
            0 => PredFunc::Predicate,
            1 => PredFunc::Function,
            other => {
                return Err(DeserializationError::InvalidValue(format!(
                    "invalid pred/func marker: {other}"
                )));
            },
        };
        Ok(ProcId::new(&module, &name, arity, kind))
    }
}

impl Serializable for TraceAtom {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.proc().write_into(target);
        target.write_u32(self.args().len() as u32);
        for arg in self.args() {
            target.write_u16(arg.hlds_num);
            write_flag(target, arg.prog_visible);
            match &arg.value {
                Some(value) => {
                    target.write_u8(1);
                    value.write_into(target);
                },
                None => target.write_u8(0),
            }
        }
    }
}

impl Deserializable for TraceAtom {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let proc = ProcId::read_from(source)?;
        let num_args = source.read_u32()? as usize;
        let mut args = Vec::with_capacity(num_args);
        for _ in 0..num_args {
            let hlds_num = source.read_u16()?;
            let prog_visible = read_flag(source)?;
            let value = match source.read_u8()? {
                0 => None,
                1 => Some(Univ::read_from(source)?),
                other => {
                    return Err(DeserializationError::InvalidValue(format!(
                        "invalid value marker: {other}"
                    )));
                },
            };
            args.push(AtomArg { hlds_num, prog_visible, value });
        }
        Ok(TraceAtom::from_parts(proc, args))
    }
}

impl Serializable for GoalStatus {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u8(match self {
            GoalStatus::Undecided => 0,
            GoalStatus::Succeeded => 1,
            GoalStatus::Failed => 2,
        });
    }
}

impl Deserializable for GoalStatus {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        match source.read_u8()? {
            0 => Ok(GoalStatus::Undecided),
            1 => Ok(GoalStatus::Succeeded),
            2 => Ok(GoalStatus::Failed),
            other => {
                Err(DeserializationError::InvalidValue(format!("invalid goal status: {other}")))
            },
        }
    }
}

// HELPERS
// ================================================================================================

fn write_str<W: ByteWriter>(target: &mut W, value: &str) {
    write_bytes(target, value.as_bytes());
}

fn write_bytes<W: ByteWriter>(target: &mut W, value: &[u8]) {
    target.write_u32(value.len() as u32);
    target.write_bytes(value);
}

fn write_flag<W: ByteWriter>(target: &mut W, value: bool) {
    target.write_u8(value as u8);
}

fn write_opt_id<W: ByteWriter>(target: &mut W, id: Option<NodeId>) {
    match id {
        Some(id) => {
            target.write_u8(1);
            target.write_u32(id.as_u32());
        },
        None => target.write_u8(0),
    }
}

fn write_opt_body<W: ByteWriter>(target: &mut W, body: Option<&BodyRep>) {
    match body {
        Some(body) => {
            target.write_u8(1);
            write_bytes(target, body.as_bytes());
        },
        None => target.write_u8(0),
    }
}

fn read_bytes<R: ByteReader>(source: &mut R) -> Result<Vec<u8>, DeserializationError> {
    let len = source.read_u32()? as usize;
    source.read_vec(len)
}

fn read_string<R: ByteReader>(source: &mut R) -> Result<String, DeserializationError> {
    let bytes = read_bytes(source)?;
    String::from_utf8(bytes)
        .map_err(|_| DeserializationError::InvalidValue("non-utf8 string in dump".into()))
}

fn read_path<R: ByteReader>(source: &mut R) -> Result<GoalPath, DeserializationError> {
    Ok(GoalPath::from(read_string(source)?.as_str()))
}

fn read_flag<R: ByteReader>(source: &mut R) -> Result<bool, DeserializationError> {
    match source.read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DeserializationError::InvalidValue(format!("invalid flag byte: {other}"))),
    }
}

fn read_opt_body<R: ByteReader>(
    source: &mut R,
) -> Result<Option<BodyRep>, DeserializationError> {
    match source.read_u8()? {
        0 => Ok(None),
        1 => Ok(Some(BodyRep::new(read_bytes(source)?))),
        other => Err(DeserializationError::InvalidValue(format!("invalid body marker: {other}"))),
    }
}

fn read_opt_id<R: ByteReader>(
    source: &mut R,
    node_count: usize,
) -> Result<Option<NodeId>, DeserializationError> {
    match source.read_u8()? {
        0 => Ok(None),
        1 => Ok(Some(NodeId::from_u32_with_node_count(source.read_u32()?, node_count)?)),
        other => Err(DeserializationError::InvalidValue(format!("invalid id marker: {other}"))),
    }
}


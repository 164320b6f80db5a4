use alloc::{sync::Arc, vec::Vec};
use core::fmt;

// TRACE LEVEL
// ================================================================================================

/// The amount of execution tracing a module was compiled with.
///
/// Declarative debugging requires `Deep` or `DeclRep`; the latter additionally records a
/// representation of each procedure body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceLevel {
    None,
    Shallow,
    Deep,
    DeclRep,
}

impl fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TraceLevel::None => "none",
            TraceLevel::Shallow => "shallow",
            TraceLevel::Deep => "deep",
            TraceLevel::DeclRep => "rep",
        };
        f.write_str(name)
    }
}

// PROCEDURE IDENTITY
// ================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredFunc {
    Predicate,
    Function,
}

/// Identity of a procedure: defining module, name, arity and predicate/function marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcId {
    pub module: Arc<str>,
    pub name: Arc<str>,
    pub arity: u16,
    pub kind: PredFunc,
}

impl ProcId {
    pub fn new(module: &str, name: &str, arity: u16, kind: PredFunc) -> Self {
        Self { module: module.into(), name: name.into(), arity, kind }
    }
}

impl fmt::Display for ProcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}/{}", self.module, self.name, self.arity)
    }
}

// BODY REPRESENTATION
// ================================================================================================

/// Opaque representation of a procedure body, recorded by the compiler at trace level `rep`.
///
/// The back end only carries it from the layout onto CALL nodes; the front end interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyRep(Arc<[u8]>);

impl BodyRep {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// PROCEDURE LAYOUT
// ================================================================================================

/// Static metadata describing a traced procedure.
///
/// A layout is produced by the compiler and handed to the back end with every event. The head
/// variable table lists HLDS variable numbers in declaration order; the first `num_added_args`
/// of them are compiler-inserted (type infos, I/O states) and are not program-visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcLayout {
    pub id: ProcId,
    pub trace_level: TraceLevel,
    /// Bitmask of suppressed event classes; zero means nothing was suppressed.
    pub suppressed_events: u32,
    /// HLDS variable numbers of the head variables, in declaration order.
    pub head_vars: Vec<u16>,
    /// Number of leading compiler-inserted head variables.
    pub num_added_args: usize,
    /// True for compiler-generated unify/compare/index procedures.
    pub is_uci: bool,
    /// False when the module was compiled without execution tracing.
    pub has_exec_trace: bool,
    /// Body representation, present at trace level `rep`.
    pub body_rep: Option<BodyRep>,
}

impl ProcLayout {
    /// Returns a layout for an ordinary deep-traced predicate with the given head variables and
    /// no compiler-inserted arguments.
    pub fn deep_traced(id: ProcId, head_vars: Vec<u16>) -> Self {
        Self {
            id,
            trace_level: TraceLevel::Deep,
            suppressed_events: 0,
            head_vars,
            num_added_args: 0,
            is_uci: false,
            has_exec_trace: true,
            body_rep: None,
        }
    }
}

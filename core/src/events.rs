use core::fmt;

use crate::{GoalPath, ProcLayout, Univ};

// PORT
// ================================================================================================

/// The kind of a trace event.
///
/// Ports are a closed set: the tracer reports every observation point of the running program as
/// one of these. Interface ports (CALL, EXIT, REDO, FAIL, EXCP) open or close a procedure
/// invocation; the remaining ports mark progress through the syntactic structure of a procedure
/// body and carry a goal path instead of an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    /// A procedure invocation is entered.
    Call,
    /// A procedure invocation succeeds.
    Exit,
    /// A procedure invocation is re-entered on backtracking.
    Redo,
    /// A procedure invocation fails.
    Fail,
    /// An exception propagates out of a procedure invocation.
    Exception,
    /// The condition of an if-then-else is entered.
    Cond,
    /// The then-branch of an if-then-else is entered (the condition succeeded).
    Then,
    /// The else-branch of an if-then-else is entered (the condition failed).
    Else,
    /// A negated goal is entered.
    NegEnter,
    /// A negation succeeds (the negated goal failed).
    NegSuccess,
    /// A negation fails (the negated goal succeeded).
    NegFailure,
    /// A disjunct is entered.
    Disj,
    /// A switch arm is entered.
    Switch,
    /// First entry to a foreign-language code fragment.
    PragmaFirst,
    /// Re-entry to a foreign-language code fragment.
    PragmaLater,
}

impl Port {
    /// Returns true for the ports that close an invocation: EXIT, FAIL and EXCP.
    pub fn is_final(&self) -> bool {
        matches!(self, Port::Exit | Port::Fail | Port::Exception)
    }

    /// Returns true for the ports that open or close an invocation.
    pub fn is_interface(&self) -> bool {
        matches!(self, Port::Call | Port::Exit | Port::Redo | Port::Fail | Port::Exception)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Port::Call => "CALL",
            Port::Exit => "EXIT",
            Port::Redo => "REDO",
            Port::Fail => "FAIL",
            Port::Exception => "EXCP",
            Port::Cond => "COND",
            Port::Then => "THEN",
            Port::Else => "ELSE",
            Port::NegEnter => "NEGE",
            Port::NegSuccess => "NEGS",
            Port::NegFailure => "NEGF",
            Port::Disj => "DISJ",
            Port::Switch => "SWTC",
            Port::PragmaFirst => "FRST",
            Port::PragmaLater => "LATR",
        };
        f.write_str(name)
    }
}

// REGISTERS
// ================================================================================================

/// A view of the machine state saved at a trace event.
///
/// The tracer hands one of these to the back end together with every event. It is the only
/// channel through which argument values are reified; the back end never inspects machine state
/// directly.
pub trait Registers {
    /// Returns the value of the head variable with the given HLDS number, or `None` if the
    /// variable is not live at `port`.
    fn head_var_value(&self, hlds_num: u16, port: Port) -> Option<Univ>;

    /// Walks one frame up the stack and returns the goal path of the call site in the caller,
    /// or `None` when the frame is unavailable (e.g. inside the program entry point).
    fn caller_return_path(&self) -> Option<GoalPath>;

    /// Returns the value of the exception being propagated. Meaningful only at an EXCP event.
    fn exception_value(&self) -> Univ;
}

// TRACE EVENT
// ================================================================================================

/// A single observation delivered by the tracer.
///
/// Events are transient: one lives exactly for the duration of the filter/construct decision it
/// triggers, borrowing the tracer's buffers. Anything a node needs beyond that point is copied
/// out during construction.
pub struct TraceEvent<'a> {
    /// The kind of event.
    pub port: Port,
    /// Globally unique, monotonically increasing event number.
    pub event_number: u64,
    /// Identifier of the procedure invocation this event belongs to. All events emitted by one
    /// invocation share one seqno.
    pub call_seqno: u64,
    /// Raw call depth as reported by the tracer. Not the EDT depth: last-call-optimized
    /// procedures may report the same depth as their parent.
    pub call_depth: u64,
    /// Goal path of the event within the procedure body, e.g. `"c2;t;"`. Empty for interface
    /// events.
    pub goal_path: &'a str,
    /// Static metadata of the procedure.
    pub layout: &'a ProcLayout,
    /// Machine state saved at this event.
    pub regs: &'a dyn Registers,
    /// Value of the process-wide I/O action counter at this event.
    pub io_counter: u64,
}

impl fmt::Debug for TraceEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceEvent")
            .field("port", &self.port)
            .field("event_number", &self.event_number)
            .field("call_seqno", &self.call_seqno)
            .field("call_depth", &self.call_depth)
            .field("goal_path", &self.goal_path)
            .field("proc", &self.layout.id)
            .field("io_counter", &self.io_counter)
            .finish()
    }
}

use alloc::{sync::Arc, vec::Vec};
use core::fmt;

use crate::{Port, ProcId, ProcLayout, Registers};

// UNIV
// ================================================================================================

/// A dynamically typed value captured from the program being debugged.
///
/// A univ pairs a type name with an opaque byte representation of the value. The back end never
/// interprets either; it only stores and re-emits them.
#[derive(Clone, PartialEq, Eq)]
pub struct Univ {
    type_name: Arc<str>,
    value: Arc<[u8]>,
}

impl Univ {
    pub fn new(type_name: &str, value: impl Into<Arc<[u8]>>) -> Self {
        Self { type_name: type_name.into(), value: value.into() }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

impl fmt::Debug for Univ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Univ({}, {} bytes)", self.type_name, self.value.len())
    }
}

// ATOM
// ================================================================================================

/// One argument slot of an atom: the HLDS variable number, whether the argument is a
/// program-visible head argument, and its value when live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomArg {
    pub hlds_num: u16,
    pub prog_visible: bool,
    /// `None` when the variable is not live at the event's port.
    pub value: Option<Univ>,
}

/// A procedure identity plus the tuple of its argument values at one interface event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceAtom {
    proc: ProcId,
    args: Vec<AtomArg>,
}

impl TraceAtom {
    /// Materializes the atom for an interface event from the tracer's register view.
    ///
    /// Every head variable declared by the layout yields exactly one slot, in declaration order.
    /// A variable that cannot be reified at this port yields a valueless slot; this is a design
    /// contract, not an error.
    pub fn capture(layout: &ProcLayout, regs: &dyn Registers, port: Port) -> Self {
        let args = layout
            .head_vars
            .iter()
            .enumerate()
            .map(|(position, &hlds_num)| AtomArg {
                hlds_num,
                prog_visible: position >= layout.num_added_args,
                value: regs.head_var_value(hlds_num, port),
            })
            .collect();

        Self { proc: layout.id.clone(), args }
    }

    pub fn from_parts(proc: ProcId, args: Vec<AtomArg>) -> Self {
        Self { proc, args }
    }

    pub fn proc(&self) -> &ProcId {
        &self.proc
    }

    pub fn args(&self) -> &[AtomArg] {
        &self.args
    }

    /// Iterates over the program-visible argument slots.
    pub fn visible_args(&self) -> impl Iterator<Item = &AtomArg> {
        self.args.iter().filter(|arg| arg.prog_visible)
    }
}

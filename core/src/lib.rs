#![no_std]

#[macro_use]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod errors;
pub mod store;

mod atom;
pub use atom::{AtomArg, TraceAtom, Univ};

mod events;
pub use events::{Port, Registers, TraceEvent};

mod goal_path;
pub use goal_path::{GoalPath, is_first_disjunct, same_construct};

mod layout;
pub use layout::{BodyRep, PredFunc, ProcId, ProcLayout, TraceLevel};

// RE-EXPORTS
// ================================================================================================

pub mod utils {
    pub use winter_utils::{
        ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable, SliceReader,
    };
}

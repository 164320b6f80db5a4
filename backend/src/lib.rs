//! Back end of the declarative debugger.
//!
//! The back end is an extension of the procedural debugger which collects related trace events
//! and builds them into an annotated trace: the execution dependency tree (EDT). Once a subtree
//! or supertree is materialized it is handed to the front end, where it is analysed to find
//! bugs. The back end decides which events enter the tree: given a final event it materializes
//! either the subtree rooted at that event down to a depth limit, or a region a number of
//! ancestor levels above the event, with the event's call as an implicit root.
//!
//! The back end can be re-entered multiple times to materialize different portions of the tree;
//! connecting the portions into a complete tree is the front end's responsibility.
//!
//! A useful mental model for the split between the two crates:
//! - `edt-core`: owns the data — events, atoms, the node store and the contour traversals over
//!   it.
//! - `edt-backend` (this crate): owns the behavior — the per-event filter, the per-port node
//!   constructors, and the session controller that drives replay and diagnosis.

mod config;
pub use config::{DeclDebugParams, SearchMode};

mod construct;

mod dump;
pub use dump::DumpWriter;

mod errors;
pub use errors::{SessionError, StartError};

mod filter;

mod host;
pub use host::{
    DebugHost, Diagnosis, DiagnosisRequest, JumpAddr, RetryIoPolicy, RetryResult, TrustListFormat,
};

mod session;
pub use session::{
    Resumption, Session, SessionMode, TraceCommand, TraceControl, add_trusted_module,
    add_trusted_pred_or_func, remove_trusted, set_fallback_search_mode, trust_standard_library,
    trusted_list,
};


#[cfg(test)]
mod tests;

// RE-EXPORTS
// ================================================================================================

pub use edt_core::{
    GoalPath, Port, ProcId, ProcLayout, Registers, TraceAtom, TraceEvent, TraceLevel, Univ,
    store::{NodeId, NodeStore, TraceNode},
};

use edt_core::{
    ProcLayout, TraceEvent,
    store::{NodeId, NodeStore},
};

use crate::SearchMode;

// JUMP ADDRESS
// ================================================================================================

/// Opaque resumption token produced by the replay mechanism.
///
/// Replay is an out-of-band control transfer: the back end asks to rewind, the runtime hands
/// back the address at which execution resumes, and the token travels up through the event
/// handler to the tracer. The back end never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpAddr(u64);

impl JumpAddr {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

// REPLAY
// ================================================================================================

/// How replay treats I/O actions performed between the rewind target and the current event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryIoPolicy {
    /// Ask the user interactively when un-tabled I/O would be re-executed.
    Interactive,
    /// Refuse the retry when un-tabled I/O would be re-executed.
    ForceSafe,
    /// Retry only if no I/O needs re-execution.
    OnlyIfSafe,
}

/// Outcome of a replay request. Only `OkDirect` lets a session proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryResult {
    /// The program was rewound; execution resumes at the given address.
    OkDirect(JumpAddr),
    /// The rewind failed for the given reason.
    Error(String),
    /// The rewind would require something other than a direct retry.
    Other,
}

// DIAGNOSIS
// ================================================================================================

/// The request handed to the front end when a subtree or supertree is complete.
#[derive(Debug)]
pub struct DiagnosisRequest<'a> {
    /// Observation counter of the store, bumped for this call; the front end compares it with
    /// the value it memoized node positions under.
    pub store_version: u64,
    pub store: &'a NodeStore,
    /// The root of the materialized region: the final-event node of the call being analysed.
    pub root: NodeId,
    /// True when the previously computed I/O action map covers this request's interval.
    pub use_old_io_map: bool,
    /// Start of the covered I/O action interval.
    pub io_start: u64,
    /// End (exclusive) of the covered I/O action interval.
    pub io_end: u64,
}

/// The front end's verdict on a materialized region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnosis {
    /// A buggy event was localized.
    BugFound { event: u64 },
    /// A symptom of the bug was localized.
    SymptomFound { event: u64 },
    /// The materialized region contains no bug.
    NoBugFound,
    /// More of the tree below `topmost_seqno` is needed.
    RequireSubtree { final_event: u64, topmost_seqno: u64, call_preceding: NodeId },
    /// More of the tree above `topmost_seqno` is needed.
    RequireSupertree { final_event: u64, topmost_seqno: u64 },
}

/// Rendering requested from [`DebugHost::trusted_list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustListFormat {
    /// Human-readable listing.
    Plain,
    /// One debugger command per trusted entry, suitable for replaying into a session.
    Commands,
}

// DEBUG HOST
// ================================================================================================

/// The environment a debugging session runs against.
///
/// The host provides the two external collaborators the back end depends on — the replay
/// mechanism and the front end — and owns the persistent front-end and browser state that
/// survives across sessions. The trust-list operations mutate that state; the trust policy
/// itself is enforced by the front end, so they are pure pass-throughs here.
pub trait DebugHost {
    /// Rewinds the program `levels_up` stack levels above the given event.
    fn retry(
        &mut self,
        event: &TraceEvent<'_>,
        levels_up: u64,
        io_policy: RetryIoPolicy,
        assume_all_io_is_tabled: bool,
    ) -> RetryResult;

    /// Hands a completed region to the front end and returns its verdict.
    fn diagnose(&mut self, request: DiagnosisRequest<'_>) -> Diagnosis;

    fn add_trusted_module(&mut self, module: &str);

    fn add_trusted_pred_or_func(&mut self, layout: &ProcLayout);

    fn trust_standard_library(&mut self);

    /// Removes the trusted entry with the given index; returns false if there is none.
    fn remove_trusted(&mut self, index: usize) -> bool;

    fn trusted_list(&mut self, format: TrustListFormat) -> String;

    fn set_fallback_search_mode(&mut self, mode: SearchMode);
}

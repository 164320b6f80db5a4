use edt_core::{
    Port, ProcId, TraceLevel,
    errors::{ContourError, StoreError},
};
use miette::Diagnostic;

// START ERRORS
// ================================================================================================

/// Reasons a declarative debugging session refuses to start.
///
/// These are user-recoverable: the debugger reports them and stays in interactive mode.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum StartError {
    #[error("declarative debugging is only available from EXIT, FAIL or EXCP events")]
    #[diagnostic(help(
        "run the program forward to a final event of the call you want to analyse, then start the session there"
    ))]
    NotFinalPort { port: Port },
    #[error("procedure {proc} was not compiled with execution tracing enabled")]
    NoExecTrace { proc: ProcId },
    #[error("cannot start declarative debugging at compiler generated procedures")]
    CompilerGenerated { proc: ProcId },
    #[error("procedure {proc} was not compiled with trace level `deep' or `rep' (its level is `{level}')")]
    #[diagnostic(help("recompile the module with a trace level of at least `decl`"))]
    InadequateTraceLevel { proc: ProcId, level: TraceLevel },
    #[error("some event types were suppressed when procedure {proc} was compiled")]
    EventsSuppressed { proc: ProcId },
    #[error("a dump session needs an output file")]
    MissingDumpFile,
    #[error("cannot open file `{path}' for output")]
    DumpFileOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to start collecting events: {reason}")]
    Replay { reason: String },
}

// SESSION ERRORS
// ================================================================================================

/// Unrecoverable faults raised while a session is collecting events.
///
/// Every variant indicates either instrumentation corruption, a tracer protocol violation, or a
/// broken store invariant; the design prefers loud failure over silently corrupting the tree,
/// so the embedding debugger is expected to report these and terminate.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum SessionError {
    #[error("layout of procedure {proc} has no execution tracing")]
    #[diagnostic(help(
        "an event arrived from an uninstrumented procedure mid-session; the trace is corrupt"
    ))]
    LayoutMissing { proc: ProcId },
    #[error("foreign language code is not handled (yet)")]
    ForeignCode { port: Port },
    #[error("a {port} event arrived before any node was constructed")]
    NoCurrentNode { port: Port },
    #[error("no matching EXIT for the REDO of call {seqno}")]
    NoMatchingExit { seqno: u64 },
    #[error("session completed without a root node")]
    CompletionWithoutRoot,
    #[error("contour traversal failed")]
    Contour(#[from] ContourError),
    #[error("node store invariant broken")]
    Store(#[from] StoreError),
    #[error("failed to write the trace dump")]
    DumpWrite(#[source] std::io::Error),
}

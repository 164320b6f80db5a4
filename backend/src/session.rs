use edt_core::{
    TraceEvent, TraceLevel,
    store::{NodeId, NodeStore},
};
use tracing::{trace, warn};

use crate::{
    DeclDebugParams, DebugHost, Diagnosis, DiagnosisRequest, DumpWriter, JumpAddr, RetryIoPolicy,
    RetryResult, SearchMode, SessionError, StartError, TrustListFormat,
    construct::construct_node,
    filter::{Classification, EventWindow},
};

// TRACE CONTROL
// ================================================================================================

/// What the tracer should do after an event or replay request has been processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceControl {
    /// Keep tracing normally; deliver the next event.
    Continue,
    /// Resume the program at a replayed position, under the given trace command.
    Resume(Resumption),
    /// Hand control back to the interactive debugger at the current event.
    Interactive,
}

/// A replayed program position plus the command the tracer runs under after the jump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resumption {
    pub jump: JumpAddr,
    pub command: TraceCommand,
}

/// The command armed on the tracer after a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceCommand {
    /// Deliver every event to the session, printing nothing.
    SingleStep,
    /// Run to the given event, then stop in interactive mode.
    GotoEvent(u64),
}

/// What kind of session was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Materialize and hand regions to the front end for analysis.
    Diagnose,
    /// Materialize one region and serialize it to a file for offline inspection.
    Dump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Collecting,
    Interactive,
}

// SESSION
// ================================================================================================

/// A declarative debugging session: the controller driving iterative materialization.
///
/// A session is created by [`Session::start`] at a final event, after which the tracer delivers
/// every event to [`Session::trace_event`] until the requested region is complete. Diagnosis
/// may re-enter collection (subtree and supertree requests replay the program and grow the
/// tree), so a single session value spans every materialization round of one `dd` command.
#[derive(Debug)]
pub struct Session {
    mode: SessionMode,
    phase: Phase,
    params: DeclDebugParams,
    store: NodeStore,
    window: EventWindow,
    /// The most recently constructed node; the `prev` pointer of the next one.
    current_node: Option<NodeId>,
    /// The node handed to the front end as the root of the materialized region: the final-event
    /// node of the call of `start_seqno`.
    return_node: Option<NodeId>,
    /// The event at which the session was started; diagnosis returns the user here when no bug
    /// is found.
    initial_event: u64,
    /// Call depth of the root of the materialized region. Supertree requests climb this.
    topmost_call_depth: u64,
    /// Cached `[start, end)` interval of the I/O action map, valid across rounds as long as new
    /// intervals stay inside it.
    io_map_cache: Option<(u64, u64)>,
    dump: Option<DumpWriter<std::fs::File>>,
}

impl Session {
    // START
    // --------------------------------------------------------------------------------------------

    /// Starts a declarative debugging session at a final event.
    ///
    /// Validates the start conditions, rewinds the program to just before the call being
    /// analysed, and returns the session together with the resumption the tracer must follow.
    /// On failure the debugger reports the error and stays interactive.
    pub fn start(
        mode: SessionMode,
        outfile: Option<&str>,
        event: &TraceEvent<'_>,
        host: &mut impl DebugHost,
        params: DeclDebugParams,
    ) -> Result<(Self, Resumption), StartError> {
        let proc = || event.layout.id.clone();

        if !event.port.is_final() {
            return Err(StartError::NotFinalPort { port: event.port });
        }
        if !event.layout.has_exec_trace {
            return Err(StartError::NoExecTrace { proc: proc() });
        }
        if event.layout.is_uci {
            return Err(StartError::CompilerGenerated { proc: proc() });
        }
        let level = event.layout.trace_level;
        if level != TraceLevel::Deep && level != TraceLevel::DeclRep {
            return Err(StartError::InadequateTraceLevel { proc: proc(), level });
        }
        if event.layout.suppressed_events != 0 {
            return Err(StartError::EventsSuppressed { proc: proc() });
        }

        let dump = match mode {
            SessionMode::Dump => {
                let path = outfile.ok_or(StartError::MissingDumpFile)?;
                Some(DumpWriter::create(path).map_err(|source| StartError::DumpFileOpen {
                    path: path.into(),
                    source,
                })?)
            },
            SessionMode::Diagnose => None,
        };

        let mut session = Session {
            mode,
            phase: Phase::Collecting,
            params,
            store: NodeStore::new(),
            window: EventWindow::start(
                event.event_number,
                event.call_seqno,
                params.initial_depth_step_size,
                event.io_counter,
                false,
            ),
            current_node: None,
            return_node: None,
            initial_event: event.event_number,
            topmost_call_depth: event.call_depth,
            io_map_cache: None,
            dump,
        };

        let resumption = session
            .start_collecting(
                event,
                host,
                event.event_number,
                event.call_seqno,
                params.initial_depth_step_size,
                false,
            )
            .map_err(|reason| StartError::Replay { reason })?;
        Ok((session, resumption))
    }

    // EVENT ENTRY
    // --------------------------------------------------------------------------------------------

    /// Processes one trace event. Called by the tracer for every event while collecting.
    pub fn trace_event(
        &mut self,
        event: &TraceEvent<'_>,
        host: &mut impl DebugHost,
    ) -> Result<TraceControl, SessionError> {
        trace!(target: "edt::session", event = ?event, "EVENT");

        if event.event_number > self.window.last_event && !self.window.building_supertree {
            // This shouldn't ever be reached.
            warn!(
                event = event.event_number,
                last_event = self.window.last_event,
                "missed final event"
            );
            self.phase = Phase::Interactive;
            return Ok(TraceControl::Interactive);
        }

        if !event.layout.has_exec_trace {
            return Err(SessionError::LayoutMissing { proc: event.layout.id.clone() });
        }

        // Compiler generated unify procedures could carry sub-term dependencies through the
        // tree; they are excluded for now.
        if event.layout.is_uci {
            return Ok(TraceControl::Continue);
        }

        let at_depth_limit = match self.window.classify(event) {
            Classification::Rejected => {
                trace!(target: "edt::session", event = event.event_number, "FILTER");
                return Ok(TraceControl::Continue);
            },
            Classification::Accepted { at_depth_limit } => at_depth_limit,
        };

        let node = construct_node(&mut self.store, self.current_node, event, at_depth_limit)?;
        self.current_node = Some(node);

        if event.call_seqno == self.window.start_seqno && event.port.is_final() {
            self.return_node = Some(node);
        }

        let subtree_done =
            !self.window.building_supertree && event.event_number == self.window.last_event;
        let supertree_done = self.window.building_supertree && self.window.edt_depth == 0;
        if subtree_done || supertree_done {
            return self.diagnose(event, host);
        }

        Ok(TraceControl::Continue)
    }

    // DIAGNOSIS
    // --------------------------------------------------------------------------------------------

    /// Dispatches the completed region and acts on the verdict.
    fn diagnose(
        &mut self,
        event: &TraceEvent<'_>,
        host: &mut impl DebugHost,
    ) -> Result<TraceControl, SessionError> {
        let root = self.return_node.ok_or(SessionError::CompletionWithoutRoot)?;

        if self.window.compiler_flag_warning {
            warn!(
                "Warning: some modules were compiled with a trace level lower than `decl'. \
                 This may result in calls being omitted from the debugging tree."
            );
        }

        if self.mode == SessionMode::Dump {
            if let Some(writer) = self.dump.take() {
                writer.finish(&self.store, root).map_err(SessionError::DumpWrite)?;
            }
            self.phase = Phase::Interactive;
            return Ok(TraceControl::Interactive);
        }

        let io_start = self.window.start_io_counter;
        let io_end = event.io_counter;
        let use_old_io_map = matches!(
            self.io_map_cache,
            Some((cache_start, cache_end)) if cache_start <= io_start && io_end <= cache_end
        );
        if !use_old_io_map {
            self.io_map_cache = Some((io_start, io_end));
        }
        let (io_start, io_end) = self.io_map_cache.unwrap_or((io_start, io_end));

        let store_version = self.store.bump_version();
        let response = host.diagnose(DiagnosisRequest {
            store_version,
            store: &self.store,
            root,
            use_old_io_map,
            io_start,
            io_end,
        });

        match response {
            Diagnosis::BugFound { event: bug_event } => {
                Ok(self.go_to_selected_event(bug_event, event, host))
            },
            Diagnosis::SymptomFound { event: symptom_event } => {
                Ok(self.go_to_selected_event(symptom_event, event, host))
            },
            Diagnosis::NoBugFound => {
                // Return the user to the event where the session was initiated.
                Ok(self.go_to_selected_event(self.initial_event, event, host))
            },
            Diagnosis::RequireSubtree { final_event, topmost_seqno, call_preceding } => {
                Ok(self.restart(Some(call_preceding), final_event, topmost_seqno, false, event, host))
            },
            Diagnosis::RequireSupertree { final_event, topmost_seqno } => {
                Ok(self.restart(None, final_event, topmost_seqno, true, event, host))
            },
        }
    }

    /// Rewinds to before the topmost call and arms a goto to `target`; the session becomes
    /// interactive either way.
    fn go_to_selected_event(
        &mut self,
        target: u64,
        event: &TraceEvent<'_>,
        host: &mut impl DebugHost,
    ) -> TraceControl {
        self.phase = Phase::Interactive;
        let levels_up = event.call_depth.saturating_sub(self.topmost_call_depth);
        match host.retry(
            event,
            levels_up,
            RetryIoPolicy::Interactive,
            self.params.assume_all_io_is_tabled,
        ) {
            RetryResult::OkDirect(jump) => {
                TraceControl::Resume(Resumption { jump, command: TraceCommand::GotoEvent(target) })
            },
            RetryResult::Error(problem) => {
                warn!(%problem, "diagnosis aborted");
                TraceControl::Interactive
            },
            RetryResult::Other => {
                warn!("diagnosis aborted: direct retry impossible");
                TraceControl::Interactive
            },
        }
    }

    // RESTART
    // --------------------------------------------------------------------------------------------

    /// Re-enters collection for a subtree or supertree requested by the front end.
    fn restart(
        &mut self,
        call_preceding: Option<NodeId>,
        final_event: u64,
        topmost_seqno: u64,
        supertree: bool,
        event: &TraceEvent<'_>,
        host: &mut impl DebugHost,
    ) -> TraceControl {
        self.return_node = None;

        // The new fragment's first node links to the node preceding its root's CALL, so the
        // front end can splice the fragment into the existing tree.
        self.current_node = call_preceding;

        // A supertree is built above the current root: the window climbs the call stack.
        if supertree {
            let step = self.params.initial_depth_step_size;
            self.topmost_call_depth =
                if step < self.topmost_call_depth { self.topmost_call_depth - step } else { 1 };
        }
        let max_depth = self.params.initial_depth_step_size + 1;

        match self.start_collecting(event, host, final_event, topmost_seqno, max_depth, supertree) {
            Ok(resumption) => TraceControl::Resume(resumption),
            Err(problem) => {
                warn!(%problem, "diagnosis aborted");
                self.phase = Phase::Interactive;
                TraceControl::Interactive
            },
        }
    }

    /// Rewinds to just before the topmost call and arms the window for a collection round.
    fn start_collecting(
        &mut self,
        event: &TraceEvent<'_>,
        host: &mut impl DebugHost,
        last_event: u64,
        start_seqno: u64,
        max_depth: u64,
        supertree: bool,
    ) -> Result<Resumption, String> {
        let levels_up = event.call_depth.saturating_sub(self.topmost_call_depth);
        let jump = match host.retry(
            event,
            levels_up,
            RetryIoPolicy::Interactive,
            self.params.assume_all_io_is_tabled,
        ) {
            RetryResult::OkDirect(jump) => jump,
            RetryResult::Error(problem) => return Err(problem),
            RetryResult::Other => return Err("internal error: direct retry impossible".into()),
        };

        self.window =
            EventWindow::start(last_event, start_seqno, max_depth, event.io_counter, supertree);
        self.phase = Phase::Collecting;
        Ok(Resumption { jump, command: TraceCommand::SingleStep })
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the node store of this session.
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Returns the root of the most recently completed region, if any.
    pub fn return_node(&self) -> Option<NodeId> {
        self.return_node
    }

    /// Returns the call depth the materialized region is currently rooted at.
    pub fn topmost_call_depth(&self) -> u64 {
        self.topmost_call_depth
    }

    /// Returns true while the session consumes events.
    pub fn is_collecting(&self) -> bool {
        self.phase == Phase::Collecting
    }
}

// TRUST LIST AND CONFIGURATION PASS-THROUGHS
// ================================================================================================
//
// The trust policy is enforced by the front end; the back end only forwards mutations of the
// persistent front-end state. These are usable before any session exists.

pub fn add_trusted_module(host: &mut impl DebugHost, module: &str) {
    host.add_trusted_module(module);
}

pub fn add_trusted_pred_or_func(host: &mut impl DebugHost, layout: &edt_core::ProcLayout) {
    host.add_trusted_pred_or_func(layout);
}

pub fn trust_standard_library(host: &mut impl DebugHost) {
    host.trust_standard_library();
}

pub fn remove_trusted(host: &mut impl DebugHost, index: usize) -> bool {
    host.remove_trusted(index)
}

pub fn trusted_list(host: &mut impl DebugHost, format: TrustListFormat) -> String {
    host.trusted_list(format)
}

pub fn set_fallback_search_mode(host: &mut impl DebugHost, mode: SearchMode) {
    host.set_fallback_search_mode(mode);
}

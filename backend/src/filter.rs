use edt_core::{Port, TraceEvent};

// CLASSIFICATION
// ================================================================================================

/// Verdict of the window on one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Classification {
    /// The event is outside the materialized region or beyond the depth limit.
    Rejected,
    /// The event enters the tree. `at_depth_limit` is meaningful for CALL events only.
    Accepted { at_depth_limit: bool },
}

// EVENT WINDOW
// ================================================================================================

/// Per-session filter state: the region of the program run whose events are materialized.
///
/// `inside` has opposite meanings in the two modes. Materializing a subtree, it is true while
/// execution is within the call of `start_seqno`. Materializing a supertree, it is true while
/// execution is *outside* the subtree that was already materialized below `start_seqno` — those
/// nodes exist and must not be rebuilt.
#[derive(Debug, Clone)]
pub(crate) struct EventWindow {
    /// Depth bound of the materialized region, in EDT levels.
    pub max_depth: u64,
    /// The final event of the region; in subtree mode, reaching it completes the session.
    pub last_event: u64,
    /// Seqno of the call the region is rooted at (subtree) or grows above (supertree).
    pub start_seqno: u64,
    /// I/O action counter at the start of collection.
    pub start_io_counter: u64,
    pub inside: bool,
    pub building_supertree: bool,
    /// EDT-relative depth of the construction point. Zero at the root of the region.
    pub edt_depth: i64,
    /// Latched when an event from a module with suppressed event classes was dropped; flushed
    /// as a warning before diagnosis.
    pub compiler_flag_warning: bool,
}

impl EventWindow {
    pub fn start(
        last_event: u64,
        start_seqno: u64,
        max_depth: u64,
        start_io_counter: u64,
        building_supertree: bool,
    ) -> Self {
        Self {
            max_depth,
            last_event,
            start_seqno,
            start_io_counter,
            // A supertree starts outside the existing explicit subtree.
            inside: building_supertree,
            building_supertree,
            edt_depth: 0,
            compiler_flag_warning: false,
        }
    }

    /// Decides whether the event enters the tree, updating the window state.
    ///
    /// The caller has already handled overrun, missing layouts and compiler-generated
    /// procedures; this covers window membership, depth accounting, the depth bound and the
    /// suppression filter.
    pub fn classify(&mut self, event: &TraceEvent<'_>) -> Classification {
        if self.building_supertree {
            if !self.inside {
                if event.call_seqno == self.start_seqno && event.port.is_final() {
                    // Exiting the subtree rooted at start_seqno. The final event itself is
                    // constructed: it closes the implicit root's interface chain.
                    self.inside = true;
                } else {
                    // Within the existing explicit subtree.
                    return Classification::Rejected;
                }
            } else if event.call_seqno == self.start_seqno {
                // The port must be CALL or REDO; we are leaving the supertree and entering the
                // existing explicit subtree. The event still enters the generated tree as its
                // implicit root.
                self.inside = false;
            }
        } else if self.inside {
            if event.call_seqno == self.start_seqno && event.port.is_final() {
                // Leaving the topmost call.
                self.inside = false;
            }
        } else if event.call_seqno == self.start_seqno {
            // The port must be CALL or REDO; we are (re)entering the topmost call.
            self.inside = true;
        } else {
            // Outside the topmost call.
            return Classification::Rejected;
        }

        // The depth of an EXIT, FAIL or EXCP node is the depth of its CALL, i.e. the value
        // before the decrement; the adjustment restores that during the bound check below.
        let mut depth_check_adjustment = 0;
        let mut at_depth_limit = false;
        match event.port {
            Port::Call => {
                self.edt_depth += 1;
                at_depth_limit = self.edt_depth == self.max_depth as i64;
            },
            Port::Redo => self.edt_depth += 1,
            port if port.is_final() => {
                self.edt_depth -= 1;
                depth_check_adjustment = 1;
            },
            _ => (),
        }

        // Events deeper than the bound are implicit in the tree. The bound is raised by one so
        // that every interface event of a call at the limit is kept; those events are needed to
        // build a correct contour. Their own at-depth-limit flag stays false: the analyser can
        // only reach them through a parent whose flag is set.
        if self.edt_depth + depth_check_adjustment > self.max_depth as i64 + 1 {
            return Classification::Rejected;
        }

        if event.layout.suppressed_events != 0 {
            // Modules compiled without the necessary information are effectively assumed
            // correct; warn before handing the tree over.
            self.compiler_flag_warning = true;
            return Classification::Rejected;
        }

        Classification::Accepted { at_depth_limit }
    }
}

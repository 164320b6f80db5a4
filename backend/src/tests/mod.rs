use edt_core::{
    Port, TraceLevel,
    store::{GoalStatus, NodeId, TraceDump, TraceNode},
    utils::Deserializable,
};
use pretty_assertions::assert_eq;

use crate::{
    DeclDebugParams, Diagnosis, Session, SessionError, SessionMode, StartError, TraceCommand,
    TraceControl,
    test_utils::{Ev, ScriptedHost, TestRegs, ev, feed, layout, proc, trace_event},
};


fn params(step: u64) -> DeclDebugParams {
    DeclDebugParams { initial_depth_step_size: step, ..DeclDebugParams::default() }
}

/// Starts a diagnose session at `events[start_at]` and replays the whole stream into it.
fn run(
    events: &[Ev],
    start_at: usize,
    step: u64,
    host: &mut ScriptedHost,
) -> (Session, TraceControl) {
    let layout = layout(proc("p"));
    let regs = TestRegs;
    let start_event = trace_event(&layout, &regs, &events[start_at]);
    let (mut session, resumption) =
        Session::start(SessionMode::Diagnose, None, &start_event, host, params(step)).unwrap();
    assert_eq!(resumption.command, TraceCommand::SingleStep);

    let control = feed(&mut session, &layout, &regs, events, host);
    (session, control)
}

fn node_ids(session: &Session) -> Vec<(NodeId, Port)> {
    session.store().iter().map(|(id, node)| (id, node.port())).collect()
}

// SCENARIOS
// ================================================================================================

#[test]
fn single_deterministic_call() {
    let events = [ev(1, 1, Port::Call, "", 1), ev(2, 1, Port::Exit, "", 1)];
    let mut host = ScriptedHost::default();
    let (session, control) = run(&events, 1, 3, &mut host);

    // No bug found: the user is returned to the event where the session began.
    assert_eq!(
        control,
        TraceControl::Resume(crate::Resumption {
            jump: host_jump(&host, 1),
            command: TraceCommand::GotoEvent(2),
        })
    );

    let store = session.store();
    assert_eq!(node_ids(&session), vec![(id(0), Port::Call), (id(1), Port::Exit)]);
    let call = match &store[id(0)] {
        TraceNode::Call(call) => call,
        other => panic!("expected CALL, got {other:?}"),
    };
    assert_eq!(call.last_interface(), id(1));
    assert!(!call.at_depth_limit());
    match &store[id(1)] {
        TraceNode::Exit(exit) => {
            assert_eq!(exit.call(), id(0));
            assert_eq!(exit.prev_interface(), id(0));
        },
        other => panic!("expected EXIT, got {other:?}"),
    }
    assert_eq!(session.return_node(), Some(id(1)));
    assert_eq!(host.requests.len(), 1);
    assert_eq!(host.requests[0].root, id(1));
    assert_eq!(host.requests[0].root_seqno, 1);
}

#[test]
fn if_then_else_taken() {
    let events = [
        ev(1, 1, Port::Call, "", 1),
        ev(2, 1, Port::Cond, "c2;", 1),
        ev(3, 1, Port::Then, "c2;t;", 1),
        ev(4, 1, Port::Exit, "", 1),
    ];
    let mut host = ScriptedHost::default();
    let (session, _) = run(&events, 3, 3, &mut host);

    let store = session.store();
    match &store[id(1)] {
        TraceNode::Cond(cond) => assert_eq!(cond.status(), GoalStatus::Succeeded),
        other => panic!("expected COND, got {other:?}"),
    }
    match &store[id(2)] {
        TraceNode::Then(then) => assert_eq!(then.cond(), id(1)),
        other => panic!("expected THEN, got {other:?}"),
    }
    match &store[id(3)] {
        TraceNode::Exit(exit) => assert_eq!(exit.call(), id(0)),
        other => panic!("expected EXIT, got {other:?}"),
    }
}

#[test]
fn disjunction_second_branch_succeeds() {
    let events = [
        ev(1, 1, Port::Call, "", 1),
        ev(2, 1, Port::Disj, "d1;", 1),
        ev(3, 1, Port::Fail, "", 1),
        ev(4, 1, Port::Redo, "", 1),
        ev(5, 1, Port::Disj, "d2;", 1),
        ev(6, 1, Port::Exit, "", 1),
    ];
    let mut host = ScriptedHost::default();
    let (session, _) = run(&events, 5, 3, &mut host);

    let store = session.store();
    assert_eq!(
        node_ids(&session),
        vec![
            (id(0), Port::Call),
            (id(1), Port::Disj),
            (id(2), Port::Fail),
            (id(3), Port::Redo),
            (id(4), Port::Disj),
            (id(5), Port::Exit),
        ]
    );
    assert!(matches!(&store[id(1)], TraceNode::FirstDisj(_)));
    match &store[id(4)] {
        TraceNode::LaterDisj(disj) => assert_eq!(disj.first_disj(), id(1)),
        other => panic!("expected LATER_DISJ, got {other:?}"),
    }
    for interface in [id(2), id(3), id(5)] {
        assert_eq!(store[interface].call_id(), Some(id(0)));
    }

    // The interface chain on the CALL reads EXIT -> REDO -> FAIL -> CALL.
    assert_eq!(store.get_last_interface(id(0)).unwrap(), id(5));
    let chain: Vec<NodeId> = interface_chain(&session, id(0));
    assert_eq!(chain, vec![id(5), id(3), id(2), id(0)]);
}

#[test]
fn depth_limit_excludes_grandchildren() {
    let events = [
        ev(1, 1, Port::Call, "", 1),
        ev(2, 2, Port::Call, "", 2),
        ev(3, 3, Port::Call, "", 3),
        ev(4, 3, Port::Exit, "", 3),
        ev(5, 2, Port::Exit, "", 2),
        ev(6, 1, Port::Exit, "", 1),
    ];
    let mut host = ScriptedHost::default();
    let (session, _) = run(&events, 5, 1, &mut host);

    // The grandchild call is implicit; the child is kept as an interface stub.
    let numbers: Vec<u64> =
        session.store().iter().map(|(_, node)| node.event_number()).collect();
    assert_eq!(numbers, vec![1, 2, 5, 6]);

    // The call at the depth bound is flagged; the stub one level deeper is not.
    match &session.store()[id(0)] {
        TraceNode::Call(call) => assert!(call.at_depth_limit()),
        other => panic!("expected CALL, got {other:?}"),
    }
    match &session.store()[id(1)] {
        TraceNode::Call(call) => assert!(!call.at_depth_limit()),
        other => panic!("expected CALL, got {other:?}"),
    }
}

#[test]
fn negation_failing() {
    let events = [
        ev(1, 1, Port::Call, "", 1),
        ev(2, 1, Port::NegEnter, "n2;", 1),
        ev(3, 1, Port::NegFailure, "n2;e;", 1),
        ev(4, 1, Port::Exit, "", 1),
    ];
    let mut host = ScriptedHost::default();
    let (session, _) = run(&events, 3, 3, &mut host);

    let store = session.store();
    match &store[id(1)] {
        TraceNode::NegEnter(neg) => assert_eq!(neg.status(), GoalStatus::Failed),
        other => panic!("expected NEG_ENTER, got {other:?}"),
    }
    match &store[id(2)] {
        TraceNode::NegFailure(failure) => assert_eq!(failure.neg(), id(1)),
        other => panic!("expected NEG_FAILURE, got {other:?}"),
    }
}

#[test]
fn supertree_restart_climbs_the_stack() {
    // Ancestor chain: calls at depths 7..10, each seqno equal to its depth.
    let events = [
        ev(1, 7, Port::Call, "", 7),
        ev(2, 8, Port::Call, "", 8),
        ev(3, 9, Port::Call, "", 9),
        ev(4, 10, Port::Call, "", 10),
        ev(5, 10, Port::Exit, "", 10),
        ev(6, 9, Port::Exit, "", 9),
        ev(7, 8, Port::Exit, "", 8),
        ev(8, 7, Port::Exit, "", 7),
    ];
    let layout = layout(proc("p"));
    let regs = TestRegs;
    let mut host = ScriptedHost::answering([Diagnosis::RequireSupertree {
        final_event: 5,
        topmost_seqno: 10,
    }]);

    // Initial subtree session on the call at depth 10.
    let start_event = trace_event(&layout, &regs, &events[4]);
    let (mut session, _) =
        Session::start(SessionMode::Diagnose, None, &start_event, &mut host, params(3)).unwrap();
    assert_eq!(session.topmost_call_depth(), 10);

    let control = feed(&mut session, &layout, &regs, &events[3..5], &mut host);
    match control {
        TraceControl::Resume(resumption) => {
            assert_eq!(resumption.command, TraceCommand::SingleStep)
        },
        other => panic!("expected a supertree restart, got {other:?}"),
    }
    assert_eq!(session.topmost_call_depth(), 7);
    let subtree_nodes = session.store().len();
    assert_eq!(subtree_nodes, 2);

    // The replayed run delivers the ancestor frames; the former root is emitted as the implicit
    // root of the supertree and its interior is not rebuilt.
    let control = feed(&mut session, &layout, &regs, &events, &mut host);
    match control {
        TraceControl::Resume(resumption) => {
            assert_eq!(resumption.command, TraceCommand::GotoEvent(5))
        },
        other => panic!("expected diagnosis to finish, got {other:?}"),
    }

    let ports: Vec<(u64, Port)> = session
        .store()
        .iter()
        .skip(subtree_nodes)
        .map(|(_, node)| (node.event_number(), node.port()))
        .collect();
    assert_eq!(
        ports,
        vec![
            (1, Port::Call),
            (2, Port::Call),
            (3, Port::Call),
            (4, Port::Call),
            (5, Port::Exit),
            (6, Port::Exit),
            (7, Port::Exit),
            (8, Port::Exit),
        ]
    );

    // The supertree fragment starts a fresh prev chain.
    assert_eq!(session.store()[id(subtree_nodes as u32)].prev(), None);

    // Both completions handed the front end the final event of call 10.
    assert_eq!(host.requests.len(), 2);
    assert_eq!(host.requests[0].root_seqno, 10);
    assert_eq!(host.requests[1].root_seqno, 10);
    assert_eq!(host.requests[1].root_port, Port::Exit);
}

#[test]
fn successive_supertrees_climb_by_the_step_size() {
    // Ancestor chain at depths 4..=10, seqno equal to depth: CALL events 1..=7 going down,
    // EXIT events 8..=14 coming back up.
    let events = [
        ev(1, 4, Port::Call, "", 4),
        ev(2, 5, Port::Call, "", 5),
        ev(3, 6, Port::Call, "", 6),
        ev(4, 7, Port::Call, "", 7),
        ev(5, 8, Port::Call, "", 8),
        ev(6, 9, Port::Call, "", 9),
        ev(7, 10, Port::Call, "", 10),
        ev(8, 10, Port::Exit, "", 10),
        ev(9, 9, Port::Exit, "", 9),
        ev(10, 8, Port::Exit, "", 8),
        ev(11, 7, Port::Exit, "", 7),
        ev(12, 6, Port::Exit, "", 6),
        ev(13, 5, Port::Exit, "", 5),
        ev(14, 4, Port::Exit, "", 4),
    ];
    let layout = layout(proc("p"));
    let regs = TestRegs;
    let mut host = ScriptedHost::answering([
        Diagnosis::RequireSupertree { final_event: 8, topmost_seqno: 10 },
        Diagnosis::RequireSupertree { final_event: 11, topmost_seqno: 7 },
    ]);

    let start_event = trace_event(&layout, &regs, &events[7]);
    let (mut session, _) =
        Session::start(SessionMode::Diagnose, None, &start_event, &mut host, params(3)).unwrap();
    feed(&mut session, &layout, &regs, &events[6..8], &mut host);
    assert_eq!(session.topmost_call_depth(), 7);

    // First supertree: the replayed run resumes at the depth-7 frame.
    feed(&mut session, &layout, &regs, &events[3..], &mut host);
    assert_eq!(session.topmost_call_depth(), 4);

    // Second supertree: two step-3 climbs from depth 10 land the root at depth 4.
    let control = feed(&mut session, &layout, &regs, &events, &mut host);
    match control {
        TraceControl::Resume(resumption) => {
            assert_eq!(resumption.command, TraceCommand::GotoEvent(8))
        },
        other => panic!("expected diagnosis to finish, got {other:?}"),
    }
    assert_eq!(session.topmost_call_depth(), 4);
    assert_eq!(host.requests.len(), 3);
    assert_eq!(host.requests[1].root_seqno, 10);
    assert_eq!(host.requests[2].root_seqno, 7);
}

// BOUNDARY BEHAVIORS
// ================================================================================================

#[test]
fn trivially_failing_call_resolves_without_a_walk() {
    let events = [ev(1, 1, Port::Call, "", 1), ev(2, 1, Port::Fail, "", 1)];
    let mut host = ScriptedHost::default();
    let (session, _) = run(&events, 1, 3, &mut host);

    let store = session.store();
    match &store[id(1)] {
        TraceNode::Fail(fail) => {
            assert_eq!(fail.call(), id(0));
            assert_eq!(fail.prev_interface(), id(0));
        },
        other => panic!("expected FAIL, got {other:?}"),
    }
    assert_eq!(host.requests[0].root_port, Port::Fail);
}

#[test]
fn exception_is_spliced_like_a_failure() {
    let events = [ev(1, 1, Port::Call, "", 1), ev(2, 1, Port::Exception, "", 1)];
    let mut host = ScriptedHost::default();
    let (session, _) = run(&events, 1, 3, &mut host);

    match &session.store()[id(1)] {
        TraceNode::Excp(excp) => {
            assert_eq!(excp.call(), id(0));
            assert_eq!(excp.exception().type_name(), "exception");
        },
        other => panic!("expected EXCP, got {other:?}"),
    }
}

// SESSION CONTROL
// ================================================================================================

#[test]
fn start_refuses_invalid_conditions() {
    let regs = TestRegs;
    let good = layout(proc("p"));
    let mut host = ScriptedHost::default();
    let p = params(3);

    let not_final = trace_event(&good, &regs, &ev(1, 1, Port::Call, "", 1));
    assert!(matches!(
        Session::start(SessionMode::Diagnose, None, &not_final, &mut host, p),
        Err(StartError::NotFinalPort { port: Port::Call })
    ));

    let final_ev = ev(2, 1, Port::Exit, "", 1);

    let mut untraced = layout(proc("p"));
    untraced.has_exec_trace = false;
    let event = trace_event(&untraced, &regs, &final_ev);
    assert!(matches!(
        Session::start(SessionMode::Diagnose, None, &event, &mut host, p),
        Err(StartError::NoExecTrace { .. })
    ));

    let mut uci = layout(proc("__Unify__"));
    uci.is_uci = true;
    let event = trace_event(&uci, &regs, &final_ev);
    assert!(matches!(
        Session::start(SessionMode::Diagnose, None, &event, &mut host, p),
        Err(StartError::CompilerGenerated { .. })
    ));

    let mut shallow = layout(proc("p"));
    shallow.trace_level = TraceLevel::Shallow;
    let event = trace_event(&shallow, &regs, &final_ev);
    assert!(matches!(
        Session::start(SessionMode::Diagnose, None, &event, &mut host, p),
        Err(StartError::InadequateTraceLevel { level: TraceLevel::Shallow, .. })
    ));

    let mut suppressed = layout(proc("p"));
    suppressed.suppressed_events = 1;
    let event = trace_event(&suppressed, &regs, &final_ev);
    assert!(matches!(
        Session::start(SessionMode::Diagnose, None, &event, &mut host, p),
        Err(StartError::EventsSuppressed { .. })
    ));

    let event = trace_event(&good, &regs, &final_ev);
    assert!(matches!(
        Session::start(SessionMode::Dump, None, &event, &mut host, p),
        Err(StartError::MissingDumpFile)
    ));

    host.fail_retry = Some("retry across untabled I/O".into());
    let event = trace_event(&good, &regs, &final_ev);
    assert!(matches!(
        Session::start(SessionMode::Diagnose, None, &event, &mut host, p),
        Err(StartError::Replay { .. })
    ));
}

#[test]
fn missed_final_event_aborts_to_interactive() {
    let events = [ev(1, 1, Port::Call, "", 1), ev(2, 1, Port::Exit, "", 1)];
    let layout = layout(proc("p"));
    let regs = TestRegs;
    let mut host = ScriptedHost::default();
    let start_event = trace_event(&layout, &regs, &events[1]);
    let (mut session, _) =
        Session::start(SessionMode::Diagnose, None, &start_event, &mut host, params(3)).unwrap();

    let overrun = trace_event(&layout, &regs, &ev(3, 1, Port::Redo, "", 1));
    assert_eq!(session.trace_event(&overrun, &mut host).unwrap(), TraceControl::Interactive);
    assert!(!session.is_collecting());
}

#[test]
fn uci_events_are_filtered() {
    let events = [ev(1, 1, Port::Call, "", 1)];
    let layout_p = layout(proc("p"));
    let mut uci = layout(proc("__Compare__"));
    uci.is_uci = true;
    let regs = TestRegs;
    let mut host = ScriptedHost::default();

    let start_event = trace_event(&layout_p, &regs, &ev(4, 1, Port::Exit, "", 1));
    let (mut session, _) =
        Session::start(SessionMode::Diagnose, None, &start_event, &mut host, params(3)).unwrap();
    feed(&mut session, &layout_p, &regs, &events, &mut host);

    let uci_event = trace_event(&uci, &regs, &ev(2, 2, Port::Call, "", 2));
    assert_eq!(session.trace_event(&uci_event, &mut host).unwrap(), TraceControl::Continue);
    assert_eq!(session.store().len(), 1, "no node for the compiler generated procedure");
}

#[test]
fn missing_layout_is_fatal() {
    let layout_p = layout(proc("p"));
    let mut bare = layout(proc("q"));
    bare.has_exec_trace = false;
    let regs = TestRegs;
    let mut host = ScriptedHost::default();

    let start_event = trace_event(&layout_p, &regs, &ev(4, 1, Port::Exit, "", 1));
    let (mut session, _) =
        Session::start(SessionMode::Diagnose, None, &start_event, &mut host, params(3)).unwrap();

    let event = trace_event(&bare, &regs, &ev(1, 1, Port::Call, "", 1));
    assert!(matches!(
        session.trace_event(&event, &mut host),
        Err(SessionError::LayoutMissing { .. })
    ));
}

#[test]
fn foreign_code_events_are_fatal() {
    let layout_p = layout(proc("p"));
    let regs = TestRegs;
    let mut host = ScriptedHost::default();

    let start_event = trace_event(&layout_p, &regs, &ev(4, 1, Port::Exit, "", 1));
    let (mut session, _) =
        Session::start(SessionMode::Diagnose, None, &start_event, &mut host, params(3)).unwrap();
    feed(&mut session, &layout_p, &regs, &[ev(1, 1, Port::Call, "", 1)], &mut host);

    let event = trace_event(&layout_p, &regs, &ev(2, 1, Port::PragmaFirst, "", 1));
    assert!(matches!(
        session.trace_event(&event, &mut host),
        Err(SessionError::ForeignCode { port: Port::PragmaFirst })
    ));
}

#[test]
fn bug_found_jumps_to_the_bug_event() {
    let events = [ev(1, 1, Port::Call, "", 1), ev(2, 1, Port::Exit, "", 1)];
    let mut host = ScriptedHost::answering([Diagnosis::BugFound { event: 1 }]);
    let (session, control) = run(&events, 1, 3, &mut host);

    match control {
        TraceControl::Resume(resumption) => {
            assert_eq!(resumption.command, TraceCommand::GotoEvent(1))
        },
        other => panic!("expected a goto, got {other:?}"),
    }
    assert!(!session.is_collecting());
}

#[test]
fn replay_failure_after_diagnosis_aborts_to_interactive() {
    let events = [ev(1, 1, Port::Call, "", 1), ev(2, 1, Port::Exit, "", 1)];
    let layout = layout(proc("p"));
    let regs = TestRegs;
    let mut host = ScriptedHost::answering([Diagnosis::BugFound { event: 1 }]);

    let start_event = trace_event(&layout, &regs, &events[1]);
    let (mut session, _) =
        Session::start(SessionMode::Diagnose, None, &start_event, &mut host, params(3)).unwrap();

    host.fail_retry = Some("no direct retry".into());
    let control = feed(&mut session, &layout, &regs, &events, &mut host);
    assert_eq!(control, TraceControl::Interactive);
    assert!(!session.is_collecting());
}

#[test]
fn subtree_restart_splices_into_the_existing_tree() {
    // First round materializes p1 at depth bound 1; the front end asks for the subtree under
    // the child call, anchored at the node preceding its CALL.
    let events = [
        ev(1, 1, Port::Call, "", 1),
        ev(2, 2, Port::Call, "", 2),
        ev(3, 3, Port::Call, "", 3),
        ev(4, 3, Port::Exit, "", 3),
        ev(5, 2, Port::Exit, "", 2),
        ev(6, 1, Port::Exit, "", 1),
    ];
    let layout = layout(proc("p"));
    let regs = TestRegs;
    let mut host = ScriptedHost::answering([Diagnosis::RequireSubtree {
        final_event: 5,
        topmost_seqno: 2,
        call_preceding: NodeId::from_u32_with_node_count(0, 1).unwrap(),
    }]);

    let start_event = trace_event(&layout, &regs, &events[5]);
    let (mut session, _) =
        Session::start(SessionMode::Diagnose, None, &start_event, &mut host, params(1)).unwrap();

    let control = feed(&mut session, &layout, &regs, &events, &mut host);
    match control {
        TraceControl::Resume(resumption) => {
            assert_eq!(resumption.command, TraceCommand::SingleStep)
        },
        other => panic!("expected a subtree restart, got {other:?}"),
    }
    let first_round = session.store().len();
    assert_eq!(first_round, 4);

    // The replayed run materializes the subtree rooted at seqno 2 with its own depth bound;
    // its first node links to the supplied anchor.
    let control = feed(&mut session, &layout, &regs, &events, &mut host);
    match control {
        TraceControl::Resume(resumption) => {
            assert_eq!(resumption.command, TraceCommand::GotoEvent(6))
        },
        other => panic!("expected diagnosis to finish, got {other:?}"),
    }

    let second: Vec<(u64, Port)> = session
        .store()
        .iter()
        .skip(first_round)
        .map(|(_, node)| (node.event_number(), node.port()))
        .collect();
    assert_eq!(
        second,
        vec![(2, Port::Call), (3, Port::Call), (4, Port::Exit), (5, Port::Exit)]
    );
    assert_eq!(session.store()[id(first_round as u32)].prev(), Some(id(0)));

    // Second diagnosis: root is the EXIT of seqno 2, and the io map computed for the first
    // round still covers the narrower interval.
    assert_eq!(host.requests.len(), 2);
    assert_eq!(host.requests[1].root_seqno, 2);
    assert!(!host.requests[0].use_old_io_map);
    assert!(host.requests[1].use_old_io_map);
}

#[test]
fn supertree_climb_is_clamped_at_the_bottom() {
    let events = [
        ev(1, 2, Port::Call, "", 2),
        ev(2, 2, Port::Exit, "", 2),
    ];
    let layout = layout(proc("p"));
    let regs = TestRegs;
    let mut host = ScriptedHost::answering([Diagnosis::RequireSupertree {
        final_event: 2,
        topmost_seqno: 2,
    }]);

    let start_event = trace_event(&layout, &regs, &events[1]);
    let (mut session, _) =
        Session::start(SessionMode::Diagnose, None, &start_event, &mut host, params(3)).unwrap();
    assert_eq!(session.topmost_call_depth(), 2);

    feed(&mut session, &layout, &regs, &events, &mut host);
    // A three-level climb from depth 2 bottoms out at depth 1.
    assert_eq!(session.topmost_call_depth(), 1);
}

#[test]
fn dump_session_writes_a_parsable_trace() {
    let events = [ev(1, 1, Port::Call, "", 1), ev(2, 1, Port::Exit, "", 1)];
    let layout = layout(proc("p"));
    let regs = TestRegs;
    let mut host = ScriptedHost::default();
    let path = std::env::temp_dir().join("edt-dump-session-test.bin");
    let path_str = path.to_str().unwrap();

    let start_event = trace_event(&layout, &regs, &events[1]);
    let (mut session, _) = Session::start(
        SessionMode::Dump,
        Some(path_str),
        &start_event,
        &mut host,
        params(3),
    )
    .unwrap();

    let control = feed(&mut session, &layout, &regs, &events, &mut host);
    assert_eq!(control, TraceControl::Interactive);
    assert!(host.requests.is_empty(), "a dump session never calls the front end");

    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).ok();
    let dump = TraceDump::read_from_bytes(&bytes).unwrap();
    assert_eq!(dump.store.len(), 2);
    assert_eq!(dump.root, id(1));
}

#[test]
fn trust_operations_pass_through_to_the_host() {
    use crate::{
        SearchMode, TrustListFormat, add_trusted_module, add_trusted_pred_or_func, remove_trusted,
        set_fallback_search_mode, trust_standard_library, trusted_list,
    };

    let mut host = ScriptedHost::default();
    add_trusted_module(&mut host, "io");
    add_trusted_pred_or_func(&mut host, &layout(proc("append")));
    trust_standard_library(&mut host);

    assert_eq!(
        trusted_list(&mut host, TrustListFormat::Plain),
        "module io\nproc test.append/2\nstandard library\n"
    );
    assert!(remove_trusted(&mut host, 0));
    assert!(!remove_trusted(&mut host, 5));
    assert_eq!(
        trusted_list(&mut host, TrustListFormat::Commands),
        "trust proc test.append/2\ntrust standard library\n"
    );

    set_fallback_search_mode(&mut host, SearchMode::DivideAndQuery);
    assert_eq!(host.search_mode, Some(SearchMode::DivideAndQuery));
}

// HELPERS
// ================================================================================================

fn id(raw: u32) -> NodeId {
    NodeId::from_u32_with_node_count(raw, u32::MAX as usize).unwrap()
}

fn host_jump(host: &ScriptedHost, _nth: usize) -> crate::JumpAddr {
    // Jumps are issued sequentially by the scripted host; the one accompanying the final
    // control is the latest.
    crate::JumpAddr::new(host.retries.len() as u64)
}

/// Follows the interface chain of a CALL from `last_interface` back to the CALL itself.
fn interface_chain(session: &Session, call: NodeId) -> Vec<NodeId> {
    let store = session.store();
    let mut chain = vec![store.get_last_interface(call).unwrap()];
    loop {
        let cur = *chain.last().unwrap();
        if cur == call {
            break;
        }
        let next = match &store[cur] {
            TraceNode::Exit(n) => n.prev_interface(),
            TraceNode::Redo(n) => n.prev_interface(),
            TraceNode::Fail(n) => n.prev_interface(),
            TraceNode::Excp(n) => n.prev_interface(),
            other => panic!("non-interface node {other:?} in chain"),
        };
        chain.push(next);
    }
    chain
}

//! Integration tests for pipe tree traversal
//!
//! Covers call order, stop handling in sequences and groups, and error
//! short-circuiting through the public handler API.

use std::sync::Arc;

use parking_lot::Mutex;
use pipehandle::handler::converter;
use pipehandle::{Args, Flow, GenericHandler, Handler, PipeGroup, Seed, Step};
use thiserror::Error;

#[derive(Debug, Clone, Default)]
struct Action {
    visits: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pipe failed: {0}")]
struct PipeFailure(&'static str);

type Log = Arc<Mutex<Vec<u32>>>;

fn record(log: &Log, id: u32) -> Step<Action> {
    let log = log.clone();
    Step::named(format!("record-{}", id), move |action: &mut Action, _| {
        action.visits += 1;
        log.lock().push(id);
        Ok(Flow::Continue)
    })
}

fn stopper(log: &Log, id: u32) -> Step<Action> {
    let log = log.clone();
    Step::named(format!("stop-{}", id), move |_: &mut Action, _| {
        log.lock().push(id);
        Ok(Flow::Stop)
    })
}

fn failing(log: &Log, id: u32, failure: PipeFailure) -> Step<Action> {
    let log = log.clone();
    Step::named(format!("fail-{}", id), move |_: &mut Action, _| {
        log.lock().push(id);
        Err(failure.clone().into())
    })
}

fn handler(pipes: PipeGroup<Action>) -> Handler<Action, GenericHandler> {
    Handler::new(pipes, Seed::from_value(Action::default()), converter::generic()).unwrap()
}

#[test]
fn test_group_of_sequences_runs_in_declared_order() {
    let log = Log::default();
    let pipes = PipeGroup::new()
        .sequence((1..=5).map(|id| record(&log, id)))
        .sequence((6..=10).map(|id| record(&log, id)));

    handler(pipes).produce()(Args::new()).unwrap();

    assert_eq!(*log.lock(), (1..=10).collect::<Vec<_>>());
}

#[test]
fn test_deeply_nested_groups_run_in_declared_order() {
    let log = Log::default();
    let pipes = PipeGroup::new()
        .sequence(vec![record(&log, 1), record(&log, 2)])
        .sequence(vec![record(&log, 3), record(&log, 4)])
        .group(
            PipeGroup::new()
                .sequence(vec![record(&log, 5), record(&log, 6)])
                .group(
                    PipeGroup::new()
                        .sequence(vec![record(&log, 7), record(&log, 8)])
                        .group(PipeGroup::new().sequence(vec![record(&log, 9), record(&log, 10)])),
                ),
        );

    handler(pipes).invoke(Args::new()).unwrap();

    assert_eq!(*log.lock(), (1..=10).collect::<Vec<_>>());
}

#[test]
fn test_stop_in_sequence_skips_rest_of_sequence_only() {
    let log = Log::default();
    let pipes = PipeGroup::new()
        .sequence(vec![stopper(&log, 1), record(&log, 2)])
        .sequence(vec![record(&log, 3)])
        .step(record(&log, 4));

    handler(pipes).invoke(Args::new()).unwrap();

    assert_eq!(*log.lock(), vec![1, 3, 4]);
}

#[test]
fn test_stop_in_nested_group_skips_following_groups() {
    let log = Log::default();
    let pipes = PipeGroup::new()
        .group(PipeGroup::new().step(stopper(&log, 1)))
        .group(PipeGroup::new().step(record(&log, 2)));

    let result = handler(pipes).invoke(Args::new());

    assert!(result.is_ok());
    assert_eq!(*log.lock(), vec![1]);
}

#[test]
fn test_stop_propagates_through_every_enclosing_group() {
    let log = Log::default();
    let pipes = PipeGroup::new()
        .group(
            PipeGroup::new()
                .group(PipeGroup::new().step(record(&log, 1)).step(stopper(&log, 2)))
                .step(record(&log, 3)),
        )
        .sequence(vec![record(&log, 4)]);

    handler(pipes).invoke(Args::new()).unwrap();

    assert_eq!(*log.lock(), vec![1, 2]);
}

#[test]
fn test_empty_nested_group_stops_the_walk() {
    let log = Log::default();
    let pipes = PipeGroup::new()
        .group(PipeGroup::new())
        .sequence(vec![record(&log, 1)]);

    handler(pipes).invoke(Args::new()).unwrap();

    assert!(log.lock().is_empty());
}

#[test]
fn test_stop_after_replace_continues_with_replacement() {
    let log = Log::default();
    let replace = Step::new(|_: &mut Action, _| Ok(Flow::Replace(Action { visits: 40 })));
    let observe = {
        let log = log.clone();
        Step::new(move |action: &mut Action, _| {
            log.lock().push(action.visits);
            Ok(Flow::Continue)
        })
    };
    let pipes = PipeGroup::new()
        .sequence(vec![replace, stopper(&log, 1), record(&log, 2)])
        .step(observe);

    handler(pipes).invoke(Args::new()).unwrap();

    assert_eq!(*log.lock(), vec![1, 40]);
}

#[test]
fn test_error_in_bare_step_returned_verbatim() {
    let log = Log::default();
    let pipes = PipeGroup::new()
        .step(failing(&log, 1, PipeFailure("bare")))
        .step(record(&log, 2));

    let err = handler(pipes).produce()(Args::new()).unwrap_err();

    assert_eq!(err.downcast_ref::<PipeFailure>(), Some(&PipeFailure("bare")));
    assert_eq!(*log.lock(), vec![1]);
}

#[test]
fn test_error_in_sequence_is_not_absorbed() {
    let log = Log::default();
    let pipes = PipeGroup::new()
        .sequence(vec![record(&log, 1), failing(&log, 2, PipeFailure("seq")), record(&log, 3)])
        .sequence(vec![record(&log, 4)]);

    let err = handler(pipes).invoke(Args::new()).unwrap_err();

    assert_eq!(err.downcast_ref::<PipeFailure>(), Some(&PipeFailure("seq")));
    assert_eq!(err.to_string(), "pipe failed: seq");
    assert_eq!(*log.lock(), vec![1, 2]);
}

#[test]
fn test_error_deep_in_tree_aborts_all_ancestors() {
    let log = Log::default();
    let pipes = PipeGroup::new()
        .group(
            PipeGroup::new()
                .group(PipeGroup::new().sequence(vec![failing(&log, 1, PipeFailure("deep"))]))
                .step(record(&log, 2)),
        )
        .step(record(&log, 3));

    let err = handler(pipes).invoke(Args::new()).unwrap_err();

    assert_eq!(err.downcast_ref::<PipeFailure>(), Some(&PipeFailure("deep")));
    assert_eq!(*log.lock(), vec![1]);
}

#[test]
fn test_steps_receive_invocation_args_unchanged() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let spy = {
        let seen = seen.clone();
        Step::new(move |_: &mut Action, args| {
            seen.lock().push((args.len(), args.get::<String>(1).cloned()));
            Ok(Flow::Continue)
        })
    };
    let pipes = PipeGroup::new()
        .step(spy.clone())
        .sequence(vec![spy.clone()])
        .group(PipeGroup::new().step(spy));

    handler(pipes)
        .invoke(Args::new().with(1_u8).with("route".to_string()))
        .unwrap();

    let expected = (2, Some("route".to_string()));
    assert_eq!(*seen.lock(), vec![expected.clone(), expected.clone(), expected]);
}

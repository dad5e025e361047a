//! Future-wrapping settlement tests.
//!
//! # Invariants Under Test
//!
//! 1. A wrapped future settles exactly once: natural completion or
//!    cancellation-rejection, never both
//! 2. Join-by-wait attaches to the in-flight task; one fire settles every
//!    joined future
//! 3. Join-by-replace forwards settlement onto the replacement, bounded by
//!    the forwarding depth
//! 4. Muted settlement routes to the muted-resolve handler or rejects with
//!    reason `muting`
//! 5. Paused settlement queues and runs on unpause

#[macro_use]
mod common;

use futures_lite::future::block_on;
use quash::{
    wrap_future, CancelReason, FutureSpec, Join, Manager, Marker, Namespace, NamespaceKind,
    Selector, MAX_FORWARD_DEPTH,
};
use std::cell::RefCell;
use std::rc::Rc;

const PROXY: Namespace = Namespace::promisified(NamespaceKind::Proxy);

// ============================================================================
// Exactly-once settlement
// ============================================================================

#[test]
fn natural_completion_resolves() {
    test_phase!("natural_completion_resolves");
    let mut manager = Manager::new();
    let (future, id) = wrap_future::<String>(&mut manager, FutureSpec::new()).unwrap();
    manager.fire_with(id, "done".to_owned());
    assert_eq!(block_on(future), Ok("done".to_owned()));
}

#[test]
fn cancellation_rejects_with_reason() {
    test_phase!("cancellation_rejects_with_reason");
    let mut manager = Manager::new();
    let (future, id) = wrap_future::<u32>(&mut manager, FutureSpec::new()).unwrap();
    manager.cancel(Selector::id(id), PROXY);
    let err = block_on(future).unwrap_err();
    assert_eq!(err.reason, CancelReason::Id);
}

#[test]
fn settle_then_cancel_keeps_first_settlement() {
    test_phase!("settle_then_cancel_keeps_first_settlement");
    let mut manager = Manager::new();
    let (future, id) = wrap_future::<u32>(&mut manager, FutureSpec::new()).unwrap();
    manager.fire_with(id, 1_u32);
    // The racing cancel targets an already-completed task: absorbed.
    manager.cancel(Selector::id(id), PROXY);
    assert_eq!(block_on(future), Ok(1));
}

#[test]
fn fire_without_a_usable_value_rejects_with_mismatch() {
    test_phase!("fire_without_a_usable_value_rejects_with_mismatch");
    let mut manager = Manager::new();
    let (future, id) = wrap_future::<u32>(&mut manager, FutureSpec::new()).unwrap();
    manager.fire(id, None);
    // The one-shot task is gone; the future must not hang unsettled.
    assert!(!manager.contains(id));
    let err = block_on(future).unwrap_err();
    assert_eq!(err.reason, CancelReason::Mismatch);

    let (future, id) = wrap_future::<u32>(&mut manager, FutureSpec::new()).unwrap();
    manager.fire_with(id, "not a number".to_owned());
    assert_eq!(block_on(future).unwrap_err().reason, CancelReason::Mismatch);
}

#[test]
fn cancel_then_fire_keeps_the_rejection() {
    test_phase!("cancel_then_fire_keeps_the_rejection");
    let mut manager = Manager::new();
    let (future, id) = wrap_future::<u32>(&mut manager, FutureSpec::new()).unwrap();
    manager.cancel(Selector::id(id), PROXY);
    manager.fire_with(id, 1_u32);
    let err = block_on(future).unwrap_err();
    assert_eq!(err.reason, CancelReason::Id);
}

// ============================================================================
// Joining
// ============================================================================

#[test]
fn join_wait_settles_every_joined_future_from_one_fire() {
    test_phase!("join_wait_settles_every_joined_future_from_one_fire");
    let mut manager = Manager::new();
    let (first, id_a) = wrap_future::<u32>(
        &mut manager,
        FutureSpec::new().label("fetch").join(Join::Wait),
    )
    .unwrap();
    let (second, id_b) = wrap_future::<u32>(
        &mut manager,
        FutureSpec::new().label("fetch").join(Join::Wait),
    )
    .unwrap();
    assert_eq!(id_a, id_b);

    manager.fire_with(id_a, 9_u32);
    assert_eq!(block_on(first), Ok(9));
    assert_eq!(block_on(second), Ok(9));
}

#[test]
fn join_replace_forwards_settlement_onto_replacement() {
    test_phase!("join_replace_forwards_settlement_onto_replacement");
    let mut manager = Manager::new();
    let (displaced, first_id) = wrap_future::<u32>(
        &mut manager,
        FutureSpec::new().label("fetch").join(Join::Replace),
    )
    .unwrap();
    let (replacement, second_id) = wrap_future::<u32>(
        &mut manager,
        FutureSpec::new().label("fetch").join(Join::Replace),
    )
    .unwrap();
    assert_ne!(first_id, second_id);
    assert!(!manager.contains(first_id));
    assert!(displaced.try_settled().is_none());

    manager.fire_with(second_id, 5_u32);
    assert_eq!(block_on(displaced), Ok(5));
    assert_eq!(block_on(replacement), Ok(5));
}

#[test]
fn join_none_rejects_the_displaced_future() {
    test_phase!("join_none_rejects_the_displaced_future");
    let mut manager = Manager::new();
    let (displaced, _) =
        wrap_future::<u32>(&mut manager, FutureSpec::new().label("fetch")).unwrap();
    wrap_future::<u32>(&mut manager, FutureSpec::new().label("fetch")).unwrap();
    let err = block_on(displaced).unwrap_err();
    assert_eq!(err.reason, CancelReason::Collision);
}

#[test]
fn forwarding_depth_is_bounded() {
    test_phase!("forwarding_depth_is_bounded");
    let mut manager = Manager::new();
    let (oldest, _) = wrap_future::<u32>(
        &mut manager,
        FutureSpec::new().label("fetch").join(Join::Replace),
    )
    .unwrap();

    let mut last_id = None;
    for _ in 0..=MAX_FORWARD_DEPTH {
        let (_future, id) = wrap_future::<u32>(
            &mut manager,
            FutureSpec::new().label("fetch").join(Join::Replace),
        )
        .unwrap();
        last_id = Some(id);
    }

    // The oldest settler ran out of hops and was rejected instead of
    // riding along forever.
    let err = block_on(oldest).unwrap_err();
    assert_eq!(err.reason, CancelReason::Collision);

    // The survivor still settles normally.
    let (newest, id) = wrap_future::<u32>(
        &mut manager,
        FutureSpec::new().label("fetch").join(Join::Replace),
    )
    .unwrap();
    let _ = last_id;
    manager.fire_with(id, 3_u32);
    assert_eq!(block_on(newest), Ok(3));
}

// ============================================================================
// Muted and paused settlement
// ============================================================================

#[test]
fn muted_settlement_routes_to_handler() {
    test_phase!("muted_settlement_routes_to_handler");
    let mut manager = Manager::new();
    let swallowed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&swallowed);
    let (future, id) = wrap_future::<u32>(
        &mut manager,
        FutureSpec::new().on_muted_resolve(move |value| sink.borrow_mut().push(value)),
    )
    .unwrap();

    manager.mark(Marker::Muted, Selector::id(id), PROXY);
    manager.fire_with(id, 4_u32);
    assert_eq!(*swallowed.borrow(), vec![4]);
    assert!(future.try_settled().is_none());

    // The muted fire did not unregister the task; cancelling it still works.
    manager.cancel(Selector::id(id), PROXY);
    let err = block_on(future).unwrap_err();
    assert_eq!(err.reason, CancelReason::Id);
}

#[test]
fn muted_settlement_without_handler_rejects_with_muting() {
    test_phase!("muted_settlement_without_handler_rejects_with_muting");
    let mut manager = Manager::new();
    let (future, id) = wrap_future::<u32>(&mut manager, FutureSpec::new()).unwrap();
    manager.mark(Marker::Muted, Selector::id(id), PROXY);
    manager.fire_with(id, 4_u32);
    let err = block_on(future).unwrap_err();
    assert_eq!(err.reason, CancelReason::Muting);
}

#[test]
fn paused_settlement_runs_on_unpause() {
    test_phase!("paused_settlement_runs_on_unpause");
    let mut manager = Manager::new();
    let (future, id) = wrap_future::<u32>(&mut manager, FutureSpec::new()).unwrap();
    manager.mark(Marker::Paused, Selector::id(id), PROXY);
    manager.fire_with(id, 8_u32);
    assert!(future.try_settled().is_none());

    manager.mark(Marker::Unpaused, Selector::id(id), PROXY);
    assert_eq!(block_on(future), Ok(8));
}

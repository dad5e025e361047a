//! Future wrapping: a settlable future built on a registered task.
//!
//! `wrap_future` registers a task in a promisified namespace and returns a
//! [`TaskFuture`] that settles exactly once:
//!
//! - a fire with a `T` resolves it; a fire without one (no data, or data
//!   of another type) rejects with reason `mismatch`;
//! - cancellation rejects it with a [`Cancellation`] descriptor;
//! - a label collision under [`Join::Replace`] forwards the settlement
//!   onto the replacement task instead of rejecting, up to
//!   [`MAX_FORWARD_DEPTH`](crate::manager::MAX_FORWARD_DEPTH) hops;
//! - a fire while muted goes to the configured muted-resolve handler, or
//!   rejects with reason `muting` when none is configured;
//! - a fire while paused queues and settles on unpause.
//!
//! Settlement state lives behind an `Arc<Mutex<_>>` with a stored waker.
//! The future side is a plain `poll` over that state; dropping the future
//! before settlement is fine, the task stays independently reachable
//! through the cache hierarchy.

use crate::manager::task::{CompletePair, Wrapper};
use crate::manager::{Join, Manager, RegisterSpec};
use crate::types::{CancelReason, Cancellation, Namespace, NamespaceKind, RawLink, TaskId};
use core::fmt;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

enum State<T> {
    Pending,
    Settled(Result<T, Cancellation>),
}

struct Inner<T> {
    state: State<T>,
    waker: Option<Waker>,
}

/// Settles the shared state. Cloned into the task's handlers; the first
/// settle wins, every later one is a no-op.
struct Settler<T> {
    shared: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for Settler<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Settler<T> {
    fn settle(&self, result: Result<T, Cancellation>) -> bool {
        let mut inner = self.shared.lock();
        if !matches!(inner.state, State::Pending) {
            return false;
        }
        inner.state = State::Settled(result);
        if let Some(waker) = inner.waker.take() {
            waker.wake();
        }
        true
    }

    fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    fn reject(&self, cancellation: Cancellation) -> bool {
        self.settle(Err(cancellation))
    }
}

/// A settlable future backed by a registered task.
///
/// Output is `Result<T, Cancellation>`: natural completion resolves,
/// cancellation rejects, never both. The future is freestanding — dropping
/// it does not cancel the underlying task.
pub struct TaskFuture<T> {
    shared: Arc<Mutex<Inner<T>>>,
}

impl<T> fmt::Debug for TaskFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settled = !matches!(self.shared.lock().state, State::Pending);
        f.debug_struct("TaskFuture")
            .field("settled", &settled)
            .finish_non_exhaustive()
    }
}

impl<T: Clone> TaskFuture<T> {
    /// Non-blocking peek at the settlement, if any.
    #[must_use]
    pub fn try_settled(&self) -> Option<Result<T, Cancellation>> {
        match &self.shared.lock().state {
            State::Pending => None,
            State::Settled(result) => Some(result.clone()),
        }
    }
}

impl<T: Clone> Future for TaskFuture<T> {
    type Output = Result<T, Cancellation>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.shared.lock();
        match &inner.state {
            State::Settled(result) => Poll::Ready(result.clone()),
            State::Pending => {
                inner.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Options for [`wrap_future`].
pub struct FutureSpec<T> {
    namespace: Namespace,
    group: Option<String>,
    label: Option<String>,
    join: Join,
    wrapper: Option<Wrapper>,
    link_by_wrapper: bool,
    destructor: Option<crate::manager::task::Destructor>,
    on_muted_resolve: Option<Box<dyn FnMut(T)>>,
}

impl<T> Default for FutureSpec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FutureSpec<T> {
    /// Starts a spec; the default namespace is the promisified proxy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            namespace: Namespace::promisified(NamespaceKind::Proxy),
            group: None,
            label: None,
            join: Join::None,
            wrapper: None,
            link_by_wrapper: false,
            destructor: None,
            on_muted_resolve: None,
        }
    }

    /// Registers the backing task in a different promisified namespace
    /// (requests, iterables, ...).
    #[must_use]
    pub fn namespace(mut self, kind: NamespaceKind) -> Self {
        self.namespace = Namespace::promisified(kind);
        self
    }

    /// Groups the backing task.
    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Labels the backing task.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the label-collision policy. [`Join::Replace`] makes this
    /// future's settlement survive being displaced: it forwards onto the
    /// replacement task instead of rejecting.
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.join = join;
        self
    }

    /// Arms a platform call for the backing task (e.g. start the request).
    #[must_use]
    pub fn wrapper<F>(mut self, wrapper: F) -> Self
    where
        F: FnOnce(crate::types::FireToken) -> Option<RawLink> + 'static,
    {
        self.wrapper = Some(Box::new(wrapper));
        self
    }

    /// Adopts the wrapper's return value as the task link.
    #[must_use]
    pub fn link_by_wrapper(mut self) -> Self {
        self.link_by_wrapper = true;
        self
    }

    /// Sets the platform teardown for the backing task.
    #[must_use]
    pub fn destructor<F>(mut self, destructor: F) -> Self
    where
        F: FnMut(RawLink) + 'static,
    {
        self.destructor = Some(Box::new(destructor));
        self
    }

    /// Routes a settlement that lands while the task is muted to this
    /// handler instead of resolving. Without one, a muted settlement
    /// rejects with reason `muting`.
    #[must_use]
    pub fn on_muted_resolve<F>(mut self, handler: F) -> Self
    where
        F: FnMut(T) + 'static,
    {
        self.on_muted_resolve = Some(Box::new(handler));
        self
    }
}

impl<T> fmt::Debug for FutureSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FutureSpec")
            .field("namespace", &self.namespace)
            .field("group", &self.group)
            .field("label", &self.label)
            .field("join", &self.join)
            .finish_non_exhaustive()
    }
}

/// Builds a settlable future on top of a registered task.
///
/// Returns the future and the backing task's id — fire the id with a `T`
/// to resolve, cancel it to reject. On a [`Join::Wait`] label hit the
/// returned id is the in-flight task's. Returns `None` when the manager is
/// locked.
pub fn wrap_future<T>(
    manager: &mut Manager,
    spec: FutureSpec<T>,
) -> Option<(TaskFuture<T>, TaskId)>
where
    T: Clone + 'static,
{
    let shared = Arc::new(Mutex::new(Inner {
        state: State::Pending,
        waker: None,
    }));
    let settler = Settler {
        shared: Arc::clone(&shared),
    };

    let on_success = {
        let settler = settler.clone();
        Box::new(move |data: Option<&dyn std::any::Any>| {
            // The backing one-shot task is already unregistered by the time
            // this runs, so a miss here must still settle the future.
            match data.and_then(|data| data.downcast_ref::<T>()) {
                Some(value) => {
                    settler.resolve(value.clone());
                }
                None => {
                    settler.reject(Cancellation {
                        reason: CancelReason::Mismatch,
                        link: None,
                    });
                }
            }
        })
    };
    let on_failure = {
        let settler = settler.clone();
        Box::new(move |cancellation: &Cancellation| {
            settler.reject(*cancellation);
        })
    };
    let pair = CompletePair {
        on_success,
        on_failure,
        forwardable: spec.join == Join::Replace,
        depth: 0,
    };

    let muted = {
        let settler = settler.clone();
        let mut on_muted_resolve = spec.on_muted_resolve;
        move |data: Option<&dyn std::any::Any>| {
            let value = data.and_then(|data| data.downcast_ref::<T>());
            match (&mut on_muted_resolve, value) {
                (Some(handler), Some(value)) => handler(value.clone()),
                _ => {
                    settler.reject(Cancellation {
                        reason: CancelReason::Muting,
                        link: None,
                    });
                }
            }
        }
    };

    let mut register = RegisterSpec::new(spec.namespace)
        .maybe_group(spec.group)
        .maybe_label(spec.label)
        .join(spec.join)
        .on_complete_pair(pair)
        .on_muted_call(muted);
    if let Some(wrapper) = spec.wrapper {
        register.wrapper = Some(wrapper);
        register.link_by_wrapper = spec.link_by_wrapper;
    }
    register.destructor = spec.destructor;

    let id = manager.register(register)?;
    Some((TaskFuture { shared }, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::Selector;

    const NS: Namespace = Namespace::promisified(NamespaceKind::Proxy);

    #[test]
    fn fire_resolves_the_future() {
        let mut manager = Manager::new();
        let (future, id) = wrap_future::<u32>(&mut manager, FutureSpec::new()).unwrap();
        assert!(future.try_settled().is_none());
        manager.fire_with(id, 7_u32);
        assert_eq!(future.try_settled(), Some(Ok(7)));
        assert!(!manager.contains(id));
    }

    #[test]
    fn cancel_rejects_with_descriptor() {
        let mut manager = Manager::new();
        let (future, id) = wrap_future::<u32>(&mut manager, FutureSpec::new()).unwrap();
        manager.cancel(Selector::id(id), NS);
        let err = future.try_settled().unwrap().unwrap_err();
        assert_eq!(err.reason, CancelReason::Id);
    }

    #[test]
    fn locked_manager_wraps_nothing() {
        let mut manager = Manager::new();
        manager.lock();
        assert!(wrap_future::<u32>(&mut manager, FutureSpec::new()).is_none());
    }
}

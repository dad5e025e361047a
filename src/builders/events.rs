//! Event-listener builders over an explicit emitter capability adapter.

use crate::builders::BuilderOpts;
use crate::error::Error;
use crate::manager::{Manager, RegisterSpec};
use crate::types::{FireToken, Namespace, NamespaceKind, RawLink, TaskId};
use core::fmt;
use std::any::Any;

type AttachFn = Box<dyn FnOnce(&str, FireToken) -> Option<RawLink>>;
type DetachFn = Box<dyn Fn(&str, RawLink)>;

/// Capability adapter for a foreign event emitter.
///
/// Call sites adapt whatever attach/detach surface their emitter exposes
/// into these two closures once, at registration time. An adapter missing
/// either capability fails registration with
/// [`ErrorKind::MissingCapability`](crate::ErrorKind::MissingCapability) —
/// that is programmer error, not a runtime race, and is not swallowed.
#[derive(Default)]
pub struct EmitterAdapter {
    attach: Option<AttachFn>,
    detach: Option<DetachFn>,
}

impl EmitterAdapter {
    /// Starts an empty adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies the attach capability: subscribe a handler, return the
    /// emitter's own listener handle (or nothing).
    #[must_use]
    pub fn with_attach<F>(mut self, attach: F) -> Self
    where
        F: FnOnce(&str, FireToken) -> Option<RawLink> + 'static,
    {
        self.attach = Some(Box::new(attach));
        self
    }

    /// Supplies the detach capability: unsubscribe by listener handle.
    /// Must be idempotent-safe.
    #[must_use]
    pub fn with_detach<F>(mut self, detach: F) -> Self
    where
        F: Fn(&str, RawLink) + 'static,
    {
        self.detach = Some(Box::new(detach));
        self
    }
}

impl fmt::Debug for EmitterAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterAdapter")
            .field("attach", &self.attach.is_some())
            .field("detach", &self.detach.is_some())
            .finish()
    }
}

fn listen_inner<F>(
    manager: &mut Manager,
    adapter: EmitterAdapter,
    event: &str,
    periodic: bool,
    opts: BuilderOpts,
    payload: F,
) -> Result<Option<TaskId>, Error>
where
    F: FnMut(Option<&dyn Any>) + 'static,
{
    let Some(attach) = adapter.attach else {
        return Err(Error::missing_capability(
            "emitter adapter has no attach capability",
        ));
    };
    let Some(detach) = adapter.detach else {
        return Err(Error::missing_capability(
            "emitter adapter has no detach capability",
        ));
    };
    let attach_event = event.to_owned();
    let detach_event = event.to_owned();
    let id = manager.register(
        RegisterSpec::new(Namespace::new(NamespaceKind::EventListener))
            .maybe_group(opts.group)
            .maybe_label(opts.label)
            .join(opts.join)
            .periodic(periodic)
            .payload(payload)
            .wrapper(move |token| attach(&attach_event, token))
            .link_by_wrapper()
            .destructor(move |link| detach(&detach_event, link)),
    );
    Ok(id)
}

/// Subscribes a periodic listener in the `event-listener` namespace.
///
/// The listener re-fires on every event until cancelled; cancellation
/// detaches through the adapter.
pub fn listen<F>(
    manager: &mut Manager,
    adapter: EmitterAdapter,
    event: &str,
    opts: BuilderOpts,
    payload: F,
) -> Result<Option<TaskId>, Error>
where
    F: FnMut(Option<&dyn Any>) + 'static,
{
    listen_inner(manager, adapter, event, true, opts, payload)
}

/// Subscribes a one-shot listener: the first event delivers the payload
/// and unregisters the task.
pub fn listen_once<F>(
    manager: &mut Manager,
    adapter: EmitterAdapter,
    event: &str,
    opts: BuilderOpts,
    payload: F,
) -> Result<Option<TaskId>, Error>
where
    F: FnMut(Option<&dyn Any>) + 'static,
{
    listen_inner(manager, adapter, event, false, opts, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::manager::Selector;
    use std::cell::RefCell;
    use std::rc::Rc;

    const NS: Namespace = Namespace::new(NamespaceKind::EventListener);

    /// Minimal emitter: event name -> subscribed tokens.
    #[derive(Default)]
    struct FakeEmitter {
        listeners: RefCell<Vec<(String, FireToken, RawLink)>>,
        next: std::cell::Cell<u64>,
    }

    impl FakeEmitter {
        fn adapter(self: &Rc<Self>) -> EmitterAdapter {
            let on = Rc::clone(self);
            let off = Rc::clone(self);
            EmitterAdapter::new()
                .with_attach(move |event, token| {
                    let handle = RawLink(on.next.get());
                    on.next.set(on.next.get() + 1);
                    on.listeners
                        .borrow_mut()
                        .push((event.to_owned(), token, handle));
                    Some(handle)
                })
                .with_detach(move |event, link| {
                    off.listeners
                        .borrow_mut()
                        .retain(|(name, _, handle)| name != event || *handle != link);
                })
        }

        fn emit(&self, event: &str, manager: &mut Manager) {
            let tokens: Vec<FireToken> = self
                .listeners
                .borrow()
                .iter()
                .filter(|(name, _, _)| name == event)
                .map(|(_, token, _)| *token)
                .collect();
            for token in tokens {
                manager.fire(token.task(), None);
            }
        }
    }

    #[test]
    fn missing_attach_raises_missing_capability() {
        let mut manager = Manager::new();
        let adapter = EmitterAdapter::new().with_detach(|_, _| {});
        let err = listen(&mut manager, adapter, "close", BuilderOpts::default(), |_| {})
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingCapability);
    }

    #[test]
    fn listener_survives_fires_and_detaches_on_cancel() {
        let mut manager = Manager::new();
        let emitter = Rc::new(FakeEmitter::default());
        let fired = Rc::new(std::cell::Cell::new(0));
        let seen = Rc::clone(&fired);
        let id = listen(
            &mut manager,
            emitter.adapter(),
            "data",
            BuilderOpts::default(),
            move |_| seen.set(seen.get() + 1),
        )
        .unwrap()
        .unwrap();

        emitter.emit("data", &mut manager);
        emitter.emit("data", &mut manager);
        assert_eq!(fired.get(), 2);
        assert!(manager.contains(id));

        manager.cancel(Selector::id(id), NS);
        assert!(emitter.listeners.borrow().is_empty());
        emitter.emit("data", &mut manager);
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn listen_once_unregisters_after_first_event() {
        let mut manager = Manager::new();
        let emitter = Rc::new(FakeEmitter::default());
        let fired = Rc::new(std::cell::Cell::new(0));
        let seen = Rc::clone(&fired);
        let id = listen_once(
            &mut manager,
            emitter.adapter(),
            "open",
            BuilderOpts::default(),
            move |_| seen.set(seen.get() + 1),
        )
        .unwrap()
        .unwrap();

        emitter.emit("open", &mut manager);
        assert_eq!(fired.get(), 1);
        assert!(!manager.contains(id));
        // A second emit hits a stale token and is absorbed.
        emitter.emit("open", &mut manager);
        assert_eq!(fired.get(), 1);
    }
}

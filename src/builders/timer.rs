//! Timer-family builders: timeout, interval, immediate, idle, frame.

use crate::builders::BuilderOpts;
use crate::manager::{Manager, RegisterSpec};
use crate::types::{FireToken, Namespace, NamespaceKind, RawLink, TaskId};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

/// The host's scheduling capability.
///
/// `arm` schedules a callback and returns an identity-ish handle (or
/// nothing); the host later re-enters with
/// [`Manager::fire`](crate::Manager::fire) using the token it was given.
/// `disarm` must be idempotent-safe for any previously-returned handle.
/// A `None` delay means "as soon as the host sees fit" (immediates, idle
/// callbacks, animation frames).
pub trait TimerHost {
    /// Schedules a callback after `delay`.
    fn arm(&self, delay: Option<Duration>, token: FireToken) -> Option<RawLink>;

    /// Unschedules a previously-armed callback.
    fn disarm(&self, link: RawLink);
}

fn schedule<H, F>(
    manager: &mut Manager,
    host: &Arc<H>,
    namespace: Namespace,
    delay: Option<Duration>,
    periodic: bool,
    opts: BuilderOpts,
    payload: F,
) -> Option<TaskId>
where
    H: TimerHost + 'static,
    F: FnMut(Option<&dyn Any>) + 'static,
{
    let arm = Arc::clone(host);
    let disarm = Arc::clone(host);
    manager.register(
        RegisterSpec::new(namespace)
            .maybe_group(opts.group)
            .maybe_label(opts.label)
            .join(opts.join)
            .periodic(periodic)
            .payload(payload)
            .wrapper(move |token| arm.arm(delay, token))
            .link_by_wrapper()
            .destructor(move |link| disarm.disarm(link)),
    )
}

/// Registers a one-shot timer in the `timeout` namespace.
pub fn set_timeout<H, F>(
    manager: &mut Manager,
    host: &Arc<H>,
    delay: Duration,
    opts: BuilderOpts,
    payload: F,
) -> Option<TaskId>
where
    H: TimerHost + 'static,
    F: FnMut(Option<&dyn Any>) + 'static,
{
    schedule(
        manager,
        host,
        Namespace::new(NamespaceKind::Timeout),
        Some(delay),
        false,
        opts,
        payload,
    )
}

/// Registers a periodic timer in the `interval` namespace.
pub fn set_interval<H, F>(
    manager: &mut Manager,
    host: &Arc<H>,
    period: Duration,
    opts: BuilderOpts,
    payload: F,
) -> Option<TaskId>
where
    H: TimerHost + 'static,
    F: FnMut(Option<&dyn Any>) + 'static,
{
    schedule(
        manager,
        host,
        Namespace::new(NamespaceKind::Interval),
        Some(period),
        true,
        opts,
        payload,
    )
}

/// Registers a run-as-soon-as-possible callback in the `immediate`
/// namespace.
pub fn set_immediate<H, F>(
    manager: &mut Manager,
    host: &Arc<H>,
    opts: BuilderOpts,
    payload: F,
) -> Option<TaskId>
where
    H: TimerHost + 'static,
    F: FnMut(Option<&dyn Any>) + 'static,
{
    schedule(
        manager,
        host,
        Namespace::new(NamespaceKind::Immediate),
        None,
        false,
        opts,
        payload,
    )
}

/// Registers a host idle-period callback in the `idle-callback` namespace.
pub fn request_idle_callback<H, F>(
    manager: &mut Manager,
    host: &Arc<H>,
    opts: BuilderOpts,
    payload: F,
) -> Option<TaskId>
where
    H: TimerHost + 'static,
    F: FnMut(Option<&dyn Any>) + 'static,
{
    schedule(
        manager,
        host,
        Namespace::new(NamespaceKind::IdleCallback),
        None,
        false,
        opts,
        payload,
    )
}

/// Registers a host animation-frame callback in the `animation-frame`
/// namespace.
pub fn request_animation_frame<H, F>(
    manager: &mut Manager,
    host: &Arc<H>,
    opts: BuilderOpts,
    payload: F,
) -> Option<TaskId>
where
    H: TimerHost + 'static,
    F: FnMut(Option<&dyn Any>) + 'static,
{
    schedule(
        manager,
        host,
        Namespace::new(NamespaceKind::AnimationFrame),
        None,
        false,
        opts,
        payload,
    )
}

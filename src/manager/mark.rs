//! State marking: mute, unmute, pause, unpause.

use crate::manager::cancel::Selector;
use crate::manager::Manager;
use crate::types::{CancelReason, Marker, Namespace, TaskId};

impl Manager {
    /// Applies `marker` to whatever `selector` resolves to in `namespace`.
    ///
    /// Selector resolution and the zombie guard are identical to
    /// [`cancel`](Self::cancel). `Unpaused` clears both the paused and
    /// muted flags and then flushes the pending-invocation queue in FIFO
    /// order through the full fire semantics — pausing defers work, it
    /// never drops it.
    pub fn mark(
        &mut self,
        marker: Marker,
        selector: Selector,
        namespace: Namespace,
    ) -> &mut Self {
        for (id, reason) in self.resolve_selector(&selector, namespace) {
            self.mark_task(id, marker, reason);
        }
        self
    }

    pub(crate) fn mark_task(&mut self, id: TaskId, marker: Marker, reason: CancelReason) {
        if reason == CancelReason::All {
            let zombie = self
                .tasks
                .get(id.arena())
                .and_then(|task| task.group.as_deref())
                .is_some_and(crate::manager::is_zombie_group);
            if zombie {
                return;
            }
        }
        let Some(task) = self.tasks.get_mut(id.arena()) else {
            return;
        };
        if task.unregistered {
            return;
        }
        match marker {
            Marker::Muted => task.muted = true,
            Marker::Unmuted => task.muted = false,
            Marker::Paused => task.paused = true,
            Marker::Unpaused => {
                task.paused = false;
                task.muted = false;
                let pending: Vec<_> = task.pending.drain(..).collect();
                for data in pending {
                    self.fire_inner(id, data);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::register::RegisterSpec;
    use crate::types::NamespaceKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    const NS: Namespace = Namespace::new(NamespaceKind::Interval);

    #[test]
    fn unpause_clears_mute_and_flushes_fifo() {
        let mut manager = Manager::new();
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);
        let id = manager
            .register(RegisterSpec::new(NS).periodic(true).payload(move |data| {
                let value = data
                    .and_then(|d| d.downcast_ref::<u32>())
                    .copied()
                    .unwrap_or_default();
                sink.borrow_mut().push(value);
            }))
            .unwrap();

        manager.mark(Marker::Paused, Selector::id(id), NS);
        manager.mark(Marker::Muted, Selector::id(id), NS);
        manager.fire_with(id, 1_u32);
        manager.fire_with(id, 2_u32);
        assert!(fired.borrow().is_empty());

        manager.mark(Marker::Unpaused, Selector::id(id), NS);
        // Deferred work runs unmuted, in queue order.
        assert_eq!(*fired.borrow(), vec![1, 2]);

        manager.fire_with(id, 3_u32);
        assert_eq!(*fired.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn mark_of_missing_task_is_a_no_op() {
        let mut manager = Manager::new();
        let stale = crate::types::TaskId::new_for_test(7, 3);
        manager.mark(Marker::Paused, Selector::id(stale), NS);
        manager.mark(Marker::Unpaused, Selector::All, NS);
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility callbacks held through a replaceable slot.
//!
//! Hosts typically rebuild their closures on every render while a tracked view
//! stays registered. A [`VisibilityCallback`] is a shared, single-slot holder:
//! the coordinator keeps one clone for the lifetime of a registration and the
//! host keeps another, replacing the closure with [`VisibilityCallback::set`]
//! whenever it changes. The coordinator always reads through the slot at fire
//! time, so the most recently installed closure is the one that runs.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

type Handler = Rc<dyn Fn(bool)>;

/// Shared slot holding the current `on_visibility_change` closure.
///
/// Cloning a `VisibilityCallback` clones the *slot*, not the closure: every
/// clone observes replacements made through any other clone.
#[derive(Clone)]
pub struct VisibilityCallback {
    slot: Rc<RefCell<Handler>>,
}

impl VisibilityCallback {
    /// Creates a slot holding `handler`.
    pub fn new(handler: impl Fn(bool) + 'static) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Rc::new(handler))),
        }
    }

    /// Creates a slot whose handler ignores every notification.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Replaces the handler. Subsequent notifications go to `handler`.
    pub fn set(&self, handler: impl Fn(bool) + 'static) {
        *self.slot.borrow_mut() = Rc::new(handler);
    }

    /// Invokes the current handler with the new visibility.
    ///
    /// The slot is not borrowed while the handler runs, so a handler may
    /// replace itself.
    pub fn call(&self, is_visible: bool) {
        let handler = Rc::clone(&self.slot.borrow());
        handler(is_visible);
    }

    /// Returns `true` if both values share the same slot.
    #[must_use]
    pub fn same_slot(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl fmt::Debug for VisibilityCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityCallback")
            .field("holders", &Rc::strong_count(&self.slot))
            .finish_non_exhaustive()
    }
}

impl<F> From<F> for VisibilityCallback
where
    F: Fn(bool) + 'static,
{
    fn from(handler: F) -> Self {
        Self::new(handler)
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::VisibilityCallback;

    #[test]
    fn replacement_is_seen_through_every_clone() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&log);
        let callback = VisibilityCallback::new(move |v| first.borrow_mut().push(("first", v)));
        let held = callback.clone();

        held.call(true);
        let second = Rc::clone(&log);
        callback.set(move |v| second.borrow_mut().push(("second", v)));
        held.call(false);

        assert_eq!(*log.borrow(), [("first", true), ("second", false)]);
        assert!(held.same_slot(&callback));
        assert!(!held.same_slot(&VisibilityCallback::noop()));
    }

    #[test]
    fn handler_may_replace_itself_while_running() {
        let hits = Rc::new(RefCell::new(0_u32));
        let callback = VisibilityCallback::noop();
        let slot = callback.clone();
        let counter = Rc::clone(&hits);
        callback.set(move |_| {
            *counter.borrow_mut() += 1;
            slot.set(|_| {});
        });

        callback.call(true);
        callback.call(false);
        assert_eq!(*hits.borrow(), 1);
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The viewability coordinator: a registry of tracked views measured against one root.

use core::fmt::Debug;
use core::hash::Hash;
use core::sync::atomic::{AtomicUsize, Ordering};

use hashbrown::HashMap;
use kurbo::Rect;
use log::{debug, trace};
use smallvec::SmallVec;

use crate::callback::VisibilityCallback;
use crate::config::{ViewabilityConfig, normalize_threshold};
use crate::error::ViewabilityError;
use crate::geometry::viewable_in;
use crate::measure::{Measure, MeasureTarget, MeasureTicket, Measurement};

static NEXT_COORDINATOR_ID: AtomicUsize = AtomicUsize::new(1);

/// Process-unique identity of a [`ViewabilityCoordinator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CoordinatorId(usize);

impl CoordinatorId {
    fn next() -> Self {
        Self(NEXT_COORDINATOR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Stamp identifying one registration of a view key.
///
/// Registering the same key again produces a new, larger stamp. Measurements
/// issued for an older stamp are discarded when they complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Registration(u64);

/// Outcome of [`ViewabilityCoordinator::complete_measurement`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Completion {
    /// The rectangle was stored and visibility re-checked.
    Applied,
    /// A measurement issued later for the same target was already applied.
    Stale,
    /// The target was unregistered or registered again since the ticket was issued.
    Cancelled,
    /// The provider could not measure the target; the last known rectangle is kept.
    Unavailable,
}

#[derive(Clone, Debug)]
struct RootEntry<K> {
    handle: Option<K>,
    rect: Rect,
    measured: bool,
    registration: u64,
    applied: u64,
}

#[derive(Clone, Debug)]
struct ViewEntry {
    is_visible: bool,
    rect: Rect,
    callback: VisibilityCallback,
    threshold_percent: f64,
    registration: u64,
    applied: u64,
}

#[derive(Clone, Copy, Debug, Default)]
struct Counters {
    issued: u64,
    unavailable: u64,
    stale: u64,
    cancelled: u64,
    transitions: u64,
}

/// Tracks which registered views are visible inside a root viewport.
///
/// The coordinator owns a registry of tracked views keyed by an opaque host
/// handle `K`, the root's last measured rectangle, and a [`Measure`] provider
/// that turns handles into rectangles in one shared coordinate space. A view
/// is visible when at least the configured percentage of its own height
/// overlaps the root vertically (see [`crate::geometry`]).
///
/// Callbacks fire only on a genuine transition: over any sequence of updates,
/// the number of callback invocations equals the number of times a view's
/// visibility actually flipped.
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use understory_viewability::{RectMap, ViewabilityCoordinator};
///
/// const ROOT: u32 = 0;
/// const ITEM: u32 = 1;
///
/// let mut rects = RectMap::new();
/// rects.set_xywh(ROOT, 0.0, 0.0, 320.0, 500.0);
/// rects.set_xywh(ITEM, 0.0, 600.0, 320.0, 100.0);
///
/// let mut coordinator = ViewabilityCoordinator::new(rects);
/// coordinator.register_root(ROOT);
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
/// coordinator.register_view(ITEM, move |visible| sink.borrow_mut().push(visible));
/// assert!(seen.borrow().is_empty());
///
/// // Content scrolls up by 200px.
/// coordinator.provider_mut().offset_y(ITEM, -200.0);
/// coordinator.update_root();
/// assert_eq!(*seen.borrow(), [true]);
///
/// // Nothing moved: no further notifications.
/// coordinator.update_root();
/// assert_eq!(*seen.borrow(), [true]);
/// ```
///
/// ## Re-entrancy
///
/// Callbacks run synchronously inside the operation that detected the
/// transition, while the coordinator is mutably borrowed. They must not call
/// back into the coordinator; record the change and act on it afterwards.
#[derive(Debug)]
pub struct ViewabilityCoordinator<K, M>
where
    K: Copy + Eq + Hash,
{
    id: CoordinatorId,
    config: ViewabilityConfig,
    provider: M,
    root: RootEntry<K>,
    views: HashMap<K, ViewEntry>,
    last_registration: u64,
    last_sequence: u64,
    counters: Counters,
}

impl<K, M> ViewabilityCoordinator<K, M>
where
    K: Copy + Eq + Hash + Debug,
    M: Measure<K>,
{
    /// Creates a coordinator with the default configuration.
    pub fn new(provider: M) -> Self {
        Self::with_config(provider, ViewabilityConfig::default())
    }

    /// Creates a coordinator with an explicit configuration.
    pub fn with_config(provider: M, config: ViewabilityConfig) -> Self {
        Self {
            id: CoordinatorId::next(),
            config,
            provider,
            root: RootEntry {
                handle: None,
                rect: Rect::ZERO,
                measured: false,
                registration: 0,
                applied: 0,
            },
            views: HashMap::new(),
            last_registration: 0,
            last_sequence: 0,
            counters: Counters::default(),
        }
    }

    /// Returns this coordinator's identity.
    #[must_use]
    pub fn id(&self) -> CoordinatorId {
        self.id
    }

    /// Returns the configuration in effect.
    #[must_use]
    pub fn config(&self) -> ViewabilityConfig {
        self.config
    }

    /// Returns the measurement provider.
    #[must_use]
    pub fn provider(&self) -> &M {
        &self.provider
    }

    /// Returns the measurement provider mutably, e.g. to feed new layout results.
    #[must_use]
    pub fn provider_mut(&mut self) -> &mut M {
        &mut self.provider
    }

    /// Returns the registered root handle, if any.
    #[must_use]
    pub fn root(&self) -> Option<K> {
        self.root.handle
    }

    /// Returns the root's last measured rectangle (zero until first measured).
    #[must_use]
    pub fn root_rect(&self) -> Rect {
        self.root.rect
    }

    /// Number of registered views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Returns `true` if no views are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Returns `true` if `key` is currently registered.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.views.contains_key(key)
    }

    /// Returns the last reported visibility of `key`, or `None` if unregistered.
    #[must_use]
    pub fn is_visible(&self, key: &K) -> Option<bool> {
        self.views.get(key).map(|entry| entry.is_visible)
    }

    /// Returns the last measured rectangle of `key`, or `None` if unregistered.
    #[must_use]
    pub fn view_rect(&self, key: &K) -> Option<Rect> {
        self.views.get(key).map(|entry| entry.rect)
    }

    /// Returns the current registration stamp of `key`, or `None` if unregistered.
    #[must_use]
    pub fn registration(&self, key: &K) -> Option<Registration> {
        self.views.get(key).map(|entry| Registration(entry.registration))
    }

    /// Iterates over the keys currently reported as visible, in no particular order.
    pub fn visible_views(&self) -> impl Iterator<Item = K> + '_ {
        self.views
            .iter()
            .filter(|(_, entry)| entry.is_visible)
            .map(|(key, _)| *key)
    }

    /// Registers the viewport every view is measured against, and measures it.
    ///
    /// Registering again replaces the previous root handle; it is never merged.
    /// The last known rectangle stays in effect until the new root's
    /// measurement is applied, and measurements still in flight for the old
    /// root complete as [`Completion::Cancelled`]. Existing views are not
    /// re-checked until the next [`update_view`](Self::update_view) or
    /// [`update_root`](Self::update_root).
    pub fn register_root(&mut self, root: K) {
        let registration = self.bump_registration();
        if self.root.handle.is_some() {
            debug!("replace root with {root:?}");
        } else {
            debug!("register root {root:?}");
        }
        self.root.handle = Some(root);
        self.root.registration = registration;
        self.measure_root(false);
    }

    /// Registers a tracked view using the coordinator's threshold.
    ///
    /// See [`register_view_with_threshold`](Self::register_view_with_threshold).
    pub fn register_view(
        &mut self,
        key: K,
        callback: impl Into<VisibilityCallback>,
    ) -> Registration {
        let threshold_percent = self.config.threshold_percent();
        self.register_view_with_threshold(key, callback, threshold_percent)
    }

    /// Registers a tracked view with its own threshold, then measures and checks it.
    ///
    /// The view starts invisible, so a view that mounts already on screen is
    /// reported as visible right away. Registering a key that is already
    /// registered replaces its entry and starts again from invisible; any
    /// measurement still in flight for the old entry is discarded.
    pub fn register_view_with_threshold(
        &mut self,
        key: K,
        callback: impl Into<VisibilityCallback>,
        threshold_percent: f64,
    ) -> Registration {
        let registration = self.bump_registration();
        let previous = self.views.insert(
            key,
            ViewEntry {
                is_visible: false,
                rect: Rect::ZERO,
                callback: callback.into(),
                threshold_percent: normalize_threshold(threshold_percent),
                registration,
                applied: 0,
            },
        );
        if previous.is_some() {
            debug!("re-register view {key:?}");
        } else {
            debug!("register view {key:?}");
        }
        self.update_view(key);
        Registration(registration)
    }

    /// Removes a tracked view. No callback fires.
    ///
    /// Returns `false` if `key` was not registered.
    pub fn unregister_view(&mut self, key: K) -> bool {
        let removed = self.views.remove(&key).is_some();
        if removed {
            debug!("unregister view {key:?}");
        }
        removed
    }

    /// Re-measures one view and re-checks it against the current root rectangle.
    ///
    /// Does nothing if `key` is not registered or no root has been registered.
    pub fn update_view(&mut self, key: K) {
        if self.root.handle.is_none() {
            return;
        }
        let Some(registration) = self.views.get(&key).map(|entry| entry.registration) else {
            trace!("update of unregistered view {key:?} ignored");
            return;
        };
        let ticket = self.issue(MeasureTarget::View(key), registration, false);
        match self.provider.measure(ticket) {
            Measurement::Ready(rect) => {
                self.apply_view(ticket, rect);
            }
            Measurement::Pending => {}
            Measurement::Unavailable => self.note_unavailable(ticket),
        }
    }

    /// Re-measures the root, then re-measures and re-checks every registered view.
    ///
    /// Cost is linear in the number of views; coalesce scroll events before
    /// calling this. If the root cannot be measured nothing is re-checked.
    pub fn update_root(&mut self) {
        self.measure_root(true);
    }

    /// Re-measures and re-checks every registered view without re-measuring the root.
    ///
    /// Useful when content scrolls underneath a viewport whose frame is unchanged.
    pub fn update_views(&mut self) {
        if self.root.handle.is_none() {
            return;
        }
        let keys: SmallVec<[K; 16]> = self.views.keys().copied().collect();
        for key in keys {
            self.update_view(key);
        }
    }

    /// Delivers the result of a measurement that the provider answered with
    /// [`Measurement::Pending`].
    ///
    /// Results are applied in issuance order: a completion that arrives after
    /// a newer measurement of the same target was applied is dropped as
    /// [`Completion::Stale`]. Completions for views that were unregistered or
    /// registered again in the meantime are dropped as [`Completion::Cancelled`].
    /// A completed root measurement issued by [`update_root`](Self::update_root)
    /// triggers the same broadcast re-check as a synchronous one.
    ///
    /// Returns [`ViewabilityError::ForeignCoordinator`] if the ticket was
    /// issued by another coordinator.
    pub fn complete_measurement(
        &mut self,
        ticket: MeasureTicket<K>,
        rect: Option<Rect>,
    ) -> Result<Completion, ViewabilityError> {
        if ticket.coordinator != self.id {
            return Err(ViewabilityError::ForeignCoordinator);
        }
        if !self.is_live(&ticket) {
            trace!("measurement {} for {:?} cancelled", ticket.sequence, ticket.target);
            self.counters.cancelled += 1;
            return Ok(Completion::Cancelled);
        }
        let Some(rect) = rect else {
            self.note_unavailable(ticket);
            return Ok(Completion::Unavailable);
        };
        Ok(match ticket.target {
            MeasureTarget::Root(_) => self.apply_root(ticket, rect),
            MeasureTarget::View(_) => self.apply_view(ticket, rect),
        })
    }

    /// Snapshot of the coordinator's state and counters for debugging and inspection.
    #[must_use]
    pub fn debug_info(&self) -> CoordinatorDebugInfo<K> {
        CoordinatorDebugInfo {
            root: self.root.handle,
            root_rect: self.root.rect,
            root_measured: self.root.measured,
            views: self.views.len(),
            visible_views: self.visible_views().count(),
            measurements_issued: self.counters.issued,
            measurements_unavailable: self.counters.unavailable,
            stale_completions: self.counters.stale,
            cancelled_completions: self.counters.cancelled,
            transitions: self.counters.transitions,
        }
    }

    fn bump_registration(&mut self) -> u64 {
        self.last_registration += 1;
        self.last_registration
    }

    fn issue(
        &mut self,
        target: MeasureTarget<K>,
        registration: u64,
        broadcast: bool,
    ) -> MeasureTicket<K> {
        self.last_sequence += 1;
        self.counters.issued += 1;
        MeasureTicket {
            coordinator: self.id,
            target,
            registration,
            sequence: self.last_sequence,
            broadcast,
        }
    }

    fn is_live(&self, ticket: &MeasureTicket<K>) -> bool {
        match ticket.target {
            MeasureTarget::Root(key) => {
                self.root.handle == Some(key) && self.root.registration == ticket.registration
            }
            MeasureTarget::View(key) => self
                .views
                .get(&key)
                .is_some_and(|entry| entry.registration == ticket.registration),
        }
    }

    fn note_unavailable(&mut self, ticket: MeasureTicket<K>) {
        self.counters.unavailable += 1;
        debug!(
            "measurement unavailable for {:?}; keeping last known rectangle",
            ticket.target
        );
    }

    fn measure_root(&mut self, broadcast: bool) {
        let Some(root) = self.root.handle else {
            return;
        };
        let ticket = self.issue(MeasureTarget::Root(root), self.root.registration, broadcast);
        match self.provider.measure(ticket) {
            Measurement::Ready(rect) => {
                self.apply_root(ticket, rect);
            }
            Measurement::Pending => {}
            Measurement::Unavailable => self.note_unavailable(ticket),
        }
    }

    fn apply_root(&mut self, ticket: MeasureTicket<K>, rect: Rect) -> Completion {
        if ticket.sequence <= self.root.applied {
            self.counters.stale += 1;
            return Completion::Stale;
        }
        trace!("root measured at {rect:?}");
        self.root.rect = rect;
        self.root.measured = true;
        self.root.applied = ticket.sequence;
        if ticket.broadcast {
            self.update_views();
        }
        Completion::Applied
    }

    fn apply_view(&mut self, ticket: MeasureTicket<K>, rect: Rect) -> Completion {
        let key = ticket.key();
        let Some(entry) = self.views.get_mut(&key) else {
            self.counters.cancelled += 1;
            return Completion::Cancelled;
        };
        if ticket.sequence <= entry.applied {
            self.counters.stale += 1;
            return Completion::Stale;
        }
        entry.rect = rect;
        entry.applied = ticket.sequence;
        // Without a measured root there is nothing to compare against yet.
        if self.root.measured && check_visibility(key, entry, self.root.rect) {
            self.counters.transitions += 1;
        }
        Completion::Applied
    }
}

/// Recomputes visibility for one entry and fires its callback on change.
///
/// Returns `true` if a transition fired.
fn check_visibility<K: Debug>(key: K, entry: &mut ViewEntry, root: Rect) -> bool {
    let is_visible = viewable_in(root, entry.rect, entry.threshold_percent);
    if is_visible == entry.is_visible {
        trace!("view {key:?} unchanged (visible: {is_visible})");
        return false;
    }
    debug!("view {key:?} became {}", if is_visible { "visible" } else { "hidden" });
    entry.is_visible = is_visible;
    entry.callback.call(is_visible);
    true
}

/// Debug snapshot of a [`ViewabilityCoordinator`].
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinatorDebugInfo<K> {
    /// Registered root handle, if any.
    pub root: Option<K>,
    /// Last measured root rectangle.
    pub root_rect: Rect,
    /// Whether the current root has been measured at least once.
    pub root_measured: bool,
    /// Number of registered views.
    pub views: usize,
    /// Number of registered views currently reported visible.
    pub visible_views: usize,
    /// Measurements handed to the provider.
    pub measurements_issued: u64,
    /// Measurements the provider could not answer.
    pub measurements_unavailable: u64,
    /// Completions dropped because a newer measurement was already applied.
    pub stale_completions: u64,
    /// Completions dropped because their target went away.
    pub cancelled_completions: u64,
    /// Visibility callbacks fired.
    pub transitions: u64,
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use kurbo::Rect;

    use super::{Completion, ViewabilityCoordinator};
    use crate::measure::{DeferredMeasure, RectMap};

    const ROOT: u32 = 0;
    const A: u32 = 1;

    fn recorder() -> (Rc<RefCell<Vec<bool>>>, impl Fn(bool) + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, move |visible| sink.borrow_mut().push(visible))
    }

    fn coordinator() -> ViewabilityCoordinator<u32, RectMap<u32>> {
        let mut rects = RectMap::new();
        rects.set_xywh(ROOT, 0.0, 0.0, 100.0, 500.0);
        let mut coordinator = ViewabilityCoordinator::new(rects);
        coordinator.register_root(ROOT);
        coordinator
    }

    #[test]
    fn register_view_checks_immediately() {
        let mut c = coordinator();
        c.provider_mut().set_xywh(A, 0.0, 10.0, 100.0, 50.0);
        let (log, callback) = recorder();
        c.register_view(A, callback);
        assert_eq!(*log.borrow(), [true]);
        assert_eq!(c.is_visible(&A), Some(true));
        assert_eq!(c.view_rect(&A), Some(Rect::new(0.0, 10.0, 100.0, 60.0)));
    }

    #[test]
    fn views_wait_for_a_root() {
        let mut rects = RectMap::new();
        rects.set_xywh(A, 0.0, 0.0, 10.0, 10.0);
        let mut c = ViewabilityCoordinator::new(rects);
        let (log, callback) = recorder();
        c.register_view(A, callback);
        c.update_view(A);
        c.update_root();
        assert!(log.borrow().is_empty());
        assert_eq!(c.debug_info().measurements_issued, 0);
    }

    #[test]
    fn unavailable_measurement_keeps_last_rect() {
        let mut c = coordinator();
        c.provider_mut().set_xywh(A, 0.0, 10.0, 100.0, 50.0);
        let (log, callback) = recorder();
        c.register_view(A, callback);

        c.provider_mut().remove(A);
        c.update_view(A);
        assert_eq!(*log.borrow(), [true]);
        assert_eq!(c.view_rect(&A), Some(Rect::new(0.0, 10.0, 100.0, 60.0)));
        assert_eq!(c.debug_info().measurements_unavailable, 1);
    }

    #[test]
    fn unavailable_root_skips_the_broadcast() {
        let mut c = coordinator();
        c.provider_mut().set_xywh(A, 0.0, 10.0, 100.0, 50.0);
        let (log, callback) = recorder();
        c.register_view(A, callback);

        c.provider_mut().remove(ROOT);
        c.provider_mut().set_xywh(A, 0.0, 1_000.0, 100.0, 50.0);
        c.update_root();
        assert_eq!(*log.borrow(), [true]);
        assert_eq!(c.root_rect(), Rect::new(0.0, 0.0, 100.0, 500.0));
    }

    #[test]
    fn per_view_threshold_overrides_config() {
        let mut c = coordinator();
        // 30px of a 100px view visible at the bottom edge.
        c.provider_mut().set_xywh(A, 0.0, 470.0, 100.0, 100.0);
        let (log, callback) = recorder();
        c.register_view_with_threshold(A, callback, 25.0);
        assert_eq!(*log.borrow(), [true]);

        let (strict, callback) = recorder();
        c.register_view(A, callback);
        assert!(strict.borrow().is_empty());
    }

    #[test]
    fn deferred_completions_apply_in_issuance_order() {
        let mut c = ViewabilityCoordinator::new(DeferredMeasure::new());
        c.register_root(ROOT);
        let root_ticket = c.provider_mut().take_pending()[0];
        assert_eq!(
            c.complete_measurement(root_ticket, Some(Rect::new(0.0, 0.0, 100.0, 500.0))),
            Ok(Completion::Applied)
        );

        let (log, callback) = recorder();
        c.register_view(A, callback);
        c.update_view(A);
        let tickets = c.provider_mut().take_pending();
        assert_eq!(tickets.len(), 2);

        // The newer measurement lands first; the older one must not overwrite it.
        let visible = Rect::new(0.0, 0.0, 100.0, 50.0);
        let hidden = Rect::new(0.0, 900.0, 100.0, 950.0);
        assert_eq!(c.complete_measurement(tickets[1], Some(visible)), Ok(Completion::Applied));
        assert_eq!(c.complete_measurement(tickets[0], Some(hidden)), Ok(Completion::Stale));
        assert_eq!(*log.borrow(), [true]);
        assert_eq!(c.view_rect(&A), Some(visible));
    }
}

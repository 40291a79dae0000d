// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Measurement providers: the seam between the coordinator and a layout engine.
//!
//! The coordinator never computes layout. Whenever it needs a rectangle it
//! issues a [`MeasureTicket`] and hands it to a [`Measure`] implementation,
//! which either answers immediately ([`Measurement::Ready`]), reports that
//! the target cannot be measured right now ([`Measurement::Unavailable`]), or
//! promises to answer later ([`Measurement::Pending`]). Pending tickets are
//! completed through
//! [`ViewabilityCoordinator::complete_measurement`](crate::ViewabilityCoordinator::complete_measurement).
//!
//! Two strategies are provided:
//! - [`RectMap`]: synchronous lookup in a table of rectangles that the host
//!   keeps current (a retained layout tree, a bounding-rect query, a test fixture).
//! - [`DeferredMeasure`]: queues every ticket so the host can resolve them
//!   after its own layout pass, in the order it prefers.
//!
//! Any `FnMut(MeasureTarget<K>) -> Option<Rect>` closure is also a synchronous provider.

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashMap;
use kurbo::{Rect, Size, Vec2};

use crate::coordinator::CoordinatorId;

/// What a measurement is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeasureTarget<K> {
    /// The viewport the coordinator measures every view against.
    Root(K),
    /// A tracked view.
    View(K),
}

impl<K: Copy> MeasureTarget<K> {
    /// Returns the host handle being measured.
    #[must_use]
    pub fn key(&self) -> K {
        match *self {
            Self::Root(key) | Self::View(key) => key,
        }
    }

    /// Returns `true` for [`MeasureTarget::Root`].
    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root(_))
    }
}

/// Identifies one issued measurement.
///
/// Tickets are ordered by issuance: a completion is only applied if no
/// measurement issued later for the same target has been applied already.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeasureTicket<K> {
    pub(crate) coordinator: CoordinatorId,
    pub(crate) target: MeasureTarget<K>,
    pub(crate) registration: u64,
    pub(crate) sequence: u64,
    pub(crate) broadcast: bool,
}

impl<K: Copy> MeasureTicket<K> {
    /// Returns what this ticket measures.
    #[must_use]
    pub fn target(&self) -> MeasureTarget<K> {
        self.target
    }

    /// Returns the host handle being measured.
    #[must_use]
    pub fn key(&self) -> K {
        self.target.key()
    }

    /// Returns the issuing coordinator.
    #[must_use]
    pub fn coordinator(&self) -> CoordinatorId {
        self.coordinator
    }

    /// Issuance order within the issuing coordinator, starting at `1`.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Answer from a [`Measure`] provider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Measurement {
    /// The target's rectangle in the shared coordinate space.
    Ready(Rect),
    /// The answer will arrive later through `complete_measurement`.
    Pending,
    /// The target cannot be measured (detached, destroyed, not laid out).
    Unavailable,
}

impl From<Option<Rect>> for Measurement {
    fn from(rect: Option<Rect>) -> Self {
        match rect {
            Some(rect) => Self::Ready(rect),
            None => Self::Unavailable,
        }
    }
}

/// A source of rectangles for roots and tracked views.
///
/// Every rectangle handed back, synchronously or through a completion, must
/// be in one coordinate space shared by the root and all views.
pub trait Measure<K> {
    /// Measures the ticket's target.
    fn measure(&mut self, ticket: MeasureTicket<K>) -> Measurement;
}

impl<K, F> Measure<K> for F
where
    K: Copy,
    F: FnMut(MeasureTarget<K>) -> Option<Rect>,
{
    fn measure(&mut self, ticket: MeasureTicket<K>) -> Measurement {
        self(ticket.target()).into()
    }
}

/// Synchronous provider backed by a table of rectangles.
///
/// Keys without a rectangle measure as [`Measurement::Unavailable`].
#[derive(Clone, Debug)]
pub struct RectMap<K>
where
    K: Copy + Eq + Hash,
{
    rects: HashMap<K, Rect>,
}

impl<K> Default for RectMap<K>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> RectMap<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rects: HashMap::new(),
        }
    }

    /// Sets the rectangle for `key`, returning the previous one.
    pub fn set(&mut self, key: K, rect: Rect) -> Option<Rect> {
        self.rects.insert(key, rect)
    }

    /// Sets the rectangle for `key` from an origin and a size.
    pub fn set_xywh(&mut self, key: K, x: f64, y: f64, width: f64, height: f64) -> Option<Rect> {
        self.set(key, Rect::from_origin_size((x, y), Size::new(width, height)))
    }

    /// Moves the rectangle for `key` vertically by `dy`, if present.
    pub fn offset_y(&mut self, key: K, dy: f64) {
        if let Some(rect) = self.rects.get_mut(&key) {
            *rect = *rect + Vec2::new(0.0, dy);
        }
    }

    /// Removes `key`, so it measures as unavailable.
    pub fn remove(&mut self, key: K) -> Option<Rect> {
        self.rects.remove(&key)
    }

    /// Returns the rectangle for `key`, if present.
    #[must_use]
    pub fn get(&self, key: K) -> Option<Rect> {
        self.rects.get(&key).copied()
    }

    /// Number of stored rectangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Returns `true` if no rectangles are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

impl<K> Measure<K> for RectMap<K>
where
    K: Copy + Eq + Hash,
{
    fn measure(&mut self, ticket: MeasureTicket<K>) -> Measurement {
        self.get(ticket.key()).into()
    }
}

/// Asynchronous provider that queues tickets for the host to complete later.
#[derive(Clone, Debug)]
pub struct DeferredMeasure<K> {
    pending: Vec<MeasureTicket<K>>,
}

impl<K: Copy> Default for DeferredMeasure<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy> DeferredMeasure<K> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Tickets issued and not yet taken, in issuance order.
    #[must_use]
    pub fn pending(&self) -> &[MeasureTicket<K>] {
        &self.pending
    }

    /// Takes every queued ticket, leaving the queue empty.
    pub fn take_pending(&mut self) -> Vec<MeasureTicket<K>> {
        core::mem::take(&mut self.pending)
    }

    /// Number of queued tickets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<K: Copy> Measure<K> for DeferredMeasure<K> {
    fn measure(&mut self, ticket: MeasureTicket<K>) -> Measurement {
        self.pending.push(ticket);
        Measurement::Pending
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::{Measurement, RectMap};

    #[test]
    fn rect_map_tracks_origin_and_size() {
        let mut rects = RectMap::new();
        assert!(rects.is_empty());
        rects.set_xywh(1_u32, 10.0, 20.0, 30.0, 40.0);
        assert_eq!(rects.get(1), Some(Rect::new(10.0, 20.0, 40.0, 60.0)));

        rects.offset_y(1, -20.0);
        assert_eq!(rects.get(1), Some(Rect::new(10.0, 0.0, 40.0, 40.0)));

        // Offsetting an unknown key does nothing.
        rects.offset_y(2, 5.0);
        assert_eq!(rects.len(), 1);

        assert!(rects.remove(1).is_some());
        assert_eq!(rects.get(1), None);
    }

    #[test]
    fn options_convert_to_measurements() {
        let rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(Measurement::from(Some(rect)), Measurement::Ready(rect));
        assert_eq!(Measurement::from(None), Measurement::Unavailable);
    }
}

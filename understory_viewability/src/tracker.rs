// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-side binding for one tracked view.
//!
//! A [`ViewTracker`] maps a host view's lifecycle onto the coordinator:
//!
//! | Host event          | Tracker call                                  | Coordinator operation |
//! |---------------------|-----------------------------------------------|-----------------------|
//! | mount               | [`ViewTracker::mount`]                        | `register_view`       |
//! | layout changed      | [`ViewTracker::on_layout`]                    | `update_view`         |
//! | re-render           | [`ViewTracker::set_on_visibility_change`]     | none                  |
//! | unmount             | [`ViewTracker::unmount`]                      | `unregister_view`     |
//!
//! The coordinator is passed into every call rather than discovered from
//! ambient state, so a tracker cannot be used outside a coordinator.

use core::fmt::Debug;
use core::hash::Hash;

use crate::callback::VisibilityCallback;
use crate::coordinator::{CoordinatorId, Registration, ViewabilityCoordinator};
use crate::error::ViewabilityError;
use crate::measure::Measure;

/// Binds one host view handle and its visibility callback to a coordinator.
#[derive(Clone, Debug)]
pub struct ViewTracker<K> {
    key: K,
    callback: VisibilityCallback,
    threshold_percent: Option<f64>,
    mounted: Option<(CoordinatorId, Registration)>,
}

impl<K> ViewTracker<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Creates an unmounted tracker for `key`.
    pub fn new(key: K, on_visibility_change: impl Fn(bool) + 'static) -> Self {
        Self {
            key,
            callback: VisibilityCallback::new(on_visibility_change),
            threshold_percent: None,
            mounted: None,
        }
    }

    /// Uses `threshold_percent` instead of the coordinator's threshold.
    ///
    /// Takes effect at the next [`mount`](Self::mount).
    #[must_use]
    pub fn with_threshold(mut self, threshold_percent: f64) -> Self {
        self.threshold_percent = Some(threshold_percent);
        self
    }

    /// Returns the tracked host handle.
    #[must_use]
    pub fn key(&self) -> K {
        self.key
    }

    /// Returns `true` between `mount` and `unmount`.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Replaces the callback without re-registering.
    ///
    /// The next transition reports to `on_visibility_change`.
    pub fn set_on_visibility_change(&self, on_visibility_change: impl Fn(bool) + 'static) {
        self.callback.set(on_visibility_change);
    }

    /// Registers the view, which is measured and checked immediately.
    ///
    /// Mounting again in the same coordinator re-registers from invisible.
    /// Mounting while still mounted in another coordinator is an error.
    pub fn mount<M: Measure<K>>(
        &mut self,
        coordinator: &mut ViewabilityCoordinator<K, M>,
    ) -> Result<Registration, ViewabilityError> {
        if self
            .mounted
            .is_some_and(|(owner, _)| owner != coordinator.id())
        {
            return Err(ViewabilityError::ForeignCoordinator);
        }
        let callback = self.callback.clone();
        let registration = match self.threshold_percent {
            Some(threshold) => coordinator.register_view_with_threshold(self.key, callback, threshold),
            None => coordinator.register_view(self.key, callback),
        };
        self.mounted = Some((coordinator.id(), registration));
        Ok(registration)
    }

    /// Re-measures the view after the host reports a layout change.
    pub fn on_layout<M: Measure<K>>(
        &self,
        coordinator: &mut ViewabilityCoordinator<K, M>,
    ) -> Result<(), ViewabilityError> {
        self.check_owner(coordinator.id())?;
        coordinator.update_view(self.key);
        Ok(())
    }

    /// Unregisters the view. No callback fires.
    ///
    /// If the key was registered again by someone else since this tracker
    /// mounted, that newer registration is left alone.
    pub fn unmount<M: Measure<K>>(
        &mut self,
        coordinator: &mut ViewabilityCoordinator<K, M>,
    ) -> Result<(), ViewabilityError> {
        let registration = self.check_owner(coordinator.id())?;
        if coordinator.registration(&self.key) == Some(registration) {
            coordinator.unregister_view(self.key);
        }
        self.mounted = None;
        Ok(())
    }

    fn check_owner(&self, coordinator: CoordinatorId) -> Result<Registration, ViewabilityError> {
        match self.mounted {
            None => Err(ViewabilityError::NotMounted),
            Some((owner, _)) if owner != coordinator => Err(ViewabilityError::ForeignCoordinator),
            Some((_, registration)) => Ok(registration),
        }
    }
}

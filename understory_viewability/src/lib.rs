// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Viewability: which tracked views are on screen, reported on change only.
//!
//! This crate answers one question for a set of rectangular views nested in a
//! scrollable viewport: is at least a threshold percentage of each view's own
//! height inside the viewport? It notifies a per-view callback exactly when
//! that answer flips, never merely because something was re-measured.
//!
//! The pieces are:
//!
//! - [`geometry`]: pure vertical-overlap functions ([`geometry::is_viewable`] and friends).
//! - [`ViewabilityCoordinator`]: the registry of tracked views plus the root
//!   viewport's rectangle, with `register_root` / `register_view` /
//!   `unregister_view` / `update_view` / `update_root`.
//! - [`Measure`]: the seam to the layout engine. The coordinator never
//!   computes layout; it asks a provider for rectangles in a coordinate space
//!   shared by the root and every view. [`RectMap`] answers synchronously,
//!   [`DeferredMeasure`] queues requests for later completion.
//! - [`VisibilityCallback`]: a replaceable callback slot, so hosts can hand a
//!   fresh closure on every render without re-registering.
//! - [`ViewTracker`]: maps a host view's mount/layout/unmount lifecycle onto
//!   the coordinator.
//!
//! This crate deliberately does **not** know about widgets, scroll containers,
//! or any particular UI framework. Host frameworks are responsible for:
//!
//! - Creating one coordinator per independent scroll region.
//! - Calling [`ViewabilityCoordinator::update_root`] on (coalesced) scroll
//!   events and [`ViewabilityCoordinator::update_view`] on layout changes.
//! - Providing rectangles through a [`Measure`] implementation.
//!
//! ## Minimal example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use understory_viewability::{RectMap, ViewTracker, ViewabilityCoordinator};
//!
//! let mut rects = RectMap::new();
//! rects.set_xywh("viewport", 0.0, 0.0, 320.0, 500.0);
//! rects.set_xywh("banner", 0.0, 480.0, 320.0, 40.0);
//!
//! let mut coordinator = ViewabilityCoordinator::new(rects);
//! coordinator.register_root("viewport");
//!
//! let visible = Rc::new(Cell::new(false));
//! let flag = Rc::clone(&visible);
//! let mut banner = ViewTracker::new("banner", move |v| flag.set(v));
//! banner.mount(&mut coordinator).unwrap();
//! // Exactly half of the banner is inside the viewport.
//! assert!(visible.get());
//!
//! coordinator.provider_mut().offset_y("banner", 30.0);
//! coordinator.update_root();
//! assert!(!visible.get());
//!
//! banner.unmount(&mut coordinator).unwrap();
//! assert!(coordinator.is_empty());
//! ```
//!
//! ## Design notes
//!
//! - Only the vertical axis is considered, against a single root viewport.
//! - The percentage is always of the *view's* height; a zero-height view is
//!   never visible.
//! - The threshold defaults to 50% per coordinator ([`ViewabilityConfig`])
//!   and can be overridden per view.
//! - A measurement the provider cannot answer leaves the last known rectangle
//!   in place and fires nothing.
//! - Asynchronous measurements are applied in issuance order; late results
//!   for superseded or unregistered views are dropped.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod callback;
mod config;
mod coordinator;
mod error;
pub mod geometry;
mod measure;
mod tracker;

pub use callback::VisibilityCallback;
pub use config::{DEFAULT_THRESHOLD_PERCENT, ViewabilityConfig, normalize_threshold};
pub use coordinator::{
    Completion, CoordinatorDebugInfo, CoordinatorId, Registration, ViewabilityCoordinator,
};
pub use error::ViewabilityError;
pub use measure::{DeferredMeasure, Measure, MeasureTarget, MeasureTicket, Measurement, RectMap};
pub use tracker::ViewTracker;

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Asynchronous measurement.
//!
//! The host answers measurement requests after its own layout pass, possibly
//! out of order. Late answers for superseded or unmounted views are dropped.
//!
//! Run:
//! - `cargo run -p understory_viewability_demos --example deferred_layout`

use kurbo::Rect;
use understory_viewability::{DeferredMeasure, MeasureTarget, RectMap, ViewabilityCoordinator};
use understory_viewability_demos::{VIEWPORT, init_logging, layout_column};

fn main() {
    init_logging();

    let mut layout = RectMap::new();
    layout_column(&mut layout, 8, 0.0);

    let mut coordinator = ViewabilityCoordinator::new(DeferredMeasure::new());
    coordinator.register_root(VIEWPORT);
    for item in 0..8 {
        coordinator.register_view(item, move |visible| {
            println!("  item {item} -> {}", if visible { "visible" } else { "hidden" });
        });
    }

    println!("first layout pass:");
    // The root answers first; views answer afterwards.
    resolve(&mut coordinator, &layout, false);

    println!("scroll by 900px, two batches answered newest-first:");
    layout_column(&mut layout, 8, 900.0);
    coordinator.update_root();
    // The root answer queues one measurement per view.
    resolve(&mut coordinator, &layout, false);
    coordinator.update_views();
    // The second batch lands first; the first batch is then stale.
    resolve(&mut coordinator, &layout, true);

    println!("item 5 unmounts before its measurement lands:");
    coordinator.update_view(5);
    coordinator.unregister_view(5);
    resolve(&mut coordinator, &layout, true);

    println!("{:#?}", coordinator.debug_info());
}

fn resolve(
    coordinator: &mut ViewabilityCoordinator<u32, DeferredMeasure<u32>>,
    layout: &RectMap<u32>,
    newest_first: bool,
) {
    let mut tickets = coordinator.provider_mut().take_pending();
    if newest_first {
        tickets.reverse();
    }
    for ticket in tickets {
        let rect: Option<Rect> = match ticket.target() {
            MeasureTarget::Root(key) | MeasureTarget::View(key) => layout.get(key),
        };
        match coordinator.complete_measurement(ticket, rect) {
            Ok(outcome) => log::debug!("{:?} -> {outcome:?}", ticket.target()),
            Err(err) => log::error!("{err}"),
        }
    }
}

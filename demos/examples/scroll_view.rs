// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll view with 100 tracked items.
//!
//! Each item mounts a `ViewTracker`; scrolling moves every item and asks the
//! coordinator to re-check. Only items whose visibility flipped are printed.
//!
//! Run:
//! - `cargo run -p understory_viewability_demos --example scroll_view`
//! - `RUST_LOG=understory_viewability=debug cargo run -p understory_viewability_demos --example scroll_view`

use std::cell::RefCell;
use std::rc::Rc;

use understory_viewability::{RectMap, ViewTracker, ViewabilityCoordinator};
use understory_viewability_demos::{ITEM_HEIGHT, VIEWPORT, init_logging, layout_column};

const ITEMS: u32 = 100;

fn main() {
    init_logging();

    let mut rects = RectMap::new();
    layout_column(&mut rects, ITEMS, 0.0);
    let mut coordinator = ViewabilityCoordinator::new(rects);
    coordinator.register_root(VIEWPORT);

    let changes: Rc<RefCell<Vec<(u32, bool)>>> = Rc::default();
    let mut trackers: Vec<ViewTracker<u32>> = (0..ITEMS)
        .map(|item| {
            let sink = Rc::clone(&changes);
            ViewTracker::new(item, move |visible| sink.borrow_mut().push((item, visible)))
        })
        .collect();

    for tracker in &mut trackers {
        if let Err(err) = tracker.mount(&mut coordinator) {
            log::error!("mount failed: {err}");
        }
    }
    report("mounted", &changes);

    let mut offset = 0.0;
    for step in [150.0, 150.0, 400.0, -300.0, 2_000.0] {
        offset += step;
        layout_column(coordinator.provider_mut(), ITEMS, offset);
        coordinator.update_root();
        report(&format!("scrolled to {offset}"), &changes);
    }

    // Re-render item 10 with a new handler; the registration is untouched.
    let focus = 10;
    trackers[focus as usize].set_on_visibility_change(move |visible| {
        println!("  item {focus} (re-rendered handler) -> {visible}");
    });
    offset = f64::from(focus) * ITEM_HEIGHT;
    layout_column(coordinator.provider_mut(), ITEMS, offset);
    coordinator.update_root();
    report(&format!("scrolled to {offset}"), &changes);

    for tracker in &mut trackers {
        if let Err(err) = tracker.unmount(&mut coordinator) {
            log::error!("unmount failed: {err}");
        }
    }
    println!("{:#?}", coordinator.debug_info());
}

fn report(label: &str, changes: &Rc<RefCell<Vec<(u32, bool)>>>) {
    println!("{label}:");
    for (item, visible) in changes.borrow_mut().drain(..) {
        println!("  item {item} -> {}", if visible { "visible" } else { "hidden" });
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for the viewability demos: a column of equally tall items
//! inside a fixed viewport, scrolled by moving the items.

use understory_viewability::RectMap;

/// Handle of the viewport in every demo.
pub const VIEWPORT: u32 = u32::MAX;

/// Viewport width and height in logical pixels.
pub const VIEWPORT_SIZE: (f64, f64) = (390.0, 700.0);

/// Height of each list item (the original screen pads items by 100px above and below).
pub const ITEM_HEIGHT: f64 = 224.0;

/// Lays out `count` items top-to-bottom, shifted up by `scroll_offset`.
pub fn layout_column(rects: &mut RectMap<u32>, count: u32, scroll_offset: f64) {
    rects.set_xywh(VIEWPORT, 0.0, 0.0, VIEWPORT_SIZE.0, VIEWPORT_SIZE.1);
    for item in 0..count {
        let y = f64::from(item) * ITEM_HEIGHT - scroll_offset;
        rects.set_xywh(item, 0.0, y, VIEWPORT_SIZE.0, ITEM_HEIGHT);
    }
}

/// Installs the demo logger; `RUST_LOG=debug` shows the coordinator's trace.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    if let Err(err) = env_logger::Builder::from_env(env).try_init() {
        // Another logger is already installed; keep using it.
        log::warn!("demo logger not installed: {err}");
    }
}

#[cfg(test)]
mod tests {
    use understory_viewability::RectMap;

    use super::{ITEM_HEIGHT, VIEWPORT, layout_column};

    #[test]
    fn logging_can_be_initialized_twice() {
        super::init_logging();
        super::init_logging();
    }

    #[test]
    fn column_is_shifted_by_scroll_offset() {
        let mut rects = RectMap::new();
        layout_column(&mut rects, 3, 100.0);
        assert_eq!(rects.len(), 4);
        assert_eq!(rects.get(2).map(|r| r.y0), Some(2.0 * ITEM_HEIGHT - 100.0));
        assert_eq!(rects.get(VIEWPORT).map(|r| r.y0), Some(0.0));
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlap geometry: vertical-span visibility tests against a viewport.
//!
//! All spans are expressed relative to the viewport's top edge, so a span
//! `top..bottom` is on screen where it intersects `0..viewport_height`.
//! Percentages are always a fraction of the *item* that is visible, not of
//! the viewport that the item fills.

use kurbo::Rect;

/// Returns `true` if the span `top..bottom` lies entirely inside `0..viewport_height`.
///
/// Empty and inverted spans (`bottom <= top`) are never entirely visible.
#[must_use]
pub fn is_entirely_visible(top: f64, bottom: f64, viewport_height: f64) -> bool {
    top >= 0.0 && bottom <= viewport_height && bottom > top
}

/// Returns the length of the intersection of `top..bottom` with `0..viewport_height`.
///
/// The result is never negative.
#[must_use]
pub fn visible_pixels(top: f64, bottom: f64, viewport_height: f64) -> f64 {
    let visible = bottom.min(viewport_height) - top.max(0.0);
    visible.max(0.0)
}

/// Returns `true` if at least `threshold_percent` of an item is visible.
///
/// `item_length` is the item's own height and is the denominator of the
/// percentage. An item with a non-positive (or NaN) length has no visible
/// fraction and is never viewable, whatever its span.
///
/// ```rust
/// use understory_viewability::geometry::is_viewable;
///
/// // Half of a 10px item pokes into the top of a 100px viewport.
/// assert!(is_viewable(50.0, -5.0, 5.0, 100.0, 10.0));
/// assert!(!is_viewable(51.0, -5.0, 5.0, 100.0, 10.0));
/// ```
#[must_use]
pub fn is_viewable(
    threshold_percent: f64,
    top: f64,
    bottom: f64,
    viewport_height: f64,
    item_length: f64,
) -> bool {
    if item_length.is_nan() || item_length <= 0.0 {
        return false;
    }
    if is_entirely_visible(top, bottom, viewport_height) {
        return true;
    }
    let percent = 100.0 * visible_pixels(top, bottom, viewport_height) / item_length;
    percent >= threshold_percent
}

/// Evaluates [`is_viewable`] for a view rectangle against a viewport rectangle.
///
/// Both rectangles must live in the same coordinate space. Only the vertical
/// axis is considered.
#[must_use]
pub fn viewable_in(viewport: Rect, view: Rect, threshold_percent: f64) -> bool {
    let top = view.y0 - viewport.y0;
    let bottom = view.y1 - viewport.y0;
    is_viewable(
        threshold_percent,
        top,
        bottom,
        viewport.height(),
        view.height(),
    )
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::{is_entirely_visible, is_viewable, viewable_in, visible_pixels};

    #[test]
    fn entirely_visible_requires_a_non_empty_span() {
        assert!(is_entirely_visible(0.0, 100.0, 100.0));
        assert!(!is_entirely_visible(10.0, 10.0, 100.0));
        assert!(!is_entirely_visible(20.0, 10.0, 100.0));
        assert!(!is_entirely_visible(-1.0, 10.0, 100.0));
        assert!(!is_entirely_visible(0.0, 101.0, 100.0));
    }

    #[test]
    fn visible_pixels_clamps_to_viewport() {
        assert_eq!(visible_pixels(-50.0, 50.0, 100.0), 50.0);
        assert_eq!(visible_pixels(80.0, 180.0, 100.0), 20.0);
        assert_eq!(visible_pixels(-10.0, 200.0, 100.0), 100.0);
        assert_eq!(visible_pixels(100.0, 150.0, 100.0), 0.0);
        assert_eq!(visible_pixels(-150.0, -50.0, 100.0), 0.0);
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        assert!(is_viewable(50.0, -5.0, 5.0, 100.0, 10.0));
        assert!(!is_viewable(51.0, -5.0, 5.0, 100.0, 10.0));
    }

    #[test]
    fn full_containment_ignores_threshold() {
        assert!(is_viewable(100.0, 10.0, 20.0, 100.0, 10.0));
    }

    #[test]
    fn item_taller_than_viewport_uses_item_length() {
        // 100px of a 400px item is 25%.
        assert!(!is_viewable(50.0, -100.0, 300.0, 100.0, 400.0));
        assert!(is_viewable(25.0, -100.0, 300.0, 100.0, 400.0));
    }

    #[test]
    fn zero_height_item_is_never_viewable() {
        assert!(!is_viewable(0.0, 0.0, 10.0, 100.0, 0.0));
        assert!(!is_viewable(50.0, 5.0, 5.0, 100.0, 0.0));
        assert!(!is_viewable(50.0, 5.0, 5.0, 100.0, f64::NAN));
    }

    #[test]
    fn viewable_in_offsets_by_viewport_origin() {
        let viewport = Rect::new(0.0, 100.0, 320.0, 600.0);
        // 50px of a 100px view pokes below the viewport's bottom edge at y=600.
        let view = Rect::new(0.0, 550.0, 320.0, 650.0);
        assert!(viewable_in(viewport, view, 50.0));
        assert!(!viewable_in(viewport, view, 60.0));

        let above = Rect::new(0.0, -10.0, 320.0, 90.0);
        assert!(!viewable_in(viewport, above, 1.0));
    }
}

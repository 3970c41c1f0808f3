//! Picker placement relative to the composer.

use promptdock_core_types::{Rect, Viewport};

/// Fixed assumed width of the prompt-picker popup.
pub const PICKER_WIDTH: f64 = 650.0;

/// The picker never renders above this page-y coordinate.
pub const PICKER_MIN_TOP: f64 = 100.0;

/// Anchor rectangle for the picker, derived from the composer's bounding box
/// and clamped so the popup stays below y=100 and inside the horizontal
/// viewport bounds.
pub fn picker_anchor(element: Rect, viewport: Viewport) -> Rect {
    let x = element.x.min(viewport.width - PICKER_WIDTH).max(0.0);
    let y = element.y.max(PICKER_MIN_TOP);
    Rect::new(x, y, PICKER_WIDTH, element.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_keeps_popup_inside_horizontal_bounds() {
        let viewport = Viewport {
            width: 1000.0,
            height: 800.0,
        };
        let anchor = picker_anchor(Rect::new(900.0, 500.0, 300.0, 80.0), viewport);
        assert_eq!(anchor.x, 350.0);
        assert_eq!(anchor.width, PICKER_WIDTH);
    }

    #[test]
    fn anchor_never_rises_above_min_top() {
        let anchor = picker_anchor(Rect::new(10.0, 20.0, 300.0, 80.0), Viewport::default());
        assert_eq!(anchor.y, PICKER_MIN_TOP);
    }

    #[test]
    fn narrow_viewport_pins_to_left_edge() {
        let viewport = Viewport {
            width: 400.0,
            height: 800.0,
        };
        let anchor = picker_anchor(Rect::new(50.0, 500.0, 300.0, 80.0), viewport);
        assert_eq!(anchor.x, 0.0);
    }
}

//! Where the chat panel opens relative to the floating control.

use crate::core::widget::{Position, Size};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// Panel top lines up with the control's top.
    Top,
    /// Panel bottom lines up with the control's bottom.
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelLayout {
    pub size: Size,
    /// Space between the control and the panel.
    pub gap: f64,
    /// Minimum distance between the panel and any viewport edge.
    pub screen_padding: f64,
}

impl Default for PanelLayout {
    fn default() -> Self {
        PanelLayout {
            size: Size::new(350.0, 500.0),
            gap: 16.0,
            screen_padding: 16.0,
        }
    }
}

impl PanelLayout {
    /// Picks the side and vertical alignment before any clamping.
    ///
    /// Right is preferred; left wins only with strictly more room than the right and enough room
    /// for the panel. Top alignment is kept unless it runs past the bottom padding and bottom
    /// alignment fits below the top padding.
    pub fn orientation(&self, control: Position, control_size: f64, viewport: Size) -> (Side, Align) {
        let space_right = viewport.width - (control.left + control_size);
        let space_left = control.left;
        let needed = self.size.width + self.gap;

        let side = if space_left >= needed && space_left > space_right {
            Side::Left
        } else {
            Side::Right
        };

        let overflows_bottom =
            control.top + self.size.height > viewport.height - self.screen_padding;
        let bottom_fits = control.top + control_size - self.size.height >= self.screen_padding;

        let align = if overflows_bottom && bottom_fits {
            Align::Bottom
        } else {
            Align::Top
        };

        (side, align)
    }

    /// The panel rectangle for a control at `control`.
    ///
    /// The final clamp into `[padding, viewport - panel - padding]` is authoritative; on a
    /// viewport too small for the panel the lower bound wins.
    pub fn place(&self, control: Position, control_size: f64, viewport: Size) -> Rect {
        let (side, align) = self.orientation(control, control_size, viewport);

        let left = match side {
            Side::Right => control.left + control_size + self.gap,
            Side::Left => control.left - self.size.width - self.gap,
        };
        let top = match align {
            Align::Top => control.top,
            Align::Bottom => control.top + control_size - self.size.height,
        };

        let max_left = viewport.width - self.size.width - self.screen_padding;
        let max_top = viewport.height - self.size.height - self.screen_padding;

        Rect {
            top: top.min(max_top).max(self.screen_padding),
            left: left.min(max_left).max(self.screen_padding),
            width: self.size.width,
            height: self.size.height,
        }
    }
}

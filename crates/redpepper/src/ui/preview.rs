//! Preview pane.
//!
//! Shows the output of a preview command for the selected item, either
//! to the right of or below the primary view. Position follows an
//! auto heuristic until the user pins it; the split percentage can be
//! nudged by key or by dragging the pane's leading edge.

use ratatui::layout::Rect;

use crate::config::{PreviewConfig, PreviewPosition};
use crate::ui::layout::contains;

pub struct PreviewPane {
    pub visible: bool,
    at_bottom: bool,
    /// Set once the user picks a position explicitly; the auto
    /// heuristic no longer applies afterwards.
    pinned: bool,
    pub percentage: u16,
    increment: u16,
    content: String,
    pub frame: Rect,
    dragging: bool,
}

impl PreviewPane {
    pub fn new(config: &PreviewConfig) -> Self {
        let pinned = config.position != PreviewPosition::Auto;
        PreviewPane {
            visible: config.show_at_start,
            at_bottom: config.position == PreviewPosition::Bottom,
            pinned,
            percentage: config.percentage,
            increment: config.increment,
            content: String::new(),
            frame: Rect::default(),
            dragging: false,
        }
    }

    pub fn toggle_visible(&mut self) {
        self.visible = !self.visible;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn at_bottom(&self) -> bool {
        self.at_bottom
    }

    pub fn set_position(&mut self, auto: bool, at_bottom: bool) {
        self.pinned = !auto;
        self.at_bottom = at_bottom;
    }

    /// Apply the auto-position heuristic: tall-and-narrow terminals
    /// put the preview at the bottom.
    pub fn update_auto_position(&mut self, width: u16, height: u16) {
        if !self.pinned {
            self.at_bottom = height >= width / 2;
        }
    }

    pub fn expand(&mut self) {
        self.percentage = (self.percentage + self.increment).min(90);
    }

    pub fn shrink(&mut self) {
        self.percentage = self.percentage.saturating_sub(self.increment).max(10);
    }

    pub fn set_content(&mut self, content: &str) {
        self.content = content.replace('\r', "");
    }

    /// A drag starts only on the pane's leading edge (top row when at
    /// the bottom, left column when at the right).
    pub fn drag_start(&mut self, x: u16, y: u16) -> bool {
        if !self.visible || !contains(self.frame, x, y) {
            return false;
        }
        let on_edge = if self.at_bottom {
            y == self.frame.y
        } else {
            x == self.frame.x
        };
        if on_edge {
            self.dragging = true;
        }
        on_edge
    }

    /// Recompute the split share from the pointer position within the
    /// body area the pane was carved out of.
    pub fn drag_move(&mut self, x: u16, y: u16, body: Rect) {
        if !self.dragging || body.width == 0 || body.height == 0 {
            return;
        }
        let share = if self.at_bottom {
            let below = (body.y + body.height).saturating_sub(y) as u32;
            below * 100 / body.height as u32
        } else {
            let right = (body.x + body.width).saturating_sub(x) as u32;
            right * 100 / body.width as u32
        };
        self.percentage = (share as u16).clamp(10, 90);
    }

    pub fn drag_end(&mut self) {
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
    }

    pub fn view(&self) -> String {
        let height = self.frame.height as usize;
        let mut out = String::new();
        for line in self.content.lines().take(height) {
            out.push('|');
            out.push_str(line);
            out.push('\n');
        }
        if self.content.is_empty() {
            out.push_str("|(no preview)\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::PreviewPane;
    use crate::config::{PreviewConfig, PreviewPosition};
    use ratatui::layout::Rect;

    fn pane(position: PreviewPosition) -> PreviewPane {
        PreviewPane::new(&PreviewConfig {
            position,
            show_at_start: true,
            percentage: 50,
            increment: 5,
        })
    }

    #[test]
    fn auto_position_follows_terminal_shape() {
        let mut pane = pane(PreviewPosition::Auto);
        pane.update_auto_position(200, 50);
        assert!(!pane.at_bottom());
        pane.update_auto_position(80, 45);
        assert!(pane.at_bottom());
    }

    #[test]
    fn pinned_position_ignores_heuristic() {
        let mut pane = pane(PreviewPosition::Right);
        pane.update_auto_position(80, 45);
        assert!(!pane.at_bottom());
    }

    #[test]
    fn expand_and_shrink_clamp() {
        let mut pane = pane(PreviewPosition::Auto);
        for _ in 0..20 {
            pane.expand();
        }
        assert_eq!(pane.percentage, 90);
        for _ in 0..30 {
            pane.shrink();
        }
        assert_eq!(pane.percentage, 10);
    }

    #[test]
    fn drag_only_starts_on_leading_edge() {
        let mut pane = pane(PreviewPosition::Right);
        pane.set_frame(Rect {
            x: 40,
            y: 1,
            width: 40,
            height: 20,
        });
        assert!(!pane.drag_start(50, 5));
        assert!(pane.drag_start(40, 5));
        assert!(pane.is_dragging());
    }

    #[test]
    fn drag_move_recomputes_share_from_body() {
        let mut pane = pane(PreviewPosition::Right);
        pane.set_frame(Rect {
            x: 40,
            y: 1,
            width: 40,
            height: 20,
        });
        let body = Rect {
            x: 0,
            y: 1,
            width: 80,
            height: 20,
        };
        assert!(pane.drag_start(40, 5));
        pane.drag_move(60, 5, body);
        assert_eq!(pane.percentage, 25);
        pane.drag_end();
        assert!(!pane.is_dragging());
    }
}

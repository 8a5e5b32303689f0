//! Diff view.
//!
//! Full-screen scrollable text opened with pre-rendered diff output.
//! While open it captures all key input; any unbound key closes it.

use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

pub struct DiffView {
    lines: Vec<String>,
    offset: usize,
    pub frame: Rect,
}

impl DiffView {
    pub fn new(text: &str) -> Self {
        DiffView {
            lines: text.lines().map(|line| line.trim_end_matches('\r').to_string()).collect(),
            offset: 0,
            frame: Rect::default(),
        }
    }

    fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.frame.height.max(1) as usize)
    }

    pub fn scroll(&mut self, delta: isize) {
        let next = self.offset as isize + delta;
        self.offset = next.clamp(0, self.max_offset() as isize) as usize;
    }

    /// Returns false when the key asks to close the view.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let page = self.frame.height.max(1) as isize;
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll(-1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll(1),
            KeyCode::PageUp | KeyCode::Char('b') => self.scroll(-page),
            KeyCode::PageDown | KeyCode::Char(' ') => self.scroll(page),
            KeyCode::Char('g') => self.offset = 0,
            KeyCode::Char('G') => self.offset = self.max_offset(),
            _ => return false,
        }
        true
    }

    pub fn handle_mouse(&mut self, mouse: &MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll(-3),
            MouseEventKind::ScrollDown => self.scroll(3),
            _ => {}
        }
    }

    pub fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
        self.offset = self.offset.min(self.max_offset());
    }

    pub fn view(&self) -> String {
        let height = self.frame.height as usize;
        let mut out = String::new();
        for line in self.lines.iter().skip(self.offset).take(height) {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::DiffView;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::layout::Rect;

    fn diff() -> DiffView {
        let text: String = (0..50).map(|n| format!("line {n}\n")).collect();
        let mut view = DiffView::new(&text);
        view.set_frame(Rect {
            x: 0,
            y: 0,
            width: 80,
            height: 10,
        });
        view
    }

    #[test]
    fn scrolling_clamps_to_content() {
        let mut view = diff();
        view.scroll(-5);
        assert!(view.view().starts_with("line 0"));
        view.scroll(1000);
        assert!(view.view().starts_with("line 40"));
    }

    #[test]
    fn unbound_key_reports_unhandled() {
        let mut view = diff();
        let handled = view.handle_key(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE));
        assert!(!handled);
    }

    #[test]
    fn carriage_returns_are_normalized() {
        let view = DiffView::new("a\r\nb\r\n");
        assert!(!view.lines.iter().any(|line| line.contains('\r')));
    }
}

//! Revision graph view.
//!
//! The primary view: a cursor-driven list of revisions produced by
//! `jj log`. Rows are kept as rendered text plus the ids needed for
//! selection; the view never re-parses jj output beyond line
//! splitting.

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::events::Effect;
use crate::jj::{CommandRequest, SelectedItem};
use crate::ui::layout::contains;

/// Template handed to `jj log` so each row carries its ids up front.
pub const LOG_TEMPLATE: &str =
    r#"separate(" ", change_id.short(), commit_id.short(), description.first_line()) ++ "\n""#;

#[derive(Debug, Clone)]
pub struct RevisionRow {
    pub change_id: String,
    pub commit_id: String,
    pub text: String,
}

/// Non-normal modes block quitting until resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionsMode {
    Normal,
    /// Inline description edit; submitted as `jj describe`.
    Describing { buffer: String },
}

pub struct RevisionsView {
    pub rows: Vec<RevisionRow>,
    pub cursor: usize,
    pub mode: RevisionsMode,
    pub frame: Rect,
    scroll: usize,
}

impl RevisionsView {
    pub fn new() -> Self {
        RevisionsView {
            rows: Vec::new(),
            cursor: 0,
            mode: RevisionsMode::Normal,
            frame: Rect::default(),
            scroll: 0,
        }
    }

    pub fn in_normal_mode(&self) -> bool {
        self.mode == RevisionsMode::Normal
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, RevisionsMode::Describing { .. })
    }

    pub fn operation_name(&self) -> &'static str {
        match self.mode {
            RevisionsMode::Normal => "normal",
            RevisionsMode::Describing { .. } => "describe",
        }
    }

    /// Replace the rows from fresh `jj log` output, keeping the cursor
    /// on the same change when it still exists.
    pub fn set_log(&mut self, stdout: &str) {
        let previous = self.selected_change_id();
        self.rows = stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let mut words = line.split_whitespace();
                let change_id = words.next().unwrap_or_default().to_string();
                let commit_id = words.next().unwrap_or_default().to_string();
                RevisionRow {
                    change_id,
                    commit_id,
                    text: line.to_string(),
                }
            })
            .collect();
        self.cursor = previous
            .and_then(|id| self.rows.iter().position(|row| row.change_id == id))
            .unwrap_or(0);
        self.clamp_scroll();
    }

    fn selected_change_id(&self) -> Option<String> {
        self.rows.get(self.cursor).map(|row| row.change_id.clone())
    }

    pub fn selected(&self) -> SelectedItem {
        match self.rows.get(self.cursor) {
            Some(row) => SelectedItem::Revision {
                change_id: row.change_id.clone(),
                commit_id: row.commit_id.clone(),
            },
            None => SelectedItem::None,
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let last = self.rows.len() as isize - 1;
        self.cursor = (self.cursor as isize + delta).clamp(0, last) as usize;
        self.clamp_scroll();
    }

    /// Move the cursor to the next row whose text contains `term`,
    /// wrapping around.
    pub fn search(&mut self, term: &str) {
        if term.is_empty() || self.rows.is_empty() {
            return;
        }
        let len = self.rows.len();
        for step in 1..=len {
            let index = (self.cursor + step) % len;
            if self.rows[index].text.contains(term) {
                self.cursor = index;
                self.clamp_scroll();
                return;
            }
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent, cwd: &std::path::Path) -> Vec<Effect> {
        match &mut self.mode {
            RevisionsMode::Describing { buffer } => match key.code {
                KeyCode::Esc => {
                    self.mode = RevisionsMode::Normal;
                    Vec::new()
                }
                KeyCode::Enter => {
                    let message = buffer.clone();
                    let selected = self.selected();
                    self.mode = RevisionsMode::Normal;
                    let SelectedItem::Revision { change_id, .. } = selected else {
                        return Vec::new();
                    };
                    vec![Effect::Run(CommandRequest {
                        name: "describe".to_string(),
                        args: vec![
                            "describe".to_string(),
                            "-r".to_string(),
                            change_id,
                            "-m".to_string(),
                            message,
                        ],
                        cwd: cwd.to_path_buf(),
                    })]
                }
                KeyCode::Backspace => {
                    buffer.pop();
                    Vec::new()
                }
                KeyCode::Char(ch) => {
                    buffer.push(ch);
                    Vec::new()
                }
                _ => Vec::new(),
            },
            RevisionsMode::Normal => {
                match key.code {
                    KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
                    KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
                    KeyCode::Char('m') => {
                        if !self.rows.is_empty() {
                            self.mode = RevisionsMode::Describing {
                                buffer: String::new(),
                            };
                        }
                    }
                    _ => {}
                }
                Vec::new()
            }
        }
    }

    pub fn handle_mouse(&mut self, mouse: &MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.move_cursor(-1),
            MouseEventKind::ScrollDown => self.move_cursor(1),
            MouseEventKind::Down(MouseButton::Left) => {
                if contains(self.frame, mouse.column, mouse.row) {
                    let index = self.scroll + (mouse.row - self.frame.y) as usize;
                    if index < self.rows.len() {
                        self.cursor = index;
                    }
                }
            }
            _ => {}
        }
    }

    fn clamp_scroll(&mut self) {
        let height = self.frame.height.max(1) as usize;
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + height {
            self.scroll = self.cursor + 1 - height;
        }
    }

    pub fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
        self.clamp_scroll();
    }

    pub fn view(&self) -> String {
        let height = self.frame.height as usize;
        let mut out = String::new();
        if let RevisionsMode::Describing { buffer } = &self.mode {
            out.push_str(&format!("describe: {buffer}_\n"));
        }
        for (index, row) in self.rows.iter().enumerate().skip(self.scroll).take(height) {
            let marker = if index == self.cursor { "> " } else { "  " };
            out.push_str(marker);
            out.push_str(&row.text);
            out.push('\n');
        }
        if self.rows.is_empty() {
            out.push_str("(no revisions)\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{RevisionsMode, RevisionsView};
    use crate::jj::SelectedItem;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::layout::Rect;
    use std::path::Path;

    fn view_with_rows() -> RevisionsView {
        let mut view = RevisionsView::new();
        view.set_frame(Rect {
            x: 0,
            y: 0,
            width: 80,
            height: 10,
        });
        view.set_log("abc 111 first\ndef 222 second\nghi 333 third\n");
        view
    }

    #[test]
    fn set_log_parses_ids_and_keeps_text() {
        let view = view_with_rows();
        assert_eq!(view.rows.len(), 3);
        assert_eq!(view.rows[1].change_id, "def");
        assert_eq!(view.rows[1].commit_id, "222");
        assert!(matches!(view.selected(), SelectedItem::Revision { .. }));
    }

    #[test]
    fn refresh_keeps_selection_by_change_id() {
        let mut view = view_with_rows();
        view.move_cursor(2);
        view.set_log("zzz 000 new tip\nghi 333 third\nabc 111 first\n");
        assert_eq!(view.cursor, 1);
    }

    #[test]
    fn refresh_resets_cursor_when_selection_vanished() {
        let mut view = view_with_rows();
        view.move_cursor(2);
        view.set_log("zzz 000 only\n");
        assert_eq!(view.cursor, 0);
    }

    #[test]
    fn describe_flow_emits_one_command() {
        let mut view = view_with_rows();
        let press = |view: &mut RevisionsView, code| {
            view.handle_key(&KeyEvent::new(code, KeyModifiers::NONE), Path::new("."))
        };
        press(&mut view, KeyCode::Char('m'));
        assert!(view.is_editing());
        press(&mut view, KeyCode::Char('h'));
        press(&mut view, KeyCode::Char('i'));
        let effects = press(&mut view, KeyCode::Enter);
        assert_eq!(effects.len(), 1);
        assert_eq!(view.mode, RevisionsMode::Normal);
    }

    #[test]
    fn search_wraps_past_the_end() {
        let mut view = view_with_rows();
        view.move_cursor(2);
        view.search("first");
        assert_eq!(view.cursor, 0);
    }
}

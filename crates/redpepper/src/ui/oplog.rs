//! Operation log view.
//!
//! Opened on demand over the revision view; rows come from
//! `jj op log` with a template that leads each line with the
//! operation id. Enter restores the selected operation.

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::events::Effect;
use crate::jj::{CommandRequest, SelectedItem};
use crate::ui::layout::contains;

pub const OPLOG_TEMPLATE: &str = r#"separate(" ", id.short(), description.first_line()) ++ "\n""#;

#[derive(Debug, Clone)]
pub struct OperationRow {
    pub id: String,
    pub text: String,
}

pub struct OpLogView {
    pub rows: Vec<OperationRow>,
    pub cursor: usize,
    pub frame: Rect,
    pub loading: bool,
    scroll: usize,
}

impl OpLogView {
    pub fn new() -> Self {
        OpLogView {
            rows: Vec::new(),
            cursor: 0,
            frame: Rect::default(),
            loading: true,
            scroll: 0,
        }
    }

    pub fn set_log(&mut self, stdout: &str) {
        self.loading = false;
        self.rows = stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| OperationRow {
                id: line.split_whitespace().next().unwrap_or_default().to_string(),
                text: line.to_string(),
            })
            .collect();
        self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
    }

    pub fn selected(&self) -> SelectedItem {
        match self.rows.get(self.cursor) {
            Some(row) => SelectedItem::Operation { id: row.id.clone() },
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

    pub fn handle_key(&mut self, key: &KeyEvent, cwd: &std::path::Path) -> Vec<Effect> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Enter => {
                if let Some(row) = self.rows.get(self.cursor) {
                    return vec![Effect::Run(CommandRequest {
                        name: "op-restore".to_string(),
                        args: vec![
                            "op".to_string(),
                            "restore".to_string(),
                            row.id.clone(),
                        ],
                        cwd: cwd.to_path_buf(),
                    })];
                }
            }
            _ => {}
        }
        Vec::new()
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
        if self.loading {
            return "(loading op log...)\n".to_string();
        }
        let height = self.frame.height as usize;
        let mut out = String::new();
        for (index, row) in self.rows.iter().enumerate().skip(self.scroll).take(height) {
            let marker = if index == self.cursor { "> " } else { "  " };
            out.push_str(marker);
            out.push_str(&row.text);
            out.push('\n');
        }
        if self.rows.is_empty() {
            out.push_str("(no operations)\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::OpLogView;
    use crate::jj::SelectedItem;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::path::Path;

    #[test]
    fn rows_lead_with_operation_id() {
        let mut view = OpLogView::new();
        view.set_log("f1a2 describe\nb3c4 new empty change\n");
        assert_eq!(view.rows[0].id, "f1a2");
        assert_eq!(
            view.selected(),
            SelectedItem::Operation {
                id: "f1a2".to_string()
            }
        );
    }

    #[test]
    fn enter_restores_selected_operation() {
        let mut view = OpLogView::new();
        view.set_log("f1a2 describe\nb3c4 new empty change\n");
        view.move_cursor(1);
        let effects = view.handle_key(
            &KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE),
            Path::new("."),
        );
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn empty_log_selects_nothing() {
        let mut view = OpLogView::new();
        view.set_log("");
        assert_eq!(view.selected(), SelectedItem::None);
    }
}

//! Revset editor.
//!
//! A one-line edit field at the top of the screen holding the current
//! revset. Successful submissions are appended to an in-memory
//! history reachable with Up/Down while editing; an empty submission
//! falls back to the configured default.

use crossterm::event::{KeyCode, KeyEvent};

#[derive(Debug, PartialEq, Eq)]
pub enum RevsetAction {
    None,
    Submitted(String),
    Cancelled,
}

pub struct RevsetEditor {
    pub editing: bool,
    input: String,
    pub current: String,
    default: String,
    history: Vec<String>,
    history_pos: Option<usize>,
}

impl RevsetEditor {
    pub fn new(default: &str) -> Self {
        RevsetEditor {
            editing: false,
            input: String::new(),
            current: default.to_string(),
            default: default.to_string(),
            history: Vec::new(),
            history_pos: None,
        }
    }

    pub fn start_edit(&mut self, clear: bool) {
        self.editing = true;
        self.history_pos = None;
        self.input = if clear { String::new() } else { self.current.clone() };
    }

    pub fn add_to_history(&mut self, revset: &str) {
        if revset.is_empty() || self.history.last().is_some_and(|last| last == revset) {
            return;
        }
        self.history.push(revset.to_string());
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> RevsetAction {
        if !self.editing {
            return RevsetAction::None;
        }
        match key.code {
            KeyCode::Esc => {
                self.editing = false;
                RevsetAction::Cancelled
            }
            KeyCode::Enter => {
                self.editing = false;
                let submitted = if self.input.is_empty() {
                    self.default.clone()
                } else {
                    self.input.clone()
                };
                self.current = submitted.clone();
                self.add_to_history(&submitted);
                RevsetAction::Submitted(submitted)
            }
            KeyCode::Up => {
                self.step_history(-1);
                RevsetAction::None
            }
            KeyCode::Down => {
                self.step_history(1);
                RevsetAction::None
            }
            KeyCode::Backspace => {
                self.input.pop();
                RevsetAction::None
            }
            KeyCode::Char(ch) => {
                self.input.push(ch);
                RevsetAction::None
            }
            _ => RevsetAction::None,
        }
    }

    fn step_history(&mut self, delta: isize) {
        if self.history.is_empty() {
            return;
        }
        let last = self.history.len() - 1;
        let next = match self.history_pos {
            None if delta < 0 => Some(last),
            None => None,
            Some(pos) => {
                let stepped = pos as isize + delta;
                if stepped < 0 {
                    Some(0)
                } else if stepped as usize > last {
                    None
                } else {
                    Some(stepped as usize)
                }
            }
        };
        self.history_pos = next;
        if let Some(pos) = next {
            self.input = self.history[pos].clone();
        } else {
            self.input.clear();
        }
    }

    pub fn view(&self) -> String {
        if self.editing {
            format!("revset: {}_", self.input)
        } else if self.current.is_empty() {
            "revset: (default)".to_string()
        } else {
            format!("revset: {}", self.current)
        }
    }
}

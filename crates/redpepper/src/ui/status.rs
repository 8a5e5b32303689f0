//! Status bar.
//!
//! One footer line: the current mode label, a quick-search field when
//! focused, and the most recent error. Always listening; never owns
//! exclusive focus except while the search field is open.

use crossterm::event::{KeyCode, KeyEvent};

/// What the status bar did with a key while its search field is
/// focused.
#[derive(Debug, PartialEq, Eq)]
pub enum SearchAction {
    None,
    Changed(String),
    Submitted(String),
    Cancelled,
}

pub struct StatusBar {
    pub mode_label: String,
    search: Option<String>,
    pub error: Option<String>,
}

impl StatusBar {
    pub fn new() -> Self {
        StatusBar {
            mode_label: "normal".to_string(),
            search: None,
            error: None,
        }
    }

    pub fn is_focused(&self) -> bool {
        self.search.is_some()
    }

    pub fn focus_search(&mut self) {
        self.search = Some(String::new());
    }

    pub fn set_mode(&mut self, label: &str) {
        self.mode_label = label.to_string();
    }

    pub fn set_error(&mut self, message: Option<String>) {
        self.error = message;
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> SearchAction {
        let Some(term) = self.search.as_mut() else {
            return SearchAction::None;
        };
        match key.code {
            KeyCode::Esc => {
                self.search = None;
                SearchAction::Cancelled
            }
            KeyCode::Enter => {
                let term = term.clone();
                self.search = None;
                SearchAction::Submitted(term)
            }
            KeyCode::Backspace => {
                term.pop();
                SearchAction::Changed(term.clone())
            }
            KeyCode::Char(ch) => {
                term.push(ch);
                SearchAction::Changed(term.clone())
            }
            _ => SearchAction::None,
        }
    }

    pub fn view(&self, flash_count: usize) -> String {
        if let Some(term) = &self.search {
            return format!("/{term}_");
        }
        let mut line = format!(" {} ", self.mode_label);
        if let Some(error) = &self.error {
            line.push_str(&format!("| error: {error} "));
        }
        if flash_count > 0 {
            line.push_str(&format!("| {flash_count} notice(s) "));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::{SearchAction, StatusBar};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn search_field_collects_and_submits() {
        let mut status = StatusBar::new();
        status.focus_search();
        assert!(status.is_focused());
        status.handle_key(&key(KeyCode::Char('w')));
        status.handle_key(&key(KeyCode::Char('i')));
        let action = status.handle_key(&key(KeyCode::Enter));
        assert_eq!(action, SearchAction::Submitted("wi".to_string()));
        assert!(!status.is_focused());
    }

    #[test]
    fn escape_cancels_search() {
        let mut status = StatusBar::new();
        status.focus_search();
        assert_eq!(
            status.handle_key(&key(KeyCode::Esc)),
            SearchAction::Cancelled
        );
        assert!(!status.is_focused());
    }

    #[test]
    fn unfocused_bar_ignores_keys() {
        let mut status = StatusBar::new();
        assert_eq!(
            status.handle_key(&key(KeyCode::Char('x'))),
            SearchAction::None
        );
    }
}

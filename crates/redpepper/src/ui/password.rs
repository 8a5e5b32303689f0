//! Password prompt.
//!
//! Shown when an external process asks for a secret (e.g. an ssh key
//! confirmation during push). Captures all key input while open. A
//! new request replaces the current prompt; this happens when a
//! denied hardware-key confirmation is followed by a PIN prompt.

use std::sync::mpsc::Sender;

use crossterm::event::{KeyCode, KeyEvent};

pub struct PasswordPrompt {
    pub prompt: String,
    respond: Sender<String>,
    input: String,
}

impl PasswordPrompt {
    pub fn new(prompt: String, respond: Sender<String>) -> Self {
        PasswordPrompt {
            prompt,
            respond,
            input: String::new(),
        }
    }

    /// Returns false when the prompt is finished and should close.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => false,
            KeyCode::Enter => {
                let _ = self.respond.send(std::mem::take(&mut self.input));
                false
            }
            KeyCode::Backspace => {
                self.input.pop();
                true
            }
            KeyCode::Char(ch) => {
                self.input.push(ch);
                true
            }
            _ => true,
        }
    }

    pub fn view(&self) -> String {
        format!("{}\n> {}\n", self.prompt, "*".repeat(self.input.chars().count()))
    }
}

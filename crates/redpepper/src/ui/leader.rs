//! Leader mode.
//!
//! A secondary keymap activated by a prefix key. While active it
//! captures every event; a bound key dispatches its jj invocation and
//! exits, Escape exits without dispatching, anything else stays in
//! leader mode so the hint overlay remains readable.

use crossterm::event::{KeyCode, KeyEvent};

use crate::config::LeaderBinding;
use crate::keymap::matches_chord;

#[derive(Debug, PartialEq, Eq)]
pub enum LeaderOutcome {
    Stay,
    Exit,
    Run(Vec<String>),
}

pub struct LeaderState {
    bindings: Vec<LeaderBinding>,
}

impl LeaderState {
    pub fn new(bindings: Vec<LeaderBinding>) -> Self {
        LeaderState { bindings }
    }

    pub fn handle_key(&self, key: &KeyEvent) -> LeaderOutcome {
        if key.code == KeyCode::Esc {
            return LeaderOutcome::Exit;
        }
        for binding in &self.bindings {
            if matches_chord(key, &binding.key) {
                return LeaderOutcome::Run(binding.args.clone());
            }
        }
        LeaderOutcome::Stay
    }

    pub fn view(&self) -> String {
        let mut out = String::from("leader\n");
        for binding in &self.bindings {
            let desc = if binding.desc.is_empty() {
                binding.args.join(" ")
            } else {
                binding.desc.clone()
            };
            out.push_str(&format!("  {:?}  {desc}\n", binding.key.key));
        }
        out.push_str("  esc  exit\n");
        out
    }
}

//! Multi-key chord sequence matching.
//!
//! Recognizes ordered chord sequences bound to custom commands. The
//! matcher is global to the event loop: there is exactly one instance
//! and it is either `Idle` or `Collecting` a prefix against a set of
//! candidate commands, with a deadline.
//!
//! Timeouts are expressed as generations: entering `Collecting` and
//! every further consumed key bump the generation and ask the caller
//! to schedule a `SequenceTimeout(generation)` event. A timeout event
//! carrying a stale generation is ignored, which is how cancel and
//! re-arm work without a cancellable timer handle.
//!
//! Only sequences of two or more chords are handled here; a custom
//! command bound to a single chord is dispatched like any other global
//! key binding.

use crossterm::event::KeyEvent;

use crate::config::{AppliesTo, CustomCommandConfig};
use crate::jj::SelectedItem;
use crate::keymap::{matches_chord, KeyChord};

#[derive(Debug, Default)]
enum MatchState {
    #[default]
    Idle,
    Collecting {
        prefix: Vec<KeyChord>,
        /// Indices into the declared command list, declaration order.
        candidates: Vec<usize>,
    },
}

#[derive(Debug, Default)]
pub struct SequenceMatcher {
    state: MatchState,
    generation: u64,
}

/// What the matcher decided about one key event.
#[derive(Debug, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// Not consumed; route the key normally.
    Pass,
    /// Consumed; still collecting. Schedule a timeout for `generation`.
    Collecting { generation: u64 },
    /// Consumed; the command at `index` completed its sequence.
    Matched { index: usize },
    /// Consumed; no candidate could extend. The key is swallowed.
    Discarded,
}

pub fn applies_to(command: &CustomCommandConfig, selected: &SelectedItem) -> bool {
    match command.applies_to {
        AppliesTo::Any => true,
        AppliesTo::Revision => matches!(selected, SelectedItem::Revision { .. }),
        AppliesTo::Operation => matches!(selected, SelectedItem::Operation { .. }),
        AppliesTo::File => matches!(selected, SelectedItem::File { .. }),
    }
}

impl SequenceMatcher {
    pub fn is_collecting(&self) -> bool {
        matches!(self.state, MatchState::Collecting { .. })
    }

    /// The chords consumed so far, for overlay display.
    pub fn prefix(&self) -> &[KeyChord] {
        match &self.state {
            MatchState::Idle => &[],
            MatchState::Collecting { prefix, .. } => prefix,
        }
    }

    /// Candidate command indices, declaration order.
    pub fn candidates(&self) -> &[usize] {
        match &self.state {
            MatchState::Idle => &[],
            MatchState::Collecting { candidates, .. } => candidates,
        }
    }

    pub fn on_key(
        &mut self,
        key: &KeyEvent,
        commands: &[CustomCommandConfig],
        selected: &SelectedItem,
    ) -> SequenceOutcome {
        match std::mem::take(&mut self.state) {
            MatchState::Idle => {
                let candidates: Vec<usize> = commands
                    .iter()
                    .enumerate()
                    .filter(|(_, command)| {
                        command.sequence.len() >= 2
                            && applies_to(command, selected)
                            && matches_chord(key, &command.sequence[0])
                    })
                    .map(|(index, _)| index)
                    .collect();
                if candidates.is_empty() {
                    return SequenceOutcome::Pass;
                }
                self.generation += 1;
                self.state = MatchState::Collecting {
                    prefix: vec![commands[candidates[0]].sequence[0].clone()],
                    candidates,
                };
                SequenceOutcome::Collecting {
                    generation: self.generation,
                }
            }
            MatchState::Collecting {
                mut prefix,
                candidates,
            } => {
                let matched = prefix.len();
                let remaining: Vec<usize> = candidates
                    .into_iter()
                    .filter(|&index| matches_chord(key, &commands[index].sequence[matched]))
                    .collect();
                if remaining.is_empty() {
                    // Swallow the key; the partial prefix is discarded.
                    return SequenceOutcome::Discarded;
                }
                let consumed = matched + 1;
                if let Some(&completed) = remaining
                    .iter()
                    .find(|&&index| commands[index].sequence.len() == consumed)
                {
                    return SequenceOutcome::Matched { index: completed };
                }
                prefix.push(commands[remaining[0]].sequence[matched].clone());
                self.generation += 1;
                self.state = MatchState::Collecting {
                    prefix,
                    candidates: remaining,
                };
                SequenceOutcome::Collecting {
                    generation: self.generation,
                }
            }
        }
    }

    /// Handle a timeout event. Returns true if it forced a reset;
    /// stale generations are no-ops.
    pub fn on_timeout(&mut self, generation: u64) -> bool {
        if self.is_collecting() && generation == self.generation {
            self.state = MatchState::Idle;
            return true;
        }
        false
    }
}

//! Application event types.
//!
//! Defines the event enum used for communication between the input
//! thread, timer threads, command worker threads, and the main event
//! loop, plus the follow-up effects the loop hands back to the runner.
//!
//! Events are sent via mpsc channels and processed sequentially
//! in the main loop; each event is consumed exactly once.

use std::sync::mpsc::Sender;

use crossterm::event::{KeyEvent, MouseEvent};

use crate::jj::{CommandRequest, ExecResult};

#[derive(Debug)]
pub enum AppEvent {
    Input(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
    /// Completion of an asynchronously dispatched jj command.
    CommandDone {
        name: String,
        result: ExecResult,
    },
    /// Open (or replace) the diff view with pre-rendered diff text.
    ShowDiff(String),
    /// Open, replace, or close (`None`) the password prompt.
    ShowPassword(Option<PasswordRequest>),
    /// Start a script session from source text.
    ScriptStarted(String),
    /// Fired when the sequence-match deadline elapses. Stale
    /// generations are ignored.
    SequenceTimeout(u64),
    CloseView,
    FocusGained,
    AutoRefresh,
}

/// A password prompt request from an external process (e.g. ssh
/// asking to confirm key presence). The answer is sent back over
/// `respond`; the prompt side never blocks on it.
#[derive(Debug)]
pub struct PasswordRequest {
    pub prompt: String,
    pub respond: Sender<String>,
}

/// Side effects requested by the event loop. The loop itself never
/// blocks or spawns; the runner performs these after each update.
#[derive(Debug)]
pub enum Effect {
    /// Dispatch a jj command asynchronously; completion arrives as
    /// `AppEvent::CommandDone`.
    Run(CommandRequest),
    /// Hand the terminal to an external process and block until it
    /// exits, then post completion and a refresh.
    RunInteractive(CommandRequest),
    /// Deliver `event` after `after` has elapsed.
    Schedule {
        after: std::time::Duration,
        event: AppEvent,
    },
    /// Feed an event straight back into the queue.
    Emit(AppEvent),
    Quit,
}

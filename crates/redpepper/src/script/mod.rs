//! Scripting bridge.
//!
//! Hosts at most one cooperative script session. A started session is
//! handed every subsequent event until it reports done or is
//! cancelled, and may yield at most one follow-up effect per event.
//! Session faults (errors or panics) are caught at this boundary and
//! reported to the caller; they never terminate the loop.
//!
//! The scripting language itself is an external collaborator behind
//! the `ScriptSession` trait. A built-in line-oriented session format
//! is provided so sessions can be driven in tests and simple macros
//! can run without an engine.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;

use crossterm::event::KeyEvent;

use crate::events::{AppEvent, Effect};
use crate::jj::CommandRequest;
use crate::keymap::parse_key_chord;

pub trait ScriptSession {
    /// Observe one event, optionally yielding a follow-up effect.
    fn handle_event(&mut self, event: &AppEvent) -> Result<Option<Effect>, String>;
    fn is_done(&self) -> bool;
}

#[derive(Default)]
pub struct ScriptBridge {
    session: Option<Box<dyn ScriptSession>>,
}

impl ScriptBridge {
    /// Start a session. Starting while one is active replaces the old
    /// session; the replaced session is dropped without further event
    /// delivery.
    pub fn start(&mut self, session: Box<dyn ScriptSession>) {
        if self.session.is_some() {
            log::info!("replacing active script session");
        }
        self.session = Some(session);
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn cancel(&mut self) {
        self.session = None;
    }

    /// Deliver one event to the active session, if any. The session is
    /// freed exactly once, the first time `is_done` is observed true
    /// after delivery. A fault frees the session and is returned as an
    /// error for the loop to surface.
    pub fn deliver(&mut self, event: &AppEvent) -> Result<Option<Effect>, String> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| session.handle_event(event)));
        match outcome {
            Ok(Ok(effect)) => {
                if session.is_done() {
                    self.session = None;
                }
                Ok(effect)
            }
            Ok(Err(err)) => {
                self.session = None;
                Err(err)
            }
            Err(_) => {
                self.session = None;
                Err("script session panicked".to_string())
            }
        }
    }
}

/// One parsed script instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Instruction {
    /// Inject a synthetic key press.
    Press(KeyEvent),
    /// Dispatch a jj command asynchronously.
    Run(Vec<String>),
    /// Consume one event without yielding anything.
    Wait,
}

/// Built-in line-oriented session: one instruction per line, one
/// instruction consumed per delivered event.
///
/// ```text
/// press g
/// press t
/// wait
/// run log -r @
/// ```
#[derive(Debug)]
pub struct LineScript {
    instructions: Vec<Instruction>,
    cursor: usize,
    cwd: PathBuf,
}

impl LineScript {
    pub fn parse(source: &str, cwd: PathBuf) -> Result<Self, String> {
        let mut instructions = Vec::new();
        for (number, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
            let instruction = match word {
                "press" => {
                    let chord = parse_key_chord(rest)
                        .ok_or_else(|| format!("line {}: bad key {rest:?}", number + 1))?;
                    let mut modifiers = crossterm::event::KeyModifiers::NONE;
                    if chord.ctrl {
                        modifiers |= crossterm::event::KeyModifiers::CONTROL;
                    }
                    if chord.alt {
                        modifiers |= crossterm::event::KeyModifiers::ALT;
                    }
                    if chord.shift {
                        modifiers |= crossterm::event::KeyModifiers::SHIFT;
                    }
                    Instruction::Press(KeyEvent::new(chord.key, modifiers))
                }
                "run" => {
                    let args: Vec<String> =
                        rest.split_whitespace().map(|arg| arg.to_string()).collect();
                    if args.is_empty() {
                        return Err(format!("line {}: run needs arguments", number + 1));
                    }
                    Instruction::Run(args)
                }
                "wait" => Instruction::Wait,
                other => return Err(format!("line {}: unknown instruction {other:?}", number + 1)),
            };
            instructions.push(instruction);
        }
        Ok(LineScript {
            instructions,
            cursor: 0,
            cwd,
        })
    }
}

impl ScriptSession for LineScript {
    fn handle_event(&mut self, event: &AppEvent) -> Result<Option<Effect>, String> {
        // Only advance on externally observable progress, so a script
        // does not race ahead of the state it is driving.
        if matches!(event, AppEvent::Mouse(_) | AppEvent::Resize(..)) {
            return Ok(None);
        }
        let Some(instruction) = self.instructions.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        match instruction.clone() {
            Instruction::Press(key) => Ok(Some(Effect::Emit(AppEvent::Input(key)))),
            Instruction::Run(args) => Ok(Some(Effect::Run(CommandRequest {
                name: "script".to_string(),
                args,
                cwd: self.cwd.clone(),
            }))),
            Instruction::Wait => Ok(None),
        }
    }

    fn is_done(&self) -> bool {
        self.cursor >= self.instructions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{LineScript, ScriptBridge, ScriptSession};
    use crate::events::{AppEvent, Effect};
    use std::path::PathBuf;

    struct Noisy {
        delivered: usize,
    }

    impl ScriptSession for Noisy {
        fn handle_event(&mut self, _event: &AppEvent) -> Result<Option<Effect>, String> {
            self.delivered += 1;
            Ok(None)
        }
        fn is_done(&self) -> bool {
            self.delivered >= 5
        }
    }

    struct Faulty;

    impl ScriptSession for Faulty {
        fn handle_event(&mut self, _event: &AppEvent) -> Result<Option<Effect>, String> {
            Err("boom".to_string())
        }
        fn is_done(&self) -> bool {
            false
        }
    }

    #[test]
    fn session_tolerates_many_silent_events_then_frees_once() {
        let mut bridge = ScriptBridge::default();
        bridge.start(Box::new(Noisy { delivered: 0 }));

        for _ in 0..4 {
            assert!(bridge.deliver(&AppEvent::Tick).expect("deliver").is_none());
            assert!(bridge.is_active());
        }
        // Fifth delivery observes is_done and frees the session.
        assert!(bridge.deliver(&AppEvent::Tick).expect("deliver").is_none());
        assert!(!bridge.is_active());
    }

    #[test]
    fn fault_frees_session_and_reports_error() {
        let mut bridge = ScriptBridge::default();
        bridge.start(Box::new(Faulty));
        let err = bridge.deliver(&AppEvent::Tick).unwrap_err();
        assert_eq!(err, "boom");
        assert!(!bridge.is_active());
    }

    #[test]
    fn starting_a_session_replaces_the_active_one() {
        let mut bridge = ScriptBridge::default();
        bridge.start(Box::new(Noisy { delivered: 0 }));
        bridge.start(Box::new(Faulty));
        assert!(bridge.deliver(&AppEvent::Tick).is_err());
    }

    #[test]
    fn line_script_yields_one_effect_per_event() {
        let source = "# demo\npress g\nwait\nrun log -r @\n";
        let mut script =
            LineScript::parse(source, PathBuf::from(".")).expect("parse");

        let first = script.handle_event(&AppEvent::Tick).expect("ok");
        assert!(matches!(first, Some(Effect::Emit(AppEvent::Input(_)))));
        assert!(!script.is_done());

        let second = script.handle_event(&AppEvent::Tick).expect("ok");
        assert!(second.is_none());

        let third = script.handle_event(&AppEvent::Tick).expect("ok");
        match third {
            Some(Effect::Run(request)) => {
                assert_eq!(request.args, vec!["log", "-r", "@"]);
            }
            other => panic!("expected run effect, got {other:?}"),
        }
        assert!(script.is_done());
    }

    #[test]
    fn line_script_rejects_unknown_instructions() {
        let err = LineScript::parse("dance\n", PathBuf::from(".")).unwrap_err();
        assert!(err.contains("unknown instruction"));
    }

    #[test]
    fn line_script_ignores_resize_and_mouse() {
        let source = "press g\n";
        let mut script = LineScript::parse(source, PathBuf::from(".")).expect("parse");
        assert!(script
            .handle_event(&AppEvent::Resize(80, 24))
            .expect("ok")
            .is_none());
        assert!(!script.is_done());
    }
}

//! Key chord parsing and matching.
//!
//! Parses key chord strings like "ctrl+p" or "alt+shift+t" from config
//! and matches them against crossterm KeyEvents at runtime. A chord
//! sequence is a whitespace-separated list of chords ("g p") bound to
//! one action.
//!
//! The resolved keymap is loaded once before the loop starts and
//! treated as immutable thereafter.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    pub key: KeyCode,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyChord {
    pub fn plain(key: KeyCode) -> Self {
        KeyChord {
            key,
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
        }
    }
}

pub fn parse_key_chord(input: &str) -> Option<KeyChord> {
    let trimmed = input.trim().to_lowercase();
    if trimmed.is_empty() {
        return None;
    }

    let parts: Vec<&str> = trimmed
        .split('+')
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        return None;
    }

    let mut chord = KeyChord::plain(KeyCode::Null);
    for part in parts {
        match part {
            "ctrl" | "control" => chord.ctrl = true,
            "alt" | "option" => chord.alt = true,
            "shift" => chord.shift = true,
            "meta" | "cmd" | "super" => chord.meta = true,
            key => {
                if chord.key != KeyCode::Null {
                    return None;
                }
                chord.key = parse_key(key)?;
            }
        }
    }

    if chord.key == KeyCode::Null {
        return None;
    }

    Some(chord)
}

/// Parse a whitespace-separated chord sequence ("g p"). Every chord
/// must parse; an empty sequence is rejected.
pub fn parse_key_sequence(input: &str) -> Option<Vec<KeyChord>> {
    let chords: Vec<KeyChord> = input
        .split_whitespace()
        .map(parse_key_chord)
        .collect::<Option<Vec<_>>>()?;
    if chords.is_empty() {
        return None;
    }
    Some(chords)
}

fn parse_key(key: &str) -> Option<KeyCode> {
    match key {
        "esc" | "escape" => Some(KeyCode::Esc),
        "enter" | "return" => Some(KeyCode::Enter),
        "tab" => Some(KeyCode::Tab),
        "space" | "spacebar" => Some(KeyCode::Char(' ')),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "backspace" => Some(KeyCode::Backspace),
        _ if key.len() >= 2 && key.starts_with('f') => {
            key[1..].parse::<u8>().ok().filter(|n| (1..=12).contains(n)).map(KeyCode::F)
        }
        _ => {
            let mut chars = key.chars();
            let first = chars.next()?;
            if chars.next().is_none() {
                Some(KeyCode::Char(first))
            } else {
                None
            }
        }
    }
}

pub fn matches_chord(event: &KeyEvent, chord: &KeyChord) -> bool {
    if event.code != chord.key {
        return false;
    }

    let modifiers = event.modifiers;
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    let alt = modifiers.contains(KeyModifiers::ALT);
    let shift = modifiers.contains(KeyModifiers::SHIFT);
    let meta = modifiers.contains(KeyModifiers::SUPER) || modifiers.contains(KeyModifiers::META);

    ctrl == chord.ctrl && alt == chord.alt && shift == chord.shift && meta == chord.meta
}

/// Match against any of an action's bound chords.
pub fn matches_any(event: &KeyEvent, chords: &[KeyChord]) -> bool {
    chords.iter().any(|chord| matches_chord(event, chord))
}

/// Resolved bindings for every global action. Each action may carry
/// several alternative single chords.
#[derive(Debug, Clone)]
pub struct KeyMappings {
    pub quit: Vec<KeyChord>,
    pub cancel: Vec<KeyChord>,
    pub oplog: Vec<KeyChord>,
    pub revset: Vec<KeyChord>,
    pub git_mode: Vec<KeyChord>,
    pub undo: Vec<KeyChord>,
    pub redo: Vec<KeyChord>,
    pub bookmarks: Vec<KeyChord>,
    pub diff: Vec<KeyChord>,
    pub help: Vec<KeyChord>,
    pub preview_toggle: Vec<KeyChord>,
    pub preview_bottom: Vec<KeyChord>,
    pub preview_expand: Vec<KeyChord>,
    pub preview_shrink: Vec<KeyChord>,
    pub custom_menu: Vec<KeyChord>,
    pub leader: Vec<KeyChord>,
    pub quick_search: Vec<KeyChord>,
    pub refresh: Vec<KeyChord>,
}

impl Default for KeyMappings {
    fn default() -> Self {
        fn one(spec: &str) -> Vec<KeyChord> {
            parse_key_chord(spec).into_iter().collect()
        }
        KeyMappings {
            quit: one("q"),
            cancel: one("esc"),
            oplog: one("o"),
            revset: one("l"),
            git_mode: one("g"),
            undo: one("u"),
            redo: one("ctrl+r"),
            bookmarks: one("b"),
            diff: one("d"),
            help: one("?"),
            preview_toggle: one("p"),
            preview_bottom: one("ctrl+p"),
            preview_expand: one("+"),
            preview_shrink: one("-"),
            custom_menu: one("x"),
            leader: one("space"),
            quick_search: one("/"),
            refresh: one("f5"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{matches_chord, parse_key_chord, parse_key_sequence};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn parse_accepts_modifier_combinations() {
        let chord = parse_key_chord("alt+shift+t").expect("parse ok");
        assert!(chord.alt && chord.shift && !chord.ctrl);
        assert_eq!(chord.key, KeyCode::Char('t'));
    }

    #[test]
    fn parse_rejects_two_base_keys() {
        assert!(parse_key_chord("g+p").is_none());
        assert!(parse_key_chord("").is_none());
    }

    #[test]
    fn parse_named_keys() {
        assert_eq!(parse_key_chord("esc").map(|c| c.key), Some(KeyCode::Esc));
        assert_eq!(
            parse_key_chord("space").map(|c| c.key),
            Some(KeyCode::Char(' '))
        );
    }

    #[test]
    fn sequence_splits_on_whitespace() {
        let seq = parse_key_sequence("g  p").expect("parse ok");
        assert_eq!(seq.len(), 2);
        assert_eq!(seq[0].key, KeyCode::Char('g'));
        assert_eq!(seq[1].key, KeyCode::Char('p'));
    }

    #[test]
    fn sequence_rejects_invalid_member() {
        assert!(parse_key_sequence("g nope").is_none());
        assert!(parse_key_sequence("  ").is_none());
    }

    #[test]
    fn chord_matching_requires_exact_modifiers() {
        let chord = parse_key_chord("ctrl+r").expect("parse ok");
        let plain = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE);
        let ctrl = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert!(!matches_chord(&plain, &chord));
        assert!(matches_chord(&ctrl, &chord));
    }
}

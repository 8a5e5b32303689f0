//! Configuration loading and merging.
//!
//! Config is loaded from two sources with repo taking precedence:
//! 1. User-level: `~/.config/redpepper/config.toml`
//! 2. Repo-level: `<repo>/.redpepper/config.toml`
//!
//! Covers keymap overrides, auto refresh, preview placement, op log
//! limits, leader bindings, and custom chorded commands. Uses TOML
//! format with serde. Invalid enumerated values fall back to their
//! documented defaults with a logged warning; they never abort
//! startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::keymap::{parse_key_chord, parse_key_sequence, KeyChord, KeyMappings};

const DEFAULT_SEQUENCE_TIMEOUT_MS: u64 = 1000;
const DEFAULT_PREVIEW_PERCENTAGE: u16 = 50;
const DEFAULT_PREVIEW_INCREMENT: u16 = 5;
const DEFAULT_OPLOG_LIMIT: usize = 200;

#[derive(Debug, Clone)]
pub struct Config {
    pub keys: KeyMappings,
    pub ui: UiConfig,
    pub preview: PreviewConfig,
    pub oplog: OpLogConfig,
    pub revisions: RevisionsConfig,
    pub custom_commands: Vec<CustomCommandConfig>,
    pub leader: Vec<LeaderBinding>,
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    /// Seconds between automatic refreshes; 0 disables them.
    pub auto_refresh_interval: u64,
    pub sequence_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewPosition {
    Auto,
    Bottom,
    Right,
}

#[derive(Debug, Clone)]
pub struct PreviewConfig {
    pub position: PreviewPosition,
    pub show_at_start: bool,
    /// Share of the body given to the preview, in percent.
    pub percentage: u16,
    pub increment: u16,
}

#[derive(Debug, Clone)]
pub struct OpLogConfig {
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub struct RevisionsConfig {
    /// Default revset; empty string means jj's own default.
    pub revset: String,
}

/// Which selected-item kinds a custom command applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliesTo {
    Any,
    Revision,
    Operation,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Async,
    Immediate,
    Interactive,
}

/// One user-defined command bound to a chord sequence. Declaration
/// order in the config file is the tie-break order for sequence
/// matching.
#[derive(Debug, Clone)]
pub struct CustomCommandConfig {
    pub name: String,
    pub sequence: Vec<KeyChord>,
    pub args: Vec<String>,
    pub applies_to: AppliesTo,
    pub mode: DispatchMode,
}

/// One entry of the leader keymap: a single key that runs a jj
/// invocation while leader mode is active.
#[derive(Debug, Clone)]
pub struct LeaderBinding {
    pub key: KeyChord,
    pub desc: String,
    pub args: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    keys: Option<RawKeys>,
    ui: Option<RawUi>,
    preview: Option<RawPreview>,
    oplog: Option<RawOpLog>,
    revisions: Option<RawRevisions>,
    #[serde(default)]
    custom_commands: Vec<RawCustomCommand>,
    #[serde(default)]
    leader: Vec<RawLeaderBinding>,
}

/// A chord spec is either one string or a list of alternatives.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ChordSpec {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Default, Deserialize)]
struct RawKeys {
    quit: Option<ChordSpec>,
    cancel: Option<ChordSpec>,
    oplog: Option<ChordSpec>,
    revset: Option<ChordSpec>,
    git_mode: Option<ChordSpec>,
    undo: Option<ChordSpec>,
    redo: Option<ChordSpec>,
    bookmarks: Option<ChordSpec>,
    diff: Option<ChordSpec>,
    help: Option<ChordSpec>,
    preview_toggle: Option<ChordSpec>,
    preview_bottom: Option<ChordSpec>,
    preview_expand: Option<ChordSpec>,
    preview_shrink: Option<ChordSpec>,
    custom_menu: Option<ChordSpec>,
    leader: Option<ChordSpec>,
    quick_search: Option<ChordSpec>,
    refresh: Option<ChordSpec>,
}

#[derive(Debug, Default, Deserialize)]
struct RawUi {
    auto_refresh_interval: Option<u64>,
    sequence_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPreview {
    position: Option<String>,
    show_at_start: Option<bool>,
    percentage: Option<u16>,
    increment: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct RawOpLog {
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRevisions {
    revset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCustomCommand {
    name: String,
    keys: String,
    args: Vec<String>,
    applies_to: Option<String>,
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLeaderBinding {
    key: String,
    desc: Option<String>,
    args: Vec<String>,
}

fn read_toml(path: &Path) -> Option<RawConfig> {
    let contents = fs::read_to_string(path).ok()?;
    if contents.trim().is_empty() {
        return None;
    }
    match toml::from_str::<RawConfig>(&contents) {
        Ok(raw) => Some(raw),
        Err(err) => {
            log::warn!("ignoring unparsable config {}: {err}", path.display());
            None
        }
    }
}

fn apply_chords(target: &mut Vec<KeyChord>, spec: Option<&ChordSpec>) {
    let Some(spec) = spec else {
        return;
    };
    let raw: Vec<&str> = match spec {
        ChordSpec::One(chord) => vec![chord.as_str()],
        ChordSpec::Many(chords) => chords.iter().map(|chord| chord.as_str()).collect(),
    };
    let mut parsed = Vec::with_capacity(raw.len());
    for chord in raw {
        match parse_key_chord(chord) {
            Some(chord) => parsed.push(chord),
            None => {
                log::warn!("ignoring invalid key chord {chord:?}");
                return;
            }
        }
    }
    if !parsed.is_empty() {
        *target = parsed;
    }
}

fn apply_keys(keys: &mut KeyMappings, raw: &RawKeys) {
    apply_chords(&mut keys.quit, raw.quit.as_ref());
    apply_chords(&mut keys.cancel, raw.cancel.as_ref());
    apply_chords(&mut keys.oplog, raw.oplog.as_ref());
    apply_chords(&mut keys.revset, raw.revset.as_ref());
    apply_chords(&mut keys.git_mode, raw.git_mode.as_ref());
    apply_chords(&mut keys.undo, raw.undo.as_ref());
    apply_chords(&mut keys.redo, raw.redo.as_ref());
    apply_chords(&mut keys.bookmarks, raw.bookmarks.as_ref());
    apply_chords(&mut keys.diff, raw.diff.as_ref());
    apply_chords(&mut keys.help, raw.help.as_ref());
    apply_chords(&mut keys.preview_toggle, raw.preview_toggle.as_ref());
    apply_chords(&mut keys.preview_bottom, raw.preview_bottom.as_ref());
    apply_chords(&mut keys.preview_expand, raw.preview_expand.as_ref());
    apply_chords(&mut keys.preview_shrink, raw.preview_shrink.as_ref());
    apply_chords(&mut keys.custom_menu, raw.custom_menu.as_ref());
    apply_chords(&mut keys.leader, raw.leader.as_ref());
    apply_chords(&mut keys.quick_search, raw.quick_search.as_ref());
    apply_chords(&mut keys.refresh, raw.refresh.as_ref());
}

/// User keys apply over the defaults, repo keys over both.
fn resolve_keys(user: Option<&RawKeys>, repo: Option<&RawKeys>) -> KeyMappings {
    let mut keys = KeyMappings::default();
    if let Some(raw) = user {
        apply_keys(&mut keys, raw);
    }
    if let Some(raw) = repo {
        apply_keys(&mut keys, raw);
    }
    keys
}

/// Parse `preview.position`, falling back to `Auto` on an
/// unrecognized value.
fn resolve_preview_position(value: Option<&str>) -> PreviewPosition {
    match value {
        None | Some("auto") => PreviewPosition::Auto,
        Some("bottom") => PreviewPosition::Bottom,
        Some("right") => PreviewPosition::Right,
        Some(other) => {
            log::warn!(
                "invalid value for 'preview.position': {other:?} (expected one of: auto, bottom, right); using auto"
            );
            PreviewPosition::Auto
        }
    }
}

fn resolve_applies_to(value: Option<&str>, name: &str) -> AppliesTo {
    match value {
        None | Some("any") => AppliesTo::Any,
        Some("revision") => AppliesTo::Revision,
        Some("operation") => AppliesTo::Operation,
        Some("file") => AppliesTo::File,
        Some(other) => {
            log::warn!("custom command {name:?}: unknown applies_to {other:?}; using any");
            AppliesTo::Any
        }
    }
}

fn resolve_mode(value: Option<&str>, name: &str) -> DispatchMode {
    match value {
        None | Some("async") => DispatchMode::Async,
        Some("immediate") => DispatchMode::Immediate,
        Some("interactive") => DispatchMode::Interactive,
        Some(other) => {
            log::warn!("custom command {name:?}: unknown mode {other:?}; using async");
            DispatchMode::Async
        }
    }
}

fn resolve_custom_commands(raw: Vec<RawCustomCommand>) -> Vec<CustomCommandConfig> {
    let mut commands = Vec::with_capacity(raw.len());
    for command in raw {
        let Some(sequence) = parse_key_sequence(&command.keys) else {
            log::warn!(
                "custom command {:?}: invalid key sequence {:?}; skipping",
                command.name,
                command.keys
            );
            continue;
        };
        commands.push(CustomCommandConfig {
            applies_to: resolve_applies_to(command.applies_to.as_deref(), &command.name),
            mode: resolve_mode(command.mode.as_deref(), &command.name),
            name: command.name,
            sequence,
            args: command.args,
        });
    }
    commands
}

fn resolve_leader(raw: Vec<RawLeaderBinding>) -> Vec<LeaderBinding> {
    let mut bindings = Vec::with_capacity(raw.len());
    for binding in raw {
        let Some(key) = parse_key_chord(&binding.key) else {
            log::warn!("leader binding: invalid key {:?}; skipping", binding.key);
            continue;
        };
        bindings.push(LeaderBinding {
            key,
            desc: binding.desc.unwrap_or_default(),
            args: binding.args,
        });
    }
    bindings
}

/// Merge two raw configs field-by-field, repo config winning.
fn merge_config(user: Option<RawConfig>, repo: Option<RawConfig>) -> Config {
    let repo = repo.unwrap_or_default();
    let user = user.unwrap_or_default();

    let keys = resolve_keys(user.keys.as_ref(), repo.keys.as_ref());

    let repo_ui = repo.ui.as_ref();
    let user_ui = user.ui.as_ref();
    let auto_refresh_interval = repo_ui
        .and_then(|ui| ui.auto_refresh_interval)
        .or_else(|| user_ui.and_then(|ui| ui.auto_refresh_interval))
        .unwrap_or(0);
    let sequence_timeout_ms = repo_ui
        .and_then(|ui| ui.sequence_timeout_ms)
        .or_else(|| user_ui.and_then(|ui| ui.sequence_timeout_ms))
        .unwrap_or(DEFAULT_SEQUENCE_TIMEOUT_MS);

    let repo_preview = repo.preview.as_ref();
    let user_preview = user.preview.as_ref();
    let position = resolve_preview_position(
        repo_preview
            .and_then(|preview| preview.position.as_deref())
            .or_else(|| user_preview.and_then(|preview| preview.position.as_deref())),
    );
    let show_at_start = repo_preview
        .and_then(|preview| preview.show_at_start)
        .or_else(|| user_preview.and_then(|preview| preview.show_at_start))
        .unwrap_or(false);
    let percentage = repo_preview
        .and_then(|preview| preview.percentage)
        .or_else(|| user_preview.and_then(|preview| preview.percentage))
        .unwrap_or(DEFAULT_PREVIEW_PERCENTAGE)
        .clamp(10, 90);
    let increment = repo_preview
        .and_then(|preview| preview.increment)
        .or_else(|| user_preview.and_then(|preview| preview.increment))
        .unwrap_or(DEFAULT_PREVIEW_INCREMENT)
        .max(1);

    let limit = repo
        .oplog
        .as_ref()
        .and_then(|oplog| oplog.limit)
        .or_else(|| user.oplog.as_ref().and_then(|oplog| oplog.limit))
        .unwrap_or(DEFAULT_OPLOG_LIMIT);

    let revset = repo
        .revisions
        .as_ref()
        .and_then(|revisions| revisions.revset.clone())
        .or_else(|| {
            user.revisions
                .as_ref()
                .and_then(|revisions| revisions.revset.clone())
        })
        .unwrap_or_default();

    // Ordered tables are not merged entry-wise: a repo that defines
    // any custom commands or leader bindings replaces the user's set.
    let custom_commands = if repo.custom_commands.is_empty() {
        resolve_custom_commands(user.custom_commands)
    } else {
        resolve_custom_commands(repo.custom_commands)
    };
    let leader = if repo.leader.is_empty() {
        resolve_leader(user.leader)
    } else {
        resolve_leader(repo.leader)
    };

    Config {
        keys,
        ui: UiConfig {
            auto_refresh_interval,
            sequence_timeout: Duration::from_millis(sequence_timeout_ms),
        },
        preview: PreviewConfig {
            position,
            show_at_start,
            percentage,
            increment,
        },
        oplog: OpLogConfig { limit },
        revisions: RevisionsConfig { revset },
        custom_commands,
        leader,
    }
}

fn repo_config_path(root: &Path) -> PathBuf {
    root.join(".redpepper").join("config.toml")
}

fn user_config_path() -> Option<PathBuf> {
    let config = dirs::config_dir()?;
    Some(config.join("redpepper").join("config.toml"))
}

pub fn load_config(repo_root: Option<&Path>, override_path: Option<&Path>) -> Config {
    if let Some(path) = override_path {
        return merge_config(None, read_toml(path));
    }
    let repo = repo_root.map(repo_config_path).and_then(|p| read_toml(&p));
    let user = user_config_path().and_then(|p| read_toml(&p));
    merge_config(user, repo)
}

#[cfg(test)]
mod tests;

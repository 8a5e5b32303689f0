use std::fs;

use tempfile::TempDir;

use super::{load_config, AppliesTo, DispatchMode, PreviewPosition};
use crossterm::event::KeyCode;

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn empty_config_uses_defaults() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, "# nothing configured\n");
    let config = load_config(None, Some(&path));

    assert_eq!(config.preview.position, PreviewPosition::Auto);
    assert_eq!(config.preview.percentage, 50);
    assert_eq!(config.ui.auto_refresh_interval, 0);
    assert_eq!(config.ui.sequence_timeout.as_millis(), 1000);
    assert!(config.custom_commands.is_empty());
    assert_eq!(config.keys.quit[0].key, KeyCode::Char('q'));
}

#[test]
fn invalid_preview_position_falls_back_to_auto() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, "[preview]\nposition = \"sideways\"\n");
    let config = load_config(None, Some(&path));
    assert_eq!(config.preview.position, PreviewPosition::Auto);
}

#[test]
fn keymap_overrides_replace_defaults() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, "[keys]\nquit = \"ctrl+q\"\nundo = [\"u\", \"ctrl+z\"]\n");
    let config = load_config(None, Some(&path));
    assert_eq!(config.keys.quit.len(), 1);
    assert!(config.keys.quit[0].ctrl);
    assert_eq!(config.keys.undo.len(), 2);
}

#[test]
fn invalid_chord_override_keeps_default() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, "[keys]\nquit = \"notakey\"\n");
    let config = load_config(None, Some(&path));
    assert_eq!(config.keys.quit[0].key, KeyCode::Char('q'));
}

#[test]
fn custom_commands_preserve_declaration_order() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(
        &dir,
        r#"
[[custom_commands]]
name = "tug"
keys = "g t"
args = ["bookmark", "move", "--to", "$change_id"]
applies_to = "revision"

[[custom_commands]]
name = "fetch-all"
keys = "g f"
args = ["git", "fetch", "--all-remotes"]
mode = "interactive"
"#,
    );
    let config = load_config(None, Some(&path));
    assert_eq!(config.custom_commands.len(), 2);
    assert_eq!(config.custom_commands[0].name, "tug");
    assert_eq!(config.custom_commands[0].applies_to, AppliesTo::Revision);
    assert_eq!(config.custom_commands[0].mode, DispatchMode::Async);
    assert_eq!(config.custom_commands[1].mode, DispatchMode::Interactive);
    assert_eq!(config.custom_commands[1].sequence.len(), 2);
}

#[test]
fn custom_command_with_bad_sequence_is_skipped() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(
        &dir,
        r#"
[[custom_commands]]
name = "broken"
keys = "g wat"
args = ["log"]
"#,
    );
    let config = load_config(None, Some(&path));
    assert!(config.custom_commands.is_empty());
}

#[test]
fn leader_bindings_parse() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(
        &dir,
        r#"
[[leader]]
key = "n"
desc = "new change"
args = ["new"]
"#,
    );
    let config = load_config(None, Some(&path));
    assert_eq!(config.leader.len(), 1);
    assert_eq!(config.leader[0].key.key, KeyCode::Char('n'));
    assert_eq!(config.leader[0].args, vec!["new".to_string()]);
}

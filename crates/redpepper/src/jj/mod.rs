//! jj command execution.
//!
//! Provides a thin wrapper around the jj CLI. All invocations go
//! through one of three modes:
//! - `run_immediate`: block until the process exits, capturing output.
//! - `spawn_async`: run on a worker thread, posting `CommandDone`
//!   exactly once when finished.
//! - interactive: performed by the runner, which owns the terminal.
//!
//! Command argument lists may contain placeholders (`$change_id`,
//! `$commit_id`, `$file`, `$width`) substituted from the current
//! selection at dispatch time.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc::Sender;

use crate::events::AppEvent;

#[derive(Debug, Clone)]
pub struct ExecResult {
    pub ok: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecResult {
    pub fn spawn_failure(err: &std::io::Error) -> Self {
        ExecResult {
            ok: false,
            exit_code: -1,
            stdout: String::new(),
            stderr: err.to_string(),
        }
    }
}

/// A fully rendered async invocation: placeholders already substituted.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    /// Name reported back in `CommandDone` so the loop can route the
    /// result (e.g. "log", "oplog", "diff", or a custom command name).
    pub name: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

/// Values available to placeholder substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionContext {
    pub change_id: Option<String>,
    pub commit_id: Option<String>,
    pub file: Option<String>,
    pub width: u16,
}

/// The currently selected item, as seen by command templating and
/// custom-command applicability checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectedItem {
    #[default]
    None,
    Revision {
        change_id: String,
        commit_id: String,
    },
    Operation {
        id: String,
    },
    File {
        change_id: String,
        path: String,
    },
}

impl SelectedItem {
    pub fn context(&self, width: u16) -> SelectionContext {
        match self {
            SelectedItem::None => SelectionContext {
                width,
                ..SelectionContext::default()
            },
            SelectedItem::Revision {
                change_id,
                commit_id,
            } => SelectionContext {
                change_id: Some(change_id.clone()),
                commit_id: Some(commit_id.clone()),
                file: None,
                width,
            },
            SelectedItem::Operation { id } => SelectionContext {
                change_id: None,
                commit_id: Some(id.clone()),
                file: None,
                width,
            },
            SelectedItem::File { change_id, path } => SelectionContext {
                change_id: Some(change_id.clone()),
                commit_id: None,
                file: Some(path.clone()),
                width,
            },
        }
    }
}

/// Substitute `$change_id`, `$commit_id`, `$file` and `$width` in an
/// argument template. Returns `None` if the template references a
/// value the current selection does not provide.
pub fn render_args(template: &[String], ctx: &SelectionContext) -> Option<Vec<String>> {
    let mut rendered = Vec::with_capacity(template.len());
    for arg in template {
        let mut out = arg.clone();
        if out.contains("$change_id") {
            out = out.replace("$change_id", ctx.change_id.as_deref()?);
        }
        if out.contains("$commit_id") {
            out = out.replace("$commit_id", ctx.commit_id.as_deref()?);
        }
        if out.contains("$file") {
            out = out.replace("$file", ctx.file.as_deref()?);
        }
        if out.contains("$width") {
            out = out.replace("$width", &ctx.width.to_string());
        }
        rendered.push(out);
    }
    Some(rendered)
}

/// Run a jj command and block until it exits. Used for fast queries
/// where no other progress is meaningful while the result is pending.
pub fn run_immediate(args: &[String], cwd: &Path) -> ExecResult {
    let output = Command::new("jj").args(args).current_dir(cwd).output();
    match output {
        Ok(out) => ExecResult {
            ok: out.status.success(),
            exit_code: out.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        },
        Err(err) => ExecResult::spawn_failure(&err),
    }
}

/// Run a jj command on a worker thread. The completion event is
/// delivered exactly once, even if the UI state has moved on by the
/// time it arrives; spawn failure is carried in the result, never
/// raised.
pub fn spawn_async(request: CommandRequest, tx: Sender<AppEvent>) {
    std::thread::spawn(move || {
        let result = run_immediate(&request.args, &request.cwd);
        if !result.ok {
            log::warn!(
                "jj {} exited with {}: {}",
                request.name,
                result.exit_code,
                result.stderr.trim()
            );
        }
        let _ = tx.send(AppEvent::CommandDone {
            name: request.name,
            result,
        });
    });
}

/// Find the repository root from any subdirectory.
pub fn resolve_repo_root(cwd: &Path) -> Option<PathBuf> {
    let result = run_immediate(&["root".to_string()], cwd);
    if !result.ok {
        return None;
    }
    let root = result.stdout.trim();
    if root.is_empty() {
        return None;
    }
    let path = PathBuf::from(root);
    Some(std::fs::canonicalize(&path).unwrap_or(path))
}

#[cfg(test)]
mod tests {
    use super::{render_args, spawn_async, CommandRequest, SelectionContext};
    use crate::events::AppEvent;
    use std::path::PathBuf;
    use std::sync::mpsc;

    fn template(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn render_substitutes_selection_values() {
        let ctx = SelectionContext {
            change_id: Some("xyzk".to_string()),
            commit_id: Some("abc123".to_string()),
            file: None,
            width: 120,
        };
        let rendered = render_args(
            &template(&["show", "-r", "$change_id", "--width", "$width"]),
            &ctx,
        )
        .expect("render ok");
        assert_eq!(rendered, template(&["show", "-r", "xyzk", "--width", "120"]));
    }

    #[test]
    fn render_fails_on_missing_value() {
        let ctx = SelectionContext::default();
        assert!(render_args(&template(&["show", "-r", "$change_id"]), &ctx).is_none());
    }

    #[test]
    fn render_passes_plain_args_through() {
        let ctx = SelectionContext::default();
        let rendered = render_args(&template(&["op", "log"]), &ctx).expect("render ok");
        assert_eq!(rendered, template(&["op", "log"]));
    }

    #[test]
    fn async_dispatch_delivers_exactly_one_completion() {
        let (tx, rx) = mpsc::channel();
        spawn_async(
            CommandRequest {
                name: "version".to_string(),
                args: template(&["--version"]),
                cwd: PathBuf::from("."),
            },
            tx,
        );
        // Whether the binary exists or not, completion arrives once:
        // a spawn failure is carried in the payload.
        match rx.recv().expect("completion") {
            AppEvent::CommandDone { name, .. } => assert_eq!(name, "version"),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }
}

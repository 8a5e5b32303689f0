//! Main event dispatcher.
//!
//! `handle_event` is the single entry point of the event loop state
//! machine: it consumes one event, mutates the App, and returns the
//! follow-up effects for the runner to perform. Dispatch precedence,
//! first match wins:
//!
//! 1. `CloseView` dismisses one overlay: leader, diff, stacked, op log.
//! 2. Leader mode captures everything.
//! 3. Keys go to the focused surface: password, diff, revset editor,
//!    search field, inline edit, stacked modal.
//! 4. Keys then pass the sequence matcher, then the global bindings.
//! 5. Mouse events go to the drag target or are hit-tested by z-order.
//! 6. Finally the event is broadcast to the always-listening parts
//!    (script session, primary view, preview follow-up).

use std::time::Instant;

use crossterm::event::KeyEvent;

use crate::config::DispatchMode;
use crate::events::{AppEvent, Effect};
use crate::jj::{self, render_args, ExecResult};
use crate::keymap::matches_any;
use crate::script::LineScript;
use crate::sequence::{applies_to, SequenceOutcome};
use crate::ui::diff::DiffView;
use crate::ui::flash::FlashLevel;
use crate::ui::leader::{LeaderOutcome, LeaderState};
use crate::ui::modal::{self, ModalOutcome};
use crate::ui::password::PasswordPrompt;
use crate::ui::revset::RevsetAction;
use crate::ui::status::SearchAction;

use super::super::state::{App, RunState};

pub fn handle_event(app: &mut App, event: AppEvent) -> Vec<Effect> {
    match event {
        AppEvent::CloseView => match close_topmost(app) {
            Some(effects) => effects,
            // No overlay active: the close is unhandled and only the
            // listeners get to see it.
            None => broadcast(app, &AppEvent::CloseView),
        },
        _ if app.leader.is_some() => handle_leader_event(app, &event),
        AppEvent::Input(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => super::mouse::handle_mouse(app, mouse),
        AppEvent::Resize(width, height) => {
            app.width = width;
            app.height = height;
            app.preview.update_auto_position(width, height);
            broadcast(app, &AppEvent::Resize(width, height))
        }
        AppEvent::Tick => {
            app.flash.expire(Instant::now());
            broadcast(app, &AppEvent::Tick)
        }
        AppEvent::CommandDone { name, result } => handle_command_done(app, name, result),
        AppEvent::ShowDiff(text) => {
            // Replaces an already open diff view.
            app.diff = Some(DiffView::new(&text));
            Vec::new()
        }
        AppEvent::ShowPassword(request) => {
            app.password = request
                .map(|request| PasswordPrompt::new(request.prompt, request.respond));
            Vec::new()
        }
        AppEvent::ScriptStarted(source) => {
            match LineScript::parse(&source, app.cwd.clone()) {
                Ok(script) => {
                    app.script.start(Box::new(script));
                    app.run_state = RunState::RunningScript;
                }
                Err(err) => app.flash.push(FlashLevel::Error, format!("script: {err}")),
            }
            Vec::new()
        }
        AppEvent::SequenceTimeout(generation) => {
            app.sequence.on_timeout(generation);
            Vec::new()
        }
        AppEvent::FocusGained => {
            let mut effects = app.refresh_effects();
            effects.extend(broadcast(app, &AppEvent::FocusGained));
            effects
        }
        AppEvent::AutoRefresh => {
            let mut effects = app.refresh_effects();
            let interval = app.config.ui.auto_refresh_interval;
            if interval > 0 {
                effects.push(Effect::Schedule {
                    after: std::time::Duration::from_secs(interval),
                    event: AppEvent::AutoRefresh,
                });
            }
            effects.extend(broadcast(app, &AppEvent::AutoRefresh));
            effects
        }
    }
}

/// Dismiss exactly one overlay, in fixed precedence order. Returns
/// `None` when nothing was open.
fn close_topmost(app: &mut App) -> Option<Vec<Effect>> {
    if app.leader.is_some() {
        app.leader = None;
        return Some(Vec::new());
    }
    if app.diff.is_some() {
        app.diff = None;
        return Some(Vec::new());
    }
    if app.stacked.is_some() {
        app.stacked = None;
        return Some(Vec::new());
    }
    if app.oplog.is_some() {
        app.oplog = None;
        // Selection falls back to the revision view.
        return Some(app.preview_effect().into_iter().collect());
    }
    None
}

/// While leader mode is active it sees every event exclusively.
fn handle_leader_event(app: &mut App, event: &AppEvent) -> Vec<Effect> {
    let AppEvent::Input(key) = event else {
        return Vec::new();
    };
    let Some(leader) = app.leader.as_ref() else {
        return Vec::new();
    };
    match leader.handle_key(key) {
        LeaderOutcome::Stay => Vec::new(),
        LeaderOutcome::Exit => {
            app.leader = None;
            Vec::new()
        }
        LeaderOutcome::Run(args) => {
            app.leader = None;
            dispatch_args(app, "leader", &args, DispatchMode::Async)
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) -> Vec<Effect> {
    // Focused-surface chain: the first active surface consumes the
    // key outright.
    if let Some(password) = app.password.as_mut() {
        if !password.handle_key(&key) {
            app.password = None;
        }
        return Vec::new();
    }
    if let Some(diff) = app.diff.as_mut() {
        if !diff.handle_key(&key) && matches_any(&key, &app.config.keys.cancel) {
            return vec![Effect::Emit(AppEvent::CloseView)];
        }
        return Vec::new();
    }
    if app.revset.editing {
        return match app.revset.handle_key(&key) {
            RevsetAction::Submitted(_) => app.refresh_effects(),
            RevsetAction::Cancelled | RevsetAction::None => Vec::new(),
        };
    }
    if app.status.is_focused() {
        match app.status.handle_key(&key) {
            SearchAction::Submitted(term) => {
                app.revisions.search(&term);
                let mut effects = Vec::new();
                if let Some(effect) = app.preview_effect() {
                    effects.push(effect);
                }
                return effects;
            }
            SearchAction::Changed(_) | SearchAction::Cancelled | SearchAction::None => {
                return Vec::new()
            }
        }
    }
    if app.revisions.is_editing() {
        return app.revisions.handle_key(&key, &app.cwd);
    }
    if let Some(mut modal) = app.stacked.take() {
        return match modal.handle_key(&key) {
            ModalOutcome::None => {
                app.stacked = Some(modal);
                Vec::new()
            }
            ModalOutcome::Close => Vec::new(),
            ModalOutcome::Replace(next) => {
                app.stacked = Some(next);
                Vec::new()
            }
            ModalOutcome::Run { name, args } => {
                let mode = app
                    .config
                    .custom_commands
                    .iter()
                    .find(|command| command.name == name)
                    .map(|command| command.mode)
                    .unwrap_or(DispatchMode::Async);
                dispatch_args(app, &name, &args, mode)
            }
        };
    }

    // Chord sequences run before the global bindings; a consumed key
    // never falls through.
    let selected = app.selected_item();
    match app
        .sequence
        .on_key(&key, &app.config.custom_commands, &selected)
    {
        SequenceOutcome::Pass => {}
        SequenceOutcome::Collecting { generation } => {
            return vec![Effect::Schedule {
                after: app.config.ui.sequence_timeout,
                event: AppEvent::SequenceTimeout(generation),
            }];
        }
        SequenceOutcome::Matched { index } => return dispatch_custom(app, index),
        SequenceOutcome::Discarded => return Vec::new(),
    }

    let mut effects = global_bindings(app, &key);
    effects.extend(broadcast(app, &AppEvent::Input(key)));
    effects
}

fn global_bindings(app: &mut App, key: &KeyEvent) -> Vec<Effect> {
    let keys = &app.config.keys;

    if matches_any(key, &keys.cancel) {
        if app.status.error.is_some() {
            app.status.set_error(None);
            return Vec::new();
        }
        if app.flash.any() {
            app.flash.delete_oldest();
            return Vec::new();
        }
        if app.script.is_active() {
            app.script.cancel();
            app.run_state = RunState::Normal;
            return Vec::new();
        }
        if app.oplog.is_some() {
            return vec![Effect::Emit(AppEvent::CloseView)];
        }
        return Vec::new();
    }
    if matches_any(key, &keys.quit) {
        if app.is_safe_to_quit() {
            return vec![Effect::Quit];
        }
        app.flash.push(
            FlashLevel::Info,
            "close open views before quitting".to_string(),
        );
        return Vec::new();
    }
    if matches_any(key, &keys.oplog) {
        return app.open_oplog();
    }
    if matches_any(key, &keys.revset) && app.revisions.in_normal_mode() {
        // Keep the text when recovering from a failed revset.
        let clear = app.status.error.is_none();
        app.revset.start_edit(clear);
        return Vec::new();
    }
    if matches_any(key, &keys.git_mode) && app.revisions.in_normal_mode() {
        let selected = app.selected_item();
        let change_id = match &selected {
            crate::jj::SelectedItem::Revision { change_id, .. } => Some(change_id.as_str()),
            _ => None,
        };
        app.stacked = Some(modal::git_menu(change_id));
        return Vec::new();
    }
    if matches_any(key, &keys.undo) && app.revisions.in_normal_mode() {
        app.stacked = Some(modal::undo_confirm());
        return Vec::new();
    }
    if matches_any(key, &keys.redo) && app.revisions.in_normal_mode() {
        app.stacked = Some(modal::redo_confirm());
        return Vec::new();
    }
    if matches_any(key, &keys.bookmarks) && app.revisions.in_normal_mode() {
        return open_bookmarks(app);
    }
    if matches_any(key, &keys.help) {
        app.stacked = match app.stacked.take() {
            Some(_) => None,
            None => Some(modal::help_page(&app.config.keys)),
        };
        return Vec::new();
    }
    if matches_any(key, &keys.diff) {
        let selected = app.selected_item();
        if let crate::jj::SelectedItem::Revision { change_id, .. } = selected {
            let args = vec!["diff".to_string(), "-r".to_string(), change_id];
            return vec![Effect::Run(app.request("diff", args))];
        }
        return Vec::new();
    }
    if matches_any(key, &keys.preview_bottom) {
        let at_bottom = app.preview.at_bottom();
        app.preview.set_position(false, !at_bottom);
        if !app.preview.visible {
            app.preview.set_visible(true);
            return app.preview_effect().into_iter().collect();
        }
        return Vec::new();
    }
    if matches_any(key, &keys.preview_toggle) {
        app.preview.toggle_visible();
        if app.preview.visible {
            return app.preview_effect().into_iter().collect();
        }
        return Vec::new();
    }
    if matches_any(key, &keys.preview_expand) && app.preview.visible {
        app.preview.expand();
        return Vec::new();
    }
    if matches_any(key, &keys.preview_shrink) && app.preview.visible {
        app.preview.shrink();
        return Vec::new();
    }
    if matches_any(key, &keys.custom_menu) {
        let selected = app.selected_item();
        app.stacked = Some(modal::custom_menu(&app.config.custom_commands, &selected));
        return Vec::new();
    }
    if matches_any(key, &keys.leader) {
        app.leader = Some(LeaderState::new(app.config.leader.clone()));
        return Vec::new();
    }
    if matches_any(key, &keys.quick_search) && app.oplog.is_none() {
        // Quick search stays off in the op log view.
        app.status.focus_search();
        return Vec::new();
    }
    if matches_any(key, &keys.refresh) {
        return app.refresh_effects();
    }

    // Single-chord custom commands, declaration order.
    let selected = app.selected_item();
    for index in 0..app.config.custom_commands.len() {
        let command = &app.config.custom_commands[index];
        if command.sequence.len() == 1
            && applies_to(command, &selected)
            && crate::keymap::matches_chord(key, &command.sequence[0])
        {
            return dispatch_custom(app, index);
        }
    }

    Vec::new()
}

fn open_bookmarks(app: &mut App) -> Vec<Effect> {
    // Fast, side-effect-free query; blocking here is intentional.
    let args = vec![
        "bookmark".to_string(),
        "list".to_string(),
        "-T".to_string(),
        r#"name ++ "\n""#.to_string(),
    ];
    let result = jj::run_immediate(&args, &app.cwd);
    if !result.ok {
        app.flash.push(
            FlashLevel::Error,
            format!("bookmark list failed: {}", result.stderr.trim()),
        );
        return Vec::new();
    }
    let names: Vec<String> = result
        .stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
        .collect();
    app.stacked = Some(modal::bookmarks_menu(&names));
    Vec::new()
}

fn dispatch_custom(app: &mut App, index: usize) -> Vec<Effect> {
    let command = app.config.custom_commands[index].clone();
    dispatch_args(app, &command.name, &command.args, command.mode)
}

/// Render placeholders against the current selection and dispatch in
/// the requested mode.
fn dispatch_args(
    app: &mut App,
    name: &str,
    template: &[String],
    mode: DispatchMode,
) -> Vec<Effect> {
    let ctx = app.selected_item().context(app.width);
    let Some(args) = render_args(template, &ctx) else {
        app.flash.push(
            FlashLevel::Error,
            format!("{name}: needs a selection"),
        );
        return Vec::new();
    };
    match mode {
        DispatchMode::Async => vec![Effect::Run(app.request(name, args))],
        DispatchMode::Interactive => vec![Effect::RunInteractive(app.request(name, args))],
        DispatchMode::Immediate => {
            // Suspends the loop until the process exits, by design.
            let result = jj::run_immediate(&args, &app.cwd);
            if result.ok {
                app.refresh_effects()
            } else {
                app.flash.push(
                    FlashLevel::Error,
                    format!("{name} failed: {}", result.stderr.trim()),
                );
                Vec::new()
            }
        }
    }
}

/// Apply an async completion against whatever state exists now. A
/// stale selection or a closed view is tolerated; failure becomes a
/// flash, never an abort.
fn handle_command_done(app: &mut App, name: String, result: ExecResult) -> Vec<Effect> {
    let mut effects = Vec::new();
    match name.as_str() {
        "log" => {
            if result.ok {
                app.revisions.set_log(&result.stdout);
                app.status.set_error(None);
            } else {
                let message = result.stderr.trim().to_string();
                app.status.set_error(Some(message.clone()));
                app.flash
                    .push(FlashLevel::Error, format!("jj log failed: {message}"));
            }
        }
        "oplog" => {
            if result.ok {
                if let Some(oplog) = app.oplog.as_mut() {
                    oplog.set_log(&result.stdout);
                }
            } else {
                app.flash.push(
                    FlashLevel::Error,
                    format!("op log failed: {}", result.stderr.trim()),
                );
            }
        }
        "preview" => {
            let text = if result.ok {
                result.stdout.clone()
            } else {
                result.stderr.clone()
            };
            app.preview.set_content(&text);
        }
        "diff" => {
            if result.ok {
                effects.push(Effect::Emit(AppEvent::ShowDiff(result.stdout.clone())));
            } else {
                app.flash.push(
                    FlashLevel::Error,
                    format!("diff failed: {}", result.stderr.trim()),
                );
            }
        }
        _ => {
            if result.ok {
                effects.extend(app.refresh_effects());
            } else {
                app.flash.push(
                    FlashLevel::Error,
                    format!("{name} failed: {}", result.stderr.trim()),
                );
            }
        }
    }
    effects.extend(broadcast(app, &AppEvent::CommandDone { name, result }));
    effects
}

/// Deliver the event to every always-listening component: the script
/// session, the visible primary view, and the preview follow-up when
/// the selection moved.
fn broadcast(app: &mut App, event: &AppEvent) -> Vec<Effect> {
    let mut effects = Vec::new();
    let before = app.selected_item();

    match app.script.deliver(event) {
        Ok(Some(effect)) => effects.push(effect),
        Ok(None) => {}
        Err(err) => app
            .flash
            .push(FlashLevel::Error, format!("script: {err}")),
    }
    if app.run_state == RunState::RunningScript && !app.script.is_active() {
        app.run_state = RunState::Normal;
    }

    if let AppEvent::Input(key) = event {
        let nav = match app.oplog.as_mut() {
            Some(oplog) => oplog.handle_key(key, &app.cwd),
            None => app.revisions.handle_key(key, &app.cwd),
        };
        effects.extend(nav);
    }

    if app.selected_item() != before {
        if let Some(effect) = app.preview_effect() {
            effects.push(effect);
        }
    }
    effects
}

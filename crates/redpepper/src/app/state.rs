//! Application state types.
//!
//! Defines the App struct which holds all mutable application state:
//! the primary revision view, the overlay toggle slots, the sequence
//! matcher, the script bridge, and the drag target. All mutation
//! happens serially inside the event handlers; nothing here is shared
//! across threads.

use std::path::PathBuf;

use ratatui::layout::Rect;

use crate::config::Config;
use crate::events::Effect;
use crate::jj::{CommandRequest, SelectedItem};
use crate::script::ScriptBridge;
use crate::sequence::SequenceMatcher;
use crate::ui::diff::DiffView;
use crate::ui::flash::FlashQueue;
use crate::ui::leader::LeaderState;
use crate::ui::modal::StackedModal;
use crate::ui::oplog::{OpLogView, OPLOG_TEMPLATE};
use crate::ui::password::PasswordPrompt;
use crate::ui::preview::PreviewPane;
use crate::ui::revisions::{RevisionsView, LOG_TEMPLATE};
use crate::ui::revset::RevsetEditor;
use crate::ui::status::StatusBar;

/// Where control currently sits. Suspension points are explicit
/// states, not implicit blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Normal,
    /// An interactive command owns the terminal.
    DelegatedToExternalProcess,
    RunningScript,
}

/// Lookup key for the surface receiving a mouse drag. Deliberately
/// not a reference: the surface is re-resolved on every motion event
/// and the target is cleared when it no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Preview,
}

/// Main application state container.
///
/// Each overlay occupies its own toggle slot; pushing into an
/// occupied slot replaces the occupant. Event handling lives in
/// `app::input`, composition in `app::render`.
pub struct App {
    pub config: Config,
    pub cwd: PathBuf,
    pub width: u16,
    pub height: u16,
    pub run_state: RunState,
    pub revisions: RevisionsView,
    pub oplog: Option<OpLogView>,
    pub diff: Option<DiffView>,
    pub leader: Option<LeaderState>,
    pub password: Option<PasswordPrompt>,
    pub stacked: Option<StackedModal>,
    pub preview: PreviewPane,
    pub revset: RevsetEditor,
    pub status: StatusBar,
    pub flash: FlashQueue,
    pub sequence: SequenceMatcher,
    pub script: ScriptBridge,
    pub drag_target: Option<DragTarget>,
    /// Body area of the last composed frame, used to translate drag
    /// positions into split percentages.
    pub body: Rect,
}

impl App {
    pub fn new(config: Config, cwd: PathBuf, width: u16, height: u16) -> Self {
        let preview = PreviewPane::new(&config.preview);
        let revset = RevsetEditor::new(&config.revisions.revset);
        App {
            config,
            cwd,
            width,
            height,
            run_state: RunState::Normal,
            revisions: RevisionsView::new(),
            oplog: None,
            diff: None,
            leader: None,
            password: None,
            stacked: None,
            preview,
            revset,
            status: StatusBar::new(),
            flash: FlashQueue::new(),
            sequence: SequenceMatcher::default(),
            script: ScriptBridge::default(),
            drag_target: None,
            body: Rect::default(),
        }
    }

    /// The item commands operate on: the op log selection while that
    /// view is open, otherwise the revision under the cursor.
    pub fn selected_item(&self) -> SelectedItem {
        match &self.oplog {
            Some(oplog) => oplog.selected(),
            None => self.revisions.selected(),
        }
    }

    /// Quitting is refused while a modal workflow or the op log is
    /// open, or while the revision view is mid-operation.
    pub fn is_safe_to_quit(&self) -> bool {
        if self.stacked.is_some() || self.oplog.is_some() {
            return false;
        }
        self.revisions.in_normal_mode()
    }

    pub fn request(&self, name: &str, args: Vec<String>) -> CommandRequest {
        CommandRequest {
            name: name.to_string(),
            args,
            cwd: self.cwd.clone(),
        }
    }

    fn log_args(&self) -> Vec<String> {
        let mut args = vec![
            "log".to_string(),
            "--no-graph".to_string(),
            "--template".to_string(),
            LOG_TEMPLATE.to_string(),
        ];
        if !self.revset.current.is_empty() {
            args.push("-r".to_string());
            args.push(self.revset.current.clone());
        }
        args
    }

    fn oplog_args(&self) -> Vec<String> {
        vec![
            "op".to_string(),
            "log".to_string(),
            "--no-graph".to_string(),
            "--template".to_string(),
            OPLOG_TEMPLATE.to_string(),
            "--limit".to_string(),
            self.config.oplog.limit.to_string(),
        ]
    }

    /// Command that produces the preview content for the current
    /// selection, if there is one.
    pub fn preview_effect(&self) -> Option<Effect> {
        if !self.preview.visible {
            return None;
        }
        let args = match self.selected_item() {
            SelectedItem::Revision { change_id, .. } => {
                vec!["show".to_string(), "-r".to_string(), change_id]
            }
            SelectedItem::Operation { id } => {
                vec!["op".to_string(), "show".to_string(), id]
            }
            SelectedItem::File { change_id, path } => vec![
                "diff".to_string(),
                "-r".to_string(),
                change_id,
                path,
            ],
            SelectedItem::None => return None,
        };
        Some(Effect::Run(self.request("preview", args)))
    }

    /// Everything needed to bring the visible views up to date.
    pub fn refresh_effects(&self) -> Vec<Effect> {
        let mut effects = vec![Effect::Run(self.request("log", self.log_args()))];
        if self.oplog.is_some() {
            effects.push(Effect::Run(self.request("oplog", self.oplog_args())));
        }
        if let Some(effect) = self.preview_effect() {
            effects.push(effect);
        }
        effects
    }

    /// Open the op log view (replacing a previous instance) and load
    /// it.
    pub fn open_oplog(&mut self) -> Vec<Effect> {
        self.oplog = Some(OpLogView::new());
        vec![Effect::Run(self.request("oplog", self.oplog_args()))]
    }
}

#[cfg(test)]
mod tests {
    use super::RunState;
    use crate::test_utils::test_app;
    use crate::ui::modal::undo_confirm;
    use crate::ui::oplog::OpLogView;

    #[test]
    fn quit_is_safe_only_in_default_state() {
        let mut app = test_app();
        assert!(app.is_safe_to_quit());
        assert_eq!(app.run_state, RunState::Normal);

        app.stacked = Some(undo_confirm());
        assert!(!app.is_safe_to_quit());
        app.stacked = None;

        app.oplog = Some(OpLogView::new());
        assert!(!app.is_safe_to_quit());
        app.oplog = None;
        assert!(app.is_safe_to_quit());
    }

    #[test]
    fn refresh_skips_hidden_views() {
        let mut app = test_app();
        app.preview.set_visible(false);
        let effects = app.refresh_effects();
        assert_eq!(effects.len(), 1);

        app.oplog = Some(OpLogView::new());
        let effects = app.refresh_effects();
        assert_eq!(effects.len(), 2);
    }

    #[test]
    fn preview_needs_a_selection() {
        let mut app = test_app();
        app.preview.set_visible(true);
        assert!(app.preview_effect().is_none());
        app.revisions.set_log("abc 111 first\n");
        assert!(app.preview_effect().is_some());
    }
}

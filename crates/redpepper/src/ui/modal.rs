//! Stacked modals.
//!
//! One slot holds whichever modal workflow is active: the git menu,
//! undo/redo confirmation, bookmark editing, the custom command menu,
//! or the help page. Opening a modal while one is up replaces it;
//! they never stack on each other.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;

use crate::config::CustomCommandConfig;
use crate::jj::SelectedItem;
use crate::keymap::KeyMappings;
use crate::sequence::applies_to;

/// What a modal did with a key.
#[derive(Debug, PartialEq, Eq)]
pub enum ModalOutcome {
    None,
    Close,
    /// Dispatch a jj invocation; `$`-placeholders are rendered by the
    /// router against the current selection.
    Run { name: String, args: Vec<String> },
    /// Swap in another modal (e.g. bookmark menu -> name input).
    Replace(StackedModal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub name: String,
    pub args: Vec<String>,
    /// When set, selecting the item opens this input modal instead of
    /// dispatching directly.
    pub input: Option<InputModal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuModal {
    pub title: String,
    pub items: Vec<MenuItem>,
    pub selected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmModal {
    pub prompt: String,
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputModal {
    pub title: String,
    pub name: String,
    /// `$input` is replaced by the typed text on submit.
    pub args: Vec<String>,
    pub input: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum StackedModal {
    Menu(MenuModal),
    Confirm(ConfirmModal),
    Input(InputModal),
    Help(Vec<String>),
}

pub fn git_menu(change_id: Option<&str>) -> StackedModal {
    let mut items = vec![
        MenuItem {
            label: "fetch".to_string(),
            name: "git-fetch".to_string(),
            args: vec!["git".to_string(), "fetch".to_string()],
            input: None,
        },
        MenuItem {
            label: "push".to_string(),
            name: "git-push".to_string(),
            args: vec!["git".to_string(), "push".to_string()],
            input: None,
        },
    ];
    if change_id.is_some() {
        items.push(MenuItem {
            label: "push selected change".to_string(),
            name: "git-push-change".to_string(),
            args: vec![
                "git".to_string(),
                "push".to_string(),
                "--change".to_string(),
                "$change_id".to_string(),
            ],
            input: None,
        });
    }
    StackedModal::Menu(MenuModal {
        title: "git".to_string(),
        items,
        selected: 0,
    })
}

pub fn undo_confirm() -> StackedModal {
    StackedModal::Confirm(ConfirmModal {
        prompt: "Undo the last operation?".to_string(),
        name: "undo".to_string(),
        args: vec!["undo".to_string()],
    })
}

pub fn redo_confirm() -> StackedModal {
    StackedModal::Confirm(ConfirmModal {
        prompt: "Redo the next operation?".to_string(),
        name: "redo".to_string(),
        args: vec!["redo".to_string()],
    })
}

/// Bookmark menu for the selected revision: move an existing bookmark
/// here, or create a new one by name.
pub fn bookmarks_menu(names: &[String]) -> StackedModal {
    let mut items = vec![MenuItem {
        label: "create new bookmark...".to_string(),
        name: String::new(),
        args: Vec::new(),
        input: Some(InputModal {
            title: "bookmark name".to_string(),
            name: "bookmark-create".to_string(),
            args: vec![
                "bookmark".to_string(),
                "create".to_string(),
                "$input".to_string(),
                "-r".to_string(),
                "$change_id".to_string(),
            ],
            input: String::new(),
        }),
    }];
    for name in names {
        items.push(MenuItem {
            label: format!("move {name} here"),
            name: "bookmark-move".to_string(),
            args: vec![
                "bookmark".to_string(),
                "move".to_string(),
                name.clone(),
                "--to".to_string(),
                "$change_id".to_string(),
            ],
            input: None,
        });
    }
    StackedModal::Menu(MenuModal {
        title: "bookmarks".to_string(),
        items,
        selected: 0,
    })
}

/// Menu of the custom commands applicable to the current selection,
/// declaration order.
pub fn custom_menu(commands: &[CustomCommandConfig], selected: &SelectedItem) -> StackedModal {
    let items = commands
        .iter()
        .filter(|command| applies_to(command, selected))
        .map(|command| MenuItem {
            label: command.name.clone(),
            name: command.name.clone(),
            args: command.args.clone(),
            input: None,
        })
        .collect();
    StackedModal::Menu(MenuModal {
        title: "custom commands".to_string(),
        items,
        selected: 0,
    })
}

pub fn help_page(keys: &KeyMappings) -> StackedModal {
    fn line(action: &str, chords: &[crate::keymap::KeyChord]) -> String {
        let keys: Vec<String> = chords.iter().map(|chord| format!("{:?}", chord.key)).collect();
        format!("  {:<16} {}", action, keys.join(", "))
    }
    StackedModal::Help(vec![
        "help".to_string(),
        line("quit", &keys.quit),
        line("op log", &keys.oplog),
        line("revset", &keys.revset),
        line("git", &keys.git_mode),
        line("undo", &keys.undo),
        line("redo", &keys.redo),
        line("bookmarks", &keys.bookmarks),
        line("preview", &keys.preview_toggle),
        line("leader", &keys.leader),
        line("search", &keys.quick_search),
    ])
}

impl StackedModal {
    pub fn handle_key(&mut self, key: &KeyEvent) -> ModalOutcome {
        match self {
            StackedModal::Menu(menu) => match key.code {
                KeyCode::Esc => ModalOutcome::Close,
                KeyCode::Up | KeyCode::Char('k') => {
                    if menu.selected > 0 {
                        menu.selected -= 1;
                    }
                    ModalOutcome::None
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if menu.selected + 1 < menu.items.len() {
                        menu.selected += 1;
                    }
                    ModalOutcome::None
                }
                KeyCode::Enter => match menu.items.get(menu.selected) {
                    Some(item) => match &item.input {
                        Some(input) => ModalOutcome::Replace(StackedModal::Input(input.clone())),
                        None => ModalOutcome::Run {
                            name: item.name.clone(),
                            args: item.args.clone(),
                        },
                    },
                    None => ModalOutcome::Close,
                },
                _ => ModalOutcome::None,
            },
            StackedModal::Confirm(confirm) => match key.code {
                KeyCode::Enter | KeyCode::Char('y') => ModalOutcome::Run {
                    name: confirm.name.clone(),
                    args: confirm.args.clone(),
                },
                KeyCode::Esc | KeyCode::Char('n') => ModalOutcome::Close,
                _ => ModalOutcome::None,
            },
            StackedModal::Input(input) => match key.code {
                KeyCode::Esc => ModalOutcome::Close,
                KeyCode::Enter => {
                    let args = input
                        .args
                        .iter()
                        .map(|arg| arg.replace("$input", &input.input))
                        .collect();
                    ModalOutcome::Run {
                        name: input.name.clone(),
                        args,
                    }
                }
                KeyCode::Backspace => {
                    input.input.pop();
                    ModalOutcome::None
                }
                KeyCode::Char(ch) => {
                    input.input.push(ch);
                    ModalOutcome::None
                }
                _ => ModalOutcome::None,
            },
            StackedModal::Help(_) => match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char(_) => ModalOutcome::Close,
                _ => ModalOutcome::None,
            },
        }
    }

    /// Centered frame for the modal within `area`.
    pub fn frame(&self, area: Rect) -> Rect {
        let content = self.view();
        let height = (content.lines().count() as u16 + 2).min(area.height);
        let width = content
            .lines()
            .map(|line| line.chars().count() as u16 + 4)
            .max()
            .unwrap_or(20)
            .min(area.width);
        Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        }
    }

    pub fn view(&self) -> String {
        match self {
            StackedModal::Menu(menu) => {
                let mut out = format!("[{}]\n", menu.title);
                if menu.items.is_empty() {
                    out.push_str("  (nothing applicable)\n");
                }
                for (index, item) in menu.items.iter().enumerate() {
                    let marker = if index == menu.selected { "> " } else { "  " };
                    out.push_str(marker);
                    out.push_str(&item.label);
                    out.push('\n');
                }
                out
            }
            StackedModal::Confirm(confirm) => {
                format!("{}\n  (y)es / (n)o\n", confirm.prompt)
            }
            StackedModal::Input(input) => {
                format!("{}\n> {}_\n", input.title, input.input)
            }
            StackedModal::Help(lines) => {
                let mut out = String::new();
                for line in lines {
                    out.push_str(line);
                    out.push('\n');
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{bookmarks_menu, git_menu, undo_confirm, ModalOutcome, StackedModal};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn menu_enter_dispatches_selected_item() {
        let mut modal = git_menu(Some("abc"));
        modal.handle_key(&key(KeyCode::Down));
        let outcome = modal.handle_key(&key(KeyCode::Enter));
        match outcome {
            ModalOutcome::Run { name, .. } => assert_eq!(name, "git-push"),
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn confirm_yes_runs_and_no_closes() {
        let mut modal = undo_confirm();
        assert!(matches!(
            modal.handle_key(&key(KeyCode::Char('y'))),
            ModalOutcome::Run { .. }
        ));
        assert_eq!(modal.handle_key(&key(KeyCode::Char('n'))), ModalOutcome::Close);
    }

    #[test]
    fn bookmark_create_goes_through_input_modal() {
        let mut modal = bookmarks_menu(&["main".to_string()]);
        let outcome = modal.handle_key(&key(KeyCode::Enter));
        let ModalOutcome::Replace(mut input) = outcome else {
            panic!("expected replace");
        };
        for ch in "wip".chars() {
            input.handle_key(&key(KeyCode::Char(ch)));
        }
        let ModalOutcome::Run { args, .. } = input.handle_key(&key(KeyCode::Enter)) else {
            panic!("expected run");
        };
        assert!(args.contains(&"wip".to_string()));
        assert!(args.contains(&"$change_id".to_string()));
    }

    #[test]
    fn modal_frame_is_centered() {
        let modal = undo_confirm();
        let frame = modal.frame(ratatui::layout::Rect {
            x: 0,
            y: 0,
            width: 80,
            height: 24,
        });
        assert!(frame.x > 0 && frame.y > 0);
        assert!(frame.width < 80);
    }

    #[test]
    fn help_closes_on_any_character() {
        let keys = crate::keymap::KeyMappings::default();
        let mut modal = super::help_page(&keys);
        assert!(matches!(modal, StackedModal::Help(_)));
        assert_eq!(modal.handle_key(&key(KeyCode::Char('x'))), ModalOutcome::Close);
    }
}

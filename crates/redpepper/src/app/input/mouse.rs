//! Mouse routing.
//!
//! An in-flight drag owns motion and release events exclusively; the
//! target is a lookup key that is re-validated on every event and
//! cleared when the surface it names is gone. Everything else is
//! hit-tested against the view frames in a fixed z-order: diff, op
//! log, revisions, preview. Stacked modals swallow all mouse input.

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::events::Effect;
use crate::ui::layout::contains;

use super::super::state::{App, DragTarget};

pub(super) fn handle_mouse(app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
    if app.stacked.is_some() {
        // For now, stacked modals don't respond to mouse events.
        return Vec::new();
    }

    if let Some(DragTarget::Preview) = app.drag_target {
        if !app.preview.visible || !app.preview.is_dragging() {
            // The dragged surface went away; drop the stale target.
            app.drag_target = None;
        } else {
            match mouse.kind {
                MouseEventKind::Drag(_) | MouseEventKind::Moved => {
                    app.preview.drag_move(mouse.column, mouse.row, app.body);
                    return Vec::new();
                }
                MouseEventKind::Up(_) => {
                    app.preview.drag_end();
                    app.drag_target = None;
                    return Vec::new();
                }
                _ => {}
            }
        }
    }

    let before = app.selected_item();
    let mut handled = false;

    if let Some(diff) = app.diff.as_mut() {
        if contains(diff.frame, mouse.column, mouse.row) {
            diff.handle_mouse(&mouse);
            handled = true;
        }
    }
    if !handled {
        if let Some(oplog) = app.oplog.as_mut() {
            if contains(oplog.frame, mouse.column, mouse.row) {
                oplog.handle_mouse(&mouse);
                handled = true;
            }
        }
    }
    if !handled
        && app.oplog.is_none()
        && contains(app.revisions.frame, mouse.column, mouse.row)
    {
        app.revisions.handle_mouse(&mouse);
        handled = true;
    }
    if !handled
        && app.preview.visible
        && contains(app.preview.frame, mouse.column, mouse.row)
        && matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left))
        && app.preview.drag_start(mouse.column, mouse.row)
    {
        app.drag_target = Some(DragTarget::Preview);
    }

    let mut effects = Vec::new();
    if app.selected_item() != before {
        if let Some(effect) = app.preview_effect() {
            effects.push(effect);
        }
    }
    effects
}

#[cfg(test)]
mod tests {
    use crate::app::input::handle_event;
    use crate::app::state::{App, DragTarget};
    use crate::events::AppEvent;
    use crate::test_utils::test_app;
    use crate::ui::modal::undo_confirm;
    use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
    use ratatui::layout::Rect;

    fn app() -> App {
        let mut app = test_app();
        app.revisions.set_frame(Rect {
            x: 0,
            y: 1,
            width: 40,
            height: 22,
        });
        app.revisions.set_log("abc 111 first\ndef 222 second\n");
        app.preview.set_visible(true);
        app.preview.set_position(false, false);
        app.preview.set_frame(Rect {
            x: 40,
            y: 1,
            width: 40,
            height: 22,
        });
        app.body = Rect {
            x: 0,
            y: 1,
            width: 80,
            height: 22,
        };
        app
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> AppEvent {
        AppEvent::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn click_in_revision_view_moves_cursor() {
        let mut app = app();
        handle_event(
            &mut app,
            mouse(MouseEventKind::Down(MouseButton::Left), 5, 2),
        );
        assert_eq!(app.revisions.cursor, 1);
    }

    #[test]
    fn drag_persists_across_motion_and_clears_on_release() {
        let mut app = app();
        handle_event(
            &mut app,
            mouse(MouseEventKind::Down(MouseButton::Left), 40, 5),
        );
        assert_eq!(app.drag_target, Some(DragTarget::Preview));

        handle_event(
            &mut app,
            mouse(MouseEventKind::Drag(MouseButton::Left), 60, 5),
        );
        assert_eq!(app.preview.percentage, 25);
        assert_eq!(app.drag_target, Some(DragTarget::Preview));

        handle_event(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 60, 5));
        assert_eq!(app.drag_target, None);
    }

    #[test]
    fn drag_target_clears_when_surface_disappears() {
        let mut app = app();
        handle_event(
            &mut app,
            mouse(MouseEventKind::Down(MouseButton::Left), 40, 5),
        );
        assert_eq!(app.drag_target, Some(DragTarget::Preview));

        // The preview gets hidden while the drag is in flight.
        app.preview.set_visible(false);
        handle_event(
            &mut app,
            mouse(MouseEventKind::Drag(MouseButton::Left), 50, 5),
        );
        assert_eq!(app.drag_target, None);
    }

    #[test]
    fn stacked_modal_swallows_mouse_events() {
        let mut app = app();
        app.stacked = Some(undo_confirm());
        handle_event(
            &mut app,
            mouse(MouseEventKind::Down(MouseButton::Left), 5, 2),
        );
        assert_eq!(app.revisions.cursor, 0);
    }
}

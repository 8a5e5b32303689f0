//! Frame composition and the render cache.
//!
//! `compose` is a pure function of the App: it carves the terminal
//! area into revset bar, body, preview, and footer, writes every
//! visible block into a frame buffer, and flattens it to one string.
//! The cache recomputes that string only when the state was marked
//! dirty and the minimum interval has elapsed, decoupling render
//! cadence from event arrival rate.

use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use crate::ui::layout::{split_horizontal, split_vertical, FrameBuffer, Split};

use super::state::App;

const FOOTER_HEIGHT: u16 = 1;
const REVSET_HEIGHT: u16 = 1;

/// Reflect the focused surface in the status bar mode label.
fn update_status(app: &mut App) {
    let label = if app.diff.is_some() {
        "diff"
    } else if app.oplog.is_some() {
        "oplog"
    } else if app.stacked.is_some() {
        "menu"
    } else if app.leader.is_some() {
        "leader"
    } else {
        app.revisions.operation_name()
    };
    app.status.set_mode(label);
}

pub fn compose(app: &mut App) -> String {
    if app.width == 0 || app.height == 0 {
        return String::new();
    }
    update_status(app);

    let area = Rect {
        x: 0,
        y: 0,
        width: app.width,
        height: app.height,
    };
    let mut buffer = FrameBuffer::new(app.width, app.height);

    // The diff view takes everything above the footer.
    if let Some(diff) = app.diff.as_mut() {
        let (body, footer) =
            split_vertical(area, Split::Fixed(area.height.saturating_sub(FOOTER_HEIGHT)));
        diff.set_frame(body);
        buffer.set_content(body, &diff.view());
        buffer.set_content(footer, &app.status.view(app.flash.len()));
        return buffer.render();
    }

    let (top, rest) = split_vertical(area, Split::Fixed(REVSET_HEIGHT));
    let (body, footer) =
        split_vertical(rest, Split::Fixed(rest.height.saturating_sub(FOOTER_HEIGHT)));
    app.body = body;
    buffer.set_content(top, &app.revset.view());
    buffer.set_content(footer, &app.status.view(app.flash.len()));

    let mut main = body;
    if app.preview.visible {
        app.preview.update_auto_position(app.width, app.height);
        let share = 100 - app.preview.percentage.min(90);
        let (kept, preview_area) = if app.preview.at_bottom() {
            split_vertical(body, Split::Percent(share))
        } else {
            split_horizontal(body, Split::Percent(share))
        };
        main = kept;
        app.preview.set_frame(preview_area);
        buffer.set_content(preview_area, &app.preview.view());
    }

    match app.oplog.as_mut() {
        Some(oplog) => {
            oplog.set_frame(main);
            buffer.set_content(main, &oplog.view());
        }
        None => {
            app.revisions.set_frame(main);
            buffer.set_content(main, &app.revisions.view());
        }
    }

    if let Some(modal) = app.stacked.as_ref() {
        let frame = modal.frame(area);
        buffer.set_content(frame, &modal.view());
    }

    if let Some(leader) = app.leader.as_ref() {
        let view = leader.view();
        let height = (view.lines().count() as u16).min(body.height);
        let frame = Rect {
            x: body.x,
            y: body.y + body.height.saturating_sub(height),
            width: body.width.min(40),
            height,
        };
        buffer.set_content(frame, &view);
    }

    if app.sequence.is_collecting() {
        let names: Vec<&str> = app
            .sequence
            .candidates()
            .iter()
            .filter_map(|&index| app.config.custom_commands.get(index))
            .map(|command| command.name.as_str())
            .collect();
        let hint = format!(
            "chord: {} keys... [{}]",
            app.sequence.prefix().len(),
            names.join(", ")
        );
        let width = (hint.chars().count() as u16).min(area.width);
        let frame = Rect {
            x: area.width.saturating_sub(width),
            y: footer.y.saturating_sub(1),
            width,
            height: 1,
        };
        buffer.set_content(frame, &hint);
    }

    let flash_lines = app.flash.lines();
    for (offset, line) in flash_lines.iter().enumerate() {
        let width = (line.chars().count() as u16).min(area.width);
        let frame = Rect {
            x: area.width.saturating_sub(width),
            y: offset as u16,
            width,
            height: 1,
        };
        buffer.set_content(frame, line);
    }

    if let Some(password) = app.password.as_ref() {
        let view = password.view();
        let height = view.lines().count() as u16;
        let width = view
            .lines()
            .map(|line| line.chars().count() as u16)
            .max()
            .unwrap_or(20);
        let frame = Rect {
            x: (area.width.saturating_sub(width)) / 2,
            y: (area.height.saturating_sub(height)) / 2,
            width: width.min(area.width),
            height: height.min(area.height),
        };
        buffer.set_content(frame, &view);
    }

    buffer.render()
}

/// Memoizes the last composited frame. Event handling marks the cache
/// dirty; recomputation happens at most once per `min_interval`.
pub struct RenderCache {
    cached: String,
    dirty: bool,
    last_render: Option<Instant>,
    min_interval: Duration,
}

impl RenderCache {
    pub fn new(min_interval: Duration) -> Self {
        RenderCache {
            cached: String::new(),
            dirty: true,
            last_render: None,
            min_interval,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn due(&self, now: Instant) -> bool {
        match self.last_render {
            None => true,
            Some(last) => now.duration_since(last) >= self.min_interval,
        }
    }

    /// The current frame, recomputed only when dirty and due.
    pub fn frame(&mut self, app: &mut App, now: Instant) -> &str {
        if self.dirty && self.due(now) {
            self.cached = compose(app);
            self.dirty = false;
            self.last_render = Some(now);
        }
        &self.cached
    }
}

#[cfg(test)]
mod tests {
    use super::{compose, RenderCache};
    use crate::app::state::App;
    use crate::events::AppEvent;
    use crate::test_utils::test_app;
    use std::time::{Duration, Instant};

    fn app() -> App {
        let mut app = test_app();
        app.revisions.set_log("abc 111 first\ndef 222 second\n");
        app
    }

    #[test]
    fn composition_is_idempotent() {
        let mut app = app();
        let first = compose(&mut app);
        let second = compose(&mut app);
        assert_eq!(first, second);
        assert!(first.contains("first"));
    }

    #[test]
    fn resize_changes_the_output() {
        let mut app = app();
        let before = compose(&mut app);
        crate::app::input::handle_event(&mut app, AppEvent::Resize(60, 20));
        let after = compose(&mut app);
        assert_ne!(before, after);
    }

    #[test]
    fn zero_sized_terminal_renders_nothing() {
        let mut app = app();
        app.width = 0;
        assert_eq!(compose(&mut app), "");
    }

    #[test]
    fn cache_recomputes_only_when_dirty_and_due() {
        let mut app = app();
        let mut cache = RenderCache::new(Duration::from_millis(8));
        let start = Instant::now();

        let first = cache.frame(&mut app, start).to_string();
        // Dirty but not due: the cached frame is reused even though
        // the state changed underneath.
        app.revisions.set_log("zzz 999 replaced\n");
        cache.mark_dirty();
        let throttled = cache
            .frame(&mut app, start + Duration::from_millis(2))
            .to_string();
        assert_eq!(first, throttled);

        // Due now: the new state shows up.
        let refreshed = cache
            .frame(&mut app, start + Duration::from_millis(10))
            .to_string();
        assert!(refreshed.contains("replaced"));
    }

    #[test]
    fn clean_cache_ignores_the_interval() {
        let mut app = app();
        let mut cache = RenderCache::new(Duration::from_millis(8));
        let start = Instant::now();
        let first = cache.frame(&mut app, start).to_string();
        let later = cache
            .frame(&mut app, start + Duration::from_secs(1))
            .to_string();
        assert_eq!(first, later);
    }

    #[test]
    fn diff_view_takes_over_the_body() {
        let mut app = app();
        crate::app::input::handle_event(
            &mut app,
            AppEvent::ShowDiff("diff --git a b\n+added\n".to_string()),
        );
        let frame = compose(&mut app);
        assert!(frame.contains("+added"));
        assert!(!frame.contains("revset:"));
    }
}
